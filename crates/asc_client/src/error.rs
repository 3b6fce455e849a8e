use thiserror::Error;

/// Error taxonomy for every public operation. Transport errors pass
/// through unchanged; parse and shape mismatches are folded into the
/// taxonomy at the network boundary so callers never see raw
/// deserialization failures.
#[derive(Debug, Error)]
pub enum AscError {
    /// Caller-supplied input was invalid or empty. Not retryable.
    #[error("malformed request")]
    MalformedRequest,
    /// The bootstrap config endpoint returned an empty auth service key.
    #[error("auth service key missing")]
    ServiceKeyMissing,
    /// The response body was not parseable JSON.
    #[error("bad JSON in reply")]
    BadJson,
    /// The response did not match the shape this client expects.
    #[error("unexpected reply from App Store Connect")]
    UnexpectedReply,
    /// Account-level lockout. Requires user intervention.
    #[error("security code locked")]
    SecurityCodeLocked,
    #[error("too many security codes sent")]
    TooManyCodesSent,
    #[error("too many security codes validated")]
    TooManyCodesValidated,
    /// Operation attempted before login or after session expiry.
    #[error("not logged in")]
    NotLoggedIn,
    #[error("wrong username or password")]
    BadCredentials,
    #[error("bad two-factor code")]
    BadTwoFactorCode,
    /// App lookup failed to resolve an owning team.
    #[error("team not selected")]
    TeamNotSelected,
    /// A polling loop was torn down by its cancellation token.
    #[error("operation cancelled")]
    Cancelled,
    #[error("transport error: {0}")]
    Transport(#[from] reqwest_middleware::Error),
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl From<reqwest::Error> for AscError {
    fn from(err: reqwest::Error) -> Self {
        AscError::Transport(err.into())
    }
}

impl AscError {
    /// Short human-readable title for CLI rendering.
    pub fn title(&self) -> &'static str {
        match self {
            AscError::MalformedRequest => "Malformed request",
            AscError::ServiceKeyMissing => "Service key missing",
            AscError::BadJson => "Bad JSON",
            AscError::UnexpectedReply => "Unexpected reply",
            AscError::SecurityCodeLocked => "Security code locked",
            AscError::TooManyCodesSent => "Too many codes sent",
            AscError::TooManyCodesValidated => "Too many codes validated",
            AscError::NotLoggedIn => "Not logged in",
            AscError::BadCredentials => "Wrong username or password",
            AscError::BadTwoFactorCode => "Bad 2FA code",
            AscError::TeamNotSelected => "Team not selected",
            AscError::Cancelled => "Cancelled",
            AscError::Transport(_) => "Network error",
            AscError::Storage(_) => "Storage error",
        }
    }

    /// Whether retrying the same call can ever succeed without the
    /// caller changing something first.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AscError::ServiceKeyMissing
                | AscError::BadJson
                | AscError::UnexpectedReply
                | AscError::Transport(_)
        )
    }
}
