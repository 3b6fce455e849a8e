pub(crate) mod auth_handler;
pub(crate) mod responses;

use asc_core::Team;
use serde::{Deserialize, Serialize};

/// What `begin_login` resolved to. The console's untyped info
/// dictionaries stop at the network boundary.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    Authenticated(SessionInfo),
    ChallengeIssued(TwoFactorChallenge),
}

/// A trusted phone number offered for the two-factor challenge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhoneNumber {
    pub id: i64,
    pub number: String,
}

/// Detail of an issued two-factor challenge.
///
/// `did_send_code` is true when a code is already on its way (pushed to
/// trusted devices, or texted to the lone trusted number). Otherwise
/// the caller must pick one of `phone_numbers` and call `resend_code`
/// before submitting.
#[derive(Debug, Clone)]
pub struct TwoFactorChallenge {
    pub did_send_code: bool,
    pub via_trusted_device: bool,
    /// Sorted ascending by id.
    pub phone_numbers: Vec<PhoneNumber>,
    /// The number an automatic SMS went to, if any.
    pub resend_to: Option<PhoneNumber>,
}

/// Produced once every team's app list has been primed.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub person_id: String,
    /// The team the remote shared session considered active, if any.
    pub active_team_id: Option<i64>,
    /// Sorted ascending by team name.
    pub teams: Vec<Team>,
}
