use std::sync::Arc;

use futures_util::future::try_join_all;
use log::{debug, info, warn};
use reqwest::{Method, StatusCode};
use serde_json::json;

use asc_core::Team;

use crate::api::apps_handler::AppsHandler;
use crate::auth::responses::{AppConfigResponse, ChallengeResponse, SessionResponse};
use crate::auth::{LoginOutcome, PhoneNumber, SessionInfo, TwoFactorChallenge};
use crate::error::AscError;
use crate::session::SessionContext;
use crate::state::{ChallengeTokens, SharedState};
use crate::utils::http_utils::{
    contains_error_markers, execute_request, HEADER_SCNT, HEADER_SESSION_ID,
};

/// Drives the login state machine: bootstrap key, signin, the
/// two-factor challenge branch and the shared session-data tail.
#[derive(Debug)]
pub(crate) struct AuthHandler {
    state: Arc<SharedState>,
    apps: AppsHandler,
}

impl AuthHandler {
    pub(crate) fn new(state: Arc<SharedState>) -> Self {
        let apps = AppsHandler::new(Arc::clone(&state));
        AuthHandler { state, apps }
    }

    /// Runs the login sequence up to either a live session or an issued
    /// two-factor challenge. Resets all per-identity state first, so a
    /// failed attempt never leaks into the next one.
    pub(crate) async fn begin_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginOutcome, AscError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AscError::MalformedRequest);
        }

        let context = self.state.reset_for_login(username).await?;
        let service_key = self.fetch_service_key(&context).await?;
        self.state.identity.write().await.auth_service_key = service_key.clone();

        let signin_url = format!("{}/appleauth/auth/signin", self.state.config.auth_host);
        let body = json!({
            "accountName": username,
            "password": password,
            "rememberMe": true,
        });
        let response = execute_request(
            context.client(),
            Method::POST,
            &signin_url,
            Some(&service_key),
            &[],
            Some(&body),
            None,
        )
        .await?;

        match response.status() {
            StatusCode::CONFLICT => {
                // two-factor in effect; the challenge tokens arrive as
                // response headers and scope every follow-up call
                let session_id = header_value(&response, HEADER_SESSION_ID);
                let scnt = header_value(&response, HEADER_SCNT);
                let (Some(session_id), Some(scnt)) = (session_id, scnt) else {
                    return Err(AscError::UnexpectedReply);
                };

                let tokens = ChallengeTokens { session_id, scnt };
                self.state.identity.write().await.challenge = Some(tokens.clone());

                match self.fetch_challenge_detail(&context, &tokens).await {
                    Ok(challenge) => Ok(LoginOutcome::ChallengeIssued(challenge)),
                    Err(err) => {
                        self.state.identity.write().await.challenge = None;
                        Err(err)
                    }
                }
            }
            StatusCode::UNAUTHORIZED => Err(AscError::BadCredentials),
            StatusCode::OK => {
                // 2FA disabled, or cookies from an earlier session are
                // still valid
                let text = response.text().await?;
                if text.contains("serviceErrors") {
                    warn!("Signin reply carried service errors");
                    return Err(AscError::UnexpectedReply);
                }
                info!("Signed in directly, loading session data");
                let info = self.load_session_data().await?;
                Ok(LoginOutcome::Authenticated(info))
            }
            status => {
                warn!("Signin failed with status {status}");
                Err(AscError::UnexpectedReply)
            }
        }
    }

    async fn fetch_service_key(&self, context: &SessionContext) -> Result<String, AscError> {
        let url = format!(
            "{}/olympus/v1/app/config?hostname=itunesconnect.apple.com",
            self.state.config.console_host
        );
        let response =
            execute_request(context.client(), Method::GET, &url, None, &[], None, None).await?;
        let config: AppConfigResponse = response
            .json()
            .await
            .map_err(|_| AscError::BadJson)?;
        if config.auth_service_key.is_empty() {
            return Err(AscError::ServiceKeyMissing);
        }
        Ok(config.auth_service_key)
    }

    /// Retrieves challenge detail and decides whether a code is already
    /// on its way. Account lockout flags fail here, before any code is
    /// asked of the user.
    async fn fetch_challenge_detail(
        &self,
        context: &SessionContext,
        tokens: &ChallengeTokens,
    ) -> Result<TwoFactorChallenge, AscError> {
        let url = format!("{}/appleauth/auth", self.state.config.auth_host);
        let widget_key = self.state.widget_key().await;
        let response = execute_request(
            context.client(),
            Method::GET,
            &url,
            Some(&widget_key),
            &challenge_headers(tokens),
            None,
            None,
        )
        .await?;

        let detail: ChallengeResponse = response
            .json()
            .await
            .map_err(|_| AscError::BadJson)?;

        let mut phones = detail.trusted_phone_numbers;
        phones.sort_by_key(|phone| phone.id);

        let no_trusted_devices = detail.no_trusted_devices;
        if (no_trusted_devices || detail.trusted_devices.is_empty()) && phones.is_empty() {
            return Err(AscError::UnexpectedReply);
        }

        if let Some(status) = &detail.security_code {
            if status.security_code_locked {
                return Err(AscError::SecurityCodeLocked);
            }
            if status.too_many_codes_sent {
                return Err(AscError::TooManyCodesSent);
            }
            if status.too_many_codes_validated {
                return Err(AscError::TooManyCodesValidated);
            }
        }

        let via_trusted_device = !no_trusted_devices;
        let sms_pushed = no_trusted_devices
            && !phones.is_empty()
            && detail.security_code.is_some()
            && detail
                .trusted_phone_number
                .as_ref()
                .and_then(|phone| phone.push_mode.as_deref())
                == Some("sms");
        let did_send_code = sms_pushed || via_trusted_device;

        let resend_to = if did_send_code && !via_trusted_device {
            detail.trusted_phone_number.as_ref().map(|phone| PhoneNumber {
                id: phone.id,
                number: phone.number_with_dial_code.clone(),
            })
        } else {
            None
        };

        debug!(
            "Challenge detail: {} phones, trusted devices {}, code sent {}",
            phones.len(),
            via_trusted_device,
            did_send_code
        );

        Ok(TwoFactorChallenge {
            did_send_code,
            via_trusted_device,
            phone_numbers: phones
                .into_iter()
                .map(|phone| PhoneNumber {
                    id: phone.id,
                    number: phone.number_with_dial_code,
                })
                .collect(),
            resend_to,
        })
    }

    /// Asks for an SMS code on the given trusted number. Valid only
    /// while a challenge is pending.
    pub(crate) async fn resend_code(&self, phone_id: i64) -> Result<(), AscError> {
        let tokens = self.challenge_tokens().await?;
        let context = self.state.login_context().await?;
        let widget_key = self.state.widget_key().await;

        let url = format!("{}/appleauth/auth/verify/phone", self.state.config.auth_host);
        let body = json!({
            "phoneNumber": { "id": phone_id },
            "mode": "sms",
        });
        let response = execute_request(
            context.client(),
            Method::PUT,
            &url,
            Some(&widget_key),
            &challenge_headers(&tokens),
            Some(&body),
            None,
        )
        .await?;

        let text = response.text().await?;
        if text.is_empty() || contains_error_markers(&text) {
            return Err(AscError::UnexpectedReply);
        }
        Ok(())
    }

    /// Submits the six-digit code. `phone_id` is set when the code went
    /// to a phone rather than to trusted devices; the verification
    /// endpoint differs between the two.
    pub(crate) async fn submit_challenge_code(
        &self,
        code: &str,
        phone_id: Option<i64>,
    ) -> Result<SessionInfo, AscError> {
        if code.trim().is_empty() {
            return Err(AscError::MalformedRequest);
        }
        let tokens = self.challenge_tokens().await?;
        let context = self.state.login_context().await?;
        let widget_key = self.state.widget_key().await;

        let (url, body) = match phone_id {
            None => (
                format!(
                    "{}/appleauth/auth/verify/trusteddevice/securitycode",
                    self.state.config.auth_host
                ),
                json!({ "securityCode": { "code": code } }),
            ),
            Some(id) => (
                format!(
                    "{}/appleauth/auth/verify/phone/securitycode",
                    self.state.config.auth_host
                ),
                json!({
                    "securityCode": { "code": code },
                    "phoneNumber": { "id": id },
                    "mode": "sms",
                }),
            ),
        };

        let response = execute_request(
            context.client(),
            Method::POST,
            &url,
            Some(&widget_key),
            &challenge_headers(&tokens),
            Some(&body),
            None,
        )
        .await?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            return Err(AscError::BadTwoFactorCode);
        }
        let text = response.text().await?;
        if contains_error_markers(&text) {
            return Err(AscError::UnexpectedReply);
        }

        // mark this browser context trusted so the cookies persisted
        // below survive the next login
        let trust_url = format!("{}/appleauth/auth/2sv/trust", self.state.config.auth_host);
        execute_request(
            context.client(),
            Method::GET,
            &trust_url,
            Some(&widget_key),
            &challenge_headers(&tokens),
            None,
            None,
        )
        .await?;

        let info = self.load_session_data().await?;
        self.state.identity.write().await.challenge = None;
        Ok(info)
    }

    /// Shared tail of every successful login path: session JSON, teams,
    /// one primed app list per team. Only reports success once every
    /// team's apps are in.
    pub(crate) async fn load_session_data(&self) -> Result<SessionInfo, AscError> {
        let context = self.state.login_context().await?;
        let widget_key = self.state.widget_key().await;

        let url = format!("{}/olympus/v1/session", self.state.config.console_host);
        let response = execute_request(
            context.client(),
            Method::GET,
            &url,
            Some(&widget_key),
            &[],
            None,
            None,
        )
        .await?;
        let session: SessionResponse = response
            .json()
            .await
            .map_err(|_| AscError::BadJson)?;

        let person_id = session
            .user
            .as_ref()
            .map(|user| user.prs_id.clone())
            .filter(|id| !id.is_empty())
            .ok_or(AscError::UnexpectedReply)?;
        let active_team_id = session.provider.as_ref().map(|provider| provider.provider_id);

        {
            let mut teams = self.state.teams.write().await;
            teams.clear();
            for provider in &session.available_providers {
                teams.insert(
                    provider.provider_id,
                    Team {
                        id: provider.provider_id,
                        name: provider.name.clone(),
                        apps: Vec::new(),
                    },
                );
            }
        }
        self.state.identity.write().await.person_id = Some(person_id.clone());

        // prime every team's app list; any failure fails the login
        let team_ids: Vec<i64> = session
            .available_providers
            .iter()
            .map(|provider| provider.provider_id)
            .collect();
        info!("Priming app lists for {} team(s)", team_ids.len());
        try_join_all(
            team_ids
                .iter()
                .map(|team_id| self.apps.apps_for(*team_id, false)),
        )
        .await?;

        let mut teams: Vec<Team> = self.state.teams.read().await.values().cloned().collect();
        teams.sort_by(|a, b| a.name.cmp(&b.name));

        self.state.persist_cookies().await;

        Ok(SessionInfo {
            person_id,
            active_team_id,
            teams,
        })
    }

    async fn challenge_tokens(&self) -> Result<ChallengeTokens, AscError> {
        self.state
            .identity
            .read()
            .await
            .challenge
            .clone()
            .ok_or(AscError::NotLoggedIn)
    }
}

fn challenge_headers(tokens: &ChallengeTokens) -> [(&'static str, &str); 2] {
    [
        (HEADER_SESSION_ID, tokens.session_id.as_str()),
        (HEADER_SCNT, tokens.scnt.as_str()),
    ]
}

fn header_value(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
