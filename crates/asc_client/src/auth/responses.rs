//! Typed bodies for the authentication endpoints. Unknown fields are
//! ignored everywhere; the remote payloads carry far more than we read.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

/// GET /olympus/v1/app/config
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AppConfigResponse {
    #[serde(default)]
    pub auth_service_key: String,
}

/// GET /appleauth/auth, issued while a challenge is pending.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChallengeResponse {
    #[serde(default)]
    pub trusted_devices: HashMap<String, Value>,
    #[serde(default)]
    pub trusted_phone_numbers: Vec<TrustedPhone>,
    #[serde(default)]
    pub no_trusted_devices: bool,
    #[serde(default)]
    pub security_code: Option<SecurityCodeStatus>,
    /// The number an automatic SMS went to, when there is exactly one.
    #[serde(default)]
    pub trusted_phone_number: Option<TrustedPhone>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TrustedPhone {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub number_with_dial_code: String,
    #[serde(default)]
    pub push_mode: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SecurityCodeStatus {
    #[serde(default)]
    pub security_code_locked: bool,
    #[serde(default)]
    pub too_many_codes_sent: bool,
    #[serde(default)]
    pub too_many_codes_validated: bool,
}

/// GET /olympus/v1/session
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionResponse {
    #[serde(default)]
    pub available_providers: Vec<ProviderEntry>,
    #[serde(default)]
    pub provider: Option<ProviderEntry>,
    #[serde(default)]
    pub user: Option<SessionUser>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProviderEntry {
    pub provider_id: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionUser {
    #[serde(default)]
    pub prs_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_response_decodes_partial_payload() {
        let body = r#"{
            "trustedPhoneNumbers": [
                {"id": 2, "numberWithDialCode": "+1 (•••) •••-••02", "pushMode": "sms"},
                {"id": 1, "numberWithDialCode": "+49 •••• •••••01", "pushMode": "sms"}
            ],
            "noTrustedDevices": true,
            "securityCode": {"length": 6}
        }"#;
        let parsed: ChallengeResponse = serde_json::from_str(body).expect("decode");
        assert_eq!(parsed.trusted_phone_numbers.len(), 2);
        assert!(parsed.no_trusted_devices);
        assert!(parsed.trusted_devices.is_empty());
        let code = parsed.security_code.expect("securityCode present");
        assert!(!code.security_code_locked);
    }

    #[test]
    fn session_response_decodes_providers_and_user() {
        let body = r#"{
            "availableProviders": [
                {"providerId": 100, "name": "Team A", "contentTypes": ["SOFTWARE"]},
                {"providerId": 200, "name": "Team B"}
            ],
            "provider": {"providerId": 200, "name": "Team B"},
            "user": {"prsId": "424242", "fullName": "Some One"}
        }"#;
        let parsed: SessionResponse = serde_json::from_str(body).expect("decode");
        assert_eq!(parsed.available_providers.len(), 2);
        assert_eq!(parsed.provider.expect("provider").provider_id, 200);
        assert_eq!(parsed.user.expect("user").prs_id, "424242");
    }
}
