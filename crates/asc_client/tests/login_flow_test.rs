//! Integration tests for the login conversation: direct signin, the
//! two-factor challenge branches and session-data priming.

use asc_client::{AscClientTrait, AscError, LoginOutcome};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use test_utils::{
    app_config_body, harness, mount_direct_login, summary_app, summary_body,
};

async fn mount_config(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/olympus/v1/app/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(app_config_body("widget-key-1")))
        .mount(server)
        .await;
}

fn challenge_signin_response() -> ResponseTemplate {
    ResponseTemplate::new(409)
        .insert_header("X-Apple-ID-Session-Id", "session-abc")
        .insert_header("scnt", "scnt-xyz")
        .set_body_json(json!({ "authType": "hsa2" }))
}

#[tokio::test]
async fn direct_login_primes_all_teams_sorted_by_name() {
    let harness = harness().await;
    let summary = summary_body(&[
        summary_app("100", "One", "ios", "readyForSale"),
        summary_app("300", "Three", "osx", "readyForSale"),
    ]);
    mount_direct_login(&harness.server, &[(2, "Zeta"), (1, "Alpha")], summary).await;

    let outcome = harness
        .client
        .begin_login("user@example.com", "hunter2")
        .await
        .expect("login");
    let LoginOutcome::Authenticated(info) = outcome else {
        panic!("expected direct authentication");
    };

    assert_eq!(info.person_id, "person-77");
    assert_eq!(info.active_team_id, Some(2));
    let names: Vec<&str> = info.teams.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Zeta"]);
    // every team's app list is primed before Authenticated is reported
    for team in &info.teams {
        assert_eq!(team.apps.len(), 2);
        assert_eq!(team.apps[0].id, "300");
    }
    assert!(harness.client.is_logged_in().await);
    // both teams list the app here, so either owner is acceptable
    assert!(harness.client.team_id_for_app("100").await.is_some());
    assert_eq!(harness.client.team_id_for_app("missing").await, None);
}

#[tokio::test]
async fn login_persists_cookies_for_the_identity() {
    let harness = harness().await;
    let summary = summary_body(&[summary_app("100", "One", "ios", "readyForSale")]);
    mount_direct_login(&harness.server, &[(1, "Team")], summary).await;

    harness
        .client
        .begin_login("user@example.com", "hunter2")
        .await
        .expect("login");

    let cookie_root = harness.data_dir.path().join("cookies");
    let stored: Vec<_> = std::fs::read_dir(&cookie_root)
        .expect("cookie root exists")
        .collect();
    assert!(!stored.is_empty(), "expected a namespaced cookie directory");
}

#[tokio::test]
async fn signin_unauthorized_is_bad_credentials() {
    let harness = harness().await;
    mount_config(&harness.server).await;
    Mock::given(method("POST"))
        .and(path("/appleauth/auth/signin"))
        .and(header("X-Apple-Widget-Key", "widget-key-1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&harness.server)
        .await;

    let result = harness.client.begin_login("user@example.com", "wrong").await;
    assert!(matches!(result, Err(AscError::BadCredentials)));
    assert!(!harness.client.is_logged_in().await);
}

#[tokio::test]
async fn conflict_without_challenge_headers_is_unexpected() {
    let harness = harness().await;
    mount_config(&harness.server).await;
    Mock::given(method("POST"))
        .and(path("/appleauth/auth/signin"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&harness.server)
        .await;

    let result = harness
        .client
        .begin_login("user@example.com", "hunter2")
        .await;
    assert!(matches!(result, Err(AscError::UnexpectedReply)));
}

#[tokio::test]
async fn empty_service_key_fails_before_signin() {
    let harness = harness().await;
    Mock::given(method("GET"))
        .and(path("/olympus/v1/app/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(app_config_body("")))
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/appleauth/auth/signin"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&harness.server)
        .await;

    let result = harness
        .client
        .begin_login("user@example.com", "hunter2")
        .await;
    assert!(matches!(result, Err(AscError::ServiceKeyMissing)));
}

#[tokio::test]
async fn challenge_with_multiple_phones_requires_selection() {
    let harness = harness().await;
    mount_config(&harness.server).await;
    Mock::given(method("POST"))
        .and(path("/appleauth/auth/signin"))
        .respond_with(challenge_signin_response())
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/appleauth/auth"))
        .and(header("X-Apple-Id-Session-Id", "session-abc"))
        .and(header("scnt", "scnt-xyz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "trustedPhoneNumbers": [
                { "id": 9, "numberWithDialCode": "+1 ••9", "pushMode": "sms" },
                { "id": 3, "numberWithDialCode": "+1 ••3", "pushMode": "sms" },
            ],
            "noTrustedDevices": true,
        })))
        .mount(&harness.server)
        .await;

    let outcome = harness
        .client
        .begin_login("user@example.com", "hunter2")
        .await
        .expect("challenge issued");
    let LoginOutcome::ChallengeIssued(challenge) = outcome else {
        panic!("expected a challenge");
    };
    assert!(!challenge.did_send_code);
    assert!(!challenge.via_trusted_device);
    let ids: Vec<i64> = challenge.phone_numbers.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![3, 9], "phones sorted ascending by id");
    assert!(challenge.resend_to.is_none());
}

#[tokio::test]
async fn trusted_devices_mean_the_code_was_pushed() {
    let harness = harness().await;
    mount_config(&harness.server).await;
    Mock::given(method("POST"))
        .and(path("/appleauth/auth/signin"))
        .respond_with(challenge_signin_response())
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/appleauth/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "trustedDevices": { "count": 2 },
            "trustedPhoneNumbers": [
                { "id": 1, "numberWithDialCode": "+1 ••1", "pushMode": "sms" },
            ],
            "noTrustedDevices": false,
            "securityCode": { "length": 6 },
        })))
        .mount(&harness.server)
        .await;

    let outcome = harness
        .client
        .begin_login("user@example.com", "hunter2")
        .await
        .expect("challenge issued");
    let LoginOutcome::ChallengeIssued(challenge) = outcome else {
        panic!("expected a challenge");
    };
    assert!(challenge.did_send_code);
    assert!(challenge.via_trusted_device);
    assert!(challenge.resend_to.is_none());
}

#[tokio::test]
async fn single_sms_phone_auto_sends_and_offers_resend() {
    let harness = harness().await;
    mount_config(&harness.server).await;
    Mock::given(method("POST"))
        .and(path("/appleauth/auth/signin"))
        .respond_with(challenge_signin_response())
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/appleauth/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "trustedPhoneNumbers": [
                { "id": 4, "numberWithDialCode": "+49 ••4", "pushMode": "sms" },
            ],
            "trustedPhoneNumber": { "id": 4, "numberWithDialCode": "+49 ••4", "pushMode": "sms" },
            "noTrustedDevices": true,
            "securityCode": { "length": 6 },
        })))
        .mount(&harness.server)
        .await;

    let outcome = harness
        .client
        .begin_login("user@example.com", "hunter2")
        .await
        .expect("challenge issued");
    let LoginOutcome::ChallengeIssued(challenge) = outcome else {
        panic!("expected a challenge");
    };
    assert!(challenge.did_send_code);
    assert!(!challenge.via_trusted_device);
    let resend = challenge.resend_to.expect("resend target");
    assert_eq!(resend.id, 4);
}

#[tokio::test]
async fn lockout_flags_fail_with_specific_errors() {
    let harness = harness().await;
    mount_config(&harness.server).await;
    Mock::given(method("POST"))
        .and(path("/appleauth/auth/signin"))
        .respond_with(challenge_signin_response())
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/appleauth/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "trustedPhoneNumbers": [
                { "id": 1, "numberWithDialCode": "+1 ••1", "pushMode": "sms" },
            ],
            "noTrustedDevices": true,
            "securityCode": { "tooManyCodesSent": true },
        })))
        .mount(&harness.server)
        .await;
    // a locked-out account must not be asked for a code
    Mock::given(method("PUT"))
        .and(path("/appleauth/auth/verify/phone"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&harness.server)
        .await;

    let result = harness
        .client
        .begin_login("user@example.com", "hunter2")
        .await;
    assert!(matches!(result, Err(AscError::TooManyCodesSent)));
}

#[tokio::test]
async fn challenge_without_devices_or_phones_is_unexpected() {
    let harness = harness().await;
    mount_config(&harness.server).await;
    Mock::given(method("POST"))
        .and(path("/appleauth/auth/signin"))
        .respond_with(challenge_signin_response())
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/appleauth/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "trustedPhoneNumbers": [],
            "noTrustedDevices": true,
        })))
        .mount(&harness.server)
        .await;

    let result = harness
        .client
        .begin_login("user@example.com", "hunter2")
        .await;
    assert!(matches!(result, Err(AscError::UnexpectedReply)));
}

#[tokio::test]
async fn submitting_the_sms_code_completes_the_login() {
    let harness = harness().await;
    mount_config(&harness.server).await;
    Mock::given(method("POST"))
        .and(path("/appleauth/auth/signin"))
        .respond_with(challenge_signin_response())
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/appleauth/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "trustedPhoneNumbers": [
                { "id": 4, "numberWithDialCode": "+49 ••4", "pushMode": "sms" },
            ],
            "trustedPhoneNumber": { "id": 4, "numberWithDialCode": "+49 ••4", "pushMode": "sms" },
            "noTrustedDevices": true,
            "securityCode": { "length": 6 },
        })))
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/appleauth/auth/verify/phone/securitycode"))
        .and(header("X-Apple-Id-Session-Id", "session-abc"))
        .and(header("scnt", "scnt-xyz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/appleauth/auth/2sv/trust"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&harness.server)
        .await;
    // session-data tail
    Mock::given(method("GET"))
        .and(path("/olympus/v1/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(test_utils::session_body(
            &[(1, "Team")],
            1,
            "person-77",
        )))
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/olympus/v1/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(test_utils::session_body(
            &[(1, "Team")],
            1,
            "person-77",
        )))
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path(
            "/WebObjects/iTunesConnect.woa/ra/apps/manageyourapps/summary/v2",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(summary_body(&[summary_app(
            "100",
            "One",
            "ios",
            "readyForSale",
        )])))
        .mount(&harness.server)
        .await;

    let outcome = harness
        .client
        .begin_login("user@example.com", "hunter2")
        .await
        .expect("challenge issued");
    assert!(matches!(outcome, LoginOutcome::ChallengeIssued(_)));

    let info = harness
        .client
        .submit_challenge_code("123456", Some(4))
        .await
        .expect("code accepted");
    assert_eq!(info.person_id, "person-77");
    assert!(harness.client.is_logged_in().await);

    // the ephemeral challenge tokens are gone; a second submit attempt
    // has nothing to work with
    let again = harness.client.submit_challenge_code("123456", Some(4)).await;
    assert!(matches!(again, Err(AscError::NotLoggedIn)));
}

#[tokio::test]
async fn wrong_code_is_reported_as_bad_two_factor_code() {
    let harness = harness().await;
    mount_config(&harness.server).await;
    Mock::given(method("POST"))
        .and(path("/appleauth/auth/signin"))
        .respond_with(challenge_signin_response())
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/appleauth/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "trustedDevices": { "count": 1 },
            "trustedPhoneNumbers": [
                { "id": 1, "numberWithDialCode": "+1 ••1", "pushMode": "sms" },
            ],
            "noTrustedDevices": false,
            "securityCode": { "length": 6 },
        })))
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/appleauth/auth/verify/trusteddevice/securitycode"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "validationErrors": ["bad code"] })),
        )
        .mount(&harness.server)
        .await;

    harness
        .client
        .begin_login("user@example.com", "hunter2")
        .await
        .expect("challenge issued");
    let result = harness.client.submit_challenge_code("000000", None).await;
    assert!(matches!(result, Err(AscError::BadTwoFactorCode)));
}

#[tokio::test]
async fn resend_surfaces_embedded_error_markers() {
    let harness = harness().await;
    mount_config(&harness.server).await;
    Mock::given(method("POST"))
        .and(path("/appleauth/auth/signin"))
        .respond_with(challenge_signin_response())
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/appleauth/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "trustedPhoneNumbers": [
                { "id": 3, "numberWithDialCode": "+1 ••3", "pushMode": "sms" },
                { "id": 9, "numberWithDialCode": "+1 ••9", "pushMode": "sms" },
            ],
            "noTrustedDevices": true,
        })))
        .mount(&harness.server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/appleauth/auth/verify/phone"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "serviceErrors": [{ "code": "-20209" }] })),
        )
        .mount(&harness.server)
        .await;

    harness
        .client
        .begin_login("user@example.com", "hunter2")
        .await
        .expect("challenge issued");
    let result = harness.client.resend_code(3).await;
    assert!(matches!(result, Err(AscError::UnexpectedReply)));
}
