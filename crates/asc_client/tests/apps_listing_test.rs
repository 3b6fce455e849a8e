//! Integration tests for app, IAP and promo-info listings.

use asc_client::{AscClientTrait, AscError};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use test_utils::{harness, login_single_team, summary_app, summary_body};

#[tokio::test]
async fn listing_requires_login() {
    let harness = harness().await;
    assert!(matches!(
        harness.client.apps_for(1, false).await,
        Err(AscError::NotLoggedIn)
    ));
    assert!(matches!(
        harness.client.iaps_for("100").await,
        Err(AscError::NotLoggedIn)
    ));
}

#[tokio::test]
async fn bundles_and_removed_apps_are_filtered_and_sorted() {
    let harness = harness().await;
    let bundle = json!({
        "adamId": "999",
        "name": "A Bundle",
        "vendorId": "SKU-999",
        "iconUrl": "",
        "versionSets": [{ "type": "BUNDLE", "platformString": "ios" }],
    });
    let no_id = json!({
        "adamId": "",
        "name": "Ghost",
        "vendorId": "",
        "iconUrl": "",
        "versionSets": [{ "type": "APP", "platformString": "ios",
            "deliverableVersion": { "state": "readyForSale" } }],
    });
    login_single_team(
        &harness,
        1,
        &[
            summary_app("100", "Low", "ios", "readyForSale"),
            summary_app("500", "Gone", "ios", "developerRemovedFromSale"),
            summary_app("300", "High", "osx", "readyForSale"),
            bundle,
            no_id,
        ],
    )
    .await;

    let apps = harness.client.apps_for(1, false).await.expect("apps");
    let ids: Vec<&str> = apps.iter().map(|app| app.id.as_str()).collect();
    assert_eq!(ids, vec!["300", "100"], "sorted by id descending");

    // the removed-from-sale app comes back once unreleased are included
    let apps = harness.client.apps_for(1, true).await.expect("apps");
    let ids: Vec<&str> = apps.iter().map(|app| app.id.as_str()).collect();
    assert_eq!(ids, vec!["500", "300", "100"]);
}

#[tokio::test]
async fn platforms_join_across_version_sets() {
    let harness = harness().await;
    let multi = json!({
        "adamId": "700",
        "name": "Everywhere",
        "vendorId": "SKU-700",
        "iconUrl": "",
        "versionSets": [
            { "type": "APP", "platformString": "ios",
                "deliverableVersion": { "state": "readyForSale" } },
            { "type": "APP", "platformString": "osx" },
            { "type": "APP", "platformString": "ios" },
        ],
    });
    login_single_team(&harness, 1, &[multi]).await;

    let apps = harness.client.apps_for(1, false).await.expect("apps");
    assert_eq!(apps.len(), 1);
    assert_eq!(apps[0].platform, "ios,osx");
    assert_eq!(apps[0].sku, "SKU-700");
}

#[tokio::test]
async fn expired_session_maps_to_not_logged_in() {
    let harness = harness().await;
    login_single_team(&harness, 1, &[summary_app("100", "One", "ios", "readyForSale")]).await;

    harness.server.reset().await;
    Mock::given(method("GET"))
        .and(path("/olympus/v1/session"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&harness.server)
        .await;

    let result = harness.client.apps_for(1, false).await;
    assert!(matches!(result, Err(AscError::NotLoggedIn)));
}

#[tokio::test]
async fn promo_info_reads_the_first_version_entry() {
    let harness = harness().await;
    login_single_team(&harness, 1, &[summary_app("100", "One", "ios", "readyForSale")]).await;

    Mock::given(method("GET"))
        .and(path(
            "/WebObjects/iTunesConnect.woa/ra/apps/100/promocodes/versions",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "versions": [
                {
                    "version": "2.1.0",
                    "id": 880044,
                    "contractFileName": "contract-2026.pdf",
                    "maximumNumberOfCodes": 100,
                    "numberOfCodes": 12,
                },
                {
                    "version": "2.0.0",
                    "id": 880001,
                    "contractFileName": "old.pdf",
                    "maximumNumberOfCodes": 100,
                    "numberOfCodes": 100,
                },
            ]},
        })))
        .mount(&harness.server)
        .await;

    let info = harness
        .client
        .promo_code_info("100")
        .await
        .expect("promo info");
    assert_eq!(info.version, "2.1.0");
    assert_eq!(info.version_id, 880044);
    assert_eq!(info.contract_filename, "contract-2026.pdf");
    assert_eq!(info.codes_left, 88);
}

#[tokio::test]
async fn promo_info_for_unknown_app_is_team_not_selected() {
    let harness = harness().await;
    login_single_team(&harness, 1, &[summary_app("100", "One", "ios", "readyForSale")]).await;

    let result = harness.client.promo_code_info("424242").await;
    assert!(matches!(result, Err(AscError::TeamNotSelected)));
}

#[tokio::test]
async fn iaps_report_codes_left_and_subscription_shape() {
    let harness = harness().await;
    login_single_team(&harness, 1, &[summary_app("100", "One", "ios", "readyForSale")]).await;

    Mock::given(method("GET"))
        .and(path("/WebObjects/iTunesConnect.woa/ra/apps/100/iaps"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {
                    "adamId": 5501,
                    "referenceName": "Monthly Pro",
                    "maximumNumberOfCodes": 100,
                    "numberOfCodes": 40,
                    "addOnType": "recurring",
                    "durationDays": 30,
                },
                {
                    "adamId": "5502",
                    "referenceName": "Coin Pack",
                    "maximumNumberOfCodes": 100,
                    "numberOfCodes": 0,
                    "addOnType": "consumable",
                },
            ],
        })))
        .mount(&harness.server)
        .await;

    let iaps = harness.client.iaps_for("100").await.expect("iaps");
    assert_eq!(iaps.len(), 2);
    assert_eq!(iaps[0].id, "5501");
    assert_eq!(iaps[0].codes_left, 60);
    assert!(iaps[0].subscription);
    assert_eq!(iaps[0].duration_days, Some(30));
    assert_eq!(iaps[1].id, "5502");
    assert!(!iaps[1].subscription);
    assert_eq!(iaps[1].duration_days, None);
}
