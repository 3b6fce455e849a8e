use std::sync::Arc;

use log::info;
use reqwest::Method;
use serde_json::json;

use asc_core::{storefront_countries, OfferCampaign, PromoCode};

use crate::api::apps_handler;
use crate::api::models::OfferReply;
use crate::error::AscError;
use crate::session::SessionContext;
use crate::state::SharedState;
use crate::utils::http_utils::{contains_error_markers, execute_request};

/// Subscription-offer campaigns and their codes. Offer codes are not
/// polled out of the history; they come back through a CSV export once
/// the batch id is known.
#[derive(Debug)]
pub(crate) struct OffersHandler {
    state: Arc<SharedState>,
}

impl OffersHandler {
    pub(crate) fn new(state: Arc<SharedState>) -> Self {
        OffersHandler { state }
    }

    /// Creates one campaign for the (app, IAP, tier, eligibility,
    /// duration, type) tuple, spanning the full storefront country set.
    /// Returns the campaign with its service-assigned id filled in.
    pub(crate) async fn create_campaign(
        &self,
        app_id: &str,
        iap_id: &str,
        campaign: &OfferCampaign,
    ) -> Result<OfferCampaign, AscError> {
        self.state.require_logged_in().await?;
        if app_id.trim().is_empty()
            || iap_id.trim().is_empty()
            || campaign.reference_name.trim().is_empty()
        {
            return Err(AscError::MalformedRequest);
        }
        let context = self.state.session_for_app(app_id).await?;

        let url = format!(
            "{}/WebObjects/iTunesConnect.woa/ra/apps/{app_id}/iaps/{iap_id}/pricing/subscriptionOffers",
            self.state.config.console_host
        );
        let tier = campaign.price_tier.0.to_string();
        let prices: Vec<serde_json::Value> = storefront_countries()
            .iter()
            .map(|country| {
                json!({
                    "country": country.code,
                    "currency": country.currency,
                    "tierStem": tier,
                })
            })
            .collect();
        let mut body = serde_json::to_value(campaign).map_err(|_| AscError::MalformedRequest)?;
        body["prices"] = json!(prices);

        let id = self
            .submit_and_parse_id(&context, &url, &body, "ids:")
            .await?;
        info!("Created offer campaign {id} for IAP {iap_id}");
        Ok(OfferCampaign {
            id: Some(id),
            ..campaign.clone()
        })
    }

    /// Issues codes against an existing campaign and downloads them via
    /// the batch CSV export.
    pub(crate) async fn create_codes(
        &self,
        app_id: &str,
        iap_id: &str,
        campaign_id: i64,
        quantity: u32,
    ) -> Result<Vec<PromoCode>, AscError> {
        self.state.require_logged_in().await?;
        if app_id.trim().is_empty() || iap_id.trim().is_empty() || campaign_id == 0 || quantity == 0
        {
            return Err(AscError::MalformedRequest);
        }
        let context = self.state.session_for_app(app_id).await?;

        let base = format!(
            "{}/WebObjects/iTunesConnect.woa/ra/apps/{app_id}/iaps/{iap_id}/pricing/subscriptionOffers",
            self.state.config.console_host
        );
        let url = format!("{base}/{campaign_id}/codes");
        let body = json!({ "numberOfCodes": quantity });
        let batch_id = self
            .submit_and_parse_id(&context, &url, &body, "id:")
            .await?;
        info!("Offer code batch {batch_id} created, fetching export");

        let export_url = format!("{base}/{campaign_id}/codes/{batch_id}/export");
        let widget_key = self.state.widget_key().await;
        let response = execute_request(
            context.client(),
            Method::GET,
            &export_url,
            Some(&widget_key),
            &[],
            None,
            None,
        )
        .await?;
        apps_handler::check_session_status(response.status())?;
        let csv = response.text().await?;

        let codes = parse_csv_codes(&csv, &batch_id.to_string());
        if codes.is_empty() {
            return Err(AscError::UnexpectedReply);
        }
        Ok(codes)
    }

    /// POSTs the body and digs the created id out of the reply's info
    /// messages, where it trails the given separator.
    async fn submit_and_parse_id(
        &self,
        context: &SessionContext,
        url: &str,
        body: &serde_json::Value,
        separator: &str,
    ) -> Result<i64, AscError> {
        let widget_key = self.state.widget_key().await;
        let response = execute_request(
            context.client(),
            Method::POST,
            url,
            Some(&widget_key),
            &[],
            Some(body),
            None,
        )
        .await?;
        apps_handler::check_session_status(response.status())?;

        let text = response.text().await?;
        if contains_error_markers(&text) {
            return Err(AscError::UnexpectedReply);
        }
        let reply: OfferReply = serde_json::from_str(&text).map_err(|_| AscError::BadJson)?;
        reply
            .messages
            .as_ref()
            .map(|messages| messages.info.as_slice())
            .unwrap_or_default()
            .iter()
            .find_map(|message| parse_trailing_id(message, separator))
            .ok_or(AscError::UnexpectedReply)
    }
}

/// Pulls the numeric id following the last `separator` occurrence in a
/// human-readable info message.
fn parse_trailing_id(message: &str, separator: &str) -> Option<i64> {
    let (_, tail) = message.rsplit_once(separator)?;
    let digits: String = tail
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// One code per data row; the first row is the header.
fn parse_csv_codes(csv: &str, request_id: &str) -> Vec<PromoCode> {
    csv.lines()
        .skip(1)
        .filter_map(|line| line.split(',').next())
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(|code| PromoCode::offer(code.to_string(), request_id.to_string()))
        .collect()
}
