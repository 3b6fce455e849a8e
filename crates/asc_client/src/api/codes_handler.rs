use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone, Utc};
use log::{debug, info};
use reqwest::Method;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use asc_core::PromoCode;

use crate::api::apps_handler;
use crate::api::models::{CreationResponse, HistoryEntry, HistoryResponse};
use crate::error::AscError;
use crate::session::SessionContext;
use crate::state::SharedState;
use crate::utils::http_utils::execute_request;

/// Which history list a poll reads from.
#[derive(Debug, Clone, Copy)]
enum HistoryKind {
    App,
    Iap,
}

/// Classic promo-code creation: a slow POST acknowledges the request,
/// then the new codes are picked out of the history endpoint by
/// creation timestamp.
#[derive(Debug)]
pub(crate) struct CodesHandler {
    state: Arc<SharedState>,
}

impl CodesHandler {
    pub(crate) fn new(state: Arc<SharedState>) -> Self {
        CodesHandler { state }
    }

    pub(crate) async fn request_app_codes(
        &self,
        app_id: &str,
        version_id: i64,
        quantity: u32,
        contract_filename: &str,
        cancel: Option<CancellationToken>,
    ) -> Result<Vec<PromoCode>, AscError> {
        self.state.require_logged_in().await?;
        if app_id.trim().is_empty()
            || version_id == 0
            || quantity == 0
            || contract_filename.trim().is_empty()
        {
            return Err(AscError::MalformedRequest);
        }
        let context = self.state.session_for_app(app_id).await?;

        let url = format!(
            "{}/WebObjects/iTunesConnect.woa/ra/apps/{app_id}/promocodes/versions/",
            self.state.config.console_host
        );
        let body = json!([{
            "numberOfCodes": quantity,
            "agreedToContract": true,
            "versionId": version_id,
        }]);
        let created_after = self.submit_creation(&context, &url, &body).await?;

        let history_url = format!(
            "{}/WebObjects/iTunesConnect.woa/ra/apps/{app_id}/promocodes/history",
            self.state.config.console_host
        );
        self.poll_history(
            &context,
            &history_url,
            HistoryKind::App,
            created_after,
            cancel,
        )
        .await
    }

    pub(crate) async fn request_iap_codes(
        &self,
        app_id: &str,
        iap_id: &str,
        quantity: u32,
        cancel: Option<CancellationToken>,
    ) -> Result<Vec<PromoCode>, AscError> {
        self.state.require_logged_in().await?;
        if app_id.trim().is_empty() || iap_id.trim().is_empty() || quantity == 0 {
            return Err(AscError::MalformedRequest);
        }
        let context = self.state.session_for_app(app_id).await?;

        let url = format!(
            "{}/WebObjects/iTunesConnect.woa/ra/apps/{app_id}/promocodes/iaps",
            self.state.config.console_host
        );
        let body = json!([{
            "numberOfCodes": quantity,
            "agreedToContract": true,
            "adamId": iap_id,
        }]);
        let created_after = self.submit_creation(&context, &url, &body).await?;

        let history_url = format!(
            "{}/WebObjects/iTunesConnect.woa/ra/apps/{app_id}/promocodes/iap/history",
            self.state.config.console_host
        );
        self.poll_history(
            &context,
            &history_url,
            HistoryKind::Iap,
            created_after,
            cancel,
        )
        .await
    }

    /// Sends the creation POST and returns the watermark that separates
    /// pre-existing history entries from the ones this call created.
    /// Backdated one second to absorb clock skew against the service.
    async fn submit_creation(
        &self,
        context: &SessionContext,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<DateTime<Utc>, AscError> {
        let widget_key = self.state.widget_key().await;
        let created_after = Utc::now() - chrono::Duration::seconds(1);
        let timeout = Duration::from_secs(self.state.config.creation_timeout_secs);
        let response = execute_request(
            context.client(),
            Method::POST,
            url,
            Some(&widget_key),
            &[],
            Some(body),
            Some(timeout),
        )
        .await?;
        apps_handler::check_session_status(response.status())?;

        let creation: CreationResponse = response
            .json()
            .await
            .map_err(|_| AscError::BadJson)?;
        if creation.data.successful.is_empty() {
            return Err(AscError::UnexpectedReply);
        }
        info!("Code creation acknowledged, waiting for history");
        Ok(created_after)
    }

    async fn poll_history(
        &self,
        context: &SessionContext,
        url: &str,
        kind: HistoryKind,
        created_after: DateTime<Utc>,
        cancel: Option<CancellationToken>,
    ) -> Result<Vec<PromoCode>, AscError> {
        let widget_key = self.state.widget_key().await;
        let floor = Duration::from_secs(self.state.config.poll_min_interval_secs);
        let settle = Duration::from_secs(self.state.config.code_settle_delay_secs);

        // the service takes a few seconds to persist fresh codes, so
        // the first poll is delayed rather than wasted
        sleep_or_cancel(settle, cancel.as_ref()).await?;

        let mut attempts: u32 = 0;
        loop {
            if let Some(max) = self.state.config.poll_max_attempts {
                if attempts >= max {
                    debug!("Giving up after {attempts} history polls");
                    return Err(AscError::UnexpectedReply);
                }
            }
            attempts += 1;

            let started = Instant::now();
            let response = execute_request(
                context.client(),
                Method::GET,
                url,
                Some(&widget_key),
                &[],
                None,
                None,
            )
            .await?;
            apps_handler::check_session_status(response.status())?;
            let history: HistoryResponse = response
                .json()
                .await
                .map_err(|_| AscError::BadJson)?;

            let entries = match kind {
                HistoryKind::App => history.data.requests,
                HistoryKind::Iap => history.data.promo_code_requests,
            };
            let codes = collect_new_codes(&entries, created_after);
            if !codes.is_empty() {
                info!("Found {} new code(s) after {attempts} poll(s)", codes.len());
                return Ok(codes);
            }

            let delay = next_poll_delay(started.elapsed(), floor);
            debug!("History poll {attempts} empty, next in {delay:?}");
            sleep_or_cancel(delay, cancel.as_ref()).await?;
        }
    }
}

/// Keeps the rate floor between polls without stacking it on top of
/// slow requests. A poll that already took longer than the floor is
/// followed almost immediately.
fn next_poll_delay(elapsed: Duration, floor: Duration) -> Duration {
    floor
        .saturating_sub(elapsed)
        .max(Duration::from_millis(10))
}

/// One `PromoCode` per code string, from entries created strictly after
/// the watermark. Entries without codes or without both timestamps are
/// someone else's concern.
fn collect_new_codes(entries: &[HistoryEntry], created_after: DateTime<Utc>) -> Vec<PromoCode> {
    let mut codes = Vec::new();
    for entry in entries {
        if entry.codes.is_empty() {
            continue;
        }
        let (Some(effective), Some(expiration)) = (entry.effective_date, entry.expiration_date)
        else {
            continue;
        };
        let (Some(creation_date), Some(expiration_date)) = (
            Utc.timestamp_millis_opt(effective).single(),
            Utc.timestamp_millis_opt(expiration).single(),
        ) else {
            continue;
        };
        if creation_date <= created_after {
            // present before our request went out
            continue;
        }

        let request_id = entry
            .id
            .as_ref()
            .map(|id| id.as_string())
            .unwrap_or_default();
        for code in &entry.codes {
            let mut promo = PromoCode::classic(
                code.clone(),
                creation_date,
                expiration_date,
                request_id.clone(),
            );
            if let Some(version) = &entry.version {
                promo.platform = Some(version.platform.clone());
                promo.version = Some(version.version.clone());
            }
            codes.push(promo);
        }
    }
    codes
}

async fn sleep_or_cancel(
    delay: Duration,
    cancel: Option<&CancellationToken>,
) -> Result<(), AscError> {
    match cancel {
        Some(token) => {
            tokio::select! {
                _ = token.cancelled() => Err(AscError::Cancelled),
                _ = tokio::time::sleep(delay) => Ok(()),
            }
        }
        None => {
            tokio::time::sleep(delay).await;
            Ok(())
        }
    }
}
