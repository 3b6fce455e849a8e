use std::sync::Arc;

use log::{debug, info};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

use asc_core::{App, InAppPurchase, PromoCodesInfo};

use crate::api::models::{IapsResponse, SummaryResponse, VersionsResponse};
use crate::error::AscError;
use crate::session::SessionContext;
use crate::state::SharedState;
use crate::utils::http_utils::execute_request;

/// App, IAP and promo-info listings, each running inside the owning
/// team's session context.
#[derive(Debug)]
pub(crate) struct AppsHandler {
    state: Arc<SharedState>,
}

impl AppsHandler {
    pub(crate) fn new(state: Arc<SharedState>) -> Self {
        AppsHandler { state }
    }

    /// Fetches the team's app list and refreshes the team cache.
    /// Expired sessions surface as `NotLoggedIn` so callers can
    /// distinguish re-auth from transient failure.
    pub(crate) async fn apps_for(
        &self,
        team_id: i64,
        include_unreleased: bool,
    ) -> Result<Vec<App>, AscError> {
        self.state.require_logged_in().await?;
        let context = self.state.session_for_team(team_id).await?;
        self.select_team(&context, team_id).await?;

        let url = format!(
            "{}/WebObjects/iTunesConnect.woa/ra/apps/manageyourapps/summary/v2",
            self.state.config.console_host
        );
        let widget_key = self.state.widget_key().await;
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
        check_session_status(response.status())?;

        let summary: SummaryResponse = response
            .json()
            .await
            .map_err(|_| AscError::BadJson)?;

        let mut apps: Vec<App> = summary
            .data
            .summaries
            .into_iter()
            .filter(|entry| !entry.is_bundle())
            .filter(|entry| include_unreleased || entry.is_sellable())
            .filter(|entry| !entry.adam_id.is_empty())
            .map(|entry| App {
                platform: entry.platforms(),
                id: entry.adam_id,
                sku: entry.vendor_id,
                icon_url: entry.icon_url,
                name: entry.name,
            })
            .collect();
        apps.sort_by(|a, b| b.id.cmp(&a.id));

        debug!("Team {team_id}: {} app(s) after filtering", apps.len());
        if let Some(team) = self.state.teams.write().await.get_mut(&team_id) {
            team.apps = apps.clone();
        }
        Ok(apps)
    }

    /// Promo-code facts for the app's promotable version.
    pub(crate) async fn promo_code_info(&self, app_id: &str) -> Result<PromoCodesInfo, AscError> {
        self.state.require_logged_in().await?;
        if app_id.trim().is_empty() {
            return Err(AscError::MalformedRequest);
        }
        let context = self.state.session_for_app(app_id).await?;

        let url = format!(
            "{}/WebObjects/iTunesConnect.woa/ra/apps/{app_id}/promocodes/versions",
            self.state.config.console_host
        );
        let widget_key = self.state.widget_key().await;
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
        check_session_status(response.status())?;

        let versions: VersionsResponse = response
            .json()
            .await
            .map_err(|_| AscError::BadJson)?;
        let entry = versions
            .data
            .versions
            .into_iter()
            .next()
            .ok_or(AscError::UnexpectedReply)?;

        Ok(PromoCodesInfo {
            version: entry.version,
            version_id: entry.id,
            contract_filename: entry.contract_file_name,
            codes_left: entry.maximum_number_of_codes - entry.number_of_codes,
        })
    }

    pub(crate) async fn iaps_for(&self, app_id: &str) -> Result<Vec<InAppPurchase>, AscError> {
        self.state.require_logged_in().await?;
        if app_id.trim().is_empty() {
            return Err(AscError::MalformedRequest);
        }
        let context = self.state.session_for_app(app_id).await?;

        let url = format!(
            "{}/WebObjects/iTunesConnect.woa/ra/apps/{app_id}/iaps",
            self.state.config.console_host
        );
        let widget_key = self.state.widget_key().await;
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
        check_session_status(response.status())?;

        let iaps: IapsResponse = response
            .json()
            .await
            .map_err(|_| AscError::BadJson)?;
        Ok(iaps
            .data
            .into_iter()
            .map(|entry| InAppPurchase {
                id: entry.adam_id.as_string(),
                name: entry.reference_name.clone(),
                codes_left: entry.maximum_number_of_codes - entry.number_of_codes,
                subscription: entry.is_subscription(),
                duration_days: entry.duration_days,
            })
            .collect())
    }

    /// Binds this context's jar to the team by echoing the session JSON
    /// back with the provider id replaced. Done once per listing call;
    /// the login jar is never switched.
    async fn select_team(
        &self,
        context: &SessionContext,
        team_id: i64,
    ) -> Result<(), AscError> {
        let url = format!("{}/olympus/v1/session", self.state.config.console_host);
        let widget_key = self.state.widget_key().await;

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
        check_session_status(response.status())?;
        let mut session: Value = response
            .json()
            .await
            .map_err(|_| AscError::BadJson)?;
        if !session.is_object() {
            return Err(AscError::UnexpectedReply);
        }
        session["provider"]["providerId"] = json!(team_id);

        let response = execute_request(
            context.client(),
            Method::POST,
            &url,
            Some(&widget_key),
            &[],
            Some(&session),
            None,
        )
        .await?;
        check_session_status(response.status())?;
        if !response.status().is_success() {
            return Err(AscError::UnexpectedReply);
        }
        info!("Session context bound to team {team_id}");
        Ok(())
    }
}

/// `401`/`400` from console endpoints means the session expired.
pub(crate) fn check_session_status(status: StatusCode) -> Result<(), AscError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::BAD_REQUEST {
        return Err(AscError::NotLoggedIn);
    }
    Ok(())
}
