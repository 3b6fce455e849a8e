use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use asc_core::{App, Config, InAppPurchase, OfferCampaign, PromoCode, PromoCodesInfo, Team};

use crate::api::apps_handler::AppsHandler;
use crate::api::codes_handler::CodesHandler;
use crate::api::offers_handler::OffersHandler;
use crate::auth::auth_handler::AuthHandler;
use crate::auth::{LoginOutcome, SessionInfo};
use crate::client_trait::AscClientTrait;
use crate::error::AscError;
use crate::state::SharedState;

/// The App Store Connect client. Explicitly constructed; each instance
/// owns its identity, team cache, session map and credential store, so
/// several can coexist in one process.
#[derive(Debug)]
pub struct AscClient {
    state: Arc<SharedState>,
    auth: AuthHandler,
    apps: AppsHandler,
    codes: CodesHandler,
    offers: OffersHandler,
}

impl AscClient {
    pub fn new(config: Config) -> Self {
        let state = Arc::new(SharedState::new(config));
        AscClient {
            auth: AuthHandler::new(Arc::clone(&state)),
            apps: AppsHandler::new(Arc::clone(&state)),
            codes: CodesHandler::new(Arc::clone(&state)),
            offers: OffersHandler::new(Arc::clone(&state)),
            state,
        }
    }
}

impl Default for AscClient {
    fn default() -> Self {
        AscClient::new(Config::new())
    }
}

#[async_trait]
impl AscClientTrait for AscClient {
    async fn begin_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginOutcome, AscError> {
        self.auth.begin_login(username, password).await
    }

    async fn resend_code(&self, phone_id: i64) -> Result<(), AscError> {
        self.auth.resend_code(phone_id).await
    }

    async fn submit_challenge_code(
        &self,
        code: &str,
        phone_id: Option<i64>,
    ) -> Result<SessionInfo, AscError> {
        self.auth.submit_challenge_code(code, phone_id).await
    }

    async fn is_logged_in(&self) -> bool {
        self.state.is_logged_in().await
    }

    async fn teams(&self) -> Result<Vec<Team>, AscError> {
        self.state.require_logged_in().await?;
        let mut teams: Vec<Team> = self.state.teams.read().await.values().cloned().collect();
        teams.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(teams)
    }

    async fn team_id_for_app(&self, app_id: &str) -> Option<i64> {
        self.state.team_id_for_app(app_id).await
    }

    async fn apps_for(
        &self,
        team_id: i64,
        include_unreleased: bool,
    ) -> Result<Vec<App>, AscError> {
        self.apps.apps_for(team_id, include_unreleased).await
    }

    async fn promo_code_info(&self, app_id: &str) -> Result<PromoCodesInfo, AscError> {
        self.apps.promo_code_info(app_id).await
    }

    async fn iaps_for(&self, app_id: &str) -> Result<Vec<InAppPurchase>, AscError> {
        self.apps.iaps_for(app_id).await
    }

    async fn request_app_codes(
        &self,
        app_id: &str,
        version_id: i64,
        quantity: u32,
        contract_filename: &str,
        cancel: Option<CancellationToken>,
    ) -> Result<Vec<PromoCode>, AscError> {
        self.codes
            .request_app_codes(app_id, version_id, quantity, contract_filename, cancel)
            .await
    }

    async fn request_iap_codes(
        &self,
        app_id: &str,
        iap_id: &str,
        quantity: u32,
        cancel: Option<CancellationToken>,
    ) -> Result<Vec<PromoCode>, AscError> {
        self.codes
            .request_iap_codes(app_id, iap_id, quantity, cancel)
            .await
    }

    async fn create_offer_campaign(
        &self,
        app_id: &str,
        iap_id: &str,
        campaign: &OfferCampaign,
    ) -> Result<OfferCampaign, AscError> {
        self.offers.create_campaign(app_id, iap_id, campaign).await
    }

    async fn create_offer_codes(
        &self,
        app_id: &str,
        iap_id: &str,
        campaign_id: i64,
        quantity: u32,
    ) -> Result<Vec<PromoCode>, AscError> {
        self.offers
            .create_codes(app_id, iap_id, campaign_id, quantity)
            .await
    }
}
