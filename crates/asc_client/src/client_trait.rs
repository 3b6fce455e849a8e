use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use asc_core::{App, InAppPurchase, OfferCampaign, PromoCode, PromoCodesInfo, Team};

use crate::auth::{LoginOutcome, SessionInfo};
use crate::error::AscError;

/// Contract between the client and its collaborators (the CLI, tests).
/// Everything a front end needs: the login conversation, listings and
/// the four code-creation operations.
#[async_trait]
pub trait AscClientTrait: Send + Sync {
    /// Starts a login. Resolves to a live session or to a two-factor
    /// challenge that must be completed via `submit_challenge_code`.
    async fn begin_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginOutcome, AscError>;

    /// Asks for an SMS code on a trusted phone while a challenge is
    /// pending.
    async fn resend_code(&self, phone_id: i64) -> Result<(), AscError>;

    /// Completes a pending two-factor challenge. `phone_id` is set when
    /// the code was sent to a phone rather than to trusted devices.
    async fn submit_challenge_code(
        &self,
        code: &str,
        phone_id: Option<i64>,
    ) -> Result<SessionInfo, AscError>;

    async fn is_logged_in(&self) -> bool;

    /// Cached teams, sorted by name ascending, apps included.
    async fn teams(&self) -> Result<Vec<Team>, AscError>;

    /// Which cached team owns the given app, if any.
    async fn team_id_for_app(&self, app_id: &str) -> Option<i64>;

    async fn apps_for(
        &self,
        team_id: i64,
        include_unreleased: bool,
    ) -> Result<Vec<App>, AscError>;

    /// Promo-code facts for the app's promotable version.
    async fn promo_code_info(&self, app_id: &str) -> Result<PromoCodesInfo, AscError>;

    async fn iaps_for(&self, app_id: &str) -> Result<Vec<InAppPurchase>, AscError>;

    /// Classic app codes: creation POST plus history polling. The
    /// optional token aborts the polling wait.
    async fn request_app_codes(
        &self,
        app_id: &str,
        version_id: i64,
        quantity: u32,
        contract_filename: &str,
        cancel: Option<CancellationToken>,
    ) -> Result<Vec<PromoCode>, AscError>;

    async fn request_iap_codes(
        &self,
        app_id: &str,
        iap_id: &str,
        quantity: u32,
        cancel: Option<CancellationToken>,
    ) -> Result<Vec<PromoCode>, AscError>;

    /// Creates a subscription-offer campaign; the result carries the
    /// service-assigned id.
    async fn create_offer_campaign(
        &self,
        app_id: &str,
        iap_id: &str,
        campaign: &OfferCampaign,
    ) -> Result<OfferCampaign, AscError>;

    /// Issues offer codes against an existing campaign, retrieved via
    /// CSV export rather than history polling.
    async fn create_offer_codes(
        &self,
        app_id: &str,
        iap_id: &str,
        campaign_id: i64,
        quantity: u32,
    ) -> Result<Vec<PromoCode>, AscError>;
}
