//! asc_core - Shared types for the App Store Connect promo-code client
//!
//! This crate provides the foundational pieces used by the client and CLI:
//! - `config` - host and polling configuration
//! - `models` - teams, apps, in-app purchases, promo codes, offer campaigns
//! - `pricing` - static storefront and price-tier reference data
//! - `paths` - on-disk locations for persisted session state

pub mod config;
pub mod models;
pub mod paths;
pub mod pricing;

// Re-export commonly used types
pub use config::Config;
pub use models::{
    App, CodeKind, InAppPurchase, OfferCampaign, OfferDuration, OfferEligibility, OfferType,
    PriceTier, PromoCode, PromoCodesInfo, Team,
};
pub use pricing::{storefront_countries, StorefrontCountry};
