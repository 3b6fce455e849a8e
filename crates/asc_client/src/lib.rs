//! Session-stateful client for the App Store Connect console: login
//! with multi-path two-factor auth, one isolated session per team, and
//! promo-code creation with history polling (classic) or CSV export
//! (subscription offers).

pub mod api;
pub mod auth;
pub mod client_trait;
pub mod error;

mod cookies;
mod session;
mod state;
mod utils;

pub use api::client::AscClient;
pub use asc_core::Config;
pub use auth::{LoginOutcome, PhoneNumber, SessionInfo, TwoFactorChallenge};
pub use client_trait::AscClientTrait;
pub use error::AscError;
