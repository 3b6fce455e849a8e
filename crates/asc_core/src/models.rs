use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An organizational scope ("provider") the logged-in identity belongs to.
/// The app list is populated lazily per team and cached here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Team {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub apps: Vec<App>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct App {
    /// Adam id, the store-wide identifier. Kept as a string, the summary
    /// endpoint reports it that way.
    pub id: String,
    pub sku: String,
    /// Comma-joined distinct platform strings ("ios", "osx", "appletvos").
    pub platform: String,
    pub icon_url: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InAppPurchase {
    pub id: String,
    pub name: String,
    /// Maximum allowed minus already issued.
    pub codes_left: i64,
    pub subscription: bool,
    pub duration_days: Option<u32>,
}

/// Promo-code facts for the single promotable version of an app.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromoCodesInfo {
    pub version: String,
    pub version_id: i64,
    pub contract_filename: String,
    pub codes_left: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CodeKind {
    /// Tied to a specific app version, retrieved via history polling.
    Classic,
    /// Tied to a subscription offer campaign, retrieved via CSV export.
    Offer,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromoCode {
    pub code: String,
    pub kind: CodeKind,
    /// Absent for offer codes until the service confirms them.
    pub creation_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub request_id: String,
    pub platform: Option<String>,
    pub version: Option<String>,
}

impl PromoCode {
    pub fn classic(
        code: String,
        creation_date: DateTime<Utc>,
        expiration_date: DateTime<Utc>,
        request_id: String,
    ) -> Self {
        PromoCode {
            code,
            kind: CodeKind::Classic,
            creation_date: Some(creation_date),
            expiration_date: Some(expiration_date),
            request_id,
            platform: None,
            version: None,
        }
    }

    pub fn offer(code: String, request_id: String) -> Self {
        PromoCode {
            code,
            kind: CodeKind::Offer,
            creation_date: None,
            expiration_date: None,
            request_id,
            platform: None,
            version: None,
        }
    }
}

/// The discrete offer lengths the console accepts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OfferDuration {
    #[serde(rename = "P3D")]
    ThreeDays,
    #[serde(rename = "P1W")]
    OneWeek,
    #[serde(rename = "P2W")]
    TwoWeeks,
    #[serde(rename = "P1M")]
    OneMonth,
    #[serde(rename = "P2M")]
    TwoMonths,
    #[serde(rename = "P3M")]
    ThreeMonths,
    #[serde(rename = "P6M")]
    SixMonths,
    #[serde(rename = "P1Y")]
    OneYear,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum OfferType {
    PayAsYouGo,
    PayUpFront,
    FreeTrial,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OfferEligibility {
    pub new_subscribers: bool,
    pub existing_subscribers: bool,
    pub expired_subscribers: bool,
}

/// Price tier reference; the per-country price is derived server-side.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceTier(pub u16);

/// A subscription offer campaign. `id` is assigned by the service on
/// creation and is `None` on the outbound request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OfferCampaign {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub reference_name: String,
    pub duration: OfferDuration,
    pub eligibility: OfferEligibility,
    pub offer_type: OfferType,
    pub price_tier: PriceTier,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offer_campaign_round_trips_through_wire_format() {
        let campaign = OfferCampaign {
            id: Some(8812),
            reference_name: "spring-promo".to_string(),
            duration: OfferDuration::ThreeMonths,
            eligibility: OfferEligibility {
                new_subscribers: true,
                existing_subscribers: false,
                expired_subscribers: true,
            },
            offer_type: OfferType::FreeTrial,
            price_tier: PriceTier(5),
        };

        let wire = serde_json::to_string(&campaign).expect("serialize");
        let parsed: OfferCampaign = serde_json::from_str(&wire).expect("parse");
        assert_eq!(parsed, campaign);
    }

    #[test]
    fn offer_duration_uses_iso_style_tags() {
        let wire = serde_json::to_string(&OfferDuration::OneWeek).expect("serialize");
        assert_eq!(wire, "\"P1W\"");
        let parsed: OfferDuration = serde_json::from_str("\"P1Y\"").expect("parse");
        assert_eq!(parsed, OfferDuration::OneYear);
    }

    #[test]
    fn classic_code_carries_both_timestamps() {
        let now = Utc::now();
        let code = PromoCode::classic("ABCD1234".into(), now, now, "req-1".into());
        assert_eq!(code.kind, CodeKind::Classic);
        assert!(code.creation_date.is_some());

        let offer = PromoCode::offer("WXYZ".into(), "8812".into());
        assert_eq!(offer.kind, CodeKind::Offer);
        assert!(offer.creation_date.is_none());
    }
}
