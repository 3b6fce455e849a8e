//! Typed bodies for the console endpoints. One decoder per endpoint;
//! unknown fields are ignored.

use serde::Deserialize;
use serde_json::Value;

/// Some endpoints report numeric ids as JSON numbers, others as strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum IdValue {
    Num(i64),
    Str(String),
}

impl IdValue {
    pub(crate) fn as_string(&self) -> String {
        match self {
            IdValue::Num(n) => n.to_string(),
            IdValue::Str(s) => s.clone(),
        }
    }
}

/// GET .../ra/apps/manageyourapps/summary/v2
#[derive(Debug, Deserialize)]
pub(crate) struct SummaryResponse {
    pub data: SummaryData,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SummaryData {
    #[serde(default)]
    pub summaries: Vec<SummaryEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SummaryEntry {
    #[serde(default)]
    pub adam_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub vendor_id: String,
    #[serde(default)]
    pub icon_url: String,
    #[serde(default)]
    pub version_sets: Vec<VersionSet>,
    #[serde(default)]
    pub build_version_sets: Vec<VersionSet>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VersionSet {
    #[serde(default, rename = "type")]
    pub set_type: String,
    #[serde(default)]
    pub platform_string: String,
    #[serde(default)]
    pub deliverable_version: Option<DeliverableVersion>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeliverableVersion {
    #[serde(default)]
    pub state: String,
}

impl SummaryEntry {
    pub(crate) fn is_bundle(&self) -> bool {
        self.version_sets
            .first()
            .map(|set| set.set_type == "BUNDLE")
            .unwrap_or(false)
            || self
                .build_version_sets
                .first()
                .map(|set| set.set_type == "BUNDLE")
                .unwrap_or(false)
    }

    /// Comma-joined distinct platform strings from the version sets,
    /// falling back to the build version sets.
    pub(crate) fn platforms(&self) -> String {
        let mut seen: Vec<&str> = Vec::new();
        let sets = if self
            .version_sets
            .iter()
            .any(|set| !set.platform_string.is_empty())
        {
            &self.version_sets
        } else {
            &self.build_version_sets
        };
        for set in sets {
            let platform = set.platform_string.as_str();
            if !platform.is_empty() && !seen.contains(&platform) {
                seen.push(platform);
            }
        }
        seen.join(",")
    }

    /// An app is sellable when at least one version set carries a
    /// deliverable version whose state is not a removed-from-sale state.
    pub(crate) fn is_sellable(&self) -> bool {
        self.version_sets.iter().any(|set| {
            set.deliverable_version
                .as_ref()
                .map(|version| !version.state.ends_with("RemovedFromSale"))
                .unwrap_or(false)
        })
    }
}

/// GET .../ra/apps/{id}/promocodes/versions
#[derive(Debug, Deserialize)]
pub(crate) struct VersionsResponse {
    pub data: VersionsData,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct VersionsData {
    #[serde(default)]
    pub versions: Vec<VersionEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VersionEntry {
    pub version: String,
    pub id: i64,
    pub contract_file_name: String,
    pub maximum_number_of_codes: i64,
    pub number_of_codes: i64,
}

/// GET .../ra/apps/{id}/iaps
#[derive(Debug, Deserialize)]
pub(crate) struct IapsResponse {
    #[serde(default)]
    pub data: Vec<IapEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IapEntry {
    pub adam_id: IdValue,
    #[serde(default)]
    pub reference_name: String,
    #[serde(default)]
    pub maximum_number_of_codes: i64,
    #[serde(default)]
    pub number_of_codes: i64,
    #[serde(default)]
    pub add_on_type: String,
    #[serde(default)]
    pub duration_days: Option<u32>,
}

impl IapEntry {
    pub(crate) fn is_subscription(&self) -> bool {
        self.add_on_type == "recurring"
    }
}

/// POST .../promocodes/versions/ and .../promocodes/iaps
#[derive(Debug, Deserialize)]
pub(crate) struct CreationResponse {
    pub data: CreationData,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CreationData {
    #[serde(default)]
    pub successful: Vec<Value>,
}

/// GET .../promocodes/history and .../promocodes/iap/history. App and
/// IAP history differ only in the key holding the request list.
#[derive(Debug, Deserialize)]
pub(crate) struct HistoryResponse {
    pub data: HistoryData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HistoryData {
    #[serde(default)]
    pub requests: Vec<HistoryEntry>,
    #[serde(default)]
    pub promo_code_requests: Vec<HistoryEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HistoryEntry {
    #[serde(default)]
    pub codes: Vec<String>,
    /// Millisecond epoch timestamps.
    #[serde(default)]
    pub effective_date: Option<i64>,
    #[serde(default)]
    pub expiration_date: Option<i64>,
    #[serde(default)]
    pub id: Option<IdValue>,
    #[serde(default)]
    pub version: Option<HistoryVersion>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HistoryVersion {
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub version: String,
}

/// Replies from the subscription-offer endpoints embed results in
/// human-readable info messages.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct OfferReply {
    #[serde(default)]
    pub messages: Option<OfferMessages>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OfferMessages {
    #[serde(default)]
    pub info: Vec<String>,
}
