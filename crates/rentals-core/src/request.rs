//! Raw, unvalidated request payloads.
//!
//! Every field is optional and enum values arrive as text so that
//! [`crate::validate`] can report all violations of a payload at once.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Distinguishes an absent key (`None`) from an explicit `null`
/// (`Some(None)`) in patch payloads.
#[allow(clippy::option_option)] // absent and null are distinct states
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreatePropertyRequest {
    pub property_type: Option<String>,
    pub address: Option<String>,
    pub complement: Option<String>,
    pub neighborhood: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub parking_spaces: Option<i64>,
    pub area_m2: Option<f64>,
    pub rent_value: Option<f64>,
    pub condo_fee: Option<f64>,
    pub iptu: Option<f64>,
    pub description: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[allow(clippy::option_option)] // absent and cleared are distinct states
pub struct UpdatePropertyRequest {
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub complement: Option<Option<String>>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub bedrooms: Option<i64>,
    #[serde(default)]
    pub bathrooms: Option<i64>,
    #[serde(default)]
    pub parking_spaces: Option<i64>,
    #[serde(default)]
    pub area_m2: Option<f64>,
    #[serde(default)]
    pub rent_value: Option<f64>,
    #[serde(default, deserialize_with = "nullable")]
    pub condo_fee: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub iptu: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<String>,
    /// Why the change was made; copied onto every change record.
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeletePropertyRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecordEventRequest {
    pub event_type: Option<String>,
    pub description: Option<String>,
    pub impact: Option<String>,
    pub metadata: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PropertyListQuery {
    pub status: Option<String>,
    pub property_type: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub neighborhood: Option<String>,
    pub search: Option<String>,
    pub include_deleted: Option<bool>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// History filter parameters. List values are comma separated.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HistoryQuery {
    /// RFC 3339 timestamp or `YYYY-MM-DD` (start of day, UTC).
    pub from: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD` (end of day, UTC).
    pub to: Option<String>,
    pub fields: Option<String>,
    pub change_types: Option<String>,
    pub event_types: Option<String>,
    pub actor: Option<String>,
    pub include: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExportQuery {
    pub format: Option<String>,
    pub include_summary: Option<bool>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub fields: Option<String>,
    pub change_types: Option<String>,
    pub event_types: Option<String>,
    pub actor: Option<String>,
    pub include: Option<String>,
}

impl ExportQuery {
    /// The filter part of the export, without pagination.
    #[must_use]
    pub fn filter_query(&self) -> HistoryQuery {
        HistoryQuery {
            from: self.from.clone(),
            to: self.to.clone(),
            fields: self.fields.clone(),
            change_types: self.change_types.clone(),
            event_types: self.event_types.clone(),
            actor: self.actor.clone(),
            include: self.include.clone(),
            limit: None,
            offset: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecentActivityQuery {
    pub actor: Option<String>,
    pub limit: Option<usize>,
}
