//! Consultation audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::export::ExportFormat;
use super::query::HistoryFilter;

/// One logged history consultation. Appended for every query and export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub property_id: Uuid,
    pub consulted_by: String,
    pub filters: HistoryFilter,
    pub result_count: usize,
    pub exported: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_format: Option<ExportFormat>,
    pub consulted_at: DateTime<Utc>,
}

impl AuditRecord {
    #[must_use]
    pub fn consultation(
        property_id: Uuid,
        consulted_by: &str,
        filters: HistoryFilter,
        result_count: usize,
        consulted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            property_id,
            consulted_by: consulted_by.to_string(),
            filters,
            result_count,
            exported: false,
            export_format: None,
            consulted_at,
        }
    }

    #[must_use]
    pub fn export(
        property_id: Uuid,
        consulted_by: &str,
        filters: HistoryFilter,
        result_count: usize,
        format: ExportFormat,
        consulted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            exported: true,
            export_format: Some(format),
            ..Self::consultation(
                property_id,
                consulted_by,
                filters,
                result_count,
                consulted_at,
            )
        }
    }
}
