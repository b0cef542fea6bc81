use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{ServiceContext, checked_actor};
use crate::config::HistoryConfig;
use crate::error::{RentalError, Result};
use crate::history::export::render;
use crate::history::{
    AuditRecord, HistoryEntry, HistoryExport, HistoryFilter, HistoryPage, HistorySummary,
    TrackedField, apply_filter, build_timeline,
};
use crate::model::Property;
use crate::request::{ExportQuery, HistoryQuery, RecentActivityQuery};
use crate::validate::{
    ValidationError, validate_export_params, validate_history_filter, validate_limit,
    validate_recent_query,
};

/// Who last wrote a field, and how often it has been written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldProvenance {
    pub property_id: Uuid,
    pub property_code: String,
    pub field: TrackedField,
    pub current_value: Value,
    pub last_changed_by: String,
    pub last_changed_at: DateTime<Utc>,
    pub old_value: Value,
    pub new_value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub change_count: usize,
    pub first_changed_at: DateTime<Utc>,
}

pub struct HistoryService {
    ctx: ServiceContext,
    config: HistoryConfig,
}

impl HistoryService {
    #[must_use]
    pub const fn new(ctx: ServiceContext, config: HistoryConfig) -> Self {
        Self { ctx, config }
    }

    fn filtered_timeline(&self, property: &Property, filter: &HistoryFilter) -> Vec<HistoryEntry> {
        let timeline = build_timeline(
            self.ctx.history.changes_for(property.id),
            self.ctx.history.events_for(property.id),
        );
        apply_filter(timeline, filter)
    }

    /// Filtered, paginated timeline with a summary of the whole filtered set.
    ///
    /// Deleted properties keep their history readable. Every call appends an
    /// audit record.
    ///
    /// # Errors
    ///
    /// Validation failures or `NotFound`.
    #[instrument(skip(self, query))]
    pub fn history(&self, id: Uuid, query: &HistoryQuery, actor: &str) -> Result<HistoryPage> {
        let filter = validate_history_filter(query, self.config.page_limits())?;
        let actor = checked_actor(actor)?;
        let property = self.ctx.require(id)?;

        let filtered = self.filtered_timeline(&property, &filter);
        let page = HistoryPage::paginate(id, property.code, filtered, &filter);

        self.ctx.history.append_audit(AuditRecord::consultation(
            id,
            &actor,
            filter,
            page.total,
            self.ctx.now(),
        ));
        debug!(
            total = page.total,
            returned = page.entries.len(),
            "history consulted"
        );
        Ok(page)
    }

    /// Last writer of `field` plus its write count.
    ///
    /// # Errors
    ///
    /// Validation failure for an unknown field name, `NotFound`, or
    /// `NoFieldHistory` when the field never changed.
    pub fn field_provenance(&self, id: Uuid, field: &str) -> Result<FieldProvenance> {
        let field = TrackedField::from_str(field).map_err(|_| {
            RentalError::invalid(ValidationError::new(
                "field",
                field,
                "unknown field",
                format!(
                    "use one of: {}",
                    TrackedField::ALL.map(TrackedField::as_str).join(", ")
                ),
                "invalid_field",
            ))
        })?;
        let property = self.ctx.require(id)?;

        let writes: Vec<_> = self
            .ctx
            .history
            .changes_for(id)
            .into_iter()
            .filter(|c| c.field == field)
            .collect();
        let (Some(first), Some(last)) = (writes.first(), writes.last()) else {
            return Err(RentalError::NoFieldHistory {
                property_id: id,
                field: field.to_string(),
            });
        };

        Ok(FieldProvenance {
            property_id: id,
            property_code: property.code.clone(),
            field,
            current_value: property.field_value(field),
            last_changed_by: last.changed_by.clone(),
            last_changed_at: last.changed_at,
            old_value: last.old_value.clone(),
            new_value: last.new_value.clone(),
            reason: last.reason.clone(),
            change_count: writes.len(),
            first_changed_at: first.changed_at,
        })
    }

    /// Render the whole filtered timeline as a downloadable document.
    ///
    /// # Errors
    ///
    /// Validation failures, `NotFound`, or `ExportTooLarge` when the filtered
    /// set exceeds `max_export_records`.
    #[instrument(skip(self, query))]
    pub fn export(&self, id: Uuid, query: &ExportQuery, actor: &str) -> Result<HistoryExport> {
        let params = validate_export_params(query, self.config.max_export_records)?;
        let actor = checked_actor(actor)?;
        let property = self.ctx.require(id)?;

        let filtered = self.filtered_timeline(&property, &params.filter);
        if filtered.len() > self.config.max_export_records {
            warn!(
                count = filtered.len(),
                limit = self.config.max_export_records,
                "export rejected"
            );
            return Err(RentalError::ExportTooLarge {
                count: filtered.len(),
                limit: self.config.max_export_records,
            });
        }

        let summary = params
            .include_summary
            .then(|| HistorySummary::from_entries(&filtered));
        let generated_at = self.ctx.now();
        let export = render(
            params.format,
            &property.code,
            &filtered,
            summary.as_ref(),
            generated_at,
        )
        .map_err(|e| RentalError::Internal(e.into()))?;

        self.ctx.history.append_audit(AuditRecord::export(
            id,
            &actor,
            params.filter,
            export.record_count,
            params.format,
            generated_at,
        ));
        info!(
            code = %property.code,
            format = %params.format,
            records = export.record_count,
            "history exported"
        );
        Ok(export)
    }

    /// Audit records of one property, newest first.
    ///
    /// # Errors
    ///
    /// Validation failure for the limit or `NotFound`.
    pub fn audit_trail(&self, id: Uuid, limit: Option<usize>) -> Result<Vec<AuditRecord>> {
        let limit = validate_limit(limit, self.config.page_limits())?;
        self.ctx.require(id)?;
        let mut audits = self.ctx.history.audits_for(id);
        audits.sort_by(|a, b| b.consulted_at.cmp(&a.consulted_at).then(a.id.cmp(&b.id)));
        audits.truncate(limit);
        Ok(audits)
    }

    /// Newest entries across all properties.
    ///
    /// # Errors
    ///
    /// Validation failures in the query.
    pub fn recent_activity(&self, query: &RecentActivityQuery) -> Result<Vec<HistoryEntry>> {
        let (actor, limit) = validate_recent_query(query, self.config.page_limits())?;
        Ok(self.ctx.history.recent(actor.as_deref(), limit))
    }
}
