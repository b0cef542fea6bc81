//! Timeline assembly and filtering over the append-only history.
//!
//! Change records and lifecycle events live in separate stores. A query
//! merges both into one newest-first timeline, applies the filter with a
//! linear scan, and paginates the result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::change::{ChangeRecord, ChangeType, TrackedField};
use super::lifecycle::{LifecycleEvent, LifecycleEventType};
use super::stats::HistorySummary;
use crate::model::ParseEnumError;
use crate::model::property::normalize;

/// Which record kinds a query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryInclude {
    #[default]
    All,
    Changes,
    Events,
}

impl HistoryInclude {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Changes => "changes",
            Self::Events => "events",
        }
    }
}

impl fmt::Display for HistoryInclude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryInclude {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "all" => Ok(Self::All),
            "changes" => Ok(Self::Changes),
            "events" => Ok(Self::Events),
            _ => Err(ParseEnumError {
                expected: "include",
                got: s.to_string(),
            }),
        }
    }
}

/// A validated history filter. Produced by
/// [`validate_history_filter`](crate::validate::validate_history_filter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<TrackedField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub change_types: Vec<ChangeType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_types: Vec<LifecycleEventType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(default)]
    pub include: HistoryInclude,
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

impl Default for HistoryFilter {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            fields: Vec::new(),
            change_types: Vec::new(),
            event_types: Vec::new(),
            actor: None,
            include: HistoryInclude::All,
            limit: 50,
            offset: 0,
        }
    }
}

impl HistoryFilter {
    const fn has_change_criteria(&self) -> bool {
        !self.fields.is_empty() || !self.change_types.is_empty()
    }

    /// Change records are returned unless excluded explicitly, or implicitly
    /// by a query that only names event types.
    #[must_use]
    pub fn wants_changes(&self) -> bool {
        match self.include {
            HistoryInclude::Events => false,
            HistoryInclude::Changes => true,
            HistoryInclude::All => self.event_types.is_empty() || self.has_change_criteria(),
        }
    }

    /// Lifecycle events are returned unless excluded explicitly, or
    /// implicitly by a query that only names fields or change types.
    #[must_use]
    pub fn wants_events(&self) -> bool {
        match self.include {
            HistoryInclude::Changes => false,
            HistoryInclude::Events => true,
            HistoryInclude::All => !self.has_change_criteria() || !self.event_types.is_empty(),
        }
    }

    fn in_range(&self, at: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| at >= from) && self.to.is_none_or(|to| at <= to)
    }

    fn actor_matches(&self, actor: &str) -> bool {
        self.actor
            .as_deref()
            .is_none_or(|wanted| wanted.trim().eq_ignore_ascii_case(actor.trim()))
    }

    #[must_use]
    pub fn matches(&self, entry: &HistoryEntry) -> bool {
        if !self.in_range(entry.at()) || !self.actor_matches(entry.actor()) {
            return false;
        }
        match entry {
            HistoryEntry::Change(change) => {
                self.wants_changes()
                    && (self.fields.is_empty() || self.fields.contains(&change.field))
                    && (self.change_types.is_empty()
                        || self.change_types.contains(&change.change_type))
            }
            HistoryEntry::Event(event) => {
                self.wants_events()
                    && (self.event_types.is_empty()
                        || self.event_types.contains(&event.event_type))
            }
        }
    }
}

/// One row of a property timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryEntry {
    Change(ChangeRecord),
    Event(LifecycleEvent),
}

impl HistoryEntry {
    #[must_use]
    pub const fn id(&self) -> Uuid {
        match self {
            Self::Change(c) => c.id,
            Self::Event(e) => e.id,
        }
    }

    #[must_use]
    pub const fn at(&self) -> DateTime<Utc> {
        match self {
            Self::Change(c) => c.changed_at,
            Self::Event(e) => e.occurred_at,
        }
    }

    #[must_use]
    pub fn actor(&self) -> &str {
        match self {
            Self::Change(c) => &c.changed_by,
            Self::Event(e) => &e.recorded_by,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Change(_) => "change",
            Self::Event(_) => "event",
        }
    }
}

pub(crate) fn inline_json(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Merge both record kinds into one newest-first timeline.
#[must_use]
pub fn build_timeline(
    changes: Vec<ChangeRecord>,
    events: Vec<LifecycleEvent>,
) -> Vec<HistoryEntry> {
    let mut entries: Vec<HistoryEntry> = changes
        .into_iter()
        .map(HistoryEntry::Change)
        .chain(events.into_iter().map(HistoryEntry::Event))
        .collect();
    sort_newest_first(&mut entries);
    entries
}

pub fn sort_newest_first(entries: &mut [HistoryEntry]) {
    entries.sort_by_key(|e| (Reverse(e.at()), e.id()));
}

/// Apply `filter` to an already sorted timeline.
#[must_use]
pub fn apply_filter(entries: Vec<HistoryEntry>, filter: &HistoryFilter) -> Vec<HistoryEntry> {
    entries.into_iter().filter(|e| filter.matches(e)).collect()
}

/// A page of filtered history with statistics over the whole filtered set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryPage {
    pub property_id: Uuid,
    pub property_code: String,
    pub entries: Vec<HistoryEntry>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
    pub summary: HistorySummary,
}

impl HistoryPage {
    #[must_use]
    pub fn paginate(
        property_id: Uuid,
        property_code: String,
        filtered: Vec<HistoryEntry>,
        filter: &HistoryFilter,
    ) -> Self {
        let summary = HistorySummary::from_entries(&filtered);
        let total = filtered.len();
        let entries: Vec<HistoryEntry> = filtered
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit)
            .collect();
        let has_more = filter.offset.saturating_add(entries.len()) < total;
        Self {
            property_id,
            property_code,
            entries,
            total,
            limit: filter.limit,
            offset: filter.offset,
            has_more,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0)
            .single()
            .expect("valid time")
            + Duration::minutes(minutes)
    }

    fn change(pid: Uuid, field: TrackedField, at: i64, who: &str) -> ChangeRecord {
        ChangeRecord::new(pid, field, json!(1), json!(2), None, who, t(at))
    }

    fn event(pid: Uuid, kind: LifecycleEventType, at: i64, who: &str) -> LifecycleEvent {
        LifecycleEvent::new(pid, kind, "desc", who, t(at))
    }

    fn sample() -> Vec<HistoryEntry> {
        let pid = Uuid::new_v4();
        build_timeline(
            vec![
                change(pid, TrackedField::RentValue, 10, "ana"),
                change(pid, TrackedField::City, 20, "bruno"),
                change(pid, TrackedField::Status, 30, "ana"),
            ],
            vec![
                event(pid, LifecycleEventType::Created, 0, "system"),
                event(pid, LifecycleEventType::TenantMoveIn, 25, "bruno"),
            ],
        )
    }

    #[test]
    fn timeline_is_newest_first() {
        let entries = sample();
        assert_eq!(entries.len(), 5);
        assert!(entries.windows(2).all(|w| w[0].at() >= w[1].at()));
        assert!(matches!(entries.last(), Some(HistoryEntry::Event(_))));
    }

    #[test]
    fn default_filter_keeps_everything() {
        let filtered = apply_filter(sample(), &HistoryFilter::default());
        assert_eq!(filtered.len(), 5);
    }

    #[test]
    fn date_range_is_inclusive() {
        let filter = HistoryFilter {
            from: Some(t(10)),
            to: Some(t(25)),
            ..HistoryFilter::default()
        };
        let filtered = apply_filter(sample(), &filter);
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn field_filter_drops_events() {
        let filter = HistoryFilter {
            fields: vec![TrackedField::RentValue],
            ..HistoryFilter::default()
        };
        let filtered = apply_filter(sample(), &filter);
        assert_eq!(filtered.len(), 1);
        let HistoryEntry::Change(change) = &filtered[0] else {
            panic!("expected a change record");
        };
        assert_eq!(change.field, TrackedField::RentValue);
    }

    #[test]
    fn event_type_filter_drops_changes() {
        let filter = HistoryFilter {
            event_types: vec![LifecycleEventType::TenantMoveIn],
            ..HistoryFilter::default()
        };
        let filtered = apply_filter(sample(), &filter);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].kind(), "event");
    }

    #[test]
    fn change_and_event_criteria_combine() {
        let filter = HistoryFilter {
            change_types: vec![ChangeType::Address],
            event_types: vec![LifecycleEventType::Created],
            ..HistoryFilter::default()
        };
        let filtered = apply_filter(sample(), &filter);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn include_events_only() {
        let filter = HistoryFilter {
            include: HistoryInclude::Events,
            ..HistoryFilter::default()
        };
        let entries = apply_filter(sample(), &filter);
        assert!(entries.iter().all(|e| e.kind() == "event"));
    }

    #[test]
    fn actor_filter_is_case_insensitive() {
        let filter = HistoryFilter {
            actor: Some("ANA".into()),
            ..HistoryFilter::default()
        };
        let filtered = apply_filter(sample(), &filter);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|e| e.actor() == "ana"));
    }

    #[test]
    fn pagination_reports_has_more() {
        let filter = HistoryFilter {
            limit: 2,
            offset: 1,
            ..HistoryFilter::default()
        };
        let page =
            HistoryPage::paginate(Uuid::nil(), "PROP-20240601-001".into(), sample(), &filter);
        assert_eq!(page.total, 5);
        assert_eq!(page.entries.len(), 2);
        assert!(page.has_more);
        assert_eq!(page.summary.total_changes + page.summary.total_events, 5);

        let last = HistoryFilter {
            limit: 2,
            offset: 4,
            ..HistoryFilter::default()
        };
        let page = HistoryPage::paginate(Uuid::nil(), "x".into(), sample(), &last);
        assert_eq!(page.entries.len(), 1);
        assert!(!page.has_more);
    }

    #[test]
    fn entries_serialize_with_kind_tag() {
        let entries = sample();
        let json = serde_json::to_value(&entries[0]).expect("serialize");
        assert_eq!(json["kind"], "change");
        assert_eq!(json["field"], "status");
    }
}
