//! Summary statistics over a filtered timeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::query::HistoryEntry;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HistorySummary {
    pub total_changes: usize,
    pub total_events: usize,
    pub changes_by_field: BTreeMap<String, usize>,
    pub changes_by_type: BTreeMap<String, usize>,
    pub events_by_type: BTreeMap<String, usize>,
    pub entries_by_actor: BTreeMap<String, usize>,
    pub distinct_actors: usize,
    /// Field with the most changes; ties go to the alphabetically first name.
    pub most_changed_field: Option<String>,
    pub first_entry_at: Option<DateTime<Utc>>,
    pub last_entry_at: Option<DateTime<Utc>>,
}

impl HistorySummary {
    #[must_use]
    pub fn from_entries(entries: &[HistoryEntry]) -> Self {
        let mut summary = Self::default();

        for entry in entries {
            match entry {
                HistoryEntry::Change(change) => {
                    summary.total_changes += 1;
                    bump(&mut summary.changes_by_field, change.field.as_str());
                    bump(&mut summary.changes_by_type, change.change_type.as_str());
                }
                HistoryEntry::Event(event) => {
                    summary.total_events += 1;
                    bump(&mut summary.events_by_type, event.event_type.as_str());
                }
            }
            bump(&mut summary.entries_by_actor, entry.actor());

            let at = entry.at();
            summary.first_entry_at = Some(summary.first_entry_at.map_or(at, |f| f.min(at)));
            summary.last_entry_at = Some(summary.last_entry_at.map_or(at, |l| l.max(at)));
        }

        summary.distinct_actors = summary.entries_by_actor.len();
        summary.most_changed_field = summary
            .changes_by_field
            .iter()
            .fold(None::<(&String, usize)>, |best, (field, &count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((field, count)),
            })
            .map(|(field, _)| field.clone());

        summary
    }
}

fn bump(map: &mut BTreeMap<String, usize>, key: &str) {
    *map.entry(key.to_string()).or_insert(0) += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::change::{ChangeRecord, TrackedField};
    use crate::history::lifecycle::{LifecycleEvent, LifecycleEventType};
    use chrono::{Duration, TimeZone};
    use serde_json::json;
    use uuid::Uuid;

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 10, 8, 0, 0)
            .single()
            .expect("valid time")
            + Duration::minutes(minutes)
    }

    #[test]
    fn empty_timeline_has_empty_summary() {
        let summary = HistorySummary::from_entries(&[]);
        assert_eq!(summary, HistorySummary::default());
        assert!(summary.most_changed_field.is_none());
    }

    #[test]
    fn counts_and_bounds() {
        let pid = Uuid::new_v4();
        let change = |field, at, who: &str| {
            HistoryEntry::Change(ChangeRecord::new(
                pid,
                field,
                json!(0),
                json!(1),
                None,
                who,
                t(at),
            ))
        };
        let entries = vec![
            change(TrackedField::RentValue, 40, "ana"),
            change(TrackedField::RentValue, 30, "bruno"),
            change(TrackedField::Iptu, 20, "ana"),
            change(TrackedField::Status, 15, "ana"),
            HistoryEntry::Event(LifecycleEvent::new(
                pid,
                LifecycleEventType::Created,
                "registered",
                "system",
                t(0),
            )),
        ];

        let summary = HistorySummary::from_entries(&entries);
        assert_eq!(summary.total_changes, 4);
        assert_eq!(summary.total_events, 1);
        assert_eq!(summary.changes_by_field.get("rent_value"), Some(&2));
        assert_eq!(summary.changes_by_type.get("financial"), Some(&3));
        assert_eq!(summary.changes_by_type.get("status"), Some(&1));
        assert_eq!(summary.events_by_type.get("created"), Some(&1));
        assert_eq!(summary.entries_by_actor.get("ana"), Some(&3));
        assert_eq!(summary.distinct_actors, 3);
        assert_eq!(summary.most_changed_field.as_deref(), Some("rent_value"));
        assert_eq!(summary.first_entry_at, Some(t(0)));
        assert_eq!(summary.last_entry_at, Some(t(40)));
    }

    #[test]
    fn most_changed_field_tie_prefers_alphabetical() {
        let pid = Uuid::new_v4();
        let entries: Vec<_> = [TrackedField::Status, TrackedField::City]
            .into_iter()
            .enumerate()
            .map(|(i, field)| {
                HistoryEntry::Change(ChangeRecord::new(
                    pid,
                    field,
                    json!(null),
                    json!("x"),
                    None,
                    "ana",
                    t(i64::try_from(i).expect("small")),
                ))
            })
            .collect();
        let summary = HistorySummary::from_entries(&entries);
        assert_eq!(summary.most_changed_field.as_deref(), Some("city"));
    }
}
