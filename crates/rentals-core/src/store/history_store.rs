use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::HistoryRepository;
use crate::history::query::sort_newest_first;
use crate::history::{AuditRecord, ChangeRecord, HistoryEntry, LifecycleEvent};

#[derive(Default)]
struct Inner {
    changes: HashMap<Uuid, Vec<ChangeRecord>>,
    events: HashMap<Uuid, Vec<LifecycleEvent>>,
    audits: HashMap<Uuid, Vec<AuditRecord>>,
}

/// Append-only history held in memory, partitioned by property.
#[derive(Default)]
pub struct InMemoryHistoryRepository {
    inner: RwLock<Inner>,
}

impl InMemoryHistoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryRepository for InMemoryHistoryRepository {
    fn append_change(&self, record: ChangeRecord) {
        self.inner
            .write()
            .changes
            .entry(record.property_id)
            .or_default()
            .push(record);
    }

    fn append_event(&self, event: LifecycleEvent) {
        self.inner
            .write()
            .events
            .entry(event.property_id)
            .or_default()
            .push(event);
    }

    fn append_audit(&self, record: AuditRecord) {
        self.inner
            .write()
            .audits
            .entry(record.property_id)
            .or_default()
            .push(record);
    }

    fn changes_for(&self, property_id: Uuid) -> Vec<ChangeRecord> {
        self.inner
            .read()
            .changes
            .get(&property_id)
            .cloned()
            .unwrap_or_default()
    }

    fn events_for(&self, property_id: Uuid) -> Vec<LifecycleEvent> {
        self.inner
            .read()
            .events
            .get(&property_id)
            .cloned()
            .unwrap_or_default()
    }

    fn audits_for(&self, property_id: Uuid) -> Vec<AuditRecord> {
        self.inner
            .read()
            .audits
            .get(&property_id)
            .cloned()
            .unwrap_or_default()
    }

    fn count_changes_for(&self, property_id: Uuid) -> usize {
        self.inner
            .read()
            .changes
            .get(&property_id)
            .map_or(0, Vec::len)
    }

    fn recent(&self, actor: Option<&str>, limit: usize) -> Vec<HistoryEntry> {
        let inner = self.inner.read();
        let by_actor = |who: &str| actor.is_none_or(|a| a.eq_ignore_ascii_case(who));
        let mut entries: Vec<HistoryEntry> = inner
            .changes
            .values()
            .flatten()
            .filter(|c| by_actor(&c.changed_by))
            .cloned()
            .map(HistoryEntry::Change)
            .chain(
                inner
                    .events
                    .values()
                    .flatten()
                    .filter(|e| by_actor(&e.recorded_by))
                    .cloned()
                    .map(HistoryEntry::Event),
            )
            .collect();
        drop(inner);
        sort_newest_first(&mut entries);
        entries.truncate(limit);
        entries
    }
}
