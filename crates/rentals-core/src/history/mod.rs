//! The append-only property history.
//!
//! Three immutable record kinds make up a property's history:
//!
//! - [`ChangeRecord`]: one field mutation with old/new value and a
//!   [`ChangeType`] classification tag.
//! - [`LifecycleEvent`]: a named occurrence (creation, contract link,
//!   tenant move-in/out, deletion marker).
//! - [`AuditRecord`]: one consultation of the history, including exports.
//!
//! Queries merge the first two into a newest-first timeline
//! ([`build_timeline`]), filter it ([`HistoryFilter`]) and summarize it
//! ([`HistorySummary`]).

pub mod audit;
pub mod change;
pub mod export;
pub mod lifecycle;
pub mod query;
pub mod stats;

pub use audit::AuditRecord;
pub use change::{ChangeRecord, ChangeType, TrackedField};
pub use export::{ExportFormat, HistoryExport};
pub use lifecycle::{LifecycleEvent, LifecycleEventType};
pub use query::{
    HistoryEntry, HistoryFilter, HistoryInclude, HistoryPage, apply_filter, build_timeline,
};
pub use stats::HistorySummary;
