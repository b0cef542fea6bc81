//! Storage seams for properties and their history.
//!
//! Both repositories are synchronous and in-memory. Services hold them as
//! `Arc<dyn …>` so a persistent backend can be swapped in later.

pub mod history_store;
pub mod property_store;

use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;
use crate::history::{AuditRecord, ChangeRecord, HistoryEntry, LifecycleEvent};
use crate::model::{AddressKey, Property, PropertyStatus, PropertyType};

pub use history_store::InMemoryHistoryRepository;
pub use property_store::InMemoryPropertyRepository;

/// Criteria for listing properties. Produced by
/// [`validate_list_query`](crate::validate::validate_list_query).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyListFilter {
    pub status: Option<PropertyStatus>,
    pub property_type: Option<PropertyType>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub neighborhood: Option<String>,
    /// Case-insensitive substring over code, address, neighborhood and city.
    pub search: Option<String>,
    pub include_deleted: bool,
    pub limit: usize,
    pub offset: usize,
}

impl Default for PropertyListFilter {
    fn default() -> Self {
        Self {
            status: None,
            property_type: None,
            city: None,
            state: None,
            neighborhood: None,
            search: None,
            include_deleted: false,
            limit: 20,
            offset: 0,
        }
    }
}

impl PropertyListFilter {
    #[must_use]
    pub fn matches(&self, p: &Property) -> bool {
        if p.is_deleted() && !self.include_deleted {
            return false;
        }
        self.status.is_none_or(|s| p.status == s)
            && self.property_type.is_none_or(|t| p.property_type == t)
            && self.state.as_deref().is_none_or(|s| p.state == s)
            && self.city.as_deref().is_none_or(|c| same_name(&p.city, c))
            && self
                .neighborhood
                .as_deref()
                .is_none_or(|n| same_name(&p.neighborhood, n))
            && self.search.as_deref().is_none_or(|needle| {
                let needle = needle.to_lowercase();
                [&p.code, &p.address, &p.neighborhood, &p.city]
                    .iter()
                    .any(|hay| hay.to_lowercase().contains(&needle))
            })
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// One page of a property listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyPage {
    pub items: Vec<Property>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
}

pub trait PropertyRepository: Send + Sync {
    /// Store a new property.
    ///
    /// # Errors
    ///
    /// Returns [`RentalError::DuplicateAddress`](crate::error::RentalError)
    /// when another property already holds the same address key.
    fn insert(&self, property: Property) -> Result<()>;

    fn get(&self, id: Uuid) -> Option<Property>;

    /// Lookup by code, ignoring case.
    fn find_by_code(&self, code: &str) -> Option<Property>;

    /// Overwrite an existing property, keeping the address index current.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id and `DuplicateAddress` when the
    /// new address key belongs to a different property.
    fn replace(&self, property: Property) -> Result<()>;

    /// Filter, sort by `registered_at` descending then code, and paginate.
    fn list(&self, filter: &PropertyListFilter) -> PropertyPage;

    fn find_by_address_key(&self, key: &AddressKey) -> Option<Property>;
}

/// Append-only history storage. There are no update or delete methods.
pub trait HistoryRepository: Send + Sync {
    fn append_change(&self, record: ChangeRecord);

    fn append_event(&self, event: LifecycleEvent);

    fn append_audit(&self, record: AuditRecord);

    /// Change records of one property, in append order.
    fn changes_for(&self, property_id: Uuid) -> Vec<ChangeRecord>;

    /// Lifecycle events of one property, in append order.
    fn events_for(&self, property_id: Uuid) -> Vec<LifecycleEvent>;

    /// Audit records of one property, in append order.
    fn audits_for(&self, property_id: Uuid) -> Vec<AuditRecord>;

    fn count_changes_for(&self, property_id: Uuid) -> usize;

    /// Newest entries across all properties, optionally for one actor.
    fn recent(&self, actor: Option<&str>, limit: usize) -> Vec<HistoryEntry>;
}
