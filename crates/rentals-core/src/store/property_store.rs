use parking_lot::RwLock;
use std::cmp::Reverse;
use std::collections::HashMap;
use uuid::Uuid;

use super::{PropertyListFilter, PropertyPage, PropertyRepository};
use crate::error::{RentalError, Result};
use crate::model::{AddressKey, Property};

#[derive(Default)]
struct Inner {
    properties: HashMap<Uuid, Property>,
    codes: HashMap<String, Uuid>,
    addresses: HashMap<AddressKey, Uuid>,
}

impl Inner {
    fn address_owner(&self, key: &AddressKey) -> Option<&Property> {
        self.addresses
            .get(key)
            .and_then(|id| self.properties.get(id))
    }

    fn insert(&mut self, property: Property) -> Result<()> {
        let key = property.address_key();
        if let Some(existing) = self.address_owner(&key) {
            return Err(RentalError::DuplicateAddress {
                existing_code: existing.code.clone(),
            });
        }
        if self.properties.contains_key(&property.id) || self.codes.contains_key(&property.code) {
            return Err(RentalError::Internal(anyhow::anyhow!(
                "property {} ({}) is already stored",
                property.code,
                property.id
            )));
        }
        self.addresses.insert(key, property.id);
        self.codes.insert(property.code.clone(), property.id);
        self.properties.insert(property.id, property);
        Ok(())
    }

    fn replace(&mut self, property: Property) -> Result<()> {
        let Some(current) = self.properties.get(&property.id) else {
            return Err(RentalError::NotFound(property.id.to_string()));
        };
        let old_key = current.address_key();
        let new_key = property.address_key();
        if old_key != new_key {
            if let Some(existing) = self.address_owner(&new_key) {
                return Err(RentalError::DuplicateAddress {
                    existing_code: existing.code.clone(),
                });
            }
            self.addresses.remove(&old_key);
            self.addresses.insert(new_key, property.id);
        }
        self.properties.insert(property.id, property);
        Ok(())
    }
}

/// Properties held in memory, indexed by id, code and address key.
#[derive(Default)]
pub struct InMemoryPropertyRepository {
    inner: RwLock<Inner>,
}

impl InMemoryPropertyRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PropertyRepository for InMemoryPropertyRepository {
    fn insert(&self, property: Property) -> Result<()> {
        self.inner.write().insert(property)
    }

    fn get(&self, id: Uuid) -> Option<Property> {
        self.inner.read().properties.get(&id).cloned()
    }

    fn find_by_code(&self, code: &str) -> Option<Property> {
        let inner = self.inner.read();
        inner
            .codes
            .get(&code.trim().to_ascii_uppercase())
            .and_then(|id| inner.properties.get(id))
            .cloned()
    }

    fn replace(&self, property: Property) -> Result<()> {
        self.inner.write().replace(property)
    }

    fn list(&self, filter: &PropertyListFilter) -> PropertyPage {
        let inner = self.inner.read();
        let mut matched: Vec<&Property> = inner
            .properties
            .values()
            .filter(|p| filter.matches(p))
            .collect();
        matched.sort_by(|a, b| {
            Reverse(a.registered_at)
                .cmp(&Reverse(b.registered_at))
                .then_with(|| a.code.cmp(&b.code))
        });
        let total = matched.len();
        let items: Vec<Property> = matched
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit)
            .cloned()
            .collect();
        let has_more = filter.offset.saturating_add(items.len()) < total;
        PropertyPage {
            items,
            total,
            limit: filter.limit,
            offset: filter.offset,
            has_more,
        }
    }

    fn find_by_address_key(&self, key: &AddressKey) -> Option<Property> {
        self.inner.read().address_owner(key).cloned()
    }
}
