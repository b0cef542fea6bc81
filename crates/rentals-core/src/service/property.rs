use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{ServiceContext, checked_actor};
use crate::error::{RentalError, Result};
use crate::history::{ChangeRecord, LifecycleEvent, LifecycleEventType, TrackedField};
use crate::model::code::format_code;
use crate::model::{AddressKey, Property, PropertyStatus, diff};
use crate::request::{
    CreatePropertyRequest, DeletePropertyRequest, PropertyListQuery, RecordEventRequest,
    UpdatePropertyRequest,
};
use crate::sequence::CodeSequence;
use crate::store::PropertyPage;
use crate::validate::{
    PageLimits, validate_code, validate_event_request, validate_list_query,
    validate_new_property, validate_property_patch, validate_reason,
};

/// Result of an update: the new state and one record per changed field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateOutcome {
    pub property: Property,
    pub changes: Vec<ChangeRecord>,
}

/// Result of recording a lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventOutcome {
    pub event: LifecycleEvent,
    pub property: Property,
    /// Present when the event moved the property's status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_change: Option<ChangeRecord>,
}

pub struct PropertyService {
    ctx: ServiceContext,
    codes: CodeSequence,
    limits: PageLimits,
    max_records_per_property: usize,
    // Serializes read-check-write sequences across mutations.
    write_gate: Mutex<()>,
}

impl PropertyService {
    #[must_use]
    pub fn new(ctx: ServiceContext, limits: PageLimits, max_records_per_property: usize) -> Self {
        Self {
            ctx,
            codes: CodeSequence::new(),
            limits,
            max_records_per_property,
            write_gate: Mutex::new(()),
        }
    }

    /// Register a property and append its `created` event.
    ///
    /// # Errors
    ///
    /// Validation failures, or `DuplicateAddress` when the address key is
    /// already taken (deleted properties included).
    #[instrument(skip(self, request))]
    pub fn create(&self, request: &CreatePropertyRequest, actor: &str) -> Result<Property> {
        let new = validate_new_property(request)?;
        let actor = checked_actor(actor)?;
        let _gate = self.write_gate.lock();

        let key = AddressKey::new(
            &new.address,
            &new.neighborhood,
            &new.postal_code,
            &new.city,
            &new.state,
        );
        if let Some(existing) = self.ctx.properties.find_by_address_key(&key) {
            warn!(existing = %existing.code, "duplicate address rejected");
            return Err(RentalError::DuplicateAddress {
                existing_code: existing.code,
            });
        }

        let now = self.ctx.now();
        let day = now.date_naive();
        let code = format_code(day, self.codes.next(day));
        let property = Property {
            id: Uuid::new_v4(),
            code,
            property_type: new.property_type,
            address: new.address,
            complement: new.complement,
            neighborhood: new.neighborhood,
            postal_code: new.postal_code,
            city: new.city,
            state: new.state,
            bedrooms: new.bedrooms,
            bathrooms: new.bathrooms,
            parking_spaces: new.parking_spaces,
            area_m2: new.area_m2,
            rent_value: new.rent_value,
            condo_fee: new.condo_fee,
            iptu: new.iptu,
            description: new.description,
            status: new.status,
            registered_by: actor.clone(),
            registered_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.ctx.properties.insert(property.clone())?;

        let event = LifecycleEvent::new(
            property.id,
            LifecycleEventType::Created,
            format!("Property {} registered", property.code),
            &actor,
            now,
        )
        .with_metadata(BTreeMap::from([
            ("code".to_string(), json!(property.code)),
            ("status".to_string(), json!(property.status)),
        ]));
        self.ctx.history.append_event(event);

        info!(code = %property.code, id = %property.id, "property registered");
        Ok(property)
    }

    /// # Errors
    ///
    /// `NotFound` when no property has this id.
    pub fn get(&self, id: Uuid) -> Result<Property> {
        self.ctx.require(id)
    }

    /// # Errors
    ///
    /// Validation failure for a malformed code, `NotFound` when no property
    /// has this code.
    pub fn get_by_code(&self, code: &str) -> Result<Property> {
        let code = validate_code(code)?;
        self.ctx
            .properties
            .find_by_code(&code)
            .ok_or(RentalError::NotFound(code))
    }

    /// # Errors
    ///
    /// Validation failures in the query.
    pub fn list(&self, query: &PropertyListQuery) -> Result<PropertyPage> {
        let filter = validate_list_query(query, self.limits)?;
        let page = self.ctx.properties.list(&filter);
        debug!(
            total = page.total,
            returned = page.items.len(),
            "properties listed"
        );
        Ok(page)
    }

    /// Apply a partial update and append one change record per changed field.
    ///
    /// All records of one update share a timestamp and reason.
    ///
    /// # Errors
    ///
    /// Validation failures, `NotFound`, `PropertyDeleted`, `NoChanges`,
    /// `DuplicateAddress` or `RecordLimitExceeded`.
    #[instrument(skip(self, request))]
    pub fn update(
        &self,
        id: Uuid,
        request: &UpdatePropertyRequest,
        actor: &str,
    ) -> Result<UpdateOutcome> {
        let patch = validate_property_patch(request)?;
        let actor = checked_actor(actor)?;
        let _gate = self.write_gate.lock();

        let current = self.ctx.require(id)?;
        if current.is_deleted() {
            warn!(code = %current.code, "update of deleted property rejected");
            return Err(RentalError::PropertyDeleted { code: current.code });
        }

        let mut next = current.clone();
        patch.apply_to(&mut next);
        let diffs = diff(&current, &next);
        if diffs.is_empty() {
            return Err(RentalError::NoChanges { code: current.code });
        }

        let new_key = next.address_key();
        if diffs.iter().any(|d| d.field.is_address_key()) && new_key != current.address_key() {
            if let Some(existing) = self
                .ctx
                .properties
                .find_by_address_key(&new_key)
                .filter(|p| p.id != id)
            {
                warn!(existing = %existing.code, "address change collides");
                return Err(RentalError::DuplicateAddress {
                    existing_code: existing.code,
                });
            }
        }

        self.check_record_limit(&current, diffs.len())?;

        let now = self.ctx.now();
        next.updated_at = now;
        self.ctx.properties.replace(next.clone())?;

        let changes: Vec<ChangeRecord> = diffs
            .into_iter()
            .map(|d| {
                ChangeRecord::new(
                    id,
                    d.field,
                    d.old_value,
                    d.new_value,
                    patch.reason.clone(),
                    &actor,
                    now,
                )
            })
            .collect();
        for change in &changes {
            self.ctx.history.append_change(change.clone());
        }

        info!(code = %next.code, fields = changes.len(), "property updated");
        Ok(UpdateOutcome {
            property: next,
            changes,
        })
    }

    /// Mark a property as deleted. The record stays in the store.
    ///
    /// # Errors
    ///
    /// Validation failures, `NotFound` or `PropertyDeleted` when already
    /// marked.
    #[instrument(skip(self, request))]
    pub fn delete(
        &self,
        id: Uuid,
        request: &DeletePropertyRequest,
        actor: &str,
    ) -> Result<Property> {
        let reason = validate_reason(request.reason.as_deref())?;
        let actor = checked_actor(actor)?;
        let _gate = self.write_gate.lock();

        let mut property = self.ctx.require(id)?;
        if property.is_deleted() {
            return Err(RentalError::PropertyDeleted {
                code: property.code,
            });
        }

        let now = self.ctx.now();
        let description =
            reason.unwrap_or_else(|| format!("Property {} marked as deleted", property.code));
        let metadata = BTreeMap::from([("previous_status".to_string(), json!(property.status))]);
        let event = LifecycleEvent::new(id, LifecycleEventType::Deleted, description, &actor, now)
            .with_impact(Some("Property is read-only and hidden from listings".to_string()))
            .with_metadata(metadata);

        property.deleted_at = Some(now);
        property.status = PropertyStatus::Unavailable;
        property.updated_at = now;
        self.ctx.properties.replace(property.clone())?;
        self.ctx.history.append_event(event);

        info!(code = %property.code, "property marked as deleted");
        Ok(property)
    }

    /// Append a caller-submitted lifecycle event.
    ///
    /// `tenant_move_in` turns an available property into rented and
    /// `tenant_move_out` turns a rented one back into available. Either
    /// move is recorded as a `status` change.
    ///
    /// # Errors
    ///
    /// Validation failures, `ReservedEventType`, `NotFound`,
    /// `PropertyDeleted` or `RecordLimitExceeded`.
    #[instrument(skip(self, request))]
    pub fn record_event(
        &self,
        id: Uuid,
        request: &RecordEventRequest,
        actor: &str,
    ) -> Result<EventOutcome> {
        let new = validate_event_request(request)?;
        let actor = checked_actor(actor)?;
        let _gate = self.write_gate.lock();

        let mut property = self.ctx.require(id)?;
        if property.is_deleted() {
            return Err(RentalError::PropertyDeleted {
                code: property.code,
            });
        }

        let transition = status_transition(new.event_type, property.status);
        if transition.is_some() {
            self.check_record_limit(&property, 1)?;
        }

        let at = self.ctx.now();
        let event = LifecycleEvent::new(id, new.event_type, new.description, &actor, at)
            .with_impact(new.impact)
            .with_metadata(new.metadata);
        self.ctx.history.append_event(event.clone());

        let status_change = match transition {
            Some(status) => {
                let now = self.ctx.now();
                let change = ChangeRecord::new(
                    id,
                    TrackedField::Status,
                    json!(property.status),
                    json!(status),
                    Some(format!("{} event", new.event_type)),
                    &actor,
                    now,
                );
                property.status = status;
                property.updated_at = now;
                self.ctx.properties.replace(property.clone())?;
                self.ctx.history.append_change(change.clone());
                Some(change)
            }
            None => None,
        };

        info!(
            code = %property.code,
            event_type = %event.event_type,
            status = %property.status,
            "lifecycle event recorded"
        );
        Ok(EventOutcome {
            event,
            property,
            status_change,
        })
    }

    fn check_record_limit(&self, property: &Property, adding: usize) -> Result<()> {
        let existing = self.ctx.history.count_changes_for(property.id);
        if existing.saturating_add(adding) > self.max_records_per_property {
            warn!(
                code = %property.code,
                existing,
                adding,
                limit = self.max_records_per_property,
                "history record limit reached"
            );
            return Err(RentalError::RecordLimitExceeded {
                code: property.code.clone(),
                limit: self.max_records_per_property,
            });
        }
        Ok(())
    }
}

/// Status implied by a tenant event, if the current status allows it.
const fn status_transition(
    event: LifecycleEventType,
    current: PropertyStatus,
) -> Option<PropertyStatus> {
    match (event, current) {
        (LifecycleEventType::TenantMoveIn, PropertyStatus::Available) => {
            Some(PropertyStatus::Rented)
        }
        (LifecycleEventType::TenantMoveOut, PropertyStatus::Rented) => {
            Some(PropertyStatus::Available)
        }
        _ => None,
    }
}
