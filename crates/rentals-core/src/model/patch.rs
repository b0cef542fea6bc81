//! Validated property payloads and field-level diffing.

use serde_json::{Value, json};

use super::property::{Property, PropertyStatus, PropertyType};
use crate::history::TrackedField;

/// A fully validated and normalized registration payload.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProperty {
    pub property_type: PropertyType,
    pub address: String,
    pub complement: Option<String>,
    pub neighborhood: String,
    pub postal_code: String,
    pub city: String,
    pub state: String,
    pub bedrooms: u8,
    pub bathrooms: u8,
    pub parking_spaces: u8,
    pub area_m2: f64,
    pub rent_value: f64,
    pub condo_fee: Option<f64>,
    pub iptu: Option<f64>,
    pub description: Option<String>,
    pub status: PropertyStatus,
}

/// A validated partial update. `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq)]
#[allow(clippy::option_option)] // absent and cleared are distinct states
pub struct PropertyPatch {
    pub property_type: Option<PropertyType>,
    pub address: Option<String>,
    pub complement: Option<Option<String>>,
    pub neighborhood: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub bedrooms: Option<u8>,
    pub bathrooms: Option<u8>,
    pub parking_spaces: Option<u8>,
    pub area_m2: Option<f64>,
    pub rent_value: Option<f64>,
    pub condo_fee: Option<Option<f64>>,
    pub iptu: Option<Option<f64>>,
    pub description: Option<Option<String>>,
    pub status: Option<PropertyStatus>,
    pub reason: Option<String>,
}

impl PropertyPatch {
    /// True when the patch carries no field (a reason alone does not count).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self
            == Self {
                reason: self.reason.clone(),
                ..Self::default()
            }
    }

    /// Write every present field onto `property`.
    pub fn apply_to(&self, property: &mut Property) {
        if let Some(v) = self.property_type {
            property.property_type = v;
        }
        if let Some(v) = &self.address {
            property.address.clone_from(v);
        }
        if let Some(v) = &self.complement {
            property.complement.clone_from(v);
        }
        if let Some(v) = &self.neighborhood {
            property.neighborhood.clone_from(v);
        }
        if let Some(v) = &self.postal_code {
            property.postal_code.clone_from(v);
        }
        if let Some(v) = &self.city {
            property.city.clone_from(v);
        }
        if let Some(v) = &self.state {
            property.state.clone_from(v);
        }
        if let Some(v) = self.bedrooms {
            property.bedrooms = v;
        }
        if let Some(v) = self.bathrooms {
            property.bathrooms = v;
        }
        if let Some(v) = self.parking_spaces {
            property.parking_spaces = v;
        }
        if let Some(v) = self.area_m2 {
            property.area_m2 = v;
        }
        if let Some(v) = self.rent_value {
            property.rent_value = v;
        }
        if let Some(v) = self.condo_fee {
            property.condo_fee = v;
        }
        if let Some(v) = self.iptu {
            property.iptu = v;
        }
        if let Some(v) = &self.description {
            property.description.clone_from(v);
        }
        if let Some(v) = self.status {
            property.status = v;
        }
    }
}

impl Property {
    /// Current value of a tracked field, as stored in change records.
    #[must_use]
    pub fn field_value(&self, field: TrackedField) -> Value {
        match field {
            TrackedField::PropertyType => json!(self.property_type),
            TrackedField::Address => json!(self.address),
            TrackedField::Complement => json!(self.complement),
            TrackedField::Neighborhood => json!(self.neighborhood),
            TrackedField::PostalCode => json!(self.postal_code),
            TrackedField::City => json!(self.city),
            TrackedField::State => json!(self.state),
            TrackedField::Bedrooms => json!(self.bedrooms),
            TrackedField::Bathrooms => json!(self.bathrooms),
            TrackedField::ParkingSpaces => json!(self.parking_spaces),
            TrackedField::AreaM2 => json!(self.area_m2),
            TrackedField::RentValue => json!(self.rent_value),
            TrackedField::CondoFee => json!(self.condo_fee),
            TrackedField::Iptu => json!(self.iptu),
            TrackedField::Description => json!(self.description),
            TrackedField::Status => json!(self.status),
        }
    }
}

/// One field whose value differs between two versions of a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDiff {
    pub field: TrackedField,
    pub old_value: Value,
    pub new_value: Value,
}

/// Fields that differ between `before` and `after`, in [`TrackedField::ALL`]
/// order.
#[must_use]
pub fn diff(before: &Property, after: &Property) -> Vec<FieldDiff> {
    TrackedField::ALL
        .into_iter()
        .filter_map(|field| {
            let old_value = before.field_value(field);
            let new_value = after.field_value(field);
            (old_value != new_value).then_some(FieldDiff {
                field,
                old_value,
                new_value,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample() -> Property {
        let now = Utc::now();
        Property {
            id: Uuid::new_v4(),
            code: "PROP-20240101-001".into(),
            property_type: PropertyType::Apartment,
            address: "Rua das Flores, 10".into(),
            complement: Some("apto 12".into()),
            neighborhood: "Centro".into(),
            postal_code: "01000-000".into(),
            city: "São Paulo".into(),
            state: "SP".into(),
            bedrooms: 2,
            bathrooms: 1,
            parking_spaces: 1,
            area_m2: 54.0,
            rent_value: 2100.0,
            condo_fee: Some(450.0),
            iptu: None,
            description: None,
            status: PropertyStatus::Available,
            registered_by: "system".into(),
            registered_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn empty_patch_ignores_reason() {
        let patch = PropertyPatch {
            reason: Some("just because".into()),
            ..PropertyPatch::default()
        };
        assert!(patch.is_empty());
        let patch = PropertyPatch {
            bedrooms: Some(3),
            ..PropertyPatch::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn apply_and_diff_report_only_changed_fields() {
        let before = sample();
        let mut after = before.clone();
        PropertyPatch {
            rent_value: Some(2300.0),
            bedrooms: Some(2),
            condo_fee: Some(None),
            ..PropertyPatch::default()
        }
        .apply_to(&mut after);

        let changes = diff(&before, &after);
        let fields: Vec<_> = changes.iter().map(|d| d.field).collect();
        assert_eq!(
            fields,
            vec![TrackedField::RentValue, TrackedField::CondoFee]
        );
        assert_eq!(changes[0].old_value, json!(2100.0));
        assert_eq!(changes[0].new_value, json!(2300.0));
        assert_eq!(changes[1].new_value, Value::Null);
    }

    #[test]
    fn field_values_use_wire_names_for_enums() {
        let p = sample();
        assert_eq!(
            p.field_value(TrackedField::PropertyType),
            json!("apartment")
        );
        assert_eq!(p.field_value(TrackedField::Status), json!("available"));
        assert_eq!(p.field_value(TrackedField::Iptu), Value::Null);
    }
}
