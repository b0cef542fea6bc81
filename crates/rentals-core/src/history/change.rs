//! Field-level change records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::model::ParseEnumError;
use crate::model::property::normalize;

/// Classification tag attached to every change record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Address,
    Characteristics,
    Financial,
    Status,
    Description,
}

impl ChangeType {
    pub const ALL: [Self; 5] = [
        Self::Address,
        Self::Characteristics,
        Self::Financial,
        Self::Status,
        Self::Description,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::Characteristics => "characteristics",
            Self::Financial => "financial",
            Self::Status => "status",
            Self::Description => "description",
        }
    }
}

/// Every property attribute whose mutation is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedField {
    PropertyType,
    Address,
    Complement,
    Neighborhood,
    PostalCode,
    City,
    State,
    Bedrooms,
    Bathrooms,
    ParkingSpaces,
    AreaM2,
    RentValue,
    CondoFee,
    Iptu,
    Description,
    Status,
}

impl TrackedField {
    /// Patch application order. Address components first, status last.
    pub const ALL: [Self; 16] = [
        Self::Address,
        Self::Complement,
        Self::Neighborhood,
        Self::PostalCode,
        Self::City,
        Self::State,
        Self::PropertyType,
        Self::Bedrooms,
        Self::Bathrooms,
        Self::ParkingSpaces,
        Self::AreaM2,
        Self::RentValue,
        Self::CondoFee,
        Self::Iptu,
        Self::Description,
        Self::Status,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PropertyType => "property_type",
            Self::Address => "address",
            Self::Complement => "complement",
            Self::Neighborhood => "neighborhood",
            Self::PostalCode => "postal_code",
            Self::City => "city",
            Self::State => "state",
            Self::Bedrooms => "bedrooms",
            Self::Bathrooms => "bathrooms",
            Self::ParkingSpaces => "parking_spaces",
            Self::AreaM2 => "area_m2",
            Self::RentValue => "rent_value",
            Self::CondoFee => "condo_fee",
            Self::Iptu => "iptu",
            Self::Description => "description",
            Self::Status => "status",
        }
    }

    #[must_use]
    pub const fn change_type(self) -> ChangeType {
        match self {
            Self::Address
            | Self::Complement
            | Self::Neighborhood
            | Self::PostalCode
            | Self::City
            | Self::State => ChangeType::Address,
            Self::PropertyType
            | Self::Bedrooms
            | Self::Bathrooms
            | Self::ParkingSpaces
            | Self::AreaM2 => ChangeType::Characteristics,
            Self::RentValue | Self::CondoFee | Self::Iptu => ChangeType::Financial,
            Self::Status => ChangeType::Status,
            Self::Description => ChangeType::Description,
        }
    }

    /// True for the components of the uniqueness key.
    #[must_use]
    pub const fn is_address_key(self) -> bool {
        matches!(
            self,
            Self::Address | Self::Neighborhood | Self::PostalCode | Self::City | Self::State
        )
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TrackedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| ParseEnumError {
                expected: "change type",
                got: s.to_string(),
            })
    }
}

impl FromStr for TrackedField {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == normalized)
            .ok_or_else(|| ParseEnumError {
                expected: "field",
                got: s.to_string(),
            })
    }
}

/// One immutable field mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub id: Uuid,
    pub property_id: Uuid,
    pub field: TrackedField,
    pub old_value: Value,
    pub new_value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
    pub change_type: ChangeType,
}

impl ChangeRecord {
    #[must_use]
    pub fn new(
        property_id: Uuid,
        field: TrackedField,
        old_value: Value,
        new_value: Value,
        reason: Option<String>,
        changed_by: &str,
        changed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            property_id,
            field,
            old_value,
            new_value,
            reason,
            changed_by: changed_by.to_string(),
            changed_at,
            change_type: field.change_type(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_field_parses_back() {
        for field in TrackedField::ALL {
            assert_eq!(TrackedField::from_str(field.as_str()), Ok(field));
            assert_eq!(
                serde_json::to_value(field).expect("serialize"),
                Value::String(field.as_str().to_string())
            );
        }
    }

    #[test]
    fn field_list_has_no_duplicates() {
        let unique: HashSet<_> = TrackedField::ALL.iter().collect();
        assert_eq!(unique.len(), TrackedField::ALL.len());
    }

    #[test]
    fn classification_covers_every_change_type() {
        let covered: HashSet<_> = TrackedField::ALL.iter().map(|f| f.change_type()).collect();
        for kind in ChangeType::ALL {
            assert!(covered.contains(&kind), "{kind} has no field");
        }
    }

    #[test]
    fn classification_examples() {
        assert_eq!(TrackedField::RentValue.change_type(), ChangeType::Financial);
        assert_eq!(TrackedField::PostalCode.change_type(), ChangeType::Address);
        assert_eq!(
            TrackedField::AreaM2.change_type(),
            ChangeType::Characteristics
        );
        assert_eq!(TrackedField::Status.change_type(), ChangeType::Status);
        assert!(TrackedField::City.is_address_key());
        assert!(!TrackedField::Complement.is_address_key());
    }

    #[test]
    fn new_record_derives_change_type() {
        let record = ChangeRecord::new(
            Uuid::new_v4(),
            TrackedField::Iptu,
            Value::Null,
            serde_json::json!(120.5),
            Some("annual update".into()),
            "ana",
            Utc::now(),
        );
        assert_eq!(record.change_type, ChangeType::Financial);
        assert_eq!(record.changed_by, "ana");
    }
}
