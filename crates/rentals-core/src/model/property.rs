use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use super::address::AddressKey;

/// The kinds of rental property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    House,
    Apartment,
    Townhouse,
    Studio,
    Commercial,
    Office,
    Warehouse,
    Land,
}

impl PropertyType {
    pub const ALL: [Self; 8] = [
        Self::House,
        Self::Apartment,
        Self::Townhouse,
        Self::Studio,
        Self::Commercial,
        Self::Office,
        Self::Warehouse,
        Self::Land,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::House => "house",
            Self::Apartment => "apartment",
            Self::Townhouse => "townhouse",
            Self::Studio => "studio",
            Self::Commercial => "commercial",
            Self::Office => "office",
            Self::Warehouse => "warehouse",
            Self::Land => "land",
        }
    }
}

/// Availability of a property for rent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    Available,
    Rented,
    Maintenance,
    Unavailable,
}

impl Default for PropertyStatus {
    fn default() -> Self {
        Self::Available
    }
}

impl PropertyStatus {
    pub const ALL: [Self; 4] = [
        Self::Available,
        Self::Rented,
        Self::Maintenance,
        Self::Unavailable,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Rented => "rented",
            Self::Maintenance => "maintenance",
            Self::Unavailable => "unavailable",
        }
    }
}

/// A registered rental property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: Uuid,
    pub code: String,
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
    pub registered_by: String,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Property {
    /// Case-insensitive identity of the property's location.
    #[must_use]
    pub fn address_key(&self) -> AddressKey {
        AddressKey::new(
            &self.address,
            &self.neighborhood,
            &self.postal_code,
            &self.city,
            &self.state,
        )
    }

    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PropertyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase()
}

impl FromStr for PropertyType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| ParseEnumError {
                expected: "property type",
                got: s.to_string(),
            })
    }
}

impl FromStr for PropertyStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "available" => Ok(Self::Available),
            "rented" => Ok(Self::Rented),
            "maintenance" => Ok(Self::Maintenance),
            "unavailable" => Ok(Self::Unavailable),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PropertyStatus, PropertyType};
    use std::str::FromStr;

    #[test]
    fn enum_json_roundtrips() {
        assert_eq!(
            serde_json::to_string(&PropertyType::Apartment).expect("serialize"),
            "\"apartment\""
        );
        assert_eq!(
            serde_json::to_string(&PropertyStatus::Maintenance).expect("serialize"),
            "\"maintenance\""
        );
        assert_eq!(
            serde_json::from_str::<PropertyType>("\"warehouse\"").expect("deserialize"),
            PropertyType::Warehouse
        );
    }

    #[test]
    fn display_parse_roundtrips() {
        for value in PropertyType::ALL {
            assert_eq!(PropertyType::from_str(&value.to_string()), Ok(value));
        }
        for value in PropertyStatus::ALL {
            assert_eq!(PropertyStatus::from_str(&value.to_string()), Ok(value));
        }
    }

    #[test]
    fn parse_is_case_insensitive_and_trims() {
        assert_eq!(PropertyType::from_str("  House "), Ok(PropertyType::House));
        assert_eq!(
            PropertyStatus::from_str("RENTED"),
            Ok(PropertyStatus::Rented)
        );
    }

    #[test]
    fn parse_rejects_unknown_values() {
        assert!(PropertyType::from_str("castle").is_err());
        assert!(PropertyStatus::from_str("sold").is_err());
    }
}
