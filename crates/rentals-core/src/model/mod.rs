pub mod address;
pub mod code;
pub mod patch;
pub mod property;

pub use address::AddressKey;
pub use patch::{FieldDiff, NewProperty, PropertyPatch, diff};
pub use property::{ParseEnumError, Property, PropertyStatus, PropertyType};
