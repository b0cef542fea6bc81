//! Brazilian address primitives: CEP, UF and the uniqueness key.

use serde::Serialize;

/// The 27 federative units.
pub const UFS: [&str; 27] = [
    "AC", "AL", "AP", "AM", "BA", "CE", "DF", "ES", "GO", "MA", "MT", "MS", "MG", "PA", "PB", "PR",
    "PE", "PI", "RJ", "RN", "RS", "RO", "RR", "SC", "SP", "SE", "TO",
];

/// Normalize a CEP to `NNNNN-NNN`.
///
/// Accepts `NNNNNNNN` or `NNNNN-NNN` with surrounding whitespace. Returns
/// `None` for anything else.
#[must_use]
pub fn normalize_cep(raw: &str) -> Option<String> {
    let value = raw.trim();
    let digits: String = match value.len() {
        8 => value.to_string(),
        9 if value.as_bytes()[5] == b'-' => format!("{}{}", &value[..5], &value[6..]),
        _ => return None,
    };
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("{}-{}", &digits[..5], &digits[5..]))
}

/// Normalize a UF to upper case if it names a federative unit.
#[must_use]
pub fn normalize_uf(raw: &str) -> Option<String> {
    let upper = raw.trim().to_ascii_uppercase();
    UFS.contains(&upper.as_str()).then_some(upper)
}

/// Trim and collapse inner whitespace runs to a single space.
#[must_use]
pub fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-insensitive location identity used for duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AddressKey(String);

impl AddressKey {
    #[must_use]
    pub fn new(
        address: &str,
        neighborhood: &str,
        postal_code: &str,
        city: &str,
        state: &str,
    ) -> Self {
        let cep = normalize_cep(postal_code).unwrap_or_else(|| postal_code.trim().to_string());
        let parts = [address, neighborhood, &cep, city, state]
            .iter()
            .map(|part| collapse_whitespace(part).to_lowercase())
            .collect::<Vec<_>>();
        Self(parts.join("|"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
