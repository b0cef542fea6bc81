use std::fmt;

use uuid::Uuid;

use crate::validate::ValidationError;

/// Machine-readable error codes surfaced to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidPayload,
    RouteNotFound,
    PropertyNotFound,
    DuplicateAddress,
    PropertyDeleted,
    NoChanges,
    ReservedEventType,
    NoFieldHistory,
    RecordLimitExceeded,
    ExportTooLarge,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidPayload => "E1101",
            Self::RouteNotFound => "E1201",
            Self::PropertyNotFound => "E2001",
            Self::DuplicateAddress => "E2002",
            Self::PropertyDeleted => "E2003",
            Self::NoChanges => "E2004",
            Self::ReservedEventType => "E2005",
            Self::NoFieldHistory => "E3001",
            Self::RecordLimitExceeded => "E4001",
            Self::ExportTooLarge => "E4002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and responses.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidPayload => "Invalid request payload",
            Self::RouteNotFound => "No such route",
            Self::PropertyNotFound => "Property not found",
            Self::DuplicateAddress => "Address already registered",
            Self::PropertyDeleted => "Property is marked as deleted",
            Self::NoChanges => "Update changes nothing",
            Self::ReservedEventType => "Lifecycle event type is reserved",
            Self::NoFieldHistory => "Field has no recorded changes",
            Self::RecordLimitExceeded => "History record limit reached",
            Self::ExportTooLarge => "Export exceeds record limit",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint for operators and API clients.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InvalidPayload => Some("Correct the fields listed in `details` and resend."),
            Self::RouteNotFound => Some("See the route table in the rentals-api README."),
            Self::PropertyNotFound | Self::NoFieldHistory => None,
            Self::DuplicateAddress => {
                Some("Check the existing property with the same address before registering.")
            }
            Self::PropertyDeleted => Some("Deleted properties are read-only."),
            Self::NoChanges => Some("Send at least one field whose value differs."),
            Self::ReservedEventType => {
                Some("`created` and `deleted` are recorded by create/delete operations.")
            }
            Self::RecordLimitExceeded => {
                Some("Raise history.max_records_per_property in the config file.")
            }
            Self::ExportTooLarge => Some("Narrow the date range or field filters and retry."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors returned by the rentals services.
#[derive(Debug, thiserror::Error)]
pub enum RentalError {
    #[error("invalid payload: {}", summarize(.0))]
    Validation(Vec<ValidationError>),

    #[error("property '{0}' not found")]
    NotFound(String),

    #[error("address already registered by property {existing_code}")]
    DuplicateAddress { existing_code: String },

    #[error("property {code} is marked as deleted")]
    PropertyDeleted { code: String },

    #[error("update to property {code} changes no field")]
    NoChanges { code: String },

    #[error("lifecycle event '{event_type}' cannot be recorded directly")]
    ReservedEventType { event_type: String },

    #[error("field '{field}' of property {property_id} has no recorded changes")]
    NoFieldHistory { property_id: Uuid, field: String },

    #[error("property {code} would exceed {limit} history records")]
    RecordLimitExceeded { code: String, limit: usize },

    #[error("export would contain {count} records, limit is {limit}")]
    ExportTooLarge { count: usize, limit: usize },

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

impl RentalError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::InvalidPayload,
            Self::NotFound(_) => ErrorCode::PropertyNotFound,
            Self::DuplicateAddress { .. } => ErrorCode::DuplicateAddress,
            Self::PropertyDeleted { .. } => ErrorCode::PropertyDeleted,
            Self::NoChanges { .. } => ErrorCode::NoChanges,
            Self::ReservedEventType { .. } => ErrorCode::ReservedEventType,
            Self::NoFieldHistory { .. } => ErrorCode::NoFieldHistory,
            Self::RecordLimitExceeded { .. } => ErrorCode::RecordLimitExceeded,
            Self::ExportTooLarge { .. } => ErrorCode::ExportTooLarge,
            Self::Internal(_) => ErrorCode::InternalUnexpected,
        }
    }

    /// Remediation hint, if any.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }

    /// Shorthand for a single-field validation failure.
    #[must_use]
    pub fn invalid(error: ValidationError) -> Self {
        Self::Validation(vec![error])
    }
}

pub type Result<T, E = RentalError> = std::result::Result<T, E>;
