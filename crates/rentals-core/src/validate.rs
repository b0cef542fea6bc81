//! Payload validation.
//!
//! Field validators return the first problem with one value. The
//! `validate_*` entry points run every field validator of a payload and
//! report all violations together.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{RentalError, Result};
use crate::history::{
    ChangeType, ExportFormat, HistoryFilter, HistoryInclude, LifecycleEventType, TrackedField,
};
use crate::model::address::{collapse_whitespace, normalize_cep, normalize_uf};
use crate::model::code::parse_code;
use crate::model::{NewProperty, PropertyPatch, PropertyStatus, PropertyType};
use crate::request::{
    CreatePropertyRequest, ExportQuery, HistoryQuery, PropertyListQuery, RecentActivityQuery,
    RecordEventRequest, UpdatePropertyRequest,
};
use crate::store::PropertyListFilter;

pub const MAX_ADDRESS_LEN: usize = 200;
pub const MIN_ADDRESS_LEN: usize = 3;
pub const MAX_COMPLEMENT_LEN: usize = 100;
pub const MAX_NAME_LEN: usize = 100;
pub const MIN_NAME_LEN: usize = 2;
pub const MAX_DESCRIPTION_LEN: usize = 2000;
pub const MAX_ROOMS: i64 = 50;
pub const MAX_AREA_M2: f64 = 1_000_000.0;
pub const MAX_ACTOR_LEN: usize = 64;
pub const MAX_REASON_LEN: usize = 500;
pub const MAX_EVENT_DESCRIPTION_LEN: usize = 500;
pub const MAX_IMPACT_LEN: usize = 500;
pub const MAX_METADATA_KEYS: usize = 20;
pub const MAX_SEARCH_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: &'static str,
    pub value: String,
    pub reason: String,
    pub suggestion: String,
    pub code: &'static str,
}

impl ValidationError {
    pub fn new(
        field: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
        suggestion: impl Into<String>,
        code: &'static str,
    ) -> Self {
        Self {
            field,
            value: value.into(),
            reason: reason.into(),
            suggestion: suggestion.into(),
            code,
        }
    }

    fn missing(field: &'static str) -> Self {
        Self::new(
            field,
            "",
            "is required",
            format!("provide `{field}`"),
            "missing_field",
        )
    }
}

/// Page size bounds taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default: usize,
    pub max: usize,
}

/// A validated, caller-recordable lifecycle event.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLifecycleEvent {
    pub event_type: LifecycleEventType,
    pub description: String,
    pub impact: Option<String>,
    pub metadata: BTreeMap<String, Value>,
}

/// Validated export parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportParams {
    pub format: ExportFormat,
    pub include_summary: bool,
    pub filter: HistoryFilter,
}

/// Collects violations across the field validators of one payload.
#[derive(Default)]
struct Violations(Vec<ValidationError>);

impl Violations {
    fn check<T>(&mut self, result: std::result::Result<T, ValidationError>) -> Option<T> {
        result.map_err(|e| self.0.push(e)).ok()
    }

    fn required<T>(
        &mut self,
        field: &'static str,
        raw: Option<&str>,
        validate: impl FnOnce(&str) -> std::result::Result<T, ValidationError>,
    ) -> Option<T> {
        match raw {
            Some(value) => self.check(validate(value)),
            None => {
                self.0.push(ValidationError::missing(field));
                None
            }
        }
    }

    fn finish(self) -> Result<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(RentalError::Validation(self.0))
        }
    }
}

fn text(
    field: &'static str,
    raw: &str,
    min: usize,
    max: usize,
) -> std::result::Result<String, ValidationError> {
    let value = collapse_whitespace(raw);
    if value.chars().count() < min {
        let reason = if min <= 1 {
            "must not be empty".to_string()
        } else {
            format!("must be at least {min} characters")
        };
        return Err(ValidationError::new(
            field,
            raw,
            reason,
            format!("provide a longer `{field}`"),
            "too_short",
        ));
    }
    bounded(field, raw, value, max)
}

/// Optional free text: blank input clears the value.
fn optional_text(
    field: &'static str,
    raw: &str,
    max: usize,
) -> std::result::Result<Option<String>, ValidationError> {
    let value = collapse_whitespace(raw);
    if value.is_empty() {
        return Ok(None);
    }
    bounded(field, raw, value, max).map(Some)
}

/// Length and character checks on already collapsed text.
fn bounded(
    field: &'static str,
    raw: &str,
    value: String,
    max: usize,
) -> std::result::Result<String, ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::new(
            field,
            raw,
            format!("must be <= {max} characters"),
            format!("shorten `{field}`"),
            "too_long",
        ));
    }
    if value.chars().any(char::is_control) {
        return Err(ValidationError::new(
            field,
            raw,
            "must not contain control characters",
            "remove control characters",
            "control_characters",
        ));
    }
    Ok(value)
}

/// Validate and collapse a street address.
///
/// # Errors
///
/// Returns a [`ValidationError`] when the address is too short, too long or
/// contains control characters.
pub fn validate_address(raw: &str) -> std::result::Result<String, ValidationError> {
    text("address", raw, MIN_ADDRESS_LEN, MAX_ADDRESS_LEN)
}

/// Normalize a CEP to `NNNNN-NNN`.
///
/// # Errors
///
/// Returns a [`ValidationError`] unless the input holds exactly 8 digits.
pub fn validate_postal_code(raw: &str) -> std::result::Result<String, ValidationError> {
    normalize_cep(raw).ok_or_else(|| {
        ValidationError::new(
            "postal_code",
            raw,
            "must be a CEP with 8 digits",
            "use NNNNN-NNN or NNNNNNNN",
            "invalid_postal_code",
        )
    })
}

/// # Errors
///
/// Returns a [`ValidationError`] for anything but a known UF.
pub fn validate_state(raw: &str) -> std::result::Result<String, ValidationError> {
    normalize_uf(raw).ok_or_else(|| {
        ValidationError::new(
            "state",
            raw,
            "is not a Brazilian federative unit",
            "use a two-letter UF such as SP or RJ",
            "invalid_state",
        )
    })
}

/// # Errors
///
/// Returns a [`ValidationError`] naming the accepted types.
pub fn validate_property_type(raw: &str) -> std::result::Result<PropertyType, ValidationError> {
    PropertyType::from_str(raw).map_err(|_| {
        let types = join(PropertyType::ALL.map(PropertyType::as_str));
        ValidationError::new(
            "property_type",
            raw,
            "unknown property type",
            format!("use one of: {types}"),
            "invalid_property_type",
        )
    })
}

/// # Errors
///
/// Returns a [`ValidationError`] naming the accepted statuses.
pub fn validate_status(raw: &str) -> std::result::Result<PropertyStatus, ValidationError> {
    PropertyStatus::from_str(raw).map_err(|_| {
        let statuses = join(PropertyStatus::ALL.map(PropertyStatus::as_str));
        ValidationError::new(
            "status",
            raw,
            "unknown status",
            format!("use one of: {statuses}"),
            "invalid_status",
        )
    })
}

fn join<const N: usize>(values: [&str; N]) -> String {
    values.join(", ")
}

fn count(field: &'static str, raw: i64) -> std::result::Result<u8, ValidationError> {
    if (0..=MAX_ROOMS).contains(&raw) {
        u8::try_from(raw).map_err(|_| out_of_range(field, raw))
    } else {
        Err(out_of_range(field, raw))
    }
}

fn out_of_range(field: &'static str, raw: i64) -> ValidationError {
    ValidationError::new(
        field,
        raw.to_string(),
        format!("must be between 0 and {MAX_ROOMS}"),
        format!("send a whole number for `{field}`"),
        "out_of_range",
    )
}

/// # Errors
///
/// Returns a [`ValidationError`] unless `0 < raw <= MAX_AREA_M2`.
pub fn validate_area(raw: f64) -> std::result::Result<f64, ValidationError> {
    if raw.is_finite() && raw > 0.0 && raw <= MAX_AREA_M2 {
        Ok(raw)
    } else {
        Err(ValidationError::new(
            "area_m2",
            raw.to_string(),
            format!("must be greater than 0 and <= {MAX_AREA_M2}"),
            "send the usable area in square meters",
            "out_of_range",
        ))
    }
}

fn money(field: &'static str, raw: f64) -> std::result::Result<f64, ValidationError> {
    if raw.is_finite() && raw >= 0.0 {
        Ok(raw)
    } else {
        Err(ValidationError::new(
            field,
            raw.to_string(),
            "must be a non-negative amount",
            format!("send `{field}` in BRL, e.g. 1500.00"),
            "invalid_amount",
        ))
    }
}

/// Validate an actor name resolved from a request.
///
/// # Errors
///
/// Returns a [`ValidationError`] when the actor is blank, longer than
/// [`MAX_ACTOR_LEN`] or contains control characters.
pub fn validate_actor(raw: &str) -> std::result::Result<String, ValidationError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationError::new(
            "actor",
            raw,
            "must not be empty",
            "send a user id or omit the header",
            "invalid_actor",
        ));
    }
    if value.chars().count() > MAX_ACTOR_LEN {
        return Err(ValidationError::new(
            "actor",
            raw,
            format!("must be <= {MAX_ACTOR_LEN} characters"),
            "use a shorter user id",
            "invalid_actor",
        ));
    }
    if value.chars().any(char::is_control) {
        return Err(ValidationError::new(
            "actor",
            raw,
            "must not contain control characters",
            "remove control characters",
            "invalid_actor",
        ));
    }
    Ok(value.to_string())
}

/// Validate a registration payload.
///
/// Room counts default to zero and status defaults to `available`.
///
/// # Errors
///
/// Returns [`RentalError::Validation`] listing every violation.
pub fn validate_new_property(req: &CreatePropertyRequest) -> Result<NewProperty> {
    let mut v = Violations::default();

    let property_type = v.required(
        "property_type",
        req.property_type.as_deref(),
        validate_property_type,
    );
    let address = v.required("address", req.address.as_deref(), validate_address);
    let complement = req
        .complement
        .as_deref()
        .and_then(|c| v.check(optional_text("complement", c, MAX_COMPLEMENT_LEN)))
        .flatten();
    let neighborhood = v.required("neighborhood", req.neighborhood.as_deref(), |s| {
        text("neighborhood", s, MIN_NAME_LEN, MAX_NAME_LEN)
    });
    let postal_code = v.required(
        "postal_code",
        req.postal_code.as_deref(),
        validate_postal_code,
    );
    let city = v.required("city", req.city.as_deref(), |s| {
        text("city", s, MIN_NAME_LEN, MAX_NAME_LEN)
    });
    let state = v.required("state", req.state.as_deref(), validate_state);
    let bedrooms = v.check(count("bedrooms", req.bedrooms.unwrap_or(0)));
    let bathrooms = v.check(count("bathrooms", req.bathrooms.unwrap_or(0)));
    let parking_spaces = v.check(count("parking_spaces", req.parking_spaces.unwrap_or(0)));
    let area_m2 = match req.area_m2 {
        Some(a) => v.check(validate_area(a)),
        None => {
            v.0.push(ValidationError::missing("area_m2"));
            None
        }
    };
    let rent_value = match req.rent_value {
        Some(r) => v.check(money("rent_value", r)),
        None => {
            v.0.push(ValidationError::missing("rent_value"));
            None
        }
    };
    let condo_fee = req.condo_fee.and_then(|f| v.check(money("condo_fee", f)));
    let iptu = req.iptu.and_then(|f| v.check(money("iptu", f)));
    let description = req
        .description
        .as_deref()
        .and_then(|d| v.check(optional_text("description", d, MAX_DESCRIPTION_LEN)))
        .flatten();
    let status = match req.status.as_deref() {
        Some(s) => v.check(validate_status(s)),
        None => Some(PropertyStatus::default()),
    };

    v.finish()?;

    let (
        Some(property_type),
        Some(address),
        Some(neighborhood),
        Some(postal_code),
        Some(city),
        Some(state),
        Some(area_m2),
        Some(rent_value),
    ) = (property_type, address, neighborhood, postal_code, city, state, area_m2, rent_value)
    else {
        return Err(RentalError::Internal(anyhow::anyhow!(
            "required property field missing after validation"
        )));
    };

    Ok(NewProperty {
        property_type,
        address,
        complement,
        neighborhood,
        postal_code,
        city,
        state,
        bedrooms: bedrooms.unwrap_or_default(),
        bathrooms: bathrooms.unwrap_or_default(),
        parking_spaces: parking_spaces.unwrap_or_default(),
        area_m2,
        rent_value,
        condo_fee,
        iptu,
        description,
        status: status.unwrap_or_default(),
    })
}

/// Validate a partial update. Only present fields are checked.
///
/// # Errors
///
/// Returns [`RentalError::Validation`] listing every violation, or a single
/// `no_fields` violation when the patch names no field.
pub fn validate_property_patch(req: &UpdatePropertyRequest) -> Result<PropertyPatch> {
    let mut v = Violations::default();

    let patch = PropertyPatch {
        property_type: req
            .property_type
            .as_deref()
            .and_then(|s| v.check(validate_property_type(s))),
        address: req
            .address
            .as_deref()
            .and_then(|s| v.check(validate_address(s))),
        complement: req.complement.as_ref().and_then(|c| match c.as_deref() {
            Some(s) => v.check(optional_text("complement", s, MAX_COMPLEMENT_LEN)),
            None => Some(None),
        }),
        neighborhood: req
            .neighborhood
            .as_deref()
            .and_then(|s| v.check(text("neighborhood", s, MIN_NAME_LEN, MAX_NAME_LEN))),
        postal_code: req
            .postal_code
            .as_deref()
            .and_then(|s| v.check(validate_postal_code(s))),
        city: req
            .city
            .as_deref()
            .and_then(|s| v.check(text("city", s, MIN_NAME_LEN, MAX_NAME_LEN))),
        state: req
            .state
            .as_deref()
            .and_then(|s| v.check(validate_state(s))),
        bedrooms: req.bedrooms.and_then(|n| v.check(count("bedrooms", n))),
        bathrooms: req.bathrooms.and_then(|n| v.check(count("bathrooms", n))),
        parking_spaces: req
            .parking_spaces
            .and_then(|n| v.check(count("parking_spaces", n))),
        area_m2: req.area_m2.and_then(|a| v.check(validate_area(a))),
        rent_value: req.rent_value.and_then(|r| v.check(money("rent_value", r))),
        condo_fee: req.condo_fee.and_then(|f| match f {
            Some(f) => v.check(money("condo_fee", f)).map(Some),
            None => Some(None),
        }),
        iptu: req.iptu.and_then(|f| match f {
            Some(f) => v.check(money("iptu", f)).map(Some),
            None => Some(None),
        }),
        description: req.description.as_ref().and_then(|d| match d.as_deref() {
            Some(s) => v.check(optional_text("description", s, MAX_DESCRIPTION_LEN)),
            None => Some(None),
        }),
        status: req
            .status
            .as_deref()
            .and_then(|s| v.check(validate_status(s))),
        reason: req
            .reason
            .as_deref()
            .and_then(|r| v.check(optional_text("reason", r, MAX_REASON_LEN)))
            .flatten(),
    };

    v.finish()?;

    if patch.is_empty() {
        return Err(RentalError::invalid(ValidationError::new(
            "patch",
            "",
            "names no property field",
            "send at least one field to change",
            "no_fields",
        )));
    }
    Ok(patch)
}

/// Validate a deletion reason.
///
/// # Errors
///
/// Returns [`RentalError::Validation`] when the reason is too long.
pub fn validate_reason(raw: Option<&str>) -> Result<Option<String>> {
    raw.map_or(Ok(None), |r| {
        optional_text("reason", r, MAX_REASON_LEN).map_err(RentalError::invalid)
    })
}

/// Validate a caller-submitted lifecycle event.
///
/// # Errors
///
/// Returns [`RentalError::ReservedEventType`] for `created`/`deleted`, and
/// [`RentalError::Validation`] for any other violation.
pub fn validate_event_request(req: &RecordEventRequest) -> Result<NewLifecycleEvent> {
    let mut v = Violations::default();

    let event_type = v.required("event_type", req.event_type.as_deref(), |s| {
        LifecycleEventType::from_str(s).map_err(|_| {
            ValidationError::new(
                "event_type",
                s,
                "unknown event type",
                "use contract_linked, contract_unlinked, tenant_move_in or tenant_move_out",
                "invalid_event_type",
            )
        })
    });
    let description = v.required("description", req.description.as_deref(), |s| {
        text("description", s, 1, MAX_EVENT_DESCRIPTION_LEN)
    });
    let impact = req
        .impact
        .as_deref()
        .and_then(|s| v.check(optional_text("impact", s, MAX_IMPACT_LEN)))
        .flatten();
    let metadata = req.metadata.clone().unwrap_or_default();
    if metadata.len() > MAX_METADATA_KEYS {
        v.0.push(ValidationError::new(
            "metadata",
            metadata.len().to_string(),
            format!("must have <= {MAX_METADATA_KEYS} keys"),
            "move bulky data elsewhere and reference it",
            "too_many_keys",
        ));
    }

    if let Some(event_type) = event_type.filter(|t| t.is_reserved()) {
        return Err(RentalError::ReservedEventType {
            event_type: event_type.to_string(),
        });
    }
    v.finish()?;

    let (Some(event_type), Some(description)) = (event_type, description) else {
        return Err(RentalError::Internal(anyhow::anyhow!(
            "required event field missing after validation"
        )));
    };
    Ok(NewLifecycleEvent {
        event_type,
        description,
        impact,
        metadata,
    })
}

/// Parse a comma separated list, reporting every unknown item.
fn parse_list<T: FromStr>(
    v: &mut Violations,
    field: &'static str,
    raw: Option<&str>,
    suggestion: &str,
) -> Vec<T> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match T::from_str(item) {
            Ok(value) => out.push(value),
            Err(_) => v.0.push(ValidationError::new(
                field,
                item,
                "unknown value",
                suggestion,
                "invalid_filter",
            )),
        }
    }
    out
}

fn parse_bound(
    field: &'static str,
    raw: &str,
    end_of_day: bool,
) -> std::result::Result<DateTime<Utc>, ValidationError> {
    let value = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }
    let time = if end_of_day {
        NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999)
    } else {
        Some(NaiveTime::MIN)
    };
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .zip(time)
        .map(|(date, time)| date.and_time(time).and_utc())
        .ok_or_else(|| {
            ValidationError::new(
                field,
                raw,
                "is not a date",
                "use YYYY-MM-DD or an RFC 3339 timestamp",
                "invalid_date",
            )
        })
}

fn page_size(v: &mut Violations, raw: Option<usize>, limits: PageLimits) -> usize {
    match raw {
        None => limits.default.min(limits.max),
        Some(n) if (1..=limits.max).contains(&n) => n,
        Some(n) => {
            v.0.push(ValidationError::new(
                "limit",
                n.to_string(),
                format!("must be between 1 and {}", limits.max),
                "request a smaller page and use offset",
                "invalid_limit",
            ));
            limits.default
        }
    }
}

fn filter_from_query(v: &mut Violations, q: &HistoryQuery) -> HistoryFilter {
    let from = q
        .from
        .as_deref()
        .and_then(|s| v.check(parse_bound("from", s, false)));
    let to = q
        .to
        .as_deref()
        .and_then(|s| v.check(parse_bound("to", s, true)));
    if from.zip(to).is_some_and(|(from, to)| from > to) {
        v.0.push(ValidationError::new(
            "from",
            q.from.clone().unwrap_or_default(),
            "must not be after `to`",
            "swap the bounds or widen the range",
            "invalid_range",
        ));
    }

    let field_names = join(TrackedField::ALL.map(TrackedField::as_str));
    let fields = parse_list::<TrackedField>(
        v,
        "fields",
        q.fields.as_deref(),
        &format!("use field names like {field_names}"),
    );
    let change_type_names = join(ChangeType::ALL.map(ChangeType::as_str));
    let change_types = parse_list::<ChangeType>(
        v,
        "change_types",
        q.change_types.as_deref(),
        &format!("use one of: {change_type_names}"),
    );
    let event_type_names = join(LifecycleEventType::ALL.map(LifecycleEventType::as_str));
    let event_types = parse_list::<LifecycleEventType>(
        v,
        "event_types",
        q.event_types.as_deref(),
        &format!("use one of: {event_type_names}"),
    );
    let actor = q
        .actor
        .as_deref()
        .filter(|a| !a.trim().is_empty())
        .and_then(|a| v.check(validate_actor(a)));
    let include = q
        .include
        .as_deref()
        .and_then(|s| {
            v.check(HistoryInclude::from_str(s).map_err(|_| {
                ValidationError::new(
                    "include",
                    s,
                    "unknown value",
                    "use all, changes or events",
                    "invalid_filter",
                )
            }))
        })
        .unwrap_or_default();

    HistoryFilter {
        from,
        to,
        fields,
        change_types,
        event_types,
        actor,
        include,
        limit: 0,
        offset: q.offset.unwrap_or(0),
    }
}

/// Validate a history query into a filter.
///
/// # Errors
///
/// Returns [`RentalError::Validation`] listing every violation.
pub fn validate_history_filter(q: &HistoryQuery, limits: PageLimits) -> Result<HistoryFilter> {
    let mut v = Violations::default();
    let mut filter = filter_from_query(&mut v, q);
    filter.limit = page_size(&mut v, q.limit, limits);
    v.finish()?;
    Ok(filter)
}

/// Validate export parameters. The filter carries `max_records` as its
/// limit and no offset.
///
/// # Errors
///
/// Returns [`RentalError::Validation`] listing every violation.
pub fn validate_export_params(q: &ExportQuery, max_records: usize) -> Result<ExportParams> {
    let mut v = Violations::default();
    let format = q
        .format
        .as_deref()
        .and_then(|s| {
            v.check(ExportFormat::from_str(s).map_err(|_| {
                ValidationError::new(
                    "format",
                    s,
                    "unsupported export format",
                    "use json, jsonl or csv",
                    "invalid_format",
                )
            }))
        })
        .unwrap_or_default();
    let mut filter = filter_from_query(&mut v, &q.filter_query());
    filter.limit = max_records;
    filter.offset = 0;
    v.finish()?;
    Ok(ExportParams {
        format,
        include_summary: q.include_summary.unwrap_or(true),
        filter,
    })
}

/// Validate property list parameters.
///
/// # Errors
///
/// Returns [`RentalError::Validation`] listing every violation.
pub fn validate_list_query(
    q: &PropertyListQuery,
    limits: PageLimits,
) -> Result<PropertyListFilter> {
    let mut v = Violations::default();
    let filter = PropertyListFilter {
        status: q
            .status
            .as_deref()
            .and_then(|s| v.check(validate_status(s))),
        property_type: q
            .property_type
            .as_deref()
            .and_then(|s| v.check(validate_property_type(s))),
        city: non_blank(q.city.as_deref()),
        state: q.state.as_deref().and_then(|s| v.check(validate_state(s))),
        neighborhood: non_blank(q.neighborhood.as_deref()),
        search: q
            .search
            .as_deref()
            .and_then(|s| v.check(optional_text("search", s, MAX_SEARCH_LEN)))
            .flatten(),
        include_deleted: q.include_deleted.unwrap_or(false),
        limit: page_size(&mut v, q.limit, limits),
        offset: q.offset.unwrap_or(0),
    };
    v.finish()?;
    Ok(filter)
}

/// Validate recent-activity parameters into an actor filter and a limit.
///
/// # Errors
///
/// Returns [`RentalError::Validation`] listing every violation.
pub fn validate_recent_query(
    q: &RecentActivityQuery,
    limits: PageLimits,
) -> Result<(Option<String>, usize)> {
    let mut v = Violations::default();
    let actor = q
        .actor
        .as_deref()
        .filter(|a| !a.trim().is_empty())
        .and_then(|a| v.check(validate_actor(a)));
    let limit = page_size(&mut v, q.limit, limits);
    v.finish()?;
    Ok((actor, limit))
}

/// Validate a bare page size.
///
/// # Errors
///
/// Returns [`RentalError::Validation`] when `raw` is outside `1..=limits.max`.
pub fn validate_limit(raw: Option<usize>, limits: PageLimits) -> Result<usize> {
    let mut v = Violations::default();
    let limit = page_size(&mut v, raw, limits);
    v.finish()?;
    Ok(limit)
}

/// Validate a property code such as `PROP-20250101-001`, returning it in
/// canonical upper case.
///
/// # Errors
///
/// Returns [`RentalError::Validation`] when the code is malformed.
pub fn validate_code(raw: &str) -> Result<String> {
    if parse_code(raw).is_some() {
        return Ok(raw.trim().to_ascii_uppercase());
    }
    Err(RentalError::invalid(ValidationError::new(
        "code",
        raw,
        "is not a property code",
        "use a code like PROP-20250101-001",
        "invalid_code",
    )))
}

fn non_blank(raw: Option<&str>) -> Option<String> {
    raw.map(collapse_whitespace).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LIMITS: PageLimits = PageLimits {
        default: 50,
        max: 200,
    };

    fn valid_create() -> CreatePropertyRequest {
        CreatePropertyRequest {
            property_type: Some("Apartment".into()),
            address: Some("  Rua   Augusta, 1500 ".into()),
            complement: Some("apto 41".into()),
            neighborhood: Some("Consolação".into()),
            postal_code: Some("01304001".into()),
            city: Some("São Paulo".into()),
            state: Some("sp".into()),
            bedrooms: Some(2),
            bathrooms: Some(1),
            parking_spaces: None,
            area_m2: Some(68.5),
            rent_value: Some(3200.0),
            condo_fee: Some(780.0),
            iptu: None,
            description: Some("   ".into()),
            status: None,
        }
    }

    fn violations(err: RentalError) -> Vec<ValidationError> {
        match err {
            RentalError::Validation(v) => v,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn new_property_is_normalized() {
        let p = validate_new_property(&valid_create()).expect("valid");
        assert_eq!(p.property_type, PropertyType::Apartment);
        assert_eq!(p.address, "Rua Augusta, 1500");
        assert_eq!(p.postal_code, "01304-001");
        assert_eq!(p.state, "SP");
        assert_eq!(p.parking_spaces, 0);
        assert_eq!(p.status, PropertyStatus::Available);
        assert_eq!(p.description, None);
    }

    #[test]
    fn new_property_reports_every_violation() {
        let req = CreatePropertyRequest {
            property_type: Some("castle".into()),
            postal_code: Some("123".into()),
            state: Some("XX".into()),
            bedrooms: Some(51),
            area_m2: Some(0.0),
            rent_value: Some(-1.0),
            ..valid_create()
        };
        let err = validate_new_property(&req).expect_err("invalid");
        let fields: Vec<_> = violations(err).into_iter().map(|e| e.field).collect();
        let expected = [
            "property_type",
            "postal_code",
            "state",
            "bedrooms",
            "area_m2",
            "rent_value",
        ];
        assert_eq!(fields, expected);
    }

    #[test]
    fn missing_required_fields_are_named() {
        let req = CreatePropertyRequest::default();
        let errs = violations(validate_new_property(&req).expect_err("invalid"));
        assert!(errs.iter().all(|e| e.code == "missing_field"));
        let fields: Vec<_> = errs.iter().map(|e| e.field).collect();
        let required = [
            "property_type",
            "address",
            "neighborhood",
            "postal_code",
            "city",
            "state",
            "area_m2",
            "rent_value",
        ];
        for f in required {
            assert!(fields.contains(&f), "{f} missing from {fields:?}");
        }
    }

    #[test]
    fn patch_requires_a_field() {
        let req = UpdatePropertyRequest {
            reason: Some("nothing".into()),
            ..UpdatePropertyRequest::default()
        };
        let errs = violations(validate_property_patch(&req).expect_err("empty"));
        assert_eq!(errs[0].code, "no_fields");
    }

    #[test]
    fn patch_null_clears_optional_fields() {
        let req: UpdatePropertyRequest =
            serde_json::from_value(json!({"condo_fee": null, "complement": ""})).expect("parse");
        let patch = validate_property_patch(&req).expect("valid");
        assert_eq!(patch.condo_fee, Some(None));
        assert_eq!(patch.complement, Some(None));
    }

    #[test]
    fn patch_checks_present_fields_only() {
        let req = UpdatePropertyRequest {
            state: Some("zz".into()),
            rent_value: Some(10.0),
            ..UpdatePropertyRequest::default()
        };
        let errs = violations(validate_property_patch(&req).expect_err("bad state"));
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].field, "state");
    }

    #[test]
    fn reserved_event_types_are_rejected() {
        let req = RecordEventRequest {
            event_type: Some("created".into()),
            description: Some("again".into()),
            ..RecordEventRequest::default()
        };
        let err = validate_event_request(&req).expect_err("reserved");
        let RentalError::ReservedEventType { event_type } = err else {
            panic!("expected a reserved event type error");
        };
        assert_eq!(event_type, "created");
    }

    #[test]
    fn event_request_is_validated() {
        let req = RecordEventRequest {
            event_type: Some("tenant_move_in".into()),
            description: Some("Maria moved in".into()),
            impact: Some("status becomes rented".into()),
            metadata: Some(BTreeMap::from([("tenant".to_string(), json!("Maria"))])),
        };
        let event = validate_event_request(&req).expect("valid");
        assert_eq!(event.event_type, LifecycleEventType::TenantMoveIn);
        assert_eq!(event.metadata.len(), 1);
    }

    #[test]
    fn history_filter_parses_lists_and_dates() {
        let q = HistoryQuery {
            from: Some("2024-01-01".into()),
            to: Some("2024-01-31".into()),
            fields: Some("rent_value, status".into()),
            change_types: Some("financial".into()),
            event_types: None,
            actor: Some("ana".into()),
            include: Some("changes".into()),
            limit: Some(10),
            offset: Some(5),
        };
        let f = validate_history_filter(&q, LIMITS).expect("valid");
        assert_eq!(
            f.fields,
            vec![TrackedField::RentValue, TrackedField::Status]
        );
        assert_eq!(f.change_types, vec![ChangeType::Financial]);
        assert_eq!(f.include, HistoryInclude::Changes);
        assert_eq!(f.limit, 10);
        assert_eq!(f.offset, 5);
        let from = f.from.map(|d| d.to_rfc3339());
        assert_eq!(from.as_deref(), Some("2024-01-01T00:00:00+00:00"));
        assert_eq!(
            f.to.map(|d| d.format("%H:%M:%S").to_string()).as_deref(),
            Some("23:59:59")
        );
    }

    #[test]
    fn history_filter_rejects_inverted_range_and_unknown_names() {
        let q = HistoryQuery {
            from: Some("2024-02-01".into()),
            to: Some("2024-01-01".into()),
            fields: Some("rent_value,color".into()),
            limit: Some(500),
            ..HistoryQuery::default()
        };
        let err = validate_history_filter(&q, LIMITS).expect_err("invalid");
        let codes: Vec<_> = violations(err).into_iter().map(|e| e.code).collect();
        let expected = ["invalid_range", "invalid_filter", "invalid_limit"];
        assert_eq!(codes, expected);
    }

    #[test]
    fn history_filter_uses_default_limit() {
        let f = validate_history_filter(&HistoryQuery::default(), LIMITS).expect("valid");
        assert_eq!(f.limit, 50);
        assert_eq!(f.offset, 0);
    }

    #[test]
    fn export_params_default_to_json_with_summary() {
        let p = validate_export_params(&ExportQuery::default(), 1000).expect("valid");
        assert_eq!(p.format, ExportFormat::Json);
        assert!(p.include_summary);
        assert_eq!(p.filter.limit, 1000);

        let bad = ExportQuery {
            format: Some("xml".into()),
            ..ExportQuery::default()
        };
        let errs = violations(validate_export_params(&bad, 1000).expect_err("invalid"));
        assert_eq!(errs[0].field, "format");
    }

    #[test]
    fn list_query_validates_enums_and_limit() {
        let limits = PageLimits {
            default: 20,
            max: 100,
        };
        let q = PropertyListQuery {
            status: Some("rented".into()),
            state: Some("rj".into()),
            city: Some("  ".into()),
            ..PropertyListQuery::default()
        };
        let f = validate_list_query(&q, limits).expect("valid");
        assert_eq!(f.status, Some(PropertyStatus::Rented));
        assert_eq!(f.state.as_deref(), Some("RJ"));
        assert_eq!(f.city, None);
        assert_eq!(f.limit, 20);

        let q = PropertyListQuery {
            limit: Some(101),
            ..PropertyListQuery::default()
        };
        assert!(validate_list_query(&q, limits).is_err());
    }

    #[test]
    fn actor_rules() {
        assert_eq!(validate_actor(" ana ").as_deref(), Ok("ana"));
        assert!(validate_actor("").is_err());
        assert!(validate_actor(&"a".repeat(MAX_ACTOR_LEN + 1)).is_err());
    }

    #[test]
    fn optional_text_trims_before_checking_length() {
        let padded = format!("  {}  ", "r".repeat(MAX_REASON_LEN));
        let reason = validate_reason(Some(&padded)).expect("fits once trimmed");
        assert_eq!(reason.map(|r| r.len()), Some(MAX_REASON_LEN));
        assert_eq!(validate_reason(Some("   ")).expect("blank"), None);

        let too_long = "r".repeat(MAX_REASON_LEN + 1);
        let errs = violations(validate_reason(Some(&too_long)).expect_err("too long"));
        assert_eq!(errs[0].code, "too_long");
    }

    #[test]
    fn optional_text_rejects_control_characters() {
        let errs = violations(validate_reason(Some("sold\u{7}")).expect_err("bell"));
        assert_eq!(errs[0].code, "control_characters");

        let req = UpdatePropertyRequest {
            description: Some(Some("bright\u{0}room".into())),
            ..UpdatePropertyRequest::default()
        };
        let errs = violations(validate_property_patch(&req).expect_err("nul"));
        assert_eq!(errs[0].field, "description");
    }

    #[test]
    fn codes_are_checked_and_canonicalized() {
        let code = validate_code(" prop-20250101-007 ").expect("valid");
        assert_eq!(code, "PROP-20250101-007");
        let errs = violations(validate_code("PROP-2025-1").expect_err("malformed"));
        assert_eq!(errs[0].code, "invalid_code");
    }
}
