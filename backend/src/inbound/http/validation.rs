//! Shared validation helpers for inbound HTTP adapters.
//!
//! Request DTOs deserialise loosely (optional fields, raw integers and
//! strings) so that every shape problem is reported through the same
//! `invalid_request` envelope with a `details.field` and `details.code`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::json;

use crate::domain::{Error, MembershipTtl, SegmentSlug, UserId};

/// Format accepted by the history report's `since` parameter.
pub const HISTORY_SINCE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUserId,
    EmptySlug,
    InvalidTtl,
    InvalidTimestamp,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUserId => "invalid_user_id",
            ErrorCode::EmptySlug => "empty_slug",
            ErrorCode::InvalidTtl => "invalid_ttl",
            ErrorCode::InvalidTimestamp => "invalid_timestamp",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: &'static str,
    message: String,
}

impl ValidationError {
    fn new(field: FieldName, message: impl Into<String>) -> Self {
        Self {
            field: field.as_str(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl serde::Serialize) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value,
            "code": code.as_str(),
        }))
    }

    fn with_index(self, code: ErrorCode, index: usize) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "index": index,
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    ValidationError::new(field, format!("missing required field: {name}"))
        .with_code(ErrorCode::MissingField)
}

/// Require `value`, reporting the field when absent.
pub(crate) fn require<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

/// Validate a raw user identifier.
pub(crate) fn parse_user_id(value: Option<i64>, field: FieldName) -> Result<UserId, Error> {
    let raw = require(value, field)?;
    UserId::new(raw).map_err(|err| {
        ValidationError::new(field, err.to_string()).with_value(ErrorCode::InvalidUserId, raw)
    })
}

/// Validate a raw user identifier taken from a query string.
pub(crate) fn parse_user_id_param(value: Option<&str>, field: FieldName) -> Result<UserId, Error> {
    let raw = require(value, field)?;
    let parsed = raw.trim().parse::<i64>().map_err(|_| {
        ValidationError::new(field, format!("{} must be a positive integer", field.as_str()))
            .with_value(ErrorCode::InvalidUserId, raw)
    })?;
    parse_user_id(Some(parsed), field)
}

/// Validate a required list of segment slugs. Empty lists are allowed.
pub(crate) fn parse_slug_list(
    values: Option<Vec<String>>,
    field: FieldName,
) -> Result<Vec<SegmentSlug>, Error> {
    require(values, field)?
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            SegmentSlug::new(value).map_err(|_| {
                ValidationError::new(
                    field,
                    format!("{} must not contain empty slugs", field.as_str()),
                )
                .with_index(ErrorCode::EmptySlug, index)
            })
        })
        .collect()
}

/// Validate a single slug, e.g. from a path segment or a create body.
pub(crate) fn parse_slug(value: Option<String>, field: FieldName) -> Result<SegmentSlug, Error> {
    let raw = require(value, field)?;
    SegmentSlug::new(&raw).map_err(|_| {
        ValidationError::new(field, format!("{} must not be empty", field.as_str()))
            .with_code(ErrorCode::EmptySlug)
    })
}

/// Validate an optional TTL in whole days. Zero is accepted.
pub(crate) fn parse_ttl_days(
    value: Option<i64>,
    field: FieldName,
) -> Result<Option<MembershipTtl>, Error> {
    value
        .map(|raw| {
            u32::try_from(raw).map(MembershipTtl::days).map_err(|_| {
                ValidationError::new(
                    field,
                    format!("{} must be a non-negative number of days", field.as_str()),
                )
                .with_value(ErrorCode::InvalidTtl, raw)
            })
        })
        .transpose()
}

/// Parse a `YYYY-MM-DD HH:MM` timestamp, interpreted as UTC.
pub(crate) fn parse_history_since(
    value: Option<&str>,
    field: FieldName,
) -> Result<DateTime<Utc>, Error> {
    let raw = require(value, field)?;
    NaiveDateTime::parse_from_str(raw.trim(), HISTORY_SINCE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| {
            ValidationError::new(
                field,
                format!("{} must use the format YYYY-MM-DD HH:MM", field.as_str()),
            )
            .with_value(ErrorCode::InvalidTimestamp, raw)
        })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::rstest;

    use super::*;

    const USER_ID: FieldName = FieldName::new("user_id");
    const ADD: FieldName = FieldName::new("add");
    const TTL: FieldName = FieldName::new("ttl_days");
    const SINCE: FieldName = FieldName::new("since");

    fn detail_field(err: &Error) -> Option<&str> {
        err.details()
            .and_then(|details| details.get("field"))
            .and_then(serde_json::Value::as_str)
    }

    #[rstest]
    #[case(None, "missing_field")]
    #[case(Some(0), "invalid_user_id")]
    #[case(Some(-4), "invalid_user_id")]
    #[case(Some(i64::from(i32::MAX) + 1), "invalid_user_id")]
    fn bad_user_ids_name_the_field(#[case] raw: Option<i64>, #[case] code: &str) {
        let err = parse_user_id(raw, USER_ID).expect_err("rejected");
        assert_eq!(err.detail_code(), Some(code));
        assert_eq!(detail_field(&err), Some("user_id"));
    }

    #[rstest]
    #[case("7", Ok(7))]
    #[case(" 7 ", Ok(7))]
    #[case("seven", Err("invalid_user_id"))]
    #[case("0", Err("invalid_user_id"))]
    fn query_user_ids(#[case] raw: &str, #[case] expected: Result<i32, &str>) {
        let parsed = parse_user_id_param(Some(raw), USER_ID);
        match expected {
            Ok(id) => assert_eq!(parsed.expect("valid").get(), id),
            Err(code) => assert_eq!(parsed.expect_err("invalid").detail_code(), Some(code)),
        }
    }

    #[rstest]
    fn slug_lists_may_be_empty_but_not_missing() {
        assert!(parse_slug_list(Some(Vec::new()), ADD).expect("empty ok").is_empty());
        let err = parse_slug_list(None, ADD).expect_err("missing");
        assert_eq!(err.detail_code(), Some("missing_field"));
    }

    #[rstest]
    fn blank_slug_reports_its_index() {
        let err = parse_slug_list(Some(vec!["A".into(), "  ".into()]), ADD).expect_err("blank");
        assert_eq!(err.detail_code(), Some("empty_slug"));
        assert_eq!(err.details().and_then(|d| d.get("index")), Some(&json!(1)));
    }

    #[rstest]
    #[case(None, Ok(None))]
    #[case(Some(0), Ok(Some(MembershipTtl::days(0))))]
    #[case(Some(30), Ok(Some(MembershipTtl::days(30))))]
    #[case(Some(-1), Err(()))]
    fn ttl_days(#[case] raw: Option<i64>, #[case] expected: Result<Option<MembershipTtl>, ()>) {
        assert_eq!(parse_ttl_days(raw, TTL).map_err(|_| ()), expected);
    }

    #[rstest]
    fn since_is_parsed_as_utc() {
        let since = parse_history_since(Some("2024-03-01 13:45"), SINCE).expect("valid");
        assert_eq!(
            since,
            Utc.with_ymd_and_hms(2024, 3, 1, 13, 45, 0).single().expect("valid date")
        );
    }

    #[rstest]
    #[case("2024-03-01")]
    #[case("2024-03-01T13:45:00Z")]
    #[case("yesterday")]
    fn malformed_since_is_rejected(#[case] raw: &str) {
        let err = parse_history_since(Some(raw), SINCE).expect_err("malformed");
        assert_eq!(err.detail_code(), Some("invalid_timestamp"));
    }
}
