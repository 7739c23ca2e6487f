//! Helpers for parsing idempotency headers in HTTP handlers.
//!
//! Parsing only validates the header's shape. Whether a key is required, and
//! whether it was already used, is decided by the domain
//! [`IdempotencyGuard`](crate::domain::IdempotencyGuard).

use actix_web::http::header::HeaderMap;
use serde_json::json;

use crate::domain::{Error, IdempotencyKey, IdempotencyKeyValidationError};

/// HTTP header name for idempotency keys.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Extract the idempotency key from request headers.
///
/// A missing header is `Ok(None)`; a present but unusable one is an error.
pub fn extract_idempotency_key(
    headers: &HeaderMap,
) -> Result<Option<IdempotencyKey>, IdempotencyKeyValidationError> {
    let Some(header_value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };

    let key_str = header_value
        .to_str()
        .map_err(|_| IdempotencyKeyValidationError::InvalidKey)?;

    IdempotencyKey::new(key_str).map(Some)
}

/// Map idempotency key validation errors to domain errors.
pub fn map_idempotency_key_error(err: IdempotencyKeyValidationError) -> Error {
    let message = match err {
        IdempotencyKeyValidationError::EmptyKey => "Idempotency-Key header must not be empty",
        IdempotencyKeyValidationError::InvalidKey => {
            "Idempotency-Key header must be printable text without surrounding whitespace"
        }
    };
    Error::invalid_request(message).with_details(json!({
        "field": IDEMPOTENCY_KEY_HEADER,
        "code": "invalid_idempotency_key",
    }))
}

/// Extract and validate the key in one step, for handlers.
pub fn idempotency_key_from(headers: &HeaderMap) -> Result<Option<IdempotencyKey>, Error> {
    extract_idempotency_key(headers).map_err(map_idempotency_key_error)
}

#[cfg(test)]
mod tests {
    use actix_web::http::header::{HeaderName, HeaderValue};
    use rstest::rstest;

    use super::*;
    use crate::domain::ErrorCode;

    fn headers_with(value: &'static [u8]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("idempotency-key"),
            HeaderValue::from_bytes(value).expect("header bytes"),
        );
        headers
    }

    #[rstest]
    fn absent_header_is_none() {
        assert_eq!(extract_idempotency_key(&HeaderMap::new()), Ok(None));
    }

    #[rstest]
    fn header_name_is_case_insensitive() {
        let key = extract_idempotency_key(&headers_with(b"abc-123"))
            .expect("valid")
            .expect("present");
        assert_eq!(key.as_ref(), "abc-123");
    }

    #[rstest]
    #[case(b"", IdempotencyKeyValidationError::EmptyKey)]
    #[case(b"\xff\xfe", IdempotencyKeyValidationError::InvalidKey)]
    fn unusable_headers_are_rejected(
        #[case] raw: &'static [u8],
        #[case] expected: IdempotencyKeyValidationError,
    ) {
        assert_eq!(extract_idempotency_key(&headers_with(raw)), Err(expected));
    }

    #[rstest]
    fn validation_errors_become_bad_requests() {
        let err = idempotency_key_from(&headers_with(b"")).expect_err("empty key");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err.detail_code(), Some("invalid_idempotency_key"));
    }
}
