//! Unit tests for idempotency primitives.

use super::*;
use rstest::rstest;
use std::time::Duration;

#[rstest]
#[case("550e8400-e29b-41d4-a716-446655440000")]
#[case("order-42-retry")]
fn idempotency_key_accepts_opaque_tokens(#[case] input: &str) {
    let key = IdempotencyKey::new(input).expect("valid key");
    assert_eq!(key.as_ref(), input);
}

#[test]
fn idempotency_key_rejects_empty_string() {
    let key = IdempotencyKey::new("");
    assert!(matches!(key, Err(IdempotencyKeyValidationError::EmptyKey)));
}

#[rstest]
#[case(" leading")]
#[case("trailing ")]
#[case("line\nbreak")]
fn idempotency_key_rejects_malformed_tokens(#[case] input: &str) {
    let key = IdempotencyKey::new(input);
    assert!(matches!(key, Err(IdempotencyKeyValidationError::InvalidKey)));
}

#[test]
fn idempotency_key_rejects_oversized_tokens() {
    let input = "k".repeat(MAX_IDEMPOTENCY_KEY_LEN + 1);
    assert!(matches!(
        IdempotencyKey::new(input),
        Err(IdempotencyKeyValidationError::InvalidKey)
    ));
}

#[test]
fn idempotency_key_serde_roundtrip() {
    let original = IdempotencyKey::new("abc-123").expect("valid key");
    let json = serde_json::to_string(&original).expect("serialization should succeed");
    let parsed: IdempotencyKey =
        serde_json::from_str(&json).expect("deserialization should succeed");
    assert_eq!(original, parsed);
}

#[rstest]
#[case(0, 60)]
#[case(60, 3_600)]
#[case(1_000_000, 7 * 24 * 3_600)]
fn config_clamps_minutes(#[case] minutes: u64, #[case] expected_secs: u64) {
    let config = IdempotencyConfig::from_minutes(minutes);
    assert_eq!(config.ttl(), Duration::from_secs(expected_secs));
}
