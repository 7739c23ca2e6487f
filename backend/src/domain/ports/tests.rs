use super::*;
use rstest::rstest;

#[rstest]
#[case(
    MembershipStoreError::connection("pool exhausted"),
    "membership store connection failed: pool exhausted"
)]
#[case(
    MembershipStoreError::query("deadlock detected"),
    "membership store query failed: deadlock detected"
)]
#[case(
    MembershipStoreError::duplicate("user 7 in PREMIUM"),
    "membership already exists: user 7 in PREMIUM"
)]
fn membership_store_errors_render_their_context(
    #[case] err: MembershipStoreError,
    #[case] expected: &str,
) {
    assert_eq!(err.to_string(), expected);
}

#[rstest]
#[case(
    SegmentRepositoryError::duplicate_slug("TRIAL"),
    "segment TRIAL already exists"
)]
#[case(
    SegmentRepositoryError::not_found("TRIAL"),
    "segment TRIAL does not exist"
)]
#[case(
    SegmentRepositoryError::in_use("TRIAL"),
    "segment TRIAL still has members"
)]
#[case(
    SegmentRepositoryError::query("relation missing"),
    "segment store query failed: relation missing"
)]
fn segment_repository_errors_name_the_slug(
    #[case] err: SegmentRepositoryError,
    #[case] expected: &str,
) {
    assert_eq!(err.to_string(), expected);
}

#[rstest]
fn cache_and_idempotency_errors_keep_their_message() {
    assert_eq!(
        SegmentCacheError::backend("redis down").to_string(),
        "segment cache backend failure: redis down"
    );
    assert_eq!(
        SegmentCacheError::serialization(String::from("eof")).to_string(),
        "segment cache serialisation failed: eof"
    );
    assert_eq!(
        IdempotencyStoreError::connection("refused").to_string(),
        "idempotency store connection failed: refused"
    );
    assert_eq!(
        IdempotencyStoreError::query("timeout"),
        IdempotencyStoreError::Query {
            message: "timeout".to_owned(),
        }
    );
}
