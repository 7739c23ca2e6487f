//! Cache key naming the snapshot of one user's memberships.
use thiserror::Error;

use crate::domain::UserId;

const USER_SEGMENTS_PREFIX: &str = "segments:user:";

/// Key under which a [`crate::domain::UserSegments`] snapshot is cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SegmentCacheKey(String);

impl SegmentCacheKey {
    /// Construct a cache key after validating that it is non-empty and trimmed.
    pub fn new(value: impl Into<String>) -> Result<Self, SegmentCacheKeyValidationError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(SegmentCacheKeyValidationError::Empty);
        }
        if raw.trim() != raw {
            return Err(SegmentCacheKeyValidationError::ContainsWhitespace);
        }
        Ok(Self(raw))
    }

    /// Key of the membership snapshot for `user_id`.
    ///
    /// # Examples
    /// ```
    /// use segments::domain::UserId;
    /// use segments::domain::ports::SegmentCacheKey;
    ///
    /// let user = UserId::new(1000).expect("positive id");
    /// assert_eq!(SegmentCacheKey::for_user(user).as_str(), "segments:user:1000");
    /// ```
    #[must_use]
    pub fn for_user(user_id: UserId) -> Self {
        Self(format!("{USER_SEGMENTS_PREFIX}{user_id}"))
    }

    /// Borrow the underlying key as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for SegmentCacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for SegmentCacheKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Validation errors returned when constructing [`SegmentCacheKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentCacheKeyValidationError {
    /// Key is empty after trimming whitespace.
    #[error("segment cache key must not be empty")]
    Empty,
    /// Key contains leading or trailing whitespace.
    #[error("segment cache key must not contain surrounding whitespace")]
    ContainsWhitespace,
}

#[cfg(test)]
mod tests {
    use super::{SegmentCacheKey, SegmentCacheKeyValidationError};
    use crate::domain::UserId;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn cache_key_rejects_blank(#[case] value: &str) {
        let err = SegmentCacheKey::new(value).expect_err("blank keys rejected");
        assert_eq!(err, SegmentCacheKeyValidationError::Empty);
    }

    #[rstest]
    #[case(" leading")]
    #[case("trailing ")]
    fn cache_key_rejects_whitespace_padding(#[case] value: &str) {
        let err = SegmentCacheKey::new(value).expect_err("padded key rejected");
        assert_eq!(err, SegmentCacheKeyValidationError::ContainsWhitespace);
    }

    #[rstest]
    fn cache_key_accepts_clean_input() {
        let key = SegmentCacheKey::new("segments:user:1").expect("valid key");
        assert_eq!(key.as_str(), "segments:user:1");
    }

    #[rstest]
    fn user_keys_match_validated_form() {
        let user = UserId::new(7).expect("valid id");
        let derived = SegmentCacheKey::for_user(user);
        let parsed = SegmentCacheKey::new("segments:user:7").expect("valid key");
        assert_eq!(derived, parsed);
    }
}
