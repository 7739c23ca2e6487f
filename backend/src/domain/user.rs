//! User identity.
//!
//! Users carry no attributes beyond their numeric identifier. Membership
//! mutations accept any positive id without checking that the user was
//! allocated first.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Validation errors returned by [`UserId::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UserIdValidationError {
    /// Identifiers start at one.
    #[error("user id must be a positive integer, got {0}")]
    NotPositive(i64),
    /// The value does not fit the store's integer column.
    #[error("user id {0} is out of range")]
    OutOfRange(i64),
}

/// Positive numeric user identifier.
///
/// # Examples
/// ```
/// use segments::domain::UserId;
///
/// let id = UserId::new(42).expect("positive id");
/// assert_eq!(id.get(), 42);
/// assert!(UserId::new(0).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(try_from = "i64", into = "i32")]
#[schema(value_type = i32, example = 1000)]
pub struct UserId(i32);

impl UserId {
    /// Validate and construct a [`UserId`].
    pub fn new(value: i64) -> Result<Self, UserIdValidationError> {
        if value <= 0 {
            return Err(UserIdValidationError::NotPositive(value));
        }
        i32::try_from(value)
            .map(Self)
            .map_err(|_| UserIdValidationError::OutOfRange(value))
    }

    /// Raw integer value as stored.
    #[must_use]
    pub fn get(self) -> i32 {
        self.0
    }

    /// The identifier following this one, used by max-plus-one allocation.
    pub fn next(self) -> Result<Self, UserIdValidationError> {
        Self::new(i64::from(self.0) + 1)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for UserId {
    type Error = UserIdValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for i32 {
    fn from(value: UserId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0)]
    #[case(-5)]
    fn rejects_non_positive(#[case] raw: i64) {
        assert_eq!(
            UserId::new(raw),
            Err(UserIdValidationError::NotPositive(raw))
        );
    }

    #[rstest]
    fn rejects_values_beyond_store_range() {
        let raw = i64::from(i32::MAX) + 1;
        assert_eq!(UserId::new(raw), Err(UserIdValidationError::OutOfRange(raw)));
    }

    #[rstest]
    fn next_increments() {
        let id = UserId::new(1000).expect("valid id");
        assert_eq!(id.next().expect("room to grow").get(), 1001);
    }

    #[rstest]
    fn deserialising_validates() {
        let ok: UserId = serde_json::from_str("7").expect("valid id");
        assert_eq!(ok.get(), 7);
        assert!(serde_json::from_str::<UserId>("0").is_err());
    }
}
