//! Idempotency key validation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Longest key accepted, in bytes.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

/// Validation errors for [`IdempotencyKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdempotencyKeyValidationError {
    /// The key string was empty.
    EmptyKey,
    /// The key had surrounding whitespace, control characters, or was too
    /// long.
    InvalidKey,
}

impl fmt::Display for IdempotencyKeyValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyKey => write!(f, "idempotency key must not be empty"),
            Self::InvalidKey => write!(
                f,
                "idempotency key must be printable, unpadded text of at most \
                 {MAX_IDEMPOTENCY_KEY_LEN} bytes"
            ),
        }
    }
}

impl std::error::Error for IdempotencyKeyValidationError {}

/// Client-provided idempotency key.
///
/// Clients send this via the `Idempotency-Key` HTTP header. Any opaque token
/// is accepted (UUIDs are typical) as long as it is non-empty, has no
/// surrounding whitespace or control characters, and fits
/// [`MAX_IDEMPOTENCY_KEY_LEN`].
///
/// # Example
///
/// ```
/// # use segments::domain::IdempotencyKey;
/// let key = IdempotencyKey::new("550e8400-e29b-41d4-a716-446655440000").expect("valid key");
/// assert_eq!(key.as_ref(), "550e8400-e29b-41d4-a716-446655440000");
/// assert!(IdempotencyKey::new(" padded").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Validate and construct an [`IdempotencyKey`] from a string.
    ///
    /// # Errors
    ///
    /// Returns [`IdempotencyKeyValidationError::EmptyKey`] if the input is
    /// empty, or [`IdempotencyKeyValidationError::InvalidKey`] if it is
    /// padded, contains control characters, or is too long.
    pub fn new(key: impl AsRef<str>) -> Result<Self, IdempotencyKeyValidationError> {
        Self::from_owned(key.as_ref().to_owned())
    }

    fn from_owned(key: String) -> Result<Self, IdempotencyKeyValidationError> {
        if key.is_empty() {
            return Err(IdempotencyKeyValidationError::EmptyKey);
        }
        if key.trim() != key
            || key.len() > MAX_IDEMPOTENCY_KEY_LEN
            || key.chars().any(char::is_control)
        {
            return Err(IdempotencyKeyValidationError::InvalidKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for IdempotencyKey {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<IdempotencyKey> for String {
    fn from(value: IdempotencyKey) -> Self {
        value.0
    }
}

impl TryFrom<String> for IdempotencyKey {
    type Error = IdempotencyKeyValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}
