//! Segment catalogue types and the per-user membership snapshot.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;

/// Store-assigned segment identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
#[schema(value_type = i32, example = 3)]
pub struct SegmentId(i32);

impl SegmentId {
    /// Wrap a store-assigned identifier.
    #[must_use]
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    /// Raw integer value as stored.
    #[must_use]
    pub fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation errors returned by [`SegmentSlug::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SegmentSlugValidationError {
    /// The slug was empty after trimming whitespace.
    #[error("segment slug must not be empty")]
    Empty,
}

/// Human-readable unique segment name, for example `AVITO_VOICE_MESSAGES`.
///
/// Surrounding whitespace is trimmed; case is preserved.
///
/// # Examples
/// ```
/// use segments::domain::SegmentSlug;
///
/// let slug = SegmentSlug::new("  AVITO_DISCOUNT_30 ").expect("non-empty slug");
/// assert_eq!(slug.as_ref(), "AVITO_DISCOUNT_30");
/// assert!(SegmentSlug::new("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "AVITO_VOICE_MESSAGES")]
pub struct SegmentSlug(String);

impl SegmentSlug {
    /// Validate and construct a slug.
    pub fn new(value: impl AsRef<str>) -> Result<Self, SegmentSlugValidationError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(SegmentSlugValidationError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for SegmentSlug {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for SegmentSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SegmentSlug {
    type Error = SegmentSlugValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SegmentSlug> for String {
    fn from(value: SegmentSlug) -> Self {
        value.0
    }
}

/// A segment definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Segment {
    pub id: SegmentId,
    pub slug: SegmentSlug,
}

/// Active memberships of one user, ordered by slug.
///
/// This is the value served by the read path and stored in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserSegments {
    pub user_id: UserId,
    pub segments: Vec<Segment>,
}

impl UserSegments {
    /// Build a snapshot, sorting segments by slug so equal membership sets
    /// always compare and serialise identically.
    pub fn new(user_id: UserId, mut segments: Vec<Segment>) -> Self {
        segments.sort_by(|a, b| a.slug.cmp(&b.slug));
        Self { user_id, segments }
    }

    /// Whether the user currently belongs to no segment.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Slugs in snapshot order.
    pub fn slugs(&self) -> impl Iterator<Item = &SegmentSlug> {
        self.segments.iter().map(|segment| &segment.slug)
    }
}
