//! Driving port for managing the segment catalogue.

use async_trait::async_trait;

use crate::domain::{Error, Segment, SegmentSlug};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SegmentCommand: Send + Sync {
    /// Create a segment. Conflicts (`duplicate_segment`) when the slug is
    /// taken.
    async fn create_segment(&self, slug: SegmentSlug) -> Result<Segment, Error>;

    /// Delete a segment. Not found when unknown; conflicts
    /// (`segment_in_use`) while any user still belongs to it.
    async fn delete_segment(&self, slug: SegmentSlug) -> Result<(), Error>;
}
