//! Port for the segment catalogue.
use async_trait::async_trait;

use crate::domain::{Segment, SegmentSlug};

use super::define_port_error;

define_port_error! {
    /// Errors raised by segment catalogue adapters.
    pub enum SegmentRepositoryError {
        /// Store connection could not be established.
        Connection { message: String } => "segment store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "segment store query failed: {message}",
        /// A segment with this slug already exists.
        DuplicateSlug { slug: String } => "segment {slug} already exists",
        /// No segment has this slug.
        NotFound { slug: String } => "segment {slug} does not exist",
        /// Memberships still reference the segment.
        InUse { slug: String } => "segment {slug} still has members",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SegmentRepository: Send + Sync {
    /// Create a segment, assigning it a new identifier.
    async fn create_segment(&self, slug: &SegmentSlug) -> Result<Segment, SegmentRepositoryError>;

    /// Delete a segment that no membership references.
    async fn delete_segment(&self, slug: &SegmentSlug) -> Result<(), SegmentRepositoryError>;
}
