//! Driving port for reading a user's memberships.

use async_trait::async_trait;

use crate::domain::{Error, UserId, UserSegments};

/// Domain use-case port for the membership read path.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipQuery: Send + Sync {
    /// Active memberships of `user_id`, or `None` when the user has none.
    ///
    /// Unknown users and users without memberships are indistinguishable.
    async fn user_segments(&self, user_id: UserId) -> Result<Option<UserSegments>, Error>;
}
