//! Port for user identifier allocation.
use async_trait::async_trait;

use crate::domain::UserId;

use super::MembershipStoreError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Allocate and persist the identifier after the current maximum,
    /// starting at 1 for an empty store.
    async fn allocate_user(&self) -> Result<UserId, MembershipStoreError>;
}
