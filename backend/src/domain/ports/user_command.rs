//! Driving port for user allocation.

use async_trait::async_trait;

use crate::domain::{Error, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserCommand: Send + Sync {
    /// Allocate a fresh user identifier.
    async fn create_user(&self) -> Result<UserId, Error>;
}
