//! PostgreSQL user identifier allocation.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};

use crate::domain::UserId;
use crate::domain::ports::{MembershipStoreError, UserRepository};

use super::diesel_membership_repository::user_id_from_row;
use super::error_mapping::{TxFailure, map_store_diesel_error, map_store_pool_error};
use super::models::NewUserRow;
use super::pool::DbPool;
use super::schema::users;

/// Diesel-backed implementation of [`UserRepository`].
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    /// Serialises allocators with a table lock so two requests never read
    /// the same maximum.
    async fn allocate_user(&self) -> Result<UserId, MembershipStoreError> {
        let mut conn = self.pool.get().await.map_err(map_store_pool_error)?;
        let result: Result<UserId, TxFailure<MembershipStoreError>> = conn
            .transaction(|conn| {
                async move {
                    diesel::sql_query("LOCK TABLE users IN EXCLUSIVE MODE")
                        .execute(conn)
                        .await?;
                    let current: Option<i32> = users::table
                        .select(diesel::dsl::max(users::user_id))
                        .get_result(conn)
                        .await?;
                    let next = match current {
                        Some(raw) => user_id_from_row(raw)
                            .and_then(|id| {
                                id.next().map_err(|err| MembershipStoreError::query(err.to_string()))
                            })
                            .map_err(TxFailure::Domain)?,
                        None => UserId::new(1)
                            .map_err(|err| TxFailure::Domain(MembershipStoreError::query(err.to_string())))?,
                    };
                    diesel::insert_into(users::table)
                        .values(NewUserRow {
                            user_id: next.get(),
                        })
                        .execute(conn)
                        .await?;
                    Ok(next)
                }
                .scope_boxed()
            })
            .await;
        result.map_err(|failure| failure.resolve(map_store_diesel_error))
    }
}
