//! PostgreSQL-backed [`FollowRepository`].
//!
//! The composite primary key rejects duplicate edges and the foreign keys
//! reject unknown users; both surface through constraint names.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::FollowEdge;
use crate::domain::ports::{FollowPersistenceError, FollowRepository};

use super::diesel_error_mapping::{StoreFailure, map_store_error};
use super::models::NewFollowRow;
use super::pool::DbPool;
use super::schema::followers;

/// Diesel implementation of the follow port.
#[derive(Clone)]
pub struct DieselFollowRepository {
    pool: DbPool,
}

impl DieselFollowRepository {
    /// Build the repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FollowRepository for DieselFollowRepository {
    async fn insert(&self, edge: FollowEdge) -> Result<(), FollowPersistenceError> {
        let mut conn = self.pool.get().await.map_err(StoreFailure::from)?;
        diesel::insert_into(followers::table)
            .values(&NewFollowRow {
                follower_id: edge.follower().get(),
                followed_id: edge.followed().get(),
            })
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_store_error)
    }

    async fn remove(&self, edge: FollowEdge) -> Result<bool, FollowPersistenceError> {
        let mut conn = self.pool.get().await.map_err(StoreFailure::from)?;
        let removed = diesel::delete(followers::table.find((
            edge.follower().get(),
            edge.followed().get(),
        )))
        .execute(&mut conn)
        .await
        .map_err(StoreFailure::from)?;
        Ok(removed > 0)
    }
}
