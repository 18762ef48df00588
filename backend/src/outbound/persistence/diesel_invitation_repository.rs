//! PostgreSQL-backed [`InvitationRepository`].
//!
//! Redemption is a `DELETE ... RETURNING` followed by the user's
//! `UPDATE ... SET is_active` inside one transaction, so two concurrent
//! activations of the same token cannot both succeed and a failure cannot
//! spend the token without activating the account.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{InvitationLookup, InvitationPersistenceError, InvitationRepository};
use crate::domain::{InvitationDigest, NewInvitation, UserId};

use super::diesel_error_mapping::{StoreFailure, convert_row, map_store_error};
use super::models::{InvitationRow, NewInvitationRow, UserRow};
use super::pool::DbPool;
use super::schema::{user_invitations, users};

/// Diesel implementation of the invitation port.
#[derive(Clone)]
pub struct DieselInvitationRepository {
    pool: DbPool,
}

impl DieselInvitationRepository {
    /// Build the repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

enum Consumed {
    Live(UserRow),
    Expired,
    Missing,
}

#[async_trait]
impl InvitationRepository for DieselInvitationRepository {
    async fn create(
        &self,
        user: UserId,
        invitation: &NewInvitation,
    ) -> Result<(), InvitationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(StoreFailure::from)?;
        let row = NewInvitationRow {
            token_digest: invitation.digest.as_str(),
            user_id: user.get(),
            expires_at: invitation.expires_at,
        };
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                diesel::delete(
                    user_invitations::table.filter(user_invitations::user_id.eq(row.user_id)),
                )
                .execute(conn)
                .await?;
                diesel::insert_into(user_invitations::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_store_error)
    }

    async fn redeem(
        &self,
        digest: &InvitationDigest,
        now: DateTime<Utc>,
    ) -> Result<InvitationLookup, InvitationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(StoreFailure::from)?;
        let digest_hex = digest.as_str();

        let outcome = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    let deleted: Option<InvitationRow> = diesel::delete(
                        user_invitations::table.filter(user_invitations::token_digest.eq(digest_hex)),
                    )
                    .returning(InvitationRow::as_returning())
                    .get_result(conn)
                    .await
                    .optional()?;

                    let purged = diesel::delete(
                        user_invitations::table.filter(user_invitations::expires_at.le(now)),
                    )
                    .execute(conn)
                    .await?;
                    if purged > 0 {
                        debug!(purged, "expired invitations purged");
                    }

                    let Some(entry) = deleted else {
                        return Ok(Consumed::Missing);
                    };
                    if entry.expires_at <= now {
                        return Ok(Consumed::Expired);
                    }
                    let user = diesel::update(users::table.find(entry.user_id))
                        .set(users::is_active.eq(true))
                        .returning(UserRow::as_returning())
                        .get_result(conn)
                        .await
                        .optional()?;
                    Ok(user.map_or(Consumed::Missing, Consumed::Live))
                }
                .scope_boxed()
            })
            .await
            .map_err(StoreFailure::from)?;

        match outcome {
            Consumed::Live(row) => convert_row(row).map(InvitationLookup::Consumed),
            Consumed::Expired => Ok(InvitationLookup::Expired),
            Consumed::Missing => Ok(InvitationLookup::Missing),
        }
    }
}
