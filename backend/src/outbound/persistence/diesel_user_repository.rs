//! PostgreSQL-backed [`UserRepository`].

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{Email, NewInvitation, NewUser, User, UserId};

use super::diesel_error_mapping::{StoreFailure, convert_row};
use super::models::{NewInvitationRow, NewUserRow, UserRow};
use super::pool::DbPool;
use super::schema::{user_invitations, users};

/// Diesel implementation of the user port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Build the repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create_with_invitation(
        &self,
        user: &NewUser,
        invitation: &NewInvitation,
    ) -> Result<User, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(StoreFailure::from)?;
        let new_user = NewUserRow {
            username: user.username.as_ref(),
            email: user.email.as_ref(),
            password_hash: user.password_hash.as_str(),
            is_active: false,
        };
        let digest = invitation.digest.as_str();
        let expires_at = invitation.expires_at;

        let row = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    let row: UserRow = diesel::insert_into(users::table)
                        .values(&new_user)
                        .returning(UserRow::as_returning())
                        .get_result(conn)
                        .await?;
                    diesel::insert_into(user_invitations::table)
                        .values(&NewInvitationRow {
                            token_digest: digest,
                            user_id: row.id,
                            expires_at,
                        })
                        .execute(conn)
                        .await?;
                    Ok(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(StoreFailure::from)?;
        convert_row(row)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(StoreFailure::from)?;
        let row = users::table
            .find(id.get())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(StoreFailure::from)?;
        row.map(convert_row).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(StoreFailure::from)?;
        let row = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(StoreFailure::from)?;
        row.map(convert_row).transpose()
    }

    async fn delete(&self, id: UserId) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(StoreFailure::from)?;
        let removed = diesel::delete(users::table.find(id.get()))
            .execute(&mut conn)
            .await
            .map_err(StoreFailure::from)?;
        Ok(removed > 0)
    }
}
