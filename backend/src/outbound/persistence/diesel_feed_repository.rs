//! PostgreSQL-backed [`FeedRepository`].
//!
//! The feed is a single hand-written statement: every optional predicate is
//! present and disabled by a `NULL` (or empty array) bind, so the SQL text
//! only varies by sort direction.

use async_trait::async_trait;
use diesel::sql_types::{Array, BigInt, Nullable, Text, Timestamptz};
use diesel_async::RunQueryDsl;

use crate::domain::ports::{FeedPersistenceError, FeedRepository};
use crate::domain::{FeedEntry, FeedQuery, UserId};

use super::diesel_error_mapping::{StoreFailure, convert_rows};
use super::models::FeedRow;
use super::pool::DbPool;

/// Diesel implementation of the feed port.
#[derive(Clone)]
pub struct DieselFeedRepository {
    pool: DbPool,
}

impl DieselFeedRepository {
    /// Build the repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn feed_sql(direction: &str) -> String {
    format!(
        r"SELECT p.id, p.user_id, p.title, p.content, p.tags, p.created_at, p.updated_at,
       u.username,
       (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count,
       (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id) AS like_count
FROM posts p
JOIN users u ON u.id = p.user_id
WHERE (p.user_id = $1
       OR p.user_id IN (SELECT f.followed_id FROM followers f WHERE f.follower_id = $1))
  AND ($2::text IS NULL OR p.title ILIKE $2 ESCAPE '\' OR p.content ILIKE $2 ESCAPE '\')
  AND (cardinality($3::text[]) = 0 OR p.tags && $3::text[])
  AND ($4::timestamptz IS NULL OR p.created_at >= $4)
  AND ($5::timestamptz IS NULL OR p.created_at <= $5)
ORDER BY p.created_at {direction}, p.id {direction}
LIMIT $6 OFFSET $7"
    )
}

/// Turn a search term into an `ILIKE` substring pattern, escaping the
/// wildcard characters it may contain.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl FeedRepository for DieselFeedRepository {
    async fn query_feed(
        &self,
        viewer: UserId,
        query: &FeedQuery,
    ) -> Result<Vec<FeedEntry>, FeedPersistenceError> {
        let offset = i64::try_from(query.offset())
            .map_err(|_| FeedPersistenceError::query("feed offset out of range"))?;
        let mut conn = self.pool.get().await.map_err(StoreFailure::from)?;

        let rows: Vec<FeedRow> = diesel::sql_query(feed_sql(query.sort().as_sql()))
            .bind::<BigInt, _>(viewer.get())
            .bind::<Nullable<Text>, _>(query.search().map(like_pattern))
            .bind::<Array<Text>, _>(query.tags())
            .bind::<Nullable<Timestamptz>, _>(query.since())
            .bind::<Nullable<Timestamptz>, _>(query.until())
            .bind::<BigInt, _>(i64::from(query.limit()))
            .bind::<BigInt, _>(offset)
            .load(&mut conn)
            .await
            .map_err(StoreFailure::from)?;
        convert_rows(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("rust", "%rust%")]
    #[case("50%_off", r"%50\%\_off%")]
    #[case(r"back\slash", r"%back\\slash%")]
    fn search_terms_are_escaped(#[case] term: &str, #[case] expected: &str) {
        assert_eq!(like_pattern(term), expected);
    }

    #[rstest]
    #[case("ASC")]
    #[case("DESC")]
    fn sort_direction_applies_to_both_keys(#[case] direction: &str) {
        let sql = feed_sql(direction);
        assert!(sql.contains(&format!("p.created_at {direction}, p.id {direction}")));
    }
}
