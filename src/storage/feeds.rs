use super::schema::Database;
use super::types::{DatabaseError, Feed, FeedDbRow, FeedListing};

/// Columns returned by every feed query, in `FeedDbRow` order.
const FEED_COLUMNS: &str = "id, name, url, user_id, created_at, updated_at, last_fetched_at";

impl Database {
    // ========================================================================
    // Feed Operations
    // ========================================================================

    /// Add a feed to the global pool, owned by `user_id`.
    ///
    /// The URL is unique across all feeds; a second insert of the same URL
    /// yields [`DatabaseError::Duplicate`].
    pub async fn insert_feed(
        &self,
        name: &str,
        url: &str,
        user_id: i64,
    ) -> Result<Feed, DatabaseError> {
        let now = chrono::Utc::now().timestamp();
        let row: FeedDbRow = sqlx::query_as(&format!(
            "INSERT INTO feeds (name, url, user_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING {FEED_COLUMNS}"
        ))
        .bind(name)
        .bind(url)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_write)?;
        Ok(row.into_feed())
    }

    /// Get a single feed by id
    pub async fn get_feed(&self, feed_id: i64) -> Result<Option<Feed>, DatabaseError> {
        let row: Option<FeedDbRow> =
            sqlx::query_as(&format!("SELECT {FEED_COLUMNS} FROM feeds WHERE id = ?"))
                .bind(feed_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(FeedDbRow::into_feed))
    }

    /// All feeds with the name of the user who registered them, ordered by name.
    pub async fn get_feeds(&self) -> Result<Vec<FeedListing>, DatabaseError> {
        let rows = sqlx::query_as::<_, FeedListing>(
            r#"
                SELECT f.id, f.name, f.url, u.name AS user_name, f.last_fetched_at
                FROM feeds f
                JOIN users u ON u.id = f.user_id
                ORDER BY f.name, f.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ========================================================================
    // Scheduling Operations
    // ========================================================================

    /// The feed the scheduler should fetch next, without claiming it.
    ///
    /// Never-fetched feeds (NULL `last_fetched_at`) come first, then the
    /// oldest fetch time; ties are broken by id. Returns `None` for an
    /// empty pool.
    pub async fn next_feed_to_fetch(&self) -> Result<Option<Feed>, DatabaseError> {
        let row: Option<FeedDbRow> = sqlx::query_as(&format!(
            "SELECT {FEED_COLUMNS} FROM feeds
             ORDER BY last_fetched_at IS NOT NULL, last_fetched_at, id
             LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(FeedDbRow::into_feed))
    }

    /// Stamp a feed as fetched at `now` (Unix seconds).
    pub async fn mark_feed_fetched(&self, feed_id: i64, now: i64) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE feeds SET last_fetched_at = ?, updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(now)
            .bind(feed_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Select the highest-priority feed and stamp it in one statement.
    ///
    /// Equivalent to [`next_feed_to_fetch`](Self::next_feed_to_fetch)
    /// followed by [`mark_feed_fetched`](Self::mark_feed_fetched), but a
    /// competing scheduler on the same file can never observe the feed
    /// between the two steps. The returned feed carries the new stamp.
    pub async fn claim_next_feed(&self, now: i64) -> Result<Option<Feed>, DatabaseError> {
        let row: Option<FeedDbRow> = sqlx::query_as(&format!(
            "UPDATE feeds SET last_fetched_at = ?1, updated_at = ?1
             WHERE id = (
                 SELECT id FROM feeds
                 ORDER BY last_fetched_at IS NOT NULL, last_fetched_at, id
                 LIMIT 1
             )
             RETURNING {FEED_COLUMNS}"
        ))
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(FeedDbRow::into_feed))
    }
}
