use super::schema::Database;
use super::types::{DatabaseError, NewPost, Post};

/// Maximum number of posts to return from any single query
const MAX_POSTS: i64 = 2000;

impl Database {
    // ========================================================================
    // Post Operations
    // ========================================================================

    /// Insert a single post.
    ///
    /// Each call is its own statement; there is no batch transaction, so a
    /// failure leaves previously inserted posts in place. A post whose URL
    /// already exists yields [`DatabaseError::Duplicate`].
    pub async fn create_post(&self, post: &NewPost) -> Result<Post, DatabaseError> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (feed_id, title, url, description, published_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, feed_id, title, url, description, published_at, created_at, updated_at
        "#,
        )
        .bind(post.feed_id)
        .bind(&post.title)
        .bind(&post.url)
        .bind(&post.description)
        .bind(post.published_at)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_write)
    }

    /// Posts for a feed, newest publication first (undated posts last).
    pub async fn get_posts_for_feed(&self, feed_id: i64) -> Result<Vec<Post>, DatabaseError> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, feed_id, title, url, description, published_at, created_at, updated_at
            FROM posts
            WHERE feed_id = ?
            ORDER BY published_at IS NULL, published_at DESC, id
            LIMIT ?
        "#,
        )
        .bind(feed_id)
        .bind(MAX_POSTS)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    /// Total number of stored posts
    pub async fn count_posts(&self) -> Result<i64, DatabaseError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }
}
