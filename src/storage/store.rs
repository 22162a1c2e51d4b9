use std::future::Future;

use super::schema::Database;
use super::types::{DatabaseError, Feed, NewPost, Post};

/// The slice of the store the scheduler and ingestion engine depend on.
///
/// Each scheduler owns its store value, so tests (or several schedulers)
/// can each run against an isolated pool of feeds.
pub trait FeedStore: Send + Sync {
    /// Atomically select the highest-priority feed and stamp it as fetched
    /// at `now` (Unix seconds). `Ok(None)` means the pool is empty.
    fn claim_next_feed(
        &self,
        now: i64,
    ) -> impl Future<Output = Result<Option<Feed>, DatabaseError>> + Send;

    /// Insert one post. A post whose URL already exists must be reported as
    /// [`DatabaseError::Duplicate`].
    fn create_post(
        &self,
        post: &NewPost,
    ) -> impl Future<Output = Result<Post, DatabaseError>> + Send;
}

impl FeedStore for Database {
    async fn claim_next_feed(&self, now: i64) -> Result<Option<Feed>, DatabaseError> {
        Database::claim_next_feed(self, now).await
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post, DatabaseError> {
        Database::create_post(self, post).await
    }
}
