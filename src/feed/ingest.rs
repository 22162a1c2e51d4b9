use crate::feed::parser::{FeedItem, FetchedDocument};
use crate::storage::{Feed, FeedStore, NewPost};

/// Per-batch tally of an ingestion run.
///
/// `attempted` is always the document's item count; the other three add up
/// to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub attempted: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub failed: usize,
}

/// Map a fetched item onto the post that would be stored for `feed_id`.
///
/// An unparseable publish date becomes `None`; it is never replaced by the
/// current time.
pub fn to_new_post(feed_id: i64, item: &FeedItem) -> NewPost {
    NewPost {
        feed_id,
        title: item.title.clone(),
        url: item.link.clone(),
        description: Some(item.description.clone()),
        published_at: item.published_at(),
    }
}

/// Persist every item of `document` as a post of `feed`, in source order.
///
/// Each insert stands alone (no batch transaction). A URL that already
/// exists is counted as a duplicate and skipped quietly; any other store
/// error is logged and skipped so the rest of the batch still runs.
pub async fn ingest<S: FeedStore>(
    store: &S,
    feed: &Feed,
    document: &FetchedDocument,
) -> IngestReport {
    let mut report = IngestReport {
        attempted: document.items.len(),
        ..IngestReport::default()
    };

    for item in &document.items {
        let post = to_new_post(feed.id, item);

        match store.create_post(&post).await {
            Ok(_) => report.inserted += 1,
            Err(e) if e.is_duplicate() => {
                tracing::debug!(
                    feed_id = feed.id,
                    url = %post.url,
                    "Post already ingested, skipping"
                );
                report.duplicates += 1;
            }
            Err(e) => {
                tracing::warn!(
                    feed_id = feed.id,
                    url = %post.url,
                    error = %e,
                    "Couldn't create post"
                );
                report.failed += 1;
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Database, DatabaseError, Post};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn item(link: &str, pub_date: Option<&str>) -> FeedItem {
        FeedItem {
            title: format!("Title {}", link),
            link: link.to_string(),
            description: "Body".to_string(),
            pub_date: pub_date.map(str::to_string),
        }
    }

    async fn setup() -> (Database, Feed) {
        let db = Database::open(":memory:").await.unwrap();
        let user = db.insert_user("tester").await.unwrap();
        let feed = db
            .insert_feed("Feed", "https://example.com/rss", user.id)
            .await
            .unwrap();
        (db, feed)
    }

    #[tokio::test]
    async fn test_ingest_inserts_all_new_items() {
        let (db, feed) = setup().await;
        let doc = FetchedDocument {
            title: "Feed".into(),
            items: vec![
                item("http://x/1", Some("Mon, 02 Jan 2006 15:04:05 -0700")),
                item("http://x/2", None),
            ],
        };

        let report = ingest(&db, &feed, &doc).await;
        assert_eq!(
            report,
            IngestReport {
                attempted: 2,
                inserted: 2,
                duplicates: 0,
                failed: 0
            }
        );

        let posts = db.get_posts_for_feed(feed.id).await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].url, "http://x/1");
        assert_eq!(posts[0].published_at, Some(1_136_239_445));
        assert_eq!(posts[0].description.as_deref(), Some("Body"));
    }

    #[tokio::test]
    async fn test_ingest_twice_is_idempotent() {
        let (db, feed) = setup().await;
        let doc = FetchedDocument {
            title: String::new(),
            items: vec![item("http://x/1", None), item("http://x/2", None)],
        };

        ingest(&db, &feed, &doc).await;
        let before: Vec<Post> = db.get_posts_for_feed(feed.id).await.unwrap();

        let second = ingest(&db, &feed, &doc).await;
        assert_eq!(second.attempted, 2);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.duplicates, 2);
        assert_eq!(second.failed, 0);

        let after = db.get_posts_for_feed(feed.id).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_duplicate_link_within_document() {
        let (db, feed) = setup().await;
        let doc = FetchedDocument {
            title: String::new(),
            items: vec![item("http://x/1", None), item("http://x/1", None)],
        };

        let first = ingest(&db, &feed, &doc).await;
        assert_eq!(first.inserted, 1);
        assert_eq!(first.duplicates, 1);
        assert_eq!(first.failed, 0);

        let second = ingest(&db, &feed, &doc).await;
        assert_eq!(second.inserted, 0);
        assert_eq!(second.duplicates, 2);
        assert_eq!(second.failed, 0);
        assert_eq!(db.count_posts().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_bad_date_still_creates_post_without_timestamp() {
        let (db, feed) = setup().await;
        let doc = FetchedDocument {
            title: String::new(),
            items: vec![
                item("http://x/1", Some("Mon, 02 Jan 2006 15:04:05 -0700")),
                item("http://x/2", Some("not a date")),
                item("http://x/3", Some("Tue, 03 Jan 2006 15:04:05 +0000")),
            ],
        };

        let report = ingest(&db, &feed, &doc).await;
        assert_eq!(report.attempted, 3);
        assert_eq!(report.inserted, 3);

        let posts = db.get_posts_for_feed(feed.id).await.unwrap();
        let bad = posts.iter().find(|p| p.url == "http://x/2").unwrap();
        assert_eq!(bad.published_at, None);
        assert!(posts
            .iter()
            .filter(|p| p.url != "http://x/2")
            .all(|p| p.published_at.is_some()));
    }

    /// Store that fails every other insert with a non-duplicate error.
    struct FlakyStore {
        inner: Database,
        calls: AtomicUsize,
    }

    impl FeedStore for FlakyStore {
        async fn claim_next_feed(&self, now: i64) -> Result<Option<Feed>, DatabaseError> {
            self.inner.claim_next_feed(now).await
        }

        async fn create_post(&self, post: &NewPost) -> Result<Post, DatabaseError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) % 2 == 1 {
                return Err(DatabaseError::Other(sqlx::Error::PoolTimedOut));
            }
            self.inner.create_post(post).await
        }
    }

    #[tokio::test]
    async fn test_other_errors_do_not_abort_batch() {
        let (db, feed) = setup().await;
        let store = FlakyStore {
            inner: db.clone(),
            calls: AtomicUsize::new(0),
        };
        let doc = FetchedDocument {
            title: String::new(),
            items: (1..=4)
                .map(|i| item(&format!("http://x/{}", i), None))
                .collect(),
        };

        let report = ingest(&store, &feed, &doc).await;
        assert_eq!(
            report,
            IngestReport {
                attempted: 4,
                inserted: 2,
                duplicates: 0,
                failed: 2
            }
        );
        assert_eq!(store.calls.load(Ordering::SeqCst), 4);

        // The skipped items go in on the next pass
        let retry = ingest(&db, &feed, &doc).await;
        assert_eq!(retry.inserted, 2);
        assert_eq!(retry.duplicates, 2);
        assert_eq!(db.count_posts().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_empty_document() {
        let (db, feed) = setup().await;
        let report = ingest(&db, &feed, &FetchedDocument::default()).await;
        assert_eq!(report, IngestReport::default());
    }
}
