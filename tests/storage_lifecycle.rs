//! Integration tests for the store: users own feeds, feeds own posts, and
//! reset wipes everything through the cascade.

use blogaggr::storage::{Database, NewPost};

async fn test_db() -> Database {
    Database::open(":memory:").await.unwrap()
}

fn new_post(feed_id: i64, url: &str) -> NewPost {
    NewPost {
        feed_id,
        title: "Title".to_string(),
        url: url.to_string(),
        description: None,
        published_at: Some(1_700_000_000),
    }
}

#[tokio::test]
async fn test_listing_joins_owner_name() {
    let db = test_db().await;
    let alice = db.insert_user("alice").await.unwrap();
    let bob = db.insert_user("bob").await.unwrap();
    db.insert_feed("Zeta", "https://z.example.com/rss", alice.id)
        .await
        .unwrap();
    db.insert_feed("Alpha", "https://a.example.com/rss", bob.id)
        .await
        .unwrap();

    let feeds = db.get_feeds().await.unwrap();
    let summary: Vec<(&str, &str)> = feeds
        .iter()
        .map(|f| (f.name.as_str(), f.user_name.as_str()))
        .collect();
    assert_eq!(summary, vec![("Alpha", "bob"), ("Zeta", "alice")]);
    assert!(feeds.iter().all(|f| f.last_fetched_at.is_none()));
}

#[tokio::test]
async fn test_reset_cascades_to_feeds_and_posts() {
    let db = test_db().await;
    let user = db.insert_user("alice").await.unwrap();
    let feed = db
        .insert_feed("Blog", "https://blog.example.com/rss", user.id)
        .await
        .unwrap();
    db.create_post(&new_post(feed.id, "https://blog.example.com/1"))
        .await
        .unwrap();

    assert_eq!(db.delete_all_users().await.unwrap(), 1);
    assert!(db.get_feeds().await.unwrap().is_empty());
    assert_eq!(db.count_posts().await.unwrap(), 0);
    assert!(db.claim_next_feed(1_700_000_000).await.unwrap().is_none());
}

#[tokio::test]
async fn test_claims_rotate_through_every_feed() {
    let db = test_db().await;
    let user = db.insert_user("alice").await.unwrap();
    let mut ids = Vec::new();
    for i in 0..3 {
        let feed = db
            .insert_feed(
                &format!("Feed {}", i),
                &format!("https://{}.example.com/rss", i),
                user.id,
            )
            .await
            .unwrap();
        ids.push(feed.id);
    }

    let mut claimed = Vec::new();
    for tick in 0..6 {
        let feed = db.claim_next_feed(1_000 + tick).await.unwrap().unwrap();
        claimed.push(feed.id);
    }

    let expected: Vec<i64> = ids.iter().chain(ids.iter()).copied().collect();
    assert_eq!(claimed, expected);
}

#[tokio::test]
async fn test_post_url_is_unique_across_feeds() {
    let db = test_db().await;
    let user = db.insert_user("alice").await.unwrap();
    let a = db
        .insert_feed("A", "https://a.example.com/rss", user.id)
        .await
        .unwrap();
    let b = db
        .insert_feed("B", "https://b.example.com/rss", user.id)
        .await
        .unwrap();

    db.create_post(&new_post(a.id, "https://shared.example.com/post"))
        .await
        .unwrap();
    let err = db
        .create_post(&new_post(b.id, "https://shared.example.com/post"))
        .await
        .unwrap_err();
    assert!(err.is_duplicate());
    assert_eq!(db.count_posts().await.unwrap(), 1);
}
