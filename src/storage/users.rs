use super::schema::Database;
use super::types::{DatabaseError, User};

impl Database {
    // ========================================================================
    // User Operations
    // ========================================================================

    /// Register a user, returning the stored row.
    ///
    /// Names are unique; registering an existing name yields
    /// [`DatabaseError::Duplicate`].
    pub async fn insert_user(&self, name: &str) -> Result<User, DatabaseError> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query_as::<_, User>(
            "INSERT INTO users (name, created_at, updated_at) VALUES (?, ?, ?)
             RETURNING id, name, created_at, updated_at",
        )
        .bind(name)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_write)
    }

    /// Look up a user by name.
    pub async fn get_user(&self, name: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, created_at, updated_at FROM users WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Delete every user. Feeds and posts go with them via ON DELETE CASCADE.
    ///
    /// Returns the number of users removed.
    pub async fn delete_all_users(&self) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM users")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::Database;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get_user() {
        let db = test_db().await;
        let user = db.insert_user("alice").await.unwrap();
        assert!(user.id > 0);
        assert_eq!(user.name, "alice");

        let found = db.get_user("alice").await.unwrap();
        assert_eq!(found, Some(user));
        assert!(db.get_user("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_user_name_is_duplicate_error() {
        let db = test_db().await;
        db.insert_user("alice").await.unwrap();

        let err = db.insert_user("alice").await.unwrap_err();
        assert!(err.is_duplicate(), "expected Duplicate, got {:?}", err);
    }

    #[tokio::test]
    async fn test_delete_all_users_cascades_to_feeds() {
        let db = test_db().await;
        let user = db.insert_user("alice").await.unwrap();
        db.insert_feed("Blog", "https://example.com/rss", user.id)
            .await
            .unwrap();

        let removed = db.delete_all_users().await.unwrap();
        assert_eq!(removed, 1);

        let feeds = db.get_feeds().await.unwrap();
        assert!(feeds.is_empty(), "feeds should cascade with their owner");
    }
}
