//! SQLite-backed store for users, the global feed pool, and ingested posts.
//!
//! [`Database`] is the concrete store; [`FeedStore`] is the narrow interface
//! the scheduler and ingestion engine are written against.

mod feeds;
mod posts;
mod schema;
mod store;
mod types;
mod users;

pub use schema::Database;
pub use store::FeedStore;
pub use types::{DatabaseError, Feed, FeedListing, NewPost, Post, User};
