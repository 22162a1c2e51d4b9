//! Feed retrieval and ingestion.
//!
//! - [`parser`] - decodes the fixed RSS item schema and the publish-date format
//! - [`fetcher`] - bounded HTTP retrieval of a feed document
//! - [`ingest`] - turns a fetched document into stored posts, once per URL
//!
//! # Example
//!
//! ```ignore
//! use blogaggr::feed::{ingest, Fetcher};
//!
//! let document = fetcher.fetch(&feed.url).await?;
//! let report = ingest(&db, &feed, &document).await;
//! println!("{} items, {} new", report.attempted, report.inserted);
//! ```

mod fetcher;
mod ingest;
mod parser;

pub use fetcher::{FetchError, Fetcher, DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_FEED_BYTES};
pub use ingest::{ingest, to_new_post, IngestReport};
pub use parser::{parse_feed, parse_pub_date, FeedItem, FetchedDocument, ParseError, PUB_DATE_FORMAT};
