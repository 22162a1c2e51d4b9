//! blogaggr: a background aggregator that repeatedly picks the
//! least-recently-fetched RSS feed, retrieves it, and stores each new item
//! exactly once.

pub mod config;
pub mod feed;
pub mod scheduler;
pub mod storage;
pub mod util;
