//! The ingestion scheduler: one feed per tick, forever, until told to stop.
//!
//! Each cycle claims the least-recently-fetched feed (stamping it before the
//! network request, so a broken feed waits a full rotation), fetches its
//! document, and ingests the items. Every failure below the configuration
//! level is confined to its cycle.

use std::fmt;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::feed::{ingest, FetchError, Fetcher, IngestReport};
use crate::storage::{DatabaseError, Feed, FeedStore};

/// What a single cycle did.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The feed pool is empty; not an error.
    NoFeeds,
    /// The store could not hand out a feed.
    StoreError(DatabaseError),
    /// The claimed feed could not be retrieved or decoded. It stays stamped.
    FetchFailed { feed: Feed, error: FetchError },
    /// The claimed feed was fetched and its items ingested.
    Collected { feed: Feed, report: IngestReport },
}

impl CycleOutcome {
    /// The feed claimed by this cycle, if any.
    pub fn feed(&self) -> Option<&Feed> {
        match self {
            CycleOutcome::FetchFailed { feed, .. } | CycleOutcome::Collected { feed, .. } => {
                Some(feed)
            }
            CycleOutcome::NoFeeds | CycleOutcome::StoreError(_) => None,
        }
    }
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::NoFeeds => write!(f, "No feeds to scrape."),
            CycleOutcome::StoreError(e) => write!(f, "Couldn't get next feed to scrape: {}", e),
            CycleOutcome::FetchFailed { feed, error } => {
                write!(f, "Couldn't fetch feed {}: {}", feed.name, error)
            }
            CycleOutcome::Collected { feed, report } => write!(
                f,
                "Feed {} collected, {} posts found ({} new, {} already seen, {} failed)",
                feed.name, report.attempted, report.inserted, report.duplicates, report.failed
            ),
        }
    }
}

/// Drives select → fetch → ingest against one store.
///
/// Single-threaded by construction: [`run`](Self::run) awaits each cycle
/// before looking at the next tick.
pub struct Scheduler<S> {
    store: S,
    fetcher: Fetcher,
}

impl<S: FeedStore> Scheduler<S> {
    pub fn new(store: S, fetcher: Fetcher) -> Self {
        Self { store, fetcher }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one cycle now.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let now = chrono::Utc::now().timestamp();

        let feed = match self.store.claim_next_feed(now).await {
            Ok(Some(feed)) => feed,
            Ok(None) => {
                tracing::info!("No feeds to scrape");
                return CycleOutcome::NoFeeds;
            }
            Err(e) => {
                tracing::error!(error = %e, "Couldn't claim next feed");
                return CycleOutcome::StoreError(e);
            }
        };

        tracing::debug!(feed_id = feed.id, url = %feed.url, "Claimed feed");

        let document = match self.fetcher.fetch(&feed.url).await {
            Ok(document) => document,
            Err(error) => {
                tracing::warn!(
                    feed_id = feed.id,
                    url = %feed.url,
                    error = %error,
                    "Couldn't fetch feed"
                );
                return CycleOutcome::FetchFailed { feed, error };
            }
        };

        let report = ingest(&self.store, &feed, &document).await;
        tracing::info!(
            feed_id = feed.id,
            name = %feed.name,
            found = report.attempted,
            inserted = report.inserted,
            duplicates = report.duplicates,
            failed = report.failed,
            "Feed collected"
        );

        CycleOutcome::Collected { feed, report }
    }

    /// Run a cycle on every tick of `interval` until `shutdown` becomes
    /// `true` or its sender is dropped. Returns the number of cycles run.
    ///
    /// The first cycle fires one full interval after the call. Ticks that
    /// pass while a cycle is still running are not queued: the next cycle
    /// starts right after the slow one, then the schedule realigns.
    /// A cycle in progress when shutdown is signalled is allowed to finish.
    pub async fn run(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) -> u64 {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // The first tick completes immediately. Consume it so the first
        // cycle runs one full interval after start, never on startup.
        ticker.tick().await;

        let mut cycles: u64 = 0;
        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }

                _ = ticker.tick() => {
                    let outcome = self.run_cycle().await;
                    println!("{}", outcome);
                    cycles += 1;
                }
            }
        }

        tracing::info!(cycles = cycles, "Scheduler stopped");
        cycles
    }
}
