use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use thiserror::Error;

/// The one publish-date layout accepted: RFC 1123 with a numeric zone,
/// e.g. `Mon, 02 Jan 2006 15:04:05 -0700`.
pub const PUB_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// [`PUB_DATE_FORMAT`] without the weekday. The weekday is checked for
/// shape only; feeds routinely carry one that disagrees with the date.
const PUB_DATE_BODY_FORMAT: &str = "%d %b %Y %H:%M:%S %z";

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Feed body is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("Feed does not match the RSS item schema: {0}")]
    Schema(#[from] quick_xml::de::DeError),
}

/// A decoded feed document. Lives only for the duration of one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedDocument {
    pub title: String,
    pub items: Vec<FeedItem>,
}

/// One `<item>` of an RSS channel, in source order.
///
/// `pub_date` is kept raw; [`FeedItem::published_at`] applies the fixed
/// date format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FeedItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "pubDate", default)]
    pub pub_date: Option<String>,
}

impl FeedItem {
    /// Publication time in Unix seconds, or `None` when the date is absent
    /// or not in [`PUB_DATE_FORMAT`].
    pub fn published_at(&self) -> Option<i64> {
        self.pub_date.as_deref().and_then(parse_pub_date)
    }
}

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(default)]
    title: String,
    #[serde(rename = "item", default)]
    items: Vec<FeedItem>,
}

/// Decode an RSS 2.0 document (`rss > channel > item*`).
///
/// Only that schema is understood. Atom, JSON Feed, HTML error pages and
/// truncated XML all fail with [`ParseError`]; nothing partial is returned.
///
/// # Security
///
/// `quick-xml` (0.37) does not expand `<!ENTITY>` declarations, so external
/// entity tricks surface as a schema error rather than a file read.
pub fn parse_feed(bytes: &[u8]) -> Result<FetchedDocument, ParseError> {
    let text = std::str::from_utf8(bytes)?;
    let rss: Rss = quick_xml::de::from_str(text)?;

    Ok(FetchedDocument {
        title: rss.channel.title,
        items: rss.channel.items,
    })
}

/// Parse a raw `pubDate` against [`PUB_DATE_FORMAT`].
///
/// Surrounding whitespace is ignored. The weekday must be a valid
/// abbreviation but need not match the calendar date. Zone names such as
/// `GMT` do not match the numeric-offset layout and yield `None`.
pub fn parse_pub_date(raw: &str) -> Option<i64> {
    let (weekday, body) = raw.trim().split_once(", ")?;
    if !WEEKDAYS.iter().any(|day| day.eq_ignore_ascii_case(weekday)) {
        return None;
    }

    DateTime::<FixedOffset>::parse_from_str(body, PUB_DATE_BODY_FORMAT)
        .ok()
        .map(|dt| dt.timestamp())
}
