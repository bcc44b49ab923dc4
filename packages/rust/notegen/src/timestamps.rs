//! Timestamp parsing for generated notes.
//!
//! Headings in timestamped notes carry `[hh:mm:ss]` markers. Decoding is
//! lenient: a malformed marker is logged and decoded as 0 seconds, never an
//! error.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

/// A heading with its decoded timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampedHeading {
    /// Seconds from the start of the recording.
    pub seconds: u32,
    /// Heading level (1 or 2).
    pub level: u8,
    /// Heading text after the marker.
    pub title: String,
}

/// Parse a `hh:mm:ss` or `mm:ss` timestamp into seconds.
pub fn parse_timestamp(value: &str) -> Option<u32> {
    let parts: Vec<&str> = value.trim().split(':').collect();

    let nums: Option<Vec<u32>> = parts.iter().map(|p| p.parse::<u32>().ok()).collect();
    let nums = nums?;

    match nums.as_slice() {
        [h, m, s] => Some(h * 3600 + m * 60 + s),
        [m, s] => Some(m * 60 + s),
        _ => None,
    }
}

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<h([12])>\s*\[([^\]]*)\]\s*(.*?)\s*<(?:/)?h[12]>").expect("valid regex")
});

/// Decode every timestamped heading in a notes document.
///
/// Headings whose markers fail to parse are kept with a 0-second default so
/// the surrounding structure survives a single bad timestamp.
pub fn decode_headings(notes: &str) -> Vec<TimestampedHeading> {
    let mut headings = Vec::new();

    for caps in HEADING_RE.captures_iter(notes) {
        let level: u8 = caps[1].parse().unwrap_or(1);
        let marker = &caps[2];
        let title = caps[3].trim().to_string();

        let seconds = match parse_timestamp(marker) {
            Some(s) => s,
            None => {
                warn!(marker, title = %title, "unparseable timestamp, defaulting to 0");
                0
            }
        };

        headings.push(TimestampedHeading {
            seconds,
            level,
            title,
        });
    }

    headings
}
