use std::{fmt::Display, str::FromStr};

use miette::{bail, miette, Report, Result};

/// A time window inside a media stream, in whole seconds.
///
/// `end > start` is expected but not enforced here: a window of non-positive
/// length is only rejected when a segment is actually cut out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: u64,
    pub end: u64,
}

impl TimeRange {
    /// Length of the window, or `None` when it is empty or reversed.
    pub fn duration(&self) -> Option<u64> {
        self.end.checked_sub(self.start).filter(|&d| d > 0)
    }
}

/// Convert a `SS`, `MM:SS` or `HH:MM:SS` token into seconds.
pub fn to_seconds(token: &str) -> Result<u64> {
    let token = token.trim();
    let parts: Vec<&str> = token.split(':').collect();
    if parts.len() > 3 {
        bail!("Too many ':' separated parts in time '{token}'");
    }

    let mut secs: u64 = 0;
    for part in parts {
        let part = part.trim();
        let n = part
            .parse::<u64>()
            .map_err(|_| miette!("Invalid number '{part}' in time '{token}'"))?;
        secs = secs
            .checked_mul(60)
            .and_then(|s| s.checked_add(n))
            .ok_or_else(|| miette!("Time '{token}' is too large"))?;
    }

    Ok(secs)
}

/// Format seconds as `MM:SS`, or `HH:MM:SS` from one hour onward.
pub fn format_seconds(total: u64) -> String {
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if total < 3600 {
        format!("{minutes:02}:{secs:02}")
    } else {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    }
}

impl FromStr for TimeRange {
    type Err = Report;

    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| miette!("Time range '{s}' is not of the form <start>-<end>"))?;
        if end.contains('-') {
            bail!("Time range '{s}' contains more than one '-'");
        }

        Ok(Self {
            start: to_seconds(start)?,
            end: to_seconds(end)?,
        })
    }
}

impl Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}",
            format_seconds(self.start),
            format_seconds(self.end)
        )
    }
}
