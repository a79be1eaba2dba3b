use std::{fmt::Display, ops::Deref};

use miette::{bail, Result};

use super::TimeRange;

/// Number of characters in a YouTube video ID
pub const VIDEO_ID_LEN: usize = 11;

/// Label grouping jobs into one output folder and one segment counter namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Category(String);

impl Category {
    /// Build a category from a header label.
    ///
    /// The label ends up as a directory name so it must not be able
    /// to escape the output root.
    pub fn new(label: &str) -> Result<Self> {
        let label = label.trim();
        if label.is_empty() {
            bail!("Empty category label");
        }
        if label.contains(['/', '\\']) || label.contains("..") {
            bail!("Category label '{label}' cannot be used as a folder name");
        }
        Ok(Self(label.to_string()))
    }
}

impl Deref for Category {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A video ID that has at least the right shape
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    pub fn new(id: &str) -> Result<Self> {
        let id = id.trim();
        let len = id.chars().count();
        if len != VIDEO_ID_LEN {
            bail!("Invalid video ID length ({len} characters, expected {VIDEO_ID_LEN})");
        }
        Ok(Self(id.to_string()))
    }

    pub fn url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl Deref for VideoId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One segment to extract from one video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub category: Category,
    pub video_id: VideoId,
    pub range: TimeRange,
    pub segment: u32,
}

impl Display for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} seg{} ({})",
            self.category, self.video_id, self.segment, self.range
        )
    }
}
