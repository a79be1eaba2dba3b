//! Line oriented reader turning a manifest CSV file into extraction jobs.
//!
//! The manifest is a flat list of rows split into sections:
//!
//! ```text
//! id (SC),time
//! dQw4w9WgXcQ,4:15-6:15
//! dQw4w9WgXcQ,7:00-7:30
//! id (PR),time
//! ...
//! ```
//!
//! A header row opens a new category, every following data row becomes a
//! job of that category until the next header.

use std::{io::Read, sync::OnceLock};

use miette::{miette, Context, IntoDiagnostic, Result};
use regex::Regex;
use tracing::debug;

use crate::{
    naming::SegmentCounters,
    types::{Category, Job, TimeRange, VideoId},
};

/// Case-insensitive marker identifying a header row in its first cell
const HEADER_MARKER: &str = "id (";

static LABEL_RE: OnceLock<Regex> = OnceLock::new();

/// Text inside the first parenthesis pair
fn label_regex() -> &'static Regex {
    LABEL_RE.get_or_init(|| Regex::new(r"\(([^)]+)\)").unwrap())
}

/// Single line rendering of an error and its causes
fn flatten(err: &miette::Report) -> String {
    err.chain()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(": ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestEvent {
    /// A header row switched to a new category
    Category { line: u64, category: Category },

    /// A data row produced a job
    Job { line: u64, job: Job },

    /// A row looked like a header or data row but could not be used
    Skipped { line: u64, reason: String },
}

/// Single pass reader over the manifest rows.
///
/// Owns the active category and its segment counters, so the segment index
/// of every job only depends on the manifest and its row order.
pub struct ManifestReader<R> {
    records: csv::StringRecordsIntoIter<R>,
    category: Option<Category>,
    counters: SegmentCounters,
    done: bool,
}

impl<R: Read> ManifestReader<R> {
    pub fn new(reader: R) -> Self {
        let records = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader)
            .into_records();

        Self {
            records,
            category: None,
            counters: SegmentCounters::default(),
            done: false,
        }
    }

    fn handle_header(&mut self, line: u64, cell: &str) -> ManifestEvent {
        let label = label_regex()
            .captures(cell)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str());

        let category = label
            .ok_or_else(|| miette!("no '(label)' found"))
            .and_then(Category::new);

        match category {
            Ok(category) => {
                self.category = Some(category.clone());
                self.counters.reset();
                ManifestEvent::Category { line, category }
            }
            Err(err) => ManifestEvent::Skipped {
                line,
                reason: format!("Unusable header '{cell}': {err}"),
            },
        }
    }

    /// Turn a data row into a job.
    /// Returns `None` for rows that are silently ignored.
    fn handle_data(&mut self, line: u64, record: &csv::StringRecord) -> Option<ManifestEvent> {
        let category = self.category.as_ref()?;

        let id_cell = record.get(0)?.trim();
        let range_cell = record.get(1)?.trim();
        if id_cell.is_empty() || range_cell.is_empty() {
            return None;
        }

        let parsed = VideoId::new(id_cell)
            .wrap_err_with(|| format!("Skipping {id_cell}"))
            .and_then(|video_id| {
                let range = range_cell
                    .parse::<TimeRange>()
                    .wrap_err_with(|| format!("Skipping {id_cell}: bad time range"))?;
                Ok((video_id, range))
            });

        let event = match parsed {
            Ok((video_id, range)) => {
                let segment = self.counters.next_index(&video_id);
                ManifestEvent::Job {
                    line,
                    job: Job {
                        category: category.clone(),
                        video_id,
                        range,
                        segment,
                    },
                }
            }
            Err(err) => ManifestEvent::Skipped {
                line,
                reason: flatten(&err),
            },
        };
        Some(event)
    }
}

impl<R: Read> Iterator for ManifestReader<R> {
    type Item = ManifestEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }

            let record = match self.records.next()? {
                Ok(record) => record,
                Err(err) => {
                    // IO errors would keep repeating, give up on the file
                    self.done = err.is_io_error();
                    let line = err.position().map_or(0, |p| p.line());
                    return Some(ManifestEvent::Skipped {
                        line,
                        reason: format!("Unreadable row: {err}"),
                    });
                }
            };
            let line = record.position().map_or(0, |p| p.line());

            let first = record.get(0).unwrap_or_default();
            if first.to_lowercase().contains(HEADER_MARKER) {
                return Some(self.handle_header(line, first));
            }

            if record.len() < 2 {
                continue;
            }

            match self.handle_data(line, &record) {
                Some(event) => return Some(event),
                None => {
                    debug!("Ignoring line {line}");
                    continue;
                }
            }
        }
    }
}

/// Open a manifest file
pub fn open(path: &std::path::Path) -> Result<ManifestReader<std::fs::File>> {
    let file = std::fs::File::open(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Could not open manifest {}", path.display()))?;
    Ok(ManifestReader::new(file))
}
