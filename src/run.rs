use std::{
    fmt::Display,
    io::Read,
    path::{Path, PathBuf},
};

use miette::Report;
use tracing::{error, info, warn};

use crate::{
    acquirer::{Outcome, SegmentAcquirer},
    authority::Authority,
    manifest::{ManifestEvent, ManifestReader},
    naming::{category_dir, output_path},
    result::Result,
    settings::Settings,
};

/// Find the authorization material of the run.
///
/// Must be called before anything is written: without it nothing can be downloaded.
pub fn authorize(root: &Path, settings: &Settings, home: Option<&Path>) -> Result<Authority> {
    Authority::discover(
        &root.join(&settings.cookies_file),
        home,
        &settings.browsers,
    )
}

/// Counters of what happened during a run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub failed: usize,
    pub already_present: usize,
    pub planned: usize,
    pub skipped_rows: usize,
}

impl Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} completed, {} failed, {} already present, {} rows skipped",
            self.completed, self.failed, self.already_present, self.skipped_rows
        )?;
        if self.planned > 0 {
            write!(f, ", {} planned", self.planned)?;
        }
        Ok(())
    }
}

/// Drives the manifest rows through the acquirer, one job at a time.
///
/// Without an acquirer, jobs are only listed and nothing is written.
pub struct Runner<'a> {
    wav_root: PathBuf,
    acquirer: Option<SegmentAcquirer<'a>>,
}

impl<'a> Runner<'a> {
    pub fn new(wav_root: PathBuf, acquirer: Option<SegmentAcquirer<'a>>) -> Self {
        Self { wav_root, acquirer }
    }

    pub fn dry_run(wav_root: PathBuf) -> Self {
        Self::new(wav_root, None)
    }

    /// Process every row of the manifest.
    ///
    /// Failed jobs are logged and counted, they never stop the run.
    pub fn process<R: Read>(&self, manifest: ManifestReader<R>) -> RunSummary {
        let mut summary = RunSummary::default();
        // Whether the folder of the active category could be created
        let mut category_ready = false;

        for event in manifest {
            match event {
                ManifestEvent::Category { category, .. } => {
                    info!("{}", "=".repeat(60));
                    info!("Processing category: {category}");
                    info!("{}", "=".repeat(60));

                    let dir = category_dir(&self.wav_root, &category);
                    category_ready = self.prepare_dir(&dir);
                }
                ManifestEvent::Skipped { line, reason } => {
                    warn!("Line {line}: {reason}");
                    summary.skipped_rows += 1;
                }
                ManifestEvent::Job { line, job } => {
                    let output =
                        output_path(&self.wav_root, &job.category, &job.video_id, job.segment);

                    info!("Processing: {job} [line {line}]");
                    info!("  Start: {}s, End: {}s", job.range.start, job.range.end);
                    info!("  Output: {}", output.display());

                    let Some(acquirer) = &self.acquirer else {
                        summary.planned += 1;
                        continue;
                    };

                    if !category_ready {
                        error!("✗ No output folder for category {}", job.category);
                        summary.failed += 1;
                        continue;
                    }

                    match acquirer.acquire(&job, &output) {
                        Ok(Outcome::Completed(path)) => {
                            info!("✓ Downloaded: {}", path.display());
                            summary.completed += 1;
                        }
                        Ok(Outcome::AlreadyExists(_)) => summary.already_present += 1,
                        Err(err) => {
                            error!("✗ Error processing {}: {:?}", job.video_id, Report::from(err));
                            summary.failed += 1;
                        }
                    }
                }
            }
        }

        summary
    }

    fn prepare_dir(&self, dir: &Path) -> bool {
        if self.acquirer.is_none() {
            return true;
        }

        match std::fs::create_dir_all(dir) {
            Ok(()) => {
                info!("Output folder: {}", dir.display());
                true
            }
            Err(err) => {
                error!("Could not create output folder {}: {err}", dir.display());
                false
            }
        }
    }
}
