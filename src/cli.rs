use std::path::PathBuf;

use clap::Parser;
use tracing::Level;

macro_rules! arg_env {
    ($v:literal) => {
        concat!("WAVCLIP_", $v)
    };
}

/// Batch extract labeled audio clips out of web videos.
///
/// Reads a CSV manifest made of `id (<CATEGORY>)` header rows followed by
/// `<video id>,<start>-<end>` rows, and writes every segment to
/// `<root>/wav/<CATEGORY>/<CATEGORY>-<video id>_seg<N>.wav`.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// The path to the CSV manifest listing the segments to extract
    #[arg(env=arg_env!("MANIFEST"))]
    pub manifest: PathBuf,

    /// The run root directory. Output goes to its `wav` subdirectory
    /// and the cookies file is looked up relative to it
    #[arg(long, default_value = ".", env=arg_env!("ROOT"))]
    pub root: PathBuf,

    /// The path to a TOML settings file.
    /// Defaults to `wavclip.toml` in the root directory, if it exists
    #[arg(long, env=arg_env!("CONFIG"))]
    pub config: Option<PathBuf>,

    /// Do not download segments whose output file already exists and is not empty
    #[arg(long, env=arg_env!("SKIP_EXISTING"))]
    pub skip_existing: bool,

    /// Only read the manifest and print the segments that would be extracted
    #[arg(long, env=arg_env!("DRY_RUN"))]
    pub dry_run: bool,

    /// The maximum level of the logs to print
    #[arg(long, default_value_t = Level::INFO, env=arg_env!("LOG_LEVEL"))]
    pub log_level: Level,

    /// Shorthand for `--log-level debug`
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn level(&self) -> Level {
        if self.verbose {
            self.log_level.max(Level::DEBUG)
        } else {
            self.log_level
        }
    }

    pub fn config_file(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(path) => (path.clone(), true),
            None => (self.root.join("wavclip.toml"), false),
        }
    }
}
