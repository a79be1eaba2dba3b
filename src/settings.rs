use std::path::{Path, PathBuf};

use config::{Config, File, FileFormat};
use miette::{Context, IntoDiagnostic, Result};
use serde::Deserialize;

use crate::{
    authority::Browser,
    outside::{FFMPEG, YT_DLP},
};

/// Settings of the external programs and the download strategy
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Program used to download the streams
    pub ytdl_program: String,

    /// Program used to cut the segments
    pub ffmpeg_program: String,

    /// Directory containing ffmpeg, handed to the downloader
    pub ffmpeg_location: Option<PathBuf>,

    /// Netscape cookies file, relative to the run root
    pub cookies_file: PathBuf,

    /// Browsers to take cookies from, in order
    pub browsers: Vec<Browser>,

    pub sample_rate: u32,
    pub channels: u8,
}

impl Settings {
    /// Load the settings from the built-in defaults and a TOML file.
    ///
    /// A missing file is an error only if `required` is set.
    pub fn load(file: &Path, required: bool) -> Result<Self> {
        let browsers: Vec<&str> = Browser::ALL.iter().map(|b| b.name()).collect();

        Config::builder()
            .set_default("ytdl_program", YT_DLP)
            .and_then(|b| b.set_default("ffmpeg_program", FFMPEG))
            .and_then(|b| b.set_default("cookies_file", "cookies.txt"))
            .and_then(|b| b.set_default("browsers", browsers))
            .and_then(|b| b.set_default("sample_rate", 44100))
            .and_then(|b| b.set_default("channels", 2))
            .into_diagnostic()?
            .add_source(File::from(file).format(FileFormat::Toml).required(required))
            .build()
            .and_then(Config::try_deserialize)
            .into_diagnostic()
            .wrap_err_with(|| format!("Could not load settings from {}", file.display()))
    }
}
