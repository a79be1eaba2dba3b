use std::{ffi::OsStr, path::Path, process::Command};

use crate::{
    result::{bail, Result},
    types::{format_seconds, TimeRange},
};

use super::command::{assert_success_command, FFXXX_DEFAULT_ARGS};

/// Output sample format: 16-bit little-endian PCM
const PCM_CODEC: &str = "pcm_s16le";

pub trait Transcoder {
    /// Cut the `[start, end)` window of the input stream into `output`,
    /// overwriting it if it exists.
    fn extract_segment(&self, input: &Path, output: &Path, range: &TimeRange) -> Result<()>;
}

/// Interface for the [ffmpeg](https://ffmpeg.org) program
#[derive(Debug)]
pub struct Ffmpeg {
    program: String,
    sample_rate: u32,
    channels: u8,
}

impl Ffmpeg {
    /// Verify that the `ffmpeg` binary is reachable
    pub fn new(program: &str, sample_rate: u32, channels: u8) -> Result<Self> {
        assert_success_command(program, |cmd| cmd.arg("-version"))?;

        Ok(Self {
            program: program.to_string(),
            sample_rate,
            channels,
        })
    }

    /// Arguments cutting `duration` seconds from `start` into a PCM WAV file
    fn segment_command<'c>(
        &self,
        cmd: &'c mut Command,
        input: &Path,
        output: &Path,
        start: u64,
        duration: u64,
    ) -> &'c mut Command {
        cmd.args(FFXXX_DEFAULT_ARGS)
            .args([OsStr::new("-i"), input.as_os_str()])
            .args(["-ss", &format_seconds(start)])
            .args(["-t", &duration.to_string()])
            .args(["-acodec", PCM_CODEC])
            .args(["-ar", &self.sample_rate.to_string()])
            .args(["-ac", &self.channels.to_string()])
            .arg("-y")
            .arg(output)
    }
}

impl Transcoder for Ffmpeg {
    fn extract_segment(&self, input: &Path, output: &Path, range: &TimeRange) -> Result<()> {
        let Some(duration) = range.duration() else {
            return bail(format!("Empty time range {range}"));
        };

        assert_success_command(&self.program, |cmd| {
            self.segment_command(cmd, input, output, range.start, duration)
        })
    }
}
