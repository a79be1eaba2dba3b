use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::Command,
};

use super::command::{assert_success_command, run_command, Capture};
use crate::{authority::AuthMethod, result::Result, types::VideoId};

/// What the download program said about its run.
///
/// This is only advisory: a failing run may still leave a usable file behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    pub success: bool,
    pub stderr: String,
}

/// Interface for downloading the audio stream of videos
pub trait MediaFetcher {
    /// Download the full audio stream of the video as a WAV file at `output`,
    /// authenticating with the given method.
    ///
    /// An error is returned only if the download could not be attempted at all.
    fn fetch_audio(&self, video_id: &VideoId, auth: &AuthMethod, output: &Path)
        -> Result<FetchReport>;
}

/// Interface for the [yt-dlp](https://github.com/yt-dlp/yt-dlp) program
#[derive(Debug)]
pub struct Ytdl {
    program: String,
    ffmpeg_location: Option<PathBuf>,
}

impl Ytdl {
    /// Verify that the program is reachable
    pub fn new(program: &str, ffmpeg_location: Option<PathBuf>) -> Result<Self> {
        assert_success_command(program, |cmd| cmd.arg("--version"))?;

        Ok(Self {
            program: program.to_string(),
            ffmpeg_location,
        })
    }

    /// Arguments downloading the audio stream of the video as WAV
    fn fetch_command<'c>(
        &self,
        cmd: &'c mut Command,
        video_id: &VideoId,
        auth: &AuthMethod,
        output: &Path,
    ) -> &'c mut Command {
        cmd.arg("-i")
            .arg("--extract-audio")
            .args(["--audio-format", "wav"])
            .args(["--audio-quality", "0"]);

        if let Some(location) = &self.ffmpeg_location {
            cmd.args([OsStr::new("--ffmpeg-location"), location.as_os_str()]);
        }

        match auth {
            AuthMethod::CookiesFile(path) => cmd.args([OsStr::new("--cookies"), path.as_os_str()]),
            AuthMethod::Browser(browser) => cmd.args(["--cookies-from-browser", browser.name()]),
        };

        cmd.args([OsStr::new("--output"), output.as_os_str()])
            .arg("--")
            .arg(video_id.url())
    }
}

impl MediaFetcher for Ytdl {
    fn fetch_audio(
        &self,
        video_id: &VideoId,
        auth: &AuthMethod,
        output: &Path,
    ) -> Result<FetchReport> {
        let res = run_command(
            &self.program,
            |cmd| self.fetch_command(cmd, video_id, auth, output),
            Capture::STDERR,
        )?;

        Ok(FetchReport {
            success: res.status.success(),
            stderr: String::from_utf8_lossy(&res.stderr).trim().to_string(),
        })
    }
}

/// Suggest a fix for well-known download failures
pub fn diagnose(error: &str) -> Option<&'static str> {
    let lower = error.to_lowercase();
    if error.contains("403") || lower.contains("forbidden") {
        Some("Try updating yt-dlp: pip install --upgrade yt-dlp")
    } else if lower.contains("bot") || lower.contains("cookies") {
        Some("Make sure you are logged into YouTube in Chrome, Safari, or Firefox")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{authority::Browser, outside::YT_DLP};

    fn args(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    fn ytdl(ffmpeg_location: Option<&str>) -> Ytdl {
        Ytdl {
            program: YT_DLP.to_string(),
            ffmpeg_location: ffmpeg_location.map(PathBuf::from),
        }
    }

    #[test]
    fn fetch_with_browser_cookies() {
        let id = VideoId::new("dQw4w9WgXcQ").unwrap();
        let mut cmd = Command::new(YT_DLP);
        ytdl(None).fetch_command(
            &mut cmd,
            &id,
            &AuthMethod::Browser(Browser::Safari),
            Path::new("wav/SC/temp_dQw4w9WgXcQ.wav"),
        );

        assert_eq!(
            args(&cmd),
            [
                "-i",
                "--extract-audio",
                "--audio-format",
                "wav",
                "--audio-quality",
                "0",
                "--cookies-from-browser",
                "safari",
                "--output",
                "wav/SC/temp_dQw4w9WgXcQ.wav",
                "--",
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            ]
        );
    }

    #[test]
    fn fetch_with_cookies_file_and_ffmpeg_location() {
        let id = VideoId::new("dQw4w9WgXcQ").unwrap();
        let mut cmd = Command::new(YT_DLP);
        ytdl(Some("/opt/homebrew/bin")).fetch_command(
            &mut cmd,
            &id,
            &AuthMethod::CookiesFile(PathBuf::from("cookies.txt")),
            Path::new("temp.wav"),
        );

        assert_eq!(
            args(&cmd),
            [
                "-i",
                "--extract-audio",
                "--audio-format",
                "wav",
                "--audio-quality",
                "0",
                "--ffmpeg-location",
                "/opt/homebrew/bin",
                "--cookies",
                "cookies.txt",
                "--output",
                "temp.wav",
                "--",
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            ]
        );
    }

    #[test]
    fn diagnose_known_failures() {
        assert!(diagnose("HTTP Error 403: Forbidden")
            .unwrap()
            .contains("updating yt-dlp"));
        assert!(diagnose("Sign in to confirm you're not a bot")
            .unwrap()
            .contains("logged into YouTube"));
        assert!(diagnose("could not find Chrome Cookies database")
            .unwrap()
            .contains("logged into YouTube"));
        assert_eq!(diagnose("Video unavailable"), None);
    }
}
