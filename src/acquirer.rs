use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{
    authority::AuthMethod,
    io::{non_empty_size, remove_if_exists},
    naming::temp_path,
    outside::{diagnose, FetchReport, MediaFetcher, Transcoder},
    result::{bail, Error, Result},
    types::{format_seconds, Job},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The segment has been written to this path
    Completed(PathBuf),

    /// The segment was already there and re-runs are idempotent
    AlreadyExists(PathBuf),
}

/// Downloads the stream of a job and cuts its segment out of it
pub struct SegmentAcquirer<'a> {
    fetcher: &'a dyn MediaFetcher,
    transcoder: &'a dyn Transcoder,
    strategies: &'a [AuthMethod],
    skip_existing: bool,
}

impl<'a> SegmentAcquirer<'a> {
    pub fn new(
        fetcher: &'a dyn MediaFetcher,
        transcoder: &'a dyn Transcoder,
        strategies: &'a [AuthMethod],
        skip_existing: bool,
    ) -> Self {
        Self {
            fetcher,
            transcoder,
            strategies,
            skip_existing,
        }
    }

    /// Produce the segment of the job at `output`.
    ///
    /// The full stream is downloaded next to the output then deleted
    /// once the segment has been cut, whether cutting worked or not.
    pub fn acquire(&self, job: &Job, output: &Path) -> Result<Outcome> {
        if self.skip_existing && non_empty_size(output).is_some() {
            info!("  File already exists, skipping download");
            return Ok(Outcome::AlreadyExists(output.to_path_buf()));
        }

        let Some(duration) = job.range.duration() else {
            return bail(format!(
                "Time range {} of {} does not go forward",
                job.range, job.video_id
            ));
        };

        let temp = temp_path(output.parent().unwrap_or(Path::new(".")), &job.video_id);
        remove_if_exists(&temp)?;

        let size = self.fetch(job, &temp)?;
        info!("  Downloaded: {} ({size} bytes)", temp.display());

        info!(
            "  Trimming segment ({}, duration: {duration}s)...",
            format_seconds(job.range.start)
        );
        let res = self.transcoder.extract_segment(&temp, output, &job.range);

        if let Err(err) = remove_if_exists(&temp) {
            warn!("{err}");
        }

        res.map_err(|err| err.wrap_err_with(|| format!("Could not trim {}", job.video_id)))?;
        Ok(Outcome::Completed(output.to_path_buf()))
    }

    /// Try every authorization method until one leaves a non-empty file at `temp`.
    ///
    /// The exit status of the downloader is ignored: only the file counts.
    fn fetch(&self, job: &Job, temp: &Path) -> Result<u64> {
        let attempts = self.strategies.len();
        let mut last_error = None;

        for (i, auth) in self.strategies.iter().enumerate() {
            let n = i + 1;
            info!("  Downloading audio (method {n}: {auth})...");

            match self.fetcher.fetch_audio(&job.video_id, auth, temp) {
                Ok(FetchReport {
                    success: false,
                    stderr,
                }) => {
                    debug!("Method {n} exited with a failure status");
                    last_error = Some(if stderr.is_empty() {
                        "download program exited with a failure status".to_string()
                    } else {
                        stderr
                    });
                }
                Ok(FetchReport { success: true, .. }) => {}
                Err(err) => last_error = Some(err.to_string()),
            }

            if let Some(size) = non_empty_size(temp) {
                return Ok(size);
            }

            if n < attempts {
                warn!("  Method {n} failed, trying next method...");
            }
        }

        // Do not leave an empty partial file behind
        if let Err(err) = remove_if_exists(temp) {
            warn!("{err}");
        }

        let hint = last_error.as_deref().and_then(diagnose);
        Err(Error::FetchExhausted {
            attempts,
            last_error,
            hint,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use tempfile::TempDir;

    use super::*;
    use crate::{
        authority::Browser,
        types::{Category, TimeRange, VideoId},
    };

    /// What one download attempt does
    #[derive(Clone)]
    struct Attempt {
        success: bool,
        content: &'static [u8],
        stderr: &'static str,
    }

    const OK: Attempt = Attempt {
        success: true,
        content: b"RIFF....WAVE",
        stderr: "",
    };
    const NOTHING: Attempt = Attempt {
        success: false,
        content: b"",
        stderr: "ERROR: Sign in to confirm you're not a bot",
    };

    struct FakeFetcher {
        attempts: RefCell<Vec<Attempt>>,
        calls: RefCell<Vec<AuthMethod>>,
    }

    impl FakeFetcher {
        fn new(attempts: &[Attempt]) -> Self {
            Self {
                attempts: RefCell::new(attempts.iter().rev().cloned().collect()),
                calls: RefCell::default(),
            }
        }
    }

    impl MediaFetcher for FakeFetcher {
        fn fetch_audio(
            &self,
            _video_id: &VideoId,
            auth: &AuthMethod,
            output: &Path,
        ) -> Result<FetchReport> {
            self.calls.borrow_mut().push(auth.clone());
            let attempt = self.attempts.borrow_mut().pop().unwrap_or(NOTHING);
            if !attempt.content.is_empty() {
                std::fs::write(output, attempt.content).unwrap();
            }
            Ok(FetchReport {
                success: attempt.success,
                stderr: attempt.stderr.to_string(),
            })
        }
    }

    #[derive(Default)]
    struct FakeTranscoder {
        fail: bool,
        calls: RefCell<Vec<TimeRange>>,
    }

    impl Transcoder for FakeTranscoder {
        fn extract_segment(&self, input: &Path, output: &Path, range: &TimeRange) -> Result<()> {
            assert!(input.exists(), "transcoding a missing input");
            self.calls.borrow_mut().push(*range);
            if self.fail {
                return bail("ffmpeg did run but was not successful");
            }
            std::fs::write(output, b"RIFF").unwrap();
            Ok(())
        }
    }

    fn strategies() -> Vec<AuthMethod> {
        Browser::ALL.into_iter().map(AuthMethod::Browser).collect()
    }

    fn job(range: &str) -> Job {
        Job {
            category: Category::new("SC").unwrap(),
            video_id: VideoId::new("dQw4w9WgXcQ").unwrap(),
            range: range.parse().unwrap(),
            segment: 0,
        }
    }

    struct Setup {
        dir: TempDir,
        output: PathBuf,
        temp: PathBuf,
    }

    fn setup() -> Setup {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("SC-dQw4w9WgXcQ_seg0.wav");
        let temp = dir.path().join("temp_dQw4w9WgXcQ.wav");
        Setup { dir, output, temp }
    }

    #[test]
    fn first_working_method_stops_the_loop() {
        let s = setup();
        let fetcher = FakeFetcher::new(&[OK]);
        let transcoder = FakeTranscoder::default();
        let strategies = strategies();
        let acquirer = SegmentAcquirer::new(&fetcher, &transcoder, &strategies, false);

        let outcome = acquirer.acquire(&job("4:15-6:15"), &s.output).unwrap();

        assert_eq!(outcome, Outcome::Completed(s.output.clone()));
        assert_eq!(fetcher.calls.borrow().len(), 1);
        assert_eq!(*transcoder.calls.borrow(), [TimeRange { start: 255, end: 375 }]);
        assert!(s.output.exists());
        assert!(!s.temp.exists());
    }

    #[test]
    fn failure_status_with_a_file_still_counts() {
        let s = setup();
        let fetcher = FakeFetcher::new(&[Attempt {
            success: false,
            ..OK
        }]);
        let transcoder = FakeTranscoder::default();
        let strategies = strategies();
        let acquirer = SegmentAcquirer::new(&fetcher, &transcoder, &strategies, false);

        acquirer.acquire(&job("0:10-0:20"), &s.output).unwrap();

        assert_eq!(fetcher.calls.borrow().len(), 1);
        assert_eq!(transcoder.calls.borrow().len(), 1);
    }

    #[test]
    fn methods_are_tried_in_order_until_a_file_appears() {
        let s = setup();
        let cookies = s.dir.path().join("cookies.txt");
        let mut strategies = vec![AuthMethod::CookiesFile(cookies.clone())];
        strategies.extend(self::strategies());

        // The cookies file run "succeeds" without producing anything
        let fetcher = FakeFetcher::new(&[
            Attempt {
                success: true,
                ..NOTHING
            },
            NOTHING,
            OK,
        ]);
        let transcoder = FakeTranscoder::default();
        let acquirer = SegmentAcquirer::new(&fetcher, &transcoder, &strategies, false);

        acquirer.acquire(&job("0:10-0:20"), &s.output).unwrap();

        assert_eq!(
            *fetcher.calls.borrow(),
            [
                AuthMethod::CookiesFile(cookies),
                AuthMethod::Browser(Browser::Chrome),
                AuthMethod::Browser(Browser::Safari),
            ]
        );
    }

    #[test]
    fn exhausted_methods_never_transcode() {
        let s = setup();
        let fetcher = FakeFetcher::new(&[]);
        let transcoder = FakeTranscoder::default();
        let strategies = strategies();
        let acquirer = SegmentAcquirer::new(&fetcher, &transcoder, &strategies, false);

        let err = acquirer.acquire(&job("0:10-0:20"), &s.output).unwrap_err();

        match err {
            Error::FetchExhausted {
                attempts,
                last_error,
                hint,
            } => {
                assert_eq!(attempts, 3);
                assert!(last_error.unwrap().contains("not a bot"));
                assert!(hint.unwrap().contains("logged into YouTube"));
            }
            other => panic!("unexpected error {other}"),
        }
        assert_eq!(fetcher.calls.borrow().len(), 3);
        assert!(transcoder.calls.borrow().is_empty());
        assert!(!s.output.exists());
    }

    #[test]
    fn empty_partial_file_is_cleaned_up() {
        struct EmptyFileFetcher;

        impl MediaFetcher for EmptyFileFetcher {
            fn fetch_audio(&self, _: &VideoId, _: &AuthMethod, output: &Path) -> Result<FetchReport> {
                std::fs::write(output, b"").unwrap();
                Ok(FetchReport::default())
            }
        }

        let s = setup();
        let transcoder = FakeTranscoder::default();
        let strategies = strategies();
        let acquirer = SegmentAcquirer::new(&EmptyFileFetcher, &transcoder, &strategies, false);

        let res = acquirer.acquire(&job("0:10-0:20"), &s.output);

        assert!(matches!(res, Err(Error::FetchExhausted { attempts: 3, .. })));
        assert!(!s.temp.exists());
        assert!(transcoder.calls.borrow().is_empty());
    }

    #[test]
    fn stale_temp_file_is_not_mistaken_for_a_download() {
        let s = setup();
        std::fs::write(&s.temp, b"old partial stream").unwrap();
        let fetcher = FakeFetcher::new(&[]);
        let transcoder = FakeTranscoder::default();
        let strategies = strategies();
        let acquirer = SegmentAcquirer::new(&fetcher, &transcoder, &strategies, false);

        let res = acquirer.acquire(&job("0:10-0:20"), &s.output);

        assert!(matches!(res, Err(Error::FetchExhausted { .. })));
        assert!(transcoder.calls.borrow().is_empty());
    }

    #[test]
    fn transcode_failure_removes_temp_file() {
        let s = setup();
        let fetcher = FakeFetcher::new(&[OK]);
        let transcoder = FakeTranscoder {
            fail: true,
            ..Default::default()
        };
        let strategies = strategies();
        let acquirer = SegmentAcquirer::new(&fetcher, &transcoder, &strategies, false);

        let res = acquirer.acquire(&job("0:10-0:20"), &s.output);

        assert!(matches!(res, Err(Error::Miette(_))));
        assert!(!s.temp.exists());
        assert!(!s.output.exists());
    }

    #[test]
    fn reversed_range_fails_before_downloading() {
        let s = setup();
        let fetcher = FakeFetcher::new(&[OK]);
        let transcoder = FakeTranscoder::default();
        let strategies = strategies();
        let acquirer = SegmentAcquirer::new(&fetcher, &transcoder, &strategies, false);

        assert!(acquirer.acquire(&job("6:15-4:15"), &s.output).is_err());
        assert!(fetcher.calls.borrow().is_empty());
    }

    #[test]
    fn existing_output_is_kept_when_skipping() {
        let s = setup();
        std::fs::write(&s.output, b"RIFF").unwrap();
        let fetcher = FakeFetcher::new(&[OK]);
        let transcoder = FakeTranscoder::default();
        let strategies = strategies();

        let acquirer = SegmentAcquirer::new(&fetcher, &transcoder, &strategies, true);
        let outcome = acquirer.acquire(&job("0:10-0:20"), &s.output).unwrap();
        assert_eq!(outcome, Outcome::AlreadyExists(s.output.clone()));
        assert!(fetcher.calls.borrow().is_empty());

        let acquirer = SegmentAcquirer::new(&fetcher, &transcoder, &strategies, false);
        let outcome = acquirer.acquire(&job("0:10-0:20"), &s.output).unwrap();
        assert_eq!(outcome, Outcome::Completed(s.output.clone()));
        assert_eq!(fetcher.calls.borrow().len(), 1);
    }
}
