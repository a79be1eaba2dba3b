use std::fmt::Display;

use indoc::indoc;
use miette::{miette, Report};

#[derive(Debug)]
pub enum Error {
    /// Neither a cookies file nor any browser profile could be found
    MissingCredentials,

    /// Every authorization method was tried without producing a usable file
    FetchExhausted {
        attempts: usize,
        last_error: Option<String>,
        hint: Option<&'static str>,
    },

    Miette(Report),
}

impl From<Report> for Error {
    fn from(err: Report) -> Self {
        Error::Miette(err)
    }
}

impl From<Error> for Report {
    fn from(err: Error) -> Self {
        match err {
            Error::MissingCredentials => miette!(
                help = indoc! {"
                    Provide one of the following:
                      1. A cookies.txt file in the run root directory.
                         Export it with: yt-dlp --cookies-from-browser chrome --cookies cookies.txt
                      2. Be logged into YouTube in Chrome, Safari, or Firefox.
                         Cookies will then be read directly from the browser."},
                "Cookies are required but none are available"
            ),
            Error::FetchExhausted {
                attempts,
                last_error,
                hint,
            } => {
                let cause = last_error.unwrap_or_else(|| "no output file produced".to_string());
                match hint {
                    Some(hint) => miette!(
                        help = hint,
                        "All {attempts} download methods failed: {cause}"
                    ),
                    None => miette!("All {attempts} download methods failed: {cause}"),
                }
            }
            Error::Miette(err) => err,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MissingCredentials => write!(f, "Cookies are required but none are available"),
            Error::FetchExhausted { attempts, .. } => {
                write!(f, "All {attempts} download methods failed")
            }
            Error::Miette(report) => write!(f, "{report}"),
        }
    }
}

impl Error {
    pub fn wrap_err_with<D, F>(self, f: F) -> Error
    where
        D: Display + Send + Sync + 'static,
        F: FnOnce() -> D,
    {
        match self {
            Error::Miette(report) => Error::Miette(report.wrap_err(f())),
            err => err,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub fn err_msg<D: Display + std::fmt::Debug + Send + Sync + 'static>(msg: D) -> Error {
    Error::Miette(Report::msg(msg))
}

pub fn bail<T, D: Display + std::fmt::Debug + Send + Sync + 'static>(msg: D) -> Result<T> {
    Err(err_msg(msg))
}
