use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{debug, info};

use crate::result::{Error, Result};

/// Browsers whose cookie store yt-dlp can read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    Chrome,
    Safari,
    Firefox,
}

impl Browser {
    /// Default order in which browsers are tried
    pub const ALL: [Browser; 3] = [Browser::Chrome, Browser::Safari, Browser::Firefox];

    /// Name understood by `--cookies-from-browser`
    pub fn name(self) -> &'static str {
        match self {
            Browser::Chrome => "chrome",
            Browser::Safari => "safari",
            Browser::Firefox => "firefox",
        }
    }

    /// Well-known profile directories, Linux and macOS layouts
    pub fn profile_dirs(self, home: &Path) -> Vec<PathBuf> {
        let rel: &[&str] = match self {
            Browser::Chrome => &[
                ".config/google-chrome",
                "Library/Application Support/Google/Chrome",
            ],
            Browser::Safari => &["Library/Cookies"],
            Browser::Firefox => &[".mozilla/firefox", "Library/Application Support/Firefox"],
        };
        rel.iter().map(|p| home.join(p)).collect()
    }
}

impl Display for Browser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One way of authenticating a download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMethod {
    CookiesFile(PathBuf),
    Browser(Browser),
}

impl Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMethod::CookiesFile(path) => write!(f, "cookies file {}", path.display()),
            AuthMethod::Browser(browser) => write!(f, "{browser} cookies"),
        }
    }
}

/// Authorization material found at the start of a run
#[derive(Debug, Clone)]
pub struct Authority {
    cookies_file: Option<PathBuf>,
    browsers: Vec<Browser>,
}

impl Authority {
    /// Look for a cookies file, then for a browser profile.
    ///
    /// Returns [`Error::MissingCredentials`] if none of them exists.
    pub fn discover(cookies_file: &Path, home: Option<&Path>, browsers: &[Browser]) -> Result<Self> {
        let authority = Self {
            cookies_file: cookies_file.is_file().then(|| cookies_file.to_path_buf()),
            browsers: browsers.to_vec(),
        };

        if let Some(path) = &authority.cookies_file {
            info!("Using cookies file: {}", path.display());
            return Ok(authority);
        }
        debug!("No cookies file at {}", cookies_file.display());

        let profile = home.and_then(|home| {
            browsers
                .iter()
                .flat_map(|b| b.profile_dirs(home))
                .find(|dir| dir.exists())
        });

        match profile {
            Some(dir) => {
                info!("Using browser cookies (found {})", dir.display());
                Ok(authority)
            }
            None => Err(Error::MissingCredentials),
        }
    }

    /// Methods to try for each download, in order.
    ///
    /// Browsers are always listed, even those whose profile was not found:
    /// yt-dlp knows better where to look than we do.
    pub fn strategies(&self) -> Vec<AuthMethod> {
        self.cookies_file
            .iter()
            .cloned()
            .map(AuthMethod::CookiesFile)
            .chain(self.browsers.iter().copied().map(AuthMethod::Browser))
            .collect()
    }
}
