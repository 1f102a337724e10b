//! Chromium process launcher.
//!
//! Each launch starts an isolated browser (own temporary profile, own
//! DevTools port) and returns a [`CdpPage`] attached to a fresh page target.
//!
//! # Example
//!
//! ```no_run
//! use court_reserver::{AgentLauncher, ChromeLauncher, WorkerId};
//!
//! # async fn example() -> court_reserver::Result<()> {
//! let launcher = ChromeLauncher::builder().build()?;
//! launcher.preflight().await?;
//!
//! let agent = launcher.launch(WorkerId::new(0), true).await?;
//! agent.navigate("https://example.com").await?;
//! agent.close().await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, Command};
use tokio::time::timeout;
use tracing::{debug, info, trace};

use crate::error::{Error, Result};
use crate::identifiers::WorkerId;
use crate::transport::Connection;

use super::agent::{AgentLauncher, BrowserAgent};
use super::options::ChromeOptions;
use super::page::{CdpPage, ProcessGuard};

// ============================================================================
// Constants
// ============================================================================

/// Time allowed for the browser to print its DevTools endpoint.
const STARTUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Arguments passed to every launched browser.
const BASE_ARGS: &[&str] = &[
    "--remote-debugging-port=0",
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-popup-blocking",
];

/// Matches the endpoint line printed on stderr at startup.
static DEVTOOLS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"DevTools listening on (?P<url>ws://\S+)").expect("static endpoint pattern")
});

// ============================================================================
// Discovery
// ============================================================================

/// Locates a Chromium-family executable on this machine.
#[must_use]
pub fn find_browser() -> Option<PathBuf> {
    let candidates: &[&str] = if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
        ]
    } else if cfg!(target_os = "windows") {
        &["chrome", "chrome.exe", "msedge", "msedge.exe"]
    } else {
        &[
            "google-chrome-stable",
            "google-chrome",
            "chromium-browser",
            "chromium",
            "microsoft-edge",
            "/snap/bin/chromium",
        ]
    };

    candidates.iter().find_map(|candidate| {
        let path = Path::new(candidate);
        if path.is_absolute() {
            path.exists().then(|| path.to_path_buf())
        } else {
            which::which(candidate).ok()
        }
    })
}

// ============================================================================
// ChromeLauncherBuilder
// ============================================================================

/// Builder for [`ChromeLauncher`].
#[derive(Debug, Default, Clone)]
pub struct ChromeLauncherBuilder {
    /// Explicit browser binary.
    binary: Option<PathBuf>,
    /// Process options.
    options: ChromeOptions,
}

impl ChromeLauncherBuilder {
    /// Creates a builder using auto-discovery and default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the browser binary instead of discovering one.
    #[inline]
    #[must_use]
    pub fn binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary = Some(path.into());
        self
    }

    /// Sets the browser process options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ChromeOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the launcher.
    ///
    /// # Errors
    ///
    /// - [`Error::BrowserNotFound`] if no binary is set and none is found
    /// - [`Error::Config`] if the options are invalid
    pub fn build(self) -> Result<ChromeLauncher> {
        self.options.validate().map_err(Error::config)?;

        let binary = match self.binary {
            Some(path) => path,
            None => find_browser().ok_or_else(|| Error::browser_not_found("chromium"))?,
        };

        debug!(binary = %binary.display(), "Browser binary selected");

        Ok(ChromeLauncher {
            binary,
            options: self.options,
        })
    }
}

// ============================================================================
// ChromeLauncher
// ============================================================================

/// Launches one Chromium process per reservation worker.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    /// Browser executable.
    binary: PathBuf,
    /// Options applied to every launch.
    options: ChromeOptions,
}

impl ChromeLauncher {
    /// Creates a launcher builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ChromeLauncherBuilder {
        ChromeLauncherBuilder::new()
    }

    /// Returns the browser executable.
    #[inline]
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Builds the full argument list for one launch.
    fn launch_args(&self, profile: &Path, headless: bool) -> Vec<String> {
        let mut options = self.options.clone();
        if headless {
            options = options.with_headless();
        }

        let mut args: Vec<String> = BASE_ARGS.iter().map(|a| (*a).to_string()).collect();
        args.push(format!("--user-data-dir={}", profile.display()));
        args.extend(options.to_args());
        args.push("about:blank".to_string());
        args
    }

    /// Resolves the binary the same way the OS would.
    fn resolve_binary(&self) -> Result<PathBuf> {
        if self.binary.exists() {
            return Ok(self.binary.clone());
        }
        which::which(&self.binary).map_err(|_| Error::browser_not_found(&self.binary))
    }
}

#[async_trait]
impl AgentLauncher for ChromeLauncher {
    async fn preflight(&self) -> Result<()> {
        let binary = self.resolve_binary()?;
        self.options.validate().map_err(Error::config)?;
        info!(binary = %binary.display(), "Browser available");
        Ok(())
    }

    async fn launch(&self, worker: WorkerId, headless: bool) -> Result<Arc<dyn BrowserAgent>> {
        let profile = tempfile::Builder::new()
            .prefix("court-reserver-")
            .tempdir()?;

        let mut command = Command::new(&self.binary);
        command
            .args(self.launch_args(profile.path(), headless))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|e| Error::process_launch_failed(e.to_string()))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::process_launch_failed("stderr was not captured"))?;

        let process = ProcessGuard::new(child);
        info!(%worker, pid = process.pid(), "Browser process spawned");

        let ws_url = timeout(STARTUP_TIMEOUT, read_devtools_url(stderr))
            .await
            .map_err(|_| Error::connection_timeout(STARTUP_TIMEOUT.as_millis() as u64))??;

        let connection = Connection::connect(&ws_url).await?;
        let page = CdpPage::attach(worker, connection, process, profile).await?;

        Ok(Arc::new(page))
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Reads stderr until the DevTools endpoint appears.
///
/// The rest of stderr is drained in the background so the browser never
/// blocks on a full pipe.
async fn read_devtools_url(stderr: ChildStderr) -> Result<String> {
    let mut lines = BufReader::new(stderr).lines();

    while let Some(line) = lines.next_line().await? {
        trace!(line = %line, "browser stderr");

        if let Some(url) = parse_devtools_line(&line) {
            tokio::spawn(async move {
                while let Ok(Some(line)) = lines.next_line().await {
                    trace!(line = %line, "browser stderr");
                }
            });
            return Ok(url);
        }
    }

    Err(Error::process_launch_failed(
        "browser exited before exposing a DevTools endpoint",
    ))
}

/// Extracts the endpoint URL from one stderr line.
fn parse_devtools_line(line: &str) -> Option<String> {
    DEVTOOLS_LINE
        .captures(line)
        .and_then(|c| c.name("url"))
        .map(|m| m.as_str().to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_devtools_line() {
        let line = "DevTools listening on ws://127.0.0.1:41233/devtools/browser/0c1d-77";
        assert_eq!(
            parse_devtools_line(line).as_deref(),
            Some("ws://127.0.0.1:41233/devtools/browser/0c1d-77")
        );
        assert!(parse_devtools_line("[WARNING] GPU process crashed").is_none());
    }

    #[test]
    fn test_launch_args_headless() {
        let launcher = ChromeLauncher::builder()
            .binary("/opt/chrome/chrome")
            .options(ChromeOptions::new().with_window_size(1280, 900))
            .build()
            .expect("builds");

        let args = launcher.launch_args(Path::new("/tmp/p"), true);
        assert_eq!(args[0], "--remote-debugging-port=0");
        assert!(args.contains(&"--user-data-dir=/tmp/p".to_string()));
        assert!(args.contains(&"--headless=new".to_string()));
        assert!(args.contains(&"--window-size=1280,900".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("about:blank"));

        let visible = launcher.launch_args(Path::new("/tmp/p"), false);
        assert!(!visible.contains(&"--headless=new".to_string()));
    }

    #[test]
    fn test_build_rejects_invalid_options() {
        let result = ChromeLauncher::builder()
            .binary("/opt/chrome/chrome")
            .options(ChromeOptions::new().with_window_size(0, 0))
            .build();
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[tokio::test]
    async fn test_preflight_missing_binary_is_fatal() {
        let launcher = ChromeLauncher::builder()
            .binary("/nonexistent/court-reserver/chrome")
            .build()
            .expect("builds");

        let err = launcher.preflight().await.expect_err("missing binary");
        assert!(err.is_fatal());
    }
}
