//! Driver and browser binary discovery
//!
//! Shells out to a driver manager (`selenium-manager` by default) and reads
//! the two paths it reports. The manager downloads the requested browser
//! version when it is not installed.

use crate::error::{ResolutionError, Result};
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

const DRIVER_PREFIX: &str = "INFO\tDriver path:";
const BROWSER_PREFIX: &str = "INFO\tBrowser path:";

/// Paths reported by the driver manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBinaries {
    /// WebDriver binary
    pub driver: PathBuf,
    /// Browser executable
    pub browser: PathBuf,
}

/// Runs the driver manager for one browser
#[derive(Debug, Clone)]
pub struct DriverResolver {
    program: String,
}

impl DriverResolver {
    /// Use `program` as the driver manager
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Resolve driver and browser paths for `browser`, optionally pinned to `version`
    #[instrument(skip(self))]
    pub async fn resolve(&self, browser: &str, version: Option<&str>) -> Result<ResolvedBinaries> {
        info!("Resolving {} driver via {}", browser, self.program);

        let mut cmd = Command::new(&self.program);
        cmd.arg("--browser").arg(browser);
        if let Some(version) = version {
            cmd.arg("--browser-version").arg(version);
        }

        let output = cmd
            .output()
            .await
            .map_err(|e| ResolutionError::ManagerUnavailable {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            warn!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let resolved = Self::parse_output(browser, &stdout)?;
        info!(
            "Driver path: {}, browser path: {}",
            resolved.driver.display(),
            resolved.browser.display()
        );
        Ok(resolved)
    }

    /// Pick the driver and browser path lines out of manager output
    pub fn parse_output(browser: &str, stdout: &str) -> Result<ResolvedBinaries> {
        let find = |prefix: &str| {
            stdout
                .lines()
                .find_map(|line| line.strip_prefix(prefix))
                .map(str::trim)
                .filter(|path| !path.is_empty())
                .map(PathBuf::from)
        };

        let driver =
            find(DRIVER_PREFIX).ok_or_else(|| ResolutionError::DriverNotFound(browser.into()))?;
        let browser_path =
            find(BROWSER_PREFIX).ok_or_else(|| ResolutionError::BrowserNotFound(browser.into()))?;
        debug!("Parsed manager output for {}", browser);

        Ok(ResolvedBinaries {
            driver,
            browser: browser_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    const OUTPUT: &str = "DEBUG\tSensitive data\n\
        INFO\tDriver path: /home/u/.cache/selenium/chromedriver/linux64/116.0.5845.96/chromedriver\n\
        INFO\tBrowser path: /home/u/.cache/selenium/chrome/linux64/116.0.5845.96/chrome\n";

    #[test]
    fn test_parse_both_paths() {
        let resolved = DriverResolver::parse_output("chrome", OUTPUT).unwrap();
        assert!(resolved.driver.ends_with("chromedriver"));
        assert!(resolved.browser.ends_with("116.0.5845.96/chrome"));
    }

    #[test]
    fn test_parse_keeps_windows_drive_colon() {
        let out = "INFO\tDriver path: C:\\drivers\\chromedriver.exe\r\n\
                   INFO\tBrowser path: C:\\Chrome\\chrome.exe\r\n";
        let resolved = DriverResolver::parse_output("chrome", out).unwrap();
        assert_eq!(resolved.driver, PathBuf::from("C:\\drivers\\chromedriver.exe"));
        assert_eq!(resolved.browser, PathBuf::from("C:\\Chrome\\chrome.exe"));
    }

    #[test]
    fn test_missing_driver_line() {
        let err = DriverResolver::parse_output("chrome", "INFO\tBrowser path: /bin/chrome").unwrap_err();
        assert!(matches!(
            err,
            Error::Resolution(ResolutionError::DriverNotFound(ref b)) if b == "chrome"
        ));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_missing_browser_line() {
        let err = DriverResolver::parse_output("firefox", "INFO\tDriver path: /bin/geckodriver")
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Resolution(ResolutionError::BrowserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_manager_binary() {
        let resolver = DriverResolver::new("react-scrape-no-such-manager");
        let err = resolver.resolve("chrome", None).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Resolution(ResolutionError::ManagerUnavailable { .. })
        ));
    }
}
