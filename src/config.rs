//! Process-wide configuration
//!
//! [`ScrapeConfig`] is built once at startup (defaults, then an optional TOML
//! file, then CLI overrides) and handed by reference to each component.

use crate::error::{Error, Result};
use crate::extraction::SelectorSpec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Top-level configuration for a scrape run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Artifact directories
    pub storage: StorageConfig,
    /// Browser launch and resolution
    pub browser: BrowserConfig,
    /// Devtools copy sequence layout and timing
    pub automation: AutomationConfig,
    /// Which DOM nodes survive conversion
    pub selector: SelectorSpec,
    /// Only process the first N URLs of the list
    pub urls_limit: Option<usize>,
}

impl ScrapeConfig {
    /// Load from a TOML file, or fall back to defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("No config file given, using defaults");
            return Ok(Self::default());
        };

        info!("Loading config from {}", path.display());
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml(&raw)
    }

    /// Parse a TOML document
    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Reject settings that would fail every page the same way
    pub fn validate(&self) -> Result<()> {
        if self.automation.max_attempts == 0 {
            return Err(Error::config("automation.max_attempts must be at least 1"));
        }
        if self.automation.attempt_timeout_ms == 0 {
            return Err(Error::config("automation.attempt_timeout_ms must be positive"));
        }
        if self.browser.name.trim().is_empty() {
            return Err(Error::config("browser.name must not be empty"));
        }
        if self.storage.html_dir == self.storage.text_dir {
            return Err(Error::config(format!(
                "storage.html_dir and storage.text_dir are both {}",
                self.storage.html_dir.display()
            )));
        }
        self.selector.validate()?;
        Ok(())
    }
}

/// Where artifacts live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for rendered HTML (`.html`)
    pub html_dir: PathBuf,
    /// Directory for extracted text (`.txt`)
    pub text_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            html_dir: PathBuf::from("data/html_files"),
            text_dir: PathBuf::from("data/txt_files"),
        }
    }
}

/// Configuration for browser launch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Browser name passed to the driver manager (default: chrome)
    pub name: String,
    /// Pinned browser version (None = whatever the manager picks)
    pub version: Option<String>,
    /// Browser executable; skips resolution when set
    pub executable: Option<PathBuf>,
    /// Driver manager program (default: selenium-manager)
    pub driver_manager: String,
    /// Fixed wait after navigation for client-side rendering (default: 10000)
    pub page_load_ms: u64,
    /// Navigation timeout in milliseconds (default: 30000)
    pub navigation_timeout_ms: u64,
    /// Additional browser arguments
    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            name: "chrome".to_string(),
            version: None,
            executable: None,
            driver_manager: "selenium-manager".to_string(),
            page_load_ms: 10_000,
            navigation_timeout_ms: 30_000,
            extra_args: Vec::new(),
        }
    }
}

impl BrowserConfig {
    /// Create a new config builder
    pub fn builder() -> BrowserConfigBuilder {
        BrowserConfigBuilder::default()
    }

    /// Page-load settle wait
    pub fn page_load(&self) -> Duration {
        Duration::from_millis(self.page_load_ms)
    }
}

/// Builder for BrowserConfig
#[derive(Default)]
pub struct BrowserConfigBuilder {
    config: BrowserConfig,
}

impl BrowserConfigBuilder {
    /// Set browser name
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.config.name = name.into();
        self
    }

    /// Pin a browser version
    pub fn version<S: Into<String>>(mut self, version: S) -> Self {
        self.config.version = Some(version.into());
        self
    }

    /// Use this executable instead of resolving one
    pub fn executable<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.executable = Some(path.into());
        self
    }

    /// Set driver manager program
    pub fn driver_manager<S: Into<String>>(mut self, program: S) -> Self {
        self.config.driver_manager = program.into();
        self
    }

    /// Set page-load wait
    pub fn page_load_ms(mut self, ms: u64) -> Self {
        self.config.page_load_ms = ms;
        self
    }

    /// Set navigation timeout
    pub fn navigation_timeout_ms(mut self, ms: u64) -> Self {
        self.config.navigation_timeout_ms = ms;
        self
    }

    /// Add extra browser argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.config.extra_args.push(arg.into());
        self
    }

    /// Build the config
    pub fn build(self) -> BrowserConfig {
        self.config
    }
}

/// Absolute screen position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenPoint {
    /// Horizontal pixel
    pub x: i32,
    /// Vertical pixel
    pub y: i32,
}

/// Layout and timing of the devtools copy sequence.
///
/// The defaults match one browser version on a maximized 1920x1080 window with
/// devtools docked right; other layouts need their own values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Where to right-click inside the devtools elements panel
    pub context_click: ScreenPoint,
    /// Entries to descend in the context menu before opening the submenu
    pub menu_steps: u32,
    /// Entries to descend inside the submenu before activating
    pub submenu_steps: u32,
    /// Settle delay after devtools open and after the copy
    pub settle_ms: u64,
    /// Wall-clock budget for one attempt, navigation included
    pub attempt_timeout_ms: u64,
    /// Attempts per URL, each with a fresh browser
    pub max_attempts: u32,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            context_click: ScreenPoint { x: 1500, y: 240 },
            menu_steps: 6,
            submenu_steps: 1,
            settle_ms: 2_000,
            attempt_timeout_ms: 120_000,
            max_attempts: 3,
        }
    }
}

impl AutomationConfig {
    /// Settle delay as a duration
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = ScrapeConfig::default();
        assert_eq!(config.browser.name, "chrome");
        assert_eq!(config.browser.driver_manager, "selenium-manager");
        assert_eq!(config.automation.menu_steps, 6);
        assert_eq!(config.automation.submenu_steps, 1);
        assert_eq!(config.automation.max_attempts, 3);
        assert!(config.urls_limit.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_browser_config_builder() {
        let config = BrowserConfig::builder()
            .name("firefox")
            .version("116")
            .executable("/opt/chrome/chrome")
            .page_load_ms(500)
            .navigation_timeout_ms(60000)
            .arg("--disable-gpu")
            .build();

        assert_eq!(config.name, "firefox");
        assert_eq!(config.version.as_deref(), Some("116"));
        assert_eq!(config.executable, Some(PathBuf::from("/opt/chrome/chrome")));
        assert_eq!(config.page_load(), Duration::from_millis(500));
        assert_eq!(config.navigation_timeout_ms, 60000);
        assert_eq!(config.extra_args, vec!["--disable-gpu"]);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ScrapeConfig::from_toml(
            r#"
            urls_limit = 5

            [storage]
            html_dir = "out/html"

            [automation]
            context_click = { x = 10, y = 20 }
            settle_ms = 0

            [selector]
            tag = "article"
            attributes = { class = "post" }
            "#,
        )
        .unwrap();

        assert_eq!(config.urls_limit, Some(5));
        assert_eq!(config.storage.html_dir, PathBuf::from("out/html"));
        assert_eq!(config.storage.text_dir, PathBuf::from("data/txt_files"));
        assert_eq!(config.automation.context_click, ScreenPoint { x: 10, y: 20 });
        assert_eq!(config.automation.settle(), Duration::ZERO);
        assert_eq!(config.automation.menu_steps, 6);
        assert_eq!(config.selector.tag.as_deref(), Some("article"));
        assert_eq!(config.selector.attributes.get("class").unwrap(), "post");
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = ScrapeConfig::from_toml("urls_limit = \"many\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = ScrapeConfig::default();
        config.automation.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_shared_directory() {
        let mut config = ScrapeConfig::default();
        config.storage.text_dir = config.storage.html_dir.clone();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("both"));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = ScrapeConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.is_fatal());
    }
}
