//! Rendered-HTML acquisition
//!
//! [`HtmlAcquirer`] is the only thing the pipeline knows about browsers.
//! [`DevtoolsAcquirer`] implements it with a visible browser, the devtools
//! copy sequence and a fresh session per attempt.

use crate::browser::automation::copy_rendered_html;
use crate::browser::desktop::Desktop;
use crate::browser::resolver::DriverResolver;
use crate::browser::session::{ChromiumLauncher, PageSession, SessionLauncher};
use crate::config::{AutomationConfig, BrowserConfig, ScrapeConfig};
use crate::error::{ExtractionError, NavigationError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Source of rendered HTML for a URL
#[async_trait(?Send)]
pub trait HtmlAcquirer {
    /// Return the client-rendered markup of `url`
    async fn acquire(&mut self, url: &str) -> Result<String>;
}

/// Acquires HTML by copying it out of the browser's developer tools
pub struct DevtoolsAcquirer<L = ChromiumLauncher> {
    browser: BrowserConfig,
    automation: AutomationConfig,
    resolver: DriverResolver,
    executable: Option<PathBuf>,
    desktop: Box<dyn Desktop>,
    launcher: L,
}

impl DevtoolsAcquirer {
    /// Create an acquirer driving `desktop` and a real browser
    pub fn new(config: &ScrapeConfig, desktop: Box<dyn Desktop>) -> Self {
        Self::with_launcher(config, desktop, ChromiumLauncher)
    }
}

impl<L: SessionLauncher> DevtoolsAcquirer<L> {
    /// Create an acquirer that starts its sessions through `launcher`
    pub fn with_launcher(config: &ScrapeConfig, desktop: Box<dyn Desktop>, launcher: L) -> Self {
        Self {
            browser: config.browser.clone(),
            automation: config.automation.clone(),
            resolver: DriverResolver::new(config.browser.driver_manager.clone()),
            executable: config.browser.executable.clone(),
            desktop,
            launcher,
        }
    }

    /// Browser executable, resolved on first use and reused afterwards
    async fn executable(&mut self) -> Result<PathBuf> {
        if let Some(path) = &self.executable {
            return Ok(path.clone());
        }
        let resolved = self
            .resolver
            .resolve(&self.browser.name, self.browser.version.as_deref())
            .await?;
        self.executable = Some(resolved.browser.clone());
        Ok(resolved.browser)
    }

    /// One extraction attempt with a fresh browser.
    ///
    /// The browser is quit whether the attempt succeeds, fails or times out.
    /// The attempt timeout can only fire at an await point: the [`Desktop`]
    /// calls are synchronous, so a backend that blocks inside one of them is
    /// not interrupted.
    #[instrument(skip(self))]
    pub async fn extract(&mut self, url: &str, page_load: Duration) -> Result<String> {
        let executable = self.executable().await?;
        let mut session = self.launcher.launch(&self.browser, &executable).await?;

        let budget_ms = self.automation.attempt_timeout_ms;
        let outcome = tokio::time::timeout(
            Duration::from_millis(budget_ms),
            drive(
                &mut session,
                url,
                page_load,
                &self.browser,
                &self.automation,
                self.desktop.as_mut(),
            ),
        )
        .await
        .unwrap_or_else(|_| Err(ExtractionError::Timeout(budget_ms).into()));

        session.quit().await;
        outcome
    }
}

async fn drive<S: PageSession>(
    session: &mut S,
    url: &str,
    page_load: Duration,
    browser: &BrowserConfig,
    automation: &AutomationConfig,
    desktop: &mut dyn Desktop,
) -> Result<String> {
    session.open(url, browser.navigation_timeout_ms).await?;

    info!("Waiting {:?} for client-side rendering", page_load);
    tokio::time::sleep(page_load).await;

    if let Err(e) = session.dismiss_cookie_banner().await {
        warn!("Cookie banner keystrokes failed: {}", e);
    }

    copy_rendered_html(desktop, automation).await
}

/// Reject URLs a browser cannot be pointed at
pub fn check_url(url: &str) -> Result<()> {
    let parsed =
        url::Url::parse(url).map_err(|e| NavigationError::InvalidUrl(format!("{url}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" | "file" => Ok(()),
        other => Err(NavigationError::InvalidUrl(format!("unsupported scheme {other:?} in {url}")).into()),
    }
}

#[async_trait(?Send)]
impl<L: SessionLauncher> HtmlAcquirer for DevtoolsAcquirer<L> {
    async fn acquire(&mut self, url: &str) -> Result<String> {
        check_url(url)?;

        let attempts = self.automation.max_attempts.max(1);
        let page_load = self.browser.page_load();
        let mut attempt = 1;
        loop {
            match self.extract(url, page_load).await {
                Ok(html) => return Ok(html),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    warn!("Extraction attempt {} of {} failed: {}", attempt, attempts, e);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
