//! Browser lifecycle management
//!
//! A [`BrowserSession`] is one visible browser process used for exactly one
//! extraction attempt and then quit. [`SessionLauncher`] and [`PageSession`]
//! are the seam the acquirer drives sessions through.

use crate::config::BrowserConfig;
use crate::error::{Error, NavigationError, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Windows virtual key codes for the keys we send over CDP
const VK_TAB: i64 = 9;
const VK_RETURN: i64 = 13;

/// Browser arguments every session gets
const BASE_ARGS: &[&str] = &["--enable-javascript", "--start-maximized"];

/// Starts one browser session per extraction attempt
#[async_trait(?Send)]
pub trait SessionLauncher {
    /// Session type this launcher produces
    type Session: PageSession;

    /// Launch a visible browser from `executable`
    async fn launch(&self, config: &BrowserConfig, executable: &Path) -> Result<Self::Session>;
}

/// A running browser as an extraction attempt sees it
#[async_trait(?Send)]
pub trait PageSession: Sized {
    /// Open `url` and wait for the load to finish
    async fn open(&mut self, url: &str, timeout_ms: u64) -> Result<()>;

    /// Accept a cookie banner on the open page
    async fn dismiss_cookie_banner(&self) -> Result<()>;

    /// Shut the browser down. Never fails.
    async fn quit(self);
}

/// Launches Chromium-family browsers over CDP
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromiumLauncher;

#[async_trait(?Send)]
impl SessionLauncher for ChromiumLauncher {
    type Session = BrowserSession;

    async fn launch(&self, config: &BrowserConfig, executable: &Path) -> Result<BrowserSession> {
        BrowserSession::launch(config, executable).await
    }
}

/// An exclusively owned, single-use browser
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Option<Page>,
}

impl BrowserSession {
    /// Launch a visible browser from `executable`
    #[instrument(skip(config))]
    pub async fn launch(config: &BrowserConfig, executable: &Path) -> Result<Self> {
        info!("Launching {} from {}", config.name, executable.display());

        let mut builder = CdpBrowserConfig::builder()
            .with_head()
            .chrome_executable(executable)
            .viewport(None::<Viewport>);

        for arg in BASE_ARGS.iter().copied().chain(config.extra_args.iter().map(String::as_str)) {
            builder = builder.arg(arg);
        }

        let cdp_config = builder.build().map_err(NavigationError::LaunchFailed)?;

        let (browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| NavigationError::LaunchFailed(e.to_string()))?;

        // Spawn handler task
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    warn!("Browser handler event error");
                    break;
                }
            }
            debug!("Browser handler finished");
        });

        info!("Browser launched");

        Ok(Self {
            browser,
            handler: handler_task,
            page: None,
        })
    }
}

#[async_trait(?Send)]
impl PageSession for BrowserSession {
    /// Open `url` in a new tab and bring it to front
    #[instrument(skip(self))]
    async fn open(&mut self, url: &str, timeout_ms: u64) -> Result<()> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| NavigationError::LaunchFailed(e.to_string()))?;

        tokio::time::timeout(Duration::from_millis(timeout_ms), page.goto(url))
            .await
            .map_err(|_| NavigationError::Timeout(timeout_ms))?
            .map_err(|e| NavigationError::LoadFailed(e.to_string()))?;

        // Bring the tab to front so OS-level input lands in it
        page.bring_to_front().await?;
        debug!("Loaded {}", url);
        self.page = Some(page);
        Ok(())
    }

    /// Send TAB then ENTER to the page to accept a cookie banner.
    ///
    /// Best effort: a page without a banner just gets a harmless keystroke.
    #[instrument(skip(self))]
    async fn dismiss_cookie_banner(&self) -> Result<()> {
        let page = self
            .page
            .as_ref()
            .ok_or_else(|| Error::cdp("no page open"))?;
        press_key(page, "Tab", VK_TAB, None).await?;
        press_key(page, "Enter", VK_RETURN, Some("\r")).await?;
        Ok(())
    }

    /// Close the browser. Problems are logged and the process killed.
    #[instrument(skip(self))]
    async fn quit(mut self) {
        info!("Closing browser");
        self.page = None;

        match self.browser.close().await {
            Ok(_) => {
                if let Err(e) = self.browser.wait().await {
                    warn!("Waiting for browser exit failed: {}", e);
                }
            }
            Err(e) => {
                warn!("Graceful close failed ({}), killing browser", e);
                if let Some(Err(e)) = self.browser.kill().await {
                    warn!("Kill failed: {}", e);
                }
            }
        }

        // Wait for handler to finish
        if tokio::time::timeout(Duration::from_secs(5), &mut self.handler)
            .await
            .is_err()
        {
            self.handler.abort();
        }

        info!("Browser closed");
    }
}

async fn press_key(page: &Page, key: &str, code: i64, text: Option<&str>) -> Result<()> {
    let mut down = DispatchKeyEventParams::builder()
        .r#type(DispatchKeyEventType::KeyDown)
        .key(key)
        .code(key)
        .windows_virtual_key_code(code)
        .native_virtual_key_code(code);
    if let Some(text) = text {
        down = down.text(text);
    }
    page.execute(down.build().map_err(Error::cdp)?).await?;

    let up = DispatchKeyEventParams::builder()
        .r#type(DispatchKeyEventType::KeyUp)
        .key(key)
        .code(key)
        .windows_virtual_key_code(code)
        .native_virtual_key_code(code)
        .build()
        .map_err(Error::cdp)?;
    page.execute(up).await?;
    Ok(())
}
