//! react-scrape - Rendered-HTML capture and text extraction for client-side rendered pages
//!
//! Pages built by client-side frameworks have no useful content in their
//! initial HTML. This crate drives a visible browser to render each page,
//! copies the live DOM out of the developer tools, caches it on disk, and
//! converts a selected region of it to plain text.
//!
//! # Features
//!
//! - **Resumable batches**: artifacts already on disk are never reprocessed
//! - **Browser Automation**: visible browser via ChromiumOxide (CDP) plus OS-level input
//! - **Text Conversion**: selector-scoped, noise-free text from cached HTML
//! - **Fault Isolation**: one bad page is reported, the batch continues
//!
//! # Architecture
//!
//! ```text
//! URL list ──▶ Pipeline ──▶ HtmlAcquirer (browser + devtools copy)
//!                 │                │
//!                 ▼                ▼
//!          ┌──────────────┐  ┌──────────────┐
//!          │ TextConverter│◀─│ArtifactStore │
//!          └──────┬───────┘  └──────┬───────┘
//!                 │                 │
//!                 ▼                 ▼
//!            <id>.txt          <id>.html
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use react_scrape::browser::{native_desktop, DevtoolsAcquirer};
//! use react_scrape::{ArtifactStore, Pipeline, ScrapeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScrapeConfig::default();
//!     let store = ArtifactStore::new(&config.storage)?;
//!     let acquirer = DevtoolsAcquirer::new(&config, native_desktop()?);
//!
//!     let mut pipeline = Pipeline::new(store, acquirer);
//!     let urls = vec!["https://example.com/pages/intro/".to_string()];
//!     let report = pipeline.run(&urls, &config.selector).await?;
//!
//!     println!("{}", report);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod browser;
pub mod config;
pub mod error;
pub mod extraction;
pub mod pipeline;
pub mod store;
pub mod urls;

// Re-exports for convenience
pub use browser::{DevtoolsAcquirer, HtmlAcquirer};
pub use config::ScrapeConfig;
pub use error::{Error, Result};
pub use extraction::{ExtractedText, SelectorSpec, TextConverter};
pub use pipeline::{BatchReport, Pipeline};
pub use store::{ArtifactStore, ContentKind, PageId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
