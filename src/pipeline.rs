//! Batch orchestration
//!
//! For every URL the pipeline checks the artifact store, acquires rendered
//! HTML when it is missing, and, when the page's text is missing, runs a
//! catch-up conversion over every cached HTML artifact that has no text yet.
//! Per-page failures are recorded in the [`BatchReport`]; only fatal errors
//! stop the batch.

use crate::browser::HtmlAcquirer;
use crate::error::{Error, Result};
use crate::extraction::{SelectorSpec, TextConverter};
use crate::store::{ArtifactStore, ContentKind, PageId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, info, instrument, warn};

/// A page that failed without stopping the batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFailure {
    /// URL or page id the failure belongs to
    pub target: String,
    /// Rendered error
    pub error: String,
}

impl PageFailure {
    fn new(target: impl fmt::Display, error: &Error) -> Self {
        Self {
            target: target.to_string(),
            error: error.to_string(),
        }
    }
}

/// What a run did
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: Option<DateTime<Utc>>,
    /// URLs taken from the list
    pub urls_seen: usize,
    /// URLs with both artifacts already present
    pub already_complete: usize,
    /// Pages whose HTML was acquired this run
    pub acquired: Vec<PageId>,
    /// Pages whose text was written this run
    pub converted: Vec<PageId>,
    /// Pages whose text came out empty; complete but worth a look
    pub empty_outputs: Vec<PageId>,
    /// URLs that could not be acquired
    pub acquisition_failures: Vec<PageFailure>,
    /// HTML artifacts that could not be converted
    pub conversion_failures: Vec<PageFailure>,
}

impl BatchReport {
    /// Empty report stamped with the current time
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            ..Self::default()
        }
    }

    fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    /// Total per-page failures
    pub fn failure_count(&self) -> usize {
        self.acquisition_failures.len() + self.conversion_failures.len()
    }

    fn conversion_failed(&self, id: &PageId) -> bool {
        self.conversion_failures
            .iter()
            .any(|f| f.target == id.as_str())
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} urls, {} already complete, {} acquired, {} converted ({} empty), {} failed",
            self.urls_seen,
            self.already_complete,
            self.acquired.len(),
            self.converted.len(),
            self.empty_outputs.len(),
            self.failure_count()
        )
    }
}

/// Acquire-then-convert over a URL list
pub struct Pipeline<A> {
    store: ArtifactStore,
    converter: TextConverter,
    acquirer: A,
}

impl<A: HtmlAcquirer> Pipeline<A> {
    /// Create a pipeline over `store` using `acquirer` for missing HTML
    pub fn new(store: ArtifactStore, acquirer: A) -> Self {
        Self {
            store,
            converter: TextConverter::new(),
            acquirer,
        }
    }

    /// The artifact store
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// The acquirer
    pub fn acquirer(&self) -> &A {
        &self.acquirer
    }

    /// Process `urls` in order, converting with `selector`.
    ///
    /// Returns `Err` only for fatal errors; everything else is in the report.
    #[instrument(skip(self, urls), fields(urls = urls.len(), %selector))]
    pub async fn run(&mut self, urls: &[String], selector: &SelectorSpec) -> Result<BatchReport> {
        selector.validate()?;
        let mut report = BatchReport::start();

        for url in urls {
            report.urls_seen += 1;
            self.process_url(url, selector, &mut report).await?;
        }

        let report = report.finish();
        info!("Batch finished: {}", report);
        Ok(report)
    }

    async fn process_url(
        &mut self,
        url: &str,
        selector: &SelectorSpec,
        report: &mut BatchReport,
    ) -> Result<()> {
        let id = match PageId::from_url(url) {
            Ok(id) => id,
            Err(e) => {
                warn!("Skipping {}: {}", url, e);
                report.acquisition_failures.push(PageFailure::new(url, &e));
                return Ok(());
            }
        };

        let has_html = self.store.exists(&id, ContentKind::RenderedHtml);
        let has_text = self.store.exists(&id, ContentKind::ExtractedText);
        if has_html && has_text {
            debug!("{} already complete", id);
            report.already_complete += 1;
            return Ok(());
        }

        if !has_html {
            info!("Acquiring {} as {}", url, id);
            match self.acquirer.acquire(url).await {
                Ok(html) => {
                    self.store.write(&id, ContentKind::RenderedHtml, &html)?;
                    report.acquired.push(id.clone());
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!("Acquisition failed for {}: {}", url, e);
                    report.acquisition_failures.push(PageFailure::new(url, &e));
                    return Ok(());
                }
            }
        }

        if !has_text {
            convert_pending(&self.store, &self.converter, selector, report)?;
        }
        Ok(())
    }
}

/// Convert every cached HTML artifact that has no text artifact yet.
///
/// Artifacts that already failed earlier in the same report are not retried.
#[instrument(skip_all, fields(%selector))]
pub fn convert_pending(
    store: &ArtifactStore,
    converter: &TextConverter,
    selector: &SelectorSpec,
    report: &mut BatchReport,
) -> Result<()> {
    for artifact in store.list(ContentKind::RenderedHtml)? {
        if store.exists(&artifact.id, ContentKind::ExtractedText)
            || report.conversion_failed(&artifact.id)
        {
            continue;
        }

        info!("Converting {} to text", artifact.id);
        let html = store.read(&artifact)?;
        match converter.convert(&html, selector) {
            Ok(text) => {
                converter.persist(store, &artifact.id, &text)?;
                if text.is_empty() {
                    warn!(
                        "{} produced no text for selector {}; marked complete, review manually",
                        artifact.id, selector
                    );
                    report.empty_outputs.push(artifact.id.clone());
                }
                report.converted.push(artifact.id);
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                error!("Conversion failed for {}: {}", artifact.id, e);
                report
                    .conversion_failures
                    .push(PageFailure::new(&artifact.id, &e));
            }
        }
    }
    Ok(())
}

/// Standalone catch-up conversion, no browser involved
pub fn convert_all(store: &ArtifactStore, selector: &SelectorSpec) -> Result<BatchReport> {
    selector.validate()?;
    let mut report = BatchReport::start();
    convert_pending(store, &TextConverter::new(), selector, &mut report)?;
    let report = report.finish();
    info!("Conversion finished: {}", report);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_display() {
        let mut report = BatchReport::start();
        report.urls_seen = 3;
        report.acquired.push(PageId::new("a").unwrap());
        report.conversion_failures.push(PageFailure {
            target: "b".to_string(),
            error: "boom".to_string(),
        });
        assert_eq!(
            report.to_string(),
            "3 urls, 0 already complete, 1 acquired, 0 converted (0 empty), 1 failed"
        );
        assert!(report.conversion_failed(&PageId::new("b").unwrap()));
        assert!(!report.conversion_failed(&PageId::new("a").unwrap()));
    }

    #[test]
    fn test_report_serializes() {
        let report = BatchReport::start().finish();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["finished_at"].is_string());
        assert_eq!(json["acquired"], serde_json::json!([]));
    }
}
