//! react-scrape CLI
//!
//! Captures rendered HTML for a list of URLs and converts it to text.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use react_scrape::browser::{native_desktop, DevtoolsAcquirer, DriverResolver};
use react_scrape::{urls, ArtifactStore, BatchReport, Pipeline, ScrapeConfig, SelectorSpec};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Rendered-HTML scraper for client-side rendered pages
#[derive(Parser, Debug)]
#[command(name = "react-scrape")]
#[command(version)]
#[command(about = "Capture rendered HTML with a real browser and extract text from it")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true, env = "REACT_SCRAPE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Acquire missing HTML and convert missing text for every URL
    Run {
        /// Newline-delimited URL list
        #[arg(short, long, default_value = "urls.txt")]
        urls: PathBuf,

        /// Only process the first N URLs
        #[arg(short, long)]
        limit: Option<usize>,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Convert cached HTML that has no text yet; no browser is started
    Convert {
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Resolve driver and browser binaries and print their paths
    Resolve {
        /// Browser name (overrides config)
        #[arg(long)]
        browser: Option<String>,

        /// Browser version (overrides config)
        #[arg(long)]
        browser_version: Option<String>,
    },
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Element tag to extract; replaces the configured selector
    #[arg(long)]
    tag: Option<String>,

    /// Attribute predicate `name=value`, repeatable; replaces the configured selector
    #[arg(long = "attr", value_parser = SelectorSpec::parse_attr)]
    attrs: Vec<(String, String)>,

    /// Directory for rendered HTML
    #[arg(long)]
    html_dir: Option<PathBuf>,

    /// Directory for extracted text
    #[arg(long)]
    text_dir: Option<PathBuf>,

    /// Print the batch report as JSON
    #[arg(long)]
    json: bool,
}

impl OutputArgs {
    fn apply(&self, config: &mut ScrapeConfig) {
        if let Some(dir) = &self.html_dir {
            config.storage.html_dir = dir.clone();
        }
        if let Some(dir) = &self.text_dir {
            config.storage.text_dir = dir.clone();
        }
        if self.tag.is_some() || !self.attrs.is_empty() {
            let base = match &self.tag {
                Some(tag) => SelectorSpec::tag(tag.as_str()),
                None => SelectorSpec::any(),
            };
            config.selector = self
                .attrs
                .iter()
                .fold(base, |spec, (name, value)| spec.with_attr(name.as_str(), value.as_str()));
        }
    }
}

fn print_report(report: &BatchReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", report);
        for failure in report
            .acquisition_failures
            .iter()
            .chain(&report.conversion_failures)
        {
            println!("  failed  {}: {}", failure.target, failure.error);
        }
        for id in &report.empty_outputs {
            println!("  empty   {}", id);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    let mut config = ScrapeConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Run {
            urls: url_file,
            limit,
            output,
        } => {
            output.apply(&mut config);
            if limit.is_some() {
                config.urls_limit = limit;
            }
            config.validate()?;

            let urls = urls::load_urls(&url_file, config.urls_limit)?;
            let store = ArtifactStore::new(&config.storage)?;
            let acquirer = DevtoolsAcquirer::new(&config, native_desktop()?);

            tracing::info!("{} v{} processing {} URLs", react_scrape::NAME, react_scrape::VERSION, urls.len());
            let mut pipeline = Pipeline::new(store, acquirer);
            let report = pipeline
                .run(&urls, &config.selector)
                .await
                .context("batch aborted")?;
            print_report(&report, output.json)?;
        }
        Command::Convert { output } => {
            output.apply(&mut config);
            config.validate()?;

            let store = ArtifactStore::new(&config.storage)?;
            let report = react_scrape::pipeline::convert_all(&store, &config.selector)
                .context("conversion aborted")?;
            print_report(&report, output.json)?;
        }
        Command::Resolve {
            browser,
            browser_version,
        } => {
            let name = browser.unwrap_or(config.browser.name);
            let version = browser_version.or(config.browser.version);
            let resolved = DriverResolver::new(config.browser.driver_manager)
                .resolve(&name, version.as_deref())
                .await?;
            println!("driver  {}", resolved.driver.display());
            println!("browser {}", resolved.browser.display());
        }
    }

    Ok(())
}
