use crate::manager::{AcquireOptions, AcquisitionManager, AcquisitionReport, ArchivePeriod, SourceOutcome};
use clap::{Args, ValueEnum};
use mise_core::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Search API, archive, feed and page scraping
    All,
    /// Page scraping only
    Web,
    /// Search API, archive and feed only
    Api,
}

#[derive(Args, Debug, Clone)]
pub struct AcquireArgs {
    /// Which group of sources to start from
    #[arg(long, value_enum, default_value_t = Preset::All)]
    pub preset: Preset,

    /// Listing pages for page scraping, and result pages for the search API
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Cap on guides taken from the guides page
    #[arg(long)]
    pub max_articles: Option<usize>,

    #[arg(long)]
    pub skip_search: bool,

    #[arg(long)]
    pub skip_archive: bool,

    #[arg(long)]
    pub skip_rss: bool,

    #[arg(long)]
    pub skip_web: bool,

    /// Archive month as YYYY-MM (defaults to the current month)
    #[arg(long, value_parser = parse_period)]
    pub archive: Option<ArchivePeriod>,

    /// Feed section to fetch
    #[arg(long)]
    pub rss_section: Option<String>,

    /// Also pull news from the last N days through the search API
    #[arg(long)]
    pub recent_days: Option<u32>,
}

impl AcquireArgs {
    pub fn into_options(self) -> AcquireOptions {
        let mut options = match self.preset {
            Preset::All => AcquireOptions::all(),
            Preset::Web => AcquireOptions::web_only(),
            Preset::Api => AcquireOptions::api_only(),
        };

        if let Some(max_pages) = self.max_pages {
            options.max_pages = max_pages;
        }
        if let Some(max_articles) = self.max_articles {
            options.max_articles = max_articles;
        }
        options.include_search &= !self.skip_search;
        options.include_archive &= !self.skip_archive;
        options.include_rss &= !self.skip_rss;
        options.include_web &= !self.skip_web;
        options.archive_period = self.archive;
        if let Some(section) = self.rss_section {
            options.rss_section = section;
        }
        options.recent_days = self.recent_days;
        options
    }
}

fn parse_period(value: &str) -> std::result::Result<ArchivePeriod, String> {
    let (year, month) = value
        .split_once('-')
        .ok_or_else(|| format!("expected YYYY-MM, got '{}'", value))?;
    let year = year.parse::<i32>().map_err(|e| format!("bad year '{}': {}", year, e))?;
    let month = month.parse::<u32>().map_err(|e| format!("bad month '{}': {}", month, e))?;
    if !(1..=12).contains(&month) {
        return Err(format!("month must be 1-12, got {}", month));
    }
    Ok(ArchivePeriod { year, month })
}

/// Run one pass in the foreground and print a per-source summary.
pub async fn handle_acquire(args: AcquireArgs, manager: &AcquisitionManager) -> Result<AcquisitionReport> {
    let options = args.into_options();
    let report = manager.acquire_all(&options).await;

    for (kind, outcome) in &report.outcomes {
        let line = match outcome {
            SourceOutcome::Completed { items } => format!("✅ {} items", items),
            SourceOutcome::FeedFetched { bytes } => format!("📡 {} bytes", bytes),
            SourceOutcome::Skipped { reason } => format!("⏭️  skipped: {}", reason),
            SourceOutcome::Failed { error } => format!("❌ failed: {}", error),
        };
        println!("{:<18} {}", kind.as_str(), line);
    }
    println!("Saved {} records ({} failed to save)", report.total_items(), report.persist_failures);

    Ok(report)
}
