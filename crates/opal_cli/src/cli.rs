use std::path::PathBuf;

use clap::Parser;
use opal_core::{CaseCategory, Court, DatePeriod};

/// Scrape news articles or court records into a dated JSON file.
#[derive(Debug, Clone, Parser)]
#[command(name = "opal", version, about)]
pub struct Cli {
    /// Seed URL: a news listing page, or a court-portal results page.
    #[arg(long)]
    pub url: Option<String>,

    /// Parser to use: Parser1819, ParserDailyNews or court.
    #[arg(long)]
    pub parser: String,

    /// Only follow article links whose path contains this text.
    #[arg(long)]
    pub suffix: Option<String>,

    /// Stop after this many listing pages.
    #[arg(long = "max_pages", alias = "max-pages")]
    pub max_pages: Option<u32>,

    /// Filed-date filter for court searches: 7d, 1m, 3m, 6m, 1y or START..END.
    #[arg(long)]
    pub date: Option<DatePeriod>,

    /// Court to search: civil, criminal or supreme.
    #[arg(long)]
    pub court: Option<Court>,

    /// Portal id of the court, when it is not built in.
    #[arg(long)]
    pub court_id: Option<String>,

    #[arg(long)]
    pub case_number: Option<String>,

    #[arg(long)]
    pub case_title: Option<String>,

    /// Case category label, e.g. "Appeal".
    #[arg(long)]
    pub category: Option<CaseCategory>,

    #[arg(long)]
    pub exclude_closed: bool,

    /// DevTools endpoint of the running browser used by parsers that need one.
    #[arg(long)]
    pub browser: Option<String>,

    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// RON settings file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Requests in flight per batch.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Also write the log to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// True when any court search input was given.
    pub fn has_court_filters(&self) -> bool {
        self.date.is_some()
            || self.court.is_some()
            || self.court_id.is_some()
            || self.case_number.is_some()
            || self.case_title.is_some()
            || self.category.is_some()
            || self.exclude_closed
    }
}
