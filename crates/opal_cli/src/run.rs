use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use opal_core::{
    is_court_url, update, BatchResultKind, Court, CourtSearch, CrawlOutcome, CrawlState, Effect,
    Msg, ResultSet,
};
use opal_engine::{
    AtomicFileWriter, BatchError, BrowserFetcher, CourtPaginator, ExtractionStrategy, Fetcher,
    ListingPaginator, Orchestrator, Paginator, ParserRegistry, ReqwestFetcher,
};
use opal_logging::{opal_error, opal_info, opal_warn};

use crate::cli::Cli;
use crate::config::OpalConfig;

/// Everything a crawl needs, resolved from flags, config file and registry.
pub struct RunPlan {
    pub parser_name: String,
    pub strategy: Arc<dyn ExtractionStrategy>,
    pub seed_url: String,
    pub suffix: Option<String>,
    pub max_pages: Option<u32>,
    pub concurrency: usize,
    pub output_dir: PathBuf,
    pub today: NaiveDate,
}

impl RunPlan {
    /// Flags win over the config file.
    pub fn resolve(
        cli: &Cli,
        config: &OpalConfig,
        registry: &ParserRegistry,
        today: NaiveDate,
    ) -> anyhow::Result<Self> {
        let strategy = registry.create(&cli.parser)?;

        let seed_url = if strategy.requires_rendering() {
            court_seed_url(cli, today)?
        } else {
            if cli.has_court_filters() {
                opal_warn!(
                    "Court search options are ignored by {}",
                    strategy.name()
                );
            }
            match &cli.url {
                Some(url) => url.clone(),
                None => bail!("--url is required for parser {}", cli.parser),
            }
        };

        Ok(Self {
            parser_name: cli.parser.clone(),
            strategy,
            seed_url,
            suffix: cli.suffix.clone(),
            max_pages: cli.max_pages,
            concurrency: cli.concurrency.unwrap_or(config.concurrency).max(1),
            output_dir: cli
                .output_dir
                .clone()
                .unwrap_or_else(|| config.output_dir.clone()),
            today,
        })
    }
}

/// A given `--url` is used as is; otherwise the search is built from the court flags.
fn court_seed_url(cli: &Cli, today: NaiveDate) -> anyhow::Result<String> {
    if let Some(url) = &cli.url {
        if cli.has_court_filters() {
            opal_warn!("--url given; court search options are ignored");
        }
        if !is_court_url(url) {
            opal_warn!("{} is not a court-portal results URL; pagination may not work", url);
        }
        return Ok(url.clone());
    }

    let mut search = CourtSearch::new(cli.court.unwrap_or(Court::Civil));
    if let Some(id) = &cli.court_id {
        search = search.with_court_id(id.clone());
    }
    if let Some(period) = cli.date {
        search = search.with_period(period);
    }
    if let Some(category) = cli.category {
        search = search.with_category(category)?;
    }
    if let Some(case_number) = &cli.case_number {
        search = search.with_case_number(case_number.clone());
    }
    if let Some(title) = &cli.case_title {
        search = search.with_case_title(title.clone());
    }
    search = search.exclude_closed(cli.exclude_closed);

    let url = search
        .build_url(0, today)
        .context("failed to build court search URL")?;
    opal_info!("Searching {}", search.court());
    Ok(url)
}

/// Returns the path of the written results, or `None` when the crawl produced nothing.
pub async fn run(cli: Cli, config: OpalConfig) -> anyhow::Result<Option<PathBuf>> {
    let registry = ParserRegistry::builtin();
    let today = chrono::Local::now().date_naive();
    let plan = RunPlan::resolve(&cli, &config, &registry, today)?;

    if plan.strategy.requires_rendering() {
        let mut settings = config.browser_settings();
        if let Some(endpoint) = &cli.browser {
            settings.endpoint = endpoint.clone();
        }
        let browser = Arc::new(BrowserFetcher::new(settings));
        let mut paginator =
            CourtPaginator::new(browser.clone(), plan.seed_url.clone(), plan.max_pages);
        let result = execute(&plan, paginator.fetcher(), &mut paginator).await;
        if let Err(err) = browser.close().await {
            opal_warn!("Failed to close browser tab: {}", err);
        }
        result
    } else {
        let mut settings = config.fetch_settings();
        settings.concurrency = plan.concurrency;
        let fetcher: Arc<dyn Fetcher> = Arc::new(ReqwestFetcher::new(settings));
        let mut paginator = ListingPaginator::new(
            fetcher.clone(),
            plan.seed_url.clone(),
            plan.suffix.clone(),
            plan.max_pages,
        );
        execute(&plan, fetcher, &mut paginator).await
    }
}

/// Runs the crawl to completion and writes the results when there are any.
pub async fn execute(
    plan: &RunPlan,
    fetcher: Arc<dyn Fetcher>,
    paginator: &mut dyn Paginator,
) -> anyhow::Result<Option<PathBuf>> {
    let orchestrator =
        Orchestrator::new(fetcher, plan.strategy.clone()).with_concurrency(plan.concurrency);
    let (outcome, records, state) = crawl(&orchestrator, paginator).await;

    let summary = state.summary();
    opal_info!(
        "Crawl finished: {} listing page(s), {} batch(es), {} record(s), {} URL(s) skipped, {} duplicate(s)",
        summary.listing_pages,
        summary.batches,
        summary.records,
        summary.skipped_urls,
        summary.duplicate_urls
    );

    match outcome {
        CrawlOutcome::Completed { .. } => {
            let writer = AtomicFileWriter::new(plan.output_dir.clone());
            let path = writer
                .write_result_set(&records, plan.today, &plan.parser_name)
                .with_context(|| format!("failed to write results to {}", plan.output_dir.display()))?;
            opal_info!("Wrote {} record(s) to {}", records.len(), path.display());
            print_preview(&records);
            Ok(Some(path))
        }
        CrawlOutcome::AllBatchesFailed { batches } => {
            opal_error!("All URLs failed to process ({} batch(es))", batches);
            Ok(None)
        }
        CrawlOutcome::NothingToFetch => {
            opal_error!("No URLs found to process from {}", plan.seed_url);
            Ok(None)
        }
    }
}

/// Feeds paginator and orchestrator results through `update` until it asks to finish.
async fn crawl(
    orchestrator: &Orchestrator,
    paginator: &mut dyn Paginator,
) -> (CrawlOutcome, ResultSet, CrawlState) {
    let mut state = CrawlState::new();
    let mut records = ResultSet::new();
    let mut pending: VecDeque<Effect> = VecDeque::new();

    loop {
        let msg = match pending.pop_front() {
            Some(Effect::Finish { outcome }) => return (outcome, records, state),
            Some(Effect::ProcessBatch { batch_id, urls }) => {
                opal_logging::set_batch(batch_id);
                let result = match orchestrator.process(&urls).await {
                    Ok(outcome) => {
                        let kind = outcome.result_kind();
                        records.append(outcome.records);
                        kind
                    }
                    Err(BatchError::AllFailed { attempted, .. }) => {
                        opal_error!("All {} URLs of the batch failed to process", attempted);
                        BatchResultKind::AllFailed { attempted }
                    }
                    Err(BatchError::NothingToFetch) => BatchResultKind::AllFailed { attempted: 0 },
                };
                opal_logging::clear_batch();
                Msg::BatchFinished { batch_id, result }
            }
            None => match paginator.next_page().await {
                Some(page) => Msg::ListingDiscovered {
                    page_number: page.page_number,
                    url: page.url,
                    article_urls: page.article_urls,
                },
                None => Msg::PaginationExhausted,
            },
        };

        let (next, effects) = update(state, msg);
        state = next;
        pending.extend(effects);
    }
}

fn print_preview(records: &ResultSet) {
    let Some(first) = records.first() else {
        println!("No records extracted.");
        return;
    };
    match serde_json::to_string_pretty(first) {
        Ok(json) => println!("First record:\n{json}"),
        Err(err) => opal_warn!("Could not render preview: {}", err),
    }
}
