use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use tracing::info;

use crate::clean::{clean_mvp, clean_players, clean_standings};
use crate::config::PipelineConfig;
use crate::features::predictor_table;
use crate::fetch::{HttpFetcher, PageFetcher};
use crate::merge::{MergeReport, merge_basetable};
use crate::page_cache::{CATEGORIES, Category, PageCache};
use crate::scrape::{CategoryScrape, SeasonFailure, scrape_category};
use crate::store::{self, RunLedgerEntry};

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub db_path: PathBuf,
    pub year_start: u16,
    pub year_end: u16,
    pub seasons_attempted: usize,
    pub seasons_succeeded: usize,
    pub basetable_rows: usize,
    pub predictor_columns: usize,
    pub merge_report: MergeReport,
    pub failures: Vec<SeasonFailure>,
    pub aborted: bool,
}

#[derive(Debug, Clone)]
pub struct WarmSummary {
    pub cache_root: PathBuf,
    pub pages_attempted: usize,
    pub failures: Vec<SeasonFailure>,
    pub aborted: bool,
}

pub fn run(cfg: &PipelineConfig, cancel: &AtomicBool) -> Result<RunSummary> {
    let fetcher = HttpFetcher::new(cfg.max_retries, Duration::from_secs(cfg.request_delay_secs));
    run_with_fetcher(cfg, &fetcher, cancel)
}

/// Full pass: acquire every category over the configured seasons, clean,
/// merge, derive predictors, and hand both tables to the store. Season-level
/// trouble is collected into the summary; a category with no data at all is
/// the one thing that aborts.
pub fn run_with_fetcher(
    cfg: &PipelineConfig,
    fetcher: &dyn PageFetcher,
    cancel: &AtomicBool,
) -> Result<RunSummary> {
    cfg.validate()?;
    let started_at = Utc::now().to_rfc3339();
    let cache = PageCache::new(&cfg.cache_root, cfg.force_refresh);

    let scrape_one = |category: Category| {
        scrape_category(
            &cache,
            fetcher,
            category,
            cfg.seasons(),
            cfg.fetch_parallelism,
            cancel,
        )
    };
    let mvp_scrape = scrape_one(Category::MvpVoting);
    let players_scrape = scrape_one(Category::PerGame);
    let standings_scrape = scrape_one(Category::Standings);

    let mut failures = Vec::new();
    let mut seasons_attempted = 0usize;
    for scrape in [&mvp_scrape, &players_scrape, &standings_scrape] {
        seasons_attempted += scrape.seasons_attempted;
        failures.extend(scrape.failures.iter().cloned());
    }
    let seasons_succeeded = seasons_attempted - failures.len();

    if cancel.load(Ordering::Relaxed) {
        info!("run cancelled, leaving the store untouched");
        return Ok(RunSummary {
            db_path: cfg.db_path.clone(),
            year_start: cfg.year_start,
            year_end: cfg.year_end,
            seasons_attempted,
            seasons_succeeded,
            basetable_rows: 0,
            predictor_columns: 0,
            merge_report: MergeReport::default(),
            failures,
            aborted: true,
        });
    }

    for scrape in [&mvp_scrape, &players_scrape, &standings_scrape] {
        ensure_category_has_rows(cfg, scrape)?;
    }

    let mvp = clean_mvp(&mvp_scrape.frame).context("cleaning mvp voting")?;
    let players = clean_players(players_scrape.frame).context("cleaning per-game stats")?;
    let standings = clean_standings(standings_scrape.frame).context("cleaning standings")?;

    let (basetable, merge_report) = merge_basetable(mvp, players, standings)?;
    let predictors = predictor_table(&basetable);

    let mut conn = store::open_db(&cfg.db_path)?;
    store::replace_table(&mut conn, store::BASETABLE_TABLE, &basetable)?;
    store::replace_table(&mut conn, store::PREDICTORS_TABLE, &predictors)?;
    store::record_run(
        &conn,
        &RunLedgerEntry {
            started_at,
            finished_at: Utc::now().to_rfc3339(),
            year_start: cfg.year_start,
            year_end: cfg.year_end,
            seasons_attempted,
            seasons_succeeded,
            basetable_rows: basetable.row_count(),
            failures: failures.iter().map(SeasonFailure::describe).collect(),
        },
    )?;

    info!(
        rows = basetable.row_count(),
        predictors = predictors.columns.len(),
        failures = failures.len(),
        "pipeline run complete"
    );
    Ok(RunSummary {
        db_path: cfg.db_path.clone(),
        year_start: cfg.year_start,
        year_end: cfg.year_end,
        seasons_attempted,
        seasons_succeeded,
        basetable_rows: basetable.row_count(),
        predictor_columns: predictors.columns.len(),
        merge_report,
        failures,
        aborted: false,
    })
}

/// Fetch-and-cache only, for priming ahead of offline work. Sequential on
/// purpose: priming is the politeness-sensitive path.
pub fn warm_page_cache(cfg: &PipelineConfig, cancel: &AtomicBool) -> Result<WarmSummary> {
    cfg.validate()?;
    let fetcher = HttpFetcher::new(cfg.max_retries, Duration::from_secs(cfg.request_delay_secs));
    warm_with_fetcher(cfg, &fetcher, cancel)
}

pub fn warm_with_fetcher(
    cfg: &PipelineConfig,
    fetcher: &dyn PageFetcher,
    cancel: &AtomicBool,
) -> Result<WarmSummary> {
    let cache = PageCache::new(&cfg.cache_root, cfg.force_refresh);
    let mut failures = Vec::new();
    let mut pages_attempted = 0usize;

    for category in CATEGORIES {
        for season in cfg.seasons() {
            if cancel.load(Ordering::Relaxed) {
                return Ok(WarmSummary {
                    cache_root: cfg.cache_root.clone(),
                    pages_attempted,
                    failures,
                    aborted: true,
                });
            }
            pages_attempted += 1;
            if let Err(err) = cache.get_or_fetch(fetcher, category, season) {
                failures.push(SeasonFailure {
                    category,
                    season,
                    error: err.to_string(),
                });
            }
        }
    }

    Ok(WarmSummary {
        cache_root: cfg.cache_root.clone(),
        pages_attempted,
        failures,
        aborted: false,
    })
}

fn ensure_category_has_rows(cfg: &PipelineConfig, scrape: &CategoryScrape) -> Result<()> {
    if !scrape.frame.is_empty() {
        return Ok(());
    }
    let causes = scrape
        .failures
        .iter()
        .map(SeasonFailure::describe)
        .take(6)
        .collect::<Vec<_>>()
        .join("; ");
    Err(anyhow!(
        "no {} rows for any season in {}..{}: {causes}",
        scrape.category.label(),
        cfg.year_start,
        cfg.year_end
    ))
}
