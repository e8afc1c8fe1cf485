use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::extract::extract_table;
use crate::fetch::PageFetcher;
use crate::frame::{Cell, Frame};
use crate::page_cache::{Category, PageCache};

const MVP_TABLE_ID: &str = "mvp";
const PER_GAME_TABLE_ID: &str = "per_game_stats";
const STANDINGS_EAST_ID: &str = "divs_standings_E";
const STANDINGS_WEST_ID: &str = "divs_standings_W";

#[derive(Debug, Clone)]
pub struct SeasonFailure {
    pub category: Category,
    pub season: u16,
    pub error: String,
}

impl SeasonFailure {
    pub fn describe(&self) -> String {
        format!("{} {}: {}", self.category.label(), self.season, self.error)
    }
}

#[derive(Debug)]
pub struct CategoryScrape {
    pub category: Category,
    pub frame: Frame,
    pub failures: Vec<SeasonFailure>,
    pub seasons_attempted: usize,
}

/// Acquire one category across a season range. A bad season is recorded and
/// skipped, never fatal; the caller decides what an acceptable loss is.
/// Cancellation is honored between seasons, not mid-request.
pub fn scrape_category(
    cache: &PageCache,
    fetcher: &dyn PageFetcher,
    category: Category,
    seasons: Range<u16>,
    parallelism: usize,
    cancel: &AtomicBool,
) -> CategoryScrape {
    let seasons = seasons.collect::<Vec<_>>();
    let results: Vec<Option<Result<Frame, SeasonFailure>>> = match build_fetch_pool(parallelism) {
        Some(pool) => pool.install(|| {
            seasons
                .par_iter()
                .map(|&season| scrape_one(cache, fetcher, category, season, cancel))
                .collect()
        }),
        None => seasons
            .iter()
            .map(|&season| scrape_one(cache, fetcher, category, season, cancel))
            .collect(),
    };

    let mut frames = Vec::new();
    let mut failures = Vec::new();
    let mut seasons_attempted = 0usize;
    for result in results {
        let Some(result) = result else {
            continue;
        };
        seasons_attempted += 1;
        match result {
            Ok(frame) => frames.push(frame),
            Err(failure) => failures.push(failure),
        }
    }

    info!(
        category = category.label(),
        attempted = seasons_attempted,
        failed = failures.len(),
        "category scrape finished"
    );
    CategoryScrape {
        category,
        frame: Frame::concat(frames),
        failures,
        seasons_attempted,
    }
}

fn scrape_one(
    cache: &PageCache,
    fetcher: &dyn PageFetcher,
    category: Category,
    season: u16,
    cancel: &AtomicBool,
) -> Option<Result<Frame, SeasonFailure>> {
    if cancel.load(Ordering::Relaxed) {
        return None;
    }
    let result = cache
        .get_or_fetch(fetcher, category, season)
        .and_then(|page| season_frame(&page, category, season));
    Some(result.map_err(|err| {
        warn!(category = category.label(), season, %err, "season failed");
        SeasonFailure {
            category,
            season,
            error: err.to_string(),
        }
    }))
}

/// Turn one cached page into the season's frame, with the season stamped on
/// every row so multi-year concatenation keeps rows attributable.
pub fn season_frame(page: &str, category: Category, season: u16) -> Result<Frame, PipelineError> {
    let context = format!("{} page for {}", category.label(), season);
    let mut frame = match category {
        Category::MvpVoting => extract_table(page, MVP_TABLE_ID, &context)?.into_frame(),
        Category::PerGame => extract_table(page, PER_GAME_TABLE_ID, &context)?.into_frame(),
        Category::Standings => {
            let east = conference_half(
                page,
                STANDINGS_EAST_ID,
                "Eastern Conference",
                "Eastern",
                &context,
            )?;
            let west = conference_half(
                page,
                STANDINGS_WEST_ID,
                "Western Conference",
                "Western",
                &context,
            )?;
            Frame::concat([east, west])
        }
    };
    frame.add_constant_column("Year", Cell::Number(f64::from(season)));
    Ok(frame)
}

// The two standings tables name their first column after the conference;
// normalizing to "Team" up front lets the halves stack.
fn conference_half(
    page: &str,
    table_id: &str,
    header: &str,
    conference: &str,
    context: &str,
) -> Result<Frame, PipelineError> {
    let mut frame = extract_table(page, table_id, context)?.into_frame();
    frame.rename_column(header, "Team", context)?;
    frame.add_constant_column("Conference", Cell::text(conference));
    Ok(frame)
}

fn build_fetch_pool(parallelism: usize) -> Option<rayon::ThreadPool> {
    if parallelism <= 1 {
        return None;
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(parallelism)
        .build()
        .ok()
}
