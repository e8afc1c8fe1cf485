use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::PipelineError;
use crate::fetch::PageFetcher;

const SITE_ROOT: &str = "https://www.basketball-reference.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    MvpVoting,
    PerGame,
    Standings,
}

pub const CATEGORIES: [Category; 3] = [Category::MvpVoting, Category::PerGame, Category::Standings];

impl Category {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::MvpVoting => "mvp",
            Category::PerGame => "player_stats",
            Category::Standings => "team_standings",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::MvpVoting => "mvp voting",
            Category::PerGame => "per-game stats",
            Category::Standings => "standings",
        }
    }

    pub fn url(&self, season: u16) -> String {
        match self {
            Category::MvpVoting => format!("{SITE_ROOT}/awards/awards_{season}.html"),
            Category::PerGame => format!("{SITE_ROOT}/leagues/NBA_{season}_per_game.html"),
            Category::Standings => format!("{SITE_ROOT}/leagues/NBA_{season}_standings.html"),
        }
    }
}

/// One file per (category, season), kept verbatim and forever. Season pages
/// are historical record; staleness is not a failure mode, so there is no
/// expiry, only an explicit refresh switch.
pub struct PageCache {
    root: PathBuf,
    force_refresh: bool,
}

impl PageCache {
    pub fn new(root: impl Into<PathBuf>, force_refresh: bool) -> Self {
        Self {
            root: root.into(),
            force_refresh,
        }
    }

    pub fn page_path(&self, category: Category, season: u16) -> PathBuf {
        self.root
            .join(category.dir_name())
            .join(format!("{season}.html"))
    }

    pub fn get_or_fetch(
        &self,
        fetcher: &dyn PageFetcher,
        category: Category,
        season: u16,
    ) -> Result<String, PipelineError> {
        let path = self.page_path(category, season);
        if !self.force_refresh && path.exists() {
            debug!(path = %path.display(), "page cache hit");
            return fs::read_to_string(&path).map_err(|e| PipelineError::cache_io(&path, e));
        }

        let body = fetcher.fetch(&category.url(season))?;
        save_page(&path, &body)?;
        Ok(body)
    }
}

// Write-then-rename so a crash mid-write never leaves a truncated page
// behind to be mistaken for a hit.
fn save_page(path: &Path, body: &str) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PipelineError::cache_io(parent, e))?;
    }
    let tmp = path.with_extension("html.tmp");
    fs::write(&tmp, body).map_err(|e| PipelineError::cache_io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| PipelineError::cache_io(path, e))?;
    Ok(())
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join("mvp_pipeline"));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join("mvp_pipeline"))
}
