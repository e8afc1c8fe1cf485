use std::env;
use std::ops::Range;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use crate::page_cache::app_cache_dir;
use crate::store;

// basketball-reference standings layouts are stable from 1980 onward.
pub const EARLIEST_SEASON: u16 = 1980;

const DEFAULT_YEAR_START: u16 = 1980;
const DEFAULT_YEAR_END: u16 = 2024;
const DEFAULT_REQUEST_DELAY_SECS: u64 = 3;
const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub year_start: u16,
    /// Exclusive upper bound of the season range.
    pub year_end: u16,
    pub cache_root: PathBuf,
    pub db_path: PathBuf,
    pub force_refresh: bool,
    pub fetch_parallelism: usize,
    pub request_delay_secs: u64,
    pub max_retries: u32,
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self> {
        let cache_root = match env_path("PAGE_CACHE_DIR") {
            Some(dir) => dir,
            None => app_cache_dir()
                .map(|dir| dir.join("pages"))
                .context("unable to resolve a page cache directory (set PAGE_CACHE_DIR)")?,
        };
        let db_path = match env_path("MVP_DB_PATH") {
            Some(path) => path,
            None => store::default_db_path()
                .context("unable to resolve a sqlite path (set MVP_DB_PATH)")?,
        };

        let cfg = Self {
            year_start: env_u16("YEAR_START", DEFAULT_YEAR_START),
            year_end: env_u16("YEAR_END", DEFAULT_YEAR_END),
            cache_root,
            db_path,
            force_refresh: env_flag("FORCE_REFRESH"),
            fetch_parallelism: fetch_parallelism(),
            request_delay_secs: env_u64("REQUEST_DELAY_SECS", DEFAULT_REQUEST_DELAY_SECS),
            max_retries: env_u32("MAX_RETRIES", DEFAULT_MAX_RETRIES),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.year_start < EARLIEST_SEASON {
            return Err(anyhow!(
                "seasons before {EARLIEST_SEASON} are not supported (YEAR_START={})",
                self.year_start
            ));
        }
        if self.year_start >= self.year_end {
            return Err(anyhow!(
                "empty season range: YEAR_START={} YEAR_END={} (end is exclusive)",
                self.year_start,
                self.year_end
            ));
        }
        Ok(())
    }

    pub fn seasons(&self) -> Range<u16> {
        self.year_start..self.year_end
    }

    pub fn season_count(&self) -> usize {
        usize::from(self.year_end - self.year_start)
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    let raw = env::var(key).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(PathBuf::from(trimmed))
}

fn env_u16(key: &str, default: u16) -> u16 {
    env::var(key)
        .ok()
        .and_then(|val| val.trim().parse::<u16>().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|val| val.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|val| val.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str) -> bool {
    env::var(key)
        .map(|val| matches!(val.trim(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn fetch_parallelism() -> usize {
    env::var("FETCH_PARALLELISM")
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, 16)
}
