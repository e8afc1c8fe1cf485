use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure modes of the acquisition/consolidation core. Orchestration code
/// wraps these in `anyhow` with call-site context; callers that need to
/// branch (retry exhaustion vs layout drift) match on the variant.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("still rate limited after {retries} retries (last Retry-After {retry_after_secs}s): {url}")]
    RateLimited {
        url: String,
        retries: u32,
        retry_after_secs: u64,
    },

    #[error("request failed: {url}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("no table with id `{table_id}` in {context}")]
    TableNotFound { table_id: String, context: String },

    #[error("column `{column}` missing from {context}")]
    ColumnNotFound { column: String, context: String },

    #[error("unknown team abbreviation `{abbr}` for {player} ({year})")]
    UnknownAbbreviation {
        abbr: String,
        player: String,
        year: u16,
    },

    #[error("cache io: {path}")]
    CacheIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PipelineError {
    pub fn cache_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::CacheIo {
            path: path.into(),
            source,
        }
    }
}
