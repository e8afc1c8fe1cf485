use std::thread;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::http_client::http_client;

const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// Anything that can turn a URL into a page body. The production
/// implementation goes over the wire; tests substitute canned bodies.
pub trait PageFetcher: Sync {
    fn fetch(&self, url: &str) -> Result<String, PipelineError>;
}

pub struct HttpFetcher {
    max_retries: u32,
    request_delay: Duration,
}

impl HttpFetcher {
    pub fn new(max_retries: u32, request_delay: Duration) -> Self {
        Self {
            max_retries,
            request_delay,
        }
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, PipelineError> {
        let client = http_client().map_err(|source| PipelineError::Transport {
            url: url.to_string(),
            source,
        })?;

        let mut retries = 0u32;
        loop {
            debug!(url, "fetching page");
            let resp = client
                .get(url)
                .send()
                .map_err(|source| PipelineError::Transport {
                    url: url.to_string(),
                    source,
                })?;

            if resp.status() == StatusCode::TOO_MANY_REQUESTS {
                let wait = retry_after_secs(
                    resp.headers()
                        .get(RETRY_AFTER)
                        .and_then(|v| v.to_str().ok()),
                );
                if retries >= self.max_retries {
                    return Err(PipelineError::RateLimited {
                        url: url.to_string(),
                        retries,
                        retry_after_secs: wait,
                    });
                }
                retries += 1;
                warn!(url, wait, attempt = retries, "rate limited, backing off");
                thread::sleep(Duration::from_secs(wait));
                continue;
            }

            let resp = resp
                .error_for_status()
                .map_err(|source| PipelineError::Transport {
                    url: url.to_string(),
                    source,
                })?;
            let body = resp.text().map_err(|source| PipelineError::Transport {
                url: url.to_string(),
                source,
            })?;

            // Politeness pause between live requests; cache hits never get here.
            if !self.request_delay.is_zero() {
                thread::sleep(self.request_delay);
            }
            return Ok(body);
        }
    }
}

fn retry_after_secs(raw: Option<&str>) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}
