//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the collector, including:
//! - Building the HTTP client with the configured user agent and timeout
//! - Bounding in-flight requests across all hosts with a semaphore
//! - Pacing requests per host through a cached [`RateLimiter`]
//! - Retrying transport failures and retryable statuses with backoff
//!
//! Connections are owned by the inner [`Client`] and are released when the
//! `Fetcher` is dropped, on every exit path of the run.

use crate::config::CollectConfig;
use crate::crawler::RateLimiter;
use crate::url::host_of;
use crate::SeedError;
use rand::Rng;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{redirect::Policy, Client};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;

/// Statuses retried while the retry budget lasts
pub const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Backoff for the first retry, doubled on each later attempt
const BACKOFF_BASE_SECS: f64 = 0.5;

/// Upper bound of the random jitter added to each backoff
const BACKOFF_JITTER_SECS: f64 = 0.25;

/// Upper bound of any computed backoff
const BACKOFF_CAP_SECS: f64 = 10.0;

const MAX_REDIRECTS: usize = 10;

/// Terminal transport failure after the retry budget is spent
#[derive(Debug, Clone, Error)]
#[error("Failed to fetch {url}: {message}")]
pub struct FetchError {
    /// URL that could not be fetched
    pub url: String,

    /// Description of the last transport error
    pub message: String,
}

/// A completed HTTP exchange
///
/// The status is not checked here; a response with a retryable status is
/// returned as-is once retries are exhausted.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP status code
    pub status_code: u16,

    /// Decoded response body
    pub body: String,

    /// Response headers
    pub headers: HeaderMap,

    /// Final URL after redirects
    pub final_url: String,
}

/// Bounded-concurrency HTTP client with per-host pacing and retries
#[derive(Debug)]
pub struct Fetcher {
    client: Client,
    semaphore: Semaphore,
    limiters: Mutex<HashMap<String, Arc<RateLimiter>>>,
    rate_limit_rps: f64,
    retry_count: u32,
}

impl Fetcher {
    /// Creates a fetcher from the run configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The collect configuration (user agent, timeout,
    ///   concurrency, retry count, rate limit)
    ///
    /// # Returns
    ///
    /// * `Ok(Fetcher)` - Ready to issue requests
    /// * `Err(SeedError)` - The HTTP client could not be built
    ///
    /// # Example
    ///
    /// ```no_run
    /// use seed_collector::{CollectConfig, Fetcher};
    ///
    /// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
    /// let fetcher = Fetcher::new(&CollectConfig::default())?;
    /// let response = fetcher.fetch("https://shop.example.com/product/list.html").await?;
    /// println!("{}", response.status_code);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(config: &CollectConfig) -> Result<Self, SeedError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_sec))
            .redirect(Policy::limited(MAX_REDIRECTS))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            semaphore: Semaphore::new(config.concurrency.max(1)),
            limiters: Mutex::new(HashMap::new()),
            rate_limit_rps: config.rate_limit_rps,
            retry_count: config.retry_count,
        })
    }

    /// Fetches a URL with retries
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Transport error (connect, timeout, body read) | Retry, then `Err(FetchError)` |
    /// | HTTP 429, 500, 502, 503, 504 | Retry, then return the last response |
    /// | Any other status | Return immediately |
    ///
    /// The delay before a retry is the response's `Retry-After` seconds when
    /// present and positive, otherwise [`backoff_delay`]. A concurrency permit
    /// and a rate-limit slot are taken for every attempt; neither is held
    /// during the retry sleep.
    pub async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let limiter = self.limiter_for(url);
        let mut attempt: u32 = 0;

        loop {
            let outcome = {
                let _permit = self.semaphore.acquire().await.map_err(|e| FetchError {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
                if let Some(limiter) = &limiter {
                    limiter.acquire().await;
                }
                self.send(url).await
            };

            let delay = match outcome {
                Ok(response) => {
                    if !RETRY_STATUSES.contains(&response.status_code) || attempt >= self.retry_count {
                        return Ok(response);
                    }
                    let delay = retry_after(&response.headers).unwrap_or_else(|| backoff_delay(attempt));
                    tracing::debug!(
                        "HTTP {} from {}, retrying in {:?} (attempt {}/{})",
                        response.status_code,
                        url,
                        delay,
                        attempt + 1,
                        self.retry_count
                    );
                    delay
                }
                Err(e) => {
                    if attempt >= self.retry_count {
                        return Err(FetchError {
                            url: url.to_string(),
                            message: e.to_string(),
                        });
                    }
                    let delay = backoff_delay(attempt);
                    tracing::debug!(
                        "Request to {} failed: {}, retrying in {:?} (attempt {}/{})",
                        url,
                        e,
                        delay,
                        attempt + 1,
                        self.retry_count
                    );
                    delay
                }
            };

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn send(&self, url: &str) -> Result<FetchResponse, reqwest::Error> {
        let response = self.client.get(url).send().await?;

        let status_code = response.status().as_u16();
        let headers = response.headers().clone();
        let final_url = response.url().to_string();
        let body = response.text().await?;

        Ok(FetchResponse {
            status_code,
            body,
            headers,
            final_url,
        })
    }

    /// Returns the cached limiter for the URL's host, creating it on first use
    fn limiter_for(&self, url: &str) -> Option<Arc<RateLimiter>> {
        let host = host_of(url)?;
        let mut limiters = self.limiters.lock().unwrap_or_else(PoisonError::into_inner);
        let limiter = limiters
            .entry(host)
            .or_insert_with(|| Arc::new(RateLimiter::new(self.rate_limit_rps)));
        Some(Arc::clone(limiter))
    }

    /// Number of hosts with a cached limiter
    pub fn known_hosts(&self) -> usize {
        self.limiters.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Computes the backoff before retry number `attempt + 1`
///
/// `min(0.5 * 2^attempt + jitter, 10)` seconds with jitter uniform in
/// `[0, 0.25]`.
pub fn backoff_delay(attempt: u32) -> Duration {
    let base = BACKOFF_BASE_SECS * 2f64.powi(attempt.min(16) as i32);
    let jitter = rand::thread_rng().gen_range(0.0..=BACKOFF_JITTER_SECS);
    Duration::from_secs_f64((base + jitter).min(BACKOFF_CAP_SECS))
}

/// Reads a positive `Retry-After` delay given in (possibly fractional) seconds
///
/// HTTP-date values, zero, unparseable values and delays too large for a
/// `Duration` yield `None`.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let secs: f64 = headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()?;
    if !(secs.is_finite() && secs > 0.0) {
        return None;
    }
    Duration::try_from_secs_f64(secs).ok()
}
