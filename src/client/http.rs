//! Rate-limited request client
//!
//! Sends authenticated JSON requests to the test-management service. Responses
//! with status 429 are retried on a fixed exponential schedule
//! (`base_delay * 2^(attempt-1)`, no jitter); every other non-2xx status
//! fails immediately.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{ConfigError, TOKEN_VAR};
use crate::engine::error::{Result, SyncError};
use crate::engine::mock_clock::{Clock, TokioClock};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Backoff schedule for throttled requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Delay after the `attempt`-th throttled response (1-based); saturates
    /// at `Duration::MAX`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt.saturating_sub(1))
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }

    /// Full schedule of delays for a sustained 429
    pub fn schedule(&self) -> Vec<Duration> {
        (1..=self.max_attempts).map(|a| self.delay_for(a)).collect()
    }
}

/// Successful (2xx) response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
    pub elapsed_ms: u64,
}

impl HttpResponse {
    /// Parse the body as JSON; an empty body parses as `null`
    pub fn json<T: DeserializeOwned>(&self, context: &str) -> Result<T> {
        let body = if self.body.trim().is_empty() {
            "null"
        } else {
            self.body.as_str()
        };
        serde_json::from_str(body).map_err(|source| SyncError::Decode {
            context: context.to_string(),
            source,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitedClient {
    client: reqwest::Client,
    base_url: String,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl RateLimitedClient {
    pub fn new(base_url: impl Into<String>, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", token.trim())).map_err(|_| {
            ConfigError {
                missing: Vec::new(),
                invalid: vec![(TOKEN_VAR.to_string(), "<not a valid header value>".to_string())],
            }
        })?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(DEFAULT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            policy: RetryPolicy::default(),
            clock: Arc::new(TokioClock),
        })
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = RetryPolicy {
            max_attempts: policy.max_attempts.max(1),
            ..policy
        };
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        format!("{}{}", self.base_url, path)
    }

    /// Send one logical request, retrying while the service answers 429
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<HttpResponse> {
        let url = self.build_url(path);
        let mut throttled = 0;

        while throttled < self.policy.max_attempts {
            let mut request = self.client.request(method.clone(), &url);
            if let Some(body) = body {
                request = request.json(body);
            }

            debug!("Executing {} {}", method, url);
            let start = Instant::now();
            let response = request.send().await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                throttled += 1;
                let delay = self.policy.delay_for(throttled);
                warn!(
                    "{} {} throttled (attempt {}/{}), waiting {:?}",
                    method, url, throttled, self.policy.max_attempts, delay
                );
                self.clock.sleep(delay).await;
                continue;
            }

            let text = response.text().await?;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            debug!("{} {} -> {} ({}ms)", method, url, status.as_u16(), elapsed_ms);

            if !status.is_success() {
                return Err(SyncError::RemoteRejected {
                    method: method.to_string(),
                    url,
                    status: status.as_u16(),
                    body: text,
                });
            }

            return Ok(HttpResponse {
                status: status.as_u16(),
                body: text,
                elapsed_ms,
            });
        }

        Err(SyncError::RateLimitExhausted {
            method: method.to_string(),
            url,
            attempts: self.policy.max_attempts,
        })
    }

    pub async fn get(&self, path: &str) -> Result<HttpResponse> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<HttpResponse> {
        let body = to_body(path, body)?;
        self.send(Method::POST, path, Some(&body)).await
    }

    pub async fn put_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<HttpResponse> {
        let body = to_body(path, body)?;
        self.send(Method::PUT, path, Some(&body)).await
    }
}

fn to_body<B: Serialize + ?Sized>(path: &str, body: &B) -> Result<Value> {
    serde_json::to_value(body).map_err(|source| SyncError::Decode {
        context: format!("request body for {}", path),
        source,
    })
}
