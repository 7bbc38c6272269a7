use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::api::model::{AiRequest, AiResponse};
use crate::config::Config;
use crate::model::{ClassDetail, ClassSummary, StudentDetail};

pub mod model;

const USER_AGENT: &str = "edupal-roster/0.1";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL for {path}: {reason}")]
    InvalidUrl { path: String, reason: String },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },
    #[error("invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Transport failures, 429 and 5xx are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport { .. } => true,
            FetchError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            FetchError::InvalidUrl { .. } | FetchError::Decode { .. } => false,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Bounded exponential backoff. One attempt means no retries at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::from_millis(250),
            max_backoff: Duration::from_secs(4),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based): base * 2^attempt, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1_u32 << attempt.min(10);
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt + 1 < max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(label, attempt, ?delay, error = %err, "request failed; backing off");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Read side of the class/student backend.
#[async_trait]
pub trait ClassRepository: Send + Sync {
    async fn list_classes(&self) -> Result<Vec<ClassSummary>, FetchError>;

    async fn get_class_detail(&self, id: i64) -> Result<ClassDetail, FetchError>;

    async fn get_student(&self, id: i64) -> Result<StudentDetail, FetchError>;
}

/// The external assistant that answers a single free-text prompt.
#[async_trait]
pub trait EducatorAi: Send + Sync {
    async fn ask(&self, prompt: &str) -> Result<String, FetchError>;
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

fn build_http(timeout: Duration) -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .no_proxy()
        .build()
        .expect("reqwest client")
}

/// `Url::join` drops the last path segment unless the base ends in '/'.
fn normalize_base(mut base_url: Url) -> Url {
    if !base_url.path().ends_with('/') {
        let path = format!("{}/", base_url.path());
        base_url.set_path(&path);
    }
    base_url
}

impl ApiClient {
    pub fn new(base_url: Url, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            http: build_http(timeout),
            base_url: normalize_base(base_url),
            retry,
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self, FetchError> {
        let base_url = Url::parse(&cfg.api.base_url).map_err(|e| FetchError::InvalidUrl {
            path: cfg.api.base_url.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(base_url, cfg.timeout(), cfg.retry_policy()))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| FetchError::InvalidUrl {
                path: path.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn build_get(&self, path: &str) -> Result<reqwest::Request, FetchError> {
        let url = self.endpoint(path)?;
        self.http
            .get(url.clone())
            .header("Accept", "application/json")
            .build()
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })
    }

    async fn fetch_once<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let request = self.build_get(path)?;
        let url = request.url().to_string();
        debug!(%url, "GET");
        let res = self
            .http
            .execute(request)
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;
        read_json(url, res).await
    }

    #[instrument(skip(self))]
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        self.retry.run(path, || self.fetch_once(path)).await
    }
}

async fn read_json<T: DeserializeOwned>(url: String, res: reqwest::Response) -> Result<T, FetchError> {
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        warn!(%url, %status, "backend returned an error status");
        return Err(FetchError::Status { url, status, body });
    }
    let body = res.text().await.map_err(|source| FetchError::Transport {
        url: url.clone(),
        source,
    })?;
    serde_json::from_str(&body).map_err(|source| FetchError::Decode { url, source })
}

#[async_trait]
impl ClassRepository for ApiClient {
    async fn list_classes(&self) -> Result<Vec<ClassSummary>, FetchError> {
        self.get_json("api/classes").await
    }

    async fn get_class_detail(&self, id: i64) -> Result<ClassDetail, FetchError> {
        self.get_json(&format!("api/classes/{}", id)).await
    }

    async fn get_student(&self, id: i64) -> Result<StudentDetail, FetchError> {
        self.get_json(&format!("api/students/{}", id)).await
    }
}

/// Client for the assistant endpoint. Prompts are POSTed exactly once;
/// the retry policy never applies here.
#[derive(Clone)]
pub struct AiClient {
    http: Client,
    endpoint: Url,
}

impl fmt::Debug for AiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl AiClient {
    pub fn new(endpoint: Url, timeout: Duration) -> Self {
        Self {
            http: build_http(timeout),
            endpoint,
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self, FetchError> {
        let endpoint = Url::parse(&cfg.ai.endpoint).map_err(|e| FetchError::InvalidUrl {
            path: cfg.ai.endpoint.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(endpoint, cfg.timeout()))
    }

    pub fn build_request(&self, prompt: &str) -> Result<reqwest::Request, FetchError> {
        self.http
            .post(self.endpoint.clone())
            .header("Content-Type", "application/json")
            .json(&AiRequest { prompt })
            .build()
            .map_err(|source| FetchError::Transport {
                url: self.endpoint.to_string(),
                source,
            })
    }
}

#[async_trait]
impl EducatorAi for AiClient {
    #[instrument(skip_all)]
    async fn ask(&self, prompt: &str) -> Result<String, FetchError> {
        let request = self.build_request(prompt)?;
        let url = self.endpoint.to_string();
        let res = self
            .http
            .execute(request)
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;
        let payload: AiResponse = read_json(url, res).await?;
        Ok(payload.into_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn client(base: &str) -> ApiClient {
        ApiClient::new(
            Url::parse(base).unwrap(),
            Duration::from_secs(5),
            RetryPolicy::default(),
        )
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let c = client("http://localhost:3000/mobile");
        assert_eq!(
            c.endpoint("/api/classes/7").unwrap().as_str(),
            "http://localhost:3000/mobile/api/classes/7"
        );
        let c = client("http://localhost:3000/");
        assert_eq!(
            c.endpoint("api/classes").unwrap().as_str(),
            "http://localhost:3000/api/classes"
        );
    }

    #[test]
    fn build_get_sets_accept_header() {
        let c = client("http://localhost:3000/");
        let request = c.build_get("api/students/3").unwrap();
        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.url().path(), "/api/students/3");
        assert_eq!(
            request
                .headers()
                .get("Accept")
                .and_then(|h| h.to_str().ok())
                .unwrap(),
            "application/json"
        );
    }

    #[test]
    fn ai_request_posts_prompt_json() {
        let ai = AiClient::new(
            Url::parse("http://localhost:3000/api/educator-ai").unwrap(),
            Duration::from_secs(5),
        );
        let request = ai.build_request("plan a lesson").unwrap();
        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().path(), "/api/educator-ai");
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(value, serde_json::json!({ "prompt": "plan a lesson" }));
    }

    #[test]
    fn delay_doubles_until_cap() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_backoff: Duration::from_millis(500),
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for(3), Duration::from_millis(500));
        assert_eq!(policy.delay_for(40), Duration::from_millis(500));
    }

    fn server_error() -> FetchError {
        FetchError::Status {
            url: "http://x/".into(),
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: String::new(),
        }
    }

    #[tokio::test]
    async fn run_retries_retryable_errors_up_to_max() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        };
        let calls = AtomicU32::new(0);
        let res: Result<(), FetchError> = policy
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(server_error()) }
            })
            .await;
        assert!(res.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn run_does_not_retry_client_errors() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        };
        let calls = AtomicU32::new(0);
        let res: Result<(), FetchError> = policy
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(FetchError::Status {
                        url: "http://x/".into(),
                        status: StatusCode::NOT_FOUND,
                        body: String::new(),
                    })
                }
            })
            .await;
        assert_eq!(res.unwrap_err().status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn run_returns_first_success() {
        let policy = RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        };
        let calls = AtomicU32::new(0);
        let res = policy
            .run("test", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 1 {
                        Err(server_error())
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(res.unwrap(), 1);
    }
}
