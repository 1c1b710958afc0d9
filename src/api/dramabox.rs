//! DramaBox API client
//!
//! Talks to the DramaBox upstream: fetches a short-lived bearer token from a
//! configurable issuer, builds the vendor headers the mobile app sends, and
//! forwards the three content operations (latest, stream, search). Upstream
//! statuses are passed through verbatim; only transport faults are errors.

use anyhow::Result;
use chrono::Local;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue, ACCEPT_ENCODING, CONTENT_TYPE,
    USER_AGENT,
};
use serde::Serialize;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::Config;
use crate::models::{LatestRequest, SearchRequest, StreamRequest, Token, UpstreamResponse};

/// Fixed upstream host for the content endpoints
const UPSTREAM_BASE_URL: &str = "https://dramabox.sansekai.my.id/api/dramabox";

/// Issued tokens are good for one minute
const TOKEN_TTL: Duration = Duration::from_secs(60);

const TOKEN_TIMEOUT: Duration = Duration::from_secs(10);
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(15);

/// DramaBox client error types
#[derive(Error, Debug)]
pub enum DramaBoxError {
    #[error("DRAMABOX_TOKEN_URL not set")]
    MissingTokenUrl,

    #[error("Token endpoint returned HTTP {0}")]
    TokenEndpoint(u16),

    #[error("Invalid token payload")]
    InvalidTokenPayload,

    #[error("Upstream error: {0}")]
    Upstream(#[source] reqwest::Error),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),
}

/// Cached credential pair with its expiry deadline
struct CachedToken {
    token: Token,
    expires_at: Instant,
}

/// DramaBox API client
pub struct DramaBoxClient {
    config: Config,
    base_url: String,
    client: reqwest::Client,
    token_ttl: Duration,
    // Single slot, overwritten wholesale on refresh. Locked only to read or
    // swap the snapshot, never across an await: racing refreshers each fetch
    // and the last writer wins.
    token_cache: Mutex<Option<CachedToken>>,
}

impl DramaBoxClient {
    /// Create a new client with the given configuration
    pub fn new(config: Config) -> Self {
        Self::with_base_url(config, UPSTREAM_BASE_URL)
    }

    /// Create a client with a custom upstream base URL (for testing)
    pub fn with_base_url(config: Config, base_url: impl Into<String>) -> Self {
        Self {
            config,
            base_url: base_url.into(),
            client: reqwest::Client::new(),
            token_ttl: TOKEN_TTL,
            token_cache: Mutex::new(None),
        }
    }

    /// Override the token cache TTL (for testing)
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Get a valid token, fetching a fresh one when the cache is empty or
    /// expired, or when `force` is set.
    ///
    /// Overwrites the cached slot on every fetch.
    pub async fn get_token(&self, force: bool) -> Result<Token> {
        if !force {
            let cache = lock_slot(&self.token_cache);
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Instant::now() {
                    return Ok(cached.token.clone());
                }
            }
        }

        let url = self
            .config
            .token_url
            .as_deref()
            .ok_or(DramaBoxError::MissingTokenUrl)?;

        let response = self
            .client
            .get(url)
            .timeout(TOKEN_TIMEOUT)
            .send()
            .await
            .map_err(DramaBoxError::RequestFailed)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DramaBoxError::TokenEndpoint(status.as_u16()).into());
        }

        let token: Token = response
            .json()
            .await
            .map_err(|_| DramaBoxError::InvalidTokenPayload)?;
        if token.token.is_empty() || token.device_id.is_empty() {
            return Err(DramaBoxError::InvalidTokenPayload.into());
        }

        let mut cache = lock_slot(&self.token_cache);
        *cache = Some(CachedToken {
            token: token.clone(),
            expires_at: Instant::now() + self.token_ttl,
        });

        Ok(token)
    }

    /// Build the vendor header set for a token.
    ///
    /// Deterministic given the same token and config; only the `time-zone`
    /// field depends on the host clock, and it is stable within a run.
    pub fn build_headers(&self, token: &Token) -> Result<HeaderMap, DramaBoxError> {
        let cfg = &self.config;
        let mut headers = HeaderMap::new();

        headers.insert(USER_AGENT, HeaderValue::from_static("okhttp/4.10.0"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=UTF-8"),
        );
        headers.insert(
            HeaderName::from_static("tn"),
            HeaderValue::from_str(&format!("Bearer {}", token.token))?,
        );
        headers.insert(
            HeaderName::from_static("version"),
            HeaderValue::from_str(&cfg.version_code)?,
        );
        headers.insert(
            HeaderName::from_static("vn"),
            HeaderValue::from_str(&cfg.version_name)?,
        );
        headers.insert(
            HeaderName::from_static("cid"),
            HeaderValue::from_str(&cfg.cid)?,
        );
        headers.insert(
            HeaderName::from_static("package-name"),
            HeaderValue::from_str(&cfg.package_name)?,
        );
        headers.insert(
            HeaderName::from_static("apn"),
            HeaderValue::from_str(&cfg.apn)?,
        );
        headers.insert(
            HeaderName::from_static("device-id"),
            HeaderValue::from_str(&token.device_id)?,
        );
        headers.insert(
            HeaderName::from_static("language"),
            HeaderValue::from_str(&cfg.language)?,
        );
        headers.insert(
            HeaderName::from_static("current-language"),
            HeaderValue::from_str(&cfg.language)?,
        );
        headers.insert(
            HeaderName::from_static("p"),
            HeaderValue::from_str(&cfg.platform)?,
        );
        headers.insert(
            HeaderName::from_static("time-zone"),
            HeaderValue::from_str(&timezone_offset())?,
        );

        Ok(headers)
    }

    /// POST a JSON body to an upstream URL and return status + body verbatim.
    ///
    /// Never errors on a non-2xx status; that is the caller's to interpret.
    /// Transport faults (timeout, DNS, reset) are wrapped as `Upstream`.
    pub async fn post_upstream<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        headers: HeaderMap,
    ) -> Result<UpstreamResponse> {
        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(body)
            .timeout(UPSTREAM_TIMEOUT)
            .send()
            .await
            .map_err(DramaBoxError::Upstream)?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(DramaBoxError::Upstream)?;

        // The upstream answers JSON in practice; anything else passes
        // through as a plain string value
        let body = serde_json::from_str(&text).unwrap_or_else(|_| serde_json::Value::String(text));

        Ok(UpstreamResponse { status, body })
    }

    /// Run a request with a valid token; on 401/403 force one token refresh
    /// and retry exactly once, returning whatever the second attempt yields.
    pub async fn with_token_retry<F, Fut>(&self, request: F) -> Result<UpstreamResponse>
    where
        F: Fn(Token) -> Fut,
        Fut: Future<Output = Result<UpstreamResponse>>,
    {
        let token = self.get_token(false).await?;
        let first = request(token).await?;
        if !first.is_auth_failure() {
            return Ok(first);
        }

        let token = self.get_token(true).await?;
        request(token).await
    }

    /// List the latest dramas for a page
    pub async fn latest(&self, page_no: u32) -> Result<UpstreamResponse> {
        let url = format!("{}/vip", self.base_url);
        let body = LatestRequest::new(page_no, self.config.channel_id());
        self.post_with_retry(url, body).await
    }

    /// Fetch stream data for an episode of a drama
    pub async fn stream(&self, book_id: &str, index: u32) -> Result<UpstreamResponse> {
        let url = format!("{}/latest", self.base_url);
        let body = StreamRequest::new(book_id, index);
        self.post_with_retry(url, body).await
    }

    /// Search dramas by keyword
    pub async fn search(&self, keyword: &str) -> Result<UpstreamResponse> {
        let url = format!("{}/randomdrama", self.base_url);
        let body = SearchRequest::new(keyword);
        self.post_with_retry(url, body).await
    }

    /// Shared endpoint plumbing: header build + forward, retry-wrapped
    async fn post_with_retry<B: Serialize + Clone>(
        &self,
        url: String,
        body: B,
    ) -> Result<UpstreamResponse> {
        self.with_token_retry(|token| {
            let url = url.clone();
            let body = body.clone();
            async move {
                let headers = self.build_headers(&token)?;
                self.post_upstream(&url, &body, headers).await
            }
        })
        .await
    }
}

/// Lock the token slot, tolerating a poisoned mutex (the slot holds plain
/// data, so a panicking writer cannot leave it inconsistent)
fn lock_slot(slot: &Mutex<Option<CachedToken>>) -> std::sync::MutexGuard<'_, Option<CachedToken>> {
    slot.lock().unwrap_or_else(|e| e.into_inner())
}

/// Host-local UTC offset in `+HHMM` / `-HHMM` form
fn timezone_offset() -> String {
    let offset_secs = Local::now().offset().local_minus_utc();
    let sign = if offset_secs < 0 { '-' } else { '+' };
    let abs = offset_secs.unsigned_abs();
    format!("{}{:02}{:02}", sign, abs / 3600, (abs % 3600) / 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_token() -> Token {
        Token {
            token: "tok-123".to_string(),
            device_id: "dev-456".to_string(),
        }
    }

    #[test]
    fn test_timezone_offset_format() {
        let tz = timezone_offset();
        assert_eq!(tz.len(), 5);
        assert!(tz.starts_with('+') || tz.starts_with('-'));
        assert!(tz[1..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_build_headers_shape() {
        let client = DramaBoxClient::new(Config::default());
        let headers = client.build_headers(&test_token()).unwrap();

        assert_eq!(headers.get("tn").unwrap(), "Bearer tok-123");
        assert_eq!(headers.get("device-id").unwrap(), "dev-456");
        assert_eq!(headers.get("user-agent").unwrap(), "okhttp/4.10.0");
        assert_eq!(headers.get("accept-encoding").unwrap(), "gzip");
        assert_eq!(
            headers.get("content-type").unwrap(),
            "application/json; charset=UTF-8"
        );
        assert_eq!(headers.get("version").unwrap(), "430");
        assert_eq!(headers.get("vn").unwrap(), "4.3.0");
        assert_eq!(headers.get("cid").unwrap(), "DRA1000042");
        assert_eq!(headers.get("package-name").unwrap(), "com.storymatrix.drama");
        assert_eq!(headers.get("apn").unwrap(), "1");
        assert_eq!(headers.get("language").unwrap(), "in");
        assert_eq!(headers.get("current-language").unwrap(), "in");
        assert_eq!(headers.get("p").unwrap(), "43");
        assert!(headers.contains_key("time-zone"));
    }

    #[test]
    fn test_build_headers_deterministic() {
        let client = DramaBoxClient::new(Config::default());
        let token = test_token();

        let first = client.build_headers(&token).unwrap();
        let second = client.build_headers(&token).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_build_headers_uses_config_overrides() {
        let config = Config {
            language: "en".to_string(),
            cid: "DRA9999999".to_string(),
            ..Config::default()
        };
        let client = DramaBoxClient::new(config);
        let headers = client.build_headers(&test_token()).unwrap();

        assert_eq!(headers.get("language").unwrap(), "en");
        assert_eq!(headers.get("current-language").unwrap(), "en");
        assert_eq!(headers.get("cid").unwrap(), "DRA9999999");
    }

    #[test]
    fn test_build_headers_rejects_bad_token_value() {
        let client = DramaBoxClient::new(Config::default());
        let token = Token {
            token: "bad\ntoken".to_string(),
            device_id: "dev".to_string(),
        };
        assert!(client.build_headers(&token).is_err());
    }
}
