//! Minimal async JSON-over-HTTP client with safe logging and flexible auth.
//!
//! - Request options: headers, [`Auth`], query params, optional timeout
//! - Redacts sensitive query params and never logs secret values
//! - Non-success responses become [`HttpError::Api`] with the status code and
//!   whatever message could be dug out of the error body
//! - Optional *raw* request/response logging via `REACHSTAT_HTTP_RAW=1`
//!
//! There are no retries. Every call is exactly one request; callers that need
//! pacing between requests do it themselves.
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), reachstat_http::HttpError> {
//! let client = reachstat_http::HttpClient::new("https://api.example.com")?;
//! let got: serde_json::Value = client
//!     .get_json("v1/items", reachstat_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::env;
use std::time::Duration;
use thiserror::Error;

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "REACHSTAT_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;

const SECRET_PARAMS: &[&str] = &[
    "access_token",
    "authorization",
    "auth",
    "key",
    "api_key",
    "token",
    "oauth_token",
    "secret",
    "client_secret",
];

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn is_secret_param(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    SECRET_PARAMS.contains(&lower.as_str())
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{method}")];
    for (name, val) in redact_headers(headers) {
        parts.push(format!("-H '{}: {}'", name, val.replace('\'', r"'\''")));
    }
    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = redact_pairs(
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned())),
    );
    if pairs.is_empty() {
        shown.set_query(None);
    } else {
        shown.query_pairs_mut().clear().extend_pairs(pairs);
    }
    parts.push(format!("'{}'", shown.as_str()));
    parts.join(" ")
}

fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let val = if key.eq_ignore_ascii_case(AUTHORIZATION.as_str()) {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
            (key, val)
        })
        .collect()
}

fn redact_pairs<I>(pairs: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (String, String)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| {
            let v = if is_secret_param(&k) {
                "<redacted>".to_string()
            } else {
                v
            };
            (k, v)
        })
        .collect()
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {}", api_detail(.message, .body_snippet))]
    Api {
        status: StatusCode,
        /// Message extracted from a JSON error body, if one was recognised.
        message: Option<String>,
        body_snippet: String,
    },
}

fn api_detail<'a>(message: &'a Option<String>, body_snippet: &'a str) -> &'a str {
    message.as_deref().unwrap_or(body_snippet)
}

// ==============================
// Auth & Request Options
// ==============================

/// Authentication strategies supported by the client.
///
/// ```
/// use reachstat_http::Auth;
///
/// let oauth = Auth::OAuth("token");
/// assert_eq!(oauth.kind(), "oauth");
/// ```
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// Authorization: Bearer <token>
    Bearer(&'a str),
    /// Authorization: OAuth <token> (Yandex APIs)
    OAuth(&'a str),
    /// Custom header
    Header {
        name: HeaderName,
        value: HeaderValue,
    },
    /// Auth via query param (e.g. VK `access_token`)
    Query {
        name: &'a str,
        value: Cow<'a, str>,
    },
    None,
}

impl Auth<'_> {
    /// Short label used in logs instead of the secret itself.
    pub fn kind(&self) -> &'static str {
        match self {
            Auth::Bearer(_) => "bearer",
            Auth::OAuth(_) => "oauth",
            Auth::Header { .. } => "header",
            Auth::Query { .. } => "query",
            Auth::None => "none",
        }
    }
}

/// Per-request tuning knobs.
///
/// ```
/// use reachstat_http::{Auth, RequestOpts};
/// use std::borrow::Cow;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     auth: Some(Auth::Query {
///         name: "access_token",
///         value: Cow::Borrowed("demo"),
///     }),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// assert!(opts.query.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
}

// ==============================
// Client
// ==============================

#[derive(Clone, Debug)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    /// Applied when a request does not set its own timeout. `None` waits forever.
    pub default_timeout: Option<Duration>,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```no_run
    /// use reachstat_http::{HttpClient, HttpError};
    ///
    /// let client = HttpClient::new("https://api.vk.com")?;
    /// assert_eq!(client.base().as_str(), "https://api.vk.com/");
    /// assert!(client.default_timeout.is_none());
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let mut base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: None,
        })
    }

    /// Set the timeout used for requests that don't carry their own.
    pub fn with_timeout(mut self, dur: Option<Duration>) -> Self {
        self.default_timeout = dur;
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// GET JSON with per-request options (headers/query/auth/timeout).
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        self.request_json(Method::GET, path, opts).await
    }

    async fn request_json<T>(
        &self,
        method: Method,
        path: &str,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let url = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|e| HttpError::Url(e.to_string()))?;

        let mut query: Vec<(&str, Cow<'_, str>)> = opts.query.clone().unwrap_or_default();
        let mut headers = opts.headers.clone().unwrap_or_default();

        match &opts.auth {
            Some(Auth::Bearer(tok)) => {
                let tok = sanitize_token(tok)?;
                headers.insert(AUTHORIZATION, header_value(&format!("Bearer {tok}"))?);
            }
            Some(Auth::OAuth(tok)) => {
                let tok = sanitize_token(tok)?;
                headers.insert(AUTHORIZATION, header_value(&format!("OAuth {tok}"))?);
            }
            Some(Auth::Header { name, value }) => {
                headers.insert(name.clone(), value.clone());
            }
            Some(Auth::Query { name, value }) => {
                query.push((*name, value.clone()));
            }
            Some(Auth::None) | None => {}
        }

        let pairs: Vec<(&str, &str)> = query.iter().map(|(k, v)| (*k, v.as_ref())).collect();
        let mut rb = self
            .inner
            .request(method.clone(), url.clone())
            .query(&pairs)
            .headers(headers.clone());
        let timeout = opts.timeout.or(self.default_timeout);
        if let Some(t) = timeout {
            rb = rb.timeout(t);
        }

        let request = rb.build().map_err(|e| HttpError::Build(e.to_string()))?;

        // ----- Safe request logging (pre-send) -----
        let auth_kind = opts.auth.as_ref().map_or("none", |a| a.kind());
        let redacted_q = redact_pairs(
            query
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.as_ref().to_string())),
        );
        let req_id = next_request_id();

        tracing::debug!(
            req_id=%req_id,
            method=%method,
            host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
            query=?redacted_q,
            timeout_ms=?timeout.map(|t| t.as_millis() as u64),
            auth_kind,
            "http.request.start"
        );

        if raw_enabled() {
            let curl = make_curl(&method, request.url(), &headers);
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        // ----- Send -----
        let t0 = std::time::Instant::now();
        let resp = self.inner.execute(request).await.map_err(|err| {
            let message = err.to_string();
            tracing::warn!(req_id=%req_id, message=%message, "http.network_error.send");
            HttpError::Network(message)
        })?;
        let status = resp.status();
        let resp_headers = resp.headers().clone();
        let bytes = resp.bytes().await.map_err(|err| {
            let message = err.to_string();
            tracing::warn!(req_id=%req_id, message=%message, "http.network_error.body");
            HttpError::Network(message)
        })?;
        let dur_ms = t0.elapsed().as_millis() as u64;

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=dur_ms,
            body_len=bytes.len(),
            "http.response.headers"
        );

        if raw_enabled() {
            let hdrs = redact_headers(&resp_headers);
            let truncated = bytes.len() > RAW_MAX_BODY;
            let shown = &bytes[..bytes.len().min(RAW_MAX_BODY)];
            let text = String::from_utf8_lossy(shown);
            tracing::info!(
                target: "http.raw",
                %req_id,
                status=%status,
                duration_ms=dur_ms,
                headers=?hdrs,
                body=%text,
                truncated
            );
        }

        let snippet = snip_body(&bytes);
        tracing::trace!(req_id=%req_id, body_snippet=%snippet, "http.response.body_snippet");

        if status.is_success() {
            return serde_json::from_slice::<T>(&bytes).map_err(|e| {
                tracing::warn!(
                    req_id=%req_id,
                    serde_line=%e.line(),
                    serde_col=%e.column(),
                    serde_err=%e.to_string(),
                    body_snippet=%snippet,
                    "http.response.decode_error"
                );
                HttpError::Decode(e.to_string(), snippet)
            });
        }

        let message = extract_error_message(&bytes);
        tracing::warn!(
            req_id=%req_id,
            %status,
            message=?message,
            body_snippet=%snippet,
            "http.error"
        );
        Err(HttpError::Api {
            status,
            message,
            body_snippet: snippet,
        })
    }
}

// ==============================
// Helpers
// ==============================

fn next_request_id() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    format!("r{}", COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Pull a human-readable message out of a JSON error body.
///
/// Recognised shapes, in order:
/// - `{"message": "..."}` (Yandex, generic)
/// - `{"error": {"error_msg": "..."}}` (VK) or `{"error": {"message": "..."}}`
/// - `{"errors": [{"message": "..."}]}`
/// - `{"error": "..."}`
fn extract_error_message(body: &[u8]) -> Option<String> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ErrorField {
        Detail {
            #[serde(default)]
            error_msg: String,
            #[serde(default)]
            message: String,
        },
        Text(String),
    }

    #[derive(Deserialize)]
    struct ErrItem {
        #[serde(default)]
        message: String,
    }

    #[derive(Deserialize)]
    struct Envelope {
        #[serde(default)]
        message: String,
        #[serde(default)]
        error: Option<ErrorField>,
        #[serde(default)]
        errors: Vec<ErrItem>,
    }

    let env: Envelope = serde_json::from_slice(body).ok()?;
    if !env.message.is_empty() {
        return Some(env.message);
    }
    match env.error {
        Some(ErrorField::Detail { error_msg, .. }) if !error_msg.is_empty() => {
            return Some(error_msg);
        }
        Some(ErrorField::Detail { message, .. }) if !message.is_empty() => return Some(message),
        Some(ErrorField::Text(text)) if !text.is_empty() => return Some(text),
        _ => {}
    }
    env.errors
        .into_iter()
        .map(|e| e.message)
        .find(|m| !m.is_empty())
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > SNIPPET_MAX {
        let mut cut = SNIPPET_MAX;
        while !snip.is_char_boundary(cut) {
            cut -= 1;
        }
        snip.truncate(cut);
        snip.push_str("...");
    }
    snip
}

fn header_value(raw: &str) -> Result<HeaderValue, HttpError> {
    HeaderValue::from_str(raw)
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))
}

fn sanitize_token(raw: &str) -> Result<String, HttpError> {
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    s.retain(|ch| !ch.is_ascii_whitespace());

    if s.is_empty() {
        return Err(HttpError::Build("token is empty".into()));
    }
    if !s.is_ascii() {
        return Err(HttpError::Build("token contains non-ASCII bytes".into()));
    }
    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build("token contains control characters".into()));
    }
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_top_level_message_first() {
        let body = br#"{"errors":[{"message":"inner"}],"code":400,"message":"Wrong parameter: date1"}"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("Wrong parameter: date1")
        );
    }

    #[test]
    fn extracts_vk_error_msg() {
        let body = br#"{"error":{"error_code":5,"error_msg":"User authorization failed"}}"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("User authorization failed")
        );
    }

    #[test]
    fn falls_back_to_errors_array_then_none() {
        let body = br#"{"errors":[{"message":""},{"message":"second"}]}"#;
        assert_eq!(extract_error_message(body).as_deref(), Some("second"));
        assert_eq!(extract_error_message(b"<html>oops</html>"), None);
    }

    #[test]
    fn api_error_display_prefers_message() {
        let err = HttpError::Api {
            status: StatusCode::BAD_GATEWAY,
            message: None,
            body_snippet: "upstream down".into(),
        };
        assert_eq!(
            err.to_string(),
            "server returned error 502 Bad Gateway: upstream down"
        );
    }

    #[test]
    fn snippet_truncates_on_char_boundary() {
        let body = "я".repeat(400);
        let snip = snip_body(body.as_bytes());
        assert!(snip.ends_with("..."));
        assert!(snip.len() <= SNIPPET_MAX + 3);
    }

    #[test]
    fn secrets_are_redacted_in_curl() {
        let url = Url::parse("https://api.vk.com/method/users.get?user_ids=1&access_token=abc").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("OAuth secret"));
        let curl = make_curl(&Method::GET, &url, &headers);
        assert!(!curl.contains("abc"));
        assert!(!curl.contains("secret"));
        assert!(curl.contains("user_ids=1"));
    }

    #[test]
    fn sanitize_strips_quotes_and_whitespace() {
        assert_eq!(sanitize_token(" 'ab c' ").unwrap(), "abc");
        assert!(sanitize_token("   ").is_err());
        assert!(sanitize_token("tökén").is_err());
    }

    #[test]
    fn base_gets_trailing_slash() {
        let client = HttpClient::new("http://127.0.0.1:9000/api").unwrap();
        assert_eq!(client.base().as_str(), "http://127.0.0.1:9000/api/");
    }
}
