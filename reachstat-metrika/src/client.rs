//! Client for the Metrika reporting endpoint (`stat/v1/data`).
use crate::dates::DateRange;
use crate::types::{Report, ReportResponse};
use reachstat_common::{ReachError, Result};
use reachstat_config::MetrikaSettings;
use reachstat_http::{Auth, HttpClient, HttpError, RequestOpts};
use std::borrow::Cow;
use std::time::Duration;

const REPORT_PATH: &str = "stat/v1/data";
const METRICS: &str = "ym:s:visits,ym:s:pageviews,ym:s:users";
const DIMENSIONS: &str = "ym:s:date";
const SORT: &str = "ym:s:date";
const ROW_LIMIT: u32 = 1000;

/// Validated credentials for one counter.
#[derive(Clone)]
pub struct MetrikaCredentials {
    token: String,
    pub counter_id: u64,
}

impl std::fmt::Debug for MetrikaCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetrikaCredentials")
            .field("token", &"<redacted>")
            .field("counter_id", &self.counter_id)
            .finish()
    }
}

impl MetrikaCredentials {
    pub fn new(token: impl Into<String>, counter_id: u64) -> Self {
        Self {
            token: token.into(),
            counter_id,
        }
    }
}

/// Check that the OAuth token and counter id are present and the id is numeric.
pub fn validate_config(settings: &MetrikaSettings) -> Result<MetrikaCredentials> {
    let token = settings
        .api_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ReachError::Config("API_TOKEN is not set".into()))?;
    let raw_id = settings
        .counter_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ReachError::Config("COUNTER_ID is not set".into()))?;
    let counter_id = raw_id
        .parse::<u64>()
        .map_err(|_| ReachError::Config(format!("COUNTER_ID must be a number, got '{raw_id}'")))?;
    Ok(MetrikaCredentials::new(token, counter_id))
}

#[derive(Clone)]
pub struct MetrikaApi {
    http: HttpClient,
    credentials: MetrikaCredentials,
}

impl MetrikaApi {
    pub fn new(
        base_url: &str,
        credentials: MetrikaCredentials,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let http = HttpClient::new(base_url)
            .map_err(|e| ReachError::Config(format!("Metrika base URL: {e}")))?
            .with_timeout(timeout);
        Ok(Self { http, credentials })
    }

    pub fn counter_id(&self) -> u64 {
        self.credentials.counter_id
    }

    /// Fetch daily visits, pageviews and users for `range`, sorted by date.
    ///
    /// Status mapping: 401 → [`ReachError::Unauthorized`], 403 →
    /// [`ReachError::Forbidden`], 400 → [`ReachError::BadRequest`] with the
    /// message from the body, anything else → [`ReachError::Http`]. A 200 that
    /// carries a non-empty `errors` array is an [`ReachError::Api`].
    pub async fn get_report(&self, range: &DateRange) -> Result<Report> {
        let query = report_query(range, self.credentials.counter_id);
        tracing::info!(
            counter_id = self.credentials.counter_id,
            date_from = %range.date_from(),
            date_to = %range.date_to(),
            "metrika.report.request"
        );

        let resp: ReportResponse = self
            .http
            .get_json(
                REPORT_PATH,
                RequestOpts {
                    auth: Some(Auth::OAuth(&self.credentials.token)),
                    query: Some(query),
                    ..Default::default()
                },
            )
            .await
            .map_err(http_to_reach)?;

        if let Some(first) = resp.errors.first() {
            let message = first
                .message
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "unknown API error".to_string());
            tracing::warn!(error_type = ?first.error_type, %message, "metrika.report.embedded_error");
            return Err(ReachError::Api(format!("Yandex.Metrika: {message}")));
        }

        let total_rows = resp.total_rows;
        let report = Report::try_from(resp)?;
        tracing::info!(rows = report.rows.len(), ?total_rows, "metrika.report.received");
        Ok(report)
    }
}

fn report_query(range: &DateRange, counter_id: u64) -> Vec<(&'static str, Cow<'static, str>)> {
    vec![
        ("date1", range.date_from().to_string().into()),
        ("date2", range.date_to().to_string().into()),
        ("id", counter_id.to_string().into()),
        ("metrics", METRICS.into()),
        ("dimensions", DIMENSIONS.into()),
        ("sort", SORT.into()),
        ("limit", ROW_LIMIT.to_string().into()),
    ]
}

fn http_to_reach(err: HttpError) -> ReachError {
    match err {
        HttpError::Url(m) | HttpError::Build(m) => ReachError::Config(m),
        HttpError::Network(m) => ReachError::Transport(m),
        HttpError::Decode(m, _) => ReachError::Decode(m),
        HttpError::Api {
            status,
            message,
            body_snippet,
        } => match status.as_u16() {
            401 => ReachError::Unauthorized,
            403 => ReachError::Forbidden,
            400 => ReachError::BadRequest(message.unwrap_or_else(|| "malformed request".into())),
            code => ReachError::Http {
                status: code,
                message: message.unwrap_or(body_snippet),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn settings(token: Option<&str>, id: Option<&str>) -> MetrikaSettings {
        MetrikaSettings {
            api_token: token.map(String::from),
            counter_id: id.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn config_requires_token_and_numeric_id() {
        let creds = validate_config(&settings(Some("tok"), Some(" 105562414 "))).unwrap();
        assert_eq!(creds.counter_id, 105562414);

        for (token, id) in [
            (None, Some("1")),
            (Some("  "), Some("1")),
            (Some("tok"), None),
            (Some("tok"), Some("abc")),
            (Some("tok"), Some("-5")),
        ] {
            let err = validate_config(&settings(token, id)).unwrap_err();
            assert!(matches!(err, ReachError::Config(_)), "{token:?}/{id:?}");
        }
    }

    #[test]
    fn debug_output_hides_token() {
        let creds = MetrikaCredentials::new("very-secret", 7);
        let shown = format!("{creds:?}");
        assert!(!shown.contains("very-secret"));
        assert!(shown.contains("counter_id: 7"));
    }

    #[test]
    fn query_carries_fixed_metric_list() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        let range = DateRange::default_window(today);
        let q = report_query(&range, 42);
        let get = |k: &str| q.iter().find(|(n, _)| *n == k).map(|(_, v)| v.to_string());
        assert_eq!(get("date1").as_deref(), Some("2024-01-01"));
        assert_eq!(get("date2").as_deref(), Some("2024-01-07"));
        assert_eq!(get("id").as_deref(), Some("42"));
        assert_eq!(get("metrics").as_deref(), Some(METRICS));
        assert_eq!(get("sort").as_deref(), Some("ym:s:date"));
        assert_eq!(get("limit").as_deref(), Some("1000"));
    }
}
