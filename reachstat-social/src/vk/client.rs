//! Thin wrapper around `https://api.vk.com/method/<name>`.
//!
//! Every call carries `access_token` and `v`. VK reports most failures as
//! HTTP 200 with an `error` object, so [`VkApi::call`] unwraps the envelope and
//! turns that object into [`ReachError::Api`].
use crate::vk::types::Envelope;
use reachstat_common::{ReachError, Result};
use reachstat_http::{Auth, HttpClient, HttpError, RequestOpts};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::time::Duration;

#[derive(Clone)]
pub struct VkApi {
    http: HttpClient,
    access_token: String,
    version: String,
}

impl VkApi {
    pub fn new(
        base_url: &str,
        access_token: impl Into<String>,
        version: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let http = HttpClient::new(base_url)
            .map_err(|e| ReachError::Config(format!("VK base URL: {e}")))?
            .with_timeout(timeout);
        Ok(Self {
            http,
            access_token: access_token.into(),
            version: version.into(),
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Call `method` and decode its `response` payload.
    pub async fn call<T>(&self, method: &str, params: Vec<(&str, Cow<'_, str>)>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let mut query = params;
        query.push(("v", Cow::Owned(self.version.clone())));

        let envelope: Envelope<T> = self
            .http
            .get_json(
                &format!("method/{method}"),
                RequestOpts {
                    auth: Some(Auth::Query {
                        name: "access_token",
                        value: Cow::Borrowed(self.access_token.as_str()),
                    }),
                    query: Some(query),
                    ..Default::default()
                },
            )
            .await
            .map_err(http_to_reach)?;

        if let Some(err) = envelope.error {
            tracing::warn!(
                method,
                error_code = err.error_code,
                error_msg = %err.error_msg,
                "vk.api.error"
            );
            return Err(ReachError::Api(format!(
                "{method}: {} (code {})",
                err.error_msg, err.error_code
            )));
        }
        envelope.response.ok_or_else(|| {
            ReachError::Decode(format!("{method}: response has neither 'response' nor 'error'"))
        })
    }
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
        } => ReachError::Http {
            status: status.as_u16(),
            message: message.unwrap_or(body_snippet),
        },
    }
}
