//! `reqwest`-backed implementation of [`DashboardApi`].

use std::time::Duration;

use reqwest::{Client, Response};
use serde_json::Value;
use url::Url;

use statdash_protocol::{
    ChatReply, ChatRequest, FilterCriteria, FilterResponse, ProtocolError, WelcomeResponse,
    CHAT_PATH, FILTER_PATH, WELCOME_PATH,
};

use crate::{ApiFuture, ClientError, DashboardApi};

const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// HTTP client bound to one backend base address.
#[derive(Debug, Clone)]
pub struct HttpDashboardClient {
    http: Client,
    base_url: String,
}

impl HttpDashboardClient {
    /// Build a client. `timeout` of `None` leaves requests unbounded.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ProtocolError::InvalidBaseUrl(base_url.to_string()).into());
        }
        Url::parse(trimmed)?;

        let mut builder = Client::builder().user_agent(APP_USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: trimmed.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(Url::parse(&format!("{}{}", self.base_url, path))?)
    }

    /// Full filter URL. No `?` is appended when no criteria are set.
    pub fn filter_url(&self, criteria: &FilterCriteria) -> Result<Url, ClientError> {
        let mut url = self.endpoint(FILTER_PATH)?;
        let pairs = criteria.query_pairs();
        if !pairs.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in pairs {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn get_filter(&self, criteria: &FilterCriteria) -> Result<FilterResponse, ClientError> {
        let url = self.filter_url(criteria)?;
        tracing::debug!(url = %url, "Sending filter request");
        let response = self.http.get(url).send().await?;
        decode(response).await
    }

    async fn post_chat(&self, request: &ChatRequest) -> Result<ChatReply, ClientError> {
        let url = self.endpoint(CHAT_PATH)?;
        tracing::debug!(url = %url, user_id = %request.user_id, "Sending chat message");
        let response = self.http.post(url).json(request).send().await?;
        decode(response).await
    }

    async fn get_welcome(&self) -> Result<WelcomeResponse, ClientError> {
        let url = self.endpoint(WELCOME_PATH)?;
        let response = self.http.get(url).send().await?;
        decode(response).await
    }
}

impl DashboardApi for HttpDashboardClient {
    fn filter<'a>(&'a self, criteria: &'a FilterCriteria) -> ApiFuture<'a, FilterResponse> {
        Box::pin(self.get_filter(criteria))
    }

    fn chat<'a>(&'a self, request: &'a ChatRequest) -> ApiFuture<'a, ChatReply> {
        Box::pin(self.post_chat(request))
    }

    fn welcome(&self) -> ApiFuture<'_, WelcomeResponse> {
        Box::pin(self.get_welcome())
    }
}

/// Decode a JSON body, turning non-2xx statuses into [`ClientError::Status`].
async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        let embedded_error = serde_json::from_slice::<Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string));
        tracing::debug!(status = status.as_u16(), "Backend returned failure status");
        return Err(ClientError::Status {
            status: status.as_u16(),
            embedded_error,
        });
    }

    Ok(serde_json::from_slice(&body)?)
}
