use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use portal_core::{PortalConfig, PortalError, PortalResult};

/// Thin wrapper over `reqwest` that knows the API base URL and how the API
/// reports failures.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

/// Error bodies carry their message under `error` (auth endpoints) or `msg`
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

/// Where a failure's message was found.
///
/// Controllers reply under `error`; the token layer in front of them replies
/// under `msg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MessageSource {
    Error,
    Msg,
    Message,
    Raw,
    Status,
}

/// A non-success response, read to the end
#[derive(Debug)]
pub(crate) struct ApiFailure {
    pub status: u16,
    pub message: String,
    pub source: MessageSource,
}

impl ApiFailure {
    pub(crate) async fn read(response: Response) -> Self {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let (message, source) = error_message(&text).unwrap_or_else(|| {
            let reason = status.canonical_reason().unwrap_or("Unknown error");
            (reason.to_string(), MessageSource::Status)
        });
        debug!(status = status.as_u16(), %message, ?source, "API request failed");

        Self {
            status: status.as_u16(),
            message,
            source,
        }
    }

    pub(crate) fn into_error(self) -> PortalError {
        PortalError::from_status(self.status, self.message)
    }
}

impl ApiClient {
    pub fn new(config: &PortalConfig) -> PortalResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| {
                PortalError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.api_base_url().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!(%method, %url, "API request");
        self.client.request(method, url)
    }

    /// Send `request` and decode a successful JSON body into `T`
    pub(crate) async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> PortalResult<T> {
        let response = request.send().await?;
        let response = Self::check(response).await?;
        let body = response.json::<T>().await?;
        Ok(body)
    }

    /// Turn a non-success response into the matching `PortalError`
    pub(crate) async fn check(response: Response) -> PortalResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        Err(ApiFailure::read(response).await.into_error())
    }
}

fn error_message(body: &str) -> Option<(String, MessageSource)> {
    if body.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed
            .error
            .map(|m| (m, MessageSource::Error))
            .or(parsed.msg.map(|m| (m, MessageSource::Msg)))
            .or(parsed.message.map(|m| (m, MessageSource::Message))),
        Err(_) => Some((body.trim().to_string(), MessageSource::Raw)),
    }
}
