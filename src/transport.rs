use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};

use crate::error::HarvestError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Single-shot GET. Anything other than a successful response with a body
/// comes back as `Err`; callers decide what a failure means for them.
pub trait Transport: Send + Sync {
    fn fetch(&self, url: &str) -> Result<TransportResponse, HarvestError>;
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, HarvestError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, HarvestError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("pdf-harvest/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| HarvestError::Http(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| HarvestError::Http(err.to_string()))?;
        Ok(Self { client })
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, HarvestError> {
        match status_error(response.status()) {
            Some(err) => Err(err),
            None => Ok(response),
        }
    }
}

fn status_error(status: StatusCode) -> Option<HarvestError> {
    if status.is_success() {
        return None;
    }
    let message = status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string();
    Some(HarvestError::HttpStatus {
        status: status.as_u16(),
        message,
    })
}

/// A missing or non-text `Content-Type` reads as empty, which no PDF check
/// accepts.
fn content_type_of(headers: &HeaderMap) -> String {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

impl Transport for HttpTransport {
    fn fetch(&self, url: &str) -> Result<TransportResponse, HarvestError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| HarvestError::Http(err.to_string()))?;
        let response = Self::handle_status(response)?;
        let content_type = content_type_of(response.headers());
        let body = response
            .bytes()
            .map_err(|err| HarvestError::Http(err.to_string()))?
            .to_vec();
        Ok(TransportResponse { content_type, body })
    }
}
