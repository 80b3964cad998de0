//! Fetching barcode images from the chart service.

use log::debug;
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use std::fmt;
use std::time::Duration;

/// Default request timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Something that can turn a chart URL into image bytes.
pub trait ChartFetcher {
    /// Fetch the image at `url`.
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError>;
}

/// Blocking HTTP fetcher.
///
/// Makes one attempt per call; retrying is left to the caller.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Http(e.to_string()))?;
        Ok(Self { client })
    }
}

impl ChartFetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| FetchError::Http(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .map_err(|e| FetchError::Http(e.to_string()))?;
        debug!("received {} bytes", body.len());
        Ok(body.to_vec())
    }
}

/// Errors that can occur while fetching a barcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Transport failure (connect, timeout, body read).
    Http(String),
    /// The service answered with a status other than 200.
    Status(u16),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "request failed: {}", e),
            Self::Status(code) => write!(f, "chart service returned HTTP {}", code),
        }
    }
}

impl std::error::Error for FetchError {}
