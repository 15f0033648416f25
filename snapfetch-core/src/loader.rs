//! HTTP retrieval of image bodies.

use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use tracing::debug;

use crate::error::FetchError;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Network settings for [`HttpImageLoader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Upper bound on the whole request, body included.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Source of raw image bytes.
#[async_trait::async_trait]
pub trait ImageLoader: Send + Sync {
    /// Fetch the full body behind `url`.
    async fn load(&self, url: &str) -> Result<Bytes, FetchError>;
}

/// Plain GET loader: no custom headers, no auth, reqwest's redirect defaults.
#[derive(Debug, Clone)]
pub struct HttpImageLoader {
    client: Client,
}

impl HttpImageLoader {
    pub fn new(options: &FetchOptions) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(options.request_timeout)
            .connect_timeout(options.connect_timeout)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ImageLoader for HttpImageLoader {
    async fn load(&self, url: &str) -> Result<Bytes, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status,
                url: url.to_string(),
            });
        }

        // hyper stops at the declared Content-Length and errors on early EOF
        let bytes =
            response
                .bytes()
                .await
                .map_err(|source| FetchError::Body {
                    url: url.to_string(),
                    source,
                })?;

        if bytes.is_empty() {
            return Err(FetchError::EmptyBody {
                url: url.to_string(),
            });
        }

        debug!(%url, %status, bytes = bytes.len(), "fetched image body");
        Ok(bytes)
    }
}
