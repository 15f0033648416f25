use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Failures while retrieving the response body.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    HttpStatus { status: StatusCode, url: String },

    #[error("Empty response body from {url}")]
    EmptyBody { url: String },

    /// The body ended early or the connection dropped mid-read.
    #[error("Failed to read response body from {url}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    /// HTTP status carried by the failure, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::HttpStatus { status, .. } => Some(*status),
            FetchError::Http(err) => err.status(),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            FetchError::Http(err) | FetchError::Body { source: err, .. } => {
                err.is_timeout()
            }
            _ => false,
        }
    }
}

/// Failures turning response bytes into a raster image.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Decoded image has invalid dimensions {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    #[error("Decode task failed: {0}")]
    Task(String),
}

/// Failures writing the PNG copy. Never affects the returned image.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Failed to encode PNG: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Encode task failed: {0}")]
    Task(String),
}

/// Reasons the pipeline never ran to completion on a worker.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Request URL is empty")]
    EmptyUrl,

    #[error("No Tokio runtime available to run the fetch")]
    NoRuntime,

    #[error("Fetch worker failed: {0}")]
    Worker(String),
}
