use std::{error::Error as StdError, path::Path};

use serde::Serialize;
use snapfetch_core::{DecodedImage, FetchCompletion, FetchOutcome};

/// One printable line per completion.
#[derive(Debug, Serialize)]
pub struct CompletionReport<'a> {
    pub url: &'a str,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<&'a Path>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<'a> CompletionReport<'a> {
    pub fn from_completion(completion: &'a FetchCompletion) -> Self {
        let outcome = &completion.outcome;
        let dims = outcome.image().map(DecodedImage::dimensions);
        Self {
            url: &completion.url,
            outcome: outcome.kind().to_string(),
            width: dims.map(|(w, _)| w),
            height: dims.map(|(_, h)| h),
            path: outcome.persisted_path().map(|p| p.as_path()),
            error: outcome.failure().map(error_chain),
        }
    }

    pub fn to_text(&self) -> String {
        let mut line = format!("{:<14} {}", self.outcome, self.url);
        if let (Some(w), Some(h)) = (self.width, self.height) {
            line.push_str(&format!(" {w}x{h}"));
        }
        if let Some(path) = self.path {
            line.push_str(&format!(" -> {}", path.display()));
        }
        if let Some(error) = &self.error {
            line.push_str(&format!(": {error}"));
        }
        line
    }
}

/// Images gathered from every completion, in arrival order.
#[derive(Debug, Default)]
pub struct Gallery {
    images: Vec<DecodedImage>,
    persisted: usize,
    failed: usize,
}

impl Gallery {
    pub fn push(&mut self, outcome: FetchOutcome) {
        if outcome.is_loaded() {
            self.persisted += 1;
        }
        match outcome.into_image() {
            Some(image) => self.images.push(image),
            None => self.failed += 1,
        }
    }

    pub fn images(&self) -> &[DecodedImage] {
        &self.images
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn summary(&self) -> GallerySummary {
        GallerySummary {
            images: self.images.len(),
            persisted: self.persisted,
            failed: self.failed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GallerySummary {
    pub images: usize,
    pub persisted: usize,
    pub failed: usize,
}

impl GallerySummary {
    pub fn to_text(self) -> String {
        format!(
            "{} image(s) loaded, {} persisted, {} failed",
            self.images, self.persisted, self.failed
        )
    }
}

/// Display `err` and its causes, skipping any cause whose text the message
/// already shows (e.g. `#[error("...: {0}")]` over a `#[from]` field).
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
