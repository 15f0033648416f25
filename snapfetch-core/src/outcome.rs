use std::{error::Error as StdError, fmt, path::PathBuf};

use crate::{
    error::{DecodeError, DispatchError, FetchError, PersistError},
    raster::DecodedImage,
};

/// Result of one load-then-persist run.
///
/// Callers that only care about presence use [`FetchOutcome::into_image`];
/// the variants keep the reason for everything else.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Decoded and written to `path`.
    Loaded { image: DecodedImage, path: PathBuf },
    /// Decoded, but the PNG copy could not be written.
    PersistFailed {
        image: DecodedImage,
        error: PersistError,
    },
    FetchFailed(FetchError),
    DecodeFailed(DecodeError),
    /// The pipeline never ran (or its worker died).
    Rejected(DispatchError),
}

/// Payload-free discriminant of [`FetchOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OutcomeKind {
    Loaded,
    PersistFailed,
    FetchFailed,
    DecodeFailed,
    Rejected,
}

impl FetchOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            FetchOutcome::Loaded { .. } => OutcomeKind::Loaded,
            FetchOutcome::PersistFailed { .. } => OutcomeKind::PersistFailed,
            FetchOutcome::FetchFailed(_) => OutcomeKind::FetchFailed,
            FetchOutcome::DecodeFailed(_) => OutcomeKind::DecodeFailed,
            FetchOutcome::Rejected(_) => OutcomeKind::Rejected,
        }
    }

    pub fn image(&self) -> Option<&DecodedImage> {
        match self {
            FetchOutcome::Loaded { image, .. }
            | FetchOutcome::PersistFailed { image, .. } => Some(image),
            _ => None,
        }
    }

    pub fn into_image(self) -> Option<DecodedImage> {
        match self {
            FetchOutcome::Loaded { image, .. }
            | FetchOutcome::PersistFailed { image, .. } => Some(image),
            _ => None,
        }
    }

    /// Where the copy landed, only when the write succeeded.
    pub fn persisted_path(&self) -> Option<&PathBuf> {
        match self {
            FetchOutcome::Loaded { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn has_image(&self) -> bool {
        self.image().is_some()
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, FetchOutcome::Loaded { .. })
    }

    pub fn failure(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            FetchOutcome::Loaded { .. } => None,
            FetchOutcome::PersistFailed { error, .. } => Some(error),
            FetchOutcome::FetchFailed(err) => Some(err),
            FetchOutcome::DecodeFailed(err) => Some(err),
            FetchOutcome::Rejected(err) => Some(err),
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OutcomeKind::Loaded => "loaded",
            OutcomeKind::PersistFailed => "persist_failed",
            OutcomeKind::FetchFailed => "fetch_failed",
            OutcomeKind::DecodeFailed => "decode_failed",
            OutcomeKind::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

impl From<FetchError> for FetchOutcome {
    fn from(err: FetchError) -> Self {
        FetchOutcome::FetchFailed(err)
    }
}

impl From<DecodeError> for FetchOutcome {
    fn from(err: DecodeError) -> Self {
        FetchOutcome::DecodeFailed(err)
    }
}

impl From<DispatchError> for FetchOutcome {
    fn from(err: DispatchError) -> Self {
        FetchOutcome::Rejected(err)
    }
}
