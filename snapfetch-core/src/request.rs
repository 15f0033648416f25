use std::fmt;

use crate::error::DispatchError;

/// A URL the caller wants fetched. Always non-empty once constructed.
///
/// Nothing else is checked here: scheme, host and syntax problems surface as
/// [`FetchError`](crate::FetchError)s from the network layer.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FetchRequest {
    url: String,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Result<Self, DispatchError> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(DispatchError::EmptyUrl);
        }
        Ok(Self { url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn into_url(self) -> String {
        self.url
    }
}

impl fmt::Debug for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FetchRequest").field(&self.url).finish()
    }
}

impl fmt::Display for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl TryFrom<&str> for FetchRequest {
    type Error = DispatchError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
