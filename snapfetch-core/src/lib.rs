//! # snapfetch-core
//!
//! Load-then-persist for a single image: GET a URL, decode the body once,
//! write a PNG copy to a caller-chosen file, and hand the decoded image back.
//!
//! The entry point is [`ImageFetchService`]. [`ImageFetchService::submit`]
//! returns a [`PendingFetch`] future, [`ImageFetchService::submit_to`]
//! delivers a [`FetchCompletion`] on a channel, and
//! [`ImageFetchService::fetch_and_persist`] runs inline. All three resolve to
//! a [`FetchOutcome`] that separates fetch, decode and persist failures;
//! [`FetchOutcome::into_image`] collapses it to presence or absence.
//!
//! ```no_run
//! # async fn run() -> Result<(), snapfetch_core::FetchError> {
//! use snapfetch_core::{FetchOptions, ImageFetchService, PngFileStore};
//!
//! let service = ImageFetchService::new(&FetchOptions::default())?;
//! let store = PngFileStore::new("./cache/images");
//!
//! if let Some(image) = service
//!     .submit("https://example.com/cat.jpg", store)
//!     .await
//!     .into_image()
//! {
//!     println!("{}x{}", image.width(), image.height());
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;
pub mod outcome;
pub mod raster;
pub mod request;
pub mod service;
pub mod store;

pub use error::{DecodeError, DispatchError, FetchError, PersistError};
pub use loader::{FetchOptions, HttpImageLoader, ImageLoader};
pub use outcome::{FetchOutcome, OutcomeKind};
pub use raster::{DecodedImage, decode, encode_png};
pub use request::FetchRequest;
pub use service::{FetchCompletion, ImageFetchService, PendingFetch};
pub use store::{DEFAULT_FILE_NAME, PngFileStore};
