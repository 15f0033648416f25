use std::{
    any::type_name_of_val,
    fmt,
    future::Future,
    panic::AssertUnwindSafe,
    path::PathBuf,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use bytes::Bytes;
use futures::{
    FutureExt,
    future::{self, BoxFuture},
};
use tokio::{runtime::Handle, sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    error::{DecodeError, DispatchError, FetchError, PersistError},
    loader::{FetchOptions, HttpImageLoader, ImageLoader},
    outcome::FetchOutcome,
    raster::{self, DecodedImage},
    request::FetchRequest,
    store::PngFileStore,
};

/// Fetches an image, decodes it once, persists a PNG copy, and hands the
/// decoded image back.
///
/// Stages run strictly in order: fetch, decode, persist, deliver. Decode and
/// PNG encoding run on the blocking pool so the async workers stay free.
#[derive(Clone)]
pub struct ImageFetchService {
    loader: Arc<dyn ImageLoader>,
}

impl fmt::Debug for ImageFetchService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFetchService")
            .field("loader", &type_name_of_val(self.loader.as_ref()))
            .finish()
    }
}

impl ImageFetchService {
    /// Service backed by [`HttpImageLoader`].
    pub fn new(options: &FetchOptions) -> Result<Self, FetchError> {
        let loader = HttpImageLoader::new(options)?;
        Ok(Self::with_loader(Arc::new(loader)))
    }

    pub fn with_loader(loader: Arc<dyn ImageLoader>) -> Self {
        Self { loader }
    }

    /// Run the whole pipeline on the current task.
    ///
    /// Fetch and decode failures leave `store` untouched. A persist failure
    /// is logged and reported, but the image is still returned.
    pub async fn fetch_and_persist(
        &self,
        request: &FetchRequest,
        store: &PngFileStore,
    ) -> FetchOutcome {
        let url = request.url();
        info!("[fetch_and_persist] Fetching image: url={}", url);

        let bytes = match self.loader.load(url).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(
                    "[fetch_and_persist] Fetch failed: url={}, status={:?}, err={}",
                    url,
                    err.status(),
                    err
                );
                return FetchOutcome::FetchFailed(err);
            }
        };

        let image = match decode_off_thread(bytes).await {
            Ok(image) => image,
            Err(err) => {
                warn!(
                    "[fetch_and_persist] Response is not a decodable image: url={}, err={}",
                    url, err
                );
                return FetchOutcome::DecodeFailed(err);
            }
        };
        debug!(
            "[fetch_and_persist] Decoded image: url={}, dimensions={}x{}",
            url,
            image.width(),
            image.height()
        );

        match persist(&image, store).await {
            Ok(path) => {
                info!(
                    "[fetch_and_persist] Saved image: url={}, path={:?}",
                    url, path
                );
                FetchOutcome::Loaded { image, path }
            }
            Err(error) => {
                warn!(
                    "[fetch_and_persist] Failed to persist image, returning it anyway: url={}, path={:?}, err={}",
                    url,
                    store.path(),
                    error
                );
                FetchOutcome::PersistFailed { image, error }
            }
        }
    }

    /// Start the pipeline on a background task and return immediately.
    ///
    /// Empty URLs resolve right away without touching the network. Dropping
    /// the returned future does not stop the fetch.
    pub fn submit(
        &self,
        url: impl Into<String>,
        store: PngFileStore,
    ) -> PendingFetch {
        let (request, runtime) = match self.prepare(url.into()) {
            Ok(prepared) => prepared,
            Err((_, err)) => return PendingFetch::ready(err.into()),
        };

        let svc = self.clone();
        let task = runtime
            .spawn(async move { svc.fetch_and_persist(&request, &store).await });
        PendingFetch::spawned(task)
    }

    /// Start the pipeline and deliver the result as a [`FetchCompletion`] on
    /// `completions`, typically drained by the display layer's event loop.
    ///
    /// Exactly one completion is sent per call, rejected requests included.
    pub fn submit_to(
        &self,
        url: impl Into<String>,
        store: PngFileStore,
        completions: mpsc::UnboundedSender<FetchCompletion>,
    ) {
        let (request, runtime) = match self.prepare(url.into()) {
            Ok(prepared) => prepared,
            Err((url, err)) => {
                let _ = completions.send(FetchCompletion {
                    url,
                    outcome: err.into(),
                });
                return;
            }
        };

        let svc = self.clone();
        runtime.spawn(async move {
            let outcome =
                AssertUnwindSafe(svc.fetch_and_persist(&request, &store))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| {
                        FetchOutcome::Rejected(DispatchError::Worker(
                            panic_message(panic.as_ref()),
                        ))
                    });

            let completion = FetchCompletion {
                url: request.into_url(),
                outcome,
            };
            if let Err(err) = completions.send(completion) {
                debug!(
                    "[submit_to] Completion receiver dropped: url={}",
                    err.0.url
                );
            }
        });
    }

    fn prepare(
        &self,
        url: String,
    ) -> Result<(FetchRequest, Handle), (String, DispatchError)> {
        let request = match FetchRequest::new(url.as_str()) {
            Ok(request) => request,
            Err(err) => {
                debug!("[submit] Ignoring request with empty url");
                return Err((url, err));
            }
        };

        match Handle::try_current() {
            Ok(runtime) => Ok((request, runtime)),
            Err(_) => {
                warn!(
                    "[submit] Fetch not started (no Tokio runtime available): url={}",
                    url
                );
                Err((url, DispatchError::NoRuntime))
            }
        }
    }
}

/// A running (or already resolved) fetch.
#[must_use = "the outcome is only observable by awaiting the future"]
pub struct PendingFetch {
    inner: BoxFuture<'static, FetchOutcome>,
}

impl PendingFetch {
    fn ready(outcome: FetchOutcome) -> Self {
        Self {
            inner: future::ready(outcome).boxed(),
        }
    }

    fn spawned(task: JoinHandle<FetchOutcome>) -> Self {
        let inner = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    FetchOutcome::Rejected(DispatchError::Worker(err.to_string()))
                }
            }
        };
        Self {
            inner: inner.boxed(),
        }
    }
}

impl Future for PendingFetch {
    type Output = FetchOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl fmt::Debug for PendingFetch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingFetch").finish_non_exhaustive()
    }
}

/// Message delivered by [`ImageFetchService::submit_to`].
#[derive(Debug)]
pub struct FetchCompletion {
    pub url: String,
    pub outcome: FetchOutcome,
}

async fn decode_off_thread(bytes: Bytes) -> Result<DecodedImage, DecodeError> {
    tokio::task::spawn_blocking(move || raster::decode(&bytes))
        .await
        .map_err(|e| DecodeError::Task(e.to_string()))?
}

async fn persist(
    image: &DecodedImage,
    store: &PngFileStore,
) -> Result<PathBuf, PersistError> {
    let image = image.clone();
    let png = tokio::task::spawn_blocking(move || raster::encode_png(&image))
        .await
        .map_err(|e| PersistError::Task(e.to_string()))??;

    store.write(&png).await
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "fetch task panicked".to_string()
    }
}
