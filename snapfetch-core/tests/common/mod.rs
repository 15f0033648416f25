use std::{
    io::Cursor,
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use bytes::Bytes;
use image::{DynamicImage, ImageFormat, RgbaImage};
use snapfetch_core::{
    FetchError, FetchOptions, HttpImageLoader, ImageFetchService, ImageLoader,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    task::JoinHandle,
};

pub const RED_DIMS: (u32, u32) = (48, 32);
pub const BLUE_DIMS: (u32, u32) = (20, 60);

// Code is used by test modules, but not in this scope
#[allow(unused)]
#[derive(Clone)]
struct Fixtures {
    hits: Arc<AtomicUsize>,
    red_png: Bytes,
    blue_png: Bytes,
}

/// Local HTTP server serving image fixtures on an ephemeral port.
#[allow(unused)]
pub struct TestServer {
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

#[allow(unused)]
impl TestServer {
    pub async fn start() -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let fixtures = Fixtures {
            hits: Arc::clone(&hits),
            red_png: Bytes::from(png_fixture(RED_DIMS, [0xE0, 0x10, 0x10])),
            blue_png: Bytes::from(png_fixture(BLUE_DIMS, [0x10, 0x10, 0xE0])),
        };

        let router = Router::new()
            .route("/red.png", get(red_png))
            .route("/blue.png", get(blue_png))
            .route("/missing.png", get(missing))
            .route("/page.html", get(html_page))
            .route("/empty.png", get(empty_body))
            .route("/slow.png", get(slow_png))
            .with_state(fixtures);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test server");
        let addr = listener.local_addr().expect("local addr");
        let task = tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve fixtures");
        });

        Self { addr, hits, task }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Encode a solid-ish RGBA image with a gradient in the alpha-free channels.
#[allow(unused)]
pub fn png_fixture((width, height): (u32, u32), base: [u8; 3]) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([
            base[0].wrapping_add(x as u8),
            base[1].wrapping_add(y as u8),
            base[2],
            0xFF,
        ])
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode png fixture");
    out.into_inner()
}

/// Wraps the real HTTP loader and counts how often it is asked to load.
#[allow(unused)]
pub struct CountingLoader {
    inner: HttpImageLoader,
    calls: AtomicUsize,
}

#[allow(unused)]
impl CountingLoader {
    pub fn new(options: &FetchOptions) -> Arc<Self> {
        Arc::new(Self {
            inner: HttpImageLoader::new(options).expect("http client"),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ImageLoader for CountingLoader {
    async fn load(&self, url: &str) -> Result<Bytes, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.load(url).await
    }
}

/// One-shot TCP server: answers the first request with a 200 declaring
/// `content_length`, writes `body` verbatim, then closes the connection.
///
/// Lets tests send a `Content-Length` that disagrees with the body.
#[allow(unused)]
pub async fn raw_response(content_length: usize, body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind raw server");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }

        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: {content_length}\r\nConnection: close\r\n\r\n"
        );
        let _ = socket.write_all(head.as_bytes()).await;
        let _ = socket.write_all(&body).await;
        let _ = socket.shutdown().await;
    });

    format!("http://{addr}/raw.png")
}

#[allow(unused)]
pub fn service() -> ImageFetchService {
    ImageFetchService::new(&FetchOptions::default()).expect("build service")
}

async fn red_png(State(f): State<Fixtures>) -> impl IntoResponse {
    f.hits.fetch_add(1, Ordering::SeqCst);
    ([(header::CONTENT_TYPE, "image/png")], f.red_png)
}

async fn blue_png(State(f): State<Fixtures>) -> impl IntoResponse {
    f.hits.fetch_add(1, Ordering::SeqCst);
    ([(header::CONTENT_TYPE, "image/png")], f.blue_png)
}

async fn missing(State(f): State<Fixtures>) -> impl IntoResponse {
    f.hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::NOT_FOUND, "not found")
}

async fn html_page(State(f): State<Fixtures>) -> impl IntoResponse {
    f.hits.fetch_add(1, Ordering::SeqCst);
    (
        [(header::CONTENT_TYPE, "text/html")],
        "<html><body>definitely not a picture</body></html>",
    )
}

async fn empty_body(State(f): State<Fixtures>) -> impl IntoResponse {
    f.hits.fetch_add(1, Ordering::SeqCst);
    ([(header::CONTENT_TYPE, "image/png")], Bytes::new())
}

async fn slow_png(State(f): State<Fixtures>) -> impl IntoResponse {
    f.hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(3)).await;
    ([(header::CONTENT_TYPE, "image/png")], f.red_png)
}
