//! `HttpClient` against a local upstream

use axum::{
    Router,
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse},
    routing::{get, post},
};
use postgrab::config::HttpConfig;
use postgrab::fetch::{Fetch, FetchError, HeadersMap, HttpClient, TransferProgress, headers};
use std::sync::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const FILE_SIZE: usize = 256 * 1024;

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn echo(headers: HeaderMap, body: String) -> String {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let referer = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    format!("{}|{}|{}", content_type, referer, body)
}

async fn attachment() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"cat.png\""),
        ],
        vec![7u8; FILE_SIZE],
    )
}

fn upstream() -> Router {
    Router::new()
        .route("/page", get(|| async { Html("<a id=\"next\" href=\"/page/2\">next</a>") }))
        .route("/moved", get(|| async { (StatusCode::FOUND, [(header::LOCATION, "/page")]) }))
        .route("/echo", post(echo))
        .route("/file", get(attachment))
        .route("/gone", get(|| async { StatusCode::GONE }))
}

fn client() -> HttpClient {
    HttpClient::new(&HttpConfig::default()).unwrap()
}

#[tokio::test]
async fn test_get_follows_redirects() {
    let base = serve(upstream()).await;

    let page = client().get(&format!("{}/moved", base), &HeadersMap::new()).await.unwrap();

    assert!(page.is_success());
    assert_eq!(page.url, format!("{}/page", base));
    assert!(page.body.contains("/page/2"));
}

#[tokio::test]
async fn test_post_sends_body_and_headers() {
    let base = serve(upstream()).await;
    let headers = headers([
        ("Content-Type", "application/x-www-form-urlencoded"),
        ("Referer", "https://forum.example/"),
    ]);

    let page = client()
        .post(&format!("{}/echo", base), "u=42".to_string(), &headers)
        .await
        .unwrap();

    assert_eq!(
        page.body,
        "application/x-www-form-urlencoded|https://forum.example/|u=42"
    );
}

#[tokio::test]
async fn test_error_status_is_a_page() {
    let base = serve(upstream()).await;

    let page = client().get(&format!("{}/gone", base), &HeadersMap::new()).await.unwrap();

    assert_eq!(page.status, 410);
    assert!(!page.is_success());
}

#[tokio::test]
async fn test_download_reports_progress_and_metadata() {
    let base = serve(upstream()).await;
    let seen: Mutex<Vec<TransferProgress>> = Mutex::new(Vec::new());
    let on_progress = |progress: TransferProgress| seen.lock().unwrap().push(progress);

    let transfer = client()
        .download(&format!("{}/file", base), &HeadersMap::new(), &on_progress)
        .await
        .unwrap();

    assert_eq!(transfer.bytes.len(), FILE_SIZE);
    assert_eq!(transfer.content_type.as_deref(), Some("image/png"));
    assert_eq!(
        transfer.content_disposition.as_deref(),
        Some("attachment; filename=\"cat.png\"")
    );

    let seen = seen.lock().unwrap();
    let last = seen.last().unwrap();
    assert_eq!(last.loaded, FILE_SIZE as u64);
    assert_eq!(last.total, Some(FILE_SIZE as u64));
    assert!(seen.windows(2).all(|w| w[0].loaded <= w[1].loaded));
}

#[tokio::test]
async fn test_download_rejects_error_status() {
    let base = serve(upstream()).await;
    let url = format!("{}/gone", base);

    let result = client().download(&url, &HeadersMap::new(), &|_| {}).await;

    assert!(matches!(result, Err(FetchError::Status { status: 410, .. })));
}

#[tokio::test]
async fn test_download_survives_absurd_content_length() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;
        let _ = socket
            .write_all(
                b"HTTP/1.1 200 OK\r\nContent-Length: 9223372036854775807\r\n\
                  Content-Type: image/jpeg\r\n\r\nabc",
            )
            .await;
    });
    let url = format!("http://{}/huge.jpg", addr);

    let result = client().download(&url, &HeadersMap::new(), &|_| {}).await;

    assert!(result.is_err());
}
