use super::*;
use crate::config::TrustConfig;
use crate::error::Error;
use crate::test_helpers::{capture_logs, fixture};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};


const VALID_BODY: &str = r#"{"ID":"u1","Image":{"URI":"http://x/img","Checksum":"abc","ID":"i1"}}"#;

/// Plain client with default settings.
fn plain_updater() -> HttpUpdater {
    HttpUpdater::new(&UpdaterConfig::default()).unwrap()
}

/// Secured client built from the test CA and client pair.
async fn secure_updater() -> HttpsUpdater {
    let config = UpdaterConfig {
        trust: TrustConfig::new(
            fixture("client.pem"),
            fixture("client.key"),
            fixture("ca.pem"),
        ),
        ..Default::default()
    };
    HttpsUpdater::new(&config).await.unwrap()
}

/// Mount a single GET route answering with `template`.
async fn mount(server: &MockServer, route: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template)
        .mount(server)
        .await;
}

/// Answer one connection with the raw `response` bytes and return its URL.
async fn serve_raw_once(response: Vec<u8>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 2048];
        let _ = socket.read(&mut request).await;
        socket.write_all(&response).await.unwrap();
        let _ = socket.shutdown().await;
    });

    format!("http://{}/image", addr)
}

/// Serve one chunked response without a Content-Length header and return its URL.
async fn serve_chunked_once(body: &'static [u8]) -> String {
    let mut response =
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n".to_vec();
    response.extend_from_slice(format!("{:x}\r\n", body.len()).as_bytes());
    response.extend_from_slice(body);
    response.extend_from_slice(b"\r\n0\r\n\r\n");
    serve_raw_once(response).await
}

/// Serve one response that declares `declared` bytes but closes after `body`.
async fn serve_truncated_once(declared: usize, body: &'static [u8]) -> String {
    let mut response = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        declared
    )
    .into_bytes();
    response.extend_from_slice(body);
    serve_raw_once(response).await
}

/// A local address nothing is listening on.
fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api/update", addr)
}
