//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use order_service::config::ServiceConfig;
use order_service::{HttpServer, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Start a programmable mock parts service on an ephemeral port.
///
/// `f` receives the request path and returns `(status, body)`.
pub async fn start_parts_service<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some(path) = read_request_path(&mut socket).await else {
                            return;
                        };
                        let (status, body) = f(path).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Mock parts service that answers every part with the same stock and price.
#[allow(dead_code)]
pub async fn start_stocked_parts_service(stock: u64, price: f64) -> SocketAddr {
    start_parts_service(move |_| async move {
        (200, format!(r#"{{"stock": {stock}, "price": {price:?}}}"#))
    })
    .await
}

async fn read_request_path(socket: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
        if buf.len() > 64 * 1024 {
            return None;
        }
    }

    let text = String::from_utf8_lossy(&buf);
    let request_line = text.lines().next()?;
    request_line.split_whitespace().nth(1).map(str::to_string)
}

/// Part id from a `/api/parts/{id}` path.
#[allow(dead_code)]
pub fn part_id(path: &str) -> Option<u64> {
    path.strip_prefix("/api/parts/")?.parse().ok()
}

/// Config pointing at `parts_addr`, with metrics off.
#[allow(dead_code)]
pub fn config_for(parts_addr: SocketAddr) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.parts.base_url = format!("http://{}", parts_addr);
    config.observability.metrics_enabled = false;
    config
}

/// Start the order service on an ephemeral port.
#[allow(dead_code)]
pub async fn start_order_service(config: ServiceConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// HTTP client that ignores proxy environment variables.
#[allow(dead_code)]
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
