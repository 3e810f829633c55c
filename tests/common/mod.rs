//! Shared utilities for integration testing.

use std::net::SocketAddr;

use geo_endpoint::{GeoConfig, HttpServer, Shutdown};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A server running on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    #[allow(dead_code)]
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start the geo endpoint with `config`, bound to 127.0.0.1:0.
pub async fn start_server(mut config: GeoConfig) -> TestServer {
    config.listener.bind_address = "127.0.0.1:0".to_string();
    let server = HttpServer::new(config).expect("valid test config");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, receiver).await });

    TestServer { addr, shutdown, handle }
}

/// HTTP client that never goes through a proxy or reuses connections.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
