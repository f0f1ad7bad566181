//! Shared utilities for integration tests.

use std::net::SocketAddr;
use tokio::net::TcpListener;

use action_router::config::ServerConfig;
use action_router::http::HttpServer;
use action_router::lifecycle::Shutdown;
use action_router::routing::{Mapper, Processor};

/// A server running on an ephemeral local port, stopped on drop.
pub struct TestServer {
    addr: SocketAddr,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Serve `mapper` with the default configuration.
pub async fn start<P: Processor>(mapper: Mapper<P>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(ServerConfig::default(), mapper).unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer { addr, shutdown }
}

/// Client that never reuses connections between tests.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
