//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use tenant_router::config::{DispatchConfig, ListenerConfig};
use tenant_router::directory::{MemoryDirectory, OrganizationDirectory};
use tenant_router::domain::{presets, DomainRegistry};
use tenant_router::{Dispatcher, HttpServer, OrganizationInfo, Shutdown, UserIdentity};

pub const BASE: &str = "example.com";

/// Organizations known to the preset tests: `acme` (active) and `zeta`
/// (inactive).
pub fn directory() -> MemoryDirectory {
    MemoryDirectory::from_organizations([
        OrganizationInfo::new("org-acme", "acme", true),
        OrganizationInfo::new("org-zeta", "zeta", false),
    ])
}

pub fn preset_registry() -> DomainRegistry {
    DomainRegistry::from_records(&presets::standard(BASE), true).unwrap()
}

pub fn dispatcher_with(
    directory: Arc<dyn OrganizationDirectory>,
    config: &DispatchConfig,
) -> Dispatcher {
    Dispatcher::new(Arc::new(preset_registry()), directory, config)
}

/// Standard preset over the in-memory directory.
pub fn preset_dispatcher() -> Dispatcher {
    dispatcher_with(Arc::new(directory()), &DispatchConfig::default())
}

pub fn acme_member() -> UserIdentity {
    UserIdentity::new("u-acme").member_of("org-acme")
}

/// Serve `dispatcher` on an ephemeral port.
pub async fn start_router(dispatcher: Dispatcher) -> (SocketAddr, Arc<Shutdown>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Arc::new(Shutdown::new());

    let server = HttpServer::new(
        Arc::new(dispatcher),
        &ListenerConfig::default(),
        Arc::clone(&shutdown),
    );
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });

    (addr, shutdown)
}

/// Start a mock data store. `f` receives the request path and returns the
/// status code and JSON body to answer with.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let head = String::from_utf8_lossy(&buf[..n]);
                let path = head
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or("/")
                    .to_string();

                let (status, body) = f(path).await;
                let status_text = match status {
                    200 => "200 OK",
                    404 => "404 Not Found",
                    500 => "500 Internal Server Error",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
                tokio::time::sleep(Duration::from_millis(10)).await;
            });
        }
    });

    addr
}
