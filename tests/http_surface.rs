//! HTTP surface tests: status mapping, headers and identity extraction.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use reqwest::redirect::Policy;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use tenant_router::config::ListenerConfig;
use tenant_router::http::request::{X_USER_ID, X_USER_ORGANIZATION, X_USER_SUPPLIER};
use tenant_router::{HttpServer, Shutdown};

mod common;

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_permitted_returns_dispatch_document() {
    let (addr, shutdown) = common::start_router(common::preset_dispatcher()).await;

    let res = client()
        .get(format!("http://{addr}/orcamentos/42"))
        .header(header::HOST, "acme-app.example.com")
        .header(X_USER_ID, "u-acme")
        .header(X_USER_ORGANIZATION, "org-acme")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["outcome"], "permitted");
    assert_eq!(body["domain"], "app-tenant");
    assert_eq!(body["handler"], "quotes.detail");
    assert_eq!(body["params"]["id"], "42");
    assert_eq!(body["slug"], "acme");

    shutdown.trigger();
}

#[tokio::test]
async fn test_redirects_and_errors() {
    let (addr, shutdown) = common::start_router(common::preset_dispatcher()).await;
    let client = client();
    let get = |host: &'static str, path: &'static str| {
        client
            .get(format!("http://{addr}{path}"))
            .header(header::HOST, host)
    };

    let res = get("acme-app.example.com", "/").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()[header::LOCATION], "/login");

    let res = get("example.com", "/admin/users/5").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(
        res.headers()[header::LOCATION],
        "https://admin.example.com/users/5"
    );

    let res = get("fornecedores.example.com", "/")
        .header(X_USER_ID, "s1")
        .header(X_USER_SUPPLIER, "true")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = get("example.com", "/nada").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = get("intranet", "/").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::MISDIRECTED_REQUEST);
    assert_eq!(res.headers()[header::RETRY_AFTER], "1");

    shutdown.trigger();
}

#[tokio::test]
async fn test_in_process_router() {
    let server = HttpServer::new(
        Arc::new(common::preset_dispatcher()),
        &ListenerConfig::default(),
        Arc::new(Shutdown::new()),
    );

    let request = Request::builder()
        .uri("/gerarorcamento")
        .header(header::HOST, "www.example.com:8080")
        .body(Body::empty())
        .unwrap();
    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["pathname"], "/login");
    assert_eq!(body["redirects"][0]["kind"], "internal");

    let missing_host = Request::builder()
        .uri("/")
        .body(Body::empty())
        .unwrap();
    let response = server.router().oneshot(missing_host).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
