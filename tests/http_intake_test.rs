use anyhow::Result;
use drip_faucet::adapters::http;
use drip_faucet::core::aggregator::aggregate;
use drip_faucet::domain::model::Address;
use drip_faucet::{IntakeEndpoint, RequestQueue};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

struct TestServer {
    base_url: String,
    queue: RequestQueue,
    shutdown: watch::Sender<bool>,
    handle: tokio::task::JoinHandle<drip_faucet::Result<()>>,
}

async fn start_server() -> Result<TestServer> {
    let queue = RequestQueue::new(1);
    let intake = Arc::new(IntakeEndpoint::new(queue.clone()));
    let cors = http::cors_layer(&["http://localhost:5173".to_string()])?;
    let app = http::router(intake, cors);

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let base_url = format!("http://{}", listener.local_addr()?);
    let (shutdown, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(http::serve(listener, app, shutdown_rx));

    Ok(TestServer {
        base_url,
        queue,
        shutdown,
        handle,
    })
}

impl TestServer {
    async fn stop(self) -> Result<()> {
        self.shutdown.send(true)?;
        self.handle.await??;
        Ok(())
    }
}

#[tokio::test]
async fn test_drip_token_queues_valid_address() -> Result<()> {
    let server = start_server().await?;
    let client = reqwest::Client::new();

    for _ in 0..2 {
        let response = client
            .post(format!("{}/drip-token", server.base_url))
            .json(&serde_json::json!({ "address": "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed" }))
            .send()
            .await?;
        assert_eq!(response.status(), 200);

        let body: serde_json::Value = response.json().await?;
        assert_eq!(body["message"], "Request added to the queue");
        assert!(body["requestId"].as_u64().is_some());
    }

    let recipient = Address::parse("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed")?;
    assert_eq!(aggregate(&server.queue.snapshot()).amount_for(&recipient), 2);

    server.stop().await
}

#[tokio::test]
async fn test_drip_token_rejects_invalid_address() -> Result<()> {
    let server = start_server().await?;
    let client = reqwest::Client::new();

    for body in [
        serde_json::json!({ "address": "0x1234" }),
        serde_json::json!({ "address": "" }),
        serde_json::json!({}),
    ] {
        let response = client
            .post(format!("{}/drip-token", server.base_url))
            .json(&body)
            .send()
            .await?;
        assert_eq!(response.status(), 400);

        let body: serde_json::Value = response.json().await?;
        assert_eq!(body["error"], "Invalid wallet address");
    }

    // address 不是字串
    for body in [
        serde_json::json!({ "address": 5 }),
        serde_json::json!({ "address": null }),
    ] {
        let response = client
            .post(format!("{}/drip-token", server.base_url))
            .json(&body)
            .send()
            .await?;
        assert_eq!(response.status(), 400);
        let body: serde_json::Value = response.json().await?;
        assert_eq!(body["error"], "Invalid wallet address");
    }

    // 非 JSON 內容，以及沒有 Content-Type
    let not_json = client
        .post(format!("{}/drip-token", server.base_url))
        .header("content-type", "application/json")
        .body("nope")
        .send()
        .await?;
    let no_content_type = client
        .post(format!("{}/drip-token", server.base_url))
        .body(r#"{"address":"0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"}"#)
        .send()
        .await?;
    for response in [not_json, no_content_type] {
        assert_eq!(response.status(), 400);
        let body: serde_json::Value = response.json().await?;
        assert_eq!(body["error"], "Invalid wallet address");
    }

    assert!(server.queue.is_empty());
    server.stop().await
}

#[tokio::test]
async fn test_drip_token_accepts_address_without_prefix() -> Result<()> {
    let server = start_server().await?;

    let response = reqwest::Client::new()
        .post(format!("{}/drip-token", server.base_url))
        .json(&serde_json::json!({ "address": "00000000000000000000000000000000000000aa" }))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let queued = server.queue.snapshot();
    assert_eq!(queued.len(), 1);
    assert_eq!(
        queued[0].address.as_str(),
        "0x00000000000000000000000000000000000000aa"
    );

    server.stop().await
}

#[tokio::test]
async fn test_queue_endpoint_reports_snapshot() -> Result<()> {
    let server = start_server().await?;
    let recipient = Address::parse("0x00000000000000000000000000000000000000aa")?;
    server.queue.enqueue(recipient.clone());
    server.queue.enqueue(recipient.clone());

    let report: serde_json::Value = reqwest::get(format!("{}/queue", server.base_url))
        .await?
        .json()
        .await?;

    assert_eq!(report["total_requests"], 2);
    assert_eq!(report["entries"][0]["address"], recipient.as_str());
    assert_eq!(report["entries"][0]["requests"], 2);
    // 快照不能動到佇列
    assert_eq!(server.queue.len(), 2);

    let health = reqwest::get(format!("{}/health", server.base_url))
        .await?
        .text()
        .await?;
    assert_eq!(health, "ok");

    server.stop().await
}

#[tokio::test]
async fn test_cors_preflight_allows_frontend_origin() -> Result<()> {
    let server = start_server().await?;
    let client = reqwest::Client::new();

    let response = client
        .request(
            reqwest::Method::OPTIONS,
            format!("{}/drip-token", server.base_url),
        )
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .send()
        .await?;

    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:5173")
    );

    server.stop().await
}
