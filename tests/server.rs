//! HTTP round-trip tests against a server bound to an ephemeral port.

use std::sync::Arc;
use std::time::Duration;

use rag_context::config::Config;
use rag_context::knowledge::KnowledgeBase;
use rag_context::seed::{default_fixtures, seed_documents};
use rag_context::server::router;
use serde_json::{json, Value};

async fn start_server(delay_ms: u64) -> (String, Arc<KnowledgeBase>) {
    let mut config = Config::default();
    config.indexing.delay_ms = delay_ms;
    let kb = Arc::new(KnowledgeBase::from_config(&config).unwrap());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(kb.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), kb)
}

#[tokio::test]
async fn test_health() {
    let (base, _kb) = start_server(0).await;
    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["retriever"], "lexical");
    assert_eq!(body["indexer"], "simulated");
}

#[tokio::test]
async fn test_document_lifecycle() {
    let (base, _kb) = start_server(0).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/documents", base))
        .json(&json!({
            "title": "Product Manual - V3",
            "content": "Version 3 of the product introduces new features.",
            "type": "pdf",
            "tags": ["product", "features"]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let doc: Value = resp.json().await.unwrap();
    assert_eq!(doc["status"], "indexed");
    assert_eq!(doc["type"], "pdf");
    let id = doc["id"].as_str().unwrap().to_string();

    let list: Value = client
        .get(format!("{}/documents", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list["documents"].as_array().unwrap().len(), 1);

    let resp = client
        .post(format!("{}/context", base))
        .json(&json!({ "query": "What are the product features?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let ctx: Value = resp.json().await.unwrap();
    assert_eq!(ctx["results"][0]["document_id"], id.as_str());
    assert_eq!(ctx["results"][0]["score"], 1.0);
    assert!(ctx["context"].as_str().unwrap().contains("[SOURCE 1]:"));

    for _ in 0..2 {
        let resp = client
            .delete(format!("{}/documents/{}", base, id))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 204);
    }

    let resp = client
        .get(format!("{}/documents/{}", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_context_empty_results() {
    let (base, kb) = start_server(0).await;
    seed_documents(&kb, default_fixtures()).await.unwrap();

    let ctx: Value = reqwest::Client::new()
        .post(format!("{}/context", base))
        .json(&json!({ "query": "   ", "limit": 5 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ctx["results"].as_array().unwrap().len(), 0);
    assert_eq!(ctx["context"], "");
}

#[tokio::test]
async fn test_add_rejects_empty_title() {
    let (base, _kb) = start_server(0).await;
    let resp = reqwest::Client::new()
        .post(format!("{}/documents", base))
        .json(&json!({ "title": "", "content": "body" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_add_reports_indexing_failure() {
    let (base, _kb) = start_server(0).await;
    let resp = reqwest::Client::new()
        .post(format!("{}/documents", base))
        .json(&json!({ "title": "Empty", "content": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["error"]["code"], "indexing_failed");
}

#[tokio::test]
async fn test_submit_without_wait_then_cancel() {
    let (base, kb) = start_server(10_000).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/documents?wait=false", base))
        .json(&json!({ "title": "Slow", "content": "takes a while" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 202);
    let doc: Value = resp.json().await.unwrap();
    assert_eq!(doc["status"], "processing");
    let id = doc["id"].as_str().unwrap().to_string();
    assert_eq!(kb.pending_indexing(), 1);

    let cancel: Value = client
        .post(format!("{}/documents/{}/cancel", base, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cancel["cancelled"], true);

    let doc: Value = tokio::time::timeout(Duration::from_secs(5), async {
        client
            .get(format!("{}/documents/{}", base, id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    })
    .await
    .unwrap();
    assert_eq!(doc["status"], "error");
    assert_eq!(doc["error"], "indexing cancelled");
}
