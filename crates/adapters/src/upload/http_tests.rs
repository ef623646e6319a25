// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use srcdsup_core::{refresh_channel, sidecar_path, Compression, DeliveryOutcome};
use std::path::Path;
use std::time::SystemTime;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http_remote(server: &MockServer, encoding: Encoding, min_size: u64) -> RemoteDestination {
    RemoteDestination {
        name: "gbans".to_string(),
        endpoint: Endpoint::Http {
            url: server.uri(),
            upload_path: "/api/demo".to_string(),
            encoding,
            min_size,
            timeout: Duration::from_secs(5),
            auth_timeout: Duration::from_secs(5),
        },
        credentials: Credentials::SharedSecret {
            server_name: "us-1".to_string(),
            key: "s3cret".to_string(),
        },
        root: String::new(),
    }
}

fn write_file(dir: &Path, name: &str, len: usize) -> MatchedFile {
    let path = dir.join(name);
    std::fs::write(&path, vec![b'd'; len]).unwrap();
    let sidecar = sidecar_path(&path);
    MatchedFile {
        size: len as u64,
        modified: SystemTime::now(),
        sidecar: sidecar.is_file().then_some(sidecar),
        path,
    }
}

fn handler_with_token() -> HttpUploadHandler {
    let tokens = TokenStore::new();
    tokens.set("gbans", "tok-1");
    HttpUploadHandler::new(tokens).unwrap()
}

fn rule() -> UploadRule {
    UploadRule::new("stv", "/demos", "*.dem")
        .with_remote("gbans")
        .with_server("us-1")
}

#[tokio::test]
async fn multipart_upload_created_is_delivered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/demo"))
        .and(header("authorization", "tok-1"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let file = write_file(dir.path(), "a.dem", 2048);
    let remote = http_remote(
        &server,
        Encoding::Multipart {
            compression: Compression::Gzip,
        },
        1024,
    );

    let results = handler_with_token()
        .deliver(&rule(), &remote, std::slice::from_ref(&file))
        .await
        .unwrap();

    assert_eq!(results, vec![FileResult::delivered(&file.path)]);

    let received = server.received_requests().await.unwrap();
    let content_type = received[0].headers.get("content-type").unwrap();
    assert!(content_type
        .to_str()
        .unwrap()
        .starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&received[0].body);
    assert!(body.contains("filename=\"a.dem.gz\""));
    assert!(body.contains("name=\"server_name\""));
    assert!(body.contains("name=\"stats\""));
}

#[tokio::test]
async fn json_upload_accepted_is_delivered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/demo"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(serde_json::json!({
            "serverName": "us-1",
            "demoName": "a.dem",
            "mapName": "pl_upward",
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("a.dem.json"),
        r#"{"map_name": "pl_upward", "scores": {}}"#,
    )
    .unwrap();
    let file = write_file(dir.path(), "a.dem", 100);
    let remote = http_remote(&server, Encoding::Json, 0);

    let results = handler_with_token()
        .deliver(&rule(), &remote, std::slice::from_ref(&file))
        .await
        .unwrap();

    assert!(results[0].outcome.is_delivered());
}

#[tokio::test]
async fn small_files_are_deferred_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let at_gate = write_file(dir.path(), "a.dem", 500);
    let below = write_file(dir.path(), "b.dem", 10);
    let remote = http_remote(&server, Encoding::default(), 500);

    let results = handler_with_token()
        .deliver(&rule(), &remote, &[at_gate, below])
        .await
        .unwrap();

    assert!(results.is_empty());
}

#[tokio::test]
async fn only_created_or_accepted_count_as_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok but not stored"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let file = write_file(dir.path(), "a.dem", 10);
    let remote = http_remote(&server, Encoding::default(), 0);

    let results = handler_with_token()
        .deliver(&rule(), &remote, std::slice::from_ref(&file))
        .await
        .unwrap();

    assert_eq!(
        results[0].outcome,
        DeliveryOutcome::Failed("HTTP 200: ok but not stored".to_string())
    );
}

#[tokio::test]
async fn server_error_captures_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("disk full"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let file = write_file(dir.path(), "a.dem", 10);
    let remote = http_remote(&server, Encoding::default(), 0);

    let results = handler_with_token()
        .deliver(&rule(), &remote, std::slice::from_ref(&file))
        .await
        .unwrap();

    match &results[0].outcome {
        DeliveryOutcome::Failed(reason) => assert!(reason.contains("disk full")),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn rejected_token_requests_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (trigger, mut signal) = refresh_channel();
    let handler = handler_with_token().with_refresh_trigger(trigger);

    let dir = TempDir::new().unwrap();
    let file = write_file(dir.path(), "a.dem", 10);
    let remote = http_remote(&server, Encoding::default(), 0);

    let results = handler
        .deliver(&rule(), &remote, std::slice::from_ref(&file))
        .await
        .unwrap();

    assert!(!results[0].outcome.is_delivered());
    assert!(signal.try_recv());
}

#[tokio::test]
async fn missing_token_defers_batch_and_requests_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    let (trigger, mut signal) = refresh_channel();
    let handler = HttpUploadHandler::new(TokenStore::new())
        .unwrap()
        .with_refresh_trigger(trigger);

    let dir = TempDir::new().unwrap();
    let file = write_file(dir.path(), "a.dem", 10);
    let remote = http_remote(&server, Encoding::default(), 0);

    let results = handler.deliver(&rule(), &remote, &[file]).await.unwrap();

    assert!(results.is_empty());
    assert!(signal.try_recv());
}

#[tokio::test]
async fn size_gate_applies_before_token_check() {
    let server = MockServer::start().await;
    let (trigger, mut signal) = refresh_channel();
    let handler = HttpUploadHandler::new(TokenStore::new())
        .unwrap()
        .with_refresh_trigger(trigger);

    let dir = TempDir::new().unwrap();
    let small = write_file(dir.path(), "small.dem", 100);
    let remote = http_remote(&server, Encoding::default(), 1024);

    let results = handler.deliver(&rule(), &remote, &[small]).await.unwrap();

    assert!(results.is_empty());
    // nothing to send, so no refresh is requested
    assert!(!signal.try_recv());
}

#[tokio::test]
async fn missing_required_sidecar_fails_only_that_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.dem.json"), r#"{"map_name": "koth_product"}"#).unwrap();
    let with_meta = write_file(dir.path(), "a.dem", 10);
    let without_meta = write_file(dir.path(), "b.dem", 10);
    let remote = http_remote(&server, Encoding::default(), 0);

    let results = handler_with_token()
        .deliver(
            &rule().requiring_metadata(),
            &remote,
            &[with_meta.clone(), without_meta.clone()],
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0], FileResult::delivered(&with_meta.path));
    assert_eq!(results[1].path, without_meta.path);
    assert!(!results[1].outcome.is_delivered());
}

#[tokio::test]
async fn unreachable_sink_fails_each_file() {
    let server = MockServer::start().await;
    let remote = http_remote(&server, Encoding::default(), 0);
    drop(server);

    let dir = TempDir::new().unwrap();
    let file = write_file(dir.path(), "a.dem", 10);

    let results = handler_with_token()
        .deliver(&rule(), &remote, std::slice::from_ref(&file))
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert!(!results[0].outcome.is_delivered());
}
