//! Web API file tests.
//!
//! Upload, download, listing and forced deletion over HTTP.

mod common;

use std::time::Duration;

use axum::http::{header, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use chrono::Utc;
use serde_json::Value;

use common::{id_from_url, test_server, TestRegistry, BASE_URL};

const TTL: Duration = Duration::from_secs(3 * 60 * 60);

fn file_form(name: &str, content: &[u8], mime: &str) -> MultipartForm {
    MultipartForm::new().add_part(
        "files[]",
        Part::bytes(content.to_vec())
            .file_name(name)
            .mime_type(mime),
    )
}

#[tokio::test]
async fn test_upload_download_delete_scenario() {
    let t = TestRegistry::new(TTL).await;
    let server = test_server(t.registry.clone(), None);

    // Upload
    let before = Utc::now().timestamp_millis();
    let response = server
        .post("/upload")
        .multipart(file_form("a.txt", b"0123456789", "text/plain"))
        .await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    assert_eq!(body["success"], true);

    let url = body["files"][0]["url"].as_str().unwrap();
    assert!(url.starts_with(&format!("{BASE_URL}/file/")));
    let id = id_from_url(url);
    assert!(uuid::Uuid::parse_str(&id).is_ok(), "not a uuid: {id}");

    let expires_at = body["files"][0]["expiresAt"].as_i64().unwrap();
    let three_hours = 3 * 60 * 60 * 1000;
    assert!(expires_at >= before + three_hours);
    assert!(expires_at <= Utc::now().timestamp_millis() + three_hours);

    // Download
    let response = server.get(&format!("/file/{id}")).await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), b"0123456789");
    assert_eq!(
        response.header(header::CONTENT_DISPOSITION),
        "attachment; filename=\"a.txt\""
    );
    assert!(response
        .header(header::CONTENT_TYPE)
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    assert_eq!(response.header("X-Content-Type-Options"), "nosniff");

    // Delete
    let response = server.delete(&format!("/admin/file/{id}")).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), serde_json::json!({ "success": true }));

    // Gone
    let response = server.get(&format!("/file/{id}")).await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.text(), "File not found or has expired");
}

#[tokio::test]
async fn test_download_does_not_extend_lifetime() {
    let t = TestRegistry::new(TTL).await;
    let server = test_server(t.registry.clone(), None);
    let entry = t.upload("b.bin", b"bytes").await;

    server.get(&format!("/file/{}", entry.id)).await.assert_status_ok();
    server.get(&format!("/file/{}", entry.id)).await.assert_status_ok();

    let after = t.registry.lookup(&entry.id).await.unwrap();
    assert_eq!(after.expires_at, entry.expires_at);
}

#[tokio::test]
async fn test_upload_without_file() {
    let t = TestRegistry::new(TTL).await;
    let server = test_server(t.registry.clone(), None);

    let form = MultipartForm::new().add_text("note", "no file here");
    let response = server.post("/upload").multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body = response.json::<Value>();
    assert_eq!(body["success"], false);
    assert_eq!(body["description"], "No file attached");
    assert!(t.registry.is_empty().await);
}

#[tokio::test]
async fn test_upload_wrong_field_name() {
    let t = TestRegistry::new(TTL).await;
    let server = test_server(t.registry.clone(), None);

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"data".to_vec()).file_name("a.txt"),
    );
    let response = server.post("/upload").multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(t.registry.is_empty().await);
}

#[tokio::test]
async fn test_upload_too_large() {
    let t = TestRegistry::with_limit(TTL, 1024).await;
    let server = test_server(t.registry.clone(), None);

    let response = server
        .post("/upload")
        .multipart(file_form("big.bin", &[7u8; 4096], "application/octet-stream"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body = response.json::<Value>();
    assert_eq!(body["success"], false);
    assert!(body["description"].as_str().unwrap().contains("too large"));

    assert!(t.registry.is_empty().await);
    assert!(common::walk_files(&t.storage_path()).is_empty());
}

#[tokio::test]
async fn test_download_unknown_id() {
    let t = TestRegistry::new(TTL).await;
    let server = test_server(t.registry.clone(), None);

    let response = server.get("/file/00000000-0000-0000-0000-000000000000").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.text(), "File not found or has expired");
}

#[tokio::test]
async fn test_download_expired() {
    let t = TestRegistry::new(Duration::from_millis(200)).await;
    let server = test_server(t.registry.clone(), None);
    let entry = t.upload("soon.txt", b"soon").await;

    tokio::time::sleep(Duration::from_millis(500)).await;

    server
        .get(&format!("/file/{}", entry.id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_non_ascii_name() {
    let t = TestRegistry::new(TTL).await;
    let server = test_server(t.registry.clone(), None);
    let entry = t.upload("résumé.pdf", b"%PDF").await;

    let response = server.get(&format!("/file/{}", entry.id)).await;
    response.assert_status_ok();

    let disposition = response.header(header::CONTENT_DISPOSITION);
    let disposition = disposition.to_str().unwrap();
    assert!(disposition.contains("filename*=UTF-8''r%C3%A9sum%C3%A9.pdf"));
    assert_eq!(response.header(header::CONTENT_TYPE), "application/pdf");
}

#[tokio::test]
async fn test_admin_list_files() {
    let t = TestRegistry::new(TTL).await;
    let server = test_server(t.registry.clone(), None);

    let a = t.upload("a.txt", b"a").await;
    let b = t.upload("b.txt", b"b").await;

    let response = server.get("/admin/files").await;
    response.assert_status_ok();

    let list = response.json::<Value>();
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);

    let ids: Vec<&str> = list.iter().map(|f| f["id"].as_str().unwrap()).collect();
    assert!(ids.contains(&a.id.as_str()));
    assert!(ids.contains(&b.id.as_str()));

    let first = &list[0];
    assert!(first["filename"].is_string());
    assert!(first["originalName"].is_string());
    assert!(first["path"].is_string());
    assert!(first["expiresAt"].is_i64());
}

#[tokio::test]
async fn test_admin_delete_unknown_is_success() {
    let t = TestRegistry::new(TTL).await;
    let server = test_server(t.registry.clone(), None);

    let response = server.delete("/admin/file/does-not-exist").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["success"], true);

    // Twice in a row is fine too.
    let entry = t.upload("a.txt", b"a").await;
    server
        .delete(&format!("/admin/file/{}", entry.id))
        .await
        .assert_status_ok();
    server
        .delete(&format!("/admin/file/{}", entry.id))
        .await
        .assert_status_ok();
    assert!(!entry.storage_path.exists());
}

#[tokio::test]
async fn test_proxy_disabled_is_not_found() {
    let t = TestRegistry::new(TTL).await;
    let server = test_server(t.registry.clone(), None);

    let response = server
        .post("/upload-uguu")
        .multipart(file_form("a.txt", b"data", "text/plain"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["success"], false);
}

#[tokio::test]
async fn test_health() {
    let t = TestRegistry::new(TTL).await;
    let server = test_server(t.registry.clone(), None);

    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "OK");
}
