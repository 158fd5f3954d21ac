//! HTTP surface tests (router driven with `oneshot`, no listener)

mod helpers;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use reglex_analysis::{build_router, AppState};
use serde_json::Value;
use tower::ServiceExt;

use helpers::{pdf_bytes, stub_registry, wait_for_terminal};

const BOUNDARY: &str = "reglex-test-boundary";

fn test_app(available: bool) -> (axum::Router, reglex_analysis::AnalysisRegistry) {
    let (registry, health) = stub_registry(available);
    let app = build_router(AppState::new(registry.clone(), health));
    (app, registry)
}

/// Multipart body with an optional file part and optional language
fn multipart_body(file: Option<(&str, &str, &[u8])>, lang: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some((name, mime, contents)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, mime
            )
            .as_bytes(),
        );
        body.extend_from_slice(contents);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(lang) = lang {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"lang\"\r\n\r\n{}\r\n",
                BOUNDARY, lang
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn post_analysis(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/analyses")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_reports_remote_state() {
    let (app, _registry) = test_app(false);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "reglex-analysis");
    assert_eq!(json["remote_available"], false);
    assert_eq!(json["active_sessions"], 0);
}

#[tokio::test]
async fn test_reset_remote_health() {
    let (app, _registry) = test_app(true);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/remote/health/reset")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_start_analysis_accepted() {
    let (app, registry) = test_app(true);
    let pdf = pdf_bytes(2048);

    let response = app
        .clone()
        .oneshot(post_analysis(multipart_body(
            Some(("contract.pdf", "application/pdf", &pdf)),
            Some("en"),
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = json_body(response).await;
    assert_eq!(json["status"], "uploading");
    assert_eq!(json["file_name"], "contract.pdf");

    let id: uuid::Uuid = json["session_id"].as_str().unwrap().parse().unwrap();
    wait_for_terminal(&registry, id).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/analyses/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "completed");
    assert_eq!(json["progress"], 100);
    assert_eq!(json["result"]["overall_score"], 80);
    assert_eq!(json["result"]["provenance"], "real");
}

#[tokio::test]
async fn test_empty_file_rejected_with_400() {
    let (app, registry) = test_app(true);

    let response = app
        .oneshot(post_analysis(multipart_body(
            Some(("empty.pdf", "application/pdf", b"")),
            Some("en"),
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(registry.session_count(), 0);
}

#[tokio::test]
async fn test_unsupported_type_rejected_with_400() {
    let (app, _registry) = test_app(true);

    let response = app
        .oneshot(post_analysis(multipart_body(
            Some(("photo.png", "image/png", b"\x89PNG\r\n\x1a\n0000")),
            Some("en"),
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Unsupported file type"));
}

#[tokio::test]
async fn test_missing_file_field_rejected() {
    let (app, _registry) = test_app(true);

    let response = app
        .oneshot(post_analysis(multipart_body(None, Some("en"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let (app, _registry) = test_app(true);

    for uri in [
        format!("/analyses/{}", uuid::Uuid::new_v4()),
        format!("/analyses/{}/events", uuid::Uuid::new_v4()),
    ] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_malformed_session_id_is_json_400() {
    let (app, _registry) = test_app(true);

    for uri in ["/analyses/not-a-uuid", "/analyses/not-a-uuid/events"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid path parameter"));
    }
}

#[tokio::test]
async fn test_event_stream_ends_after_terminal_snapshot() {
    let (app, registry) = test_app(false);
    let file = reglex_analysis::models::DocumentFile::new(
        Some("notes.txt"),
        Some("text/plain"),
        b"The supplier shall deliver goods on time.".to_vec(),
    );
    let id = registry.start_analysis(file, "en").unwrap();
    wait_for_terminal(&registry, id).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/analyses/{}/events", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("event: session"));
    assert!(text.contains("\"status\":\"completed\""));
    assert!(text.contains("\"provenance\":\"synthetic\""));
}
