//! HTTP surface tests: routing, bearer auth and problem responses

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use common::*;
use document_workflow::api::rest::auth::{Claims, JwtVerifier};
use document_workflow::api::rest::routes::{attachments_router, register_routes};
use document_workflow::config::{Config, JwtConfig};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "rest-test-secret";

fn app(env: &TestEnv) -> Router {
    let config = JwtConfig {
        secret: SECRET.to_string(),
        ..Default::default()
    };
    register_routes(
        Router::new(),
        env.service.clone(),
        Arc::new(JwtVerifier::new(&config)),
    )
}

fn token(user_id: &str, role: &str) -> String {
    let claims = Claims {
        sub: Some(user_id.to_string()),
        id: None,
        role: role.to_string(),
        email: Some(format!("{}@example.com", user_id)),
        name: None,
        department: Some("Finance".to_string()),
        country: Some("AE".to_string()),
        exp: (chrono::Utc::now().timestamp() + 600) as u64,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn request(method: Method, uri: &str, bearer: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn create_body(name: &str) -> Value {
    json!({
        "sopName": name,
        "documentType": "SOP",
        "department": "Finance",
        "language": "EN",
        "requester": { "id": "requester-1", "name": "requester-1", "email": "requester-1@example.com" },
        "documentOwners": [{ "id": "owner-1", "name": "owner-1", "email": "owner-1@example.com" }],
        "reviewers": [{ "id": "reviewer-1", "name": "reviewer-1", "email": "reviewer-1@example.com" }],
        "documentCreators": [{ "id": "creator-1", "name": "creator-1", "email": "creator-1@example.com" }]
    })
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let env = create_test_env();
    let app = app(&env);

    let (status, body) = send(&app, request(Method::GET, "/documents", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);

    let (status, _) = send(
        &app,
        request(Method::GET, "/documents", Some("not-a-jwt"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_and_fetch_document() {
    print_test_header(
        "test_create_and_fetch_document",
        &["POST /documents returns 201 with a generated code"],
    );
    let env = create_test_env();
    let app = app(&env);
    let controller = token("controller-1", "document-controller");

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/documents",
            Some(&controller),
            Some(create_body("Petty Cash")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["documentCode"], "SDG-FIN-SOP-01-EN");
    assert_eq!(body["status"], "under-review");
    println!("✅ Created {}", body["documentCode"]);

    let id = body["id"].as_str().unwrap().to_string();
    let owner = token("owner-1", "document-owner");
    let (status, body) = send(
        &app,
        request(Method::GET, &format!("/documents/{}", id), Some(&owner), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sopName"], "Petty Cash");

    let (status, body) = send(
        &app,
        request(
            Method::GET,
            &format!("/documents/{}/capabilities", id),
            Some(&owner),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["canView"], true);
}

#[tokio::test]
async fn test_role_and_state_errors_map_to_statuses() {
    let env = create_test_env();
    let app = app(&env);
    let controller = token("controller-1", "document-controller");
    let doc = env
        .service
        .create_document(&common::controller(), new_document("Bank Reconciliation"))
        .await
        .unwrap();

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            &format!("/documents/{}/approve", doc.id),
            Some(&controller),
            Some(json!({})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["title"], "Forbidden");

    let (status, _) = send(
        &app,
        request(
            Method::POST,
            &format!("/documents/{}/transition", doc.id),
            Some(&controller),
            Some(json!({ "status": "live" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        env.documents.stored(doc.id).unwrap().status,
        document_workflow::DocumentStatus::UnderReview
    );

    let (status, _) = send(
        &app,
        request(
            Method::GET,
            &format!("/documents/{}", uuid::Uuid::new_v4()),
            Some(&controller),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_validation_errors_name_the_field() {
    let env = create_test_env();
    let app = app(&env);
    let controller = token("controller-1", "document-controller");

    let mut body = create_body("Asset Register");
    body["documentOwners"] = json!([]);
    let (status, problem) = send(
        &app,
        request(Method::POST, "/documents", Some(&controller), Some(body)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(problem["field"], "document_owners");

    let mut body = create_body("Asset Register");
    body["documentType"] = json!("Memo");
    let (status, problem) = send(
        &app,
        request(Method::POST, "/documents", Some(&controller), Some(body)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(problem["field"], "documentType");
}

#[tokio::test]
async fn test_health_and_openapi_are_public() {
    let env = create_test_env();
    let app = app(&env);

    let (status, body) = send(&app, request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, request(Method::GET, "/openapi.json", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["components"]["schemas"]["DocumentDto"].is_object());
}

#[tokio::test]
async fn test_attachments_require_bearer_token() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("doc-1")).unwrap();
    std::fs::write(dir.path().join("doc-1/policy.pdf"), b"%PDF-1.7").unwrap();

    let config = Config {
        attachments_dir: dir.path().to_path_buf(),
        files_base_url: "/files".to_string(),
        jwt: JwtConfig {
            secret: SECRET.to_string(),
            ..Default::default()
        },
        ..Default::default()
    };
    let app = attachments_router(&config, Arc::new(JwtVerifier::new(&config.jwt))).unwrap();

    let (status, _) = send(
        &app,
        request(Method::GET, "/files/doc-1/policy.pdf", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let reader = token("reviewer-1", "Reviewer");
    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            "/files/doc-1/policy.pdf",
            Some(&reader),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"%PDF-1.7");
}

#[test]
fn test_remote_attachment_urls_are_not_served() {
    let config = Config {
        files_base_url: "https://cdn.example.com/files".to_string(),
        ..Default::default()
    };
    assert!(attachments_router(&config, Arc::new(JwtVerifier::new(&config.jwt))).is_none());
}
