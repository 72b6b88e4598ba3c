//! Route registration and OpenAPI document

use super::{auth::Actor, auth::JwtVerifier, dto::*, error::Problem, handlers};
use crate::config::Config;
use crate::domain::Service;
use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;
use utoipa::OpenApi;

/// Schemas published at `/openapi.json`
#[derive(OpenApi)]
#[openapi(
    info(title = "Document Workflow API", description = "Role-gated document lifecycle and change requests"),
    components(schemas(
        PersonDto,
        AuditEventDto,
        DocumentDto,
        CreateDocumentRequest,
        UpdateDocumentRequest,
        ListDocumentsQuery,
        CapabilitiesDto,
        NoteRequest,
        RejectRequest,
        QueryRequest,
        RetireRequest,
        TakeActionRequest,
        TransitionRequest,
        UploadRevisionQuery,
        AttachmentQuery,
        NextCodeQuery,
        NextCodeDto,
        ChangeRequestDto,
        CreateChangeRequestRequest,
        ListChangeRequestsQuery,
        ReasonRequest,
        HealthDto,
        Problem,
    ))
)]
pub struct ApiDoc;

/// Register all REST routes on `router`
pub fn register_routes(router: Router, service: Arc<Service>, verifier: Arc<JwtVerifier>) -> Router {
    router
        // Document endpoints
        .route("/documents", get(list_documents_handler).post(create_document_handler))
        .route("/documents/next-code", get(next_document_code_handler))
        .route("/documents/{id}", get(get_document_handler).patch(update_document_handler))
        .route("/documents/{id}/capabilities", get(document_capabilities_handler))
        .route("/documents/{id}/approve", post(approve_document_handler))
        .route("/documents/{id}/reject", post(reject_document_handler))
        .route("/documents/{id}/query", post(query_document_handler))
        .route("/documents/{id}/take-action", post(take_action_handler))
        .route("/documents/{id}/start-review", post(start_review_handler))
        .route("/documents/{id}/upload-revision", post(upload_revision_handler))
        .route("/documents/{id}/attachment", put(attach_file_handler))
        .route("/documents/{id}/push-live", post(push_live_handler))
        .route("/documents/{id}/complete-change", post(complete_change_handler))
        .route("/documents/{id}/archive", post(archive_document_handler))
        .route("/documents/{id}/delete", post(delete_document_handler))
        .route("/documents/{id}/transition", post(transition_document_handler))
        // Change request endpoints
        .route(
            "/change-requests",
            get(list_change_requests_handler).post(create_change_request_handler),
        )
        .route("/change-requests/{id}", get(get_change_request_handler))
        .route("/change-requests/{id}/approve", post(approve_change_request_handler))
        .route("/change-requests/{id}/reject", post(reject_change_request_handler))
        .route("/change-requests/{id}/query", post(query_change_request_handler))
        .route("/change-requests/{id}/cancel", post(cancel_change_request_handler))
        .route("/change-requests/{id}/complete", post(complete_change_request_handler))
        // Service and verifier as extensions for handlers and the Actor extractor
        .layer(Extension(service))
        .layer(Extension(verifier))
        // Unauthenticated endpoints
        .route("/health", get(handlers::health))
        .route("/openapi.json", get(openapi_handler))
}

/// Stored attachments under `files_base_url`, readable with a valid bearer token.
///
/// Returns `None` when attachment URLs do not point back at this server.
pub fn attachments_router(config: &Config, verifier: Arc<JwtVerifier>) -> Option<Router> {
    let prefix = config.files_base_url.trim_end_matches('/');
    if !prefix.starts_with('/') {
        return None;
    }
    Some(
        Router::new()
            .nest_service(prefix, ServeDir::new(&config.attachments_dir))
            .layer(middleware::from_extractor::<Actor>())
            .layer(Extension(verifier)),
    )
}

async fn openapi_handler() -> axum::Json<utoipa::openapi::OpenApi> {
    axum::Json(ApiDoc::openapi())
}

// ===== Handler wrappers that extract service from Extension =====

async fn list_documents_handler(
    Extension(service): Extension<Arc<Service>>,
    actor: Actor,
    query: axum::extract::Query<ListDocumentsQuery>,
) -> Result<axum::Json<Vec<DocumentDto>>, Problem> {
    handlers::list_documents(service, actor, query).await
}

async fn create_document_handler(
    Extension(service): Extension<Arc<Service>>,
    actor: Actor,
    json: axum::Json<CreateDocumentRequest>,
) -> Result<(StatusCode, axum::Json<DocumentDto>), Problem> {
    handlers::create_document(service, actor, json).await
}

async fn get_document_handler(
    Extension(service): Extension<Arc<Service>>,
    actor: Actor,
    path: axum::extract::Path<uuid::Uuid>,
) -> Result<axum::Json<DocumentDto>, Problem> {
    handlers::get_document(service, actor, path).await
}

async fn update_document_handler(
    Extension(service): Extension<Arc<Service>>,
    actor: Actor,
    path: axum::extract::Path<uuid::Uuid>,
    json: axum::Json<UpdateDocumentRequest>,
) -> Result<axum::Json<DocumentDto>, Problem> {
    handlers::update_document(service, actor, path, json).await
}

async fn document_capabilities_handler(
    Extension(service): Extension<Arc<Service>>,
    actor: Actor,
    path: axum::extract::Path<uuid::Uuid>,
) -> Result<axum::Json<CapabilitiesDto>, Problem> {
    handlers::document_capabilities(service, actor, path).await
}

async fn approve_document_handler(
    Extension(service): Extension<Arc<Service>>,
    actor: Actor,
    path: axum::extract::Path<uuid::Uuid>,
    json: axum::Json<NoteRequest>,
) -> Result<axum::Json<DocumentDto>, Problem> {
    handlers::approve_document(service, actor, path, json).await
}

async fn reject_document_handler(
    Extension(service): Extension<Arc<Service>>,
    actor: Actor,
    path: axum::extract::Path<uuid::Uuid>,
    json: axum::Json<RejectRequest>,
) -> Result<axum::Json<DocumentDto>, Problem> {
    handlers::reject_document(service, actor, path, json).await
}

async fn query_document_handler(
    Extension(service): Extension<Arc<Service>>,
    actor: Actor,
    path: axum::extract::Path<uuid::Uuid>,
    json: axum::Json<QueryRequest>,
) -> Result<axum::Json<DocumentDto>, Problem> {
    handlers::query_document(service, actor, path, json).await
}

async fn take_action_handler(
    Extension(service): Extension<Arc<Service>>,
    actor: Actor,
    path: axum::extract::Path<uuid::Uuid>,
    json: axum::Json<TakeActionRequest>,
) -> Result<axum::Json<DocumentDto>, Problem> {
    handlers::take_action(service, actor, path, json).await
}

async fn start_review_handler(
    Extension(service): Extension<Arc<Service>>,
    actor: Actor,
    path: axum::extract::Path<uuid::Uuid>,
    json: axum::Json<NoteRequest>,
) -> Result<axum::Json<DocumentDto>, Problem> {
    handlers::start_review(service, actor, path, json).await
}

async fn upload_revision_handler(
    Extension(service): Extension<Arc<Service>>,
    actor: Actor,
    path: axum::extract::Path<uuid::Uuid>,
    query: axum::extract::Query<UploadRevisionQuery>,
    body: axum::body::Bytes,
) -> Result<axum::Json<DocumentDto>, Problem> {
    handlers::upload_revision(service, actor, path, query, body).await
}

async fn attach_file_handler(
    Extension(service): Extension<Arc<Service>>,
    actor: Actor,
    path: axum::extract::Path<uuid::Uuid>,
    query: axum::extract::Query<AttachmentQuery>,
    body: axum::body::Bytes,
) -> Result<axum::Json<DocumentDto>, Problem> {
    handlers::attach_file(service, actor, path, query, body).await
}

async fn push_live_handler(
    Extension(service): Extension<Arc<Service>>,
    actor: Actor,
    path: axum::extract::Path<uuid::Uuid>,
    json: axum::Json<NoteRequest>,
) -> Result<axum::Json<DocumentDto>, Problem> {
    handlers::push_live(service, actor, path, json).await
}

async fn complete_change_handler(
    Extension(service): Extension<Arc<Service>>,
    actor: Actor,
    path: axum::extract::Path<uuid::Uuid>,
    json: axum::Json<NoteRequest>,
) -> Result<axum::Json<DocumentDto>, Problem> {
    handlers::complete_change(service, actor, path, json).await
}

async fn archive_document_handler(
    Extension(service): Extension<Arc<Service>>,
    actor: Actor,
    path: axum::extract::Path<uuid::Uuid>,
    json: axum::Json<RetireRequest>,
) -> Result<axum::Json<DocumentDto>, Problem> {
    handlers::archive_document(service, actor, path, json).await
}

async fn delete_document_handler(
    Extension(service): Extension<Arc<Service>>,
    actor: Actor,
    path: axum::extract::Path<uuid::Uuid>,
    json: axum::Json<RetireRequest>,
) -> Result<axum::Json<DocumentDto>, Problem> {
    handlers::delete_document(service, actor, path, json).await
}

async fn transition_document_handler(
    Extension(service): Extension<Arc<Service>>,
    actor: Actor,
    path: axum::extract::Path<uuid::Uuid>,
    json: axum::Json<TransitionRequest>,
) -> Result<axum::Json<DocumentDto>, Problem> {
    handlers::transition_document(service, actor, path, json).await
}

async fn next_document_code_handler(
    Extension(service): Extension<Arc<Service>>,
    actor: Actor,
    query: axum::extract::Query<NextCodeQuery>,
) -> Result<axum::Json<NextCodeDto>, Problem> {
    handlers::next_document_code(service, actor, query).await
}

async fn list_change_requests_handler(
    Extension(service): Extension<Arc<Service>>,
    actor: Actor,
    query: axum::extract::Query<ListChangeRequestsQuery>,
) -> Result<axum::Json<Vec<ChangeRequestDto>>, Problem> {
    handlers::list_change_requests(service, actor, query).await
}

async fn create_change_request_handler(
    Extension(service): Extension<Arc<Service>>,
    actor: Actor,
    json: axum::Json<CreateChangeRequestRequest>,
) -> Result<(StatusCode, axum::Json<ChangeRequestDto>), Problem> {
    handlers::create_change_request(service, actor, json).await
}

async fn get_change_request_handler(
    Extension(service): Extension<Arc<Service>>,
    actor: Actor,
    path: axum::extract::Path<uuid::Uuid>,
) -> Result<axum::Json<ChangeRequestDto>, Problem> {
    handlers::get_change_request(service, actor, path).await
}

async fn approve_change_request_handler(
    Extension(service): Extension<Arc<Service>>,
    actor: Actor,
    path: axum::extract::Path<uuid::Uuid>,
    json: axum::Json<NoteRequest>,
) -> Result<axum::Json<ChangeRequestDto>, Problem> {
    handlers::approve_change_request(service, actor, path, json).await
}

async fn reject_change_request_handler(
    Extension(service): Extension<Arc<Service>>,
    actor: Actor,
    path: axum::extract::Path<uuid::Uuid>,
    json: axum::Json<ReasonRequest>,
) -> Result<axum::Json<ChangeRequestDto>, Problem> {
    handlers::reject_change_request(service, actor, path, json).await
}

async fn query_change_request_handler(
    Extension(service): Extension<Arc<Service>>,
    actor: Actor,
    path: axum::extract::Path<uuid::Uuid>,
    json: axum::Json<QueryRequest>,
) -> Result<axum::Json<ChangeRequestDto>, Problem> {
    handlers::query_change_request(service, actor, path, json).await
}

async fn cancel_change_request_handler(
    Extension(service): Extension<Arc<Service>>,
    actor: Actor,
    path: axum::extract::Path<uuid::Uuid>,
    json: axum::Json<ReasonRequest>,
) -> Result<axum::Json<ChangeRequestDto>, Problem> {
    handlers::cancel_change_request(service, actor, path, json).await
}

async fn complete_change_request_handler(
    Extension(service): Extension<Arc<Service>>,
    actor: Actor,
    path: axum::extract::Path<uuid::Uuid>,
    json: axum::Json<NoteRequest>,
) -> Result<axum::Json<ChangeRequestDto>, Problem> {
    handlers::complete_change_request(service, actor, path, json).await
}
