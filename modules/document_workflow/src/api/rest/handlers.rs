//! HTTP request handlers - thin layer that delegates to domain service

use super::auth::Actor;
use super::mapper::{parse_document_type, parse_language, parse_status};
use super::{
    dto::*,
    error::{map_domain_error, Problem},
};
use crate::contract::{
    Attachment, ChangeRequestFilter, DocumentFilter, DocumentPatch, NewChangeRequest, NewDocument,
    Party,
};
use crate::domain::Service;
use axum::{
    body::Bytes,
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

// ===== Document Handlers =====

/// List documents visible to the caller
pub async fn list_documents(
    service: Arc<Service>,
    Actor(actor): Actor,
    Query(query): Query<ListDocumentsQuery>,
) -> Result<Json<Vec<DocumentDto>>, Problem> {
    let filter = DocumentFilter::try_from(query).map_err(map_domain_error)?;
    let docs = service
        .list_documents(&actor, &filter)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(docs.into_iter().map(DocumentDto::from).collect()))
}

/// Create a document; it starts under review
pub async fn create_document(
    service: Arc<Service>,
    Actor(actor): Actor,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<DocumentDto>), Problem> {
    let input = NewDocument::try_from(req).map_err(map_domain_error)?;
    let doc = service
        .create_document(&actor, input)
        .await
        .map_err(map_domain_error)?;

    Ok((StatusCode::CREATED, Json(doc.into())))
}

pub async fn get_document(
    service: Arc<Service>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentDto>, Problem> {
    let doc = service
        .get_document(&actor, id)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(doc.into()))
}

pub async fn update_document(
    service: Arc<Service>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateDocumentRequest>,
) -> Result<Json<DocumentDto>, Problem> {
    let patch = DocumentPatch::try_from(req).map_err(map_domain_error)?;
    let doc = service
        .update_document(&actor, id, patch)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(doc.into()))
}

pub async fn document_capabilities(
    service: Arc<Service>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<CapabilitiesDto>, Problem> {
    let caps = service
        .document_capabilities(&actor, id)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(caps.into()))
}

pub async fn approve_document(
    service: Arc<Service>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<NoteRequest>,
) -> Result<Json<DocumentDto>, Problem> {
    let doc = service
        .approve(&actor, id, req.note)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(doc.into()))
}

pub async fn reject_document(
    service: Arc<Service>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<RejectRequest>,
) -> Result<Json<DocumentDto>, Problem> {
    let doc = service
        .reject(&actor, id, req.reason)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(doc.into()))
}

pub async fn query_document(
    service: Arc<Service>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<DocumentDto>, Problem> {
    let doc = service
        .query(&actor, id, req.query)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(doc.into()))
}

pub async fn take_action(
    service: Arc<Service>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<TakeActionRequest>,
) -> Result<Json<DocumentDto>, Problem> {
    let forward_to = req
        .forward_to
        .as_deref()
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(Party::from_label);
    let doc = service
        .take_action(&actor, id, forward_to, req.note)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(doc.into()))
}

pub async fn start_review(
    service: Arc<Service>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<NoteRequest>,
) -> Result<Json<DocumentDto>, Problem> {
    let doc = service
        .start_review(&actor, id, req.note)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(doc.into()))
}

/// Upload a revision. The raw body is the file; an empty body records the
/// revision without storing anything.
pub async fn upload_revision(
    service: Arc<Service>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Query(query): Query<UploadRevisionQuery>,
    body: Bytes,
) -> Result<Json<DocumentDto>, Problem> {
    let attachment = match query.file_name {
        Some(file_name) if !body.is_empty() => Some(Attachment {
            file_name,
            bytes: body.to_vec(),
        }),
        _ => None,
    };
    let doc = service
        .upload_revision(&actor, id, attachment, query.note)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(doc.into()))
}

/// Store a file against a document without moving it
pub async fn attach_file(
    service: Arc<Service>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Query(query): Query<AttachmentQuery>,
    body: Bytes,
) -> Result<Json<DocumentDto>, Problem> {
    if body.is_empty() {
        return Err(Problem::bad_request("request body is empty").with_field("body"));
    }
    let attachment = Attachment {
        file_name: query.file_name,
        bytes: body.to_vec(),
    };
    let doc = service
        .attach_file(&actor, id, attachment)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(doc.into()))
}

pub async fn push_live(
    service: Arc<Service>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<NoteRequest>,
) -> Result<Json<DocumentDto>, Problem> {
    let doc = service
        .push_live(&actor, id, req.note)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(doc.into()))
}

pub async fn complete_change(
    service: Arc<Service>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<NoteRequest>,
) -> Result<Json<DocumentDto>, Problem> {
    let doc = service
        .complete_change(&actor, id, req.note)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(doc.into()))
}

pub async fn archive_document(
    service: Arc<Service>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<RetireRequest>,
) -> Result<Json<DocumentDto>, Problem> {
    let doc = service
        .archive(&actor, id, req.reason)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(doc.into()))
}

pub async fn delete_document(
    service: Arc<Service>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<RetireRequest>,
) -> Result<Json<DocumentDto>, Problem> {
    let doc = service
        .delete(&actor, id, req.reason)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(doc.into()))
}

/// Move a document to an explicit status along the transition table
pub async fn transition_document(
    service: Arc<Service>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<DocumentDto>, Problem> {
    let target = parse_status("status", &req.status).map_err(map_domain_error)?;
    let doc = service
        .transition(&actor, id, target, req.note)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(doc.into()))
}

/// Preview the code the next document of a department and type would get
pub async fn next_document_code(
    service: Arc<Service>,
    Actor(_actor): Actor,
    Query(query): Query<NextCodeQuery>,
) -> Result<Json<NextCodeDto>, Problem> {
    let document_type =
        parse_document_type("documentType", &query.document_type).map_err(map_domain_error)?;
    let language = parse_language("language", query.language.as_deref()).map_err(map_domain_error)?;
    let document_code = service
        .next_document_code(&query.department, document_type, language)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(NextCodeDto { document_code }))
}

// ===== Change Request Handlers =====

pub async fn list_change_requests(
    service: Arc<Service>,
    Actor(actor): Actor,
    Query(query): Query<ListChangeRequestsQuery>,
) -> Result<Json<Vec<ChangeRequestDto>>, Problem> {
    let filter = ChangeRequestFilter::try_from(query).map_err(map_domain_error)?;
    let requests = service
        .list_change_requests(&actor, &filter)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(requests.into_iter().map(ChangeRequestDto::from).collect()))
}

pub async fn create_change_request(
    service: Arc<Service>,
    Actor(actor): Actor,
    Json(req): Json<CreateChangeRequestRequest>,
) -> Result<(StatusCode, Json<ChangeRequestDto>), Problem> {
    let input = NewChangeRequest::try_from(req).map_err(map_domain_error)?;
    let cr = service
        .create_change_request(&actor, input)
        .await
        .map_err(map_domain_error)?;

    Ok((StatusCode::CREATED, Json(cr.into())))
}

pub async fn get_change_request(
    service: Arc<Service>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<ChangeRequestDto>, Problem> {
    let cr = service
        .get_change_request(&actor, id)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(cr.into()))
}

pub async fn approve_change_request(
    service: Arc<Service>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<NoteRequest>,
) -> Result<Json<ChangeRequestDto>, Problem> {
    let cr = service
        .approve_change_request(&actor, id, req.note)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(cr.into()))
}

pub async fn reject_change_request(
    service: Arc<Service>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<ReasonRequest>,
) -> Result<Json<ChangeRequestDto>, Problem> {
    let cr = service
        .reject_change_request(&actor, id, req.reason)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(cr.into()))
}

pub async fn query_change_request(
    service: Arc<Service>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<ChangeRequestDto>, Problem> {
    let cr = service
        .query_change_request(&actor, id, req.query)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(cr.into()))
}

pub async fn cancel_change_request(
    service: Arc<Service>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<ReasonRequest>,
) -> Result<Json<ChangeRequestDto>, Problem> {
    let cr = service
        .cancel_change_request(&actor, id, req.reason)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(cr.into()))
}

pub async fn complete_change_request(
    service: Arc<Service>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<NoteRequest>,
) -> Result<Json<ChangeRequestDto>, Problem> {
    let cr = service
        .complete_change_request(&actor, id, req.note)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(cr.into()))
}

// ===== Health =====

pub async fn health() -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_string(),
    })
}
