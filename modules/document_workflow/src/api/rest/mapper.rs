//! Conversions between REST DTOs and contract models
//!
//! Outbound conversions are infallible. Inbound ones parse the string-typed
//! enumerations and report the offending field as a validation error.

use super::dto::*;
use crate::contract::{
    AuditEvent, Capabilities, ChangeRequest, ChangeRequestFilter, ChangeRequestStatus, ChangeType,
    Document, DocumentFilter, DocumentPatch, DocumentStatus, DocumentType, Language,
    NewChangeRequest, NewDocument, Person, RequestType, WorkflowError,
};

// ===== Outbound =====

impl From<Person> for PersonDto {
    fn from(person: Person) -> Self {
        Self {
            id: person.id,
            name: person.name,
            email: person.email,
        }
    }
}

impl From<PersonDto> for Person {
    fn from(dto: PersonDto) -> Self {
        Person::new(dto.id, dto.name, dto.email)
    }
}

impl From<AuditEvent> for AuditEventDto {
    fn from(event: AuditEvent) -> Self {
        Self {
            kind: event.kind.as_str().to_string(),
            actor_role: event.actor_role.as_str().to_string(),
            actor_id: event.actor_id,
            from_status: event.from_status.map(|s| s.as_str().to_string()),
            to_status: event.to_status.map(|s| s.as_str().to_string()),
            pending_with: event.pending_with.map(|p| p.label().to_string()),
            details: event.details,
            timestamp: event.timestamp,
        }
    }
}

fn people(list: Vec<Person>) -> Vec<PersonDto> {
    list.into_iter().map(PersonDto::from).collect()
}

impl From<Document> for DocumentDto {
    fn from(doc: Document) -> Self {
        let is_breached = doc.is_breached();
        Self {
            id: doc.id,
            sop_name: doc.sop_name,
            document_code: doc.document_code,
            document_number: doc.document_number,
            version_number: doc.version_number,
            document_type: doc.document_type.label().to_string(),
            department: doc.department,
            country: doc.country,
            description: doc.description,
            language: doc.language.map(|l| l.code().to_string()),
            status: doc.status.as_str().to_string(),
            pending_with: doc.pending_with.map(|p| p.label().to_string()),
            is_breached,
            upload_date: doc.upload_date,
            last_revision_date: doc.last_revision_date,
            next_revision_date: doc.next_revision_date,
            review_start_date: doc.review_start_date,
            review_deadline: doc.review_deadline,
            effective_date: doc.effective_date,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            created_by: doc.created_by,
            requester: doc.requester.map(PersonDto::from),
            document_owners: people(doc.document_owners),
            reviewers: people(doc.reviewers),
            document_creators: people(doc.document_creators),
            compliance_contacts: people(doc.compliance_contacts),
            current_reviewers: people(doc.current_reviewers),
            comments: doc.comments,
            audit_trail: doc.audit_trail.into_iter().map(AuditEventDto::from).collect(),
            attachment_name: doc.attachment_name,
            file_url: doc.file_url,
        }
    }
}

impl From<Capabilities> for CapabilitiesDto {
    fn from(c: Capabilities) -> Self {
        Self {
            can_view: c.can_view,
            can_edit: c.can_edit,
            can_approve: c.can_approve,
            can_reject: c.can_reject,
            can_query: c.can_query,
            can_start_review: c.can_start_review,
            can_push_live: c.can_push_live,
            can_upload_revision: c.can_upload_revision,
            can_take_action: c.can_take_action,
            can_complete_change: c.can_complete_change,
            can_archive: c.can_archive,
            can_delete: c.can_delete,
        }
    }
}

impl From<ChangeRequest> for ChangeRequestDto {
    fn from(cr: ChangeRequest) -> Self {
        Self {
            id: cr.id,
            document_id: cr.document_id,
            document_name: cr.document_name,
            request_type: cr.request_type.as_str().to_string(),
            change_type: cr.change_type.map(|c| c.as_str().to_string()),
            status: cr.status.as_str().to_string(),
            requestor: cr.requestor.into(),
            approvers: people(cr.approvers),
            department: cr.department,
            description: cr.description,
            document_type: cr.document_type.map(|t| t.label().to_string()),
            language: cr.language.map(|l| l.code().to_string()),
            proposed_version: cr.proposed_version,
            comments: cr.comments,
            audit_trail: cr.audit_trail.into_iter().map(AuditEventDto::from).collect(),
            created_at: cr.created_at,
            updated_at: cr.updated_at,
        }
    }
}

// ===== Inbound =====

pub fn parse_status(field: &str, value: &str) -> Result<DocumentStatus, WorkflowError> {
    DocumentStatus::from_legacy(value).map_err(|_| {
        WorkflowError::validation(field, format!("unknown document status '{}'", value))
    })
}

pub fn parse_document_type(field: &str, value: &str) -> Result<DocumentType, WorkflowError> {
    DocumentType::parse(value)
        .ok_or_else(|| WorkflowError::validation(field, format!("unknown document type '{}'", value)))
}

pub fn parse_language(field: &str, value: Option<&str>) -> Result<Option<Language>, WorkflowError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => Language::parse(v)
            .map(Some)
            .ok_or_else(|| WorkflowError::validation(field, format!("unknown language '{}'", v))),
    }
}

impl TryFrom<CreateDocumentRequest> for NewDocument {
    type Error = WorkflowError;

    fn try_from(req: CreateDocumentRequest) -> Result<Self, Self::Error> {
        let document_type = parse_document_type("documentType", &req.document_type)?;
        let mut input = NewDocument::new(req.sop_name, document_type, req.department);
        input.language = parse_language("language", req.language.as_deref())?;
        input.country = req.country;
        input.description = req.description;
        input.document_number = req.document_number;
        input.version_number = req.version_number;
        input.upload_date = req.upload_date;
        input.last_revision_date = req.last_revision_date;
        input.next_revision_date = req.next_revision_date;
        input.review_start_date = req.review_start_date;
        input.review_deadline = req.review_deadline;
        input.effective_date = req.effective_date;
        input.requester = req.requester.map(Person::from);
        input.document_owners = req.document_owners.into_iter().map(Person::from).collect();
        input.reviewers = req.reviewers.into_iter().map(Person::from).collect();
        input.document_creators = req.document_creators.into_iter().map(Person::from).collect();
        input.compliance_contacts = req.compliance_contacts.into_iter().map(Person::from).collect();
        input.attachment_name = req.attachment_name;
        input.file_url = req.file_url;
        input.comment = req.comment;
        Ok(input)
    }
}

fn people_in(list: Option<Vec<PersonDto>>) -> Option<Vec<Person>> {
    list.map(|l| l.into_iter().map(Person::from).collect())
}

impl TryFrom<UpdateDocumentRequest> for DocumentPatch {
    type Error = WorkflowError;

    fn try_from(req: UpdateDocumentRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            status: req
                .status
                .as_deref()
                .map(|s| parse_status("status", s))
                .transpose()?,
            sop_name: req.sop_name,
            description: req.description,
            country: req.country,
            document_number: req.document_number,
            last_revision_date: req.last_revision_date,
            next_revision_date: req.next_revision_date,
            review_start_date: req.review_start_date,
            review_deadline: req.review_deadline,
            effective_date: req.effective_date,
            document_owners: people_in(req.document_owners),
            reviewers: people_in(req.reviewers),
            document_creators: people_in(req.document_creators),
            compliance_contacts: people_in(req.compliance_contacts),
            comment: req.comment,
        })
    }
}

impl TryFrom<ListDocumentsQuery> for DocumentFilter {
    type Error = WorkflowError;

    fn try_from(query: ListDocumentsQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            status: query
                .status
                .as_deref()
                .map(|s| parse_status("status", s))
                .transpose()?,
            department: query.department,
            document_type: query
                .document_type
                .as_deref()
                .map(|t| parse_document_type("documentType", t))
                .transpose()?,
            sop_name: query.sop_name,
            include_deleted: query.include_deleted,
        })
    }
}

impl TryFrom<CreateChangeRequestRequest> for NewChangeRequest {
    type Error = WorkflowError;

    fn try_from(req: CreateChangeRequestRequest) -> Result<Self, Self::Error> {
        let request_type = RequestType::parse(&req.request_type).ok_or_else(|| {
            WorkflowError::validation(
                "requestType",
                format!("unknown request type '{}'", req.request_type),
            )
        })?;
        let change_type = req
            .change_type
            .as_deref()
            .map(|c| {
                ChangeType::parse(c).ok_or_else(|| {
                    WorkflowError::validation("changeType", format!("unknown change type '{}'", c))
                })
            })
            .transpose()?;
        let document_type = req
            .document_type
            .as_deref()
            .map(|t| parse_document_type("documentType", t))
            .transpose()?;

        Ok(Self {
            request_type,
            change_type,
            document_id: req.document_id,
            document_name: req.document_name,
            department: req.department,
            description: req.description,
            approvers: req.approvers.into_iter().map(Person::from).collect(),
            document_type,
            language: parse_language("language", req.language.as_deref())?,
            comment: req.comment,
        })
    }
}

impl TryFrom<ListChangeRequestsQuery> for ChangeRequestFilter {
    type Error = WorkflowError;

    fn try_from(query: ListChangeRequestsQuery) -> Result<Self, Self::Error> {
        let status = query
            .status
            .as_deref()
            .map(|s| {
                ChangeRequestStatus::parse(s).ok_or_else(|| {
                    WorkflowError::validation("status", format!("unknown change request status '{}'", s))
                })
            })
            .transpose()?;
        Ok(Self {
            status,
            document_id: query.document_id,
        })
    }
}
