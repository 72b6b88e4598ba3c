//! Entity to model mappers
//!
//! Conversions between SeaORM entities and contract models. Enum columns are
//! stored as their canonical strings; statuses are read back through the
//! legacy mapping so older spellings still load.

use super::entity::{change_request, document};
use crate::contract::{
    AuditEvent, AuditKind, ChangeRequest, ChangeRequestStatus, ChangeType, Document,
    DocumentStatus, DocumentType, Language, Party, Person, RequestType, Role,
};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};

// ===== Document Conversions =====

impl TryFrom<document::Model> for Document {
    type Error = anyhow::Error;

    fn try_from(entity: document::Model) -> Result<Self> {
        Ok(Self {
            id: entity.id,
            sop_name: entity.sop_name,
            document_code: entity.document_code,
            document_number: entity.document_number,
            version_number: entity.version_number,
            document_type: DocumentType::parse(&entity.document_type)
                .ok_or_else(|| anyhow!("unknown document type '{}'", entity.document_type))?,
            department: entity.department,
            country: entity.country,
            description: entity.description,
            language: lenient(entity.language.as_deref(), "language", Language::parse),
            status: DocumentStatus::from_legacy(&entity.status)
                .map_err(|e| anyhow!("document {}: {}", entity.id, e))?,
            pending_with: entity.pending_with.as_deref().map(Party::from_label),
            upload_date: entity.upload_date,
            last_revision_date: entity.last_revision_date,
            next_revision_date: entity.next_revision_date,
            review_start_date: entity.review_start_date,
            review_deadline: entity.review_deadline,
            effective_date: entity.effective_date,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            created_by: entity.created_by,
            requester: entity
                .requester
                .map(|value| people_from_json(value, "requester"))
                .transpose()?
                .and_then(|mut people| people.pop()),
            document_owners: people_from_json(entity.document_owners, "document_owners")?,
            reviewers: people_from_json(entity.reviewers, "reviewers")?,
            document_creators: people_from_json(entity.document_creators, "document_creators")?,
            compliance_contacts: people_from_json(entity.compliance_contacts, "compliance_contacts")?,
            current_reviewers: people_from_json(entity.current_reviewers, "current_reviewers")?,
            comments: serde_json::from_value(entity.comments).context("comments")?,
            audit_trail: audit_from_json(entity.audit_trail)?,
            attachment_name: entity.attachment_name,
            file_url: entity.file_url,
        })
    }
}

impl TryFrom<&Document> for document::ActiveModel {
    type Error = anyhow::Error;

    fn try_from(model: &Document) -> Result<Self> {
        Ok(Self {
            id: Set(model.id),
            sop_name: Set(model.sop_name.clone()),
            document_code: Set(model.document_code.clone()),
            document_number: Set(model.document_number.clone()),
            version_number: Set(model.version_number.clone()),
            document_type: Set(model.document_type.label().to_string()),
            department: Set(model.department.clone()),
            country: Set(model.country.clone()),
            description: Set(model.description.clone()),
            language: Set(model.language.map(|l| l.code().to_string())),
            status: Set(model.status.as_str().to_string()),
            pending_with: Set(model.pending_with.as_ref().map(|p| p.label().to_string())),
            upload_date: Set(model.upload_date),
            last_revision_date: Set(model.last_revision_date),
            next_revision_date: Set(model.next_revision_date),
            review_start_date: Set(model.review_start_date),
            review_deadline: Set(model.review_deadline),
            effective_date: Set(model.effective_date),
            created_at: Set(model.created_at),
            updated_at: Set(model.updated_at),
            created_by: Set(model.created_by.clone()),
            requester: Set(model
                .requester
                .as_ref()
                .map(|p| people_to_json(std::slice::from_ref(p)))
                .transpose()?),
            document_owners: Set(people_to_json(&model.document_owners)?),
            reviewers: Set(people_to_json(&model.reviewers)?),
            document_creators: Set(people_to_json(&model.document_creators)?),
            compliance_contacts: Set(people_to_json(&model.compliance_contacts)?),
            current_reviewers: Set(people_to_json(&model.current_reviewers)?),
            comments: Set(serde_json::to_value(&model.comments)?),
            audit_trail: Set(audit_to_json(&model.audit_trail)?),
            attachment_name: Set(model.attachment_name.clone()),
            file_url: Set(model.file_url.clone()),
        })
    }
}

// ===== Change Request Conversions =====

impl TryFrom<change_request::Model> for ChangeRequest {
    type Error = anyhow::Error;

    fn try_from(entity: change_request::Model) -> Result<Self> {
        let requestor: PersonJson =
            serde_json::from_value(entity.requestor).context("requestor")?;
        Ok(Self {
            id: entity.id,
            document_id: entity.document_id,
            document_name: entity.document_name,
            request_type: RequestType::parse(&entity.request_type)
                .ok_or_else(|| anyhow!("unknown request type '{}'", entity.request_type))?,
            change_type: lenient(entity.change_type.as_deref(), "change_type", ChangeType::parse),
            status: ChangeRequestStatus::parse(&entity.status)
                .ok_or_else(|| anyhow!("unknown change request status '{}'", entity.status))?,
            requestor: requestor.into(),
            approvers: people_from_json(entity.approvers, "approvers")?,
            department: entity.department,
            description: entity.description,
            document_type: lenient(entity.document_type.as_deref(), "document_type", DocumentType::parse),
            language: lenient(entity.language.as_deref(), "language", Language::parse),
            proposed_version: entity.proposed_version,
            comments: serde_json::from_value(entity.comments).context("comments")?,
            audit_trail: audit_from_json(entity.audit_trail)?,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}

impl TryFrom<&ChangeRequest> for change_request::ActiveModel {
    type Error = anyhow::Error;

    fn try_from(model: &ChangeRequest) -> Result<Self> {
        Ok(Self {
            id: Set(model.id),
            document_id: Set(model.document_id),
            document_name: Set(model.document_name.clone()),
            request_type: Set(model.request_type.as_str().to_string()),
            change_type: Set(model.change_type.map(|c| c.as_str().to_string())),
            status: Set(model.status.as_str().to_string()),
            requestor: Set(serde_json::to_value(PersonJson::from(&model.requestor))?),
            approvers: Set(people_to_json(&model.approvers)?),
            department: Set(model.department.clone()),
            description: Set(model.description.clone()),
            document_type: Set(model.document_type.map(|t| t.label().to_string())),
            language: Set(model.language.map(|l| l.code().to_string())),
            proposed_version: Set(model.proposed_version.clone()),
            comments: Set(serde_json::to_value(&model.comments)?),
            audit_trail: Set(audit_to_json(&model.audit_trail)?),
            created_at: Set(model.created_at),
            updated_at: Set(model.updated_at),
        })
    }
}

/// Parse an optional enum column; unknown values load as `None` with a warning
fn lenient<T>(value: Option<&str>, column: &'static str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let raw = value?;
    let parsed = parse(raw);
    if parsed.is_none() {
        tracing::warn!(column, value = raw, "unknown stored value dropped");
    }
    parsed
}

// ===== JSON Serialization Helpers =====

/// JSON representation of a person reference
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersonJson {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
}

impl From<&Person> for PersonJson {
    fn from(person: &Person) -> Self {
        Self {
            id: person.id.clone(),
            name: person.name.clone(),
            email: person.email.clone(),
        }
    }
}

impl From<PersonJson> for Person {
    fn from(json: PersonJson) -> Self {
        Person::new(json.id, json.name, json.email)
    }
}

/// JSON representation of an audit event
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AuditEventJson {
    kind: String,
    actor_role: String,
    actor_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    from_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    to_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pending_with: Option<String>,
    details: String,
    timestamp: DateTime<Utc>,
}

impl From<&AuditEvent> for AuditEventJson {
    fn from(event: &AuditEvent) -> Self {
        Self {
            kind: event.kind.as_str().to_string(),
            actor_role: event.actor_role.as_str().to_string(),
            actor_id: event.actor_id.clone(),
            from_status: event.from_status.map(|s| s.as_str().to_string()),
            to_status: event.to_status.map(|s| s.as_str().to_string()),
            pending_with: event.pending_with.as_ref().map(|p| p.label().to_string()),
            details: event.details.clone(),
            timestamp: event.timestamp,
        }
    }
}

impl TryFrom<AuditEventJson> for AuditEvent {
    type Error = anyhow::Error;

    fn try_from(json: AuditEventJson) -> Result<Self> {
        let status = |value: Option<String>| -> Result<Option<DocumentStatus>> {
            value
                .map(|s| DocumentStatus::from_legacy(&s).map_err(|e| anyhow!("{}", e)))
                .transpose()
        };
        Ok(Self {
            kind: AuditKind::parse(&json.kind)
                .ok_or_else(|| anyhow!("unknown audit kind '{}'", json.kind))?,
            actor_role: Role::parse(&json.actor_role)
                .ok_or_else(|| anyhow!("unknown role '{}'", json.actor_role))?,
            actor_id: json.actor_id,
            from_status: status(json.from_status)?,
            to_status: status(json.to_status)?,
            pending_with: json.pending_with.as_deref().map(Party::from_label),
            details: json.details,
            timestamp: json.timestamp,
        })
    }
}

fn people_to_json(people: &[Person]) -> Result<serde_json::Value> {
    let rows: Vec<PersonJson> = people.iter().map(PersonJson::from).collect();
    Ok(serde_json::to_value(rows)?)
}

fn people_from_json(value: serde_json::Value, column: &str) -> Result<Vec<Person>> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    let rows: Vec<PersonJson> =
        serde_json::from_value(value).with_context(|| format!("column {}", column))?;
    Ok(rows.into_iter().map(Person::from).collect())
}

fn audit_to_json(events: &[AuditEvent]) -> Result<serde_json::Value> {
    let rows: Vec<AuditEventJson> = events.iter().map(AuditEventJson::from).collect();
    Ok(serde_json::to_value(rows)?)
}

fn audit_from_json(value: serde_json::Value) -> Result<Vec<AuditEvent>> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    let rows: Vec<AuditEventJson> = serde_json::from_value(value).context("audit_trail")?;
    rows.into_iter().map(AuditEvent::try_from).collect()
}
