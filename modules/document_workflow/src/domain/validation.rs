//! Field validation for documents and change requests

use crate::contract::{add_months, Document, DocumentPatch, NewDocument, WorkflowError};
use chrono::NaiveDate;

/// Require non-blank free text (names, reasons, query text)
pub fn require_text(field: &str, value: &str) -> Result<(), WorkflowError> {
    if value.trim().is_empty() {
        return Err(WorkflowError::validation(
            field,
            format!("{} must not be empty", field),
        ));
    }
    Ok(())
}

/// Earliest allowed next revision date for a last revision date
pub fn earliest_next_revision(
    last_revision_date: NaiveDate,
    interval_months: u32,
) -> Result<NaiveDate, WorkflowError> {
    add_months(last_revision_date, interval_months).ok_or_else(|| {
        WorkflowError::validation("last_revision_date", "revision date is out of range")
    })
}

/// Check `next >= last + interval`.
///
/// Either side missing means there is nothing to check.
pub fn validate_revision_dates(
    last_revision_date: Option<NaiveDate>,
    next_revision_date: Option<NaiveDate>,
    interval_months: u32,
) -> Result<(), WorkflowError> {
    let (Some(last), Some(next)) = (last_revision_date, next_revision_date) else {
        return Ok(());
    };

    let earliest = earliest_next_revision(last, interval_months)?;
    if next < earliest {
        return Err(WorkflowError::validation(
            "next_revision_date",
            format!(
                "next revision date {} must be on or after {} ({} months after the last revision)",
                next, earliest, interval_months
            ),
        ));
    }
    Ok(())
}

/// Fill the next revision date from the last one when none is given
pub fn fill_next_revision_date(
    last_revision_date: Option<NaiveDate>,
    next_revision_date: Option<NaiveDate>,
    interval_months: u32,
) -> Result<Option<NaiveDate>, WorkflowError> {
    match (last_revision_date, next_revision_date) {
        (_, Some(next)) => Ok(Some(next)),
        (Some(last), None) => earliest_next_revision(last, interval_months).map(Some),
        (None, None) => Ok(None),
    }
}

/// Validate a creation request and fill its derived dates
pub fn validate_new_document(
    input: &mut NewDocument,
    interval_months: u32,
) -> Result<(), WorkflowError> {
    require_text("sop_name", &input.sop_name)?;
    require_text("department", &input.department)?;
    if input.document_owners.is_empty() {
        return Err(WorkflowError::validation(
            "document_owners",
            "at least one document owner is required",
        ));
    }

    input.next_revision_date = fill_next_revision_date(
        input.last_revision_date,
        input.next_revision_date,
        interval_months,
    )?;
    validate_revision_dates(
        input.last_revision_date,
        input.next_revision_date,
        interval_months,
    )
}

/// Apply a patch's descriptive fields to a document, validating as it goes.
///
/// Status is left alone; the caller resolves it against the state machine.
pub fn apply_patch(
    doc: &mut Document,
    patch: &DocumentPatch,
    interval_months: u32,
) -> Result<(), WorkflowError> {
    if let Some(name) = &patch.sop_name {
        require_text("sop_name", name)?;
        doc.sop_name = name.trim().to_string();
    }
    if let Some(owners) = &patch.document_owners {
        if owners.is_empty() {
            return Err(WorkflowError::validation(
                "document_owners",
                "at least one document owner is required",
            ));
        }
        doc.document_owners = owners.clone();
    }
    if let Some(reviewers) = &patch.reviewers {
        doc.reviewers = reviewers.clone();
    }
    if let Some(creators) = &patch.document_creators {
        doc.document_creators = creators.clone();
    }
    if let Some(contacts) = &patch.compliance_contacts {
        doc.compliance_contacts = contacts.clone();
    }
    if patch.description.is_some() {
        doc.description = patch.description.clone();
    }
    if patch.country.is_some() {
        doc.country = patch.country.clone();
    }
    if patch.document_number.is_some() {
        doc.document_number = patch.document_number.clone();
    }
    if patch.review_start_date.is_some() {
        doc.review_start_date = patch.review_start_date;
    }
    if patch.review_deadline.is_some() {
        doc.review_deadline = patch.review_deadline;
    }
    if patch.effective_date.is_some() {
        doc.effective_date = patch.effective_date;
    }

    // A changed last revision date refills the next one unless both are given
    if let Some(last) = patch.last_revision_date {
        doc.last_revision_date = Some(last);
        doc.next_revision_date = match patch.next_revision_date {
            Some(next) => Some(next),
            None => Some(earliest_next_revision(last, interval_months)?),
        };
    } else if let Some(next) = patch.next_revision_date {
        doc.next_revision_date = Some(next);
    }

    validate_revision_dates(doc.last_revision_date, doc.next_revision_date, interval_months)
}
