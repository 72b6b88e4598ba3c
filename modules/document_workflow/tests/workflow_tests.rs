//! Integration tests for the document workflow service

mod common;

use chrono::NaiveDate;
use common::*;
use document_workflow::contract::*;
use document_workflow::domain::ServiceSettings;

#[tokio::test]
async fn test_end_to_end_lifecycle() {
    print_test_header(
        "test_end_to_end_lifecycle",
        &["Create → controller action → requester approval → live → edit → complete"],
    );
    let env = create_test_env();
    let svc = &env.service;

    let doc = svc
        .create_document(&controller(), new_document("Expense Reimbursement"))
        .await
        .unwrap();
    print_stage(&doc, "created");
    assert_eq!(doc.status, DocumentStatus::UnderReview);
    assert_eq!(doc.pending_with, None);
    assert_eq!(doc.version_number, "1.0");
    assert_eq!(doc.document_code, "SDG-FIN-SOP-01-EN");

    let doc = svc.take_action(&controller(), doc.id, None, None).await.unwrap();
    print_stage(&doc, "controller action");
    assert_eq!(doc.status, DocumentStatus::UnderReview);
    assert_eq!(doc.pending_with, Some(Party::DocumentRequester));

    let doc = svc.approve(&requester(), doc.id, None).await.unwrap();
    print_stage(&doc, "requester approved");
    assert_eq!(doc.status, DocumentStatus::Approved);

    let doc = svc.push_live(&controller(), doc.id, None).await.unwrap();
    print_stage(&doc, "pushed live");
    assert_eq!(doc.status, DocumentStatus::Live);
    assert_eq!(doc.pending_with, None);
    assert!(doc.effective_date.is_some());

    let patch = DocumentPatch {
        description: Some("Clarified mileage rates".to_string()),
        ..Default::default()
    };
    let doc = svc.update_document(&owner(), doc.id, patch).await.unwrap();
    print_stage(&doc, "owner edited");
    assert_eq!(doc.status, DocumentStatus::LiveCr);
    assert_eq!(doc.description.as_deref(), Some("Clarified mileage rates"));

    let doc = svc.complete_change(&owner(), doc.id, None).await.unwrap();
    print_stage(&doc, "change completed");
    assert_eq!(doc.status, DocumentStatus::Live);

    assert_eq!(
        env.notifier.calls(),
        vec![
            "send_review_notifications",
            "notify_document_approved",
            "notify_document_live",
            "notify_document_owner_for_approval",
            "notify_document_live",
        ]
    );
    // One audit record per state change, creation included
    assert_eq!(env.audit.records().len(), 6);
    println!("✅ Lifecycle completed with {} comments", doc.comments.len());
}

#[tokio::test]
async fn test_full_review_chain_with_revision() {
    print_test_header(
        "test_full_review_chain_with_revision",
        &["Reviewer → creator → requester → revision upload → owner → live"],
    );
    let env = create_test_env();
    let svc = &env.service;
    let doc = svc
        .create_document(&controller(), new_document("Vendor Onboarding"))
        .await
        .unwrap();

    let doc = svc.approve(&reviewer(), doc.id, None).await.unwrap();
    assert_eq!(doc.status, DocumentStatus::PendingCreatorApproval);
    assert_eq!(doc.pending_with, Some(Party::DocumentCreator));

    let doc = svc.approve(&creator(), doc.id, None).await.unwrap();
    assert_eq!(doc.status, DocumentStatus::PendingRequesterApproval);
    assert_eq!(doc.pending_with, Some(Party::DocumentRequester));

    let doc = svc.approve(&requester(), doc.id, None).await.unwrap();
    assert_eq!(doc.status, DocumentStatus::UnderRevision);
    assert_eq!(doc.pending_with, Some(Party::DocumentCreator));

    let attachment = Attachment {
        file_name: "vendor-onboarding-v2.docx".to_string(),
        bytes: b"revised".to_vec(),
    };
    let doc = svc
        .upload_revision(&creator(), doc.id, Some(attachment), Some("tracked changes".to_string()))
        .await
        .unwrap();
    assert_eq!(doc.status, DocumentStatus::PendingOwnerApproval);
    assert_eq!(doc.pending_with, Some(Party::DocumentOwner));
    assert_eq!(doc.attachment_name.as_deref(), Some("vendor-onboarding-v2.docx"));
    assert!(doc.file_url.as_deref().unwrap().starts_with("/files/"));
    assert_eq!(env.files.paths().len(), 1);

    let doc = svc.approve(&owner(), doc.id, None).await.unwrap();
    assert_eq!(doc.status, DocumentStatus::Approved);

    let doc = svc.push_live(&controller(), doc.id, None).await.unwrap();
    assert_eq!(doc.status, DocumentStatus::Live);
    println!("✅ Full review chain reached live");
}

#[tokio::test]
async fn test_upload_revision_survives_file_store_failure() {
    let env = create_test_env();
    let svc = &env.service;
    let doc = svc
        .create_document(&controller(), new_document("Petty Cash"))
        .await
        .unwrap();
    svc.approve(&reviewer(), doc.id, None).await.unwrap();
    svc.approve(&creator(), doc.id, None).await.unwrap();
    svc.approve(&requester(), doc.id, None).await.unwrap();

    env.files.fail(true);
    let attachment = Attachment {
        file_name: "petty-cash.pdf".to_string(),
        bytes: vec![1, 2, 3],
    };

    // A standalone attach reports the failure
    let err = svc
        .attach_file(&creator(), doc.id, attachment.clone())
        .await
        .unwrap_err();
    assert_eq!(err, WorkflowError::Internal);

    let doc = svc
        .upload_revision(&creator(), doc.id, Some(attachment), None)
        .await
        .unwrap();
    assert_eq!(doc.status, DocumentStatus::PendingOwnerApproval);
    assert_eq!(doc.attachment_name, None);
    assert!(env.files.paths().is_empty());
}

#[tokio::test]
async fn test_illegal_transition_leaves_store_unchanged() {
    let env = create_test_env();
    let svc = &env.service;
    let doc = svc
        .create_document(&controller(), new_document("Travel Policy"))
        .await
        .unwrap();

    let err = svc.push_live(&controller(), doc.id, None).await.unwrap_err();
    assert_eq!(
        err,
        WorkflowError::InvalidTransition {
            from: DocumentStatus::UnderReview,
            to: DocumentStatus::Live,
            role: Role::DocumentController,
        }
    );

    let err = svc
        .transition(&controller(), doc.id, DocumentStatus::Live, None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidTransition { .. }));

    let stored = env.documents.stored(doc.id).unwrap();
    assert_eq!(stored.status, DocumentStatus::UnderReview);
    assert_eq!(stored.comments, doc.comments);
    assert_eq!(stored.audit_trail.len(), 1);
}

#[tokio::test]
async fn test_controller_cannot_approve() {
    let env = create_test_env();
    let doc = env
        .service
        .create_document(&controller(), new_document("Cash Count"))
        .await
        .unwrap();
    let err = env.service.approve(&controller(), doc.id, None).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Forbidden { role: Role::DocumentController, .. }));
}

#[tokio::test]
async fn test_live_edit_overrides_requested_status() {
    let env = create_test_env();
    let doc = live_document(&env, "Payroll Cutoff").await;

    let patch = DocumentPatch {
        sop_name: Some("Payroll Cut-off".to_string()),
        status: Some(DocumentStatus::Archived),
        ..Default::default()
    };
    let doc = env.service.update_document(&owner(), doc.id, patch).await.unwrap();
    assert_eq!(doc.status, DocumentStatus::LiveCr);
    assert_eq!(doc.pending_with, Some(Party::DocumentOwner));
}

#[tokio::test]
async fn test_comments_are_append_only() {
    let env = create_test_env();
    let svc = &env.service;
    let doc = svc
        .create_document(&controller(), new_document("Asset Disposal"))
        .await
        .unwrap();
    let mut previous = doc.comments.clone();
    assert_eq!(previous.len(), 1);

    let steps: Vec<Document> = vec![
        svc.query(&reviewer(), doc.id, "Which threshold applies?").await.unwrap(),
        svc.take_action(&controller(), doc.id, None, Some("answered".into())).await.unwrap(),
        svc.approve(&requester(), doc.id, None).await.unwrap(),
        svc.push_live(&controller(), doc.id, None).await.unwrap(),
    ];

    for step in steps {
        assert_eq!(step.comments.len(), previous.len() + 1);
        assert_eq!(&step.comments[..previous.len()], &previous[..]);
        assert_eq!(step.audit_trail.len(), step.comments.len());
        previous = step.comments.clone();
    }
    assert_eq!(previous[1], "Query: Which threshold applies?");
    assert_eq!(previous[2], "Controller Action: forwarded to Document Requester: answered");
}

#[tokio::test]
async fn test_query_then_take_action_routes_back() {
    let env = create_test_env();
    let svc = &env.service;
    let doc = svc
        .create_document(&controller(), new_document("Budget Transfers"))
        .await
        .unwrap();

    let doc = svc.query(&owner(), doc.id, "Missing annex").await.unwrap();
    assert_eq!(doc.status, DocumentStatus::Queried);
    assert_eq!(doc.pending_with, Some(Party::DocumentController));
    assert_eq!(doc.last_query_origin(), Some(Role::DocumentOwner));

    let doc = svc
        .take_action(&controller(), doc.id, Some(Party::DocumentOwner), None)
        .await
        .unwrap();
    assert_eq!(doc.status, DocumentStatus::UnderReview);
    assert_eq!(doc.pending_with, Some(Party::DocumentOwner));
    assert!(env
        .notifier
        .calls()
        .contains(&"notify_document_controller_query".to_string()));
}

#[tokio::test]
async fn test_visibility_rules() {
    let env = create_test_env();
    let svc = &env.service;
    let finance = svc
        .create_document(&controller(), new_document("Invoice Matching"))
        .await
        .unwrap();
    let mut other = new_document("Hiring Approvals");
    other.department = "Human Resources".to_string();
    other.document_owners = vec![person("owner-2")];
    other.reviewers = vec![person("reviewer-2")];
    other.requester = None;
    let hr = svc.create_document(&controller(), other).await.unwrap();

    let mine = svc
        .list_documents(&owner(), &DocumentFilter::default())
        .await
        .unwrap();
    assert_eq!(mine.iter().map(|d| d.id).collect::<Vec<_>>(), vec![finance.id]);

    let all = svc
        .list_documents(&controller(), &DocumentFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    // Listed as reviewer but acting as owner sees nothing
    let wrong_role = ActorContext::new("reviewer-1", Role::DocumentOwner);
    assert!(svc
        .list_documents(&wrong_role, &DocumentFilter::default())
        .await
        .unwrap()
        .is_empty());

    let err = svc.get_document(&owner(), hr.id).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Forbidden { .. }));
    let caps = svc.document_capabilities(&owner(), hr.id).await.unwrap();
    assert_eq!(caps, Capabilities::default());

    let err = svc.get_document(&owner(), uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, WorkflowError::NotFound { .. }));
}

#[tokio::test]
async fn test_admin_delete_and_restore() {
    let env = create_test_env();
    let svc = &env.service;
    let doc = svc
        .create_document(&controller(), new_document("Obsolete Form"))
        .await
        .unwrap();

    let err = svc.delete(&controller(), doc.id, None).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Forbidden { .. }));

    let deleted = svc
        .delete(&admin(), doc.id, Some("duplicate".to_string()))
        .await
        .unwrap();
    assert_eq!(deleted.status, DocumentStatus::Deleted);
    assert_eq!(deleted.comments.last().unwrap(), "Deleted: duplicate");

    assert!(svc
        .list_documents(&controller(), &DocumentFilter::default())
        .await
        .unwrap()
        .is_empty());
    let with_deleted = DocumentFilter {
        include_deleted: true,
        ..Default::default()
    };
    assert_eq!(svc.list_documents(&admin(), &with_deleted).await.unwrap().len(), 1);
    assert!(svc
        .list_documents(&controller(), &with_deleted)
        .await
        .unwrap()
        .is_empty());

    let restored = svc.start_review(&admin(), doc.id, None).await.unwrap();
    assert_eq!(restored.status, DocumentStatus::UnderReview);
    assert_eq!(restored.pending_with, Some(Party::Reviewer));
}

#[tokio::test]
async fn test_failing_notifier_does_not_roll_back() {
    let env = create_test_env_with(RecordingNotifier::failing(), ServiceSettings::default());
    let doc = env
        .service
        .create_document(&controller(), new_document("Key Custody"))
        .await
        .unwrap();

    let doc = env.service.take_action(&controller(), doc.id, None, None).await.unwrap();
    assert_eq!(doc.pending_with, Some(Party::DocumentRequester));
    assert_eq!(env.notifier.calls(), vec!["send_review_notifications"]);
    assert_eq!(
        env.documents.stored(doc.id).unwrap().pending_with,
        Some(Party::DocumentRequester)
    );
}

#[tokio::test]
async fn test_failed_save_returns_internal_and_keeps_record() {
    let env = create_test_env();
    let doc = env
        .service
        .create_document(&controller(), new_document("Bank Reconciliation"))
        .await
        .unwrap();

    env.documents.fail_writes(true);
    let err = env.service.take_action(&controller(), doc.id, None, None).await.unwrap_err();
    assert_eq!(err, WorkflowError::Internal);

    let stored = env.documents.stored(doc.id).unwrap();
    assert_eq!(stored, doc);
    assert!(env.notifier.calls().is_empty());
}

#[tokio::test]
async fn test_revision_date_rule_on_create_and_edit() {
    let env = create_test_env();
    let svc = &env.service;
    let last = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();

    let mut early = new_document("Fixed Assets");
    early.last_revision_date = Some(last);
    early.next_revision_date = NaiveDate::from_ymd_opt(2025, 4, 14);
    let err = svc.create_document(&controller(), early).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Validation { ref field, .. } if field == "next_revision_date"));

    let mut exact = new_document("Fixed Assets");
    exact.last_revision_date = Some(last);
    exact.next_revision_date = NaiveDate::from_ymd_opt(2025, 4, 15);
    let doc = svc.create_document(&controller(), exact).await.unwrap();
    assert_eq!(doc.next_revision_date, NaiveDate::from_ymd_opt(2025, 4, 15));

    let mut filled = new_document("Fixed Assets Register");
    filled.last_revision_date = Some(last);
    let doc = svc.create_document(&controller(), filled).await.unwrap();
    assert_eq!(doc.next_revision_date, NaiveDate::from_ymd_opt(2025, 4, 15));

    let patch = DocumentPatch {
        next_revision_date: NaiveDate::from_ymd_opt(2025, 2, 1),
        ..Default::default()
    };
    let err = svc.update_document(&controller(), doc.id, patch).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Validation { .. }));
    assert_eq!(env.documents.stored(doc.id).unwrap().next_revision_date, doc.next_revision_date);
}

#[tokio::test]
async fn test_document_codes_are_sequential() {
    let env = create_test_env();
    let svc = &env.service;

    let first = svc
        .create_document(&controller(), new_document("Receipts"))
        .await
        .unwrap();
    let second = svc
        .create_document(&controller(), new_document("Refunds"))
        .await
        .unwrap();
    let mut arabic = new_document("Refunds (AR)");
    arabic.language = Some(Language::Arabic);
    let third = svc.create_document(&controller(), arabic).await.unwrap();

    assert_eq!(first.document_code, "SDG-FIN-SOP-01-EN");
    assert_eq!(second.document_code, "SDG-FIN-SOP-02-EN");
    assert_eq!(third.document_code, "SDG-FIN-SOP-01-AR");
    assert_eq!(
        svc.next_document_code("Finance", DocumentType::Sop, Some(Language::English))
            .await
            .unwrap(),
        "SDG-FIN-SOP-03-EN"
    );
}

#[tokio::test]
async fn test_create_requires_owner_and_non_reviewer() {
    let env = create_test_env();
    let err = env
        .service
        .create_document(&reviewer(), new_document("Anything"))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Forbidden { .. }));

    let mut input = new_document("Ownerless");
    input.document_owners.clear();
    let err = env.service.create_document(&controller(), input).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Validation { ref field, .. } if field == "document_owners"));
}

#[tokio::test]
async fn test_breach_flag_under_review() {
    let env = create_test_env();
    let mut input = new_document("Overdue Policy");
    input.last_revision_date = NaiveDate::from_ymd_opt(2020, 1, 1);
    let doc = env.service.create_document(&controller(), input).await.unwrap();
    assert!(doc.is_breached());

    let live = live_document(&env, "Fresh Policy").await;
    assert!(!live.is_breached());
}
