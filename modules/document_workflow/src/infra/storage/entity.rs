//! SeaORM entities for database tables
//!
//! Person lists, comments and audit trails are JSON columns so their order
//! round-trips unchanged.

/// Documents table
pub mod document {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "documents")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,

        pub sop_name: String,
        pub document_code: String,
        pub document_number: Option<String>,
        pub version_number: String,
        /// Display label, e.g. "Work Instruction"
        pub document_type: String,
        pub department: String,
        pub country: Option<String>,
        pub description: Option<String>,
        /// EN | AR
        pub language: Option<String>,

        /// Canonical kebab-case status
        pub status: String,
        /// Party label
        pub pending_with: Option<String>,

        pub upload_date: Option<Date>,
        pub last_revision_date: Option<Date>,
        pub next_revision_date: Option<Date>,
        pub review_start_date: Option<Date>,
        pub review_deadline: Option<Date>,
        pub effective_date: Option<Date>,
        pub created_at: DateTimeUtc,
        pub updated_at: DateTimeUtc,

        pub created_by: Option<String>,
        pub requester: Option<Json>,
        pub document_owners: Json,
        pub reviewers: Json,
        pub document_creators: Json,
        pub compliance_contacts: Json,
        pub current_reviewers: Json,

        pub comments: Json,
        pub audit_trail: Json,

        pub attachment_name: Option<String>,
        pub file_url: Option<String>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::change_request::Entity")]
        ChangeRequests,
    }

    impl Related<super::change_request::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::ChangeRequests.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Change requests table
pub mod change_request {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "change_requests")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,

        /// Target document; empty for new-requests until approved
        pub document_id: Option<Uuid>,
        pub document_name: String,
        pub request_type: String,
        pub change_type: Option<String>,
        pub status: String,
        pub requestor: Json,
        pub approvers: Json,
        pub department: Option<String>,
        pub description: Option<String>,
        pub document_type: Option<String>,
        pub language: Option<String>,
        pub proposed_version: String,

        pub comments: Json,
        pub audit_trail: Json,

        pub created_at: DateTimeUtc,
        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::document::Entity",
            from = "Column::DocumentId",
            to = "super::document::Column::Id"
        )]
        Document,
    }

    impl Related<super::document::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Document.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}
