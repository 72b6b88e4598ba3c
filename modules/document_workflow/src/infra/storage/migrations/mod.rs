//! Database migrations for the document workflow

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_documents::Migration),
            Box::new(m20250301_000002_create_change_requests::Migration),
        ]
    }
}

#[derive(DeriveIden)]
enum Documents {
    Table,
    Id,
    SopName,
    DocumentCode,
    DocumentNumber,
    VersionNumber,
    DocumentType,
    Department,
    Country,
    Description,
    Language,
    Status,
    PendingWith,
    UploadDate,
    LastRevisionDate,
    NextRevisionDate,
    ReviewStartDate,
    ReviewDeadline,
    EffectiveDate,
    CreatedAt,
    UpdatedAt,
    CreatedBy,
    Requester,
    DocumentOwners,
    Reviewers,
    DocumentCreators,
    ComplianceContacts,
    CurrentReviewers,
    Comments,
    AuditTrail,
    AttachmentName,
    FileUrl,
}

mod m20250301_000001_create_documents {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000001_create_documents"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Documents::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Documents::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Documents::SopName).string().not_null())
                        .col(ColumnDef::new(Documents::DocumentCode).string().not_null())
                        .col(ColumnDef::new(Documents::DocumentNumber).string())
                        .col(ColumnDef::new(Documents::VersionNumber).string().not_null())
                        .col(ColumnDef::new(Documents::DocumentType).string().not_null())
                        .col(ColumnDef::new(Documents::Department).string().not_null())
                        .col(ColumnDef::new(Documents::Country).string())
                        .col(ColumnDef::new(Documents::Description).text())
                        .col(ColumnDef::new(Documents::Language).string())
                        .col(ColumnDef::new(Documents::Status).string().not_null())
                        .col(ColumnDef::new(Documents::PendingWith).string())
                        .col(ColumnDef::new(Documents::UploadDate).date())
                        .col(ColumnDef::new(Documents::LastRevisionDate).date())
                        .col(ColumnDef::new(Documents::NextRevisionDate).date())
                        .col(ColumnDef::new(Documents::ReviewStartDate).date())
                        .col(ColumnDef::new(Documents::ReviewDeadline).date())
                        .col(ColumnDef::new(Documents::EffectiveDate).date())
                        .col(
                            ColumnDef::new(Documents::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .col(
                            ColumnDef::new(Documents::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .col(ColumnDef::new(Documents::CreatedBy).string())
                        .col(ColumnDef::new(Documents::Requester).json())
                        .col(ColumnDef::new(Documents::DocumentOwners).json().not_null())
                        .col(ColumnDef::new(Documents::Reviewers).json().not_null())
                        .col(ColumnDef::new(Documents::DocumentCreators).json().not_null())
                        .col(ColumnDef::new(Documents::ComplianceContacts).json().not_null())
                        .col(ColumnDef::new(Documents::CurrentReviewers).json().not_null())
                        .col(ColumnDef::new(Documents::Comments).json().not_null())
                        .col(ColumnDef::new(Documents::AuditTrail).json().not_null())
                        .col(ColumnDef::new(Documents::AttachmentName).string())
                        .col(ColumnDef::new(Documents::FileUrl).string())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_documents_status")
                        .table(Documents::Table)
                        .col(Documents::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_documents_code")
                        .table(Documents::Table)
                        .col(Documents::DocumentCode)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Documents::Table).to_owned())
                .await
        }
    }
}

mod m20250301_000002_create_change_requests {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000002_create_change_requests"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ChangeRequests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ChangeRequests::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ChangeRequests::DocumentId).uuid())
                        .col(ColumnDef::new(ChangeRequests::DocumentName).string().not_null())
                        .col(ColumnDef::new(ChangeRequests::RequestType).string().not_null())
                        .col(ColumnDef::new(ChangeRequests::ChangeType).string())
                        .col(ColumnDef::new(ChangeRequests::Status).string().not_null())
                        .col(ColumnDef::new(ChangeRequests::Requestor).json().not_null())
                        .col(ColumnDef::new(ChangeRequests::Approvers).json().not_null())
                        .col(ColumnDef::new(ChangeRequests::Department).string())
                        .col(ColumnDef::new(ChangeRequests::Description).text())
                        .col(ColumnDef::new(ChangeRequests::DocumentType).string())
                        .col(ColumnDef::new(ChangeRequests::Language).string())
                        .col(
                            ColumnDef::new(ChangeRequests::ProposedVersion)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ChangeRequests::Comments).json().not_null())
                        .col(ColumnDef::new(ChangeRequests::AuditTrail).json().not_null())
                        .col(
                            ColumnDef::new(ChangeRequests::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .col(
                            ColumnDef::new(ChangeRequests::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_change_requests_document")
                                .from(ChangeRequests::Table, ChangeRequests::DocumentId)
                                .to(Documents::Table, Documents::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_change_requests_document")
                        .table(ChangeRequests::Table)
                        .col(ChangeRequests::DocumentId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ChangeRequests::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ChangeRequests {
        Table,
        Id,
        DocumentId,
        DocumentName,
        RequestType,
        ChangeType,
        Status,
        Requestor,
        Approvers,
        Department,
        Description,
        DocumentType,
        Language,
        ProposedVersion,
        Comments,
        AuditTrail,
        CreatedAt,
        UpdatedAt,
    }
}
