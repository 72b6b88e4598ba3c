//! Module assembly and lifecycle

use crate::api::native::NativeClient;
use crate::api::rest::{auth::JwtVerifier, routes};
use crate::config::Config;
use crate::contract::DocumentWorkflowApi;
use crate::domain::Service;
use crate::infra::files::LocalFileStore;
use crate::infra::notify::{LoggingAuditSink, LoggingNotifier};
use crate::infra::storage::{SeaOrmChangeRequestRepository, SeaOrmDocumentRepository};
use anyhow::Result;
use parking_lot::RwLock;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Document workflow module
pub struct DocumentWorkflowModule {
    config: RwLock<Config>,
    service: RwLock<Option<Arc<Service>>>,
}

impl Default for DocumentWorkflowModule {
    fn default() -> Self {
        Self {
            config: RwLock::new(Config::default()),
            service: RwLock::new(None),
        }
    }
}

impl DocumentWorkflowModule {
    /// Validate configuration and wire repositories and adapters into the service
    pub fn init(&self, config: Config, db: Arc<DatabaseConnection>) -> Result<()> {
        config.validate()?;

        let documents = Arc::new(SeaOrmDocumentRepository::new(db.clone()));
        let change_requests = Arc::new(SeaOrmChangeRequestRepository::new(db));
        let files = Arc::new(LocalFileStore::new(
            config.attachments_dir.clone(),
            config.files_base_url.clone(),
        ));

        let service = Arc::new(Service::new(
            documents,
            change_requests,
            Arc::new(LoggingNotifier),
            Arc::new(LoggingAuditSink),
            files,
            config.service_settings(),
        ));

        *self.service.write() = Some(service);
        tracing::info!(
            organization = %config.organization_code,
            revision_interval_months = config.revision_interval_months,
            "Document workflow initialized"
        );
        *self.config.write() = config;
        Ok(())
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self, db: &DatabaseConnection) -> Result<()> {
        use crate::infra::storage::migrations::Migrator;
        use sea_orm_migration::MigratorTrait;

        Migrator::up(db, None).await?;
        tracing::info!("Document workflow migrations completed");
        Ok(())
    }

    pub fn service(&self) -> Result<Arc<Service>> {
        self.service
            .read()
            .as_ref()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Service not initialized"))
    }

    /// In-process client for other modules
    pub fn client(&self) -> Result<Arc<dyn DocumentWorkflowApi>> {
        Ok(Arc::new(NativeClient::new(self.service()?)))
    }

    /// REST routes bound to the initialized service
    pub fn router(&self) -> Result<axum::Router> {
        let service = self.service()?;
        let verifier = Arc::new(JwtVerifier::new(&self.config.read().jwt));

        tracing::info!("Registering document workflow REST routes");
        Ok(routes::register_routes(axum::Router::new(), service, verifier))
    }

    /// Authenticated file serving for stored attachments, when they are local
    pub fn attachments_router(&self) -> Option<axum::Router> {
        let config = self.config.read();
        let verifier = Arc::new(JwtVerifier::new(&config.jwt));
        routes::attachments_router(&config, verifier)
    }
}
