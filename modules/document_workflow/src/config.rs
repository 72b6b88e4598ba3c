//! Configuration for the document workflow module

use crate::contract::Person;
use crate::domain::ServiceSettings;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Document workflow configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Leading segment of generated document codes
    #[serde(default = "default_organization_code")]
    pub organization_code: String,

    /// Minimum months between a document's revisions
    #[serde(default = "default_revision_interval_months")]
    pub revision_interval_months: u32,

    /// Change-request approvers per department
    #[serde(default)]
    pub department_approvers: HashMap<String, Vec<ApproverConfig>>,

    /// Directory attachments are written to
    #[serde(default = "default_attachments_dir")]
    pub attachments_dir: PathBuf,

    /// URL prefix returned for stored attachments
    #[serde(default = "default_files_base_url")]
    pub files_base_url: String,

    #[serde(default)]
    pub jwt: JwtConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ApproverConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Bearer token verification (HS256)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JwtConfig {
    /// Shared HMAC secret
    #[serde(default)]
    pub secret: String,

    /// Clock skew tolerated on `exp`
    #[serde(default = "default_leeway_seconds")]
    pub leeway_seconds: u64,

    /// Expected `iss` claim, when set
    #[serde(default)]
    pub issuer: Option<String>,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            leeway_seconds: default_leeway_seconds(),
            issuer: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            organization_code: default_organization_code(),
            revision_interval_months: default_revision_interval_months(),
            department_approvers: HashMap::new(),
            attachments_dir: default_attachments_dir(),
            files_base_url: default_files_base_url(),
            jwt: JwtConfig::default(),
        }
    }
}

impl Config {
    /// Reject values the service cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.organization_code.trim().is_empty() {
            anyhow::bail!("organization_code must not be empty");
        }
        if self.revision_interval_months == 0 {
            anyhow::bail!("revision_interval_months must be at least 1");
        }
        if self.jwt.secret.is_empty() {
            anyhow::bail!("jwt.secret must be set");
        }
        Ok(())
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            organization_code: self.organization_code.trim().to_ascii_uppercase(),
            revision_interval_months: self.revision_interval_months,
            department_approvers: self
                .department_approvers
                .iter()
                .map(|(department, people)| {
                    let people = people
                        .iter()
                        .map(|p| Person::new(p.id.clone(), p.name.clone(), p.email.clone()))
                        .collect();
                    (department.clone(), people)
                })
                .collect(),
        }
    }
}

fn default_organization_code() -> String {
    "SDG".to_string()
}

fn default_revision_interval_months() -> u32 {
    3
}

fn default_attachments_dir() -> PathBuf {
    PathBuf::from("data/attachments")
}

fn default_files_base_url() -> String {
    "/files".to_string()
}

fn default_leeway_seconds() -> u64 {
    30
}
