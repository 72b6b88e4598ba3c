//! Document code generation and version numbering

use crate::contract::{ChangeType, DocumentType, Language, RequestType, WorkflowError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;

/// `<ORG>-<DEPT3>-<TYPE>-<seq>[-<LANG>]`
#[allow(clippy::expect_used)]
static DOCUMENT_CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<org>[A-Z0-9]+)-(?P<dept>[A-Z0-9]{3})-(?P<kind>[A-Z]{2,4})-(?P<seq>\d{2,})(?:-(?P<lang>EN|AR))?$")
        .expect("valid document code regex")
});

/// Abbreviation used in document codes
pub fn type_abbreviation(document_type: DocumentType) -> String {
    match document_type {
        DocumentType::Sop => "SOP".to_string(),
        DocumentType::Policy => "POL".to_string(),
        DocumentType::WorkInstruction => "WI".to_string(),
        DocumentType::Form => "FORM".to_string(),
        other => other
            .label()
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .take(3)
            .collect::<String>()
            .to_ascii_uppercase(),
    }
}

/// First three alphanumerics of the department, uppercased
pub fn department_code(department: &str) -> Result<String, WorkflowError> {
    let code: String = department
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(3)
        .collect::<String>()
        .to_ascii_uppercase();

    if code.len() < 3 {
        return Err(WorkflowError::validation(
            "department",
            format!(
                "department '{}' needs at least three letters or digits for a document code",
                department
            ),
        ));
    }
    Ok(code)
}

/// Generate the next document code for a department, type and language.
///
/// The sequence is one past the highest sequence among `existing_codes` that
/// share the same prefix and language suffix. Unparseable codes are ignored.
pub fn generate_document_code<'a>(
    organization: &str,
    department: &str,
    document_type: DocumentType,
    language: Option<Language>,
    existing_codes: impl IntoIterator<Item = &'a str>,
) -> Result<String, WorkflowError> {
    let org = organization.trim().to_ascii_uppercase();
    if org.is_empty() {
        return Err(WorkflowError::validation(
            "organization_code",
            "organization code must not be empty",
        ));
    }
    let prefix = format!(
        "{}-{}-{}",
        org,
        department_code(department)?,
        type_abbreviation(document_type)
    );
    let lang = language.map(|l| l.code());

    let highest = existing_codes
        .into_iter()
        .filter_map(|code| DOCUMENT_CODE_RE.captures(code.trim()))
        .filter(|caps| {
            let same_prefix = format!("{}-{}-{}", &caps["org"], &caps["dept"], &caps["kind"]);
            same_prefix == prefix && caps.name("lang").map(|m| m.as_str()) == lang
        })
        .filter_map(|caps| caps["seq"].parse::<u32>().ok())
        .max()
        .unwrap_or(0);

    let mut code = format!("{}-{:02}", prefix, highest + 1);
    if let Some(lang) = lang {
        code.push('-');
        code.push_str(lang);
    }
    Ok(code)
}

pub fn validate_document_code(code: &str) -> Result<(), WorkflowError> {
    if DOCUMENT_CODE_RE.is_match(code) {
        Ok(())
    } else {
        Err(WorkflowError::validation(
            "document_code",
            format!(
                "'{}' does not match <ORG>-<DEPT>-<TYPE>-<seq>[-EN|-AR]",
                code
            ),
        ))
    }
}

/// `major.minor` document version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    pub const INITIAL: Version = Version { major: 1, minor: 0 };

    /// Parse `"2"`, `"2.3"` or `"v2.3"`
    pub fn parse(value: &str) -> Result<Version, WorkflowError> {
        let trimmed = value.trim().trim_start_matches(['v', 'V']);
        let invalid = || {
            WorkflowError::validation(
                "version_number",
                format!("'{}' is not a major.minor version", value),
            )
        };

        let (major, minor) = match trimmed.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (trimmed, "0"),
        };
        Ok(Version {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        })
    }

    pub fn bump(self, change: ChangeType) -> Version {
        match change {
            ChangeType::Major => Version {
                major: self.major + 1,
                minor: 0,
            },
            ChangeType::Minor => Version {
                major: self.major,
                minor: self.minor + 1,
            },
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor).cmp(&(other.major, other.minor))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Version a request produces, given the versions already on record.
///
/// New requests always start at `1.0`. Change requests bump the highest
/// existing version; unparseable entries are skipped.
pub fn next_version<'a>(
    request_type: RequestType,
    change_type: Option<ChangeType>,
    existing: impl IntoIterator<Item = &'a str>,
) -> Result<Version, WorkflowError> {
    match request_type {
        RequestType::NewRequest => Ok(Version::INITIAL),
        RequestType::ChangeRequest => {
            let change = change_type.ok_or_else(|| {
                WorkflowError::validation("change_type", "change requests need a change type")
            })?;
            let highest = existing
                .into_iter()
                .filter_map(|v| Version::parse(v).ok())
                .max()
                .unwrap_or(Version::INITIAL);
            Ok(highest.bump(change))
        }
    }
}
