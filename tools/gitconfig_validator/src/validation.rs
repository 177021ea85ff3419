use thiserror::Error;
use url::Url;

use crate::schema::{
    ACCESS_TOKEN, BASE_URL, BRANCH, DEFAULT_REVISION, Document, NAME, OWNER, REPO, REVISION,
    RepositoryConfig, SCRIPT_ROOT, is_supported_field,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

/// Why a document could not become a [`RepositoryConfig`].
///
/// Checks run in a fixed order and stop at the first failure: unsupported
/// keys, then the base URL, then the required fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' is not supported.\nPlease check your .gitconfig.yml")]
    UnsupportedField { field: String },
    #[error("Field 'base-url' is invalid.\nPlease check your .gitconfig.yml")]
    InvalidBaseUrl { url: String },
    // Always lists the whole required set, not the subset that is absent.
    #[error(
        "Some of required fields(name, owner, repo, access-token) are missing.\nPlease check your .gitconfig.yml"
    )]
    MissingRequiredFields,
}

impl ValidationError {
    /// The document key this error points at, if it concerns a single key.
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::UnsupportedField { field } => Some(field.as_str()),
            ValidationError::InvalidBaseUrl { .. } => Some(BASE_URL),
            ValidationError::MissingRequiredFields => None,
        }
    }
}

pub fn validate(document: &Document) -> Result<RepositoryConfig, ValidationError> {
    if let Some(field) = document.keys().find(|key| !is_supported_field(key)) {
        return Err(ValidationError::UnsupportedField {
            field: field.to_owned(),
        });
    }

    let base_url = optional(document, BASE_URL, "");
    if !base_url.is_empty() && !is_valid_base_url(&base_url) {
        return Err(ValidationError::InvalidBaseUrl { url: base_url });
    }

    Ok(RepositoryConfig {
        name: required(document, NAME)?,
        owner: required(document, OWNER)?,
        repo: required(document, REPO)?,
        access_token: required(document, ACCESS_TOKEN)?,
        branch: optional(document, BRANCH, ""),
        base_url,
        revision: optional(document, REVISION, DEFAULT_REVISION),
        script_root: optional(document, SCRIPT_ROOT, ""),
    })
}

const BASE_URL_SCHEMES: [&str; 3] = ["http", "https", "ftp"];

/// Absolute `http`, `https` or `ftp` URL with a non-empty host, without
/// surrounding whitespace.
pub fn is_valid_base_url(value: &str) -> bool {
    if value.trim() != value {
        return false;
    }
    match Url::parse(value) {
        Ok(url) => {
            BASE_URL_SCHEMES.contains(&url.scheme())
                && url.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}

fn required(document: &Document, field: &str) -> Result<String, ValidationError> {
    document
        .get(field)
        .map(str::to_owned)
        .ok_or(ValidationError::MissingRequiredFields)
}

fn optional(document: &Document, field: &str, default: &str) -> String {
    document.get(field).unwrap_or(default).to_owned()
}

/// Finds where `field` is declared inside the `document`-th YAML document of
/// `source` (0-based, `---` separated). Line and column are 1-based.
pub fn locate_field(source: &str, document: usize, field: &str) -> Option<Location> {
    let mut current = 0;
    let mut started = false;

    for (idx, line) in source.lines().enumerate() {
        if is_document_separator(line) {
            if started {
                current += 1;
            }
            started = true;
            continue;
        }

        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        started = true;

        if current == document && declares_key(trimmed, field) {
            let column = line.len() - trimmed.len() + 1;
            return Some(Location {
                line: idx + 1,
                column,
            });
        }
    }
    None
}

fn is_document_separator(line: &str) -> bool {
    line == "---" || line.starts_with("--- ")
}

fn declares_key(line: &str, field: &str) -> bool {
    let rest = ["\"", "'"]
        .into_iter()
        .find_map(|quote| {
            line.strip_prefix(quote)
                .and_then(|inner| inner.strip_prefix(field))
                .and_then(|inner| inner.strip_prefix(quote))
        })
        .or_else(|| line.strip_prefix(field));

    rest.is_some_and(|rest| rest.trim_start().starts_with(':'))
}
