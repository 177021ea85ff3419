pub mod schema;
pub mod validation;

use serde::Deserialize;
use serde_yaml::Error as YamlError;
use thiserror::Error;

pub use schema::{Document, GIT_CONFIG_FILE_NAME, RepositoryConfig};
pub use validation::{Location, ValidationError, is_valid_base_url, locate_field, validate};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Parse(#[from] YamlError),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("Repository document {index} is invalid: {source}")]
    InvalidDocument {
        index: usize,
        #[source]
        source: ValidationError,
    },
    #[error(
        "Repository name '{name}' is defined more than once.\nPlease check your .gitconfig.yml"
    )]
    DuplicateName { name: String, index: usize },
}

impl ConfigError {
    pub fn validation_error(&self) -> Option<&ValidationError> {
        match self {
            ConfigError::Invalid(err) | ConfigError::InvalidDocument { source: err, .. } => {
                Some(err)
            }
            _ => None,
        }
    }

    /// Points at the key responsible for the error within `source`.
    pub fn locate(&self, source: &str) -> Option<Location> {
        match self {
            ConfigError::Parse(err) => err.location().map(|loc| Location {
                line: loc.line(),
                column: loc.column(),
            }),
            ConfigError::Invalid(err) => locate_field(source, 0, err.field()?),
            ConfigError::InvalidDocument { index, source: err } => {
                locate_field(source, *index, err.field()?)
            }
            ConfigError::DuplicateName { index, .. } => locate_field(source, *index, schema::NAME),
        }
    }
}

/// Parses a single YAML document into its flat key/value form.
pub fn parse_document_str(src: &str) -> Result<Document, ConfigError> {
    if src.trim().is_empty() {
        return Ok(Document::new());
    }
    let document = serde_yaml::from_str::<Document>(src)?;
    Ok(document)
}

pub fn parse_config_str(src: &str) -> Result<RepositoryConfig, ConfigError> {
    let document = parse_document_str(src)?;
    Ok(validate(&document)?)
}

/// Parses every `---` separated document of a `.gitconfig.yml`.
///
/// Empty documents are skipped. The first invalid document aborts the whole
/// set, and repository names must be unique across documents.
pub fn parse_config_set_str(src: &str) -> Result<Vec<RepositoryConfig>, ConfigError> {
    let mut configs: Vec<RepositoryConfig> = Vec::new();
    if src.trim().is_empty() {
        return Ok(configs);
    }

    for (index, de) in serde_yaml::Deserializer::from_str(src).enumerate() {
        let document = Document::deserialize(de)?;
        if document.is_empty() {
            continue;
        }

        let config =
            validate(&document).map_err(|source| ConfigError::InvalidDocument { index, source })?;
        if configs.iter().any(|existing| existing.name() == config.name()) {
            return Err(ConfigError::DuplicateName {
                name: config.name().to_owned(),
                index,
            });
        }
        configs.push(config);
    }

    Ok(configs)
}
