use std::path::{Path, PathBuf};
use std::{fs, io};

use gitconfig_validator::{parse_config_set_str, ConfigError, RepositoryConfig};
use thiserror::Error;
use tracing::debug;

pub use gitconfig_validator::GIT_CONFIG_FILE_NAME;

/// Repository connections read from one `.gitconfig.yml`.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub path: Option<PathBuf>,
    repositories: Vec<RepositoryConfig>,
}

impl LoadedConfig {
    pub fn repositories(&self) -> &[RepositoryConfig] {
        &self.repositories
    }

    pub fn get(&self, name: &str) -> Option<&RepositoryConfig> {
        self.repositories.iter().find(|repo| repo.name() == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.repositories.iter().map(RepositoryConfig::name)
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error while reading .gitconfig.yml: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl LoadError {
    pub fn config_error(&self) -> Option<&ConfigError> {
        match self {
            LoadError::Config(err) => Some(err),
            LoadError::Io(_) => None,
        }
    }
}

pub fn resolve_config_path(dir: impl AsRef<Path>) -> PathBuf {
    dir.as_ref().join(GIT_CONFIG_FILE_NAME)
}

/// Loads `.gitconfig.yml` from `dir`, or `None` when the directory has none.
pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Option<LoadedConfig>, LoadError> {
    let path = resolve_config_path(dir);
    if !path.is_file() {
        debug!(path = %path.display(), "no repository connection file");
        return Ok(None);
    }
    load_from_path(path).map(Some)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<LoadedConfig, LoadError> {
    let path_ref = path.as_ref();
    let content = fs::read_to_string(path_ref)?;
    let mut loaded = load_from_str(&content)?;
    loaded.path = Some(path_ref.to_path_buf());
    debug!(
        path = %path_ref.display(),
        repositories = loaded.len(),
        "loaded repository connections"
    );
    Ok(loaded)
}

pub fn load_from_str(content: &str) -> Result<LoadedConfig, LoadError> {
    let repositories = parse_config_set_str(content)?;
    Ok(LoadedConfig {
        path: None,
        repositories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitconfig_validator::ValidationError;

    const TWO_REPOSITORIES: &str = r#"name: scripts
owner: acme
repo: perf-scripts
access-token: t1
---
name: enterprise
owner: acme
repo: perf-lib
access-token: t2
base-url: https://github.example.com
revision: "42"
"#;

    #[test]
    fn loads_every_document() {
        let loaded = load_from_str(TWO_REPOSITORIES).expect("should load");
        assert_eq!(loaded.len(), 2);
        let names: Vec<_> = loaded.names().collect();
        assert_eq!(names, vec!["scripts", "enterprise"]);

        let enterprise = loaded.get("enterprise").expect("enterprise");
        assert_eq!(enterprise.base_url(), "https://github.example.com");
        assert_eq!(enterprise.revision(), "42");
        assert!(loaded.get("missing").is_none());
    }

    #[test]
    fn invalid_document_fails_the_load() {
        let yaml = r#"name: scripts
owner: acme
repo: perf-scripts
"#;
        let err = load_from_str(yaml).unwrap_err();
        match err {
            LoadError::Config(ConfigError::InvalidDocument { index, source }) => {
                assert_eq!(index, 0);
                assert_eq!(source, ValidationError::MissingRequiredFields);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn load_from_dir_without_file_is_none() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(load_from_dir(dir.path()).expect("load").is_none());
    }

    #[test]
    fn load_from_dir_reads_conventional_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = resolve_config_path(dir.path());
        assert!(path.ends_with(".gitconfig.yml"));
        fs::write(&path, TWO_REPOSITORIES).expect("write config");

        let loaded = load_from_dir(dir.path())
            .expect("load")
            .expect("file present");
        assert_eq!(loaded.path.as_deref(), Some(path.as_path()));
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = load_from_path(dir.path().join("absent.yml")).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
        assert!(err.config_error().is_none());
    }
}
