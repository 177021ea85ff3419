use std::path::PathBuf;

use gitconfig_validator::RepositoryConfig;
use thiserror::Error;

use crate::config::{load_from_path, LoadError, LoadedConfig};

/// The repository connections currently in effect, backed by a file.
#[derive(Debug)]
pub struct AppState {
    config_path: PathBuf,
    pub loaded: LoadedConfig,
}

#[derive(Debug, Error)]
pub enum AppStateError {
    #[error("Failed to load repository connections: {0}")]
    Load(#[from] LoadError),
}

impl AppState {
    pub fn initialize(config_path: impl Into<PathBuf>) -> Result<Self, AppStateError> {
        let path = config_path.into();
        let loaded = load_from_path(&path)?;
        Ok(Self {
            config_path: path,
            loaded,
        })
    }

    /// Re-reads the file. On failure the previous connections stay active.
    pub fn reload(&mut self) -> Result<(), AppStateError> {
        let loaded = load_from_path(&self.config_path)?;
        self.loaded = loaded;
        Ok(())
    }

    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    pub fn repository(&self, name: &str) -> Option<&RepositoryConfig> {
        self.loaded.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample_config() -> String {
        r#"name: scripts
owner: acme
repo: perf-scripts
access-token: t1
"#
        .to_string()
    }

    #[test]
    fn initialize_and_reload() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config_path = dir.path().join(".gitconfig.yml");
        fs::write(&config_path, sample_config()).expect("write config");

        let mut app = AppState::initialize(config_path.clone()).expect("initialize");
        assert_eq!(app.loaded.len(), 1);
        assert_eq!(app.repository("scripts").map(|r| r.branch()), Some(""));

        let updated = format!("{}branch: develop\n", sample_config());
        fs::write(&config_path, updated).expect("rewrite config");
        app.reload().expect("reload");
        assert_eq!(
            app.repository("scripts").map(|r| r.branch()),
            Some("develop")
        );
    }

    #[test]
    fn failed_reload_keeps_previous_connections() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config_path = dir.path().join(".gitconfig.yml");
        fs::write(&config_path, sample_config()).expect("write config");

        let mut app = AppState::initialize(config_path.clone()).expect("initialize");
        fs::write(&config_path, "name: scripts\ntoken: nope\n").expect("rewrite config");

        let err = app.reload().unwrap_err();
        assert!(err.to_string().contains("Field 'token' is not supported."));
        assert!(app.repository("scripts").is_some());
        assert_eq!(app.config_path(), &config_path);
    }
}
