pub mod app;
pub mod config;
pub mod watch;

pub use app::{AppState, AppStateError};
pub use config::{
    load_from_dir, load_from_path, load_from_str, resolve_config_path, LoadError, LoadedConfig,
    GIT_CONFIG_FILE_NAME,
};
pub use gitconfig_validator::{ConfigError, RepositoryConfig, ValidationError};
pub use watch::{watch_config, ReloadEvent, WatchHandle};
