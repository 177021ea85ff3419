use std::fs;
use std::path::PathBuf;

use clap::Parser;
use gitconfig_validator::{ConfigError, GIT_CONFIG_FILE_NAME};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Validate .gitconfig.yml repository connections", long_about = None)]
struct Cli {
    /// Path to the repository connection file
    #[arg(default_value = GIT_CONFIG_FILE_NAME)]
    path: PathBuf,
    /// List every validated repository and log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let content = match fs::read_to_string(&cli.path) {
        Ok(c) => c,
        Err(err) => {
            eprintln!("Failed to read {}: {err}", cli.path.display());
            std::process::exit(1);
        }
    };
    debug!(path = %cli.path.display(), bytes = content.len(), "read repository connections");

    match gitconfig_validator::parse_config_set_str(&content) {
        Ok(configs) => {
            println!(
                "Validation OK: {} ({} repositories)",
                cli.path.display(),
                configs.len()
            );
            if cli.verbose {
                for config in &configs {
                    let host = if config.has_base_url() {
                        config.base_url()
                    } else {
                        "default host"
                    };
                    println!(
                        "- {}: {}/{} on {} (branch: {:?}, revision: {}, script root: {:?})",
                        config.name(),
                        config.owner(),
                        config.repo(),
                        host,
                        config.branch(),
                        config.revision(),
                        config.script_root()
                    );
                }
            }
        }
        Err(err) => {
            eprintln!("Validation failed: {err}");
            if let Some(loc) = err.locate(&content) {
                eprintln!("  at line {}, column {}", loc.line, loc.column);
            }
            let code = match err {
                ConfigError::Parse(_) => 1,
                _ => 2,
            };
            std::process::exit(code);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
