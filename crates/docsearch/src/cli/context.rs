//! Shared context for running CLI commands.

use std::{
    env,
    path::{Path, PathBuf},
    process::ExitCode,
};

use docsearch_config::Config;
use docsearch_index::{MemoryBackend, ValidatedSearch};

use super::args::RequestArgs;

/// Command execution context built once per CLI invocation.
pub struct CommandContext {
    /// Current working directory.
    pub cwd: PathBuf,
    /// Loaded configuration (may be default if no config files found).
    pub config: Config,
}

impl CommandContext {
    /// Loads the current directory and configuration.
    pub fn load() -> Result<Self, ExitCode> {
        let cwd = current_dir_or_failure()?;
        let config = load_config_or_failure(&cwd)?;
        Ok(Self { cwd, config })
    }

    /// Loads only the current directory, skipping configuration parsing.
    ///
    /// Used for `init`, which should work even when an existing config file is invalid.
    pub fn load_cwd_only() -> Result<Self, ExitCode> {
        let cwd = current_dir_or_failure()?;
        Ok(Self {
            cwd,
            config: Config::default(),
        })
    }

    /// Validates request flags against the configuration.
    ///
    /// Rejections print the machine-readable reason alongside the message.
    pub fn validate(&self, args: &RequestArgs) -> Result<ValidatedSearch, ExitCode> {
        args.to_params().validate(&self.config).map_err(|reason| {
            eprintln!("error: {reason} ({})", reason.code());
            ExitCode::FAILURE
        })
    }

    /// Loads the document corpus, preferring `override_dir` over `backend.corpus`.
    pub fn backend(&self, override_dir: Option<&Path>) -> Result<MemoryBackend, ExitCode> {
        let dir = match override_dir {
            Some(dir) => self.cwd.join(dir),
            None => match &self.config.backend.corpus {
                Some(dir) => dir.clone(),
                None => {
                    eprintln!("error: no corpus configured");
                    eprintln!("Set backend.corpus in .docsearch.toml or pass --corpus.");
                    return Err(ExitCode::FAILURE);
                }
            },
        };

        MemoryBackend::from_dir(&dir).map_err(|e| {
            eprintln!("error: failed to load corpus: {e}");
            ExitCode::FAILURE
        })
    }
}

/// Returns the current working directory or exits with a consistent error.
fn current_dir_or_failure() -> Result<PathBuf, ExitCode> {
    env::current_dir().map_err(|e| {
        eprintln!("error: could not determine current directory: {e}");
        ExitCode::FAILURE
    })
}

/// Loads configuration from the provided directory or exits with an error.
fn load_config_or_failure(cwd: &Path) -> Result<Config, ExitCode> {
    Config::load(cwd).map_err(|e| {
        eprintln!("error: failed to load configuration: {e}");
        ExitCode::FAILURE
    })
}
