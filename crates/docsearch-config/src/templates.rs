//! Starter files for `docsearch init`.
//!
//! Each starter lives in `templates/` as a parseable TOML file, so the tests below can
//! hold it to the config parser. It is written out with every setting disabled: a fresh
//! `.docsearch.toml` documents the knobs without changing any of them.

use std::path::{Path, PathBuf};

use crate::discovery::{CONFIG_FILENAME, global_config_path};

/// Project starter with every setting enabled.
const PROJECT_STARTER: &str = include_str!("../templates/config.toml");

/// Home-directory starter with every setting enabled.
const HOME_STARTER: &str = include_str!("../templates/config-global.toml");

/// Where `docsearch init` writes its starter file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateScope {
    /// `.docsearch.toml` in the working directory.
    Project,
    /// `~/.docsearch.toml`, read below every project file.
    Home,
}

impl TemplateScope {
    /// Scope for a run in `cwd`. Running in the home directory always targets the home
    /// file.
    pub fn for_dir(cwd: &Path, home_requested: bool) -> Self {
        let in_home = global_config_path()
            .as_deref()
            .and_then(Path::parent)
            .is_some_and(|home| home == cwd);
        if home_requested || in_home {
            Self::Home
        } else {
            Self::Project
        }
    }

    /// File the starter goes to, `None` when the home directory is unknown.
    pub fn target(self, cwd: &Path) -> Option<PathBuf> {
        match self {
            Self::Project => Some(cwd.join(CONFIG_FILENAME)),
            Self::Home => global_config_path(),
        }
    }

    /// Starter text, with every setting commented out.
    pub fn starter(self) -> String {
        disable_settings(self.source())
    }

    /// Starter source with every setting enabled.
    const fn source(self) -> &'static str {
        match self {
            Self::Project => PROJECT_STARTER,
            Self::Home => HOME_STARTER,
        }
    }
}

/// Turns every setting line of `toml` into a comment. Comments and blank lines pass
/// through unchanged.
fn disable_settings(toml: &str) -> String {
    toml.lines()
        .map(|line| {
            if line.is_empty() || line.starts_with('#') {
                format!("{line}\n")
            } else {
                format!("# {line}\n")
            }
        })
        .collect()
}
