//! Configuration system for docsearch.
//!
//! docsearch uses TOML configuration files named `.docsearch.toml`. Configuration is resolved
//! by walking up the directory tree from the current working directory, collecting any
//! `.docsearch.toml` files found, then loading `~/.docsearch.toml` as the global config with
//! lowest precedence.

#![warn(missing_docs)]

mod discovery;
mod error;
mod merge;
mod parse;
mod resolve;
mod templates;
#[cfg(test)]
mod test_support;
mod versions;

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

pub use discovery::{CONFIG_FILENAME, discover_config_files, global_config_path, is_global_config};
pub use error::ConfigError;
pub use merge::{ParsedConfig, merge_configs};
pub use parse::{
    RawBackendSettings, RawConfig, RawSearchSettings, parse_config_file, parse_config_str,
};
pub use resolve::resolve_path;
use serde::{Deserialize, Serialize};
pub use templates::TemplateScope;
pub use versions::VersionAliases;

/// Top-level merged configuration for docsearch.
///
/// This represents the fully resolved configuration after merging all discovered
/// `.docsearch.toml` files according to precedence rules.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Request defaults and validation policy.
    pub search: SearchSettings,
    /// Search backend settings.
    pub backend: BackendSettings,
    /// Version aliases, built-ins included.
    pub versions: VersionAliases,
    /// Directory containing the most specific config file.
    pub config_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration by discovering and merging all relevant `.docsearch.toml` files.
    ///
    /// This is the main entry point for loading configuration. It:
    /// 1. Discovers all `.docsearch.toml` files from `cwd` up to the filesystem root
    /// 2. Appends `~/.docsearch.toml` if it exists
    /// 3. Parses each file
    /// 4. Merges them according to precedence rules (closest to `cwd` wins)
    ///
    /// Returns `Ok(Config::default())` if no configuration files are found.
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        let config_files = discover_config_files(cwd);
        Self::load_from_files(&config_files)
    }

    /// Loads configuration from a specific list of config file paths.
    ///
    /// Files should be provided in precedence order: highest precedence first.
    ///
    /// Returns `Ok(Config::default())` if the list is empty.
    pub fn load_from_files(files: &[PathBuf]) -> Result<Self, ConfigError> {
        let parsed: Vec<ParsedConfig> = files
            .iter()
            .map(|path| {
                let config = parse_config_file(path)?;
                Ok(ParsedConfig {
                    path: path.clone(),
                    config,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        merge_configs(&parsed)
    }

    /// Serializes the effective settings to TOML format.
    ///
    /// The output has the same layout as a `.docsearch.toml` file, with the
    /// corpus path already resolved.
    pub fn settings_to_toml(&self) -> Result<String, ConfigError> {
        let serializable = SerializableSettings {
            search: &self.search,
            backend: &self.backend,
            versions: self.versions.by_canonical(),
        };
        Ok(toml::to_string_pretty(&serializable)?)
    }
}

/// Request defaults and validation policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Results per page when the request gives no limit.
    pub default_limit: usize,
    /// Marker inserted before highlighted text.
    pub highlight_pre_tag: String,
    /// Marker inserted after highlighted text.
    pub highlight_post_tag: String,
    /// Highlight encoder name: `html` or anything else for plain output.
    pub encoder: String,
    /// Queries with a shorter term are rejected.
    pub min_term_length: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: 10,
            highlight_pre_tag: String::from("{{"),
            highlight_post_tag: String::from("}}"),
            encoder: String::from("default"),
            min_term_length: 3,
        }
    }
}

/// Search backend settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Prefix of every index name.
    pub index_prefix: String,
    /// Directory holding `<index>.json` document sets for the in-memory backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corpus: Option<PathBuf>,
}

impl BackendSettings {
    /// Returns the index holding documents for `version` in `lang`.
    pub fn index_name(&self, version: &str, lang: &str) -> String {
        format!("{}-{version}-{lang}", self.index_prefix)
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            index_prefix: String::from("cake-docs"),
            corpus: None,
        }
    }
}

/// Borrowed view of the settings for TOML output.
#[derive(Serialize)]
struct SerializableSettings<'a> {
    /// Search settings.
    search: &'a SearchSettings,
    /// Backend settings.
    backend: &'a BackendSettings,
    /// Aliases grouped by canonical version.
    versions: BTreeMap<String, Vec<String>>,
}
