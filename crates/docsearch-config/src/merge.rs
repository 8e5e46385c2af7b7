//! Configuration merging.
//!
//! Merges multiple `RawConfig` files into a single resolved `Config`,
//! applying precedence rules and resolving paths.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{
    BackendSettings, Config, ConfigError, SearchSettings,
    parse::{RawBackendSettings, RawConfig, RawSearchSettings},
    resolve::resolve_path,
    versions::VersionAliases,
};

/// A parsed config file with its source path.
pub struct ParsedConfig {
    /// Path to the config file.
    pub path: PathBuf,
    /// Parsed raw configuration.
    pub config: RawConfig,
}

impl ParsedConfig {
    /// Directory holding the config file; relative paths resolve against it.
    fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Merges multiple configuration files into a single resolved `Config`.
///
/// Configs should be provided in precedence order: highest precedence first (closest to CWD),
/// lowest precedence last (global config).
///
/// Merge rules:
/// - Scalar settings: first defined value wins (highest precedence)
/// - Version aliases: merged per alias on top of the built-in table, first
///   definition wins
pub fn merge_configs(configs: &[ParsedConfig]) -> Result<Config, ConfigError> {
    if configs.is_empty() {
        return Ok(Config::default());
    }

    let search = merge_search_settings(configs);
    let backend = merge_backend_settings(configs)?;
    let versions = merge_versions(configs)?;
    let config_root = configs.first().map(|c| c.dir().to_path_buf());

    for parsed in configs {
        debug!(path = %parsed.path.display(), "merged config file");
    }

    Ok(Config {
        search,
        backend,
        versions,
        config_root,
    })
}

/// Merges search settings.
fn merge_search_settings(configs: &[ParsedConfig]) -> SearchSettings {
    let mut result = SearchSettings::default();

    // Iterate in reverse (lowest precedence first) so higher precedence overwrites
    for parsed in configs.iter().rev() {
        if let Some(ref search) = parsed.config.search {
            apply_raw_search(&mut result, search);
        }
    }

    result
}

/// Applies raw search settings to result, overwriting any present values.
fn apply_raw_search(result: &mut SearchSettings, raw: &RawSearchSettings) {
    if let Some(v) = raw.default_limit {
        result.default_limit = v;
    }
    if let Some(ref v) = raw.highlight_pre_tag {
        result.highlight_pre_tag.clone_from(v);
    }
    if let Some(ref v) = raw.highlight_post_tag {
        result.highlight_post_tag.clone_from(v);
    }
    if let Some(ref v) = raw.encoder {
        result.encoder.clone_from(v);
    }
    if let Some(v) = raw.min_term_length {
        result.min_term_length = v;
    }
}

/// Merges backend settings, resolving the corpus path against the file that
/// declares it.
fn merge_backend_settings(configs: &[ParsedConfig]) -> Result<BackendSettings, ConfigError> {
    let mut result = BackendSettings::default();

    for parsed in configs.iter().rev() {
        if let Some(ref backend) = parsed.config.backend {
            apply_raw_backend(&mut result, backend, parsed.dir())?;
        }
    }

    Ok(result)
}

/// Applies raw backend settings to result.
fn apply_raw_backend(
    result: &mut BackendSettings,
    raw: &RawBackendSettings,
    config_dir: &Path,
) -> Result<(), ConfigError> {
    if let Some(ref v) = raw.index_prefix {
        result.index_prefix.clone_from(v);
    }
    if let Some(ref v) = raw.corpus {
        result.corpus = Some(resolve_path(v, config_dir)?);
    }
    Ok(())
}

/// Merges version alias tables over the built-in defaults.
fn merge_versions(configs: &[ParsedConfig]) -> Result<VersionAliases, ConfigError> {
    let mut result = VersionAliases::default();

    for parsed in configs.iter().rev() {
        if let Some(ref versions) = parsed.config.versions {
            result.extend(VersionAliases::from_canonical(versions)?);
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_config_str;

    fn parsed(path: &str, toml: &str) -> ParsedConfig {
        ParsedConfig {
            path: PathBuf::from(path),
            config: parse_config_str(toml, Path::new(path)).unwrap(),
        }
    }

    #[test]
    fn test_merge_empty_configs() {
        let result = merge_configs(&[]).unwrap();
        assert_eq!(result.search.default_limit, 10);
        assert_eq!(result.backend.index_prefix, "cake-docs");
        assert!(result.backend.corpus.is_none());
        assert!(result.config_root.is_none());
    }

    #[test]
    fn test_merge_single_config() {
        let config = parsed(
            "/srv/project/.docsearch.toml",
            r#"
[search]
default_limit = 20
encoder = "html"

[backend]
corpus = "./corpus"
"#,
        );

        let result = merge_configs(&[config]).unwrap();
        assert_eq!(result.search.default_limit, 20);
        assert_eq!(result.search.encoder, "html");
        assert_eq!(result.search.highlight_pre_tag, "{{");
        assert_eq!(
            result.backend.corpus,
            Some(PathBuf::from("/srv/project/corpus"))
        );
        assert_eq!(result.config_root, Some(PathBuf::from("/srv/project")));
    }

    #[test]
    fn test_merge_scalar_override() {
        let high = parsed(
            "/srv/project/.docsearch.toml",
            "[search]\ndefault_limit = 20\n",
        );
        let low = parsed(
            "/srv/.docsearch.toml",
            "[search]\ndefault_limit = 5\nmin_term_length = 4\n",
        );

        let result = merge_configs(&[high, low]).unwrap();
        assert_eq!(result.search.default_limit, 20);
        assert_eq!(result.search.min_term_length, 4);
    }

    #[test]
    fn test_merge_corpus_relative_to_declaring_file() {
        let high = parsed("/srv/project/.docsearch.toml", "[search]\nencoder = \"html\"\n");
        let low = parsed("/srv/.docsearch.toml", "[backend]\ncorpus = \"data\"\n");

        let result = merge_configs(&[high, low]).unwrap();
        assert_eq!(result.backend.corpus, Some(PathBuf::from("/srv/data")));
        assert_eq!(result.config_root, Some(PathBuf::from("/srv/project")));
    }

    #[test]
    fn test_merge_versions() {
        let high = parsed("/a/b/.docsearch.toml", "[versions]\n\"21\" = \"2-2\"\n");
        let low = parsed(
            "/a/.docsearch.toml",
            "[versions]\n\"20\" = \"2-2\"\n\"50\" = [\"5\", \"5-0\"]\n",
        );

        let result = merge_configs(&[high, low]).unwrap();
        assert_eq!(result.versions.resolve("2-2"), "21");
        assert_eq!(result.versions.resolve("5-0"), "50");
        assert_eq!(result.versions.resolve("4-0"), "40");
    }
}
