//! Version aliases.
//!
//! Requests may name a documentation version by a legacy spelling such as
//! `2-2`; indexes are named by the canonical version (`20`).

use std::collections::BTreeMap;

use crate::ConfigError;

/// Built-in aliases as `(alias, canonical)` pairs.
const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("authorization-11", "authorization-1"),
    ("authentication-11", "authentication-1"),
    ("1-1", "11"),
    ("1-2", "12"),
    ("1-3", "13"),
    ("2-10", "20"),
    ("2-2", "20"),
    ("3-0", "30"),
    ("4-0", "40"),
];

/// Mapping from request version names to canonical index versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionAliases {
    /// Alias -> canonical version.
    aliases: BTreeMap<String, String>,
}

impl VersionAliases {
    /// Creates an empty alias table.
    pub const fn empty() -> Self {
        Self {
            aliases: BTreeMap::new(),
        }
    }

    /// Builds a table from `canonical -> [aliases]` entries, as written in a
    /// config file.
    pub fn from_canonical(
        entries: &BTreeMap<String, Vec<String>>,
    ) -> Result<Self, ConfigError> {
        let mut table = Self::empty();
        for (canonical, aliases) in entries {
            for alias in aliases {
                if let Some(first) = table.aliases.get(alias)
                    && first != canonical
                {
                    return Err(ConfigError::ConflictingAlias {
                        alias: alias.clone(),
                        first: first.clone(),
                        second: canonical.clone(),
                    });
                }
                table.aliases.insert(alias.clone(), canonical.clone());
            }
        }
        Ok(table)
    }

    /// Adds every alias from `other`, replacing existing entries.
    pub fn extend(&mut self, other: Self) {
        self.aliases.extend(other.aliases);
    }

    /// Resolves a requested version. Unknown versions pass through.
    pub fn resolve<'a>(&'a self, version: &'a str) -> &'a str {
        self.aliases.get(version).map_or(version, String::as_str)
    }

    /// Returns the table grouped as `canonical -> [aliases]`.
    pub fn by_canonical(&self) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (alias, canonical) in &self.aliases {
            grouped
                .entry(canonical.clone())
                .or_default()
                .push(alias.clone());
        }
        grouped
    }

    /// Number of aliases.
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl Default for VersionAliases {
    fn default() -> Self {
        Self {
            aliases: DEFAULT_ALIASES
                .iter()
                .map(|(alias, canonical)| ((*alias).to_string(), (*canonical).to_string()))
                .collect(),
        }
    }
}
