//! Caller-supplied search parameters and their validation.

use docsearch_config::Config;
use docsearch_query::QueryString;
use serde::{Deserialize, Serialize};

use crate::{
    error::RejectReason,
    options::{Encoder, HighlightOptions, SearchOptions},
};

/// Search parameters as received from a caller. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchParams {
    /// Documentation language, e.g. `en`.
    pub lang: Option<String>,
    /// Documentation version, possibly a legacy alias.
    pub version: Option<String>,
    /// Query text.
    pub q: Option<String>,
    /// Requested page.
    pub page: Option<i64>,
    /// Requested page size.
    pub limit: Option<i64>,
    /// Marker before highlighted matches.
    pub highlight_pre_tag: Option<String>,
    /// Marker after highlighted matches.
    pub highlight_post_tag: Option<String>,
    /// Encoder name. Only `html` has an effect.
    pub encoder: Option<String>,
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSearch {
    /// Trimmed language.
    pub lang: String,
    /// Canonical version.
    pub version: String,
    /// Index holding the documents for `version` and `lang`.
    pub index: String,
    /// Compiled query.
    pub query: QueryString,
    /// Paging and highlighting, defaults applied.
    pub options: SearchOptions,
}

impl SearchParams {
    /// Validates the parameters and fills in defaults from `config`.
    ///
    /// Checks run in order: language, version, query.
    pub fn validate(&self, config: &Config) -> Result<ValidatedSearch, RejectReason> {
        let lang = self.lang.as_deref().unwrap_or_default().trim();
        if lang.is_empty() {
            return Err(RejectReason::MissingLanguage);
        }

        let version = config
            .versions
            .resolve(self.version.as_deref().unwrap_or_default());
        if version.is_empty() {
            return Err(RejectReason::MissingVersion);
        }

        let query = QueryString::new(self.q.as_deref().unwrap_or_default());
        let too_short = query
            .shortest_term_length()
            .is_some_and(|len| len < config.search.min_term_length);
        if !query.is_compilable() || query.term_count() == 0 || too_short {
            return Err(RejectReason::InvalidSyntax);
        }

        let settings = &config.search;
        let default_limit = i64::try_from(settings.default_limit).unwrap_or(i64::MAX);
        let options = SearchOptions {
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(default_limit),
            highlight: HighlightOptions {
                pre_tag: self
                    .highlight_pre_tag
                    .clone()
                    .unwrap_or_else(|| settings.highlight_pre_tag.clone()),
                post_tag: self
                    .highlight_post_tag
                    .clone()
                    .unwrap_or_else(|| settings.highlight_post_tag.clone()),
                encoder: Encoder::from_name(
                    self.encoder.as_deref().unwrap_or(settings.encoder.as_str()),
                ),
            },
        };

        Ok(ValidatedSearch {
            index: config.backend.index_name(version, lang),
            lang: lang.to_string(),
            version: version.to_string(),
            query,
            options,
        })
    }
}
