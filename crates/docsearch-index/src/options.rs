//! Per-request search options and pagination.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Smallest page size.
pub const MIN_LIMIT: usize = 1;

/// Largest page size.
pub const MAX_LIMIT: usize = 100;

/// Deepest row the backend will page to.
pub const MAX_RESULT_WINDOW: usize = 10_000;

/// Character encoding applied to highlighted and plain output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoder {
    /// Text is returned as stored.
    #[default]
    Default,
    /// Text is HTML-entity encoded.
    Html,
}

impl Encoder {
    /// Parses a caller-supplied encoder name. Only `html` selects HTML.
    pub fn from_name(name: &str) -> Self {
        if name == "html" {
            Self::Html
        } else {
            Self::Default
        }
    }

    /// Whether this is the HTML encoder.
    pub const fn is_html(self) -> bool {
        matches!(self, Self::Html)
    }
}

impl fmt::Display for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Default => "default",
            Self::Html => "html",
        })
    }
}

/// Highlight markers and encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightOptions {
    /// Inserted before each highlighted match.
    pub pre_tag: String,
    /// Inserted after each highlighted match.
    pub post_tag: String,
    /// Output encoding.
    pub encoder: Encoder,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self {
            pre_tag: String::from("{{"),
            post_tag: String::from("}}"),
            encoder: Encoder::Default,
        }
    }
}

/// Options for a single search request, as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Requested page, 1-based. Clamped before use.
    pub page: i64,
    /// Requested page size. Clamped before use.
    pub limit: i64,
    /// Highlight markers and encoding.
    pub highlight: HighlightOptions,
}

impl SearchOptions {
    /// Returns the clamped pagination for these options.
    pub fn pagination(&self) -> Pagination {
        Pagination::clamp(self.page, self.limit)
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            highlight: HighlightOptions::default(),
        }
    }
}

/// Page window after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Page number, at least 1.
    pub page: usize,
    /// Page size within `[MIN_LIMIT, MAX_LIMIT]`.
    pub limit: usize,
    /// Rows to skip.
    pub offset: usize,
}

impl Pagination {
    /// Clamps a requested page and limit.
    ///
    /// The limit is forced into `[1, 100]`, then the page into
    /// `[1, 10000 / limit]` so the window never passes the backend's
    /// result-window ceiling.
    pub fn clamp(page: i64, limit: i64) -> Self {
        let limit = clamp_to(limit, MIN_LIMIT, MAX_LIMIT);
        let page = clamp_to(page, 1, MAX_RESULT_WINDOW / limit);
        Self {
            page,
            limit,
            offset: limit * (page - 1),
        }
    }
}

/// Clamps a signed request value into an unsigned range.
fn clamp_to(value: i64, min: usize, max: usize) -> usize {
    usize::try_from(value).map_or(min, |v| v.clamp(min, max))
}
