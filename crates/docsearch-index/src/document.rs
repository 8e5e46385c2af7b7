//! Document types stored in the search backend.
//!
//! A [`Document`] is one section of a documentation page, or an external link.
//! Documents are only ever read here; ingestion happens elsewhere.

use serde::{Deserialize, Deserializer, Serialize};

/// Whether a document is a page section or a link to another site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// A section of a documentation page.
    #[default]
    Internal,
    /// A link to an external resource. Carries no indexed body text.
    External,
}

/// Ranking priority of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Ranked normally.
    #[default]
    Normal,
    /// Heavily deboosted.
    Low,
}

/// A searchable documentation section.
///
/// `level` counts nesting below the page root and `position` counts sections
/// in page order; both are bounded by the `max_*` values of the same page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Section or link kind.
    #[serde(rename = "type", default)]
    pub kind: DocumentKind,
    /// Ranking priority.
    #[serde(default)]
    pub priority: Priority,
    /// URL of the section (with fragment) or of the external resource.
    pub url: String,
    /// URL of the page the section belongs to.
    pub page_url: String,
    /// Nesting depth within the page, 0 for the page root.
    #[serde(default)]
    pub level: u32,
    /// Deepest nesting level on the page.
    #[serde(default)]
    pub max_level: u32,
    /// Position of the section within the page, 0 for the first.
    #[serde(default)]
    pub position: u32,
    /// Last position on the page.
    #[serde(default)]
    pub max_position: u32,
    /// Breadcrumb titles, root first.
    #[serde(default, deserialize_with = "null_as_default")]
    pub hierarchy: Vec<String>,
    /// Section title.
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Section body text.
    #[serde(default, deserialize_with = "null_as_default")]
    pub contents: String,
}

impl Document {
    /// Whether this document links to an external resource.
    pub fn is_external(&self) -> bool {
        self.kind == DocumentKind::External
    }

    /// Whether this document is deboosted.
    pub fn is_low_priority(&self) -> bool {
        self.priority == Priority::Low
    }
}

/// Reads an explicit `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
