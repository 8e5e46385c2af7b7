//! Turns backend hits into caller-facing results.
//!
//! The backend highlights multi-valued fields as a gapless list holding only the matched
//! values, so the position of a highlighted breadcrumb within the hierarchy is lost. It is
//! recovered here by comparing each highlighted entry, with its tags stripped, against the
//! plain values.

use crate::{
    html,
    options::HighlightOptions,
    response::{Highlights, Hit, SearchResult},
};

/// Maximum characters of contents carried into a result.
pub const CONTENTS_EXCERPT_CHARS: usize = 180;

/// Converts a backend hit into a result.
pub fn reconcile(hit: &Hit, options: &HighlightOptions) -> SearchResult {
    let doc = &hit.source;

    let contents = if doc.is_external() {
        doc.url.clone()
    } else {
        doc.contents.chars().take(CONTENTS_EXCERPT_CHARS).collect()
    };

    let highlights = Highlights {
        contents: hit.highlights("contents").to_vec(),
        hierarchy: reconcile_hierarchy(&doc.hierarchy, hit.highlights("hierarchy"), options),
    };

    // Highlights arrive encoded from the backend; plain fields are encoded here.
    let (hierarchy, contents) = if options.encoder.is_html() {
        (
            doc.hierarchy.iter().map(|entry| html::encode(entry)).collect(),
            html::encode(&contents),
        )
    } else {
        (doc.hierarchy.clone(), contents)
    };

    SearchResult {
        url: doc.url.clone(),
        page_url: doc.page_url.clone(),
        level: doc.level,
        position: doc.position,
        hierarchy,
        contents,
        highlights,
    }
}

/// Places highlighted entries at the positions of their plain values.
///
/// Returns an empty list when nothing was highlighted. Otherwise every highlighted entry
/// replaces the first not yet replaced plain value equal to its untagged text; entries
/// without such a value are dropped.
pub fn reconcile_hierarchy(
    hierarchy: &[String],
    highlighted: &[String],
    options: &HighlightOptions,
) -> Vec<String> {
    if highlighted.is_empty() {
        return Vec::new();
    }

    let mut out = hierarchy.to_vec();
    let mut replaced = vec![false; hierarchy.len()];

    for entry in highlighted {
        let plain = strip_tags(entry, options);
        let slot = hierarchy
            .iter()
            .zip(&replaced)
            .position(|(value, done)| !done && *value == plain);
        if let Some(index) = slot {
            out[index].clone_from(entry);
            replaced[index] = true;
        }
    }

    out
}

/// Recovers the stored text of a highlighted entry.
fn strip_tags(entry: &str, options: &HighlightOptions) -> String {
    let mut plain = entry.to_string();
    for tag in [&options.pre_tag, &options.post_tag] {
        if !tag.is_empty() {
            plain = plain.replace(tag.as_str(), "");
        }
    }
    if options.encoder.is_html() {
        plain = html::decode(&plain);
    }
    plain
}
