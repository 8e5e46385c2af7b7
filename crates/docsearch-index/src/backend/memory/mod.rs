//! In-memory search backend.
//!
//! [`MemoryBackend`] keeps one RAM tantivy index per document set. A [`SearchRequest`] is
//! compiled into tantivy queries, so matching, BM25 term scoring, prefix and fuzzy
//! expansion and fragment selection all happen in tantivy. On top of that the backend
//! applies the request's score functions, sort, page collapsing and distinct counts.

mod analyzer;
mod compile;
mod fuzzy;
mod highlight;
mod query_string;
mod schema;

use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
    fs,
    path::Path,
};

use tantivy::{Index, IndexReader, IndexWriter, TantivyDocument, collector::TopDocs, schema::Value};
use tracing::debug;

use self::{
    analyzer::{DOCSEARCH_TOKENIZER, build_analyzer},
    compile::QueryCompiler,
    fuzzy::FuzzyBuilders,
    highlight::Highlighter,
    schema::SectionSchema,
};
use super::SearchBackend;
use crate::{
    document::Document,
    error::BackendError,
    request::{Aggregation, SearchRequest, SortClause, SortKey, SortOrder},
    response::{AggregationValue, BackendResponse, Hit, Hits},
};

/// Heap given to the writer while a document set is indexed.
const WRITER_HEAP_SIZE: usize = 50_000_000;

/// One loaded document set.
struct SectionIndex {
    /// Source documents, addressed by ordinal.
    documents: Vec<Document>,
    /// Reader over the committed index.
    reader: IndexReader,
}

impl SectionIndex {
    /// Indexes `documents` into a fresh RAM index.
    fn build(
        name: &str,
        schema: &SectionSchema,
        documents: Vec<Document>,
    ) -> Result<Self, BackendError> {
        let index = Index::create_in_ram(schema.schema().clone());
        index
            .tokenizers()
            .register(DOCSEARCH_TOKENIZER, build_analyzer());

        let mut writer: IndexWriter = index
            .writer_with_num_threads(1, WRITER_HEAP_SIZE)
            .map_err(|e| BackendError::index(name, &e))?;
        for (ordinal, doc) in (0_u64..).zip(&documents) {
            writer
                .add_document(schema.to_document(ordinal, doc))
                .map_err(|e| BackendError::index(name, &e))?;
        }
        writer.commit().map_err(|e| BackendError::index(name, &e))?;

        let reader = index.reader().map_err(|e| BackendError::index(name, &e))?;
        Ok(Self { documents, reader })
    }
}

/// A matched document with its final score.
struct Match<'d> {
    /// Position in the document set.
    ordinal: usize,
    /// Source document.
    doc: &'d Document,
    /// Score after score functions.
    score: f64,
}

/// Search backend over documents held in memory.
pub struct MemoryBackend {
    /// Loaded document sets by index name.
    indices: BTreeMap<String, SectionIndex>,
    /// Field handles shared by every index.
    schema: SectionSchema,
    /// Shared automaton builders for highlighting.
    fuzzy: FuzzyBuilders,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Creates a backend with no indices.
    pub fn new() -> Self {
        Self {
            indices: BTreeMap::new(),
            schema: SectionSchema::new(),
            fuzzy: FuzzyBuilders::new(),
        }
    }

    /// Indexes `documents` as the index `name`, replacing any previous one.
    pub fn insert_index(
        &mut self,
        name: impl Into<String>,
        documents: Vec<Document>,
    ) -> Result<(), BackendError> {
        let name = name.into();
        let index = SectionIndex::build(&name, &self.schema, documents)?;
        debug!(index = %name, documents = index.documents.len(), "loaded index");
        self.indices.insert(name, index);
        Ok(())
    }

    /// Loads every `*.json` file in `dir` as an index named after the file stem.
    ///
    /// Each file holds a JSON array of documents.
    pub fn from_dir(dir: &Path) -> Result<Self, BackendError> {
        let read_err = |source| BackendError::Read {
            path: dir.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(read_err)? {
            let path = entry.map_err(read_err)?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();

        let mut backend = Self::new();
        for path in files {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let text = fs::read_to_string(&path).map_err(|source| BackendError::Read {
                path: path.clone(),
                source,
            })?;
            let documents: Vec<Document> =
                serde_json::from_str(&text).map_err(|source| BackendError::Parse {
                    path: path.clone(),
                    source,
                })?;
            backend.insert_index(name, documents)?;
        }

        debug!(dir = %dir.display(), indices = backend.indices.len(), "loaded corpus");
        Ok(backend)
    }

    /// Names of the loaded indices, sorted.
    pub fn index_names(&self) -> impl Iterator<Item = &str> {
        self.indices.keys().map(String::as_str)
    }
}

impl SearchBackend for MemoryBackend {
    fn search(&self, request: &SearchRequest) -> Result<BackendResponse, BackendError> {
        let index = self
            .indices
            .get(&request.index)
            .ok_or_else(|| BackendError::IndexNotFound(request.index.clone()))?;
        let searcher = index.reader.searcher();
        let compiled = QueryCompiler::new(&self.schema).compile(&request.query)?;

        let limit = usize::try_from(searcher.num_docs())
            .unwrap_or(usize::MAX)
            .max(1);
        let top_docs = searcher
            .search(compiled.query.as_ref(), &TopDocs::with_limit(limit))
            .map_err(|e| BackendError::Failed(e.to_string()))?;

        let mut matches = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let stored: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| BackendError::Failed(e.to_string()))?;
            let Some(ordinal) = stored
                .get_first(self.schema.ordinal)
                .and_then(|v| v.as_u64())
                .and_then(|o| usize::try_from(o).ok())
            else {
                continue;
            };
            let Some(doc) = index.documents.get(ordinal) else {
                continue;
            };
            matches.push(Match {
                ordinal,
                doc,
                score: compiled.score(f64::from(score), doc),
            });
        }
        matches.sort_by(|a, b| {
            compare(&request.sort, a, b).then_with(|| a.ordinal.cmp(&b.ordinal))
        });

        let aggregations = request
            .aggs
            .iter()
            .map(|(name, agg)| {
                let Aggregation::Cardinality(cardinality) = agg;
                let distinct: BTreeSet<&str> = matches
                    .iter()
                    .filter_map(|m| keyword(m.doc, &cardinality.field))
                    .collect();
                (
                    name.clone(),
                    AggregationValue {
                        value: distinct.len() as u64,
                    },
                )
            })
            .collect();

        let mut highlighter = Highlighter::new(
            &searcher,
            &self.schema,
            &compiled.highlight_terms,
            &self.fuzzy,
            &request.highlight,
        )?;
        let mut seen = BTreeSet::new();
        let hits = matches
            .into_iter()
            .filter(|m| {
                keyword(m.doc, &request.collapse.field).is_none_or(|key| seen.insert(key))
            })
            .skip(request.from)
            .take(request.size)
            .map(|m| Hit {
                score: Some(m.score),
                source: m.doc.clone(),
                highlight: highlighter.highlight(m.doc),
            })
            .collect::<Vec<_>>();

        debug!(index = %request.index, hits = hits.len(), "memory search complete");
        Ok(BackendResponse {
            hits: Hits { hits },
            aggregations,
        })
    }
}

/// Orders two matches by the request's sort clauses.
fn compare(sort: &[SortClause], a: &Match<'_>, b: &Match<'_>) -> Ordering {
    for clause in sort {
        let ordering = match &clause.key {
            SortKey::Score => a.score.total_cmp(&b.score),
            SortKey::Field(name) => numeric(a.doc, name).cmp(&numeric(b.doc, name)),
        };
        let ordering = match clause.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        };
        if ordering.is_ne() {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Value of a numeric field, `None` for unknown fields.
fn numeric(doc: &Document, field: &str) -> Option<u32> {
    match field {
        "level" => Some(doc.level),
        "max_level" => Some(doc.max_level),
        "position" => Some(doc.position),
        "max_position" => Some(doc.max_position),
        _ => None,
    }
}

/// Value of a keyword field, `None` for unknown fields.
fn keyword<'d>(doc: &'d Document, field: &str) -> Option<&'d str> {
    match field {
        "page_url" => Some(&doc.page_url),
        "url" => Some(&doc.url),
        "type" => Some(if doc.is_external() { "external" } else { "internal" }),
        "priority" => Some(if doc.is_low_priority() { "low" } else { "normal" }),
        _ => None,
    }
}
