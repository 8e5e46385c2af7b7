//! Schema of the in-memory section index.
//!
//! The full-text fields carry positions so phrase clauses work. Hierarchy values are added
//! one by one and form a multi-valued field. `ordinal` points back into the stored
//! document list.

use tantivy::{
    TantivyDocument,
    schema::{
        Field as TantivyField, IndexRecordOption, STORED, Schema, TextFieldIndexing, TextOptions,
    },
};

use super::analyzer::DOCSEARCH_TOKENIZER;
use crate::{document::Document, request::Field};

/// Handles to the fields of a section index.
#[derive(Debug, Clone)]
pub struct SectionSchema {
    /// The underlying tantivy schema.
    schema: Schema,
    /// Section title.
    pub title: TantivyField,
    /// Breadcrumb titles, one value each.
    pub hierarchy: TantivyField,
    /// Section body.
    pub contents: TantivyField,
    /// Position of the source document in its index.
    pub ordinal: TantivyField,
}

impl SectionSchema {
    /// Creates the schema.
    pub fn new() -> Self {
        let mut builder = Schema::builder();
        let text = || {
            TextOptions::default()
                .set_indexing_options(
                    TextFieldIndexing::default()
                        .set_tokenizer(DOCSEARCH_TOKENIZER)
                        .set_index_option(IndexRecordOption::WithFreqsAndPositions),
                )
                .set_stored()
        };

        let title = builder.add_text_field(Field::Title.name(), text());
        let hierarchy = builder.add_text_field(Field::Hierarchy.name(), text());
        let contents = builder.add_text_field(Field::Contents.name(), text());
        let ordinal = builder.add_u64_field("ordinal", STORED);

        Self {
            schema: builder.build(),
            title,
            hierarchy,
            contents,
            ordinal,
        }
    }

    /// The tantivy schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Handle of a full-text field.
    pub const fn field(&self, field: Field) -> TantivyField {
        match field {
            Field::Title => self.title,
            Field::Hierarchy => self.hierarchy,
            Field::Contents => self.contents,
        }
    }

    /// Builds the tantivy document for the `ordinal`-th section.
    pub fn to_document(&self, ordinal: u64, doc: &Document) -> TantivyDocument {
        let mut out = TantivyDocument::new();
        out.add_text(self.title, &doc.title);
        for value in &doc.hierarchy {
            out.add_text(self.hierarchy, value);
        }
        out.add_text(self.contents, &doc.contents);
        out.add_u64(self.ordinal, ordinal);
        out
    }
}

impl Default for SectionSchema {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use tantivy::schema::FieldType;

    use super::*;

    #[test]
    fn text_fields_are_positional() {
        let schema = SectionSchema::new();
        for field in [Field::Title, Field::Hierarchy, Field::Contents] {
            let entry = schema.schema().get_field_entry(schema.field(field));
            assert_eq!(entry.name(), field.name());
            let FieldType::Str(options) = entry.field_type() else {
                panic!("{field} is not a text field");
            };
            let indexing = options.get_indexing_options().unwrap();
            assert_eq!(indexing.tokenizer(), DOCSEARCH_TOKENIZER);
            assert!(indexing.index_option().has_positions());
            assert!(entry.is_stored(), "{field} should be stored");
        }
    }
}
