//! Tantivy Schema Definition
//!
//! One document per recipe:
//!
//! 1. `id` - Recipe id (STORED, raw keyword, upsert/delete key)
//! 2. `name` - Recipe name (analyzed, positions for phrase search)
//! 3. `how_to` - Instructions (analyzed, positions)
//! 4. `ingredient_name` - One value per ingredient (analyzed, positions)
//! 5. `ingredient_id` - One value per ingredient (raw keyword, exclusion filter)

use tantivy::schema::{
    Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING,
};

use crate::analyzer::RECIPE_ANALYZER;

// Field name constants
pub const FIELD_ID: &str = "id";
pub const FIELD_NAME: &str = "name";
pub const FIELD_HOW_TO: &str = "how_to";
pub const FIELD_INGREDIENT_NAME: &str = "ingredient_name";
pub const FIELD_INGREDIENT_ID: &str = "ingredient_id";

/// Field handles, resolved once when the schema is built
#[derive(Debug, Clone)]
pub struct SchemaFields {
    pub schema: Schema,
    pub id: Field,
    pub name: Field,
    pub how_to: Field,
    pub ingredient_name: Field,
    pub ingredient_id: Field,
}

impl SchemaFields {
    pub fn new() -> Self {
        let mut builder = Schema::builder();

        let id = builder.add_text_field(FIELD_ID, STRING | STORED);

        // Full-text fields share the language analyzer
        let text = TextOptions::default().set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(RECIPE_ANALYZER)
                .set_index_option(IndexRecordOption::WithFreqsAndPositions),
        );
        let name = builder.add_text_field(FIELD_NAME, text.clone());
        let how_to = builder.add_text_field(FIELD_HOW_TO, text.clone());
        let ingredient_name = builder.add_text_field(FIELD_INGREDIENT_NAME, text);

        let ingredient_id = builder.add_text_field(FIELD_INGREDIENT_ID, STRING);

        Self {
            schema: builder.build(),
            id,
            name,
            how_to,
            ingredient_name,
            ingredient_id,
        }
    }

    /// Fields a search term is matched against
    pub fn text_fields(&self) -> [Field; 3] {
        [self.name, self.how_to, self.ingredient_name]
    }
}

impl Default for SchemaFields {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the recipe schema
pub fn build_schema() -> Schema {
    SchemaFields::new().schema
}
