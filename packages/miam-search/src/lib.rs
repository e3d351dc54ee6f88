//! miam-search: full-text recipe index
//!
//! A denormalized copy of every recipe (name, instructions, ingredient names
//! and ids) kept in Tantivy. The index shares no transaction with the
//! relational store; callers write to it after their SQLite commit and treat
//! it as best-effort.
//!
//! # Usage
//!
//! ```rust,ignore
//! use miam_search::{IndexOptions, RecipeIndex, TantivyRecipeIndex};
//! use miam_storage::RecipeSearch;
//!
//! let index = TantivyRecipeIndex::open(&IndexOptions::in_dir("data/index"))?;
//! index.index_recipe(&recipe)?;
//!
//! let search = RecipeSearch::term("riz").excluding_ingredient("4");
//! let hits = index.search(&search, 10)?;
//! println!("{} matches, first ids {:?}", hits.total, hits.ids);
//! ```

pub mod analyzer;
pub mod error;
pub mod query;
pub mod schema;
pub mod tantivy_index;

pub use analyzer::{build_recipe_analyzer, AnalyzerLanguage, RECIPE_ANALYZER};
pub use error::{IndexError, Result};
pub use schema::{build_schema, SchemaFields};
pub use tantivy_index::{IndexOptions, TantivyRecipeIndex, DEFAULT_WRITER_HEAP_BYTES};

use miam_storage::{Recipe, RecipeSearch};

/// Search index port
///
/// Writes replace whole documents keyed by recipe id and are visible to the
/// next `search` once they return.
pub trait RecipeIndex: Send + Sync {
    /// Insert or replace the document of `recipe`
    fn index_recipe(&self, recipe: &Recipe) -> Result<()>;

    fn delete_recipe(&self, recipe_id: &str) -> Result<()>;

    /// Ids of the best `limit` matches plus the count of all matches
    fn search(&self, search: &RecipeSearch, limit: usize) -> Result<SearchHits>;

    /// Upsert a batch with a single commit
    fn index_recipes(&self, recipes: &[Recipe]) -> Result<IndexingResult>;

    /// Remove every document
    fn clear(&self) -> Result<()>;

    fn document_count(&self) -> Result<u64>;

    /// Release the writer; later calls fail with `IndexError::Closed`
    fn close(&self) -> Result<()>;
}

/// Ranked ids of one search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHits {
    pub ids: Vec<String>,
    pub total: usize,
}

/// Indexing result (batch operation)
#[derive(Debug, Clone)]
pub struct IndexingResult {
    pub total_recipes: usize,
    pub success_count: usize,
    pub failed_recipes: Vec<(String, String)>, // (recipe name, error)
    pub duration_seconds: f64,
}
