//! Tantivy Recipe Index
//!
//! # Architecture
//!
//! ```text
//! Recipe → build_document → IndexWriter (Mutex) → commit → IndexReader::reload
//!                                                              ↓
//! RecipeSearch → build_search_query → Searcher → (TopDocs, Count) → ids + total
//! ```
//!
//! Every write commits immediately and reloads the reader, so a search issued
//! after a successful write observes it. Searches never take the writer lock.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use rayon::prelude::*;
use tantivy::collector::{Count, TopDocs};
use tantivy::directory::MmapDirectory;
use tantivy::schema::Value;
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::{debug, info, warn};

use miam_storage::{Recipe, RecipeSearch};

use crate::analyzer::{register_recipe_analyzer, AnalyzerLanguage};
use crate::error::{IndexError, Result};
use crate::query::build_search_query;
use crate::schema::SchemaFields;
use crate::{IndexingResult, RecipeIndex, SearchHits};

/// Default writer heap (50MB)
pub const DEFAULT_WRITER_HEAP_BYTES: usize = 50_000_000;

/// Where and how to open the index
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// `None` keeps the index in RAM
    pub index_dir: Option<PathBuf>,
    pub language: AnalyzerLanguage,
    pub writer_heap_bytes: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            index_dir: None,
            language: AnalyzerLanguage::default(),
            writer_heap_bytes: DEFAULT_WRITER_HEAP_BYTES,
        }
    }
}

impl IndexOptions {
    pub fn in_dir(index_dir: impl Into<PathBuf>) -> Self {
        Self {
            index_dir: Some(index_dir.into()),
            ..Self::default()
        }
    }
}

pub struct TantivyRecipeIndex {
    index: Index,
    reader: IndexReader,
    writer: Mutex<Option<IndexWriter>>,
    closed: AtomicBool,
    fields: SchemaFields,
}

impl TantivyRecipeIndex {
    /// Open the index described by `options`, creating it when missing.
    pub fn open(options: &IndexOptions) -> Result<Self> {
        let fields = SchemaFields::new();

        let index = match &options.index_dir {
            Some(dir) => open_in_dir(dir, &fields)?,
            None => Index::create_in_ram(fields.schema.clone()),
        };
        register_recipe_analyzer(&index, options.language);

        let writer: IndexWriter = index.writer(options.writer_heap_bytes)?;
        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        info!(
            index_dir = ?options.index_dir,
            language = %options.language,
            "opened recipe index"
        );

        Ok(Self {
            index,
            reader,
            writer: Mutex::new(Some(writer)),
            closed: AtomicBool::new(false),
            fields,
        })
    }

    /// In-RAM index with default options
    pub fn in_memory() -> Result<Self> {
        Self::open(&IndexOptions::default())
    }

    pub fn fields(&self) -> &SchemaFields {
        &self.fields
    }

    /// Run `f` on the writer, then commit and reload the reader.
    ///
    /// Uncommitted operations are rolled back when `f` fails so they never
    /// ride along with a later commit.
    fn write<T>(&self, operation: &str, f: impl FnOnce(&mut IndexWriter) -> Result<T>) -> Result<T> {
        let mut guard = self.writer.lock()?;
        let writer = guard.as_mut().ok_or(IndexError::Closed)?;

        let value = match f(writer) {
            Ok(value) => value,
            Err(err) => {
                if let Err(rollback_err) = writer.rollback() {
                    warn!(operation, error = %rollback_err, "failed to roll back index writer");
                }
                return Err(err);
            }
        };

        writer.commit()?;
        self.reader.reload()?;
        Ok(value)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(IndexError::Closed);
        }
        Ok(())
    }

    /// Denormalized document for one recipe
    fn build_document(&self, recipe: &Recipe) -> Result<TantivyDocument> {
        if recipe.id.is_empty() {
            return Err(IndexError::InvalidInput(format!(
                "recipe '{}' has no id",
                recipe.name()
            )));
        }

        let mut doc = doc!(
            self.fields.id => recipe.id.clone(),
            self.fields.name => recipe.name().to_string(),
            self.fields.how_to => recipe.how_to().to_string(),
        );
        for ingredient in recipe.ingredients() {
            doc.add_text(self.fields.ingredient_name, &ingredient.name);
            if !ingredient.id.is_empty() {
                doc.add_text(self.fields.ingredient_id, &ingredient.id);
            }
        }
        Ok(doc)
    }

    fn id_term(&self, recipe_id: &str) -> Term {
        Term::from_field_text(self.fields.id, recipe_id)
    }
}

fn open_in_dir(dir: &Path, fields: &SchemaFields) -> Result<Index> {
    std::fs::create_dir_all(dir).map_err(|e| {
        IndexError::Directory(format!("Failed to create {}: {}", dir.display(), e))
    })?;
    let directory = MmapDirectory::open(dir)
        .map_err(|e| IndexError::Directory(format!("Failed to open {}: {}", dir.display(), e)))?;
    Ok(Index::open_or_create(directory, fields.schema.clone())?)
}

impl RecipeIndex for TantivyRecipeIndex {
    fn index_recipe(&self, recipe: &Recipe) -> Result<()> {
        let doc = self.build_document(recipe)?;
        self.write("index recipe", |writer| {
            writer.delete_term(self.id_term(&recipe.id));
            writer.add_document(doc)?;
            Ok(())
        })?;
        debug!(recipe_id = %recipe.id, "indexed recipe");
        Ok(())
    }

    fn delete_recipe(&self, recipe_id: &str) -> Result<()> {
        self.write("delete recipe", |writer| {
            writer.delete_term(self.id_term(recipe_id));
            Ok(())
        })?;
        debug!(recipe_id, "removed recipe from index");
        Ok(())
    }

    fn search(&self, search: &RecipeSearch, limit: usize) -> Result<SearchHits> {
        self.ensure_open()?;
        let query = build_search_query(&self.index, &self.fields, search)?;

        let searcher = self.reader.searcher();
        let (top_docs, total) =
            searcher.search(&*query, &(TopDocs::with_limit(limit.max(1)), Count))?;

        let mut ids = Vec::with_capacity(top_docs.len().min(limit));
        for (_score, address) in top_docs.into_iter().take(limit) {
            let doc: TantivyDocument = searcher.doc(address)?;
            if let Some(id) = doc.get_first(self.fields.id).and_then(|v| v.as_str()) {
                ids.push(id.to_string());
            }
        }

        debug!(
            term = %search.search_term,
            total,
            returned = ids.len(),
            "searched recipes"
        );
        Ok(SearchHits { ids, total })
    }

    fn index_recipes(&self, recipes: &[Recipe]) -> Result<IndexingResult> {
        let start = Instant::now();

        // Build documents in parallel
        let doc_results: Vec<_> = recipes
            .par_iter()
            .map(|recipe| self.build_document(recipe))
            .collect();

        let mut failed_recipes = Vec::new();
        let mut documents = Vec::with_capacity(recipes.len());
        for (recipe, result) in recipes.iter().zip(doc_results) {
            match result {
                Ok(doc) => documents.push((recipe.id.as_str(), doc)),
                Err(e) => failed_recipes.push((recipe.name().to_string(), e.to_string())),
            }
        }

        let success_count = documents.len();
        self.write("index recipes", |writer| {
            for (recipe_id, doc) in documents {
                writer.delete_term(self.id_term(recipe_id));
                writer.add_document(doc)?;
            }
            Ok(())
        })?;

        let result = IndexingResult {
            total_recipes: recipes.len(),
            success_count,
            failed_recipes,
            duration_seconds: start.elapsed().as_secs_f64(),
        };
        info!(
            total = result.total_recipes,
            indexed = result.success_count,
            failed = result.failed_recipes.len(),
            seconds = result.duration_seconds,
            "indexed recipe batch"
        );
        Ok(result)
    }

    fn clear(&self) -> Result<()> {
        self.write("clear index", |writer| {
            writer.delete_all_documents()?;
            Ok(())
        })?;
        info!("cleared recipe index");
        Ok(())
    }

    fn document_count(&self) -> Result<u64> {
        self.ensure_open()?;
        Ok(self.reader.searcher().num_docs())
    }

    fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        let writer = self.writer.lock()?.take();
        if let Some(writer) = writer {
            writer.wait_merging_threads()?;
            info!("closed recipe index");
        }
        Ok(())
    }
}
