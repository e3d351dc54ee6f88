//! Recipe use cases
//!
//! Writes go to SQLite first. Once the transaction has committed, the recipe
//! is read back and pushed to the search index; a failure at that point is
//! logged and the write still succeeds. The startup rebuild
//! ([`RecipeService::index_all_existing_recipes`]) is what brings a drifted
//! index back in line.

use std::sync::Arc;
use std::time::{Duration, Instant};

use miam_search::{IndexError, RecipeIndex};
use miam_storage::{BaseRecipe, OpContext, Recipe, RecipeRepository, RecipeSearch, RecipeSearchResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::error::Result;
use crate::request_context;

/// Recipes hydrated and indexed per batch during a rebuild
const REINDEX_BATCH_SIZE: usize = 200;

/// Outcome of a full index rebuild
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReindexReport {
    pub recipes: usize,
    pub indexed: usize,
    #[serde(rename = "duration")]
    pub duration_seconds: f64,
}

pub struct RecipeService {
    recipes: Arc<dyn RecipeRepository>,
    index: Arc<dyn RecipeIndex>,
    search: SearchConfig,
    timeout: Duration,
}

impl RecipeService {
    pub fn new(
        recipes: Arc<dyn RecipeRepository>,
        index: Arc<dyn RecipeIndex>,
        search: SearchConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            recipes,
            index,
            search,
            timeout,
        }
    }

    pub async fn get(&self, ctx: &OpContext, id: &str) -> Result<Recipe> {
        let ctx = request_context(ctx, self.timeout);
        Ok(self.recipes.get(&ctx, id).await?)
    }

    /// Create a recipe, new ingredients included, and index it.
    pub async fn add(&self, ctx: &OpContext, recipe: &BaseRecipe) -> Result<Recipe> {
        let ctx = request_context(ctx, self.timeout);
        let id = self.recipes.add(&ctx, recipe).await?;
        info!(recipe_id = %id, name = %recipe.name, "added recipe");

        let stored = self.reload_and_index(&id).await;
        Ok(stored.unwrap_or_else(|| Recipe::new(id, recipe.clone())))
    }

    /// Replace name, instructions and ingredient list of recipe `id`.
    pub async fn update(&self, ctx: &OpContext, id: &str, recipe: &BaseRecipe) -> Result<Recipe> {
        let ctx = request_context(ctx, self.timeout);
        let updated = self
            .recipes
            .update(&ctx, &Recipe::new(id, recipe.clone()))
            .await?;

        Ok(self.reload_and_index(id).await.unwrap_or(updated))
    }

    pub async fn delete(&self, ctx: &OpContext, id: &str) -> Result<()> {
        let ctx = request_context(ctx, self.timeout);
        self.recipes.delete(&ctx, id).await?;
        info!(recipe_id = %id, "deleted recipe");

        if let Err(err) = self.index.delete_recipe(id) {
            warn!(recipe_id = %id, error = %err, "recipe deleted but still in search index");
        }
        Ok(())
    }

    /// Full-text search with exclusions.
    ///
    /// A search without any criteria skips the index and answers with a
    /// random sample plus the number of stored recipes.
    pub async fn search_recipe(
        &self,
        ctx: &OpContext,
        search: &RecipeSearch,
    ) -> Result<RecipeSearchResult> {
        let ctx = request_context(ctx, self.timeout);

        if search.is_empty() {
            let first_results = self
                .recipes
                .random_sample(&ctx, self.search.random_sample_size)
                .await?;
            let total = self.recipes.count(&ctx).await?;
            return Ok(RecipeSearchResult {
                total,
                first_results,
            });
        }

        let hits = self.index.search(search, self.search.max_results)?;
        let first_results = self.recipes.get_many(&ctx, &hits.ids).await?;
        if first_results.len() < hits.ids.len() {
            debug!(
                hits = hits.ids.len(),
                found = first_results.len(),
                "search index returned ids missing from the database"
            );
        }

        Ok(RecipeSearchResult {
            total: hits.total,
            first_results,
        })
    }

    /// Drop every indexed document and index all stored recipes again.
    ///
    /// Unlike the per-write indexing, any failure here is returned.
    pub async fn index_all_existing_recipes(&self, ctx: &OpContext) -> Result<ReindexReport> {
        let start = Instant::now();
        self.index.clear()?;

        let ids = self.recipes.list_all_ids(ctx).await?;
        let mut indexed = 0;
        for chunk in ids.chunks(REINDEX_BATCH_SIZE) {
            let batch = self.recipes.get_many(ctx, chunk).await?;
            let result = self.index.index_recipes(&batch)?;

            if let Some((name, error)) = result.failed_recipes.first() {
                return Err(IndexError::Internal(format!(
                    "failed to index {} recipe(s), first '{}': {}",
                    result.failed_recipes.len(),
                    name,
                    error
                ))
                .into());
            }
            indexed += result.success_count;
        }

        let report = ReindexReport {
            recipes: ids.len(),
            indexed,
            duration_seconds: start.elapsed().as_secs_f64(),
        };
        info!(
            recipes = report.recipes,
            indexed = report.indexed,
            "rebuilt recipe index"
        );
        Ok(report)
    }

    /// Read back a committed recipe and index it.
    ///
    /// The write already committed, so the caller's cancellation no longer
    /// applies; only the service timeout bounds the read. `None` when the
    /// read fails, in which case the index is left for the next rebuild.
    async fn reload_and_index(&self, id: &str) -> Option<Recipe> {
        let ctx = OpContext::with_timeout(self.timeout);
        let stored = match self.recipes.get(&ctx, id).await {
            Ok(stored) => stored,
            Err(err) => {
                warn!(recipe_id = %id, error = %err, "recipe saved but not read back, not indexed");
                return None;
            }
        };

        if let Err(err) = self.index.index_recipe(&stored) {
            warn!(recipe_id = %id, error = %err, "recipe saved but not indexed");
        }
        Some(stored)
    }
}
