//! Repository Ports (Trait Interface)
//!
//! The service layer only sees these traits. The SQLite adapters in
//! `infrastructure::sqlite` implement them; the transaction-scoped helpers
//! that fold several writes into one transaction stay inherent methods on
//! the adapters because a `rusqlite::Transaction` cannot cross an `.await`.

use async_trait::async_trait;

use super::models::{BaseRecipe, Ingredient, Recipe, RecipeIngredient};
use crate::context::OpContext;
use crate::error::Result;

/// Standalone ingredient records
#[async_trait]
pub trait IngredientRepository: Send + Sync {
    /// Get ingredient by id
    ///
    /// Fails with `NotFound` when no row matches.
    async fn get(&self, ctx: &OpContext, id: &str) -> Result<Ingredient>;

    /// Create an ingredient in its own transaction
    async fn create(&self, ctx: &OpContext, name: &str) -> Result<Ingredient>;

    /// Rename an ingredient; `NotFound` when zero rows are affected
    async fn update(&self, ctx: &OpContext, ingredient: &Ingredient) -> Result<()>;

    /// Delete an ingredient without any referential check
    async fn delete(&self, ctx: &OpContext, id: &str) -> Result<()>;

    /// All ingredients ordered by id
    async fn list_all(&self, ctx: &OpContext) -> Result<Vec<Ingredient>>;
}

/// Recipe to ingredient associations
#[async_trait]
pub trait RecipeIngredientRepository: Send + Sync {
    /// Joined ingredient views of a recipe, in association insertion order
    async fn recipe_ingredients(
        &self,
        ctx: &OpContext,
        recipe_id: &str,
    ) -> Result<Vec<RecipeIngredient>>;

    /// Whether at least one association references the ingredient
    async fn is_used_in_recipe(&self, ctx: &OpContext, ingredient_id: &str) -> Result<bool>;
}

/// Recipe records with hydrated ingredient lists
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Reads
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    async fn get(&self, ctx: &OpContext, id: &str) -> Result<Recipe>;

    /// Recipes in the order of `ids`, skipping ids with no row
    async fn get_many(&self, ctx: &OpContext, ids: &[String]) -> Result<Vec<Recipe>>;

    async fn list_all_ids(&self, ctx: &OpContext) -> Result<Vec<String>>;

    /// Up to `size` recipes picked at random
    async fn random_sample(&self, ctx: &OpContext, size: usize) -> Result<Vec<Recipe>>;

    async fn count(&self, ctx: &OpContext) -> Result<usize>;

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Structural writes (one transaction each)
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Insert a recipe with its ingredients, returning the new recipe id
    async fn add(&self, ctx: &OpContext, recipe: &BaseRecipe) -> Result<String>;

    /// Rewrite scalar fields and reconcile the ingredient list
    ///
    /// Returns the caller's recipe with every newly assigned ingredient id
    /// written back.
    async fn update(&self, ctx: &OpContext, recipe: &Recipe) -> Result<Recipe>;

    /// Delete a recipe and all of its associations
    async fn delete(&self, ctx: &OpContext, id: &str) -> Result<()>;
}
