//! Ingredient use cases

use std::sync::Arc;
use std::time::Duration;

use miam_storage::{Ingredient, IngredientRepository, OpContext, RecipeIngredientRepository};
use tracing::info;

use crate::error::{Result, ServiceError};
use crate::request_context;

pub struct IngredientService {
    ingredients: Arc<dyn IngredientRepository>,
    recipe_ingredients: Arc<dyn RecipeIngredientRepository>,
    timeout: Duration,
}

impl IngredientService {
    pub fn new(
        ingredients: Arc<dyn IngredientRepository>,
        recipe_ingredients: Arc<dyn RecipeIngredientRepository>,
        timeout: Duration,
    ) -> Self {
        Self {
            ingredients,
            recipe_ingredients,
            timeout,
        }
    }

    pub async fn list_all(&self, ctx: &OpContext) -> Result<Vec<Ingredient>> {
        let ctx = request_context(ctx, self.timeout);
        Ok(self.ingredients.list_all(&ctx).await?)
    }

    pub async fn get(&self, ctx: &OpContext, id: &str) -> Result<Ingredient> {
        let ctx = request_context(ctx, self.timeout);
        Ok(self.ingredients.get(&ctx, id).await?)
    }

    pub async fn add(&self, ctx: &OpContext, name: &str) -> Result<Ingredient> {
        let ctx = request_context(ctx, self.timeout);
        let ingredient = self.ingredients.create(&ctx, name).await?;
        info!(ingredient_id = %ingredient.id, name = %ingredient.name, "added ingredient");
        Ok(ingredient)
    }

    pub async fn update(&self, ctx: &OpContext, ingredient: &Ingredient) -> Result<Ingredient> {
        let ctx = request_context(ctx, self.timeout);
        self.ingredients.update(&ctx, ingredient).await?;
        info!(ingredient_id = %ingredient.id, "updated ingredient");
        Ok(ingredient.clone())
    }

    /// Delete an ingredient no recipe refers to.
    ///
    /// The reference check and the delete are two statements; an association
    /// created in between is not detected.
    pub async fn delete(&self, ctx: &OpContext, id: &str) -> Result<()> {
        let ctx = request_context(ctx, self.timeout);
        if self.recipe_ingredients.is_used_in_recipe(&ctx, id).await? {
            return Err(ServiceError::InvalidValue(format!(
                "ingredient [{}] is used in a recipe",
                id
            )));
        }
        self.ingredients.delete(&ctx, id).await?;
        info!(ingredient_id = %id, "deleted ingredient");
        Ok(())
    }
}
