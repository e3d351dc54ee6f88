//! SQLite Recipe Store
//!
//! Recipe rows plus hydration of their ingredient lists. Each structural
//! write (add, update, delete) is exactly one transaction spanning the recipe
//! row and all of its association rows.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::{debug, info};

use super::database::Database;
use super::id::{from_sqlite_id, to_sqlite_id};
use super::recipe_ingredient_store::SqliteRecipeIngredientStore;
use super::reconcile::prepare_desired;
use crate::context::OpContext;
use crate::domain::models::{BaseRecipe, Recipe};
use crate::domain::ports::RecipeRepository;
use crate::error::{Result, StorageError};

/// Scalar columns of one recipe row
struct RecipeRow {
    id: i64,
    name: String,
    how_to: String,
}

impl RecipeRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            how_to: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        })
    }
}

#[derive(Clone)]
pub struct SqliteRecipeStore {
    db: Arc<Database>,
    recipe_ingredients: SqliteRecipeIngredientStore,
}

impl SqliteRecipeStore {
    pub fn new(db: Arc<Database>, recipe_ingredients: SqliteRecipeIngredientStore) -> Result<Self> {
        db.with_connection(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS recipe (
                    id INTEGER PRIMARY KEY ASC,
                    name TEXT,
                    how_to TEXT
                )",
                [],
            )?;
            Ok(())
        })?;
        Ok(Self {
            db,
            recipe_ingredients,
        })
    }

    fn hydrate(&self, ctx: &OpContext, conn: &Connection, row: RecipeRow) -> Result<Recipe> {
        let ingredients = self.recipe_ingredients.list_for_recipe(ctx, conn, row.id)?;
        Ok(Recipe::new(
            from_sqlite_id(row.id),
            BaseRecipe {
                name: row.name,
                how_to: row.how_to,
                ingredients,
            },
        ))
    }
}

#[async_trait]
impl RecipeRepository for SqliteRecipeStore {
    async fn get(&self, ctx: &OpContext, id: &str) -> Result<Recipe> {
        let row_id = to_sqlite_id(id)?;
        self.db.run(ctx, "get recipe", |conn| {
            let row = conn
                .query_row(
                    "SELECT id, name, how_to FROM recipe WHERE id = ?1",
                    params![row_id],
                    RecipeRow::from_row,
                )
                .optional()?
                .ok_or_else(|| StorageError::recipe_not_found(id))?;
            self.hydrate(ctx, conn, row)
        })
    }

    async fn get_many(&self, ctx: &OpContext, ids: &[String]) -> Result<Vec<Recipe>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let row_ids = ids
            .iter()
            .map(|id| to_sqlite_id(id))
            .collect::<Result<Vec<_>>>()?;
        self.db.run(ctx, "get recipes", |conn| {
            let placeholders = vec!["?"; row_ids.len()].join(", ");
            let sql = format!(
                "SELECT id, name, how_to FROM recipe WHERE id IN ({})",
                placeholders
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows: HashMap<i64, RecipeRow> = stmt
                .query_map(params_from_iter(row_ids.iter()), RecipeRow::from_row)?
                .map(|row| row.map(|row| (row.id, row)))
                .collect::<rusqlite::Result<_>>()?;

            // requested order wins; ids without a row are skipped
            let mut recipes = Vec::with_capacity(rows.len());
            for row_id in &row_ids {
                if let Some(row) = rows.remove(row_id) {
                    recipes.push(self.hydrate(ctx, conn, row)?);
                }
            }
            Ok(recipes)
        })
    }

    async fn list_all_ids(&self, ctx: &OpContext) -> Result<Vec<String>> {
        self.db.run(ctx, "list recipe ids", |conn| {
            let mut stmt = conn.prepare("SELECT id FROM recipe ORDER BY id")?;
            let ids = stmt
                .query_map([], |row| row.get::<_, i64>(0))?
                .map(|id| id.map(from_sqlite_id))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(ids)
        })
    }

    async fn random_sample(&self, ctx: &OpContext, size: usize) -> Result<Vec<Recipe>> {
        self.db.run(ctx, "sample recipes", |conn| {
            let mut stmt =
                conn.prepare("SELECT id, name, how_to FROM recipe ORDER BY random() LIMIT ?1")?;
            let rows = stmt
                .query_map(params![size as i64], RecipeRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows.into_iter()
                .map(|row| self.hydrate(ctx, conn, row))
                .collect()
        })
    }

    async fn count(&self, ctx: &OpContext) -> Result<usize> {
        self.db.run(ctx, "count recipes", |conn| {
            let count: i64 = conn.query_row("SELECT count(*) FROM recipe", [], |row| row.get(0))?;
            Ok(count as usize)
        })
    }

    async fn add(&self, ctx: &OpContext, recipe: &BaseRecipe) -> Result<String> {
        let mut ingredients = recipe.ingredients.clone();
        prepare_desired(&mut ingredients)?;

        let id = self.db.in_transaction(ctx, "add recipe", |tx| {
            ctx.check("add recipe")?;
            tx.execute(
                "INSERT INTO recipe (name, how_to) VALUES (?1, ?2)",
                params![&recipe.name, &recipe.how_to],
            )?;
            let recipe_id = tx.last_insert_rowid();
            for entry in ingredients.iter_mut() {
                self.recipe_ingredients.add(ctx, tx, recipe_id, entry)?;
            }
            Ok(recipe_id)
        });
        let id = id.map_err(|err| err.context("failed to add recipe"))?;

        info!(recipe_id = id, ingredients = ingredients.len(), "added recipe");
        Ok(from_sqlite_id(id))
    }

    async fn update(&self, ctx: &OpContext, recipe: &Recipe) -> Result<Recipe> {
        let row_id = to_sqlite_id(&recipe.id)?;
        let mut updated = recipe.clone();

        let report = self.db.in_transaction(ctx, "update recipe", |tx| {
            ctx.check("update recipe")?;
            let affected = tx.execute(
                "UPDATE recipe SET name = ?1, how_to = ?2 WHERE id = ?3",
                params![&recipe.base.name, &recipe.base.how_to, row_id],
            )?;
            if affected == 0 {
                return Err(StorageError::recipe_not_found(&recipe.id));
            }
            self.recipe_ingredients
                .reconcile(ctx, tx, row_id, &mut updated.base.ingredients)
        });
        let report = report.map_err(|err| err.context("failed to update recipe"))?;

        info!(
            recipe_id = %recipe.id,
            deleted = report.deleted,
            updated = report.updated,
            inserted = report.inserted,
            "updated recipe"
        );
        Ok(updated)
    }

    async fn delete(&self, ctx: &OpContext, id: &str) -> Result<()> {
        let row_id = to_sqlite_id(id)?;

        let removed = self.db.in_transaction(ctx, "delete recipe", |tx| {
            ctx.check("delete recipe")?;
            let affected = tx.execute("DELETE FROM recipe WHERE id = ?1", params![row_id])?;
            if affected == 0 {
                return Err(StorageError::recipe_not_found(id));
            }
            self.recipe_ingredients.remove_all(ctx, tx, row_id)
        });
        let removed = removed.map_err(|err| err.context("failed to delete recipe"))?;

        debug!(recipe_id = %id, associations = removed, "deleted recipe");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::RecipeIngredient;
    use crate::domain::ports::IngredientRepository;
    use crate::error::ErrorKind;
    use crate::infrastructure::sqlite::SqliteStores;
    use pretty_assertions::assert_eq;

    fn stores() -> SqliteStores {
        SqliteStores::new(Arc::new(Database::open_in_memory().unwrap())).unwrap()
    }

    #[tokio::test]
    async fn test_add_and_get() {
        let stores = stores();
        let ctx = OpContext::background();

        let base = BaseRecipe::new("riz nature", "cuire le riz")
            .with_ingredient(RecipeIngredient::new_ingredient("riz", "200g"));
        let id = stores.recipes.add(&ctx, &base).await.unwrap();
        assert_eq!(id, "1");

        let recipe = stores.recipes.get(&ctx, &id).await.unwrap();
        assert_eq!(recipe.name(), "riz nature");
        assert_eq!(recipe.ingredients().len(), 1);
        assert_eq!(recipe.ingredients()[0].id, "1");
        assert_eq!(recipe.ingredients()[0].name, "riz");
        assert_eq!(recipe.ingredients()[0].quantity, "200g");
    }

    #[tokio::test]
    async fn test_get_many_keeps_requested_order() {
        let stores = stores();
        let ctx = OpContext::background();
        for name in ["a", "b", "c"] {
            stores
                .recipes
                .add(&ctx, &BaseRecipe::new(name, ""))
                .await
                .unwrap();
        }

        let ids: Vec<String> = ["3", "99", "1"].iter().map(|s| s.to_string()).collect();
        let names: Vec<String> = stores
            .recipes
            .get_many(&ctx, &ids)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.base.name)
            .collect();
        assert_eq!(names, vec!["c", "a"]);

        assert!(stores.recipes.get_many(&ctx, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sample_and_count() {
        let stores = stores();
        let ctx = OpContext::background();
        for i in 0..15 {
            stores
                .recipes
                .add(&ctx, &BaseRecipe::new(format!("recette {}", i), ""))
                .await
                .unwrap();
        }

        assert_eq!(stores.recipes.count(&ctx).await.unwrap(), 15);
        assert_eq!(stores.recipes.random_sample(&ctx, 10).await.unwrap().len(), 10);
        assert_eq!(stores.recipes.random_sample(&ctx, 50).await.unwrap().len(), 15);
        assert_eq!(stores.recipes.list_all_ids(&ctx).await.unwrap().len(), 15);
    }

    #[tokio::test]
    async fn test_update_missing_recipe() {
        let stores = stores();
        let ctx = OpContext::background();

        let ghost = Recipe::new(
            "999",
            BaseRecipe::new("fantôme", "")
                .with_ingredient(RecipeIngredient::new_ingredient("sel", "")),
        );
        let err = stores.recipes.update(&ctx, &ghost).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(err.message.ends_with("recipe [999] not found"));
        assert!(stores.ingredients.list_all(&ctx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_recipe() {
        let stores = stores();
        let ctx = OpContext::background();
        let err = stores.recipes.delete(&ctx, "5").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
