//! SQLite Recipe-Ingredient Store
//!
//! Owns the association table and the write half of the reconciliation.
//! Every write helper runs inside a transaction supplied by the recipe store.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Connection, Transaction};
use tracing::debug;

use super::database::Database;
use super::id::{from_sqlite_id, to_sqlite_id};
use super::ingredient_store::SqliteIngredientStore;
use super::reconcile::{plan_reconciliation, prepare_desired, ReconciliationReport};
use crate::context::OpContext;
use crate::domain::models::RecipeIngredient;
use crate::domain::ports::RecipeIngredientRepository;
use crate::error::{Result, StorageError};

#[derive(Clone)]
pub struct SqliteRecipeIngredientStore {
    db: Arc<Database>,
    ingredients: SqliteIngredientStore,
}

impl SqliteRecipeIngredientStore {
    pub fn new(db: Arc<Database>, ingredients: SqliteIngredientStore) -> Result<Self> {
        db.with_connection(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS recipe_ingredient (
                    recipe_id INTEGER,
                    ingredient_id INTEGER,
                    quantity TEXT
                )",
                [],
            )?;
            conn.execute(
                "CREATE INDEX IF NOT EXISTS recipe_id_index
                 ON recipe_ingredient(recipe_id)",
                [],
            )?;
            conn.execute(
                "CREATE INDEX IF NOT EXISTS ingredient_id_index
                 ON recipe_ingredient(ingredient_id)",
                [],
            )?;
            Ok(())
        })?;
        Ok(Self { db, ingredients })
    }

    /// Joined ingredient views of a recipe, in association insertion order.
    ///
    /// Takes a plain connection so it serves both point reads and the
    /// in-transaction read of the reconciliation.
    pub fn list_for_recipe(
        &self,
        ctx: &OpContext,
        conn: &Connection,
        recipe_id: i64,
    ) -> Result<Vec<RecipeIngredient>> {
        ctx.check("list recipe ingredients")?;
        let mut stmt = conn.prepare_cached(
            "SELECT i.id, i.name, ri.quantity
             FROM recipe_ingredient ri
             INNER JOIN ingredient i ON i.id = ri.ingredient_id
             WHERE ri.recipe_id = ?1
             ORDER BY ri.rowid",
        )?;
        let ingredients = stmt
            .query_map(params![recipe_id], |row| {
                let id: i64 = row.get(0)?;
                let name: Option<String> = row.get(1)?;
                let quantity: Option<String> = row.get(2)?;
                Ok(RecipeIngredient {
                    id: from_sqlite_id(id),
                    name: name.unwrap_or_default(),
                    quantity: quantity.unwrap_or_default(),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ingredients)
    }

    /// Insert one association, creating the ingredient first when the entry
    /// has no id. The assigned id is written back into `entry`.
    ///
    /// Returns whether an ingredient row was created.
    pub fn add(
        &self,
        ctx: &OpContext,
        tx: &Transaction<'_>,
        recipe_id: i64,
        entry: &mut RecipeIngredient,
    ) -> Result<bool> {
        let created = entry.is_new();
        let ingredient_id = if created {
            let id = self.ingredients.add(ctx, tx, &entry.name)?;
            entry.id = id;
            to_sqlite_id(&entry.id)?
        } else {
            let ingredient_id = to_sqlite_id(&entry.id)?;
            if !self.ingredients.exists(ctx, tx, ingredient_id)? {
                return Err(StorageError::ingredient_not_found(&entry.id));
            }
            ingredient_id
        };

        ctx.check("add recipe ingredient")?;
        tx.execute(
            "INSERT INTO recipe_ingredient (recipe_id, ingredient_id, quantity)
             VALUES (?1, ?2, ?3)",
            params![recipe_id, ingredient_id, &entry.quantity],
        )?;
        Ok(created)
    }

    /// Change the quantity of one association; `NotFound` if there is none.
    pub fn update_quantity(
        &self,
        ctx: &OpContext,
        tx: &Transaction<'_>,
        recipe_id: i64,
        entry: &RecipeIngredient,
    ) -> Result<()> {
        ctx.check("update recipe ingredient")?;
        let affected = tx.execute(
            "UPDATE recipe_ingredient SET quantity = ?1
             WHERE recipe_id = ?2 AND ingredient_id = ?3",
            params![&entry.quantity, recipe_id, to_sqlite_id(&entry.id)?],
        )?;
        if affected == 0 {
            return Err(StorageError::not_found(format!(
                "ingredient [{}] is not part of recipe [{}]",
                entry.id, recipe_id
            )));
        }
        Ok(())
    }

    pub fn remove(
        &self,
        ctx: &OpContext,
        tx: &Transaction<'_>,
        recipe_id: i64,
        ingredient_id: &str,
    ) -> Result<()> {
        ctx.check("delete recipe ingredient")?;
        tx.execute(
            "DELETE FROM recipe_ingredient WHERE recipe_id = ?1 AND ingredient_id = ?2",
            params![recipe_id, to_sqlite_id(ingredient_id)?],
        )?;
        Ok(())
    }

    pub fn remove_all(&self, ctx: &OpContext, tx: &Transaction<'_>, recipe_id: i64) -> Result<usize> {
        ctx.check("delete recipe ingredients")?;
        Ok(tx.execute(
            "DELETE FROM recipe_ingredient WHERE recipe_id = ?1",
            params![recipe_id],
        )?)
    }

    /// Bring the stored associations of `recipe_id` in line with `desired`.
    ///
    /// Newly assigned ingredient ids are written back into `desired`.
    pub fn reconcile(
        &self,
        ctx: &OpContext,
        tx: &Transaction<'_>,
        recipe_id: i64,
        desired: &mut [RecipeIngredient],
    ) -> Result<ReconciliationReport> {
        prepare_desired(desired)?;
        let current = self.list_for_recipe(ctx, tx, recipe_id)?;
        let plan = plan_reconciliation(&current, desired);

        let mut report = ReconciliationReport::default();
        for ingredient_id in &plan.deletions {
            self.remove(ctx, tx, recipe_id, ingredient_id)?;
            report.deleted += 1;
        }
        for &index in &plan.quantity_updates {
            self.update_quantity(ctx, tx, recipe_id, &desired[index])?;
            report.updated += 1;
        }
        for &index in &plan.insertions {
            if self.add(ctx, tx, recipe_id, &mut desired[index])? {
                report.created_ingredients += 1;
            }
            report.inserted += 1;
        }

        debug!(
            recipe_id,
            deleted = report.deleted,
            updated = report.updated,
            inserted = report.inserted,
            created_ingredients = report.created_ingredients,
            "reconciled recipe ingredients"
        );
        Ok(report)
    }
}

#[async_trait]
impl RecipeIngredientRepository for SqliteRecipeIngredientStore {
    async fn recipe_ingredients(
        &self,
        ctx: &OpContext,
        recipe_id: &str,
    ) -> Result<Vec<RecipeIngredient>> {
        let recipe_id = to_sqlite_id(recipe_id)?;
        self.db.run(ctx, "list recipe ingredients", |conn| {
            self.list_for_recipe(ctx, conn, recipe_id)
        })
    }

    async fn is_used_in_recipe(&self, ctx: &OpContext, ingredient_id: &str) -> Result<bool> {
        let ingredient_id = to_sqlite_id(ingredient_id)?;
        self.db.run(ctx, "check ingredient usage", |conn| {
            let used: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM recipe_ingredient WHERE ingredient_id = ?1)",
                params![ingredient_id],
                |row| row.get(0),
            )?;
            Ok(used)
        })
    }
}
