//! SQLite adapters for the recipe graph
//!
//! Tables:
//! - `ingredient(id, name)`
//! - `recipe(id, name, how_to)`
//! - `recipe_ingredient(recipe_id, ingredient_id, quantity)` with secondary
//!   indexes on both id columns
//!
//! There are no foreign keys; referential integrity comes from ordered writes
//! inside one transaction and explicit existence checks.

mod database;
mod id;
mod ingredient_store;
mod recipe_ingredient_store;
mod recipe_store;
pub mod reconcile;

use std::sync::Arc;

pub use database::Database;
pub use id::{from_sqlite_id, to_sqlite_id};
pub use ingredient_store::SqliteIngredientStore;
pub use recipe_ingredient_store::SqliteRecipeIngredientStore;
pub use recipe_store::SqliteRecipeStore;
pub use reconcile::{plan_reconciliation, ReconciliationPlan, ReconciliationReport};

use crate::error::Result;

/// The three stores wired over one shared connection
#[derive(Clone)]
pub struct SqliteStores {
    pub ingredients: SqliteIngredientStore,
    pub recipe_ingredients: SqliteRecipeIngredientStore,
    pub recipes: SqliteRecipeStore,
}

impl SqliteStores {
    /// Create every table and index that is missing, then build the stores.
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let ingredients = SqliteIngredientStore::new(db.clone())?;
        let recipe_ingredients = SqliteRecipeIngredientStore::new(db.clone(), ingredients.clone())?;
        let recipes = SqliteRecipeStore::new(db, recipe_ingredients.clone())?;
        Ok(Self {
            ingredients,
            recipe_ingredients,
            recipes,
        })
    }
}
