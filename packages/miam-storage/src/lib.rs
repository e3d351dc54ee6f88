//! miam-storage: relational side of the recipe graph
//!
//! Recipes, ingredients and their associations live in SQLite. Every
//! structural recipe write is one transaction; ingredient list updates are
//! diffed against the stored state so only changed associations are touched.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use miam_storage::{Database, OpContext, RecipeRepository, SqliteStores};
//! use miam_storage::domain::{BaseRecipe, RecipeIngredient};
//!
//! let db = Arc::new(Database::open("miam.db")?);
//! let stores = SqliteStores::new(db)?;
//! let ctx = OpContext::background();
//!
//! let base = BaseRecipe::new("riz nature", "cuire le riz")
//!     .with_ingredient(RecipeIngredient::new_ingredient("riz", "200g"));
//! let id = stores.recipes.add(&ctx, &base).await?;
//! let recipe = stores.recipes.get(&ctx, &id).await?;
//! ```

pub mod context;
pub mod domain;
pub mod error;

#[cfg(feature = "sqlite")]
pub mod infrastructure;

pub use context::OpContext;
pub use error::{ErrorCategory, ErrorKind, Result, StorageError};

pub use domain::{
    BaseRecipe, Ingredient, IngredientRepository, Recipe, RecipeIngredient,
    RecipeIngredientRepository, RecipeRepository, RecipeSearch, RecipeSearchResult,
};

#[cfg(feature = "sqlite")]
pub use infrastructure::sqlite::{
    Database, ReconciliationPlan, ReconciliationReport, SqliteIngredientStore,
    SqliteRecipeIngredientStore, SqliteRecipeStore, SqliteStores,
};
