//! Domain layer: recipe graph models and the repository ports the
//! service layer is written against.

pub mod models;
pub mod ports;

pub use models::{
    BaseRecipe, Ingredient, Recipe, RecipeIngredient, RecipeSearch, RecipeSearchResult,
};
pub use ports::{IngredientRepository, RecipeIngredientRepository, RecipeRepository};
