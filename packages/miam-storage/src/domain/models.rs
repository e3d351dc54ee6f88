//! Recipe graph domain models
//!
//! Ids are opaque strings at every boundary; only the SQLite adapter knows
//! they are integers. A `Recipe`'s `ingredients` list is a view produced by
//! joining the association table on read, never a stored column.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A named foodstuff, independent of any recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: String,
    pub name: String,
}

impl Ingredient {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Link between one recipe and one ingredient
///
/// `id` is the ingredient id; an empty id marks an ingredient that does not
/// exist yet and will be created alongside the recipe. `name` is the joined
/// ingredient name, only meaningful on read or for new ingredients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub quantity: String,
}

impl RecipeIngredient {
    /// Reference an existing ingredient by id
    pub fn existing(id: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            quantity: quantity.into(),
        }
    }

    /// Ingredient to be created together with the association
    pub fn new_ingredient(name: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            quantity: quantity.into(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_empty()
    }
}

/// Editable part of a recipe
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseRecipe {
    pub name: String,
    #[serde(default, rename = "howTo", skip_serializing_if = "String::is_empty")]
    pub how_to: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ingredients: Vec<RecipeIngredient>,
}

impl BaseRecipe {
    pub fn new(name: impl Into<String>, how_to: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            how_to: how_to.into(),
            ingredients: Vec::new(),
        }
    }

    pub fn with_ingredient(mut self, ingredient: RecipeIngredient) -> Self {
        self.ingredients.push(ingredient);
        self
    }
}

/// A named dish with instructions and its ingredient associations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    #[serde(flatten)]
    pub base: BaseRecipe,
}

impl Recipe {
    pub fn new(id: impl Into<String>, base: BaseRecipe) -> Self {
        Self {
            id: id.into(),
            base,
        }
    }

    pub fn name(&self) -> &str {
        &self.base.name
    }

    pub fn how_to(&self) -> &str {
        &self.base.how_to
    }

    pub fn ingredients(&self) -> &[RecipeIngredient] {
        &self.base.ingredients
    }
}

/// Search criteria
///
/// All fields empty means no filtering at all; such a search is answered
/// with a random sample instead of an index query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSearch {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub search_term: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub excluded_recipes: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub excluded_ingredients: BTreeSet<String>,
}

impl RecipeSearch {
    pub fn term(search_term: impl Into<String>) -> Self {
        Self {
            search_term: search_term.into(),
            ..Self::default()
        }
    }

    pub fn excluding_recipe(mut self, recipe_id: impl Into<String>) -> Self {
        self.excluded_recipes.insert(recipe_id.into());
        self
    }

    pub fn excluding_ingredient(mut self, ingredient_id: impl Into<String>) -> Self {
        self.excluded_ingredients.insert(ingredient_id.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.search_term.is_empty()
            && self.excluded_recipes.is_empty()
            && self.excluded_ingredients.is_empty()
    }
}

/// Search answer: total match count plus the first hydrated recipes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSearchResult {
    pub total: usize,
    pub first_results: Vec<Recipe>,
}
