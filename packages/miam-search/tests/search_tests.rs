//! Recipe index integration tests
//!
//! Phrase search, exclusion filters, batch rebuild and on-disk persistence
//! against a real Tantivy index.

use miam_search::{AnalyzerLanguage, IndexOptions, RecipeIndex, TantivyRecipeIndex};
use miam_storage::{BaseRecipe, Recipe, RecipeIngredient, RecipeSearch};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn recipe(id: &str, name: &str, how_to: &str, ingredients: &[(&str, &str)]) -> Recipe {
    let base = ingredients
        .iter()
        .fold(BaseRecipe::new(name, how_to), |base, (ingredient_id, ingredient_name)| {
            base.with_ingredient(RecipeIngredient {
                id: ingredient_id.to_string(),
                name: ingredient_name.to_string(),
                quantity: String::new(),
            })
        });
    Recipe::new(id, base)
}

fn cookbook() -> Vec<Recipe> {
    vec![
        recipe(
            "1",
            "riz nature",
            "Faire cuire le riz dans l'eau bouillante",
            &[("1", "riz"), ("2", "eau")],
        ),
        recipe(
            "2",
            "gratin de pommes de terre",
            "Éplucher les pommes de terre, ajouter la crème",
            &[("3", "pommes de terre"), ("4", "crème")],
        ),
        recipe(
            "3",
            "riz au lait",
            "Cuire le riz dans le lait sucré",
            &[("1", "riz"), ("5", "lait"), ("6", "sucre")],
        ),
        recipe(
            "4",
            "salade de tomates",
            "Couper les tomates",
            &[("7", "tomate"), ("8", "huile d'olive")],
        ),
    ]
}

fn indexed_cookbook() -> TantivyRecipeIndex {
    let index = TantivyRecipeIndex::in_memory().unwrap();
    let result = index.index_recipes(&cookbook()).unwrap();
    assert!(result.failed_recipes.is_empty());
    index
}

fn sorted(mut ids: Vec<String>) -> Vec<String> {
    ids.sort();
    ids
}

// ═══════════════════════════════════════════════════════════════════════════
// Phrase search
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_term_matches_every_text_field() {
    let index = indexed_cookbook();

    // name + instructions + ingredient names
    let hits = index.search(&RecipeSearch::term("riz"), 10).unwrap();
    assert_eq!(hits.total, 2);
    assert_eq!(sorted(hits.ids), vec!["1", "3"]);

    // only in instructions
    let hits = index.search(&RecipeSearch::term("éplucher"), 10).unwrap();
    assert_eq!(hits.ids, vec!["2"]);

    // only in an ingredient name
    let hits = index.search(&RecipeSearch::term("olive"), 10).unwrap();
    assert_eq!(hits.ids, vec!["4"]);
}

#[test]
fn test_phrase_keeps_word_order() {
    let index = indexed_cookbook();

    let hits = index.search(&RecipeSearch::term("riz au lait"), 10).unwrap();
    assert_eq!(hits.ids, vec!["3"]);

    let hits = index.search(&RecipeSearch::term("lait riz"), 10).unwrap();
    assert_eq!(hits.total, 0);
}

#[test]
fn test_phrase_across_stop_word() {
    let index = indexed_cookbook();
    let hits = index
        .search(&RecipeSearch::term("pommes de terre"), 10)
        .unwrap();
    assert_eq!(hits.ids, vec!["2"]);
}

#[test]
fn test_case_accents_and_plurals() {
    let index = indexed_cookbook();

    assert_eq!(index.search(&RecipeSearch::term("RIZ"), 10).unwrap().total, 2);
    assert_eq!(
        index.search(&RecipeSearch::term("creme"), 10).unwrap().ids,
        vec!["2"]
    );
    assert_eq!(
        index.search(&RecipeSearch::term("tomate"), 10).unwrap().ids,
        vec!["4"]
    );
}

#[test]
fn test_stop_words_only_term_matches_nothing() {
    let index = indexed_cookbook();
    let hits = index.search(&RecipeSearch::term("de la"), 10).unwrap();
    assert_eq!(hits.total, 0);
    assert!(hits.ids.is_empty());
}

#[test]
fn test_best_match_first() {
    let index = TantivyRecipeIndex::in_memory().unwrap();
    index
        .index_recipes(&[
            recipe(
                "1",
                "tarte aux pommes",
                "Éplucher les pommes, étaler la pâte, disposer les pommes en rosace",
                &[("1", "pommes")],
            ),
            recipe(
                "2",
                "compote",
                "Cuire doucement en remuant, ajouter les pommes à la fin, mixer puis laisser refroidir au frais",
                &[("2", "sucre")],
            ),
        ])
        .unwrap();

    let hits = index.search(&RecipeSearch::term("pommes"), 10).unwrap();
    assert_eq!(hits.total, 2);
    assert_eq!(hits.ids[0], "1");
}

#[test]
fn test_limit_bounds_ids_not_total() {
    let index = TantivyRecipeIndex::in_memory().unwrap();
    let recipes: Vec<Recipe> = (1..=25)
        .map(|i| recipe(&i.to_string(), &format!("soupe numéro {}", i), "", &[]))
        .collect();
    index.index_recipes(&recipes).unwrap();

    let hits = index.search(&RecipeSearch::term("soupe"), 10).unwrap();
    assert_eq!(hits.ids.len(), 10);
    assert_eq!(hits.total, 25);
}

// ═══════════════════════════════════════════════════════════════════════════
// Exclusions
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_exclude_recipes() {
    let index = indexed_cookbook();
    let search = RecipeSearch::term("riz").excluding_recipe("1");
    let hits = index.search(&search, 10).unwrap();
    assert_eq!(hits.ids, vec!["3"]);
    assert_eq!(hits.total, 1);
}

#[test]
fn test_exclude_ingredients() {
    let index = indexed_cookbook();
    let search = RecipeSearch::term("riz").excluding_ingredient("5");
    let hits = index.search(&search, 10).unwrap();
    assert_eq!(hits.ids, vec!["1"]);
}

#[test]
fn test_exclusions_without_term() {
    let index = indexed_cookbook();
    let search = RecipeSearch::default()
        .excluding_recipe("4")
        .excluding_ingredient("1");
    let hits = index.search(&search, 10).unwrap();
    assert_eq!(hits.ids, vec!["2"]);
    assert_eq!(hits.total, 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// Batch & lifecycle
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_batch_reports_failures() {
    let index = TantivyRecipeIndex::in_memory().unwrap();
    let result = index
        .index_recipes(&[
            recipe("1", "riz", "", &[]),
            recipe("", "orpheline", "", &[]),
        ])
        .unwrap();

    assert_eq!(result.total_recipes, 2);
    assert_eq!(result.success_count, 1);
    assert_eq!(result.failed_recipes.len(), 1);
    assert_eq!(result.failed_recipes[0].0, "orpheline");
    assert_eq!(index.document_count().unwrap(), 1);
}

#[test]
fn test_clear() {
    let index = indexed_cookbook();
    assert_eq!(index.document_count().unwrap(), 4);
    index.clear().unwrap();
    assert_eq!(index.document_count().unwrap(), 0);
    assert_eq!(index.search(&RecipeSearch::term("riz"), 10).unwrap().total, 0);
}

#[test]
fn test_index_persists_in_directory() {
    let dir = TempDir::new().unwrap();
    let options = IndexOptions::in_dir(dir.path().join("index"));

    {
        let index = TantivyRecipeIndex::open(&options).unwrap();
        index.index_recipes(&cookbook()).unwrap();
        index.close().unwrap();
    }

    let reopened = TantivyRecipeIndex::open(&options).unwrap();
    assert_eq!(reopened.document_count().unwrap(), 4);
    let hits = reopened
        .search(&RecipeSearch::term("salade"), 10)
        .unwrap();
    assert_eq!(hits.ids, vec!["4"]);
}

#[test]
fn test_english_analyzer() {
    let options = IndexOptions {
        language: AnalyzerLanguage::English,
        ..IndexOptions::default()
    };
    let index = TantivyRecipeIndex::open(&options).unwrap();
    index
        .index_recipe(&recipe("1", "Baked potatoes", "Bake the potatoes", &[]))
        .unwrap();

    assert_eq!(index.search(&RecipeSearch::term("potato"), 10).unwrap().ids, vec!["1"]);
    assert_eq!(index.search(&RecipeSearch::term("baking"), 10).unwrap().total, 1);
}
