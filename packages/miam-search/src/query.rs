//! Search query composition
//!
//! ```text
//! BooleanQuery
//!   Must     phrase(search_term) over name | how_to | ingredient_name
//!            (AllQuery when there is no term)
//!   MustNot  id = excluded recipe         (one clause per id)
//!   MustNot  ingredient_id = excluded id  (one clause per id)
//! ```
//!
//! The search term goes through the same analyzer as the indexed text and
//! keeps the token positions, so "pommes de terre" matches even though the
//! stop word is never indexed. A term that analyzes to nothing matches no
//! document.

use tantivy::query::{AllQuery, BooleanQuery, EmptyQuery, Occur, PhraseQuery, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::{Index, Term};

use miam_storage::RecipeSearch;

use crate::analyzer::analyze;
use crate::error::Result;
use crate::schema::SchemaFields;

/// Build the query for `search`.
pub fn build_search_query(
    index: &Index,
    fields: &SchemaFields,
    search: &RecipeSearch,
) -> Result<Box<dyn Query>> {
    let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();

    if search.search_term.is_empty() {
        clauses.push((Occur::Must, Box::new(AllQuery)));
    } else {
        clauses.push((Occur::Must, term_query(index, fields, &search.search_term)?));
    }

    for recipe_id in &search.excluded_recipes {
        clauses.push((Occur::MustNot, keyword_query(fields.id, recipe_id)));
    }
    for ingredient_id in &search.excluded_ingredients {
        clauses.push((Occur::MustNot, keyword_query(fields.ingredient_id, ingredient_id)));
    }

    Ok(Box::new(BooleanQuery::new(clauses)))
}

/// Phrase match of `text` on any of the full-text fields
fn term_query(index: &Index, fields: &SchemaFields, text: &str) -> Result<Box<dyn Query>> {
    let mut per_field: Vec<(Occur, Box<dyn Query>)> = Vec::new();
    for field in fields.text_fields() {
        if let Some(query) = phrase_query(index, field, text)? {
            per_field.push((Occur::Should, query));
        }
    }

    if per_field.is_empty() {
        return Ok(Box::new(EmptyQuery));
    }
    Ok(Box::new(BooleanQuery::new(per_field)))
}

fn phrase_query(index: &Index, field: Field, text: &str) -> Result<Option<Box<dyn Query>>> {
    let mut analyzer = index.tokenizer_for_field(field)?;
    let mut terms: Vec<(usize, Term)> = analyze(&mut analyzer, text)
        .into_iter()
        .map(|(position, token)| (position, Term::from_field_text(field, &token)))
        .collect();

    let query: Box<dyn Query> = match terms.len() {
        0 => return Ok(None),
        1 => {
            let (_, term) = terms.remove(0);
            Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs))
        }
        _ => Box::new(PhraseQuery::new_with_offset(terms)),
    };
    Ok(Some(query))
}

fn keyword_query(field: Field, value: &str) -> Box<dyn Query> {
    Box::new(TermQuery::new(
        Term::from_field_text(field, value),
        IndexRecordOption::Basic,
    ))
}
