//! Ingredient list reconciliation
//!
//! Diffs the stored associations of a recipe against the desired list so an
//! update only touches what changed:
//!
//! - stored entry missing from the desired list: delete the association
//! - stored entry present with another quantity: update the quantity
//! - desired entry with an empty id or an id not stored yet: insert, creating
//!   the ingredient first when the id is empty
//!
//! Entries are matched by ingredient id. Order is not significant and entries
//! with an empty id are never merged with each other.

use std::collections::HashSet;

use serde::Serialize;

use super::id::{from_sqlite_id, to_sqlite_id};
use crate::domain::models::RecipeIngredient;
use crate::error::{Result, StorageError};

/// What an update has to do, as positions into the desired list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    /// Ingredient ids whose association must go
    pub deletions: Vec<String>,
    /// Desired entries whose quantity changed
    pub quantity_updates: Vec<usize>,
    /// Desired entries to insert
    pub insertions: Vec<usize>,
}

impl ReconciliationPlan {
    pub fn is_noop(&self) -> bool {
        self.deletions.is_empty() && self.quantity_updates.is_empty() && self.insertions.is_empty()
    }
}

/// Outcome of an applied plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    pub deleted: usize,
    pub updated: usize,
    pub inserted: usize,
    pub created_ingredients: usize,
}

/// Canonicalize the ids of a desired list and reject repeated ids.
///
/// Runs before any write so a rejected list leaves the store untouched.
pub fn prepare_desired(desired: &mut [RecipeIngredient]) -> Result<()> {
    let mut seen = HashSet::with_capacity(desired.len());
    for entry in desired.iter_mut() {
        if entry.is_new() {
            continue;
        }
        let row_id = to_sqlite_id(&entry.id)?;
        entry.id = from_sqlite_id(row_id);
        if !seen.insert(row_id) {
            return Err(StorageError::invalid_value(format!(
                "ingredient [{}] listed more than once",
                entry.id
            )));
        }
    }
    Ok(())
}

/// Classify every entry of `current` and `desired` without touching the store.
pub fn plan_reconciliation(
    current: &[RecipeIngredient],
    desired: &[RecipeIngredient],
) -> ReconciliationPlan {
    let mut plan = ReconciliationPlan::default();

    for stored in current {
        if !desired.iter().any(|entry| entry.id == stored.id) {
            plan.deletions.push(stored.id.clone());
        }
    }

    for (index, entry) in desired.iter().enumerate() {
        if entry.is_new() {
            plan.insertions.push(index);
            continue;
        }
        match current.iter().find(|stored| stored.id == entry.id) {
            Some(stored) if stored.quantity != entry.quantity => plan.quantity_updates.push(index),
            Some(_) => {}
            None => plan.insertions.push(index),
        }
    }

    plan
}
