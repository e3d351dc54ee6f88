//! SQLite Ingredient Store

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Transaction};
use tracing::debug;

use super::database::Database;
use super::id::{from_sqlite_id, to_sqlite_id};
use crate::context::OpContext;
use crate::domain::models::Ingredient;
use crate::domain::ports::IngredientRepository;
use crate::error::{Result, StorageError};

#[derive(Clone)]
pub struct SqliteIngredientStore {
    db: Arc<Database>,
}

impl SqliteIngredientStore {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        db.with_connection(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS ingredient (
                    id INTEGER PRIMARY KEY ASC,
                    name TEXT
                )",
                [],
            )?;
            Ok(())
        })?;
        Ok(Self { db })
    }

    /// Insert an ingredient inside the caller's transaction, returning its id.
    pub fn add(&self, ctx: &OpContext, tx: &Transaction<'_>, name: &str) -> Result<String> {
        ctx.check("add ingredient")?;
        tx.execute("INSERT INTO ingredient (name) VALUES (?1)", params![name])
            .map_err(|err| StorageError::from(err).context("failed to add ingredient"))?;
        let id = from_sqlite_id(tx.last_insert_rowid());
        debug!(ingredient_id = %id, name, "added ingredient");
        Ok(id)
    }

    /// Existence check used before an association is inserted.
    pub fn exists(&self, ctx: &OpContext, tx: &Transaction<'_>, id: i64) -> Result<bool> {
        ctx.check("check ingredient")?;
        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM ingredient WHERE id = ?1)",
            params![id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}

#[async_trait]
impl IngredientRepository for SqliteIngredientStore {
    async fn get(&self, ctx: &OpContext, id: &str) -> Result<Ingredient> {
        let row_id = to_sqlite_id(id)?;
        self.db.run(ctx, "get ingredient", |conn| {
            let name: Option<Option<String>> = conn
                .query_row(
                    "SELECT name FROM ingredient WHERE id = ?1",
                    params![row_id],
                    |row| row.get(0),
                )
                .optional()?;
            match name {
                Some(name) => Ok(Ingredient::new(from_sqlite_id(row_id), name.unwrap_or_default())),
                None => Err(StorageError::ingredient_not_found(id)),
            }
        })
    }

    async fn create(&self, ctx: &OpContext, name: &str) -> Result<Ingredient> {
        let id = self
            .db
            .in_transaction(ctx, "create ingredient", |tx| self.add(ctx, tx, name))?;
        Ok(Ingredient::new(id, name))
    }

    async fn update(&self, ctx: &OpContext, ingredient: &Ingredient) -> Result<()> {
        let row_id = to_sqlite_id(&ingredient.id)?;
        let affected = self.db.run(ctx, "update ingredient", |conn| {
            Ok(conn.execute(
                "UPDATE ingredient SET name = ?1 WHERE id = ?2",
                params![&ingredient.name, row_id],
            )?)
        })?;
        if affected == 0 {
            return Err(StorageError::ingredient_not_found(&ingredient.id));
        }
        debug!(ingredient_id = %ingredient.id, "updated ingredient");
        Ok(())
    }

    async fn delete(&self, ctx: &OpContext, id: &str) -> Result<()> {
        let row_id = to_sqlite_id(id)?;
        let affected = self.db.run(ctx, "delete ingredient", |conn| {
            Ok(conn.execute("DELETE FROM ingredient WHERE id = ?1", params![row_id])?)
        })?;
        if affected == 0 {
            return Err(StorageError::ingredient_not_found(id));
        }
        debug!(ingredient_id = %id, "deleted ingredient");
        Ok(())
    }

    async fn list_all(&self, ctx: &OpContext) -> Result<Vec<Ingredient>> {
        self.db.run(ctx, "list ingredients", |conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM ingredient ORDER BY id")?;
            let ingredients = stmt
                .query_map([], |row| {
                    let id: i64 = row.get(0)?;
                    let name: Option<String> = row.get(1)?;
                    Ok(Ingredient::new(from_sqlite_id(id), name.unwrap_or_default()))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(ingredients)
        })
    }
}
