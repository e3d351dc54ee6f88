//! Application wiring
//!
//! Opens the database and the search index, builds the services over them
//! and rebuilds the index from the database before serving anything.

use std::sync::Arc;

use miam_search::{RecipeIndex, TantivyRecipeIndex};
use miam_storage::{Database, OpContext, SqliteStores};
use tracing::info;

use crate::config::MiamConfig;
use crate::error::Result;
use crate::ingredient_service::IngredientService;
use crate::recipe_service::{RecipeService, ReindexReport};

pub struct Miam {
    config: MiamConfig,
    db: Arc<Database>,
    index: Arc<TantivyRecipeIndex>,
    ingredients: IngredientService,
    recipes: RecipeService,
    startup_reindex: ReindexReport,
}

impl Miam {
    /// Open every handle described by `config` and run the startup rebuild.
    ///
    /// A rebuild failure aborts the start.
    pub async fn open(config: MiamConfig) -> Result<Self> {
        config.validate()?;

        let db = Arc::new(if config.database.is_in_memory() {
            Database::open_in_memory()?
        } else {
            Database::open(&config.database.path)?
        });
        let stores = SqliteStores::new(db.clone())?;
        let index = Arc::new(TantivyRecipeIndex::open(&config.index_options())?);

        let timeout = config.request_timeout();
        let ingredients = IngredientService::new(
            Arc::new(stores.ingredients),
            Arc::new(stores.recipe_ingredients),
            timeout,
        );
        let recipes = RecipeService::new(
            Arc::new(stores.recipes),
            index.clone(),
            config.search,
            timeout,
        );

        let startup_reindex = recipes
            .index_all_existing_recipes(&OpContext::background())
            .await?;

        info!(
            database = %config.database.path.display(),
            recipes = startup_reindex.recipes,
            "miam ready"
        );

        Ok(Self {
            config,
            db,
            index,
            ingredients,
            recipes,
            startup_reindex,
        })
    }

    pub fn config(&self) -> &MiamConfig {
        &self.config
    }

    pub fn ingredients(&self) -> &IngredientService {
        &self.ingredients
    }

    pub fn recipes(&self) -> &RecipeService {
        &self.recipes
    }

    /// Report of the rebuild run by [`Miam::open`]
    pub fn startup_reindex(&self) -> &ReindexReport {
        &self.startup_reindex
    }

    /// Close the index, then the database. Safe to call twice.
    pub fn close(&self) -> Result<()> {
        self.index.close()?;
        self.db.close()?;
        info!("miam closed");
        Ok(())
    }
}
