//! miam command line
//!
//! Opens the configured database and index (rebuilding the index), runs one
//! command and prints its result as JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use miam_service::telemetry::init_tracing;
use miam_service::{Miam, MiamConfig, ServiceError};
use miam_storage::{OpContext, RecipeSearch};

#[derive(Parser)]
#[command(name = "miam")]
#[command(about = "Recipe store with full-text search", long_about = None)]
struct Cli {
    /// YAML configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the search index from the database and report counts
    Reindex,

    /// Search recipes; without criteria returns a random sample
    Search {
        /// Phrase matched against names, instructions and ingredient names
        term: Option<String>,

        /// Recipe id to leave out (repeatable)
        #[arg(long = "exclude-recipe")]
        exclude_recipes: Vec<String>,

        /// Ingredient id whose recipes are left out (repeatable)
        #[arg(long = "exclude-ingredient")]
        exclude_ingredients: Vec<String>,
    },

    /// Show one recipe with its ingredients
    Recipe { id: String },

    /// List every ingredient
    Ingredients,

    /// Create an ingredient
    AddIngredient { name: String },

    /// Delete an ingredient no recipe uses
    DeleteIngredient { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => MiamConfig::from_yaml(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => MiamConfig::default(),
    };
    init_tracing(&config.logging.filter);

    let miam = Miam::open(config).await.context("failed to start miam")?;
    let outcome = run(&miam, cli.command).await;
    miam.close().context("failed to close miam")?;

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            eprintln!("{}", serde_json::to_string_pretty(&err.to_response())?);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(miam: &Miam, command: Commands) -> Result<(), ServiceError> {
    let ctx = OpContext::background();

    match command {
        Commands::Reindex => print_json(miam.startup_reindex()),
        Commands::Search {
            term,
            exclude_recipes,
            exclude_ingredients,
        } => {
            let search = RecipeSearch {
                search_term: term.unwrap_or_default(),
                excluded_recipes: exclude_recipes.into_iter().collect(),
                excluded_ingredients: exclude_ingredients.into_iter().collect(),
            };
            print_json(&miam.recipes().search_recipe(&ctx, &search).await?)
        }
        Commands::Recipe { id } => print_json(&miam.recipes().get(&ctx, &id).await?),
        Commands::Ingredients => print_json(&miam.ingredients().list_all(&ctx).await?),
        Commands::AddIngredient { name } => {
            print_json(&miam.ingredients().add(&ctx, &name).await?)
        }
        Commands::DeleteIngredient { id } => {
            miam.ingredients().delete(&ctx, &id).await?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), ServiceError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| ServiceError::Storage(e.into()))?;
    println!("{}", json);
    Ok(())
}
