//! miam-service: recipe and ingredient use cases
//!
//! Ties the SQLite stores and the Tantivy index together:
//!
//! - [`IngredientService`]: ingredient CRUD, refusing to delete an ingredient
//!   still used by a recipe
//! - [`RecipeService`]: recipe CRUD with post-commit indexing, search, and
//!   the full index rebuild
//! - [`Miam`]: opens both handles from a [`MiamConfig`] and rebuilds the
//!   index at start
//!
//! # Usage
//!
//! ```rust,ignore
//! use miam_service::{Miam, MiamConfig};
//! use miam_storage::{OpContext, RecipeSearch};
//!
//! let miam = Miam::open(MiamConfig::from_yaml("miam.yaml")?).await?;
//! let ctx = OpContext::background();
//! let result = miam.recipes().search_recipe(&ctx, &RecipeSearch::term("riz")).await?;
//! miam.close()?;
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod ingredient_service;
pub mod recipe_service;
pub mod telemetry;

pub use app::Miam;
pub use config::{ConfigError, MiamConfig};
pub use error::{ErrorResponse, Result, ServiceError};
pub use ingredient_service::IngredientService;
pub use recipe_service::{RecipeService, ReindexReport};

use std::time::Duration;

use miam_storage::OpContext;

/// Context for one service call: the caller's, bounded by `timeout` when it
/// carries no deadline of its own.
pub(crate) fn request_context(ctx: &OpContext, timeout: Duration) -> OpContext {
    if ctx.deadline().is_some() {
        ctx.clone()
    } else {
        ctx.timeout(timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_context_adds_deadline() {
        let ctx = request_context(&OpContext::background(), Duration::from_secs(5));
        assert!(ctx.deadline().is_some());
    }

    #[test]
    fn test_request_context_keeps_caller_deadline() {
        let caller = OpContext::with_timeout(Duration::from_secs(60));
        let ctx = request_context(&caller, Duration::from_secs(5));
        assert_eq!(ctx.deadline(), caller.deadline());

        caller.cancel();
        assert!(ctx.is_cancelled());
    }
}
