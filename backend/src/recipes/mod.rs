//! Recipes module
//!
//! The recipe entity, its stored document shape, and the repository that
//! persists it.

pub mod db;
pub mod models;

pub use db::{RecipeRepository, SqliteRecipeRepository};
pub use models::{fold_case, Recipe, RecipeDocument, RecipeId};
