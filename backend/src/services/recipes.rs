//! Recipe service
//!
//! Thin facade over a `RecipeRepository`. The only rule applied here is that a
//! missing name query becomes the empty string before it reaches the store.

use crate::error::AppError;
use crate::recipes::{Recipe, RecipeRepository};
use std::sync::Arc;

/// Recipe operations used by the HTTP handlers
pub struct RecipeService {
    repo: Arc<dyn RecipeRepository>,
}

impl RecipeService {
    /// Create a service over the given repository
    pub fn new(repo: Arc<dyn RecipeRepository>) -> Self {
        Self { repo }
    }

    /// All recipes in store order
    pub async fn find_all(&self) -> Result<Vec<Recipe>, AppError> {
        self.repo.find_all().await
    }

    /// Look up a recipe by id
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Recipe>, AppError> {
        self.repo.find_by_id(id).await
    }

    /// Insert or replace a recipe
    pub async fn save(&self, recipe: Recipe) -> Result<Recipe, AppError> {
        self.repo.save(recipe).await
    }

    /// Delete a recipe; unknown ids are not an error
    pub async fn delete_by_id(&self, id: &str) -> Result<(), AppError> {
        self.repo.delete_by_id(id).await
    }

    /// Case-insensitive substring search on recipe names
    ///
    /// `None` searches with `""`, which matches every recipe.
    pub async fn search_by_name(&self, query: Option<&str>) -> Result<Vec<Recipe>, AppError> {
        self.repo
            .find_by_name_containing_ignore_case(query.unwrap_or(""))
            .await
    }

    /// Recipes whose category equals `category`, ignoring case
    pub async fn find_by_category(&self, category: &str) -> Result<Vec<Recipe>, AppError> {
        self.repo.find_by_category_ignore_case(category).await
    }
}
