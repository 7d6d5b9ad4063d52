//! Recipe API handlers
//!
//! Contains HTTP request handlers for listing, editing, saving, deleting and
//! seeding recipes. Views are returned as JSON view models; mutations answer
//! with a `303 See Other` back to the list.

use crate::api::form::{non_blank, RecipeForm};
use crate::api::AppState;
use crate::error::AppError;
use crate::services::UploadSource;
use crate::recipes::{fold_case, Recipe};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Where every mutation redirects to
pub const RECIPES_PATH: &str = "/recipes";

/// Query parameters for the list view
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Name search text
    pub q: Option<String>,
    /// Category filter
    pub category: Option<String>,
}

/// List view model
#[derive(Debug, Serialize)]
pub struct RecipeListView {
    /// Matching recipes
    pub recipes: Vec<Recipe>,
    /// Number of recipes returned
    pub count: usize,
    /// The search text as received, for refilling the filter field
    pub q: Option<String>,
    /// The category filter as received
    pub category: Option<String>,
}

/// Create/edit form view model
#[derive(Debug, Serialize)]
pub struct RecipeFormView {
    /// Recipe to populate the form with
    pub recipe: Recipe,
}

/// GET / and GET /recipes - List recipes, optionally filtered
pub async fn list_recipes(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<RecipeListView>, AppError> {
    // Blank filters are ignored; others are used exactly as received
    let query = params.q.as_deref().filter(|q| non_blank(q).is_some());
    let category = params.category.as_deref().filter(|c| non_blank(c).is_some());

    let recipes = match (query, category) {
        (None, None) => state.recipes.find_all().await?,
        (None, Some(category)) => state.recipes.find_by_category(category).await?,
        (Some(query), None) => state.recipes.search_by_name(Some(query)).await?,
        (Some(query), Some(category)) => {
            let folded = fold_case(category);
            let mut recipes = state.recipes.search_by_name(Some(query)).await?;
            recipes.retain(|r| fold_case(&r.category) == folded);
            recipes
        }
    };

    debug!(count = recipes.len(), ?query, ?category, "Listed recipes");

    Ok(Json(RecipeListView {
        count: recipes.len(),
        recipes,
        q: params.q,
        category: params.category,
    }))
}

/// GET /recipes/new - Empty creation form
pub async fn new_recipe_form() -> Json<RecipeFormView> {
    Json(RecipeFormView {
        recipe: Recipe::new(),
    })
}

/// GET /recipes/edit/:id - Edit form, or back to the list if the recipe is gone
pub async fn edit_recipe_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    match state.recipes.find_by_id(&id).await? {
        Some(recipe) => Ok(Json(RecipeFormView { recipe }).into_response()),
        None => {
            debug!(recipe_id = %id, "Edit requested for missing recipe, redirecting");
            Ok(Redirect::to(RECIPES_PATH).into_response())
        }
    }
}

/// POST /recipes - Create or update a recipe from a multipart form
pub async fn save_recipe(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Redirect, AppError> {
    let RecipeForm { mut recipe, image } = RecipeForm::from_multipart(multipart).await?;

    if let Some(image) = image.filter(|image| !image.is_empty()) {
        debug!(
            original_name = image.original_name(),
            bytes = image.len(),
            "Received recipe image"
        );
        let filename = state.images.store(image).await?;
        recipe.image_filename = Some(filename);
    }

    if recipe.created_at.is_none() {
        // An edit that omits createdAt keeps the stored value
        let existing = match recipe.id.as_deref() {
            Some(id) => state.recipes.find_by_id(id).await?,
            None => None,
        };
        recipe.created_at = Some(existing.and_then(|r| r.created_at).unwrap_or_else(Utc::now));
    }

    let saved = state.recipes.save(recipe).await?;
    info!(
        recipe_id = saved.id.as_deref().unwrap_or_default(),
        name = %saved.name,
        "Saved recipe"
    );

    Ok(Redirect::to(RECIPES_PATH))
}

/// POST /recipes/delete/:id - Delete a recipe; missing ids are ignored
pub async fn delete_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    state.recipes.delete_by_id(&id).await?;
    info!(recipe_id = %id, "Deleted recipe");
    Ok(Redirect::to(RECIPES_PATH))
}

/// POST /recipes/seed - Insert the example recipe (development only)
pub async fn seed_recipes(State(state): State<AppState>) -> Result<Response, AppError> {
    if !state.seed_enabled {
        return Ok(StatusCode::NOT_FOUND.into_response());
    }

    let saved = state.recipes.save(example_recipe()).await?;
    info!(recipe_id = saved.id.as_deref().unwrap_or_default(), "Seeded example recipe");
    Ok(Redirect::to(RECIPES_PATH).into_response())
}

/// The fixed recipe inserted by the seed route
pub fn example_recipe() -> Recipe {
    Recipe {
        name: "Example Spaghetti".to_string(),
        description: "A simple example recipe created by the scaffold.".to_string(),
        ingredients: vec![
            "200g spaghetti".to_string(),
            "1 onion".to_string(),
            "2 cloves garlic".to_string(),
        ],
        steps: vec![
            "Boil water".to_string(),
            "Cook spaghetti".to_string(),
            "Fry sauce".to_string(),
        ],
        category: "Pasta".to_string(),
        prep_time_minutes: 10,
        cook_time_minutes: 15,
        ..Recipe::new()
    }
}
