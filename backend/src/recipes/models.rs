//! Recipe data models
//!
//! `Recipe` is the domain record handed around by the service and API layers.
//! `RecipeDocument` is its stored shape in the `recipes` collection, mapped
//! field by field.

use crate::error::AppError;
use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Opaque recipe identifier assigned by the store
pub type RecipeId = String;

/// A recipe in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Store-assigned identifier; `None` until the first save
    #[serde(default)]
    pub id: Option<RecipeId>,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Ingredients in display order
    #[serde(default)]
    pub ingredients: Vec<String>,
    /// Steps in execution order
    #[serde(default)]
    pub steps: Vec<String>,
    /// Category used for filtering
    #[serde(default)]
    pub category: String,
    /// Preparation time in minutes
    #[serde(default)]
    pub prep_time_minutes: u32,
    /// Cooking time in minutes
    #[serde(default)]
    pub cook_time_minutes: u32,
    /// File name inside the upload directory, if an image was attached
    #[serde(default)]
    pub image_filename: Option<String>,
    /// Creation time; `None` only on incoming payloads that omitted it
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Recipe {
    /// Create an empty, unsaved recipe stamped with the current time
    pub fn new() -> Self {
        Self {
            id: None,
            name: String::new(),
            description: String::new(),
            ingredients: Vec::new(),
            steps: Vec::new(),
            category: String::new(),
            prep_time_minutes: 0,
            cook_time_minutes: 0,
            image_filename: None,
            created_at: Some(Utc::now()),
        }
    }

    /// Generate a new unique recipe ID
    pub fn generate_id() -> RecipeId {
        uuid::Uuid::new_v4().to_string()
    }
}

impl Default for Recipe {
    fn default() -> Self {
        Self::new()
    }
}

/// Stored form of a recipe, one row of the `recipes` collection
///
/// `ingredients` and `steps` are JSON arrays, `created_at` is RFC 3339 UTC.
/// `name_folded` and `category_folded` hold [`fold_case`] copies that the
/// case-insensitive queries compare against.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RecipeDocument {
    /// Document key
    pub id: String,
    /// Display name
    pub name: String,
    /// Case-folded `name`
    pub name_folded: String,
    /// Free-text description
    pub description: String,
    /// JSON-encoded ingredient list
    pub ingredients: String,
    /// JSON-encoded step list
    pub steps: String,
    /// Category
    pub category: String,
    /// Case-folded `category`
    pub category_folded: String,
    /// Preparation time in minutes
    pub prep_time_minutes: i64,
    /// Cooking time in minutes
    pub cook_time_minutes: i64,
    /// Image file name, if any
    pub image_filename: Option<String>,
    /// RFC 3339 creation time
    pub created_at: String,
}

impl RecipeDocument {
    /// Columns in the order `SELECT` statements should list them
    pub const COLUMNS: &'static str = "id, name, name_folded, description, ingredients, steps, \
         category, category_folded, prep_time_minutes, cook_time_minutes, image_filename, \
         created_at";

    /// Map a recipe onto its stored form under the given id
    ///
    /// A missing `created_at` is filled with the current time so that no
    /// document is ever written without one.
    pub fn from_recipe(id: RecipeId, recipe: &Recipe) -> Result<Self, AppError> {
        let created_at = recipe.created_at.unwrap_or_else(Utc::now);
        Ok(Self {
            id,
            name: recipe.name.clone(),
            name_folded: fold_case(&recipe.name),
            description: recipe.description.clone(),
            ingredients: serde_json::to_string(&recipe.ingredients)
                .context("Failed to encode ingredients")?,
            steps: serde_json::to_string(&recipe.steps).context("Failed to encode steps")?,
            category: recipe.category.clone(),
            category_folded: fold_case(&recipe.category),
            prep_time_minutes: i64::from(recipe.prep_time_minutes),
            cook_time_minutes: i64::from(recipe.cook_time_minutes),
            image_filename: recipe.image_filename.clone(),
            created_at: created_at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        })
    }
}

/// Fold text for case-insensitive comparison
///
/// Uses Unicode lowercasing, so "CRÈME" and "crème" fold to the same string.
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

impl TryFrom<RecipeDocument> for Recipe {
    type Error = AppError;

    fn try_from(doc: RecipeDocument) -> Result<Self, Self::Error> {
        let ingredients: Vec<String> = serde_json::from_str(&doc.ingredients)
            .with_context(|| format!("Corrupt ingredients in recipe {}", doc.id))?;
        let steps: Vec<String> = serde_json::from_str(&doc.steps)
            .with_context(|| format!("Corrupt steps in recipe {}", doc.id))?;
        let created_at = DateTime::parse_from_rfc3339(&doc.created_at)
            .with_context(|| format!("Corrupt created_at in recipe {}", doc.id))?
            .with_timezone(&Utc);
        let prep_time_minutes = u32::try_from(doc.prep_time_minutes)
            .with_context(|| format!("Corrupt prep_time_minutes in recipe {}", doc.id))?;
        let cook_time_minutes = u32::try_from(doc.cook_time_minutes)
            .with_context(|| format!("Corrupt cook_time_minutes in recipe {}", doc.id))?;

        Ok(Self {
            id: Some(doc.id),
            name: doc.name,
            description: doc.description,
            ingredients,
            steps,
            category: doc.category,
            prep_time_minutes,
            cook_time_minutes,
            image_filename: doc.image_filename.filter(|f| !f.is_empty()),
            created_at: Some(created_at),
        })
    }
}
