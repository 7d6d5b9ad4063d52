//! Recipe repository
//!
//! `RecipeRepository` is the storage seam used by the service layer.
//! `SqliteRecipeRepository` keeps the `recipes` collection in SQLite.

use crate::error::AppError;
use crate::recipes::models::{fold_case, Recipe, RecipeDocument};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Storage operations for recipes
///
/// Implementations propagate store failures as `AppError::StoreUnavailable`
/// and never retry.
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    /// All recipes in collection order
    async fn find_all(&self) -> Result<Vec<Recipe>, AppError>;

    /// The recipe with this id, if any
    async fn find_by_id(&self, id: &str) -> Result<Option<Recipe>, AppError>;

    /// Insert (no id) or fully replace (id set), returning the stored record
    async fn save(&self, recipe: Recipe) -> Result<Recipe, AppError>;

    /// Remove a recipe; unknown ids are ignored
    async fn delete_by_id(&self, id: &str) -> Result<(), AppError>;

    /// Case-insensitive substring match on `name`
    ///
    /// An empty `text` matches every recipe.
    async fn find_by_name_containing_ignore_case(
        &self,
        text: &str,
    ) -> Result<Vec<Recipe>, AppError>;

    /// Case-insensitive exact match on `category`
    async fn find_by_category_ignore_case(&self, category: &str)
        -> Result<Vec<Recipe>, AppError>;
}

/// SQLite-backed recipe collection
pub struct SqliteRecipeRepository {
    pool: SqlitePool,
}

impl SqliteRecipeRepository {
    /// Initialize database connection pool
    ///
    /// # Arguments
    /// * `db_url` - SQLite connection string (`sqlite:path`, `sqlite::memory:`) or a bare file path
    ///
    /// # Returns
    /// * `Ok(SqliteRecipeRepository)` if successful
    /// * `Err(AppError)` if connection or migration failed
    pub async fn new(db_url: &str) -> Result<Self, AppError> {
        let connection_string = if db_url.starts_with("sqlite:") {
            db_url.to_string()
        } else {
            format!("sqlite:{}", db_url)
        };
        let in_memory = connection_string.contains(":memory:");

        if !in_memory {
            let file_path = connection_string
                .trim_start_matches("sqlite:")
                .trim_start_matches("//");
            let file_path = file_path.split('?').next().unwrap_or(file_path);
            // Ensure parent directory exists
            if let Some(parent) = Path::new(file_path).parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Internal(anyhow::anyhow!("Failed to create db directory: {}", e))
                })?;
            }
        }

        let options = SqliteConnectOptions::from_str(&connection_string)?.create_if_missing(true);

        // Every in-memory connection is its own database, so keep exactly one alive
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(options).await?;

        info!("Connected to SQLite database at: {}", db_url);

        let repo = Self { pool };
        repo.run_migrations().await?;

        Ok(repo)
    }

    /// Apply the embedded schema
    async fn run_migrations(&self) -> Result<(), AppError> {
        sqlx::raw_sql(include_str!("../../migrations/001_create_recipes.sql"))
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Migration failed: {}", e)))?;

        info!("Recipe schema is up to date");
        Ok(())
    }

    /// Get the database pool (for advanced operations if needed)
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_where(&self, clause: &str, arg: &str) -> Result<Vec<Recipe>, AppError> {
        let sql = format!(
            "SELECT {} FROM recipes WHERE {} ORDER BY seq ASC",
            RecipeDocument::COLUMNS,
            clause
        );
        let docs = sqlx::query_as::<_, RecipeDocument>(&sql)
            .bind(arg)
            .fetch_all(&self.pool)
            .await?;

        docs.into_iter().map(Recipe::try_from).collect()
    }
}

/// Escape `LIKE` wildcards so the text is matched literally
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl RecipeRepository for SqliteRecipeRepository {
    async fn find_all(&self) -> Result<Vec<Recipe>, AppError> {
        let sql = format!(
            "SELECT {} FROM recipes ORDER BY seq ASC",
            RecipeDocument::COLUMNS
        );
        let docs = sqlx::query_as::<_, RecipeDocument>(&sql)
            .fetch_all(&self.pool)
            .await?;

        docs.into_iter().map(Recipe::try_from).collect()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Recipe>, AppError> {
        let sql = format!(
            "SELECT {} FROM recipes WHERE id = ?",
            RecipeDocument::COLUMNS
        );
        let doc = sqlx::query_as::<_, RecipeDocument>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        doc.map(Recipe::try_from).transpose()
    }

    async fn save(&self, recipe: Recipe) -> Result<Recipe, AppError> {
        let id = recipe.id.clone().unwrap_or_else(Recipe::generate_id);
        let doc = RecipeDocument::from_recipe(id, &recipe)?;

        // Upsert keeps `seq`, so a replaced recipe stays in its original position
        sqlx::query(
            "INSERT INTO recipes (id, name, name_folded, description, ingredients, steps, \
             category, category_folded, prep_time_minutes, cook_time_minutes, \
             image_filename, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET \
             name = excluded.name, \
             name_folded = excluded.name_folded, \
             description = excluded.description, \
             ingredients = excluded.ingredients, \
             steps = excluded.steps, \
             category = excluded.category, \
             category_folded = excluded.category_folded, \
             prep_time_minutes = excluded.prep_time_minutes, \
             cook_time_minutes = excluded.cook_time_minutes, \
             image_filename = excluded.image_filename, \
             created_at = excluded.created_at",
        )
        .bind(&doc.id)
        .bind(&doc.name)
        .bind(&doc.name_folded)
        .bind(&doc.description)
        .bind(&doc.ingredients)
        .bind(&doc.steps)
        .bind(&doc.category)
        .bind(&doc.category_folded)
        .bind(doc.prep_time_minutes)
        .bind(doc.cook_time_minutes)
        .bind(&doc.image_filename)
        .bind(&doc.created_at)
        .execute(&self.pool)
        .await?;

        debug!(recipe_id = %doc.id, "Saved recipe");
        Recipe::try_from(doc)
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        debug!(
            recipe_id = %id,
            deleted = result.rows_affected(),
            "Deleted recipe"
        );
        Ok(())
    }

    async fn find_by_name_containing_ignore_case(
        &self,
        text: &str,
    ) -> Result<Vec<Recipe>, AppError> {
        // Both sides are folded, so LIKE's own ASCII-only folding never matters
        let pattern = format!("%{}%", escape_like(&fold_case(text)));
        self.fetch_where("name_folded LIKE ? ESCAPE '\\'", &pattern)
            .await
    }

    async fn find_by_category_ignore_case(
        &self,
        category: &str,
    ) -> Result<Vec<Recipe>, AppError> {
        self.fetch_where("category_folded = ?", &fold_case(category))
            .await
    }
}
