//! Recipe form parsing
//!
//! Turns the multipart body of `POST /recipes` into a `Recipe` plus an
//! optional image upload.

use crate::error::AppError;
use crate::recipes::Recipe;
use crate::services::{ImageStore, UploadedImage};
use axum::extract::Multipart;
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

/// A submitted recipe form
#[derive(Debug)]
pub struct RecipeForm {
    /// Recipe fields; `created_at` is `None` when the form omitted it
    pub recipe: Recipe,
    /// The `image` part, if one was sent
    pub image: Option<UploadedImage>,
}

impl RecipeForm {
    /// Read every part of a multipart body
    ///
    /// Blank text fields count as absent. `ingredients` and `steps` may be
    /// repeated, and a single value holding several lines contributes one
    /// entry per non-blank line.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut recipe = Recipe {
            created_at: None,
            ..Recipe::new()
        };
        let mut image = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::InvalidForm(format!("Failed to read multipart field: {}", e)))?
        {
            let field_name = field.name().unwrap_or("").to_string();

            if field_name == "image" {
                let original_name = field.file_name().unwrap_or("").to_string();
                let data = field.bytes().await.map_err(|e| {
                    AppError::InvalidForm(format!("Failed to read image data: {}", e))
                })?;
                image = Some(UploadedImage::new(original_name, data));
                continue;
            }

            let value = field.text().await.map_err(|e| {
                AppError::InvalidForm(format!("Failed to read {} field: {}", field_name, e))
            })?;

            match field_name.as_str() {
                "id" => recipe.id = non_blank(&value).map(str::to_string),
                "name" => recipe.name = value,
                "description" => recipe.description = value,
                "category" => recipe.category = value,
                "ingredients" => recipe.ingredients.extend(split_lines(&value)),
                "steps" => recipe.steps.extend(split_lines(&value)),
                "prepTimeMinutes" => recipe.prep_time_minutes = parse_minutes(&field_name, &value)?,
                "cookTimeMinutes" => recipe.cook_time_minutes = parse_minutes(&field_name, &value)?,
                "createdAt" => recipe.created_at = parse_timestamp(&value)?,
                "imageFilename" => recipe.image_filename = parse_existing_image(&value)?,
                _ => warn!("Unknown multipart field: {}", field_name),
            }
        }

        Ok(Self { recipe, image })
    }
}

/// `Some(trimmed)` unless the value is empty or whitespace
pub fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn split_lines(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .lines()
        .filter_map(non_blank)
        .map(str::to_string)
}

fn parse_minutes(field_name: &str, value: &str) -> Result<u32, AppError> {
    match non_blank(value) {
        None => Ok(0),
        Some(v) => v.parse().map_err(|_| {
            AppError::InvalidForm(format!(
                "{} must be a non-negative whole number, got {:?}",
                field_name, value
            ))
        }),
    }
}

/// RFC 3339, or an HTML `datetime-local` value taken as UTC
fn parse_timestamp(value: &str) -> Result<Option<DateTime<Utc>>, AppError> {
    let Some(v) = non_blank(value) else {
        return Ok(None);
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(v) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(v, format).ok())
        .map(|naive| Some(naive.and_utc()))
        .ok_or_else(|| AppError::InvalidForm(format!("createdAt is not a timestamp: {:?}", v)))
}

/// A previously stored image name must already be a bare file name
fn parse_existing_image(value: &str) -> Result<Option<String>, AppError> {
    let Some(v) = non_blank(value) else {
        return Ok(None);
    };

    if ImageStore::sanitize_filename(v)? != v {
        return Err(AppError::InvalidFilename(format!(
            "imageFilename must be a bare file name, got {:?}",
            v
        )));
    }
    Ok(Some(v.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank("  soup "), Some("soup"));
        assert_eq!(non_blank(""), None);
        assert_eq!(non_blank(" \t\n"), None);
    }

    #[test]
    fn test_split_lines_skips_blank_lines() {
        let lines: Vec<String> = split_lines("200g spaghetti\r\n\r\n 1 onion \n2 cloves garlic").collect();
        assert_eq!(lines, vec!["200g spaghetti", "1 onion", "2 cloves garlic"]);
    }

    #[test]
    fn test_parse_minutes() {
        assert_eq!(parse_minutes("prepTimeMinutes", "").unwrap(), 0);
        assert_eq!(parse_minutes("prepTimeMinutes", " 15 ").unwrap(), 15);
        assert!(matches!(
            parse_minutes("prepTimeMinutes", "-3"),
            Err(AppError::InvalidForm(_))
        ));
        assert!(matches!(
            parse_minutes("cookTimeMinutes", "ten"),
            Err(AppError::InvalidForm(_))
        ));
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("").unwrap(), None);
        assert_eq!(
            parse_timestamp("2024-03-01T12:30:00Z").unwrap(),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp("2024-03-01T14:30:00+02:00").unwrap(),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp("2024-03-01T12:30").unwrap(),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap())
        );
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_parse_existing_image() {
        assert_eq!(parse_existing_image("").unwrap(), None);
        assert_eq!(
            parse_existing_image("1700000000000_cake.jpg").unwrap(),
            Some("1700000000000_cake.jpg".to_string())
        );
        assert!(matches!(
            parse_existing_image("../secret.jpg"),
            Err(AppError::InvalidFilename(_))
        ));
    }
}
