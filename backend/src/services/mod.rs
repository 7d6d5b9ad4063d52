//! Service layer for business logic
//!
//! This module contains service abstractions that separate business logic
//! from HTTP handlers, making the code more modular and testable.

pub mod images;
pub mod recipes;

pub use images::{ImageStore, UploadSource, UploadedImage};
pub use recipes::RecipeService;
