//! Recipe Manager Backend Library
//!
//! This library exposes modules for testing and external use.
//! The main binary is in `src/main.rs`.

pub mod api;
pub mod config;
pub mod error;
/// Recipe entity, stored document shape and repository
pub mod recipes;
pub mod services;
