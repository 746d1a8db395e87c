//! Shared types, errors, and configuration for Fileitem.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error types
//! - Configuration management
//! - JWT claims and token handling

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;

#[cfg(test)]
mod config_tests;

pub use auth::Claims;
pub use config::{AppConfig, JwtSettings, ServerConfig, StorageBackendSettings, StorageSettings};
pub use error::AppError;
pub use jwt::{JwtConfig, JwtError, JwtService};
