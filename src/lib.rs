//! filehub - A multi-user file storage and sharing backend
//!
//! This crate provides user accounts with role-based access control and
//! per-user file management:
//! - Stateless bearer-token authentication (HS256, argon2 password hashes)
//! - redb embedded database for user and file metadata (ACID, crash-safe)
//! - Swappable byte store for uploaded content (local filesystem)
//! - REST API with multipart upload, share links, and per-user analytics

pub mod api;
pub mod auth;
pub mod config;
pub mod file_store;
pub mod services;
pub mod storage;

use std::sync::Arc;

use config::Config;
use storage::Database;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub files: Arc<dyn file_store::FileStore>,
}
