//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - Member and public file item routes
//! - Authentication middleware
//! - Error to HTTP response mapping

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use fileitem_core::item::MemoryItemEngine;
use fileitem_core::lifecycle::{FileLifecycleHooks, LifecycleDispatcher};
use fileitem_core::storage::{StorageBackend, StorageConfig};
use fileitem_core::upload::UploadPipeline;
use fileitem_core::DownloadHandler;
use fileitem_shared::JwtService;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Item engine owning records and memberships.
    pub engine: Arc<MemoryItemEngine>,
    /// Upload ingestion.
    pub uploads: Arc<UploadPipeline>,
    /// File retrieval.
    pub downloads: Arc<DownloadHandler>,
    /// Storage backend name, reported by the health route.
    pub storage_name: &'static str,
}

impl AppState {
    /// Wire the storage core around `backend`.
    ///
    /// Registers the file content hooks with the engine's dispatcher, so
    /// deleting or copying a file item keeps storage in step.
    #[must_use]
    pub fn new(
        config: &StorageConfig,
        backend: Arc<dyn StorageBackend>,
        jwt_service: JwtService,
    ) -> Self {
        let file_type = config.file_type();
        let hooks = FileLifecycleHooks::new(backend.clone(), file_type, config.path_prefix.clone());
        let dispatcher = LifecycleDispatcher::new().with_hook(Arc::new(hooks));
        let engine =
            Arc::new(MemoryItemEngine::new(dispatcher).with_quota(file_type, config.quota_bytes));

        let uploads = UploadPipeline::new(config, backend.clone(), engine.clone(), engine.clone())
            .with_limiter(engine.clone());
        let downloads =
            DownloadHandler::new(backend.clone(), engine.clone(), engine.clone(), file_type);

        Self {
            jwt_service: Arc::new(jwt_service),
            engine,
            uploads: Arc::new(uploads),
            downloads: Arc::new(downloads),
            storage_name: backend.name(),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
