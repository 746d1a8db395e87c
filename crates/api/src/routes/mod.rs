//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth_middleware};

mod files;
pub mod health;
pub mod items;
pub mod public;

/// Creates the API router: health and public routes open, member routes
/// behind the auth middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(items::routes())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(public::routes())
        .merge(protected_routes)
}
