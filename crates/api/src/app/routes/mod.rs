use axum::Router;

pub mod industries;
pub mod organizations;
pub mod registry;
pub mod system;

/// Router for all actor-scoped endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/module-registry", registry::router())
        .nest("/industries", industries::router())
        .nest("/organizations", organizations::router())
}
