pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod import;
pub mod models;
pub mod query;
pub mod routes;
pub mod validate;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: DatabaseConnection,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/upload_movies_data/",
            // The importer streams the file and enforces its own size cap.
            post(routes::upload_movies).layer(DefaultBodyLimit::disable()),
        )
        .route("/movies/", get(routes::list_movies))
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
