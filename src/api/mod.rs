pub mod error;
pub mod health;
pub mod sweeps;

pub use error::{bad_request, internal_error, not_found, ErrorResponse};

use axum::Router;
use sqlx::SqlitePool;

use crate::dataset::DatasetStore;

pub fn router(pool: SqlitePool, dataset: DatasetStore, timezone: chrono_tz::Tz) -> Router {
    Router::new()
        .nest("/sweeps", sweeps::router(pool, dataset.clone(), timezone))
        .nest("/health", health::router(dataset))
}
