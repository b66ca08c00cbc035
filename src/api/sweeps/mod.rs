mod next;

pub use next::*;

use axum::{routing::post, Router};
use sqlx::SqlitePool;

use crate::dataset::DatasetStore;

#[derive(Clone)]
pub struct SweepsState {
    pub pool: SqlitePool,
    pub dataset: DatasetStore,
    pub timezone: chrono_tz::Tz,
}

pub fn router(pool: SqlitePool, dataset: DatasetStore, timezone: chrono_tz::Tz) -> Router {
    let state = SweepsState {
        pool,
        dataset,
        timezone,
    };
    Router::new()
        .route("/next", post(find_next_sweep))
        .with_state(state)
}
