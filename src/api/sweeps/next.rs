use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::SweepsState;
use crate::api::{bad_request, internal_error, not_found, ErrorResponse};
use crate::dataset::Point;
use crate::lookup::{self, LookupError, LookupOutcome};
use crate::storage;

#[derive(Debug, Deserialize, ToSchema)]
pub struct NextSweepRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// Caller identity; used to target reminder delivery.
    pub phone_number: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NextSweepResponse {
    /// Corridor name of the resolved segment
    pub street: String,
    /// Which side of the street the caller is parked on
    pub block_side: String,
    /// Cross-street bounds, e.g. "14th St - 15th St"
    pub limits: String,
    /// Next sweep day, e.g. "Wednesday, March 06"
    pub next_sweep_date: String,
    /// Sweeping window as [from_hour, to_hour)
    pub next_sweep_hours: [u8; 2],
    /// Calendar days until the sweep (0 = today)
    pub days_until_sweep: u32,
}

/// Resolve the caller's parking spot to its next street sweep
#[utoipa::path(
    post,
    path = "/api/sweeps/next",
    request_body = NextSweepRequest,
    responses(
        (status = 200, description = "Next sweep for the resolved curb", body = NextSweepResponse),
        (status = 400, description = "Coordinates out of range", body = ErrorResponse),
        (status = 404, description = "No sweeping schedule applies", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "sweeps"
)]
pub async fn find_next_sweep(
    State(state): State<SweepsState>,
    Json(request): Json<NextSweepRequest>,
) -> Result<Json<NextSweepResponse>, (StatusCode, Json<ErrorResponse>)> {
    if !request.latitude.is_finite()
        || !request.longitude.is_finite()
        || request.latitude.abs() > 90.0
        || request.longitude.abs() > 180.0
    {
        return Err(bad_request("latitude/longitude out of range"));
    }

    let point = Point {
        lon: request.longitude,
        lat: request.latitude,
    };

    // Calendar date in the operational timezone; the schedule resolver works
    // on already-localized dates.
    let today = Utc::now().with_timezone(&state.timezone).date_naive();

    // Clone the snapshot handle and release the lock before computing, so a
    // concurrent refresh never blocks on in-flight lookups.
    let snapshot = state.dataset.read().await.clone();

    let outcome = lookup::lookup(&snapshot, point, today).map_err(|e| match e {
        LookupError::NoSegmentsAvailable => internal_error(e),
    })?;

    let m = match outcome {
        LookupOutcome::Match(m) => m,
        LookupOutcome::NoSweepingHere { segment_id, street } => {
            tracing::debug!(segment_id = %segment_id, street = %street, "No sweeping rules for segment");
            return Err(not_found(
                "No street sweeping schedule found for this location.",
            ));
        }
        LookupOutcome::NoSweepingOnThisSide { segment_id, street, side } => {
            tracing::debug!(
                segment_id = %segment_id,
                street = %street,
                side = side.as_str(),
                "No sweeping rules for resolved side"
            );
            return Err(not_found(
                "No street sweeping schedule found for this side of the street.",
            ));
        }
        LookupOutcome::NoUpcomingSweep { segment_id, street, side } => {
            tracing::debug!(
                segment_id = %segment_id,
                street = %street,
                side = side.as_str(),
                "No sweep within horizon"
            );
            return Err(not_found("No upcoming street sweeping found."));
        }
    };

    storage::record_lookup(&state.pool, &request.phone_number, point, &m)
        .await
        .map_err(|e| internal_error(format!("Failed to record lookup: {}", e)))?;

    Ok(Json(NextSweepResponse {
        street: m.street,
        block_side: m.side.as_str().to_string(),
        limits: format!("{} - {}", m.from_cross, m.to_cross),
        next_sweep_date: m.next_sweep.date.format("%A, %B %d").to_string(),
        next_sweep_hours: [m.from_hour, m.to_hour],
        days_until_sweep: m.next_sweep.days_until,
    }))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use chrono::Weekday;
    use sqlx::sqlite::SqlitePoolOptions;
    use tokio::sync::RwLock;
    use tower::ServiceExt;

    use super::super::router;
    use crate::dataset::{
        BlockSide, DatasetStore, Point, StreetSegment, SweepDataset, SweepingRule, WeekMask,
    };

    fn p(lon: f64, lat: f64) -> Point {
        Point { lon, lat }
    }

    /// One street along lat 37.76 with a weekly NorthEast rule, so a match
    /// exists whatever "today" is.
    fn test_store() -> DatasetStore {
        let segment = StreetSegment {
            segment_id: "101".into(),
            corridor: "Valencia St".into(),
            from_cross: "14th St".into(),
            to_cross: "15th St".into(),
            active: true,
            geometry: vec![p(-122.43, 37.76), p(-122.41, 37.76)],
        };
        let mut rules = HashMap::new();
        let every_week = WeekMask::from_flags([true; 5]);
        rules.insert(
            "101".to_string(),
            vec![
                SweepingRule {
                    segment_id: "101".into(),
                    side: BlockSide::NorthEast,
                    weekday: Weekday::Mon,
                    weeks: every_week,
                    from_hour: 2,
                    to_hour: 6,
                },
                SweepingRule {
                    segment_id: "101".into(),
                    side: BlockSide::NorthEast,
                    weekday: Weekday::Thu,
                    weeks: every_week,
                    from_hour: 2,
                    to_hour: 6,
                },
            ],
        );
        Arc::new(RwLock::new(Arc::new(SweepDataset::new(
            vec![segment],
            rules,
            0,
        ))))
    }

    async fn test_router(store: DatasetStore) -> axum::Router {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        router(pool, store, chrono_tz::America::Los_Angeles)
    }

    async fn post_next(app: axum::Router, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/next")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn returns_full_result_for_matching_side() {
        let app = test_router(test_store()).await;
        // North-east of the street's east endpoint at (-122.41, 37.76), so
        // the clamped projection leaves both deltas positive.
        let (status, body) = post_next(
            app,
            serde_json::json!({
                "latitude": 37.7605,
                "longitude": -122.4095,
                "phone_number": "+14155550100"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["street"], "Valencia St");
        assert_eq!(body["block_side"], "NorthEast");
        assert_eq!(body["limits"], "14th St - 15th St");
        assert_eq!(body["next_sweep_hours"], serde_json::json!([2, 6]));
        // Mon and Thu every week: never more than 3 days out.
        let days = body["days_until_sweep"].as_u64().unwrap();
        assert!(days <= 3, "days_until_sweep = {}", days);
        assert!(body["next_sweep_date"].as_str().unwrap().contains(','));
    }

    #[tokio::test]
    async fn unscheduled_side_is_not_found() {
        let app = test_router(test_store()).await;
        // Directly south of the street's interior; rules only exist for
        // NorthEast.
        let (status, body) = post_next(
            app,
            serde_json::json!({
                "latitude": 37.7595,
                "longitude": -122.42,
                "phone_number": "+14155550100"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body["error"],
            "No street sweeping schedule found for this side of the street."
        );
    }

    #[tokio::test]
    async fn out_of_range_coordinates_are_rejected() {
        let app = test_router(test_store()).await;
        let (status, body) = post_next(
            app,
            serde_json::json!({
                "latitude": 137.76,
                "longitude": -122.42,
                "phone_number": "+14155550100"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "latitude/longitude out of range");
    }

    #[tokio::test]
    async fn empty_dataset_is_internal_error() {
        let empty: DatasetStore = Arc::new(RwLock::new(Arc::new(SweepDataset::new(
            Vec::new(),
            HashMap::new(),
            0,
        ))));
        let app = test_router(empty).await;
        let (status, _) = post_next(
            app,
            serde_json::json!({
                "latitude": 37.76,
                "longitude": -122.42,
                "phone_number": "+14155550100"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
