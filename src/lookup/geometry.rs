//! Nearest-segment resolution.
//!
//! Distances are planar Euclidean in degree space, matching the source
//! dataset's projection. That is fine for ranking candidates within a city
//! but is not a metric distance; nothing here converts to meters.

use crate::dataset::{Point, StreetSegment, SweepDataset};

use super::LookupError;

/// A resolved nearest segment: the segment, the closest point on its
/// polyline, and the planar distance to it.
#[derive(Debug, Clone, Copy)]
pub struct NearestSegment<'a> {
    pub segment: &'a StreetSegment,
    pub projection: Point,
    pub distance: f64,
}

/// Find the active segment closest to `point`.
///
/// Segments are scanned in snapshot order and compared with a strict `<`,
/// so the first segment encountered wins distance ties; identical inputs
/// always resolve to the same segment. All distance state is local to this
/// call, the snapshot is never written to.
pub fn nearest_segment<'a>(
    dataset: &'a SweepDataset,
    point: Point,
) -> Result<NearestSegment<'a>, LookupError> {
    let mut best: Option<NearestSegment<'a>> = None;

    for segment in dataset.segments.iter().filter(|s| s.active) {
        let (projection, distance) = project_onto_polyline(&segment.geometry, point);
        let closer = match &best {
            None => true,
            Some(b) => distance < b.distance,
        };
        if closer {
            best = Some(NearestSegment {
                segment,
                projection,
                distance,
            });
        }
    }

    best.ok_or(LookupError::NoSegmentsAvailable)
}

/// Closest point on a polyline to `point`, with its distance. Checks every
/// leg's clamped projection and keeps the global minimum.
pub fn project_onto_polyline(vertices: &[Point], point: Point) -> (Point, f64) {
    let Some(&first) = vertices.first() else {
        return (point, f64::INFINITY);
    };

    let mut best_point = first;
    let mut best_dist = distance(first, point);

    for leg in vertices.windows(2) {
        let candidate = project_onto_leg(leg[0], leg[1], point);
        let d = distance(candidate, point);
        if d < best_dist {
            best_dist = d;
            best_point = candidate;
        }
    }

    (best_point, best_dist)
}

/// Scalar projection of `p` onto the leg `a`->`b`, clamped to the endpoints.
fn project_onto_leg(a: Point, b: Point, p: Point) -> Point {
    let dx = b.lon - a.lon;
    let dy = b.lat - a.lat;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return a;
    }
    let t = (((p.lon - a.lon) * dx + (p.lat - a.lat) * dy) / len_sq).clamp(0.0, 1.0);
    Point {
        lon: a.lon + t * dx,
        lat: a.lat + t * dy,
    }
}

fn distance(a: Point, b: Point) -> f64 {
    let dx = a.lon - b.lon;
    let dy = a.lat - b.lat;
    (dx * dx + dy * dy).sqrt()
}
