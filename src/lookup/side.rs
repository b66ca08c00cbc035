//! Block side classification.

use crate::dataset::{BlockSide, Point};

/// Classify which side of its street a point lies on, by comparing the point
/// against its projection component-wise.
///
/// The comparison is exact floating-point sign inspection, matching the
/// upstream dataset's side labels. Near-zero deltas from floating error can
/// classify as a cardinal (e.g. `North`) where a diagonal was intended; no
/// epsilon snapping is applied.
pub fn classify(point: Point, projection: Point) -> BlockSide {
    let dlat = point.lat - projection.lat;
    let dlon = point.lon - projection.lon;

    if dlat > 0.0 {
        if dlon > 0.0 {
            BlockSide::NorthEast
        } else if dlon < 0.0 {
            BlockSide::NorthWest
        } else {
            BlockSide::North
        }
    } else if dlat < 0.0 {
        if dlon > 0.0 {
            BlockSide::SouthEast
        } else if dlon < 0.0 {
            BlockSide::SouthWest
        } else {
            BlockSide::South
        }
    } else if dlon > 0.0 {
        BlockSide::East
    } else if dlon < 0.0 {
        BlockSide::West
    } else {
        BlockSide::OnTheLine
    }
}
