//! The lookup core: point -> nearest segment -> block side -> next sweep.
//!
//! Everything in this module is pure computation over an immutable dataset
//! snapshot. Handlers own persistence and rendering; the sync manager owns
//! snapshot refresh. Expected "no result" outcomes are values on
//! [`LookupOutcome`], not errors.

pub mod geometry;
pub mod schedule;
pub mod side;

use chrono::NaiveDate;
use thiserror::Error;

use crate::dataset::{BlockSide, Point, SweepDataset};

use geometry::nearest_segment;
use schedule::{next_occurrence, NextSweep, DEFAULT_HORIZON_DAYS};

#[derive(Debug, Error)]
pub enum LookupError {
    /// The snapshot holds no active segments. A configuration problem, not a
    /// per-request condition.
    #[error("no street segments available")]
    NoSegmentsAvailable,
}

/// A fully resolved lookup, ready to render and persist.
#[derive(Debug, Clone)]
pub struct SweepMatch {
    pub segment_id: String,
    pub street: String,
    pub from_cross: String,
    pub to_cross: String,
    pub side: BlockSide,
    pub next_sweep: NextSweep,
    pub from_hour: u8,
    pub to_hour: u8,
}

/// Outcome of a lookup. The not-found variants are expected results the
/// transport layer maps to 404-class responses; each carries the context the
/// resolution had when it stopped.
#[derive(Debug, Clone)]
pub enum LookupOutcome {
    Match(SweepMatch),
    /// Segment resolved, but no rules exist for it at all.
    NoSweepingHere { segment_id: String, street: String },
    /// Rules exist for the segment, but none for the resolved side.
    NoSweepingOnThisSide {
        segment_id: String,
        street: String,
        side: BlockSide,
    },
    /// Rules exist for the side, but none fire within the horizon.
    NoUpcomingSweep {
        segment_id: String,
        street: String,
        side: BlockSide,
    },
}

/// Resolve a point to its next street sweep.
///
/// Pure: reads the snapshot, writes nothing, does no I/O. `today` is a date
/// in the operational timezone (see [`schedule::next_occurrence`]).
pub fn lookup(
    dataset: &SweepDataset,
    point: Point,
    today: NaiveDate,
) -> Result<LookupOutcome, LookupError> {
    let nearest = nearest_segment(dataset, point)?;
    let segment = nearest.segment;
    let side = side::classify(point, nearest.projection);
    tracing::debug!(
        segment_id = %segment.segment_id,
        distance = nearest.distance,
        side = side.as_str(),
        "Resolved nearest segment"
    );

    let rules = dataset.rules_for(&segment.segment_id);
    if rules.is_empty() {
        return Ok(LookupOutcome::NoSweepingHere {
            segment_id: segment.segment_id.clone(),
            street: segment.corridor.clone(),
        });
    }

    let side_rules: Vec<_> = rules.iter().filter(|r| r.side == side).collect();
    if side_rules.is_empty() {
        return Ok(LookupOutcome::NoSweepingOnThisSide {
            segment_id: segment.segment_id.clone(),
            street: segment.corridor.clone(),
            side,
        });
    }

    // Several rules can apply to one side (different weekday/week
    // combinations); resolve each and keep the soonest.
    let mut soonest: Option<(NextSweep, &crate::dataset::SweepingRule)> = None;
    for rule in side_rules {
        if let Some(next) = next_occurrence(rule, today, DEFAULT_HORIZON_DAYS) {
            let sooner = match &soonest {
                None => true,
                Some((best, _)) => next.days_until < best.days_until,
            };
            if sooner {
                soonest = Some((next, rule));
            }
        }
    }

    match soonest {
        Some((next_sweep, rule)) => Ok(LookupOutcome::Match(SweepMatch {
            segment_id: segment.segment_id.clone(),
            street: segment.corridor.clone(),
            from_cross: segment.from_cross.clone(),
            to_cross: segment.to_cross.clone(),
            side,
            next_sweep,
            from_hour: rule.from_hour,
            to_hour: rule.to_hour,
        })),
        None => Ok(LookupOutcome::NoUpcomingSweep {
            segment_id: segment.segment_id.clone(),
            street: segment.corridor.clone(),
            side,
        }),
    }
}
