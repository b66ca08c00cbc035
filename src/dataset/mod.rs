//! In-memory street sweeping dataset.
//!
//! This module holds:
//! - The segment/rule data model loaded from the schedule CSV
//! - The immutable dataset snapshot served to lookups
//! - The shared store the sync manager swaps new snapshots into
//!
//! A snapshot is never mutated after load. Refreshing builds a complete new
//! `SweepDataset` and replaces the inner `Arc`; lookups that already cloned
//! the previous `Arc` keep computing against it.

mod error;
mod loader;
mod wkt;

pub use error::DatasetError;
pub use loader::load_dataset;
pub use wkt::parse_linestring;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Weekday;
use tokio::sync::RwLock;

/// A WGS84 coordinate pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub lon: f64,
    pub lat: f64,
}

/// Directional classification of a point relative to its nearest segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockSide {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
    OnTheLine,
}

impl BlockSide {
    /// The spelling used by the source dataset and the API surface.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockSide::North => "North",
            BlockSide::South => "South",
            BlockSide::East => "East",
            BlockSide::West => "West",
            BlockSide::NorthEast => "NorthEast",
            BlockSide::NorthWest => "NorthWest",
            BlockSide::SouthEast => "SouthEast",
            BlockSide::SouthWest => "SouthWest",
            BlockSide::OnTheLine => "On the Line",
        }
    }

    /// Parse a side label as it appears in the schedule CSV.
    pub fn from_source(s: &str) -> Option<Self> {
        match s.trim() {
            "North" => Some(BlockSide::North),
            "South" => Some(BlockSide::South),
            "East" => Some(BlockSide::East),
            "West" => Some(BlockSide::West),
            "NorthEast" => Some(BlockSide::NorthEast),
            "NorthWest" => Some(BlockSide::NorthWest),
            "SouthEast" => Some(BlockSide::SouthEast),
            "SouthWest" => Some(BlockSide::SouthWest),
            "On the Line" => Some(BlockSide::OnTheLine),
            _ => None,
        }
    }
}

/// Which numbered occurrences (1st..5th) of a weekday within a month a rule
/// fires on. Bit 0 is the 1st occurrence, bit 4 the 5th.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekMask(u8);

impl WeekMask {
    pub fn from_flags(flags: [bool; 5]) -> Self {
        let mut bits = 0u8;
        for (i, set) in flags.iter().enumerate() {
            if *set {
                bits |= 1 << i;
            }
        }
        WeekMask(bits)
    }

    /// Whether the mask covers the given 1-based occurrence (1..=5).
    pub fn contains(&self, occurrence: u32) -> bool {
        (1..=5).contains(&occurrence) && self.0 & (1 << (occurrence - 1)) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// A street segment: stable identifier, display attributes, and polyline
/// geometry. The loader guarantees at least two vertices.
#[derive(Debug, Clone)]
pub struct StreetSegment {
    pub segment_id: String,
    pub corridor: String,
    pub from_cross: String,
    pub to_cross: String,
    pub active: bool,
    pub geometry: Vec<Point>,
}

/// One sweeping schedule entry for a segment side.
#[derive(Debug, Clone)]
pub struct SweepingRule {
    pub segment_id: String,
    pub side: BlockSide,
    pub weekday: Weekday,
    pub weeks: WeekMask,
    /// Sweeping window `[from_hour, to_hour)` in local hours.
    pub from_hour: u8,
    pub to_hour: u8,
}

/// An immutable snapshot of the loaded dataset.
///
/// Segment order is load order; the nearest-segment resolver relies on it as
/// the deterministic tie-break order for equidistant segments.
#[derive(Debug)]
pub struct SweepDataset {
    pub segments: Vec<StreetSegment>,
    rules: HashMap<String, Vec<SweepingRule>>,
    /// Source rows dropped during load (malformed geometry or fields).
    pub skipped_rows: usize,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

impl SweepDataset {
    pub fn new(
        segments: Vec<StreetSegment>,
        rules: HashMap<String, Vec<SweepingRule>>,
        skipped_rows: usize,
    ) -> Self {
        Self {
            segments,
            rules,
            skipped_rows,
            loaded_at: chrono::Utc::now(),
        }
    }

    /// All rules for a segment, across every side. Empty means "no schedule
    /// here", which is a valid outcome rather than an error.
    pub fn rules_for(&self, segment_id: &str) -> &[SweepingRule] {
        self.rules
            .get(segment_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }
}

/// Shared handle to the current snapshot. Readers clone the inner `Arc` and
/// release the lock before computing; the sync manager swaps in a fresh
/// snapshot under a short write lock.
pub type DatasetStore = Arc<RwLock<Arc<SweepDataset>>>;
