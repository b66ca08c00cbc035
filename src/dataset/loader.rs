//! CSV loader for the street sweeping schedule export.
//!
//! Each source row carries one sweeping rule together with its segment's
//! geometry, so a single pass produces both the segment index and the rule
//! table. Rows that fail to parse are skipped and counted, never fatal.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::Weekday;
use tracing::{info, warn};

use super::wkt::parse_linestring;
use super::{BlockSide, DatasetError, StreetSegment, SweepDataset, SweepingRule, WeekMask};

pub fn load_dataset(path: &Path) -> Result<SweepDataset, DatasetError> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::Reader::from_reader(file);
    let headers = rdr.headers()?.clone();

    let required = |name: &'static str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(DatasetError::MissingColumn(name))
    };

    let idx_cnn = required("CNN")?;
    let idx_corridor = required("Corridor")?;
    let idx_limits = required("Limits")?;
    let idx_side = required("BlockSide")?;
    let idx_weekday = required("WeekDay")?;
    let idx_from_hour = required("FromHour")?;
    let idx_to_hour = required("ToHour")?;
    let idx_weeks = [
        required("Week1")?,
        required("Week2")?,
        required("Week3")?,
        required("Week4")?,
        required("Week5")?,
    ];
    let idx_line = required("Line")?;
    let idx_active = headers.iter().position(|h| h == "Active");

    let mut segments: Vec<StreetSegment> = Vec::new();
    let mut seen_segments: HashSet<String> = HashSet::new();
    let mut rules: HashMap<String, Vec<SweepingRule>> = HashMap::new();
    let mut skipped = 0usize;

    for result in rdr.records() {
        let Ok(record) = result else {
            skipped += 1;
            continue;
        };

        let segment_id = record.get(idx_cnn).unwrap_or("").trim().to_string();
        if segment_id.is_empty() {
            skipped += 1;
            continue;
        }

        let Some(side) = record.get(idx_side).and_then(|s| BlockSide::from_source(s)) else {
            warn!(segment_id = %segment_id, "Skipping row with unknown block side");
            skipped += 1;
            continue;
        };

        let Some(weekday) = record.get(idx_weekday).and_then(weekday_from_source) else {
            warn!(segment_id = %segment_id, "Skipping row with unknown weekday");
            skipped += 1;
            continue;
        };

        let from_hour = record.get(idx_from_hour).and_then(parse_hour);
        let to_hour = record.get(idx_to_hour).and_then(parse_hour);
        let (Some(from_hour), Some(to_hour)) = (from_hour, to_hour) else {
            warn!(segment_id = %segment_id, "Skipping row with unparseable hour window");
            skipped += 1;
            continue;
        };

        let weeks = WeekMask::from_flags(idx_weeks.map(|i| parse_flag(record.get(i))));

        // First occurrence of a segment id carries its geometry; later rows
        // for the same segment only contribute rules.
        if !seen_segments.contains(&segment_id) {
            let Some(geometry) = record.get(idx_line).and_then(parse_linestring) else {
                warn!(segment_id = %segment_id, "Skipping row with malformed geometry");
                skipped += 1;
                continue;
            };

            let limits = record.get(idx_limits).unwrap_or("");
            let (from_cross, to_cross) = match limits.split_once('-') {
                Some((from, to)) => (from.trim().to_string(), to.trim().to_string()),
                None => (limits.trim().to_string(), String::new()),
            };

            let active = idx_active
                .and_then(|i| record.get(i))
                .map(parse_active)
                .unwrap_or(true);

            seen_segments.insert(segment_id.clone());
            segments.push(StreetSegment {
                segment_id: segment_id.clone(),
                corridor: record.get(idx_corridor).unwrap_or("").trim().to_string(),
                from_cross,
                to_cross,
                active,
                geometry,
            });
        }

        let rule = SweepingRule {
            segment_id,
            side,
            weekday,
            weeks,
            from_hour,
            to_hour,
        };
        if rule.weeks.is_empty() {
            warn!(segment_id = %rule.segment_id, "Rule has no week-of-month flags set and will never fire");
        }
        rules.entry(rule.segment_id.clone()).or_default().push(rule);
    }

    if skipped > 0 {
        warn!(skipped, "Skipped unparseable street sweeping rows");
    }
    let rule_count: usize = rules.values().map(Vec::len).sum();
    info!(
        segments = segments.len(),
        rules = rule_count,
        "Parsed street sweeping dataset"
    );

    Ok(SweepDataset::new(segments, rules, skipped))
}

/// Parse a weekday label as it appears in the schedule export. The source
/// uses abbreviated names with "Tues"/"Thurs" spellings.
fn weekday_from_source(s: &str) -> Option<Weekday> {
    match s.trim() {
        "Mon" | "Monday" => Some(Weekday::Mon),
        "Tue" | "Tues" | "Tuesday" => Some(Weekday::Tue),
        "Wed" | "Wednesday" => Some(Weekday::Wed),
        "Thu" | "Thur" | "Thurs" | "Thursday" => Some(Weekday::Thu),
        "Fri" | "Friday" => Some(Weekday::Fri),
        "Sat" | "Saturday" => Some(Weekday::Sat),
        "Sun" | "Sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Parse an hour-of-day column (0..=24; 24 closes a window at midnight).
fn parse_hour(s: &str) -> Option<u8> {
    let hour: u8 = s.trim().parse().ok()?;
    if hour > 24 {
        return None;
    }
    Some(hour)
}

fn parse_flag(s: Option<&str>) -> bool {
    s.and_then(|v| v.trim().parse::<i32>().ok()) == Some(1)
}

/// The optional `Active` column; absent or empty means active.
fn parse_active(s: &str) -> bool {
    !matches!(s.trim(), "0" | "false" | "False" | "N" | "no" | "No")
}
