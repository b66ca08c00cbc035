//! Minimal WKT parsing for the dataset's LINESTRING geometry column.

use super::Point;

/// Parse a WKT `LINESTRING (lon lat, lon lat, ...)` into its vertices.
///
/// Returns `None` for anything that is not a linestring with at least two
/// finite coordinate pairs; the loader treats that as a malformed row and
/// skips it.
pub fn parse_linestring(wkt: &str) -> Option<Vec<Point>> {
    let body = strip_keyword(wkt.trim())?;
    let inner = body.strip_prefix('(')?.strip_suffix(')')?;

    let mut points = Vec::new();
    for pair in inner.split(',') {
        let mut coords = pair.split_whitespace();
        let lon: f64 = coords.next()?.parse().ok()?;
        let lat: f64 = coords.next()?.parse().ok()?;
        if coords.next().is_some() {
            return None;
        }
        if !lon.is_finite() || !lat.is_finite() {
            return None;
        }
        points.push(Point { lon, lat });
    }

    if points.len() < 2 {
        return None;
    }
    Some(points)
}

/// Strip a case-insensitive `LINESTRING` keyword, leaving the coordinate body.
fn strip_keyword(s: &str) -> Option<&str> {
    const KEYWORD: &str = "LINESTRING";
    let prefix = s.get(..KEYWORD.len())?;
    if !prefix.eq_ignore_ascii_case(KEYWORD) {
        return None;
    }
    Some(s[KEYWORD.len()..].trim_start())
}
