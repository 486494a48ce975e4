//! Fantasy-points extraction from a player node.
//!
//! The points container (`player_points`) shows up in three encodings:
//!
//! 1. a bare scalar: `<player_points>14.2</player_points>`
//! 2. a child element: `<player_points><week>5</week><total>14.2</total></player_points>`
//! 3. an attribute: `<player_points total="14.2"/>`
//!
//! The container also carries `week` (the coverage value), which is numeric
//! and easy to mistake for a score. It is never read as points.

use serde_json::Value;

use super::normalize::{scalar_f64, scalar_text};
use super::xml::{ATTRS_KEY, TEXT_KEY};

/// Name of the points container on a player node.
pub const POINTS_KEY: &str = "player_points";
/// Field holding the point value inside the container.
const TOTAL_KEY: &str = "total";
/// Coverage value inside the container: the week number, not a score.
const COVERAGE_VALUE_KEY: &str = "week";

/// Extract a player's fantasy points, or `None` when there is no usable
/// scoring data. Unparseable values are `None`, never zero.
pub fn extract(player: &Value) -> Option<f64> {
    extract_from_container(player.get(POINTS_KEY)?)
}

/// Extract points from the container node itself.
pub fn extract_from_container(container: &Value) -> Option<f64> {
    match container {
        // (1) scalar container
        Value::String(_) | Value::Number(_) => scalar_f64(container),
        Value::Object(map) => {
            // (2) direct `total`
            if let Some(total) = map.get(TOTAL_KEY) {
                return scalar_f64(total);
            }
            // (3) `total` one level down under attributes
            if let Some(total) = map.get(ATTRS_KEY).and_then(|attrs| attrs.get(TOTAL_KEY)) {
                return scalar_f64(total);
            }
            // Text next to attributes is only a score if it is not the
            // coverage value repeated as content.
            let coverage = map.get(COVERAGE_VALUE_KEY).and_then(scalar_text);
            match (map.get(TEXT_KEY), coverage) {
                (Some(text), Some(week)) if scalar_text(text).as_deref() == Some(week.as_str()) => None,
                (Some(text), _) => scalar_f64(text),
                (None, _) => None,
            }
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
