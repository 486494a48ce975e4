//! Provider document handling: XML decoding, normalization into strict
//! records, and fantasy-points extraction.

pub mod normalize;
pub mod points;
pub mod xml;

use crate::types::{LeagueDocument, RecapError};

/// Decode and normalize a raw scoreboard XML document in one step.
pub fn parse_scoreboard(raw: &str) -> Result<LeagueDocument, RecapError> {
    let tree = xml::parse(raw)?;
    normalize::parse_league(&tree)
}
