use crate::indicators::IndicatorError;
use crate::models::{PriceBar, Timestamp};
use chrono::NaiveDate;
use serde::Deserialize;

/// How the aligner treats a target that is not itself a bar timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Target must be a bar timestamp; anything else is an alignment error
    #[default]
    Exact,
    /// Roll forward to the first bar at or after the target
    Next,
    /// Roll back to the last bar at or before the target
    Previous,
}

impl std::str::FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Ok(MatchPolicy::Exact),
            "next" => Ok(MatchPolicy::Next),
            "previous" | "prev" => Ok(MatchPolicy::Previous),
            other => Err(format!("unknown alignment policy: {}", other)),
        }
    }
}

/// Epoch seconds of midnight UTC on `date`
pub fn midnight_utc(date: NaiveDate) -> Timestamp {
    date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp()
}

/// Find the index of the bar that opens the analysis window.
/// `bars` must be oldest-first (see `BarSeries::chronological`).
pub fn resolve_start_index(
    bars: &[PriceBar],
    target: Timestamp,
    policy: MatchPolicy,
) -> Result<usize, IndicatorError> {
    // First bar at or after the target
    let at_or_after = bars.partition_point(|bar| bar.timestamp < target);
    let exact_hit = bars
        .get(at_or_after)
        .is_some_and(|bar| bar.timestamp == target);

    let index = match policy {
        MatchPolicy::Exact => exact_hit.then_some(at_or_after),
        MatchPolicy::Next => (at_or_after < bars.len()).then_some(at_or_after),
        MatchPolicy::Previous if exact_hit => Some(at_or_after),
        MatchPolicy::Previous => at_or_after.checked_sub(1),
    };

    index.ok_or(IndicatorError::Alignment { target })
}
