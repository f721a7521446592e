// Trend indicators over daily bars
// Aligns the analysis window, then seeds and runs the EMA recurrence

pub mod alignment;
pub mod error;
pub mod moving_averages;

pub use alignment::{midnight_utc, resolve_start_index, MatchPolicy};
pub use error::IndicatorError;
pub use moving_averages::EMA;
