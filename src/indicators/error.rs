use crate::models::Timestamp;

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorError {
    /// No bar lines up with the requested start of the analysis window
    Alignment { target: Timestamp },
    /// Fewer bars than the window needs
    InsufficientData { required: usize, available: usize },
    InvalidWindow(String),
    /// Timestamps are not strictly monotonic in the stated direction
    UnorderedSeries { index: usize },
}

impl std::fmt::Display for IndicatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndicatorError::Alignment { target } => {
                write!(f, "No bar found for target timestamp {}", target)
            }
            IndicatorError::InsufficientData {
                required,
                available,
            } => write!(
                f,
                "Insufficient data: need {} bars, have {}",
                required, available
            ),
            IndicatorError::InvalidWindow(msg) => write!(f, "Invalid window: {}", msg),
            IndicatorError::UnorderedSeries { index } => {
                write!(f, "Bar series is not ordered by timestamp at index {}", index)
            }
        }
    }
}

impl std::error::Error for IndicatorError {}
