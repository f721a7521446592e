use crate::indicators::IndicatorError;
use serde::{Deserialize, Serialize};

pub type Timestamp = i64;

/// One trading day's closing price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: Timestamp,
    pub close: f64,
}

impl PriceBar {
    pub fn new(timestamp: Timestamp, close: f64) -> Self {
        Self { timestamp, close }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesOrder {
    Ascending,
    Descending,
}

/// Daily bars plus the direction they were delivered in.
///
/// Bars are stored oldest-first regardless of the input order, so
/// every index handed out by the aligner refers to chronological order.
#[derive(Debug, Clone)]
pub struct BarSeries {
    bars: Vec<PriceBar>,
    source_order: SeriesOrder,
}

impl BarSeries {
    /// Wrap bars whose order is declared by the caller.
    /// Fails if the timestamps contradict the declared order.
    pub fn new(mut bars: Vec<PriceBar>, order: SeriesOrder) -> Result<Self, IndicatorError> {
        if order == SeriesOrder::Descending {
            bars.reverse();
        }

        if let Some(index) = first_out_of_order(&bars) {
            // Report the position in the caller's original layout
            let index = match order {
                SeriesOrder::Ascending => index,
                SeriesOrder::Descending => bars.len() - 1 - index,
            };
            return Err(IndicatorError::UnorderedSeries { index });
        }

        Ok(Self {
            bars,
            source_order: order,
        })
    }

    /// Wrap bars and work out their order from the timestamps.
    /// A series of zero or one bar counts as ascending.
    pub fn infer(bars: Vec<PriceBar>) -> Result<Self, IndicatorError> {
        let order = match bars.as_slice() {
            [first, second, ..] if first.timestamp > second.timestamp => SeriesOrder::Descending,
            _ => SeriesOrder::Ascending,
        };
        Self::new(bars, order)
    }

    /// Bars oldest-first
    pub fn chronological(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn source_order(&self) -> SeriesOrder {
        self.source_order
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

// Index of the first bar not strictly after its predecessor
fn first_out_of_order(bars: &[PriceBar]) -> Option<usize> {
    bars.windows(2)
        .position(|pair| pair[0].timestamp >= pair[1].timestamp)
        .map(|i| i + 1)
}

/// Ordered timestamp -> value mapping.
/// Insertion order is the chronological order of computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MovingAverageSeries {
    points: Vec<(Timestamp, f64)>,
}

impl MovingAverageSeries {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, timestamp: Timestamp, value: f64) {
        self.points.push((timestamp, value));
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &(Timestamp, f64)> {
        self.points.iter()
    }

    #[cfg(test)]
    pub fn timestamps(&self) -> Vec<Timestamp> {
        self.points.iter().map(|(t, _)| *t).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

pub const DEFAULT_SMOOTHING: f64 = 2.0;

/// Longest accepted window, roughly forty years of trading days
pub const MAX_WINDOW_LENGTH: usize = 10_000;

/// Window length in trading days plus the EMA smoothing constant
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowSpec {
    length: usize,
    smoothing: f64,
}

impl WindowSpec {
    #[cfg(test)]
    pub fn new(length: usize) -> Result<Self, IndicatorError> {
        Self::with_smoothing(length, DEFAULT_SMOOTHING)
    }

    pub fn with_smoothing(length: usize, smoothing: f64) -> Result<Self, IndicatorError> {
        if length == 0 {
            return Err(IndicatorError::InvalidWindow(
                "window length must be at least 1".to_string(),
            ));
        }
        if length > MAX_WINDOW_LENGTH {
            return Err(IndicatorError::InvalidWindow(format!(
                "window length must be at most {}, got {}",
                MAX_WINDOW_LENGTH, length
            )));
        }
        if !smoothing.is_finite() || smoothing <= 0.0 {
            return Err(IndicatorError::InvalidWindow(format!(
                "smoothing constant must be positive, got {}",
                smoothing
            )));
        }
        Ok(Self { length, smoothing })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// weight = smoothing / (length + 1)
    pub fn weight(&self) -> f64 {
        self.smoothing / (self.length as f64 + 1.0)
    }
}
