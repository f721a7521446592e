use crate::indicators::IndicatorError;
use crate::models::{MovingAverageSeries, PriceBar, WindowSpec};

// Windowing convention, shared by every window length:
// the seed window is the `length` bars immediately before `start_index`,
// and the EMA recurrence starts at `start_index`.

/// Simple Moving Average used as the EMA seed
/// Mean close of bars[start_index - length .. start_index]
pub fn seed_sma(
    bars: &[PriceBar],
    length: usize,
    start_index: usize,
) -> Result<f64, IndicatorError> {
    if length == 0 {
        return Err(IndicatorError::InvalidWindow(
            "window length must be at least 1".to_string(),
        ));
    }

    // Bars available to look back over from start_index
    let available = start_index.min(bars.len());
    if start_index > bars.len() || available < length {
        return Err(IndicatorError::InsufficientData {
            required: length,
            available,
        });
    }

    let window = &bars[start_index - length..start_index];
    let sum: f64 = window.iter().map(|bar| bar.close).sum();
    Ok(sum / length as f64)
}

/// Run the EMA recurrence from `start_index` to the end of `bars`
/// EMA(t) = (close(t) - EMA(t-1)) * weight + EMA(t-1), EMA(start_index - 1) = seed
pub fn compute_ema(
    seed: f64,
    window: &WindowSpec,
    bars: &[PriceBar],
    start_index: usize,
) -> Result<MovingAverageSeries, IndicatorError> {
    if start_index > bars.len() {
        return Err(IndicatorError::InsufficientData {
            required: start_index,
            available: bars.len(),
        });
    }

    let weight = window.weight();
    let mut prev_ema = seed;
    let mut series = MovingAverageSeries::with_capacity(bars.len() - start_index);

    for bar in &bars[start_index..] {
        let ema = (bar.close - prev_ema) * weight + prev_ema;
        series.insert(bar.timestamp, ema);
        prev_ema = ema;
    }

    Ok(series)
}

/// Exponential Moving Average (EMA)
/// Seeds from the SMA of the window before the start index,
/// then weights recent closes more heavily
pub struct EMA {
    window: WindowSpec,
}

impl EMA {
    pub fn new(window: WindowSpec) -> Self {
        Self { window }
    }

    /// Seed and run the recurrence over chronological bars.
    /// Either the whole series is produced or an error is returned.
    pub fn calculate(
        &self,
        bars: &[PriceBar],
        start_index: usize,
    ) -> Result<MovingAverageSeries, IndicatorError> {
        let seed = seed_sma(bars, self.window.length(), start_index)?;
        compute_ema(seed, &self.window, bars, start_index)
    }
}
