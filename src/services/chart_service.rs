use crate::api_client::ApiError;
use crate::calendar::CalendarError;
use crate::indicators::{midnight_utc, resolve_start_index, IndicatorError, MatchPolicy, EMA};
use crate::models::{BarSeries, MovingAverageSeries, PriceBar, Timestamp, WindowSpec};
use crate::state::AppState;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug)]
pub enum ChartError {
    InvalidRequest(String),
    Indicator(IndicatorError),
    Calendar(CalendarError),
    Upstream(ApiError),
}

impl std::fmt::Display for ChartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ChartError::Indicator(e) => write!(f, "{}", e),
            ChartError::Calendar(e) => write!(f, "{}", e),
            ChartError::Upstream(e) => write!(f, "Market data unavailable: {}", e),
        }
    }
}

impl std::error::Error for ChartError {}

impl From<IndicatorError> for ChartError {
    fn from(err: IndicatorError) -> Self {
        ChartError::Indicator(err)
    }
}

impl From<CalendarError> for ChartError {
    fn from(err: CalendarError) -> Self {
        ChartError::Calendar(err)
    }
}

impl From<ApiError> for ChartError {
    fn from(err: ApiError) -> Self {
        ChartError::Upstream(err)
    }
}

/// One EMA line on the chart
#[derive(Debug, Clone, Serialize)]
pub struct TrendLine {
    pub window: WindowSpec,
    pub series: MovingAverageSeries,
}

/// Closing prices and EMA lines over the same run of trading days
#[derive(Debug, Clone, Serialize)]
pub struct TrendChart {
    pub symbol: String,
    pub start_index: usize,
    pub closes: Vec<PriceBar>,
    pub lines: Vec<TrendLine>,
}

impl TrendChart {
    pub fn timestamps(&self) -> Vec<Timestamp> {
        self.closes.iter().map(|bar| bar.timestamp).collect()
    }
}

/// Align the series on `target` and compute one EMA per window.
/// Every window seeds from its own SMA over the bars before the start index.
pub fn build_trend_chart(
    symbol: &str,
    series: &BarSeries,
    target: Timestamp,
    windows: &[WindowSpec],
    policy: MatchPolicy,
) -> Result<TrendChart, IndicatorError> {
    if windows.is_empty() {
        return Err(IndicatorError::InvalidWindow(
            "at least one window is required".to_string(),
        ));
    }

    let bars = series.chronological();
    let start_index = resolve_start_index(bars, target, policy)?;
    debug!(
        "{}: window starts at bar {} of {} ({:?} input)",
        symbol,
        start_index,
        bars.len(),
        series.source_order()
    );

    let lines = windows
        .iter()
        .map(|window| {
            EMA::new(*window)
                .calculate(bars, start_index)
                .map(|series| TrendLine {
                    window: *window,
                    series,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug_assert!(lines
        .iter()
        .all(|line| line.series.len() == bars.len() - start_index));

    Ok(TrendChart {
        symbol: symbol.to_string(),
        start_index,
        closes: bars[start_index..].to_vec(),
        lines,
    })
}

/// Fetch enough history for the longest window plus the lookback period,
/// then build the chart ending on `today`
pub async fn load_trend_chart(
    state: &AppState,
    symbol: &str,
    windows: &[WindowSpec],
    policy: MatchPolicy,
    today: NaiveDate,
) -> Result<TrendChart, ChartError> {
    let longest = windows
        .iter()
        .map(WindowSpec::length)
        .max()
        .ok_or_else(|| {
            ChartError::InvalidRequest("at least one window is required".to_string())
        })?;

    let start_date = state
        .calendar
        .lookback_start(today, state.config.lookback_months)?;
    let trading_days = state.calendar.trading_days(start_date, today).len();
    let limit = longest.checked_add(trading_days).ok_or_else(|| {
        ChartError::InvalidRequest(format!(
            "window of {} bars plus {} trading days is too long",
            longest, trading_days
        ))
    })?;

    info!(
        "Loading {} bars for {} ({} trading days since {}, longest window {})",
        limit, symbol, trading_days, start_date, longest
    );

    let bars = state.client.fetch_daily_bars(symbol, limit, today).await?;
    let series = BarSeries::infer(bars)?;
    debug!("Received {} bars for {}", series.len(), symbol);

    let chart = build_trend_chart(symbol, &series, midnight_utc(start_date), windows, policy)?;
    info!(
        "Built {} chart: {} points, {} lines",
        symbol,
        chart.closes.len(),
        chart.lines.len()
    );

    Ok(chart)
}
