use axum::{extract::{Query, State}, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::{
    config::{parse_windows, window_specs},
    indicators::{IndicatorError, MatchPolicy},
    models::{Timestamp, WindowSpec},
    services::chart_service::{self, ChartError, TrendChart},
    state::AppState,
};

#[derive(Deserialize)]
pub struct ChartQuery {
    pub symbol: Option<String>,
    pub windows: Option<String>,     // comma-separated: "200,50"
    pub smoothing: Option<f64>,
    pub policy: Option<MatchPolicy>, // "exact", "next" or "previous"
}

#[derive(Serialize)]
pub struct ChartResponse {
    pub symbol: String,
    pub timestamps: Vec<Timestamp>,
    pub closes: Vec<f64>,
    pub averages: BTreeMap<String, Vec<f64>>,
}

impl From<TrendChart> for ChartResponse {
    fn from(chart: TrendChart) -> Self {
        let averages = chart
            .lines
            .iter()
            .map(|line| (format!("ema_{}", line.window.length()), line.series.values()))
            .collect();

        Self {
            timestamps: chart.timestamps(),
            closes: chart.closes.iter().map(|bar| bar.close).collect(),
            symbol: chart.symbol,
            averages,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn error_response(status: StatusCode, error: impl ToString) -> (StatusCode, Json<ErrorResponse>) {
    (status, Json(ErrorResponse { error: error.to_string() }))
}

pub async fn get_chart(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> ApiResult<ChartResponse> {
    let symbol = query
        .symbol
        .unwrap_or_else(|| state.config.default_symbol.clone())
        .to_uppercase();

    if symbol.is_empty()
        || symbol.len() > 10
        || !symbol.chars().all(|c| c.is_ascii_alphanumeric() || c == '.')
    {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            format!("Invalid symbol: {}", symbol),
        ));
    }

    let windows = match (query.windows.as_deref(), query.smoothing) {
        (None, None) => state.config.windows.clone(),
        (list, smoothing) => {
            let lengths = match list {
                Some(list) => {
                    parse_windows(list).map_err(|e| error_response(StatusCode::BAD_REQUEST, e))?
                }
                None => state.config.windows.iter().map(WindowSpec::length).collect(),
            };
            window_specs(&lengths, smoothing.unwrap_or(state.config.smoothing))
                .map_err(|e| error_response(StatusCode::BAD_REQUEST, e))?
        }
    };

    let policy = query.policy.unwrap_or(state.config.alignment_policy);
    let today = Utc::now().date_naive();

    match chart_service::load_trend_chart(&state, &symbol, &windows, policy, today).await {
        Ok(chart) => Ok(Json(chart.into())),
        Err(err) => {
            let status = match &err {
                ChartError::InvalidRequest(_)
                | ChartError::Indicator(IndicatorError::InvalidWindow(_)) => {
                    StatusCode::BAD_REQUEST
                }
                ChartError::Indicator(_) | ChartError::Calendar(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                ChartError::Upstream(_) => StatusCode::BAD_GATEWAY,
            };
            tracing::error!("Chart for {} failed: {}", symbol, err);
            Err(error_response(status, err))
        }
    }
}
