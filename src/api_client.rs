use crate::config::Config;
use crate::indicators::midnight_utc;
use crate::models::PriceBar;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::Deserialize;

// Alpaca caps a single page of bars at this size
const MAX_PAGE_SIZE: usize = 10_000;

#[derive(Deserialize)]
struct BarsPage {
    // Alpaca sends `null` rather than `[]` when a page is empty
    bars: Option<Vec<AlpacaBar>>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct AlpacaBar {
    t: DateTime<Utc>,
    c: f64,
}

pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    secret_key: String,
}

#[derive(Debug)]
pub enum ApiError {
    RequestFailed(String),
    ParseError(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::RequestFailed(msg) => write!(f, "Request failed: {}", msg),
            ApiError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.data_url.clone(),
            key_id: config.api_key_id.clone(),
            secret_key: config.api_secret_key.clone(),
        }
    }

    /// Fetch the most recent `limit` daily bars ending on `until`.
    /// Bars come back newest-first, as Alpaca sorts them with `sort=desc`.
    pub async fn fetch_daily_bars(
        &self,
        symbol: &str,
        limit: usize,
        until: NaiveDate,
    ) -> Result<Vec<PriceBar>, ApiError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let start = history_start(limit, until).ok_or_else(|| {
            ApiError::RequestFailed(format!(
                "{} bars before {} is out of the supported date range",
                limit, until
            ))
        })?;

        let url = format!("{}/v2/stocks/{}/bars", self.base_url, symbol);
        let mut bars = Vec::with_capacity(limit.min(MAX_PAGE_SIZE));
        let mut page_token: Option<String> = None;

        loop {
            let remaining = limit - bars.len();
            let mut query = vec![
                ("timeframe", "1Day".to_string()),
                ("start", format!("{}T00:00:00Z", start)),
                ("end", format!("{}T23:59:59Z", until)),
                ("limit", remaining.min(MAX_PAGE_SIZE).to_string()),
                ("sort", "desc".to_string()),
                ("adjustment", "split".to_string()),
            ];
            if let Some(token) = &page_token {
                query.push(("page_token", token.clone()));
            }

            let response = self
                .client
                .get(&url)
                .header("APCA-API-KEY-ID", &self.key_id)
                .header("APCA-API-SECRET-KEY", &self.secret_key)
                .header("User-Agent", "ema-trend/0.1")
                .query(&query)
                .send()
                .await
                .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

            let status = response.status();
            let response_text = response.text().await.map_err(|e| {
                ApiError::ParseError(format!("Failed to get response text: {}", e))
            })?;

            if !status.is_success() {
                return Err(ApiError::RequestFailed(format!(
                    "{} returned {}: {}",
                    url, status, response_text
                )));
            }

            let (page, next) = parse_bars_page(&response_text)?;
            tracing::debug!(
                "Fetched {} bars for {} (next page: {})",
                page.len(),
                symbol,
                next.is_some()
            );
            bars.extend(page);

            match next {
                Some(token) if bars.len() < limit => page_token = Some(token),
                _ => break,
            }
        }

        bars.truncate(limit);
        Ok(bars)
    }
}

/// First calendar day of a request for `limit` trading days ending on `until`.
/// Two calendar days per trading day comfortably covers weekends and holidays.
/// None when the span does not fit the calendar.
fn history_start(limit: usize, until: NaiveDate) -> Option<NaiveDate> {
    let days = i64::try_from(limit)
        .ok()?
        .checked_mul(2)?
        .checked_add(10)?;
    until.checked_sub_signed(TimeDelta::try_days(days)?)
}

/// Decode one page of Alpaca bars.
/// Timestamps are moved to midnight UTC of the bar's date so they
/// line up with calendar targets.
fn parse_bars_page(body: &str) -> Result<(Vec<PriceBar>, Option<String>), ApiError> {
    let page: BarsPage = serde_json::from_str(body).map_err(|e| {
        ApiError::ParseError(format!("Failed to parse bars. Response: {}. Error: {}", body, e))
    })?;

    let bars = page
        .bars
        .unwrap_or_default()
        .into_iter()
        .map(|bar| PriceBar::new(midnight_utc(bar.t.date_naive()), bar.c))
        .collect();

    Ok((bars, page.next_page_token))
}
