use crate::{api_client::ApiClient, calendar::TradingCalendar, config::Config};
use std::sync::Arc;

/// Shared, read-only service state. Each request fetches its own bars,
/// so nothing here needs a lock.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub calendar: Arc<TradingCalendar>,
    pub client: Arc<ApiClient>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let calendar = TradingCalendar::new(config.holidays.iter().copied());
        let client = ApiClient::new(&config);

        Self {
            config: Arc::new(config),
            calendar: Arc::new(calendar),
            client: Arc::new(client),
        }
    }
}
