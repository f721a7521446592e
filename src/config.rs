use std::env;

use chrono::NaiveDate;

use crate::calendar::parse_holidays;
use crate::indicators::{IndicatorError, MatchPolicy};
use crate::models::{WindowSpec, DEFAULT_SMOOTHING};

#[derive(Debug, PartialEq)]
pub struct ConfigError(pub String);

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Config error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub api_key_id: String,
    pub api_secret_key: String,
    pub data_url: String,
    pub default_symbol: String,
    pub windows: Vec<WindowSpec>,
    pub smoothing: f64,
    pub lookback_months: u32,
    pub holidays: Vec<NaiveDate>,
    pub alignment_policy: MatchPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = var("HOST", "0.0.0.0");
        let port = var("PORT", "3000")
            .parse::<u16>()
            .map_err(|_| ConfigError("Invalid PORT".into()))?;

        let api_key_id = lookup("APCA_API_KEY_ID")
            .ok_or_else(|| ConfigError("APCA_API_KEY_ID must be set".into()))?;
        let api_secret_key = lookup("APCA_API_SECRET_KEY")
            .ok_or_else(|| ConfigError("APCA_API_SECRET_KEY must be set".into()))?;
        let data_url = var("ALPACA_DATA_URL", "https://data.alpaca.markets")
            .trim_end_matches('/')
            .to_string();

        let default_symbol = var("DEFAULT_SYMBOL", "INTC").to_uppercase();

        let smoothing = match lookup("EMA_SMOOTHING") {
            Some(value) => value
                .parse::<f64>()
                .map_err(|_| ConfigError("Invalid EMA_SMOOTHING".into()))?,
            None => DEFAULT_SMOOTHING,
        };
        let lengths = parse_windows(&var("EMA_WINDOWS", "200,50"))
            .map_err(|e| ConfigError(format!("Invalid EMA_WINDOWS: {}", e)))?;
        let windows = window_specs(&lengths, smoothing)
            .map_err(|e| ConfigError(format!("Invalid EMA_WINDOWS or EMA_SMOOTHING: {}", e)))?;
        let lookback_months = var("LOOKBACK_MONTHS", "12")
            .parse::<u32>()
            .map_err(|_| ConfigError("Invalid LOOKBACK_MONTHS".into()))?;

        let holidays = parse_holidays(&var("MARKET_HOLIDAYS", ""))
            .map_err(|e| ConfigError(format!("Invalid MARKET_HOLIDAYS: {}", e)))?;
        let alignment_policy = var("ALIGNMENT_POLICY", "exact")
            .parse::<MatchPolicy>()
            .map_err(ConfigError)?;

        Ok(Self {
            host,
            port,
            api_key_id,
            api_secret_key,
            data_url,
            default_symbol,
            windows,
            smoothing,
            lookback_months,
            holidays,
            alignment_policy,
        })
    }
}

/// Parse "200,50" into window lengths
pub fn parse_windows(list: &str) -> Result<Vec<usize>, String> {
    let windows = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| format!("'{}' is not a window length", s))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if windows.is_empty() {
        return Err("at least one window length is required".to_string());
    }
    if let Some((i, length)) = windows
        .iter()
        .enumerate()
        .find(|&(i, length)| windows[..i].contains(length))
    {
        return Err(format!("window length {} is repeated at position {}", length, i + 1));
    }
    Ok(windows)
}

/// Validate each length against one smoothing constant
pub fn window_specs(lengths: &[usize], smoothing: f64) -> Result<Vec<WindowSpec>, IndicatorError> {
    lengths
        .iter()
        .map(|length| WindowSpec::with_smoothing(*length, smoothing))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MAX_WINDOW_LENGTH;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn lengths(config: &Config) -> Vec<usize> {
        config.windows.iter().map(WindowSpec::length).collect()
    }

    const CREDENTIALS: [(&str, &str); 2] = [
        ("APCA_API_KEY_ID", "key"),
        ("APCA_API_SECRET_KEY", "secret"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&CREDENTIALS)).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.data_url, "https://data.alpaca.markets");
        assert_eq!(config.default_symbol, "INTC");
        assert_eq!(lengths(&config), vec![200, 50]);
        assert!((config.windows[0].weight() - 2.0 / 201.0).abs() < 1e-12);
        assert_eq!(config.smoothing, 2.0);
        assert_eq!(config.lookback_months, 12);
        assert!(config.holidays.is_empty());
        assert_eq!(config.alignment_policy, MatchPolicy::Exact);
    }

    #[test]
    fn test_overrides() {
        let mut vars = CREDENTIALS.to_vec();
        vars.extend([
            ("PORT", "8080"),
            ("ALPACA_DATA_URL", "http://localhost:9000/"),
            ("DEFAULT_SYMBOL", "aapl"),
            ("EMA_WINDOWS", "26, 12"),
            ("EMA_SMOOTHING", "3"),
            ("MARKET_HOLIDAYS", "2021-12-24"),
            ("ALIGNMENT_POLICY", "next"),
        ]);

        let config = Config::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_url, "http://localhost:9000");
        assert_eq!(config.default_symbol, "AAPL");
        assert_eq!(lengths(&config), vec![26, 12]);
        assert!((config.windows[1].weight() - 3.0 / 13.0).abs() < 1e-12);
        assert_eq!(config.holidays.len(), 1);
        assert_eq!(config.alignment_policy, MatchPolicy::Next);
    }

    #[test]
    fn test_missing_credentials() {
        let err = Config::from_lookup(lookup(&[("APCA_API_KEY_ID", "key")])).unwrap_err();
        assert_eq!(err, ConfigError("APCA_API_SECRET_KEY must be set".into()));
    }

    #[test]
    fn test_invalid_values() {
        let overlong = (MAX_WINDOW_LENGTH + 1).to_string();
        for (key, value) in [
            ("PORT", "not-a-port"),
            ("EMA_WINDOWS", "200,fifty"),
            ("EMA_WINDOWS", "0"),
            ("EMA_WINDOWS", "50,50"),
            ("EMA_WINDOWS", overlong.as_str()),
            ("EMA_SMOOTHING", "two"),
            ("EMA_SMOOTHING", "0"),
            ("EMA_SMOOTHING", "-2"),
            ("EMA_SMOOTHING", "NaN"),
            ("MARKET_HOLIDAYS", "yesterday"),
            ("ALIGNMENT_POLICY", "closest"),
        ] {
            let mut vars = CREDENTIALS.to_vec();
            vars.push((key, value));
            assert!(
                Config::from_lookup(lookup(&vars)).is_err(),
                "{}={} should fail",
                key,
                value
            );
        }
    }

    #[test]
    fn test_parse_windows() {
        assert_eq!(parse_windows("200,50"), Ok(vec![200, 50]));
        assert!(parse_windows(" , ").is_err());
        assert!(parse_windows("-5").is_err());
    }

    #[test]
    fn test_parse_windows_rejects_repeats() {
        assert_eq!(
            parse_windows("50,50"),
            Err("window length 50 is repeated at position 2".to_string())
        );
        assert!(parse_windows("200, 50, 200").is_err());
        assert_eq!(parse_windows("200,50,20"), Ok(vec![200, 50, 20]));
    }

    #[test]
    fn test_window_specs() {
        let windows = window_specs(&[26, 12], 2.0).unwrap();
        assert_eq!(windows[0].length(), 26);
        assert!(matches!(
            window_specs(&[26, 0], 2.0),
            Err(IndicatorError::InvalidWindow(_))
        ));
        assert!(window_specs(&[usize::MAX], 2.0).is_err());
    }
}
