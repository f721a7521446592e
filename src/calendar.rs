use chrono::{Datelike, Months, NaiveDate, Weekday};
use std::collections::BTreeSet;

#[derive(Debug, PartialEq)]
pub enum CalendarError {
    InvalidDate(String),
    OutOfRange,
}

impl std::fmt::Display for CalendarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalendarError::InvalidDate(msg) => write!(f, "Invalid date: {}", msg),
            CalendarError::OutOfRange => write!(f, "Date out of supported range"),
        }
    }
}

impl std::error::Error for CalendarError {}

/// Market calendar: weekdays minus a configured holiday list
#[derive(Debug, Clone, Default)]
pub struct TradingCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl TradingCalendar {
    pub fn new(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.holidays.contains(&date)
    }

    /// First trading day on or after `date`
    pub fn roll_forward(&self, date: NaiveDate) -> Result<NaiveDate, CalendarError> {
        let mut day = date;
        while !self.is_trading_day(day) {
            day = day.succ_opt().ok_or(CalendarError::OutOfRange)?;
        }
        Ok(day)
    }

    /// Trading days between `from` and `to`, both inclusive
    pub fn trading_days(&self, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        from.iter_days()
            .take_while(|day| *day <= to)
            .filter(|day| self.is_trading_day(*day))
            .collect()
    }

    /// Start of a trailing analysis window ending on `today`,
    /// moved forward to a trading day so it lines up with a bar
    pub fn lookback_start(
        &self,
        today: NaiveDate,
        months: u32,
    ) -> Result<NaiveDate, CalendarError> {
        let start = today
            .checked_sub_months(Months::new(months))
            .ok_or(CalendarError::OutOfRange)?;
        self.roll_forward(start)
    }
}

/// Parse a comma-separated list of ISO dates, e.g. "2021-11-25,2021-12-24"
pub fn parse_holidays(list: &str) -> Result<Vec<NaiveDate>, CalendarError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| CalendarError::InvalidDate(format!("{}: {}", s, e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn calendar() -> TradingCalendar {
        TradingCalendar::new([date(2021, 11, 25), date(2021, 12, 24)])
    }

    #[test]
    fn test_weekends_and_holidays() {
        let cal = calendar();
        assert!(cal.is_trading_day(date(2021, 11, 24)));
        assert!(!cal.is_trading_day(date(2021, 11, 25))); // Thanksgiving
        assert!(!cal.is_trading_day(date(2021, 11, 27))); // Saturday
        assert!(!cal.is_trading_day(date(2021, 11, 28))); // Sunday
    }

    #[test]
    fn test_roll_forward() {
        let cal = calendar();
        // Fri 2021-12-24 is a holiday, then the weekend
        assert_eq!(cal.roll_forward(date(2021, 12, 24)), Ok(date(2021, 12, 27)));
        assert_eq!(cal.roll_forward(date(2021, 12, 27)), Ok(date(2021, 12, 27)));
    }

    #[test]
    fn test_trading_days_in_range() {
        let cal = calendar();
        let days = cal.trading_days(date(2021, 11, 22), date(2021, 11, 30));
        assert_eq!(
            days,
            vec![
                date(2021, 11, 22),
                date(2021, 11, 23),
                date(2021, 11, 24),
                date(2021, 11, 26),
                date(2021, 11, 29),
                date(2021, 11, 30),
            ]
        );
        assert!(cal.trading_days(date(2021, 11, 30), date(2021, 11, 22)).is_empty());
    }

    #[test]
    fn test_lookback_start_one_year() {
        let cal = TradingCalendar::default();
        // 2020-03-14 was a Saturday
        assert_eq!(cal.lookback_start(date(2021, 3, 14), 12), Ok(date(2020, 3, 16)));
        assert_eq!(cal.lookback_start(date(2021, 3, 10), 12), Ok(date(2020, 3, 10)));
    }

    #[test]
    fn test_parse_holidays() {
        assert_eq!(
            parse_holidays(" 2021-11-25, 2021-12-24 ,"),
            Ok(vec![date(2021, 11, 25), date(2021, 12, 24)])
        );
        assert_eq!(parse_holidays(""), Ok(Vec::new()));
        assert!(matches!(
            parse_holidays("2021-13-01"),
            Err(CalendarError::InvalidDate(_))
        ));
    }
}
