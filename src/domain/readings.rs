//! Sensor readings and historical series served by the backend.
//!
//! These shapes mirror the service's JSON closely; the engine only displays
//! them, apart from feeding coordinates into reading lookups.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{EngineError, EngineResult};

/// Shown until a real solar zenith reading arrives
pub const PLACEHOLDER_SZA_DEG: f64 = 32.4;
/// Shown until a real PM2.5 reading arrives
pub const PLACEHOLDER_PM25: f64 = 42.7;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SzaReading {
    pub sza: f64,
}

/// Latest PM2.5 measurement from the nearest station.
///
/// `pm25` is `None` when no station is close enough; `message` then says why.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pm25Reading {
    pub pm25: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Readings currently displayed on the dashboard
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct DisplayedReadings {
    pub sza: f64,
    pub pm25: f64,
}

impl Default for DisplayedReadings {
    fn default() -> Self {
        Self {
            sza: PLACEHOLDER_SZA_DEG,
            pm25: PLACEHOLDER_PM25,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HistoryInterval {
    Hour,
    Day,
    Month,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryPoint {
    /// Short axis label (`"14:00"`, `"07"`, `"Jan"`)
    pub time: String,
    #[serde(default)]
    pub full_date: Option<String>,
    /// Mean AC power over the bucket (W/m²)
    pub power: f64,
}

/// Query sent to the history endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub interval: HistoryInterval,
}

/// Zoom level of the actual-output chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum HistoryView {
    /// Monthly means over one year
    Yearly,
    /// Daily means over one month
    Monthly,
    /// Hourly values over one day
    Daily,
}

impl HistoryView {
    /// Build the date range and bucket size for a view.
    ///
    /// `month` is ignored for `Yearly`; `day` is only used by `Daily`.
    pub fn query(self, year: i32, month: u32, day: u32) -> EngineResult<HistoryQuery> {
        let invalid = || {
            EngineError::Validation(format!(
                "invalid history date {year:04}-{month:02}-{day:02}"
            ))
        };

        match self {
            HistoryView::Yearly => Ok(HistoryQuery {
                start_date: NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?,
                end_date: NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(invalid)?,
                interval: HistoryInterval::Month,
            }),
            HistoryView::Monthly => {
                let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
                Ok(HistoryQuery {
                    start_date: start,
                    end_date: last_day_of_month(start).ok_or_else(invalid)?,
                    interval: HistoryInterval::Day,
                })
            }
            HistoryView::Daily => {
                let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
                Ok(HistoryQuery {
                    start_date: date,
                    end_date: date,
                    interval: HistoryInterval::Hour,
                })
            }
        }
    }
}

fn last_day_of_month(first: NaiveDate) -> Option<NaiveDate> {
    let (y, m) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1)?.pred_opt()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_yearly_view() {
        let q = HistoryView::Yearly.query(2024, 7, 3).unwrap();
        assert_eq!(q.start_date, date(2024, 1, 1));
        assert_eq!(q.end_date, date(2024, 12, 31));
        assert_eq!(q.interval, HistoryInterval::Month);
    }

    #[test]
    fn test_monthly_view_uses_month_length() {
        let feb = HistoryView::Monthly.query(2024, 2, 1).unwrap();
        assert_eq!(feb.end_date, date(2024, 2, 29));
        assert_eq!(feb.interval, HistoryInterval::Day);

        let dec = HistoryView::Monthly.query(2023, 12, 1).unwrap();
        assert_eq!(dec.end_date, date(2023, 12, 31));
    }

    #[test]
    fn test_daily_view() {
        let q = HistoryView::Daily.query(2025, 3, 14).unwrap();
        assert_eq!(q.start_date, q.end_date);
        assert_eq!(q.interval, HistoryInterval::Hour);
    }

    #[test]
    fn test_invalid_dates_rejected() {
        assert!(matches!(
            HistoryView::Monthly.query(2024, 13, 1),
            Err(EngineError::Validation(_))
        ));
        assert!(HistoryView::Daily.query(2023, 2, 29).is_err());
    }

    #[test]
    fn test_null_pm25_reading_parses() {
        let reading: Pm25Reading =
            serde_json::from_str(r#"{"pm25": null, "message": "No sensors found within 25km"}"#)
                .unwrap();
        assert!(reading.pm25.is_none());
        assert_eq!(reading.message.as_deref(), Some("No sensors found within 25km"));
    }

    #[test]
    fn test_placeholders() {
        let shown = DisplayedReadings::default();
        assert_eq!(shown.sza, 32.4);
        assert_eq!(shown.pm25, 42.7);
    }
}
