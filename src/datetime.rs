use std::fmt;

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

/// 週の境界を計算する基準タイムゾーン。
pub const REFERENCE_TIMEZONE: Tz = chrono_tz::America::Los_Angeles;

#[cfg(not(test))]
/// 現在のUTC時間を取得する。
pub fn now() -> DateTime<Utc> {
    Utc::now()
}


#[cfg(test)]
pub use mock_datetime::now;

/// 基準タイムゾーンでの今日の日付を返す。
pub fn today() -> NaiveDate {
    now().with_timezone(&REFERENCE_TIMEZONE).date_naive()
}

/// `offset`週前の週の開始日(日曜日)を返す。
///
/// `offset`が0の場合は今週、1の場合は先週の開始日となる。
pub fn start_of_week(offset: u32) -> NaiveDate {
    let today = today();
    let days_from_sunday = i64::from(today.weekday().num_days_from_sunday());
    today - Duration::days(days_from_sunday) - Duration::weeks(i64::from(offset))
}

/// `offset`週前の週の終了日(土曜日)を返す。
pub fn end_of_week(offset: u32) -> NaiveDate {
    start_of_week(offset) + Duration::days(6)
}

/// 開始日と終了日を両端に含む日付の範囲。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// `offset`週前の週の範囲を返す。
    pub fn for_week(offset: u32) -> Self {
        Self {
            start: start_of_week(offset),
            end: end_of_week(offset),
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// `YYYY-MM-DD`形式の日付をパースする。
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("Failed to parse date: {}", s))
}
