use chrono::{Datelike, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::consts::{RAINY_SEASON_END_MONTH, RAINY_SEASON_START_MONTH};
use crate::error::{Result, ZonestatError};

/// How calendar years are mapped onto day offsets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarMode {
    /// Real calendar boundaries; leap years have 366 days.
    #[default]
    Exact,
    /// Every year is exactly 365 days after January 1st of the epoch's
    /// year. Leap days are not corrected, so windows drift by one day per
    /// leap year crossed.
    Fixed365,
}

impl std::fmt::Display for CalendarMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "Exact"),
            Self::Fixed365 => write!(f, "Fixed 365-day"),
        }
    }
}

/// Half-open day-offset interval `[start, end)` covering one year.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct YearWindow {
    pub year: i32,
    pub start: i32,
    pub end: i32,
}

impl YearWindow {
    pub fn contains(&self, day_offset: i32) -> bool {
        day_offset >= self.start && day_offset < self.end
    }

    /// Whether `day_offset` falls inside the window widened by `days` on both ends.
    pub fn contains_buffered(&self, day_offset: i32, days: u32) -> bool {
        let d = i64::from(day_offset);
        let pad = i64::from(days);
        d >= i64::from(self.start) - pad && d < i64::from(self.end) + pad
    }

    pub fn len(&self) -> i32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Converts between calendar dates and day offsets since one fixed epoch.
///
/// Every consumer of a given integrated alert layer must share the same
/// mapper, otherwise year windows and stored offsets disagree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochDateMapper {
    epoch: NaiveDate,
    mode: CalendarMode,
}

impl EpochDateMapper {
    pub fn new(epoch: NaiveDate, mode: CalendarMode) -> Self {
        Self { epoch, mode }
    }

    pub fn epoch(&self) -> NaiveDate {
        self.epoch
    }

    pub fn mode(&self) -> CalendarMode {
        self.mode
    }

    /// Days from the epoch to `date` (negative before the epoch).
    pub fn day_offset(&self, date: NaiveDate) -> i32 {
        date.signed_duration_since(self.epoch).num_days() as i32
    }

    /// Calendar date of a day offset.
    pub fn date_of(&self, day_offset: i32) -> Option<NaiveDate> {
        TimeDelta::try_days(i64::from(day_offset)).and_then(|d| self.epoch.checked_add_signed(d))
    }

    /// Day-offset window covering calendar `year`.
    pub fn year_window(&self, year: i32) -> Result<YearWindow> {
        match self.mode {
            CalendarMode::Exact => {
                let start = jan_first(year)?;
                let end = jan_first(year + 1)?;
                Ok(YearWindow {
                    year,
                    start: self.day_offset(start),
                    end: self.day_offset(end),
                })
            }
            CalendarMode::Fixed365 => {
                let anchor = self.day_offset(jan_first(self.epoch.year())?);
                let start = anchor + (year - self.epoch.year()) * 365;
                Ok(YearWindow {
                    year,
                    start,
                    end: start + 365,
                })
            }
        }
    }

    /// The year whose window contains `day_offset`.
    pub fn year_of(&self, day_offset: i32) -> Option<i32> {
        match self.mode {
            CalendarMode::Exact => self.date_of(day_offset).map(|d| d.year()),
            CalendarMode::Fixed365 => {
                let anchor = self.day_offset(jan_first(self.epoch.year()).ok()?);
                Some(self.epoch.year() + (day_offset - anchor).div_euclid(365))
            }
        }
    }
}

/// `[days(year-01-01 - epoch), days((year+1)-01-01 - epoch))` under `mode`.
pub fn year_window(epoch: NaiveDate, year: i32, mode: CalendarMode) -> Result<YearWindow> {
    EpochDateMapper::new(epoch, mode).year_window(year)
}

/// Half-open calendar date range `[from, to)` used to query dated products.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    /// Every representable date; used for undated (static) products.
    pub fn all() -> Self {
        Self {
            from: NaiveDate::MIN,
            to: NaiveDate::MAX,
        }
    }

    pub fn calendar_year(year: i32) -> Result<Self> {
        Ok(Self {
            from: jan_first(year)?,
            to: jan_first(year + 1)?,
        })
    }

    /// November 1st of the previous year up to (not including) April 1st.
    pub fn rainy_season(year: i32) -> Result<Self> {
        Ok(Self {
            from: ymd(year - 1, RAINY_SEASON_START_MONTH, 1)?,
            to: ymd(year, RAINY_SEASON_END_MONTH, 1)?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date < self.to
    }
}

fn jan_first(year: i32) -> Result<NaiveDate> {
    ymd(year, 1, 1)
}

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ZonestatError::Configuration(format!("year {year} is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_exact_window_from_radd_epoch() {
        let mapper = EpochDateMapper::new(date(2014, 12, 31), CalendarMode::Exact);
        let w = mapper.year_window(2015).unwrap();
        assert_eq!((w.start, w.end), (1, 366));
    }

    #[test]
    fn test_exact_leap_year_has_366_days() {
        let mapper = EpochDateMapper::new(date(2019, 1, 1), CalendarMode::Exact);
        assert_eq!(mapper.year_window(2020).unwrap().len(), 366);
        assert_eq!(mapper.year_window(2021).unwrap().start, 731);
    }

    #[test]
    fn test_fixed365_ignores_leap_day() {
        let mapper = EpochDateMapper::new(date(2019, 1, 1), CalendarMode::Fixed365);
        let w = mapper.year_window(2021).unwrap();
        assert_eq!((w.start, w.end), (730, 1095));
    }

    #[test]
    fn test_year_of_inverts_window() {
        for mode in [CalendarMode::Exact, CalendarMode::Fixed365] {
            let mapper = EpochDateMapper::new(date(2019, 1, 1), mode);
            for year in 2017..2026 {
                let w = mapper.year_window(year).unwrap();
                assert_eq!(mapper.year_of(w.start), Some(year));
                assert_eq!(mapper.year_of(w.end - 1), Some(year));
            }
        }
    }

    #[test]
    fn test_rainy_season_spans_year_boundary() {
        let r = DateRange::rainy_season(2020).unwrap();
        assert_eq!(r.from, date(2019, 11, 1));
        assert_eq!(r.to, date(2020, 4, 1));
        assert!(r.contains(date(2020, 3, 31)));
        assert!(!r.contains(date(2020, 4, 1)));
    }
}
