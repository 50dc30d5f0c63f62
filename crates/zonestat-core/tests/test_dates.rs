mod common;

use common::date;
use zonestat_core::dates::{year_window, CalendarMode, DateRange, EpochDateMapper};

// ---------------------------------------------------------------------------
// Year windows
// ---------------------------------------------------------------------------

#[test]
fn test_consecutive_windows_partition_day_axis() {
    for epoch in [date(2014, 12, 31), date(2019, 1, 1)] {
        for mode in [CalendarMode::Exact, CalendarMode::Fixed365] {
            for year in 2015..2030 {
                let a = year_window(epoch, year, mode).unwrap();
                let b = year_window(epoch, year + 1, mode).unwrap();
                assert_eq!(a.end, b.start, "{epoch} {mode} {year}");
                assert!(!a.is_empty());
            }
        }
    }
}

#[test]
fn test_windows_never_overlap() {
    let mapper = EpochDateMapper::new(date(2014, 12, 31), CalendarMode::Exact);
    let windows: Vec<_> = (2016..2026).map(|y| mapper.year_window(y).unwrap()).collect();
    for (i, a) in windows.iter().enumerate() {
        for b in &windows[i + 1..] {
            assert!(a.end <= b.start);
        }
    }
}

#[test]
fn test_exact_window_matches_calendar() {
    let mapper = EpochDateMapper::new(date(2014, 12, 31), CalendarMode::Exact);
    let w = mapper.year_window(2021).unwrap();
    assert_eq!(w.start, mapper.day_offset(date(2021, 1, 1)));
    assert_eq!(w.end, mapper.day_offset(date(2022, 1, 1)));
    assert_eq!(w.len(), 365);
    assert!(w.contains(mapper.day_offset(date(2021, 12, 31))));
    assert!(!w.contains(mapper.day_offset(date(2022, 1, 1))));
}

#[test]
fn test_exact_leap_year_length() {
    let mapper = EpochDateMapper::new(date(2014, 12, 31), CalendarMode::Exact);
    assert_eq!(mapper.year_window(2024).unwrap().len(), 366);
    assert_eq!(mapper.year_window(2023).unwrap().len(), 365);
}

#[test]
fn test_fixed365_drifts_across_leap_years() {
    let epoch = date(2019, 1, 1);
    let exact = year_window(epoch, 2025, CalendarMode::Exact).unwrap();
    let fixed = year_window(epoch, 2025, CalendarMode::Fixed365).unwrap();
    // 2020 and 2024 are leap years.
    assert_eq!(exact.start - fixed.start, 2);
    assert_eq!(fixed.len(), 365);
}

#[test]
fn test_window_before_epoch_is_negative() {
    let mapper = EpochDateMapper::new(date(2019, 1, 1), CalendarMode::Exact);
    let w = mapper.year_window(2018).unwrap();
    assert_eq!((w.start, w.end), (-365, 0));
}

#[test]
fn test_contains_buffered_widens_both_ends() {
    let mapper = EpochDateMapper::new(date(2019, 1, 1), CalendarMode::Exact);
    let w = mapper.year_window(2020).unwrap();
    assert!(!w.contains(w.start - 2));
    assert!(w.contains_buffered(w.start - 2, 2));
    assert!(!w.contains_buffered(w.start - 3, 2));
    assert!(w.contains_buffered(w.end + 1, 2));
    assert!(!w.contains_buffered(w.end + 2, 2));
}

// ---------------------------------------------------------------------------
// Offsets and ranges
// ---------------------------------------------------------------------------

#[test]
fn test_day_offset_round_trip() {
    let mapper = EpochDateMapper::new(date(2014, 12, 31), CalendarMode::Exact);
    let d = date(2023, 7, 14);
    assert_eq!(mapper.date_of(mapper.day_offset(d)), Some(d));
    assert_eq!(mapper.day_offset(date(2015, 1, 1)), 1);
}

#[test]
fn test_calendar_year_range() {
    let r = DateRange::calendar_year(2022).unwrap();
    assert!(r.contains(date(2022, 1, 1)));
    assert!(r.contains(date(2022, 12, 31)));
    assert!(!r.contains(date(2023, 1, 1)));
    assert!(!r.contains(date(2021, 12, 31)));
}

#[test]
fn test_all_range_contains_any_date() {
    let r = DateRange::all();
    assert!(r.contains(date(1900, 1, 1)));
    assert!(r.contains(date(2100, 6, 1)));
}

#[test]
fn test_calendar_mode_display() {
    assert_eq!(format!("{}", CalendarMode::Exact), "Exact");
    assert_eq!(format!("{}", CalendarMode::Fixed365), "Fixed 365-day");
    assert_eq!(CalendarMode::default(), CalendarMode::Exact);
}
