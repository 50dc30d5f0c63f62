mod common;

use std::collections::BTreeSet;

use common::{alert_layer, date, projected_grid};
use zonestat_core::alerts::{integrate, AlertLayer, AlertPixel, BufferConfig, Confidence, FusionParams, RuleSet};
use zonestat_core::dates::{CalendarMode, EpochDateMapper};
use zonestat_core::error::ZonestatError;

fn params() -> FusionParams {
    FusionParams::default()
}

fn single(conf: Confidence, day: i32) -> AlertLayer {
    alert_layer(&projected_grid(1, 1), |_, _| AlertPixel::alert(conf, day))
}

// ---------------------------------------------------------------------------
// r1 selection
// ---------------------------------------------------------------------------

#[test]
fn test_equal_confidence_takes_earliest_date() {
    let fused = integrate(&[single(Confidence::High, 120), single(Confidence::High, 80)], &params()).unwrap();
    assert_eq!(fused.get(0, 0), AlertPixel::alert(Confidence::High, 80));
}

#[test]
fn test_higher_confidence_wins_over_earlier_date() {
    let fused = integrate(&[single(Confidence::Low, 10), single(Confidence::High, 50)], &params()).unwrap();
    assert_eq!(fused.get(0, 0), AlertPixel::alert(Confidence::High, 50));
}

#[test]
fn test_all_none_fuses_to_none() {
    let grid = projected_grid(2, 2);
    let a = AlertLayer::empty(&grid);
    let b = AlertLayer::empty(&grid);
    let fused = integrate(&[a, b], &params()).unwrap();
    for p in fused.pixels() {
        assert_eq!(*p, AlertPixel::NONE);
        assert_eq!(p.day_offset(), None);
    }
}

#[test]
fn test_combine_empty_input_is_none() {
    assert_eq!(RuleSet::R1.combine(std::iter::empty()), AlertPixel::NONE);
}

#[test]
fn test_alert_pixel_without_date_collapses_to_none() {
    assert_eq!(AlertPixel::new(Confidence::High, None), AlertPixel::NONE);
    assert_eq!(AlertPixel::new(Confidence::None, Some(5)), AlertPixel::NONE);
}

#[test]
fn test_scenario_overlapping_sources() {
    // X: HIGH at day 100 on columns 0..3, Y: HIGHEST at day 95 on columns 1..4.
    let grid = projected_grid(4, 4);
    let x = alert_layer(&grid, |_, c| {
        if c < 3 {
            AlertPixel::alert(Confidence::High, 100)
        } else {
            AlertPixel::NONE
        }
    });
    let y = alert_layer(&grid, |_, c| {
        if c >= 1 {
            AlertPixel::alert(Confidence::Highest, 95)
        } else {
            AlertPixel::NONE
        }
    });
    let fused = integrate(&[x, y], &params()).unwrap();
    for row in 0..4 {
        assert_eq!(fused.get(row, 0), AlertPixel::alert(Confidence::High, 100));
        for col in 1..4 {
            assert_eq!(fused.get(row, col), AlertPixel::alert(Confidence::Highest, 95));
        }
    }
}

#[test]
fn test_integrate_is_deterministic_and_order_independent() {
    let grid = projected_grid(16, 16);
    let a = alert_layer(&grid, |r, c| match (r * 7 + c * 3) % 5 {
        0 => AlertPixel::NONE,
        1 => AlertPixel::alert(Confidence::Low, (r * 13 + c) as i32),
        2 => AlertPixel::alert(Confidence::High, (r + c * 11) as i32),
        _ => AlertPixel::alert(Confidence::High, 40),
    });
    let b = alert_layer(&grid, |r, c| match (r + c) % 4 {
        0 => AlertPixel::alert(Confidence::Highest, (r * c) as i32),
        1 => AlertPixel::alert(Confidence::High, 40),
        _ => AlertPixel::NONE,
    });
    let buffered = FusionParams {
        buffer: BufferConfig {
            spatial_radius: 1.5,
            temporal_radius: 0,
        },
        ..FusionParams::default()
    };

    for p in [params(), buffered] {
        let first = integrate(&[a.clone(), b.clone()], &p).unwrap();
        let second = integrate(&[a.clone(), b.clone()], &p).unwrap();
        let swapped = integrate(&[b.clone(), a.clone()], &p).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, swapped);
    }
}

#[test]
fn test_single_source_passes_through() {
    let grid = projected_grid(3, 3);
    let a = alert_layer(&grid, |r, c| {
        if r == c {
            AlertPixel::alert(Confidence::Low, r as i32)
        } else {
            AlertPixel::NONE
        }
    });
    let fused = integrate(std::slice::from_ref(&a), &params()).unwrap();
    assert_eq!(fused.pixels(), a.pixels());
}

// ---------------------------------------------------------------------------
// Confidence filter
// ---------------------------------------------------------------------------

fn mixed_layer() -> AlertLayer {
    alert_layer(&projected_grid(1, 3), |_, c| match c {
        0 => AlertPixel::alert(Confidence::Low, 5),
        1 => AlertPixel::alert(Confidence::High, 6),
        _ => AlertPixel::alert(Confidence::Highest, 7),
    })
}

#[test]
fn test_filter_covering_all_levels_is_noop() {
    let layer = mixed_layer();
    let all: BTreeSet<Confidence> = [Confidence::Low, Confidence::High, Confidence::Highest].into();
    let filtered = integrate(
        std::slice::from_ref(&layer),
        &FusionParams {
            confidence_filter: all,
            ..FusionParams::default()
        },
    )
    .unwrap();
    let unfiltered = integrate(std::slice::from_ref(&layer), &params()).unwrap();
    assert_eq!(filtered, unfiltered);
}

#[test]
fn test_filter_demotes_excluded_levels() {
    let filtered = integrate(
        &[mixed_layer()],
        &FusionParams {
            confidence_filter: [Confidence::High, Confidence::Highest].into(),
            ..FusionParams::default()
        },
    )
    .unwrap();
    assert_eq!(filtered.get(0, 0), AlertPixel::NONE);
    assert_eq!(filtered.get(0, 1), AlertPixel::alert(Confidence::High, 6));
    assert_eq!(filtered.get(0, 2), AlertPixel::alert(Confidence::Highest, 7));
}

// ---------------------------------------------------------------------------
// Spatial and temporal buffers
// ---------------------------------------------------------------------------

fn buffer(spatial_radius: f64, temporal_radius: u32) -> FusionParams {
    FusionParams {
        buffer: BufferConfig {
            spatial_radius,
            temporal_radius,
        },
        ..FusionParams::default()
    }
}

#[test]
fn test_zero_buffer_does_not_dilate() {
    let grid = projected_grid(5, 5);
    let src = alert_layer(&grid, |r, c| {
        if (r, c) == (2, 2) {
            AlertPixel::alert(Confidence::High, 30)
        } else {
            AlertPixel::NONE
        }
    });
    let fused = integrate(std::slice::from_ref(&src), &buffer(0.0, 0)).unwrap();
    assert_eq!(fused.count_by_confidence().get(&Confidence::High), Some(&1));
}

#[test]
fn test_unit_radius_dilates_to_four_neighbours() {
    let grid = projected_grid(5, 5);
    let src = alert_layer(&grid, |r, c| {
        if (r, c) == (2, 2) {
            AlertPixel::alert(Confidence::High, 30)
        } else {
            AlertPixel::NONE
        }
    });
    let fused = integrate(std::slice::from_ref(&src), &buffer(1.0, 0)).unwrap();
    assert_eq!(fused.count_by_confidence().get(&Confidence::High), Some(&5));
    assert_eq!(fused.get(1, 2), AlertPixel::alert(Confidence::High, 30));
    assert_eq!(fused.get(1, 1), AlertPixel::NONE);

    let wider = integrate(&[src], &buffer(1.5, 0)).unwrap();
    assert_eq!(wider.count_by_confidence().get(&Confidence::High), Some(&9));
}

#[test]
fn test_buffer_prefers_high_class_over_nearer_low() {
    let grid = projected_grid(1, 5);
    let src = alert_layer(&grid, |_, c| match c {
        0 => AlertPixel::alert(Confidence::Low, 10),
        4 => AlertPixel::alert(Confidence::High, 50),
        _ => AlertPixel::NONE,
    });
    let fused = integrate(&[src], &buffer(2.0, 0)).unwrap();
    // Column 1 only reaches the LOW pixel; column 2 reaches both at equal
    // distance; column 3 is nearer the HIGH pixel.
    assert_eq!(fused.get(0, 1), AlertPixel::alert(Confidence::Low, 10));
    assert_eq!(fused.get(0, 2), AlertPixel::alert(Confidence::High, 50));
    assert_eq!(fused.get(0, 3), AlertPixel::alert(Confidence::High, 50));
}

#[test]
fn test_buffer_takes_nearest_then_earliest() {
    let grid = projected_grid(1, 5);
    let src = alert_layer(&grid, |_, c| match c {
        0 => AlertPixel::alert(Confidence::High, 40),
        4 => AlertPixel::alert(Confidence::High, 10),
        _ => AlertPixel::NONE,
    });
    let fused = integrate(&[src], &buffer(2.0, 0)).unwrap();
    assert_eq!(fused.get(0, 1).day_offset(), Some(40));
    assert_eq!(fused.get(0, 2).day_offset(), Some(10));
    assert_eq!(fused.get(0, 3).day_offset(), Some(10));
    assert_eq!(fused.get(0, 0).day_offset(), Some(40));
}

#[test]
fn test_temporal_buffer_widens_year_mask() {
    let mapper = EpochDateMapper::new(date(2019, 1, 1), CalendarMode::Exact);
    let window = mapper.year_window(2020).unwrap();
    let grid = projected_grid(1, 2);
    let src = alert_layer(&grid, |_, c| match c {
        0 => AlertPixel::alert(Confidence::High, window.end + 2),
        _ => AlertPixel::alert(Confidence::High, window.start - 5),
    });

    let plain = integrate(std::slice::from_ref(&src), &buffer(0.0, 0)).unwrap();
    assert!(!plain.year_mask(&window).iter().any(|&m| m));

    let widened = integrate(&[src], &buffer(0.0, 3)).unwrap();
    assert_eq!(widened.temporal_radius(), 3);
    let mask = widened.year_mask(&window);
    assert!(mask[[0, 0]]);
    assert!(!mask[[0, 1]]);
}

#[test]
fn test_negative_spatial_radius_rejected() {
    let err = integrate(&[mixed_layer()], &buffer(-1.0, 0)).unwrap_err();
    assert!(err.is_configuration());
}

// ---------------------------------------------------------------------------
// Errors and ruleset ids
// ---------------------------------------------------------------------------

#[test]
fn test_no_sources_is_configuration_error() {
    let err = integrate(&[], &params()).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_mismatched_grids_rejected() {
    let a = AlertLayer::empty(&projected_grid(2, 2));
    let b = AlertLayer::empty(&projected_grid(3, 2));
    assert!(matches!(
        integrate(&[a, b], &params()),
        Err(ZonestatError::GridMismatch { .. })
    ));
}

#[test]
fn test_ruleset_parse() {
    assert_eq!("r1".parse::<RuleSet>().unwrap(), RuleSet::R1);
    assert_eq!(" R1 ".parse::<RuleSet>().unwrap(), RuleSet::R1);
    let err = "r7".parse::<RuleSet>().unwrap_err();
    assert!(matches!(err, ZonestatError::UnknownRuleset(ref id) if id == "r7"));
    assert!(err.is_configuration());
    assert_eq!(RuleSet::R1.to_string(), "r1");
}

#[test]
fn test_confidence_codes() {
    assert_eq!(Confidence::None.code(), 0);
    assert_eq!(Confidence::Low.code(), 2);
    assert_eq!(Confidence::High.code(), 3);
    assert_eq!(Confidence::Highest.code(), 4);
    assert_eq!(Confidence::from_code(4), Some(Confidence::Highest));
    assert_eq!(Confidence::from_code(1), None);
    assert!(Confidence::Highest > Confidence::High);
}

#[test]
fn test_confidence_and_date_bands() {
    let layer = mixed_layer();
    let conf = layer.confidence_band().unwrap();
    assert_eq!(conf.get(0, 0), Some(2));
    let dates = layer.date_band().unwrap();
    assert_eq!(dates.get(0, 2), Some(7));
    let empty = AlertLayer::empty(&projected_grid(1, 1));
    assert_eq!(empty.date_band().unwrap().get(0, 0), None);
}
