mod common;

use approx::assert_relative_eq;
use common::{constant, date, native_params, projected_grid, raster_from_fn, rect_zone, whole_grid_zone};
use ndarray::{array, Array2};
use zonestat_core::alerts::{Confidence, FusionParams};
use zonestat_core::catalog::MemoryCatalog;
use zonestat_core::dates::{CalendarMode, EpochDateMapper};
use zonestat_core::error::ZonestatError;
use zonestat_core::export::{MeasureRow, Value};
use zonestat_core::jobs::{
    AlertsJob, BurnedAreaJob, ClassTable, CloudsJob, ForestLossJob, JobSpec, LandCoverJob, PrecipitationJob,
    ShardContext, ShardJob,
};
use zonestat_core::raster::Raster;
use zonestat_core::zonal::{ZonalAggregator, ZoneCode};

fn context(catalog: &MemoryCatalog) -> ShardContext<'_> {
    ShardContext {
        catalog,
        mapper: EpochDateMapper::new(date(2014, 12, 31), CalendarMode::Exact),
        aggregator: ZonalAggregator::new(native_params(4)).unwrap(),
        fusion: FusionParams::default(),
    }
}

fn float(row: &MeasureRow, i: usize) -> f64 {
    row.measures[i].as_f64().unwrap()
}

fn keys(rows: &[MeasureRow]) -> Vec<(i64, i32)> {
    rows.iter().map(|r| (r.code.0, r.year)).collect()
}

// ---------------------------------------------------------------------------
// Integrated alerts
// ---------------------------------------------------------------------------

/// 4x5 grid. Columns: 0 RADD high 2021, 1 RADD low 2022, 2 GLAD-L high 2022,
/// 3 RADD high 2021, 4 GLAD-S2 highest 2021.
fn alert_catalog() -> MemoryCatalog {
    let grid = projected_grid(4, 5);
    let when = date(2024, 1, 1);
    let radd_conf = [3.0, 2.0, 0.0, 3.0, 0.0];
    let radd_date = [21100.0, 22010.0, 0.0, 21200.0, 0.0];
    let gl_conf = [0.0, 0.0, 3.0, 0.0, 0.0];
    let gl_date = [0.0, 0.0, 40.0, 0.0, 0.0];
    let s2_conf = [0.0, 0.0, 0.0, 0.0, 4.0];
    let s2_date = [0.0, 0.0, 0.0, 0.0, 882.0];
    let band = |values: [f64; 5]| raster_from_fn(&grid, "b", move |_, c| values[c]);

    MemoryCatalog::new(grid.clone())
        .with("radd_alert", when, band(radd_conf))
        .unwrap()
        .with("radd_date", when, band(radd_date))
        .unwrap()
        .with("glad_l_conf22", when, band(gl_conf))
        .unwrap()
        .with("glad_l_alert_date22", when, band(gl_date))
        .unwrap()
        .with("glad_s2_alert", when, band(s2_conf))
        .unwrap()
        .with("glad_s2_date", when, band(s2_date))
        .unwrap()
}

fn alert_zones() -> Vec<zonestat_core::zonal::Zone> {
    let grid = projected_grid(4, 5);
    vec![
        rect_zone(&grid, 1, "A", (0, 0), (4, 2)),
        rect_zone(&grid, 2, "A", (0, 2), (4, 3)),
    ]
}

#[test]
fn test_alerts_hectares_per_zone_and_year() {
    let catalog = alert_catalog();
    let ctx = context(&catalog);
    let rows = AlertsJob::default()
        .materialize(&ctx, &alert_zones(), &[2021, 2022, 2023])
        .unwrap();

    assert_eq!(
        keys(&rows),
        vec![(1, 2021), (2, 2021), (1, 2022), (2, 2022), (1, 2023), (2, 2023)]
    );
    let ha: Vec<f64> = rows.iter().map(|r| float(r, 0)).collect();
    for (got, want) in ha.iter().zip([4.0, 8.0, 4.0, 4.0, 0.0, 0.0]) {
        assert_relative_eq!(*got, want, epsilon = 1e-9);
    }
}

#[test]
fn test_alerts_confidence_filter_drops_low() {
    let catalog = alert_catalog();
    let mut ctx = context(&catalog);
    ctx.fusion.confidence_filter = [Confidence::High, Confidence::Highest].into();
    let rows = AlertsJob::default().materialize(&ctx, &alert_zones(), &[2022]).unwrap();
    assert_relative_eq!(float(&rows[0], 0), 0.0);
    assert_relative_eq!(float(&rows[1], 0), 4.0);
}

#[test]
fn test_alerts_without_any_product_yield_zeros() {
    let catalog = MemoryCatalog::new(projected_grid(4, 5));
    let rows = AlertsJob::default()
        .materialize(&context(&catalog), &alert_zones(), &[2021])
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.measures == vec![Value::Float(0.0)]));
}

#[test]
fn test_alerts_job_needs_a_source() {
    let job = AlertsJob {
        radd: None,
        glad_l: Vec::new(),
        glad_s2: None,
    };
    assert!(job.validate().unwrap_err().is_configuration());
    assert!(AlertsJob::default().validate().is_ok());
}

// ---------------------------------------------------------------------------
// Burned area
// ---------------------------------------------------------------------------

#[test]
fn test_burned_area_per_year() {
    let grid = projected_grid(2, 2);
    let catalog = MemoryCatalog::new(grid.clone())
        .with("burn_date", date(2021, 3, 1), raster_from_fn(&grid, "b", |r, c| if (r, c) == (0, 0) { 45.0 } else { 0.0 }))
        .unwrap()
        .with("burn_date", date(2021, 7, 1), raster_from_fn(&grid, "b", |r, c| if (r, c) == (0, 1) { 190.0 } else { 0.0 }))
        .unwrap()
        .with("burn_date", date(2022, 7, 1), constant(&grid, "b", 0.0))
        .unwrap();
    let zones = vec![whole_grid_zone(&grid, 11)];
    let rows = BurnedAreaJob::default()
        .materialize(&context(&catalog), &zones, &[2021, 2022, 2023])
        .unwrap();
    let ha: Vec<f64> = rows.iter().map(|r| float(r, 0)).collect();
    assert_eq!(ha, vec![2.0, 0.0, 0.0]);
    assert_eq!(BurnedAreaJob::default().schema().measures(), ["burned_ha"]);
}

// ---------------------------------------------------------------------------
// Land cover
// ---------------------------------------------------------------------------

fn small_table() -> ClassTable {
    ClassTable {
        codes: vec![1, 12, 17],
        names: vec!["forest".into(), "crop".into(), "water".into()],
    }
}

#[test]
fn test_land_cover_areas_and_shares() {
    let grid = projected_grid(2, 3);
    let classes = [[1.0, 1.0, 12.0], [12.0, 12.0, 5.0]];
    let catalog = MemoryCatalog::new(grid.clone())
        .with("lc_type1", date(2021, 1, 1), raster_from_fn(&grid, "lc", |r, c| classes[r][c]))
        .unwrap();
    let job = LandCoverJob {
        product: "lc_type1".into(),
        classes: small_table(),
    };
    assert_eq!(
        job.schema().measures(),
        ["total_ha", "ha_forest", "ha_crop", "ha_water", "share_forest", "share_crop", "share_water"]
    );

    let rows = job
        .materialize(&context(&catalog), &[whole_grid_zone(&grid, 3)], &[2021, 2022])
        .unwrap();
    let r = &rows[0];
    assert_relative_eq!(float(r, 0), 6.0);
    assert_relative_eq!(float(r, 1), 2.0);
    assert_relative_eq!(float(r, 2), 3.0);
    assert_relative_eq!(float(r, 3), 0.0);
    assert_relative_eq!(float(r, 4), 2.0 / 6.0);
    assert_relative_eq!(float(r, 5), 0.5);
    assert_relative_eq!(float(r, 6), 0.0);

    // No class raster for 2022: zero areas and absent shares.
    let empty = &rows[1];
    assert_eq!(empty.year, 2022);
    assert!(empty.measures[..4].iter().all(|v| *v == Value::Float(0.0)));
    assert!(empty.measures[4..].iter().all(Value::is_null));
}

#[test]
fn test_land_cover_shares_use_full_zone_area() {
    let grid = projected_grid(2, 2);
    // Top row evergreen broadleaf (IGBP 2), bottom row unclassified.
    let lc = Raster::with_mask(
        "lc",
        grid.clone(),
        Array2::from_elem((2, 2), 2.0),
        array![[true, true], [false, false]],
    )
    .unwrap();
    let catalog = MemoryCatalog::new(grid.clone())
        .with("lc_type1", date(2021, 1, 1), lc)
        .unwrap();
    let job = LandCoverJob::default();
    let rows = job
        .materialize(&context(&catalog), &[whole_grid_zone(&grid, 1)], &[2021])
        .unwrap();

    let measures = job.schema();
    let column = |name: &str| measures.measures().iter().position(|m| m == name).unwrap();
    let r = &rows[0];
    assert_relative_eq!(float(r, column("total_ha")), 4.0);
    assert_relative_eq!(float(r, column("ha_evergreen_broadleaf")), 2.0);
    assert_relative_eq!(float(r, column("share_evergreen_broadleaf")), 0.5);
    assert_relative_eq!(float(r, column("share_water")), 0.0);
}

#[test]
fn test_zero_based_class_table() {
    let table = ClassTable::igbp_zero_based();
    assert!(table.validate().is_ok());
    assert_eq!(table.codes, (0..17).collect::<Vec<i64>>());
    let water = table.columns().into_iter().find(|c| c.code == 0).unwrap();
    assert_eq!(water.area_column(), "ha_water");
    assert!(table.names.contains(&"wetland".to_string()));
    assert!(table.names.contains(&"evergreen_needle".to_string()));
}

#[test]
fn test_class_table_validation() {
    assert!(small_table().validate().is_ok());

    let short = ClassTable {
        codes: vec![1, 2],
        names: vec!["a".into()],
    };
    assert!(matches!(
        short.validate(),
        Err(ZonestatError::ClassTableMismatch { codes: 2, names: 1 })
    ));

    let dup = ClassTable {
        codes: vec![1, 1],
        names: vec!["a".into(), "b".into()],
    };
    assert!(dup.validate().unwrap_err().is_configuration());

    let igbp = ClassTable::igbp();
    assert_eq!(igbp.codes.len(), 17);
    assert!(igbp.validate().is_ok());
    assert_eq!(LandCoverJob::default().schema().measures().len(), 1 + 2 * 17);
}

// ---------------------------------------------------------------------------
// Forest loss
// ---------------------------------------------------------------------------

#[test]
fn test_forest_loss_rates() {
    let grid = projected_grid(2, 4);
    let treecover = [80.0, 30.0, 10.0, 50.0];
    let lossyear = [[21.0, 21.0, 21.0, 22.0], [22.0, 0.0, 0.0, 21.0]];
    let when = date(2000, 1, 1);
    let catalog = MemoryCatalog::new(grid.clone())
        .with("treecover2000", when, raster_from_fn(&grid, "tc", |_, c| treecover[c]))
        .unwrap()
        .with("datamask", when, raster_from_fn(&grid, "dm", |r, c| if (r, c) == (1, 3) { 2.0 } else { 1.0 }))
        .unwrap()
        .with("lossyear", when, raster_from_fn(&grid, "ly", |r, c| lossyear[r][c]))
        .unwrap();
    let zones = vec![
        rect_zone(&grid, 1, "A", (0, 0), (2, 2)),
        rect_zone(&grid, 2, "A", (0, 2), (2, 2)),
        rect_zone(&grid, 3, "A", (0, 2), (2, 1)),
    ];

    let rows = ForestLossJob::default()
        .materialize(&context(&catalog), &zones, &[2021, 2022])
        .unwrap();
    assert_eq!(
        keys(&rows),
        vec![(1, 2021), (2, 2021), (3, 2021), (1, 2022), (2, 2022), (3, 2022)]
    );

    let expect = [
        (2.0, 4.0, Some(0.5)),
        (0.0, 1.0, Some(0.0)),
        (0.0, 0.0, None),
        (1.0, 4.0, Some(0.25)),
        (1.0, 1.0, Some(1.0)),
        (0.0, 0.0, None),
    ];
    for (row, (loss, base, rate)) in rows.iter().zip(expect) {
        assert_relative_eq!(float(row, 0), loss);
        assert_relative_eq!(float(row, 1), base);
        assert_eq!(row.measures[2].as_f64(), rate);
    }
}

#[test]
fn test_forest_loss_without_inputs() {
    let grid = projected_grid(2, 2);
    let catalog = MemoryCatalog::new(grid.clone());
    let rows = ForestLossJob::default()
        .materialize(&context(&catalog), &[whole_grid_zone(&grid, 1)], &[2021])
        .unwrap();
    assert_eq!(
        rows[0].measures,
        vec![Value::Float(0.0), Value::Float(0.0), Value::Null]
    );
}

#[test]
fn test_forest_threshold_validated() {
    let job = ForestLossJob {
        threshold: 120.0,
        ..ForestLossJob::default()
    };
    assert!(job.validate().unwrap_err().is_configuration());
}

// ---------------------------------------------------------------------------
// Precipitation and clouds
// ---------------------------------------------------------------------------

#[test]
fn test_precipitation_calendar_and_rainy_season() {
    let grid = projected_grid(1, 1);
    let mut catalog = MemoryCatalog::new(grid.clone());
    for (d, v) in [
        (date(2020, 11, 15), 100.0),
        (date(2020, 12, 15), 50.0),
        (date(2021, 2, 10), 30.0),
        (date(2021, 5, 1), 20.0),
        (date(2021, 12, 1), 10.0),
    ] {
        catalog.insert("chirps_precipitation", d, constant(&grid, "p", v)).unwrap();
    }
    let rows = PrecipitationJob::default()
        .materialize(&context(&catalog), &[whole_grid_zone(&grid, 5)], &[2021, 2022])
        .unwrap();

    assert_relative_eq!(float(&rows[0], 0), 60.0);
    assert_relative_eq!(float(&rows[0], 1), 180.0);
    assert!(rows[1].measures[0].is_null());
    assert_relative_eq!(float(&rows[1], 1), 10.0);
}

#[test]
fn test_cloud_shares() {
    let grid = projected_grid(1, 2);
    let catalog = MemoryCatalog::new(grid.clone())
        .with("cloud_probability", date(2021, 2, 1), raster_from_fn(&grid, "c", |_, c| [20.0, 80.0][c]))
        .unwrap()
        .with("cloud_probability", date(2021, 8, 1), raster_from_fn(&grid, "c", |_, c| [40.0, 80.0][c]))
        .unwrap();
    let rows = CloudsJob::default()
        .materialize(&context(&catalog), &[whole_grid_zone(&grid, 8)], &[2021, 2022])
        .unwrap();

    assert_eq!(rows[0].code, ZoneCode(8));
    assert_relative_eq!(float(&rows[0], 0), 0.55, epsilon = 1e-12);
    assert_relative_eq!(float(&rows[0], 1), 0.45, epsilon = 1e-12);
    assert!(rows[1].measures.iter().all(Value::is_null));
}

// ---------------------------------------------------------------------------
// Job selection
// ---------------------------------------------------------------------------

#[test]
fn test_job_spec_names() {
    let specs = [
        JobSpec::Alerts(AlertsJob::default()),
        JobSpec::BurnedArea(BurnedAreaJob::default()),
        JobSpec::LandCover(LandCoverJob::default()),
        JobSpec::ForestLoss(ForestLossJob::default()),
        JobSpec::Precipitation(PrecipitationJob::default()),
        JobSpec::Clouds(CloudsJob::default()),
    ];
    let names: Vec<&str> = specs.iter().map(|s| s.job().name()).collect();
    assert_eq!(
        names,
        vec!["integrated_alerts", "burned_ha", "landcover", "forestloss", "precip", "cloud"]
    );
    assert_eq!(JobSpec::default(), JobSpec::Alerts(AlertsJob::default()));
}
