use chrono::NaiveDate;

/// Square metres per hectare.
pub const M2_PER_HA: f64 = 10_000.0;

/// Mean Earth radius (IUGG) in metres, used for geographic pixel areas.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Minimum pixel count (rows*cols) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Confidence code stored for pixels without an alert.
pub const CONFIDENCE_CODE_NONE: u8 = 0;

/// Confidence code for a single unconfirmed detection.
pub const CONFIDENCE_CODE_LOW: u8 = 2;

/// Confidence code for a confirmed detection.
pub const CONFIDENCE_CODE_HIGH: u8 = 3;

/// Confidence code for the strongest detections.
pub const CONFIDENCE_CODE_HIGHEST: u8 = 4;

/// Year offset of the forest-loss `lossyear` band (1 means 2001).
pub const LOSS_YEAR_BASE: i32 = 2000;

/// Default tree-cover threshold (percent) for the year-2000 forest mask.
pub const DEFAULT_TREECOVER_THRESHOLD: f64 = 30.0;

/// Default reduction resolution in grid units.
pub const DEFAULT_RESOLUTION: f64 = 1000.0;

/// Default tile subdivision factor per zone.
pub const DEFAULT_TILE_FACTOR: usize = 4;

/// Default number of shards materialized concurrently.
pub const DEFAULT_WORKERS: usize = 4;

/// Default number of attempts per shard before it is reported as failed.
pub const DEFAULT_MAX_ATTEMPTS: usize = 2;

/// First month (November of the previous year) of the rainy season window.
pub const RAINY_SEASON_START_MONTH: u32 = 11;

/// Month (April) at which the rainy season window ends, exclusive.
pub const RAINY_SEASON_END_MONTH: u32 = 4;

/// Relative tolerance used when converting a resolution to a pixel factor.
pub const RESOLUTION_EPSILON: f64 = 1e-6;

/// Day zero of the GLAD-S2 date band.
pub const GLAD_S2_EPOCH: NaiveDate = ymd(2019, 1, 1);

/// Default day-offset epoch of integrated alert layers.
pub const DEFAULT_EPOCH: NaiveDate = ymd(2014, 12, 31);

/// Calendar date checked at compile time.
const fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => panic!("invalid calendar constant"),
    }
}
