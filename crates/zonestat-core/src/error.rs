use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZonestatError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unknown ruleset id: {0}")]
    UnknownRuleset(String),

    #[error("Non-monotonic year range: {start}..={end}")]
    NonMonotonicYearRange { start: i32, end: i32 },

    #[error("Invalid resolution: {0} (must be > 0)")]
    InvalidResolution(f64),

    #[error("Invalid tile factor: {0} (must be >= 1)")]
    InvalidTileFactor(usize),

    #[error("Class table mismatch: {codes} codes but {names} names")]
    ClassTableMismatch { codes: usize, names: usize },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Grid mismatch: expected {expected}, got {actual}")]
    GridMismatch { expected: String, actual: String },

    #[error("Unsupported pixel format in {0}")]
    UnsupportedPixelFormat(String),

    #[error("Invalid zone geometry: {0}")]
    InvalidGeometry(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    #[error("Shard {shard} failed: {message}")]
    ShardFailed { shard: String, message: String },
}

impl ZonestatError {
    /// Fatal errors that must abort a run before any shard is scheduled.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownRuleset(_)
                | Self::NonMonotonicYearRange { .. }
                | Self::InvalidResolution(_)
                | Self::InvalidTileFactor(_)
                | Self::ClassTableMismatch { .. }
                | Self::Configuration(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ZonestatError>;
