pub mod buffer;
pub mod fusion;
pub mod normalize;
pub mod types;

pub use fusion::{integrate, BufferConfig, FusionParams, RuleSet};
pub use normalize::{AlertNormalizer, DateEncoding, RawAlertBands, SourceSchema};
pub use types::{AlertLayer, AlertPixel, Confidence};
