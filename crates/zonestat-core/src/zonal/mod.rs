pub mod aggregate;
pub mod geometry;
pub mod zone;

pub use aggregate::{AggregateParams, Reducer, ZonalAggregator, ZoneFragment};
pub use geometry::{BBox, MultiPolygon, Polygon};
pub use zone::{load_zones, parse_zones, Zone, ZoneCode, ZoneFields, ZoneMeta};
