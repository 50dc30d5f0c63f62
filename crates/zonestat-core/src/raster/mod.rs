pub mod composite;
pub mod grid;
pub mod io;
pub mod layer;

pub use composite::{composite, Composite};
pub use grid::{Crs, GridSpec};
pub use layer::{area_ha, Raster};
