pub mod error;
pub mod consts;
pub mod raster;
pub mod dates;
pub mod alerts;
pub mod zonal;
pub mod join;
pub mod export;
pub mod catalog;
pub mod jobs;
pub mod pipeline;
