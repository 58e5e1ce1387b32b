//! Vector layers describing the block (tile) structure of a raster and its overviews.

mod affine;
pub mod args;
pub mod cli;
mod cog;
pub mod driver;
pub mod error;
pub mod generator;
mod geojson;
mod level;
pub mod logging;
mod native;
mod source;
mod tiling;

#[cfg(feature = "gdal")]
mod gdal_backend;

pub use affine::AffineTransform;
pub use cog::{COGReader, GeoKeyDirectory};
pub use error::{Result, TileExtentError};
pub use geojson::GeoJsonSink;
pub use level::{layer_name, BlockGrid, LevelSelection, RasterLevel};
pub use native::NativeBackend;
pub use source::{Backend, RasterSource, SpatialReference, VectorSink};
pub use tiling::{LevelTiles, TilePolygon};

#[cfg(feature = "gdal")]
pub use gdal_backend::{GdalBackend, GdalRaster, GdalVectorSink};
