//! Seams between the tile extent generator and the geospatial I/O layer.

use std::path::Path;

use crate::affine::AffineTransform;
use crate::error::Result;
use crate::level::RasterLevel;
use crate::tiling::TilePolygon;

/// Coordinate reference system of the input raster, passed on to every output layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpatialReference {
    Epsg(u32),
    Wkt(String),
}

impl SpatialReference {
    pub fn epsg(&self) -> Option<u32> {
        match self {
            SpatialReference::Epsg(code) => Some(*code),
            SpatialReference::Wkt(_) => None,
        }
    }
}

/// Read side: the structure of an opened raster dataset, always seen through its
/// first band.
pub trait RasterSource {
    /// Size of the full resolution image.
    fn raster_size(&self) -> (usize, usize);

    fn overview_count(&self) -> Result<usize>;

    /// Level 0 is the full resolution band, level `n` the overview `n - 1` of the
    /// band. Levels past the last overview are an error.
    fn level(&self, index: usize) -> Result<RasterLevel>;

    /// Georeferencing of the full resolution image. Rasters without one report
    /// [`AffineTransform::identity`].
    fn geo_transform(&self) -> AffineTransform;

    fn spatial_ref(&self) -> Option<SpatialReference>;
}

/// Write side: an output vector dataset receiving one polygon layer per level.
pub trait VectorSink {
    /// Creates a polygon layer named `name` and streams `tiles` into it as features.
    /// Returns the number of features written.
    fn write_layer<I>(
        &mut self,
        name: &str,
        srs: Option<&SpatialReference>,
        tiles: I,
    ) -> Result<u64>
    where
        I: Iterator<Item = TilePolygon>;

    /// Flushes and closes the dataset. Written data is only guaranteed to be on
    /// disk once this returns.
    fn close(self) -> Result<()>;
}

/// Entry point to a set of registered raster and vector drivers.
///
/// Implementations register their drivers once, when they are constructed.
pub trait Backend {
    type Raster: RasterSource;
    type Vector: VectorSink;

    fn open_raster(&mut self, path: &Path) -> Result<Self::Raster>;

    fn create_vector(&mut self, driver: &str, path: &Path) -> Result<Self::Vector>;
}
