//! GDAL backend: any raster GDAL can open, any OGR vector driver as output.

use std::path::Path;

use gdal::spatial_ref::SpatialRef;
use gdal::vector::{Geometry, LayerAccess, LayerOptions, OGRwkbGeometryType};
use gdal::{Dataset, DriverManager};
use tracing::debug;

use crate::affine::AffineTransform;
use crate::error::{Result, TileExtentError};
use crate::level::RasterLevel;
use crate::source::{Backend, RasterSource, SpatialReference, VectorSink};
use crate::tiling::TilePolygon;

/// Backend over the GDAL/OGR driver registry.
#[derive(Debug)]
pub struct GdalBackend;

impl GdalBackend {
    /// Registers every GDAL and OGR driver compiled into the linked library.
    pub fn register() -> Self {
        DriverManager::register_all();
        debug!(drivers = DriverManager::count(), "registered GDAL drivers");
        Self
    }
}

impl Backend for GdalBackend {
    type Raster = GdalRaster;
    type Vector = GdalVectorSink;

    fn open_raster(&mut self, path: &Path) -> Result<GdalRaster> {
        Ok(GdalRaster {
            dataset: Dataset::open(path)?,
        })
    }

    fn create_vector(&mut self, driver: &str, path: &Path) -> Result<GdalVectorSink> {
        let driver = DriverManager::get_driver_by_name(driver)?;
        let dataset = driver.create_vector_only(path)?;
        Ok(GdalVectorSink { dataset })
    }
}

/// A raster dataset seen through its first band.
pub struct GdalRaster {
    dataset: Dataset,
}

impl RasterSource for GdalRaster {
    fn raster_size(&self) -> (usize, usize) {
        self.dataset.raster_size()
    }

    fn overview_count(&self) -> Result<usize> {
        let count = self.dataset.rasterband(1)?.overview_count()?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn level(&self, index: usize) -> Result<RasterLevel> {
        let band = self.dataset.rasterband(1)?;
        let (size, block_size) = if index == 0 {
            (band.size(), band.block_size())
        } else {
            let count = self.overview_count()?;
            if index > count {
                return Err(TileExtentError::OverviewOutOfRange {
                    level: index as i64,
                    count,
                });
            }
            let overview_index = (index - 1)
                .try_into()
                .map_err(|_| TileExtentError::OverviewOutOfRange {
                    level: index as i64,
                    count,
                })?;
            let overview = band.overview(overview_index)?;
            (overview.size(), overview.block_size())
        };
        RasterLevel::try_new(index, size, block_size)
    }

    fn geo_transform(&self) -> AffineTransform {
        self.dataset
            .geo_transform()
            .map(AffineTransform::from_gdal)
            .unwrap_or_default()
    }

    fn spatial_ref(&self) -> Option<SpatialReference> {
        let wkt = self.dataset.spatial_ref().ok()?.to_wkt().ok()?;
        (!wkt.is_empty()).then_some(SpatialReference::Wkt(wkt))
    }
}

/// An OGR vector dataset, closed when dropped.
pub struct GdalVectorSink {
    dataset: Dataset,
}

impl VectorSink for GdalVectorSink {
    fn write_layer<I>(
        &mut self,
        name: &str,
        srs: Option<&SpatialReference>,
        tiles: I,
    ) -> Result<u64>
    where
        I: Iterator<Item = TilePolygon>,
    {
        let srs = match srs {
            Some(SpatialReference::Epsg(code)) => Some(SpatialRef::from_epsg(*code)?),
            Some(SpatialReference::Wkt(wkt)) => Some(SpatialRef::from_wkt(wkt)?),
            None => None,
        };
        let mut layer = self.dataset.create_layer(LayerOptions {
            name,
            srs: srs.as_ref(),
            ty: OGRwkbGeometryType::wkbPolygon,
            options: None,
        })?;

        let mut count = 0u64;
        for tile in tiles {
            let geometry = Geometry::from_wkt(&tile.to_wkt())?;
            layer.create_feature(geometry)?;
            count += 1;
        }
        Ok(count)
    }

    fn close(self) -> Result<()> {
        // GDALClose flushes pending features
        drop(self.dataset);
        Ok(())
    }
}
