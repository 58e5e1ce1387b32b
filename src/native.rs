//! Pure Rust backend: GeoTIFF input through [`COGReader`], GeoJSON output.

use std::path::Path;

use tracing::debug;

use crate::cog::COGReader;
use crate::error::{Result, TileExtentError};
use crate::geojson::{GeoJsonSink, DRIVER_NAME};
use crate::source::Backend;

/// Backend built into every build of the crate.
#[derive(Debug, Default)]
pub struct NativeBackend;

impl NativeBackend {
    /// Makes the native drivers available. There is no global registry to fill.
    pub fn register() -> Self {
        debug!(raster = "GTiff", vector = DRIVER_NAME, "registered native drivers");
        Self
    }
}

impl Backend for NativeBackend {
    type Raster = COGReader;
    type Vector = GeoJsonSink;

    fn open_raster(&mut self, path: &Path) -> Result<COGReader> {
        COGReader::try_open(path)
    }

    fn create_vector(&mut self, driver: &str, path: &Path) -> Result<GeoJsonSink> {
        if !driver.eq_ignore_ascii_case(DRIVER_NAME) {
            return Err(TileExtentError::DriverUnavailable(driver.to_string()));
        }
        GeoJsonSink::create(path)
    }
}
