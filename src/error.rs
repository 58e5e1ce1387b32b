use std::path::PathBuf;

use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TileExtentError {
    /// General error.
    #[error("General error: {0}")]
    General(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The raster could not be decoded as a (Geo)TIFF.
    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "gdal")]
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    /// `-ovr` was given something that is not an integer.
    #[error("invalid overview level '{0}'")]
    InvalidOverviewArgument(String),

    /// The requested level does not exist on the first band.
    #[error("overview level {level} does not exist (raster has {count} overviews)")]
    OverviewOutOfRange { level: i64, count: usize },

    /// A level reported a zero size or block size.
    #[error("invalid raster level {level}: {reason}")]
    InvalidLevel { level: usize, reason: String },

    #[error("Cannot guess driver for {}", .0.display())]
    CannotGuessDriver(PathBuf),

    #[error("driver '{0}' is not available in this build")]
    DriverUnavailable(String),

    /// The output format cannot hold another layer.
    #[error("driver '{driver}' cannot store more than one layer (refusing to create '{layer}')")]
    LayerLimit { driver: String, layer: String },

    #[error("{} contains no full resolution image", .0.display())]
    MissingBaseImage(PathBuf),
}

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, TileExtentError>;
