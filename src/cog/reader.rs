use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use tiff::decoder::{Decoder, Limits};
use tracing::debug;

use crate::affine::AffineTransform;
use crate::cog::ifd::{GeoTags, ImageFileDirectories, ImageIFD};
use crate::error::{Result, TileExtentError};
use crate::level::RasterLevel;
use crate::source::{RasterSource, SpatialReference};

/// Tiling structure of a GeoTIFF / COG, read from its IFDs without decoding pixels.
#[derive(Clone, Debug)]
pub struct COGReader {
    path: PathBuf,
    base: ImageIFD,
    overviews: Vec<ImageIFD>,
    transform: AffineTransform,
    srs: Option<SpatialReference>,
}

impl COGReader {
    pub fn try_open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), path)
    }

    /// Reads the structure from any seekable TIFF stream; `path` is only used in
    /// messages.
    pub fn from_reader<R: Read + Seek>(reader: R, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut decoder = Decoder::new(reader)?.with_limits(Limits::unlimited());
        let ifds = ImageFileDirectories::read(&mut decoder)?;
        let masks = ifds.mask_count();

        let (base, overviews) = ifds
            .into_pyramid()
            .ok_or_else(|| TileExtentError::MissingBaseImage(path.clone()))?;
        let geo = base.geo.clone().unwrap_or_default();
        let transform = geo_transform(&geo);
        let srs = geo
            .geo_keys
            .as_ref()
            .and_then(|keys| keys.epsg_code())
            .map(|code| SpatialReference::Epsg(u32::from(code)));

        debug!(
            path = %path.display(),
            width = base.width,
            height = base.height,
            overviews = overviews.len(),
            masks,
            epsg = srs.as_ref().and_then(SpatialReference::epsg),
            citation = geo.geo_keys.as_ref().and_then(|keys| keys.citation()),
            "opened GeoTIFF"
        );

        Ok(Self {
            path,
            base,
            overviews,
            transform,
            srs,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RasterSource for COGReader {
    fn raster_size(&self) -> (usize, usize) {
        (self.base.width, self.base.height)
    }

    fn overview_count(&self) -> Result<usize> {
        Ok(self.overviews.len())
    }

    fn level(&self, index: usize) -> Result<RasterLevel> {
        let ifd = if index == 0 {
            &self.base
        } else {
            self.overviews
                .get(index - 1)
                .ok_or(TileExtentError::OverviewOutOfRange {
                    level: index as i64,
                    count: self.overviews.len(),
                })?
        };
        RasterLevel::try_new(
            index,
            (ifd.width, ifd.height),
            (ifd.block_width, ifd.block_height),
        )
    }

    fn geo_transform(&self) -> AffineTransform {
        self.transform
    }

    fn spatial_ref(&self) -> Option<SpatialReference> {
        self.srs.clone()
    }
}

/// Geotransform from the model transformation matrix, or else from the first tie point
/// and the pixel scale. Images without either are not georeferenced and get the
/// identity transform.
fn geo_transform(geo: &GeoTags) -> AffineTransform {
    let transform = match (&geo.transformation, &geo.tiepoints, &geo.pixel_scale) {
        (Some(m), _, _) if m.len() >= 16 => {
            AffineTransform::new(m[3], m[0], m[1], m[7], m[4], m[5])
        }
        (_, Some(tie), Some(scale)) if tie.len() >= 6 && scale.len() >= 2 => {
            let pixel_width = scale[0];
            let pixel_height = -scale[1];
            AffineTransform::new(
                tie[3] - tie[0] * pixel_width,
                pixel_width,
                0.0,
                tie[4] - tie[1] * pixel_height,
                0.0,
                pixel_height,
            )
        }
        _ => return AffineTransform::identity(),
    };

    let pixel_is_point = geo
        .geo_keys
        .as_ref()
        .is_some_and(|keys| keys.is_pixel_is_point());
    if !pixel_is_point {
        return transform;
    }
    // tie points name pixel centres, move the origin to the corner of the first pixel
    AffineTransform::new(
        transform.origin_x() - (transform.pixel_width() * 0.5 + transform.row_rotation() * 0.5),
        transform.pixel_width(),
        transform.row_rotation(),
        transform.origin_y() - (transform.col_rotation() * 0.5 + transform.pixel_height() * 0.5),
        transform.col_rotation(),
        transform.pixel_height(),
    )
}
