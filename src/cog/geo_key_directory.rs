use std::collections::HashMap;
use std::io;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use tiff::decoder::ifd::Value;
use tiff::{TiffError, TiffResult};

/// Location value of a GeoKey stored inline in the directory.
const INLINE_LOCATION: u16 = 0;
const GEO_DOUBLE_PARAMS_TAG: u16 = 34736;
const GEO_ASCII_PARAMS_TAG: u16 = 34737;

/// Code meaning "user-defined" for GeoTIFF CRS keys.
const USER_DEFINED: u16 = 32767;
const RASTER_PIXEL_IS_POINT: u16 = 2;

#[derive(Clone, Copy, Debug, PartialEq, TryFromPrimitive, IntoPrimitive, Eq, Hash)]
#[repr(u16)]
pub enum GeoKeyTag {
    // GeoTIFF configuration keys
    RasterType = 1025,
    Citation = 1026,

    // Geodetic CRS Parameter Keys
    GeographicType = 2048,
    GeogCitation = 2049,

    // Projected CRS Parameter Keys
    ProjectedType = 3072,
    ProjCitation = 3073,
}

/// The subset of the GeoKey directory needed to georeference block extents.
///
/// http://docs.opengeospatial.org/is/19-008r4/19-008r4.html#_requirements_class_geokeydirectorytag
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoKeyDirectory {
    raster_type: Option<u16>,
    citation: Option<String>,

    geographic_type: Option<u16>,
    geog_citation: Option<String>,

    projected_type: Option<u16>,
    proj_citation: Option<String>,
}

impl GeoKeyDirectory {
    /// Decodes the `GeoKeyDirectoryTag` shorts, resolving keys stored in the double
    /// and ascii parameter tags. Keys this crate does not use are skipped.
    pub(crate) fn from_raw(
        directory: &[u16],
        double_params: Option<&[f64]>,
        ascii_params: Option<&str>,
    ) -> TiffResult<Self> {
        let malformed = |reason: String| {
            TiffError::IoError(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("GeoKeyDirectory: {reason}"),
            ))
        };

        let [_version, _revision, _minor, key_count, entries @ ..] = directory else {
            return Err(malformed("missing header".to_string()));
        };
        let key_count = usize::from(*key_count);
        if entries.len() < key_count * 4 {
            return Err(malformed(format!(
                "{key_count} keys declared, room for {}",
                entries.len() / 4
            )));
        }

        let mut tag_data = HashMap::with_capacity(key_count);
        for entry in entries.chunks_exact(4).take(key_count) {
            let (key, location, count, value) = (
                entry[0],
                entry[1],
                usize::from(entry[2]),
                usize::from(entry[3]),
            );
            let Ok(tag) = GeoKeyTag::try_from(key) else {
                continue;
            };

            let value = match location {
                INLINE_LOCATION => Value::Short(entry[3]),
                GEO_DOUBLE_PARAMS_TAG => {
                    let doubles = double_params
                        .and_then(|params| params.get(value..value + count))
                        .ok_or_else(|| malformed(format!("key {key} points past double params")))?;
                    match doubles {
                        [single] => Value::Double(*single),
                        many => Value::List(many.iter().map(|v| Value::Double(*v)).collect()),
                    }
                }
                GEO_ASCII_PARAMS_TAG => {
                    let text = ascii_params
                        .and_then(|params| params.get(value..value + count))
                        .ok_or_else(|| malformed(format!("key {key} points past ascii params")))?;
                    let text = text.trim_end_matches(|c: char| c == '|' || c == '\0');
                    Value::Ascii(text.to_string())
                }
                other => {
                    return Err(malformed(format!(
                        "key {key} stored in unsupported tag {other}"
                    )))
                }
            };
            tag_data.insert(tag, value);
        }

        Self::from_tags(tag_data)
    }

    pub(crate) fn from_tags(mut tag_data: HashMap<GeoKeyTag, Value>) -> TiffResult<Self> {
        let mut directory = Self::default();

        tag_data.drain().try_for_each(|(tag, value)| {
            match tag {
                GeoKeyTag::RasterType => directory.raster_type = Some(value.into_u16()?),
                GeoKeyTag::Citation => directory.citation = Some(value.into_string()?),
                GeoKeyTag::GeographicType => directory.geographic_type = Some(value.into_u16()?),
                GeoKeyTag::GeogCitation => directory.geog_citation = Some(value.into_string()?),
                GeoKeyTag::ProjectedType => directory.projected_type = Some(value.into_u16()?),
                GeoKeyTag::ProjCitation => directory.proj_citation = Some(value.into_string()?),
            };
            Ok::<_, TiffError>(())
        })?;

        Ok(directory)
    }

    /// Return the EPSG code representing the crs of the image.
    ///
    /// User-defined codes are not EPSG codes and give `None`.
    pub fn epsg_code(&self) -> Option<u16> {
        let code = if let Some(projected_type) = self.projected_type {
            Some(projected_type)
        } else {
            self.geographic_type
        };
        code.filter(|&code| code != 0 && code != USER_DEFINED)
    }

    /// Whether pixel values refer to pixel centres rather than pixel areas.
    pub fn is_pixel_is_point(&self) -> bool {
        self.raster_type == Some(RASTER_PIXEL_IS_POINT)
    }

    pub fn citation(&self) -> Option<&str> {
        self.proj_citation
            .as_deref()
            .or(self.citation.as_deref())
            .or(self.geog_citation.as_deref())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn projected_inline_keys() {
        let raw = [1, 1, 0, 3, 1024, 0, 1, 1, 1025, 0, 1, 1, 3072, 0, 1, 32611];
        let keys = GeoKeyDirectory::from_raw(&raw, None, None).unwrap();
        assert_eq!(keys.epsg_code(), Some(32611));
        assert!(!keys.is_pixel_is_point());
    }

    #[test]
    fn geographic_with_params() {
        #[rustfmt::skip]
        let raw = [
            1, 1, 0, 4,
            1024, 0, 1, 2,
            1025, 0, 1, 2,
            2048, 0, 1, 4326,
            2049, 34737, 7, 0,
        ];
        let keys = GeoKeyDirectory::from_raw(&raw, None, Some("WGS 84|")).unwrap();
        assert_eq!(keys.epsg_code(), Some(4326));
        assert!(keys.is_pixel_is_point());
        assert_eq!(keys.citation(), Some("WGS 84"));
    }

    #[test]
    fn unknown_keys_are_skipped() {
        // 1024 (model type) and 2057 (semi major axis, a double param) are not tracked
        let raw = [1, 1, 0, 3, 1024, 0, 1, 1, 2057, 34736, 1, 0, 3072, 0, 1, 3857];
        let keys = GeoKeyDirectory::from_raw(&raw, Some(&[6378137.0]), None).unwrap();
        assert_eq!(keys.epsg_code(), Some(3857));
    }

    #[test]
    fn user_defined_is_not_epsg() {
        let raw = [1, 1, 0, 1, 3072, 0, 1, 32767];
        let keys = GeoKeyDirectory::from_raw(&raw, None, None).unwrap();
        assert_eq!(keys.epsg_code(), None);
    }

    #[test]
    fn truncated_directory() {
        assert!(GeoKeyDirectory::from_raw(&[1, 1], None, None).is_err());
        assert!(GeoKeyDirectory::from_raw(&[1, 1, 0, 2, 3072, 0, 1, 32611], None, None).is_err());
        let dangling = [1, 1, 0, 1, 2049, 34737, 7, 0];
        assert!(GeoKeyDirectory::from_raw(&dangling, None, None).is_err());
    }
}
