//! Output driver inference from a dataset name.

use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Result, TileExtentError};

pub const DEFAULT_RASTER_DRIVER: &str = "GTiff";
pub const DEFAULT_VECTOR_DRIVER: &str = "ESRI Shapefile";

/// Connection prefixes of database drivers that have no file extension.
const VECTOR_PREFIXES: &[(&str, &str)] = &[
    ("PG:", "PostgreSQL"),
    ("MySQL:", "MySQL"),
    ("OCI:", "OCI"),
];

/// Vector drivers that can create datasets, by lower-case extension.
/// Order within an entry is the order in which GDAL registers the drivers.
const VECTOR_EXTENSIONS: &[(&str, &[&str])] = &[
    ("shp", &["ESRI Shapefile"]),
    ("dbf", &["ESRI Shapefile"]),
    ("shp.zip", &["ESRI Shapefile"]),
    ("gpkg", &["GPKG"]),
    ("gpkg.zip", &["GPKG"]),
    ("geojson", &["GeoJSON"]),
    ("json", &["GeoJSON"]),
    ("geojsonl", &["GeoJSONSeq"]),
    ("geojsons", &["GeoJSONSeq"]),
    ("fgb", &["FlatGeobuf"]),
    ("kml", &["KML", "LIBKML"]),
    ("kmz", &["LIBKML"]),
    ("gml", &["GML"]),
    ("gpx", &["GPX"]),
    ("csv", &["CSV"]),
    ("sqlite", &["SQLite"]),
    ("db", &["SQLite"]),
    ("tab", &["MapInfo File"]),
    ("mif", &["MapInfo File"]),
    ("dxf", &["DXF"]),
    ("jml", &["JML"]),
    ("parquet", &["Parquet"]),
    ("arrow", &["Arrow"]),
    ("arrows", &["Arrow"]),
    ("feather", &["Arrow"]),
    ("ipc", &["Arrow"]),
    ("xlsx", &["XLSX"]),
    ("ods", &["ODS"]),
];

const RASTER_EXTENSIONS: &[(&str, &[&str])] = &[
    ("tif", &["GTiff", "COG"]),
    ("tiff", &["GTiff", "COG"]),
    ("vrt", &["VRT"]),
    ("png", &["PNG"]),
    ("jpg", &["JPEG"]),
    ("jpeg", &["JPEG"]),
    ("img", &["HFA"]),
    ("nc", &["netCDF"]),
    ("gpkg", &["GPKG"]),
    ("mbtiles", &["MBTiles"]),
    ("jp2", &["JP2OpenJPEG"]),
    ("webp", &["WEBP"]),
    ("asc", &["AAIGrid"]),
    ("ers", &["ERS"]),
    ("bmp", &["BMP"]),
];

/// Lower-cased extension of `name`, keeping a `.zip` suffix together with the
/// extension in front of it (`roads.shp.zip` -> `shp.zip`).
fn extension(name: &str) -> Option<String> {
    let file_name = Path::new(name).file_name()?.to_str()?.to_ascii_lowercase();
    let (stem, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    if ext == "zip" {
        if let Some((_, inner)) = stem.rsplit_once('.') {
            if !inner.is_empty() {
                return Some(format!("{inner}.zip"));
            }
        }
    }
    Some(ext.to_string())
}

/// Every driver able to create `name`, best match first.
pub fn output_drivers_for(name: &str, is_raster: bool) -> Vec<&'static str> {
    if !is_raster {
        if let Some((_, driver)) = VECTOR_PREFIXES
            .iter()
            .find(|(prefix, _)| name.starts_with(prefix))
        {
            return vec![*driver];
        }
    }
    let Some(ext) = extension(name) else {
        return Vec::new();
    };
    let table = if is_raster {
        RASTER_EXTENSIONS
    } else {
        VECTOR_EXTENSIONS
    };
    table
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, drivers)| drivers.to_vec())
        .unwrap_or_default()
}

/// Picks the driver used to create `path` when no format was given explicitly.
pub fn output_driver_for(path: &Path, is_raster: bool) -> Result<&'static str> {
    let name = path.to_string_lossy();
    if name.is_empty() {
        return Ok(if is_raster { "MEM" } else { "Memory" });
    }

    let drivers = output_drivers_for(&name, is_raster);
    match drivers.as_slice() {
        [] => match extension(&name) {
            None => Ok(if is_raster {
                DEFAULT_RASTER_DRIVER
            } else {
                DEFAULT_VECTOR_DRIVER
            }),
            Some(_) => Err(TileExtentError::CannotGuessDriver(path.to_path_buf())),
        },
        [first, rest @ ..] => {
            if !rest.is_empty() && drivers[..2] != ["GTiff", "COG"] {
                warn!(
                    "Several drivers matching {} extension. Using {first}",
                    extension(&name).unwrap_or_default()
                );
            }
            debug!(path = %name, driver = *first, "inferred output driver");
            Ok(*first)
        }
    }
}
