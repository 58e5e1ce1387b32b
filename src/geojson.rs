//! Streaming GeoJSON writer for block extent layers.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, TileExtentError};
use crate::source::{SpatialReference, VectorSink};
use crate::tiling::TilePolygon;

pub const DRIVER_NAME: &str = "GeoJSON";

/// EPSG code GeoJSON coordinates are assumed to be in when no `crs` member is present.
const DEFAULT_EPSG: u32 = 4326;

#[derive(Serialize)]
struct Feature<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    properties: &'a Map<String, Value>,
    geometry: Polygon,
}

#[derive(Serialize)]
struct Polygon {
    #[serde(rename = "type")]
    kind: &'static str,
    coordinates: [[[f64; 2]; 5]; 1],
}

impl From<&TilePolygon> for Polygon {
    fn from(tile: &TilePolygon) -> Self {
        Self {
            kind: "Polygon",
            coordinates: [tile.ring()],
        }
    }
}

#[derive(Debug)]
enum Target {
    /// A single FeatureCollection file, created up front. Holds at most one layer.
    File {
        path: PathBuf,
        writer: Option<BufWriter<File>>,
    },
    /// One `<layer>.geojson` file per layer.
    Directory(PathBuf),
}

/// GeoJSON output dataset.
///
/// A path with an extension is a single FeatureCollection file, a path without one
/// is a directory receiving a file per layer.
#[derive(Debug)]
pub struct GeoJsonSink {
    target: Target,
    layers: usize,
}

impl GeoJsonSink {
    pub fn create(path: &Path) -> Result<Self> {
        let target = if path.extension().is_some() {
            let writer = BufWriter::new(File::create(path)?);
            Target::File {
                path: path.to_path_buf(),
                writer: Some(writer),
            }
        } else {
            fs::create_dir_all(path)?;
            Target::Directory(path.to_path_buf())
        };
        Ok(Self { target, layers: 0 })
    }
}

impl VectorSink for GeoJsonSink {
    fn write_layer<I>(
        &mut self,
        name: &str,
        srs: Option<&SpatialReference>,
        tiles: I,
    ) -> Result<u64>
    where
        I: Iterator<Item = TilePolygon>,
    {
        let first = self.layers == 0;
        let count = match &mut self.target {
            Target::File { writer, .. } => {
                let Some(writer) = writer.as_mut().filter(|_| first) else {
                    return Err(TileExtentError::LayerLimit {
                        driver: DRIVER_NAME.to_string(),
                        layer: name.to_string(),
                    });
                };
                write_collection(writer, name, srs, tiles)?
            }
            Target::Directory(dir) => {
                let path = dir.join(format!("{name}.geojson"));
                let mut writer = BufWriter::new(File::create(&path)?);
                let count = write_collection(&mut writer, name, srs, tiles)?;
                writer.flush()?;
                count
            }
        };
        self.layers += 1;
        Ok(count)
    }

    fn close(self) -> Result<()> {
        if let Target::File {
            path,
            writer: Some(mut writer),
        } = self.target
        {
            if self.layers == 0 {
                // an empty dataset is still a valid document
                write!(writer, r#"{{"type":"FeatureCollection","features":[]}}"#)?;
                writeln!(writer)?;
            }
            writer
                .into_inner()
                .map_err(|e| e.into_error())?
                .sync_all()
                .map_err(|e| {
                    TileExtentError::General(format!("cannot flush {}: {e}", path.display()))
                })?;
        }
        Ok(())
    }
}

/// Writes one FeatureCollection, feature by feature.
fn write_collection<W, I>(
    writer: &mut W,
    name: &str,
    srs: Option<&SpatialReference>,
    tiles: I,
) -> Result<u64>
where
    W: Write,
    I: Iterator<Item = TilePolygon>,
{
    write!(writer, r#"{{"type":"FeatureCollection","name":"#)?;
    serde_json::to_writer(&mut *writer, name)?;
    if let Some(crs) = crs_member(srs) {
        write!(writer, r#","crs":"#)?;
        serde_json::to_writer(&mut *writer, &crs)?;
    }
    write!(writer, r#","features":["#)?;

    let properties = Map::new();
    let mut count = 0u64;
    for tile in tiles {
        if count > 0 {
            write!(writer, ",")?;
        }
        writeln!(writer)?;
        let feature = Feature {
            kind: "Feature",
            properties: &properties,
            geometry: Polygon::from(&tile),
        };
        serde_json::to_writer(&mut *writer, &feature)?;
        count += 1;
    }
    writeln!(writer)?;
    writeln!(writer, "]}}")?;
    Ok(count)
}

/// Named CRS member for non-default EPSG references. WKT references cannot be
/// expressed in GeoJSON and are dropped.
fn crs_member(srs: Option<&SpatialReference>) -> Option<Value> {
    let code = srs?.epsg().filter(|&code| code != DEFAULT_EPSG)?;
    Some(serde_json::json!({
        "type": "name",
        "properties": { "name": format!("urn:ogc:def:crs:EPSG::{code}") }
    }))
}
