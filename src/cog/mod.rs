//! Native GeoTIFF / COG structure reader.

mod geo_key_directory;
mod ifd;
mod reader;

pub use geo_key_directory::GeoKeyDirectory;
pub use reader::COGReader;
