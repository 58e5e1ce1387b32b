//! The tile extent generator: one polygon layer per raster level, one feature per block.

use tracing::{debug, info, warn};

use crate::args::Config;
use crate::driver::output_driver_for;
use crate::error::{Result, TileExtentError};
use crate::level::LevelSelection;
use crate::source::{Backend, RasterSource, VectorSink};
use crate::tiling::LevelTiles;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerSummary {
    pub name: String,
    pub level: usize,
    pub size: (usize, usize),
    pub block_size: (usize, usize),
    pub features: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub driver: String,
    pub layers: Vec<LayerSummary>,
}

impl RunSummary {
    pub fn features(&self) -> u64 {
        self.layers.iter().map(|layer| layer.features).sum()
    }
}

/// Runs a whole conversion: opens the input, creates the output, writes the selected
/// levels and closes the output. The first error aborts the run; layers already
/// written are left as they are.
pub fn generate<B: Backend>(backend: &mut B, config: &Config) -> Result<RunSummary> {
    let driver = match &config.format {
        Some(format) => format.clone(),
        None => output_driver_for(&config.output, false)?.to_string(),
    };

    let raster = backend.open_raster(&config.input)?;
    let mut sink = backend.create_vector(&driver, &config.output)?;
    debug!(input = %config.input.display(), output = %config.output.display(), %driver, "opened datasets");

    let layers = write_levels(&raster, &mut sink, config.selection)?;
    sink.close()?;

    Ok(RunSummary { driver, layers })
}

/// Writes the block extents of every selected level of `raster` into `sink`.
pub fn write_levels<R, V>(
    raster: &R,
    sink: &mut V,
    selection: LevelSelection,
) -> Result<Vec<LayerSummary>>
where
    R: RasterSource,
    V: VectorSink,
{
    let levels = match selection {
        LevelSelection::All => selection.levels(raster.overview_count()?),
        LevelSelection::Single(_) => selection.levels(0),
    };

    let base_size = raster.raster_size();
    let base_transform = raster.geo_transform();
    if base_transform.has_rotation() && levels.iter().any(|&level| level != 0) {
        warn!(
            row_rotation = base_transform.row_rotation(),
            col_rotation = base_transform.col_rotation(),
            "geotransform is rotated, overview block extents ignore rotation"
        );
    }
    let srs = raster.spatial_ref();

    let mut layers = Vec::with_capacity(levels.len());
    for level in levels {
        let index = match usize::try_from(level) {
            Ok(index) => index,
            Err(_) => {
                return Err(TileExtentError::OverviewOutOfRange {
                    level,
                    count: raster.overview_count()?,
                })
            }
        };

        let level = raster.level(index)?;
        let transform = base_transform.scaled_to_level(base_size, level.size());
        let tiles = LevelTiles::new(&level, transform);
        let grid = tiles.grid();
        let name = level.layer_name();

        let features = sink.write_layer(&name, srs.as_ref(), tiles)?;
        info!(
            layer = %name,
            width = level.width(),
            height = level.height(),
            block_width = level.block_width(),
            block_height = level.block_height(),
            blocks_x = grid.blocks_x,
            blocks_y = grid.blocks_y,
            features,
            "wrote layer"
        );

        layers.push(LayerSummary {
            name,
            level: index,
            size: level.size(),
            block_size: level.block_size(),
            features,
        });
    }
    Ok(layers)
}
