use crate::error::{Result, TileExtentError};

/// Size and block layout of one resolution level of the first band.
///
/// Level 0 is the full resolution image, level `n` the `n`-th overview.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RasterLevel {
    index: usize,
    width: usize,
    height: usize,
    block_width: usize,
    block_height: usize,
}

impl RasterLevel {
    pub fn try_new(
        index: usize,
        (width, height): (usize, usize),
        (block_width, block_height): (usize, usize),
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(TileExtentError::InvalidLevel {
                level: index,
                reason: format!("raster size {width}x{height}"),
            });
        }
        if block_width == 0 || block_height == 0 {
            return Err(TileExtentError::InvalidLevel {
                level: index,
                reason: format!("block size {block_width}x{block_height}"),
            });
        }
        Ok(Self {
            index,
            width,
            height,
            block_width,
            block_height,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn block_width(&self) -> usize {
        self.block_width
    }

    pub fn block_height(&self) -> usize {
        self.block_height
    }

    pub fn block_size(&self) -> (usize, usize) {
        (self.block_width, self.block_height)
    }

    pub fn block_grid(&self) -> BlockGrid {
        BlockGrid {
            blocks_x: self.width.div_ceil(self.block_width),
            blocks_y: self.height.div_ceil(self.block_height),
        }
    }

    /// Name of the output layer holding this level's blocks.
    pub fn layer_name(&self) -> String {
        layer_name(self.index)
    }
}

/// Number of blocks along each axis. Edge blocks may be partial.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockGrid {
    pub blocks_x: usize,
    pub blocks_y: usize,
}

impl BlockGrid {
    pub fn len(&self) -> usize {
        self.blocks_x * self.blocks_y
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn layer_name(level: usize) -> String {
    if level == 0 {
        "main_image".to_string()
    } else {
        format!("overview_{level}")
    }
}

/// Which levels a run processes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LevelSelection {
    /// Base image then every overview, in increasing reduction.
    #[default]
    All,
    /// Exactly one level, as given on the command line. Not range checked here.
    Single(i32),
}

impl LevelSelection {
    /// Levels to visit for a band with `overview_count` overviews.
    ///
    /// A single level is passed through untouched, bounds are enforced when the level
    /// is fetched from the raster.
    pub fn levels(&self, overview_count: usize) -> Vec<i64> {
        match self {
            LevelSelection::All => (0..=overview_count as i64).collect(),
            LevelSelection::Single(level) => vec![i64::from(*level)],
        }
    }
}
