use std::fmt::Write;

use crate::affine::AffineTransform;
use crate::level::{BlockGrid, RasterLevel};

/// Significant digits used when a polygon is serialized as WKT.
pub const WKT_PRECISION: usize = 18;

/// Georeferenced rectangle covered by one raster block.
///
/// `y_max` is the edge of the block's first row and `y_min` the edge after its last
/// row, so for the usual negative pixel height `y_min < y_max`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TilePolygon {
    pub level: usize,
    pub block_x: usize,
    pub block_y: usize,
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl TilePolygon {
    /// Rectangle of block `(block_x, block_y)` for a level with the given block size
    /// and (already scaled) transform. Rotation terms are ignored.
    pub fn for_block(
        level: usize,
        transform: &AffineTransform,
        (block_width, block_height): (usize, usize),
        block_x: usize,
        block_y: usize,
    ) -> Self {
        let y_max = transform.origin_y() + (block_y * block_height) as f64 * transform.pixel_height();
        let y_min = y_max + block_height as f64 * transform.pixel_height();
        let x_min = transform.origin_x() + (block_x * block_width) as f64 * transform.pixel_width();
        let x_max = x_min + block_width as f64 * transform.pixel_width();
        Self {
            level,
            block_x,
            block_y,
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Closed exterior ring: `(xmin,ymin) (xmin,ymax) (xmax,ymax) (xmax,ymin) (xmin,ymin)`.
    pub fn ring(&self) -> [[f64; 2]; 5] {
        [
            [self.x_min, self.y_min],
            [self.x_min, self.y_max],
            [self.x_max, self.y_max],
            [self.x_max, self.y_min],
            [self.x_min, self.y_min],
        ]
    }

    pub fn to_wkt(&self) -> String {
        let mut wkt = String::with_capacity(256);
        wkt.push_str("POLYGON((");
        for (i, [x, y]) in self.ring().iter().enumerate() {
            if i > 0 {
                wkt.push(',');
            }
            // writing to a String cannot fail
            let _ = write!(
                wkt,
                "{} {}",
                format_g(*x, WKT_PRECISION),
                format_g(*y, WKT_PRECISION)
            );
        }
        wkt.push_str("))");
        wkt
    }
}

/// Row-major iterator over the block rectangles of one level.
#[derive(Clone, Debug)]
pub struct LevelTiles {
    level: usize,
    transform: AffineTransform,
    block_size: (usize, usize),
    grid: BlockGrid,
    next: usize,
}

impl LevelTiles {
    pub fn new(level: &RasterLevel, transform: AffineTransform) -> Self {
        Self {
            level: level.index(),
            transform,
            block_size: level.block_size(),
            grid: level.block_grid(),
            next: 0,
        }
    }

    pub fn grid(&self) -> BlockGrid {
        self.grid
    }
}

impl Iterator for LevelTiles {
    type Item = TilePolygon;

    fn next(&mut self) -> Option<TilePolygon> {
        if self.next >= self.grid.len() {
            return None;
        }
        let block_y = self.next / self.grid.blocks_x;
        let block_x = self.next % self.grid.blocks_x;
        self.next += 1;
        Some(TilePolygon::for_block(
            self.level,
            &self.transform,
            self.block_size,
            block_x,
            block_y,
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.grid.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for LevelTiles {}

/// Formats `value` like C's `%.<precision>g`.
pub fn format_g(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let precision = precision.max(1);
    let scientific = format!("{:.*e}", precision - 1, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            sign,
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (precision as i32 - 1 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}
