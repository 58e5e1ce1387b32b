/// Pixel/line to georeferenced mapping, stored in GDAL coefficient order:
/// `(origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height)`.
///
/// `x = origin_x + col * pixel_width + row * row_rotation`
/// `y = origin_y + col * col_rotation + row * pixel_height`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineTransform(f64, f64, f64, f64, f64, f64);

impl AffineTransform {
    pub fn new(
        origin_x: f64,
        pixel_width: f64,
        row_rotation: f64,
        origin_y: f64,
        col_rotation: f64,
        pixel_height: f64,
    ) -> Self {
        Self(
            origin_x,
            pixel_width,
            row_rotation,
            origin_y,
            col_rotation,
            pixel_height,
        )
    }

    /// The transform GDAL reports for a raster without georeferencing.
    pub fn identity() -> Self {
        Self(0.0, 1.0, 0.0, 0.0, 0.0, 1.0)
    }

    pub fn from_gdal(gt: [f64; 6]) -> Self {
        Self(gt[0], gt[1], gt[2], gt[3], gt[4], gt[5])
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [self.0, self.1, self.2, self.3, self.4, self.5]
    }

    pub fn origin_x(&self) -> f64 {
        self.0
    }

    pub fn pixel_width(&self) -> f64 {
        self.1
    }

    pub fn row_rotation(&self) -> f64 {
        self.2
    }

    pub fn origin_y(&self) -> f64 {
        self.3
    }

    pub fn col_rotation(&self) -> f64 {
        self.4
    }

    pub fn pixel_height(&self) -> f64 {
        self.5
    }

    pub fn has_rotation(&self) -> bool {
        self.2 != 0.0 || self.4 != 0.0
    }

    /// Georeferenced position of the pixel/line corner `(col, row)`.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.0 + col * self.1 + row * self.2,
            self.3 + col * self.4 + row * self.5,
        )
    }

    /// Transform of a reduced-resolution level of size `level_size`, derived from this
    /// base transform of a raster of size `base_size`.
    ///
    /// Only the pixel size terms are scaled. The rotation terms are carried over
    /// unchanged, so the result is only exact for north-up rasters.
    pub fn scaled_to_level(&self, base_size: (usize, usize), level_size: (usize, usize)) -> Self {
        // (pixel * base) / level, in that order, keeps results bit-identical with GDAL's
        // own tooling.
        let pixel_width = self.1 * base_size.0 as f64 / level_size.0 as f64;
        let pixel_height = self.5 * base_size.1 as f64 / level_size.1 as f64;
        Self(self.0, pixel_width, self.2, self.3, self.4, pixel_height)
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<[f64; 6]> for AffineTransform {
    fn from(gt: [f64; 6]) -> Self {
        Self::from_gdal(gt)
    }
}
