use std::cell::Cell;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use approx::assert_relative_eq;
use serde_json::Value;
use tempfile::TempDir;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

use tile_extent::args::USAGE;
use tile_extent::cli::{run, EXIT_SUCCESS, EXIT_USAGE};
use tile_extent::{Backend, COGReader, GeoJsonSink, NativeBackend, Result, TileExtentError};

const ORIGIN: (f64, f64) = (440720.0, 3751320.0);
const PIXEL: f64 = 60.0;

/// (width, height, tile size, reduced resolution)
const PYRAMID: [(u32, u32, u32, bool); 3] = [
    (1000, 700, 256, false),
    (500, 350, 128, true),
    (250, 175, 128, true),
];

/// Writes a tiled single band UTM 11N GeoTIFF; all tiles share one zeroed block.
fn write_geotiff(path: &Path) {
    let file = File::create(path).unwrap();
    let mut encoder = TiffEncoder::new(file).unwrap();
    for (i, &(width, height, tile, reduced)) in PYRAMID.iter().enumerate() {
        let mut dir = encoder.image_directory().unwrap();
        dir.write_tag(Tag::NewSubfileType, u32::from(reduced)).unwrap();
        dir.write_tag(Tag::ImageWidth, width).unwrap();
        dir.write_tag(Tag::ImageLength, height).unwrap();
        dir.write_tag(Tag::BitsPerSample, 8u16).unwrap();
        dir.write_tag(Tag::Compression, 1u16).unwrap();
        dir.write_tag(Tag::PhotometricInterpretation, 1u16).unwrap();
        dir.write_tag(Tag::SamplesPerPixel, 1u16).unwrap();
        dir.write_tag(Tag::PlanarConfiguration, 1u16).unwrap();

        let chunks = (width.div_ceil(tile) * height.div_ceil(tile)) as usize;
        let block = vec![0u8; (tile * tile) as usize];
        let offset = u32::try_from(dir.write_data(block.as_slice()).unwrap()).unwrap();
        dir.write_tag(Tag::TileWidth, tile).unwrap();
        dir.write_tag(Tag::TileLength, tile).unwrap();
        dir.write_tag(Tag::TileOffsets, vec![offset; chunks].as_slice())
            .unwrap();
        dir.write_tag(Tag::TileByteCounts, vec![tile * tile; chunks].as_slice())
            .unwrap();

        if i == 0 {
            dir.write_tag(Tag::Unknown(33550), &[PIXEL, PIXEL, 0.0][..])
                .unwrap();
            dir.write_tag(
                Tag::Unknown(33922),
                &[0.0, 0.0, 0.0, ORIGIN.0, ORIGIN.1, 0.0][..],
            )
            .unwrap();
            dir.write_tag(
                Tag::Unknown(34735),
                &[1u16, 1, 0, 2, 1024, 0, 1, 1, 3072, 0, 1, 32611][..],
            )
            .unwrap();
        }
        dir.finish().unwrap();
    }
}

struct Fixture {
    _dir: TempDir,
    input: PathBuf,
    root: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("pyramid.tif");
        write_geotiff(&input);
        let root = dir.path().to_path_buf();
        Self {
            _dir: dir,
            input,
            root,
        }
    }

    fn run(&self, args: &[&str]) -> Result<(u8, String)> {
        let mut backend = NativeBackend::register();
        let mut stdout = Vec::new();
        let code = run(args, &mut backend, &mut stdout)?;
        Ok((code, String::from_utf8(stdout).unwrap()))
    }

    fn input(&self) -> &str {
        self.input.to_str().unwrap()
    }

    fn output(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

fn read(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

/// Checks the collection holds one feature per block of the level, row-major, and
/// that every ring is the block's nominal extent.
fn assert_tiling(collection: &Value, level: usize) {
    let (width, height, tile, _) = PYRAMID[level];
    let (base_width, base_height, _, _) = PYRAMID[0];
    let pixel_x = PIXEL * f64::from(base_width) / f64::from(width);
    let pixel_y = -PIXEL * f64::from(base_height) / f64::from(height);
    let blocks_x = width.div_ceil(tile) as usize;
    let blocks_y = height.div_ceil(tile) as usize;

    let features = collection["features"].as_array().unwrap();
    assert_eq!(features.len(), blocks_x * blocks_y);
    for (i, feature) in features.iter().enumerate() {
        let (bx, by) = ((i % blocks_x) as f64, (i / blocks_x) as f64);
        let span = f64::from(tile);
        let x_min = ORIGIN.0 + bx * span * pixel_x;
        let x_max = x_min + span * pixel_x;
        let y_max = ORIGIN.1 + by * span * pixel_y;
        let y_min = y_max + span * pixel_y;
        let expected = [
            [x_min, y_min],
            [x_min, y_max],
            [x_max, y_max],
            [x_max, y_min],
            [x_min, y_min],
        ];

        assert_eq!(feature["geometry"]["type"], "Polygon");
        let ring = feature["geometry"]["coordinates"][0].as_array().unwrap();
        assert_eq!(ring.len(), 5);
        for (point, expected) in ring.iter().zip(expected) {
            assert_relative_eq!(point[0].as_f64().unwrap(), expected[0]);
            assert_relative_eq!(point[1].as_f64().unwrap(), expected[1]);
        }
    }
}

#[test]
fn every_level_into_a_directory() {
    let fixture = Fixture::new();
    let out = fixture.output("extents");
    let (code, stdout) = fixture
        .run(&["-f", "GeoJSON", fixture.input(), out.to_str().unwrap()])
        .unwrap();
    assert_eq!(code, EXIT_SUCCESS);
    assert!(stdout.is_empty());

    for (level, name) in ["main_image", "overview_1", "overview_2"].iter().enumerate() {
        let collection = read(&out.join(format!("{name}.geojson")));
        assert_eq!(collection["name"], *name);
        assert_eq!(
            collection["crs"]["properties"]["name"],
            "urn:ogc:def:crs:EPSG::32611"
        );
        assert_tiling(&collection, level);
    }
    assert_eq!(fs::read_dir(&out).unwrap().count(), 3);
}

#[test]
fn single_overview_with_inferred_driver() {
    let fixture = Fixture::new();
    let out = fixture.output("ovr2.geojson");
    let (code, _) = fixture
        .run(&["-ovr", "2", fixture.input(), out.to_str().unwrap()])
        .unwrap();
    assert_eq!(code, EXIT_SUCCESS);

    let collection = read(&out);
    assert_eq!(collection["name"], "overview_2");
    assert_eq!(collection["features"].as_array().unwrap().len(), 4);
    assert_tiling(&collection, 2);
}

#[test]
fn base_level_only() {
    let fixture = Fixture::new();
    let out = fixture.output("base.json");
    fixture
        .run(&["-ovr", "0", fixture.input(), out.to_str().unwrap()])
        .unwrap();
    let collection = read(&out);
    assert_eq!(collection["name"], "main_image");
    assert_tiling(&collection, 0);
}

#[test]
fn all_levels_do_not_fit_one_file() {
    let fixture = Fixture::new();
    let out = fixture.output("all.geojson");
    let err = fixture
        .run(&[fixture.input(), out.to_str().unwrap()])
        .unwrap_err();
    assert!(matches!(err, TileExtentError::LayerLimit { ref layer, .. } if layer == "overview_1"));
}

#[test]
fn overview_out_of_range() {
    let fixture = Fixture::new();
    let out = fixture.output("ovr.geojson");
    for level in ["3", "-1"] {
        let err = fixture
            .run(&["-ovr", level, fixture.input(), out.to_str().unwrap()])
            .unwrap_err();
        assert!(
            matches!(err, TileExtentError::OverviewOutOfRange { count: 2, .. }),
            "{level}: {err}"
        );
    }
}

#[test]
fn non_integer_overview_is_fatal() {
    let fixture = Fixture::new();
    let err = fixture
        .run(&["-ovr", "two", fixture.input(), "out.geojson"])
        .unwrap_err();
    assert!(matches!(err, TileExtentError::InvalidOverviewArgument(ref v) if v == "two"));
}

#[test]
fn output_driver_errors() {
    let fixture = Fixture::new();
    let unknown = fixture.output("out.xyz");
    let err = fixture
        .run(&[fixture.input(), unknown.to_str().unwrap()])
        .unwrap_err();
    assert!(err.to_string().starts_with("Cannot guess driver for"));

    let shapefile = fixture.output("out.shp");
    let err = fixture
        .run(&[fixture.input(), shapefile.to_str().unwrap()])
        .unwrap_err();
    assert!(matches!(err, TileExtentError::DriverUnavailable(ref d) if d == "ESRI Shapefile"));
}

#[test]
fn missing_input_is_fatal() {
    let fixture = Fixture::new();
    let missing = fixture.output("missing.tif");
    let out = fixture.output("out.geojson");
    let err = fixture
        .run(&[missing.to_str().unwrap(), out.to_str().unwrap()])
        .unwrap_err();
    assert!(matches!(err, TileExtentError::Io(_)));
    assert!(!out.exists());
}

/// Native backend counting every collaborator call.
#[derive(Default)]
struct RecordingBackend {
    calls: Cell<usize>,
}

impl Backend for RecordingBackend {
    type Raster = COGReader;
    type Vector = GeoJsonSink;

    fn open_raster(&mut self, path: &Path) -> Result<COGReader> {
        self.calls.set(self.calls.get() + 1);
        NativeBackend::register().open_raster(path)
    }

    fn create_vector(&mut self, driver: &str, path: &Path) -> Result<GeoJsonSink> {
        self.calls.set(self.calls.get() + 1);
        NativeBackend::register().create_vector(driver, path)
    }
}

#[test]
fn usage_errors_touch_nothing() {
    let cases: &[&[&str]] = &[
        &[],
        &["in.tif"],
        &["in.tif", "out.geojson", "extra"],
        &["-x", "in.tif", "out.geojson"],
        &["in.tif", "out.geojson", "-f"],
        &["in.tif", "out.geojson", "-ovr"],
    ];
    for args in cases {
        let mut backend = RecordingBackend::default();
        let mut stdout = Vec::new();
        let code = run(*args, &mut backend, &mut stdout).unwrap();
        assert_eq!(code, EXIT_USAGE, "{args:?}");
        assert_eq!(String::from_utf8(stdout).unwrap().trim_end(), USAGE);
        assert_eq!(backend.calls.get(), 0, "{args:?}");
    }
}

#[test]
fn recording_backend_sees_one_open_and_one_create() {
    let fixture = Fixture::new();
    let out = fixture.output("counted.geojson");
    let mut backend = RecordingBackend::default();
    let code = run(
        &["-ovr", "1", fixture.input(), out.to_str().unwrap()],
        &mut backend,
        &mut Vec::new(),
    )
    .unwrap();
    assert_eq!(code, EXIT_SUCCESS);
    assert_eq!(backend.calls.get(), 2);
}
