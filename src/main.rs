use std::io;
use std::process::ExitCode;

use tile_extent::cli::{self, EXIT_FAILURE};
use tile_extent::logging::init_logging;

#[cfg(feature = "gdal")]
fn backend() -> tile_extent::GdalBackend {
    tile_extent::GdalBackend::register()
}

#[cfg(not(feature = "gdal"))]
fn backend() -> tile_extent::NativeBackend {
    tile_extent::NativeBackend::register()
}

fn main() -> ExitCode {
    init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut backend = backend();
    match cli::run(&args, &mut backend, &mut io::stdout().lock()) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
