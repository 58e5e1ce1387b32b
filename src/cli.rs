use std::io::Write;

use tracing::info;

use crate::args::{self, Command, USAGE};
use crate::error::Result;
use crate::generator::generate;
use crate::source::Backend;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_USAGE: u8 = 2;

/// Runs the command line `args` (program name excluded) against `backend`.
///
/// Usage text goes to `stdout`. Returns the process status for success and usage
/// errors; fatal errors are returned as `Err` and map to [`EXIT_FAILURE`].
pub fn run<B, S, W>(args: &[S], backend: &mut B, stdout: &mut W) -> Result<u8>
where
    B: Backend,
    S: AsRef<str>,
    W: Write,
{
    let config = match args::parse(args)? {
        Command::Run(config) => config,
        Command::Usage => {
            writeln!(stdout, "{USAGE}")?;
            return Ok(EXIT_USAGE);
        }
    };

    let summary = generate(backend, &config)?;
    info!(
        driver = %summary.driver,
        layers = summary.layers.len(),
        features = summary.features(),
        output = %config.output.display(),
        "done"
    );
    Ok(EXIT_SUCCESS)
}
