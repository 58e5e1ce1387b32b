use std::path::PathBuf;

use crate::error::{Result, TileExtentError};
use crate::level::LevelSelection;

pub const USAGE: &str =
    "Usage:  tile_extent_from_raster [-f format] [-ovr level] <in-raster> <out-vector>";

/// Resolved configuration of one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Output driver short name. `None` means infer it from `output`.
    pub format: Option<String>,
    pub selection: LevelSelection,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Run(Config),
    /// Malformed command line; print [`USAGE`] and exit with status 2.
    Usage,
}

/// Parses the arguments following the program name.
///
/// Usage problems are reported as [`Command::Usage`]. The only error is an `-ovr`
/// value that is not an integer.
pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Command> {
    let mut format = None;
    let mut selection = LevelSelection::All;
    let mut input = None;
    let mut output = None;

    let mut args = args.iter().map(AsRef::as_ref);
    while let Some(arg) = args.next() {
        match arg {
            "-f" => {
                let Some(value) = args.next() else {
                    return Ok(Command::Usage);
                };
                format = Some(value.to_string());
            }
            "-ovr" => {
                let Some(value) = args.next() else {
                    return Ok(Command::Usage);
                };
                let level = value
                    .trim()
                    .parse::<i32>()
                    .map_err(|_| TileExtentError::InvalidOverviewArgument(value.to_string()))?;
                selection = LevelSelection::Single(level);
            }
            flag if flag.starts_with('-') => return Ok(Command::Usage),
            path if input.is_none() => input = Some(PathBuf::from(path)),
            path if output.is_none() => output = Some(PathBuf::from(path)),
            _ => return Ok(Command::Usage),
        }
    }

    match (input, output) {
        (Some(input), Some(output)) => Ok(Command::Run(Config {
            input,
            output,
            format,
            selection,
        })),
        _ => Ok(Command::Usage),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn run(args: &[&str]) -> Config {
        match parse(args).unwrap() {
            Command::Run(config) => config,
            Command::Usage => panic!("unexpected usage for {args:?}"),
        }
    }

    #[test]
    fn positionals_only() {
        let config = run(&["in.tif", "out.shp"]);
        assert_eq!(config.input, PathBuf::from("in.tif"));
        assert_eq!(config.output, PathBuf::from("out.shp"));
        assert_eq!(config.format, None);
        assert_eq!(config.selection, LevelSelection::All);
    }

    #[test]
    fn options_anywhere() {
        let config = run(&["in.tif", "-ovr", "2", "out.gpkg", "-f", "GPKG"]);
        assert_eq!(config.format.as_deref(), Some("GPKG"));
        assert_eq!(config.selection, LevelSelection::Single(2));
        assert_eq!(config.output, PathBuf::from("out.gpkg"));
    }

    #[test]
    fn last_option_wins() {
        let config = run(&["-ovr", "1", "-ovr", "0", "a.tif", "b.shp"]);
        assert_eq!(config.selection, LevelSelection::Single(0));
    }

    #[test]
    fn negative_level_parses() {
        let config = run(&["-ovr", "-1", "a.tif", "b.shp"]);
        assert_eq!(config.selection, LevelSelection::Single(-1));
    }

    #[test]
    fn usage_errors() {
        let cases: &[&[&str]] = &[
            &[],
            &["in.tif"],
            &["in.tif", "out.shp", "extra"],
            &["-q", "in.tif", "out.shp"],
            &["in.tif", "-", "out.shp"],
            &["in.tif", "out.shp", "-f"],
            &["in.tif", "out.shp", "-ovr"],
        ];
        for args in cases {
            assert_eq!(parse(args).unwrap(), Command::Usage, "{args:?}");
        }
    }

    #[test]
    fn non_integer_level_is_fatal() {
        let err = parse(&["-ovr", "two", "in.tif", "out.shp"]).unwrap_err();
        assert!(matches!(err, TileExtentError::InvalidOverviewArgument(ref v) if v == "two"));
    }

    #[test]
    fn empty_argument_is_positional() {
        let config = run(&["", "out.shp"]);
        assert_eq!(config.input, PathBuf::from(""));
    }
}
