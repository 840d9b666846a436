//! Scenario converter
//!
//! Scenario files are authored in YAML, but the simulator consumes JSON. This crate echoes a
//! YAML scenario out as pretty-printed JSON without interpreting its contents.

use clap::Parser;
use log::*;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tacsim_utils::ok;
use thiserror::Error;

pub mod document;

pub use document::DocumentError;

/// Scenario read when no input is given, relative to the working directory.
pub const DEFAULT_INPUT: &str = "Content/Scenarios/example_scenario.yaml";
/// Where the converted scenario lands when no output is given.
pub const DEFAULT_OUTPUT: &str = "Content/Scenarios/example_scenario.json";

/// User-specified command line parameters
#[derive(Debug, Parser)]
#[command(name = "parse_scenario", version, about = "Converts a YAML scenario into JSON")]
pub struct Cli {
    /// YAML scenario to read.
    #[arg(long, short = 'i', default_value = DEFAULT_INPUT)]
    pub input: PathBuf,
    /// JSON file to write. Any existing file is overwritten.
    #[arg(long, short = 'o', default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,
    /// Enables debug logging.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("couldn't read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("couldn't parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: DocumentError,
    },
    #[error("couldn't write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Runs the converter as if it was ran from the command line.
pub fn run(cli: Cli) -> Result<(), ScenarioError> {
    convert_file(&cli.input, &cli.output)?;
    println!("Converted {} -> {}", cli.input.display(), cli.output.display());
    ok()
}

/// Reads the YAML scenario at `input` and writes its JSON equivalent to `output`.
pub fn convert_file(input: &Path, output: &Path) -> Result<(), ScenarioError> {
    debug!("Reading scenario from {}", input.display());
    let yaml = fs::read_to_string(input).map_err(|source| ScenarioError::Read {
        path: input.to_owned(),
        source,
    })?;

    let json = document::convert_str(&yaml).map_err(|source| ScenarioError::Parse {
        path: input.to_owned(),
        source,
    })?;

    debug!("Writing {} bytes to {}", json.len(), output.display());
    fs::write(output, json).map_err(|source| ScenarioError::Write {
        path: output.to_owned(),
        source,
    })?;

    ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn converts_file_and_overwrites_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("scenario.yaml");
        let output = dir.path().join("scenario.json");
        fs::write(&input, "a: 1\nb: [2, 3]\nc: {d: null}\n").unwrap();
        fs::write(&output, "stale contents that are much longer than the new ones").unwrap();

        convert_file(&input, &output).unwrap();

        let expected = "{\n  \"a\": 1,\n  \"b\": [\n    2,\n    3\n  ],\n  \"c\": {\n    \"d\": null\n  }\n}";
        assert_eq!(fs::read_to_string(&output).unwrap(), expected);
    }

    #[test]
    fn missing_input_is_a_read_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("nope.yaml");
        let output = dir.path().join("out.json");

        let err = convert_file(&input, &output).unwrap_err();
        assert!(matches!(err, ScenarioError::Read { .. }));
        assert!(err.to_string().contains("nope.yaml"));
        assert!(!output.exists());
    }

    #[test]
    fn invalid_yaml_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("broken.yaml");
        let output = dir.path().join("out.json");
        fs::write(&input, "key: [unterminated\n").unwrap();

        let err = convert_file(&input, &output).unwrap_err();
        assert!(matches!(err, ScenarioError::Parse { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn unwritable_output_is_a_write_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("scenario.yaml");
        fs::write(&input, "a: 1\n").unwrap();
        let output = dir.path().join("missing_dir").join("out.json");

        let err = convert_file(&input, &output).unwrap_err();
        assert!(matches!(err, ScenarioError::Write { .. }));
    }

    #[test]
    fn cli_defaults_to_fixed_paths() {
        let cli = Cli::parse_from(["parse_scenario"]);
        assert_eq!(cli.input, PathBuf::from(DEFAULT_INPUT));
        assert_eq!(cli.output, PathBuf::from(DEFAULT_OUTPUT));
        assert!(!cli.verbose);
    }
}
