//! Small helpers shared across CLI tests.

use clap::Parser;
use tempfile::TempDir;

use super::{Cli, CliError, run_cli};

pub(super) fn temp_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temp dir: {err}"),
    }
}

/// Parses `args` after the binary name, panicking on rejection.
pub(super) fn parse(args: &[&str]) -> Cli {
    let argv = std::iter::once("posgraph").chain(args.iter().copied());
    match Cli::try_parse_from(argv) {
        Ok(cli) => cli,
        Err(err) => panic!("arguments must parse: {err}"),
    }
}

pub(super) fn run_cli_expecting_error(cli: Cli, panic_msg: &str) -> CliError {
    match run_cli(cli) {
        Ok(_) => panic!("{panic_msg}"),
        Err(err) => err,
    }
}
