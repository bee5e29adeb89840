//! Command-line interface orchestration for posgraph.
//!
//! By default the CLI generates one batch: a complete positional graph and
//! its degraded variants, optionally written under a dataset root. The
//! `inspect` command loads a saved batch back and reports its statistics.

mod commands;

pub use commands::{
    Cli, CliError, Command, ExecutionSummary, GenerateArgs, InspectArgs, render_summary, run_cli,
};

#[cfg(test)]
mod test_helpers;
