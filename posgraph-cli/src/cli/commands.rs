//! Command implementations and argument parsing for the posgraph CLI.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use posgraph_core::{
    BatchConfigBuilder, BatchGenerator, BatchId, CodecError, DatasetLayout, GraphStats,
    ValidationError,
};
use rand::{SeedableRng, rngs::SmallRng};
use thiserror::Error;
use tracing::{Span, field, info, instrument};

const DEFAULT_NODES: u32 = 10;
const DEFAULT_VARIANTS: u32 = 10;
const DEFAULT_RATIO: f64 = 0.5;
const DEFAULT_ROOT: &str = "in";

/// Top-level CLI options parsed by [`clap`].
///
/// Without a subcommand the CLI generates one batch from the flattened
/// [`GenerateArgs`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "posgraph",
    about = "Generate degraded positional graphs for position-recovery training.",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// Command to execute instead of generating a batch.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Generation options.
    #[command(flatten)]
    pub generate: GenerateArgs,
}

/// Supported CLI subcommands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Load a saved batch and report statistics for each degraded variant.
    Inspect(InspectArgs),
}

/// Options controlling batch generation.
#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    /// Number of nodes in the complete graph.
    #[arg(short = 'n', long = "nodes", default_value_t = DEFAULT_NODES)]
    pub nodes: u32,

    /// Fraction of edges kept in each variant.
    #[arg(short = 'd', long, default_value_t = DEFAULT_RATIO, value_parser = parse_ratio)]
    pub density: f64,

    /// Fraction of kept edges whose label is erased.
    #[arg(short = 'r', long = "relpos", default_value_t = DEFAULT_RATIO, value_parser = parse_ratio)]
    pub relpos: f64,

    /// Fraction of nodes whose position is erased.
    #[arg(short = 'u', long, default_value_t = DEFAULT_RATIO, value_parser = parse_ratio)]
    pub unknown: f64,

    /// Write the batch under `--root` instead of only summarising it.
    #[arg(short = 's', long)]
    pub save: bool,

    /// Number of degraded variants per batch.
    #[arg(long, default_value_t = DEFAULT_VARIANTS)]
    pub variants: u32,

    /// Lower bound for generated coordinates.
    #[arg(short = 'm', long = "min", default_value_t = 0.0, allow_negative_numbers = true)]
    pub min: f64,

    /// Upper bound for generated coordinates.
    #[arg(short = 'M', long = "max", default_value_t = 1.0, allow_negative_numbers = true)]
    pub max: f64,

    /// Dataset root holding the `complete/` and `degraded/` directories.
    #[arg(long, default_value = DEFAULT_ROOT)]
    pub root: PathBuf,

    /// Seed for reproducible batches; drawn from the OS when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Batch identifier; derived from the clock when omitted.
    #[arg(long = "batch-id")]
    pub batch_id: Option<String>,
}

/// Options accepted by the `inspect` command.
#[derive(Debug, Args, Clone)]
pub struct InspectArgs {
    /// Identifier of the batch to load.
    pub batch_id: String,

    /// Dataset root holding the `degraded/` directory.
    #[arg(long, default_value = DEFAULT_ROOT)]
    pub root: PathBuf,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Arguments described an invalid batch.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Reading or writing graph files failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl CliError {
    /// Returns the stable code of the underlying error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(error) => error.code().as_str(),
            Self::Codec(error) => error.code().as_str(),
        }
    }
}

/// Summarises the outcome of executing a CLI command.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionSummary {
    /// Identifier of the generated or inspected batch.
    pub batch_id: String,
    /// Statistics of the complete graph; absent when inspecting.
    pub base: Option<GraphStats>,
    /// Statistics of each degraded variant in file order.
    pub variants: Vec<GraphStats>,
    /// Files written by `--save`.
    pub written: Vec<PathBuf>,
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when validation, generation, or file access fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use clap::Parser;
/// # use posgraph_cli::cli::{Cli, run_cli};
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let cli = Cli::try_parse_from(["posgraph", "-n", "4", "--variants", "2", "--seed", "3"])?;
/// let summary = run_cli(cli)?;
/// assert_eq!(summary.variants.len(), 2);
/// assert!(summary.written.is_empty());
/// # Ok(())
/// # }
/// ```
#[instrument(
    name = "cli.run",
    err,
    skip(cli),
    fields(command = field::Empty),
)]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    match cli.command {
        Some(Command::Inspect(args)) => {
            Span::current().record("command", field::display("inspect"));
            run_inspect(args)
        }
        None => {
            Span::current().record("command", field::display("generate"));
            run_generate(cli.generate)
        }
    }
}

#[instrument(
    name = "cli.generate",
    err,
    skip(args),
    fields(nodes = args.nodes, variants = args.variants, save = args.save),
)]
pub(super) fn run_generate(args: GenerateArgs) -> Result<ExecutionSummary, CliError> {
    let config = BatchConfigBuilder::new()
        .with_variant_count(args.variants)
        .with_node_count(args.nodes)
        .with_position_range(args.min, args.max)
        .with_density(args.density)
        .with_unlabel_ratio(args.relpos)
        .with_unknown_ratio(args.unknown)
        .build()?;
    let id = match args.batch_id {
        Some(raw) => BatchId::new(raw)?,
        None => BatchId::now(),
    };
    let mut rng = args
        .seed
        .map_or_else(SmallRng::from_entropy, SmallRng::seed_from_u64);

    let batch = BatchGenerator::new(config).generate(id, &mut rng)?;
    let written = if args.save {
        let layout = DatasetLayout::new(args.root);
        layout.create_dirs()?;
        batch.persist(&layout)?
    } else {
        Vec::new()
    };

    info!(
        batch = %batch.id(),
        files = written.len(),
        "generate completed"
    );
    Ok(ExecutionSummary {
        batch_id: batch.id().to_string(),
        base: Some(batch.base().stats()),
        variants: batch.variants().iter().map(|graph| graph.stats()).collect(),
        written,
    })
}

#[instrument(
    name = "cli.inspect",
    err,
    skip(args),
    fields(batch = %args.batch_id, root = %args.root.display()),
)]
pub(super) fn run_inspect(args: InspectArgs) -> Result<ExecutionSummary, CliError> {
    let id = BatchId::new(args.batch_id)?;
    let layout = DatasetLayout::new(args.root);
    let graphs = layout.load_variants(&id)?;
    info!(variants = graphs.len(), "inspect completed");
    Ok(ExecutionSummary {
        batch_id: id.to_string(),
        base: None,
        variants: graphs.iter().map(|graph| graph.stats()).collect(),
        written: Vec::new(),
    })
}

/// Parses a ratio flag, accepting finite values in `[0, 1]`.
pub(super) fn parse_ratio(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|err| format!("`{raw}` is not a number: {err}"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("`{raw}` must lie between 0 and 1"))
    }
}

/// Renders `summary` to `writer` in a human-readable text format.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use posgraph_cli::cli::{ExecutionSummary, render_summary};
/// # use posgraph_core::GraphStats;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let summary = ExecutionSummary {
///     batch_id: "demo".into(),
///     base: None,
///     variants: vec![GraphStats { nodes: 3, edges: 4, unlabeled_edges: 1, absent_positions: 0 }],
///     written: Vec::new(),
/// };
/// let mut buffer = Vec::new();
/// render_summary(&summary, &mut buffer)?;
/// assert!(String::from_utf8(buffer)?.contains("1\t3\t4\t1\t0"));
/// # Ok(())
/// # }
/// ```
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    writeln!(writer, "batch: {}", summary.batch_id)?;
    if let Some(base) = summary.base {
        writeln!(writer, "complete: {} nodes, {} edges", base.nodes, base.edges)?;
    }
    writeln!(writer, "variants: {}", summary.variants.len())?;
    writeln!(writer, "variant\tnodes\tedges\tunlabeled\tabsent")?;
    for (index, stats) in (1_usize..).zip(&summary.variants) {
        writeln!(
            writer,
            "{index}\t{}\t{}\t{}\t{}",
            stats.nodes, stats.edges, stats.unlabeled_edges, stats.absent_positions
        )?;
    }
    for path in &summary.written {
        writeln!(writer, "wrote {}", path.display())?;
    }
    Ok(())
}
