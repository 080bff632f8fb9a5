//! # Graph Analytics
//!
//! Command-line front end for the `bsp-graph` engine. Loads a Matrix Market
//! graph, runs one Graphalytics kernel and prints one `id value` line per
//! vertex.
//!
//! ## Quick Start
//! ```bash
//! cargo run --release -- bfs graph.mtx 1
//! cargo run --release -- --threads 8 pagerank graph.mtx 20 0.85 ranks.txt
//! ```

// =============================================================================
// MODULE DECLARATIONS
// =============================================================================

/// Configuration management
mod config;

// =============================================================================
// IMPORTS
// =============================================================================
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use bsp_graph::{
    load_matrix_market, write_output_to, Algorithm, LccConfig, PageRankConfig, PregelError,
    PregelRuntime, Topology, VertexId, DEFAULT_DAMPING_FACTOR,
};

use crate::config::Config;

// =============================================================================
// CLI ARGUMENTS
// =============================================================================
/// # Rust Concept: Subcommands with Clap
///
/// Each enum variant of [`Command`] becomes a subcommand with its own
/// positional arguments. Options marked `global = true` may appear before
/// or after the subcommand name.
#[derive(Parser, Debug)]
#[command(
    name = "graph-analytics",
    version,
    about = "Run Graphalytics kernels on a Matrix Market graph",
    long_about = r#"
Graph Analytics - bulk-synchronous graph kernels

Loads a Matrix Market coordinate file and runs one algorithm on it. Vertex
ids on the command line and in the output are 1-based. Results go to the
output file, or to stdout when it is omitted or "-". Logs go to stderr.

EXAMPLES:
  # Depth of every vertex from vertex 1
  graph-analytics bfs graph.mtx 1

  # 20 PageRank iterations with damping 0.85, written to a file
  graph-analytics pagerank graph.mtx 20 0.85 ranks.txt

  # Components on 8 threads and 64 partitions
  graph-analytics --threads 8 --partitions 64 wcc graph.mtx
"#
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Worker threads (overrides BSP_THREADS)
    #[arg(short = 't', long, global = true, help = "Worker threads")]
    threads: Option<usize>,

    /// Vertex partitions (overrides BSP_PARTITIONS)
    #[arg(short = 'p', long, global = true, help = "Number of vertex partitions")]
    partitions: Option<usize>,

    /// Superstep limit for convergence runs (overrides BSP_MAX_SUPERSTEPS)
    #[arg(long, global = true, help = "Superstep limit for convergence runs")]
    max_supersteps: Option<usize>,

    /// JSON engine configuration file
    #[arg(
        long,
        global = true,
        value_name = "JSON",
        help = "JSON engine configuration file"
    )]
    engine_config: Option<PathBuf>,

    /// Verbose output (debug logging, per-superstep traces)
    #[arg(
        short = 'v',
        long = "verbose",
        global = true,
        help = "Enable verbose/debug logging",
        default_value = "false"
    )]
    verbose: bool,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Breadth-first search depths from a source vertex
    Bfs {
        graph: PathBuf,
        source: u64,
        output: Option<PathBuf>,
    },

    /// Single-source shortest path distances
    Sssp {
        graph: PathBuf,
        source: u64,
        output: Option<PathBuf>,
    },

    /// Weakly connected components
    Wcc {
        graph: PathBuf,
        output: Option<PathBuf>,
    },

    /// Community detection by label propagation
    Cdlp {
        graph: PathBuf,
        iterations: usize,
        output: Option<PathBuf>,
    },

    /// PageRank
    #[command(name = "pagerank")]
    PageRank {
        graph: PathBuf,
        iterations: usize,
        damping: Option<f64>,
        output: Option<PathBuf>,
    },

    /// Local clustering coefficient
    Lcc {
        graph: PathBuf,
        output: Option<PathBuf>,

        /// Neighbor sets larger than this also get a bitmap (overrides
        /// LCC_BITMAP_THRESHOLD)
        #[arg(long)]
        bitmap_threshold: Option<usize>,
    },
}

impl Command {
    fn graph(&self) -> &Path {
        match self {
            Command::Bfs { graph, .. }
            | Command::Sssp { graph, .. }
            | Command::Wcc { graph, .. }
            | Command::Cdlp { graph, .. }
            | Command::PageRank { graph, .. }
            | Command::Lcc { graph, .. } => graph,
        }
    }

    /// Output path; `None` means stdout
    fn output(&self) -> Option<&Path> {
        let output = match self {
            Command::Bfs { output, .. }
            | Command::Sssp { output, .. }
            | Command::Wcc { output, .. }
            | Command::Cdlp { output, .. }
            | Command::PageRank { output, .. }
            | Command::Lcc { output, .. } => output.as_deref(),
        };
        output.filter(|path| path.as_os_str() != "-")
    }

    /// Resolve the parameters against the loaded graph
    fn algorithm(&self, topology: &Topology, config: &Config) -> Result<Algorithm, PregelError> {
        let source = |external: u64| {
            VertexId::from_external(external)
                .ok_or_else(|| PregelError::invalid_source(external, topology.vertex_count()))
        };

        Ok(match self {
            Command::Bfs { source: s, .. } => Algorithm::Bfs { source: source(*s)? },
            Command::Sssp { source: s, .. } => Algorithm::Sssp { source: source(*s)? },
            Command::Wcc { .. } => Algorithm::Wcc,
            Command::Cdlp { iterations, .. } => Algorithm::Cdlp {
                iterations: *iterations,
            },
            Command::PageRank {
                iterations,
                damping,
                ..
            } => Algorithm::PageRank(PageRankConfig {
                damping_factor: damping.unwrap_or(DEFAULT_DAMPING_FACTOR),
                iterations: *iterations,
            }),
            Command::Lcc {
                bitmap_threshold, ..
            } => Algorithm::Lcc(LccConfig {
                bitmap_threshold: bitmap_threshold.unwrap_or(config.bitmap_threshold),
            }),
        })
    }
}

// =============================================================================
// MAIN FUNCTION
// =============================================================================
/// # Rust Concept: The #[tokio::main] Attribute
///
/// The engine runs each phase on a blocking worker and awaits it under a
/// timeout, so `main` needs a Tokio runtime around it.
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::from_env()?;
    init_logging(args.verbose, &config.log_level)?;

    if let Some(path) = &args.engine_config {
        config.merge_engine_file(path)?;
        info!(path = %path.display(), "Engine configuration loaded");
    }
    apply_overrides(&mut config, &args);
    config.validate()?;

    info!(
        threads = config.threads,
        partitions = config.partitions,
        max_supersteps = config.max_supersteps,
        "Configuration loaded"
    );

    if let Err(e) = run(&args, &config).await {
        error!(error = %e, "Run failed");
        return Err(e);
    }
    Ok(())
}

/// CLI flags win over the environment and the engine file
fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    if let Some(partitions) = args.partitions {
        config.partitions = partitions;
    }
    if let Some(max) = args.max_supersteps {
        config.max_supersteps = max;
    }
}

async fn run(args: &Args, config: &Config) -> Result<()> {
    let graph = args.command.graph();
    let topology = load_matrix_market(graph, config.partitions)
        .with_context(|| format!("Failed to load graph {}", graph.display()))?;

    let algorithm = args.command.algorithm(&topology, config)?;
    let runtime = PregelRuntime::with_config(config.pregel_config(args.verbose))?;

    let started = Instant::now();
    let output = algorithm
        .run(&runtime, Arc::new(topology))
        .await
        .with_context(|| format!("{} failed", algorithm.name()))?;
    info!(
        algorithm = algorithm.name(),
        elapsed = ?started.elapsed(),
        "Algorithm finished"
    );

    let target = args.command.output().unwrap_or(Path::new("-"));
    write_output_to(&output, target)
        .with_context(|| format!("Failed to write output to {}", target.display()))?;
    Ok(())
}

// =============================================================================
// LOGGING INITIALIZATION
// =============================================================================
/// Install a stderr subscriber; stdout carries the results.
///
/// `--verbose` forces debug level, otherwise `filter` (from `RUST_LOG`)
/// applies.
fn init_logging(verbose: bool, filter: &str) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_new(filter).context("RUST_LOG is not a valid log filter")?
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}
