/*
 * Fieldguard CLI
 *
 * Loads a value-flow graph snapshot, indexes it once, then classifies the
 * scoped global variables in parallel.
 *
 * Usage:
 *   fieldguard-cli --graph vfg.json --output-dir out/ --threads 8
 *   fieldguard-cli --graph vfg.json --variable jiffies --legacy-report
 *   fieldguard-cli --graph vfg.json --scope targets.txt --init-funcs initfns.txt
 */

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rustc_hash::FxHashSet;
use tracing::info;

use fieldguard::{
    read_allow_list, read_scope_file, DirSinks, FieldguardConfig, FieldguardError, GraphIndexer,
    Result, Scheduler, SinkFactory, StdoutSinks, TargetScope, ValueFlowGraph,
};

#[derive(Parser)]
#[command(name = "fieldguard-cli", about = "Classify write-protectable fields of kernel globals")]
struct Cli {
    /// Value-flow graph snapshot (JSON)
    #[arg(long)]
    graph: PathBuf,

    /// Worker thread count; defaults to the logical CPU count
    #[arg(long)]
    threads: Option<usize>,

    /// Directory for per-worker report files; omitted means stdout
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// External call-graph file refining indirect calls
    #[arg(long)]
    call_graph: Option<PathBuf>,

    /// Analyze a single named variable
    #[arg(long)]
    variable: Option<String>,

    /// File naming functions whose writes count as initialization
    #[arg(long)]
    init_funcs: Option<PathBuf>,

    /// File naming the variables to analyze
    #[arg(long)]
    scope: Option<PathBuf>,

    /// Emit the compact name/ratio/offsets report
    #[arg(long)]
    legacy_report: bool,

    /// JSON file overriding the default thresholds
    #[arg(long)]
    config: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> Result<FieldguardConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let data = std::fs::read_to_string(path)?;
            serde_json::from_str(&data)
                .map_err(|e| FieldguardError::config(format!("bad config file: {e}")))?
        }
        None => FieldguardConfig::default(),
    };
    if let Some(threads) = cli.threads {
        config.parallel.threads = threads;
    }
    if let Some(dir) = &cli.output_dir {
        config.parallel.output_dir = Some(dir.clone());
    }
    if cli.legacy_report {
        config.parallel.legacy_report = true;
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    let data = std::fs::read_to_string(&cli.graph)?;
    let graph = ValueFlowGraph::from_json(&data)?;
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        globals = graph.globals.len(),
        "graph loaded"
    );

    let index = GraphIndexer::build(&graph, &config.indexing, cli.call_graph.as_deref());

    let allow_list = match &cli.init_funcs {
        Some(path) => read_allow_list(path),
        None => FxHashSet::default(),
    };

    let scope = if let Some(name) = cli.variable {
        TargetScope::Explicit(vec![name])
    } else if let Some(path) = &cli.scope {
        read_scope_file(path)?
    } else {
        TargetScope::Filtered
    };

    let sinks: Box<dyn SinkFactory> = match &config.parallel.output_dir {
        Some(dir) => Box::new(DirSinks::new(dir)?),
        None => Box::new(StdoutSinks),
    };

    let scheduler = Scheduler::new(&graph, &index, &config, &allow_list);
    let analyzed = scheduler.run(&scope, sinks.as_ref())?;
    info!(analyzed, "analysis complete");
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("fieldguard-cli: {err}");
            ExitCode::FAILURE
        }
    }
}
