use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use context_extractor::SymbolKind;
use context_graph::ExportFormat;
use report::CommandResponse;
use std::io;
use std::path::{Path, PathBuf};

mod commands;
mod report;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "context-aware")]
#[command(about = "Symbol-level code index with dependency impact analysis", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root holding the `.context-aware` store
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty context store for the project
    Init,

    /// Extract symbols and link dependencies (incremental)
    Index(IndexArgs),

    /// Show project overview: directories, files, classes and functions
    Structure(StructureArgs),

    /// Find symbols relevant to a free-text query
    Search(SearchArgs),

    /// Print a symbol's source with its children and dependencies
    Read(ReadArgs),

    /// List symbols that depend on a symbol, grouped by depth
    Impacts(ImpactsArgs),

    /// Render the dependency graph
    Export(ExportArgs),
}

#[derive(Args)]
struct IndexArgs {
    /// Only re-index this directory (relative to the project root)
    path: Option<PathBuf>,

    /// Abort without committing if the pass takes longer than this
    #[arg(long)]
    max_seconds: Option<u64>,
}

#[derive(Args)]
struct StructureArgs {
    /// Omit per-file entries
    #[arg(long)]
    compact: bool,
}

#[derive(Args)]
struct SearchArgs {
    /// Free-text query
    query: String,

    /// Only return symbols of this type (file, class, function)
    #[arg(long = "type", value_parser = commands::parse_kind)]
    kind: Option<SymbolKind>,

    /// File you are working in; nearby symbols rank higher
    #[arg(long)]
    near: Option<String>,

    /// Maximum number of results (default from config)
    #[arg(short, long)]
    limit: Option<usize>,

    /// Rerank top results with the semantic provider
    #[arg(long)]
    semantic: bool,

    /// Write results to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct ReadArgs {
    /// Symbol id, e.g. `function:src/app.py:main`
    id: String,
}

#[derive(Args)]
struct ImpactsArgs {
    /// Symbol id, e.g. `function:src/app.py:main`
    id: String,

    /// Stop the cascade after this many hops
    #[arg(long)]
    max_depth: Option<usize>,
}

#[derive(Args)]
struct ExportArgs {
    /// Output format: mermaid or json
    #[arg(short, long, default_value_t = ExportFormat::Mermaid)]
    format: ExportFormat,
}

pub async fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let root = cli.root;
    if !root.is_dir() {
        let err = anyhow::anyhow!("Project root {} is not a directory", root.display());
        return fail(&err);
    }

    match run(cli.command, &root).await {
        Ok(Output::Json(response)) => print_stdout(&serde_json::to_string_pretty(&response)?),
        Ok(Output::Text(text)) => print_stdout(&text),
        Err(err) => fail(&err),
    }
}

enum Output {
    Json(CommandResponse),
    /// Pre-rendered document such as a Mermaid graph
    Text(String),
}

async fn run(command: Commands, root: &Path) -> Result<Output> {
    let response = match command {
        Commands::Init => commands::init(root).await?,
        Commands::Index(args) => commands::index(root, args.path, args.max_seconds).await?,
        Commands::Structure(args) => commands::structure(root, args.compact).await?,
        Commands::Search(args) => {
            commands::search(
                root,
                commands::SearchArgs {
                    query: args.query,
                    kind: args.kind,
                    near: args.near,
                    limit: args.limit.unwrap_or(0),
                    semantic: args.semantic,
                    output: args.output,
                },
            )
            .await?
        }
        Commands::Read(args) => commands::read(root, &args.id).await?,
        Commands::Impacts(args) => commands::impacts(root, &args.id, args.max_depth).await?,
        Commands::Export(args) => return Ok(Output::Text(commands::export(root, args.format).await?)),
    };
    Ok(Output::Json(response))
}

/// Print the JSON error body and exit non-zero
fn fail(err: &anyhow::Error) -> Result<()> {
    log::error!("{err:#}");
    let response = CommandResponse::from_error(err);
    let body = serde_json::to_string_pretty(&response).context("Failed to encode error")?;
    print_stdout(&body)?;
    std::process::exit(1);
}
