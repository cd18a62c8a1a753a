use anyhow::Result;
use clap::{Parser, Subcommand};
use heropick_cui::LaunchOptions;
use std::io;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "heropick")]
#[command(about = "Shortlist heroes and let chance pick one", long_about = None)]
struct Cli {
    /// Directory holding heroes.json
    #[arg(long, global = true)]
    assets: Option<PathBuf>,

    /// State file for the selection and search term
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Deterministic seed instead of OS randomness
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive picker (default)
    Tui,
    /// Print the catalog with selection markers
    List {
        #[arg(long)]
        search: Option<String>,
    },
    /// Add or remove a hero from the selection
    Toggle { name: String },
    /// Empty the selection
    Clear,
    /// Print the current selection
    Selected,
    /// Pick a winner from the selection
    Pick {
        #[arg(long, default_value_t = 1)]
        rounds: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut options = LaunchOptions::from_env();
    if let Some(assets) = cli.assets {
        options.assets_dir = assets;
    }
    if let Some(state) = cli.state {
        options.state_path = Some(state);
    }
    if cli.seed.is_some() {
        options.seed = cli.seed;
    }

    let command = cli.command.unwrap_or(Commands::Tui);
    if matches!(command, Commands::Tui) {
        return heropick_cui::run(options);
    }

    init_tracing()?;
    let mut out = io::stdout().lock();
    match command {
        Commands::Tui => Ok(()),
        Commands::List { search } => commands::list(&options, search.as_deref(), &mut out),
        Commands::Toggle { name } => commands::toggle(&options, &name, &mut out),
        Commands::Clear => commands::clear(&options, &mut out),
        Commands::Selected => commands::selected(&options, &mut out),
        Commands::Pick { rounds } => commands::pick(&options, rounds, &mut out),
    }
}

fn init_tracing() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("HEROPICK_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
