mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{
    add::AddCommand, distribute::DistributeCommand, history::HistoryCommand, info::InfoCommand,
    init::InitCommand, list::ListCommand, purge::PurgeCommand, remote::RemoteCommand,
    remove::RemoveCommand, restore::RestoreCommand,
};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(
    name = "silo",
    version,
    about = "Git-backed backup repository",
    long_about = "Silo stores files and directories in a bare git repository, keeps their full history and mirrors it to remotes"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, env = "SILO_REPO", help = "Repository path")]
    repo: Option<PathBuf>,

    #[arg(long, global = true, env = "SILO_CONFIG", help = "Configuration file")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    verbose: bool,

    #[arg(short, long, global = true, help = "Enable quiet mode")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Initialize a new repository")]
    Init(InitCommand),

    #[command(about = "Add files or directories in a new snapshot")]
    Add(AddCommand),

    #[command(about = "Restore files or directories from the latest snapshot")]
    Restore(RestoreCommand),

    #[command(about = "Remove paths from the latest snapshot, keeping history")]
    Remove(RemoveCommand),

    #[command(about = "Erase paths from the entire history")]
    Purge(PurgeCommand),

    #[command(about = "List stored paths")]
    List(ListCommand),

    #[command(about = "Show metadata about stored paths")]
    Info(InfoCommand),

    #[command(about = "Show snapshot history")]
    History(HistoryCommand),

    #[command(about = "Manage mirror remotes")]
    Remote(RemoteCommand),

    #[command(about = "Push the full history to every remote")]
    Distribute(DistributeCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    debug!("Starting Silo");

    match cli.command {
        Commands::Init(ref cmd) => cmd.run(&cli).await,
        Commands::Add(ref cmd) => cmd.run(&cli).await,
        Commands::Restore(ref cmd) => cmd.run(&cli).await,
        Commands::Remove(ref cmd) => cmd.run(&cli).await,
        Commands::Purge(ref cmd) => cmd.run(&cli).await,
        Commands::List(ref cmd) => cmd.run(&cli).await,
        Commands::Info(ref cmd) => cmd.run(&cli).await,
        Commands::History(ref cmd) => cmd.run(&cli).await,
        Commands::Remote(ref cmd) => cmd.run(&cli).await,
        Commands::Distribute(ref cmd) => cmd.run(&cli).await,
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let level = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("silo_core={},silo={}", level, level)));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Setting default subscriber failed");
}
