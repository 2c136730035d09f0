use crate::offline::{run_export, run_stats, ExportArgs, StatsArgs};
use crate::server;
use campus_nest::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Campus Nest",
    about = "Serve and query placement analytics for campus recruitment drives",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print placement statistics for a seed snapshot as JSON
    Stats(StatsArgs),
    /// Render a report for a seed snapshot as CSV on stdout
    Export(ExportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// JSON snapshot to hydrate the in-memory store (overrides CAMPUS_SEED_PATH)
    #[arg(long)]
    pub(crate) seed: Option<std::path::PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Stats(args) => run_stats(args),
        Command::Export(args) => run_export(args),
    }
}
