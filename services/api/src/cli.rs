use crate::queue::{run_queue_rank, run_queue_refresh, QueueRankArgs, QueueRefreshArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use civic_queue::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "civic-queue",
    about = "Rank pending municipal requests and serve the clerk queue",
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
    /// Work with a request snapshot from the command line
    Queue {
        #[command(subcommand)]
        command: QueueCommand,
    },
}

#[derive(Subcommand, Debug)]
enum QueueCommand {
    /// Print the ranked clerk queue for a snapshot
    Rank(QueueRankArgs),
    /// Compute priority write-backs for every pending request in a snapshot
    Refresh(QueueRefreshArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Seed the in-memory request store from a CSV export
    #[arg(long)]
    pub(crate) snapshot: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Queue {
            command: QueueCommand::Rank(args),
        } => run_queue_rank(args),
        Command::Queue {
            command: QueueCommand::Refresh(args),
        } => run_queue_refresh(args),
    }
}
