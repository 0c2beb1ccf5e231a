use crate::demo::{run_analyze, run_capsule, run_demo, AnalyzeArgs, CapsuleArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use wardrobe::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Wardrobe Analysis Service",
    about = "Analyse outfit compatibility and build capsule wardrobes from the command line",
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
    /// Print a compatibility report for a wardrobe export as JSON
    Analyze(AnalyzeArgs),
    /// Print a capsule recommendation for a wardrobe export as JSON
    Capsule(CapsuleArgs),
    /// Walk through compatibility, utilization and capsule selection on a sample wardrobe
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Seed the catalog from an item CSV export
    #[arg(long)]
    pub(crate) items: Option<PathBuf>,
    /// Pairwise score CSV loaded alongside --items
    #[arg(long, requires = "items")]
    pub(crate) compatibility: Option<PathBuf>,
    /// Seed the catalog with the built-in sample wardrobe
    #[arg(long, conflicts_with = "items")]
    pub(crate) sample: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Analyze(args) => run_analyze(args),
        Command::Capsule(args) => run_capsule(args),
        Command::Demo(args) => run_demo(args),
    }
}
