use crate::register::{run_register, RegisterArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use hacksprint::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Hacksprint Registration",
    about = "Serve and submit Hacksprint team registrations",
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
    /// Submit a single team registration from the command line
    Register(RegisterArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Register(args) => run_register(args).await,
    }
}
