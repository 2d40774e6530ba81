use anyhow::Result;
use clap::Parser;
use ctxbot::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { token } => ctxbot::run(token).await,
    }
}
