use std::process::ExitCode;

use clap::Parser;
use shopmate_flows::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await?,
        Command::Run(args) => return cli::run::run(args).await,
        Command::Chat(args) => cli::chat::run(args).await?,
        Command::Flows(args) => cli::flows::run(args)?,
    }

    Ok(ExitCode::SUCCESS)
}
