//! CLI module for ShopMate flows
//!
//! Subcommands:
//! - `serve`: HTTP API
//! - `run`: invoke one flow and print the envelope
//! - `chat`: interactive terminal chat
//! - `flows`: print the flow catalog

pub mod chat;
pub mod flows;
pub mod run;
pub mod serve;

use clap::{Parser, Subcommand};
use tracing::warn;

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// ShopMate - structured generative flows for e-commerce assistants
#[derive(Parser)]
#[command(name = "shopmate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Invoke a single flow and print the result envelope as JSON
    Run(run::RunArgs),

    /// Chat with the shopping assistant in the terminal
    Chat(chat::ChatArgs),

    /// List the available flows
    Flows(flows::FlowsArgs),
}

/// Load `.env` and configuration, then install logging
pub fn bootstrap() -> AppConfig {
    dotenvy::dotenv().ok();

    match AppConfig::load() {
        Ok(config) => {
            logging::init_logging(&config.logging);
            config
        }
        Err(e) => {
            let config = AppConfig::default();
            logging::init_logging(&config.logging);
            warn!(error = %e, "Failed to load configuration, using defaults");
            config
        }
    }
}
