use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "tasklane")]
#[command(about = "Todo API server with token based authentication")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a JSON config file (defaults to ./config.json)")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Start,

    #[command(about = "Apply or revert the database schema")]
    Migrate {
        #[command(subcommand)]
        cmd: MigrateCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum MigrateCommands {
    #[command(about = "Create tables and indexes")]
    Up,
    #[command(about = "Drop all tables")]
    Down,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Start)
    }
}
