//! CLI command definitions for the `askr` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod chats;
pub mod user;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Answer engine server and admin tool.
#[derive(Parser)]
#[command(name = "askr", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans to stdout through OpenTelemetry.
    #[arg(long, global = true, env = "ASKR_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server.
    Serve {
        /// Port to listen on (defaults to `server.port` in config.toml).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (defaults to `server.host` in config.toml).
        #[arg(long)]
        host: Option<String>,
    },

    /// Manage users and their API keys.
    User {
        #[command(subcommand)]
        action: user::UserCommand,
    },

    /// List a user's chats.
    Chats {
        /// Email of the chat owner.
        email: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
