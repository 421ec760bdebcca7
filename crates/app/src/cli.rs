//! Command-line interface definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "finagent")]
#[command(about = "Finance Agent - track holdings and get AI-generated advice")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend base URL
    #[arg(global = true, long, env = "FINANCE_AGENT_API_URL")]
    pub api_url: Option<String>,

    /// Config file path
    #[arg(global = true, long, env = "FINAGENT_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an account and sign in
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Sign in with existing credentials
    Signin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },

    /// Forget the stored session
    Signout,

    /// Show the signed-in user
    Profile {
        /// Re-read the profile from the backend
        #[arg(long)]
        refresh: bool,
    },

    /// Holdings operations
    #[command(subcommand)]
    Holdings(HoldingsCommand),

    /// Generate advice for the current holdings
    Advice,
}

#[derive(Subcommand, Debug)]
pub enum HoldingsCommand {
    /// List holdings
    List,

    /// Add a ticker
    Add {
        ticker: String,
    },

    /// Remove a ticker
    Remove {
        ticker: String,
    },
}

impl Commands {
    /// Commands behind the signed-in route guard
    pub fn requires_session(&self) -> bool {
        matches!(self, Commands::Holdings(_) | Commands::Advice)
    }
}
