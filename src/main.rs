use anyhow::{Context, Result};
use chrono::Duration;
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::error;
use std::process;

use credlock::auth::AuthGate;
use credlock::cli;
use credlock::config;
use credlock::policy::LockoutPolicy;
use credlock::security::password::PasswordHasher;
use credlock::store::FileStore;

/// Credential authentication with per-account lockout protection
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Sets the configuration file
    #[clap(short, long, value_name = "FILE", default_value = "config.toml")]
    config: String,

    /// Turn debugging information on
    #[clap(short, long, action = clap::ArgAction::Count)]
    debug: u8,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new account
    Register {
        /// Account email
        #[clap(short, long)]
        email: String,
    },

    /// Log in with email and password
    Login {
        /// Account email
        #[clap(short, long)]
        email: String,
    },

    /// Show the lock status of an account
    Status {
        /// Account email
        #[clap(short, long)]
        email: String,
    },

    /// Clear an account's lock and failed-attempt counter
    Unlock {
        /// Account email
        #[clap(short, long)]
        email: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.debug {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = config::load_config(&cli.config)?;

    let store = FileStore::open(&config.store.path)
        .with_context(|| format!("Failed to open account store at {}", config.store.path))?;

    let gate = AuthGate::new(
        store,
        PasswordHasher::new(config.security.argon2_memory_cost),
        LockoutPolicy::new(
            config.security.max_failed_attempts,
            Duration::minutes(config.security.lockout_duration_minutes),
        ),
    )
    .with_min_password_length(config.security.min_password_length);

    match &cli.command {
        Commands::Register { email } => cli::register(&gate, email),
        Commands::Login { email } => cli::login(&gate, email),
        Commands::Status { email } => cli::status(&gate, email),
        Commands::Unlock { email } => cli::unlock(&gate, email),
    }
}
