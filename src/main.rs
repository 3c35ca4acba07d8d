use clap::{Parser, Subcommand};
use dotenv::dotenv;
use env_logger::Env;
use log::{info, error};
use std::process;

use fe_change_pwd::config;

mod cli;

/// Frontend password change - operator tool for the user password workflow
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
    /// Create the tables and add the password change columns
    Init {},

    /// Show whether a user has to change the password
    Status {
        /// User uid
        #[clap(long)]
        uid: i64,
    },

    /// Force a user to change the password on the next visit
    RequireChange {
        /// User uid
        #[clap(long)]
        uid: i64,
    },

    /// Set a new password for a user
    Change {
        /// User uid
        #[clap(long)]
        uid: i64,
    },
}

fn main() {
    // Load environment variables from .env file
    dotenv().ok();

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.debug {
        0 => log::set_max_level(log::LevelFilter::Info),
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let config = match config::load_config(&cli.config) {
        Ok(config) => {
            info!("Configuration loaded successfully");
            config
        }
        Err(err) => {
            error!("Failed to load configuration: {:#}", err);
            process::exit(1);
        }
    };

    let result = match &cli.command {
        Commands::Init {} => cli::password::init(&config),
        Commands::Status { uid } => cli::password::status(&config, *uid),
        Commands::RequireChange { uid } => cli::password::require_change(&config, *uid),
        Commands::Change { uid } => cli::password::change(&config, *uid),
    };

    if let Err(err) = result {
        error!("{:#}", err);
        process::exit(1);
    }
}
