//! Main entry point for ucedit CLI

use clap::Parser;
use ucedit::cli::Cli;
use ucedit::commands::{execute_command, GlobalOptions};
use ucedit::config;

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    // Credentials may live in a .env file next to the workspace
    if let Err(e) = config::load_env_file() {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let options = GlobalOptions {
        workspace: cli.workspace,
        host: cli.host,
    };

    if let Err(e) = execute_command(cli.command, &options) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
