// src/main.rs
mod cli;
mod clipboard;
mod config;
mod error;
mod generator;
mod history;
mod models;
mod tui;

use clap::Parser;

fn main() -> Result<(), error::AppError> {
    env_logger::init();
    log::info!("Starting passgen-rs");

    let cli_args = cli::Cli::parse();
    let config = config::load_config();

    match cli::handle_cli_command(cli_args, &config) {
        Ok(should_run_tui) => {
            if should_run_tui {
                if let Err(e) = tui::run_tui(&config) {
                    log::error!("Application TUI error: {:#?}", e);
                    eprintln!("Error: {}", e);
                    return Err(e);
                }
            } else {
                log::info!("CLI command processed.");
            }
        }
        Err(e) => {
            log::error!("Application failed: {:#?}", e);
            eprintln!("Error: {}", e);
            return Err(e);
        }
    }

    log::info!("passgen-rs finished successfully.");
    Ok(())
}
