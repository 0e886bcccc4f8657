// src/cli.rs
use crate::clipboard;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::generator::{self, GenerationOptions};
use crate::history::{self, HistoryStore};
use crate::models::{self, PasswordRecord};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log;
use std::io::{self, Write};
use std::path::PathBuf;

/// A random password generator with a local history.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(arg_required_else_help = false)] // No subcommand launches the TUI
pub struct Cli {
    #[clap(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a password and print it
    Generate {
        /// Password length (defaults to the configured length)
        #[clap(short, long, allow_hyphen_values = true)]
        length: Option<i64>,
        /// Leave ASCII letters out of the pool
        #[clap(long)]
        no_letters: bool,
        /// Leave digits out of the pool
        #[clap(long)]
        no_digits: bool,
        /// Leave special symbols out of the pool
        #[clap(long)]
        no_special: bool,
        /// Append the password to the history
        #[clap(short, long)]
        save: bool,
        /// Copy the password to the clipboard
        #[clap(short, long)]
        copy: bool,
        /// Path to the history file
        #[clap(short, long, value_parser)]
        file: Option<PathBuf>,
    },
    /// Print the history, newest first
    History {
        /// Only show records on or after this date (YYYY-MM-DD)
        #[clap(long, value_parser = parse_date)]
        from: Option<NaiveDate>,
        /// Path to the history file
        #[clap(short, long, value_parser)]
        file: Option<PathBuf>,
    },
    /// Delete every record from the history
    Clear {
        /// Skip the confirmation prompt
        #[clap(short, long)]
        yes: bool,
        /// Path to the history file
        #[clap(short, long, value_parser)]
        file: Option<PathBuf>,
    },
    /// Launch the Terminal User Interface (TUI)
    Tui,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

fn history_store(file: Option<PathBuf>, config: &Config) -> HistoryStore {
    HistoryStore::new(file.unwrap_or_else(|| config.history_file.clone()))
}

/// Options for the `generate` subcommand: CLI values over configured defaults.
fn generation_options(
    length: Option<i64>,
    no_letters: bool,
    no_digits: bool,
    no_special: bool,
    config: &Config,
) -> AppResult<GenerationOptions> {
    let length = match length {
        Some(length) => length,
        None => i64::try_from(config.default_length)
            .map_err(|_| AppError::Cli(format!("Configured length {} is too large", config.default_length)))?,
    };
    let options = GenerationOptions::new(
        length,
        config.use_letters && !no_letters,
        config.use_digits && !no_digits,
        config.use_special && !no_special,
    )?;
    Ok(options)
}

/// One line per record, as printed by `history`.
fn format_record(record: &PasswordRecord) -> String {
    format!("{}  {}", record.time, record.password)
}

/// Handles the parsed CLI command.
/// Returns `Ok(true)` if the TUI should run, `Ok(false)` if a CLI command was handled and TUI should not run.
pub fn handle_cli_command(cli: Cli, config: &Config) -> AppResult<bool> {
    log::debug!("Handling CLI command: {:?}", cli.command);
    match cli.command {
        Some(Commands::Generate { length, no_letters, no_digits, no_special, save, copy, file }) => {
            log::info!("Executing 'generate' command");
            let options = generation_options(length, no_letters, no_digits, no_special, config)?;
            let last = generator::generate_for_shell(&options).map_err(|e| {
                log::warn!("Generation rejected: {}", e);
                e
            })?;
            println!("{}", last.password);

            if save {
                let store = history_store(file, config);
                store.append(&last.password, &models::now_timestamp()).map_err(|e| {
                    log::error!("Failed to save password to {:?}: {}", store.path(), e);
                    e
                })?;
                eprintln!("Saved to {:?}.", store.path());
            }
            if copy {
                clipboard::copy_text(&last.password, "Password")?;
                eprintln!("Copied to clipboard.");
            }
            Ok(false)
        }
        Some(Commands::History { from, file }) => {
            let store = history_store(file, config);
            log::info!("Executing 'history' command for file: {:?}", store.path());
            let records = store.load();
            let shown = match from {
                Some(threshold) => history::filter_from(&records, threshold),
                None => records,
            };
            let shown = history::sorted_by_time_descending(&shown);
            if shown.is_empty() {
                println!("No passwords in history.");
            } else {
                for record in &shown {
                    println!("{}", format_record(record));
                }
            }
            log::info!("Listed {} history records.", shown.len());
            Ok(false)
        }
        Some(Commands::Clear { yes, file }) => {
            let store = history_store(file, config);
            log::info!("Executing 'clear' command for file: {:?}", store.path());
            if !yes {
                print!("Delete all password history in {:?}? (y/N): ", store.path());
                io::stdout().flush().map_err(|e| {
                    log::error!("Failed to flush stdout for clear confirmation: {}", e);
                    AppError::Cli(format!("Failed to flush stdout: {}", e))
                })?;
                let mut confirmation = String::new();
                io::stdin().read_line(&mut confirmation).map_err(|e| {
                    log::error!("Failed to read clear confirmation: {}", e);
                    AppError::Cli(format!("Failed to read confirmation: {}", e))
                })?;
                if confirmation.trim().to_lowercase() != "y" {
                    println!("Clear cancelled.");
                    log::info!("History clear cancelled by user.");
                    return Ok(false);
                }
            }
            store.clear()?;
            println!("History cleared.");
            Ok(false)
        }
        Some(Commands::Tui) => {
            log::info!("'tui' command given, preparing to launch TUI.");
            Ok(true)
        }
        None => {
            log::info!("No CLI command given, preparing to launch TUI by default.");
            Ok(true)
        }
    }
}
