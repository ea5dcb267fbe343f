//! CLI - Command Line Interface for streamscout
//!
//! Every lookup the TUI performs is scriptable. Output is JSON when asked
//! for, or when stdout is not a terminal.
//!
//! # Examples
//!
//! ```bash
//! # Search for a title
//! streamscout search "dune" --country US --language en
//!
//! # Where does it stream, and for how much?
//! streamscout offers tm1103390
//! streamscout offers tm1103390 --region US --region FR --json
//! ```

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Network error
    NetworkError = 3,
    /// Title not found
    NotFound = 4,
    /// Title found but no offers anywhere
    NoOffers = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// streamscout - where does this movie stream?
///
/// Run without arguments to launch the interactive TUI.
/// Use subcommands for scriptable lookups.
#[derive(Parser, Debug)]
#[command(
    name = "streamscout",
    version,
    about = "Find where a movie streams, and for how much, in every country",
    long_about = "Search a movie, pick a result, and see which streaming services \
                  carry it in each country, with prices.\n\n\
                  Run without arguments to launch the interactive TUI.\n\
                  Use subcommands for automation and scripting.",
    after_help = "EXAMPLES:\n\
                  streamscout                          Launch interactive TUI\n\
                  streamscout search \"dune\" -C FR      Search in France\n\
                  streamscout offers tm1103390 -r US   Offers in one region\n\
                  streamscout regions --json           List known regions"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run (omit for TUI mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Check if running in CLI mode (has subcommand)
    pub fn is_cli_mode(&self) -> bool {
        self.command.is_some()
    }

    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search titles by name
    #[command(visible_alias = "s")]
    Search(SearchCmd),

    /// Show streaming offers for a title across regions
    #[command(visible_alias = "o")]
    Offers(OffersCmd),

    /// Show details for one title
    #[command(visible_alias = "i")]
    Info(InfoCmd),

    /// List recognized regions
    Regions(RegionsCmd),
}

/// Search titles by free text
#[derive(Args, Debug)]
pub struct SearchCmd {
    /// Title, or part of it
    #[arg(required = true)]
    pub query: String,

    /// Country to search in (2-letter code; longer input is truncated)
    #[arg(long, short = 'C')]
    pub country: Option<String>,

    /// Language of titles and descriptions (2-letter code)
    #[arg(long, short = 'l')]
    pub language: Option<String>,

    /// Maximum number of results (the backend returns at most 20)
    #[arg(long, default_value = "20")]
    pub limit: usize,
}

/// Offers for one title
#[derive(Args, Debug)]
pub struct OffersCmd {
    /// Title id from `search` output (e.g., tm1103390)
    #[arg(required = true)]
    pub title_id: String,

    /// Only show these regions (repeatable)
    #[arg(long = "region", short = 'r')]
    pub regions: Vec<String>,
}

/// Details for one title
#[derive(Args, Debug)]
pub struct InfoCmd {
    /// Title id from `search` output
    #[arg(required = true)]
    pub title_id: String,

    /// Country for localized content
    #[arg(long, short = 'C')]
    pub country: Option<String>,

    /// Language for localized content
    #[arg(long, short = 'l')]
    pub language: Option<String>,
}

/// List regions
#[derive(Args, Debug)]
pub struct RegionsCmd {}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print data as JSON, or the pre-rendered text otherwise
    pub fn print<T: Serialize>(&self, data: T, text: impl FnOnce(&T) -> String) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            print!("{}", text(&data));
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
