//! CLI command definitions and subcommands

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::debug;

/// TenantLetters - legal-notice letters for tenants
#[derive(Parser)]
#[command(
    name = "tl",
    about = "Generate tenant notice letters from templates and answers",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Template directory (overrides config)
    #[arg(short, long, global = true)]
    pub templates: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List available letter templates
    List {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Render a letter from an answers file
    Render {
        /// Template id (see `tl list`)
        id: String,

        /// Answers file (.json, .yml or .yaml)
        #[arg(short, long)]
        answers: PathBuf,

        /// Date to render as today (YYYY-MM-DD), defaults to the local date
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Which form of the letter to print
        #[arg(short, long, default_value = "text")]
        output: LetterOutput,
    },

    /// Project a security deposit forward with interest
    Interest {
        /// Deposit amount
        deposit: String,

        /// Date the deposit was paid (YYYY-MM-DD)
        start: String,

        /// End date (YYYY-MM-DD), defaults to the local date
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Check templates for missing files and uncovered variables
    Lint,
}

/// Output format for listings
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

/// Which rendered form(s) to print
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LetterOutput {
    #[default]
    Text,
    Html,
    Both,
    Json,
}

impl std::str::FromStr for LetterOutput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "LetterOutput::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "html" => Ok(Self::Html),
            "both" => Ok(Self::Both),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown output: {}. Use: text, html, both or json", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_render() {
        let cli = Cli::parse_from([
            "tl",
            "render",
            "notice-to-end-tenancy",
            "--answers",
            "a.json",
            "--today",
            "2024-03-05",
            "--output",
            "both",
        ]);
        match cli.command {
            Command::Render { id, today, output, .. } => {
                assert_eq!(id, "notice-to-end-tenancy");
                assert_eq!(today, NaiveDate::from_ymd_opt(2024, 3, 5));
                assert_eq!(output, LetterOutput::Both);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_bad_today_rejected() {
        let result = Cli::try_parse_from(["tl", "interest", "1000", "2023-06-01", "--today", "June 5"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("table".parse::<OutputFormat>().is_err());
        assert_eq!("html".parse::<LetterOutput>(), Ok(LetterOutput::Html));
    }
}
