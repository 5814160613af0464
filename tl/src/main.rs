//! TenantLetters - legal-notice letters for tenants
//!
//! CLI entry point for listing, rendering and linting letter templates.

use std::path::Path;

use chrono::{Local, NaiveDate};
use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use tracing::{debug, info};

use letterrender::filters::{format_money, parse_amount, parse_date};
use letterrender::{Compositor, FilterLibrary, InterestOutcome, RenderRequest};
use tenantletters::answers::load_answers;
use tenantletters::cli::{Cli, Command, LetterOutput, OutputFormat};
use tenantletters::config::Config;
use tenantletters::{TemplateStore, lint_templates};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > default (WARN)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to WARN", s);
                tracing::Level::WARN
            }
        },
        None => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre!("Failed to install subscriber: {}", e))?;

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let templates_dir = cli.templates.clone().unwrap_or_else(|| config.templates_dir.clone());
    info!("tl using templates from {}", templates_dir.display());

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::List { format } => cmd_list(&templates_dir, format),
        Command::Render {
            id,
            answers,
            today,
            output,
        } => cmd_render(&config, &templates_dir, &id, &answers, today, output),
        Command::Interest { deposit, start, today } => cmd_interest(&config, &deposit, &start, today),
        Command::Lint => cmd_lint(&templates_dir),
    }
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

fn cmd_list(templates_dir: &Path, format: OutputFormat) -> Result<()> {
    debug!(?templates_dir, ?format, "cmd_list: called");
    let store = TemplateStore::open(templates_dir)?;
    match format {
        OutputFormat::Json => {
            let metas: Vec<_> = store.catalog().iter().collect();
            println!("{}", serde_json::to_string_pretty(&metas)?);
        }
        OutputFormat::Text => {
            for meta in store.catalog().iter() {
                println!("{} {}", meta.id.cyan(), meta.name.bold());
                println!("    {}", meta.description);
            }
        }
    }
    Ok(())
}

fn cmd_render(
    config: &Config,
    templates_dir: &Path,
    id: &str,
    answers: &Path,
    today: Option<NaiveDate>,
    output: LetterOutput,
) -> Result<()> {
    debug!(%id, ?answers, ?today, ?output, "cmd_render: called");
    let store = TemplateStore::open(templates_dir)?;
    let loaded = store.load(id).context(format!("Failed to load template '{}'", id))?;
    let fields = load_answers(answers)?;

    // Never show a partial letter for incomplete answers
    loaded.form.validate(&fields)?;

    let compositor = Compositor::new(FilterLibrary::new(config.rate_table()));
    let request = RenderRequest::new(fields, today.unwrap_or_else(local_today));
    let letter = compositor.render(&loaded.letter, &request)?;

    match output {
        LetterOutput::Text => println!("{}", letter.plain_text),
        LetterOutput::Html => println!("{}", letter.presentation),
        LetterOutput::Both => {
            println!("{}", "--- presentation ---".dimmed());
            println!("{}", letter.presentation);
            println!("{}", "--- plain text ---".dimmed());
            println!("{}", letter.plain_text);
        }
        LetterOutput::Json => println!("{}", serde_json::to_string_pretty(&letter)?),
    }
    Ok(())
}

fn cmd_interest(config: &Config, deposit: &str, start: &str, today: Option<NaiveDate>) -> Result<()> {
    debug!(%deposit, %start, ?today, "cmd_interest: called");
    let amount = parse_amount(deposit).ok_or_else(|| eyre!("Deposit is not a number: {}", deposit))?;
    let start_date = parse_date(start).ok_or_else(|| eyre!("Start date must be YYYY-MM-DD: {}", start))?;
    let today = today.unwrap_or_else(local_today);

    let filters = FilterLibrary::new(config.rate_table());
    match filters.deposit_interest(amount, start_date, today) {
        InterestOutcome::Computed(total) => {
            println!(
                "{} {} held {} to {} → {}",
                "✓".green(),
                format_money(amount),
                start_date,
                today,
                format_money(total).bold()
            );
        }
        InterestOutcome::UnsupportedRange { start_year, min_year } => {
            let supported = min_year.map_or_else(|| "none configured".to_string(), |y| format!("{} onwards", y));
            println!(
                "{} Interest not calculated: start year {} is outside the supported range ({})",
                "✗".yellow(),
                start_year,
                supported
            );
        }
    }
    Ok(())
}

fn cmd_lint(templates_dir: &Path) -> Result<()> {
    debug!(?templates_dir, "cmd_lint: called");
    let report = lint_templates(templates_dir)?;
    for problem in &report.problems {
        println!("{}", problem);
    }

    if report.is_clean() {
        println!("{} {}", "✓".green(), report.summary());
        Ok(())
    } else {
        println!("{} {}", "✗".red(), report.summary());
        std::process::exit(1);
    }
}
