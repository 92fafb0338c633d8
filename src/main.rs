//! filter-pipes: text filtering for editors and pipelines
//!
//! Runs a document, or selected regions of it, through regex, translate,
//! codec, case and external-process filters and replaces each region with
//! the filter's output.

mod cli;
mod config;
mod domain;
mod service;

use std::process;

use anyhow::Result;
use clap::Parser;
use tracing::error;

use cli::{collect_args, Cli, Commands, DocumentArgs};
use config::ConfigService;
use domain::filters::FilterRegistry;
use domain::{AggregateResult, StatusSink, StderrStatus};
use service::{format_listing, DocumentAdapter, FilterService, Invocation};

/// Exit code for invocations rejected before any filtering.
const CONFIGURATION_ERROR_EXIT_CODE: i32 = 2;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = ConfigService::load(cli.config.as_deref())?;

    // Console warnings always; file logging in debug mode
    domain::logger::init(&config, cli.debug || config.debug)?;

    // Execute command
    match cli.command {
        Commands::Run {
            name,
            args,
            document,
        } => {
            let service = FilterService::new(config, FilterRegistry::with_builtins());
            let mut overrides = collect_args(&args);
            overrides.merge(&document.overrides());
            let invocation = match service.resolve(&name, &overrides) {
                Ok(invocation) => invocation,
                Err(e) => {
                    error!("Cannot resolve '{}': {}", name, e);
                    if service.config().errors_on_statusbar {
                        StderrStatus::new(cli.quiet).status_message(&e.to_string());
                    }
                    process::exit(CONFIGURATION_ERROR_EXIT_CODE);
                }
            };
            let code = filter_document(&service, &invocation, &document, cli.quiet)?;
            process::exit(code);
        }
        Commands::Exec { command, document } => {
            let service = FilterService::new(config, FilterRegistry::with_builtins());
            let mut invocation = Invocation::shell(&command.join(" "));
            invocation.args.merge(&document.overrides());
            let code = filter_document(&service, &invocation, &document, cli.quiet)?;
            process::exit(code);
        }
        Commands::List { json } => {
            print!(
                "{}",
                format_listing(&config, &FilterRegistry::with_builtins(), json)?
            );
            if json {
                println!();
            }
        }
        Commands::Init { path } => {
            let config_path = if let Some(p) = path {
                ConfigService::generate_at(&p)?;
                p
            } else {
                ConfigService::generate_default()?;
                ConfigService::default_path()
            };
            if !cli.quiet {
                eprintln!("Configuration file created at: {}", config_path.display());
            }
        }
        Commands::Check => {
            config::validate(&config)?;
            if !cli.quiet {
                eprintln!("Configuration is valid.");
            }
        }
        Commands::Version => {
            println!("filter-pipes {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

/// Filter one document and write it out. Returns the process exit code.
fn filter_document(
    service: &FilterService,
    invocation: &Invocation,
    document: &DocumentArgs,
    quiet: bool,
) -> Result<i32> {
    let adapter = DocumentAdapter::new(document.input.clone(), document.in_place);
    let mut buffer = match adapter.read(document.selections.clone()) {
        Ok(buffer) => buffer,
        Err(e) => {
            error!("Cannot load document: {:#}", e);
            return Ok(CONFIGURATION_ERROR_EXIT_CODE);
        }
    };
    let status = StderrStatus::new(quiet);

    let report = match service.invoke(&mut buffer, invocation, &status) {
        Ok(report) => report,
        // Already reported through the status sink
        Err(_) => return Ok(CONFIGURATION_ERROR_EXIT_CODE),
    };

    if report.result == AggregateResult::Failure {
        return Ok(report.result.exit_code());
    }

    adapter.write(&buffer)?;
    Ok(report.result.exit_code())
}
