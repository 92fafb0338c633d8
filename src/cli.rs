//! CLI argument parsing and command definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::filters::{parse_key_value, FilterArgs};
use crate::domain::Span;

/// Pipe text through configurable filters
#[derive(Parser)]
#[command(
    name = "filter-pipes",
    version,
    about = "Pipe text through configurable filters",
    long_about = "Runs a document, or selected regions of it, through regex, translate, \
                  codec, case and external-process filters, replacing each region with \
                  the filter's output."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Suppress status messages
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

/// Document and selection arguments shared by filtering subcommands.
#[derive(Args, Debug)]
pub struct DocumentArgs {
    /// Read the document from this file instead of stdin
    #[arg(long, short = 'i')]
    pub input: Option<PathBuf>,

    /// Write the result back to the input file instead of stdout
    #[arg(long, requires = "input")]
    pub in_place: bool,

    /// Selected region as START:END character offsets (repeatable)
    #[arg(long = "selection", short = 's', value_name = "START:END")]
    pub selections: Vec<Span>,

    /// Filter the whole document even when selections are given
    #[arg(long)]
    pub whole_document: bool,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Run a declared command (by caption) or a filter (by id)
    Run {
        /// Command caption or filter id
        name: String,

        /// Filter option as KEY=VALUE, overriding declared args (repeatable)
        #[arg(long = "arg", short = 'a', value_name = "KEY=VALUE", value_parser = parse_key_value)]
        args: Vec<(String, toml::Value)>,

        #[command(flatten)]
        document: DocumentArgs,
    },
    /// Pipe the document through a shell command line
    Exec {
        /// Command line passed to the shell
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,

        #[command(flatten)]
        document: DocumentArgs,
    },
    /// List declared commands and available filters
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate default configuration file
    Init {
        /// Path where to create the configuration file
        #[arg(long, short = 'p')]
        path: Option<PathBuf>,
    },
    /// Validate configuration file
    Check,
    /// Display version information
    Version,
}

impl DocumentArgs {
    /// Invocation overrides implied by the document flags.
    pub fn overrides(&self) -> FilterArgs {
        let mut args = FilterArgs::new();
        if self.whole_document {
            args.insert("use_selections", toml::Value::Boolean(false));
        }
        args
    }
}

/// Collect `--arg` pairs into filter options.
pub fn collect_args(pairs: &[(String, toml::Value)]) -> FilterArgs {
    let mut args = FilterArgs::new();
    for (key, value) in pairs {
        args.insert(key, value.clone());
    }
    args
}
