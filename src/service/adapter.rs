//! Document adapters for the command line.
//!
//! Bridges files and standard streams to the in-memory buffer the filters
//! operate on, and renders the command listing as text or JSON.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::config::{CommandDeclaration, Config};
use crate::domain::filters::FilterRegistry;
use crate::domain::{DocumentBuffer, Span};

/// Where a document is read from and written back to.
pub struct DocumentAdapter {
    input: Option<PathBuf>,
    in_place: bool,
}

impl DocumentAdapter {
    /// Read from `input` (stdin when `None`). With `in_place`, results are
    /// written back to the same file instead of stdout.
    pub fn new(input: Option<PathBuf>, in_place: bool) -> Self {
        Self { input, in_place }
    }

    /// Load the document and apply the requested selections.
    pub fn read(&self, selections: Vec<Span>) -> Result<DocumentBuffer> {
        let text = match &self.input {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read input file: {}", path.display()))?,
            None => {
                let mut text = String::new();
                io::stdin()
                    .read_to_string(&mut text)
                    .context("Failed to read document from stdin")?;
                text
            }
        };

        let size = text.chars().count();
        debug!("Read document: chars={} selections={}", size, selections.len());
        check_selections(&selections, size)?;

        Ok(DocumentBuffer::with_selections(&text, selections))
    }

    /// Emit the (possibly filtered) document.
    pub fn write(&self, buffer: &DocumentBuffer) -> Result<()> {
        let text = buffer.text();
        match (&self.input, self.in_place) {
            (Some(path), true) => write_file(path, &text),
            (None, true) => Err(anyhow!("--in-place requires an input file")),
            _ => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(text.as_bytes())?;
                stdout.flush()?;
                Ok(())
            }
        }
    }
}

/// A non-empty selection must start inside the document.
fn check_selections(selections: &[Span], size: usize) -> Result<()> {
    for span in selections {
        if !span.is_empty() && span.start >= size {
            bail!(
                "Selection {} lies past the end of the document ({} characters)",
                span,
                size
            );
        }
    }
    Ok(())
}

fn write_file(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text)
        .with_context(|| format!("Failed to write output file: {}", path.display()))
}

#[derive(Serialize)]
struct Listing<'a> {
    commands: &'a [CommandDeclaration],
    filters: Vec<&'static str>,
}

/// Render declared commands and available filter ids.
pub fn format_listing(config: &Config, registry: &FilterRegistry, json: bool) -> Result<String> {
    if json {
        let listing = Listing {
            commands: &config.commands,
            filters: registry.ids().collect(),
        };
        return serde_json::to_string_pretty(&listing)
            .map_err(|e| anyhow!("Failed to serialize command list: {}", e));
    }

    let mut out = String::new();
    out.push_str("Commands:\n");
    if config.commands.is_empty() {
        out.push_str("  (none)\n");
    }
    for command in &config.commands {
        out.push_str(&format!("  {} [{}]", command.caption, command.filter_id));
        if !command.args.is_empty() {
            let args: Vec<String> = command
                .args
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            out.push_str(&format!(" {}", args.join(" ")));
        }
        out.push('\n');
    }
    out.push_str("Filters:\n");
    for id in registry.ids() {
        out.push_str(&format!("  {}\n", id));
    }
    Ok(out)
}
