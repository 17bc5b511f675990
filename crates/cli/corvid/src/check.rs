//! Check command implementation

use crate::OptionFlags;
use anyhow::{Context, Result, bail};
use colored::Colorize;
use corvid::{OutputFormat, check_output, position, render_check};
use cv_decl::DeclError;
use cv_driver::{AnalysisOptions, Checked, check_source};
use std::io::IsTerminal;
use std::path::Path;

/// Options from `--config` or the discovered options file, then the flags
pub fn resolve_options(path: &Path, config: Option<&Path>, flags: &OptionFlags) -> Result<AnalysisOptions> {
    let mut options = match config {
        Some(config) => AnalysisOptions::load(config)?,
        None => {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            AnalysisOptions::discover(dir)?
        }
    };
    flags.apply(&mut options);
    tracing::debug!(?options, "resolved analysis options");
    Ok(options)
}

/// Read and analyze a declaration file, pointing load errors at their line
pub fn load(path: &Path, options: &AnalysisOptions) -> Result<(String, Checked)> {
    let source = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    match check_source(&source, options) {
        Ok(checked) => Ok((source, checked)),
        Err(error) => {
            let location = error
                .downcast_ref::<DeclError>()
                .and_then(DeclError::span)
                .and_then(|span| position(&source, span));
            match location {
                Some((line, column)) => bail!("{}:{line}:{column}: {error}", path.display()),
                None => Err(error.context(format!("failed to load {}", path.display()))),
            }
        }
    }
}

/// Run the checks; returns whether the report is free of errors
pub fn run_check(path: &Path, format: OutputFormat, options: &AnalysisOptions) -> Result<bool> {
    let (source, checked) = load(path, options)?;
    let file = path.display().to_string();
    let output = check_output(&file, &checked.declarations.graph, &source, &checked.result.diagnostics);

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&output)?;
            println!("{json}");
        }
        OutputFormat::Text => {
            let color = std::io::stdout().is_terminal();
            if color {
                println!("{} {}", "Checking".green().bold(), file);
            }
            print!("{}", render_check(&output, color));
        }
    }
    Ok(output.errors == 0)
}
