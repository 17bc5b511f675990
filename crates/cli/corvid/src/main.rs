//! Corvid command line
//!
//! Checks member relationships in a declaration file and prints the
//! interface implementation map of a type.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use corvid::OutputFormat;
use cv_driver::AnalysisOptions;
use cv_inherit::DiagnosticKind;
use std::path::PathBuf;
use std::process::ExitCode;

mod check;
mod logging;
mod map;

#[derive(Parser)]
#[command(name = "corvid")]
#[command(about = "Member relationship checks for class and interface declarations", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check overrides, hiding and interface implementations
    Check {
        /// Declaration file
        path: PathBuf,

        /// Options file (defaults to corvid.toml next to the declarations)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        #[command(flatten)]
        flags: OptionFlags,
    },

    /// Print the interface implementation map of a type
    Map {
        /// Declaration file
        path: PathBuf,

        /// Type name
        #[arg(long = "type")]
        ty: String,

        /// Number of type parameters, when several types share the name
        #[arg(long)]
        arity: Option<usize>,

        /// Options file (defaults to corvid.toml next to the declarations)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        #[command(flatten)]
        flags: OptionFlags,
    },
}

/// Command line overrides of the options file
#[derive(Args, Debug, Default)]
pub struct OptionFlags {
    /// Allow overrides to narrow reference return types
    #[arg(long)]
    covariant_returns: bool,

    /// Assume the runtime supports covariant returns of classes
    #[arg(long)]
    covariant_runtime: bool,

    /// Analyze types one at a time
    #[arg(long)]
    sequential: bool,

    /// Treat warnings as errors
    #[arg(long)]
    warnings_as_errors: bool,

    /// Drop a diagnostic kind from the report (repeatable)
    #[arg(long, value_name = "KIND")]
    suppress: Vec<DiagnosticKind>,
}

impl OptionFlags {
    /// Layer the flags over options read from a file; flags only ever
    /// enable behavior or add suppressed kinds
    pub fn apply(&self, options: &mut AnalysisOptions) {
        options.covariant_returns |= self.covariant_returns;
        options.covariant_runtime |= self.covariant_runtime;
        options.warnings_as_errors |= self.warnings_as_errors;
        if self.sequential {
            options.parallel = false;
        }
        for kind in &self.suppress {
            if !options.suppress.contains(kind) {
                options.suppress.push(*kind);
            }
        }
    }
}

fn main() -> Result<ExitCode> {
    logging::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            path,
            config,
            format,
            flags,
        } => {
            let options = check::resolve_options(&path, config.as_deref(), &flags)?;
            let clean = check::run_check(&path, format, &options)?;
            Ok(if clean { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        Commands::Map {
            path,
            ty,
            arity,
            config,
            format,
            flags,
        } => {
            let options = check::resolve_options(&path, config.as_deref(), &flags)?;
            map::run_map(&path, &ty, arity, format, &options)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
