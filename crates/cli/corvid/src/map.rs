//! Map command implementation

use crate::check::load;
use anyhow::{Context, Result, bail};
use corvid::{OutputFormat, map_output, render_map};
use cv_driver::AnalysisOptions;
use std::path::Path;

/// Type parameter counts tried when no arity is given
const MAX_ARITY: usize = 8;

/// Print the implementation map of the type `name`
pub fn run_map(
    path: &Path,
    name: &str,
    arity: Option<usize>,
    format: OutputFormat,
    options: &AnalysisOptions,
) -> Result<()> {
    let (_, checked) = load(path, options)?;
    let graph = &checked.declarations.graph;

    let ty = match arity {
        Some(arity) => graph.lookup(name, arity),
        None => (0..=MAX_ARITY).find_map(|arity| graph.lookup(name, arity)),
    }
    .with_context(|| format!("no type named `{name}` in {}", path.display()))?;
    let Some(map) = checked.result.implementation_map(ty) else {
        bail!("no implementation map for `{name}`");
    };
    let output = map_output(graph, ty, map);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Text => print!("{}", render_map(&output)),
    }
    Ok(())
}
