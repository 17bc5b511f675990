//! Analysis driver
//!
//! Loads a declaration file, schedules the per-type member analysis and
//! assembles the results. Types are grouped by inheritance depth so that a
//! type is analyzed only after its base class; the types of one depth are
//! independent and run in parallel.

pub mod config;
pub mod report;

pub use config::{AnalysisOptions, CONFIG_FILE_NAME, ConfigError};
pub use report::{Summary, aggregate};

use anyhow::{Context, Result};
use cv_decl::Declarations;
use cv_inherit::{Diagnostic, ImplementationMap, OverrideResolution, TypeAnalysis, analyze_type};
use cv_model::{MemberId, Ty, TypeGraph, TypeId};
use cv_span::FileId;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::path::Path;

/// Results of analyzing a whole graph
#[derive(Debug, Clone, Default)]
pub struct AnalysisResult {
    /// Outcome of every `override` declaration, in type then declaration order
    pub overrides: Vec<(MemberId, OverrideResolution)>,
    /// Hiding members with the member each one hides
    pub hidden: Vec<(MemberId, MemberId)>,
    /// Implementation map of every type
    pub implementation_maps: FxHashMap<TypeId, ImplementationMap>,
    /// Types with at least one error before report options are applied
    pub types_with_errors: Vec<TypeId>,
    /// Aggregated diagnostics
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalysisResult {
    /// Resolution of an `override` declaration
    pub fn override_of(&self, member: MemberId) -> Option<&OverrideResolution> {
        self.overrides
            .iter()
            .find(|(id, _)| *id == member)
            .map(|(_, resolution)| resolution)
    }

    /// Implementation map of a type
    pub fn implementation_map(&self, ty: TypeId) -> Option<&ImplementationMap> {
        self.implementation_maps.get(&ty)
    }

    /// Error and warning counts of the report
    pub fn summary(&self) -> Summary {
        Summary::of(&self.diagnostics)
    }

    /// Whether the aggregated report contains an error
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Types grouped by the length of their base chain, each group in arena order
fn levels(graph: &TypeGraph) -> Vec<Vec<TypeId>> {
    let mut levels: Vec<Vec<TypeId>> = Vec::new();
    for ty in graph.type_ids() {
        let depth = graph.base_chain(ty).len();
        if levels.len() <= depth {
            levels.resize_with(depth + 1, Vec::new);
        }
        levels[depth].push(ty);
    }
    levels
}

/// Analyze every type of `graph`
pub fn analyze(graph: &TypeGraph, options: &AnalysisOptions) -> AnalysisResult {
    let inherit = options.inherit_options();
    let mut result = AnalysisResult::default();
    let mut diagnostics = Vec::new();

    for (depth, level) in levels(graph).into_iter().enumerate() {
        tracing::debug!(depth, types = level.len(), parallel = options.parallel, "analyzing level");
        let maps = &result.implementation_maps;
        let analyze_one = |&ty: &TypeId| {
            let base_map = graph
                .base_chain(ty)
                .first()
                .and_then(Ty::def)
                .and_then(|base| maps.get(&base));
            analyze_type(graph, ty, base_map, &inherit)
        };
        let analyses: Vec<TypeAnalysis> = if options.parallel {
            level.par_iter().map(analyze_one).collect()
        } else {
            level.iter().map(analyze_one).collect()
        };

        for analysis in analyses {
            if analysis.has_errors {
                result.types_with_errors.push(analysis.ty);
            }
            result.overrides.extend(analysis.overrides);
            result.hidden.extend(analysis.hidden);
            diagnostics.extend(analysis.diagnostics);
            result.implementation_maps.insert(analysis.ty, analysis.implementation_map);
        }
    }

    result.diagnostics = aggregate(diagnostics, options);
    tracing::debug!(
        diagnostics = result.diagnostics.len(),
        types_with_errors = result.types_with_errors.len(),
        "analysis finished"
    );
    result
}

/// A loaded declaration file with its analysis
#[derive(Debug)]
pub struct Checked {
    /// The loaded graph
    pub declarations: Declarations,
    /// Its analysis
    pub result: AnalysisResult,
}

/// Load the declaration file at `path` and analyze it
pub fn check_file(path: impl AsRef<Path>, options: &AnalysisOptions) -> Result<Checked> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    check_source(&source, options).with_context(|| format!("failed to load {}", path.display()))
}

/// Load declarations from TOML text and analyze them
pub fn check_source(source: &str, options: &AnalysisOptions) -> Result<Checked> {
    let declarations = cv_decl::load_str(source, FileId::new(0))?;
    let result = analyze(&declarations.graph, options);
    Ok(Checked { declarations, result })
}
