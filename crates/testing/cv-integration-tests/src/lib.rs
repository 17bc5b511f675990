//! Shared helpers for the end-to-end tests of the analysis pipeline

use cv_driver::{AnalysisOptions, Checked, check_source};
use cv_inherit::DiagnosticKind;
use cv_model::{MemberId, TypeGraph, TypeId};

/// Load and analyze a fixture with the given options
pub fn check_with(source: &str, options: &AnalysisOptions) -> Checked {
    match check_source(source, options) {
        Ok(checked) => checked,
        Err(error) => panic!("fixture failed to load: {error:#}"),
    }
}

/// Load and analyze a fixture with default options
pub fn check(source: &str) -> Checked {
    check_with(source, &AnalysisOptions::default())
}

/// One line per diagnostic: severity, kind and message, without positions
pub fn render(checked: &Checked) -> String {
    let graph = &checked.declarations.graph;
    let mut text = String::new();
    for diagnostic in &checked.result.diagnostics {
        text.push_str(&format!(
            "{} {}: {}\n",
            diagnostic.severity,
            diagnostic.kind,
            diagnostic.message(graph)
        ));
    }
    text
}

/// Kinds of the reported diagnostics, in report order
pub fn kinds(checked: &Checked) -> Vec<DiagnosticKind> {
    checked.result.diagnostics.iter().map(|diagnostic| diagnostic.kind).collect()
}

/// Type by name, trying small arities
pub fn type_named(graph: &TypeGraph, name: &str) -> TypeId {
    match (0..4).find_map(|arity| graph.lookup(name, arity)) {
        Some(ty) => ty,
        None => panic!("no type named {name}"),
    }
}

/// The `index`th member declared in `ty`
pub fn member_at(graph: &TypeGraph, ty: &str, index: usize) -> MemberId {
    graph.ty(type_named(graph, ty)).members[index]
}
