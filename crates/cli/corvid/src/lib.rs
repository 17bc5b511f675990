//! Rendering of analysis results for the `corvid` command line
//!
//! Results are first converted into plain serializable records, which are
//! then either printed as JSON or formatted as text.

use clap::ValueEnum;
use colored::Colorize;
use cv_inherit::{Diagnostic, ImplementationKind, ImplementationMap, Severity, Subject};
use cv_model::{TypeGraph, TypeId};
use cv_span::{FileSpan, line_col};
use serde::Serialize;

/// How command results are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per diagnostic or slot
    #[default]
    Text,
    /// Pretty-printed JSON records
    Json,
}

/// One diagnostic, rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticOutput {
    /// Kind name, e.g. `CantOverrideSealed`
    pub kind: &'static str,
    /// Error or warning
    pub severity: Severity,
    /// Rendered message
    pub message: String,
    /// The member or type the diagnostic is about
    pub subject: String,
    /// The overridden, hidden or implemented member
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<String>,
    /// 1-based position of the subject, absent for builtin declarations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// 1-based column of the subject
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

/// Result of `corvid check`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutput {
    /// Declaration file as given on the command line
    pub file: String,
    /// Number of errors
    pub errors: usize,
    /// Number of warnings
    pub warnings: usize,
    /// Diagnostics in report order
    pub diagnostics: Vec<DiagnosticOutput>,
}

/// One interface slot of `corvid map`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotOutput {
    /// Closed interface member
    pub slot: String,
    /// Implementing member, absent when unimplemented
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementer: Option<String>,
    /// How the slot is implemented
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ImplementationKind>,
}

/// Result of `corvid map`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapOutput {
    /// The type, with its type parameters
    #[serde(rename = "type")]
    pub ty: String,
    /// Whether every slot has an implementer
    pub complete: bool,
    /// Slots in interface order
    pub slots: Vec<SlotOutput>,
}

/// 1-based line and column of a span in `source`
pub fn position(source: &str, span: FileSpan) -> Option<(usize, usize)> {
    if span.is_synthetic() {
        None
    } else {
        Some(line_col(source, span.span.start))
    }
}

fn subject_name(graph: &TypeGraph, subject: Subject) -> String {
    match subject {
        Subject::Member(id) => graph.display_member(id, None).to_string(),
        Subject::Type(id) => graph.display_ty(&graph.self_ty(id)).to_string(),
    }
}

/// Render one diagnostic against its graph and source
pub fn diagnostic_output(graph: &TypeGraph, source: &str, diagnostic: &Diagnostic) -> DiagnosticOutput {
    let position = position(source, diagnostic.span);
    DiagnosticOutput {
        kind: diagnostic.kind.into(),
        severity: diagnostic.severity,
        message: diagnostic.message(graph),
        subject: subject_name(graph, diagnostic.subject),
        related: diagnostic
            .related
            .map(|related| graph.display_member(related, None).to_string()),
        line: position.map(|(line, _)| line),
        column: position.map(|(_, column)| column),
    }
}

/// Render the diagnostics of a run, counting them by severity
pub fn check_output(file: &str, graph: &TypeGraph, source: &str, diagnostics: &[Diagnostic]) -> CheckOutput {
    let diagnostics: Vec<DiagnosticOutput> = diagnostics
        .iter()
        .map(|diagnostic| diagnostic_output(graph, source, diagnostic))
        .collect();
    let errors = diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.severity == Severity::Error)
        .count();
    CheckOutput {
        file: file.to_owned(),
        errors,
        warnings: diagnostics.len() - errors,
        diagnostics,
    }
}

/// Render the implementation map of `ty`
pub fn map_output(graph: &TypeGraph, ty: TypeId, map: &ImplementationMap) -> MapOutput {
    let slots = map
        .entries()
        .map(|(iface, member, implementation)| SlotOutput {
            slot: graph.display_member(member, Some(iface)).to_string(),
            implementer: implementation.map(|found| graph.display_member(found.member, Some(&found.view)).to_string()),
            kind: implementation.map(|found| found.kind),
        })
        .collect();
    MapOutput {
        ty: graph.display_ty(&graph.self_ty(ty)).to_string(),
        complete: map.is_complete(),
        slots,
    }
}

fn severity_label(severity: Severity, color: bool) -> String {
    let label = severity.to_string();
    match (color, severity) {
        (false, _) => label,
        (true, Severity::Error) => label.red().bold().to_string(),
        (true, Severity::Warning) => label.yellow().bold().to_string(),
    }
}

/// Format a check result as text, one diagnostic per line plus a summary
pub fn render_check(output: &CheckOutput, color: bool) -> String {
    let mut text = String::new();
    for diagnostic in &output.diagnostics {
        let location = match (diagnostic.line, diagnostic.column) {
            (Some(line), Some(column)) => format!("{}:{line}:{column}", output.file),
            _ => output.file.clone(),
        };
        text.push_str(&format!(
            "{location}: {}[{}]: {}\n",
            severity_label(diagnostic.severity, color),
            diagnostic.kind,
            diagnostic.message
        ));
    }
    let summary = format!("{} error(s), {} warning(s)", output.errors, output.warnings);
    if color && output.errors == 0 {
        text.push_str(&summary.green().to_string());
    } else {
        text.push_str(&summary);
    }
    text.push('\n');
    text
}

/// Format an implementation map as text, one slot per line
pub fn render_map(output: &MapOutput) -> String {
    let mut text = format!("{}\n", output.ty);
    for slot in &output.slots {
        match (&slot.implementer, slot.kind) {
            (Some(implementer), Some(kind)) => {
                text.push_str(&format!("  {} -> {implementer} ({kind})\n", slot.slot));
            }
            _ => text.push_str(&format!("  {} -> unimplemented\n", slot.slot)),
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_driver::{AnalysisOptions, check_source};
    use expect_test::expect;

    const SOURCE: &str = r#"[[type]]
name = "I"
kind = "interface"
[[type.member]]
name = "M"

[[type]]
name = "C"
interfaces = ["I"]
[[type.member]]
name = "M"
params = ["int"]
"#;

    #[test]
    fn test_render_check_text() {
        let checked = check_source(SOURCE, &AnalysisOptions::default()).unwrap();
        let graph = &checked.declarations.graph;
        let output = check_output("decls.toml", graph, SOURCE, &checked.result.diagnostics);
        expect![[r#"
            decls.toml:8:8: error[UnimplementedInterfaceMember]: `C` does not implement interface member `I.M()`
            1 error(s), 0 warning(s)
        "#]]
        .assert_eq(&render_check(&output, false));
    }

    #[test]
    fn test_check_json_shape() {
        let checked = check_source(SOURCE, &AnalysisOptions::default()).unwrap();
        let graph = &checked.declarations.graph;
        let output = check_output("decls.toml", graph, SOURCE, &checked.result.diagnostics);
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["errors"], 1);
        assert_eq!(json["diagnostics"][0]["kind"], "UnimplementedInterfaceMember");
        assert_eq!(json["diagnostics"][0]["severity"], "Error");
        assert_eq!(json["diagnostics"][0]["related"], "I.M()");
    }

    #[test]
    fn test_output_format_values() {
        assert_eq!(OutputFormat::from_str("json", false), Ok(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("text", false), Ok(OutputFormat::Text));
        assert!(OutputFormat::from_str("yaml", false).is_err());
    }

    #[test]
    fn test_render_map_text() {
        let checked = check_source(SOURCE, &AnalysisOptions::default()).unwrap();
        let graph = &checked.declarations.graph;
        let ty = graph.lookup("C", 0).unwrap();
        let map = checked.result.implementation_map(ty).unwrap();
        expect![[r#"
            C
              I.M() -> unimplemented
        "#]]
        .assert_eq(&render_map(&map_output(graph, ty, map)));
    }
}
