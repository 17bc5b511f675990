//! Diagnostic aggregation
//!
//! Applies the report options to the diagnostics of a whole run and puts
//! them in a stable order: by source position, then kind, then subject.

use crate::config::AnalysisOptions;
use cv_inherit::{Diagnostic, Severity, Subject};
use cv_model::index_of;

/// Sort key of a subject: members before types, then arena order
fn subject_key(subject: Subject) -> (u8, u32) {
    match subject {
        Subject::Member(id) => (0, index_of(id)),
        Subject::Type(id) => (1, index_of(id)),
    }
}

/// Drop suppressed kinds, promote warnings if asked, and sort
pub fn aggregate(mut diagnostics: Vec<Diagnostic>, options: &AnalysisOptions) -> Vec<Diagnostic> {
    diagnostics.retain(|diagnostic| !options.suppress.contains(&diagnostic.kind));
    if options.warnings_as_errors {
        for diagnostic in &mut diagnostics {
            diagnostic.severity = Severity::Error;
        }
    }
    diagnostics.sort_by_key(|diagnostic| (diagnostic.span, diagnostic.kind, subject_key(diagnostic.subject)));
    diagnostics
}

/// Counts by severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Diagnostics reported as errors
    pub errors: usize,
    /// Diagnostics reported as warnings
    pub warnings: usize,
}

impl Summary {
    /// Count the diagnostics of a report
    pub fn of(diagnostics: &[Diagnostic]) -> Self {
        let errors = diagnostics.iter().filter(|diagnostic| diagnostic.is_error()).count();
        Self {
            errors,
            warnings: diagnostics.len() - errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_decl::load_str;
    use cv_inherit::DiagnosticKind;
    use cv_model::TypeGraph;
    use cv_span::FileId;

    fn graph() -> TypeGraph {
        load_str(
            r#"
            [[type]]
            name = "A"
            [[type.member]]
            name = "M"

            [[type]]
            name = "B"
            base = "A"
            [[type.member]]
            name = "M"
            "#,
            FileId::new(0),
        )
        .unwrap()
        .graph
    }

    fn sample(graph: &TypeGraph) -> Vec<Diagnostic> {
        let a = graph.lookup("A", 0).unwrap();
        let b = graph.lookup("B", 0).unwrap();
        let b_member = graph.ty(b).members[0];
        vec![
            Diagnostic::on_member(graph, DiagnosticKind::NewRequired, b_member),
            Diagnostic::on_type(graph, DiagnosticKind::UnimplementedInterfaceMember, b),
            Diagnostic::on_type(graph, DiagnosticKind::UnimplementedAbstractMethod, a),
        ]
    }

    #[test]
    fn test_order_is_by_position() {
        let graph = graph();
        let sorted = aggregate(sample(&graph), &AnalysisOptions::default());
        let kinds: Vec<DiagnosticKind> = sorted.iter().map(|diagnostic| diagnostic.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiagnosticKind::UnimplementedAbstractMethod,
                DiagnosticKind::UnimplementedInterfaceMember,
                DiagnosticKind::NewRequired,
            ]
        );
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let graph = graph();
        let forward = aggregate(sample(&graph), &AnalysisOptions::default());
        let mut reversed = sample(&graph);
        reversed.reverse();
        assert_eq!(forward, aggregate(reversed, &AnalysisOptions::default()));
    }

    #[test]
    fn test_suppress_and_promote() {
        let graph = graph();
        let options = AnalysisOptions {
            warnings_as_errors: true,
            suppress: vec![DiagnosticKind::UnimplementedAbstractMethod],
            ..AnalysisOptions::default()
        };
        let report = aggregate(sample(&graph), &options);
        assert_eq!(report.len(), 2);
        assert!(report.iter().all(Diagnostic::is_error));
        assert_eq!(Summary::of(&report), Summary { errors: 2, warnings: 0 });
        assert_eq!(
            Summary::of(&aggregate(sample(&graph), &AnalysisOptions::default())),
            Summary { errors: 2, warnings: 1 }
        );
    }
}
