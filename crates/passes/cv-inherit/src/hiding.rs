//! Hiding validation for declarations that are not overrides

use crate::diagnostic::{Diagnostic, DiagnosticArg, DiagnosticKind, DiagnosticSink};
use crate::locate::{SearchMode, locate};
use cv_model::{MemberId, TypeGraph, TypeKind};

/// Check whether `member` hides an inherited member and whether `new` is
/// used accordingly
///
/// Returns the hidden member, if any. Overrides and explicit interface
/// implementations never hide.
pub fn check_hiding(graph: &TypeGraph, member: MemberId, sink: &mut DiagnosticSink) -> Option<MemberId> {
    let def = graph.member(member);
    if def.is_override() || def.is_explicit_impl() {
        return None;
    }

    let hits = locate(graph, member, SearchMode::Hiding);
    let Some(hidden) = hits.iter().find(|hit| hit.same_kind).or_else(|| hits.first()) else {
        if def.is_new() {
            sink.report(Diagnostic::on_member(graph, DiagnosticKind::NewNotRequired, member));
        }
        return None;
    };

    let hidden_def = graph.member(hidden.member);
    let report = |sink: &mut DiagnosticSink, kind: DiagnosticKind| {
        sink.report(
            Diagnostic::on_member(graph, kind, member)
                .with_related(hidden.member)
                .with_arg(DiagnosticArg::member_in(hidden.member, &hidden.view)),
        );
    };

    if hidden.same_kind && hidden_def.is_virtual_like() {
        if hidden_def.is_abstract() && graph.ty(def.owner).kind == TypeKind::Class {
            report(sink, DiagnosticKind::HidingAbstractMethod);
        }
        if !def.is_new() {
            report(sink, DiagnosticKind::NewOrOverrideExpected);
        }
    } else if !def.is_new() {
        report(sink, DiagnosticKind::NewRequired);
    }
    Some(hidden.member)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{kinds, load, member_at};

    fn hiding_kinds(source: &str, ty: &str, index: usize) -> Vec<DiagnosticKind> {
        let graph = load(source);
        let mut sink = DiagnosticSink::new();
        check_hiding(&graph, member_at(&graph, ty, index), &mut sink);
        kinds(sink.diagnostics())
    }

    const HIERARCHY: &str = r#"
        [[type]]
        name = "Base"
        modifiers = ["abstract"]
        [[type.member]]
        name = "Abstract"
        modifiers = ["abstract"]
        [[type.member]]
        name = "Virtual"
        modifiers = ["virtual"]
        [[type.member]]
        name = "Plain"
        [[type.member]]
        kind = "field"
        name = "Field"
        returns = "int"

        [[type]]
        name = "D"
        base = "Base"
        modifiers = ["abstract"]
        [[type.member]]
        name = "Abstract"
        [[type.member]]
        name = "Virtual"
        [[type.member]]
        name = "Plain"
        [[type.member]]
        name = "Plain"
        modifiers = ["new"]
        params = ["int"]
        [[type.member]]
        kind = "type"
        name = "Field"
        [[type.member]]
        name = "Virtual"
        modifiers = ["new"]
        params = ["string"]
        [[type.member]]
        name = "Abstract"
        modifiers = ["new"]
        params = ["long"]
    "#;

    #[test]
    fn test_hiding_outcomes() {
        assert_eq!(
            hiding_kinds(HIERARCHY, "D", 0),
            vec![DiagnosticKind::HidingAbstractMethod, DiagnosticKind::NewOrOverrideExpected]
        );
        assert_eq!(hiding_kinds(HIERARCHY, "D", 1), vec![DiagnosticKind::NewOrOverrideExpected]);
        assert_eq!(hiding_kinds(HIERARCHY, "D", 2), vec![DiagnosticKind::NewRequired]);
        assert_eq!(hiding_kinds(HIERARCHY, "D", 3), vec![DiagnosticKind::NewNotRequired]);
        assert_eq!(hiding_kinds(HIERARCHY, "D", 4), vec![DiagnosticKind::NewRequired]);
    }

    #[test]
    fn test_new_suppresses_warnings_but_not_abstract_error() {
        let source = r#"
            [[type]]
            name = "Base"
            modifiers = ["abstract"]
            [[type.member]]
            name = "M"
            modifiers = ["abstract"]
            [[type.member]]
            name = "V"
            modifiers = ["virtual"]

            [[type]]
            name = "D"
            base = "Base"
            modifiers = ["abstract"]
            [[type.member]]
            name = "M"
            modifiers = ["new"]
            [[type.member]]
            name = "V"
            modifiers = ["new", "virtual"]
        "#;
        assert_eq!(hiding_kinds(source, "D", 0), vec![DiagnosticKind::HidingAbstractMethod]);
        assert!(hiding_kinds(source, "D", 1).is_empty());
    }

    #[test]
    fn test_hiding_is_idempotent() {
        let graph = load(HIERARCHY);
        let member = member_at(&graph, "D", 0);
        let mut first = DiagnosticSink::new();
        let mut second = DiagnosticSink::new();
        let hidden_once = check_hiding(&graph, member, &mut first);
        let hidden_twice = check_hiding(&graph, member, &mut second);
        assert_eq!(hidden_once, hidden_twice);
        assert_eq!(first.diagnostics(), second.diagnostics());
    }

    #[test]
    fn test_new_member_starts_fresh_chain() {
        let source = r#"
            [[type]]
            name = "A"
            [[type.member]]
            name = "M"
            modifiers = ["virtual"]

            [[type]]
            name = "B"
            base = "A"
            [[type.member]]
            name = "M"
            modifiers = ["new"]

            [[type]]
            name = "C"
            base = "B"
            [[type.member]]
            name = "M"
        "#;
        let graph = load(source);
        let mut sink = DiagnosticSink::new();
        let hidden = check_hiding(&graph, member_at(&graph, "C", 0), &mut sink);
        assert_eq!(hidden, Some(member_at(&graph, "B", 0)));
        assert_eq!(kinds(sink.diagnostics()), vec![DiagnosticKind::NewRequired]);
    }
}
