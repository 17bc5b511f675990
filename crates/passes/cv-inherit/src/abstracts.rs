//! Abstract obligations of concrete classes

use crate::diagnostic::{Diagnostic, DiagnosticArg, DiagnosticKind, DiagnosticSink};
use crate::locate::override_chain;
use cv_model::{AccessorKind, MemberId, TypeGraph, TypeId, TypeKind};

/// An override seen from the class being checked
struct Overrider {
    level: usize,
    member: MemberId,
    replaces: Vec<MemberId>,
}

impl Overrider {
    fn provides(&self, graph: &TypeGraph, accessor: Option<AccessorKind>) -> bool {
        accessor.is_none_or(|kind| graph.member(self.member).accessor(kind).is_some())
    }
}

/// Report every abstract member of `ty`'s base classes that `ty` leaves
/// without an implementation
///
/// Properties, indexers and events are checked per accessor. Returns the
/// unimplemented members in base chain order.
pub fn check_abstracts(graph: &TypeGraph, ty: TypeId, sink: &mut DiagnosticSink) -> Vec<MemberId> {
    let def = graph.ty(ty);
    if def.kind != TypeKind::Class || def.is_abstract() {
        return Vec::new();
    }

    let mut levels = vec![graph.self_ty(ty)];
    levels.extend(graph.base_chain(ty));

    let mut overriders = Vec::new();
    for (level, view) in levels.iter().enumerate() {
        let Some(level_ty) = view.def() else {
            continue;
        };
        for &member in &graph.ty(level_ty).members {
            if graph.member(member).is_override() {
                let replaces = override_chain(graph, member).into_iter().skip(1).map(|(id, _)| id).collect();
                overriders.push(Overrider {
                    level,
                    member,
                    replaces,
                });
            }
        }
    }

    let mut missing = Vec::new();
    for (level, view) in levels.iter().enumerate().skip(1) {
        let Some(level_ty) = view.def() else {
            continue;
        };
        for &member in &graph.ty(level_ty).members {
            let abstract_def = graph.member(member);
            if !abstract_def.is_abstract() || !abstract_def.kind.is_dispatchable() {
                continue;
            }
            let units: Vec<Option<AccessorKind>> = if abstract_def.kind.has_accessors() {
                abstract_def.accessors.iter().map(|accessor| Some(accessor.kind)).collect()
            } else {
                vec![None]
            };

            let unimplemented = units.into_iter().any(|unit| {
                let decider = overriders.iter().find(|overrider| {
                    overrider.level < level && overrider.replaces.contains(&member) && overrider.provides(graph, unit)
                });
                match decider {
                    None => true,
                    // A base-level abstract override carries the obligation itself
                    Some(overrider) => overrider.level == 0 && graph.member(overrider.member).is_abstract(),
                }
            });
            if unimplemented {
                tracing::trace!(ty = ?ty, member = ?member, "abstract member left unimplemented");
                sink.report(
                    Diagnostic::on_type(graph, DiagnosticKind::UnimplementedAbstractMethod, ty)
                        .with_related(member)
                        .with_arg(DiagnosticArg::member_in(member, view)),
                );
                missing.push(member);
            }
        }
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{kinds, load, member_at, type_named};

    fn check(source: &str, ty: &str) -> (Vec<MemberId>, Vec<DiagnosticKind>) {
        let graph = load(source);
        let mut sink = DiagnosticSink::new();
        let missing = check_abstracts(&graph, type_named(&graph, ty), &mut sink);
        (missing, kinds(sink.diagnostics()))
    }

    const SHAPES: &str = r#"
        [[type]]
        name = "Shape"
        modifiers = ["abstract"]
        [[type.member]]
        name = "Area"
        returns = "double"
        modifiers = ["abstract"]
        [[type.member]]
        kind = "property"
        name = "Name"
        returns = "string"
        modifiers = ["abstract"]

        [[type]]
        name = "Partial"
        base = "Shape"
        modifiers = ["abstract"]
        [[type.member]]
        name = "Area"
        returns = "double"
        modifiers = ["override"]

        [[type]]
        name = "Square"
        base = "Partial"
        [[type.member]]
        kind = "property"
        name = "Name"
        returns = "string"
        modifiers = ["override"]
        accessors = ["get"]

        [[type]]
        name = "Circle"
        base = "Partial"
        [[type.member]]
        kind = "property"
        name = "Name"
        returns = "string"
        modifiers = ["override"]

        [[type]]
        name = "Blob"
        base = "Shape"
    "#;

    #[test]
    fn test_abstract_classes_owe_nothing() {
        let (missing, diagnostics) = check(SHAPES, "Partial");
        assert!(missing.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_fully_implemented_class() {
        let (missing, diagnostics) = check(SHAPES, "Circle");
        assert!(missing.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_missing_accessor_leaves_member_abstract() {
        let graph = load(SHAPES);
        let mut sink = DiagnosticSink::new();
        let missing = check_abstracts(&graph, type_named(&graph, "Square"), &mut sink);
        assert_eq!(missing, vec![member_at(&graph, "Shape", 1)]);
        assert_eq!(kinds(sink.diagnostics()), vec![DiagnosticKind::UnimplementedAbstractMethod]);
    }

    #[test]
    fn test_nothing_overridden() {
        let (missing, diagnostics) = check(SHAPES, "Blob");
        assert_eq!(missing.len(), 2);
        assert_eq!(
            diagnostics,
            vec![DiagnosticKind::UnimplementedAbstractMethod, DiagnosticKind::UnimplementedAbstractMethod]
        );
    }

    #[test]
    fn test_rejected_override_still_discharges() {
        let source = r#"
            [[type]]
            name = "A"
            modifiers = ["abstract"]
            [[type.member]]
            name = "M"
            returns = "int"
            modifiers = ["abstract"]

            [[type]]
            name = "B"
            base = "A"
            [[type.member]]
            name = "M"
            returns = "string"
            modifiers = ["override"]
        "#;
        let (missing, diagnostics) = check(source, "B");
        assert!(missing.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_abstract_override_is_reported_once() {
        let source = r#"
            [[type]]
            name = "A"
            modifiers = ["abstract"]
            [[type.member]]
            name = "M"
            modifiers = ["virtual"]

            [[type]]
            name = "B"
            base = "A"
            modifiers = ["abstract"]
            [[type.member]]
            name = "M"
            modifiers = ["abstract", "override"]

            [[type]]
            name = "C"
            base = "B"
        "#;
        let graph = load(source);
        let mut sink = DiagnosticSink::new();
        let missing = check_abstracts(&graph, type_named(&graph, "C"), &mut sink);
        assert_eq!(missing, vec![member_at(&graph, "B", 0)]);
    }
}
