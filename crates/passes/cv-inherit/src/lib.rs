//! Member relationship resolution
//!
//! Decides, for every member declared in a type, whether it overrides, hides
//! or implements an inherited member, and validates that relationship:
//!
//! - [`locate`] finds the inherited members a declaration relates to
//! - [`overrides`] resolves and checks `override` declarations
//! - [`hiding`] checks `new` against what a declaration actually hides
//! - [`interfaces`] builds the per-type interface implementation map
//! - [`abstracts`] checks the abstract obligations of concrete classes
//!
//! Every check reports into a [`DiagnosticSink`]; nothing here fails with
//! `Err`. [`analyze_type`] runs all of them for one type.
#![allow(
    clippy::min_ident_chars,
    reason = "Ty is a conventional name in type system implementations"
)]

pub mod abstracts;
pub mod diagnostic;
pub mod hiding;
pub mod interfaces;
pub mod locate;
pub mod overrides;

pub use abstracts::check_abstracts;
pub use diagnostic::{Diagnostic, DiagnosticArg, DiagnosticKind, DiagnosticSink, Severity, Subject};
pub use hiding::check_hiding;
pub use interfaces::{
    Implementation, ImplementationKind, ImplementationMap, resolve_interfaces, resolve_interfaces_with_bases,
};
pub use locate::{Candidate, SearchMode, locate, override_chain, overridden_candidate};
pub use overrides::{OverrideResolution, resolve_override};

use cv_model::{MemberId, TypeGraph, TypeId};

/// Language options that change what an override may do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InheritOptions {
    /// Overrides may narrow a reference return type
    pub covariant_returns: bool,
    /// The target runtime supports covariant returns of classes
    pub covariant_runtime: bool,
}

/// Everything resolved for one type
#[derive(Debug, Clone)]
pub struct TypeAnalysis {
    /// The analyzed type
    pub ty: TypeId,
    /// Outcome of every `override` declaration, in declaration order
    pub overrides: Vec<(MemberId, OverrideResolution)>,
    /// Members that hide an inherited member, with the member they hide
    pub hidden: Vec<(MemberId, MemberId)>,
    /// Interface slots and their implementers
    pub implementation_map: ImplementationMap,
    /// Diagnostics in report order
    pub diagnostics: Vec<Diagnostic>,
    /// Whether any diagnostic is an error
    pub has_errors: bool,
}

/// Resolve every member relationship of `ty`
///
/// `base_map` must be the implementation map of `ty`'s base class when it
/// has one; without it, interfaces inherited through the base class are
/// resolved again silently.
pub fn analyze_type(
    graph: &TypeGraph,
    ty: TypeId,
    base_map: Option<&ImplementationMap>,
    options: &InheritOptions,
) -> TypeAnalysis {
    let mut sink = DiagnosticSink::new();
    let mut overrides = Vec::new();
    let mut hidden = Vec::new();

    for &member in &graph.ty(ty).members {
        if graph.member(member).is_override() {
            let resolution = resolve_override(graph, member, options, &mut sink);
            tracing::trace!(member = %graph.display_member(member, None), ?resolution, "override resolved");
            overrides.push((member, resolution));
        } else if let Some(target) = check_hiding(graph, member, &mut sink) {
            hidden.push((member, target));
        }
    }

    let implementation_map = resolve_interfaces(graph, ty, base_map, &mut sink);
    check_abstracts(graph, ty, &mut sink);

    let has_errors = sink.has_errors();
    let diagnostics = sink.take_diagnostics();
    tracing::debug!(
        ty = %graph.display_ty(&graph.self_ty(ty)),
        overrides = overrides.len(),
        slots = implementation_map.len(),
        diagnostics = diagnostics.len(),
        has_errors,
        "type analyzed"
    );
    TypeAnalysis {
        ty,
        overrides,
        hidden,
        implementation_map,
        diagnostics,
        has_errors,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::diagnostic::{Diagnostic, DiagnosticKind};
    use cv_decl::load_str;
    use cv_model::{MemberId, TypeGraph, TypeId};
    use cv_span::FileId;

    pub fn load(source: &str) -> TypeGraph {
        load_str(source, FileId::new(0)).unwrap().graph
    }

    pub fn type_named(graph: &TypeGraph, name: &str) -> TypeId {
        (0..4)
            .find_map(|arity| graph.lookup(name, arity))
            .unwrap_or_else(|| panic!("no type named {name}"))
    }

    pub fn member_at(graph: &TypeGraph, ty: &str, index: usize) -> MemberId {
        graph.ty(type_named(graph, ty)).members[index]
    }

    pub fn kinds(diagnostics: &[Diagnostic]) -> Vec<DiagnosticKind> {
        diagnostics.iter().map(|diagnostic| diagnostic.kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{kinds, load, member_at, type_named};

    #[test]
    fn test_analyze_collects_every_relationship() {
        let graph = load(
            r#"
            [[type]]
            name = "IShape"
            kind = "interface"
            [[type.member]]
            name = "Area"
            returns = "double"

            [[type]]
            name = "Shape"
            modifiers = ["abstract"]
            interfaces = ["IShape"]
            [[type.member]]
            name = "Area"
            returns = "double"
            modifiers = ["abstract"]
            [[type.member]]
            name = "Describe"
            returns = "string"

            [[type]]
            name = "Square"
            base = "Shape"
            [[type.member]]
            name = "Area"
            returns = "double"
            modifiers = ["override"]
            [[type.member]]
            name = "Describe"
            returns = "string"
            "#,
        );
        let shape = analyze_type(&graph, type_named(&graph, "Shape"), None, &InheritOptions::default());
        assert!(!shape.has_errors);
        let square = analyze_type(
            &graph,
            type_named(&graph, "Square"),
            Some(&shape.implementation_map),
            &InheritOptions::default(),
        );

        assert_eq!(square.overrides.len(), 1);
        assert_eq!(square.overrides[0].1.target(), Some(member_at(&graph, "Shape", 0)));
        assert_eq!(
            square.hidden,
            vec![(member_at(&graph, "Square", 1), member_at(&graph, "Shape", 1))]
        );
        assert_eq!(kinds(&square.diagnostics), vec![DiagnosticKind::NewRequired]);
        assert!(!square.has_errors);
        assert!(square.implementation_map.is_complete());
        let (_, _, found) = square.implementation_map.entries().next().unwrap();
        assert_eq!(found.unwrap().kind, ImplementationKind::Inherited);
    }

    #[test]
    fn test_errors_mark_the_type() {
        let graph = load(
            r#"
            [[type]]
            name = "C"
            [[type.member]]
            name = "M"
            modifiers = ["override"]
            "#,
        );
        let analysis = analyze_type(&graph, type_named(&graph, "C"), None, &InheritOptions::default());
        assert!(analysis.has_errors);
        assert_eq!(kinds(&analysis.diagnostics), vec![DiagnosticKind::OverrideNotExpected]);
    }
}
