//! Override validation
//!
//! Resolves each `override` declaration to the unique inherited member it
//! replaces and checks that the replacement keeps the overridden member's
//! shape. Checks run in a fixed order; member-level accessibility, ref
//! return and return type are mutually exclusive, and only the first of
//! them that fails is reported.
#![allow(
    clippy::min_ident_chars,
    reason = "Ty is a conventional name in type system implementations"
)]

use crate::InheritOptions;
use crate::diagnostic::{Diagnostic, DiagnosticArg, DiagnosticKind, DiagnosticSink};
use crate::locate::{Candidate, SearchMode, locate, override_chain};
use cv_model::{
    Accessibility, AccessorKind, AssemblyId, Constraint, MemberDef, MemberId, MemberKind, SignatureMatch,
    Substitution, Ty, TypeGraph, TypeParamDef,
};
use rustc_hash::FxHashSet;

/// Outcome of resolving one `override` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideResolution {
    /// The declaration overrides `base`
    Accepted {
        /// Overridden member
        base: MemberId,
        /// Its owner, closed in the overriding type's parameter space
        view: Ty,
    },
    /// The declaration is invalid
    Rejected {
        /// First error reported for the declaration
        kind: DiagnosticKind,
        /// The member it was checked against, if one was located
        candidate: Option<MemberId>,
    },
}

impl OverrideResolution {
    /// The overridden member, or the candidate a rejected override was checked against
    pub fn target(&self) -> Option<MemberId> {
        match self {
            Self::Accepted { base, .. } => Some(*base),
            Self::Rejected { candidate, .. } => *candidate,
        }
    }

    /// Whether the override was accepted
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// Accessibility an override of a member with `access` declared in
/// `declared_in` must have when written in `from`
fn expected_access(access: Accessibility, declared_in: AssemblyId, from: AssemblyId) -> Accessibility {
    if access == Accessibility::ProtectedInternal && declared_in != from {
        Accessibility::Protected
    } else {
        access
    }
}

/// Resolve and validate the `override` declaration `member`
pub fn resolve_override(
    graph: &TypeGraph,
    member: MemberId,
    options: &InheritOptions,
    sink: &mut DiagnosticSink,
) -> OverrideResolution {
    let def = graph.member(member);
    let candidates = if def.kind.is_dispatchable() {
        locate(graph, member, SearchMode::Override)
    } else {
        Vec::new()
    };

    let Some(first) = candidates.first() else {
        sink.report(Diagnostic::on_member(graph, DiagnosticKind::OverrideNotExpected, member));
        return OverrideResolution::Rejected {
            kind: DiagnosticKind::OverrideNotExpected,
            candidate: None,
        };
    };

    if !first.same_kind {
        let kind = match def.kind {
            MemberKind::Method => DiagnosticKind::CantOverrideNonFunction,
            MemberKind::Property | MemberKind::Indexer => DiagnosticKind::CantOverrideNonProperty,
            MemberKind::Event => DiagnosticKind::CantOverrideNonEvent,
            MemberKind::Field | MemberKind::NestedType => DiagnosticKind::OverrideNotExpected,
        };
        return reject(graph, sink, kind, member, first);
    }

    let exact: Vec<&Candidate> = candidates
        .iter()
        .filter(|candidate| candidate.matched == SignatureMatch::Exact)
        .collect();
    let chosen = match exact.as_slice() {
        [] => return reject(graph, sink, DiagnosticKind::CantChangeRefKindOnOverride, member, first),
        [only] => {
            let runtime_twin = candidates
                .iter()
                .find(|candidate| candidate.matched == SignatureMatch::RefOutOnly);
            if let Some(twin) = runtime_twin {
                sink.report(
                    Diagnostic::on_member(graph, DiagnosticKind::MultipleRuntimeOverrideMatches, member)
                        .with_related(only.member)
                        .with_arg(DiagnosticArg::member_in(only.member, &only.view))
                        .with_arg(DiagnosticArg::member_in(twin.member, &twin.view)),
                );
            }
            *only
        }
        [left, right, ..] => {
            sink.report(
                Diagnostic::on_member(graph, DiagnosticKind::AmbigOverride, member)
                    .with_related(left.member)
                    .with_arg(DiagnosticArg::member_in(left.member, &left.view))
                    .with_arg(DiagnosticArg::member_in(right.member, &right.view)),
            );
            return OverrideResolution::Rejected {
                kind: DiagnosticKind::AmbigOverride,
                candidate: Some(left.member),
            };
        }
    };

    let base = graph.member(chosen.member);
    if !base.is_virtual_like() {
        return reject(graph, sink, DiagnosticKind::CantOverrideNonVirtual, member, chosen);
    }

    // Views of the overridden chain, closed in the overriding type's space
    let chain_subst = Substitution::for_instance(&chosen.view);
    let chain: Vec<(MemberId, Ty)> = override_chain(graph, chosen.member)
        .into_iter()
        .map(|(id, view)| (id, chain_subst.apply(&view)))
        .collect();
    if chain.iter().any(|(id, _)| graph.member(*id).is_sealed()) {
        return reject(graph, sink, DiagnosticKind::CantOverrideSealed, member, chosen);
    }

    let reported_before = sink.diagnostics().len();
    let from = graph.ty(def.owner).assembly;
    let subst = chosen.substitution();

    check_shape(graph, member, chosen, &chain, &subst, from, options, sink);
    if def.kind.has_accessors() {
        check_accessors(graph, member, chosen, &chain, from, sink);
    }
    check_constraints(graph, member, chosen, &subst, sink);

    let first_error = sink.diagnostics()[reported_before..]
        .iter()
        .find(|diagnostic| diagnostic.is_error())
        .map(|diagnostic| diagnostic.kind);
    match first_error {
        Some(kind) => OverrideResolution::Rejected {
            kind,
            candidate: Some(chosen.member),
        },
        None => OverrideResolution::Accepted {
            base: chosen.member,
            view: chosen.view.clone(),
        },
    }
}

fn reject(
    graph: &TypeGraph,
    sink: &mut DiagnosticSink,
    kind: DiagnosticKind,
    member: MemberId,
    candidate: &Candidate,
) -> OverrideResolution {
    sink.report(
        Diagnostic::on_member(graph, kind, member)
            .with_related(candidate.member)
            .with_arg(DiagnosticArg::member_in(candidate.member, &candidate.view)),
    );
    OverrideResolution::Rejected {
        kind,
        candidate: Some(candidate.member),
    }
}

/// Member accessibility, then ref return, then return type
fn check_shape(
    graph: &TypeGraph,
    member: MemberId,
    chosen: &Candidate,
    chain: &[(MemberId, Ty)],
    subst: &Substitution,
    from: AssemblyId,
    options: &InheritOptions,
    sink: &mut DiagnosticSink,
) {
    let def = graph.member(member);
    let base = graph.member(chosen.member);
    let base_arg = DiagnosticArg::member_in(chosen.member, &chosen.view);

    let expected = expected_access(base.access, graph.ty(base.owner).assembly, from);
    if def.access != expected {
        sink.report(
            Diagnostic::on_member(graph, DiagnosticKind::CantChangeAccessOnOverride, member)
                .with_related(chosen.member)
                .with_arg(base_arg)
                .with_arg(DiagnosticArg::Access(expected)),
        );
        return;
    }

    if def.ref_return != base.ref_return {
        sink.report(
            Diagnostic::on_member(graph, DiagnosticKind::CantChangeRefReturnOnOverride, member)
                .with_related(chosen.member)
                .with_arg(base_arg),
        );
        return;
    }

    let base_ret = subst.apply(&base.ret);
    if def.ret == base_ret {
        return;
    }
    let kind = if is_covariant_return(graph, def, chain, &base_ret, options) {
        if options.covariant_runtime {
            return;
        }
        DiagnosticKind::RuntimeDoesNotSupportCovariantReturnsOfClasses
    } else if def.kind == MemberKind::Method {
        DiagnosticKind::CantChangeReturnTypeOnOverride
    } else {
        DiagnosticKind::CantChangeTypeOnOverride
    };
    sink.report(
        Diagnostic::on_member(graph, kind, member)
            .with_related(chosen.member)
            .with_arg(base_arg)
            .with_arg(DiagnosticArg::Type(base_ret)),
    );
}

/// A property is read-only only when neither it nor any member it
/// overrides has a setter
fn is_covariant_return(
    graph: &TypeGraph,
    def: &MemberDef,
    chain: &[(MemberId, Ty)],
    base_ret: &Ty,
    options: &InheritOptions,
) -> bool {
    let read_only = match def.kind {
        MemberKind::Method => true,
        MemberKind::Property => {
            def.accessor(AccessorKind::Set).is_none()
                && chain
                    .iter()
                    .all(|(id, _)| graph.member(*id).accessor(AccessorKind::Set).is_none())
        }
        _ => false,
    };
    options.covariant_returns
        && read_only
        && !def.ref_return
        && graph.is_reference_type(&def.ret)
        && graph.has_reference_conversion(&def.ret, base_ret)
}

/// Every accessor of the override must exist on the overridden chain with
/// the same accessibility
fn check_accessors(
    graph: &TypeGraph,
    member: MemberId,
    chosen: &Candidate,
    chain: &[(MemberId, Ty)],
    from: AssemblyId,
    sink: &mut DiagnosticSink,
) {
    let def = graph.member(member);
    for accessor in &def.accessors {
        let inherited = chain.iter().find_map(|(id, view)| {
            let owner = graph.member(*id);
            owner.accessor(accessor.kind).map(|found| (*id, view, owner, found))
        });
        let Some((owner_id, view, owner, found)) = inherited else {
            report_missing_accessor(graph, member, chosen, accessor.kind, sink);
            continue;
        };
        let declared_in = graph.ty(owner.owner).assembly;
        let found_access = owner.accessor_access(found);
        if !found_access.visible_to_derived(declared_in, from) {
            report_missing_accessor(graph, member, chosen, accessor.kind, sink);
            continue;
        }
        // Accessors without their own accessibility follow the member's,
        // which the shape check already compared
        if accessor.access.is_none() && found.access.is_none() {
            continue;
        }
        let expected = expected_access(found_access, declared_in, from);
        if def.accessor_access(accessor) != expected {
            sink.report(
                Diagnostic::on_member(graph, DiagnosticKind::CantChangeAccessOnOverride, member)
                    .with_related(owner_id)
                    .with_arg(DiagnosticArg::member_in(owner_id, view))
                    .with_arg(DiagnosticArg::Access(expected))
                    .with_arg(DiagnosticArg::Accessor(accessor.kind)),
            );
        }
    }
}

fn report_missing_accessor(
    graph: &TypeGraph,
    member: MemberId,
    chosen: &Candidate,
    accessor: AccessorKind,
    sink: &mut DiagnosticSink,
) {
    sink.report(
        Diagnostic::on_member(graph, DiagnosticKind::no_accessor_to_override(accessor), member)
            .with_related(chosen.member)
            .with_arg(DiagnosticArg::member_in(chosen.member, &chosen.view)),
    );
}

/// Constraint clauses written on an override
fn check_constraints(
    graph: &TypeGraph,
    member: MemberId,
    chosen: &Candidate,
    subst: &Substitution,
    sink: &mut DiagnosticSink,
) {
    let def = graph.member(member);
    let base = graph.member(chosen.member);
    let mut seen = FxHashSet::default();

    for clause in &def.where_clauses {
        let name_arg = DiagnosticArg::Name(clause.param);
        if !seen.insert(clause.param) {
            sink.report(
                Diagnostic::on_member(graph, DiagnosticKind::DuplicateConstraintClause, member).with_arg(name_arg),
            );
            continue;
        }
        let Some(index) = def.type_params.iter().position(|param| param.name == clause.param) else {
            sink.report(
                Diagnostic::on_member(graph, DiagnosticKind::TyVarNotFoundInConstraint, member).with_arg(name_arg),
            );
            continue;
        };
        let Some(inherited) = base.type_params.get(index) else {
            continue;
        };

        for constraint in &clause.constraints {
            let kind = match constraint {
                Constraint::ReferenceType if is_reference_param(graph, inherited, subst) => continue,
                Constraint::ReferenceType => DiagnosticKind::OverrideRefConstraintNotSatisfied,
                Constraint::ValueType if is_value_param(inherited) => continue,
                Constraint::ValueType => DiagnosticKind::OverrideValConstraintNotSatisfied,
                _ => DiagnosticKind::OverrideWithConstraints,
            };
            let mut diagnostic = Diagnostic::on_member(graph, kind, member).with_related(chosen.member);
            if kind != DiagnosticKind::OverrideWithConstraints {
                diagnostic = diagnostic
                    .with_arg(DiagnosticArg::member_in(chosen.member, &chosen.view))
                    .with_arg(name_arg.clone());
            }
            sink.report(diagnostic);
            break;
        }
    }
}

fn is_reference_param(graph: &TypeGraph, param: &TypeParamDef, subst: &Substitution) -> bool {
    param.constraints.iter().any(|constraint| match constraint {
        Constraint::ReferenceType => true,
        Constraint::BaseBound(bound) => graph.is_reference_type(&subst.apply(bound)),
        _ => false,
    })
}

fn is_value_param(param: &TypeParamDef) -> bool {
    param
        .constraints
        .iter()
        .any(|constraint| matches!(constraint, Constraint::ValueType | Constraint::Unmanaged))
}
