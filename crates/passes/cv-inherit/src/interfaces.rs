//! Interface conformance
//!
//! Builds the implementation map of a class or struct: for every member of
//! every interface the type implements, the member that implements it and
//! how it was found. Interfaces the type (re)declares are resolved here;
//! interfaces it only inherits through its base class extend the base's
//! map, redirected to a `new` member of the type where one takes the slot.
#![allow(
    clippy::min_ident_chars,
    reason = "Ty is a conventional name in type system implementations"
)]

use crate::diagnostic::{Diagnostic, DiagnosticArg, DiagnosticKind, DiagnosticSink, Subject};
use cv_model::{
    Accessibility, Constraint, MemberDef, MemberId, ReturnShape, Signature, SignatureMatch, Substitution, Ty,
    TypeGraph, TypeId, TypeParamDef,
};
use indexmap::{IndexMap, IndexSet};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use strum::Display;

/// How an implementer was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ImplementationKind {
    /// Explicit interface implementation
    Explicit,
    /// Public member matched by signature
    Implicit,
    /// Entry carried over from the base class's map
    Inherited,
}

/// The member implementing one interface slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Implementation {
    /// Implementing member
    pub member: MemberId,
    /// How it was found
    pub kind: ImplementationKind,
    /// Its owner, closed in the implementing type's parameter space
    pub view: Ty,
}

/// A slot: a closed interface and one of its members
pub type Slot = (Ty, MemberId);

/// Per-type map from interface slot to implementer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplementationMap {
    ty: TypeId,
    entries: IndexMap<Slot, Option<Implementation>>,
}

impl ImplementationMap {
    /// Empty map for `ty`
    pub fn new(ty: TypeId) -> Self {
        Self {
            ty,
            entries: IndexMap::new(),
        }
    }

    /// Type the map belongs to
    pub fn ty(&self) -> TypeId {
        self.ty
    }

    /// Implementer of a slot, if the slot exists and is implemented
    pub fn get(&self, iface: &Ty, member: MemberId) -> Option<&Implementation> {
        self.entries.get(&(iface.clone(), member)).and_then(Option::as_ref)
    }

    /// Whether the map has an entry (implemented or not) for a slot
    pub fn contains(&self, iface: &Ty, member: MemberId) -> bool {
        self.entries.contains_key(&(iface.clone(), member))
    }

    /// Every slot in order with its implementer
    pub fn entries(&self) -> impl Iterator<Item = (&Ty, MemberId, Option<&Implementation>)> {
        self.entries
            .iter()
            .map(|((iface, member), implementation)| (iface, *member, implementation.as_ref()))
    }

    /// Slots without an implementer
    pub fn unimplemented(&self) -> impl Iterator<Item = (&Ty, MemberId)> {
        self.entries
            .iter()
            .filter(|(_, implementation)| implementation.is_none())
            .map(|((iface, member), _)| (iface, *member))
    }

    /// Whether every slot has an implementer
    pub fn is_complete(&self) -> bool {
        self.entries.values().all(Option::is_some)
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the type implements no interface member
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, slot: Slot, implementation: Option<Implementation>) {
        self.entries.insert(slot, implementation);
    }

    /// Entries re-expressed in the space of a type deriving from this one
    /// through the closed base reference `view`
    fn rebased(&self, view: &Ty) -> FxHashMap<Slot, Option<Implementation>> {
        let subst = Substitution::for_instance(view);
        self.entries
            .iter()
            .map(|((iface, member), implementation)| {
                let implementation = implementation.as_ref().map(|found| Implementation {
                    member: found.member,
                    kind: found.kind,
                    view: subst.apply(&found.view),
                });
                ((subst.apply(iface), *member), implementation)
            })
            .collect()
    }
}

/// Why a same-signature member did not implement a slot, most telling first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum NearMiss {
    Static,
    NotPublic,
    WrongRefReturn,
    WrongReturnType,
}

impl NearMiss {
    fn kind(self) -> DiagnosticKind {
        match self {
            Self::Static => DiagnosticKind::CloseUnimplementedInterfaceMemberStatic,
            Self::NotPublic => DiagnosticKind::CloseUnimplementedInterfaceMemberNotPublic,
            Self::WrongRefReturn => DiagnosticKind::CloseUnimplementedInterfaceMemberWrongRefReturn,
            Self::WrongReturnType => DiagnosticKind::CloseUnimplementedInterfaceMemberWrongReturnType,
        }
    }
}

/// Result of searching the hierarchy for one slot
enum SlotOutcome {
    Found {
        implementation: Implementation,
        /// Distance from the implementing type (0 is the type itself)
        level: usize,
        /// Other members at the same level that match as well
        rivals: usize,
        /// Method type parameter constraints differ from the slot's
        bad_constraints: bool,
    },
    Missing {
        near: Option<(NearMiss, MemberId, Ty)>,
    },
}

/// Members of an interface that form slots
fn slot_members(graph: &TypeGraph, iface: TypeId) -> impl Iterator<Item = MemberId> + '_ {
    graph.ty(iface).members.iter().copied().filter(|&member| {
        let def = graph.member(member);
        def.kind.is_dispatchable() && !def.is_static() && !def.is_explicit_impl()
    })
}

/// Whether `candidate` seen through `view` has the slot's name, kind,
/// signature and return shape
fn matches_slot(graph: &TypeGraph, candidate: MemberId, view: &Ty, iface: &Ty, slot_member: MemberId) -> bool {
    let def = graph.member(candidate);
    let slot = graph.member(slot_member);
    if def.kind != slot.kind || def.name != slot.name || def.arity() != slot.arity() {
        return false;
    }
    let view_subst = Substitution::for_instance(view);
    let slot_subst = Substitution::for_instance(iface);
    Signature::of_substituted(def, &view_subst).compare(&Signature::of_substituted(slot, &slot_subst))
        == SignatureMatch::Exact
        && ReturnShape::of_substituted(def, &view_subst) == ReturnShape::of_substituted(slot, &slot_subst)
}

fn constraint_set(params: &[TypeParamDef], subst: &Substitution) -> Vec<Vec<Constraint>> {
    params
        .iter()
        .map(|param| {
            param
                .constraints
                .iter()
                .map(|constraint| match constraint {
                    Constraint::BaseBound(bound) => Constraint::BaseBound(subst.apply(bound)),
                    Constraint::InterfaceBound(bound) => Constraint::InterfaceBound(subst.apply(bound)),
                    other => other.clone(),
                })
                .collect()
        })
        .collect()
}

fn constraints_match(implementer: &MemberDef, view: &Ty, slot: &MemberDef, iface: &Ty) -> bool {
    let ours = constraint_set(&implementer.type_params, &Substitution::for_instance(view));
    let theirs = constraint_set(&slot.type_params, &Substitution::for_instance(iface));
    ours.len() == theirs.len()
        && ours.iter().zip(&theirs).all(|(left, right)| {
            left.len() == right.len() && left.iter().all(|constraint| right.contains(constraint))
        })
}

/// Resolve the implementation map of `ty`
///
/// `base_map` is the map of `ty`'s base class. Interfaces are never
/// implemented, so an interface gets an empty map.
pub fn resolve_interfaces(
    graph: &TypeGraph,
    ty: TypeId,
    base_map: Option<&ImplementationMap>,
    sink: &mut DiagnosticSink,
) -> ImplementationMap {
    let mut map = ImplementationMap::new(ty);
    if graph.ty(ty).is_interface() {
        return map;
    }
    let resolver = Resolver::new(graph, ty);
    let declared = graph.declared_interfaces(ty);
    let all = graph.closed_interfaces(ty);

    let explicit_only = resolver.ref_out_collisions(&declared, sink);
    let explicit = resolver.explicit_implementations(&all, sink);
    let inherited = match (base_map, resolver.levels.get(1)) {
        (Some(base_map), Some(base_view)) => base_map.rebased(base_view),
        _ => FxHashMap::default(),
    };

    for iface in &all {
        let Some(iface_def) = iface.def() else {
            continue;
        };
        let redeclared = declared.contains(iface);
        let mut base_implementers: FxHashMap<MemberId, Vec<MemberId>> = FxHashMap::default();

        for slot_member in slot_members(graph, iface_def) {
            let slot = (iface.clone(), slot_member);
            if let Some(&member) = explicit.get(&slot) {
                let implementation = Implementation {
                    member,
                    kind: ImplementationKind::Explicit,
                    view: resolver.levels[0].clone(),
                };
                map.insert(slot, Some(implementation));
                continue;
            }

            if !redeclared {
                if let Some(entry) = inherited.get(&slot) {
                    let entry = entry.as_ref().map(|found| {
                        resolver.redirect(found).unwrap_or_else(|| Implementation {
                            kind: ImplementationKind::Inherited,
                            ..found.clone()
                        })
                    });
                    map.insert(slot, entry);
                    continue;
                }
            }

            let outcome = resolver.search(iface, slot_member, explicit_only.contains(&slot));
            if !redeclared {
                let entry = match outcome {
                    SlotOutcome::Found { mut implementation, .. } => {
                        implementation.kind = ImplementationKind::Inherited;
                        Some(resolver.redirect(&implementation).unwrap_or(implementation))
                    }
                    SlotOutcome::Missing { .. } => None,
                };
                map.insert(slot, entry);
                continue;
            }

            match outcome {
                SlotOutcome::Found {
                    implementation,
                    level,
                    rivals,
                    bad_constraints,
                } => {
                    let implementer_arg = DiagnosticArg::member_in(implementation.member, &implementation.view);
                    if rivals > 0 {
                        sink.report(
                            resolver
                                .on_type(DiagnosticKind::MultipleRuntimeImplementationMatches)
                                .with_related(slot_member)
                                .with_arg(implementer_arg.clone())
                                .with_arg(DiagnosticArg::member_in(slot_member, iface)),
                        );
                    }
                    if bad_constraints {
                        let diagnostic = Diagnostic::new(
                            DiagnosticKind::ImplBadConstraints,
                            Subject::Type(ty),
                            graph.ty(ty).span,
                        );
                        sink.report(
                            diagnostic
                                .with_related(slot_member)
                                .with_arg(implementer_arg)
                                .with_arg(DiagnosticArg::member_in(slot_member, iface)),
                        );
                    }
                    if level > 0 && implementation.kind == ImplementationKind::Implicit {
                        base_implementers
                            .entry(implementation.member)
                            .or_default()
                            .push(slot_member);
                    }
                    map.insert(slot, Some(implementation));
                }
                SlotOutcome::Missing { near } => {
                    let slot_arg = DiagnosticArg::member_in(slot_member, iface);
                    let diagnostic = match near {
                        Some((miss, member, view)) => {
                            let diagnostic = resolver
                                .on_type(miss.kind())
                                .with_related(slot_member)
                                .with_arg(slot_arg)
                                .with_arg(DiagnosticArg::member_in(member, &view));
                            if miss == NearMiss::WrongReturnType {
                                let expected = Substitution::for_instance(iface).apply(&graph.member(slot_member).ret);
                                diagnostic.with_arg(DiagnosticArg::Type(expected))
                            } else {
                                diagnostic
                            }
                        }
                        None => resolver
                            .on_type(DiagnosticKind::UnimplementedInterfaceMember)
                            .with_related(slot_member)
                            .with_arg(slot_arg),
                    };
                    sink.report(diagnostic);
                    map.insert(slot, None);
                }
            }
        }

        // One inherited member satisfying slots that collapsed under substitution
        let mut collapsed: Vec<(MemberId, Vec<MemberId>)> = base_implementers
            .into_iter()
            .filter(|(_, slots)| slots.len() > 1)
            .collect();
        collapsed.sort_by_key(|(_, slots)| slots.first().map(|slot| cv_model::index_of(*slot)));
        for (member, slots) in collapsed {
            let view = map
                .get(iface, slots[0])
                .map_or_else(|| resolver.levels[0].clone(), |found| found.view.clone());
            sink.report(
                resolver
                    .on_type(DiagnosticKind::MultipleRuntimeImplementationMatches)
                    .with_related(slots[0])
                    .with_arg(DiagnosticArg::member_in(member, &view))
                    .with_arg(DiagnosticArg::member_in(slots[0], iface)),
            );
        }
    }
    map
}

/// Resolve the implementation map of `ty`, first building the maps of its
/// base classes
///
/// Diagnostics of the base classes are discarded.
pub fn resolve_interfaces_with_bases(graph: &TypeGraph, ty: TypeId, sink: &mut DiagnosticSink) -> ImplementationMap {
    let ancestors: Vec<TypeId> = graph.base_chain(ty).iter().filter_map(Ty::def).collect();
    let mut base_map: Option<ImplementationMap> = None;
    for &ancestor in ancestors.iter().rev() {
        let mut discarded = DiagnosticSink::new();
        base_map = Some(resolve_interfaces(graph, ancestor, base_map.as_ref(), &mut discarded));
    }
    resolve_interfaces(graph, ty, base_map.as_ref(), sink)
}

struct Resolver<'a> {
    graph: &'a TypeGraph,
    ty: TypeId,
    /// The type itself, then its base chain; all closed in `ty`'s space
    levels: Vec<Ty>,
}

impl<'a> Resolver<'a> {
    fn new(graph: &'a TypeGraph, ty: TypeId) -> Self {
        let mut levels = vec![graph.self_ty(ty)];
        levels.extend(graph.base_chain(ty));
        Self { graph, ty, levels }
    }

    fn on_type(&self, kind: DiagnosticKind) -> Diagnostic {
        Diagnostic::on_type(self.graph, kind, self.ty)
    }

    /// Slots of one closed interface that became identical except for ref
    /// versus out
    fn ref_out_collisions(&self, declared: &IndexSet<Ty>, sink: &mut DiagnosticSink) -> FxHashSet<Slot> {
        let mut explicit_only = FxHashSet::default();
        for iface in declared {
            let Some(iface_def) = iface.def() else {
                continue;
            };
            let subst = Substitution::for_instance(iface);
            let members: Vec<(MemberId, Signature)> = slot_members(self.graph, iface_def)
                .map(|member| (member, Signature::of_substituted(self.graph.member(member), &subst)))
                .collect();
            for (position, (left, left_sig)) in members.iter().enumerate() {
                for (right, right_sig) in &members[position + 1..] {
                    let same_kind = self.graph.member(*left).kind == self.graph.member(*right).kind;
                    if same_kind && left_sig.compare(right_sig) == SignatureMatch::RefOutOnly {
                        let diagnostic = Diagnostic::new(
                            DiagnosticKind::ExplicitImplCollisionOnRefOut,
                            Subject::Type(self.ty),
                            self.graph.ty(self.ty).span,
                        );
                        sink.report(
                            diagnostic
                                .with_related(*left)
                                .with_arg(DiagnosticArg::Type(iface.clone()))
                                .with_arg(DiagnosticArg::member_in(*left, iface))
                                .with_arg(DiagnosticArg::member_in(*right, iface)),
                        );
                        explicit_only.insert((iface.clone(), *left));
                        explicit_only.insert((iface.clone(), *right));
                    }
                }
            }
        }
        explicit_only
    }

    /// Explicit implementations declared on the type itself
    fn explicit_implementations(&self, all: &IndexSet<Ty>, sink: &mut DiagnosticSink) -> IndexMap<Slot, MemberId> {
        let graph = self.graph;
        let own_view = &self.levels[0];
        let mut claimed: IndexMap<Slot, MemberId> = IndexMap::new();

        for &member in &graph.ty(self.ty).members {
            let def = graph.member(member);
            let Some(target) = &def.explicit_interface else {
                continue;
            };
            let target_arg = DiagnosticArg::Type(target.clone());
            let (true, Some(target_def)) = (all.contains(target), target.def()) else {
                sink.report(
                    Diagnostic::on_member(graph, DiagnosticKind::ClassDoesntImplementInterface, member)
                        .with_arg(target_arg),
                );
                continue;
            };

            let matched: Vec<MemberId> = slot_members(graph, target_def)
                .filter(|&slot_member| matches_slot(graph, member, own_view, target, slot_member))
                .collect();
            let (first, second) = match matched.as_slice() {
                [] => {
                    sink.report(
                        Diagnostic::on_member(graph, DiagnosticKind::InterfaceMemberNotFound, member)
                            .with_arg(target_arg),
                    );
                    continue;
                }
                [only] => (*only, None),
                [first, second, ..] => (*first, Some(*second)),
            };
            if let Some(second) = second {
                sink.report(
                    Diagnostic::on_member(graph, DiagnosticKind::ExplicitImplCollision, member)
                        .with_related(first)
                        .with_arg(DiagnosticArg::member_in(first, target))
                        .with_arg(DiagnosticArg::member_in(second, target)),
                );
            }

            for slot_member in matched {
                self.check_explicit_accessors(member, target, slot_member, sink);
                let slot = (target.clone(), slot_member);
                if claimed.contains_key(&slot) {
                    sink.report(
                        Diagnostic::on_member(graph, DiagnosticKind::DuplicateExplicitImpl, member)
                            .with_related(slot_member)
                            .with_arg(DiagnosticArg::member_in(slot_member, target)),
                    );
                } else {
                    claimed.insert(slot, member);
                }
            }
        }
        claimed
    }

    fn check_explicit_accessors(&self, member: MemberId, target: &Ty, slot_member: MemberId, sink: &mut DiagnosticSink) {
        let def = self.graph.member(member);
        if !def.kind.has_accessors() {
            return;
        }
        let ours = def.accessor_kinds();
        let theirs = self.graph.member(slot_member).accessor_kinds();
        let report = |sink: &mut DiagnosticSink, kind: DiagnosticKind, accessor| {
            sink.report(
                Diagnostic::on_member(self.graph, kind, member)
                    .with_related(slot_member)
                    .with_arg(DiagnosticArg::member_in(slot_member, target))
                    .with_arg(DiagnosticArg::Accessor(accessor)),
            );
        };
        for &accessor in theirs.iter().filter(|accessor| !ours.contains(*accessor)) {
            report(sink, DiagnosticKind::ExplicitPropertyMissingAccessor, accessor);
        }
        for &accessor in ours.iter().filter(|accessor| !theirs.contains(*accessor)) {
            report(sink, DiagnosticKind::ExplicitPropertyAddingAccessor, accessor);
        }
    }

    /// Walk the type and its bases for the implementer of one slot
    fn search(&self, iface: &Ty, slot_member: MemberId, explicit_only: bool) -> SlotOutcome {
        let graph = self.graph;
        let slot = graph.member(slot_member);
        let slot_subst = Substitution::for_instance(iface);
        let slot_sig = Signature::of_substituted(slot, &slot_subst);
        let slot_ret = ReturnShape::of_substituted(slot, &slot_subst);
        let mut near = None;

        for (level, view) in self.levels.iter().enumerate() {
            let Some(level_ty) = view.def() else {
                continue;
            };
            let view_subst = Substitution::for_instance(view);
            let members = &graph.ty(level_ty).members;

            // Explicit implementations of bases, re-mapped into this type's space
            if level > 0 {
                let inherited_explicit = members.iter().copied().find(|&member| {
                    graph.member(member).explicit_interface.as_ref().is_some_and(|target| {
                        &view_subst.apply(target) == iface && matches_slot(graph, member, view, iface, slot_member)
                    })
                });
                if let Some(member) = inherited_explicit {
                    return SlotOutcome::Found {
                        implementation: Implementation {
                            member,
                            kind: ImplementationKind::Explicit,
                            view: view.clone(),
                        },
                        level,
                        rivals: 0,
                        bad_constraints: false,
                    };
                }
            }
            if explicit_only {
                continue;
            }

            let mut full = Vec::new();
            for &member in members {
                let def = graph.member(member);
                if def.is_explicit_impl() || def.kind != slot.kind || def.name != slot.name || def.arity() != slot.arity()
                {
                    continue;
                }
                if Signature::of_substituted(def, &view_subst).compare(&slot_sig) != SignatureMatch::Exact {
                    continue;
                }
                let Some(public) = accessors_public(def, slot) else {
                    continue;
                };
                let ret = ReturnShape::of_substituted(def, &view_subst);
                let miss = if def.is_static() {
                    Some(NearMiss::Static)
                } else if def.access != Accessibility::Public || !public {
                    Some(NearMiss::NotPublic)
                } else if ret.by_ref != slot_ret.by_ref {
                    Some(NearMiss::WrongRefReturn)
                } else if ret.ty != slot_ret.ty {
                    Some(NearMiss::WrongReturnType)
                } else {
                    None
                };
                match miss {
                    None => full.push(member),
                    Some(miss) => {
                        if near.as_ref().is_none_or(|(kept, _, _)| miss < *kept) {
                            near = Some((miss, member, view.clone()));
                        }
                    }
                }
            }

            if let Some((&winner, rest)) = full.split_first() {
                return SlotOutcome::Found {
                    implementation: Implementation {
                        member: winner,
                        kind: ImplementationKind::Implicit,
                        view: view.clone(),
                    },
                    level,
                    rivals: rest.len(),
                    bad_constraints: !constraints_match(graph.member(winner), view, slot, iface),
                };
            }
        }
        SlotOutcome::Missing { near }
    }

    /// A `new` public member of the type that takes over an inherited slot
    /// by hiding its implicit implementer
    fn redirect(&self, inherited: &Implementation) -> Option<Implementation> {
        let graph = self.graph;
        let own_view = &self.levels[0];
        let target = graph.member(inherited.member);
        // Explicit implementations are not in the hiding chain
        if target.is_explicit_impl() {
            return None;
        }
        let target_sig = Signature::of_substituted(target, &Substitution::for_instance(&inherited.view));
        let target_ret = ReturnShape::of_substituted(target, &Substitution::for_instance(&inherited.view));

        graph.ty(self.ty).members.iter().copied().find_map(|member| {
            let def = graph.member(member);
            let takes_over = def.is_new()
                && def.access == Accessibility::Public
                && !def.is_static()
                && !def.is_explicit_impl()
                && def.kind == target.kind
                && Signature::of(def).compare(&target_sig) == SignatureMatch::Exact
                && ReturnShape::of_substituted(def, &Substitution::identity()) == target_ret;
            takes_over.then(|| Implementation {
                member,
                kind: ImplementationKind::Implicit,
                view: own_view.clone(),
            })
        })
    }
}

/// Whether `def` has every accessor `slot` has, and whether they are all
/// public; `None` when an accessor is missing
fn accessors_public(def: &MemberDef, slot: &MemberDef) -> Option<bool> {
    let mut public = true;
    for accessor in &slot.accessors {
        let own = def.accessor(accessor.kind)?;
        public &= def.accessor_access(own) == Accessibility::Public;
    }
    Some(public)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{kinds, load, member_at, type_named};

    fn resolve(graph: &TypeGraph, ty: &str) -> (ImplementationMap, Vec<DiagnosticKind>) {
        let mut sink = DiagnosticSink::new();
        let map = resolve_interfaces_with_bases(graph, type_named(graph, ty), &mut sink);
        (map, kinds(sink.diagnostics()))
    }

    #[test]
    fn test_wrong_parameters_leave_slot_unimplemented() {
        let graph = load(
            r#"
            [[type]]
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
            "#,
        );
        let (map, diagnostics) = resolve(&graph, "C");
        assert_eq!(diagnostics, vec![DiagnosticKind::UnimplementedInterfaceMember]);
        assert_eq!(map.len(), 1);
        assert!(!map.is_complete());
    }

    #[test]
    fn test_near_misses_are_refined() {
        let graph = load(
            r#"
            [[type]]
            name = "I"
            kind = "interface"
            [[type.member]]
            name = "A"
            [[type.member]]
            name = "B"
            [[type.member]]
            name = "C"
            returns = "int"
            [[type.member]]
            name = "D"
            returns = "int"
            ref_return = true
            [[type.member]]
            name = "E"
            returns = "int"

            [[type]]
            name = "Impl"
            interfaces = ["I"]
            [[type.member]]
            name = "A"
            modifiers = ["static"]
            [[type.member]]
            name = "B"
            access = "internal"
            [[type.member]]
            name = "C"
            returns = "long"
            [[type.member]]
            name = "D"
            returns = "int"
            [[type.member]]
            name = "E"
            returns = "long"
            [[type.member]]
            name = "E"
            returns = "int"
            modifiers = ["static"]
            "#,
        );
        let (_, diagnostics) = resolve(&graph, "Impl");
        assert_eq!(
            diagnostics,
            vec![
                DiagnosticKind::CloseUnimplementedInterfaceMemberStatic,
                DiagnosticKind::CloseUnimplementedInterfaceMemberNotPublic,
                DiagnosticKind::CloseUnimplementedInterfaceMemberWrongReturnType,
                DiagnosticKind::CloseUnimplementedInterfaceMemberWrongRefReturn,
                DiagnosticKind::CloseUnimplementedInterfaceMemberStatic,
            ]
        );
    }

    #[test]
    fn test_collapsed_slots_share_one_implementer() {
        let graph = load(
            r#"
            [[type]]
            name = "I"
            kind = "interface"
            type_params = ["T", "U"]
            [[type.member]]
            name = "M"
            params = ["T"]
            [[type.member]]
            name = "M"
            params = ["U"]

            [[type]]
            name = "C"
            interfaces = ["I<int, int>"]
            [[type.member]]
            name = "M"
            params = ["int"]

            [[type]]
            name = "D"
            base = "C"
            interfaces = ["I<int, int>"]
            "#,
        );
        let c_member = member_at(&graph, "C", 0);
        let (c_map, c_diagnostics) = resolve(&graph, "C");
        assert!(c_diagnostics.is_empty());
        assert_eq!(c_map.len(), 2);
        assert!(c_map.entries().all(|(_, _, found)| found.map(|found| found.member) == Some(c_member)));

        let (d_map, d_diagnostics) = resolve(&graph, "D");
        assert_eq!(d_diagnostics, vec![DiagnosticKind::MultipleRuntimeImplementationMatches]);
        assert!(d_map.is_complete());
    }

    #[test]
    fn test_explicit_beats_implicit_and_is_checked() {
        let graph = load(
            r#"
            [[type]]
            name = "I"
            kind = "interface"
            type_params = ["T"]
            [[type.member]]
            kind = "property"
            name = "P"
            returns = "T"
            accessors = ["get"]
            [[type.member]]
            name = "M"
            params = ["T"]

            [[type]]
            name = "J"
            kind = "interface"

            [[type]]
            name = "C"
            interfaces = ["I<string>"]
            [[type.member]]
            name = "M"
            params = ["string"]
            [[type.member]]
            name = "M"
            params = ["string"]
            explicit = "I<string>"
            [[type.member]]
            kind = "property"
            name = "P"
            returns = "string"
            explicit = "I<string>"
            [[type.member]]
            name = "Q"
            explicit = "I<string>"
            [[type.member]]
            name = "M"
            params = ["string"]
            explicit = "J"
            [[type.member]]
            name = "M"
            params = ["string"]
            explicit = "I<string>"
            "#,
        );
        let (map, diagnostics) = resolve(&graph, "C");
        assert_eq!(
            diagnostics,
            vec![
                DiagnosticKind::ExplicitPropertyAddingAccessor,
                DiagnosticKind::InterfaceMemberNotFound,
                DiagnosticKind::ClassDoesntImplementInterface,
                DiagnosticKind::DuplicateExplicitImpl,
            ]
        );
        let iface = Ty::generic(type_named(&graph, "I"), vec![Ty::simple(graph.builtins().string)]);
        let slot_member = graph.ty(type_named(&graph, "I")).members[1];
        let found = map.get(&iface, slot_member).unwrap();
        assert_eq!(found.kind, ImplementationKind::Explicit);
        assert_eq!(found.member, member_at(&graph, "C", 1));
    }

    #[test]
    fn test_inherited_entries_and_new_redirect() {
        let graph = load(
            r#"
            [[type]]
            name = "I"
            kind = "interface"
            [[type.member]]
            name = "M"
            [[type.member]]
            name = "N"

            [[type]]
            name = "Base"
            interfaces = ["I"]
            [[type.member]]
            name = "M"
            [[type.member]]
            name = "N"

            [[type]]
            name = "Mid"
            base = "Base"
            [[type.member]]
            name = "M"
            modifiers = ["new"]

            [[type]]
            name = "Leaf"
            base = "Mid"

            [[type]]
            name = "K"
            kind = "interface"
            [[type.member]]
            name = "O"

            [[type]]
            name = "Quiet"
            interfaces = ["K"]
            [[type.member]]
            name = "O"
            explicit = "K"

            [[type]]
            name = "Loud"
            base = "Quiet"
            [[type.member]]
            name = "O"
            modifiers = ["new"]
            "#,
        );
        let iface = Ty::simple(type_named(&graph, "I"));
        let slot_m = graph.ty(type_named(&graph, "I")).members[0];
        let slot_n = graph.ty(type_named(&graph, "I")).members[1];

        let (mid, mid_diagnostics) = resolve(&graph, "Mid");
        assert!(mid_diagnostics.is_empty());
        let redirected = mid.get(&iface, slot_m).unwrap();
        assert_eq!(redirected.member, member_at(&graph, "Mid", 0));
        assert_eq!(redirected.kind, ImplementationKind::Implicit);
        assert_eq!(mid.get(&iface, slot_n).unwrap().kind, ImplementationKind::Inherited);

        let (leaf, _) = resolve(&graph, "Leaf");
        assert_eq!(leaf.get(&iface, slot_m).unwrap().member, member_at(&graph, "Mid", 0));

        let k = Ty::simple(type_named(&graph, "K"));
        let slot_o = graph.ty(type_named(&graph, "K")).members[0];
        let (loud, loud_diagnostics) = resolve(&graph, "Loud");
        assert!(loud_diagnostics.is_empty());
        let kept = loud.get(&k, slot_o).unwrap();
        assert_eq!(kept.member, member_at(&graph, "Quiet", 0));
        assert_eq!(kept.kind, ImplementationKind::Inherited);
    }

    #[test]
    fn test_ref_out_collision_requires_explicit_impls() {
        let graph = load(
            r#"
            [[type]]
            name = "I"
            kind = "interface"
            type_params = ["T", "U"]
            [[type.member]]
            name = "M"
            params = ["ref T"]
            [[type.member]]
            name = "M"
            params = ["out U"]

            [[type]]
            name = "C"
            interfaces = ["I<int, int>"]
            [[type.member]]
            name = "M"
            params = ["ref int"]
            "#,
        );
        let (map, diagnostics) = resolve(&graph, "C");
        assert_eq!(
            diagnostics,
            vec![
                DiagnosticKind::ExplicitImplCollisionOnRefOut,
                DiagnosticKind::UnimplementedInterfaceMember,
                DiagnosticKind::UnimplementedInterfaceMember,
            ]
        );
        assert_eq!(map.unimplemented().count(), 2);
    }

    #[test]
    fn test_bad_constraints_still_implement() {
        let graph = load(
            r#"
            [[type]]
            name = "I"
            kind = "interface"
            [[type.member]]
            name = "M"
            type_params = ["T"]
            where = [{ param = "T", constraints = ["class"] }]

            [[type]]
            name = "C"
            interfaces = ["I"]
            [[type.member]]
            name = "M"
            type_params = ["U"]
            "#,
        );
        let (map, diagnostics) = resolve(&graph, "C");
        assert_eq!(diagnostics, vec![DiagnosticKind::ImplBadConstraints]);
        assert!(map.is_complete());
    }

    #[test]
    fn test_explicit_impl_of_collapsed_slots() {
        let graph = load(
            r#"
            [[type]]
            name = "I"
            kind = "interface"
            type_params = ["T", "U"]
            [[type.member]]
            name = "M"
            params = ["T"]
            [[type.member]]
            name = "M"
            params = ["U"]
            [[type.member]]
            kind = "property"
            name = "P"
            returns = "int"

            [[type]]
            name = "C"
            interfaces = ["I<int, int>"]
            [[type.member]]
            name = "M"
            params = ["int"]
            explicit = "I<int, int>"
            [[type.member]]
            kind = "property"
            name = "P"
            returns = "int"
            accessors = ["get"]
            explicit = "I<int, int>"
            "#,
        );
        let (map, diagnostics) = resolve(&graph, "C");
        assert_eq!(
            diagnostics,
            vec![
                DiagnosticKind::ExplicitImplCollision,
                DiagnosticKind::ExplicitPropertyMissingAccessor,
            ]
        );
        assert!(map.is_complete());
        let explicit_m = member_at(&graph, "C", 0);
        let claimed = map
            .entries()
            .filter_map(|(_, _, found)| found)
            .filter(|found| found.member == explicit_m)
            .count();
        assert_eq!(claimed, 2);
    }

    #[test]
    fn test_several_matches_at_winning_level() {
        let graph = load(
            r#"
            [[type]]
            name = "J"
            kind = "interface"
            [[type.member]]
            name = "M"
            params = ["int"]

            [[type]]
            name = "Base"
            type_params = ["T", "U"]
            [[type.member]]
            name = "M"
            params = ["T"]
            [[type.member]]
            name = "M"
            params = ["U"]

            [[type]]
            name = "C"
            base = "Base<int, int>"
            interfaces = ["J"]
            "#,
        );
        let (map, diagnostics) = resolve(&graph, "C");
        assert_eq!(diagnostics, vec![DiagnosticKind::MultipleRuntimeImplementationMatches]);
        let (_, _, found) = map.entries().next().unwrap();
        let found = found.unwrap();
        assert_eq!(found.member, member_at(&graph, "Base", 0));
        assert_eq!(found.kind, ImplementationKind::Implicit);
    }
}
