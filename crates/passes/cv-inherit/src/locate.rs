//! Candidate location
//!
//! Walks the lookup chain of a member's owner, nearest first, and collects
//! the inherited members the declaration relates to. The search stops at
//! the first level with any hit; levels further up are shadowed by it.
#![allow(
    clippy::min_ident_chars,
    reason = "Ty is a conventional name in type system implementations"
)]

use cv_model::{MemberDef, MemberId, MemberKind, Signature, SignatureMatch, Substitution, Ty, TypeGraph};

/// Which relationship the search is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Same-kind signature matches win within a level; a same-name member
    /// of another kind is a hit only when no same-kind match exists there
    Override,
    /// Hiding by name: methods hide same-signature methods and every
    /// same-name non-method, indexers hide same-signature indexers, and any
    /// other kind hides every same-name member
    Hiding,
}

/// An inherited member found by the locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// The inherited member
    pub member: MemberId,
    /// Its owner, closed in the searching type's parameter space
    pub view: Ty,
    /// Distance in the lookup chain (0 is the nearest ancestor)
    pub level: usize,
    /// How the signatures compare; `Different` for a name-only hit
    pub matched: SignatureMatch,
    /// Whether the member has the searching member's kind
    pub same_kind: bool,
}

impl Candidate {
    /// Substitution that maps the candidate's declaration into the searching type
    pub fn substitution(&self) -> Substitution {
        Substitution::for_instance(&self.view)
    }
}

/// Locate the inherited members `member` relates to
///
/// Results all come from one level of the lookup chain, in declaration
/// order. Inaccessible members and explicit interface implementations are
/// never candidates.
pub fn locate(graph: &TypeGraph, member: MemberId, mode: SearchMode) -> Vec<Candidate> {
    let def = graph.member(member);
    if def.is_explicit_impl() {
        return Vec::new();
    }
    let from_assembly = graph.ty(def.owner).assembly;
    let own = Signature::of(def);

    for (level, view) in graph.lookup_chain(def.owner).into_iter().enumerate() {
        let Some(ancestor) = view.def() else {
            continue;
        };
        let ancestor_def = graph.ty(ancestor);
        let subst = Substitution::for_instance(&view);

        let mut same_kind = Vec::new();
        let mut other_kind = Vec::new();
        for &candidate in &ancestor_def.members {
            let candidate_def = graph.member(candidate);
            if candidate_def.is_explicit_impl()
                || candidate_def.name != def.name
                || !candidate_def.access.visible_to_derived(ancestor_def.assembly, from_assembly)
            {
                continue;
            }
            let matched = own.compare(&Signature::of_substituted(candidate_def, &subst));
            let hit = Candidate {
                member: candidate,
                view: view.clone(),
                level,
                matched,
                same_kind: candidate_def.kind == def.kind,
            };
            match mode {
                SearchMode::Override => {
                    if hit.same_kind {
                        if matched.is_same_slot() {
                            same_kind.push(hit);
                        }
                    } else {
                        other_kind.push(hit);
                    }
                }
                SearchMode::Hiding => {
                    if hides(def, candidate_def, matched) {
                        same_kind.push(hit);
                    }
                }
            }
        }

        if !same_kind.is_empty() {
            return same_kind;
        }
        if let Some(first) = other_kind.into_iter().next() {
            return vec![first];
        }
    }
    Vec::new()
}

/// Whether declaring `hider` hides the inherited `hidden` with the given signature match
fn hides(hider: &MemberDef, hidden: &MemberDef, matched: SignatureMatch) -> bool {
    let same_signature = matches!(matched, SignatureMatch::Exact | SignatureMatch::RefOutOnly);
    match (hider.kind, hidden.kind) {
        (MemberKind::Method, MemberKind::Method) | (MemberKind::Indexer, MemberKind::Indexer) => same_signature,
        _ => true,
    }
}

/// The member an `override` declaration replaces, if it resolves to one
///
/// Prefers an exact match and falls back to the first same-kind candidate.
/// Static and non-virtual candidates are still returned.
pub fn overridden_candidate(graph: &TypeGraph, member: MemberId) -> Option<Candidate> {
    if !graph.member(member).is_override() {
        return None;
    }
    let candidates = locate(graph, member, SearchMode::Override);
    let exact = candidates
        .iter()
        .position(|candidate| candidate.same_kind && candidate.matched == SignatureMatch::Exact);
    match exact {
        Some(index) => candidates.into_iter().nth(index),
        None => candidates.into_iter().find(|candidate| candidate.same_kind),
    }
}

/// The chain of members `member` transitively overrides, nearest first,
/// starting with `member` itself
///
/// Every view is closed in the parameter space of `member`'s owner.
pub fn override_chain(graph: &TypeGraph, member: MemberId) -> Vec<(MemberId, Ty)> {
    let owner = graph.member(member).owner;
    let mut chain = vec![(member, graph.self_ty(owner))];
    let mut current = member;
    let mut view_subst = Substitution::identity();
    while let Some(candidate) = overridden_candidate(graph, current) {
        if chain.iter().any(|(seen, _)| *seen == candidate.member) {
            break;
        }
        let view = view_subst.apply(&candidate.view);
        view_subst = Substitution::for_instance(&view);
        chain.push((candidate.member, view));
        current = candidate.member;
    }
    chain
}
