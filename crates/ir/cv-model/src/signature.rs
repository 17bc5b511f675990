//! Member signatures
//!
//! The signature of a member is its identity key for "same slot":
//! name, generic arity and the ordered parameter types with their ref-kinds.
//! Return shape is kept separately because two members may share a slot
//! while illegally differing in what they return.
#![allow(
    clippy::min_ident_chars,
    reason = "Ty is a conventional name in type system implementations"
)]

use crate::item::{MemberDef, MemberKind, RefKind};
use crate::subst::Substitution;
use crate::ty::Ty;
use cv_intern::Symbol;

/// One parameter of a signature
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SigParam {
    /// Parameter type after substitution
    pub ty: Ty,
    /// Passing mode
    pub ref_kind: RefKind,
}

/// Erased signature of a member
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    /// Member name
    pub name: Symbol,
    /// Number of method type parameters
    pub arity: usize,
    /// Parameters in order
    pub params: Vec<SigParam>,
}

/// What a member produces: its type and whether it aliases storage
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReturnShape {
    /// Return type (or property/event type)
    pub ty: Ty,
    /// Returned by reference
    pub by_ref: bool,
}

/// Result of comparing two signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignatureMatch {
    /// Same name, arity, parameter types and ref-kinds
    Exact,
    /// Same except some parameters differ only between `ref` and `out`
    RefOutOnly,
    /// Same types, but some parameter is by-value on one side and by-ref on the
    /// other, or `in` against `ref`/`out`
    RefKindMismatch,
    /// Not the same slot
    Different,
}

impl SignatureMatch {
    /// Whether the two members occupy the same slot modulo ref-kinds
    pub fn is_same_slot(self) -> bool {
        !matches!(self, Self::Different)
    }
}

impl Signature {
    /// Signature of `member` as declared (in its owner's parameter space)
    pub fn of(member: &MemberDef) -> Self {
        let params = if member.kind.has_parameters() {
            member
                .params
                .iter()
                .map(|param| SigParam {
                    ty: param.ty.clone(),
                    ref_kind: param.ref_kind,
                })
                .collect()
        } else {
            Vec::new()
        };
        Self {
            name: member.name,
            arity: if member.kind == MemberKind::Method {
                member.arity()
            } else {
                0
            },
            params,
        }
    }

    /// Signature of `member` with `subst` applied
    pub fn of_substituted(member: &MemberDef, subst: &Substitution) -> Self {
        Self::of(member).substitute(subst)
    }

    /// Apply a substitution to every parameter type
    pub fn substitute(&self, subst: &Substitution) -> Self {
        Self {
            name: self.name,
            arity: self.arity,
            params: self
                .params
                .iter()
                .map(|param| SigParam {
                    ty: subst.apply(&param.ty),
                    ref_kind: param.ref_kind,
                })
                .collect(),
        }
    }

    /// Compare with another signature, classifying ref-kind differences
    pub fn compare(&self, other: &Signature) -> SignatureMatch {
        if self.name != other.name || self.arity != other.arity || self.params.len() != other.params.len() {
            return SignatureMatch::Different;
        }
        let mut result = SignatureMatch::Exact;
        for (left, right) in self.params.iter().zip(&other.params) {
            if left.ty != right.ty {
                return SignatureMatch::Different;
            }
            let param_match = match (left.ref_kind, right.ref_kind) {
                (lhs, rhs) if lhs == rhs => SignatureMatch::Exact,
                (RefKind::Ref, RefKind::Out) | (RefKind::Out, RefKind::Ref) => SignatureMatch::RefOutOnly,
                _ => SignatureMatch::RefKindMismatch,
            };
            result = result.max(param_match);
        }
        result
    }

    /// Parameter types only, ignoring ref-kinds
    pub fn param_types(&self) -> impl Iterator<Item = &Ty> {
        self.params.iter().map(|param| &param.ty)
    }
}

impl ReturnShape {
    /// Return shape of `member` with `subst` applied
    pub fn of_substituted(member: &MemberDef, subst: &Substitution) -> Self {
        Self {
            ty: subst.apply(&member.ret),
            by_ref: member.ref_return,
        }
    }
}
