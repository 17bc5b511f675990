//! Generic argument substitution
//!
//! A [`Substitution`] maps the type parameters of one or more type
//! definitions to argument types. Members are always seen through a closed
//! reference to their owner (`Base<string>`), so the substitution for a
//! member is built from that reference alone; walking further up the
//! hierarchy composes the substitutions edge by edge.
#![allow(
    clippy::min_ident_chars,
    reason = "Ty is a conventional name in type system implementations"
)]

use crate::ty::{Ty, TypeParamRef};
use crate::{TypeGraph, TypeId};
use rustc_hash::FxHashMap;

/// Map from type-definition parameters (and optionally method parameters) to types
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitution {
    types: FxHashMap<TypeId, Vec<Ty>>,
    method: Option<Vec<Ty>>,
}

impl Substitution {
    /// The empty substitution
    pub fn identity() -> Self {
        Self::default()
    }

    /// Substitution that closes the definition referenced by `ty`
    ///
    /// For `Base<string>` this maps `Base`'s first parameter to `string`.
    /// Non-named types produce the identity.
    pub fn for_instance(ty: &Ty) -> Self {
        let mut subst = Self::identity();
        if let Ty::Named { def, args } = ty {
            if !args.is_empty() {
                subst.bind(*def, args.clone());
            }
        }
        subst
    }

    /// Substitution binding every ancestor of `id` (base classes and every
    /// inherited interface) to its arguments in `id`'s own parameter space
    ///
    /// When an interface is implemented under several instantiations, the
    /// first one in closed-set order is bound.
    pub fn for_type(graph: &TypeGraph, id: TypeId) -> Self {
        let mut subst = Self::identity();
        let interfaces = graph.closed_interfaces(id);
        for ancestor in graph.base_chain(id).iter().chain(interfaces.iter()) {
            if let Ty::Named { def, args } = ancestor {
                if !args.is_empty() && !subst.types.contains_key(def) {
                    subst.bind(*def, args.clone());
                }
            }
        }
        subst
    }

    /// Bind the parameters of `owner` to `args`
    pub fn bind(&mut self, owner: TypeId, args: Vec<Ty>) {
        self.types.insert(owner, args);
    }

    /// Bind method type parameters positionally
    pub fn bind_method(&mut self, args: Vec<Ty>) {
        self.method = Some(args);
    }

    /// Arguments bound for `owner`
    pub fn args_of(&self, owner: TypeId) -> Option<&[Ty]> {
        self.types.get(&owner).map(Vec::as_slice)
    }

    /// Whether applying the substitution changes nothing
    pub fn is_identity(&self) -> bool {
        self.types.is_empty() && self.method.is_none()
    }

    /// Apply the substitution to every type occurring in `ty`
    ///
    /// Parameters without a binding are left as they are.
    pub fn apply(&self, ty: &Ty) -> Ty {
        if self.is_identity() {
            return ty.clone();
        }
        match ty {
            Ty::Named { def, args } => Ty::Named {
                def: *def,
                args: args.iter().map(|arg| self.apply(arg)).collect(),
            },
            Ty::Param(TypeParamRef { owner, index }) => self
                .types
                .get(owner)
                .and_then(|args| args.get(*index as usize))
                .cloned()
                .unwrap_or_else(|| ty.clone()),
            Ty::MethodParam(index) => self
                .method
                .as_ref()
                .and_then(|args| args.get(*index as usize))
                .cloned()
                .unwrap_or_else(|| ty.clone()),
            Ty::Tuple(elements) => Ty::Tuple(elements.iter().map(|element| self.apply(element)).collect()),
            Ty::Array(element) => Ty::Array(Box::new(self.apply(element))),
            Ty::Void => Ty::Void,
        }
    }

    /// Apply the substitution to each type of a slice
    pub fn apply_all(&self, tys: &[Ty]) -> Vec<Ty> {
        tys.iter().map(|ty| self.apply(ty)).collect()
    }

    /// Compose with an inner substitution: the result applies `inner`, then `self`
    ///
    /// For `Derived<A> : Base<List<A>>` seen as `Derived<int>`, composing the
    /// `Derived` closing with the `Base` edge yields `Base`'s parameter bound
    /// to `List<int>`.
    pub fn compose(&self, inner: &Substitution) -> Substitution {
        let mut types: FxHashMap<TypeId, Vec<Ty>> = inner
            .types
            .iter()
            .map(|(owner, args)| (*owner, self.apply_all(args)))
            .collect();
        for (owner, args) in &self.types {
            types.entry(*owner).or_insert_with(|| args.clone());
        }
        let method = match (&inner.method, &self.method) {
            (Some(args), _) => Some(self.apply_all(args)),
            (None, outer) => outer.clone(),
        };
        Substitution { types, method }
    }
}
