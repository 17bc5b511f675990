//! Type references
#![allow(
    clippy::min_ident_chars,
    reason = "Ty is a conventional name in type system implementations"
)]

use crate::TypeId;

/// Reference to a type parameter declared on a type definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeParamRef {
    /// Type declaring the parameter
    pub owner: TypeId,
    /// Position in the owner's parameter list
    pub index: u32,
}

/// A type as it occurs in a signature
///
/// Method type parameters are positional, so two members that differ only
/// in the names of their method type parameters have equal signatures.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    /// Named type, possibly generic
    Named {
        /// Type definition
        def: TypeId,
        /// Generic arguments
        args: Vec<Ty>,
    },
    /// Type parameter of a type definition
    Param(TypeParamRef),
    /// Method type parameter, by position
    MethodParam(u32),
    /// Tuple type
    Tuple(Vec<Ty>),
    /// Single-dimensional array
    Array(Box<Ty>),
    /// No value
    Void,
}

impl Ty {
    /// Non-generic named type
    pub fn simple(def: TypeId) -> Self {
        Self::Named {
            def,
            args: Vec::new(),
        }
    }

    /// Generic named type
    pub fn generic(def: TypeId, args: Vec<Ty>) -> Self {
        Self::Named { def, args }
    }

    /// Type parameter `index` of `owner`
    pub fn param(owner: TypeId, index: u32) -> Self {
        Self::Param(TypeParamRef { owner, index })
    }

    /// The definition of a named type
    pub fn def(&self) -> Option<TypeId> {
        match self {
            Self::Named { def, .. } => Some(*def),
            _ => None,
        }
    }

    /// Generic arguments of a named type (empty otherwise)
    pub fn args(&self) -> &[Ty] {
        match self {
            Self::Named { args, .. } => args,
            _ => &[],
        }
    }

    /// Whether any type parameter (type- or method-level) occurs in this type
    pub fn has_params(&self) -> bool {
        match self {
            Self::Param(_) | Self::MethodParam(_) => true,
            Self::Named { args, .. } | Self::Tuple(args) => args.iter().any(Self::has_params),
            Self::Array(element) => element.has_params(),
            Self::Void => false,
        }
    }

    /// Visit this type and every type nested in it, outermost first
    pub fn walk(&self, visit: &mut impl FnMut(&Ty)) {
        visit(self);
        match self {
            Self::Named { args, .. } | Self::Tuple(args) => {
                for arg in args {
                    arg.walk(visit);
                }
            }
            Self::Array(element) => element.walk(visit),
            Self::Param(_) | Self::MethodParam(_) | Self::Void => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use la_arena::{Idx, RawIdx};

    fn type_id(raw: u32) -> TypeId {
        Idx::from_raw(RawIdx::from(raw))
    }

    #[test]
    fn test_has_params() {
        let list = type_id(1);
        assert!(!Ty::simple(list).has_params());
        assert!(Ty::generic(list, vec![Ty::MethodParam(0)]).has_params());
        assert!(Ty::Tuple(vec![Ty::Void, Ty::Array(Box::new(Ty::param(list, 0)))]).has_params());
    }

    #[test]
    fn test_walk_visits_nested() {
        let list = type_id(1);
        let ty = Ty::generic(list, vec![Ty::Tuple(vec![Ty::Void, Ty::MethodParam(1)])]);
        let mut seen = 0;
        ty.walk(&mut |_| seen += 1);
        assert_eq!(seen, 4);
    }
}
