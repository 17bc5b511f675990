//! Human-readable rendering of types and members for diagnostic arguments

use crate::item::{MemberKind, RefKind, TypeParamDef};
use crate::subst::Substitution;
use crate::ty::Ty;
use crate::{MemberId, TypeGraph};
use std::fmt;

/// Displays a [`Ty`] using the names recorded in the graph
pub struct TyDisplay<'a> {
    graph: &'a TypeGraph,
    ty: &'a Ty,
    method_params: &'a [TypeParamDef],
}

impl<'a> TyDisplay<'a> {
    /// `method_params` names positional method type parameters
    pub fn new(graph: &'a TypeGraph, ty: &'a Ty, method_params: &'a [TypeParamDef]) -> Self {
        Self {
            graph,
            ty,
            method_params,
        }
    }

    fn write_ty(&self, f: &mut fmt::Formatter<'_>, ty: &Ty) -> fmt::Result {
        match ty {
            Ty::Named { def, args } => {
                write!(f, "{}", self.graph.name(self.graph.ty(*def).name))?;
                self.write_list(f, "<", args, ">")
            }
            Ty::Param(param) => {
                match self.graph.ty(param.owner).type_params.get(param.index as usize) {
                    Some(def) => write!(f, "{}", self.graph.name(def.name)),
                    None => write!(f, "!{}", param.index),
                }
            }
            Ty::MethodParam(index) => match self.method_params.get(*index as usize) {
                Some(def) => write!(f, "{}", self.graph.name(def.name)),
                None => write!(f, "!!{index}"),
            },
            Ty::Tuple(elements) => self.write_list(f, "(", elements, ")"),
            Ty::Array(element) => {
                self.write_ty(f, element)?;
                write!(f, "[]")
            }
            Ty::Void => write!(f, "void"),
        }
    }

    fn write_list(&self, f: &mut fmt::Formatter<'_>, open: &str, tys: &[Ty], close: &str) -> fmt::Result {
        if tys.is_empty() {
            return Ok(());
        }
        write!(f, "{open}")?;
        for (position, ty) in tys.iter().enumerate() {
            if position > 0 {
                write!(f, ", ")?;
            }
            self.write_ty(f, ty)?;
        }
        write!(f, "{close}")
    }
}

impl fmt::Display for TyDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_ty(f, self.ty)
    }
}

/// Displays a member as `Owner<Args>.Name<U>(params)`
pub struct MemberDisplay<'a> {
    graph: &'a TypeGraph,
    member: MemberId,
    view: Option<&'a Ty>,
}

impl<'a> MemberDisplay<'a> {
    /// Display `member` as seen through `view`, or its own owner
    pub fn new(graph: &'a TypeGraph, member: MemberId, view: Option<&'a Ty>) -> Self {
        Self { graph, member, view }
    }
}

impl fmt::Display for MemberDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let member = self.graph.member(self.member);
        let owner_ty = match self.view {
            Some(view) => view.clone(),
            None => self.graph.self_ty(member.owner),
        };
        let subst = Substitution::for_instance(&owner_ty);
        let params = &member.type_params;

        write!(f, "{}.", TyDisplay::new(self.graph, &owner_ty, params))?;
        if let Some(iface) = &member.explicit_interface {
            write!(f, "{}.", TyDisplay::new(self.graph, &subst.apply(iface), params))?;
        }
        if member.kind == MemberKind::Indexer {
            write!(f, "this")?;
        } else {
            write!(f, "{}", self.graph.name(member.name))?;
        }
        if !params.is_empty() {
            write!(f, "<")?;
            for (position, param) in params.iter().enumerate() {
                if position > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", self.graph.name(param.name))?;
            }
            write!(f, ">")?;
        }
        let (open, close) = match member.kind {
            MemberKind::Method => ("(", ")"),
            MemberKind::Indexer => ("[", "]"),
            _ => return Ok(()),
        };
        write!(f, "{open}")?;
        for (position, param) in member.params.iter().enumerate() {
            if position > 0 {
                write!(f, ", ")?;
            }
            match param.ref_kind {
                RefKind::Value => {}
                RefKind::Ref => write!(f, "ref ")?,
                RefKind::Out => write!(f, "out ")?,
                RefKind::In => write!(f, "in ")?,
            }
            if param.is_params {
                write!(f, "params ")?;
            }
            write!(f, "{}", TyDisplay::new(self.graph, &subst.apply(&param.ty), params))?;
        }
        write!(f, "{close}")
    }
}

#[cfg(test)]
mod tests {
    use crate::item::{MemberDef, Param, TypeDef, TypeKind};
    use crate::ty::Ty;
    use crate::{RefKind, TypeGraph, TypeParamDef};
    use cv_intern::Interner;
    use cv_span::FileSpan;

    #[test]
    fn test_display_closed_member() {
        let mut graph = TypeGraph::new(Interner::new());
        let string = Ty::simple(graph.builtins().string);
        let name = graph.interner.intern("Base");
        let mut def = TypeDef::new(name, TypeKind::Class, FileSpan::synthetic());
        def.type_params.push(TypeParamDef {
            name: graph.interner.intern("T"),
            constraints: Vec::new(),
        });
        let base = graph.add_type(def);

        let method_name = graph.interner.intern("M");
        let mut member = MemberDef::new(base, crate::MemberKind::Method, method_name, Ty::Void, FileSpan::synthetic());
        for ref_kind in [RefKind::Ref, RefKind::Out] {
            member.params.push(Param {
                name: graph.interner.intern("x"),
                ty: Ty::param(base, 0),
                ref_kind,
                optional: false,
                is_params: false,
            });
        }
        let id = graph.add_member(member);

        assert_eq!(graph.display_member(id, None).to_string(), "Base<T>.M(ref T, out T)");
        let closed = Ty::generic(base, vec![string]);
        assert_eq!(
            graph.display_member(id, Some(&closed)).to_string(),
            "Base<string>.M(ref string, out string)"
        );
    }
}
