//! Declaration loader
//!
//! Binds a TOML declaration file into a [`TypeGraph`]. Binding runs in
//! three passes so that declarations may refer to each other in any order:
//! first every type is declared, then type headers (bases, interfaces and
//! constraints) are resolved and checked for cycles, and finally members
//! are bound.
#![allow(
    clippy::min_ident_chars,
    reason = "Ty is a conventional name in type system implementations"
)]

pub mod error;
mod raw;
pub mod texpr;

pub use error::DeclError;
pub use texpr::{TypeExpr, parse_type_expr};

use cv_intern::Interner;
use cv_model::{
    Accessibility, Accessor, AccessorKind, AssemblyId, Constraint, INDEXER_NAME, MemberDef, MemberKind,
    MemberModifiers, Param, RefKind, Ty, TypeDef, TypeGraph, TypeId, TypeKind, TypeModifiers, TypeParamDef,
    WhereClause,
};
use cv_span::{FileId, FileSpan, Span};
use raw::{RawFile, RawMember, RawType, RawWhere};
use rustc_hash::FxHashSet;
use std::ops::Range;
use tracing::debug;

/// Name of the assembly that holds the builtin types
pub const CORE_ASSEMBLY_NAME: &str = "core";

/// Assembly used when neither the file nor the type names one
pub const DEFAULT_ASSEMBLY_NAME: &str = "main";

/// A bound declaration file
#[derive(Debug, Clone)]
pub struct Declarations {
    /// The bound graph
    pub graph: TypeGraph,
    /// Assembly names, indexed by [`AssemblyId`]
    pub assemblies: Vec<String>,
    /// File the declarations were read from
    pub file: FileId,
}

impl Declarations {
    /// Name of an assembly
    pub fn assembly_name(&self, id: AssemblyId) -> &str {
        self.assemblies.get(id.0 as usize).map_or("?", String::as_str)
    }
}

/// Bind the declarations in `source`
pub fn load_str(source: &str, file: FileId) -> Result<Declarations, DeclError> {
    let raw: RawFile = toml::from_str(source).map_err(|error| DeclError::Syntax {
        message: error.message().to_owned(),
        span: error.span().map(|range| FileSpan::new(file, Span::from_range(range))),
    })?;
    let mut loader = Loader::new(file, raw.assembly.as_deref());
    loader.load(&raw)?;
    debug!(
        types = raw.types.len(),
        members = loader.graph.members.len(),
        "bound declaration file"
    );
    Ok(Declarations {
        graph: loader.graph,
        assemblies: loader.assemblies,
        file,
    })
}

/// Names visible while resolving a type expression
#[derive(Clone, Copy)]
struct Scope<'a> {
    owner: TypeId,
    method_params: &'a [String],
}

struct Loader {
    graph: TypeGraph,
    file: FileId,
    assemblies: Vec<String>,
    default_assembly: AssemblyId,
}

impl Loader {
    fn new(file: FileId, default_assembly: Option<&str>) -> Self {
        let mut loader = Self {
            graph: TypeGraph::new(Interner::new()),
            file,
            assemblies: vec![CORE_ASSEMBLY_NAME.to_owned()],
            default_assembly: AssemblyId::default(),
        };
        loader.default_assembly = loader.assembly(default_assembly.unwrap_or(DEFAULT_ASSEMBLY_NAME));
        loader
    }

    fn span(&self, range: Range<usize>) -> FileSpan {
        FileSpan::new(self.file, Span::from_range(range))
    }

    fn assembly(&mut self, name: &str) -> AssemblyId {
        let index = match self.assemblies.iter().position(|known| known == name) {
            Some(index) => index,
            None => {
                self.assemblies.push(name.to_owned());
                self.assemblies.len() - 1
            }
        };
        AssemblyId(index as u32)
    }

    fn load(&mut self, raw: &RawFile) -> Result<(), DeclError> {
        let mut ids = Vec::with_capacity(raw.types.len());
        for raw_type in &raw.types {
            ids.push(self.declare_type(raw_type)?);
        }
        for (raw_type, &id) in raw.types.iter().zip(&ids) {
            self.bind_header(raw_type, id)?;
        }
        for (raw_type, &id) in raw.types.iter().zip(&ids) {
            self.check_cycle(raw_type, id)?;
        }
        for (raw_type, &id) in raw.types.iter().zip(&ids) {
            for raw_member in &raw_type.members {
                self.bind_member(raw_type, id, raw_member)?;
            }
        }
        Ok(())
    }

    fn declare_type(&mut self, raw: &RawType) -> Result<TypeId, DeclError> {
        let span = self.span(raw.name.span());
        let name = raw.name.get_ref();
        if self.graph.lookup(name, raw.type_params.len()).is_some() {
            let written = if raw.type_params.is_empty() {
                name.clone()
            } else {
                format!("{name}<{}>", raw.type_params.join(", "))
            };
            return Err(DeclError::DuplicateType { name: written, span });
        }

        let kind = parse_type_kind(&raw.kind, span)?;
        let mut def = TypeDef::new(self.graph.interner.intern(name), kind, span);
        def.type_params = raw
            .type_params
            .iter()
            .map(|param| TypeParamDef {
                name: self.graph.interner.intern(param),
                constraints: Vec::new(),
            })
            .collect();
        for modifier in &raw.modifiers {
            def.modifiers |= parse_type_modifier(modifier, span)?;
        }
        def.assembly = match &raw.assembly {
            Some(assembly) => self.assembly(assembly),
            None => self.default_assembly,
        };
        Ok(self.graph.add_type(def))
    }

    fn bind_header(&mut self, raw: &RawType, id: TypeId) -> Result<(), DeclError> {
        let span = self.graph.ty(id).span;
        let kind = self.graph.ty(id).kind;
        let scope = Scope {
            owner: id,
            method_params: &[],
        };
        let builtins = self.graph.builtins();

        let base = match (&raw.base, kind) {
            (Some(text), TypeKind::Class) => {
                let base = self.resolve_text(text, scope, span)?;
                let is_class = base
                    .def()
                    .is_some_and(|def| def != id && self.graph.ty(def).kind == TypeKind::Class);
                if !is_class {
                    return Err(DeclError::InvalidBase {
                        name: text.clone(),
                        span,
                    });
                }
                Some(base)
            }
            (Some(text), TypeKind::Interface | TypeKind::Struct) => {
                return Err(DeclError::InvalidBase {
                    name: text.clone(),
                    span,
                });
            }
            (None, TypeKind::Class) => Some(Ty::simple(builtins.object)),
            (None, TypeKind::Struct) => Some(Ty::simple(builtins.value_type)),
            (None, TypeKind::Interface) => None,
        };

        let mut interfaces = Vec::with_capacity(raw.interfaces.len());
        for text in &raw.interfaces {
            let iface = self.resolve_text(text, scope, span)?;
            if !self.is_interface(&iface) {
                return Err(DeclError::NotAnInterface {
                    name: text.clone(),
                    span,
                });
            }
            interfaces.push(iface);
        }

        let names: Vec<String> = raw.type_params.clone();
        let mut constraints: Vec<Vec<Constraint>> = vec![Vec::new(); names.len()];
        for clause in &raw.where_clauses {
            let Some(index) = names.iter().position(|name| *name == clause.param) else {
                return Err(DeclError::UnknownKeyword {
                    what: "type parameter",
                    text: clause.param.clone(),
                    span,
                });
            };
            constraints[index].extend(self.bind_constraints(clause, scope, span)?);
        }

        let def = &mut self.graph.types[id];
        def.base = base;
        def.interfaces = interfaces;
        for (param, bound) in def.type_params.iter_mut().zip(constraints) {
            param.constraints = bound;
        }
        Ok(())
    }

    /// Reject a type that reaches itself through its base class or interfaces
    fn check_cycle(&self, raw: &RawType, id: TypeId) -> Result<(), DeclError> {
        let parents = |current: TypeId| -> Vec<TypeId> {
            let def = self.graph.ty(current);
            def.base.iter().chain(&def.interfaces).filter_map(Ty::def).collect()
        };
        let mut seen = FxHashSet::default();
        let mut stack = parents(id);
        while let Some(current) = stack.pop() {
            if current == id {
                return Err(DeclError::CyclicInheritance {
                    name: raw.name.get_ref().clone(),
                    span: self.graph.ty(id).span,
                });
            }
            if seen.insert(current) {
                stack.extend(parents(current));
            }
        }
        Ok(())
    }

    fn bind_member(&mut self, owner_raw: &RawType, owner: TypeId, raw: &RawMember) -> Result<(), DeclError> {
        let owner_span = self.graph.ty(owner).span;
        let span = raw
            .name
            .as_ref()
            .map_or(owner_span, |name| self.span(name.span()));
        let kind = parse_member_kind(&raw.kind, span)?;

        let name = match (&raw.name, kind) {
            (_, MemberKind::Indexer) => INDEXER_NAME.to_owned(),
            (Some(name), _) => name.get_ref().clone(),
            (None, _) => {
                return Err(DeclError::MissingName {
                    kind: kind.as_str(),
                    owner: owner_raw.name.get_ref().clone(),
                    span: owner_span,
                });
            }
        };

        let scope = Scope {
            owner,
            method_params: &raw.type_params,
        };
        let ret = match (&raw.returns, kind) {
            (Some(text), _) => self.resolve_text(text, scope, span)?,
            (None, MemberKind::Method | MemberKind::NestedType) => Ty::Void,
            (None, _) => {
                return Err(DeclError::MissingType {
                    kind: kind.as_str(),
                    name,
                    span,
                });
            }
        };

        let mut member = MemberDef::new(owner, kind, self.graph.interner.intern(&name), ret, span);
        if let Some(access) = &raw.access {
            member.access = parse_accessibility(access, span)?;
        }
        for modifier in &raw.modifiers {
            member.modifiers |= parse_member_modifier(modifier, span)?;
        }
        member.ref_return = raw.ref_return;

        member.type_params = raw
            .type_params
            .iter()
            .map(|param| TypeParamDef {
                name: self.graph.interner.intern(param),
                constraints: Vec::new(),
            })
            .collect();
        for clause in &raw.where_clauses {
            let constraints = self.bind_constraints(clause, scope, span)?;
            if let Some(index) = raw.type_params.iter().position(|param| *param == clause.param) {
                member.type_params[index].constraints.extend(constraints.iter().cloned());
            }
            member.where_clauses.push(WhereClause {
                param: self.graph.interner.intern(&clause.param),
                constraints,
                span,
            });
        }

        for (position, text) in raw.params.iter().enumerate() {
            member.params.push(self.bind_param(text, position, scope, span)?);
        }

        if let Some(text) = &raw.explicit {
            let iface = self.resolve_text(text, scope, span)?;
            if !self.is_interface(&iface) {
                return Err(DeclError::NotAnInterface {
                    name: text.clone(),
                    span,
                });
            }
            member.explicit_interface = Some(iface);
        }

        member.accessors = match &raw.accessors {
            Some(accessors) => accessors
                .iter()
                .map(|text| parse_accessor(text, span))
                .collect::<Result<_, _>>()?,
            None => default_accessors(kind)
                .iter()
                .map(|&accessor_kind| Accessor {
                    kind: accessor_kind,
                    access: None,
                    span,
                })
                .collect(),
        };

        self.graph.add_member(member);
        Ok(())
    }

    fn bind_param(&self, text: &str, position: usize, scope: Scope<'_>, span: FileSpan) -> Result<Param, DeclError> {
        let (declared, optional) = match text.split_once('=') {
            Some((declared, _default)) => (declared.trim(), true),
            None => (text.trim(), false),
        };
        let mut ref_kind = RefKind::Value;
        let mut is_params = false;
        let mut rest = declared;
        loop {
            let Some((word, tail)) = rest.split_once(char::is_whitespace) else {
                break;
            };
            match word {
                "ref" => ref_kind = RefKind::Ref,
                "out" => ref_kind = RefKind::Out,
                "in" => ref_kind = RefKind::In,
                "params" => is_params = true,
                _ => break,
            }
            rest = tail.trim_start();
        }
        Ok(Param {
            name: self.graph.interner.intern(&format!("arg{position}")),
            ty: self.resolve_text(rest, scope, span)?,
            ref_kind,
            optional,
            is_params,
        })
    }

    fn bind_constraints(&self, clause: &RawWhere, scope: Scope<'_>, span: FileSpan) -> Result<Vec<Constraint>, DeclError> {
        clause
            .constraints
            .iter()
            .map(|text| match text.trim() {
                "class" => Ok(Constraint::ReferenceType),
                "struct" => Ok(Constraint::ValueType),
                "unmanaged" => Ok(Constraint::Unmanaged),
                "new()" => Ok(Constraint::Constructor),
                other => {
                    let bound = self.resolve_text(other, scope, span)?;
                    Ok(if self.is_interface(&bound) {
                        Constraint::InterfaceBound(bound)
                    } else {
                        Constraint::BaseBound(bound)
                    })
                }
            })
            .collect()
    }

    fn is_interface(&self, ty: &Ty) -> bool {
        ty.def().is_some_and(|def| self.graph.ty(def).is_interface())
    }

    fn resolve_text(&self, text: &str, scope: Scope<'_>, span: FileSpan) -> Result<Ty, DeclError> {
        let expr = parse_type_expr(text).map_err(|message| DeclError::TypeSyntax {
            text: text.to_owned(),
            message,
            span,
        })?;
        self.resolve(&expr, scope, span)
    }

    /// Method type parameters shadow type parameters, which shadow types
    fn resolve(&self, expr: &TypeExpr, scope: Scope<'_>, span: FileSpan) -> Result<Ty, DeclError> {
        match expr {
            TypeExpr::Name { name, args } => {
                if args.is_empty() {
                    if name == "void" {
                        return Ok(Ty::Void);
                    }
                    if let Some(index) = scope.method_params.iter().position(|param| param == name) {
                        return Ok(Ty::MethodParam(index as u32));
                    }
                    let owner_params = &self.graph.ty(scope.owner).type_params;
                    if let Some(index) = owner_params
                        .iter()
                        .position(|param| self.graph.name(param.name) == name)
                    {
                        return Ok(Ty::param(scope.owner, index as u32));
                    }
                }
                let args = args
                    .iter()
                    .map(|arg| self.resolve(arg, scope, span))
                    .collect::<Result<Vec<_>, _>>()?;
                match self.graph.lookup(name, args.len()) {
                    Some(def) => Ok(Ty::generic(def, args)),
                    None => Err(DeclError::UnknownType {
                        name: name.clone(),
                        arity: args.len(),
                        span,
                    }),
                }
            }
            TypeExpr::Tuple(elements) => Ok(Ty::Tuple(
                elements
                    .iter()
                    .map(|element| self.resolve(element, scope, span))
                    .collect::<Result<_, _>>()?,
            )),
            TypeExpr::Array(element) => Ok(Ty::Array(Box::new(self.resolve(element, scope, span)?))),
        }
    }
}

fn parse_type_kind(text: &str, span: FileSpan) -> Result<TypeKind, DeclError> {
    match text {
        "class" => Ok(TypeKind::Class),
        "interface" => Ok(TypeKind::Interface),
        "struct" => Ok(TypeKind::Struct),
        _ => Err(DeclError::UnknownKeyword {
            what: "type kind",
            text: text.to_owned(),
            span,
        }),
    }
}

fn parse_member_kind(text: &str, span: FileSpan) -> Result<MemberKind, DeclError> {
    match text {
        "method" => Ok(MemberKind::Method),
        "property" => Ok(MemberKind::Property),
        "indexer" => Ok(MemberKind::Indexer),
        "event" => Ok(MemberKind::Event),
        "field" => Ok(MemberKind::Field),
        "type" => Ok(MemberKind::NestedType),
        _ => Err(DeclError::UnknownKeyword {
            what: "member kind",
            text: text.to_owned(),
            span,
        }),
    }
}

fn parse_type_modifier(text: &str, span: FileSpan) -> Result<TypeModifiers, DeclError> {
    match text {
        "abstract" => Ok(TypeModifiers::ABSTRACT),
        "sealed" => Ok(TypeModifiers::SEALED),
        "static" => Ok(TypeModifiers::STATIC),
        _ => Err(DeclError::UnknownKeyword {
            what: "type modifier",
            text: text.to_owned(),
            span,
        }),
    }
}

fn parse_member_modifier(text: &str, span: FileSpan) -> Result<MemberModifiers, DeclError> {
    match text {
        "virtual" => Ok(MemberModifiers::VIRTUAL),
        "abstract" => Ok(MemberModifiers::ABSTRACT),
        "override" => Ok(MemberModifiers::OVERRIDE),
        "sealed" => Ok(MemberModifiers::SEALED),
        "new" => Ok(MemberModifiers::NEW),
        "static" => Ok(MemberModifiers::STATIC),
        "extern" => Ok(MemberModifiers::EXTERN),
        _ => Err(DeclError::UnknownKeyword {
            what: "member modifier",
            text: text.to_owned(),
            span,
        }),
    }
}

fn parse_accessibility(text: &str, span: FileSpan) -> Result<Accessibility, DeclError> {
    let words: Vec<&str> = text.split_whitespace().collect();
    match words.as_slice() {
        ["public"] => Ok(Accessibility::Public),
        ["protected", "internal"] | ["internal", "protected"] => Ok(Accessibility::ProtectedInternal),
        ["internal"] => Ok(Accessibility::Internal),
        ["protected"] => Ok(Accessibility::Protected),
        ["private", "protected"] | ["protected", "private"] => Ok(Accessibility::PrivateProtected),
        ["private"] => Ok(Accessibility::Private),
        _ => Err(DeclError::UnknownKeyword {
            what: "accessibility",
            text: text.to_owned(),
            span,
        }),
    }
}

/// `get`, `protected set`, `private protected add`
fn parse_accessor(text: &str, span: FileSpan) -> Result<Accessor, DeclError> {
    let trimmed = text.trim();
    let (access_text, kind_text) = match trimmed.rsplit_once(char::is_whitespace) {
        Some((access, kind)) => (Some(access), kind),
        None => (None, trimmed),
    };
    let kind = match kind_text {
        "get" => AccessorKind::Get,
        "set" => AccessorKind::Set,
        "add" => AccessorKind::Add,
        "remove" => AccessorKind::Remove,
        _ => {
            return Err(DeclError::UnknownKeyword {
                what: "accessor",
                text: text.to_owned(),
                span,
            });
        }
    };
    let access = access_text
        .map(|access| parse_accessibility(access, span))
        .transpose()?;
    Ok(Accessor { kind, access, span })
}

fn default_accessors(kind: MemberKind) -> &'static [AccessorKind] {
    match kind {
        MemberKind::Property | MemberKind::Indexer => &[AccessorKind::Get, AccessorKind::Set],
        MemberKind::Event => &[AccessorKind::Add, AccessorKind::Remove],
        MemberKind::Method | MemberKind::Field | MemberKind::NestedType => &[],
    }
}
