//! Type and member declarations
//!
//! These are produced by the upstream binder and are immutable once the
//! [`TypeGraph`](crate::TypeGraph) is built.

use crate::ty::Ty;
use crate::{MemberId, TypeId};
use bitflags::bitflags;
use cv_intern::Symbol;
use cv_span::FileSpan;
use serde::{Deserialize, Serialize};

/// Identity of the assembly a type is compiled into
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AssemblyId(pub u32);

/// Kind of a type definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    /// Reference type with single inheritance
    Class,
    /// Interface (members are implemented, not inherited)
    Interface,
    /// Value type
    Struct,
}

bitflags! {
    /// Modifiers on a type definition
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeModifiers: u8 {
        /// Cannot be instantiated; may carry abstract members
        const ABSTRACT = 0x01;
        /// Cannot be derived from
        const SEALED = 0x02;
        /// Static class
        const STATIC = 0x04;
    }
}

bitflags! {
    /// Modifiers on a member declaration
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MemberModifiers: u8 {
        /// Introduces a new virtual slot
        const VIRTUAL = 0x01;
        /// Virtual slot without implementation
        const ABSTRACT = 0x02;
        /// Replaces an inherited virtual slot
        const OVERRIDE = 0x04;
        /// Prevents further overriding
        const SEALED = 0x08;
        /// Explicitly hides an inherited member
        const NEW = 0x10;
        /// Belongs to the type rather than to instances
        const STATIC = 0x20;
        /// Implemented externally
        const EXTERN = 0x40;
    }
}

/// Declared accessibility, ordered from most restrictive to least
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Accessibility {
    /// `private`
    Private,
    /// `private protected`
    PrivateProtected,
    /// `protected`
    Protected,
    /// `internal`
    Internal,
    /// `protected internal`
    ProtectedInternal,
    /// `public`
    Public,
}

impl Accessibility {
    /// Whether a member with this accessibility, declared in `declared_in`,
    /// can be seen from a type derived from its owner in `from`.
    pub fn visible_to_derived(self, declared_in: AssemblyId, from: AssemblyId) -> bool {
        match self {
            Self::Public | Self::Protected | Self::ProtectedInternal => true,
            Self::Internal | Self::PrivateProtected => declared_in == from,
            Self::Private => false,
        }
    }

    /// Keyword spelling
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::PrivateProtected => "private protected",
            Self::Protected => "protected",
            Self::Internal => "internal",
            Self::ProtectedInternal => "protected internal",
            Self::Public => "public",
        }
    }
}

/// Kind of a member declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberKind {
    /// Method
    Method,
    /// Property with get/set accessors
    Property,
    /// Indexer (`this[...]`) with get/set accessors
    Indexer,
    /// Event with add/remove accessors
    Event,
    /// Field; only takes part in hiding
    Field,
    /// Nested type; only takes part in hiding
    NestedType,
}

impl MemberKind {
    /// Whether this kind can take part in virtual dispatch
    pub fn is_dispatchable(self) -> bool {
        matches!(self, Self::Method | Self::Property | Self::Indexer | Self::Event)
    }

    /// Whether this kind carries accessors
    pub fn has_accessors(self) -> bool {
        matches!(self, Self::Property | Self::Indexer | Self::Event)
    }

    /// Whether the signature of this kind includes a parameter list
    pub fn has_parameters(self) -> bool {
        matches!(self, Self::Method | Self::Indexer)
    }

    /// Lowercase name used in messages
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Method => "method",
            Self::Property => "property",
            Self::Indexer => "indexer",
            Self::Event => "event",
            Self::Field => "field",
            Self::NestedType => "nested type",
        }
    }
}

/// How an argument is passed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefKind {
    /// By value
    Value,
    /// `ref`
    Ref,
    /// `out`
    Out,
    /// `in`
    In,
}

impl RefKind {
    /// Whether the argument is passed by reference
    pub fn is_by_ref(self) -> bool {
        !matches!(self, Self::Value)
    }
}

/// A generic constraint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constraint {
    /// `class`
    ReferenceType,
    /// `struct`
    ValueType,
    /// `unmanaged`
    Unmanaged,
    /// `new()`
    Constructor,
    /// Base class bound
    BaseBound(Ty),
    /// Interface bound
    InterfaceBound(Ty),
}

impl Constraint {
    /// Short name of the constraint kind
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::ReferenceType => "class",
            Self::ValueType => "struct",
            Self::Unmanaged => "unmanaged",
            Self::Constructor => "new()",
            Self::BaseBound(_) => "base type",
            Self::InterfaceBound(_) => "interface",
        }
    }
}

/// A generic type parameter with its effective constraints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParamDef {
    /// Parameter name
    pub name: Symbol,
    /// Constraints in declaration order
    pub constraints: Vec<Constraint>,
}

/// A constraint clause as written on a declaration (`where U : class`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereClause {
    /// Name of the constrained parameter as written
    pub param: Symbol,
    /// Constraints listed in the clause
    pub constraints: Vec<Constraint>,
    /// Source location
    pub span: FileSpan,
}

/// A formal parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Parameter name
    pub name: Symbol,
    /// Declared type
    pub ty: Ty,
    /// Passing mode
    pub ref_kind: RefKind,
    /// Has a default value
    pub optional: bool,
    /// `params` array parameter
    pub is_params: bool,
}

/// Accessor kind of a property, indexer or event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccessorKind {
    /// `get`
    Get,
    /// `set`
    Set,
    /// `add`
    Add,
    /// `remove`
    Remove,
}

impl AccessorKind {
    /// Keyword spelling
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }
}

/// An accessor of a property, indexer or event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessor {
    /// Accessor kind
    pub kind: AccessorKind,
    /// Own accessibility; `None` inherits the member's
    pub access: Option<Accessibility>,
    /// Source location
    pub span: FileSpan,
}

/// A type definition
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    /// Type name
    pub name: Symbol,
    /// Class, interface or struct
    pub kind: TypeKind,
    /// Generic parameters
    pub type_params: Vec<TypeParamDef>,
    /// Base class (`None` for the root and for interfaces)
    pub base: Option<Ty>,
    /// Declared interfaces, in declaration order
    pub interfaces: Vec<Ty>,
    /// Declared members, in declaration order
    pub members: Vec<MemberId>,
    /// Type modifiers
    pub modifiers: TypeModifiers,
    /// Owning assembly
    pub assembly: AssemblyId,
    /// Source location
    pub span: FileSpan,
}

impl TypeDef {
    /// Create an empty definition of the given kind
    pub fn new(name: Symbol, kind: TypeKind, span: FileSpan) -> Self {
        Self {
            name,
            kind,
            type_params: Vec::new(),
            base: None,
            interfaces: Vec::new(),
            members: Vec::new(),
            modifiers: TypeModifiers::empty(),
            assembly: AssemblyId::default(),
            span,
        }
    }

    /// Whether the type is an interface
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// Declared `abstract`
    pub fn is_abstract(&self) -> bool {
        self.modifiers.contains(TypeModifiers::ABSTRACT)
    }

    /// Number of type parameters
    pub fn arity(&self) -> usize {
        self.type_params.len()
    }
}

/// A member declaration
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDef {
    /// Declaring type
    pub owner: TypeId,
    /// Member kind
    pub kind: MemberKind,
    /// Member name (`this[]` for indexers)
    pub name: Symbol,
    /// Declared accessibility
    pub access: Accessibility,
    /// Declared modifiers
    pub modifiers: MemberModifiers,
    /// Method type parameters with their effective constraints
    pub type_params: Vec<TypeParamDef>,
    /// Constraint clauses as written on this declaration
    pub where_clauses: Vec<WhereClause>,
    /// Formal parameters
    pub params: Vec<Param>,
    /// Return type (or property/event type)
    pub ret: Ty,
    /// Returns by reference
    pub ref_return: bool,
    /// Interface named by an explicit implementation (`I<int>.M`)
    pub explicit_interface: Option<Ty>,
    /// Accessors, for accessor-bearing kinds
    pub accessors: Vec<Accessor>,
    /// Source location
    pub span: FileSpan,
}

impl MemberDef {
    /// Create a public, modifier-less member returning `ret`
    pub fn new(owner: TypeId, kind: MemberKind, name: Symbol, ret: Ty, span: FileSpan) -> Self {
        Self {
            owner,
            kind,
            name,
            access: Accessibility::Public,
            modifiers: MemberModifiers::empty(),
            type_params: Vec::new(),
            where_clauses: Vec::new(),
            params: Vec::new(),
            ret,
            ref_return: false,
            explicit_interface: None,
            accessors: Vec::new(),
            span,
        }
    }

    /// Declared `static`
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(MemberModifiers::STATIC)
    }

    /// Declared `abstract`
    pub fn is_abstract(&self) -> bool {
        self.modifiers.contains(MemberModifiers::ABSTRACT)
    }

    /// Declared `override`
    pub fn is_override(&self) -> bool {
        self.modifiers.contains(MemberModifiers::OVERRIDE)
    }

    /// Declared `sealed`
    pub fn is_sealed(&self) -> bool {
        self.modifiers.contains(MemberModifiers::SEALED)
    }

    /// Declared `new`
    pub fn is_new(&self) -> bool {
        self.modifiers.contains(MemberModifiers::NEW)
    }

    /// Virtual, abstract or override, and not static
    pub fn is_virtual_like(&self) -> bool {
        !self.is_static()
            && self
                .modifiers
                .intersects(MemberModifiers::VIRTUAL | MemberModifiers::ABSTRACT | MemberModifiers::OVERRIDE)
    }

    /// Declared as an explicit interface implementation
    pub fn is_explicit_impl(&self) -> bool {
        self.explicit_interface.is_some()
    }

    /// Number of method type parameters
    pub fn arity(&self) -> usize {
        self.type_params.len()
    }

    /// Find an accessor of the given kind
    pub fn accessor(&self, kind: AccessorKind) -> Option<&Accessor> {
        self.accessors.iter().find(|accessor| accessor.kind == kind)
    }

    /// Effective accessibility of an accessor (its own, or the member's)
    pub fn accessor_access(&self, accessor: &Accessor) -> Accessibility {
        accessor.access.unwrap_or(self.access)
    }

    /// Accessor kinds declared on this member, sorted
    pub fn accessor_kinds(&self) -> Vec<AccessorKind> {
        let mut kinds: Vec<AccessorKind> = self.accessors.iter().map(|accessor| accessor.kind).collect();
        kinds.sort();
        kinds
    }
}
