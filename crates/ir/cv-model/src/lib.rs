//! Bound declaration graph
//!
//! The graph is the read-only input of the member relationship passes: every
//! type definition with its base class, declared interfaces and members, plus
//! the derived views the passes need (closed base chains and closed interface
//! sets). Names are interned and definitions live in arenas, so every
//! cross-reference is a copyable id.
#![allow(
    clippy::min_ident_chars,
    reason = "Ty is a conventional name in type system implementations"
)]

pub mod display;
pub mod item;
pub mod signature;
pub mod subst;
pub mod ty;

pub use display::{MemberDisplay, TyDisplay};
pub use item::{
    Accessibility, Accessor, AccessorKind, AssemblyId, Constraint, MemberDef, MemberKind, MemberModifiers, Param,
    RefKind, TypeDef, TypeKind, TypeModifiers, TypeParamDef, WhereClause,
};
pub use signature::{ReturnShape, SigParam, Signature, SignatureMatch};
pub use subst::Substitution;
pub use ty::{Ty, TypeParamRef};

use cv_intern::{Interner, Symbol};
use cv_span::FileSpan;
use indexmap::IndexSet;
use la_arena::{Arena, Idx};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// Id of a type definition
pub type TypeId = Idx<TypeDef>;
/// Id of a member declaration
pub type MemberId = Idx<MemberDef>;

/// Assembly that holds the builtin types
pub const CORE_ASSEMBLY: AssemblyId = AssemblyId(0);

/// Name used for every indexer
pub const INDEXER_NAME: &str = "this[]";

/// Stable numeric index of an arena id, for ordering
pub fn index_of<T>(id: Idx<T>) -> u32 {
    u32::from(id.into_raw())
}

/// Ids of the builtin types every graph starts with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Builtins {
    /// Root of the class hierarchy
    pub object: TypeId,
    /// Base of every struct
    pub value_type: TypeId,
    /// `string`
    pub string: TypeId,
    /// `int`
    pub int: TypeId,
    /// `long`
    pub long: TypeId,
    /// `bool`
    pub bool: TypeId,
    /// `double`
    pub double: TypeId,
}

/// The bound type/member graph
#[derive(Debug, Clone)]
pub struct TypeGraph {
    /// Type definitions
    pub types: Arena<TypeDef>,
    /// Member declarations
    pub members: Arena<MemberDef>,
    /// Interner for every name in the graph
    pub interner: Interner,
    builtins: Builtins,
    by_name: FxHashMap<(Symbol, usize), TypeId>,
}

impl TypeGraph {
    /// Create a graph holding only the builtin types
    pub fn new(interner: Interner) -> Self {
        let mut types = Arena::new();
        let mut by_name = FxHashMap::default();
        let mut builtin = |name: &str, kind: TypeKind, base: Option<TypeId>, modifiers: TypeModifiers| {
            let symbol = interner.intern(name);
            let mut def = TypeDef::new(symbol, kind, FileSpan::synthetic());
            def.base = base.map(Ty::simple);
            def.modifiers = modifiers;
            def.assembly = CORE_ASSEMBLY;
            let id = types.alloc(def);
            by_name.insert((symbol, 0), id);
            id
        };

        let object = builtin("object", TypeKind::Class, None, TypeModifiers::empty());
        let value_type = builtin("ValueType", TypeKind::Class, Some(object), TypeModifiers::ABSTRACT);
        let string = builtin("string", TypeKind::Class, Some(object), TypeModifiers::SEALED);
        let int = builtin("int", TypeKind::Struct, Some(value_type), TypeModifiers::SEALED);
        let long = builtin("long", TypeKind::Struct, Some(value_type), TypeModifiers::SEALED);
        let bool = builtin("bool", TypeKind::Struct, Some(value_type), TypeModifiers::SEALED);
        let double = builtin("double", TypeKind::Struct, Some(value_type), TypeModifiers::SEALED);

        let mut graph = Self {
            types,
            members: Arena::new(),
            interner,
            builtins: Builtins {
                object,
                value_type,
                string,
                int,
                long,
                bool,
                double,
            },
            by_name,
        };
        graph.add_object_members();
        graph
    }

    /// The virtual methods every class inherits from `object`
    fn add_object_members(&mut self) {
        let object = self.builtins.object;
        let virtual_method = |graph: &mut Self, name: &str, ret: TypeId, params: Vec<(&str, TypeId)>| {
            let symbol = graph.interner.intern(name);
            let mut member = MemberDef::new(object, MemberKind::Method, symbol, Ty::simple(ret), FileSpan::synthetic());
            member.modifiers = MemberModifiers::VIRTUAL;
            member.params = params
                .into_iter()
                .map(|(param_name, param_ty)| Param {
                    name: graph.interner.intern(param_name),
                    ty: Ty::simple(param_ty),
                    ref_kind: RefKind::Value,
                    optional: false,
                    is_params: false,
                })
                .collect();
            graph.add_member(member);
        };
        let Builtins {
            object, string, int, bool, ..
        } = self.builtins;
        virtual_method(self, "ToString", string, Vec::new());
        virtual_method(self, "Equals", bool, vec![("obj", object)]);
        virtual_method(self, "GetHashCode", int, Vec::new());
    }

    /// Builtin type ids
    pub fn builtins(&self) -> Builtins {
        self.builtins
    }

    /// Add a type definition, making it visible to [`TypeGraph::lookup`]
    pub fn add_type(&mut self, def: TypeDef) -> TypeId {
        let key = (def.name, def.arity());
        let id = self.types.alloc(def);
        self.by_name.insert(key, id);
        id
    }

    /// Add a member to its owner's member list
    pub fn add_member(&mut self, member: MemberDef) -> MemberId {
        let owner = member.owner;
        let id = self.members.alloc(member);
        self.types[owner].members.push(id);
        id
    }

    /// Find a type by name and generic arity
    pub fn lookup(&self, name: &str, arity: usize) -> Option<TypeId> {
        let symbol = self.interner.get(name)?;
        self.by_name.get(&(symbol, arity)).copied()
    }

    /// Definition of a type
    pub fn ty(&self, id: TypeId) -> &TypeDef {
        &self.types[id]
    }

    /// Definition of a member
    pub fn member(&self, id: MemberId) -> &MemberDef {
        &self.members[id]
    }

    /// Text of an interned name
    pub fn name(&self, symbol: Symbol) -> &str {
        self.interner.resolve(&symbol)
    }

    /// All type ids in definition order
    pub fn type_ids(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.types.iter().map(|(id, _)| id)
    }

    /// The type viewed from inside itself: `C<T>` with its own parameters
    pub fn self_ty(&self, id: TypeId) -> Ty {
        let arity = self.types[id].arity() as u32;
        Ty::generic(id, (0..arity).map(|index| Ty::param(id, index)).collect())
    }

    /// Closed base classes of `id`, nearest first, in `id`'s parameter space
    ///
    /// For `C<T> : B<List<T>>` and `B<U> : A<U[]>` this is
    /// `[B<List<T>>, A<List<T>[]>]`, followed by the root.
    pub fn base_chain(&self, id: TypeId) -> Vec<Ty> {
        let mut chain = Vec::new();
        let mut seen = FxHashSet::default();
        seen.insert(id);
        let mut current = id;
        let mut view = Substitution::identity();
        while let Some(base) = &self.types[current].base {
            let closed = view.apply(base);
            let Some(next) = closed.def() else {
                break;
            };
            if !seen.insert(next) {
                break;
            }
            view = Substitution::for_instance(&closed);
            chain.push(closed);
            current = next;
        }
        chain
    }

    /// Interfaces declared on `id` and, transitively, their base interfaces
    ///
    /// Closed in `id`'s parameter space, deduplicated, breadth-first.
    pub fn declared_interfaces(&self, id: TypeId) -> IndexSet<Ty> {
        let mut set = IndexSet::new();
        self.collect_interfaces(id, &Substitution::identity(), &mut set);
        set
    }

    /// Every interface `id` implements, including through its base classes
    ///
    /// Interfaces declared on `id` come first, then those of each base class
    /// from nearest to farthest.
    pub fn closed_interfaces(&self, id: TypeId) -> IndexSet<Ty> {
        let mut set = IndexSet::new();
        self.collect_interfaces(id, &Substitution::identity(), &mut set);
        for base in self.base_chain(id) {
            if let Some(def) = base.def() {
                self.collect_interfaces(def, &Substitution::for_instance(&base), &mut set);
            }
        }
        set
    }

    fn collect_interfaces(&self, id: TypeId, view: &Substitution, set: &mut IndexSet<Ty>) {
        let mut queue: VecDeque<(TypeId, Substitution)> = VecDeque::new();
        queue.push_back((id, view.clone()));
        while let Some((current, current_view)) = queue.pop_front() {
            for iface in &self.types[current].interfaces {
                let closed = current_view.apply(iface);
                if let Some(def) = closed.def() {
                    if set.insert(closed.clone()) {
                        queue.push_back((def, Substitution::for_instance(&closed)));
                    }
                }
            }
        }
    }

    /// Types searched, nearest first, when looking for inherited members of `id`
    ///
    /// For classes and structs this is the base chain; for interfaces it is
    /// the closed set of base interfaces.
    pub fn lookup_chain(&self, id: TypeId) -> Vec<Ty> {
        if self.types[id].is_interface() {
            self.declared_interfaces(id).into_iter().collect()
        } else {
            self.base_chain(id)
        }
    }

    /// Whether `ty` is a class, interface, array or a parameter known to be a reference type
    pub fn is_reference_type(&self, ty: &Ty) -> bool {
        match ty {
            Ty::Named { def, .. } => matches!(self.types[*def].kind, TypeKind::Class | TypeKind::Interface),
            Ty::Array(_) => true,
            Ty::Param(param) => self.types[param.owner]
                .type_params
                .get(param.index as usize)
                .is_some_and(|def| {
                    def.constraints
                        .iter()
                        .any(|constraint| matches!(constraint, Constraint::ReferenceType))
                }),
            Ty::MethodParam(_) | Ty::Tuple(_) | Ty::Void => false,
        }
    }

    /// Whether a value of type `from` converts to `to` by reference (identity,
    /// base class, or implemented interface)
    pub fn has_reference_conversion(&self, from: &Ty, to: &Ty) -> bool {
        if from == to {
            return true;
        }
        let Ty::Named { def, .. } = from else {
            return false;
        };
        if !self.is_reference_type(from) {
            return false;
        }
        if to.def() == Some(self.builtins.object) {
            return true;
        }
        let view = Substitution::for_instance(from);
        self.base_chain(*def)
            .iter()
            .chain(self.closed_interfaces(*def).iter())
            .any(|ancestor| &view.apply(ancestor) == to)
    }

    /// Display a type
    pub fn display_ty<'a>(&'a self, ty: &'a Ty) -> TyDisplay<'a> {
        TyDisplay::new(self, ty, &[])
    }

    /// Display a member as seen through `view` (its closed owner), or as declared
    pub fn display_member<'a>(&'a self, id: MemberId, view: Option<&'a Ty>) -> MemberDisplay<'a> {
        MemberDisplay::new(self, id, view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(graph: &mut TypeGraph, name: &str, params: &[&str], base: Option<Ty>) -> TypeId {
        let symbol = graph.interner.intern(name);
        let mut def = TypeDef::new(symbol, TypeKind::Class, FileSpan::synthetic());
        def.type_params = params
            .iter()
            .map(|param| TypeParamDef {
                name: graph.interner.intern(param),
                constraints: Vec::new(),
            })
            .collect();
        def.base = base.or(Some(Ty::simple(graph.builtins().object)));
        graph.add_type(def)
    }

    fn interface(graph: &mut TypeGraph, name: &str, params: &[&str], bases: Vec<Ty>) -> TypeId {
        let symbol = graph.interner.intern(name);
        let mut def = TypeDef::new(symbol, TypeKind::Interface, FileSpan::synthetic());
        def.type_params = params
            .iter()
            .map(|param| TypeParamDef {
                name: graph.interner.intern(param),
                constraints: Vec::new(),
            })
            .collect();
        def.interfaces = bases;
        graph.add_type(def)
    }

    #[test]
    fn test_builtins_and_lookup() {
        let graph = TypeGraph::new(Interner::new());
        let builtins = graph.builtins();
        assert_eq!(graph.lookup("object", 0), Some(builtins.object));
        assert_eq!(graph.lookup("int", 0), Some(builtins.int));
        assert_eq!(graph.lookup("int", 1), None);
        assert_eq!(graph.ty(builtins.object).members.len(), 3);
    }

    #[test]
    fn test_base_chain_composes_arguments() {
        let mut graph = TypeGraph::new(Interner::new());
        let list = class(&mut graph, "List", &["E"], None);
        let grand = class(&mut graph, "Grand", &["G"], None);
        let parent = class(&mut graph, "Parent", &["U"], Some(Ty::param(grand, 0)));
        // Parent<U> : Grand<U[]>
        graph.types[parent].base = Some(Ty::generic(grand, vec![Ty::Array(Box::new(Ty::param(parent, 0)))]));
        // Child<T> : Parent<List<T>>
        let child = class(&mut graph, "Child", &["T"], None);
        graph.types[child].base = Some(Ty::generic(parent, vec![Ty::generic(list, vec![Ty::param(child, 0)])]));

        let chain = graph.base_chain(child);
        let list_of_t = Ty::generic(list, vec![Ty::param(child, 0)]);
        assert_eq!(chain[0], Ty::generic(parent, vec![list_of_t.clone()]));
        assert_eq!(chain[1], Ty::generic(grand, vec![Ty::Array(Box::new(list_of_t))]));
        assert_eq!(chain[2], Ty::simple(graph.builtins().object));
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn test_for_type_binds_every_ancestor() {
        let mut graph = TypeGraph::new(Interner::new());
        let int = Ty::simple(graph.builtins().int);
        let iface = interface(&mut graph, "IBox", &["V"], Vec::new());
        let base = class(&mut graph, "Base", &["B"], None);
        graph.types[base].interfaces = vec![Ty::generic(iface, vec![Ty::Array(Box::new(Ty::param(base, 0)))])];
        let derived = class(&mut graph, "Derived", &[], Some(Ty::generic(base, vec![int.clone()])));

        let subst = Substitution::for_type(&graph, derived);
        assert_eq!(subst.apply(&Ty::param(base, 0)), int);
        assert_eq!(subst.apply(&Ty::param(iface, 0)), Ty::Array(Box::new(int)));
    }

    #[test]
    fn test_closed_interfaces_deduplicate_diamonds() {
        let mut graph = TypeGraph::new(Interner::new());
        let int = Ty::simple(graph.builtins().int);
        let root = interface(&mut graph, "IRoot", &["T"], Vec::new());
        let left = interface(&mut graph, "ILeft", &["L"], Vec::new());
        graph.types[left].interfaces = vec![Ty::generic(root, vec![Ty::param(left, 0)])];
        let right = interface(&mut graph, "IRight", &[], vec![Ty::generic(root, vec![int.clone()])]);

        let class_id = class(&mut graph, "C", &[], None);
        graph.types[class_id].interfaces = vec![Ty::generic(left, vec![int.clone()]), Ty::simple(right)];

        let closed: Vec<Ty> = graph.closed_interfaces(class_id).into_iter().collect();
        assert_eq!(
            closed,
            vec![
                Ty::generic(left, vec![int.clone()]),
                Ty::simple(right),
                Ty::generic(root, vec![int]),
            ]
        );
    }

    #[test]
    fn test_reference_conversion_walks_bases() {
        let mut graph = TypeGraph::new(Interner::new());
        let animal = class(&mut graph, "Animal", &[], None);
        let dog = class(&mut graph, "Dog", &[], Some(Ty::simple(animal)));
        let object = Ty::simple(graph.builtins().object);
        let int = Ty::simple(graph.builtins().int);

        assert!(graph.has_reference_conversion(&Ty::simple(dog), &Ty::simple(animal)));
        assert!(graph.has_reference_conversion(&Ty::simple(dog), &object));
        assert!(!graph.has_reference_conversion(&Ty::simple(animal), &Ty::simple(dog)));
        assert!(!graph.has_reference_conversion(&int, &object));
    }
}
