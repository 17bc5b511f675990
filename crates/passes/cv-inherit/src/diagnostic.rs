//! Typed diagnostics produced by the member relationship passes
//!
//! A diagnostic is data: a kind with a fixed severity, the declaration it is
//! about, an optional related member and positional arguments. Rendering to
//! text happens only on request, against the graph the ids point into.

use cv_intern::Symbol;
use cv_model::{Accessibility, AccessorKind, MemberId, Ty, TypeGraph, TypeId};
use cv_span::FileSpan;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    /// Suspicious but valid
    Warning,
    /// The declaration is invalid
    Error,
}

/// Every condition the passes report
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
pub enum DiagnosticKind {
    // Override: no candidate or wrong kind
    /// Nothing inherited to override
    OverrideNotExpected,
    /// A method overrides a member of another kind
    CantOverrideNonFunction,
    /// A property or indexer overrides a member of another kind
    CantOverrideNonProperty,
    /// An event overrides a member of another kind
    CantOverrideNonEvent,
    // Override: policy
    /// The overridden member is not virtual, abstract or override
    CantOverrideNonVirtual,
    /// The overridden member, or one it overrides, is sealed
    CantOverrideSealed,
    // Override: shape
    /// Member or accessor accessibility differs from the overridden one
    CantChangeAccessOnOverride,
    /// A method override returns a different type
    CantChangeReturnTypeOnOverride,
    /// A property, indexer or event override has a different type
    CantChangeTypeOnOverride,
    /// Only one of the override and the overridden member returns by reference
    CantChangeRefReturnOnOverride,
    /// Candidates differ from the override only in ref, out or in
    CantChangeRefKindOnOverride,
    /// A covariant return the target runtime cannot represent
    RuntimeDoesNotSupportCovariantReturnsOfClasses,
    /// The override declares a get accessor with nothing to override
    NoGetToOverride,
    /// The override declares a set accessor with nothing to override
    NoSetToOverride,
    /// The override declares an add accessor with nothing to override
    NoAddToOverride,
    /// The override declares a remove accessor with nothing to override
    NoRemoveToOverride,
    /// A restated `class` clause the inherited constraints do not imply
    OverrideRefConstraintNotSatisfied,
    /// A restated `struct` clause the inherited constraints do not imply
    OverrideValConstraintNotSatisfied,
    /// An override restates a constraint other than `class` or `struct`
    OverrideWithConstraints,
    /// A constraint clause names a type parameter the method does not declare
    TyVarNotFoundInConstraint,
    /// Two constraint clauses for one type parameter
    DuplicateConstraintClause,
    // Override: ambiguity
    /// Several inherited members match the override exactly
    AmbigOverride,
    /// The overridden member has a twin differing only in ref versus out
    MultipleRuntimeOverrideMatches,
    // Hiding
    /// A class member hides an abstract member
    HidingAbstractMethod,
    /// A member hides a virtual member without `new` or `override`
    NewOrOverrideExpected,
    /// A member hides an inherited member without `new`
    NewRequired,
    /// A `new` member hides nothing
    NewNotRequired,
    // Interfaces
    /// An explicit implementation names an interface the type does not implement
    ClassDoesntImplementInterface,
    /// An explicit implementation matches no member of its interface
    InterfaceMemberNotFound,
    /// An explicit implementation lacks an accessor of the interface member
    ExplicitPropertyMissingAccessor,
    /// An explicit implementation has an accessor the interface member lacks
    ExplicitPropertyAddingAccessor,
    /// One explicit implementation matches several interface members
    ExplicitImplCollision,
    /// Two explicit implementations of one interface member
    DuplicateExplicitImpl,
    /// No member implements an interface member
    UnimplementedInterfaceMember,
    /// The closest candidate is static
    CloseUnimplementedInterfaceMemberStatic,
    /// The closest candidate or one of its accessors is not public
    CloseUnimplementedInterfaceMemberNotPublic,
    /// The closest candidate returns another type
    CloseUnimplementedInterfaceMemberWrongReturnType,
    /// The closest candidate differs in returning by reference
    CloseUnimplementedInterfaceMemberWrongRefReturn,
    /// An implementer's type parameter constraints differ from the interface member's
    ImplBadConstraints,
    /// Several members, or several collapsed slots, meet at one implementation
    MultipleRuntimeImplementationMatches,
    /// Two interface members differ only in ref versus out
    ExplicitImplCollisionOnRefOut,
    // Abstract obligations
    /// A concrete class leaves an inherited abstract member without an override
    UnimplementedAbstractMethod,
}

impl DiagnosticKind {
    /// Severity every diagnostic of this kind is reported with
    pub fn severity(self) -> Severity {
        match self {
            Self::MultipleRuntimeOverrideMatches
            | Self::NewOrOverrideExpected
            | Self::NewRequired
            | Self::NewNotRequired
            | Self::ExplicitImplCollision
            | Self::MultipleRuntimeImplementationMatches => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Accessor-missing kind for an override accessor
    pub fn no_accessor_to_override(accessor: AccessorKind) -> Self {
        match accessor {
            AccessorKind::Get => Self::NoGetToOverride,
            AccessorKind::Set => Self::NoSetToOverride,
            AccessorKind::Add => Self::NoAddToOverride,
            AccessorKind::Remove => Self::NoRemoveToOverride,
        }
    }

    /// Message with `{n}` placeholders for the positional arguments
    fn template(self) -> &'static str {
        match self {
            Self::OverrideNotExpected => "`{0}`: no suitable member found to override",
            Self::CantOverrideNonFunction => "`{0}`: cannot override because `{1}` is not a method",
            Self::CantOverrideNonProperty => "`{0}`: cannot override because `{1}` is not a property",
            Self::CantOverrideNonEvent => "`{0}`: cannot override because `{1}` is not an event",
            Self::CantOverrideNonVirtual => {
                "`{0}`: cannot override inherited member `{1}` because it is not virtual, abstract or override"
            }
            Self::CantOverrideSealed => "`{0}`: cannot override inherited member `{1}` because it is sealed",
            Self::CantChangeAccessOnOverride => {
                "`{0}`: cannot change access modifiers when overriding `{2}` inherited member `{1}`"
            }
            Self::CantChangeReturnTypeOnOverride => {
                "`{0}`: return type must be `{2}` to match overridden member `{1}`"
            }
            Self::CantChangeTypeOnOverride => "`{0}`: type must be `{2}` to match overridden member `{1}`",
            Self::CantChangeRefReturnOnOverride => {
                "`{0}` must match by reference return of overridden member `{1}`"
            }
            Self::CantChangeRefKindOnOverride => {
                "`{0}`: cannot change the ref kind of parameters when overriding `{1}`"
            }
            Self::RuntimeDoesNotSupportCovariantReturnsOfClasses => {
                "`{0}`: the target runtime does not support covariant return types in overrides; \
                 return type must be `{2}` to match overridden member `{1}`"
            }
            Self::NoGetToOverride => "`{0}`: cannot override because `{1}` does not have an overridable get accessor",
            Self::NoSetToOverride => "`{0}`: cannot override because `{1}` does not have an overridable set accessor",
            Self::NoAddToOverride => "`{0}`: cannot override because `{1}` does not have an overridable add accessor",
            Self::NoRemoveToOverride => {
                "`{0}`: cannot override because `{1}` does not have an overridable remove accessor"
            }
            Self::OverrideRefConstraintNotSatisfied => {
                "`{0}` specifies a `class` constraint for type parameter `{2}`, but the corresponding type \
                 parameter of overridden member `{1}` is not a reference type"
            }
            Self::OverrideValConstraintNotSatisfied => {
                "`{0}` specifies a `struct` constraint for type parameter `{2}`, but the corresponding type \
                 parameter of overridden member `{1}` is not a value type"
            }
            Self::OverrideWithConstraints => {
                "`{0}`: constraints of an override are inherited from the overridden member and cannot be restated"
            }
            Self::TyVarNotFoundInConstraint => "`{0}` does not define type parameter `{1}`",
            Self::DuplicateConstraintClause => {
                "`{0}`: a constraint clause has already been specified for type parameter `{1}`"
            }
            Self::AmbigOverride => {
                "`{0}`: the inherited members `{1}` and `{2}` have the same signature, so the override is ambiguous"
            }
            Self::MultipleRuntimeOverrideMatches => {
                "`{0}` overrides `{1}`, but `{2}` differs only by ref or out and may be chosen at run time"
            }
            Self::HidingAbstractMethod => "`{0}` hides inherited abstract member `{1}`",
            Self::NewOrOverrideExpected => {
                "`{0}` hides inherited member `{1}`; add `override` to override it or `new` to hide it"
            }
            Self::NewRequired => "`{0}` hides inherited member `{1}`; use `new` if hiding was intended",
            Self::NewNotRequired => "`{0}` does not hide an accessible member, so `new` is not required",
            Self::ClassDoesntImplementInterface => "`{0}`: containing type does not implement interface `{1}`",
            Self::InterfaceMemberNotFound => {
                "`{0}` in explicit interface declaration is not a member of interface `{1}`"
            }
            Self::ExplicitPropertyMissingAccessor => {
                "`{0}` does not implement interface member `{1}`: the `{2}` accessor is missing"
            }
            Self::ExplicitPropertyAddingAccessor => {
                "`{0}` adds a `{2}` accessor not found in interface member `{1}`"
            }
            Self::ExplicitImplCollision => {
                "explicit implementation `{0}` matches more than one interface member: `{1}` and `{2}`"
            }
            Self::DuplicateExplicitImpl => "`{0}`: `{1}` is already explicitly implemented",
            Self::UnimplementedInterfaceMember => "`{0}` does not implement interface member `{1}`",
            Self::CloseUnimplementedInterfaceMemberStatic => {
                "`{0}` does not implement interface member `{1}`: `{2}` is static"
            }
            Self::CloseUnimplementedInterfaceMemberNotPublic => {
                "`{0}` does not implement interface member `{1}`: `{2}` is not public"
            }
            Self::CloseUnimplementedInterfaceMemberWrongReturnType => {
                "`{0}` does not implement interface member `{1}`: `{2}` does not return `{3}`"
            }
            Self::CloseUnimplementedInterfaceMemberWrongRefReturn => {
                "`{0}` does not implement interface member `{1}`: `{2}` does not match its return by reference"
            }
            Self::ImplBadConstraints => {
                "the type parameter constraints of `{0}` must match those of interface member `{1}`"
            }
            Self::MultipleRuntimeImplementationMatches => {
                "`{1}` implements interface member `{2}` in type `{0}`, but several members match it at run time"
            }
            Self::ExplicitImplCollisionOnRefOut => {
                "interface `{0}` has members `{1}` and `{2}` that differ only by ref and out; \
                 they can only be implemented explicitly"
            }
            Self::UnimplementedAbstractMethod => "`{0}` does not implement inherited abstract member `{1}`",
        }
    }
}

/// What a diagnostic is reported against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    /// A member declaration
    Member(MemberId),
    /// A type declaration
    Type(TypeId),
}

/// A positional diagnostic argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticArg {
    /// A member, seen through a closed owner when `view` is set
    Member {
        /// Member id
        id: MemberId,
        /// Closed owner reference
        view: Option<Ty>,
    },
    /// A type
    Type(Ty),
    /// An accessor kind
    Accessor(AccessorKind),
    /// An accessibility
    Access(Accessibility),
    /// A bare name
    Name(Symbol),
}

impl DiagnosticArg {
    /// A member as declared
    pub fn member(id: MemberId) -> Self {
        Self::Member { id, view: None }
    }

    /// A member seen through `view`
    pub fn member_in(id: MemberId, view: &Ty) -> Self {
        Self::Member {
            id,
            view: Some(view.clone()),
        }
    }

    fn render(&self, graph: &TypeGraph) -> String {
        match self {
            Self::Member { id, view } => graph.display_member(*id, view.as_ref()).to_string(),
            Self::Type(ty) => graph.display_ty(ty).to_string(),
            Self::Accessor(kind) => kind.as_str().to_owned(),
            Self::Access(access) => access.as_str().to_owned(),
            Self::Name(symbol) => graph.name(*symbol).to_owned(),
        }
    }
}

/// A reported condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// What was found
    pub kind: DiagnosticKind,
    /// Severity, initially the kind's own
    pub severity: Severity,
    /// Declaration the diagnostic is about
    pub subject: Subject,
    /// Location of the subject
    pub span: FileSpan,
    /// Member the subject relates to (overridden, hidden, implemented)
    pub related: Option<MemberId>,
    /// Positional message arguments
    pub args: Vec<DiagnosticArg>,
}

impl Diagnostic {
    /// Diagnostic with no arguments yet
    pub fn new(kind: DiagnosticKind, subject: Subject, span: FileSpan) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            subject,
            span,
            related: None,
            args: Vec::new(),
        }
    }

    /// Diagnostic about a member; its rendering is the first argument
    pub fn on_member(graph: &TypeGraph, kind: DiagnosticKind, member: MemberId) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            subject: Subject::Member(member),
            span: graph.member(member).span,
            related: None,
            args: vec![DiagnosticArg::member(member)],
        }
    }

    /// Diagnostic about a type; its rendering is the first argument
    pub fn on_type(graph: &TypeGraph, kind: DiagnosticKind, ty: TypeId) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            subject: Subject::Type(ty),
            span: graph.ty(ty).span,
            related: None,
            args: vec![DiagnosticArg::Type(graph.self_ty(ty))],
        }
    }

    /// Attach the member the subject relates to
    #[must_use]
    pub fn with_related(mut self, member: MemberId) -> Self {
        self.related = Some(member);
        self
    }

    /// Append a positional message argument
    #[must_use]
    pub fn with_arg(mut self, arg: DiagnosticArg) -> Self {
        self.args.push(arg);
        self
    }

    /// Whether the diagnostic is reported as an error
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Render the message text
    pub fn message(&self, graph: &TypeGraph) -> String {
        let template = self.kind.template();
        let mut message = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            message.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                message.push_str(&rest[open..]);
                rest = "";
                break;
            };
            match after[..close].parse::<usize>() {
                Ok(index) => match self.args.get(index) {
                    Some(arg) => message.push_str(&arg.render(graph)),
                    None => message.push('?'),
                },
                Err(_) => message.push_str(&rest[open..=open + close + 1]),
            }
            rest = &after[close + 1..];
        }
        message.push_str(rest);
        message
    }
}

/// Append-only diagnostic collector for one type
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    /// Empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a diagnostic
    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Diagnostics reported so far
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Whether an error has been reported
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Take all diagnostics
    pub fn take_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_decl::load_str;
    use cv_span::FileId;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_every_kind_has_a_template() {
        for kind in DiagnosticKind::iter() {
            assert!(kind.template().contains("{0}"), "{kind} does not mention its subject");
        }
    }

    #[test]
    fn test_kind_names_round_trip_through_strum() {
        assert_eq!(DiagnosticKind::AmbigOverride.to_string(), "AmbigOverride");
        assert_eq!(
            DiagnosticKind::from_str("NewRequired").ok(),
            Some(DiagnosticKind::NewRequired)
        );
        assert_eq!(DiagnosticKind::NewRequired.severity(), Severity::Warning);
        assert_eq!(DiagnosticKind::CantOverrideSealed.severity(), Severity::Error);
    }

    #[test]
    fn test_message_renders_arguments() {
        let decls = load_str(
            r#"
            [[type]]
            name = "Base"
            [[type.member]]
            name = "M"
            returns = "string"
            modifiers = ["virtual"]
            "#,
            FileId::new(0),
        )
        .unwrap();
        let graph = &decls.graph;
        let base = graph.lookup("Base", 0).unwrap();
        let member = graph.ty(base).members[0];
        let diagnostic = Diagnostic::on_member(graph, DiagnosticKind::CantChangeReturnTypeOnOverride, member)
            .with_related(member)
            .with_arg(DiagnosticArg::member(member))
            .with_arg(DiagnosticArg::Type(Ty::simple(graph.builtins().string)));
        assert_eq!(
            diagnostic.message(graph),
            "`Base.M()`: return type must be `string` to match overridden member `Base.M()`"
        );

        let missing = Diagnostic::on_type(graph, DiagnosticKind::UnimplementedInterfaceMember, base);
        assert_eq!(missing.message(graph), "`Base` does not implement interface member `?`");
    }
}
