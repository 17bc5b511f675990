//! Declaration loading errors

use cv_span::FileSpan;
use thiserror::Error;

/// Error raised while binding a declaration file into a type graph
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeclError {
    /// The file is not valid TOML or does not match the schema
    #[error("invalid declaration file: {message}")]
    Syntax {
        /// Message from the TOML parser
        message: String,
        /// Location, when the parser reports one
        span: Option<FileSpan>,
    },

    /// Two types share a name and arity
    #[error("type `{name}` is declared more than once")]
    DuplicateType {
        /// Name with arity, as written
        name: String,
        /// Second declaration
        span: FileSpan,
    },

    /// A type expression names nothing in scope
    #[error("unknown type `{name}` with {arity} type argument(s)")]
    UnknownType {
        /// Name as written
        name: String,
        /// Number of type arguments given
        arity: usize,
        /// Declaration containing the expression
        span: FileSpan,
    },

    /// A type expression does not parse
    #[error("malformed type expression `{text}`: {message}")]
    TypeSyntax {
        /// Expression as written
        text: String,
        /// What went wrong
        message: String,
        /// Declaration containing the expression
        span: FileSpan,
    },

    /// A keyword that is not valid where it was written
    #[error("unknown {what} `{text}`")]
    UnknownKeyword {
        /// Which list the keyword belongs to (`modifier`, `accessibility`, ...)
        what: &'static str,
        /// The keyword as written
        text: String,
        /// Declaration containing the keyword
        span: FileSpan,
    },

    /// A base class that is not a class
    #[error("`{name}` cannot be used as a base class")]
    InvalidBase {
        /// Base as written
        name: String,
        /// Deriving type
        span: FileSpan,
    },

    /// An interface list entry that is not an interface
    #[error("`{name}` is not an interface")]
    NotAnInterface {
        /// Entry as written
        name: String,
        /// Implementing type
        span: FileSpan,
    },

    /// A type inherits from itself
    #[error("circular base dependency involving `{name}`")]
    CyclicInheritance {
        /// A type on the cycle
        name: String,
        /// Its declaration
        span: FileSpan,
    },

    /// A property, indexer, event or field without a type
    #[error("{kind} `{name}` needs a type")]
    MissingType {
        /// Member kind
        kind: &'static str,
        /// Member name
        name: String,
        /// Member declaration
        span: FileSpan,
    },

    /// A member without a name
    #[error("a {kind} of `{owner}` needs a name")]
    MissingName {
        /// Member kind
        kind: &'static str,
        /// Owning type
        owner: String,
        /// Owning type declaration
        span: FileSpan,
    },
}

impl DeclError {
    /// Location of the offending declaration, when known
    pub fn span(&self) -> Option<FileSpan> {
        match self {
            Self::Syntax { span, .. } => *span,
            Self::DuplicateType { span, .. }
            | Self::UnknownType { span, .. }
            | Self::TypeSyntax { span, .. }
            | Self::UnknownKeyword { span, .. }
            | Self::InvalidBase { span, .. }
            | Self::NotAnInterface { span, .. }
            | Self::CyclicInheritance { span, .. }
            | Self::MissingType { span, .. }
            | Self::MissingName { span, .. } => Some(*span),
        }
    }
}
