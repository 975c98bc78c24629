use miette::SourceSpan;
use thiserror::Error;

/// What went wrong on a line of a listing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListingErrorKind {
    #[error("invalid syntax")]
    Syntax,

    #[error("unknown instruction `{0}`")]
    UnknownMnemonic(String),

    #[error("unknown directive `.{0}`")]
    UnknownDirective(String),

    #[error("`{name}` expects {expected} argument(s), found {found}")]
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("expected {expected}")]
    InvalidArgument { expected: &'static str },

    #[error("data address {0} out of range")]
    DataAddressOutOfRange(i32),
}

/// An error in a listing, pointing at the faulty part of the source
#[derive(Debug, Clone, PartialEq, Eq, Error, miette::Diagnostic)]
#[error("invalid program on line {line}: {kind}")]
pub struct ListingError {
    /// Line number, starting from 1
    pub line: usize,

    #[label("{kind}")]
    pub span: SourceSpan,

    pub kind: ListingErrorKind,
}
