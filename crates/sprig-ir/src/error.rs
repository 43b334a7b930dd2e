//! Error types for parsing, registration and verification.

use derive_more::Display;

use crate::location::Span;

pub type IrResult<T> = Result<T, IrError>;

/// An error raised anywhere in the text format pipeline.
///
/// Every error names the offending token, value or mnemonic in its message
/// and carries the source span when one is known.
#[derive(Clone, Display, Debug, PartialEq)]
#[display("{kind}")]
pub struct IrError {
    kind: Box<IrErrorKind>,
    span: Option<Span>,
}

impl From<IrErrorKind> for IrError {
    fn from(kind: IrErrorKind) -> Self {
        IrError {
            kind: Box::new(kind),
            span: None,
        }
    }
}

impl IrError {
    pub fn kind(&self) -> &IrErrorKind {
        &self.kind
    }

    pub fn span(&self) -> Option<Span> {
        self.span
    }

    /// Attach a span unless one is already present.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span.get_or_insert(span);
        self
    }

    pub fn lex(message: impl std::fmt::Display, span: Span) -> Self {
        IrError::from(IrErrorKind::Lex {
            message: message.to_string(),
        })
        .with_span(span)
    }

    pub fn unexpected(
        expected: impl std::fmt::Display,
        found: impl std::fmt::Display,
        span: Span,
    ) -> Self {
        IrError::from(IrErrorKind::UnexpectedToken {
            expected: expected.to_string(),
            found: found.to_string(),
        })
        .with_span(span)
    }

    pub fn unknown_operation(name: impl std::fmt::Display, span: Span) -> Self {
        IrError::from(IrErrorKind::UnknownOperation {
            name: name.to_string(),
        })
        .with_span(span)
    }

    pub fn unknown_type(name: impl std::fmt::Display, span: Span) -> Self {
        IrError::from(IrErrorKind::UnknownType {
            name: name.to_string(),
        })
        .with_span(span)
    }

    pub fn undefined_value(name: impl std::fmt::Display, span: Span) -> Self {
        IrError::from(IrErrorKind::UndefinedValue {
            name: name.to_string(),
        })
        .with_span(span)
    }

    pub fn redefinition(name: impl std::fmt::Display, span: Span) -> Self {
        IrError::from(IrErrorKind::Redefinition {
            name: name.to_string(),
        })
        .with_span(span)
    }

    pub fn type_mismatch(
        subject: impl std::fmt::Display,
        expected: impl std::fmt::Display,
        found: impl std::fmt::Display,
    ) -> Self {
        IrErrorKind::TypeMismatch {
            subject: subject.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
        .into()
    }

    pub fn duplicate_registration(name: impl std::fmt::Display) -> Self {
        IrErrorKind::DuplicateRegistration {
            name: name.to_string(),
        }
        .into()
    }

    pub fn verification(op: impl std::fmt::Display, message: impl std::fmt::Display) -> Self {
        IrErrorKind::Verification {
            op: op.to_string(),
            message: message.to_string(),
        }
        .into()
    }

    pub fn is_lex(&self) -> bool {
        matches!(*self.kind, IrErrorKind::Lex { .. })
    }

    pub fn is_unexpected_token(&self) -> bool {
        matches!(*self.kind, IrErrorKind::UnexpectedToken { .. })
    }

    pub fn is_unknown_operation(&self) -> bool {
        matches!(*self.kind, IrErrorKind::UnknownOperation { .. })
    }

    pub fn is_undefined_value(&self) -> bool {
        matches!(*self.kind, IrErrorKind::UndefinedValue { .. })
    }

    pub fn is_redefinition(&self) -> bool {
        matches!(*self.kind, IrErrorKind::Redefinition { .. })
    }

    pub fn is_type_mismatch(&self) -> bool {
        matches!(*self.kind, IrErrorKind::TypeMismatch { .. })
    }

    pub fn is_verification(&self) -> bool {
        matches!(*self.kind, IrErrorKind::Verification { .. })
    }
}

#[derive(Clone, Display, Debug, PartialEq)]
pub enum IrErrorKind {
    #[display("malformed token: {message}")]
    Lex { message: String },

    #[display("expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[display("unknown operation '{name}'")]
    UnknownOperation { name: String },

    #[display("unknown type '!{name}'")]
    UnknownType { name: String },

    #[display("undefined value '%{name}'")]
    UndefinedValue { name: String },

    #[display("redefinition of '{name}'")]
    Redefinition { name: String },

    #[display("type mismatch for {subject}: expected {expected}, found {found}")]
    TypeMismatch {
        subject: String,
        expected: String,
        found: String,
    },

    #[display("'{name}' is already registered")]
    DuplicateRegistration { name: String },

    #[display("'{op}' failed to verify: {message}")]
    Verification { op: String, message: String },
}

impl std::error::Error for IrError {}
