//! Error types for all compilation phases.

use crate::span::Span;
use thiserror::Error;

/// Lexer errors.
#[derive(Debug, Error)]
pub enum LexerError {
    #[error("Unexpected character '{0}' at {1}")]
    UnexpectedChar(char, Span),

    #[error("Unterminated string at {0}")]
    UnterminatedString(Span),

    #[error("Unterminated comment at {0}")]
    UnterminatedComment(Span),

    #[error("Invalid number '{0}' at {1}")]
    InvalidNumber(String, Span),
}

impl LexerError {
    pub fn unexpected_char(c: char, span: Span) -> Self {
        Self::UnexpectedChar(c, span)
    }

    pub fn unterminated_string(span: Span) -> Self {
        Self::UnterminatedString(span)
    }

    pub fn unterminated_comment(span: Span) -> Self {
        Self::UnterminatedComment(span)
    }

    pub fn invalid_number(s: String, span: Span) -> Self {
        Self::InvalidNumber(s, span)
    }

    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedChar(_, span) => *span,
            Self::UnterminatedString(span) => *span,
            Self::UnterminatedComment(span) => *span,
            Self::InvalidNumber(_, span) => *span,
        }
    }
}

/// Parser errors.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("Unexpected '{found}', expected {expected} at {span}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("Unexpected end of file at {0}")]
    UnexpectedEof(Span),

    #[error("Invalid assignment target at {0}")]
    InvalidAssignmentTarget(Span),

    #[error("{message} at {span}")]
    General { message: String, span: Span },
}

impl ParserError {
    pub fn unexpected_token(
        expected: impl Into<String>,
        found: impl Into<String>,
        span: Span,
    ) -> Self {
        Self::UnexpectedToken {
            expected: expected.into(),
            found: found.into(),
            span,
        }
    }

    pub fn unexpected_eof(span: Span) -> Self {
        Self::UnexpectedEof(span)
    }

    pub fn invalid_assignment_target(span: Span) -> Self {
        Self::InvalidAssignmentTarget(span)
    }

    pub fn general(message: impl Into<String>, span: Span) -> Self {
        Self::General {
            message: message.into(),
            span,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedToken { span, .. } => *span,
            Self::UnexpectedEof(span) => *span,
            Self::InvalidAssignmentTarget(span) => *span,
            Self::General { span, .. } => *span,
        }
    }
}

impl From<LexerError> for ParserError {
    fn from(err: LexerError) -> Self {
        Self::General {
            message: err.to_string(),
            span: err.span(),
        }
    }
}

/// Compiler defects: the resolver or emitter lost track of something it
/// should have known about. Never caused by a well-formed program alone.
#[derive(Debug, Error)]
pub enum InternalError {
    #[error("Moral panic: could not find variable '{name}' at {span}")]
    UnknownVariable { name: String, span: Span },

    #[error("Variable '{name}' belongs to unit '{declared_in}' but was used from '{used_in}' at {span}")]
    SlotUnitMismatch {
        name: String,
        declared_in: String,
        used_in: String,
        span: Span,
    },

    #[error("Too many variables in unit '{unit}' at {span}")]
    TooManySlots { unit: String, span: Span },
}

impl InternalError {
    pub fn span(&self) -> Span {
        match self {
            Self::UnknownVariable { span, .. } => *span,
            Self::SlotUnitMismatch { span, .. } => *span,
            Self::TooManySlots { span, .. } => *span,
        }
    }
}

/// Bytecode compilation errors.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("No good: unassociated pronoun '{pronoun}' at {span}")]
    UnassociatedPronoun { pronoun: String, span: Span },

    #[error("Nothing to cast into at {0}")]
    CastIntoNothing(Span),

    #[error("Cannot cut without a variable at {0}")]
    CutWithoutVariable(Span),

    #[error("Nothing to join into at {0}")]
    JoinWithoutVariable(Span),

    #[error("{message} at {span}")]
    UnsupportedOperation { message: String, span: Span },

    #[error("Too many constants in one unit at {0}")]
    TooManyConstants(Span),

    #[error("Jump too far to encode at line {line}")]
    JumpTooFar { line: usize },

    #[error("Internal error: {0}")]
    Internal(#[from] InternalError),
}

impl CompileError {
    pub fn unassociated_pronoun(pronoun: impl Into<String>, span: Span) -> Self {
        Self::UnassociatedPronoun {
            pronoun: pronoun.into(),
            span,
        }
    }

    pub fn unsupported_operation(message: impl Into<String>, span: Span) -> Self {
        Self::UnsupportedOperation {
            message: message.into(),
            span,
        }
    }

    pub fn unknown_variable(name: impl Into<String>, span: Span) -> Self {
        Self::Internal(InternalError::UnknownVariable {
            name: name.into(),
            span,
        })
    }

    /// True for compiler defects, false for errors in the program being compiled.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }

    pub fn span(&self) -> Span {
        match self {
            Self::UnassociatedPronoun { span, .. } => *span,
            Self::CastIntoNothing(span) => *span,
            Self::CutWithoutVariable(span) => *span,
            Self::JoinWithoutVariable(span) => *span,
            Self::UnsupportedOperation { span, .. } => *span,
            Self::TooManyConstants(span) => *span,
            Self::JumpTooFar { line } => Span {
                line: *line,
                ..Span::default()
            },
            Self::Internal(err) => err.span(),
        }
    }
}

/// Runtime errors.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("{message} at {span}")]
    UnsupportedOperation { message: String, span: Span },

    #[error("Division by zero at {0}")]
    DivisionByZero(Span),

    #[error("Cannot call {value_type} at {span}")]
    NotCallable { value_type: String, span: Span },

    #[error("Wrong number of arguments: expected {expected}, got {got} at {span}")]
    WrongArity {
        expected: usize,
        got: usize,
        span: Span,
    },

    #[error("Cannot cast {message} at {span}")]
    InvalidCast { message: String, span: Span },

    #[error("No, we can't join that. ({value_type} at {span})")]
    NotAnArray { value_type: String, span: Span },

    #[error("Cannot index {value_type} at {span}")]
    CannotIndex { value_type: String, span: Span },

    #[error("Array index {index} is too large at {span}")]
    IndexTooLarge { index: String, span: Span },

    #[error("Cannot compare {left} and {right} at {span}")]
    CannotCompare {
        left: String,
        right: String,
        span: Span,
    },

    #[error("Cannot round {value_type} at {span}")]
    CannotRound { value_type: String, span: Span },

    #[error("Stack overflow: call depth exceeded {depth} at {span}")]
    StackOverflow { depth: usize, span: Span },
}

impl RuntimeError {
    pub fn unsupported_operation(message: impl Into<String>, span: Span) -> Self {
        Self::UnsupportedOperation {
            message: message.into(),
            span,
        }
    }

    pub fn division_by_zero(span: Span) -> Self {
        Self::DivisionByZero(span)
    }

    pub fn not_callable(value_type: impl Into<String>, span: Span) -> Self {
        Self::NotCallable {
            value_type: value_type.into(),
            span,
        }
    }

    pub fn wrong_arity(expected: usize, got: usize, span: Span) -> Self {
        Self::WrongArity {
            expected,
            got,
            span,
        }
    }

    pub fn invalid_cast(message: impl Into<String>, span: Span) -> Self {
        Self::InvalidCast {
            message: message.into(),
            span,
        }
    }

    pub fn not_an_array(value_type: impl Into<String>, span: Span) -> Self {
        Self::NotAnArray {
            value_type: value_type.into(),
            span,
        }
    }

    pub fn cannot_index(value_type: impl Into<String>, span: Span) -> Self {
        Self::CannotIndex {
            value_type: value_type.into(),
            span,
        }
    }

    pub fn cannot_compare(left: impl Into<String>, right: impl Into<String>, span: Span) -> Self {
        Self::CannotCompare {
            left: left.into(),
            right: right.into(),
            span,
        }
    }

    pub fn cannot_round(value_type: impl Into<String>, span: Span) -> Self {
        Self::CannotRound {
            value_type: value_type.into(),
            span,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::UnsupportedOperation { span, .. } => *span,
            Self::DivisionByZero(span) => *span,
            Self::NotCallable { span, .. } => *span,
            Self::WrongArity { span, .. } => *span,
            Self::InvalidCast { span, .. } => *span,
            Self::NotAnArray { span, .. } => *span,
            Self::CannotIndex { span, .. } => *span,
            Self::IndexTooLarge { span, .. } => *span,
            Self::CannotCompare { span, .. } => *span,
            Self::CannotRound { span, .. } => *span,
            Self::StackOverflow { span, .. } => *span,
        }
    }
}

/// Unified error type for the whole pipeline.
#[derive(Debug, Error)]
pub enum BonjovaError {
    #[error("Lexer error: {0}")]
    Lexer(#[from] LexerError),

    #[error("Parser error: {0}")]
    Parser(#[from] ParserError),

    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_errors_are_distinguished() {
        let span = Span::new(0, 3, 2, 1);
        let internal = CompileError::unknown_variable("my heart", span);
        let program = CompileError::unassociated_pronoun("it", span);
        assert!(internal.is_internal());
        assert!(!program.is_internal());
        assert_eq!(internal.span(), span);
    }

    #[test]
    fn test_error_messages_name_the_construct() {
        let span = Span::new(0, 1, 4, 7);
        let err = CompileError::CastIntoNothing(span);
        assert_eq!(err.to_string(), "Nothing to cast into at line 4, column 7");
        let err = RuntimeError::not_an_array("String", span);
        assert!(err.to_string().starts_with("No, we can't join that."));
    }
}
