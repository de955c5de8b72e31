use thiserror::Error;

use crate::parser::TokenKind;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Syntax {
    #[error("expected a number, an argument, a prefix operator or an opening parenthesis")]
    ExpectedOperand,
    #[error("expected a binary operator, a postfix operator or a closing parenthesis")]
    ExpectedOperator,
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("closing parenthesis without a matching opening one")]
    UnmatchedClosing,
    #[error("opening parenthesis is never closed")]
    UnclosedOpening,
    #[error("malformed number")]
    MalformedNumber,
    #[error("empty expression")]
    Empty,
}

/// Broken pipeline invariants. These are bugs, not bad input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Defect {
    #[error("{kind:?} operator `{signature}` is not registered in the grammar")]
    UnknownSignature { kind: TokenKind, signature: String },
    #[error("structural token {0:?} reached the unit compiler")]
    StructuralToken(TokenKind),
    #[error("unit {unit} pops from an empty stack")]
    StackUnderflow { unit: usize },
    #[error("program leaves {depth} values on the stack instead of one")]
    UnbalancedProgram { depth: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("invalid expression syntax: {kind} at position {position}, near `{remainder}`")]
    Syntax {
        kind: Syntax,
        position: usize,
        remainder: String,
    },
    #[error("missing argument: {0}")]
    MissingArgument(String),
    #[error("internal error: {0}")]
    Defect(#[from] Defect),
}

impl Error {
    pub(crate) fn syntax(kind: Syntax, text: &str, position: usize) -> Self {
        Error::Syntax {
            kind,
            position,
            remainder: text.get(position..).unwrap_or_default().to_owned(),
        }
    }

    pub fn as_syntax(&self) -> Option<Syntax> {
        match self {
            Error::Syntax { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
