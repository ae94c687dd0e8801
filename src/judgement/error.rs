use thiserror::Error;

use crate::source::{Span, Spanned};

/// Errors raised while turning characters into tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("Unrecognized character: '{ch}'")]
    UnrecognizedCharacter { ch: char, span: Span },

    #[error("Identifiers cannot start with a digit")]
    DigitLedIdentifier { span: Span },

    #[error("Malformed arrow: expected '>' after '-'")]
    MalformedArrow { span: Span },

    #[error("Stray '>' without a preceding '-'")]
    StrayArrowHead { span: Span },
}

impl Spanned for LexError {
    fn span(&self) -> Span {
        match self {
            LexError::UnrecognizedCharacter { span, .. }
            | LexError::DigitLedIdentifier { span }
            | LexError::MalformedArrow { span }
            | LexError::StrayArrowHead { span } => *span,
        }
    }
}

/// Errors raised by the recursive-descent grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("Expected variable")]
    ExpectedVariable { span: Span },

    #[error("Expected '^' after the lambda variable")]
    ExpectedTypeMarker { span: Span },

    #[error("No open bracket to close")]
    BracketUnderflow { span: Span },

    #[error("Expected closing bracket")]
    UnclosedBracket { span: Span },

    #[error("Expected judgement separator ':'")]
    MissingJudgementSeparator { span: Span },

    #[error("Doubled judgement separator ':'")]
    DoubledJudgementSeparator { span: Span },

    #[error("Expected non-empty expression")]
    EmptyExpression { span: Span },

    #[error("Type expression cannot be empty")]
    EmptyTypeExpression { span: Span },

    #[error("Expected '->' between type variables")]
    ExpectedArrow { span: Span },

    #[error("Type variable '{name}' cannot appear in a term")]
    TypeVarInTerm { name: String, span: Span },

    #[error("Term variable '{name}' cannot appear in a type")]
    TermVarInType { name: String, span: Span },

    #[error("Lambda cannot appear in a type")]
    LambdaInType { span: Span },

    #[error("Expected type variable")]
    ExpectedTypeVariable { span: Span },

    #[error("Unexpected '{token}' after the type expression")]
    TrailingToken { token: String, span: Span },

    #[error("Unexpected '{token}'")]
    UnexpectedToken { token: String, span: Span },

    #[error("Expression nesting too deep")]
    NestingTooDeep { span: Span },
}

impl Spanned for SyntaxError {
    fn span(&self) -> Span {
        match self {
            SyntaxError::Lex(err) => err.span(),
            SyntaxError::ExpectedVariable { span }
            | SyntaxError::ExpectedTypeMarker { span }
            | SyntaxError::BracketUnderflow { span }
            | SyntaxError::UnclosedBracket { span }
            | SyntaxError::MissingJudgementSeparator { span }
            | SyntaxError::DoubledJudgementSeparator { span }
            | SyntaxError::EmptyExpression { span }
            | SyntaxError::EmptyTypeExpression { span }
            | SyntaxError::ExpectedArrow { span }
            | SyntaxError::TypeVarInTerm { span, .. }
            | SyntaxError::TermVarInType { span, .. }
            | SyntaxError::LambdaInType { span }
            | SyntaxError::ExpectedTypeVariable { span }
            | SyntaxError::TrailingToken { span, .. }
            | SyntaxError::UnexpectedToken { span, .. }
            | SyntaxError::NestingTooDeep { span } => *span,
        }
    }
}

/// Errors raised by the structural typing rules. These operate on rendered
/// text, so they carry the offending text instead of a source span.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("Variable not in context: {name}")]
    VariableNotInContext { name: String },

    #[error("'{function}' should be a function type")]
    NotAFunction { function: String },

    #[error("Codomain of '{function}' does not match type of '{argument}'")]
    DomainMismatch { function: String, argument: String },

    #[error("Type inference nesting too deep")]
    NestingTooDeep,
}

/// Any error a single judgement line can produce.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JudgementError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Type(#[from] TypeError),
}

impl JudgementError {
    /// Short category tag, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            JudgementError::Syntax(SyntaxError::Lex(_)) => "lexical",
            JudgementError::Syntax(_) => "syntax",
            JudgementError::Type(_) => "type",
        }
    }

    /// The span within the line, when the error carries one.
    pub fn span(&self) -> Option<Span> {
        match self {
            JudgementError::Syntax(err) => Some(err.span()),
            JudgementError::Type(_) => None,
        }
    }
}
