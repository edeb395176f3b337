//! Parse errors.

use thiserror::Error;

/// What went wrong, independent of where.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unclosed action")]
    UnclosedAction,
    #[error("unclosed comment")]
    UnclosedComment,
    #[error("unexpected {0:?} in action")]
    UnexpectedChar(char),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("invalid escape sequence {0:?} in string literal")]
    InvalidEscape(String),
    #[error("malformed number {0:?}")]
    BadNumber(String),
    #[error("unexpected {found} in {context}")]
    Unexpected { found: String, context: &'static str },
    #[error("missing command in pipeline")]
    MissingCommand,
    #[error("too many declarations in {0}")]
    TooManyDecls(&'static str),
    #[error("unexpected {{{{end}}}}")]
    UnexpectedEnd,
    #[error("unexpected {{{{else}}}}")]
    UnexpectedElse,
    #[error("unexpected EOF: missing {{{{end}}}} for {0}")]
    MissingEnd(&'static str),
    #[error("{{{{define}}}} is only allowed at the top level")]
    NestedDefine,
    #[error("{0} is not supported")]
    Unsupported(&'static str),
}

/// A parse failure with its source position.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{line}:{column}: {kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Byte offset into the source.
    pub offset: usize,
    /// 1-based line.
    pub line: usize,
    /// 1-based column, in characters.
    pub column: usize,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, src: &str, offset: usize) -> Self {
        let offset = offset.min(src.len());
        let before = src.get(..offset).unwrap_or(src);
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        ParseError {
            kind,
            offset,
            line,
            column,
        }
    }
}
