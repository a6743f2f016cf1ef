use thiserror::Error;

use crate::lexer;

// Represents an error that happened during the lexing process
#[derive(Debug, Error)]
pub(crate) enum LexingError {
    #[error("unexpected character '{0}' while {1}")]
    UnexpectedChar(char, &'static str, lexer::TokenInfo),
    #[error("unexpected end of input while {0}")]
    UnexpectedEOF(String, lexer::TokenInfo),
    #[error("unbalanced '}}' in quoted string")]
    UnbalancedBrace(lexer::TokenInfo),
}

impl LexingError {
    pub(crate) fn info(&self) -> &lexer::TokenInfo {
        match self {
            Self::UnexpectedChar(_, _, info) => info,
            Self::UnexpectedEOF(_, info) => info,
            Self::UnbalancedBrace(info) => info,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// a character which cannot appear at this point of the grammar
    UnexpectedChar,
    /// input ended inside an entry, a string or a braced group
    UnexpectedEOF,
    /// a closing brace without an opening one
    UnbalancedBrace,
}

/// Malformed source text. Carries a human-readable description, the
/// label of the source it was found in and a best-effort position.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{source_label}:{line}:{column}: {message}")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub message: String,
    pub source_label: String,
    /// 1-based line number
    pub line: usize,
    /// 1-based column number
    pub column: usize,
    /// the offending line of source text, if any
    pub source_line: Option<String>,
}

impl SyntaxError {
    pub(crate) fn from_lexing(err: LexingError, src: &str, source_label: &str) -> SyntaxError {
        let kind = match err {
            LexingError::UnexpectedChar(..) => SyntaxErrorKind::UnexpectedChar,
            LexingError::UnexpectedEOF(..) => SyntaxErrorKind::UnexpectedEOF,
            LexingError::UnbalancedBrace(..) => SyntaxErrorKind::UnbalancedBrace,
        };
        let info = err.info();
        let mut message = err.to_string();
        if let Some(key) = &info.current_key {
            message.push_str(&format!(" in entry '{}'", key));
        }
        SyntaxError {
            kind,
            message,
            source_label: source_label.to_string(),
            line: info.lineno + 1,
            column: info.colno + 1,
            source_line: src
                .lines()
                .nth(info.lineno)
                .filter(|line| !line.trim().is_empty())
                .map(str::to_string),
        }
    }
}

/// Misuse of the direct macro definition API
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MacroError {
    #[error("attempt to define macro with empty name ({source_label}, line {line})")]
    EmptyName { source_label: String, line: usize },
    #[error("overriding existing definition of macro \"{name}\" ({source_label}, line {line})")]
    AlreadyDefined {
        name: String,
        source_label: String,
        line: usize,
    },
}
