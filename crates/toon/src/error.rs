use thiserror::Error;

pub type Result<T> = std::result::Result<T, ToonError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToonError {
    #[error("line {line}: row has {found} fields, header declares {expected}")]
    ColumnCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: unterminated quoted string")]
    UnterminatedQuote { line: usize },

    #[error("line {line}: array declares {expected} items, found {found}")]
    LengthMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: indentation must be a multiple of two spaces")]
    Indentation { line: usize },

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
}

impl ToonError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }
}
