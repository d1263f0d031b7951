//! Error types for aidx

use std::fmt;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Position in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

/// Span representing a range in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub const fn at(pos: Pos) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub const fn empty() -> Self {
        Self {
            start: Pos::new(0, 0, 0),
            end: Pos::new(0, 0, 0),
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.start.line == 0
    }
}

/// Error kind for detailed categorization
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input text was empty or whitespace only
    EmptyInput,
    /// Malformed XML
    Syntax,
    /// Element nesting deeper than the configured limit
    MaxDepthExceeded { max: u16 },
    NotFound,
    NotAFile,
    PermissionDenied,
    /// File bytes are not valid UTF-8
    Encoding,
    /// Any other I/O failure while reading input
    Io,
    /// A value could not be rendered as, or read back from, JSON
    Serialization,
}

impl ErrorKind {
    /// Stable machine-readable name
    pub const fn category(&self) -> &'static str {
        match self {
            Self::EmptyInput => "empty_input",
            Self::Syntax => "syntax",
            Self::MaxDepthExceeded { .. } => "max_depth_exceeded",
            Self::NotFound => "not_found",
            Self::NotAFile => "not_a_file",
            Self::PermissionDenied => "permission_denied",
            Self::Encoding => "encoding",
            Self::Io => "io",
            Self::Serialization => "serialization",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "xml input cannot be empty"),
            Self::Syntax => write!(f, "malformed xml"),
            Self::MaxDepthExceeded { max } => write!(f, "max depth exceeded: {max}"),
            Self::NotFound => write!(f, "file not found"),
            Self::NotAFile => write!(f, "path is not a file"),
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::Encoding => write!(f, "file is not valid utf-8"),
            Self::Io => write!(f, "i/o error"),
            Self::Serialization => write!(f, "serialization failed"),
        }
    }
}

/// Main error type for aidx
#[derive(Error, Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    span: Span,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            span,
            message,
        }
    }

    pub fn with_message(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Error without a source position
    pub fn bare(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::with_message(kind, Span::empty(), message)
    }

    /// Syntax error at a specific position
    pub fn syntax_at(pos: Pos, message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::Syntax, Span::at(pos), message)
    }

    /// Map an I/O failure on `path` onto the file-access kinds
    pub fn from_io(err: &io::Error, path: &Path) -> Self {
        let path = path.display();
        match err.kind() {
            io::ErrorKind::NotFound => {
                Self::bare(ErrorKind::NotFound, format!("file not found: {path}"))
            }
            io::ErrorKind::PermissionDenied => Self::bare(
                ErrorKind::PermissionDenied,
                format!("permission denied reading file: {path}"),
            ),
            io::ErrorKind::InvalidData => {
                Self::bare(ErrorKind::Encoding, format!("file encoding error: {err}"))
            }
            _ => Self::bare(
                ErrorKind::Io,
                format!("unexpected error reading file {path}: {err}"),
            ),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn category(&self) -> &'static str {
        self.kind.category()
    }

    /// True when the failure was caused by the input rather than by this crate
    pub const fn is_input_error(&self) -> bool {
        !matches!(self.kind, ErrorKind::Io | ErrorKind::Serialization)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.span.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} at {}", self.message, self.span.start)
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::bare(
            ErrorKind::Serialization,
            format!("failed to convert data to json: {err}"),
        )
    }
}

/// Result type alias for aidx
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pos_display() {
        let pos = Pos::new(42, 10, 5);
        assert_eq!(pos.to_string(), "10:5");
    }

    #[test]
    fn test_syntax_error_display_has_position() {
        let err = Error::syntax_at(Pos::new(10, 2, 5), "mismatched closing tag");
        assert_eq!(err.kind(), &ErrorKind::Syntax);
        assert_eq!(err.to_string(), "mismatched closing tag at 2:5");
    }

    #[test]
    fn test_bare_error_display() {
        let err = Error::new(ErrorKind::EmptyInput, Span::empty());
        assert_eq!(err.to_string(), "xml input cannot be empty");
    }

    #[test]
    fn test_from_io_maps_kinds() {
        let path = Path::new("flight.xml");
        let not_found = io::Error::from(io::ErrorKind::NotFound);
        assert_eq!(Error::from_io(&not_found, path).kind(), &ErrorKind::NotFound);

        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        let err = Error::from_io(&denied, path);
        assert_eq!(err.kind(), &ErrorKind::PermissionDenied);
        assert!(err.message().contains("flight.xml"));

        let bad = io::Error::new(io::ErrorKind::InvalidData, "stream did not contain valid UTF-8");
        assert_eq!(Error::from_io(&bad, path).kind(), &ErrorKind::Encoding);

        let other = io::Error::other("disk on fire");
        assert_eq!(Error::from_io(&other, path).kind(), &ErrorKind::Io);
    }

    #[test]
    fn test_input_error_classification() {
        assert!(Error::bare(ErrorKind::Syntax, "x").is_input_error());
        assert!(Error::bare(ErrorKind::NotFound, "x").is_input_error());
        assert!(!Error::bare(ErrorKind::Serialization, "x").is_input_error());
        assert!(!Error::bare(ErrorKind::Io, "x").is_input_error());
    }

    #[test]
    fn test_categories_are_distinct() {
        let kinds = [
            ErrorKind::EmptyInput,
            ErrorKind::Syntax,
            ErrorKind::MaxDepthExceeded { max: 1 },
            ErrorKind::NotFound,
            ErrorKind::NotAFile,
            ErrorKind::PermissionDenied,
            ErrorKind::Encoding,
            ErrorKind::Io,
            ErrorKind::Serialization,
        ];
        let mut seen: Vec<_> = kinds.iter().map(ErrorKind::category).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), kinds.len());
    }
}
