//! Input sources: XML text or a path to a UTF-8 file

use std::fs;
use std::path::Path;

use crate::error::{Error, ErrorKind, Result};

/// Where a document comes from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Text(&'a str),
    File(&'a Path),
}

impl<'a> Input<'a> {
    /// Classify a string that may be either XML text or a file path.
    ///
    /// Markup (leading `<` after trimming) is always text. Anything else is a file when a
    /// file exists at that path, and text otherwise.
    pub fn detect(source: &'a str) -> Self {
        if source.trim_start().starts_with('<') {
            return Self::Text(source);
        }
        let path = Path::new(source);
        if path.exists() {
            Self::File(path)
        } else {
            Self::Text(source)
        }
    }
}

impl<'a> From<&'a str> for Input<'a> {
    fn from(s: &'a str) -> Self {
        Self::Text(s)
    }
}

impl<'a> From<&'a Path> for Input<'a> {
    fn from(p: &'a Path) -> Self {
        Self::File(p)
    }
}

/// Read a whole file as UTF-8 text
pub fn read_document(path: &Path) -> Result<String> {
    let metadata = fs::metadata(path).map_err(|err| Error::from_io(&err, path))?;
    if !metadata.is_file() {
        return Err(Error::bare(
            ErrorKind::NotAFile,
            format!("path is not a file: {}", path.display()),
        ));
    }

    let bytes = fs::read(path).map_err(|err| Error::from_io(&err, path))?;
    String::from_utf8(bytes).map_err(|err| {
        Error::bare(
            ErrorKind::Encoding,
            format!("file encoding error: {}: {err}", path.display()),
        )
    })
}
