//! Canonical JSON rendering
//!
//! Keys are written in insertion order and non-ASCII characters are written literally.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::error::{Error, ErrorKind, Result};
use crate::value::Value;

/// Render `value` as JSON indented by `indent` spaces per level.
///
/// An indent of 0 still breaks lines, it just does not indent them.
pub fn to_json<T: Serialize + ?Sized>(value: &T, indent: usize) -> Result<String> {
    let pad = " ".repeat(indent);
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(pad.as_bytes());
    let mut serializer = Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    into_string(buf)
}

/// Render `value` as single-line JSON
pub fn to_json_compact<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let buf = serde_json::to_vec(value)?;
    into_string(buf)
}

/// Parse JSON text back into the canonical model
pub fn from_json(text: &str) -> Result<Value> {
    let json: serde_json::Value = serde_json::from_str(text)?;
    Value::try_from(json)
}

fn into_string(buf: Vec<u8>) -> Result<String> {
    String::from_utf8(buf).map_err(|err| {
        Error::bare(
            ErrorKind::Serialization,
            format!("json output is not utf-8: {err}"),
        )
    })
}
