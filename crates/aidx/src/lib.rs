//! aidx - XML to canonical JSON conversion for IATA AIDX messages
//!
//! Converts arbitrary, namespace-qualified XML into a value built from three shapes:
//! text, ordered mappings and lists. Attributes become `@name` keys, mixed content
//! keeps its text under `#text`, and repeated siblings become lists.
//!
//! # Quick Start
//!
//! ```
//! # fn main() -> Result<(), aidx::Error> {
//! let result = aidx::from_str(r#"<Flight><Airline CodeContext="IATA">JQ</Airline></Flight>"#)?;
//! let json = aidx::to_json_compact(&result)?;
//! assert_eq!(json, r##"{"Flight":{"Airline":{"@CodeContext":"IATA","#text":"JQ"}}}"##);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, ErrorKind, Pos, Result, Span};

pub mod input;
pub use input::Input;

pub mod value;
pub use value::{List, Mapping, Value};

pub mod config;
pub use config::Config;

pub mod tag;
pub use tag::{TagFilter, TagNameResolver};

pub mod convert;
pub use convert::{Converter, ATTRIBUTE_PREFIX, TEXT_KEY};

pub mod serialize;
pub use serialize::{from_json, to_json, to_json_compact};

pub mod xml;
pub use xml::{
    Config as ParserConfig, Content as XmlContent, Document as XmlDocument,
    Element as XmlElement, Parser as XmlParser, DEFAULT_MAX_DEPTH,
};

use std::path::Path;

/// Convert XML text with the default configuration
pub fn from_str(xml: &str) -> Result<Mapping> {
    Converter::new().parse_str(xml)
}

/// Convert a UTF-8 XML file with the default configuration
pub fn from_file(path: impl AsRef<Path>) -> Result<Mapping> {
    Converter::new().parse_file(path)
}

/// Convert either XML text or a path to an XML file
///
/// See [`Input::detect`] for how the two are told apart.
pub fn parse_source(source: &str, config: Config) -> Result<Mapping> {
    let converter = Converter::with_config(config);
    match Input::detect(source) {
        Input::Text(text) => converter.parse_str(text),
        Input::File(path) => converter.parse_file(path),
    }
}

/// Parse an XML document into its syntax tree without converting it
pub fn parse_document(xml: &str) -> Result<XmlDocument> {
    XmlParser::new(xml.as_bytes()).parse()
}
