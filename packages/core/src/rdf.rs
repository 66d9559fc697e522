//! TriG parsing.
//!
//! Parsing is used twice per submission: once up front to reject documents
//! that are not syntactically valid TriG, and again by the query synthesizer
//! to walk the quads of the stamped document.

use oxrdf::Quad;
use oxttl::TriGParser;
use thiserror::Error;

/// Errors returned when a document is not valid TriG.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RdfError {
    #[error("invalid TriG: {0}")]
    Syntax(String),
}

/// Parse a TriG document into its quads, in document order.
///
/// Stops at the first syntax error.
pub fn parse_trig(data: &str) -> Result<Vec<Quad>, RdfError> {
    TriGParser::new()
        .for_slice(data.as_bytes())
        .map(|quad| quad.map_err(|e| RdfError::Syntax(e.to_string())))
        .collect()
}
