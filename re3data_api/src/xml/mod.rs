//! XML documents and XPath queries for field extraction.
//!
//! Parsing is done by `sxd-document` and evaluation by `sxd-xpath`. This
//! module only adds the `r3d` namespace binding, string conversion of the
//! results, and per-element evaluation for paired fields.

mod document;
mod path;

pub use self::document::XmlDocument;
pub use self::path::XPath;

/// Prefix the registry schema uses in every path.
pub const R3D_PREFIX: &str = "r3d";
/// Namespace bound to [`R3D_PREFIX`] when a document does not declare one.
pub const R3D_NAMESPACE: &str = "http://www.re3data.org/schema/2-2";

/// Errors raised while parsing documents or evaluating path expressions.
#[derive(thiserror::Error, Debug)]
pub enum XmlError {
    #[error("XML syntax error: {0}")]
    Parse(#[from] sxd_document::parser::Error),
    /// A path expression could not be compiled.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
    #[error("path evaluation failed: {0}")]
    Evaluation(#[from] sxd_xpath::ExecutionError),
}
