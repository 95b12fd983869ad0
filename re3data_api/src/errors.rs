//! Error types for the API client.

use crate::xml::XmlError;

/// Errors that can occur when making API requests.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An HTTP request failed (network error, timeout, or unreadable body).
    #[error("Request failed: {0}")]
    RequestFailed(String),
    /// The API returned a non-success status with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// The response body was not a well-formed XML document.
    #[error("Malformed document: {0}")]
    MalformedDocument(#[from] XmlError),
    /// A request URL could not be constructed from the base URL and path.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
