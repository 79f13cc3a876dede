//! Error types for the PDF library.
//!
//! All fatal conditions unwind to the caller of open/append as one of the
//! variants below. The only automatic retry anywhere in the crate is the
//! cross-reference-stream → textual-table fallback in [`crate::xref`].

use std::path::PathBuf;

/// Result type alias for PDF library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during PDF processing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// PDF header marker '%PDF-' not found
    #[error("Invalid PDF header: '%PDF-' marker not found")]
    InvalidHeader,

    /// PDF version below the supported minimum
    #[error("Unsupported PDF version: {0} (minimum 1.4)")]
    UnsupportedVersion(String),

    /// Encrypted or signed document (not supported)
    #[error("Encrypted documents are not supported")]
    Encrypted,

    /// The 'startxref' marker could not be located
    #[error("'startxref' marker not found near end of file")]
    StartxrefNotFound,

    /// Invalid cross-reference table or stream
    #[error("Invalid cross-reference data: {0}")]
    InvalidXref(String),

    /// Malformed trailer dictionary
    #[error("Invalid trailer: {0}")]
    InvalidTrailer(String),

    /// /Prev chain loops back on itself
    #[error("Cross-reference /Prev chain cycle at offset {0}")]
    XrefChainCycle(u64),

    /// Trailer has no usable /Root entry
    #[error("Document catalog (/Root) missing or invalid")]
    MissingCatalog,

    /// A Pages/Page node was reached twice during one traversal
    #[error("Page tree cycle at object {0}")]
    PageTreeCycle(u32),

    /// 1-based page index outside the document
    #[error("Page {0} is out of range")]
    PageOutOfRange(usize),

    /// Parse error at specific byte offset
    #[error("Failed to parse at byte {offset}: {reason}")]
    Parse {
        /// Byte offset where the error occurred
        offset: u64,
        /// Reason for the failure
        reason: String,
    },

    /// Object has wrong type
    #[error("Invalid object type: expected {expected}, found {found}")]
    InvalidObjectType {
        /// Expected object type
        expected: String,
        /// Actual object type found
        found: String,
    },

    /// Unexpected end of file
    #[error("End of file reached unexpectedly")]
    UnexpectedEof,

    /// Stream decoding error
    #[error("Stream decoding error: {0}")]
    Decode(String),

    /// Unsupported stream filter
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// Invalid decoded-image input
    #[error("Image error: {0}")]
    Image(String),

    /// Input path does not name a regular file
    #[error("Not a regular file: {0}")]
    NotAFile(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_message() {
        let err = Error::Parse {
            offset: 1234,
            reason: "invalid token".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("1234"));
        assert!(msg.contains("invalid token"));
    }

    #[test]
    fn test_version_error_message() {
        let err = Error::UnsupportedVersion("1.2".to_string());
        assert!(format!("{}", err).contains("1.2"));
    }

    #[test]
    fn test_invalid_object_type_message() {
        let err = Error::InvalidObjectType {
            expected: "Dictionary".to_string(),
            found: "Array".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Dictionary"));
        assert!(msg.contains("Array"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
