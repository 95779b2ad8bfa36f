//! Error types for the XML signing and verification layer.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while signing or verifying a document.
///
/// Verification distinguishes "the document is structurally broken" (an
/// error) from "the signature does not check out" (an `Ok(false)` from
/// [`crate::xmlsec::verify`]). Only the former lands here.
#[derive(Debug, Error)]
pub enum XmlSecError {
    /// The input could not be parsed as XML.
    #[error("malformed input XML: {0}")]
    MalformedXml(String),

    /// A key or certificate could not be read or decoded from the given
    /// path.
    #[error("cannot load key material from {path}: {reason}")]
    KeyLoad {
        /// The path that failed to load.
        path: PathBuf,
        /// What went wrong, as reported by the filesystem or PEM decoder.
        reason: String,
    },

    /// The document has no `SignatureData` placeholder to receive the
    /// signature.
    #[error("no SignatureData placeholder node in document")]
    SignaturePlaceholderMissing,

    /// No signature element anywhere in the document.
    #[error("cannot locate signature node")]
    SignatureNotFound,

    /// A signature element exists but is missing a required part.
    #[error("malformed signature: {0}")]
    MalformedSignature(&'static str),

    /// `KeyInfo` is absent or does not carry a resolvable certificate.
    #[error("cannot resolve signing key from KeyInfo")]
    KeyResolutionFailed,

    /// An underlying cryptographic operation failed.
    #[error("crypto operation failed: {0}")]
    Crypto(String),
}

impl From<openssl::error::ErrorStack> for XmlSecError {
    fn from(stack: openssl::error::ErrorStack) -> Self {
        XmlSecError::Crypto(stack.to_string())
    }
}
