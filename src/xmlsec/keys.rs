//! Scoped loading of PEM key material.
//!
//! Every signing or verification call loads its own keys from the
//! caller-supplied paths and drops them when the call returns. No cache, no
//! shared state, no cross-call interference — the price is a few reads per
//! operation, which is noise next to the RSA math.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use openssl::pkey::{PKey, Private};
use openssl::x509::X509;

use super::XmlSecError;

/// Load a PEM private key (PKCS#8 or PKCS#1).
pub(crate) fn load_private_key(path: &Path) -> Result<PKey<Private>, XmlSecError> {
    let bytes = read_pem(path)?;
    PKey::private_key_from_pem(&bytes).map_err(|e| key_load(path, e))
}

/// Load a PEM X.509 certificate.
pub(crate) fn load_certificate(path: &Path) -> Result<X509, XmlSecError> {
    let bytes = read_pem(path)?;
    X509::from_pem(&bytes).map_err(|e| key_load(path, e))
}

/// DER bytes of a certificate, base64-encoded for embedding in
/// `X509Certificate`.
pub(crate) fn certificate_base64(cert: &X509) -> Result<String, XmlSecError> {
    Ok(BASE64.encode(cert.to_der()?))
}

fn read_pem(path: &Path) -> Result<Vec<u8>, XmlSecError> {
    fs::read(path).map_err(|e| key_load(path, e))
}

fn key_load(path: &Path, reason: impl std::fmt::Display) -> XmlSecError {
    XmlSecError::KeyLoad {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
