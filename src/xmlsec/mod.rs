//! # Enveloped XML-DSig for the Digilink Wire Format
//!
//! The bank authenticates both directions of the protocol with enveloped
//! XML signatures: RSA-SHA256 over an exclusively-canonicalized
//! `SignedInfo`, which in turn commits to a SHA-1 digest of the whole
//! document with the signature subtree excluded (the classic
//! enveloped-signature transform). The algorithm mix is the bank's, not
//! ours — SHA-1 for the reference digest is what the remote side computes,
//! so interoperability wins over taste here.
//!
//! Two operations, deliberately asymmetric in what they trust:
//!
//! - [`sign`] loads the merchant's private key and certificate from disk,
//!   signs the document, and embeds the certificate in `KeyInfo` so the
//!   bank can identify the signer.
//! - [`verify`] checks a document against a **caller-supplied** certificate
//!   only. The certificate embedded in the document is located (its absence
//!   is an error) but never used as a trust anchor — a forged document must
//!   not get to assert its own signer identity.
//!
//! Key material is read per call and dropped on every exit path. Nothing is
//! cached, so concurrent calls with different keys cannot interfere.

pub mod c14n;

mod error;
mod keys;
mod sign;
mod verify;

pub use error::XmlSecError;
pub use sign::sign;
pub use verify::verify;

use std::io::Cursor;

use xmltree::{Element, EmitterConfig, XMLNode};

// ---------------------------------------------------------------------------
// XML-DSig Constants
// ---------------------------------------------------------------------------

/// The XML-DSig namespace every signature element lives in.
pub const XMLDSIG_NS: &str = "http://www.w3.org/2000/09/xmldsig#";

/// Transform URI for the enveloped-signature transform.
pub const ENVELOPED_SIGNATURE_TRANSFORM: &str =
    "http://www.w3.org/2000/09/xmldsig#enveloped-signature";

/// Canonicalization algorithm URI: exclusive C14N without comments.
pub const EXC_C14N_ALGORITHM: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";

/// Signature algorithm URI: RSA with SHA-256.
pub const RSA_SHA256_ALGORITHM: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";

/// Reference digest algorithm URI: SHA-1, fixed by the bank.
pub const SHA1_DIGEST_ALGORITHM: &str = "http://www.w3.org/2000/09/xmldsig#sha1";

/// Local name of the signature element.
pub const SIGNATURE_ELEMENT: &str = "Signature";

/// The placeholder node the protocol reserves for the signature. The
/// signature is inserted as a child of this element, never at the document
/// root.
pub const SIGNATURE_PLACEHOLDER: &str = "SignatureData";

// ---------------------------------------------------------------------------
// Tree Plumbing
// ---------------------------------------------------------------------------

/// Parse a document, mapping parser failures to [`XmlSecError::MalformedXml`].
pub(crate) fn parse_document(xml: &str) -> Result<Element, XmlSecError> {
    Element::parse(Cursor::new(xml.as_bytes()))
        .map_err(|e| XmlSecError::MalformedXml(e.to_string()))
}

/// Serialize a document back to a string, XML declaration included.
/// The writer escapes all text and attribute content, which is what makes
/// the builder's no-markup-injection guarantee hold.
pub(crate) fn write_document(root: &Element) -> Result<String, XmlSecError> {
    let mut out: Vec<u8> = Vec::new();
    let config = EmitterConfig::new().write_document_declaration(true);
    root.write_with_config(&mut out, config)
        .map_err(|e| XmlSecError::MalformedXml(e.to_string()))?;
    String::from_utf8(out).map_err(|e| XmlSecError::MalformedXml(e.to_string()))
}

/// Depth-first search for the first element with the given local name.
/// Namespace-agnostic on purpose: the protocol documents are unprefixed and
/// the signature subtree is found by local name, mirroring how the bank's
/// own tooling locates nodes.
pub(crate) fn find_descendant<'a>(el: &'a Element, name: &str) -> Option<&'a Element> {
    if el.name == name {
        return Some(el);
    }
    el.children.iter().find_map(|child| match child {
        XMLNode::Element(c) => find_descendant(c, name),
        _ => None,
    })
}

/// Mutable variant of [`find_descendant`], used to insert the signature
/// into the placeholder node.
pub(crate) fn find_descendant_mut<'a>(el: &'a mut Element, name: &str) -> Option<&'a mut Element> {
    if el.name == name {
        return Some(el);
    }
    el.children.iter_mut().find_map(|child| match child {
        XMLNode::Element(c) => find_descendant_mut(c, name),
        _ => None,
    })
}

/// Text content of an element, `None` when the element has no text nodes.
pub(crate) fn element_text(el: &Element) -> Option<String> {
    el.get_text().map(|t| t.into_owned())
}

#[cfg(test)]
pub(crate) mod testkeys;
