//! Enveloped signing of outbound documents.

use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use openssl::hash::MessageDigest;
use openssl::sign::Signer;
use sha1::{Digest, Sha1};
use tracing::debug;
use xmltree::{Element, XMLNode};

use super::{
    c14n, find_descendant_mut, keys, parse_document, XmlSecError,
    ENVELOPED_SIGNATURE_TRANSFORM, EXC_C14N_ALGORITHM, RSA_SHA256_ALGORITHM, SHA1_DIGEST_ALGORITHM,
    SIGNATURE_ELEMENT, SIGNATURE_PLACEHOLDER, XMLDSIG_NS,
};

/// Sign a document with an enveloped XML signature.
///
/// The exact sequence matters for interoperability with the bank:
///
/// 1. Parse the input without reformatting.
/// 2. SHA-1 digest over the enveloped-transformed, canonicalized document.
/// 3. Build `SignedInfo` committing to that digest and canonicalize it with
///    exclusive C14N.
/// 4. RSA-SHA256 over the canonical `SignedInfo` with the private key from
///    `private_key_path`.
/// 5. Insert the `<Signature>` under the document's `SignatureData`
///    placeholder.
/// 6. Embed the X.509 certificate from `public_cert_path` in `KeyInfo`.
///
/// The returned string is the complete signed document. It must reach the
/// transport unmodified — the signature covers it as-is.
pub fn sign(
    xml: &str,
    private_key_path: &Path,
    public_cert_path: &Path,
) -> Result<String, XmlSecError> {
    let mut doc = parse_document(xml)?;
    let key = keys::load_private_key(private_key_path)?;
    let cert = keys::load_certificate(public_cert_path)?;

    // Reference digest: the document as it will look to a verifier after
    // the enveloped-signature transform strips the signature back out.
    let enveloped = c14n::strip_signatures(&doc);
    let digest = Sha1::digest(c14n::canonicalize(&enveloped, None).as_bytes());
    let digest_b64 = BASE64.encode(digest);

    let signed_info = build_signed_info(&digest_b64);
    let canonical_signed_info = c14n::canonicalize(&signed_info, Some(XMLDSIG_NS));

    let mut signer = Signer::new(MessageDigest::sha256(), &key)?;
    signer.update(canonical_signed_info.as_bytes())?;
    let signature_b64 = BASE64.encode(signer.sign_to_vec()?);

    let certificate_b64 = keys::certificate_base64(&cert)?;
    let signature = build_signature(signed_info, &signature_b64, &certificate_b64);

    let placeholder = find_descendant_mut(&mut doc, SIGNATURE_PLACEHOLDER)
        .ok_or(XmlSecError::SignaturePlaceholderMissing)?;
    placeholder.children.push(XMLNode::Element(signature));

    debug!(root = %doc.name, "signed document with enveloped signature");

    // The signed document is emitted in canonical form. Any serializer
    // would do for transport, but the canonical one guarantees that what
    // we digested is byte-for-byte what a verifier will recompute after
    // reparsing.
    Ok(format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>{}",
        c14n::canonicalize(&doc, None)
    ))
}

fn build_signed_info(digest_b64: &str) -> Element {
    let mut canonicalization = Element::new("CanonicalizationMethod");
    canonicalization
        .attributes
        .insert("Algorithm".to_string(), EXC_C14N_ALGORITHM.to_string());

    let mut signature_method = Element::new("SignatureMethod");
    signature_method
        .attributes
        .insert("Algorithm".to_string(), RSA_SHA256_ALGORITHM.to_string());

    let mut transform = Element::new("Transform");
    transform.attributes.insert(
        "Algorithm".to_string(),
        ENVELOPED_SIGNATURE_TRANSFORM.to_string(),
    );
    let mut transforms = Element::new("Transforms");
    transforms.children.push(XMLNode::Element(transform));

    let mut digest_method = Element::new("DigestMethod");
    digest_method
        .attributes
        .insert("Algorithm".to_string(), SHA1_DIGEST_ALGORITHM.to_string());

    // URI="" — a same-document reference to the enveloping document.
    let mut reference = Element::new("Reference");
    reference
        .attributes
        .insert("URI".to_string(), String::new());
    reference.children.push(XMLNode::Element(transforms));
    reference.children.push(XMLNode::Element(digest_method));
    reference
        .children
        .push(XMLNode::Element(text_element("DigestValue", digest_b64)));

    let mut signed_info = Element::new("SignedInfo");
    signed_info.children.push(XMLNode::Element(canonicalization));
    signed_info
        .children
        .push(XMLNode::Element(signature_method));
    signed_info.children.push(XMLNode::Element(reference));
    signed_info
}

fn build_signature(signed_info: Element, signature_b64: &str, certificate_b64: &str) -> Element {
    let mut x509_data = Element::new("X509Data");
    x509_data.children.push(XMLNode::Element(text_element(
        "X509Certificate",
        certificate_b64,
    )));
    let mut key_info = Element::new("KeyInfo");
    key_info.children.push(XMLNode::Element(x509_data));

    let mut signature = Element::new(SIGNATURE_ELEMENT);
    signature
        .attributes
        .insert("xmlns".to_string(), XMLDSIG_NS.to_string());
    signature.children.push(XMLNode::Element(signed_info));
    signature.children.push(XMLNode::Element(text_element(
        "SignatureValue",
        signature_b64,
    )));
    signature.children.push(XMLNode::Element(key_info));
    signature
}

fn text_element(name: &str, text: &str) -> Element {
    let mut el = Element::new(name);
    el.children.push(XMLNode::Text(text.to_string()));
    el
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
