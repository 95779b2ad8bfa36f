//! # Canonical XML Serialization
//!
//! Signing bytes means agreeing on bytes. Two XML serializers that emit the
//! same infoset with different attribute order or different empty-element
//! syntax will produce different digests, so both sides of the protocol
//! canonicalize before digesting.
//!
//! This module implements the subset of Exclusive XML Canonicalization the
//! Digilink documents exercise:
//!
//! - UTF-8, no XML declaration, comments and processing instructions
//!   dropped.
//! - Every element serialized with an explicit start and end tag, never
//!   self-closing.
//! - Attributes sorted lexicographically; the default-namespace declaration
//!   rendered first, and only on elements whose namespace differs from
//!   their parent's (the "exclusive" part: no inherited declarations are
//!   re-emitted).
//! - Text escaped per the C14N rules; whitespace-only text nodes dropped,
//!   matching the non-preserving parse the protocol documents get on both
//!   ends.
//!
//! The protocol documents are unprefixed apart from the default-namespaced
//! `Signature` subtree, so prefixed-namespace handling is out of scope. The
//! output is stable across a build → serialize → reparse round trip, which
//! is the property signing and verification actually depend on.

use xmltree::{Element, XMLNode};

use super::SIGNATURE_ELEMENT;

/// Canonicalize a subtree.
///
/// `force_ns` pins the namespace of the subtree root regardless of what the
/// in-memory element carries. `SignedInfo` is canonicalized standalone but
/// lives in the XML-DSig namespace, and the element arrives here either
/// freshly built (namespace attribute on its parent) or reparsed (resolved
/// namespace field) — forcing the declaration makes both shapes serialize
/// identically.
pub fn canonicalize(el: &Element, force_ns: Option<&str>) -> String {
    let mut out = String::new();
    write_element(el, "", force_ns, &mut out);
    out
}

/// Apply the enveloped-signature transform: a copy of the tree with every
/// `Signature` element removed.
pub fn strip_signatures(el: &Element) -> Element {
    let mut copy = shallow_copy(el);
    for child in &el.children {
        match child {
            XMLNode::Element(c) if c.name == SIGNATURE_ELEMENT => {}
            XMLNode::Element(c) => copy.children.push(XMLNode::Element(strip_signatures(c))),
            other => copy.children.push(other.clone()),
        }
    }
    copy
}

fn shallow_copy(el: &Element) -> Element {
    Element {
        prefix: el.prefix.clone(),
        namespace: el.namespace.clone(),
        namespaces: el.namespaces.clone(),
        name: el.name.clone(),
        attributes: el.attributes.clone(),
        children: Vec::new(),
    }
}

fn write_element(el: &Element, inherited_ns: &str, force_ns: Option<&str>, out: &mut String) {
    // The effective default namespace: an explicit xmlns attribute wins,
    // then a forced namespace, then the namespace the parser resolved.
    let effective = el
        .attributes
        .get("xmlns")
        .map(String::as_str)
        .or(force_ns)
        .or(el.namespace.as_deref())
        .unwrap_or(inherited_ns);

    out.push('<');
    out.push_str(&el.name);

    if effective != inherited_ns {
        out.push_str(" xmlns=\"");
        push_attr_escaped(effective, out);
        out.push('"');
    }

    let mut attrs: Vec<(&String, &String)> = el
        .attributes
        .iter()
        .filter(|(name, _)| name.as_str() != "xmlns" && !name.starts_with("xmlns:"))
        .collect();
    attrs.sort_by(|a, b| a.0.cmp(b.0));
    for (name, value) in attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        push_attr_escaped(value, out);
        out.push('"');
    }
    out.push('>');

    for child in &el.children {
        match child {
            XMLNode::Element(c) => write_element(c, effective, None, out),
            XMLNode::Text(t) | XMLNode::CData(t) => {
                if !t.trim().is_empty() {
                    push_text_escaped(t, out);
                }
            }
            // Canonical form without comments; PIs do not occur in the
            // protocol documents.
            XMLNode::Comment(_) | XMLNode::ProcessingInstruction(..) => {}
        }
    }

    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
}

fn push_text_escaped(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            c => out.push(c),
        }
    }
}

fn push_attr_escaped(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            c => out.push(c),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
