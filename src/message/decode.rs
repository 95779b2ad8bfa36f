//! # Lossy XML-to-Map Decoding
//!
//! After a response is verified, downstream code only needs field lookups —
//! `Header.Extension.Amai.Code`, `PmtStat.StatCode` — not a DOM. This
//! module flattens the element tree into nested JSON-style maps:
//!
//! - an element with child elements becomes an object;
//! - an element with only text becomes a string;
//! - an element with neither becomes an empty object;
//! - repeated siblings collapse to the last occurrence (the protocol has no
//!   repeating fields, so array semantics would be dead weight);
//! - namespaced subtrees — in practice the XML-DSig signature — are not
//!   materialized and appear as empty objects at their anchor point;
//! - the root element is dropped, so decoded maps start at `Header`.
//!
//! This decode is intentionally lossy and presentation-only. It must never
//! feed a trust decision: authenticity is settled by
//! [`crate::xmlsec::verify`] before anything is decoded.

use std::io::Cursor;

use serde_json::{Map, Value};
use thiserror::Error;
use xmltree::{Element, XMLNode};

/// The decoded view of a response document.
pub type DecodedResponse = Map<String, Value>;

/// Errors from decoding.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The input could not be parsed as XML.
    #[error("malformed input XML: {0}")]
    Malformed(String),
}

/// Decode a document into nested maps, dropping the root element.
pub fn xml_to_map(xml: &str) -> Result<DecodedResponse, DecodeError> {
    let root = Element::parse(Cursor::new(xml.as_bytes()))
        .map_err(|e| DecodeError::Malformed(e.to_string()))?;
    Ok(element_to_map(&root))
}

fn element_to_map(el: &Element) -> Map<String, Value> {
    let mut map = Map::new();
    for child in &el.children {
        let XMLNode::Element(child) = child else {
            continue;
        };
        // Namespaced subtrees carry signature material, already consumed by
        // the verifier. They stay opaque here.
        if is_namespaced(child) {
            continue;
        }
        map.insert(child.name.clone(), element_to_value(child));
    }
    map
}

fn element_to_value(el: &Element) -> Value {
    let has_element_children = el
        .children
        .iter()
        .any(|c| matches!(c, XMLNode::Element(_)));
    if has_element_children {
        return Value::Object(element_to_map(el));
    }
    match el.get_text() {
        Some(text) if !text.trim().is_empty() => Value::String(text.into_owned()),
        _ => Value::Object(Map::new()),
    }
}

fn is_namespaced(el: &Element) -> bool {
    el.namespace.is_some() || el.attributes.contains_key("xmlns")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
