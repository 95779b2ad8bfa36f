//! # Registered Document Layouts
//!
//! Each protocol document has a fixed node layout keyed by its message
//! token. Rendering is an explicit field-to-node mapping — a field either
//! has a node position in the layout or it does not exist on the wire.
//! There is no string interpolation anywhere in this path: values go into
//! text nodes through the XML writer, which escapes them, so field content
//! cannot inject markup no matter what a caller puts in a description.
//!
//! Absent optional fields render as absent nodes, not empty ones. The
//! distinction is observable (the bank omits `Message` rather than sending
//! `<Message/>`), so the templates replicate it exactly.
//!
//! The response layouts (`PMTRESP`, `PMTSTATRESP`) are rendered by the bank
//! in production; they are registered here because simulating the bank is
//! how the completion pipeline is tested, and the reference implementation
//! ships them for the same reason.

use std::collections::BTreeMap;

use thiserror::Error;
use xmltree::{Element, XMLNode};

use crate::config::{
    PAYMENT_CONFIRMATION_MESSAGE, PAYMENT_REQUEST_MESSAGE, PAYMENT_STATUS_MESSAGE,
    PROTOCOL_VERSION,
};
use crate::xmlsec::{write_document, SIGNATURE_PLACEHOLDER};

/// Field values for a template, keyed by wire-level field name.
pub type TemplateVars = BTreeMap<String, String>;

/// Errors from template rendering.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// No layout is registered under the given template id.
    #[error("no template registered for '{0}'")]
    TemplateNotFound(String),

    /// The rendered tree could not be serialized. Does not happen with the
    /// registered layouts; kept so the writer's error is not swallowed.
    #[error("template rendering failed: {0}")]
    Render(String),
}

/// Render a registered document layout into XML.
///
/// `template_id` is one of the protocol message tokens; anything else is
/// [`TemplateError::TemplateNotFound`].
pub fn render(template_id: &str, vars: &TemplateVars) -> Result<String, TemplateError> {
    let root = match template_id {
        PAYMENT_REQUEST_MESSAGE => payment_request(vars),
        PAYMENT_CONFIRMATION_MESSAGE => payment_confirmation(vars),
        PAYMENT_STATUS_MESSAGE => payment_status(vars),
        other => return Err(TemplateError::TemplateNotFound(other.to_string())),
    };
    write_document(&root).map_err(|e| TemplateError::Render(e.to_string()))
}

// ---------------------------------------------------------------------------
// Layouts
// ---------------------------------------------------------------------------

/// `PMTREQ` — the outbound payment request.
fn payment_request(vars: &TemplateVars) -> Element {
    let mut ben_set = el("BenSet");
    push_text(&mut ben_set, "Priority", "N");
    push_text(&mut ben_set, "Comm", "OUR");
    push_var(&mut ben_set, "Amt", vars);
    push_var(&mut ben_set, "BenAccNo", vars);
    push_var(&mut ben_set, "BenName", vars);
    push_var(&mut ben_set, "BenLegalId", vars);
    push_var(&mut ben_set, "BenCountry", vars);

    let mut payment = el("PaymentRequest");
    push_text_opt(&mut payment, "ExtId", vars.get("RequestUID"));
    push_text_opt(&mut payment, "DocNo", vars.get("RequestUID"));
    push_text(&mut payment, "TaxPmtFlg", "N");
    push_var(&mut payment, "Ccy", vars);
    push_var(&mut payment, "PmtInfo", vars);
    push(&mut payment, ben_set);

    let mut amai = el("Amai");
    push_text(&mut amai, "Request", PAYMENT_REQUEST_MESSAGE);
    push_var(&mut amai, "RequestUID", vars);
    push_version(&mut amai, vars);
    push_var(&mut amai, "Language", vars);
    push_var(&mut amai, "ReturnURL", vars);
    push(&mut amai, el(SIGNATURE_PLACEHOLDER));
    push(&mut amai, payment);

    document(vars, amai, None)
}

/// `PMTRESP` — the bank's interactive confirmation (simulated in tests).
fn payment_confirmation(vars: &TemplateVars) -> Element {
    let mut amai = el("Amai");
    push_text(&mut amai, "Request", PAYMENT_CONFIRMATION_MESSAGE);
    push_version(&mut amai, vars);
    push_var(&mut amai, "RequestUID", vars);
    push_var(&mut amai, "Code", vars);
    push_var(&mut amai, "Message", vars);
    push(&mut amai, el(SIGNATURE_PLACEHOLDER));

    document(vars, amai, None)
}

/// `PMTSTATRESP` — the bank's server-to-server settlement status
/// (simulated in tests).
fn payment_status(vars: &TemplateVars) -> Element {
    let mut amai = el("Amai");
    push_text(&mut amai, "Request", PAYMENT_STATUS_MESSAGE);
    push_version(&mut amai, vars);
    push(&mut amai, el(SIGNATURE_PLACEHOLDER));

    let mut pmt_stat = el("PmtStat");
    push_var(&mut pmt_stat, "ExtId", vars);
    push_var(&mut pmt_stat, "DocNo", vars);
    push_var(&mut pmt_stat, "StatCode", vars);

    document(vars, amai, Some(pmt_stat))
}

/// The shared document shell: `FIDAVISTA/Header/{Timestamp,From,Extension}`
/// plus an optional root-level sibling of `Header`.
fn document(vars: &TemplateVars, amai: Element, after_header: Option<Element>) -> Element {
    let mut extension = el("Extension");
    push(&mut extension, amai);

    let mut header = el("Header");
    push_var(&mut header, "Timestamp", vars);
    push_var(&mut header, "From", vars);
    push(&mut header, extension);

    let mut root = el("FIDAVISTA");
    push(&mut root, header);
    if let Some(sibling) = after_header {
        push(&mut root, sibling);
    }
    root
}

// ---------------------------------------------------------------------------
// Element Helpers
// ---------------------------------------------------------------------------

fn el(name: &str) -> Element {
    Element::new(name)
}

fn push(parent: &mut Element, child: Element) {
    parent.children.push(XMLNode::Element(child));
}

fn push_text(parent: &mut Element, name: &str, value: &str) {
    let mut child = el(name);
    child.children.push(XMLNode::Text(value.to_string()));
    push(parent, child);
}

/// A field with a template default: the variable wins when present.
fn push_version(parent: &mut Element, vars: &TemplateVars) {
    let version = vars
        .get("Version")
        .map(String::as_str)
        .unwrap_or(PROTOCOL_VERSION);
    push_text(parent, "Version", version);
}

/// Present variable → node; absent variable → no node at all.
fn push_var(parent: &mut Element, name: &str, vars: &TemplateVars) {
    push_text_opt(parent, name, vars.get(name));
}

fn push_text_opt(parent: &mut Element, name: &str, value: Option<&String>) {
    if let Some(value) = value {
        if value.is_empty() {
            push(parent, el(name));
        } else {
            push_text(parent, name, value);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> TemplateVars {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn unknown_template_id_is_rejected() {
        let err = render("AUTHREQ", &TemplateVars::new()).unwrap_err();
        assert_eq!(err.to_string(), "no template registered for 'AUTHREQ'");
    }

    #[test]
    fn payment_request_layout_is_complete() {
        let xml = render(
            PAYMENT_REQUEST_MESSAGE,
            &vars(&[
                ("Timestamp", "20240307140509123"),
                ("From", "1"),
                ("RequestUID", "abc123"),
                ("ReturnURL", "http://localhost:8080/return"),
                ("BenAccNo", "PAXXX0011"),
                ("BenName", "Some merchant"),
                ("BenLegalId", "9892"),
                ("BenCountry", "LT"),
                ("PmtInfo", "purchase description"),
                ("Amt", "10.00"),
                ("Ccy", "EUR"),
                ("Language", "LV"),
            ]),
        )
        .unwrap();

        assert!(xml.contains("<Request>PMTREQ</Request>"));
        assert!(xml.contains("<Version>5.0</Version>"));
        assert!(xml.contains("<ExtId>abc123</ExtId>"));
        assert!(xml.contains("<DocNo>abc123</DocNo>"));
        assert!(xml.contains("<TaxPmtFlg>N</TaxPmtFlg>"));
        assert!(xml.contains("<Priority>N</Priority>"));
        assert!(xml.contains("<Comm>OUR</Comm>"));
        assert!(xml.contains("<SignatureData"));
    }

    #[test]
    fn field_content_cannot_inject_markup() {
        let xml = render(
            PAYMENT_REQUEST_MESSAGE,
            &vars(&[
                ("Timestamp", "20240307140509123"),
                ("From", "1"),
                ("RequestUID", "abc123"),
                ("PmtInfo", "</PmtInfo><Evil>1</Evil>"),
                ("Amt", "10.00"),
            ]),
        )
        .unwrap();
        assert!(!xml.contains("<Evil>"));
        assert!(xml.contains("&lt;Evil"));
    }

    #[test]
    fn absent_optional_field_renders_no_node() {
        let without = render(
            PAYMENT_CONFIRMATION_MESSAGE,
            &vars(&[
                ("Timestamp", "20240307140509123"),
                ("RequestUID", "abc123"),
                ("Code", "300"),
            ]),
        )
        .unwrap();
        assert!(!without.contains("<Message"));

        let with = render(
            PAYMENT_CONFIRMATION_MESSAGE,
            &vars(&[
                ("Timestamp", "20240307140509123"),
                ("RequestUID", "abc123"),
                ("Code", "300"),
                ("Message", "no electricity"),
            ]),
        )
        .unwrap();
        assert!(with.contains("<Message>no electricity</Message>"));
    }

    #[test]
    fn status_layout_has_root_level_pmt_stat() {
        let xml = render(
            PAYMENT_STATUS_MESSAGE,
            &vars(&[
                ("Timestamp", "20240307140509123"),
                ("ExtId", "abc123"),
                ("DocNo", "abc123"),
                ("StatCode", "E"),
            ]),
        )
        .unwrap();
        assert!(xml.contains("<Request>PMTSTATRESP</Request>"));
        assert!(xml.contains("<PmtStat><ExtId>abc123</ExtId>"));
        assert!(xml.contains("<StatCode>E</StatCode>"));
    }

    #[test]
    fn version_variable_overrides_the_default() {
        let xml = render(
            PAYMENT_STATUS_MESSAGE,
            &vars(&[("Timestamp", "20240307140509123"), ("Version", "4.2")]),
        )
        .unwrap();
        assert!(xml.contains("<Version>4.2</Version>"));
    }
}
