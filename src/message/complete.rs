//! # Inbound Response Completion
//!
//! The bank talks back twice: once through the customer's browser
//! (`PMTRESP`, the interactive confirmation) and once machine-to-machine
//! (`PMTSTATRESP`, the settlement status). Both arrive as a signed XML
//! document in an `xmldata` POST field, and both pass through the same
//! five-gate validation pipeline before anything is interpreted:
//!
//! 1. **Payload** — `xmldata` must be present and non-empty.
//! 2. **Well-formedness** — the payload must parse as XML.
//! 3. **Type** — the `Request` field must be one of the two response
//!    tokens.
//! 4. **Freshness** — the `Timestamp` must be within the configured window
//!    (default 15 minutes; future timestamps pass, matching the reference
//!    behavior).
//! 5. **Authenticity** — the enveloped signature must verify against the
//!    configured bank certificate.
//!
//! All-or-nothing: a failed gate returns an error and no partial result.
//! Only after gate 5 is the document decoded and classified.
//!
//! ## The safety-critical distinction
//!
//! A confirmation with code `100` means "the customer confirmed, the bank
//! is processing" — [`PaymentOutcome::Pending`], not success. Only a status
//! message with `StatCode` `E` is [`PaymentOutcome::Successful`]. Ship
//! goods on `Pending` and you are extending unsecured credit.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{
    ConfigurationError, GatewayConfig, PAYMENT_CONFIRMATION_MESSAGE, PAYMENT_STATUS_MESSAGE,
};
use crate::message::decode::{self, DecodedResponse};
use crate::message::timestamp;
use crate::xmlsec::{self, element_text, find_descendant, parse_document};

// ---------------------------------------------------------------------------
// Status Codes
// ---------------------------------------------------------------------------

/// Confirmation code: delivered to the bank, processing.
const CODE_PROCESSED: &str = "100";
/// Confirmation code: customer cancelled.
const CODE_CANCELED: &str = "200";
/// Confirmation code: bank-side error.
const CODE_ERRORED: &str = "300";
/// Status code: executed — the only code that means settled.
const STATUS_EXECUTED: &str = "E";
/// Status code: rejected.
const STATUS_REJECTED: &str = "R";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A response was rejected by one of the validation gates.
///
/// Message texts are part of the integration contract — existing merchant
/// systems match on them — so they are preserved verbatim.
#[derive(Debug, Error)]
pub enum CompleteError {
    /// The gateway is missing a field completion needs. Raised before any
    /// parsing or crypto work.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The `xmldata` field is absent or empty.
    #[error("Missing xmldata value")]
    MissingPayload,

    /// The payload is not well-formed XML.
    #[error("Invalid xml")]
    InvalidXml,

    /// The `Request` field is not a known response token.
    #[error("Invalid response type")]
    InvalidResponseType,

    /// The response timestamp is older than the freshness window
    /// (rendered in minutes).
    #[error("Timestamp exceed allowed timeout ({0} minutes)")]
    TimestampExpired(u64),

    /// Signature verification failed or errored. The underlying reason is
    /// logged, not surfaced — callers get one answer for every flavor of
    /// "don't trust this document".
    #[error("Data is corrupt or has been changed by a third party")]
    SignatureInvalid,
}

// ---------------------------------------------------------------------------
// Message Kind & Outcome
// ---------------------------------------------------------------------------

/// Which of the two response messages arrived.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum MessageKind {
    /// `PMTRESP` — interactive confirmation, browser-delivered, never
    /// final.
    Confirmation,
    /// `PMTSTATRESP` — server-to-server settlement status.
    Status,
}

impl MessageKind {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            PAYMENT_CONFIRMATION_MESSAGE => Some(MessageKind::Confirmation),
            PAYMENT_STATUS_MESSAGE => Some(MessageKind::Status),
            _ => None,
        }
    }
}

/// The classified outcome of a validated response.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum PaymentOutcome {
    /// Settled. Only ever derived from a status message with code `E`.
    Successful,
    /// Confirmed by the customer, still processing at the bank.
    Pending,
    /// Cancelled by the customer or rejected by the bank.
    Cancelled,
    /// Bank-side error, with the bank's message when it sent one.
    Errored(Option<String>),
    /// A code this protocol version does not define.
    Unknown,
}

// ---------------------------------------------------------------------------
// Completion Pipeline
// ---------------------------------------------------------------------------

/// Validates inbound `xmldata` payloads into [`CompleteResponse`]s.
pub struct CompleteRequest {
    config: GatewayConfig,
}

impl CompleteRequest {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    /// Run the five validation gates and classify the response.
    ///
    /// `xmldata` is the raw value of the POST field, `None` when the field
    /// was absent.
    pub fn process(&self, xmldata: Option<&str>) -> Result<CompleteResponse, CompleteError> {
        self.process_at(xmldata, chrono::Utc::now())
    }

    /// [`process`](Self::process) with an explicit "now" for the freshness
    /// gate. Exists so tests can pin the clock; production callers want
    /// [`process`](Self::process).
    pub fn process_at(
        &self,
        xmldata: Option<&str>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<CompleteResponse, CompleteError> {
        self.config.validate_for_complete()?;

        // Gate 1: payload present.
        let xml = match xmldata {
            Some(value) if !value.trim().is_empty() => value,
            _ => return Err(CompleteError::MissingPayload),
        };

        // Gate 2: well-formed.
        let doc = parse_document(xml).map_err(|_| CompleteError::InvalidXml)?;

        // Gate 3: a response type we speak.
        let kind = find_descendant(&doc, "Request")
            .and_then(element_text)
            .and_then(|token| MessageKind::from_token(token.trim()))
            .ok_or(CompleteError::InvalidResponseType)?;

        // Gate 4: fresh enough. A missing timestamp fails the same way a
        // stale one does — there is nothing to vouch for its age.
        let window = self.config.response_timeout;
        let fresh = find_descendant(&doc, "Timestamp")
            .and_then(element_text)
            .map(|ts| timestamp::is_fresh(ts.trim(), window, now))
            .unwrap_or(false);
        if !fresh {
            return Err(CompleteError::TimestampExpired(window.as_secs() / 60));
        }

        // Gate 5: authentic. Verification errors collapse into the same
        // rejection as a bad signature; the distinction is logged for the
        // operator, not surfaced to the protocol.
        match xmlsec::verify(xml, &self.config.bank_certificate_path) {
            Ok(true) => {}
            Ok(false) => return Err(CompleteError::SignatureInvalid),
            Err(e) => {
                warn!(error = %e, "response signature verification errored");
                return Err(CompleteError::SignatureInvalid);
            }
        }

        let data = decode::xml_to_map(xml).map_err(|_| CompleteError::InvalidXml)?;
        debug!(?kind, "accepted bank response");
        Ok(CompleteResponse { kind, data })
    }
}

// ---------------------------------------------------------------------------
// Classified Response
// ---------------------------------------------------------------------------

/// A validated, decoded bank response.
///
/// Pure classification over the decoded field map; holds no keys, no
/// configuration, and no cross-call state.
#[derive(Clone, Debug)]
pub struct CompleteResponse {
    kind: MessageKind,
    data: DecodedResponse,
}

impl CompleteResponse {
    /// Which message kind arrived.
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// The decoded field map, for callers that need raw access.
    pub fn data(&self) -> &DecodedResponse {
        &self.data
    }

    /// Derive the payment outcome from the status fields.
    pub fn outcome(&self) -> PaymentOutcome {
        match self.kind {
            MessageKind::Confirmation => match self.amai_field("Code") {
                Some(CODE_PROCESSED) => PaymentOutcome::Pending,
                Some(CODE_CANCELED) => PaymentOutcome::Cancelled,
                Some(CODE_ERRORED) => PaymentOutcome::Errored(
                    self.amai_field("Message")
                        .filter(|m| !m.is_empty())
                        .map(str::to_string),
                ),
                _ => PaymentOutcome::Unknown,
            },
            MessageKind::Status => match self.pmt_stat_field("StatCode") {
                Some(STATUS_EXECUTED) => PaymentOutcome::Successful,
                Some(STATUS_REJECTED) => PaymentOutcome::Cancelled,
                _ => PaymentOutcome::Unknown,
            },
        }
    }

    /// `true` only for a settled payment — a status message with code `E`.
    /// A confirmation never satisfies this, whatever its code.
    pub fn is_successful(&self) -> bool {
        self.outcome() == PaymentOutcome::Successful
    }

    /// `true` while the bank is still processing a confirmed payment.
    pub fn is_pending(&self) -> bool {
        self.outcome() == PaymentOutcome::Pending
    }

    /// `true` when the customer cancelled or the bank rejected.
    pub fn is_cancelled(&self) -> bool {
        self.outcome() == PaymentOutcome::Cancelled
    }

    /// `true` for the server-to-server status message. Callers use this to
    /// decide between rendering a page for the customer and returning a
    /// bare acknowledgment to the bank.
    pub fn is_server_to_server(&self) -> bool {
        self.kind == MessageKind::Status
    }

    /// The transaction reference the bank echoes back: nested in the Amai
    /// header for confirmations, flat in `PmtStat` for status messages.
    /// Both resolve to the reference the purchase was built with.
    pub fn transaction_reference(&self) -> Option<&str> {
        match self.kind {
            MessageKind::Confirmation => self.amai_field("RequestUID"),
            MessageKind::Status => self.pmt_stat_field("ExtId"),
        }
    }

    /// Human-readable outcome message, stable for existing integrations.
    pub fn message(&self) -> String {
        match self.outcome() {
            PaymentOutcome::Successful => "Payment was successful".to_string(),
            PaymentOutcome::Pending => "Payment is processing".to_string(),
            PaymentOutcome::Cancelled => "Payment has been canceled".to_string(),
            PaymentOutcome::Errored(Some(detail)) => format!("Bank internal error: {detail}"),
            PaymentOutcome::Errored(None) => "Bank internal error".to_string(),
            PaymentOutcome::Unknown => String::new(),
        }
    }

    fn amai_field(&self, key: &str) -> Option<&str> {
        self.data
            .get("Header")?
            .as_object()?
            .get("Extension")?
            .as_object()?
            .get("Amai")?
            .as_object()?
            .get(key)?
            .as_str()
    }

    fn pmt_stat_field(&self, key: &str) -> Option<&str> {
        self.data.get("PmtStat")?.as_object()?.get(key)?.as_str()
    }
}

#[cfg(test)]
impl CompleteResponse {
    /// Build a response directly from decoded data, skipping the gates.
    /// Classification tests should not have to run crypto.
    pub(crate) fn from_parts(kind: MessageKind, data: DecodedResponse) -> Self {
        Self { kind, data }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
