//! # Protocol Messages
//!
//! Everything between "the merchant wants to charge a card-less customer"
//! and "the bank said yes/no" lives here:
//!
//! - **template** — the three registered document layouts (`PMTREQ`,
//!   `PMTRESP`, `PMTSTATRESP`) rendered from typed field maps.
//! - **timestamp** — the protocol's 17-character timestamp: generation,
//!   parsing, freshness.
//! - **decode** — the lossy XML-to-map view of a verified response.
//! - **purchase** — outbound: render, sign, hand the caller a redirect
//!   payload.
//! - **complete** — inbound: the five-gate validation pipeline and the
//!   payment-outcome classification.

pub mod complete;
pub mod decode;
pub mod purchase;
pub mod template;
pub mod timestamp;

pub use complete::{CompleteError, CompleteRequest, CompleteResponse, MessageKind, PaymentOutcome};
pub use purchase::{PurchaseError, PurchaseOptions, PurchaseRedirect, PurchaseRequest};
pub use template::{render, TemplateError, TemplateVars};
