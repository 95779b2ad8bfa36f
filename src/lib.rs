//! # Digilink Gateway — Core Library
//!
//! Message construction, XML-DSig signing, and response verification for the
//! Citadele Digilink (AMAI) bank-link payment flow: a redirect-based purchase
//! followed by an asynchronous signed confirmation callback.
//!
//! The flow looks simple from the outside and is anything but:
//!
//! 1. The merchant renders a `PMTREQ` document, signs it with an enveloped
//!    XML signature, and redirect-POSTs it to the bank as a single `xmldata`
//!    form field.
//! 2. The customer confirms (or cancels) the payment on the bank's site.
//! 3. The bank POSTs back a signed `PMTRESP` (interactive confirmation) and,
//!    later, a signed `PMTSTATRESP` (server-to-server settlement status).
//!
//! The part people get wrong: a `PMTRESP` with code `100` means the payment
//! *reached* the bank, not that it settled. Only a `PMTSTATRESP` with status
//! `E` confirms money actually moved. Treating "pending" as "paid" is how
//! merchants ship goods for free. This library keeps the two outcomes apart
//! by construction.
//!
//! ## Architecture
//!
//! The crate is split into modules that mirror the actual concerns of a
//! bank-link integration:
//!
//! - **config** — protocol constants, endpoints, and merchant configuration.
//! - **xmlsec** — enveloped XML-DSig signing and verification (RSA-SHA256
//!   over a SHA-1 reference digest, exclusive C14N). Trust is anchored in a
//!   caller-supplied bank certificate, never in the document itself.
//! - **message** — document templates, the lossy XML-to-map decoder, the
//!   17-character protocol timestamp, and the purchase/complete state
//!   machines that turn bank responses into a [`PaymentOutcome`].
//! - **gateway** — a thin façade tying configuration and messages together.
//!
//! Everything is synchronous and stateless per call. Key material is loaded
//! from caller-supplied paths on every operation and released on every exit
//! path; nothing is cached between calls. Durable transaction state is the
//! caller's problem — this crate classifies single responses.
//!
//! ## Example
//!
//! ```no_run
//! use digilink_gateway::{Gateway, GatewayConfig, PurchaseOptions};
//!
//! let config = GatewayConfig {
//!     merchant_id: "1".into(),
//!     merchant_legal_id: "9892".into(),
//!     merchant_name: "Some merchant".into(),
//!     merchant_bank_account: "PAXXX0011".into(),
//!     return_url: "https://shop.example/return".into(),
//!     private_certificate_path: "certs/merchant.key.pem".into(),
//!     public_certificate_path: "certs/merchant.crt.pem".into(),
//!     bank_certificate_path: "certs/bank.crt.pem".into(),
//!     ..GatewayConfig::default()
//! };
//! let gateway = Gateway::new(config);
//!
//! // Outbound: build the redirect payload.
//! let redirect = gateway
//!     .purchase(PurchaseOptions {
//!         transaction_reference: "abc123".into(),
//!         description: "purchase description".into(),
//!         amount: "10.00".into(),
//!         currency: "EUR".into(),
//!     })
//!     .redirect()?;
//! assert_eq!(redirect.method, "POST");
//!
//! // Inbound: classify a bank callback.
//! # let posted_xmldata: Option<&str> = None;
//! let response = gateway.complete_purchase().process(posted_xmldata)?;
//! if response.is_successful() {
//!     // settle the order — this only fires on a PMTSTATRESP with status E
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod gateway;
pub mod message;
pub mod xmlsec;

pub use config::{ConfigurationError, GatewayConfig};
pub use gateway::Gateway;
pub use message::complete::{
    CompleteError, CompleteRequest, CompleteResponse, MessageKind, PaymentOutcome,
};
pub use message::purchase::{PurchaseError, PurchaseOptions, PurchaseRedirect, PurchaseRequest};
pub use xmlsec::XmlSecError;
