//! # Outbound Purchase Requests
//!
//! A purchase is a redirect, not an API call: the merchant renders a signed
//! `PMTREQ` document and POSTs it through the customer's browser to the
//! bank as a single `xmldata` form field. This module produces everything
//! the host application needs for that redirect and nothing else — the
//! actual HTTP mechanics belong to the caller.

use thiserror::Error;
use tracing::debug;

use crate::config::{ConfigurationError, GatewayConfig, PAYMENT_REQUEST_MESSAGE, XMLDATA_FIELD};
use crate::message::template::{self, TemplateError, TemplateVars};
use crate::message::timestamp;
use crate::xmlsec::{self, XmlSecError};

/// Errors from building a purchase redirect.
#[derive(Debug, Error)]
pub enum PurchaseError {
    /// A required configuration field is missing.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Template rendering failed.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Signing failed.
    #[error(transparent)]
    XmlSec(#[from] XmlSecError),
}

/// Per-purchase fields supplied by the caller.
#[derive(Clone, Debug)]
pub struct PurchaseOptions {
    /// Caller-supplied unique transaction reference. The bank echoes it in
    /// both response kinds; it is the join key for the whole flow.
    pub transaction_reference: String,
    /// Free-text payment description shown to the customer.
    pub description: String,
    /// Decimal amount string, passed through unvalidated.
    pub amount: String,
    /// ISO currency code, passed through unvalidated.
    pub currency: String,
}

/// A purchase in progress.
///
/// The timestamp is generated once at construction and is stable for the
/// lifetime of the instance: rendering twice produces the same document,
/// and the reference the caller stores matches what was actually sent.
pub struct PurchaseRequest {
    config: GatewayConfig,
    options: PurchaseOptions,
    timestamp: String,
}

/// Everything the host application needs to redirect the customer.
#[derive(Clone, Debug)]
pub struct PurchaseRedirect {
    /// The bank endpoint (test or live, per the config).
    pub endpoint: String,
    /// Always `POST`; the bank does not accept GET initiation.
    pub method: &'static str,
    /// The signed `PMTREQ` document, ready for the `xmldata` form field.
    pub xmldata: String,
}

impl PurchaseRedirect {
    /// The redirect form body as field pairs.
    pub fn form_data(&self) -> Vec<(&'static str, &str)> {
        vec![(XMLDATA_FIELD, self.xmldata.as_str())]
    }
}

impl PurchaseRequest {
    /// Stage a purchase. Cheap; no I/O or crypto happens until
    /// [`redirect`](Self::redirect).
    pub fn new(config: GatewayConfig, options: PurchaseOptions) -> Self {
        Self {
            config,
            options,
            timestamp: timestamp::now(),
        }
    }

    /// The request timestamp, fixed at construction.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Validate configuration, render the `PMTREQ` document, sign it, and
    /// return the redirect payload.
    pub fn redirect(&self) -> Result<PurchaseRedirect, PurchaseError> {
        self.config.validate_for_purchase()?;

        let xml = template::render(PAYMENT_REQUEST_MESSAGE, &self.template_vars())?;
        let xmldata = xmlsec::sign(
            &xml,
            &self.config.private_certificate_path,
            &self.config.public_certificate_path,
        )?;
        debug!(
            reference = %self.options.transaction_reference,
            endpoint = self.config.endpoint(),
            "built signed purchase redirect"
        );

        Ok(PurchaseRedirect {
            endpoint: self.config.endpoint().to_string(),
            method: "POST",
            xmldata,
        })
    }

    fn template_vars(&self) -> TemplateVars {
        let mut vars = TemplateVars::new();
        let mut set = |k: &str, v: &str| {
            vars.insert(k.to_string(), v.to_string());
        };
        set("Timestamp", &self.timestamp);
        set("From", &self.config.merchant_id);
        set("RequestUID", &self.options.transaction_reference);
        set("ReturnURL", &self.config.return_url);
        set("BenAccNo", &self.config.merchant_bank_account);
        set("BenName", &self.config.merchant_name);
        set("BenLegalId", &self.config.merchant_legal_id);
        set("BenCountry", &self.config.merchant_country);
        set("PmtInfo", &self.options.description);
        set("Amt", &self.options.amount);
        set("Ccy", &self.options.currency);
        set("Language", &self.config.language.to_uppercase());
        vars
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
