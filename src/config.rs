//! # Protocol Constants & Gateway Configuration
//!
//! Every magic string of the Digilink protocol lives here. The message
//! tokens, the protocol version, the endpoint URLs, the timestamp width —
//! all of it is fixed by the bank's specification, so if you change a value
//! in this file you are no longer speaking Digilink.
//!
//! [`GatewayConfig`] is the merchant side of the contract: identity fields
//! the bank prints on the payment screen, certificate paths for signing and
//! verification, and a couple of behavioral knobs (test mode, response
//! freshness window).

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Protocol Constants
// ---------------------------------------------------------------------------

/// Message token of the outbound payment request document.
pub const PAYMENT_REQUEST_MESSAGE: &str = "PMTREQ";

/// Message token of the interactive confirmation response. Delivered through
/// the customer's browser redirect. Never a final settlement status.
pub const PAYMENT_CONFIRMATION_MESSAGE: &str = "PMTRESP";

/// Message token of the server-to-server status response. This is the only
/// message that can report a payment as executed.
pub const PAYMENT_STATUS_MESSAGE: &str = "PMTSTATRESP";

/// Protocol version the bank expects in every document.
pub const PROTOCOL_VERSION: &str = "5.0";

/// Width of the protocol timestamp: `YYYYMMDDHHMMSS` plus the first three
/// digits of the microsecond field, truncated to 17 characters.
pub const TIMESTAMP_WIDTH: usize = 17;

/// The single form field both directions of the protocol travel in.
pub const XMLDATA_FIELD: &str = "xmldata";

/// Bank endpoint for test-mode traffic.
pub const TEST_ENDPOINT: &str = "https://astra.citadele.lv/amai/start.htm";

/// Bank endpoint for live traffic. Mistakes here cost real money.
pub const LIVE_ENDPOINT: &str = "https://online.citadele.lv/amai/start.htm";

/// How old a bank response may be before we refuse to act on it.
/// The bank's integration guide says 15 minutes; responses older than this
/// are treated as replays.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Default merchant country when the integrator does not override it.
pub const DEFAULT_MERCHANT_COUNTRY: &str = "LV";

/// Default payment-screen language when the integrator does not override it.
pub const DEFAULT_LANGUAGE: &str = "LV";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A required configuration field was left empty.
///
/// Raised before any template rendering or crypto work happens, so a
/// misconfigured gateway fails fast instead of producing a half-built
/// document the bank would reject anyway.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The named parameter is required for the attempted operation.
    #[error("The {0} parameter is required")]
    MissingParameter(&'static str),
}

// ---------------------------------------------------------------------------
// Gateway Configuration
// ---------------------------------------------------------------------------

/// Merchant-side configuration for the gateway.
///
/// Plain data: construct it with struct-update syntax over
/// [`GatewayConfig::default`] and validate with the `validate_for_*`
/// methods. The config is cloned into each request object, so concurrent
/// purchases and completions never share mutable state.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Merchant identifier assigned by the bank (the `From` header field).
    pub merchant_id: String,
    /// Merchant registration / legal id (`BenLegalId`).
    pub merchant_legal_id: String,
    /// Merchant display name (`BenName`), shown on the payment screen.
    pub merchant_name: String,
    /// Beneficiary account number (`BenAccNo`).
    pub merchant_bank_account: String,
    /// Beneficiary country code (`BenCountry`).
    pub merchant_country: String,
    /// Payment-screen language, uppercased into the request (`Language`).
    pub language: String,
    /// URL the bank redirects the customer back to (`ReturnURL`).
    pub return_url: String,
    /// PEM private key used to sign outbound requests.
    pub private_certificate_path: PathBuf,
    /// PEM X.509 certificate embedded in outbound signatures.
    pub public_certificate_path: PathBuf,
    /// PEM X.509 certificate of the bank, the sole trust anchor for
    /// verifying inbound responses.
    pub bank_certificate_path: PathBuf,
    /// Route traffic to the bank's test environment instead of production.
    pub test_mode: bool,
    /// Freshness window for inbound responses.
    pub response_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            merchant_id: String::new(),
            merchant_legal_id: String::new(),
            merchant_name: String::new(),
            merchant_bank_account: String::new(),
            merchant_country: DEFAULT_MERCHANT_COUNTRY.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            return_url: String::new(),
            private_certificate_path: PathBuf::new(),
            public_certificate_path: PathBuf::new(),
            bank_certificate_path: PathBuf::new(),
            test_mode: false,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }
}

impl GatewayConfig {
    /// The bank endpoint matching the configured mode.
    pub fn endpoint(&self) -> &'static str {
        if self.test_mode {
            TEST_ENDPOINT
        } else {
            LIVE_ENDPOINT
        }
    }

    /// Check every field a purchase request needs.
    ///
    /// Parameter names in the error keep the wire-level camelCase spelling
    /// integrators know from the bank's documentation.
    pub fn validate_for_purchase(&self) -> Result<(), ConfigurationError> {
        require_str(&self.merchant_id, "merchantId")?;
        require_str(&self.merchant_legal_id, "merchantLegalId")?;
        require_str(&self.merchant_name, "merchantName")?;
        require_str(&self.merchant_bank_account, "merchantBankAccount")?;
        require_str(&self.merchant_country, "merchantCountry")?;
        require_str(&self.return_url, "returnUrl")?;
        require_path(&self.private_certificate_path, "privateCertificatePath")?;
        require_path(&self.public_certificate_path, "publicCertificatePath")?;
        Ok(())
    }

    /// Check every field response completion needs.
    pub fn validate_for_complete(&self) -> Result<(), ConfigurationError> {
        require_path(&self.bank_certificate_path, "bankCertificatePath")
    }
}

fn require_str(value: &str, name: &'static str) -> Result<(), ConfigurationError> {
    if value.trim().is_empty() {
        return Err(ConfigurationError::MissingParameter(name));
    }
    Ok(())
}

fn require_path(value: &PathBuf, name: &'static str) -> Result<(), ConfigurationError> {
    if value.as_os_str().is_empty() {
        return Err(ConfigurationError::MissingParameter(name));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
