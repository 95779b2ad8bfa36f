//! End-to-end tests for the Digilink gateway.
//!
//! These tests play both sides of the protocol: the merchant (through the
//! public gateway API) and the bank (by rendering response documents with
//! the registered templates and signing them with a locally generated key,
//! then pointing the gateway's trust anchor at that key's certificate).
//!
//! Each test generates its own keys into its own temp directory. No shared
//! state, no fixture files, no test ordering dependencies.

use std::path::PathBuf;

use chrono::{Duration, Utc};
use openssl::asn1::{Asn1Integer, Asn1Time};
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::x509::{X509, X509NameBuilder};
use tempfile::TempDir;

use digilink_gateway::config::{LIVE_ENDPOINT, PROTOCOL_VERSION};
use digilink_gateway::message::template::{self, TemplateVars};
use digilink_gateway::message::timestamp;
use digilink_gateway::xmlsec;
use digilink_gateway::{
    CompleteError, Gateway, GatewayConfig, PaymentOutcome, PurchaseOptions,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

struct Keys {
    #[allow(dead_code)]
    dir: TempDir,
    private_key_path: PathBuf,
    certificate_path: PathBuf,
}

/// Generate an RSA-2048 keypair and a self-signed certificate on disk.
fn generate_keys() -> Keys {
    let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", "gateway e2e").unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    builder
        .set_serial_number(&Asn1Integer::from_bn(&BigNum::from_u32(1).unwrap()).unwrap())
        .unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(365).unwrap())
        .unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();
    let cert = builder.build();

    let dir = TempDir::new().unwrap();
    let private_key_path = dir.path().join("key.pem");
    let certificate_path = dir.path().join("cert.pem");
    std::fs::write(&private_key_path, key.private_key_to_pem_pkcs8().unwrap()).unwrap();
    std::fs::write(&certificate_path, cert.to_pem().unwrap()).unwrap();

    Keys {
        dir,
        private_key_path,
        certificate_path,
    }
}

/// A gateway configured the way the merchant would configure it, with the
/// test keys doubling as the bank's (the tests sign "bank" responses with
/// the same keypair and trust its certificate).
fn gateway(keys: &Keys) -> Gateway {
    Gateway::new(GatewayConfig {
        merchant_id: "1".into(),
        merchant_legal_id: "9892".into(),
        merchant_name: "Some merchant".into(),
        merchant_bank_account: "PAXXX0011".into(),
        merchant_country: "LT".into(),
        return_url: "http://localhost:8080/return".into(),
        private_certificate_path: keys.private_key_path.clone(),
        public_certificate_path: keys.certificate_path.clone(),
        bank_certificate_path: keys.certificate_path.clone(),
        ..GatewayConfig::default()
    })
}

fn options() -> PurchaseOptions {
    PurchaseOptions {
        transaction_reference: "abc123".into(),
        description: "purchase description".into(),
        amount: "10.00".into(),
        currency: "EUR".into(),
    }
}

fn vars(pairs: &[(&str, &str)]) -> TemplateVars {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Render and sign a bank response as the bank would.
fn bank_response(keys: &Keys, template_id: &str, fields: &[(&str, &str)]) -> String {
    let xml = template::render(template_id, &vars(fields)).unwrap();
    xmlsec::sign(&xml, &keys.private_key_path, &keys.certificate_path).unwrap()
}

fn confirmation_fields<'a>(code: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("Timestamp", ""), // replaced per call
        ("RequestUID", "abc123"),
        ("Version", PROTOCOL_VERSION),
        ("Code", code),
    ]
}

fn with_fresh_timestamp<'a>(mut fields: Vec<(&'a str, &'a str)>, ts: &'a str) -> Vec<(&'a str, &'a str)> {
    for field in fields.iter_mut() {
        if field.0 == "Timestamp" {
            field.1 = ts;
        }
    }
    fields
}

// ---------------------------------------------------------------------------
// Purchase
// ---------------------------------------------------------------------------

#[test]
fn purchase_builds_a_verifiable_post_redirect() {
    let keys = generate_keys();
    let gw = gateway(&keys);

    let redirect = gw.purchase(options()).redirect().unwrap();

    assert_eq!(redirect.method, "POST");
    assert_eq!(redirect.endpoint, LIVE_ENDPOINT);
    assert_eq!(redirect.form_data().len(), 1);
    assert_eq!(redirect.form_data()[0].0, "xmldata");
    assert!(xmlsec::verify(&redirect.xmldata, &keys.certificate_path).unwrap());
}

#[test]
fn purchase_with_unconfigured_gateway_names_the_missing_parameter() {
    let gw = Gateway::new(GatewayConfig::default());
    let err = gw.purchase(options()).redirect().unwrap_err();
    assert_eq!(err.to_string(), "The merchantId parameter is required");
}

#[test]
fn tampered_purchase_payload_no_longer_verifies() {
    let keys = generate_keys();
    let redirect = gateway(&keys).purchase(options()).redirect().unwrap();
    let tampered = redirect.xmldata.replace("10.00", "99.99");
    assert!(!xmlsec::verify(&tampered, &keys.certificate_path).unwrap());
}

// ---------------------------------------------------------------------------
// Complete: Confirmation (PMTRESP)
// ---------------------------------------------------------------------------

#[test]
fn pending_confirmation() {
    let keys = generate_keys();
    let ts = timestamp::now();
    let signed = bank_response(
        &keys,
        "PMTRESP",
        &with_fresh_timestamp(confirmation_fields("100"), &ts),
    );

    let response = gateway(&keys)
        .complete_purchase()
        .process(Some(&signed))
        .unwrap();

    assert!(response.is_pending());
    assert!(!response.is_successful());
    assert!(!response.is_cancelled());
    assert!(!response.is_server_to_server());
    assert_eq!(response.transaction_reference(), Some("abc123"));
    assert_eq!(response.message(), "Payment is processing");
}

#[test]
fn cancelled_confirmation() {
    let keys = generate_keys();
    let ts = timestamp::now();
    let signed = bank_response(
        &keys,
        "PMTRESP",
        &with_fresh_timestamp(confirmation_fields("200"), &ts),
    );

    let response = gateway(&keys)
        .complete_purchase()
        .process(Some(&signed))
        .unwrap();

    assert!(response.is_cancelled());
    assert!(!response.is_pending());
    assert!(!response.is_server_to_server());
    assert_eq!(response.transaction_reference(), Some("abc123"));
    assert_eq!(response.message(), "Payment has been canceled");
}

#[test]
fn errored_confirmation_with_bank_message() {
    let keys = generate_keys();
    let ts = timestamp::now();
    let mut fields = with_fresh_timestamp(confirmation_fields("300"), &ts);
    fields.push(("Message", "no electricity"));
    let signed = bank_response(&keys, "PMTRESP", &fields);

    let response = gateway(&keys)
        .complete_purchase()
        .process(Some(&signed))
        .unwrap();

    assert_eq!(
        response.outcome(),
        PaymentOutcome::Errored(Some("no electricity".to_string()))
    );
    assert_eq!(response.message(), "Bank internal error: no electricity");
    assert_eq!(response.transaction_reference(), Some("abc123"));
}

#[test]
fn errored_confirmation_without_bank_message() {
    // The bank sometimes omits the Message node entirely.
    let keys = generate_keys();
    let ts = timestamp::now();
    let signed = bank_response(
        &keys,
        "PMTRESP",
        &with_fresh_timestamp(confirmation_fields("300"), &ts),
    );

    let response = gateway(&keys)
        .complete_purchase()
        .process(Some(&signed))
        .unwrap();

    assert_eq!(response.outcome(), PaymentOutcome::Errored(None));
    assert_eq!(response.message(), "Bank internal error");
}

// ---------------------------------------------------------------------------
// Complete: Status (PMTSTATRESP)
// ---------------------------------------------------------------------------

fn status_fields<'a>(stat_code: &'a str, ts: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("Timestamp", ts),
        ("ExtId", "abc123"),
        ("DocNo", "abc123"),
        ("Version", PROTOCOL_VERSION),
        ("StatCode", stat_code),
    ]
}

#[test]
fn executed_status_is_the_success_path() {
    let keys = generate_keys();
    let ts = timestamp::now();
    let signed = bank_response(&keys, "PMTSTATRESP", &status_fields("E", &ts));

    let response = gateway(&keys)
        .complete_purchase()
        .process(Some(&signed))
        .unwrap();

    assert!(response.is_successful());
    assert!(!response.is_pending());
    assert!(!response.is_cancelled());
    assert!(response.is_server_to_server());
    assert_eq!(response.transaction_reference(), Some("abc123"));
    assert_eq!(response.message(), "Payment was successful");
}

#[test]
fn rejected_status_is_cancelled() {
    let keys = generate_keys();
    let ts = timestamp::now();
    let signed = bank_response(&keys, "PMTSTATRESP", &status_fields("R", &ts));

    let response = gateway(&keys)
        .complete_purchase()
        .process(Some(&signed))
        .unwrap();

    assert!(response.is_cancelled());
    assert!(!response.is_successful());
    assert!(response.is_server_to_server());
    assert_eq!(response.transaction_reference(), Some("abc123"));
    assert_eq!(response.message(), "Payment has been canceled");
}

// ---------------------------------------------------------------------------
// Complete: Validation Gates
// ---------------------------------------------------------------------------

#[test]
fn unsupported_response_type_is_rejected() {
    let keys = generate_keys();
    let ts = timestamp::now();
    // Render a valid status response, then swap the token before signing,
    // so the signature itself is fine and only the type gate fires.
    let xml = template::render("PMTSTATRESP", &vars(&status_fields("R", &ts))).unwrap();
    let forged = xml.replace("PMTSTATRESP", "AUTHRESP");
    let signed = xmlsec::sign(&forged, &keys.private_key_path, &keys.certificate_path).unwrap();

    let err = gateway(&keys)
        .complete_purchase()
        .process(Some(&signed))
        .unwrap_err();
    assert!(matches!(err, CompleteError::InvalidResponseType));
    assert_eq!(err.to_string(), "Invalid response type");
}

#[test]
fn stale_timestamp_is_rejected_one_second_past_the_window() {
    let keys = generate_keys();
    let stale = timestamp::generate(Utc::now() - Duration::seconds(15 * 60 + 1));
    let signed = bank_response(&keys, "PMTSTATRESP", &status_fields("R", &stale));

    let err = gateway(&keys)
        .complete_purchase()
        .process(Some(&signed))
        .unwrap_err();
    assert!(matches!(err, CompleteError::TimestampExpired(15)));
    assert_eq!(
        err.to_string(),
        "Timestamp exceed allowed timeout (15 minutes)"
    );
}

#[test]
fn timestamp_exactly_at_the_window_is_accepted() {
    let keys = generate_keys();
    // Freshness is judged against a pinned "now" so the limit case cannot
    // drift while the keys generate and the document signs.
    let now = Utc::now();
    let at_limit = timestamp::generate(now - Duration::seconds(15 * 60));
    let signed = bank_response(&keys, "PMTSTATRESP", &status_fields("R", &at_limit));

    let response = gateway(&keys)
        .complete_purchase()
        .process_at(Some(&signed), now)
        .unwrap();
    assert!(response.is_cancelled());
}

#[test]
fn response_signed_by_an_untrusted_key_is_rejected() {
    let keys = generate_keys();
    let intruder = generate_keys();
    let ts = timestamp::now();
    // Signed by "someone" whose certificate is not the configured anchor.
    let signed = bank_response(&intruder, "PMTSTATRESP", &status_fields("E", &ts));

    let err = gateway(&keys)
        .complete_purchase()
        .process(Some(&signed))
        .unwrap_err();
    assert!(matches!(err, CompleteError::SignatureInvalid));
    assert_eq!(
        err.to_string(),
        "Data is corrupt or has been changed by a third party"
    );
}

#[test]
fn tampered_response_is_rejected() {
    let keys = generate_keys();
    let ts = timestamp::now();
    let signed = bank_response(&keys, "PMTSTATRESP", &status_fields("R", &ts));
    let tampered = signed.replace("<StatCode>R</StatCode>", "<StatCode>E</StatCode>");

    let err = gateway(&keys)
        .complete_purchase()
        .process(Some(&tampered))
        .unwrap_err();
    assert!(matches!(err, CompleteError::SignatureInvalid));
}

#[test]
fn missing_payload_is_rejected() {
    let keys = generate_keys();
    let gw = gateway(&keys);

    let err = gw.complete_purchase().process(None).unwrap_err();
    assert!(matches!(err, CompleteError::MissingPayload));
    assert_eq!(err.to_string(), "Missing xmldata value");

    let err = gw.complete_purchase().process(Some("")).unwrap_err();
    assert!(matches!(err, CompleteError::MissingPayload));
}

#[test]
fn unparsable_payload_is_rejected() {
    let keys = generate_keys();
    let err = gateway(&keys)
        .complete_purchase()
        .process(Some("<xml.../."))
        .unwrap_err();
    assert!(matches!(err, CompleteError::InvalidXml));
    assert_eq!(err.to_string(), "Invalid xml");
}
