//! On-the-fly RSA key and certificate fixtures for tests.
//!
//! Real integrations load bank-issued material from disk; tests generate a
//! throwaway RSA-2048 keypair and a self-signed certificate into a temp
//! directory so every test run uses fresh, independent keys.

use std::path::PathBuf;

use openssl::asn1::{Asn1Integer, Asn1Time};
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::x509::{X509, X509NameBuilder};
use tempfile::TempDir;

pub(crate) struct TestKeys {
    // Held for its Drop: the directory lives as long as the paths do.
    #[allow(dead_code)]
    pub dir: TempDir,
    pub private_key_path: PathBuf,
    pub certificate_path: PathBuf,
}

pub(crate) fn generate() -> TestKeys {
    let rsa = Rsa::generate(2048).unwrap();
    let key = PKey::from_rsa(rsa).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", "digilink-gateway test").unwrap();
    let name = name.build();

    let serial = Asn1Integer::from_bn(&BigNum::from_u32(1).unwrap()).unwrap();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    builder.set_serial_number(&serial).unwrap();
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
    let certificate = builder.build();

    let dir = TempDir::new().unwrap();
    let private_key_path = dir.path().join("key.pem");
    let certificate_path = dir.path().join("cert.pem");
    std::fs::write(&private_key_path, key.private_key_to_pem_pkcs8().unwrap()).unwrap();
    std::fs::write(&certificate_path, certificate.to_pem().unwrap()).unwrap();

    TestKeys {
        dir,
        private_key_path,
        certificate_path,
    }
}
