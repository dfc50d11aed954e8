//! Certificate bundle codec
//!
//! Converts X.509 certificates and private keys between their parsed form and
//! PEM text. Encoding is deterministic: LF line endings, 64-column base64, a
//! trailing newline. Decoding takes exactly one PEM block and rejects any DER
//! payload that is not a well-formed certificate or a usable private key.
//!
//! Private keys are accepted in PKCS#8, PKCS#1 (RSA) and SEC1 (EC) form. A key
//! only decodes if it loads as a signing key: RSA of at least 2048 bits, ECDSA
//! on P-256 or P-384, or Ed25519. The original encoding is kept so a decoded
//! key re-encodes byte for byte.

use crate::{Error, Result};
use ::pem::{EncodeConfig, LineEnding, Pem};
use rcgen::KeyPair;
use x509_parser::prelude::*;

pub const CERTIFICATE_PEM_TAG: &str = "CERTIFICATE";

/// A parsed X.509 certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    der: Vec<u8>,
    subject: String,
    issuer: String,
    serial: String,
    not_before: i64,
    not_after: i64,
}

impl Certificate {
    /// Parse a DER-encoded certificate
    pub fn from_der(der: Vec<u8>) -> Result<Self> {
        let (rest, cert) = X509Certificate::from_der(&der)
            .map_err(|e| Error::Certificate(e.to_string()))?;
        if !rest.is_empty() {
            return Err(Error::Certificate(format!(
                "{} trailing bytes after certificate",
                rest.len()
            )));
        }

        let subject = cert.subject().to_string();
        let issuer = cert.issuer().to_string();
        let serial = cert.raw_serial_as_string();
        let not_before = cert.validity().not_before.timestamp();
        let not_after = cert.validity().not_after.timestamp();

        Ok(Self {
            der,
            subject,
            issuer,
            serial,
            not_before,
            not_after,
        })
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Serial number as colon separated hex
    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Start of validity (Unix timestamp)
    pub fn not_before(&self) -> i64 {
        self.not_before
    }

    /// End of validity (Unix timestamp)
    pub fn not_after(&self) -> i64 {
        self.not_after
    }
}

/// Encoding a private key was stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFormat {
    /// PKCS#8 `PrivateKeyInfo`, any algorithm
    Pkcs8,
    /// PKCS#1 `RSAPrivateKey`
    Pkcs1,
    /// SEC1 `ECPrivateKey`
    Sec1,
}

impl KeyFormat {
    pub fn pem_tag(&self) -> &'static str {
        match self {
            Self::Pkcs8 => "PRIVATE KEY",
            Self::Pkcs1 => "RSA PRIVATE KEY",
            Self::Sec1 => "EC PRIVATE KEY",
        }
    }

    fn from_pem_tag(tag: &str) -> Option<Self> {
        match tag {
            "PRIVATE KEY" => Some(Self::Pkcs8),
            "RSA PRIVATE KEY" => Some(Self::Pkcs1),
            "EC PRIVATE KEY" => Some(Self::Sec1),
            _ => None,
        }
    }
}

/// Signature algorithm family of a private key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    Rsa,
    EcdsaP256,
    EcdsaP384,
    Ed25519,
}

/// A private key, kept in the DER encoding it was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateKey {
    format: KeyFormat,
    der: Vec<u8>,
    algorithm: KeyAlgorithm,
}

impl PrivateKey {
    /// Parse a DER-encoded private key in the given format
    pub fn from_der(format: KeyFormat, der: Vec<u8>) -> Result<Self> {
        let algorithm = load_key(format, &der)?;
        Ok(Self {
            format,
            der,
            algorithm,
        })
    }

    pub fn format(&self) -> KeyFormat {
        self.format
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }
}

// AlgorithmIdentifier values used to lift PKCS#1 and SEC1 keys into PKCS#8
const RSA_ENCRYPTION: &[u8] = &[
    0x30, 0x0d, 0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01, 0x05, 0x00,
];
const EC_PUBLIC_KEY_P256: &[u8] = &[
    0x30, 0x13, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, 0x06, 0x08, 0x2a, 0x86,
    0x48, 0xce, 0x3d, 0x03, 0x01, 0x07,
];
const EC_PUBLIC_KEY_P384: &[u8] = &[
    0x30, 0x10, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, 0x06, 0x05, 0x2b, 0x81,
    0x04, 0x00, 0x22,
];

/// Loads the key as a signing key pair and reports its algorithm
fn load_key(format: KeyFormat, der: &[u8]) -> Result<KeyAlgorithm> {
    let loaded = match format {
        KeyFormat::Pkcs8 => KeyPair::try_from(der),
        KeyFormat::Pkcs1 => KeyPair::try_from(wrap_pkcs8(RSA_ENCRYPTION, der)),
        // SEC1 may omit the curve, so try each supported one
        KeyFormat::Sec1 => KeyPair::try_from(wrap_pkcs8(EC_PUBLIC_KEY_P256, der))
            .or_else(|_| KeyPair::try_from(wrap_pkcs8(EC_PUBLIC_KEY_P384, der))),
    };
    let key_pair = loaded
        .map_err(|e| Error::PrivateKey(format!("invalid {}: {}", format.pem_tag(), e)))?;

    let algorithm = key_pair.algorithm();
    if algorithm == &rcgen::PKCS_RSA_SHA256 {
        Ok(KeyAlgorithm::Rsa)
    } else if algorithm == &rcgen::PKCS_ECDSA_P256_SHA256 {
        Ok(KeyAlgorithm::EcdsaP256)
    } else if algorithm == &rcgen::PKCS_ECDSA_P384_SHA384 {
        Ok(KeyAlgorithm::EcdsaP384)
    } else if algorithm == &rcgen::PKCS_ED25519 {
        Ok(KeyAlgorithm::Ed25519)
    } else {
        Err(Error::PrivateKey(format!(
            "unsupported key algorithm {:?}",
            algorithm
        )))
    }
}

/// PrivateKeyInfo { version 0, algorithm, OCTET STRING key }
fn wrap_pkcs8(algorithm: &[u8], key: &[u8]) -> Vec<u8> {
    let mut info = der_header(0x02, 1);
    info.push(0x00);
    info.extend_from_slice(algorithm);
    info.extend(der_header(0x04, key.len()));
    info.extend_from_slice(key);

    let mut wrapped = der_header(0x30, info.len());
    wrapped.extend(info);
    wrapped
}

fn der_header(tag: u8, len: usize) -> Vec<u8> {
    let mut header = vec![tag];
    if len < 0x80 {
        header.push(len as u8);
    } else {
        let bytes = len.to_be_bytes();
        let skip = bytes.iter().take_while(|b| **b == 0).count();
        header.push(0x80 | (bytes.len() - skip) as u8);
        header.extend_from_slice(&bytes[skip..]);
    }
    header
}

fn encode_block(tag: &str, der: &[u8]) -> String {
    let block = Pem::new(tag, der.to_vec());
    ::pem::encode_config(&block, EncodeConfig::new().set_line_ending(LineEnding::LF))
}

/// Exactly one PEM block; text around it is ignored
fn parse_block(text: &str) -> Result<Pem> {
    let mut blocks = ::pem::parse_many(text)?;
    match blocks.len() {
        0 => Err(::pem::PemError::MalformedFraming.into()),
        1 => Ok(blocks.remove(0)),
        found => Err(Error::PemBlockCount { found }),
    }
}

/// Encode a certificate as a PEM `CERTIFICATE` block
pub fn encode_certificate(cert: &Certificate) -> String {
    encode_block(CERTIFICATE_PEM_TAG, cert.der())
}

/// Encode a private key as a PEM block matching its format
pub fn encode_private_key(key: &PrivateKey) -> String {
    encode_block(key.format().pem_tag(), key.der())
}

/// Decode a single PEM `CERTIFICATE` block
pub fn decode_certificate(text: &str) -> Result<Certificate> {
    let block = parse_block(text)?;
    if block.tag() != CERTIFICATE_PEM_TAG {
        return Err(Error::UnexpectedPemTag {
            found: block.tag().to_string(),
            expected: CERTIFICATE_PEM_TAG,
        });
    }
    Certificate::from_der(block.into_contents())
}

/// Decode a single PEM private key block in any supported format
pub fn decode_private_key(text: &str) -> Result<PrivateKey> {
    let block = parse_block(text)?;
    let format = KeyFormat::from_pem_tag(block.tag()).ok_or_else(|| Error::UnexpectedPemTag {
        found: block.tag().to_string(),
        expected: "PRIVATE KEY, RSA PRIVATE KEY or EC PRIVATE KEY",
    })?;
    PrivateKey::from_der(format, block.into_contents())
}

/// A named certificate with its key and the locations the engine deploys it to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificatePki {
    pub certificate: Option<Certificate>,
    pub key: Option<PrivateKey>,
    pub config: String,
    pub name: String,
    pub common_name: String,
    pub ou_name: String,
    pub env_name: String,
    pub path: String,
    pub key_env_name: String,
    pub key_path: String,
    pub config_env_name: String,
    pub config_path: String,
}
