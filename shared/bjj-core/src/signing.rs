//! CloudFront signed URLs
//!
//! Private clips are served through a CloudFront distribution that only
//! accepts requests carrying a custom policy, an RSA-SHA1 signature of that
//! policy and the id of the key pair that produced it. The policy grants
//! access to exactly one resource URL until an absolute epoch time.

use crate::clock::{Clock, SystemClock};
use crate::{BJJCoreError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Default lifetime of a signed URL (one hour)
pub const DEFAULT_EXPIRY_SECS: u64 = 3600;

const POLICY_PARAM: &str = "Policy";
const SIGNATURE_PARAM: &str = "Signature";
const KEY_PAIR_ID_PARAM: &str = "Key-Pair-Id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Policy {
    #[serde(rename = "Statement")]
    statement: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Statement {
    #[serde(rename = "Resource")]
    resource: String,
    #[serde(rename = "Condition")]
    condition: Condition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Condition {
    #[serde(rename = "DateLessThan")]
    date_less_than: EpochTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct EpochTime {
    #[serde(rename = "AWS:EpochTime")]
    epoch_time: i64,
}

/// Serialize the access policy for `resource` expiring at `expires_at` (epoch seconds).
///
/// The output is compact JSON with a fixed field order; these exact bytes are
/// what gets signed.
pub fn policy_document(resource: &str, expires_at: i64) -> Result<String> {
    let policy = Policy {
        statement: vec![Statement {
            resource: resource.to_string(),
            condition: Condition {
                date_less_than: EpochTime {
                    epoch_time: expires_at,
                },
            },
        }],
    };

    serde_json::to_string(&policy)
        .map_err(|e| BJJCoreError::Signing(format!("Failed to serialize policy: {}", e)))
}

/// Base64 with CloudFront's query-safe alphabet (`+`→`-`, `=`→`_`, `/`→`~`)
pub fn cloudfront_b64_encode(bytes: &[u8]) -> String {
    STANDARD
        .encode(bytes)
        .chars()
        .map(|c| match c {
            '+' => '-',
            '=' => '_',
            '/' => '~',
            other => other,
        })
        .collect()
}

/// Inverse of [`cloudfront_b64_encode`]
pub fn cloudfront_b64_decode(encoded: &str) -> Result<Vec<u8>> {
    let standard: String = encoded
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '=',
            '~' => '/',
            other => other,
        })
        .collect();

    STANDARD
        .decode(standard)
        .map_err(|e| BJJCoreError::InvalidInput(format!("Invalid CloudFront base64: {}", e)))
}

/// Strip leading slashes from an object key; blank keys are rejected.
pub fn normalize_key(key: &str) -> Result<&str> {
    let key = key.trim().trim_start_matches('/');
    if key.is_empty() {
        return Err(BJJCoreError::InvalidInput("Object key is empty".to_string()));
    }
    Ok(key)
}

/// Strip scheme and trailing slashes from a configured CDN domain.
pub fn normalize_domain(domain: &str) -> String {
    domain
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .to_string()
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(BJJCoreError::Configuration(format!("{} must be set", name))),
    }
}

/// Load an unencrypted RSA private key from PEM (PKCS#1 or PKCS#8).
pub fn parse_private_key_pem(pem: &str) -> Result<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs1_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs8_pem(pem))
        .map_err(|e| BJJCoreError::Signing(format!("Failed to parse private key: {}", e)))
}

/// Signs CloudFront URLs for a single distribution and key pair.
#[derive(Clone)]
pub struct CloudFrontSigner {
    domain: String,
    key_pair_id: String,
    signing_key: SigningKey<Sha1>,
    public_key: RsaPublicKey,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for CloudFrontSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudFrontSigner")
            .field("domain", &self.domain)
            .field("key_pair_id", &self.key_pair_id)
            .finish_non_exhaustive()
    }
}

impl CloudFrontSigner {
    /// Create a signer from an already loaded private key
    pub fn new(domain: &str, key_pair_id: &str, private_key: RsaPrivateKey) -> Result<Self> {
        let domain = normalize_domain(required(Some(domain), "CLOUDFRONT_DOMAIN")?);
        if domain.is_empty() {
            return Err(BJJCoreError::Configuration(
                "CLOUDFRONT_DOMAIN must be set".to_string(),
            ));
        }
        let key_pair_id = required(Some(key_pair_id), "CLOUDFRONT_KEY_ID")?.to_string();
        let public_key = RsaPublicKey::from(&private_key);

        Ok(Self {
            domain,
            key_pair_id,
            signing_key: SigningKey::<Sha1>::new(private_key),
            public_key,
            clock: Arc::new(SystemClock),
        })
    }

    /// Create a signer from PEM text
    pub fn from_pem(domain: &str, key_pair_id: &str, pem: &str) -> Result<Self> {
        Self::new(domain, key_pair_id, parse_private_key_pem(pem)?)
    }

    /// Create a signer from optional settings, reading the private key file.
    ///
    /// Missing settings are configuration errors; an unreadable or malformed
    /// key file is a signing error.
    pub fn from_key_file(
        domain: Option<&str>,
        key_pair_id: Option<&str>,
        key_file: Option<&Path>,
    ) -> Result<Self> {
        let domain = required(domain, "CLOUDFRONT_DOMAIN")?;
        let key_pair_id = required(key_pair_id, "CLOUDFRONT_KEY_ID")?;
        let key_file = key_file
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| BJJCoreError::Configuration("CLOUDFRONT_KEY_FILE must be set".to_string()))?;

        let pem = std::fs::read_to_string(key_file).map_err(|e| {
            BJJCoreError::Signing(format!(
                "CloudFront private key file not readable: {}: {}",
                key_file.display(),
                e
            ))
        })?;

        debug!("🔑 Loaded CloudFront private key from {}", key_file.display());
        Self::from_pem(domain, key_pair_id, &pem)
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn key_pair_id(&self) -> &str {
        &self.key_pair_id
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// Unsigned resource URL for an object key
    pub fn resource_url(&self, key: &str) -> Result<String> {
        Ok(format!("https://{}/{}", self.domain, normalize_key(key)?))
    }

    /// Sign `key` for `expires_in` seconds from now.
    pub fn sign(&self, key: &str, expires_in: u64) -> Result<String> {
        let resource = self.resource_url(key)?;
        self.sign_resource(&resource, expires_in)
    }

    /// Sign a stored canonical URL of this distribution.
    ///
    /// The object key is whatever follows `{domain}/`; URLs on another host
    /// fall back to their path.
    pub fn sign_resource_url(&self, url: &str, expires_in: u64) -> Result<String> {
        let key = self.key_from_url(url)?;
        self.sign(&key, expires_in)
    }

    /// Object key of a canonical URL, without any query string
    pub fn key_from_url(&self, url: &str) -> Result<String> {
        crate::naming::key_from_url(&self.domain, url)
    }

    fn sign_resource(&self, resource: &str, expires_in: u64) -> Result<String> {
        if expires_in == 0 {
            return Err(BJJCoreError::InvalidInput(
                "Expiry must be at least one second".to_string(),
            ));
        }
        let expires_in = i64::try_from(expires_in)
            .map_err(|_| BJJCoreError::InvalidInput(format!("Expiry too large: {}", expires_in)))?;
        let expires_at = self
            .clock
            .now()
            .timestamp()
            .checked_add(expires_in)
            .ok_or_else(|| BJJCoreError::InvalidInput("Expiry overflows epoch time".to_string()))?;

        let policy = policy_document(resource, expires_at)?;
        let signature = self
            .signing_key
            .try_sign(policy.as_bytes())
            .map_err(|e| BJJCoreError::Signing(format!("Failed to sign policy: {}", e)))?;

        debug!("✍️ Signed {} until {}", resource, expires_at);

        Ok(format!(
            "{}?{}={}&{}={}&{}={}",
            resource,
            POLICY_PARAM,
            cloudfront_b64_encode(policy.as_bytes()),
            SIGNATURE_PARAM,
            cloudfront_b64_encode(&signature.to_bytes()),
            KEY_PAIR_ID_PARAM,
            self.key_pair_id
        ))
    }

    /// Verifier for URLs produced by this signer, sharing its clock
    pub fn verifier(&self) -> SignedUrlVerifier {
        SignedUrlVerifier::new(&self.key_pair_id, self.public_key.clone())
            .with_clock(Arc::clone(&self.clock))
    }
}

/// Outcome of a successful verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedUrl {
    pub resource: String,
    pub expires_at: i64,
}

/// Checks signed URLs the way the CDN edge does.
#[derive(Clone)]
pub struct SignedUrlVerifier {
    key_pair_id: String,
    verifying_key: VerifyingKey<Sha1>,
    clock: Arc<dyn Clock>,
}

impl SignedUrlVerifier {
    pub fn new(key_pair_id: &str, public_key: RsaPublicKey) -> Self {
        Self {
            key_pair_id: key_pair_id.to_string(),
            verifying_key: VerifyingKey::<Sha1>::new(public_key),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Verify signature, resource binding and expiry of a signed URL.
    ///
    /// Access is granted only while the current time is strictly before the
    /// policy's `AWS:EpochTime`.
    pub fn verify(&self, signed_url: &str) -> Result<VerifiedUrl> {
        let (resource, _) = signed_url
            .split_once('?')
            .ok_or_else(|| rejected("URL carries no signature parameters"))?;

        let parsed = url::Url::parse(signed_url)
            .map_err(|e| BJJCoreError::InvalidInput(format!("Invalid URL: {}", e)))?;
        let param = |name: &str| {
            parsed
                .query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
                .ok_or_else(|| rejected(&format!("Missing {} parameter", name)))
        };

        let key_pair_id = param(KEY_PAIR_ID_PARAM)?;
        if key_pair_id != self.key_pair_id {
            return Err(rejected(&format!("Unknown key pair: {}", key_pair_id)));
        }

        let policy_bytes = cloudfront_b64_decode(&param(POLICY_PARAM)?)?;
        let signature_bytes = cloudfront_b64_decode(&param(SIGNATURE_PARAM)?)?;
        let signature = Signature::try_from(signature_bytes.as_slice())
            .map_err(|e| rejected(&format!("Malformed signature: {}", e)))?;
        self.verifying_key
            .verify(&policy_bytes, &signature)
            .map_err(|_| rejected("Signature does not match policy"))?;

        let policy: Policy = serde_json::from_slice(&policy_bytes)
            .map_err(|e| rejected(&format!("Malformed policy: {}", e)))?;
        let statement = match policy.statement.as_slice() {
            [single] => single,
            _ => return Err(rejected("Policy must contain exactly one statement")),
        };

        if statement.resource != resource {
            return Err(rejected(&format!(
                "Policy grants {} not {}",
                statement.resource, resource
            )));
        }

        let expires_at = statement.condition.date_less_than.epoch_time;
        if self.clock.now().timestamp() >= expires_at {
            return Err(rejected(&format!("URL expired at {}", expires_at)));
        }

        Ok(VerifiedUrl {
            resource: statement.resource.clone(),
            expires_at,
        })
    }
}

fn rejected(reason: &str) -> BJJCoreError {
    BJJCoreError::Verification(reason.to_string())
}
