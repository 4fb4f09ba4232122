//! Digest header computation.
//!
//! The service verifies signatures with the device's public key, so the
//! padding below must match its verifier bit for bit. It is PKCS#1 v1.5 type 1
//! padding *without* the DigestInfo prefix, applied with a plain modular
//! exponentiation over the private exponent.

use core::fmt;

use base64::{engine::general_purpose, Engine};
use error_stack::{Report, ResultExt};
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey};
use sha2::{Digest, Sha256};

use crate::credential::{decode_private_key, DeviceCredential};
use crate::error::StkError;
use crate::request_signing::signing_date::current_signing_date;

/// Modulus length in bytes of the only supported key size (2048 bits).
pub const SIGNATURE_BLOCK_LEN: usize = 256;

const DIGEST_LEN: usize = 32;

/// Joins the five signed fields with `\n`, in the order the service
/// recomputes them.
#[must_use]
pub fn canonical_payload(
    method: &str,
    path: &str,
    signing_date: &str,
    body: &str,
    adp_token: &str,
) -> Vec<u8> {
    [method, path, signing_date, body, adp_token]
        .join("\n")
        .into_bytes()
}

/// Builds `0x00 0x01 0xFF.. 0x00 || digest`, exactly `block_len` bytes long.
///
/// # Errors
///
/// Returns [`StkError::Signing`] if `block_len` is not the supported modulus
/// length.
pub fn pad_digest(digest: &[u8; DIGEST_LEN], block_len: usize) -> Result<Vec<u8>, Report<StkError>> {
    if block_len != SIGNATURE_BLOCK_LEN {
        return Err(Report::new(StkError::Signing {
            message: format!(
                "unsupported key size: {} bits (expected {})",
                block_len * 8,
                SIGNATURE_BLOCK_LEN * 8
            ),
        }));
    }

    let mut block = Vec::with_capacity(block_len);
    block.extend_from_slice(&[0x00, 0x01]);
    block.resize(block_len - DIGEST_LEN - 1, 0xFF);
    block.push(0x00);
    block.extend_from_slice(digest);

    debug_assert_eq!(block.len(), block_len);
    Ok(block)
}

/// `block^d mod n`, big-endian, left-padded with zeros to the modulus length.
fn raw_private_transform(key: &RsaPrivateKey, block: &[u8]) -> Result<Vec<u8>, Report<StkError>> {
    let modulus_len = key.size();
    if block.len() != modulus_len {
        return Err(Report::new(StkError::Signing {
            message: format!(
                "padded block is {} bytes but the modulus is {modulus_len}",
                block.len()
            ),
        }));
    }

    let message = BigUint::from_bytes_be(block);
    if &message >= key.n() {
        return Err(Report::new(StkError::Signing {
            message: "padded block is not smaller than the modulus".into(),
        }));
    }

    let transformed = message.modpow(key.d(), key.n()).to_bytes_be();
    let mut out = vec![0u8; modulus_len - transformed.len()];
    out.extend_from_slice(&transformed);
    Ok(out)
}

/// Signs requests on behalf of one registered device.
///
/// The key is decoded once; the signer holds no mutable state and can be
/// shared across threads.
#[derive(Clone)]
pub struct RequestSigner {
    key: RsaPrivateKey,
    adp_token: String,
}

impl RequestSigner {
    /// # Errors
    ///
    /// Returns [`StkError::Signing`] if the credential's key does not decode
    /// or is not a 2048-bit RSA key.
    pub fn from_credential(credential: &DeviceCredential) -> Result<Self, Report<StkError>> {
        let key = decode_private_key(&credential.device_private_key).change_context(
            StkError::Signing {
                message: "device credential has no usable private key".into(),
            },
        )?;

        if key.size() != SIGNATURE_BLOCK_LEN {
            return Err(Report::new(StkError::Signing {
                message: format!(
                    "unsupported key size: {} bits (expected {})",
                    key.n().bits(),
                    SIGNATURE_BLOCK_LEN * 8
                ),
            }));
        }

        Ok(Self {
            key,
            adp_token: credential.adp_token.clone(),
        })
    }

    /// Value for the `X-ADP-Authentication-Token` header.
    #[must_use]
    pub fn adp_token(&self) -> &str {
        &self.adp_token
    }

    /// Computes the `X-ADP-Request-Digest` header value.
    ///
    /// `path` starts with `/` and includes any query string; `body` is the
    /// exact request body, or `""`. When `signing_date` is `None` the current
    /// UTC time is used, and the same value is both signed and appended.
    ///
    /// # Errors
    ///
    /// Returns [`StkError::Signing`] if the padded block does not fit the key.
    pub fn digest_header_for_request(
        &self,
        method: &str,
        path: &str,
        body: &str,
        signing_date: Option<&str>,
    ) -> Result<String, Report<StkError>> {
        let signing_date = signing_date.map_or_else(current_signing_date, str::to_owned);
        let payload = canonical_payload(method, path, &signing_date, body, &self.adp_token);
        let signature = self.sign_payload(&payload)?;

        log::debug!("Signed {method} {path} at {signing_date}");
        Ok(format!("{signature}:{signing_date}"))
    }

    /// Signs raw payload bytes and returns the standard base64 signature.
    ///
    /// # Errors
    ///
    /// Returns [`StkError::Signing`] if the padded block does not fit the key.
    pub fn sign_payload(&self, payload: &[u8]) -> Result<String, Report<StkError>> {
        let digest: [u8; DIGEST_LEN] = Sha256::digest(payload).into();
        let block = pad_digest(&digest, self.key.size())?;
        let signature = raw_private_transform(&self.key, &block)?;

        Ok(general_purpose::STANDARD.encode(signature))
    }
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("key_bits", &self.key.n().bits())
            .finish_non_exhaustive()
    }
}

/// One-shot form of [`RequestSigner::digest_header_for_request`].
///
/// # Errors
///
/// Returns [`StkError::Signing`] if the credential's key is unusable.
pub fn compute_digest_header(
    method: &str,
    path: &str,
    body: &str,
    credential: &DeviceCredential,
    timestamp: Option<&str>,
) -> Result<String, Report<StkError>> {
    RequestSigner::from_credential(credential)?.digest_header_for_request(
        method, path, body, timestamp,
    )
}
