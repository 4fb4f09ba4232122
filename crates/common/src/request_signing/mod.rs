//! Request signing for authenticated service calls.
//!
//! Every authenticated request carries an `X-ADP-Request-Digest` header of the
//! form `<base64 signature>:<timestamp>`. The signature is a raw RSA
//! private-exponent transform over a fixed `0xFF` padding block wrapping the
//! SHA-256 of the canonical request payload.

pub mod signing;
pub mod signing_date;

pub use signing::*;
pub use signing_date::*;
