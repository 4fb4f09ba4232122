//! Error types for the send-to-device client.
//!
//! All fallible operations in this crate return
//! `Result<T, error_stack::Report<StkError>>`; callers add context with
//! `change_context` / `attach` as the error travels outwards.

use derive_more::{Display, Error};

/// Errors raised by credential handling, request signing and the API layer.
///
/// None of these are transient: the same input produces the same error, so
/// nothing in this crate retries.
#[derive(Debug, Display, Error)]
pub enum StkError {
    /// A required credential field is missing after projecting the
    /// registration response onto the known schema.
    #[display("Malformed device credential: {message}")]
    MalformedCredential { message: String },

    /// The device private key does not decode to an RSA key.
    #[display("Invalid device private key: {message}")]
    InvalidKey { message: String },

    /// The key cannot be used with the digest scheme (unsupported modulus size
    /// or a block that does not fit the modulus).
    #[display("Request signing failed: {message}")]
    Signing { message: String },

    /// The registration response is not well-formed XML.
    #[display("XML parse error: {message}")]
    XmlParse { message: String },

    /// JSON encoding or decoding failed.
    #[display("Serialization error: {message}")]
    Serialization { message: String },

    /// Reading or writing a persisted file failed.
    #[display("Storage error: {message}")]
    Storage { message: String },

    /// Settings could not be loaded or validated.
    #[display("Configuration error: {message}")]
    Configuration { message: String },

    /// The OAuth redirect could not be interpreted.
    #[display("OAuth error: {message}")]
    OAuth { message: String },

    /// The request could not be delivered or its response not read.
    #[display("Transport error: {message}")]
    Transport { message: String },

    /// The service answered with a non-success status.
    #[display("API error: HTTP {status} {body}")]
    Api { status: u16, body: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            StkError::MalformedCredential {
                message: "missing adp_token".into()
            }
            .to_string(),
            "Malformed device credential: missing adp_token"
        );
        assert_eq!(
            StkError::Signing {
                message: "unsupported key size".into()
            }
            .to_string(),
            "Request signing failed: unsupported key size"
        );
        assert_eq!(
            StkError::Api {
                status: 401,
                body: "{\"error\":\"unauth\"}".into()
            }
            .to_string(),
            "API error: HTTP 401 {\"error\":\"unauth\"}"
        );
    }
}
