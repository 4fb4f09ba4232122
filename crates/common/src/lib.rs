//! Core library for the send-to-device client.
//!
//! Turns a device registration response into a credential, signs requests
//! with that credential, and builds the service calls that list devices and
//! deliver documents. Nothing here performs I/O on the network itself; see
//! [`client::HttpTransport`].
//!
//! # Modules
//!
//! - [`api`]: Request builders and response decoders for each endpoint
//! - [`client`]: Registered device session over a pluggable transport
//! - [`constants`]: Header names and fixed protocol values
//! - [`credential`]: Device credential model and registration parsing
//! - [`error`]: Error types and error handling utilities
//! - [`models`]: JSON bodies exchanged with the delivery service
//! - [`oauth`]: PKCE sign-in URL and authorization code handling
//! - [`request_signing`]: `X-ADP-Request-Digest` computation
//! - [`settings`]: Configuration management and validation
//! - [`storage`]: Client file persistence and the JSON key-value store
//! - [`test_support`]: Testing fixtures
//! - [`xml`]: Minimal element tree parser for registration responses

pub mod api;
pub mod client;
pub mod constants;
pub mod credential;
pub mod error;
pub mod models;
pub mod oauth;
pub mod request_signing;
pub mod settings;
pub mod storage;
pub mod test_support;
pub mod xml;
