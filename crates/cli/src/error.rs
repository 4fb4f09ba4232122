//! CLI error types.

use std::fmt;

use error_stack::Report;
use stk_client_common::error::StkError;

#[derive(Debug)]
pub enum CliError {
    /// Bad arguments or missing local state
    Config(String),
    /// IO error
    Io(std::io::Error),
    /// Error raised by the client library
    Client(Report<StkError>),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Io(err) => write!(f, "IO error: {}", err),
            CliError::Client(report) => write!(f, "{:?}", report),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io(err)
    }
}

impl From<Report<StkError>> for CliError {
    fn from(report: Report<StkError>) -> Self {
        CliError::Client(report)
    }
}
