//! Blocking HTTP transport backed by `ureq`.

use error_stack::{Report, ResultExt};
use http::{Request, Response};
use stk_client_common::client::HttpTransport;
use stk_client_common::error::StkError;

/// Executes requests with a shared `ureq` agent.
///
/// Non-success statuses are returned as responses so the library decoders
/// can report the body.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport for UreqTransport {
    fn execute(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, Report<StkError>> {
        let method = request.method().clone();
        let uri = request.uri().clone();
        log::debug!("{method} {uri}");

        let response = self
            .agent
            .run(request)
            .change_context(StkError::Transport {
                message: format!("Failed to send {method} {uri}"),
            })?;

        let (parts, mut body) = response.into_parts();
        let bytes = body.read_to_vec().change_context(StkError::Transport {
            message: format!("Failed to read response from {uri}"),
        })?;

        log::debug!("{method} {uri} -> {} ({} bytes)", parts.status, bytes.len());
        Ok(Response::from_parts(parts, bytes))
    }
}
