//! High-level client tying the request builders to a transport.

use core::fmt;
use std::path::Path;

use error_stack::{Report, ResultExt};
use http::{Request, Response};

use crate::api;
use crate::credential::DeviceCredential;
use crate::error::StkError;
use crate::models::{DocumentMetadata, OwnedDevice};
use crate::oauth::{parse_authorization_code, PkceSession};
use crate::request_signing::RequestSigner;
use crate::settings::Settings;

/// Executes one HTTP exchange.
///
/// Implementations must return non-success responses as `Ok`; status
/// handling belongs to the decoders in [`crate::api`].
pub trait HttpTransport {
    /// # Errors
    ///
    /// Returns [`StkError::Transport`] if the exchange could not complete.
    fn execute(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, Report<StkError>>;
}

/// A registered device session.
pub struct Client<T> {
    settings: Settings,
    transport: T,
    credential: DeviceCredential,
    signer: RequestSigner,
}

impl<T: HttpTransport> Client<T> {
    /// Wraps an existing credential.
    ///
    /// # Errors
    ///
    /// Returns [`StkError::Signing`] if the credential's key is unusable.
    pub fn new(
        settings: Settings,
        transport: T,
        credential: DeviceCredential,
    ) -> Result<Self, Report<StkError>> {
        let signer = RequestSigner::from_credential(&credential)?;
        Ok(Self {
            settings,
            transport,
            credential,
            signer,
        })
    }

    /// Completes the OAuth flow and registers a new device.
    ///
    /// `redirect_url` is the URL the browser ended on after signing in at
    /// `session.signin_url(..)`.
    ///
    /// # Errors
    ///
    /// Fails if the redirect carries no code, either exchange fails, or the
    /// registration response is not a usable credential.
    pub fn register(
        settings: Settings,
        transport: T,
        session: &PkceSession,
        redirect_url: &str,
    ) -> Result<Self, Report<StkError>> {
        let code = parse_authorization_code(redirect_url)?;

        let request = api::token_exchange_request(&settings, &code, session.code_verifier())?;
        let response = transport.execute(request)?;
        let access_token = api::parse_token_exchange_response(response.status().as_u16(), response.body())
            .attach("while exchanging the authorization code")?;

        let request = api::register_device_request(&settings, &access_token)?;
        let response = transport.execute(request)?;
        let credential =
            api::parse_register_device_response(response.status().as_u16(), response.body())
                .attach("while registering the device")?;

        log::info!("Registered device {}", credential.device_type);
        Self::new(settings, transport, credential)
    }

    /// Loads a credential previously written with [`Client::save`].
    ///
    /// # Errors
    ///
    /// Returns [`StkError::Storage`] if the file cannot be read or parsed.
    pub fn load(settings: Settings, transport: T, path: &Path) -> Result<Self, Report<StkError>> {
        let credential = crate::storage::load_client(path)?;
        Self::new(settings, transport, credential)
    }

    /// # Errors
    ///
    /// Returns [`StkError::Storage`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), Report<StkError>> {
        crate::storage::save_client(path, &self.credential)
    }

    #[must_use]
    pub fn credential(&self) -> &DeviceCredential {
        &self.credential
    }

    #[must_use]
    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }

    /// Devices on the account that can receive documents.
    ///
    /// # Errors
    ///
    /// Returns the transport error or the decoded API error.
    pub fn owned_devices(&self) -> Result<Vec<OwnedDevice>, Report<StkError>> {
        let request = api::get_owned_devices_request(&self.settings, &self.signer)?;
        let response = self.transport.execute(request)?;
        let devices = api::parse_owned_devices_response(response.status().as_u16(), response.body())
            .attach("while listing owned devices")?;
        Ok(devices.owned_devices)
    }

    /// Uploads `contents` and delivers it to `target_devices`. Returns the
    /// SKU the service assigned to the delivery.
    ///
    /// # Errors
    ///
    /// Fails at the first step whose request or response fails.
    pub fn send_file(
        &self,
        contents: Vec<u8>,
        target_devices: &[String],
        metadata: &DocumentMetadata,
    ) -> Result<String, Report<StkError>> {
        let request =
            api::get_upload_url_request(&self.settings, &self.signer, contents.len() as u64)?;
        let response = self.transport.execute(request)?;
        let upload = api::parse_upload_url_response(response.status().as_u16(), response.body())
            .attach("while requesting an upload URL")?;

        let request = api::upload_file_request(&self.settings, &upload.upload_url, contents)?;
        let response = self.transport.execute(request)?;
        api::check_upload_response(response.status().as_u16(), response.body())
            .attach("while uploading the document")?;

        let request = api::send_to_kindle_request(
            &self.settings,
            &self.signer,
            &upload.stk_token,
            target_devices,
            metadata,
        )?;
        let response = self.transport.execute(request)?;
        let sent = api::parse_send_to_kindle_response(response.status().as_u16(), response.body())
            .attach("while delivering the document")?;

        log::info!(
            "Sent `{}` to {} device(s), sku {}",
            metadata.title,
            target_devices.len(),
            sent.sku
        );
        Ok(sent.sku)
    }

    /// Deregisters the device. The credential is unusable afterwards.
    ///
    /// # Errors
    ///
    /// Returns the transport error or the decoded API error.
    pub fn logout(self) -> Result<(), Report<StkError>> {
        let request = api::logout_request(&self.settings, &self.signer)?;
        let response = self.transport.execute(request)?;
        api::check_logout_response(response.status().as_u16(), response.body())
            .attach("while deregistering the device")?;

        log::info!("Deregistered device {}", self.credential.device_type);
        Ok(())
    }
}

impl<T> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("credential", &self.credential)
            .finish_non_exhaustive()
    }
}
