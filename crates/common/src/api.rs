//! Request builders and response decoders for the service endpoints.
//!
//! Builders return fully formed `http::Request` values, signed where the
//! endpoint requires it; executing them is the transport's job. Decoders take
//! the status and body the transport got back.

use error_stack::{Report, ResultExt};
use http::{header, Method, Request};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::constants::{
    HEADER_X_ADP_AUTHENTICATION_TOKEN, HEADER_X_ADP_REQUEST_DIGEST,
    HEADER_X_AMZN_IDENTITY_AUTH_DOMAIN, LOGOUT_PATH, OAUTH_CLIENT_ID, OWNED_DEVICES_PATH,
    REGISTER_PATH, REGISTRATION_DEVICE_SERIAL, REGISTRATION_DEVICE_TYPE, REGISTRATION_PID,
    REGISTRATION_SOFTWARE_VERSION, SEND_TO_KINDLE_PATH, TOKEN_PATH, UPLOAD_URL_PATH,
};
use crate::credential::DeviceCredential;
use crate::error::StkError;
use crate::models::{
    ClientInfo, DocumentMetadata, GetOwnedDevicesResponse, GetUploadUrlResponse,
    SendToKindleResponse,
};
use crate::request_signing::RequestSigner;
use crate::settings::Settings;

const APPLICATION_JSON: &str = "application/json";
const TEXT_XML: &str = "text/xml";

fn build(builder: http::request::Builder, body: Vec<u8>) -> Result<Request<Vec<u8>>, Report<StkError>> {
    builder
        .body(body)
        .change_context(StkError::Configuration {
            message: "Failed to build HTTP request".into(),
        })
}

/// Serializes with four-space indentation, matching the reference client's
/// request bodies.
fn to_indented_json<T: Serialize>(value: &T) -> Result<String, Report<StkError>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut serializer)
        .change_context(StkError::Serialization {
            message: "Failed to serialize request body".into(),
        })?;
    String::from_utf8(out).change_context(StkError::Serialization {
        message: "Request body is not UTF-8".into(),
    })
}

/// Builds a signed POST to the delivery service with `ClientInfo` merged into
/// `fields`. The digest covers exactly the bytes placed in the body.
fn signed_json_request(
    settings: &Settings,
    signer: &RequestSigner,
    path: &str,
    fields: Map<String, Value>,
) -> Result<Request<Vec<u8>>, Report<StkError>> {
    let mut body = Map::new();
    body.insert(
        "ClientInfo".into(),
        serde_json::to_value(ClientInfo::from(&settings.client)).change_context(
            StkError::Serialization {
                message: "Failed to serialize ClientInfo".into(),
            },
        )?,
    );
    body.extend(fields);
    let data = to_indented_json(&body)?;

    let digest = signer.digest_header_for_request("POST", path, &data, None)?;
    let builder = Request::builder()
        .method(Method::POST)
        .uri(settings.stk_url(path))
        .header(header::ACCEPT, APPLICATION_JSON)
        .header(header::CONTENT_TYPE, APPLICATION_JSON)
        .header(HEADER_X_ADP_REQUEST_DIGEST, digest)
        .header(HEADER_X_ADP_AUTHENTICATION_TOKEN, signer.adp_token())
        .header(header::ACCEPT_LANGUAGE, settings.client.accept_language.as_str())
        .header(header::USER_AGENT, settings.client.user_agent.as_str());

    log::debug!("Built signed request POST {path} ({} bytes)", data.len());
    build(builder, data.into_bytes())
}

fn ensure_success(status: u16, body: &[u8]) -> Result<(), Report<StkError>> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    let body = String::from_utf8_lossy(body).into_owned();
    log::warn!("Service returned HTTP {status}");
    Err(Report::new(StkError::Api { status, body }))
}

fn decode_json<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<T, Report<StkError>> {
    ensure_success(status, body)?;
    serde_json::from_slice(body).change_context(StkError::Serialization {
        message: format!(
            "Unexpected response body for {}",
            core::any::type_name::<T>()
        ),
    })
}

/// POST exchanging an authorization code for an access token.
///
/// # Errors
///
/// Returns an error if the request cannot be assembled.
pub fn token_exchange_request(
    settings: &Settings,
    authorization_code: &str,
    code_verifier: &str,
) -> Result<Request<Vec<u8>>, Report<StkError>> {
    let body = json!({
        "app_name": "Unknown",
        "client_domain": "DeviceLegacy",
        "client_id": OAUTH_CLIENT_ID,
        "code_algorithm": "SHA-256",
        "code_verifier": code_verifier,
        "requested_token_type": "access_token",
        "source_token": authorization_code,
        "source_token_type": "authorization_code",
    });
    let data = serde_json::to_vec(&body).change_context(StkError::Serialization {
        message: "Failed to serialize token exchange body".into(),
    })?;

    let auth_domain = url::Url::parse(&settings.endpoints.auth_host)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_default();

    let builder = Request::builder()
        .method(Method::POST)
        .uri(settings.auth_url(TOKEN_PATH))
        .header(header::ACCEPT_LANGUAGE, "en-US")
        .header(HEADER_X_AMZN_IDENTITY_AUTH_DOMAIN, auth_domain)
        .header(header::CONTENT_TYPE, APPLICATION_JSON)
        .header(header::USER_AGENT, settings.client.user_agent.as_str());
    build(builder, data)
}

/// Extracts `access_token` from the token exchange response.
///
/// # Errors
///
/// Returns [`StkError::Api`] for a non-success status and
/// [`StkError::Serialization`] if the token is missing.
pub fn parse_token_exchange_response(status: u16, body: &[u8]) -> Result<String, Report<StkError>> {
    let value: Value = decode_json(status, body)?;
    value
        .get("access_token")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| {
            Report::new(StkError::Serialization {
                message: "Token exchange response has no access_token".into(),
            })
        })
}

/// POST registering a new device with an access token.
///
/// # Errors
///
/// Returns an error if the request cannot be assembled.
pub fn register_device_request(
    settings: &Settings,
    access_token: &str,
) -> Result<Request<Vec<u8>>, Report<StkError>> {
    use quick_xml::escape::escape;

    let body = format!(
        concat!(
            "<?xml version='1.0' encoding='UTF-8'?>\n",
            "<request><parameters>",
            "<deviceType>{device_type}</deviceType>",
            "<deviceSerialNumber>{serial}</deviceSerialNumber>",
            "<pid>{pid}</pid>",
            "<authToken>{token}</authToken>",
            "<authTokenType>AccessToken</authTokenType>",
            "<softwareVersion>{software_version}</softwareVersion>",
            "<os_version>{os}</os_version>",
            "<device_model>{model}</device_model>",
            "</parameters></request>"
        ),
        device_type = REGISTRATION_DEVICE_TYPE,
        serial = REGISTRATION_DEVICE_SERIAL,
        pid = REGISTRATION_PID,
        token = escape(access_token),
        software_version = REGISTRATION_SOFTWARE_VERSION,
        os = escape(settings.client.os.as_str()),
        model = escape(settings.client.device_model.as_str()),
    );

    let builder = Request::builder()
        .method(Method::POST)
        .uri(settings.firs_url(REGISTER_PATH))
        .header(header::CONTENT_TYPE, TEXT_XML)
        .header(header::ACCEPT_LANGUAGE, settings.client.accept_language.as_str())
        .header(header::USER_AGENT, settings.client.user_agent.as_str());
    build(builder, body.into_bytes())
}

/// Parses the registration response into a credential.
///
/// # Errors
///
/// Returns [`StkError::Api`] for a non-success status, otherwise the errors
/// of [`DeviceCredential::from_xml`].
pub fn parse_register_device_response(
    status: u16,
    body: &[u8],
) -> Result<DeviceCredential, Report<StkError>> {
    ensure_success(status, body)?;
    DeviceCredential::from_xml(body)
}

/// Signed request listing the devices that can receive documents.
///
/// # Errors
///
/// Returns an error if signing or serialization fails.
pub fn get_owned_devices_request(
    settings: &Settings,
    signer: &RequestSigner,
) -> Result<Request<Vec<u8>>, Report<StkError>> {
    signed_json_request(settings, signer, OWNED_DEVICES_PATH, Map::new())
}

/// # Errors
///
/// Returns [`StkError::Api`] or [`StkError::Serialization`].
pub fn parse_owned_devices_response(
    status: u16,
    body: &[u8],
) -> Result<GetOwnedDevicesResponse, Report<StkError>> {
    decode_json(status, body)
}

/// Signed request for an upload URL sized for `file_size` bytes.
///
/// # Errors
///
/// Returns an error if signing or serialization fails.
pub fn get_upload_url_request(
    settings: &Settings,
    signer: &RequestSigner,
    file_size: u64,
) -> Result<Request<Vec<u8>>, Report<StkError>> {
    let mut fields = Map::new();
    fields.insert("fileSize".into(), json!(file_size));
    signed_json_request(settings, signer, UPLOAD_URL_PATH, fields)
}

/// # Errors
///
/// Returns [`StkError::Api`] or [`StkError::Serialization`].
pub fn parse_upload_url_response(
    status: u16,
    body: &[u8],
) -> Result<GetUploadUrlResponse, Report<StkError>> {
    decode_json(status, body)
}

/// Unsigned PUT of the document bytes to a URL from
/// [`get_upload_url_request`].
///
/// # Errors
///
/// Returns an error if the URL is not a valid request target.
pub fn upload_file_request(
    settings: &Settings,
    upload_url: &str,
    contents: Vec<u8>,
) -> Result<Request<Vec<u8>>, Report<StkError>> {
    let builder = Request::builder()
        .method(Method::PUT)
        .uri(upload_url)
        .header(header::CONTENT_LENGTH, contents.len())
        .header(header::ACCEPT_LANGUAGE, settings.client.accept_language.as_str())
        .header(header::USER_AGENT, settings.client.user_agent.as_str());
    build(builder, contents)
}

/// # Errors
///
/// Returns [`StkError::Api`] unless the upload returned 200.
pub fn check_upload_response(status: u16, body: &[u8]) -> Result<(), Report<StkError>> {
    if status == 200 {
        return Ok(());
    }
    Err(Report::new(StkError::Api {
        status,
        body: String::from_utf8_lossy(body).into_owned(),
    }))
}

/// Signed request delivering an uploaded document to `target_devices`.
///
/// # Errors
///
/// Returns an error if signing or serialization fails.
pub fn send_to_kindle_request(
    settings: &Settings,
    signer: &RequestSigner,
    stk_token: &str,
    target_devices: &[String],
    metadata: &DocumentMetadata,
) -> Result<Request<Vec<u8>>, Report<StkError>> {
    let mut fields = Map::new();
    fields.insert(
        "DocumentMetadata".into(),
        json!({
            "author": metadata.author,
            "crc32": 0,
            "inputFormat": metadata.format,
            "title": metadata.title,
        }),
    );
    fields.insert("archive".into(), json!(true));
    fields.insert("deliveryMechanism".into(), json!("WIFI"));
    fields.insert("outputFormat".into(), json!("MOBI"));
    fields.insert("stkToken".into(), json!(stk_token));
    fields.insert("targetDevices".into(), json!(target_devices));
    signed_json_request(settings, signer, SEND_TO_KINDLE_PATH, fields)
}

/// # Errors
///
/// Returns [`StkError::Api`] or [`StkError::Serialization`].
pub fn parse_send_to_kindle_response(
    status: u16,
    body: &[u8],
) -> Result<SendToKindleResponse, Report<StkError>> {
    decode_json(status, body)
}

/// Signed GET deregistering the device.
///
/// # Errors
///
/// Returns an error if signing fails.
pub fn logout_request(
    settings: &Settings,
    signer: &RequestSigner,
) -> Result<Request<Vec<u8>>, Report<StkError>> {
    let digest = signer.digest_header_for_request("GET", LOGOUT_PATH, "", None)?;
    let builder = Request::builder()
        .method(Method::GET)
        .uri(settings.firs_url(LOGOUT_PATH))
        .header(header::CONTENT_TYPE, TEXT_XML)
        .header(HEADER_X_ADP_REQUEST_DIGEST, digest)
        .header(HEADER_X_ADP_AUTHENTICATION_TOKEN, signer.adp_token())
        .header(header::ACCEPT_LANGUAGE, settings.client.accept_language.as_str())
        .header(header::USER_AGENT, settings.client.user_agent.as_str());
    build(builder, Vec::new())
}

/// # Errors
///
/// Returns [`StkError::Api`] for a non-success status.
pub fn check_logout_response(status: u16, body: &[u8]) -> Result<(), Report<StkError>> {
    ensure_success(status, body)
}
