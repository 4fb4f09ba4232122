//! Header names and fixed protocol values.

/// Header carrying `<signature>:<timestamp>` for authenticated calls.
pub const HEADER_X_ADP_REQUEST_DIGEST: &str = "X-ADP-Request-Digest";

/// Header carrying the device's ADP token verbatim.
pub const HEADER_X_ADP_AUTHENTICATION_TOKEN: &str = "X-ADP-Authentication-Token";

pub const HEADER_X_AMZN_IDENTITY_AUTH_DOMAIN: &str = "x-amzn-identity-auth-domain";

/// Public OAuth client id of the desktop send-to-device application.
pub const OAUTH_CLIENT_ID: &str =
    "658490dfb190e494030082836775981fa23be0c2425441860352ba0f55915b43002d";

/// Device type announced when registering a new device.
pub const REGISTRATION_DEVICE_TYPE: &str = "A1K6D1WRW0MALS";
pub const REGISTRATION_DEVICE_SERIAL: &str = "ZYSQ37GQ5JQDAIKDZ3WYH6I74MJCVEGG";
pub const REGISTRATION_PID: &str = "D21NN3GG";
pub const REGISTRATION_SOFTWARE_VERSION: &str = "253";

/// Path signed and requested by the logout call, query string included.
pub const LOGOUT_PATH: &str = "/FirsProxy/disownFiona?contentDeleted=false";
pub const REGISTER_PATH: &str = "/FirsProxy/registerDeviceWithToken";
pub const TOKEN_PATH: &str = "/auth/token";
pub const OWNED_DEVICES_PATH: &str = "/GetListOfOwnedDevices";
pub const UPLOAD_URL_PATH: &str = "/GetUploadUrl";
pub const SEND_TO_KINDLE_PATH: &str = "/SendToKindle";

/// Version tag written into persisted client files.
pub const CLIENT_FILE_VERSION: u32 = 1;
