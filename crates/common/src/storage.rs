//! Local persistence: the client file holding the device credential, and a
//! small JSON key/value store for client preferences.
//!
//! # Client file
//!
//! ```json
//! { "version": 1, "device_info": { "device_private_key": "...", "adp_token": "...", ... } }
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use error_stack::{Report, ResultExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::CLIENT_FILE_VERSION;
use crate::credential::DeviceCredential;
use crate::error::StkError;

#[cfg(unix)]
const CONFIG_DIR_MODE: u32 = 0o700;
#[cfg(unix)]
const CONFIG_FILE_MODE: u32 = 0o600;
const CONFIG_EXTENSION: &str = "json";

#[derive(Serialize, Deserialize)]
struct ClientFile {
    version: u32,
    device_info: DeviceCredential,
}

/// Serializes a credential into the versioned client file format.
///
/// # Errors
///
/// Returns [`StkError::Serialization`] if encoding fails.
pub fn client_to_json(credential: &DeviceCredential) -> Result<String, Report<StkError>> {
    let file = ClientFile {
        version: CLIENT_FILE_VERSION,
        device_info: credential.clone(),
    };
    serde_json::to_string_pretty(&file).change_context(StkError::Serialization {
        message: "Failed to serialize client file".into(),
    })
}

/// Parses the versioned client file format.
///
/// # Errors
///
/// - [`StkError::Serialization`] if the JSON does not match the format
/// - [`StkError::Storage`] if the file was written by an unknown version
pub fn client_from_json(json: &str) -> Result<DeviceCredential, Report<StkError>> {
    let file: ClientFile = serde_json::from_str(json).change_context(StkError::Serialization {
        message: "Failed to parse client file".into(),
    })?;

    if file.version != CLIENT_FILE_VERSION {
        return Err(Report::new(StkError::Storage {
            message: format!(
                "unsupported client file version {} (expected {CLIENT_FILE_VERSION})",
                file.version
            ),
        }));
    }
    Ok(file.device_info)
}

/// Reads the client file at `path`.
///
/// # Errors
///
/// Returns [`StkError::Storage`] if the file cannot be read, plus the errors of
/// [`client_from_json`].
pub fn load_client(path: &Path) -> Result<DeviceCredential, Report<StkError>> {
    let json = fs::read_to_string(path).change_context(StkError::Storage {
        message: format!("Failed to read client file {}", path.display()),
    })?;
    client_from_json(&json).attach(format!("while loading {}", path.display()))
}

/// Writes the client file at `path`, creating parent directories.
///
/// # Errors
///
/// Returns [`StkError::Storage`] if the file cannot be written.
pub fn save_client(path: &Path, credential: &DeviceCredential) -> Result<(), Report<StkError>> {
    let json = client_to_json(credential)?;
    if let Some(parent) = path.parent() {
        create_private_dir(parent)?;
    }
    write_private_file(path, json.as_bytes()).change_context(StkError::Storage {
        message: format!("Failed to write client file {}", path.display()),
    })?;
    log::info!("Saved client to {}", path.display());
    Ok(())
}

/// `$XDG_DATA_HOME/stkclient/client.json`, falling back to
/// `~/.local/share` when the variable is unset or relative.
#[must_use]
pub fn default_client_path() -> Option<PathBuf> {
    data_home().map(|dir| dir.join("stkclient").join("client.json"))
}

fn data_home() -> Option<PathBuf> {
    if let Some(value) = std::env::var_os("XDG_DATA_HOME") {
        let path = PathBuf::from(value);
        if path.is_absolute() {
            return Some(path);
        }
    }
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local").join("share"))
}

fn create_private_dir(dir: &Path) -> Result<(), Report<StkError>> {
    if dir.as_os_str().is_empty() || dir.exists() {
        return Ok(());
    }
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(CONFIG_DIR_MODE);
    }
    builder.create(dir).change_context(StkError::Storage {
        message: format!("Failed to create directory {}", dir.display()),
    })
}

/// Writes `contents` readable by the owner only. An existing file is
/// truncated and narrowed to the same mode.
fn write_private_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(CONFIG_FILE_MODE);
    }
    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(CONFIG_FILE_MODE))?;
    }
    io::Write::write_all(&mut file, contents)
}

/// JSON-file-backed key/value store.
///
/// Reads fall back to registered defaults. Every write is committed to disk
/// immediately unless a [`DeferredCommit`] window is open, in which case the
/// outermost window commits once when it closes.
#[derive(Debug)]
pub struct JsonConfig {
    path: PathBuf,
    values: Map<String, Value>,
    defaults: HashMap<String, Value>,
    deferred: usize,
}

impl JsonConfig {
    /// Opens the store at `path` (`.json` is appended if missing). A missing
    /// or unreadable file yields an empty store.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut path: PathBuf = path.into();
        if path.extension().and_then(|e| e.to_str()) != Some(CONFIG_EXTENSION) {
            let mut name = path.file_name().unwrap_or_default().to_os_string();
            name.push(".");
            name.push(CONFIG_EXTENSION);
            path.set_file_name(name);
        }

        let mut config = Self {
            path,
            values: Map::new(),
            defaults: HashMap::new(),
            deferred: 0,
        };
        config.refresh();
        config
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reloads values from disk, discarding unsaved changes.
    pub fn refresh(&mut self) {
        self.values = match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Map::new(),
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                log::warn!("Ignoring unparseable config {}: {e}", self.path.display());
                Map::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                log::warn!("Ignoring unreadable config {}: {e}", self.path.display());
                Map::new()
            }
        };
    }

    pub fn set_default(&mut self, key: impl Into<String>, value: Value) {
        self.defaults.insert(key.into(), value);
    }

    /// Stored value, else the registered default.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).or_else(|| self.defaults.get(key))
    }

    /// Whether a value is stored (defaults do not count).
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// # Errors
    ///
    /// Returns [`StkError::Storage`] if an immediate commit fails.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Result<(), Report<StkError>> {
        self.values.insert(key.into(), value);
        self.commit_unless_deferred()
    }

    /// Removes a stored value; removing an absent key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StkError::Storage`] if an immediate commit fails.
    pub fn remove(&mut self, key: &str) -> Result<(), Report<StkError>> {
        if self.values.remove(key).is_some() {
            self.commit_unless_deferred()?;
        }
        Ok(())
    }

    /// Opens a window in which writes are kept in memory only.
    pub fn defer_commits(&mut self) -> DeferredCommit<'_> {
        self.deferred += 1;
        DeferredCommit {
            config: self,
            released: false,
        }
    }

    /// Writes all stored values to disk.
    ///
    /// # Errors
    ///
    /// Returns [`StkError::Storage`] if the directory or file cannot be written.
    pub fn commit(&self) -> Result<(), Report<StkError>> {
        if let Some(parent) = self.path.parent() {
            create_private_dir(parent)?;
        }
        let raw = serde_json::to_string(&self.values).change_context(StkError::Serialization {
            message: "Failed to serialize config".into(),
        })?;
        write_private_file(&self.path, raw.as_bytes()).change_context(StkError::Storage {
            message: format!("Failed to write config {}", self.path.display()),
        })
    }

    fn commit_unless_deferred(&self) -> Result<(), Report<StkError>> {
        if self.deferred > 0 {
            return Ok(());
        }
        self.commit()
    }
}

/// Guard returned by [`JsonConfig::defer_commits`].
///
/// Dropping the guard closes the window; prefer [`DeferredCommit::finish`] to
/// observe commit errors.
pub struct DeferredCommit<'a> {
    config: &'a mut JsonConfig,
    released: bool,
}

impl DeferredCommit<'_> {
    /// Closes the window and commits if it was the outermost one.
    ///
    /// # Errors
    ///
    /// Returns [`StkError::Storage`] if the commit fails.
    pub fn finish(mut self) -> Result<(), Report<StkError>> {
        self.release()
    }

    fn release(&mut self) -> Result<(), Report<StkError>> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.config.deferred -= 1;
        if self.config.deferred == 0 {
            self.config.commit()
        } else {
            Ok(())
        }
    }
}

impl core::ops::Deref for DeferredCommit<'_> {
    type Target = JsonConfig;

    fn deref(&self) -> &JsonConfig {
        self.config
    }
}

impl core::ops::DerefMut for DeferredCommit<'_> {
    fn deref_mut(&mut self) -> &mut JsonConfig {
        self.config
    }
}

impl Drop for DeferredCommit<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::error!("Failed to commit deferred config changes: {e:?}");
        }
    }
}
