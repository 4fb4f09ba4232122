//! Subcommand implementations.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use stk_client_common::client::{Client, HttpTransport};
use stk_client_common::models::{DocumentMetadata, OwnedDevice};
use stk_client_common::oauth::PkceSession;
use stk_client_common::request_signing::compute_digest_header;
use stk_client_common::settings::Settings;
use stk_client_common::storage::{self, JsonConfig};

use crate::error::CliError;

/// Destination keyword that expands to every owned device.
pub const ALL_DEVICES: &str = "all";

const PREFERENCES_FILE: &str = "preferences";
const PREF_AUTHOR: &str = "author";
const PREF_DESTINATIONS: &str = "destinations";

/// Resolves `--client`, defaulting to the per-user data directory.
pub fn client_path(explicit: Option<PathBuf>) -> Result<PathBuf, CliError> {
    explicit
        .or_else(storage::default_client_path)
        .ok_or_else(|| {
            CliError::Config("cannot locate a data directory; pass --client".into())
        })
}

/// Preferences live next to the client file.
pub fn open_preferences(client_path: &Path) -> JsonConfig {
    let dir = client_path.parent().unwrap_or_else(|| Path::new("."));
    let mut prefs = JsonConfig::open(dir.join(PREFERENCES_FILE));
    prefs.set_default(PREF_AUTHOR, json!(""));
    prefs.set_default(PREF_DESTINATIONS, json!([]));
    prefs
}

pub fn auth<T: HttpTransport>(
    settings: Settings,
    transport: T,
    client_path: &Path,
    redirect_url: Option<String>,
    force: bool,
) -> Result<(), CliError> {
    if client_path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists; use --force to replace it",
            client_path.display()
        )));
    }

    let session = PkceSession::generate();
    let signin_url = session.signin_url(&settings)?;

    let redirect_url = match redirect_url {
        Some(url) => url,
        None => {
            println!("Open this URL in a browser and sign in:\n\n{signin_url}\n");
            print!("Paste the URL you were redirected to: ");
            io::stdout().flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            line.trim().to_string()
        }
    };

    let client = Client::register(settings, transport, &session, &redirect_url)?;
    client.save(client_path)?;
    println!("Registered. Client saved to {}", client_path.display());
    Ok(())
}

pub fn devices<T: HttpTransport>(
    settings: Settings,
    transport: T,
    client_path: &Path,
) -> Result<(), CliError> {
    let client = Client::load(settings, transport, client_path)?;
    for device in client.owned_devices()? {
        println!("{}\t{}", device.device_serial_number, device.device_name);
    }
    Ok(())
}

/// Options for [`send`].
#[derive(Debug)]
pub struct SendOptions {
    pub file: PathBuf,
    pub destinations: Vec<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub format: Option<String>,
}

pub fn send<T: HttpTransport>(
    settings: Settings,
    transport: T,
    client_path: &Path,
    options: SendOptions,
) -> Result<(), CliError> {
    let client = Client::load(settings, transport, client_path)?;
    let mut prefs = open_preferences(client_path);

    let destinations = if options.destinations.is_empty() {
        stored_destinations(&prefs)
    } else {
        options.destinations
    };
    if destinations.is_empty() {
        return Err(CliError::Config(
            "no destination given and none remembered from a previous send".into(),
        ));
    }
    let owned = if destinations.iter().any(|d| d == ALL_DEVICES) {
        client.owned_devices()?
    } else {
        Vec::new()
    };
    let targets = resolve_targets(&destinations, &owned)?;

    let metadata = DocumentMetadata {
        title: options
            .title
            .unwrap_or_else(|| file_stem(&options.file)),
        author: options.author.unwrap_or_else(|| {
            prefs
                .get(PREF_AUTHOR)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        }),
        format: options
            .format
            .or_else(|| extension(&options.file))
            .ok_or_else(|| {
                CliError::Config(format!(
                    "cannot infer the format of {}; pass --format",
                    options.file.display()
                ))
            })?,
    };

    let contents = fs::read(&options.file)?;
    let sku = client.send_file(contents, &targets, &metadata)?;
    println!("Sent {} (sku {sku})", options.file.display());

    let mut window = prefs.defer_commits();
    window.set(PREF_AUTHOR, json!(metadata.author))?;
    window.set(PREF_DESTINATIONS, json!(destinations))?;
    window.finish()?;
    Ok(())
}

/// Request to compute an `X-ADP-Request-Digest` for.
#[derive(Debug)]
pub struct SignOptions<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub body: &'a str,
    pub date: Option<&'a str>,
}

pub fn digest_header(client_path: &Path, options: &SignOptions<'_>) -> Result<String, CliError> {
    let credential = storage::load_client(client_path)?;
    let header = compute_digest_header(
        options.method,
        options.path,
        options.body,
        &credential,
        options.date,
    )?;
    Ok(header)
}

pub fn sign(client_path: &Path, options: &SignOptions<'_>) -> Result<(), CliError> {
    println!("{}", digest_header(client_path, options)?);
    Ok(())
}

pub fn logout<T: HttpTransport>(
    settings: Settings,
    transport: T,
    client_path: &Path,
) -> Result<(), CliError> {
    let client = Client::load(settings, transport, client_path)?;
    client.logout()?;
    fs::remove_file(client_path)?;
    println!("Logged out; removed {}", client_path.display());
    Ok(())
}

fn stored_destinations(prefs: &JsonConfig) -> Vec<String> {
    prefs
        .get(PREF_DESTINATIONS)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// Expands `all` into the owned devices' serials, keeping explicit serials
/// given alongside it. Duplicates are dropped in first-seen order.
fn resolve_targets(
    destinations: &[String],
    owned: &[OwnedDevice],
) -> Result<Vec<String>, CliError> {
    let mut targets: Vec<String> = Vec::new();
    for destination in destinations {
        let serials: Vec<&str> = if destination == ALL_DEVICES {
            owned.iter().map(|d| d.device_serial_number.as_str()).collect()
        } else {
            vec![destination.as_str()]
        };
        for serial in serials {
            if !targets.iter().any(|t| t == serial) {
                targets.push(serial.to_string());
            }
        }
    }

    if targets.is_empty() {
        return Err(CliError::Config(
            "no target devices: the account has no devices that can receive documents".into(),
        ));
    }
    Ok(targets)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_client_path_prefers_explicit() {
        let path = client_path(Some(PathBuf::from("/tmp/custom.json"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/custom.json"));
    }

    #[test]
    fn test_preferences_defaults_and_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let client = dir.path().join("client.json");

        let mut prefs = open_preferences(&client);
        assert_eq!(prefs.get(PREF_AUTHOR), Some(&json!("")));
        assert!(stored_destinations(&prefs).is_empty());

        prefs
            .set(PREF_DESTINATIONS, json!(["G000PP1311850V4X"]))
            .unwrap();

        let reopened = open_preferences(&client);
        assert_eq!(
            stored_destinations(&reopened),
            vec!["G000PP1311850V4X".to_string()]
        );
        assert!(dir.path().join("preferences.json").exists());
    }

    fn device(serial: &str) -> OwnedDevice {
        OwnedDevice {
            device_capabilities: BTreeMap::new(),
            device_name: format!("Kindle {serial}"),
            device_serial_number: serial.into(),
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn test_resolve_targets_expands_all() {
        let owned = vec![device("A"), device("B")];

        let targets = resolve_targets(&strings(&["all"]), &owned).unwrap();
        assert_eq!(targets, strings(&["A", "B"]));
    }

    #[test]
    fn test_resolve_targets_keeps_explicit_serials_with_all() {
        let owned = vec![device("A"), device("B")];

        let targets = resolve_targets(&strings(&["C", "all", "A"]), &owned).unwrap();
        assert_eq!(targets, strings(&["C", "A", "B"]));
    }

    #[test]
    fn test_resolve_targets_rejects_empty_expansion() {
        let err = resolve_targets(&strings(&["all"]), &[]).unwrap_err();
        assert!(matches!(err, CliError::Config(msg) if msg.contains("no target devices")));
    }

    #[test]
    fn test_resolve_targets_explicit_only() {
        let targets = resolve_targets(&strings(&["A", "A"]), &[]).unwrap();
        assert_eq!(targets, strings(&["A"]));
    }

    #[test]
    fn test_title_and_format_from_file_name() {
        let path = Path::new("/docs/Report Q3.PDF");
        assert_eq!(file_stem(path), "Report Q3");
        assert_eq!(extension(path).as_deref(), Some("pdf"));
        assert_eq!(extension(Path::new("README")), None);
    }

    #[test]
    fn test_auth_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let client = dir.path().join("client.json");
        fs::write(&client, "{}").unwrap();
        let settings = Settings::new().unwrap();

        let err = auth(
            settings,
            crate::transport::UreqTransport::new(),
            &client,
            Some("https://www.amazon.com/gp/sendtokindle".into()),
            false,
        )
        .unwrap_err();

        assert!(matches!(err, CliError::Config(msg) if msg.contains("--force")));
    }
}
