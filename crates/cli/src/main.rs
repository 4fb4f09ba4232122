//! Command-line client for sending documents to e-reader devices.
//!
//! This tool provides commands for:
//! - Registering this machine as a device (`auth`)
//! - Listing the devices on the account (`devices`)
//! - Uploading and delivering a document (`send`)
//! - Computing a request digest header for debugging (`sign`)
//! - Deregistering the device (`logout`)

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use stk_client_common::settings::Settings;

mod commands;
mod error;
mod transport;

use error::CliError;
use transport::UreqTransport;

#[derive(Parser)]
#[command(name = "stkcli")]
#[command(about = "Send documents to your e-reader devices")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the client file (default: $XDG_DATA_HOME/stkclient/client.json)
    #[arg(long, global = true, env = "STKCLI_CLIENT")]
    client: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and register this client as a device
    Auth {
        /// Redirect URL from the browser; read from stdin when omitted
        #[arg(long)]
        redirect_url: Option<String>,

        /// Replace an existing client file
        #[arg(long)]
        force: bool,
    },

    /// List devices that can receive documents
    Devices,

    /// Upload a document and deliver it
    Send {
        /// Document title (default: file name without extension)
        #[arg(long, short)]
        title: Option<String>,

        /// Document author (default: the last author used)
        #[arg(long, short)]
        author: Option<String>,

        /// Input format (default: file extension)
        #[arg(long, short)]
        format: Option<String>,

        /// File to send
        file: PathBuf,

        /// Device serial numbers, or `all` (default: the last destinations used)
        destinations: Vec<String>,
    },

    /// Print an X-ADP-Request-Digest header for a request
    Sign {
        #[arg(long, short, default_value = "GET")]
        method: String,

        /// Path including any query string
        #[arg(long, short)]
        path: String,

        #[arg(long, short, default_value = "")]
        body: String,

        /// Fixed signing date (default: now)
        #[arg(long, short)]
        date: Option<String>,
    },

    /// Deregister this client and delete the client file
    Logout,
}

fn init_logger(verbose: bool) -> Result<(), log::SetLoggerError> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}  {} {}",
                chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logger(cli.verbose) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let client_path = commands::client_path(cli.client)?;
    log::debug!("Using client file {}", client_path.display());

    match cli.command {
        Commands::Auth {
            redirect_url,
            force,
        } => commands::auth(
            Settings::new()?,
            UreqTransport::new(),
            &client_path,
            redirect_url,
            force,
        ),
        Commands::Devices => {
            commands::devices(Settings::new()?, UreqTransport::new(), &client_path)
        }
        Commands::Send {
            title,
            author,
            format,
            file,
            destinations,
        } => commands::send(
            Settings::new()?,
            UreqTransport::new(),
            &client_path,
            commands::SendOptions {
                file,
                destinations,
                title,
                author,
                format,
            },
        ),
        Commands::Sign {
            method,
            path,
            body,
            date,
        } => commands::sign(
            &client_path,
            &commands::SignOptions {
                method: &method,
                path: &path,
                body: &body,
                date: date.as_deref(),
            },
        ),
        Commands::Logout => commands::logout(Settings::new()?, UreqTransport::new(), &client_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_send_with_destinations() {
        let cli = Cli::try_parse_from([
            "stkcli", "--client", "/tmp/c.json", "send", "--title", "Doc", "book.epub", "all",
        ])
        .unwrap();

        assert_eq!(cli.client, Some(PathBuf::from("/tmp/c.json")));
        match cli.command {
            Commands::Send {
                title,
                file,
                destinations,
                ..
            } => {
                assert_eq!(title.as_deref(), Some("Doc"));
                assert_eq!(file, PathBuf::from("book.epub"));
                assert_eq!(destinations, vec!["all".to_string()]);
            }
            _ => panic!("Expected Send"),
        }
    }

    #[test]
    fn test_sign_command_with_fixed_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");
        std::fs::write(&path, include_str!("../tests/fixtures/client.json")).unwrap();

        let cli = Cli::try_parse_from([
            "stkcli",
            "--client",
            path.to_str().unwrap(),
            "sign",
            "--path",
            "/FirsProxy/getStoreCredentials",
            "--date",
            "2020-04-10T14:21:40Z",
        ])
        .unwrap();

        let Commands::Sign {
            method,
            path: request_path,
            body,
            date,
        } = cli.command
        else {
            panic!("Expected Sign");
        };
        let header = commands::digest_header(
            &path,
            &commands::SignOptions {
                method: &method,
                path: &request_path,
                body: &body,
                date: date.as_deref(),
            },
        )
        .unwrap();

        assert_eq!(
            header,
            concat!(
                "czUzgbTkzXs2/esqFMcbGuIAdVkRPBzYJFsOnHNep0sW/xyW5hCtOgphRAqZGnUP4jXVvHTf+dRs",
                "Rg5wdSzcp8CG5POxXZ6Qi+0KeKWiraMNmdRP7+L1RLXJ5cgd/HLbrBqGYAK5+VEpNDRitNXBm4KJ",
                "OysPWyvf5mU6tu0KoHCfEm0biNNjTEn54J+FaQlB0xYIb8WHct/vqTQGmKoKhZGsPe1L5HwzTZfg",
                "5Wdld9SjujgaW8uQmWJ7QpDJ0dw5Fv1W0x6fK+pM/rM/rPQ5XrbPYIeXSSPL6KKoqeIPpbwNrVHd",
                "gpeZAU/1BMIF7+zXQKv4L8IjFizgf+L2tqa6Yg==:2020-04-10T14:21:40Z",
            )
        );
    }
}
