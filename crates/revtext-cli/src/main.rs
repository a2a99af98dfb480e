//! # Revtext CLI Entry Point
//!
//! Main binary for the revtext chunked text reversal system. Provides the
//! command-line interface for running the server and for reversing a file
//! through a running server.
//!
//! ## Usage
//!
//! ```bash
//! # Start the reversal server
//! revtext serve -p 9400
//!
//! # Reverse a file: server, port, input file, min/max chunk size
//! revtext reverse 127.0.0.1 9400 input.txt 5 20
//! ```
//!
//! On success the client writes the reassembled text next to the input as
//! `<stem>_reversed.txt`. On any failure no output file is produced.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use argh::FromArgs;

use revtext_client::ReverseClient;
use revtext_server::Dispatcher;

/// Lowest accepted port (the non-privileged range).
const PORT_MIN: u16 = 1024;

/// Main CLI structure parsed from command-line arguments.
#[derive(FromArgs)]
/// Revtext - chunked text reversal over TCP
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

/// Available CLI subcommands.
#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Serve(ServeArgs),
    Reverse(ReverseArgs),
}

/// Arguments for running the reversal server.
///
/// The server accepts any number of concurrent client connections and
/// reverses each received block independently. Ctrl+C triggers coordinated
/// shutdown: no new connections are accepted, in-flight sessions abort, and
/// the process exits once workers have drained (bounded by a grace period).
#[derive(FromArgs)]
#[argh(subcommand, name = "serve")]
/// start the reversal server
struct ServeArgs {
    /// port to listen on (1024-65535)
    #[argh(option, short = 'p')]
    port: u16,

    /// per-chunk processing delay in milliseconds
    ///
    /// Models bounded server-side work. Clients must keep their answer
    /// timeout above this value.
    #[argh(option, long = "delay-ms", default = "500")]
    delay_ms: u64,
}

/// Arguments for reversing a file through a running server.
///
/// The input file must be printable ASCII; it is split into chunks whose
/// sizes are drawn uniformly from `[lmin, lmax]`, each chunk is reversed by
/// the server, and the reversed chunks are reassembled in their original
/// order.
#[derive(FromArgs)]
#[argh(subcommand, name = "reverse")]
/// reverse a text file through a server
struct ReverseArgs {
    /// server host name or IP address
    #[argh(positional)]
    server: String,

    /// server port (1024-65535)
    #[argh(positional)]
    port: u16,

    /// input text file (printable ASCII)
    #[argh(positional)]
    input_file: String,

    /// minimum chunk size in bytes (at least 1)
    #[argh(positional)]
    lmin: usize,

    /// maximum chunk size in bytes (at least lmin)
    #[argh(positional)]
    lmax: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // Default log level to INFO, overridable via RUST_LOG.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Serve(args) => run_serve(args).await,
        Commands::Reverse(args) => run_reverse(args),
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    validate_port(args.port)?;

    let dispatcher = Dispatcher::bind(&format!("0.0.0.0:{}", args.port))
        .await?
        .with_processing_delay(Duration::from_millis(args.delay_ms));

    let handle = dispatcher.shutdown_handle();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Termination signal received");
        handle.shutdown();
    });

    dispatcher.run().await?;
    Ok(())
}

fn run_reverse(args: ReverseArgs) -> Result<()> {
    validate_port(args.port)?;
    if args.lmin == 0 || args.lmin > args.lmax {
        anyhow::bail!(
            "Invalid chunk size bounds: need 0 < lmin <= lmax, got {}-{}",
            args.lmin,
            args.lmax
        );
    }
    let input_path = PathBuf::from(&args.input_file);
    if !input_path.exists() {
        anyhow::bail!("Input file '{}' does not exist", input_path.display());
    }

    let text = fs::read(&input_path)?;
    let client = ReverseClient::new(format!("{}:{}", args.server, args.port));
    let reversed = client.run(&text, args.lmin, args.lmax)?;

    let output_path = output_path_for(&input_path);
    fs::write(&output_path, reversed)?;
    tracing::info!("Reversal complete, result saved to {}", output_path.display());
    Ok(())
}

fn validate_port(port: u16) -> Result<()> {
    if port < PORT_MIN {
        anyhow::bail!("Port must be in the {}-65535 range, got {}", PORT_MIN, port);
    }
    Ok(())
}

/// Derive the output path: `dir/input.txt` becomes `dir/input_reversed.txt`.
fn output_path_for(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{}_reversed.txt", stem))
}

/// CLI argument parsing and validation tests.
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cli_parse_serve() {
        let cli: Cli = Cli::from_args(&["revtext"], &["serve", "-p", "9400"]).unwrap();
        match cli.command {
            Commands::Serve(ServeArgs { port, delay_ms }) => {
                assert_eq!(port, 9400);
                assert_eq!(delay_ms, 500); // default
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_parse_serve_with_delay() {
        let cli: Cli =
            Cli::from_args(&["revtext"], &["serve", "-p", "9400", "--delay-ms", "50"]).unwrap();
        match cli.command {
            Commands::Serve(ServeArgs { delay_ms, .. }) => assert_eq!(delay_ms, 50),
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_parse_reverse() {
        let cli: Cli = Cli::from_args(
            &["revtext"],
            &["reverse", "127.0.0.1", "9400", "input.txt", "5", "20"],
        )
        .unwrap();
        match cli.command {
            Commands::Reverse(ReverseArgs {
                server,
                port,
                input_file,
                lmin,
                lmax,
            }) => {
                assert_eq!(server, "127.0.0.1");
                assert_eq!(port, 9400);
                assert_eq!(input_file, "input.txt");
                assert_eq!(lmin, 5);
                assert_eq!(lmax, 20);
            }
            _ => panic!("Expected Reverse command"),
        }
    }

    #[test]
    fn test_validate_port_range() {
        assert!(validate_port(1024).is_ok());
        assert!(validate_port(65535).is_ok());
        assert!(validate_port(1023).is_err());
        assert!(validate_port(80).is_err());
    }

    #[test]
    fn test_reverse_rejects_bad_chunk_bounds() {
        for (lmin, lmax) in [(0, 5), (6, 5)] {
            let args = ReverseArgs {
                server: "127.0.0.1".to_string(),
                port: 9400,
                input_file: "input.txt".to_string(),
                lmin,
                lmax,
            };
            let err = run_reverse(args).unwrap_err();
            assert!(err.to_string().contains("chunk size bounds"));
        }
    }

    #[test]
    fn test_reverse_rejects_missing_file() {
        let args = ReverseArgs {
            server: "127.0.0.1".to_string(),
            port: 9400,
            input_file: "/nonexistent/input.txt".to_string(),
            lmin: 5,
            lmax: 20,
        };
        let err = run_reverse(args).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_reverse_rejects_non_ascii_file_before_connecting() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all("non-ascii: caf\u{e9}".as_bytes()).unwrap();

        let args = ReverseArgs {
            // Unroutable documentation address: an InvalidInput error proves
            // validation happened before any connection attempt.
            server: "192.0.2.1".to_string(),
            port: 9400,
            input_file: file.path().to_string_lossy().into_owned(),
            lmin: 2,
            lmax: 4,
        };
        let err = run_reverse(args).unwrap_err();
        assert!(err.to_string().contains("printable ASCII"));
    }

    #[test]
    fn test_output_path_derivation() {
        assert_eq!(
            output_path_for(Path::new("input.txt")),
            PathBuf::from("input_reversed.txt")
        );
        assert_eq!(
            output_path_for(Path::new("/data/story.txt")),
            PathBuf::from("/data/story_reversed.txt")
        );
        assert_eq!(
            output_path_for(Path::new("noext")),
            PathBuf::from("noext_reversed.txt")
        );
    }
}
