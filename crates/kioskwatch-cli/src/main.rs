//! Command-line interface for the KioskWatch collector.

use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_json::Value;

use kioskwatch_core::config::env_vars;
use kioskwatch_core::{format_timestamp, BackendKind, RegistryConfig, StatusEntry};

const DEFAULT_COLLECTOR_URL: &str = "http://127.0.0.1:8888";
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// KioskWatch - latest health status for a fleet of kiosks.
#[derive(Parser, Debug)]
#[command(name = "kioskwatch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Start the collector.
    Serve {
        /// Host to bind to.
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to.
        #[arg(short, long)]
        port: Option<u16>,
        /// Status store backend (memory, redb, remote).
        #[arg(short, long)]
        backend: Option<String>,
        /// Config file (defaults to kioskwatch.toml when present).
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Submit a health snapshot to a collector.
    Report {
        /// JSON file to send, or `-` for stdin.
        input: String,
        /// Collector base URL.
        #[arg(long, default_value = DEFAULT_COLLECTOR_URL)]
        url: String,
        /// Shared secret (falls back to KIOSKWATCH_API_KEY).
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Print the latest status of every device.
    Status {
        /// Collector base URL.
        #[arg(long, default_value = DEFAULT_COLLECTOR_URL)]
        url: String,
        /// Print the raw JSON response.
        #[arg(long)]
        json: bool,
    },
    /// Print the resolved configuration with secrets masked.
    CheckConfig {
        /// Config file (defaults to kioskwatch.toml when present).
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Deserialize)]
struct StatusList {
    results: Vec<StatusEntry>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Serve {
            host,
            port,
            backend,
            config,
        } => run_server(host, port, backend, config).await,
        Command::Report {
            input,
            url,
            api_key,
        } => submit_report(&input, &url, api_key).await,
        Command::Status { url, json } => print_status(&url, json).await,
        Command::CheckConfig { config } => check_config(config),
    }
}

fn init_logging(verbose: bool) {
    // JSON format for container environments
    let json_logging = std::env::var(env_vars::LOG_JSON)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    let default_directive = if verbose { "kioskwatch=debug" } else { "kioskwatch=info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));

    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(std::io::stderr)
            .init();
    }
}

/// File, environment, then command-line flags.
fn resolve_config(
    path: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    backend: Option<String>,
) -> Result<RegistryConfig> {
    let mut config = RegistryConfig::load(path.as_deref())?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(backend) = backend {
        config.store.backend = backend.parse::<BackendKind>()?;
    }
    config.validate()?;
    Ok(config)
}

async fn run_server(
    host: Option<String>,
    port: Option<u16>,
    backend: Option<String>,
    config: Option<PathBuf>,
) -> Result<()> {
    let config = resolve_config(config, host, port, backend)?;
    let token = if config.store.token.is_some() { "(set)" } else { "(not set)" };
    tracing::info!(
        category = "config",
        backend = %config.store.backend,
        store = %config.store.store_name,
        token,
        "Starting KioskWatch collector"
    );
    kioskwatch_api::run(config).await
}

fn check_config(path: Option<PathBuf>) -> Result<()> {
    let config = resolve_config(path, None, None, None)?;
    let rendered = toml::to_string_pretty(&config.redacted())
        .context("Failed to render configuration")?;
    println!("{}", rendered);
    Ok(())
}

fn read_input(input: &str) -> Result<Vec<u8>> {
    if input == "-" {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read report from stdin")?;
        Ok(buf)
    } else {
        std::fs::read(input).with_context(|| format!("Failed to read report file {}", input))
    }
}

fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(CLIENT_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}

fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

fn error_message(body: &Value) -> &str {
    body["error"]["message"].as_str().unwrap_or("unknown error")
}

async fn submit_report(input: &str, url: &str, api_key: Option<String>) -> Result<()> {
    let body = read_input(input)?;
    serde_json::from_slice::<Value>(&body).context("Report is not valid JSON")?;

    let api_key = api_key.or_else(|| {
        std::env::var(env_vars::API_KEY)
            .ok()
            .filter(|v| !v.trim().is_empty())
    });

    let mut request = http_client()?
        .post(endpoint(url, "report"))
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(body);
    if let Some(key) = api_key {
        request = request.header("x-api-key", key);
    }

    let response = request
        .send()
        .await
        .with_context(|| format!("Failed to reach collector at {}", url))?;
    let status = response.status();
    let reply: Value = response
        .json()
        .await
        .context("Collector returned a non-JSON response")?;

    if !status.is_success() {
        bail!("Collector rejected report ({}): {}", status, error_message(&reply));
    }

    println!(
        "Reported {} at {}",
        reply["id"].as_str().unwrap_or("unknown"),
        reply["receivedAt"].as_str().unwrap_or("-")
    );
    Ok(())
}

fn summarize(payload: &Value, width: usize) -> String {
    let text = payload.to_string();
    if text.chars().count() <= width {
        text
    } else {
        let cut: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

async fn print_status(url: &str, raw: bool) -> Result<()> {
    let response = http_client()?
        .get(endpoint(url, "status"))
        .send()
        .await
        .with_context(|| format!("Failed to reach collector at {}", url))?;
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .context("Collector returned a non-JSON response")?;

    if !status.is_success() {
        bail!("Status query failed ({}): {}", status, error_message(&body));
    }

    if raw {
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let list: StatusList =
        serde_json::from_value(body).context("Unexpected status response shape")?;
    if list.results.is_empty() {
        println!("No devices have reported yet.");
        return Ok(());
    }

    let id_width = list
        .results
        .iter()
        .map(|e| e.id.as_str().len())
        .max()
        .unwrap_or(0)
        .max("DEVICE".len());

    println!("{:<id_width$}  {:<24}  PAYLOAD", "DEVICE", "RECEIVED AT");
    for entry in &list.results {
        println!(
            "{:<id_width$}  {:<24}  {}",
            entry.id.as_str(),
            format_timestamp(&entry.received_at),
            summarize(&entry.payload, 60)
        );
    }
    println!("\n{} device(s)", list.results.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_join() {
        assert_eq!(endpoint("http://h:1/", "report"), "http://h:1/report");
        assert_eq!(endpoint("http://h:1/api", "status"), "http://h:1/api/status");
    }

    #[test]
    fn test_summarize_truncates() {
        let payload = serde_json::json!({"note": "x".repeat(100)});
        let short = summarize(&payload, 20);
        assert_eq!(short.chars().count(), 20);
        assert!(short.ends_with("..."));

        let tiny = serde_json::json!({"a": 1});
        assert_eq!(summarize(&tiny, 20), r#"{"a":1}"#);
    }

    #[test]
    fn test_error_message_fallback() {
        let body = serde_json::json!({"ok": false, "error": {"code": "X", "message": "nope"}});
        assert_eq!(error_message(&body), "nope");
        assert_eq!(error_message(&Value::Null), "unknown error");
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["kioskwatch", "serve", "--port", "9000", "--backend", "redb"])
            .unwrap();
        match args.command {
            Command::Serve { port, backend, .. } => {
                assert_eq!(port, Some(9000));
                assert_eq!(backend.as_deref(), Some("redb"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
