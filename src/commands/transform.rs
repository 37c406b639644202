use std::path::PathBuf;
use std::time::Instant;

use clap::ArgMatches;
use jira_relay_adapter::transform::{event_tag, issue_key};
use jira_relay_adapter::{
    EventTransformer, IncomingRequest, IncomingScript, ScriptResponse, TransformLogger,
};
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

pub async fn run(matches: &ArgMatches) {
    let config = match super::load_config(matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Logs go to stderr so stdout carries only the response
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(config.debug))
        .init();
    tracing::debug!(
        alias = %config.alias,
        max_comment_length = config.max_comment_length,
        debug = config.debug,
        "configuration loaded"
    );

    let raw = match read_input(matches.get_one::<String>("file")).await {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("✗ Failed to read input: {}", e);
            std::process::exit(1);
        }
    };

    let request = match build_request(
        &raw,
        matches.get_flag("envelope"),
        matches.get_one::<String>("channel").map(String::as_str),
    ) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("✗ Input is not valid JSON: {}", e);
            std::process::exit(1);
        }
    };

    let transformer = EventTransformer::new(config);
    let started = Instant::now();
    let response = transformer.process_incoming_request(&request);

    let logger = TransformLogger::new(matches.get_one::<String>("log-file").map(PathBuf::from));
    let entry = TransformLogger::entry(
        event_tag(&request.content),
        issue_key(&request.content),
        &response,
        started.elapsed(),
    );
    logger.log(&entry).await;

    match render(&response, matches.get_flag("pretty")) {
        Ok(out) => println!("{}", out),
        Err(e) => {
            eprintln!("✗ Failed to serialize response: {}", e);
            std::process::exit(1);
        }
    }
}

/// `RUST_LOG` when set, otherwise `info`, or `debug` in debug mode so the raw
/// payloads show up.
fn log_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level(debug)))
}

fn default_level(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "info"
    }
}

async fn read_input(file: Option<&String>) -> std::io::Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(path).await,
        None => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            Ok(buf)
        }
    }
}

/// A bare body becomes the request content; `--channel` wins over any
/// channel already present in an envelope.
fn build_request(
    raw: &str,
    envelope: bool,
    channel: Option<&str>,
) -> Result<IncomingRequest, serde_json::Error> {
    let mut request = if envelope {
        serde_json::from_str::<IncomingRequest>(raw)?
    } else {
        IncomingRequest::new(serde_json::from_str::<Value>(raw)?)
    };

    if let Some(channel) = channel {
        request = request.with_channel(channel);
    }

    Ok(request)
}

fn render(response: &ScriptResponse, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(response)
    } else {
        serde_json::to_string(response)
    }
}
