#![warn(missing_docs)]
//! # cardpost-app binary
//!
//! Command-line shell for the cardpost upload controller. Wires the real
//! HTTP transport and system clipboard into the library flows.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use cardpost_app::clipboard::{ClipboardSink, CopyOutcome, SystemClipboard};
use cardpost_app::http::HttpTransport;
use cardpost_app::{app_version, generate_key, redact_key_material, upload_image};
use cardpost_core::{ImageFile, guess_content_type};
use cardpost_credential::{CredentialStore, KeyClient};
use cardpost_render::CardBoard;
use cardpost_request::{DEFAULT_FILE_ARG, curl_command};
use cardpost_upload::UploadOrchestrator;
use tracing_subscriber::EnvFilter;
use url::Url;

const DEFAULT_ORIGIN: &str = "http://127.0.0.1:8000";

const USAGE: &str = "usage: cardpost <genkey | upload <file> [api-key [card-id]] | command <api-key> [card-id] | version>";

/// CLI entry point.
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("cardpost: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("genkey") => run_genkey(),
        Some("upload") => run_upload(&args[1..]),
        Some("command") => run_command(&args[1..]),
        Some("version") => {
            println!("cardpost-app {}", app_version());
            Ok(())
        }
        _ => Err(USAGE.to_string()),
    }
}

fn run_genkey() -> Result<(), String> {
    let origin = origin_from_env()?;
    let transport = Arc::new(HttpTransport::new().map_err(|error| error.to_string())?);
    let client = KeyClient::new(origin, transport).map_err(|error| error.to_string())?;
    let mut store = CredentialStore::new();

    let handout =
        generate_key(&client, &mut store, &SystemClipboard).map_err(|error| error.to_string())?;

    println!("card_id: {}", handout.grant.card_id);
    println!("api_key: {}", handout.grant.api_key);
    println!("{}", handout.command);
    report_copy(&handout.copy);

    Ok(())
}

fn run_upload(args: &[String]) -> Result<(), String> {
    let path = args
        .first()
        .ok_or_else(|| "upload needs a file path".to_string())?;
    let bytes = std::fs::read(path).map_err(|error| format!("unable to read {path}: {error}"))?;
    let file_name = std::path::Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| format!("unable to derive a file name from {path}"))?;
    let file = ImageFile::new(file_name, guess_content_type(file_name), bytes)
        .map_err(|error| error.to_string())?;

    let mut store = CredentialStore::new();
    if let Some(api_key) = args.get(1) {
        store
            .set_key(api_key.clone(), args.get(2).cloned())
            .map_err(|error| error.to_string())?;
    }

    let origin = origin_from_env()?;
    let transport = Arc::new(HttpTransport::new().map_err(|error| error.to_string())?);
    let mut orchestrator =
        UploadOrchestrator::new(origin, transport).map_err(|error| error.to_string())?;
    let mut board = CardBoard::new();

    let attempt = upload_image(&mut orchestrator, &mut store, &mut board, &file, now_ms());
    print_board(&board);

    match attempt {
        Ok(outcome) => {
            println!(
                "{} card {}",
                if outcome.fell_back {
                    "created (key expired, fell back from replace)"
                } else if outcome.effective == cardpost_upload::EffectiveOutcome::Replaced {
                    "replaced"
                } else {
                    "created"
                },
                outcome.result.card_id
            );
            Ok(())
        }
        Err(error) => Err(error.to_string()),
    }
}

fn run_command(args: &[String]) -> Result<(), String> {
    let api_key = args
        .first()
        .ok_or_else(|| "command needs an api key".to_string())?;
    let origin = origin_from_env()?;

    let command = curl_command(
        &origin,
        api_key,
        args.get(1).map(String::as_str),
        DEFAULT_FILE_ARG,
    )
    .map_err(|error| error.to_string())?;

    tracing::debug!(
        command = %redact_key_material(&command),
        "formatted replace command"
    );
    println!("{command}");
    report_copy(&SystemClipboard.copy_text(&command));

    Ok(())
}

fn origin_from_env() -> Result<Url, String> {
    let raw = std::env::var("CARDPOST_ORIGIN").unwrap_or_else(|_| DEFAULT_ORIGIN.to_string());
    Url::parse(&raw).map_err(|error| format!("invalid CARDPOST_ORIGIN {raw}: {error}"))
}

fn print_board(board: &CardBoard) {
    for card in board.cards_most_recent_first() {
        println!(
            "{} {} status={} image={}",
            if card.selected { "*" } else { " " },
            card.card_id,
            card.status,
            card.image_url
        );
    }

    for notice in board.notices() {
        println!("! {}", notice.text);
    }
}

fn report_copy(copy: &CopyOutcome) {
    match copy {
        CopyOutcome::Copied => println!("command copied to clipboard"),
        CopyOutcome::Failed(reason) => println!("clipboard copy failed: {reason}"),
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
