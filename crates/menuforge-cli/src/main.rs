mod session;

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use menuforge_contracts::{
    ExtractionInput, GenerationError, ImageAttachment, MenuItemMetadata, SessionEventPayload,
    SessionEventWriter,
};
use menuforge_engine::{GeminiClient, MetadataGenerator};
use serde_json::json;
use uuid::Uuid;

use crate::session::{Clipboard, SessionController, SessionPhase};

#[derive(Debug, Parser)]
#[command(name = "menuforge", version, about = "Menu-item metadata extraction")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// One-shot extraction from an image and/or manual fields.
    Extract(ExtractArgs),
    /// Interactive session over stdin.
    Session(SessionArgs),
}

#[derive(Debug, Parser)]
struct ExtractArgs {
    /// Photo of the menu item (JPEG, PNG, or WebP).
    #[arg(long)]
    image: Option<PathBuf>,
    /// Manual item name, used verbatim in the result.
    #[arg(long)]
    name: Option<String>,
    /// Manual description, used verbatim in the result.
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    model: Option<String>,
    /// Write the result JSON here in addition to stdout.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Append session events to this JSONL file.
    #[arg(long)]
    events: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct SessionArgs {
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    events: Option<PathBuf>,
}

fn main() {
    match run() {
        Ok(()) => {}
        Err(err) => {
            eprintln!("menuforge error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Extract(args) => run_extract(args),
        Command::Session(args) => run_session(args),
    }
}

/// Read an uploaded file and sniff its format from the bytes. Only
/// JPEG, PNG, and WebP make it past the attachment constructor.
fn load_image_attachment(path: &Path) -> Result<ImageAttachment> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let format = image::guess_format(&bytes)
        .with_context(|| format!("{} is not a recognizable image", path.display()))?;
    Ok(ImageAttachment::new(bytes, format.to_mime_type())?)
}

fn event_writer(path: Option<&Path>) -> Option<SessionEventWriter> {
    path.map(|path| SessionEventWriter::new(path, Uuid::new_v4().to_string()))
}

fn emit_event(events: Option<&SessionEventWriter>, event_type: &str, payload: SessionEventPayload) {
    if let Some(writer) = events {
        if let Err(err) = writer.emit(event_type, payload) {
            eprintln!("event write failed: {err:#}");
        }
    }
}

fn started_payload(model: &str, input: &ExtractionInput) -> SessionEventPayload {
    let mut payload = SessionEventPayload::new();
    payload.insert("model".to_string(), json!(model));
    payload.insert("has_image".to_string(), json!(input.image.is_some()));
    payload.insert(
        "manual_name".to_string(),
        json!(input.manual_item_name().is_some()),
    );
    payload.insert(
        "manual_description".to_string(),
        json!(input.manual_description().is_some()),
    );
    payload
}

fn failed_payload(err: &GenerationError) -> SessionEventPayload {
    let mut payload = SessionEventPayload::new();
    payload.insert("kind".to_string(), json!(err.kind()));
    payload.insert("message".to_string(), json!(err.to_string()));
    payload
}

fn run_extract(args: ExtractArgs) -> Result<()> {
    // Credential check comes first; a missing key refuses to start.
    let client = GeminiClient::from_env(args.model)?;
    let events = event_writer(args.events.as_deref());

    let input = ExtractionInput {
        image: args
            .image
            .as_deref()
            .map(load_image_attachment)
            .transpose()?,
        item_name: args.name,
        description: args.description,
    };
    input.validate_for_submission()?;

    emit_event(
        events.as_ref(),
        "submission_started",
        started_payload(client.model(), &input),
    );
    match client.generate(&input) {
        Ok(metadata) => {
            emit_event(events.as_ref(), "submission_succeeded", {
                let mut payload = SessionEventPayload::new();
                payload.insert("item_name".to_string(), json!(metadata.item_name));
                payload
            });
            let text = metadata.to_pretty_json()?;
            println!("{text}");
            if let Some(out) = args.out {
                std::fs::write(&out, &text)
                    .with_context(|| format!("failed to write {}", out.display()))?;
            }
            Ok(())
        }
        Err(err) => {
            emit_event(events.as_ref(), "submission_failed", failed_payload(&err));
            Err(err.into())
        }
    }
}

// ── Interactive session ─────────────────────────────────────────

/// Terminal stand-in for the browser clipboard: prints the JSON so
/// the terminal's own selection buffer can pick it up.
struct StdoutClipboard;

impl Clipboard for StdoutClipboard {
    fn copy_text(&mut self, text: &str) -> Result<()> {
        println!("{text}");
        Ok(())
    }
}

enum LoopEvent {
    Line(String),
    Outcome(Uuid, Result<MenuItemMetadata, GenerationError>),
    Eof,
}

const SESSION_HELP: &str = "commands:
  image <path>      attach a photo (JPEG, PNG, or WebP)
  name <text>       set the item name (kept verbatim)
  describe <text>   set the description (kept verbatim)
  submit            send the current input for extraction
  copy              print the current result as JSON
  show              show session state
  reset             clear everything
  quit              exit";

fn run_session(args: SessionArgs) -> Result<()> {
    let client = Arc::new(GeminiClient::from_env(args.model)?);
    let events = event_writer(args.events.as_deref());
    let mut controller = SessionController::new(StdoutClipboard);

    let (tx, rx) = mpsc::channel();
    spawn_stdin_reader(tx.clone());

    println!("menuforge session - type 'help' for commands");
    loop {
        match rx.recv_timeout(Duration::from_millis(200)) {
            Ok(LoopEvent::Line(line)) => {
                controller.tick(Instant::now());
                if !handle_line(&line, &mut controller, &client, &tx, events.as_ref()) {
                    break;
                }
            }
            Ok(LoopEvent::Outcome(token, outcome)) => {
                let summary = match &outcome {
                    Ok(metadata) => Ok(metadata.item_name.clone()),
                    Err(err) => Err((err.kind().to_string(), err.to_string())),
                };
                if controller.apply_outcome(token, outcome) {
                    report_outcome(&controller, summary, events.as_ref());
                } else {
                    emit_event(
                        events.as_ref(),
                        "stale_outcome_discarded",
                        SessionEventPayload::new(),
                    );
                }
            }
            Ok(LoopEvent::Eof) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => controller.tick(Instant::now()),
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    Ok(())
}

fn spawn_stdin_reader(tx: mpsc::Sender<LoopEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(LoopEvent::Line(line)).is_err() {
                        return;
                    }
                }
                Err(_) => break,
            }
        }
        let _ = tx.send(LoopEvent::Eof);
    });
}

/// Returns false when the session should end.
fn handle_line(
    line: &str,
    controller: &mut SessionController<StdoutClipboard>,
    client: &Arc<GeminiClient>,
    tx: &mpsc::Sender<LoopEvent>,
    events: Option<&SessionEventWriter>,
) -> bool {
    let line = line.trim();
    let (command, rest) = match line.split_once(' ') {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    let outcome = match command {
        "" => Ok(()),
        "help" => {
            println!("{SESSION_HELP}");
            Ok(())
        }
        "image" => load_image_attachment(Path::new(rest))
            .map_err(|err| GenerationError::Validation(format!("{err:#}")))
            .and_then(|attachment| {
                controller.set_image(attachment.bytes, &attachment.mime_type)
            })
            .map(|()| println!("image attached")),
        "name" => controller
            .set_item_name(rest)
            .map(|()| println!("item name set")),
        "describe" => controller
            .set_description(rest)
            .map(|()| println!("description set")),
        "submit" => controller.begin_submission().map(|submission| {
            emit_event(
                events,
                "submission_started",
                started_payload(client.model(), &submission.input),
            );
            let client = Arc::clone(client);
            let tx = tx.clone();
            thread::spawn(move || {
                let outcome = client.generate(&submission.input);
                let _ = tx.send(LoopEvent::Outcome(submission.token, outcome));
            });
            println!("extracting…");
        }),
        "copy" => controller.copy_result(Instant::now()).map(|()| {
            emit_event(events, "result_copied", SessionEventPayload::new());
        }),
        "show" => {
            print_state(controller);
            Ok(())
        }
        "reset" => {
            controller.reset();
            emit_event(events, "session_reset", SessionEventPayload::new());
            println!("session cleared");
            Ok(())
        }
        "quit" | "exit" => return false,
        other => Err(GenerationError::Validation(format!(
            "unknown command '{other}'; type 'help'"
        ))),
    };

    if let Err(err) = outcome {
        eprintln!("{err}");
    }
    true
}

fn report_outcome(
    controller: &SessionController<StdoutClipboard>,
    summary: Result<String, (String, String)>,
    events: Option<&SessionEventWriter>,
) {
    match summary {
        Ok(item_name) => {
            emit_event(events, "submission_succeeded", {
                let mut payload = SessionEventPayload::new();
                payload.insert("item_name".to_string(), json!(item_name));
                payload
            });
            if let Some(result) = controller.result() {
                match result.to_pretty_json() {
                    Ok(text) => println!("{text}"),
                    Err(err) => eprintln!("failed to render result: {err:#}"),
                }
            }
        }
        Err((kind, message)) => {
            emit_event(events, "submission_failed", {
                let mut payload = SessionEventPayload::new();
                payload.insert("kind".to_string(), json!(kind));
                payload.insert("message".to_string(), json!(message));
                payload
            });
            if let Some(message) = controller.error() {
                eprintln!("{message}");
            }
        }
    }
}

fn print_state(controller: &SessionController<StdoutClipboard>) {
    let phase = match controller.phase() {
        SessionPhase::Idle => "idle",
        SessionPhase::AwaitingInput => "awaiting input",
        SessionPhase::Loading => "loading",
        SessionPhase::Success => "success",
        SessionPhase::Failed => "failed",
    };
    println!("phase: {phase}");
    let input = controller.input();
    if let Some(image) = &input.image {
        println!("image: {} ({} bytes)", image.mime_type, image.bytes.len());
    }
    if let Some(name) = input.manual_item_name() {
        println!("name: {name}");
    }
    if let Some(description) = input.manual_description() {
        println!("description: {description}");
    }
    if let Some(error) = controller.error() {
        println!("error: {error}");
    }
    if controller.copied() {
        println!("copied: yes");
    }
}
