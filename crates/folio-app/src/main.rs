//! Folio application binary - composition root.
//!
//! Ties together the Folio crates into a single executable:
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Build the backend HTTP client
//! 3. Build the chat orchestrator over a seeded conversation store
//! 4. Run the interactive terminal loop
//!
//! Plain input is sent as a chat message; `/`-prefixed commands manage
//! conversations, documents, search, and the backend index.

mod cli;

use std::io::Write as _;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use folio_chat::{Action, ChatOrchestrator, Role, SourceRef};
use folio_client::BackendClient;
use folio_core::config::FolioConfig;

use cli::CliArgs;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    let config_path = args.resolve_config_path();
    let mut config = FolioConfig::load_or_default(&config_path);

    config.backend.base_url = args.resolve_base_url(&config.backend.base_url);
    config.general.log_level = args.resolve_log_level(&config.general.log_level);
    config.chat.streaming = args.resolve_streaming(config.chat.streaming);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.general.log_level.clone())),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        base_url = %config.backend.base_url,
        streaming = config.chat.streaming,
        "Folio starting"
    );

    let backend = Arc::new(BackendClient::new(
        config.backend.base_url.clone(),
        config.backend.timeout_secs,
    ));
    let orchestrator = Arc::new(ChatOrchestrator::new(backend.clone(), config.chat.clone()));

    println!("Folio — document chat. Type /help for commands, /quit to exit.");
    print_current(&orchestrator);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        let _ = std::io::stdout().flush();
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read input");
                break;
            }
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "/quit" || input == "/exit" {
            break;
        }
        if let Some(command) = input.strip_prefix('/') {
            handle_command(&orchestrator, &backend, command).await;
        } else {
            send_chat(&orchestrator, input).await;
        }
    }
}

/// Send a chat message to the current conversation and print the answer.
async fn send_chat(orchestrator: &ChatOrchestrator, text: &str) {
    let Ok(state) = orchestrator.state() else {
        eprintln!("internal error: state unavailable");
        return;
    };
    let id = state.current_id;
    if state.current().is_none() {
        eprintln!("no current conversation; /list then /select <n>");
        return;
    }

    let mut streamed_any = false;
    let result = orchestrator
        .send_message_with(id, text, None, &mut |token| {
            streamed_any = true;
            print!("{}", token);
            let _ = std::io::stdout().flush();
        })
        .await;
    if streamed_any {
        println!();
    }

    match result {
        Ok(folio_chat::SendOutcome::Sent) => {
            if let Some(conversation) = orchestrator.conversation(id) {
                if let Some(last) = conversation.messages.last() {
                    if last.role == Role::Bot {
                        if !streamed_any {
                            println!("{}", last.content);
                        }
                        print_sources(&last.sources);
                    }
                }
            }
        }
        Ok(outcome) => tracing::debug!(?outcome, "Message not sent"),
        Err(e) => eprintln!("error: {}", e),
    }
}

/// Dispatch a `/command` line.
async fn handle_command(orchestrator: &ChatOrchestrator, backend: &BackendClient, command: &str) {
    let (name, rest) = match command.split_once(' ') {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };

    match name {
        "help" => print_help(),
        "new" => {
            let _ = orchestrator.dispatch(Action::CreateConversation);
            print_current(orchestrator);
        }
        "list" => {
            if let Ok(state) = orchestrator.state() {
                for (i, c) in state.conversations.iter().enumerate() {
                    let marker = if c.id == state.current_id { "*" } else { " " };
                    println!("{} {:>2}. {} — {}", marker, i + 1, c.title, c.last_message);
                }
            }
        }
        "select" => match index_arg(rest, orchestrator) {
            Some(id) => {
                let _ = orchestrator.dispatch(Action::SelectConversation { id });
                print_current(orchestrator);
            }
            None => eprintln!("usage: /select <number from /list>"),
        },
        "delete" => match index_arg(rest, orchestrator) {
            Some(id) => {
                let _ = orchestrator.dispatch(Action::DeleteConversation { id });
                print_current(orchestrator);
            }
            None => eprintln!("usage: /delete <number from /list>"),
        },
        "title" => {
            if rest.is_empty() {
                eprintln!("usage: /title <new title>");
            } else if let Ok(state) = orchestrator.state() {
                let _ = orchestrator.dispatch(Action::EditTitle {
                    conversation_id: state.current_id,
                    title: rest.to_string(),
                });
            }
        }
        "search" => {
            if rest.is_empty() {
                eprintln!("usage: /search <query>");
                return;
            }
            match backend.search(rest, 5).await {
                Ok(response) => {
                    println!("{} results", response.total_results);
                    for hit in &response.results {
                        println!("  [{} p.{}] ({:.3}) {}", hit.source, hit.page, hit.score, hit.text);
                    }
                }
                Err(e) => eprintln!("search failed: {}", e),
            }
        }
        "files" => match backend.list_files().await {
            Ok(listing) => {
                println!("{} files", listing.total_files);
                for f in &listing.files {
                    println!("  {} ({} bytes)", f.filename, f.size);
                }
            }
            Err(e) => eprintln!("listing failed: {}", e),
        },
        "upload" => {
            if rest.is_empty() {
                eprintln!("usage: /upload <path>");
                return;
            }
            upload(orchestrator, backend, rest).await;
        }
        "rm" => {
            if rest.is_empty() {
                eprintln!("usage: /rm <filename>");
                return;
            }
            match backend.delete_file(rest).await {
                Ok(receipt) => println!("{}", receipt.message),
                Err(e) => eprintln!("delete failed: {}", e),
            }
        }
        "index" => match backend.build_index(false).await {
            Ok(receipt) => println!("{}", receipt.message),
            Err(e) => eprintln!("index build failed: {}", e),
        },
        "stats" => match backend.collection_stats().await {
            Ok(stats) => {
                println!(
                    "{} chunks in {} ({})",
                    stats.total_chunks, stats.collection_name, stats.embedding_model
                );
                for source in &stats.sources {
                    println!("  {}", source);
                }
            }
            Err(e) => eprintln!("stats failed: {}", e),
        },
        "status" => match backend.index_status().await {
            Ok(status) => {
                if status.is_running {
                    match status.progress {
                        Some(p) => println!("index build running ({:.0}%)", p * 100.0),
                        None => println!("index build running"),
                    }
                } else {
                    println!("index idle");
                }
            }
            Err(e) => eprintln!("status failed: {}", e),
        },
        _ => eprintln!("unknown command: /{} (see /help)", name),
    }
}

/// Upload a local file and post a notice into the current conversation.
async fn upload(orchestrator: &ChatOrchestrator, backend: &BackendClient, path: &str) {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("cannot read {}: {}", path, e);
            return;
        }
    };
    let filename = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string());

    match backend.upload_file(&filename, bytes, mime_for(&filename)).await {
        Ok(receipt) => {
            println!("{}", receipt.message);
            if let Ok(state) = orchestrator.state() {
                let _ = orchestrator.add_notice(
                    state.current_id,
                    &format!("Uploaded {} ({} bytes).", receipt.filename, receipt.size),
                );
            }
        }
        Err(e) => eprintln!("upload failed: {}", e),
    }
}

/// Content type from the file extension; the backend only accepts documents.
fn mime_for(filename: &str) -> &'static str {
    let ext = std::path::Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("md") => "text/markdown",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Map a 1-based `/list` index to a conversation id.
fn index_arg(rest: &str, orchestrator: &ChatOrchestrator) -> Option<uuid::Uuid> {
    let n: usize = rest.parse().ok()?;
    let state = orchestrator.state().ok()?;
    state.conversations.get(n.checked_sub(1)?).map(|c| c.id)
}

fn print_sources(sources: &[SourceRef]) {
    if sources.is_empty() {
        return;
    }
    println!("sources:");
    for s in sources {
        println!("  [{} p.{}] ({:.3})", s.source, s.page, s.score);
    }
}

fn print_current(orchestrator: &ChatOrchestrator) {
    if let Ok(state) = orchestrator.state() {
        match state.current() {
            Some(c) => println!("[{}]", c.title),
            None => println!("[no conversation selected]"),
        }
    }
}

fn print_help() {
    println!("  <text>           send a chat message");
    println!("  /new             start a new conversation");
    println!("  /list            list conversations");
    println!("  /select <n>      switch conversation");
    println!("  /delete <n>      delete conversation");
    println!("  /title <text>    rename the current conversation");
    println!("  /search <query>  semantic search over the documents");
    println!("  /files           list uploaded documents");
    println!("  /upload <path>   upload a document");
    println!("  /rm <filename>   delete an uploaded document");
    println!("  /index           trigger an index build");
    println!("  /status          show index build status");
    println!("  /stats           show collection statistics");
    println!("  /quit            exit");
}
