//! research-console CLI
//!
//! Submits a research query to the backend, streams progress to the
//! terminal, prompts for clarification answers when the agent asks, prints
//! the final report, and keeps a local history of completed reports.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use research_console_lib::{
    FileHistoryStore, HistoryStore, Session, SessionController, SessionStatus,
};

#[derive(Parser)]
#[command(
    name = "research-console",
    version,
    about = "Streamed research-agent sessions from your terminal"
)]
struct Cli {
    /// Research backend base URL
    #[arg(
        long,
        env = "RESEARCH_BACKEND_URL",
        default_value = "http://localhost:8000"
    )]
    backend_url: String,

    /// History file path (defaults to the platform data directory)
    #[arg(long, env = "RESEARCH_HISTORY_FILE")]
    history_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a research query and stream its progress
    Run {
        /// The research query
        query: Vec<String>,
    },
    /// List saved reports, most recent first
    History,
    /// Print a saved report by id
    Show { id: String },
    /// Delete a saved report by id
    Delete { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let Cli {
        backend_url,
        history_file,
        command,
    } = Cli::parse();

    let history = Arc::new(FileHistoryStore::new(
        history_file.unwrap_or_else(FileHistoryStore::default_path),
    ));

    match command {
        Command::Run { query } => run_query(&backend_url, history, query.join(" ")).await,
        Command::History => list_history(history.as_ref()),
        Command::Show { id } => show_report(history.as_ref(), &id),
        Command::Delete { id } => {
            history.delete(&id).map_err(anyhow::Error::msg)?;
            Ok(())
        }
    }
}

async fn run_query(
    backend_url: &str,
    history: Arc<FileHistoryStore>,
    query: String,
) -> anyhow::Result<()> {
    if query.trim().is_empty() {
        bail!("query must not be empty");
    }

    let session_id = Uuid::new_v4().to_string();
    let controller = SessionController::for_backend(session_id, backend_url, history);
    controller.start(&query)?;

    let mut rendered: Vec<(String, bool)> = Vec::new();
    let mut answered_question: Option<String> = None;

    loop {
        tokio::time::sleep(Duration::from_millis(200)).await;
        let snapshot = controller.snapshot();
        render_progress(&snapshot, &mut rendered);

        if snapshot.clarification.is_open() {
            let question = snapshot
                .clarification
                .question()
                .unwrap_or_default()
                .to_string();
            if answered_question.as_deref() != Some(question.as_str()) {
                println!("\nThe agent needs clarification:");
                println!("  {}", question);
                let answer = read_line("> ").await?;
                if controller.submit_clarification(&answer) {
                    answered_question = Some(question);
                }
            }
        }

        match snapshot.status {
            SessionStatus::Complete => {
                println!("\n{}", snapshot.report.unwrap_or_default());
                if let Some(title) = snapshot.title {
                    log::info!("saved report '{}' to history", title);
                }
                return Ok(());
            }
            SessionStatus::Error => {
                bail!("research failed; check the backend and try again")
            }
            _ => {}
        }
    }
}

/// Print ledger lines as they appear or change. Keyed lines update in
/// place upstream, so a changed line is re-printed rather than redrawn.
fn render_progress(snapshot: &Session, rendered: &mut Vec<(String, bool)>) {
    for (index, item) in snapshot.progress.iter().enumerate() {
        let line = (item.message.clone(), item.done);
        if rendered.get(index) == Some(&line) {
            continue;
        }
        let marker = if item.done { "✓" } else { "·" };
        println!("{} {}", marker, item.message);
        if index < rendered.len() {
            rendered[index] = line;
        } else {
            rendered.push(line);
        }
    }
}

async fn read_line(prompt: &str) -> anyhow::Result<String> {
    let prompt = prompt.to_string();
    let line = tokio::task::spawn_blocking(move || {
        print!("{}", prompt);
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        Ok::<String, std::io::Error>(line.trim().to_string())
    })
    .await??;
    Ok(line)
}

fn list_history(history: &FileHistoryStore) -> anyhow::Result<()> {
    let entries = history.list().map_err(anyhow::Error::msg)?;
    if entries.is_empty() {
        println!("No research history yet");
        return Ok(());
    }

    for entry in entries {
        println!(
            "{}  {}  {}",
            entry.id,
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.title
        );
        println!("    {}", entry.query);
    }
    Ok(())
}

fn show_report(history: &FileHistoryStore, id: &str) -> anyhow::Result<()> {
    let entries = history.list().map_err(anyhow::Error::msg)?;
    match entries.into_iter().find(|entry| entry.id == id) {
        Some(entry) => {
            println!("{}", entry.report);
            Ok(())
        }
        None => bail!("no history entry with id {}", id),
    }
}
