mod config;
mod llm;
mod planner;
mod proxy;
mod wire;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use config::{Config, LogFormat, StoreKind};
use planner::{
    Key, KeyPress, LocalStore, MemoryStore, Planner, ProxyClient, RemoteStore, TaskStore,
    RETRY_MESSAGE,
};

#[derive(Parser)]
#[command(name = "planwise", about = "Smart task planner backed by an LLM suggestion proxy")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the suggestion proxy HTTP server
    Serve,
    /// Ask the proxy for a plan and record it in history
    Plan {
        /// The task to plan
        task: String,
    },
    /// Show recent tasks
    History,
    /// Delete all recorded tasks
    Clear,
    /// Plan tasks line by line (:history, :clear, :undo, :quit)
    Interactive,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing(config.log_format, cli.verbose);

    match cli.command {
        Commands::Serve => proxy::serve(config).await?,
        Commands::Plan { task } => {
            let mut planner = build_planner(&config)?;
            planner.load().await;
            eprintln!("Analyzing...");
            match planner.submit(&task).await {
                Ok(_) => {
                    print_suggestion(&planner);
                    print_history(&planner);
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Submit failed");
                    anyhow::bail!("{}", planner.message().unwrap_or(RETRY_MESSAGE));
                }
            }
        }
        Commands::History => {
            let mut planner = build_planner(&config)?;
            planner.load().await;
            print_history(&planner);
        }
        Commands::Clear => {
            let mut planner = build_planner(&config)?;
            planner
                .clear_history()
                .await
                .context("Failed to clear stored history")?;
            println!("History cleared.");
        }
        Commands::Interactive => {
            let mut planner = build_planner(&config)?;
            planner.load().await;
            run_interactive(&mut planner).await?;
        }
    }

    Ok(())
}

fn init_tracing(format: LogFormat, verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn build_store(config: &Config) -> Result<Arc<dyn TaskStore>> {
    Ok(match config.store {
        StoreKind::Local => {
            let store = LocalStore::new(config.history_path()?);
            tracing::debug!(path = %store.path().display(), "Using local history file");
            Arc::new(store)
        }
        StoreKind::Remote => {
            let url = config
                .remote_url
                .as_deref()
                .context("PLANWISE_REMOTE_URL must be set when PLANWISE_STORE=remote")?;
            Arc::new(
                RemoteStore::new(url, config.remote_auth.as_deref(), Duration::from_secs(10))
                    .context("Failed to build remote store client")?,
            )
        }
        StoreKind::Memory => Arc::new(MemoryStore::new()),
    })
}

fn build_planner(config: &Config) -> Result<Planner> {
    // Outlive the proxy's own upstream timeout so its error envelope arrives first.
    let timeout = config.upstream_timeout + Duration::from_secs(5);
    let source = ProxyClient::new(&config.proxy_url, timeout)
        .context("Failed to build suggestion proxy client")?;
    Ok(Planner::new(Arc::new(source), build_store(config)?))
}

async fn run_interactive(planner: &mut Planner) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    print_history(planner);
    loop {
        stdout.write_all(b"\n> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };

        match line.trim() {
            ":quit" | ":q" => break,
            ":history" => print_history(planner),
            ":undo" => {
                planner.handle_key(KeyPress::plain(Key::Backspace)).await;
                println!("{}", planner.draft());
            }
            ":clear" => match planner.clear_history().await {
                Ok(()) => println!("History cleared."),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to clear stored history");
                    println!("History cleared locally; stored history could not be removed.");
                }
            },
            _ => {
                // A trailing backslash continues the task on the next line.
                let (text, more) = match line.strip_suffix('\\') {
                    Some(text) => (text, true),
                    None => (line.as_str(), false),
                };
                for c in text.chars() {
                    planner.handle_key(KeyPress::plain(Key::Char(c))).await;
                }
                if more {
                    planner.handle_key(KeyPress::plain(Key::Enter)).await;
                    continue;
                }

                eprintln!("Analyzing...");
                let outcome = planner.handle_key(KeyPress::ctrl(Key::Enter)).await;
                planner.set_draft("");
                match outcome {
                    Some(Ok(_)) => print_suggestion(planner),
                    Some(Err(_)) => {
                        if let Some(message) = planner.message() {
                            println!("{}", message);
                        }
                    }
                    None => {}
                }
            }
        }
    }

    Ok(())
}

fn print_suggestion(planner: &Planner) {
    if let Some(suggestion) = planner.suggestion() {
        println!("\nSuggestion:\n{}", suggestion);
    }
}

fn print_history(planner: &Planner) {
    let history = planner.history();
    if history.is_empty() {
        println!("No previous tasks.");
        return;
    }

    println!("\nPrevious Tasks");
    for record in history.iter() {
        println!("\n{}", record.task());
        println!("{}", record.suggestion());
        println!("  {}", local_time(record.timestamp()));
    }
}

fn local_time(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}
