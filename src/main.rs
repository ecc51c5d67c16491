//! taskboard-notify - Notification sync client for the taskboard backend
//!
//! This is the command-line entry point: list, watch, mark as read and delete
//! the current user's notifications.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{info, warn};

use taskboard_notify::auth::{CredentialProvider, FileCredentials, StaticCredentials};
use taskboard_notify::config::Config;
use taskboard_notify::error::AppError;
use taskboard_notify::logging::init_tracing;
use taskboard_notify::models::NotificationEntry;
use taskboard_notify::notifications::{
    HttpNotificationApi, MarkReadOutcome, NotificationSnapshot, NotificationSyncStore,
};
use taskboard_notify::sync::{ApiClient, RetryExecutor};

/// taskboard-notify - Notification sync client for the taskboard backend
#[derive(Parser, Debug)]
#[command(name = "taskboard-notify")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "TASKBOARD_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and print notifications once
    List,
    /// Poll and print the unread count whenever it changes
    Watch,
    /// Mark a notification as read
    Read {
        /// Notification ID
        id: String,
    },
    /// Hide a notification
    Delete {
        /// Notification ID
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = load_config(&args)?;

    init_tracing(&config.logging)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.api.base_url,
        "Starting taskboard-notify"
    );

    let credentials = load_credentials(&config)?;
    if !credentials.has_session() {
        anyhow::bail!("No session: set session.token or session.token_file");
    }

    let store = Arc::new(build_store(&config, Arc::clone(&credentials))?);

    match args.command {
        Command::List => {
            store.refresh().await;
            print_snapshot(&store.snapshot());
        }
        Command::Watch => watch(&store, credentials.as_ref()).await,
        Command::Read { id } => {
            store.refresh().await;
            match store.mark_as_read(&id).await? {
                MarkReadOutcome::Marked => {
                    println!("Marked {} as read ({} unread)", id, store.unread_count());
                }
                MarkReadOutcome::AlreadyRead => println!("{} is already read", id),
                MarkReadOutcome::InProgress => println!("{} is already being marked", id),
                MarkReadOutcome::NotFound => anyhow::bail!("Notification {} not found", id),
            }
        }
        Command::Delete { id } => {
            store.refresh().await;
            store.delete_notification(&id).await?;
            println!("Deleted {} ({} unread)", id, store.unread_count());
        }
    }

    store.stop();
    info!("taskboard-notify shutdown complete");
    Ok(())
}

/// Load configuration from file or environment
fn load_config(args: &Args) -> anyhow::Result<Config> {
    match &args.config {
        Some(path) => {
            // Use eprintln! since tracing is not yet initialized
            eprintln!("Loading configuration from file: {}", path);
            Config::from_file(path).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
        }
        None => {
            eprintln!("Loading configuration from environment variables");
            Config::from_env().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
        }
    }
}

/// Pick the credential provider; a token file wins over an inline token
fn load_credentials(config: &Config) -> Result<Arc<dyn CredentialProvider>, AppError> {
    if let Some(path) = &config.session.token_file {
        let credentials = FileCredentials::load(path)?;
        if credentials.access_token().is_none() {
            if let Some(token) = &config.session.token {
                credentials.store(token)?;
            }
        }
        return Ok(Arc::new(credentials));
    }

    Ok(match &config.session.token {
        Some(token) => Arc::new(StaticCredentials::new(token.clone())),
        None => Arc::new(StaticCredentials::anonymous()),
    })
}

/// Wire the HTTP client, retry executor and store together
fn build_store(
    config: &Config,
    credentials: Arc<dyn CredentialProvider>,
) -> Result<NotificationSyncStore, AppError> {
    let client = ApiClient::new(&config.api, credentials)?;
    let mut api = HttpNotificationApi::new(client);
    if config.notifications.retry_list {
        api = api.with_retry(RetryExecutor::new(config.retry.clone()));
    }

    Ok(NotificationSyncStore::new(
        Arc::new(api),
        &config.notifications,
        true,
    ))
}

/// Poll until a shutdown signal arrives or the session is rejected
async fn watch(store: &Arc<NotificationSyncStore>, credentials: &dyn CredentialProvider) {
    let mut changes = store.subscribe();
    store.start();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let unread = changes.borrow_and_update().unread_count;
                println!("{} unread", unread);

                if !credentials.has_session() {
                    warn!("Session rejected by backend, stopping");
                    store.set_session_active(false);
                    break;
                }
            }
            _ = tokio::time::sleep(store.poll_interval()) => {
                if !credentials.has_session() {
                    warn!("Session rejected by backend, stopping");
                    store.set_session_active(false);
                    break;
                }
            }
        }
    }
}

fn print_snapshot(snapshot: &NotificationSnapshot) {
    for entry in &snapshot.entries {
        println!("{}", format_entry(entry));
    }
    println!("{} unread", snapshot.unread_count);
}

fn format_entry(entry: &NotificationEntry) -> String {
    let marker = if entry.is_unread() { "*" } else { " " };
    format!(
        "{} {} [{}] {} ({})",
        marker,
        entry.id,
        entry.kind.label(),
        entry.message(),
        entry.created_at.format("%Y-%m-%d %H:%M")
    )
}

/// Create a future that resolves when a shutdown signal is received
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}
