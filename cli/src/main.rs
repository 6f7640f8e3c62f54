mod command;
mod config;
mod dry_run;
mod session;
mod settings;

use std::sync::Arc;

use anyhow::Context;
use chat_composer::AppEvent;
use chat_composer::AppEventSender;
use chat_composer::BlobUrlRegistry;
use chat_composer::ChatComposer;
use chat_composer::ChatComposerParams;
use chat_composer::HttpHandlerConfig;
use chat_composer::HttpStreamHandler;
use chat_composer::StreamHandler;
use clap::Parser;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::sync::mpsc::unbounded_channel;

use crate::config::ConfigStore;
use crate::config::FileConfig;
use crate::dry_run::DryRunHandler;
use crate::session::Flow;
use crate::session::Session;
use crate::settings::Overrides;
use crate::settings::Settings;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Compose a message with image attachments and stream it to an agent or team"
)]
struct Cli {
    /// Base URL of the agent server. Defaults to `endpoint` in
    /// `~/.chat-composer/config.toml`, then http://localhost:7777.
    #[arg(long, env = "CHAT_COMPOSER_ENDPOINT")]
    endpoint: Option<String>,

    /// Send to this agent. Takes precedence over `--team`.
    #[arg(long)]
    agent: Option<String>,

    /// Send to this team.
    #[arg(long)]
    team: Option<String>,

    /// Session id forwarded with every run.
    #[arg(long)]
    session_id: Option<String>,

    /// Print what would be sent instead of contacting the server.
    #[arg(long)]
    dry_run: bool,
}

impl From<Cli> for Overrides {
    fn from(cli: Cli) -> Self {
        Self {
            endpoint: cli.endpoint,
            agent: cli.agent,
            team: cli.team,
            session_id: cli.session_id,
            dry_run: cli.dry_run,
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter =
        EnvFilter::try_from_env("CHAT_COMPOSER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn load_file_config() -> FileConfig {
    match ConfigStore::new_default().and_then(|store| store.load()) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("ignoring config file: {err:#}");
            FileConfig::default()
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let settings = Settings::resolve(cli.into(), load_file_config())?;
    tracing::debug!("resolved settings: {settings:?}");

    let (tx, mut app_event_rx) = unbounded_channel::<AppEvent>();
    let app_event_tx = AppEventSender::new(tx);
    let handler: Arc<dyn StreamHandler> = if settings.dry_run {
        Arc::new(DryRunHandler::new(app_event_tx.clone()))
    } else {
        Arc::new(HttpStreamHandler::new(
            HttpHandlerConfig {
                endpoint: settings.endpoint.clone(),
                session_id: settings.session_id.clone(),
            },
            app_event_tx.clone(),
        ))
    };
    let composer = ChatComposer::new(ChatComposerParams {
        notifier: Arc::new(app_event_tx.clone()),
        handler,
        preview_registry: Box::new(BlobUrlRegistry::new()),
        selection: settings.selection.clone(),
    });

    let mut session = Session::new(composer, app_event_tx, std::io::stdout(), std::io::stderr());
    eprintln!(
        "chat-composer: {} (type /help for commands)",
        if settings.dry_run {
            "dry run".to_string()
        } else {
            settings.endpoint.to_string()
        }
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    // Once input ends or /quit is seen, keep rendering events until the send in flight settles.
    let mut draining = false;
    loop {
        if draining && !session.is_busy() {
            break;
        }
        tokio::select! {
            line = lines.next_line(), if !draining => {
                match line.context("read stdin")? {
                    Some(line) => {
                        if session.handle_line(&line)? == Flow::Quit {
                            draining = true;
                        }
                    }
                    None => draining = true,
                }
            }
            Some(event) = app_event_rx.recv() => session.handle_event(event)?,
            else => break,
        }
    }

    Ok(())
}
