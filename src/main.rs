//! suggestd - suggestion box workflow daemon.
//!
//! Runs the engine against the in-memory transport with a local line
//! console as the command front-end. A platform adapter replaces both in a
//! real deployment; the console exists so operators can exercise the full
//! command surface against a live database.

use std::sync::Arc;
use suggestd::commands::{Actor, Context, Registry, Reply};
use suggestd::config::Config;
use suggestd::engine::Engine;
use suggestd::store::Database;
use suggestd::transport::{ChannelId, CommunityId, InMemoryTransport};
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// The console operates on one demo community.
const CONSOLE_COMMUNITY: CommunityId = 1;

/// Channels pre-opened on the in-memory transport.
const CONSOLE_CHANNELS: [ChannelId; 3] = [10, 11, 12];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration; a missing file means defaults.
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "suggestd.toml".to_string());

    let config = if std::path::Path::new(&config_path).exists() {
        Config::load(&config_path).map_err(|e| {
            error!(path = %config_path, error = %e, "Failed to load config");
            e
        })?
    } else {
        info!(path = %config_path, "No config file, using defaults");
        Config::default()
    };

    info!(name = %config.engine.name, "Starting suggestd");

    // Initialize database
    let db_path = config
        .database
        .as_ref()
        .map(|d| d.path.as_str())
        .unwrap_or("suggestd.db");
    let db = Database::new(db_path).await?;

    // Prometheus metrics are optional.
    // Convention: port = 0 disables the HTTP endpoint.
    let metrics_port = config.metrics.as_ref().map(|m| m.port).unwrap_or(0);
    if metrics_port == 0 {
        info!("Metrics disabled");
    } else {
        suggestd::metrics::init();
        tokio::spawn(async move {
            suggestd::http::run_http_server(metrics_port).await;
        });
        info!(port = metrics_port, "Prometheus HTTP server started");
    }

    let transport = Arc::new(InMemoryTransport::new());
    for channel in CONSOLE_CHANNELS {
        transport.open_channel(channel);
    }

    let transport_dyn: Arc<dyn suggestd::transport::Transport> = Arc::clone(&transport);
    let engine = Arc::new(Engine::new(db, transport_dyn, config.engine.member_id));
    let registry = Registry::new();

    // The console actor owns the demo community outright.
    let operator = Actor {
        id: config.engine.member_id.max(1) + 1,
        name: "operator".to_string(),
        discriminator: "0001".to_string(),
        rank: u32::MAX,
        is_owner: true,
        is_admin: true,
        is_moderator: true,
    };
    transport.add_profile(operator.profile());

    info!(
        community = CONSOLE_COMMUNITY,
        channels = ?CONSOLE_CHANNELS,
        "Console ready; type commands (e.g. 'suggestset channel #10', 'suggest ...')"
    );

    let (reply_tx, mut reply_rx) = mpsc::channel::<Reply>(64);
    tokio::spawn(async move {
        while let Some(reply) = reply_rx.recv().await {
            match reply {
                Reply::Tick => println!("✓"),
                Reply::Text(text) => println!("{text}"),
                Reply::Display(content) => {
                    println!("{}", content.title);
                    println!("{}", content.author_line);
                    if !content.body.is_empty() {
                        println!("{}", content.body);
                    }
                    for field in &content.fields {
                        println!("{} {}", field.name, field.value);
                    }
                    if !content.footer.is_empty() {
                        println!("-- {}", content.footer);
                    }
                }
            }
        }
    });

    // Stdin feeds one channel; while a handler waits on a confirmation the
    // next line is consumed as the answer.
    let (line_tx, mut line_rx) = mpsc::channel::<String>(16);
    tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line_tx.send(line).await.is_err() {
                break;
            }
        }
    });

    while let Some(input) = line_rx.recv().await {
        let input = input.trim().to_string();
        if input.is_empty() {
            continue;
        }
        if input == "quit" || input == "exit" {
            break;
        }

        // Ban commands name a member by id; resolve it here like a
        // platform adapter would.
        let target = ban_target(&input);

        let mut ctx = Context {
            community: CONSOLE_COMMUNITY,
            actor: &operator,
            target: target.as_ref(),
            origin: None,
            attachment: None,
            engine: &engine,
            replies: &reply_tx,
            confirmations: &mut line_rx,
        };

        if let Err(e) = registry.dispatch(&mut ctx, &input).await {
            error!(error = %e, "console dispatch failed");
            break;
        }
    }

    info!("Console closed");
    Ok(())
}

/// Resolve the numeric target of a ban-family command into a plain member.
fn ban_target(input: &str) -> Option<Actor> {
    let mut parts = input.split_whitespace();
    let command = parts.next()?.to_ascii_lowercase();
    if !matches!(
        command.as_str(),
        "suggestionban"
            | "suggestban"
            | "bansuggest"
            | "suggestionunban"
            | "suggestunban"
            | "unbansuggest"
    ) {
        return None;
    }
    let id: u64 = parts.next()?.parse().ok()?;
    Some(Actor {
        id,
        name: format!("member-{id}"),
        discriminator: "0000".to_string(),
        rank: 0,
        is_owner: false,
        is_admin: false,
        is_moderator: false,
    })
}
