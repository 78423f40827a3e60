use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

mod domain;
mod application;
mod infrastructure;

use application::errors::BotError;
use application::services::{InFlight, MessageService};
use domain::entities::{Message, User};
use domain::traits::Bot;
use infrastructure::adapters::discord::{Gateway, GatewayEvent, Session, GATEWAY_URL, INTENTS};
use infrastructure::adapters::{ConsoleAdapter, DiscordAdapter};
use infrastructure::config::Config;
use infrastructure::whois::WhoisProxyClient;

/// Pause before opening a replacement gateway connection
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// How long shutdown waits for message handlers that are still running
const DRAIN_LIMIT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "whoisbot")]
#[command(about = "Discord bot that answers domain names with WHOIS summaries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Bot token (overrides config and DISCORD_BOT_TOKEN)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Discord and start answering
    Run,
    /// Read messages from stdin and print results (dev mode)
    Console,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => block_on(run_discord_bot(cli.config, cli.token)),
        Commands::Console => block_on(run_console_bot(cli.config)),
        Commands::Version => {
            println!("whoisbot v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn block_on<F>(future: F) -> Result<(), BotError>
where
    F: std::future::Future<Output = Result<(), BotError>>,
{
    let rt = tokio::runtime::Runtime::new().map_err(|e| BotError::Internal(e.to_string()))?;
    rt.block_on(future)
}

fn load_config(config_path: &str, token_override: Option<String>) -> Result<Config, BotError> {
    let mut config = if std::path::Path::new(config_path).exists() {
        tracing::info!("Loading config from {}", config_path);
        Config::load(config_path)?.apply_env()?
    } else {
        Config::load_env()?
    };

    if let Some(token) = token_override {
        config.adapters.discord.token = Some(token);
    }

    Ok(config)
}

fn build_service(config: &Config) -> Result<MessageService<WhoisProxyClient>, BotError> {
    let extractor = config.extractor()?;
    tracing::info!("Watching {} domain suffixes: {}", extractor.suffixes().len(), extractor.suffixes().join(", "));

    let timeout = config.whois_timeout()?;
    let lookup = WhoisProxyClient::new(&config.whois.base_url, timeout)?;
    tracing::info!("WHOIS provider: {} (timeout {:?})", config.whois.base_url, timeout);

    Ok(MessageService::new(extractor, config.renderer(), lookup))
}

async fn run_discord_bot(config_path: String, token_override: Option<String>) -> Result<(), BotError> {
    let config = load_config(&config_path, token_override)?;
    let token = config.token()?.to_string();
    let service = Arc::new(build_service(&config)?);

    tracing::info!("Starting {}", config.bot.name);

    let mut adapter = DiscordAdapter::new(token.clone());
    adapter.fetch_bot_info().await?;
    adapter.start().await?;
    let adapter = Arc::new(adapter);

    let mut gateway = Gateway::connect(GATEWAY_URL, &token, INTENTS).await?;
    tracing::info!("Press CTRL-C to exit.");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut in_flight = InFlight::new();
    let mut connected = true;

    let outcome = loop {
        let event = tokio::select! {
            _ = &mut shutdown => break Ok(()),
            event = gateway.next_event() => event,
        };

        match event {
            Ok(GatewayEvent::Ready(info)) => {
                tracing::info!("Logged in as {}", info.username);
            }
            Ok(GatewayEvent::Resumed) => {
                tracing::info!("Gateway session resumed");
            }
            Ok(GatewayEvent::MessageCreate(message)) => {
                let adapter = Arc::clone(&adapter);
                let service = Arc::clone(&service);
                in_flight.spawn(async move {
                    service.process(adapter.as_ref(), &message).await;
                });
                tracing::debug!("{} message handler(s) running", in_flight.len());
            }
            Ok(GatewayEvent::Reconnect { resumable }) => {
                let session = if resumable { gateway.session() } else { None };
                connected = false;
                gateway = tokio::select! {
                    _ = &mut shutdown => break Ok(()),
                    next = reconnect(session, &token) => next,
                };
                connected = true;
            }
            Err(e) => {
                connected = false;
                break Err(e);
            }
        }
    };

    in_flight.drain(DRAIN_LIMIT).await;

    if connected {
        if let Err(e) = gateway.close().await {
            tracing::warn!("Failed to close gateway cleanly: {}", e);
        }
    }
    tracing::info!("Disconnected");

    outcome
}

/// Open a replacement gateway connection, resuming `session` when given.
///
/// Keeps trying until a connection is established; a failed resume falls
/// back to a fresh identify on the next attempt.
async fn reconnect(mut session: Option<Session>, token: &str) -> Gateway {
    loop {
        tokio::time::sleep(RECONNECT_DELAY).await;

        let attempt = match session.take() {
            Some(session) => {
                tracing::info!("Resuming gateway session {}", session.session_id);
                Gateway::resume(&session, token).await
            }
            None => {
                tracing::info!("Reconnecting to the gateway");
                Gateway::connect(GATEWAY_URL, token, INTENTS).await
            }
        };

        match attempt {
            Ok(gateway) => return gateway,
            Err(e) => tracing::warn!("Gateway reconnect failed, retrying in {:?}: {}", RECONNECT_DELAY, e),
        }
    }
}

async fn run_console_bot(config_path: String) -> Result<(), BotError> {
    let config = load_config(&config_path, None)?;
    let service = build_service(&config)?;

    let bot = ConsoleAdapter::new();
    bot.start().await?;

    let info = bot.bot_info();
    tracing::info!("Bot started: {} (type a message, CTRL-D to quit)", info.username);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            _ = &mut shutdown => break,
            line = lines.next_line() => line.map_err(|e| BotError::Internal(e.to_string()))?,
        };

        let Some(input) = line else {
            break;
        };
        if input.trim().is_empty() {
            continue;
        }

        let message = Message::from_text("console", input)
            .with_sender(User::new("console-user").with_username("you"))
            .with_platform("console");
        if service.process(&bot, &message).await == 0 {
            tracing::info!("No WHOIS results for that message");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for CTRL-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Received shutdown signal");
}

fn init_config() -> Result<(), BotError> {
    let config = Config::default();
    let yaml = serde_yaml::to_string(&config).map_err(|e| BotError::Internal(e.to_string()))?;
    println!("{}", yaml);
    println!("\nSave this to config.yaml and adjust as needed.");
    println!("The bot token is read from DISCORD_BOT_TOKEN (a .env file works too).");
    Ok(())
}
