use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use kas_bot::application::services::{CommandService, MessageService, Services};
use kas_bot::application::messaging::Dispatcher;
use kas_bot::domain::traits::{ChatTransport, Store};
use kas_bot::infrastructure::adapters::ConsoleAdapter;
use kas_bot::infrastructure::config::{Config, StorageBackend};
use kas_bot::infrastructure::{MemoryStore, SqliteStore};
use kas_bot::{BotError, StorageError};

#[derive(Parser)]
#[command(name = "kas-bot")]
#[command(about = "Group chat bot for sport matches and a shared kas ledger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the console bot
    Run,
    /// Print all groups with their stats as JSON
    Groups,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => run_bot(&cli.config).await,
        Commands::Groups => print_groups(&cli.config).await,
        Commands::Version => {
            println!("kas-bot v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(config_path: &str) -> Result<Config, BotError> {
    let mut config = if Path::new(config_path).exists() {
        Config::load(config_path)?
    } else {
        tracing::info!("No config at {}, using defaults", config_path);
        Config::default()
    };
    config.apply_env()?;
    Ok(config)
}

fn open_store(config: &Config) -> Result<Arc<dyn Store>, BotError> {
    let store: Arc<dyn Store> = match config.storage.backend {
        StorageBackend::Sqlite => Arc::new(SqliteStore::open(&config.storage.path)?),
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(store)
}

async fn run_bot(config_path: &str) -> Result<(), BotError> {
    let config = load_config(config_path)?;
    tracing::info!("Starting kas-bot: {}", config.bot.name);

    let services = Services::new(open_store(&config)?);

    let mut commands = CommandService::new(&config.bot.prefix);
    commands.register_defaults();

    let dispatcher = Arc::new(Dispatcher::new(commands, services, config.kas_settings()));
    let adapter = ConsoleAdapter::new(&config.console);
    adapter.start().await?;

    let info = adapter.info();
    tracing::info!("Transport started: {} ({})", info.name, info.id);
    println!(
        "Ketik perintah, misalnya {}help. Awali dengan @nama untuk berganti pengirim.",
        config.bot.prefix
    );

    let service = MessageService::new(adapter, dispatcher);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => return Err(BotError::Transport(format!("Failed to read stdin: {}", e))),
        };

        let Some(message) = service.transport().message_from_line(&line) else {
            continue;
        };

        if !service.process(&message).await {
            tracing::debug!("Ignored: {}", message.text);
        }
    }

    tracing::info!("Console closed, shutting down");
    Ok(())
}

async fn print_groups(config_path: &str) -> Result<(), BotError> {
    let config = load_config(config_path)?;
    let services = Services::new(open_store(&config)?);

    let groups = services.directory.list_groups().await?;
    let json = serde_json::to_string_pretty(&groups)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

fn init_config() -> Result<(), BotError> {
    let yaml = Config::default().to_yaml()?;
    println!("{}", yaml);
    println!("\nSave this to config.yaml and adjust as needed.");
    Ok(())
}
