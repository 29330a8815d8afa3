use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod domain;
mod application;
mod infrastructure;

use application::errors::BotError;
use application::messaging::{
    LoggingMiddleware, MessageDispatcher, MessageParser, MiddlewareChain, RateLimitMiddleware,
    WhitelistMiddleware,
};
use application::services::{CommandService, MessageService, VoiceService};
use domain::entities::{Category, Message};
use domain::traits::{Bot, VoiceLibrary};
use infrastructure::adapters::console::{ConsoleAdapter, CONSOLE_CHAT_ID};
use infrastructure::adapters::telegram::TelegramAdapter;
use infrastructure::config::Config;
use infrastructure::storage::DirectoryLibrary;

/// Long-poll timeout for getUpdates, in seconds
const POLL_TIMEOUT_SECS: i64 = 30;

#[derive(Parser)]
#[command(name = "random-voice-bot")]
#[command(about = "A chat bot that plays a random voice clip from a category", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml", global = true)]
    config: String,

    /// Bot token (overrides config)
    #[arg(short, long, global = true)]
    token: Option<String>,

    /// Voice data directory (overrides config)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
    /// List voice categories, or the clips of one category
    Scan {
        category: Option<String>,
    },
}

fn main() {
    // Logs go to stderr, stdout is for command output
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Run => run_bot(load_config(&cli)),
        Commands::Version => {
            println!("random-voice-bot v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(&cli.config),
        Commands::Scan { category } => scan(&load_config(&cli), category.as_deref()),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

/// Config file (or defaults), then environment, then command line overrides
fn load_config(cli: &Cli) -> Config {
    let mut config = if Path::new(&cli.config).exists() {
        Config::load(&cli.config).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::default()
        })
    } else {
        Config::default()
    };

    config.apply_env();

    if let Some(token) = &cli.token {
        config.set_telegram_token(token.clone());
    }
    if let Some(dir) = &cli.data_dir {
        config.voice.data_dir = dir.clone();
    }

    config
}

fn build_library(config: &Config) -> Arc<DirectoryLibrary> {
    let library = Arc::new(DirectoryLibrary::new(
        config.voice.voices_root(),
        config.voice.formats.clone(),
    ));

    tracing::info!("Voice data directory: {}", config.voice.data_dir.display());
    tracing::info!("Voice library root: {}", library.root().display());

    // The bot still answers commands without a library root
    match library.init() {
        Ok(()) => tracing::info!("Voice library directory ready"),
        Err(e) => tracing::error!("Failed to create voice library directory: {}", e),
    }

    library
}

fn build_dispatcher(config: &Config, library: Arc<DirectoryLibrary>) -> MessageDispatcher {
    let mut commands = CommandService::new();
    commands.register_defaults();

    let mut voice = VoiceService::new(library, &config.voice.command);
    if let Some(seed) = config.voice.seed {
        voice = voice.with_seed(seed);
    }
    Arc::new(voice).register_commands(&mut commands, config.voice.aliases.clone());
    tracing::info!("Registered {} commands", commands.len());

    let mut chain = MiddlewareChain::new().add(LoggingMiddleware);

    if config.whitelist.enabled {
        chain = chain.add(WhitelistMiddleware::new(config.whitelist.users.clone()));
    }

    let rate_limit = &config.security.rate_limit;
    if rate_limit.enabled {
        chain = chain.add(RateLimitMiddleware::new(
            rate_limit.max_requests,
            rate_limit.window_seconds,
        ));
    }

    MessageDispatcher::new(MessageParser::new(&config.bot.prefix), commands, chain.build())
}

fn run_bot(config: Config) -> Result<(), BotError> {
    config.validate()?;
    tracing::info!("Starting {}", config.bot.name);

    let library = build_library(&config);
    let dispatcher = build_dispatcher(&config, library);

    let rt = tokio::runtime::Runtime::new()?;
    match config.telegram_token() {
        Some(token) => rt.block_on(run_telegram_bot(token.to_string(), dispatcher)),
        None => rt.block_on(run_console_bot(dispatcher)),
    }
}

async fn run_telegram_bot(token: String, dispatcher: MessageDispatcher) -> Result<(), BotError> {
    let mut bot = TelegramAdapter::new(token);
    bot.fetch_bot_info().await?;

    let info = bot.bot_info();
    tracing::info!("Bot started: {} (@{}, id {})", info.name, info.username, info.id);

    if let Err(e) = bot.register_commands(&dispatcher.commands().descriptions()).await {
        tracing::warn!("Failed to register commands: {}", e);
    }
    bot.start().await?;

    let dispatcher = dispatcher.with_bot_username(info.username);
    let messages = MessageService::new(bot);
    let mut offset: i64 = 0;

    tracing::info!("Starting message loop...");

    loop {
        match messages.bot().get_updates(offset, POLL_TIMEOUT_SECS).await {
            Ok(updates) => {
                if !updates.is_empty() {
                    tracing::debug!("Received {} updates", updates.len());
                }
                for update in &updates {
                    let Some(msg) = &update.message else { continue };
                    let Some(text) = msg.text.as_deref() else { continue };

                    let sender = msg.from.as_ref().map(|u| u.to_domain());
                    if sender.as_ref().is_some_and(|u| u.is_bot) {
                        continue;
                    }

                    let mut message = dispatcher
                        .parse(msg.chat.id.to_string(), text, sender)
                        .with_platform("telegram");
                    if let Ok(raw) = serde_json::to_value(update) {
                        message = message.with_raw(raw);
                    }

                    handle_message(&dispatcher, &messages, message).await;
                }

                offset = TelegramAdapter::get_next_offset(&updates, offset);
            }
            Err(e) => {
                tracing::error!("Failed to get updates: {}", e);
                tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
            }
        }
    }
}

async fn run_console_bot(dispatcher: MessageDispatcher) -> Result<(), BotError> {
    let bot = ConsoleAdapter::new();
    bot.start().await?;
    let messages = MessageService::new(bot);

    while let Some(line) = messages.bot().read_line().await {
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        let message = dispatcher
            .parse(CONSOLE_CHAT_ID, line, None)
            .with_platform("console");
        handle_message(&dispatcher, &messages, message).await;
    }

    tracing::info!("Console closed");
    Ok(())
}

async fn handle_message<B: Bot>(dispatcher: &MessageDispatcher, messages: &MessageService<B>, message: Message) {
    let chat_id = message.chat_id.clone();

    // Commands read the voice directories synchronously, keep that off the async workers
    match tokio::task::block_in_place(|| dispatcher.process(message)) {
        Ok(replies) if replies.is_empty() => {}
        Ok(replies) => {
            let delivered = messages.deliver(&chat_id, &replies).await;
            tracing::info!("Delivered {}/{} replies to chat {}", delivered, replies.len(), chat_id);
        }
        Err(e) => tracing::error!("Failed to process message from {}: {}", chat_id, e),
    }
}

fn scan(config: &Config, category: Option<&str>) -> Result<(), BotError> {
    let library = build_library(config);

    if let Some(raw) = category {
        let category = Category::parse(raw)?;
        let clips = library.clips(&category)?;
        for clip in &clips {
            println!("{}", clip.path.display());
        }
        println!("{} clips in {}", clips.len(), library.category_dir(&category).display());
        return Ok(());
    }

    let categories = library.categories()?;
    if categories.is_empty() {
        println!("No voice categories under {}", library.root().display());
    }
    for category in categories {
        println!("{}\t{}", category, library.clips(&category)?.len());
    }
    Ok(())
}

fn init_config(path: &str) -> Result<(), BotError> {
    if Path::new(path).exists() {
        println!("Config already exists: {}", path);
        return Ok(());
    }

    std::fs::write(path, Config::default().to_yaml()?)?;
    println!("Created config file: {}", path);
    Ok(())
}
