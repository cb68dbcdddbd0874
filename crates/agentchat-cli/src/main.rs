//! agentchat CLI: chat with a conversational agent from the terminal

use agentchat_engine::{
    connect, title_from_message, AgentsBackend, BackendConfig, Config, Conversation,
    ConversationMetadata, Message, Role, CONFIG_DIR, CONFIG_FILE,
};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Terminal chat client for conversational agents
#[derive(Parser)]
#[command(name = "agentchat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: .agentchat/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Agent whose conversations to use
    #[arg(long, global = true)]
    agent: Option<String>,

    /// Talk to the agent service at this URL instead of the configured backend
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// Bearer token for --backend-url
    #[arg(long, global = true, requires = "backend_url")]
    token: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chat TUI (default when no command specified)
    Tui,

    /// Create .agentchat/ and a default config
    Init,

    /// List conversations for the agent
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print one conversation
    Show {
        /// Conversation id
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a message to a conversation and print the reply
    Send {
        /// Conversation id
        id: String,

        /// Message text
        message: String,

        /// Seconds to wait for a reply (0 to not wait)
        #[arg(long, default_value = "30")]
        wait: u64,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::Tui => "tui",
            Self::Init => "init",
            Self::List { .. } => "list",
            Self::Show { .. } => "show",
            Self::Send { .. } => "send",
        }
    }
}

/// Environment variable holding the log filter.
const LOG_ENV: &str = "AGENTCHAT_LOG";

const LOG_FILE: &str = "agentchat.log";

fn main() {
    let cli = Cli::parse();

    if let Some(Commands::Init) = cli.command {
        init_stderr_logging();
        cmd_init(&config_path(&cli));
        return;
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => fail(e),
    };

    match &cli.command {
        None | Some(Commands::Tui) => init_file_logging(),
        Some(command) => {
            init_stderr_logging();
            if let Err(e) = require_remote_backend(&config, command.name()) {
                fail(e);
            }
        }
    }

    let backend = match connect(&config.backend) {
        Ok(backend) => backend,
        Err(e) => fail(e),
    };
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => fail(format!("Failed to create tokio runtime: {e}")),
    };

    let result = match cli.command {
        None | Some(Commands::Tui) => rt.block_on(agentchat_tui::run_tui(&config, backend)),
        Some(Commands::List { json }) => rt.block_on(cmd_list(&config, backend.as_ref(), json)),
        Some(Commands::Show { id, json }) => rt.block_on(cmd_show(backend.as_ref(), &id, json)),
        Some(Commands::Send { id, message, wait }) => {
            rt.block_on(cmd_send(backend.as_ref(), &id, message, wait))
        }
        Some(Commands::Init) => Ok(()),
    };

    if let Err(e) = result {
        fail(e);
    }
}

fn fail(error: impl std::fmt::Display) -> ! {
    eprintln!("Error: {error}");
    std::process::exit(1);
}

fn config_path(cli: &Cli) -> PathBuf {
    cli.config
        .clone()
        .unwrap_or_else(|| Path::new(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load the config file and apply command-line overrides.
fn load_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = Config::load_or_default(&config_path(cli))?;
    if let Some(agent) = &cli.agent {
        config.agent_name.clone_from(agent);
    }
    if let Some(url) = &cli.backend_url {
        config.use_http(url, cli.token.clone());
    }
    config.validate()?;
    Ok(config)
}

/// One-shot commands run in a fresh process, so the in-memory backend would
/// always be empty for them.
fn require_remote_backend(config: &Config, command: &str) -> Result<(), String> {
    match config.backend {
        BackendConfig::Memory { .. } => Err(format!(
            "'{command}' needs an http backend; pass --backend-url or set backend.kind"
        )),
        BackendConfig::Http { .. } => Ok(()),
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// The TUI owns the terminal, so its log goes to `.agentchat/agentchat.log`.
fn init_file_logging() {
    let dir = Path::new(CONFIG_DIR);
    let file = std::fs::create_dir_all(dir).and_then(|()| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(LOG_FILE))
    });
    // Without a log file, run silent rather than draw over the UI.
    if let Ok(file) = file {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    }
}

fn cmd_init(config_path: &Path) {
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
        return;
    }

    match Config::default().save(config_path) {
        Ok(()) => {
            info!(path = %config_path.display(), "wrote default config");
            println!("Created {}", config_path.display());
        }
        Err(e) => {
            eprintln!("Failed to write config: {e}");
            std::process::exit(1);
        }
    }

    println!("\nNext steps:");
    println!("  1. Edit {} to point at your agent service", config_path.display());
    println!("  2. Run 'agentchat' to open the chat");
}

async fn cmd_list(
    config: &Config,
    backend: &dyn AgentsBackend,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let conversations = backend.list_conversations(&config.agent_name).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&conversations)?);
        return Ok(());
    }

    if conversations.is_empty() {
        println!("No conversations yet");
        return Ok(());
    }
    for conv in &conversations {
        println!(
            "{:<38} {:<13} {}",
            conv.id,
            conv.created_label(),
            conv.display_name()
        );
    }
    Ok(())
}

async fn cmd_show(
    backend: &dyn AgentsBackend,
    id: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let conversation = backend.get_conversation(id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&conversation)?);
        return Ok(());
    }

    print_header(&conversation);
    for message in &conversation.messages {
        print_message(message);
    }
    Ok(())
}

async fn cmd_send(
    backend: &dyn AgentsBackend,
    id: &str,
    message: String,
    wait: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let conversation = backend.get_conversation(id).await?;
    let sent_at = conversation.messages.len();

    // Subscribe first so the reply cannot slip past.
    let mut subscription = backend.subscribe_to_conversation(id).await?;
    if conversation.messages.is_empty() {
        let name = title_from_message(&message);
        if let Err(e) = backend
            .update_conversation(id, ConversationMetadata::named(name))
            .await
        {
            warn!(conversation = %id, error = %e, "failed to update conversation name");
        }
    }
    backend
        .add_message(&conversation, Message::user(message))
        .await?;
    debug!(conversation = %id, "message sent");

    if wait == 0 {
        println!("Sent");
        return Ok(());
    }

    let reply = tokio::time::timeout(Duration::from_secs(wait), async {
        while let Some(update) = subscription.next().await {
            let reply = update
                .messages
                .into_iter()
                .skip(sent_at + 1)
                .find(|m| m.role == Role::Assistant);
            if reply.is_some() {
                return reply;
            }
        }
        None
    })
    .await;

    match reply {
        Ok(Some(reply)) => print_message(&reply),
        Ok(None) => println!("Sent; the conversation feed closed before a reply arrived"),
        Err(_) => println!("Sent; no reply within {wait}s"),
    }
    Ok(())
}

fn print_header(conversation: &Conversation) {
    println!("{}", conversation.display_name());
    let created = conversation.created_label();
    if !created.is_empty() {
        println!("Created {created}");
    }
    println!();
}

fn print_message(message: &Message) {
    let label = match message.role {
        Role::User => "You",
        Role::Assistant => "Assistant",
    };
    println!("{label}:");
    for line in message.content.lines() {
        println!("  {line}");
    }
    println!();
}
