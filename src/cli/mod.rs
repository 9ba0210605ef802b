//! Command-line interface parsing and handling
//!
//! This module parses command-line arguments, wires the application together
//! and dispatches to the chat loop or one of the one-shot commands.

pub mod chat;
pub mod say;
pub mod settings;

use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::auth::CredentialStore;
use crate::cli::settings::{SetContext, SettingError, SettingRegistry};
use crate::core::app::{App, AppInit};
use crate::core::config::{Config, ConfigOrchestrator};
use crate::core::connectivity::SystemConnectivity;
use crate::core::gateway::ModelGateway;
use crate::core::persistence::{JsonFileStorage, MemoryStorage, SessionPersistence};
use crate::core::session_store::SessionStore;
use crate::core::status::HealthStatus;
use crate::core::style::StyleProfile;
use crate::core::voice::UnsupportedVoiceCapture;
use crate::utils::logging::TranscriptLog;

/// Environment variable holding the `tracing` filter directives.
pub const LOG_FILTER_ENV: &str = "CAUSERIE_LOG";

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_DESCRIBE"),
    ", built ",
    env!("VERGEN_BUILD_DATE"),
    ")"
);

#[derive(Parser)]
#[command(name = "causerie")]
#[command(version = VERSION)]
#[command(about = "A terminal chat client for Grok and other OpenAI-compatible APIs")]
#[command(
    long_about = "Causerie is a terminal chat client that keeps a persistent history of \
chat sessions, shows the model's reasoning and confidence next to each answer, and can \
send images to a vision model.\n\n\
Authentication:\n\
  Use 'causerie auth' to store an API key in your system keyring.\n\n\
Environment Variables:\n\
  XAI_API_KEY       API key (used when none is stored in the keyring)\n\
  CAUSERIE_LOG      Diagnostic log filter, e.g. 'debug' (defaults to 'warn')\n\n\
Chat commands:\n\
  /help             List every command\n\
  /image <path>     Attach an image to the next message\n\
  /new, /list, /open <n>   Manage sessions\n\
  /quit             Leave the chat"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use for this run (the stored default is left alone)
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Response style for this run: professional, friendly or concise
    #[arg(short = 's', long, global = true, value_name = "STYLE")]
    pub style: Option<StyleProfile>,

    /// Append the conversation to this file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interactive chat (default)
    Chat,
    /// Send one message and print the reply
    Say {
        /// Image to send along with the prompt
        #[arg(short = 'i', long, value_name = "PATH")]
        image: Option<PathBuf>,
        /// Prompt text
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// List stored chat sessions
    Sessions,
    /// Check that the API is reachable and the key is accepted
    Health,
    /// Store an API key in the system keyring
    Auth,
    /// Remove the stored API key
    Deauth,
    /// Set configuration values (lists them when no key is given)
    Set {
        /// Configuration key to set
        key: Option<String>,
        /// Value to set for the key
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(false);

    if let Err(err) = tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()
    {
        eprintln!("Failed to initialize logging: {err}");
    }
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Commands::Chat);

    match command {
        Commands::Auth => {
            let config = ConfigOrchestrator::at_default_location()?.load()?;
            let gateway = build_gateway(&config, None, None);
            let credentials = CredentialStore::new();
            let mut input = io::stdin().lock();
            if let Err(e) = credentials.interactive_auth(&gateway, &mut input).await {
                eprintln!("❌ Authentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Deauth => {
            let credentials = CredentialStore::new();
            let mut input = io::stdin().lock();
            if let Err(e) = credentials.interactive_deauth(&mut input) {
                eprintln!("❌ Deauthentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Set { key, value } => {
            let orchestrator = ConfigOrchestrator::at_default_location()?;
            let registry = SettingRegistry::new();
            let Some(key) = key else {
                print_settings(&registry, &orchestrator.load()?);
                return Ok(());
            };
            let mut ctx = SetContext {
                config: &orchestrator,
            };
            let result = registry
                .get(&key)
                .ok_or_else(|| SettingError::UnknownKey(key.clone()))
                .and_then(|handler| handler.set(&value, &mut ctx));
            report_setting(result);
            Ok(())
        }
        Commands::Unset { key } => {
            let orchestrator = ConfigOrchestrator::at_default_location()?;
            let registry = SettingRegistry::new();
            let mut ctx = SetContext {
                config: &orchestrator,
            };
            let result = registry
                .get(&key)
                .ok_or_else(|| SettingError::UnknownKey(key.clone()))
                .and_then(|handler| handler.unset(&mut ctx));
            report_setting(result);
            Ok(())
        }
        Commands::Sessions => {
            let store = SessionStore::open(session_persistence());
            print_sessions(&store);
            Ok(())
        }
        Commands::Health => {
            let config = ConfigOrchestrator::at_default_location()?.load()?;
            let credential = resolve_credential(&CredentialStore::new());
            let gateway = build_gateway(&config, args.model.as_deref(), credential);
            let report = gateway.check_health().await;
            let latency = report
                .latency
                .map(|latency| format!(" in {} ms", latency.as_millis()))
                .unwrap_or_default();
            println!(
                "API: {}{latency} (model: {}, connection: {})",
                report.status, report.model, report.connection
            );
            if report.status != HealthStatus::Ok {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Say { image, prompt } => {
            let app = bootstrap(args.model.as_deref(), args.style, args.log)?;
            say::run_say(app, prompt, image).await
        }
        Commands::Chat => {
            let app = bootstrap(args.model.as_deref(), args.style, args.log)?;
            chat::run_chat(app).await
        }
    }
}

/// Build the application from the on-disk configuration, keyring and history.
pub fn bootstrap(
    model: Option<&str>,
    style: Option<StyleProfile>,
    log: Option<PathBuf>,
) -> Result<App, Box<dyn Error>> {
    let config = ConfigOrchestrator::at_default_location()?;
    let preferences = config.load()?;
    let credentials = CredentialStore::new();
    let credential = resolve_credential(&credentials);
    let gateway = build_gateway(&preferences, model, credential);

    let app = App::new(AppInit {
        persistence: session_persistence(),
        gateway: Arc::new(gateway),
        config,
        credentials,
        transcript: TranscriptLog::new(log)?,
        voice: Box::new(UnsupportedVoiceCapture),
        style_override: style,
    })?;
    Ok(app)
}

fn build_gateway(config: &Config, model: Option<&str>, credential: Option<String>) -> ModelGateway {
    let client = reqwest::Client::new();
    ModelGateway::new(
        client,
        config.gateway_settings(model),
        credential,
        Arc::new(SystemConnectivity::new()),
    )
}

fn resolve_credential(credentials: &CredentialStore) -> Option<String> {
    match credentials.resolve() {
        Ok(resolved) => resolved.map(|resolved| resolved.secret),
        Err(err) => {
            warn!(error = %err, "Could not read the API key");
            eprintln!("⚠️  {err}");
            None
        }
    }
}

fn session_persistence() -> Box<dyn SessionPersistence> {
    match JsonFileStorage::at_default_location() {
        Some(storage) => Box::new(storage),
        None => {
            warn!("No data directory available; sessions will not be saved");
            Box::new(MemoryStorage::new())
        }
    }
}

fn print_settings(registry: &SettingRegistry, config: &Config) {
    println!("Current configuration:");
    for key in registry.keys_display_order() {
        if let Some(handler) = registry.get(key) {
            println!("{}", handler.format(config));
        }
    }
}

fn report_setting(result: Result<String, SettingError>) {
    match result {
        Ok(message) => println!("{message}"),
        Err(err) => {
            err.print();
            std::process::exit(err.exit_code());
        }
    }
}

fn print_sessions(store: &SessionStore) {
    let sessions = store.list_sessions();
    if sessions.is_empty() {
        println!("No sessions yet. Run 'causerie' to start chatting.");
        return;
    }
    for (index, session) in sessions.iter().enumerate() {
        println!(
            "{:>3}. {}  [{}]  {}",
            index + 1,
            session.display_title(),
            session.created_at.format("%Y-%m-%d %H:%M"),
            session.preview.replace('\n', " ")
        );
    }
}
