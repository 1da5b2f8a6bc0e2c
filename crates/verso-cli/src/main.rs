//! verso CLI: trial-gated poem chat in the terminal

use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use verso_engine::{
    format_countdown, ChatSession, Clock, Config, Exchange, FileStore, HttpGenerator,
    KeyValueStore, Role, SendOutcome, SystemClock, TrialGate, TrialStatus, EXPIRED_MESSAGE,
    EXPIRED_NOTICE, GENERATION_ERROR_MESSAGE, CONFIG_FILE_NAME,
};
use verso_tui::TuiOptions;

/// Chat with a poem generator during a one-hour free trial
#[derive(Parser)]
#[command(name = "verso")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding storage, config, and logs
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Base URL of the generation endpoint
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Path to the config file (default: <data-dir>/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chat TUI (default when no command specified)
    Tui,

    /// Send one message and print the reply
    Send {
        /// Message text
        message: String,
    },

    /// Print the trial status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the saved transcript
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Mark the subscription as active
    Activate,
}

const LOG_FILE_NAME: &str = "verso.log";
const LOG_ENV_VAR: &str = "VERSO_LOG";

/// Exit status when a send is refused because the trial is over.
const EXIT_BLOCKED: u8 = 2;

/// Process exit status on success.
type CliResult = Result<u8, Box<dyn std::error::Error>>;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(data_dir) = cli.data_dir.clone().or_else(default_data_dir) else {
        eprintln!("Error: no data directory available, pass --data-dir");
        return ExitCode::FAILURE;
    };

    if let Err(e) = init_logging(&data_dir) {
        eprintln!("Warning: logging disabled: {e}");
    }

    match run(cli, &data_dir) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, data_dir: &Path) -> CliResult {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| data_dir.join(CONFIG_FILE_NAME));
    let mut config = Config::load_or_default(&config_path)?;
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }

    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::in_dir(data_dir)?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut out = io::stdout().lock();

    match cli.command {
        None | Some(Commands::Tui) => {
            drop(out);
            cmd_tui(store, &config)
        }
        Some(Commands::Send { message }) => cmd_send(store, clock, &config, &message, &mut out),
        Some(Commands::Status { json }) => cmd_status(store, clock, json, &mut out),
        Some(Commands::History { json }) => cmd_history(store, clock, json, &mut out),
        Some(Commands::Activate) => cmd_activate(store, clock, &mut out),
    }
}

fn default_data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("verso"))
}

/// Send logs to `<data_dir>/verso.log` so they never touch the terminal.
fn init_logging(data_dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(data_dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join(LOG_FILE_NAME))?;

    let env_filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));

    // A second init in the same process is harmless.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
        .try_init();
    Ok(())
}

fn build_runtime() -> io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread().enable_all().build()
}

fn cmd_tui(store: Arc<dyn KeyValueStore>, config: &Config) -> CliResult {
    let rt = build_runtime()?;
    let options = TuiOptions {
        store,
        endpoint: config.endpoint.clone(),
        tick_rate: config.tick_rate(),
        reveal_interval: config.reveal_interval(),
    };
    rt.block_on(verso_tui::run_tui(options))?;
    Ok(0)
}

fn cmd_send(
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: &Config,
    message: &str,
    out: &mut impl Write,
) -> CliResult {
    let mut session = ChatSession::new(store.clone(), clock.clone());
    session.restore_transcript()?;
    let mut gate = TrialGate::new(store, clock);
    gate.initialize()?;

    let generator = HttpGenerator::new(&config.endpoint)?;
    let rt = build_runtime()?;
    let outcome = rt.block_on(session.send(&mut gate, &generator, message));

    match outcome {
        SendOutcome::Blocked => {
            eprintln!("{EXPIRED_NOTICE}");
            Ok(EXIT_BLOCKED)
        }
        SendOutcome::Empty => {
            eprintln!("Error: empty message");
            Ok(1)
        }
        SendOutcome::Completed(Exchange::Replied { entry_index }) => {
            if let Some(entry) = session.transcript().get(entry_index) {
                writeln!(out, "{}", entry.content)?;
            }
            Ok(0)
        }
        SendOutcome::Completed(Exchange::Failed { .. }) => {
            eprintln!("{GENERATION_ERROR_MESSAGE}");
            Ok(1)
        }
    }
}

fn cmd_status(
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    json: bool,
    out: &mut impl Write,
) -> CliResult {
    let status = TrialGate::new(store, clock).status()?;

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&status)?)?;
    } else {
        writeln!(out, "{}", describe_status(&status))?;
    }
    Ok(0)
}

fn describe_status(status: &TrialStatus) -> String {
    if status.subscription_active {
        return "Suscripción activa".to_string();
    }
    match (status.started_at, status.remaining_seconds) {
        (None, _) | (_, None) => "Prueba gratuita sin iniciar".to_string(),
        (Some(_), Some(remaining)) if remaining > 0 => {
            format!("Prueba gratuita: {} restantes", format_countdown(remaining))
        }
        (Some(_), Some(_)) => EXPIRED_MESSAGE.to_string(),
    }
}

fn cmd_history(
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    json: bool,
    out: &mut impl Write,
) -> CliResult {
    let mut session = ChatSession::new(store, clock);
    session.restore_transcript()?;
    let transcript = session.transcript();

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(transcript)?)?;
        return Ok(0);
    }

    for entry in transcript.entries() {
        let label = match entry.role {
            Role::User => "Tú",
            Role::Assistant => "IA",
        };
        writeln!(out, "{label}: {}", entry.content)?;
    }
    Ok(0)
}

fn cmd_activate(
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    out: &mut impl Write,
) -> CliResult {
    TrialGate::new(store, clock).activate_subscription()?;
    writeln!(out, "Suscripción activada")?;
    Ok(0)
}
