//! CLI entrypoint for roundtable
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use roundtable_application::{
    CancelOutcome, CancelSessionUseCase, ConversationLogger, DeliberationErrorKind,
    GetSessionUseCase, NoConversationLogger, RunDeliberationError, RunDeliberationUseCase,
    StoreError,
};
use roundtable_domain::SessionId;
use roundtable_infrastructure::{
    ConfigLoader, FileConfig, HttpProviderClient, HttpProviderConfig, JsonFileSessionStore,
    JsonlConversationLogger,
};
use roundtable_presentation::{
    Cli, Command, ConsoleFormatter, OutputFormat, ProgressReporter, SimpleProgress,
};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const EXIT_PRECONDITION: u8 = 2;
const EXIT_NOT_FOUND: u8 = 3;
const EXIT_STORAGE: u8 = 4;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_ref()) {
            println!("{}", line);
        }
        return ExitCode::SUCCESS;
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let log_dir = cli.log_dir.clone().or_else(|| config.logging.dir.clone());
    let _guard = init_tracing(cli.verbose, log_dir.as_deref());

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")?
    };

    if let Some(store) = &cli.store {
        config.store.path = store.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Console logging follows `-v`; `RUST_LOG` overrides it. With a log
/// directory, a daily rolling file receives the same events.
fn init_tracing(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "roundtable.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .with(file)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .init();
            None
        }
    }
}

async fn run(cli: Cli, config: FileConfig) -> Result<()> {
    let Some(command) = cli.command.clone() else {
        bail!("No command given. Try `roundtable --help`.");
    };

    // === Dependency Injection ===
    let store = Arc::new(JsonFileSessionStore::new(config.store.path.clone()));
    info!("Using record store {}", store.path().display());

    match command {
        Command::Start {
            session_id,
            concurrent,
        } => start(&cli, &config, store, SessionId::new(session_id), concurrent).await,
        Command::Cancel { session_id } => {
            let session_id = SessionId::new(session_id);
            match CancelSessionUseCase::new(store).execute(&session_id).await? {
                CancelOutcome::Cancelled => println!("Session {} cancelled", session_id),
                CancelOutcome::NotRunning(status) => {
                    println!("Session {} is {}; nothing to cancel", session_id, status)
                }
            }
            Ok(())
        }
        Command::Show { session_id } => {
            let projection = GetSessionUseCase::new(store)
                .execute(&SessionId::new(session_id))
                .await?;
            let output = match cli.output {
                OutputFormat::Text => ConsoleFormatter::format_projection(&projection),
                OutputFormat::Json => ConsoleFormatter::format_json(&projection),
            };
            println!("{}", output);
            Ok(())
        }
    }
}

async fn start(
    cli: &Cli,
    config: &FileConfig,
    store: Arc<JsonFileSessionStore>,
    session_id: SessionId,
    concurrent: bool,
) -> Result<()> {
    let default_profile = config.providers.default.to_profile()?;
    let provider = Arc::new(HttpProviderClient::new(HttpProviderConfig {
        timeout: Duration::from_secs(config.providers.timeout_seconds),
        default_max_tokens: config.providers.default_max_tokens,
    })?);

    let logger: Arc<dyn ConversationLogger> = match config
        .logging
        .conversation_log
        .as_ref()
        .and_then(JsonlConversationLogger::new)
    {
        Some(logger) => Arc::new(logger),
        None => Arc::new(NoConversationLogger),
    };

    let params = config
        .deliberation_params()
        .with_concurrent_turns(concurrent || config.deliberation.concurrent_turns);

    // Ctrl-C persists the cancellation, then stops this process promptly
    let token = CancellationToken::new();
    let signal_task = {
        let token = token.clone();
        let store = Arc::clone(&store);
        let session_id = session_id.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            eprintln!("Cancelling session {}...", session_id);
            if let Err(e) = CancelSessionUseCase::new(store).execute(&session_id).await {
                warn!("Failed to persist cancellation: {}", e);
            }
            token.cancel();
        })
    };

    let use_case = RunDeliberationUseCase::new(provider, store, default_profile)
        .with_params(params)
        .with_logger(logger)
        .with_cancellation(token);

    let result = if cli.quiet || cli.output == OutputFormat::Json {
        use_case.execute(&session_id).await
    } else if cli.verbose > 0 {
        use_case
            .execute_with_progress(&session_id, &SimpleProgress)
            .await
    } else {
        let progress = ProgressReporter::new();
        use_case.execute_with_progress(&session_id, &progress).await
    };
    signal_task.abort();

    let outcome = result?;
    let output = match cli.output {
        OutputFormat::Text => ConsoleFormatter::format_outcome(&outcome),
        OutputFormat::Json => ConsoleFormatter::format_json(&outcome),
    };
    println!("{}", output);

    Ok(())
}

fn exit_code(error: &anyhow::Error) -> u8 {
    if let Some(e) = error.downcast_ref::<RunDeliberationError>() {
        return match e.kind() {
            DeliberationErrorKind::Precondition => EXIT_PRECONDITION,
            DeliberationErrorKind::NotFound => EXIT_NOT_FOUND,
            DeliberationErrorKind::Storage => EXIT_STORAGE,
        };
    }
    match error.downcast_ref::<StoreError>() {
        Some(StoreError::NotFound { .. }) => EXIT_NOT_FOUND,
        Some(_) => EXIT_STORAGE,
        None => 1,
    }
}
