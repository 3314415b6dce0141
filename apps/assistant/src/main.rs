mod agents;
mod cli;
mod config;
mod conversation;
mod errors;
mod llm_client;
mod ml;
mod models;
mod parsing;
mod routes;
mod state;
mod storage;
mod tracker;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::agents::HrAssistant;
use crate::cli::TrainSelection;
use crate::config::Config;
use crate::llm_client::{LanguageModel, LlmClient};
use crate::ml::embedding::{Embedder, HashingEmbedder, VoyageEmbedder};
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::ObjectStore;
use crate::tracker::reminders::{ReminderService, SmtpMailer, SmtpSettings};
use crate::tracker::ApplicationTracker;

#[derive(Parser)]
#[command(name = "hr-assistant")]
#[command(about = "Intelligent HR assistant - job descriptions, hiring checklists and application tracking")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant in the terminal
    Chat,

    /// Start the HTTP API
    Serve,

    /// Start the HTTP API with the chat page at /
    Web,

    /// Train the ML models
    Train {
        /// Train all models
        #[arg(long)]
        all: bool,

        /// Train the NER model
        #[arg(long)]
        ner: bool,

        /// Train the embedding model
        #[arg(long)]
        embedding: bool,

        /// Train the ranking model
        #[arg(long)]
        ranking: bool,

        /// Directory of .txt documents for the ranking model
        #[arg(long)]
        corpus: Option<PathBuf>,
    },

    /// Email follow-up reminders for due applications
    Reminders {
        /// Run a single pass instead of daily
        #[arg(long)]
        once: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Web);
    let config = Config::from_env()?;

    // The chat transcript owns stdout.
    let writer = match command {
        Commands::Chat => BoxMakeWriter::new(std::io::stderr),
        _ => BoxMakeWriter::new(std::io::stdout),
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("hr_assistant={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();

    match command {
        Commands::Chat => {
            let assistant = HrAssistant::new(build_llm(&config)?);
            cli::run_chat(
                &assistant,
                tokio::io::BufReader::new(tokio::io::stdin()),
                tokio::io::stdout(),
            )
            .await
        }
        Commands::Serve => serve(&config, false).await,
        Commands::Web => serve(&config, true).await,
        Commands::Train {
            all,
            ner,
            embedding,
            ranking,
            corpus,
        } => {
            let selection = if all {
                TrainSelection::all()
            } else {
                TrainSelection {
                    ner,
                    embedding,
                    ranking,
                }
            };
            cli::train(selection, corpus.as_deref())?;
            Ok(())
        }
        Commands::Reminders { once } => reminders(&config, once).await,
    }
}

fn build_llm(config: &Config) -> Result<Arc<dyn LanguageModel>> {
    let llm = LlmClient::new(config.require_api_key()?)?
        .with_model(config.llm_model.clone())
        .with_base_url(config.anthropic_base_url.clone())
        .with_max_attempts(config.llm_max_attempts);
    info!("LLM client initialized (model: {})", llm.model());
    Ok(Arc::new(llm))
}

fn build_embedder(config: &Config) -> Arc<dyn Embedder> {
    match &config.voyage_api_key {
        Some(key) => {
            info!("Using hosted embeddings");
            Arc::new(
                VoyageEmbedder::new(key.clone()).with_base_url(config.voyage_base_url.clone()),
            )
        }
        None => {
            info!("VOYAGE_API_KEY not set; using local hashing embeddings");
            Arc::new(HashingEmbedder::default())
        }
    }
}

async fn serve(config: &Config, web_ui: bool) -> Result<()> {
    info!("Starting HR Assistant API v{}", env!("CARGO_PKG_VERSION"));

    let storage = match &config.storage {
        Some(storage) => Some(ObjectStore::connect(storage).await),
        None => {
            info!("S3_BUCKET not set; uploads are not copied to object storage");
            None
        }
    };

    let state = AppState::new(
        build_llm(config)?,
        build_embedder(config),
        ApplicationTracker::open(&config.applications_path),
    )
    .with_storage(storage)
    .with_web_ui(web_ui);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.host, config.port))?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn reminders(config: &Config, once: bool) -> Result<()> {
    let Some(settings) = SmtpSettings::load(&config.smtp_settings_path)? else {
        warn!(
            "SMTP settings not found at {}; reminders cannot be sent",
            config.smtp_settings_path.display()
        );
        return Ok(());
    };
    let mailer = SmtpMailer::new(&settings)?;
    let service = ReminderService::new(Arc::new(mailer), settings.recipient_domain.clone());

    if once {
        let mut tracker = ApplicationTracker::open(&config.applications_path);
        let report = service.process_due_reminders(&mut tracker).await?;
        info!(
            "Reminder pass complete: {} sent, {} failed",
            report.sent.len(),
            report.failed.len()
        );
    } else {
        service
            .run_daily(&config.applications_path, config.reminder_time)
            .await;
    }
    Ok(())
}
