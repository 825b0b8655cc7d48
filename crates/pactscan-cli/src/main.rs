mod display;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pactscan_ai::HttpGenerator;
use pactscan_core::{AnalysisRequest, Tier};
use pactscan_engine::{Engine, PlainTextExtractor, TextExtractor};
use pactscan_store::{AnalysisStore, MemoryCache, MemoryStore, RateLimiter};

/// Identity used for local, single-user runs.
const LOCAL_OWNER: &str = "local";

#[derive(Parser)]
#[command(name = "pactscan", version, about = "Contract analysis from the command line")]
struct Cli {
    /// Base URL of an OpenAI-compatible completion endpoint.
    #[arg(long, env = "PACTSCAN_API_URL")]
    api_url: String,

    /// API key for the completion endpoint.
    #[arg(long, env = "PACTSCAN_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Model name to request.
    #[arg(long, env = "PACTSCAN_MODEL", default_value = "gpt-4o-mini")]
    model: String,

    /// Per-call generation timeout in seconds.
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a contract file and print the stored record.
    Analyze {
        /// Plain-text contract file (.txt or .md).
        file: PathBuf,

        /// Entitlement tier: free or premium.
        #[arg(long, default_value = "free")]
        tier: Tier,

        /// Skip type detection and use this contract type.
        #[arg(long)]
        contract_type: Option<String>,

        /// Skip language detection and use this ISO-639-1 code.
        #[arg(long)]
        language: Option<String>,

        /// Project to file the analysis under.
        #[arg(long)]
        project: Option<String>,

        /// Follow-up question to ask once the analysis is stored. Repeatable.
        #[arg(long = "ask")]
        questions: Vec<String>,

        /// Emit the record as JSON instead of a card.
        #[arg(long)]
        json: bool,
    },

    /// Detect the contract type of a file without storing anything.
    Detect {
        /// Plain-text contract file (.txt or .md).
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("pactscan v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let generator = Arc::new(HttpGenerator::with_timeout(
        cli.api_url,
        cli.api_key,
        cli.model,
        Duration::from_secs(cli.timeout),
    ));
    let cache = Arc::new(MemoryCache::new());
    let store = Arc::new(MemoryStore::new());
    let analyses = Arc::new(AnalysisStore::new(store, cache.clone()));
    let limiter = RateLimiter::new(cache.clone());
    let engine = Engine::new(generator, analyses, cache, limiter);

    match cli.command {
        Command::Analyze {
            file,
            tier,
            contract_type,
            language,
            project,
            questions,
            json,
        } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let filename = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let request = AnalysisRequest {
                owner_id: LOCAL_OWNER.to_string(),
                project_id: project,
                document_text: String::new(),
                tier,
                contract_type: contract_type.unwrap_or_default(),
                language_hint: language,
            };
            let record = engine
                .analyze_upload(&PlainTextExtractor, &bytes, &filename, request)
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                display::print_analysis_card(&record);
            }
            for question in &questions {
                let answer = engine.ask(record.id, LOCAL_OWNER, question).await?;
                display::print_chat_answer(question, &answer);
            }
        }
        Command::Detect { file } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let filename = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let text = PlainTextExtractor.extract(&bytes, &filename)?;
            let detected = engine.detect_type(LOCAL_OWNER, &text).await?;
            println!("{detected}");
        }
    }

    Ok(())
}
