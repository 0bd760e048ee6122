use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use aegis::agents::IntakeAgent;
use aegis::cli::{Cli, Commands, init, output::Output};
use aegis::config::AegisConfig;
use aegis::forms::FormRegistry;
use aegis::llm::LLMClientFactory;
use aegis::protocol::{AgentServerState, intake_agent_card};
use aegis::retrieval::{self, TextChunker, server::RetrievalState};
use aegis::types::{AppError, Result};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    init_tracing(cli.verbose);

    if let Err(err) = run(cli, &output).await {
        output.error(&err.to_string());
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "aegis=debug,tower_http=debug"
    } else {
        "aegis=info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run(cli: Cli, output: &Output) -> Result<()> {
    match cli.command {
        Some(Commands::Init {
            path,
            force,
            provider,
        }) => match init::run(init::InitConfig { path, force, provider }, output) {
            init::InitResult::Error(msg) => Err(AppError::Internal(msg)),
            _ => Ok(()),
        },
        Some(Commands::Agent {
            host,
            port,
            public_url,
        }) => {
            let mut cfg = AegisConfig::load(&cli.config)?;
            if let Some(host) = host {
                cfg.agent_server.host = host;
            }
            if let Some(port) = port {
                cfg.agent_server.port = port;
            }
            serve_agent(&cfg, public_url).await
        }
        Some(Commands::Retrieval { host, port }) => {
            let mut cfg = AegisConfig::load(&cli.config)?;
            if let Some(host) = host {
                cfg.retrieval_server.host = host;
            }
            if let Some(port) = port {
                cfg.retrieval_server.port = port;
            }
            let state = RetrievalState::from_config(&cfg).await?;
            retrieval::server::serve(&cfg.retrieval_server, state).await
        }
        Some(Commands::Ingest { dir }) => ingest(&cli.config, &dir, output).await,
        Some(Commands::Chat { conversation }) => {
            let cfg = AegisConfig::load(&cli.config)?;
            aegis::cli::chat::run(&cfg, conversation, output).await
        }
        Some(Commands::Config { full }) => show_config(&cli.config, full, output),
        #[cfg(feature = "mcp")]
        Some(Commands::Mcp) => {
            let cfg = AegisConfig::load(&cli.config)?;
            aegis::mcp::start_stdio_server(&cfg).await
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help().ok();
            Ok(())
        }
    }
}

async fn serve_agent(cfg: &AegisConfig, public_url: Option<String>) -> Result<()> {
    let factory = LLMClientFactory::from_config(&cfg.llm)?;
    let forms = Arc::new(FormRegistry::from_config(&cfg.forms));
    let agent = IntakeAgent::new(factory.create_default().await?, forms);

    let public_url = public_url.unwrap_or_else(|| default_public_url(cfg));
    let state = AgentServerState::new(Arc::new(agent), intake_agent_card(&public_url));

    aegis::protocol::server::serve(&cfg.agent_server, state).await
}

/// Advertised card URL when none is given: the bind address, with the
/// wildcard host swapped for localhost.
fn default_public_url(cfg: &AegisConfig) -> String {
    let host = if cfg.agent_server.host == "0.0.0.0" {
        "localhost"
    } else {
        cfg.agent_server.host.as_str()
    };
    format!("http://{}:{}/", host, cfg.agent_server.port)
}

async fn ingest(config_path: &Path, dir: &Path, output: &Output) -> Result<()> {
    let cfg = AegisConfig::load(config_path)?;
    let state = RetrievalState::from_config(&cfg).await?;
    let chunker = TextChunker::new(cfg.ingest.chunk_size, cfg.ingest.chunk_overlap);

    output.header("Ingesting plan documents");
    output.kv("source", &dir.display().to_string());
    output.kv("index", &cfg.retrieval_server.index_path);

    let report =
        retrieval::ingest::ingest_directory(dir, &chunker, state.embedder.as_ref(), &state.store)
            .await?;

    output.success(&format!(
        "{} documents, {} chunks indexed",
        report.files, report.chunks
    ));
    Ok(())
}

fn show_config(path: &Path, full: bool, output: &Output) -> Result<()> {
    let cfg = AegisConfig::load(path)?;

    output.header("Configuration");
    output.kv("file", &path.display().to_string());

    if full {
        let rendered = toml::to_string_pretty(&cfg)
            .map_err(|e| AppError::Config(format!("failed to render configuration: {}", e)))?;
        println!("\n{}", rendered);
        return Ok(());
    }

    output.subheader("Servers");
    output.kv(
        "agent",
        &format!("{}:{}", cfg.agent_server.host, cfg.agent_server.port),
    );
    output.kv(
        "retrieval",
        &format!("{}:{}", cfg.retrieval_server.host, cfg.retrieval_server.port),
    );
    output.kv("index", &cfg.retrieval_server.index_path);

    output.subheader("Orchestrator");
    output.kv("remote agent", &cfg.orchestrator.remote_agent_url);
    output.kv("retrieval url", &cfg.orchestrator.retrieval_url);
    output.kv(
        "history window",
        &cfg.orchestrator.history_window.to_string(),
    );

    output.subheader("Models");
    output.kv("llm", &format!("{} ({})", cfg.llm.model, cfg.llm.provider));
    output.kv(
        "embeddings",
        &format!(
            "{} ({}, dim {})",
            cfg.embeddings.model, cfg.embeddings.backend, cfg.embeddings.dimension
        ),
    );

    output.subheader("Forms");
    output.kv("schema", &cfg.forms.schema_path);

    Ok(())
}
