use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use project_estimator_lib::commands;
use project_estimator_lib::config::{
    self, EstimatorConfig, PartialConfig, PartialAnalysisConfig, PartialServerConfig,
};
use project_estimator_lib::conversation::ConversationStore;
use project_estimator_lib::models::TaskDecomposition;
use project_estimator_lib::server::{self, ServerAppState};
use project_estimator_lib::shutdown::{self, ShutdownHandler, ShutdownResult, ShutdownState};
use project_estimator_lib::utils::parse_date;
use std::path::{Path, PathBuf};

/// Project Estimator - PERT/CPM estimation and scheduling for decomposed IT projects
#[derive(Parser, Debug)]
#[command(name = "project-estimator")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file layered over ~/.project-estimator/config.toml
    #[arg(long, global = true, env = "PROJECT_ESTIMATOR_CONFIG")]
    config: Option<PathBuf>,

    /// Task count at which per-task work runs in parallel
    #[arg(long, global = true)]
    parallel_threshold: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Port to bind the server to
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind the server to
        #[arg(long)]
        bind: Option<String>,

        /// Allowed CORS origin (repeatable); any origin when omitted
        #[arg(long = "cors-origin")]
        cors_origins: Vec<String>,

        /// Conversations kept in memory before the oldest is dropped
        #[arg(long)]
        max_conversations: Option<usize>,
    },

    /// Estimate a task decomposition file offline
    Estimate {
        /// JSON task decomposition (`-` reads stdin)
        file: PathBuf,

        /// TOML file whose [rates] section overrides the configured rates
        #[arg(long)]
        rates: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Project start date (YYYY-MM-DD), today when omitted
        #[arg(long)]
        start_date: Option<String>,

        /// Project ID to stamp on the estimate
        #[arg(long)]
        project_id: Option<String>,
    },

    /// Write the default configuration file
    InitConfig {
        /// Target path, ~/.project-estimator/config.toml when omitted
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::init();

    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    match cli.command {
        Command::Serve {
            port,
            bind,
            cors_origins,
            max_conversations,
        } => {
            let overrides = PartialConfig {
                server: Some(PartialServerConfig {
                    port,
                    bind,
                    cors_origins: (!cors_origins.is_empty()).then_some(cors_origins),
                    max_conversations,
                }),
                analysis: Some(PartialAnalysisConfig {
                    parallel_threshold: cli.parallel_threshold,
                }),
                ..Default::default()
            };
            let config = config::load_merged_config(cli.config.as_deref(), Some(overrides))?;
            runtime.block_on(run_server_mode(config))
        }

        Command::Estimate {
            file,
            rates,
            format,
            start_date,
            project_id,
        } => {
            let mut overrides = match rates {
                Some(path) => rates_override(&path)?,
                None => PartialConfig::default(),
            };
            overrides.analysis = Some(PartialAnalysisConfig {
                parallel_threshold: cli.parallel_threshold,
            });
            let config = config::load_merged_config(cli.config.as_deref(), Some(overrides))?;
            let start_date = start_date
                .as_deref()
                .map(parse_date)
                .transpose()
                .map_err(|e| anyhow!(e))?;

            let decomposition = read_decomposition(&file)?;
            let output = runtime.block_on(run_estimate(
                &config,
                project_id,
                decomposition,
                start_date,
                format,
            ))?;
            println!("{}", output);
            Ok(())
        }

        Command::InitConfig { path, force } => {
            let path = match path {
                Some(path) => path,
                None => config::global_config_path()
                    .ok_or_else(|| anyhow!("Could not determine home directory"))?,
            };
            config::write_default_config(&path, force)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}

/// Keep only the [rates] section of a TOML file
fn rates_override(path: &Path) -> Result<PartialConfig> {
    let partial = config::load_partial(path)?;
    if partial.rates.is_none() {
        log::warn!("{} has no [rates] section, using configured rates", path.display());
    }
    Ok(PartialConfig {
        rates: partial.rates,
        ..Default::default()
    })
}

fn read_decomposition(path: &Path) -> Result<TaskDecomposition> {
    let contents = if path == Path::new("-") {
        std::io::read_to_string(std::io::stdin()).context("Failed to read stdin")?
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read decomposition file '{}'", path.display()))?
    };
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse decomposition file '{}'", path.display()))
}

async fn run_estimate(
    config: &EstimatorConfig,
    project_id: Option<String>,
    decomposition: TaskDecomposition,
    start_date: Option<chrono::NaiveDate>,
    format: OutputFormat,
) -> Result<String> {
    let estimate =
        commands::estimate_decomposition(config, project_id, decomposition, start_date).await?;

    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&estimate).context("Failed to serialize estimate")
        }
        OutputFormat::Csv => Ok(project_estimator_lib::estimation::to_csv(&estimate)),
    }
}

async fn run_server_mode(config: EstimatorConfig) -> Result<()> {
    let shutdown_state = ShutdownState::new();
    if let Err(e) = shutdown::register_signal_handlers(shutdown_state.clone()) {
        log::warn!("Failed to register signal handlers: {}", e);
    }

    let server_config = config.server.clone();
    let state = ServerAppState::new(config, shutdown_state.clone());
    let conversations = state.conversations.clone();
    let estimates = state.estimates.clone();

    server::run_server(&server_config, state)
        .await
        .map_err(|e| anyhow!(e))?;

    let handler = ShutdownHandler::with_state(shutdown_state);
    handler.handle_shutdown(|| Ok(discarded(&conversations, estimates.len())))?;
    Ok(())
}

fn discarded(conversations: &ConversationStore, estimates: usize) -> ShutdownResult {
    ShutdownResult {
        conversations_dropped: conversations.len(),
        estimates_dropped: estimates,
        errors: Vec::new(),
    }
}
