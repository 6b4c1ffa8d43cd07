use std::path::{Path, PathBuf};

use anyhow::Result;
use buildscope::config::{AppConfig, ConfigOverrides};
use buildscope::correlation::{Correlator, fetch_build_info};
use buildscope::instana_repo::InstanaRepo;
use buildscope::jenkins_repo::{JenkinsRepo, plugins};
use buildscope::version::{NAME, VERSION};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[derive(Parser)]
#[command(name = "buildscope")]
#[command(about = "Explain a CI build's duration with its host's CPU, memory and load", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to $CONFIG_FILE, then ./buildscope.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// URL of the Jenkins host, e.g. "https://jenkins.example.com/"
    #[arg(long, global = true)]
    ci_url: Option<String>,

    /// Jenkins username
    #[arg(long, global = true)]
    ci_user: Option<String>,

    /// Jenkins API token
    #[arg(long, global = true)]
    ci_api_token: Option<String>,

    /// Instana tenant
    #[arg(long, global = true)]
    tenant: Option<String>,

    /// Instana unit
    #[arg(long, global = true)]
    unit: Option<String>,

    /// Verbose logging (same as RUST_LOG=debug)
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect a build
    #[command(subcommand)]
    Build(BuildCommands),

    /// Manage Jenkins plugins
    #[command(subcommand)]
    Plugin(PluginCommands),

    /// Print name and version
    Version,
}

#[derive(Subcommand)]
enum BuildCommands {
    /// Build metadata correlated with host metrics and configuration
    Report {
        /// Job path, e.g. "job/ai-foundation/job/envctl/job/main/"
        #[arg(short, long)]
        job: String,

        /// Build number; 0 means the last successful build
        #[arg(short, long, default_value_t = 0)]
        build: u64,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Build metadata only: timing and host
    Info {
        /// Job path, e.g. "job/ai-foundation/job/envctl/job/main/"
        #[arg(short, long)]
        job: String,

        /// Build number; 0 means the last successful build
        #[arg(short, long, default_value_t = 0)]
        build: u64,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PluginCommands {
    /// List installed plugins as JSON
    List,

    /// Install plugins that are not installed yet
    Install {
        /// Plugins as JSON, e.g. '[{"name": "docker-plugin", "version": "1.2.3"}]'
        #[arg(short = 'j', long)]
        plugin_list: String,
    },
}

fn print_output<T: Serialize + std::fmt::Display>(value: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", value);
    }
    Ok(())
}

/// Loads config, applies command-line overrides and connects to Jenkins.
fn connect_ci(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<(AppConfig, JenkinsRepo)> {
    let mut config = AppConfig::load(path)?;
    config.apply_overrides(overrides);
    config.validate_ci()?;

    tracing::info!(url = %config.ci.url, "Initializing Jenkins client");
    let jenkins = JenkinsRepo::connect(&config.ci)?;
    Ok((config, jenkins))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let overrides = ConfigOverrides {
        ci_url: cli.ci_url,
        ci_user: cli.ci_user,
        ci_api_token: cli.ci_api_token,
        tenant: cli.tenant,
        unit: cli.unit,
    };
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Version => {
            println!("{} {}", NAME, VERSION);
        }
        Commands::Build(BuildCommands::Report { job, build, json }) => {
            let (config, jenkins) = connect_ci(config_path, &overrides)?;
            config.validate_monitoring()?;
            tracing::info!(endpoint = %config.monitoring.endpoint(), "Initializing Instana client");
            let instana = InstanaRepo::connect(&config.monitoring)?;
            let correlator = Correlator::new(jenkins, instana, config.correlation);
            let report = correlator.correlate(&job, build).await.inspect_err(|e| {
                if e.is_retryable() {
                    tracing::warn!("upstream failure; retrying may succeed");
                }
            })?;
            print_output(&report, json)?;
        }
        Commands::Build(BuildCommands::Info { job, build, json }) => {
            let (config, jenkins) = connect_ci(config_path, &overrides)?;
            let host_identifier = config
                .correlation
                .host_source
                .identifier(config.correlation.host_match_case_sensitive);
            let info =
                fetch_build_info(&jenkins, host_identifier.as_ref(), &job, build).await?;
            print_output(&info, json)?;
        }
        Commands::Plugin(PluginCommands::List) => {
            let (_, jenkins) = connect_ci(config_path, &overrides)?;
            let installed = jenkins.list_plugins().await?;
            println!("{}", serde_json::to_string(&installed)?);
        }
        Commands::Plugin(PluginCommands::Install { plugin_list }) => {
            let (_, jenkins) = connect_ci(config_path, &overrides)?;
            let summary = plugins::install_plugins(&jenkins, &plugin_list).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
