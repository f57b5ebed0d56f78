//! Scout CLI - find websites with pricing pages
//!
//! Usage:
//!   scout init              Write a default .scout/config.toml
//!   scout run               Run the propose/validate loop and export results
//!   scout check <url>       Validate a single URL
//!   scout config            Print the effective configuration

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use scout_agent::{AnthropicProposer, CircuitBreaker, Model};
use scout_core::config::SCOUT_DIR;
use scout_core::{ScoutConfig, Session};
use scout_orchestrator::{export_websites, LoopEngine};
use scout_validation::{UrlValidator, ValidatorConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "scout")]
#[command(author, version, about = "LLM-driven pricing page discovery")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding .scout/ (defaults to current directory)
    #[arg(short = 'C', long, global = true, default_value = ".")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default .scout/config.toml
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Run the propose/validate loop and export what was found
    Run {
        /// Stop once more than this many websites are found
        #[arg(short, long)]
        target: Option<usize>,

        /// Maximum number of proposal rounds
        #[arg(short = 'n', long)]
        max_iterations: Option<usize>,

        /// Model to use (opus, sonnet, haiku)
        #[arg(short, long)]
        model: Option<CliModel>,

        /// Output file (.xlsx or .json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip writing .scout/activity.md
        #[arg(long)]
        no_activity_log: bool,
    },

    /// Validate a single URL with the configured HTTP settings
    Check {
        url: String,
    },

    /// Print the effective configuration
    Config,
}

/// CLI-friendly model enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliModel {
    Opus,
    Sonnet,
    Haiku,
}

impl From<CliModel> for Model {
    fn from(m: CliModel) -> Self {
        match m {
            CliModel::Opus => Model::Opus,
            CliModel::Sonnet => Model::Sonnet,
            CliModel::Haiku => Model::Haiku,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Some(path) = load_env_file(&cli.dir)? {
        debug!("Loaded environment from {:?}", path);
    }

    match cli.command {
        Commands::Init { force } => cmd_init(cli.dir, force)?,
        Commands::Run {
            target,
            max_iterations,
            model,
            output,
            no_activity_log,
        } => {
            let mut config = load_config(&cli.dir)?;
            if let Some(target) = target {
                config.search.target_count = target;
            }
            if let Some(max_iterations) = max_iterations {
                config.search.max_iterations = max_iterations;
            }
            if let Some(model) = model {
                config.model.default = Model::from(model).to_string();
            }
            if let Some(output) = output {
                config.output.path = output;
            }
            if no_activity_log {
                config.output.activity_log = false;
            }
            config.validate()?;

            cmd_run(cli.dir, config).await?
        }
        Commands::Check { url } => {
            if !cmd_check(&cli.dir, &url).await? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Config => cmd_config(&cli.dir)?,
    }

    Ok(ExitCode::SUCCESS)
}

/// Load `<dir>/.env` into the process environment if it exists.
///
/// Variables already set take precedence over the file.
fn load_env_file(dir: &Path) -> Result<Option<PathBuf>> {
    let path = dir.join(".env");
    if !path.exists() {
        return Ok(None);
    }
    dotenvy::from_path(&path).with_context(|| format!("Failed to read {:?}", path))?;
    Ok(Some(path))
}

fn load_config(dir: &Path) -> Result<ScoutConfig> {
    ScoutConfig::load_or_default(dir)
        .with_context(|| format!("Failed to load {:?}", ScoutConfig::path(dir)))
}

fn cmd_init(dir: PathBuf, force: bool) -> Result<()> {
    let path = ScoutConfig::path(&dir);
    if path.exists() && !force {
        bail!("{:?} already exists (use --force to overwrite)", path);
    }

    let written = ScoutConfig::write_default(&dir)?;
    println!("Initialized Scout in {:?}", dir);
    println!("Created:");
    println!("  {}", written.display());
    println!("\nNext steps:");
    println!("  1. Export ANTHROPIC_API_KEY (or the variable named in [model]), or put it in .env");
    println!("  2. Run 'scout run' to start searching");

    Ok(())
}

async fn cmd_run(dir: PathBuf, config: ScoutConfig) -> Result<()> {
    let model: Model = config
        .model
        .default
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let proposer = AnthropicProposer::from_env(model, &config.model.api_key_env)?
        .with_max_tokens(config.model.max_tokens)
        .with_circuit_breaker(CircuitBreaker::from_config(&config.model));
    let validator = UrlValidator::new(ValidatorConfig::from(&config.http))?;

    let mut engine = LoopEngine::new(proposer, validator, config.limits());
    if config.output.activity_log {
        engine = engine.with_activity_logging(dir.join(SCOUT_DIR));
    }

    println!("\n ===== BEGIN =====");
    let result = engine.run().await?;
    println!("\n ===== FINISHED =====");

    println!("Run:     {}", result.run_id);
    println!("Rounds:  {}", result.rounds);
    println!("Stopped: {}", result.stop_reason);
    println!(
        "Tokens:  {} in / {} out",
        result.total_usage.input_tokens, result.total_usage.output_tokens
    );
    println!("Tried:   {}", result.tried.len());
    println!("Found:   {}", result.found.len());
    for website in &result.found {
        println!("  {}", website);
    }

    export_websites(&result.found, &config.output.path)
        .with_context(|| format!("Failed to export to {:?}", config.output.path))?;
    info!("Exported results to {:?}", config.output.path);
    println!("\nWrote {}", config.output.path.display());

    Ok(())
}

/// Returns whether the URL was accepted
async fn cmd_check(dir: &Path, url: &str) -> Result<bool> {
    let config = load_config(dir)?;
    let validator = UrlValidator::new(ValidatorConfig::from(&config.http))?;

    let mut session = Session::new();
    let verdict = validator.validate(url, &mut session).await;

    println!("{}: {}", url, verdict);
    Ok(verdict.is_accepted())
}

fn cmd_config(dir: &Path) -> Result<()> {
    let config = load_config(dir)?;
    print!("{}", config.to_toml()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_overrides_parse() {
        let cli = Cli::parse_from([
            "scout", "run", "--target", "3", "-n", "7", "--model", "sonnet", "-o", "out.json",
        ]);
        match cli.command {
            Commands::Run {
                target,
                max_iterations,
                model,
                output,
                no_activity_log,
            } => {
                assert_eq!(target, Some(3));
                assert_eq!(max_iterations, Some(7));
                assert!(matches!(model, Some(CliModel::Sonnet)));
                assert_eq!(output, Some(PathBuf::from("out.json")));
                assert!(!no_activity_log);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();

        cmd_init(root.clone(), false).unwrap();
        let path = ScoutConfig::path(&root);
        std::fs::write(&path, "[search]\ntarget_count = 4\n").unwrap();

        let err = cmd_init(root.clone(), false).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(
            ScoutConfig::load_or_default(&root).unwrap().search.target_count,
            4
        );

        cmd_init(root.clone(), true).unwrap();
        assert_eq!(
            ScoutConfig::load_or_default(&root).unwrap(),
            ScoutConfig::default()
        );
    }

    #[tokio::test]
    async fn test_check_reports_rejection() {
        let dir = TempDir::new().unwrap();
        assert!(!cmd_check(dir.path(), "notion.so/pricing").await.unwrap());
    }

    #[tokio::test]
    async fn test_check_reports_acceptance() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pricing"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let url = format!("{}/pricing", server.uri());
        assert!(cmd_check(dir.path(), &url).await.unwrap());
    }

    #[test]
    fn test_env_file_loaded_without_overriding() {
        let dir = TempDir::new().unwrap();
        assert_eq!(load_env_file(dir.path()).unwrap(), None);

        std::fs::write(
            dir.path().join(".env"),
            "SCOUT_CLI_TEST_KEY=from-file\nSCOUT_CLI_TEST_SET=from-file\n",
        )
        .unwrap();
        std::env::set_var("SCOUT_CLI_TEST_SET", "from-shell");

        let loaded = load_env_file(dir.path()).unwrap();
        assert_eq!(loaded, Some(dir.path().join(".env")));
        assert_eq!(
            scout_agent::get_auth_token("SCOUT_CLI_TEST_KEY").unwrap(),
            "from-file"
        );
        assert_eq!(std::env::var("SCOUT_CLI_TEST_SET").unwrap(), "from-shell");
    }

    #[test]
    fn test_model_conversion() {
        assert_eq!(Model::from(CliModel::Haiku), Model::Haiku);
        assert_eq!(Model::from(CliModel::Opus).to_string(), "opus");
    }
}
