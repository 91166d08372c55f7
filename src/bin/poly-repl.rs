use clap::{Parser, Subcommand};
use crossterm::tty::IsTty;
use poly_repl::{
    CellCategory, EvaluationSession, ReplError, ReplResult, Submission, TerminalRenderer,
    cell::DEFAULT_IN_PROMPT,
    client::HttpEvaluator,
    config::{ClientConfig, ConfigOverrides},
    orchestrator::TerminalList,
    repl::Repl,
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::io::BufReader;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Evaluator server URL
    #[arg(long, short = 'u', env = "POLY_REPL_API_URL", global = true)]
    api_url: Option<String>,

    /// Path prefix for evaluator endpoints
    #[arg(long, env = "POLY_REPL_BASE_PATH", global = true)]
    base_path: Option<String>,

    /// Transport timeout in milliseconds (default: wait forever)
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Config directory
    #[arg(long, short = 'd', env = "POLY_REPL_CONFIG_DIR", global = true)]
    config_dir: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Do not print the banner
    #[arg(long, global = true)]
    no_banner: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one expression and exit
    Eval {
        /// Expression to evaluate
        #[arg(required = true, num_args = 1..)]
        expr: Vec<String>,
    },

    /// Manage the client configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Save the effective configuration to the config directory
    Save,
}

fn load_config(cli: &Cli) -> ClientConfig {
    ClientConfig::initialize(
        cli.config_dir.clone(),
        ConfigOverrides {
            api_url: cli.api_url.clone(),
            base_path: cli.base_path.clone(),
            request_timeout: cli.timeout_ms.map(Duration::from_millis),
            no_color: cli.no_color,
            no_banner: cli.no_banner,
        },
    )
}

fn create_session(config: &ClientConfig) -> ReplResult<EvaluationSession> {
    let evaluator = HttpEvaluator::new(&config.api_url, config.request_timeout)?;
    info!("Using evaluator at {}", evaluator.base_url());
    Ok(EvaluationSession::new(
        Arc::new(evaluator),
        config.base_path.clone(),
    ))
}

async fn run_repl(config: &ClientConfig) -> ReplResult<()> {
    let session = create_session(config)?;
    let renderer = TerminalRenderer::new(DEFAULT_IN_PROMPT, config.color);
    let mut repl = Repl::new(session, renderer, TerminalList::new(std::io::stdout()))
        .with_banner(config.banner)
        .with_prompt(std::io::stdin().is_tty());

    repl.run(BufReader::new(tokio::io::stdin())).await
}

/// Returns `false` when the outcome is an error cell.
async fn eval_once(config: &ClientConfig, expr: &str) -> ReplResult<bool> {
    let input = expr.trim();
    if input.is_empty() {
        return Err(ReplError::EmptyInput);
    }

    let mut session = create_session(config)?;
    let renderer = TerminalRenderer::new(DEFAULT_IN_PROMPT, config.color);

    let Submission { echo, outcome } = session.submit(input);
    println!("{}", echo.render(&renderer));
    let outcome = outcome.await;
    println!("{}", outcome.render(&renderer));

    Ok(outcome.category() != CellCategory::Error)
}

fn handle_config_command(cmd: &ConfigCommands, config: &ClientConfig) -> ReplResult<()> {
    match cmd {
        ConfigCommands::Show => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        ConfigCommands::Save => {
            let path = config.save()?;
            println!("Configuration saved to {}", path.display());
        }
    }
    Ok(())
}

async fn run(cli: &Cli) -> ReplResult<bool> {
    let config = load_config(cli);
    debug!("config: {:?}", config);

    match &cli.command {
        None => run_repl(&config).await.map(|_| true),
        Some(Commands::Eval { expr }) => eval_once(&config, &expr.join(" ")).await,
        Some(Commands::Config { command }) => {
            handle_config_command(command, &config).map(|_| true)
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let _ = dotenv::dotenv();

    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    // exit explicitly: a blocking stdin read must not hold up runtime shutdown
    let code = match run(&cli).await {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };
    std::process::exit(code);
}
