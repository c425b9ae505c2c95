use clap::{Parser, Subcommand};
use ghiblio::{
    config::{DEBUG_ENV, LOG_FILE_ENV, LOG_LEVEL_ENV},
    logger::{self, LogLevel, LoggerConfig},
    GhiblioConfig, Orchestrator,
};
use serde_json::Value;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "ghiblio", version, about = "Ghiblio Art image generation tools")]
struct Cli {
    /// Emit JSON log lines instead of coloured text
    #[arg(long, global = true)]
    json_logs: bool,

    /// Also append log lines to this file
    #[arg(long, global = true, env = LOG_FILE_ENV)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the tool catalogue as JSON
    Tools,
    /// Invoke one tool and print its result as JSON
    Call {
        /// image_generate, image_generate_check_task or image_generate_remains
        tool: String,
        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
        /// Key used when GHIBLIO_ART_API_KEY is not set
        #[arg(long, env = "GHIBLIO_CALL_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let cli = Cli::parse();

    let debug = std::env::var(DEBUG_ENV).map_or(false, |val| val == "true");
    let level = std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|level| level.parse::<LogLevel>().ok());
    let logger_config =
        LoggerConfig::from_settings(debug, level, cli.json_logs, cli.log_file.as_deref());
    if let Err(e) = logger::init_with_config(logger_config) {
        eprintln!("Fatal error initialising logger: {}", e);
        return ExitCode::FAILURE;
    }

    if !dotenv_loaded {
        log::debug!("No .env file found, using process environment");
    }

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Fatal error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    let config = GhiblioConfig::from_env();
    logger::log_config_info(&config);
    let orchestrator = Orchestrator::new(config)?;

    match command {
        Command::Tools => {
            println!("{}", serde_json::to_string_pretty(&orchestrator.tools())?);
        }
        Command::Call { tool, args, api_key } => {
            let args: Value = serde_json::from_str(&args)?;
            let result = orchestrator.invoke(&tool, args, api_key.as_deref()).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
