//! sw16-setup CLI - validate and register HLK-SW16 relay boards
//!
//! Every device is probed with a status query before it is written to the
//! entry store. Exit codes follow [`ExitCodes`] for scripting.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use sw16_setup::cli::{init_logging, print_exit_codes, CliResult, ExitCodes};
use sw16_setup::{
    classify, AppConfig, ConfigError, ConnectionProber, ConnectionTarget, EntryStore, ErrorCode,
    ImportStep, Probe, SetupFlow, SetupRequest, StoreError, Sw16Codec, UserInput, UserStep,
};

/// CLI output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON format for scripting
    Json,
}

/// sw16-setup CLI
#[derive(Parser, Debug)]
#[command(
    name = "sw16-setup",
    version,
    about = "Validate and register HLK-SW16 relay boards",
    long_about = None
)]
struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file
    #[arg(long, env = "SW16_SETUP_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Entry store file
    #[arg(long, env = "SW16_SETUP_STORE", global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a device and add it to the store
    Add {
        /// Device host name or address
        host: String,

        /// Device port (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Display name used as the entry title
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Import devices from a TOML file of `[[device]]` tables
    Import {
        /// File to import
        file: PathBuf,
    },

    /// Probe a device without storing it
    Probe {
        /// Device host name or address
        host: String,

        /// Device port (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Handshake deadline in seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// List configured devices
    List,

    /// Remove a configured device by `host:port`
    Remove {
        /// Entry key
        key: String,
    },

    /// Show the effective configuration
    Config {
        /// Write a default configuration file if none exists
        #[arg(long)]
        init: bool,
    },

    /// Show exit code table
    ExitCodes,
}

/// Contents of an import file
#[derive(Debug, Deserialize)]
struct ImportFile {
    #[serde(default, rename = "device")]
    devices: Vec<SetupRequest>,
}

#[derive(Debug, Serialize)]
struct ProbeReport {
    target: String,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorCode>,
}

#[derive(Debug, Serialize)]
struct ImportReport {
    key: String,
    #[serde(flatten)]
    step: ImportStatus,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum ImportStatus {
    Created { title: String },
    Aborted { reason: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => return finish(&cli, CliResult::from(e)),
    };
    let _log_guard = init_logging(&config.logging, cli.verbose, cli.quiet);
    tracing::debug!("sw16-setup v{}", sw16_setup::VERSION);

    let result = match run(&cli, &config).await {
        Ok(result) => result,
        Err(e) => CliResult::error(exit_code_for(&e), format!("{:#}", e)),
    };
    finish(&cli, result)
}

async fn run(cli: &Cli, config: &AppConfig) -> anyhow::Result<CliResult> {
    match &cli.command {
        Commands::Add { host, port, name } => {
            add_device(cli, config, host, *port, name.as_deref()).await
        }
        Commands::Import { file } => import_devices(cli, config, file).await,
        Commands::Probe { host, port, timeout } => {
            probe_device(cli, config, host, *port, *timeout).await
        }
        Commands::List => list_devices(cli),
        Commands::Remove { key } => remove_device(cli, key),
        Commands::Config { init } => show_config(cli, config, *init),
        Commands::ExitCodes => {
            print_exit_codes();
            Ok(CliResult::success())
        }
    }
}

async fn add_device(
    cli: &Cli,
    config: &AppConfig,
    host: &str,
    port: Option<u16>,
    name: Option<&str>,
) -> anyhow::Result<CliResult> {
    let mut input = UserInput::new(host);
    if let Some(port) = port {
        input = input.port(port);
    }
    if let Some(name) = name {
        input = input.display_name(name);
    }

    let prober = ConnectionProber::new(Sw16Codec::new());
    let mut flow = SetupFlow::new(prober, open_store(cli)?, config.setup.clone());

    match flow.start_with_user_input(Some(input)).await? {
        UserStep::CreateEntry(entry) => {
            let mut store = flow.into_registry();
            let stored = match store.add(entry) {
                Ok(stored) => stored,
                Err(e) => return Ok(CliResult::from(e)),
            };

            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(stored)?);
            } else if !cli.quiet {
                println!("Added {} ({})", stored.entry.title, stored.entry.key());
            }
            Ok(CliResult::success())
        }
        UserStep::ShowForm(form) => {
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&form)?);
            }
            Ok(match form.errors.values().next() {
                Some(code) => CliResult::from(*code),
                None => CliResult::error(ExitCodes::ERROR, "setup did not complete"),
            })
        }
    }
}

async fn import_devices(cli: &Cli, config: &AppConfig, file: &Path) -> anyhow::Result<CliResult> {
    let content = std::fs::read_to_string(file)?;
    let import: ImportFile = toml::from_str(&content)?;

    let mut store = open_store(cli)?;
    let mut reports = Vec::with_capacity(import.devices.len());
    let mut first_failure = None;

    for request in import.devices {
        let key = request.target().key();
        let prober = ConnectionProber::new(Sw16Codec::new());
        let mut flow = SetupFlow::new(prober, store, config.setup.clone());
        let step = flow.start_with_import(request).await?;
        store = flow.into_registry();

        let status = match step {
            ImportStep::CreateEntry(entry) => match store.add(entry) {
                Ok(stored) => ImportStatus::Created {
                    title: stored.entry.title.clone(),
                },
                Err(e) => {
                    let reason = e.to_string();
                    first_failure.get_or_insert_with(|| CliResult::from(e));
                    ImportStatus::Aborted { reason }
                }
            },
            ImportStep::Abort(reason) => {
                first_failure.get_or_insert_with(|| CliResult::from(reason));
                ImportStatus::Aborted {
                    reason: reason.to_string(),
                }
            }
        };
        reports.push(ImportReport { key, step: status });
    }

    if cli.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else if !cli.quiet {
        for report in &reports {
            match &report.step {
                ImportStatus::Created { title } => {
                    println!("created  {} ({})", report.key, title)
                }
                ImportStatus::Aborted { reason } => {
                    println!("aborted  {} ({})", report.key, reason)
                }
            }
        }
    }

    Ok(first_failure.unwrap_or_else(CliResult::success))
}

async fn probe_device(
    cli: &Cli,
    config: &AppConfig,
    host: &str,
    port: Option<u16>,
    timeout: Option<u64>,
) -> anyhow::Result<CliResult> {
    let target = ConnectionTarget::new(host, port.unwrap_or(config.setup.default_port));
    let timeout = timeout.map_or_else(|| config.setup.connection_timeout(), Duration::from_secs);

    let prober = ConnectionProber::new(Sw16Codec::new());
    let outcome = prober.probe(&target, timeout).await;

    if cli.format == OutputFormat::Json {
        let report = ProbeReport {
            target: target.key(),
            outcome: outcome.label(),
            detail: outcome.detail().map(str::to_string),
            error: classify(&outcome),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !cli.quiet {
        println!("{}  {}", target, outcome);
    }

    Ok(CliResult::from(&outcome))
}

fn list_devices(cli: &Cli) -> anyhow::Result<CliResult> {
    let store = open_store(cli)?;

    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(store.entries())?);
        }
        OutputFormat::Text => {
            if store.is_empty() {
                if !cli.quiet {
                    println!("No devices configured.");
                }
                return Ok(CliResult::success());
            }
            println!("{:<24} {:<28} {}", "KEY", "TITLE", "ADDED");
            for stored in store.entries() {
                println!(
                    "{:<24} {:<28} {}",
                    stored.entry.key(),
                    stored.entry.title,
                    stored.added_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
    }

    Ok(CliResult::success())
}

fn remove_device(cli: &Cli, key: &str) -> anyhow::Result<CliResult> {
    let mut store = open_store(cli)?;

    match store.remove(key)? {
        Some(removed) => {
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&removed)?);
            }
            Ok(CliResult::success_with_message(format!("Removed {}", removed.entry.title)))
        }
        None => Ok(CliResult::error(ExitCodes::INVALID_ARGS, format!("no entry for {}", key))),
    }
}

fn show_config(cli: &Cli, config: &AppConfig, init: bool) -> anyhow::Result<CliResult> {
    if init {
        let path = config_path(cli.config.as_deref())?;
        if path.exists() {
            return Ok(CliResult::success_with_message(format!(
                "Config already exists at {}",
                path.display()
            )));
        }
        AppConfig::default().save_to(&path)?;
        return Ok(CliResult::success_with_message(format!(
            "Wrote default config to {}",
            path.display()
        )));
    }

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        OutputFormat::Text => print!("{}", toml::to_string_pretty(config)?),
    }
    Ok(CliResult::success())
}

fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    }
}

fn config_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => sw16_setup::config::default_config_path().ok_or(ConfigError::NoConfigDir),
    }
}

fn open_store(cli: &Cli) -> Result<EntryStore, StoreError> {
    match &cli.store {
        Some(path) => EntryStore::open(path.clone()),
        None => EntryStore::open_default(),
    }
}

fn exit_code_for(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<ConfigError>().is_some() {
        ExitCodes::CONFIG_ERROR
    } else if let Some(StoreError::Duplicate(_)) = err.downcast_ref::<StoreError>() {
        ExitCodes::ALREADY_CONFIGURED
    } else if err.downcast_ref::<toml::de::Error>().is_some() {
        ExitCodes::INVALID_ARGS
    } else if let Some(e) = err.downcast_ref::<std::io::Error>() {
        CliResult::from(std::io::Error::from(e.kind())).code()
    } else {
        ExitCodes::ERROR
    }
}

fn finish(cli: &Cli, result: CliResult) -> ExitCode {
    match (&result, result.message()) {
        (CliResult::Error(_, _), Some(msg)) => eprintln!("error: {}", msg),
        (CliResult::Success(_), Some(msg)) if !cli.quiet && cli.format == OutputFormat::Text => {
            println!("{}", msg)
        }
        _ => {}
    }
    result.to_exit_code()
}
