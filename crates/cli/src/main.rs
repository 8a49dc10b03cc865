use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use keystone_core::config::AppConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
use commands::{handle_config_command, utils::print_error, ConfigCommands};

#[derive(Parser)]
#[command(name = "keystone")]
#[command(about = "Keystone CLI - contract registry and deployment health for the DAO")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file
    #[arg(long, global = true, env = "KEYSTONE_CONFIG", default_value = "config/keystone.toml")]
    config: String,

    /// Connected account the ready notice is recorded for
    #[arg(long, global = true)]
    identity: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every contract, probe it and show registry health
    Status,

    /// Save address overrides
    Set {
        /// Assignments of the form NAME=ADDRESS
        #[arg(required = true)]
        assignments: Vec<String>,
    },

    /// Remove address overrides (all of them when no name is given)
    Reset {
        names: Vec<String>,
    },

    /// Run deployment discovery and compare with the current registry
    Discover {
        /// Persist the entries that differ
        #[arg(long)]
        apply: bool,
    },

    /// Show lottery eligibility, tier and win chance for an account
    Account {
        address: String,

        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Follow registry health and reloads until Ctrl-C
    Watch {
        /// Print per-contract results on every change
        #[arg(short, long)]
        verbose: bool,
    },

    /// Configuration Management
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn init_logging(config: &AppConfig) {
    let level = config.logging.level.as_str();
    let filter = match std::env::var("RUST_LOG").as_deref() {
        Ok("debug") => EnvFilter::new("warn,keystone_core=debug,keystone=debug"),
        Ok("trace") => EnvFilter::new("warn,keystone_core=trace,keystone=trace"),
        Ok(_) => EnvFilter::try_from_env("RUST_LOG")
            .unwrap_or_else(|_| EnvFilter::new("warn,keystone_core=debug,keystone=debug")),
        Err(_) => EnvFilter::new(format!("warn,keystone_core={level},keystone={level}")),
    };

    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format.as_str() == "json" {
        let fmt_layer = tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr);
        registry.with(fmt_layer).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_file(true)
            .with_line_number(true)
            .with_target(false)
            .with_writer(std::io::stderr);
        registry.with(fmt_layer).init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    let command = match cli.command {
        Commands::Config(command) => return handle_config_command(command),
        command => command,
    };

    let config =
        AppConfig::from_file(&cli.config).with_context(|| format!("failed to load {}", cli.config))?;
    init_logging(&config);

    match command {
        Commands::Status => commands::status(config, cli.identity).await,
        Commands::Set { assignments } => commands::set(config, &assignments),
        Commands::Reset { names } => commands::reset(config, &names),
        Commands::Discover { apply } => commands::discover(config, apply).await,
        Commands::Account { address, json } => commands::account(config, &address, json).await,
        Commands::Watch { verbose } => commands::watch(config, cli.identity, verbose).await,
        Commands::Config(_) => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}
