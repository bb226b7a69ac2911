//! `ratings`: browse services, manage a voting wallet and cast signed ratings.

mod commands;
mod config;
mod prompt;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use ratings_protocol::AdminPolicy;
use ratings_store::NewService;
use ratings_types::ServiceId;
use ratings_utils::{init_logging, LogFormat};
use ratings_wallet_core::{ApprovalGate, AutoApprove, LocalWallet};

use crate::config::RatingsConfig;
use crate::prompt::{wallet_password, ConsoleApproval};

#[derive(Parser)]
#[command(name = "ratings", about = "Service directory with wallet-signed star ratings")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the store and, by default, the wallet keystore.
    #[arg(long, global = true, env = "RATINGS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log filter: "trace", "debug", "info", "warn", "error" or a full
    /// `RUST_LOG`-style directive.
    #[arg(long, global = true, env = "RATINGS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output format: "human" or "json".
    #[arg(long, global = true, env = "RATINGS_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Browse and manage listed services.
    Services {
        #[command(subcommand)]
        action: ServicesAction,
    },
    /// Manage the local voting wallet.
    Wallet {
        #[command(subcommand)]
        action: WalletAction,
    },
    /// Rate a service from 1 to 5 stars. Each wallet votes once per service.
    Rate {
        service_id: ServiceId,
        stars: u8,
        /// Sign without asking for confirmation.
        #[arg(long)]
        yes: bool,
    },
    /// Show whether the local wallet may still rate a service.
    Check { service_id: ServiceId },
}

#[derive(clap::Subcommand)]
enum ServicesAction {
    /// List services, most-voted first.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Add a service.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        url: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Recompute a service's rating totals from its reviews.
    Reconcile { service_id: ServiceId },
    /// Check the store for drifted totals and orphaned reviews.
    Audit,
}

#[derive(clap::Subcommand)]
enum WalletAction {
    /// Create a wallet and save it to an encrypted keystore.
    New {
        /// Replace an existing keystore.
        #[arg(long)]
        force: bool,
    },
    /// Print the wallet's voter address.
    Show,
}

fn resolve_config(cli: &Cli) -> anyhow::Result<RatingsConfig> {
    let mut config = match &cli.config {
        Some(path) => RatingsConfig::from_toml_file(path)?,
        None => RatingsConfig::default(),
    };
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    init_logging(config.log_format, &config.log_level);

    if let Some(path) = &cli.config {
        tracing::info!(path = %path.display(), "loaded config");
    }
    tracing::debug!(
        data_dir = %config.data_dir.display(),
        aggregate_policy = %config.aggregate_policy,
        "configuration resolved"
    );

    let mut stdout = std::io::stdout().lock();
    let out: &mut dyn Write = &mut stdout;

    match cli.command {
        Command::Services { action } => {
            let env = commands::open_env(&config)?;
            match action {
                ServicesAction::List { json } => commands::list_services(&env, json, out)?,
                ServicesAction::Add {
                    name,
                    url,
                    description,
                } => {
                    let policy = config.admin_policy();
                    let requester = match &policy {
                        AdminPolicy::Open => commands::keystore_address(&config.keystore_path()),
                        // Membership must be proven by unlocking the keystore.
                        AdminPolicy::AllowList(_) if config.keystore_path().exists() => {
                            let password = wallet_password(false)?;
                            let wallet = LocalWallet::from_keystore(
                                &config.keystore_path(),
                                &password,
                                Arc::new(AutoApprove),
                            )?;
                            Some(wallet.address().clone())
                        }
                        AdminPolicy::AllowList(_) => None,
                    };
                    let request = NewService {
                        name,
                        url,
                        description,
                    };
                    commands::add_service(&env, &policy, requester.as_ref(), &request, out)?;
                }
                ServicesAction::Reconcile { service_id } => {
                    commands::reconcile(&env, service_id, out)?
                }
                ServicesAction::Audit => {
                    if !commands::audit(&env, out)? {
                        anyhow::bail!("store integrity check failed");
                    }
                }
            }
        }
        Command::Wallet { action } => match action {
            WalletAction::New { force } => {
                let password = wallet_password(true)?;
                commands::wallet_new(&config, &password, force, out)?;
            }
            WalletAction::Show => commands::wallet_show(&config, out)?,
        },
        Command::Rate {
            service_id,
            stars,
            yes,
        } => {
            if !commands::wallet_present(&config, out)? {
                return Ok(());
            }
            let env = commands::open_env(&config)?;
            let approval: Arc<dyn ApprovalGate> = if yes {
                Arc::new(AutoApprove)
            } else {
                Arc::new(ConsoleApproval)
            };
            let password = || wallet_password(false);
            commands::rate(&env, &config, service_id, stars, password, approval, out).await?;
        }
        Command::Check { service_id } => {
            let env = commands::open_env(&config)?;
            commands::check(&env, &config, service_id, out)?;
        }
    }
    Ok(())
}
