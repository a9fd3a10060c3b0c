mod alert;
mod attempt;
mod bot;
mod campaign;
mod check;
mod cli;
mod config;
mod control;
mod error;
mod inputs;
mod orchestrator;
mod proxy;
mod report;
mod router;
mod telegram;
mod ui;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use alert::{AlertSink, ChatAlerts, NoAlerts};
use attempt::{DryRunAttempt, IdentityFields};
use cli::{Cli, Command};
use config::AppConfig;
use control::{ControlPlane, ControlSettings};
use orchestrator::Orchestrator;
use telegram::{ChatTransport, TelegramClient};

/// Options of one `run` invocation.
struct RunArgs {
    fields: IdentityFields,
    emails: PathBuf,
    events: PathBuf,
    proxies: PathBuf,
    workers: usize,
    attempt: DryRunAttempt,
    telegram: Option<i64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %format!("{e:#}"), "fatal");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn dispatch(cli: Cli) -> Result<ExitCode> {
    let config = AppConfig::load_from(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    match cli.command {
        Command::Run {
            first_name,
            last_name,
            organization,
            emails,
            events,
            proxies,
            workers,
            window,
            telegram,
            latency_ms,
        } => {
            let args = RunArgs {
                fields: IdentityFields::new(&first_name, &last_name, &organization),
                emails,
                events,
                proxies: proxies.unwrap_or_else(|| config.proxies_file.clone()),
                workers: config.clamp_workers(workers.unwrap_or(config.default_workers)),
                attempt: DryRunAttempt {
                    latency: Duration::from_millis(latency_ms),
                    visible: window,
                },
                telegram,
            };
            run_campaign(&config, args).await
        }
        Command::Bot => {
            run_bot(&config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { proxies, events } => {
            let proxies = proxies.unwrap_or_else(|| config.proxies_file.clone());
            check::run(&proxies, &events).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_campaign(config: &AppConfig, args: RunArgs) -> Result<ExitCode> {
    if !args.fields.is_complete() {
        bail!("--first-name, --last-name and --organization must not be blank");
    }

    let identities = inputs::read_identities(&args.emails).context("failed to read emails")?;
    let targets = inputs::read_targets(&args.events).context("failed to read event URLs")?;
    let proxies = inputs::read_proxies(&args.proxies).unwrap_or_else(|e| {
        warn!(error = %e, "continuing without proxies");
        Vec::new()
    });
    if identities.is_empty() || targets.is_empty() {
        bail!("missing emails or event URLs");
    }

    ui::CampaignProgress::print_banner(
        &args.fields,
        identities.len(),
        targets.len(),
        proxies.len(),
        args.workers,
    );

    let attempt = Arc::new(args.attempt);
    let produced = match alert_client(config, args.telegram).await {
        Some((client, chat_id)) => {
            let alerts = Arc::new(ChatAlerts::new(client, chat_id));
            execute(config, attempt, alerts, args.fields, args.workers, &targets, &identities, proxies).await
        }
        None => {
            execute(config, attempt, Arc::new(NoAlerts), args.fields, args.workers, &targets, &identities, proxies)
                .await
        }
    };

    Ok(if produced > 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Telegram client for CLI alerts, after a connection test message.
async fn alert_client(config: &AppConfig, chat_id: Option<i64>) -> Option<(Arc<TelegramClient>, i64)> {
    let Some(chat_id) = chat_id else {
        warn!("telegram notifications disabled (no --telegram flag)");
        return None;
    };
    let token = match config.require_token() {
        Ok(token) => token.to_string(),
        Err(e) => {
            warn!(error = %e, "telegram notifications disabled");
            return None;
        }
    };
    let client = match TelegramClient::with_base_url(token, config.telegram_api_base.clone()) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            warn!(error = %e, "telegram notifications disabled");
            return None;
        }
    };

    info!(chat_id, "telegram notifications enabled");
    let hello = "✅ <b>eventblast connected</b>\n\nFailure alerts for this campaign will be sent here.";
    if let Err(e) = client.send_text(chat_id, hello).await {
        warn!(chat_id, error = %e, "telegram connection test failed");
    }
    Some((client, chat_id))
}

#[allow(clippy::too_many_arguments)]
async fn execute<S: AlertSink + 'static>(
    config: &AppConfig,
    attempt: Arc<DryRunAttempt>,
    alerts: Arc<S>,
    fields: IdentityFields,
    workers: usize,
    targets: &[String],
    identities: &[String],
    proxies: Vec<proxy::ProxyCredential>,
) -> usize {
    let orchestrator = Orchestrator::new(attempt, alerts, fields, workers)
        .with_retry_policy(config.retry_policy())
        .with_results_dir(config.results_dir.clone());
    let progress = ui::CampaignProgress::start(targets.len() * identities.len());
    let report = orchestrator.run(targets, identities, proxies, &progress).await;
    println!("  Run id: {}", report.run_id);
    if let Some(path) = &report.results_file {
        println!("  Results saved to {}", path.display());
    }
    report.results.len()
}

async fn run_bot(config: &AppConfig) -> Result<()> {
    let token = config.require_token()?.to_string();
    let client = Arc::new(TelegramClient::with_base_url(token, config.telegram_api_base.clone())?);

    let settings = ControlSettings {
        data_dir: config.data_dir.clone(),
        results_dir: config.results_dir.clone(),
        shared_proxies: config.proxies_file.clone(),
        default_workers: config.clamp_workers(config.default_workers),
        max_workers: config.max_workers_limit.max(1),
        policy: config.retry_policy(),
    };
    std::fs::create_dir_all(&settings.data_dir)
        .with_context(|| format!("creating {}", settings.data_dir.display()))?;

    let plane = ControlPlane::new(Arc::clone(&client), Arc::new(DryRunAttempt::default()), settings);
    bot::run(&client, &plane, config.poll_timeout_secs).await;
    Ok(())
}
