use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use merge_gatekeeper::cli::{Cli, Command, ValidateArgs, parse_error_exit_code};
use merge_gatekeeper::github::{GitHubClient, OctocrabTransport, RetryTransport};
use merge_gatekeeper::poll::run_until_complete;
use merge_gatekeeper::status::StatusValidator;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(parse_error_exit_code(&e));
        }
    };
    init_tracing(cli.json_logs);

    let result = match cli.command {
        Command::Validate(args) => validate(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("failed to execute command: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "merge_gatekeeper=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn validate(args: ValidateArgs) -> Result<()> {
    let settings = args.resolve()?;

    let transport = OctocrabTransport::from_token(args.token, &settings.api_url)
        .context("failed to create GitHub client")?;
    let client = GitHubClient::new(RetryTransport::new(transport, settings.retry));

    let validator = StatusValidator::builder()
        .with_client(Some(client))
        .with_self_job(&settings.self_job)
        .with_owner_and_repo(&settings.repo.owner, &settings.repo.repo)
        .with_ref(settings.git_ref.as_str())
        .with_ignored_jobs(&settings.ignored)
        .with_identity_resolution(settings.identity)
        .build()
        .context("failed to create validator")?;

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    info!(
        repo = %settings.repo,
        git_ref = %settings.git_ref,
        self_job = %settings.self_job,
        "Waiting for jobs"
    );

    match run_until_complete(&[validator], &settings.poll, &cancel).await {
        Ok(_) => Ok(()),
        Err(e) => {
            for report in e.reports() {
                eprintln!("{}", report.summary());
            }
            Err(e.into())
        }
    }
}

/// Cancels `cancel` on Ctrl-C or SIGTERM.
async fn cancel_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    warn!("Shutdown signal received, cancelling validation");
    cancel.cancel();
}
