// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use git_archiver::utils::logging::{
    format_error, format_info, format_step, format_success, format_warning, init_logger,
};
use git_archiver::{
    Config, FailurePolicy, GithubClient, HealthCheck, HealthReport, PageSource, RemotePath,
    RunCoordinator, ShareTransport, SmbClientTransport,
};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "git_archiver")]
#[command(author = "cipher")]
#[command(version)]
#[command(
    about = "Archive every repository of a GitHub organization onto an SMB share",
    long_about = None
)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = git_archiver::config::DEFAULT_CONFIG_PATH
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone, archive and upload every repository of the organization
    Run {
        /// Exit non-zero when any repository fails
        #[arg(long)]
        strict: bool,

        #[arg(long, value_name = "NUM")]
        concurrency: Option<usize>,

        #[arg(long)]
        no_progress: bool,
    },

    /// List the organization's repositories without migrating them
    List {
        #[arg(long)]
        json: bool,
    },

    /// Create the remote base directory on the share
    Provision,

    /// Check the external tools and services a run depends on
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logger(cli.color, cli.verbose);
    colored::control::set_override(cli.color);

    info!("Git Archiver");
    info!("Loading configuration from: {}", cli.config.display());

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, reading environment only",
            cli.config.display()
        );
        Config::load(None).context("Failed to load configuration from environment")?
    };

    match cli.command {
        Commands::Run {
            strict,
            concurrency,
            no_progress,
        } => cmd_run(config, strict, concurrency, !no_progress, cli.color).await,
        Commands::List { json } => cmd_list(&config, json).await,
        Commands::Provision => cmd_provision(&config).await,
        Commands::Check => cmd_check(&config).await,
    }
}

async fn cmd_run(
    mut config: Config,
    strict: bool,
    concurrency: Option<usize>,
    show_progress: bool,
    colored: bool,
) -> Result<()> {
    if let Some(concurrency) = concurrency {
        config.pipeline.concurrency = concurrency;
    }
    if strict {
        config.pipeline.failure_policy = FailurePolicy::FailRun;
    }
    config.validate().context("Invalid run options")?;

    println!(
        "{}",
        format_step(1, 2, &format!("Migrating {}", config.source.organization))
    );

    let coordinator = RunCoordinator::from_config(&config)
        .context("Failed to set up migration")?
        .with_progress(show_progress, colored);
    let summary = coordinator.run().await.context("Migration aborted")?;

    println!("{}", format_step(2, 2, "Summary"));
    println!(
        "{}",
        format_info(&format!(
            "{} repositories attempted in {:.1}s ({:.1}% uploaded)",
            summary.attempted(),
            summary.duration.as_secs_f64(),
            summary.stats.success_rate()
        ))
    );
    println!(
        "{}",
        format_success(&format!("{} uploaded", summary.succeeded()))
    );
    for failure in summary.failures() {
        let cause = failure
            .error()
            .map(|e| e.to_string())
            .unwrap_or_default();
        println!(
            "{}",
            format_error(&format!("{}: {}", failure.repository, cause))
        );
    }
    for warning in &summary.provision.warnings {
        println!("{}", format_warning(warning));
    }

    if summary.should_fail(config.pipeline.failure_policy) {
        bail!("{} of {} repositories failed", summary.failed(), summary.attempted());
    }
    Ok(())
}

async fn cmd_list(config: &Config, json: bool) -> Result<()> {
    let coordinator = RunCoordinator::from_config(config).context("Failed to set up client")?;
    let repositories = coordinator
        .enumerate()
        .await
        .context("Repository enumeration failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&repositories)?);
    } else {
        for repository in &repositories {
            println!("{}\t{}", repository.name, repository.clone_url);
        }
        println!(
            "{}",
            format_info(&format!(
                "{} repositories in {}",
                repositories.len(),
                config.source.organization
            ))
        );
    }
    Ok(())
}

async fn cmd_provision(config: &Config) -> Result<()> {
    let coordinator = RunCoordinator::from_config(config).context("Failed to set up transport")?;
    let report = coordinator.provision().await;

    for path in &report.created {
        println!("{}", format_success(&format!("created {}", path)));
    }
    for path in &report.existing {
        println!("{}", format_info(&format!("exists  {}", path)));
    }
    for warning in &report.warnings {
        println!("{}", format_warning(warning));
    }
    Ok(())
}

async fn cmd_check(config: &Config) -> Result<()> {
    let checks = vec![
        check_program("archiver", &config.pipeline.archiver_path, "-v").await,
        check_program("smbclient", &config.share.smbclient_path, "--version").await,
        check_share(config).await,
        check_source(config).await,
        check_staging(&config.staging.root),
    ];

    let report = HealthReport::new(checks, env!("CARGO_PKG_VERSION").to_string());
    println!("{}", report.format());

    if report.is_unhealthy() {
        bail!("One or more components are unhealthy");
    }
    Ok(())
}

async fn check_program(component: &str, program: &Path, version_flag: &str) -> HealthCheck {
    let start = Instant::now();
    let result = Command::new(program)
        .arg(version_flag)
        .stdin(Stdio::null())
        .output()
        .await;

    match result {
        Ok(output) if output.status.success() => HealthCheck::healthy(component, start.elapsed()),
        Ok(output) => HealthCheck::degraded(
            component,
            format!("{} {} exited with {}", program.display(), version_flag, output.status),
            start.elapsed(),
        ),
        Err(e) => HealthCheck::unhealthy(
            component,
            format!("{} not runnable: {}", program.display(), e),
            start.elapsed(),
        ),
    }
}

async fn check_share(config: &Config) -> HealthCheck {
    let start = Instant::now();
    let transport = SmbClientTransport::new(&config.share);

    match transport.list(&RemotePath::root()).await {
        Ok(listing) if listing.entries.is_empty() => HealthCheck::degraded(
            "share",
            format!("{} root is empty", transport.service()),
            start.elapsed(),
        ),
        Ok(_) => HealthCheck::healthy("share", start.elapsed()),
        Err(e) => HealthCheck::unhealthy("share", e.to_string(), start.elapsed()),
    }
}

async fn check_source(config: &Config) -> HealthCheck {
    let start = Instant::now();
    let client = match GithubClient::new(&config.source, config.credentials()) {
        Ok(client) => client,
        Err(e) => return HealthCheck::unhealthy("github", e.to_string(), start.elapsed()),
    };

    match client.fetch_page(1, 1).await {
        Ok(_) => HealthCheck::healthy("github", start.elapsed()),
        Err(e) => HealthCheck::unhealthy("github", e.to_string(), start.elapsed()),
    }
}

fn check_staging(root: &Path) -> HealthCheck {
    let start = Instant::now();
    let parent = root
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    if parent.is_dir() {
        HealthCheck::healthy("staging", start.elapsed())
    } else {
        HealthCheck::degraded(
            "staging",
            format!("{} does not exist yet", parent.display()),
            start.elapsed(),
        )
    }
}
