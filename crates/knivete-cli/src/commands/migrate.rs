use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use knivete_client::HttpEngineClient;
use knivete_common::ExecutionContext;
use knivete_config::{AppConfig, ConfigLoader};
use knivete_migrate::{MigrationRunner, RunReport};
use tracing::{info, warn};

use crate::banner::print_banner;
use crate::cli::MigrateArgs;

/// Flags merged over the config file, ready to run.
#[derive(Debug, Clone)]
pub struct MigrateSettings {
    pub server: String,
    pub directory: PathBuf,
    pub dry_run: bool,
    pub http_log: Option<PathBuf>,
    pub json: bool,
    /// File the config was read from; `None` when running on defaults.
    pub config_source: Option<PathBuf>,
    pub config: AppConfig,
}

impl MigrateSettings {
    pub fn resolve(args: &MigrateArgs, cwd: &Path) -> Result<Self> {
        let config_source = args
            .config
            .clone()
            .or_else(|| ConfigLoader::locate(cwd));
        let mut config = match &args.config {
            Some(path) => ConfigLoader::load(path)?,
            None => ConfigLoader::discover(cwd)?,
        };
        if let Some(server) = &args.server {
            config.server = Some(server.clone());
        }
        if let Some(directory) = &args.directory {
            config.directory = Some(directory.clone());
        }
        config.validate()?;

        let Some(server) = config.server.clone() else {
            bail!("missing --server (or `server` in the config file)");
        };
        let Some(directory) = config.directory.clone() else {
            bail!("missing --directory (or `directory` in the config file)");
        };

        let http_log = if args.no_http_log || !config.http.audit_log {
            None
        } else {
            Some(args.http_log.clone().unwrap_or_else(default_http_log))
        };

        Ok(Self {
            server,
            directory,
            dry_run: args.dry_run,
            http_log,
            json: args.json,
            config_source,
            config,
        })
    }
}

/// `httpcalls-HH-MM-SS.log` in the working directory.
fn default_http_log() -> PathBuf {
    PathBuf::from(format!(
        "httpcalls-{}.log",
        chrono::Local::now().format("%H-%M-%S")
    ))
}

/// Human summary line, or the whole report as JSON.
fn render_report(report: &RunReport, json: bool) -> Result<String> {
    if json {
        serde_json::to_string_pretty(report).context("failed to encode run report")
    } else {
        Ok(report.to_string())
    }
}

pub async fn execute(settings: &MigrateSettings) -> Result<()> {
    // stdout carries only the report in JSON mode
    if !settings.json {
        print_banner(settings);
    }
    match &settings.config_source {
        Some(path) => info!("config loaded from {}", path.display()),
        None => info!("no config file found, using defaults"),
    }

    let client = HttpEngineClient::new(&settings.server, settings.config.http.timeout())
        .context("failed to create http client")?;
    let runner = MigrationRunner::from_client(Arc::new(client), &settings.config);
    let ctx = ExecutionContext::new(settings.dry_run);

    let report = runner
        .run(&settings.directory, &ctx)
        .await
        .with_context(|| format!("migration run against {} aborted", settings.server))?;

    for failed in &report.failed {
        warn!(
            "skipped {} ({:?} failed): {}",
            failed.filename, failed.stage, failed.reason
        );
    }
    println!("{}", render_report(&report, settings.json)?);
    Ok(())
}
