use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use knivete_client::HTTP_AUDIT_TARGET;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber: human-readable progress on stderr and,
/// when `audit_log` is set, every HTTP exchange written to that file.
pub fn init(audit_log: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(without_audit(filter)?);

    let audit = match audit_log {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("could not create logs file {}", path.display()))?;
            let targets = Targets::new().with_target(HTTP_AUDIT_TARGET, LevelFilter::DEBUG);
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false)
                    .with_filter(targets),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(audit)
        .try_init()
        .context("failed to install tracing subscriber")?;
    Ok(())
}

/// Request and response bodies belong in the audit file only, whatever
/// `RUST_LOG` says.
fn without_audit(filter: EnvFilter) -> Result<EnvFilter> {
    let directive = format!("{HTTP_AUDIT_TARGET}=off")
        .parse()
        .context("invalid audit filter directive")?;
    Ok(filter.add_directive(directive))
}
