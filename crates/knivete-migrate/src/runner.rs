use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use knivete_client::EngineClient;
use knivete_common::{Error, ExecutionContext, Result};
use knivete_config::AppConfig;
use serde::{Serialize, Serializer};
use tracing::{info, warn};

use crate::applier::{KsqlApplier, MigrationApplier};
use crate::source::{list_migrations, read_migration};
use crate::structure::{KsqlStructure, StructureInitializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Check,
    Apply,
}

/// A migration skipped because its check or its execution failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedMigration {
    pub filename: String,
    pub stage: FailureStage,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub applied: Vec<String>,
    pub already_applied: Vec<String>,
    pub failed: Vec<FailedMigration>,
    pub dry_run: bool,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
}

fn as_millis<S: Serializer>(
    elapsed: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

impl RunReport {
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            write!(f, "[dry-run] ")?;
        }
        write!(
            f,
            "applied {} migrations in {} ms",
            self.applied_count(),
            self.elapsed.as_millis()
        )
    }
}

/// Drives a directory of migration scripts through the structure
/// initializer and the applier, one file at a time.
pub struct MigrationRunner {
    structure: Arc<dyn StructureInitializer>,
    applier: Arc<dyn MigrationApplier>,
}

impl MigrationRunner {
    pub fn new(
        structure: Arc<dyn StructureInitializer>,
        applier: Arc<dyn MigrationApplier>,
    ) -> Self {
        Self { structure, applier }
    }

    pub fn from_client(client: Arc<dyn EngineClient>, config: &AppConfig) -> Self {
        let structure = KsqlStructure::new(
            Arc::clone(&client),
            config.bookkeeping.clone(),
            config.readiness.clone(),
        );
        let applier = KsqlApplier::new(client, config.bookkeeping.clone());
        Self::new(Arc::new(structure), Arc::new(applier))
    }

    /// Apply every pending migration in `directory`, in filename order.
    ///
    /// Failed checks and failed applications are logged and skipped. A
    /// migration that ran but could not be recorded aborts the run with
    /// [`Error::Unrecorded`].
    pub async fn run(&self, directory: &Path, ctx: &ExecutionContext) -> Result<RunReport> {
        let started = Instant::now();
        let files = list_migrations(directory)?;

        self.structure.ensure_exists(ctx).await?;

        let mut report = RunReport {
            dry_run: ctx.is_dry_run(),
            ..Default::default()
        };

        for path in files {
            let migration = read_migration(&path)?;
            let filename = migration.filename;
            info!("applying file {filename}");

            match self.applier.is_applied(ctx, &filename).await {
                Ok(true) => {
                    info!("{filename} already applied");
                    report.already_applied.push(filename);
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!("could not check whether {filename} was applied: {e}");
                    report.failed.push(FailedMigration {
                        filename,
                        stage: FailureStage::Check,
                        reason: e.to_string(),
                    });
                    continue;
                }
            }

            if let Err(e) = self.applier.apply(ctx, &migration.content).await {
                warn!("error applying file {filename}: {e}");
                report.failed.push(FailedMigration {
                    filename,
                    stage: FailureStage::Apply,
                    reason: e.to_string(),
                });
                continue;
            }

            if let Err(e) = self.applier.mark_applied(ctx, &filename).await {
                return Err(Error::Unrecorded {
                    filename,
                    source: Box::new(e),
                });
            }
            info!("{filename} marked as applied");
            report.applied.push(filename);
        }

        report.elapsed = started.elapsed();
        info!("{report}");
        Ok(report)
    }
}
