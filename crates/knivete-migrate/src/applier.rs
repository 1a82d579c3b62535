use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use knivete_client::{EngineClient, ExecRequest, StreamsProperties, earliest_offset};
use knivete_common::{Error, ExecutionContext, Result};
use knivete_config::BookkeepingConfig;
use tracing::{debug, info};

/// Applies single migrations and keeps the record table current.
#[async_trait]
pub trait MigrationApplier: Send + Sync {
    /// Whether a record exists for `filename`.
    async fn is_applied(&self, ctx: &ExecutionContext, filename: &str) -> Result<bool>;

    /// Execute a migration body. The SQL is passed through untouched.
    async fn apply(&self, ctx: &ExecutionContext, statement: &str) -> Result<()>;

    /// Insert the `{filename, applied_at}` record.
    async fn mark_applied(&self, ctx: &ExecutionContext, filename: &str) -> Result<()>;
}

pub struct KsqlApplier {
    client: Arc<dyn EngineClient>,
    names: BookkeepingConfig,
    properties: StreamsProperties,
}

impl KsqlApplier {
    pub fn new(client: Arc<dyn EngineClient>, names: BookkeepingConfig) -> Self {
        Self {
            client,
            names,
            properties: earliest_offset(),
        }
    }

    pub fn is_applied_statement(&self, filename: &str) -> String {
        format!(
            "select filename from {} where filename = {};",
            self.names.view,
            sql_literal(filename)
        )
    }

    pub fn insert_statement(&self, filename: &str, applied_at: DateTime<Utc>) -> String {
        format!(
            "insert into {} (filename, applied_at) values ({}, {});",
            self.names.table,
            sql_literal(filename),
            sql_literal(&applied_at.to_rfc3339_opts(SecondsFormat::Nanos, true))
        )
    }

    async fn exec(&self, ctx: &ExecutionContext, statement: &str) -> Result<()> {
        if ctx.is_dry_run() {
            let body = serde_json::to_string(&ExecRequest {
                ksql: statement,
                streams_properties: &self.properties,
            })?;
            info!("[dry-run] {body}");
            return Ok(());
        }
        self.client.exec(statement, &self.properties).await
    }
}

#[async_trait]
impl MigrationApplier for KsqlApplier {
    async fn is_applied(&self, _ctx: &ExecutionContext, filename: &str) -> Result<bool> {
        match self.client.query(&self.is_applied_statement(filename)).await {
            Ok(row) => {
                debug!("{filename} has a record: {:?}", row.columns);
                Ok(true)
            }
            Err(Error::NoResults) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn apply(&self, ctx: &ExecutionContext, statement: &str) -> Result<()> {
        self.exec(ctx, statement).await
    }

    async fn mark_applied(&self, ctx: &ExecutionContext, filename: &str) -> Result<()> {
        let statement = self.insert_statement(filename, Utc::now());
        self.exec(ctx, &statement).await
    }
}

/// Quote `value` as a single-quoted SQL string literal.
fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
