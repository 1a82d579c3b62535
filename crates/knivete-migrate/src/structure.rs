use std::sync::Arc;

use async_trait::async_trait;
use knivete_client::{EngineClient, StreamsProperties};
use knivete_common::{Error, ExecutionContext, Result};
use knivete_config::{BookkeepingConfig, ReadinessConfig};
use tokio::time::Instant;
use tracing::{debug, info};

/// Creates and checks the record table and its aggregation view.
#[async_trait]
pub trait StructureInitializer: Send + Sync {
    /// Whether the record table exists. Always true in dry-run.
    async fn table_exists(&self, ctx: &ExecutionContext) -> Result<bool>;

    /// Create the record table, then the aggregation view, each one
    /// queryable before the next step starts.
    async fn create(&self, ctx: &ExecutionContext) -> Result<()>;

    async fn ensure_exists(&self, ctx: &ExecutionContext) -> Result<()> {
        if self.table_exists(ctx).await? {
            return Ok(());
        }
        self.create(ctx).await
    }
}

pub struct KsqlStructure {
    client: Arc<dyn EngineClient>,
    names: BookkeepingConfig,
    readiness: ReadinessConfig,
}

impl KsqlStructure {
    pub fn new(
        client: Arc<dyn EngineClient>,
        names: BookkeepingConfig,
        readiness: ReadinessConfig,
    ) -> Self {
        Self {
            client,
            names,
            readiness,
        }
    }

    pub fn create_table_statement(&self) -> String {
        let n = &self.names;
        format!(
            "create table {} (filename varchar primary key, applied_at varchar) \
             with (kafka_topic='{}', value_format='json', partitions={}, replicas={});",
            n.table, n.topic, n.partitions, n.replicas
        )
    }

    pub fn create_view_statement(&self) -> String {
        format!(
            "create table {} as select filename, count(filename) as applications \
             from {} group by filename;",
            self.names.view, self.names.table
        )
    }

    async fn object_exists(&self, name: &str) -> Result<bool> {
        match self.client.describe(&describe_statement(name)).await {
            Ok(_) => Ok(true),
            Err(Error::NotFound(message)) => {
                debug!("{name} not found: {message}");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Pull query against the aggregation view that matches no row.
    pub fn readiness_query(&self) -> String {
        format!(
            "select filename from {} where filename = '';",
            self.names.view
        )
    }

    async fn create_object(&self, name: &str, statement: &str) -> Result<()> {
        info!("creating {name}");
        let status = self
            .client
            .create(statement, &StreamsProperties::new())
            .await?;
        debug!(
            "{name}: {:?} {}",
            status.command_status.status, status.command_status.message
        );
        self.wait_until_ready(name).await
    }

    /// Re-issue `DESCRIBE` until `name` answers or the deadline passes.
    async fn wait_until_ready(&self, name: &str) -> Result<()> {
        let timeout = self.readiness.timeout();
        let deadline = Instant::now() + timeout;
        loop {
            if self.object_exists(name).await? {
                info!("{name} is ready");
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(Error::Timeout {
                    object: name.to_string(),
                    waited: timeout,
                });
            }
            tokio::time::sleep(self.readiness.poll_interval()).await;
        }
    }

    /// Re-issue the readiness query until the view serves pull queries.
    /// An empty result counts as ready; engine rejections are retried
    /// until the deadline, transport failures abort.
    async fn wait_until_queryable(&self) -> Result<()> {
        let view = &self.names.view;
        let statement = self.readiness_query();
        let timeout = self.readiness.timeout();
        let deadline = Instant::now() + timeout;
        loop {
            match self.client.query(&statement).await {
                Ok(_) | Err(Error::NoResults) => {
                    info!("{view} is queryable");
                    return Ok(());
                }
                Err(Error::RemoteApi { status, message }) => {
                    debug!("{view} not queryable yet ({status}): {message}");
                }
                Err(Error::NotFound(message)) => {
                    debug!("{view} not queryable yet: {message}");
                }
                Err(e) => return Err(e),
            }
            if Instant::now() >= deadline {
                return Err(Error::Timeout {
                    object: view.clone(),
                    waited: timeout,
                });
            }
            tokio::time::sleep(self.readiness.poll_interval()).await;
        }
    }

    async fn create_view(&self) -> Result<()> {
        self.create_object(&self.names.view, &self.create_view_statement())
            .await?;
        self.wait_until_queryable().await
    }
}

#[async_trait]
impl StructureInitializer for KsqlStructure {
    async fn table_exists(&self, ctx: &ExecutionContext) -> Result<bool> {
        if ctx.is_dry_run() {
            info!("[dry-run] skipping migration structure check");
            return Ok(true);
        }
        self.object_exists(&self.names.table).await
    }

    async fn create(&self, ctx: &ExecutionContext) -> Result<()> {
        if ctx.is_dry_run() {
            info!("[dry-run] skipping migration structure creation");
            return Ok(());
        }
        self.create_object(&self.names.table, &self.create_table_statement())
            .await?;
        self.create_view().await
    }

    async fn ensure_exists(&self, ctx: &ExecutionContext) -> Result<()> {
        if !self.table_exists(ctx).await? {
            return self.create(ctx).await;
        }
        if ctx.is_dry_run() {
            return Ok(());
        }
        // A run interrupted between the two creations leaves the table alone.
        if !self.object_exists(&self.names.view).await? {
            self.create_view().await?;
        }
        Ok(())
    }
}

fn describe_statement(name: &str) -> String {
    format!("describe {name};")
}
