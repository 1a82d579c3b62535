use async_trait::async_trait;
use knivete_common::{Error, Result};

use crate::model::{CommandStatusEntity, Row, SourceDescriptionEntity, StreamsProperties};

/// Capability set of the remote streaming-SQL engine.
///
/// Implementations reject blank statements with [`Error::EmptyStatement`]
/// before doing any I/O, report "object missing from the catalog" as
/// [`Error::NotFound`], and report a query that matched nothing as
/// [`Error::NoResults`].
#[async_trait]
pub trait EngineClient: Send + Sync {
    /// Run a query and return the first row carrying columns.
    async fn query(&self, statement: &str) -> Result<Row>;

    /// Fire-and-forget statement execution.
    async fn exec(&self, statement: &str, properties: &StreamsProperties) -> Result<()>;

    /// Execute a `CREATE ...` statement and return the command status.
    async fn create(
        &self,
        statement: &str,
        properties: &StreamsProperties,
    ) -> Result<CommandStatusEntity>;

    /// Execute a `DESCRIBE ...` statement.
    async fn describe(&self, statement: &str) -> Result<SourceDescriptionEntity>;
}

pub(crate) fn ensure_statement(statement: &str) -> Result<()> {
    if statement.trim().is_empty() {
        return Err(Error::EmptyStatement);
    }
    Ok(())
}
