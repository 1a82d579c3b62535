use std::time::Duration;

use async_trait::async_trait;
use knivete_common::{Error, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::model::{
    CommandState, CommandStatusEntity, ErrorBody, ExecRequest, QueryRequest, QueryRowEnvelope,
    Row, SourceDescriptionEntity, StreamsProperties,
};
use crate::traits::{EngineClient, ensure_statement};

/// Tracing target carrying every request and raw response body.
pub const HTTP_AUDIT_TARGET: &str = "http_audit";

const PATH_QUERY: &str = "/query";
const PATH_EXEC: &str = "/ksql";

/// [`EngineClient`] speaking the engine's REST API over `reqwest`.
pub struct HttpEngineClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpEngineClient {
    pub fn new(server: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            // 3xx must surface as an API error, not be followed.
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::Transport(format!("failed to build http client: {e}")))?;

        Ok(Self {
            base_url: server.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        let payload = serde_json::to_string(body)?;
        debug!(target: HTTP_AUDIT_TARGET, "POST {url} {payload}");

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("POST {url} failed: {e}")))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("failed to read response from {url}: {e}")))?;
        debug!(target: HTTP_AUDIT_TARGET, "{status} {url} {text}");

        if status >= 300 {
            return Err(api_error(status, &text));
        }
        Ok(text)
    }

    async fn post_exec(&self, statement: &str, properties: &StreamsProperties) -> Result<String> {
        ensure_statement(statement)?;
        let request = ExecRequest {
            ksql: statement,
            streams_properties: properties,
        };
        self.post(PATH_EXEC, &request).await
    }
}

#[async_trait]
impl EngineClient for HttpEngineClient {
    async fn query(&self, statement: &str) -> Result<Row> {
        ensure_statement(statement)?;
        let body = self
            .post(PATH_QUERY, &QueryRequest { ksql: statement })
            .await?;
        parse_query_rows(&body)
    }

    async fn exec(&self, statement: &str, properties: &StreamsProperties) -> Result<()> {
        self.post_exec(statement, properties).await?;
        Ok(())
    }

    async fn create(
        &self,
        statement: &str,
        properties: &StreamsProperties,
    ) -> Result<CommandStatusEntity> {
        let body = self.post_exec(statement, properties).await?;
        let entity: CommandStatusEntity = first_entity(&body)?;
        if entity.command_status.status == CommandState::Error {
            return Err(Error::RemoteApi {
                status: 200,
                message: entity.command_status.message,
            });
        }
        Ok(entity)
    }

    async fn describe(&self, statement: &str) -> Result<SourceDescriptionEntity> {
        let body = self
            .post_exec(statement, &StreamsProperties::new())
            .await?;
        first_entity(&body)
    }
}

/// Scan `/query` rows in order: an error row fails the call, the first row
/// with columns wins, and nothing qualifying means [`Error::NoResults`].
pub(crate) fn parse_query_rows(body: &str) -> Result<Row> {
    let rows: Vec<QueryRowEnvelope> = serde_json::from_str(body)?;
    for envelope in rows {
        if let Some(message) = envelope.error_text() {
            return Err(Error::RemoteApi {
                status: 200,
                message,
            });
        }
        if let Some(row) = envelope.row
            && !row.columns.is_empty()
        {
            return Ok(row);
        }
    }
    Err(Error::NoResults)
}

pub(crate) fn first_entity<T: DeserializeOwned>(body: &str) -> Result<T> {
    let mut entities: Vec<T> = serde_json::from_str(body)?;
    if entities.is_empty() {
        return Err(Error::NoResults);
    }
    Ok(entities.swap_remove(0))
}

/// Build the error for a non-2xx response, surfacing the raw body when it
/// carries no parseable `message`.
pub(crate) fn api_error(status: u16, body: &str) -> Error {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| body.to_string());

    if is_missing_object(&message) {
        return Error::NotFound(message);
    }
    Error::RemoteApi { status, message }
}

fn is_missing_object(message: &str) -> bool {
    let lower = message.to_lowercase();
    (lower.contains("could not find") && lower.contains("metastore"))
        || lower.trim_end_matches('.').ends_with("does not exist")
}
