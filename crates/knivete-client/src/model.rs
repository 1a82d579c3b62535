use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-statement engine settings sent as `streamsProperties`.
pub type StreamsProperties = BTreeMap<String, String>;

pub const AUTO_OFFSET_RESET: &str = "ksql.streams.auto.offset.reset";

/// Properties that make a statement read its backing topics from the
/// earliest offset, so migrations see historical data.
pub fn earliest_offset() -> StreamsProperties {
    BTreeMap::from([(AUTO_OFFSET_RESET.to_string(), "earliest".to_string())])
}

/// Body of `POST /query`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest<'a> {
    pub ksql: &'a str,
}

/// Body of `POST /ksql`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecRequest<'a> {
    pub ksql: &'a str,
    #[serde(rename = "streamsProperties")]
    pub streams_properties: &'a StreamsProperties,
}

/// One element of the `/query` response array.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryRowEnvelope {
    #[serde(default)]
    pub row: Option<Row>,
    /// A plain string on older servers, an error entity on newer ones.
    #[serde(rename = "errorMessage", default)]
    pub error_message: Option<Value>,
}

impl QueryRowEnvelope {
    pub fn error_text(&self) -> Option<String> {
        self.error_message.as_ref().map(|v| match v {
            Value::String(s) => s.clone(),
            Value::Object(map) => map
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| v.to_string()),
            other => other.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub columns: Vec<Value>,
}

impl Row {
    /// Column `index` rendered as text; strings are returned unquoted.
    pub fn column_text(&self, index: usize) -> Option<String> {
        self.columns.get(index).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandState {
    Queued,
    Parsing,
    Executing,
    Terminated,
    Success,
    Error,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CommandStatus {
    #[serde(default)]
    pub status: CommandState,
    #[serde(default)]
    pub message: String,
}

/// Response entity for `CREATE ...` statements.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandStatusEntity {
    #[serde(default)]
    pub statement_text: String,
    #[serde(default)]
    pub command_id: String,
    #[serde(default)]
    pub command_status: CommandStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryRef {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDescription {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub write_queries: Vec<QueryRef>,
    #[serde(rename = "type", default)]
    pub source_type: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub partitions: u32,
    #[serde(default)]
    pub replication: u32,
}

/// Response entity for `DESCRIBE ...` statements.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDescriptionEntity {
    #[serde(default)]
    pub statement_text: String,
    #[serde(default)]
    pub source_description: SourceDescription,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
