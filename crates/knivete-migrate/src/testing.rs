//! In-memory engine double used by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use knivete_client::model::{CommandStatus, SourceDescription};
use knivete_client::{
    CommandState, CommandStatusEntity, EngineClient, Row, SourceDescriptionEntity,
    StreamsProperties,
};
use knivete_common::{Error, Result};
use knivete_config::ReadinessConfig;
use serde_json::json;

#[derive(Default)]
struct State {
    /// Object name -> remaining `DESCRIBE` probes that still report missing.
    objects: HashMap<String, usize>,
    created: Vec<String>,
    records: Vec<String>,
    executed: Vec<String>,
    describe_calls: usize,
    exec_calls: usize,
    query_calls: usize,
    /// Pull queries still rejected after the catalog reports an object.
    query_warmup: usize,
    materialization_delay: usize,
    describe_failure: Option<String>,
    create_failure: Option<String>,
    query_failure: Option<String>,
    exec_failures: Vec<String>,
    insert_failure: bool,
}

pub(crate) struct FakeEngine {
    state: Mutex<State>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    /// An engine with the bookkeeping objects already in place.
    pub fn bootstrapped() -> Self {
        let engine = Self::new();
        engine.add_object("applied_migrations");
        engine.add_object("applied_migrations_agg");
        engine
    }

    pub fn fast_readiness() -> ReadinessConfig {
        ReadinessConfig {
            poll_interval_ms: 1,
            timeout_secs: 1,
        }
    }

    pub fn add_object(&self, name: &str) {
        self.state.lock().unwrap().objects.insert(name.to_string(), 0);
    }

    pub fn add_record(&self, filename: &str) {
        self.state.lock().unwrap().records.push(filename.to_string());
    }

    pub fn set_materialization_delay(&self, probes: usize) {
        self.state.lock().unwrap().materialization_delay = probes;
    }

    pub fn set_query_warmup(&self, rejections: usize) {
        self.state.lock().unwrap().query_warmup = rejections;
    }

    pub fn fail_describe(&self, message: &str) {
        self.state.lock().unwrap().describe_failure = Some(message.to_string());
    }

    pub fn fail_create(&self, name: &str) {
        self.state.lock().unwrap().create_failure = Some(name.to_string());
    }

    pub fn fail_query(&self, message: &str) {
        self.state.lock().unwrap().query_failure = Some(message.to_string());
    }

    pub fn fail_exec_containing(&self, needle: &str) {
        self.state
            .lock()
            .unwrap()
            .exec_failures
            .push(needle.to_string());
    }

    pub fn fail_inserts(&self) {
        self.state.lock().unwrap().insert_failure = true;
    }

    pub fn created(&self) -> Vec<String> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn records(&self) -> Vec<String> {
        self.state.lock().unwrap().records.clone()
    }

    pub fn executed(&self) -> Vec<String> {
        self.state.lock().unwrap().executed.clone()
    }

    pub fn describe_calls(&self) -> usize {
        self.state.lock().unwrap().describe_calls
    }

    pub fn exec_calls(&self) -> usize {
        self.state.lock().unwrap().exec_calls
    }

    pub fn query_calls(&self) -> usize {
        self.state.lock().unwrap().query_calls
    }

    pub fn is_ready(&self, name: &str) -> bool {
        self.state.lock().unwrap().objects.get(name) == Some(&0)
    }
}

/// First single-quoted literal after `marker`, with `''` unescaped.
fn quoted_after(statement: &str, marker: &str) -> Option<String> {
    let start = statement.find(marker)? + marker.len();
    let rest = &statement[start..];
    let mut out = String::new();
    let mut chars = rest.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\'' {
            if chars.peek() == Some(&'\'') {
                chars.next();
                out.push('\'');
            } else {
                return Some(out);
            }
        } else {
            out.push(c);
        }
    }
    None
}

fn word_after<'a>(statement: &'a str, marker: &str) -> Option<&'a str> {
    let start = statement.find(marker)? + marker.len();
    statement[start..]
        .split(|c: char| c.is_whitespace() || c == ';' || c == '(')
        .find(|w| !w.is_empty())
}

#[async_trait]
impl EngineClient for FakeEngine {
    async fn query(&self, statement: &str) -> Result<Row> {
        if statement.trim().is_empty() {
            return Err(Error::EmptyStatement);
        }
        let mut state = self.state.lock().unwrap();
        state.query_calls += 1;
        if let Some(message) = &state.query_failure {
            return Err(Error::Transport(message.clone()));
        }
        let view = word_after(statement, "from ").unwrap_or_default();
        if state.query_warmup > 0 {
            state.query_warmup -= 1;
            return Err(Error::RemoteApi {
                status: 400,
                message: format!("{view} is not materialized yet"),
            });
        }
        if state.objects.get(view) != Some(&0) {
            return Err(Error::RemoteApi {
                status: 400,
                message: format!("{view} is not queryable"),
            });
        }
        let filename = quoted_after(statement, "= '").unwrap_or_default();
        let count = state.records.iter().filter(|r| **r == filename).count();
        if count == 0 {
            return Err(Error::NoResults);
        }
        Ok(Row {
            columns: vec![json!(filename), json!(count)],
        })
    }

    async fn exec(&self, statement: &str, _properties: &StreamsProperties) -> Result<()> {
        if statement.trim().is_empty() {
            return Err(Error::EmptyStatement);
        }
        let mut state = self.state.lock().unwrap();
        state.exec_calls += 1;

        if statement.starts_with("insert into applied_migrations ") {
            if state.insert_failure {
                return Err(Error::Transport("connection reset by peer".into()));
            }
            let filename = quoted_after(statement, "values ('").unwrap_or_default();
            state.records.push(filename);
            return Ok(());
        }

        if let Some(needle) = state
            .exec_failures
            .iter()
            .find(|n| statement.contains(n.as_str()))
        {
            return Err(Error::RemoteApi {
                status: 400,
                message: format!("statement rejected near '{needle}'"),
            });
        }
        state.executed.push(statement.to_string());
        Ok(())
    }

    async fn create(
        &self,
        statement: &str,
        _properties: &StreamsProperties,
    ) -> Result<CommandStatusEntity> {
        let mut state = self.state.lock().unwrap();
        let name = word_after(statement, "create table ")
            .unwrap_or_default()
            .to_string();
        if state.create_failure.as_deref() == Some(name.as_str()) {
            return Err(Error::RemoteApi {
                status: 400,
                message: format!("cannot create {name}"),
            });
        }
        let delay = state.materialization_delay;
        state.objects.insert(name.clone(), delay);
        state.created.push(name.clone());

        Ok(CommandStatusEntity {
            statement_text: statement.to_string(),
            command_id: format!("table/`{}`/create", name.to_uppercase()),
            command_status: CommandStatus {
                status: CommandState::Success,
                message: "Table created".into(),
            },
        })
    }

    async fn describe(&self, statement: &str) -> Result<SourceDescriptionEntity> {
        let mut state = self.state.lock().unwrap();
        state.describe_calls += 1;
        if let Some(message) = &state.describe_failure {
            return Err(Error::Transport(message.clone()));
        }
        let name = word_after(statement, "describe ")
            .unwrap_or_default()
            .to_string();
        let not_found = || {
            Error::NotFound(format!(
                "Could not find STREAM/TABLE '{}' in the Metastore",
                name.to_uppercase()
            ))
        };
        match state.objects.get_mut(&name) {
            Some(0) => Ok(SourceDescriptionEntity {
                statement_text: statement.to_string(),
                source_description: SourceDescription {
                    name: name.to_uppercase(),
                    source_type: "TABLE".into(),
                    ..Default::default()
                },
            }),
            Some(remaining) => {
                *remaining -= 1;
                Err(not_found())
            }
            None => Err(not_found()),
        }
    }
}
