pub mod http;
pub mod model;
pub mod traits;

pub use http::{HTTP_AUDIT_TARGET, HttpEngineClient};
pub use model::{
    CommandState, CommandStatusEntity, ExecRequest, QueryRequest, Row, SourceDescription,
    SourceDescriptionEntity, StreamsProperties, earliest_offset,
};
pub use traits::EngineClient;
