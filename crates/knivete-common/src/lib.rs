pub mod context;
pub mod error;

pub use context::ExecutionContext;
pub use error::{Error, Result};
