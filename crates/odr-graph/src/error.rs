//! Graph-container error type.

use thiserror::Error;

/// Errors produced by `odr-graph`.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("node '{0}' already exists")]
    DuplicateNode(String),

    #[error("edge '{0}' already exists")]
    DuplicateEdge(String),

    #[error("edge '{0}' not found")]
    EdgeNotFound(String),
}

pub type GraphResult<T> = Result<T, GraphError>;
