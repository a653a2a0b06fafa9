//! Importer error type.
//!
//! Only unrecoverable failures end up here: I/O and XML grammar errors from
//! the event source, and topology conflicts (an endpoint bound to two
//! distinct nodes, a node or edge that cannot be inserted uniquely).  All
//! per-road defects degrade with a warning instead — see
//! [`ImportObserver`](odr_core::ImportObserver).

use thiserror::Error;

/// Errors that abort an import run.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("not an OpenDRIVE document: root element is '{0}'")]
    NotOpenDrive(String),

    #[error("road '{road}' has two {side} nodes ('{first}' and '{second}')")]
    TopologyConflict {
        road: String,
        side: &'static str,
        first: String,
        second: String,
    },

    #[error("could not add node '{0}'")]
    NodeInsert(String),

    #[error("could not add edge '{0}'")]
    EdgeInsert(String),

    #[error("could not find node '{0}'")]
    NodeMissing(String),
}

/// Shorthand result type for `odr-import`.
pub type ImportResult<T> = Result<T, ImportError>;
