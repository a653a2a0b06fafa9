//! Geometry-layer error type.
//!
//! `CoreError` only covers hard geometric failures (operations that cannot
//! produce a meaningful result).  Recoverable defects — mismatched segment
//! junctions, degenerate spirals and the like — are reported through the
//! [`ImportObserver`](crate::ImportObserver) channel instead and never abort
//! processing.

use thiserror::Error;

/// Errors produced by `odr-core` geometry operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("polyline has fewer than two points")]
    TooFewPoints,

    #[error("degenerate geometry: {0}")]
    Degenerate(String),
}

/// Shorthand result type for `odr-core`.
pub type CoreResult<T> = Result<T, CoreError>;
