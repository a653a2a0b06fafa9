//! `odr-core` — foundational types for the `rust_odr` OpenDRIVE importer.
//!
//! This crate is a dependency of every other `odr-*` crate.  It intentionally
//! has no `odr-*` dependencies and minimal external ones (only `thiserror`,
//! plus optional `serde`).
//!
//! # What lives here
//!
//! | Module        | Contents                                                |
//! |---------------|---------------------------------------------------------|
//! | [`geom`]      | `Point`, `PolyLine`, `Bounds`, `Cubic`, epsilons        |
//! | [`config`]    | `ImportConfig` — the enumerated importer options        |
//! | [`catalog`]   | `VehClasses`, `LaneTypeSpec`, `LaneTypeCatalog`         |
//! | [`observer`]  | `ImportObserver` warning/error sink trait               |
//! | [`project`]   | `Projection` trait, `IdentityProjection`                |
//! | [`error`]     | `CoreError`, `CoreResult`                               |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to the public value types.  |

pub mod catalog;
pub mod config;
pub mod error;
pub mod geom;
pub mod observer;
pub mod project;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use catalog::{LaneTypeCatalog, LaneTypeSpec, VehClasses};
pub use config::ImportConfig;
pub use error::{CoreError, CoreResult};
pub use geom::{Bounds, Cubic, Point, PolyLine, NUMERICAL_EPS, POSITION_EPS};
pub use observer::{CollectingObserver, ImportObserver, NoopObserver};
pub use project::{IdentityProjection, Projection};
