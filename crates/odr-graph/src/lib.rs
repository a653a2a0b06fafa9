//! `odr-graph` — output containers for the converted road network.
//!
//! The importer core writes into these containers; downstream network
//! builders read from them.  Insertion of a node or edge whose identifier is
//! already taken fails (the caller decides whether that is fatal).
//!
//! # Crate layout
//!
//! | Module   | Contents                                                     |
//! |----------|--------------------------------------------------------------|
//! | [`node`] | `Node`, `NodeStore`, `NodeIndex` (nearest-node queries)      |
//! | [`edge`] | `RoadEdge`, `EdgeLane`, `LaneConnection`, `EdgeStore`        |
//! | [`error`]| `GraphError`, `GraphResult<T>`                               |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public types.           |

pub mod edge;
pub mod error;
pub mod node;

#[cfg(test)]
mod tests;

pub use edge::{EdgeLane, EdgeStore, LaneConnection, RoadEdge};
pub use error::{GraphError, GraphResult};
pub use node::{Node, NodeIndex, NodeStore};
