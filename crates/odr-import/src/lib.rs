//! `odr-import` — convert OpenDRIVE road networks into an intermediate road
//! graph for traffic-simulation network building.
//!
//! # Pipeline
//!
//! ```text
//! XML → road table → geometry engine → lane-section reshaper
//!     → topology builder → edge emitter → connection flattener → graph
//! ```
//!
//! Roads described as parametric curves (lines, arcs, clothoids,
//! polynomials, with elevation and lateral offset) become discretised
//! polylines; lane sections are re-cut at speed-limit changes and minimum
//! width crossings; junctions become nodes; each outer road becomes one
//! directed edge per travel direction and lane section; and chains of
//! connecting roads inside junctions collapse into direct outer→outer
//! lane-to-lane connections.
//!
//! # Crate layout
//!
//! | Module          | Contents                                             |
//! |-----------------|------------------------------------------------------|
//! | [`model`]       | Parsed road table (`Road`, `LaneSection`, `Lane`, …) |
//! | [`parser`]      | OpenDRIVE XML reader                                 |
//! | [`spiral`]      | Clothoid sampling kernel                             |
//! | [`shapes`]      | Geometry engine                                      |
//! | [`reshape`]     | Lane-section reshaper                                |
//! | [`topology`]    | Node synthesis                                       |
//! | [`edges`]       | Edge emitter                                         |
//! | [`connections`] | Connection flattening and resolution                 |
//! | [`signals`]     | Traffic-light resolution                             |
//! | [`error`]       | `ImportError`, `ImportResult<T>`                     |
//!
//! # Usage
//!
//! ```ignore
//! use odr_core::{CollectingObserver, IdentityProjection, ImportConfig, LaneTypeCatalog};
//! use odr_import::import_file;
//!
//! let catalog = LaneTypeCatalog::with_defaults();
//! let cfg = ImportConfig::default();
//! let mut obs = CollectingObserver::new();
//! let out = import_file("map.xodr", &catalog, &cfg, &IdentityProjection, &mut obs)?;
//! println!("{} nodes, {} edges", out.nodes.len(), out.edges.len());
//! ```

pub mod connections;
pub mod edges;
pub mod error;
pub mod model;
pub mod parser;
pub mod reshape;
pub mod shapes;
pub mod signals;
pub mod spiral;
pub mod topology;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::path::Path;

use odr_core::{ImportConfig, ImportObserver, LaneTypeCatalog, Projection};
use odr_graph::{EdgeStore, NodeStore};

pub use error::{ImportError, ImportResult};

// ── Orchestrator ──────────────────────────────────────────────────────────────

/// Everything an import run produces.
pub struct ImportOutput {
    pub nodes: NodeStore,
    pub edges: EdgeStore,
    /// Edges controlled by traffic lights: edge id → signal name.
    pub traffic_lights: BTreeMap<String, String>,
    /// `+proj` definition from the file's `geoReference`, when present.
    pub proj_string: Option<String>,
}

/// Run the full import pipeline over an OpenDRIVE document.
///
/// Road-level defects degrade with warnings on `obs`; only I/O and XML
/// failures and topology conflicts abort the run.
pub fn import_str(
    xml: &str,
    catalog: &LaneTypeCatalog,
    cfg: &ImportConfig,
    projection: &dyn Projection,
    obs: &mut dyn ImportObserver,
) -> ImportResult<ImportOutput> {
    let mut net = parser::parse_str(xml, catalog, cfg, obs)?;

    shapes::compute_shapes(&mut net.roads, cfg, projection, obs);
    reshape::revisit_lane_sections(&mut net.roads, catalog, obs);

    let mut nodes = NodeStore::new();
    topology::build_nodes(&mut net.roads, &mut nodes, obs)?;

    let mut edges = EdgeStore::new();
    edges::build_edges(&mut net.roads, &mut nodes, &mut edges, catalog, cfg, obs)?;

    connections::set_edge_links(&mut net.roads, cfg, obs);
    let flattened = connections::flatten_connections(&net.roads, cfg, obs);
    connections::resolve_connections(&flattened, &net.roads, &mut edges, obs);

    let traffic_lights = signals::build_traffic_lights(&net.roads, obs);

    // road records are no longer needed once the graph is emitted
    Ok(ImportOutput {
        nodes,
        edges,
        traffic_lights,
        proj_string: net.proj_string,
    })
}

/// Like [`import_str`], reading the document from a file.
pub fn import_file(
    path: impl AsRef<Path>,
    catalog: &LaneTypeCatalog,
    cfg: &ImportConfig,
    projection: &dyn Projection,
    obs: &mut dyn ImportObserver,
) -> ImportResult<ImportOutput> {
    let xml = std::fs::read_to_string(path)?;
    import_str(&xml, catalog, cfg, projection, obs)
}
