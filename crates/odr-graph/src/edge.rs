//! Edge container.
//!
//! One `RoadEdge` is one direction of travel over one lane-section range of
//! an outer road.  Lane-to-lane connections — both intra-road continuations
//! between consecutive section edges and flattened junction connections —
//! are stored on the container, not on the edges.

use std::collections::{BTreeMap, BTreeSet};

use odr_core::{LaneTypeCatalog, PolyLine, VehClasses};

// ── Lanes ─────────────────────────────────────────────────────────────────────

/// Per-lane attributes of an output edge.  Lane 0 is the rightmost lane.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeLane {
    /// Allowed speed in m/s.
    pub speed: f64,
    /// Lane width in metres.
    pub width: f64,
    /// Vehicle classes allowed on this lane.
    pub permissions: VehClasses,
    /// `<roadId>_<openDriveLaneId>` of the source lane, for traceability.
    pub orig_id: Option<String>,
}

impl Default for EdgeLane {
    fn default() -> Self {
        Self {
            speed: 13.89,
            width: 3.65,
            permissions: VehClasses::VEHICULAR,
            orig_id: None,
        }
    }
}

// ── Edge ──────────────────────────────────────────────────────────────────────

/// A directed edge of the output graph.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadEdge {
    pub id: String,
    pub from: String,
    pub to: String,
    /// Discretised shape in travel direction.
    pub geometry: PolyLine,
    /// Lanes from the rightmost outward.
    pub lanes: Vec<EdgeLane>,
    /// Joined lane-type descriptor (`"driving"` or `"driving|sidewalk"`).
    pub type_name: String,
    /// Right-of-way priority derived from signage (0 yield, 1 default, 2
    /// priority road).
    pub priority: i32,
    pub street_name: String,
    /// Identifier of the source road, for traceability.
    pub orig_road: String,
}

impl RoadEdge {
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }
}

// ── Connections ───────────────────────────────────────────────────────────────

/// A lane-to-lane connection between two output edges.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaneConnection {
    pub from_edge: String,
    pub from_lane: usize,
    pub to_edge: String,
    pub to_lane: usize,
    /// Interpolated internal shape across the junction, when enabled.
    pub shape: Option<PolyLine>,
    /// `(connecting road id, lane id)` this connection passed through.
    pub orig: Option<(String, i32)>,
}

// ── EdgeStore ─────────────────────────────────────────────────────────────────

/// Container owning all output edges and their connections.
#[derive(Default)]
pub struct EdgeStore {
    edges: BTreeMap<String, RoadEdge>,
    ignored: BTreeSet<String>,
    connections: Vec<LaneConnection>,
}

impl EdgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an edge.  Returns `false` when the id is already taken.
    ///
    /// When `keep_all` is false and every lane of the edge is without
    /// permissions, the edge is dropped instead and its id recorded as
    /// ignored; the insert still counts as successful.
    pub fn insert(&mut self, edge: RoadEdge, keep_all: bool, catalog: &LaneTypeCatalog) -> bool {
        if self.edges.contains_key(&edge.id) || self.ignored.contains(&edge.id) {
            return false;
        }
        let all_forbidden = !edge.lanes.is_empty()
            && edge
                .lanes
                .iter()
                .all(|l| l.permissions.is_empty());
        let discarded = catalog.knows(&edge.type_name) && catalog.discarded(&edge.type_name);
        if !keep_all && (all_forbidden || discarded) {
            self.ignored.insert(edge.id);
            return true;
        }
        self.edges.insert(edge.id.clone(), edge);
        true
    }

    /// Whether an insert under this id was dropped by the type filter.
    pub fn was_ignored(&self, id: &str) -> bool {
        self.ignored.contains(id)
    }

    pub fn retrieve(&self, id: &str) -> Option<&RoadEdge> {
        self.edges.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.edges.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoadEdge> {
        self.edges.values()
    }

    /// Record a lane-to-lane connection.
    pub fn add_connection(&mut self, conn: LaneConnection) {
        self.connections.push(conn);
    }

    pub fn connections(&self) -> &[LaneConnection] {
        &self.connections
    }

    /// Connections leaving `edge_id`, in insertion order.
    pub fn connections_from<'a>(
        &'a self,
        edge_id: &'a str,
    ) -> impl Iterator<Item = &'a LaneConnection> {
        self.connections
            .iter()
            .filter(move |c| c.from_edge == edge_id)
    }
}
