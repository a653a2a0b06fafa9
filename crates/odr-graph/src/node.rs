//! Node container and spatial index.
//!
//! Nodes are keyed by stable string identifiers (junction ids, synthesized
//! `<id>.begin` / `<id>.end` names, …).  Iteration order is deterministic
//! (`BTreeMap`) so repeated runs produce identical output.

use std::collections::BTreeMap;

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use odr_core::Point;

// ── Node ──────────────────────────────────────────────────────────────────────

/// A junction or endpoint of the output graph.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub id: String,
    pub pos: Point,
}

// ── NodeStore ─────────────────────────────────────────────────────────────────

/// Container owning all output nodes.
///
/// Nodes are inserted exactly once; a second insert under the same id fails
/// and leaves the first position in place.
#[derive(Default)]
pub struct NodeStore {
    nodes: BTreeMap<String, Node>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node.  Returns `false` (without touching the store) when the
    /// id is already taken.
    pub fn insert(&mut self, id: &str, pos: Point) -> bool {
        if self.nodes.contains_key(id) {
            return false;
        }
        self.nodes.insert(
            id.to_string(),
            Node {
                id: id.to_string(),
                pos,
            },
        );
        true
    }

    /// Insert unless present; either way return the stored node.  The first
    /// inserted position wins.
    pub fn get_or_insert(&mut self, id: &str, pos: Point) -> &Node {
        self.nodes.entry(id.to_string()).or_insert_with(|| Node {
            id: id.to_string(),
            pos,
        })
    }

    pub fn retrieve(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Build a spatial index over the current node set for nearest-node
    /// queries.  The index is a snapshot; later inserts are not reflected.
    pub fn spatial_index(&self) -> NodeIndex {
        let entries: Vec<NodeEntry> = self
            .nodes
            .values()
            .map(|n| NodeEntry {
                point: [n.pos.x, n.pos.y],
                id: n.id.clone(),
            })
            .collect();
        NodeIndex {
            tree: RTree::bulk_load(entries),
        }
    }
}

// ── Spatial index ─────────────────────────────────────────────────────────────

#[derive(Clone)]
struct NodeEntry {
    point: [f64; 2],
    id: String,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Bulk-loaded R-tree over node positions.
pub struct NodeIndex {
    tree: RTree<NodeEntry>,
}

impl NodeIndex {
    /// Identifier of the node nearest to `p`, or `None` on an empty index.
    pub fn nearest(&self, p: Point) -> Option<&str> {
        self.tree
            .nearest_neighbor(&[p.x, p.y])
            .map(|e| e.id.as_str())
    }
}
