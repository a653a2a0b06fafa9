//! Topology builder: decide which node every road endpoint attaches to.
//!
//! Four phases, in order:
//!
//! 1. every junction gets a node at the centre of the union of its
//!    connecting roads' bounding boxes;
//! 2. explicit links of outer roads are resolved — junction targets and
//!    targets that turn out to be connecting roads attach to the junction
//!    node, outer→outer links get a synthesized shared node;
//! 3. endpoints still open are resolved by scanning the connecting roads for
//!    links back to the outer road;
//! 4. anything still open gets a synthesized `<id>.begin` / `<id>.end` node
//!    at the polyline extremity.
//!
//! Binding an endpoint to two distinct nodes is a hard error.

use std::collections::BTreeMap;

use odr_core::{Bounds, ImportObserver, Point};
use odr_graph::NodeStore;

use crate::error::{ImportError, ImportResult};
use crate::model::{ContactPoint, ElementType, LinkDirection, Road};

/// Run all four node-building phases.
///
/// Returns the `road id → junction id` map for the connecting roads, which
/// later passes reuse.
pub fn build_nodes(
    roads: &mut BTreeMap<String, Road>,
    nodes: &mut NodeStore,
    _obs: &mut dyn ImportObserver,
) -> ImportResult<BTreeMap<String, String>> {
    // ── Phase 1: junction centroids from inner-road bounding boxes ────────
    let mut junction_bounds: BTreeMap<String, Bounds> = BTreeMap::new();
    let mut road_to_junction: BTreeMap<String, String> = BTreeMap::new();
    for road in roads.values() {
        if !road.is_inner() {
            continue;
        }
        road_to_junction.insert(road.id.clone(), road.junction.clone());
        junction_bounds
            .entry(road.junction.clone())
            .or_default()
            .add_bounds(&road.geom.bounds());
    }
    for (junction, bounds) in &junction_bounds {
        if !nodes.insert(junction, bounds.center()) {
            return Err(ImportError::NodeInsert(junction.clone()));
        }
    }

    // ── Phase 2: explicit endpoint links of outer roads ───────────────────
    let outer_ids: Vec<String> = roads
        .values()
        .filter(|r| !r.is_inner())
        .map(|r| r.id.clone())
        .collect();

    for id in &outer_ids {
        let links = roads[id].links.clone();
        for link in &links {
            if link.element_type != ElementType::Road {
                // a junction target: build the node on first sight
                if nodes.retrieve(&link.element_id).is_none() {
                    let pos = endpoint_position(&roads[id], link.direction);
                    if !nodes.insert(&link.element_id, pos) {
                        return Err(ImportError::NodeInsert(link.element_id.clone()));
                    }
                }
                set_node_secure(roads.get_mut(id).unwrap(), &link.element_id, link.direction)?;
                continue;
            }
            if let Some(junction) = road_to_junction.get(&link.element_id) {
                // target is a connecting road; attach to its junction
                let junction = junction.clone();
                set_node_secure(roads.get_mut(id).unwrap(), &junction, link.direction)?;
            }
        }
    }

    // outer road linked directly to another outer road: shared node named
    // from both ids
    for id in &outer_ids {
        let links = roads[id].links.clone();
        for link in &links {
            if link.element_type != ElementType::Road
                || road_to_junction.contains_key(&link.element_id)
            {
                continue;
            }
            let (id1, id2) = if id.as_str() < link.element_id.as_str() {
                (id.as_str(), link.element_id.as_str())
            } else {
                (link.element_id.as_str(), id.as_str())
            };
            let nid = format!("{id1}.{id2}");
            if nodes.retrieve(&nid).is_none() {
                let pos = endpoint_position(&roads[id], link.direction);
                if !nodes.insert(&nid, pos) {
                    return Err(ImportError::NodeInsert(nid));
                }
            }
            set_node_secure(roads.get_mut(id).unwrap(), &nid, link.direction)?;
        }
    }

    // ── Phase 3: propagate junction nodes from inner-road links ───────────
    let inner_ids: Vec<String> = road_to_junction.keys().cloned().collect();
    for id in &outer_ids {
        if roads[id].from_node.is_some() && roads[id].to_node.is_some() {
            continue;
        }
        for inner_id in &inner_ids {
            let inner_links = roads[inner_id].links.clone();
            for link in &inner_links {
                if link.element_type != ElementType::Road || link.element_id != *id {
                    continue;
                }
                let nid = road_to_junction[inner_id].clone();
                let direction = if link.contact_point == ContactPoint::Start {
                    LinkDirection::Predecessor
                } else {
                    LinkDirection::Successor
                };
                set_node_secure(roads.get_mut(id).unwrap(), &nid, direction)?;
            }
        }
    }

    // ── Phase 4: synthesize nodes for unterminated endpoints ──────────────
    for id in &outer_ids {
        let road = &roads[id];
        if (road.from_node.is_none() || road.to_node.is_none()) && road.geom.is_empty() {
            continue;
        }
        if road.from_node.is_none() {
            let nid = format!("{id}.begin");
            let pos = road.geom.first().unwrap_or_default();
            nodes.get_or_insert(&nid, pos);
            roads.get_mut(id).unwrap().from_node = Some(nid);
        }
        if roads[id].to_node.is_none() {
            let nid = format!("{id}.end");
            let pos = roads[id].geom.last().unwrap_or_default();
            nodes.get_or_insert(&nid, pos);
            roads.get_mut(id).unwrap().to_node = Some(nid);
        }
    }

    Ok(road_to_junction)
}

/// Polyline extremity matching a link direction: the end for a successor,
/// the start for a predecessor.
fn endpoint_position(road: &Road, direction: LinkDirection) -> Point {
    match direction {
        LinkDirection::Successor => road.geom.last().unwrap_or_default(),
        LinkDirection::Predecessor => road.geom.first().unwrap_or_default(),
    }
}

/// Bind one endpoint of `road` to `node_id`, failing when it is already
/// bound to a different node.
fn set_node_secure(
    road: &mut Road,
    node_id: &str,
    direction: LinkDirection,
) -> ImportResult<()> {
    let (slot, side) = match direction {
        LinkDirection::Successor => (&mut road.to_node, "end"),
        LinkDirection::Predecessor => (&mut road.from_node, "start"),
    };
    match slot {
        Some(existing) if existing != node_id => Err(ImportError::TopologyConflict {
            road: road.id.clone(),
            side,
            first: existing.clone(),
            second: node_id.to_string(),
        }),
        _ => {
            *slot = Some(node_id.to_string());
            Ok(())
        }
    }
}
