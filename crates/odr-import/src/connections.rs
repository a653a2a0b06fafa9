//! Connection synthesis and flattening.
//!
//! Three steps:
//!
//! 1. explicit road links become lane-to-lane [`Connection`]s on the road
//!    they leave from (`set_edge_links`);
//! 2. connections that lead into a junction's connecting roads are walked
//!    depth-first until they reach outer roads again, producing direct
//!    outer→outer connections (`flatten_connections`);
//! 3. the flattened tuples are resolved onto emitted edge identifiers and
//!    compact lane indices and recorded on the edge container
//!    (`resolve_connections`).

use std::collections::{BTreeMap, BTreeSet};

use odr_core::{ImportConfig, ImportObserver, PolyLine};
use odr_graph::{EdgeStore, LaneConnection};

use crate::model::{Connection, ContactPoint, ElementType, LaneSide, LinkDirection, Road};

// ── Step 1: explicit links → connections ──────────────────────────────────────

/// Turn every road-to-road link into per-lane connections, stored on the
/// road the connection leaves from.
pub fn set_edge_links(
    roads: &mut BTreeMap<String, Road>,
    cfg: &ImportConfig,
    obs: &mut dyn ImportObserver,
) {
    let ids: Vec<String> = roads.keys().cloned().collect();
    let mut pending: Vec<(String, Connection)> = Vec::new();
    for id in &ids {
        let road = &roads[id];
        for link in &road.links {
            if link.element_type != ElementType::Road {
                // links to junctions are expressed through the junction's
                // own connection records
                continue;
            }
            let section = match link.direction {
                LinkDirection::Successor => road.sections.last(),
                LinkDirection::Predecessor => road.sections.first(),
            };
            let Some(section) = section else { continue };

            for side in [LaneSide::Right, LaneSide::Left] {
                for lane in section.lanes(side) {
                    if !cfg.import_all_lanes && !section.lane_map.contains_key(&lane.id) {
                        continue;
                    }
                    let linked_lane = match link.direction {
                        LinkDirection::Successor => lane.successor,
                        LinkDirection::Predecessor => lane.predecessor,
                    };
                    let mut c = match side {
                        LaneSide::Right => Connection {
                            from_edge: road.id.clone(),
                            from_lane: Some(lane.id),
                            from_cp: Some(ContactPoint::End),
                            to_edge: link.element_id.clone(),
                            to_lane: linked_lane,
                            to_cp: Some(link.contact_point),
                            ..Default::default()
                        },
                        LaneSide::Left => Connection {
                            from_edge: link.element_id.clone(),
                            from_lane: linked_lane,
                            from_cp: Some(link.contact_point),
                            to_edge: road.id.clone(),
                            to_lane: Some(lane.id),
                            to_cp: Some(ContactPoint::End),
                            ..Default::default()
                        },
                        LaneSide::Center => unreachable!(),
                    };
                    if link.direction != LinkDirection::Successor {
                        std::mem::swap(&mut c.from_edge, &mut c.to_edge);
                        std::mem::swap(&mut c.from_lane, &mut c.to_lane);
                        std::mem::swap(&mut c.from_cp, &mut c.to_cp);
                    }
                    pending.push((c.from_edge.clone(), c));
                }
            }
        }
    }
    for (owner, c) in pending {
        match roads.get_mut(&owner) {
            Some(road) => {
                road.connections.insert(c);
            }
            None => obs.error(&format!(
                "While setting connections: incoming road '{owner}' is not known."
            )),
        }
    }
}

// ── Step 2: flattening across junctions ───────────────────────────────────────

/// Flatten every connection so none ends at a connecting road.
///
/// Connections starting at connecting roads are skipped here: they are
/// reached through the walks that start from outer roads.
pub fn flatten_connections(
    roads: &BTreeMap<String, Road>,
    cfg: &ImportConfig,
    obs: &mut dyn ImportObserver,
) -> Vec<Connection> {
    let mut flattened: Vec<Connection> = Vec::new();
    for road in roads.values() {
        for c in &road.connections {
            if roads.get(&c.from_edge).is_some_and(|r| r.is_inner()) {
                continue;
            }
            if roads.get(&c.to_edge).is_some_and(|r| r.is_inner()) {
                let mut seen = BTreeSet::new();
                walk_to_outer(c, roads, cfg, obs, &mut flattened, &mut seen);
            } else {
                flattened.push(c.clone());
            }
        }
    }
    flattened
}

/// Depth-first walk from connection `c` (whose `to_edge` is inner) until
/// outer roads are reached; every reachable outer destination becomes one
/// direct connection carrying the walk's outer origin.
fn walk_to_outer(
    c: &Connection,
    roads: &BTreeMap<String, Road>,
    cfg: &ImportConfig,
    obs: &mut dyn ImportObserver,
    into: &mut Vec<Connection>,
    seen: &mut BTreeSet<Connection>,
) {
    let Some(dest) = roads.get(&c.to_edge).filter(|r| r.is_inner()) else {
        return;
    };
    seen.insert(c.clone());
    for next in &dest.connections {
        let next_inner = roads.get(&next.to_edge).is_some_and(|r| r.is_inner());
        if next_inner {
            if !seen.contains(next) {
                let mut tail: Vec<Connection> = Vec::new();
                walk_to_outer(next, roads, cfg, obs, &mut tail, seen);
                for t in tail {
                    let mut cn = t;
                    cn.from_edge = c.from_edge.clone();
                    cn.from_lane = c.from_lane;
                    cn.from_cp = c.from_cp;
                    cn.all = c.all;
                    if cfg.internal_shapes {
                        let mut shape = roads
                            .get(&next.to_edge)
                            .map(|r| r.geom.clone())
                            .unwrap_or_default();
                        if let Some(carried) = &c.shape {
                            shape.append(carried);
                        }
                        cn.shape = Some(shape);
                    }
                    into.push(cn);
                }
            } else {
                obs.warn(&format!(
                    "Circular connections in junction including roads '{}' and '{}', loop size {}",
                    c.from_edge,
                    c.to_edge,
                    seen.len()
                ));
            }
        } else {
            if !lane_sections_connected(dest, c.to_lane, next.from_lane) {
                continue;
            }
            let mut cn = next.clone();
            cn.from_edge = c.from_edge.clone();
            cn.from_lane = c.from_lane;
            cn.from_cp = c.from_cp;
            cn.all = c.all;
            cn.orig_id = Some(c.to_edge.clone());
            cn.orig_lane = c.to_lane;
            if cfg.internal_shapes {
                cn.shape = internal_shape(dest, c, obs);
            }
            into.push(cn);
        }
    }
}

/// Whether the connecting road's lane sections actually carry lane `in_lane`
/// through to `out_lane`.  Spacing lanes of type `"none"` shift indices, so
/// both sides are scanned while rewriting through each section's successor.
fn lane_sections_connected(
    road: &Road,
    in_lane: Option<i32>,
    out_lane: Option<i32>,
) -> bool {
    if road.sections.len() == 1 {
        return in_lane == out_lane;
    }
    let mut cur = in_lane;
    for sec in &road.sections[..road.sections.len() - 1] {
        for lane in &sec.right {
            if Some(lane.id) == cur {
                cur = lane.successor;
            }
        }
        for lane in &sec.left {
            if Some(lane.id) == cur {
                cur = lane.successor;
            }
        }
    }
    cur == out_lane
}

/// Copy the connecting road's shape and offset it to the lane this
/// connection actually uses: the cumulative half-width of the inner lanes
/// between the centre and the reference lane, negative on the right side.
fn internal_shape(
    dest: &Road,
    c: &Connection,
    obs: &mut dyn ImportObserver,
) -> Option<PolyLine> {
    let mut shape = dest.geom.clone();
    if shape.len() < 2 {
        return None;
    }
    let first_section = dest.sections.first()?;
    let at_end = c.to_cp == Some(ContactPoint::End);
    let (side, offset_factor) = if at_end {
        (LaneSide::Left, -1.0)
    } else {
        (LaneSide::Right, 1.0)
    };
    let mut reference_lane = 0i32;
    for lane in first_section.lanes(side) {
        let matches = if at_end {
            lane.successor == c.from_lane
        } else {
            lane.predecessor == c.from_lane
        };
        if matches {
            reference_lane = lane.id;
            break;
        }
    }
    let mut offsets = vec![0.0; shape.len()];
    for lane in first_section.lanes(side) {
        if lane.id.abs() > reference_lane.abs() || lane.widths.is_empty() {
            continue;
        }
        let multiplier = offset_factor * if lane.id == reference_lane { 0.5 } else { 1.0 };
        let mut s = 0.0;
        for i in 0..shape.len() {
            if i > 0 {
                s += shape[i - 1].distance2d(shape[i]);
            }
            offsets[i] += lane.widths[0].eval_at(s) * multiplier;
        }
    }
    match shape.move2side_each(&offsets) {
        Ok(()) => {
            if at_end {
                Some(shape.reversed())
            } else {
                Some(shape)
            }
        }
        Err(_) => {
            obs.warn(&format!(
                "Could not import internal lane shape from edge '{}' to edge '{}'.",
                c.from_edge, c.to_edge
            ));
            None
        }
    }
}

// ── Step 3: resolution onto emitted edges ─────────────────────────────────────

/// Map flattened connection tuples onto emitted edge identifiers and compact
/// lane indices, and record them on the edge container.
pub fn resolve_connections(
    connections: &[Connection],
    roads: &BTreeMap<String, Road>,
    edges: &mut EdgeStore,
    obs: &mut dyn ImportObserver,
) {
    for c in connections {
        let Some(od_from) = roads.get(&c.from_edge) else {
            obs.warn(&format!(
                "While setting connections: from-edge '{}' is not known.",
                c.from_edge
            ));
            continue;
        };
        let Some(od_to) = roads.get(&c.to_edge) else {
            obs.warn(&format!(
                "While setting connections: to-edge '{}' is not known.",
                c.to_edge
            ));
            continue;
        };
        let Some(from_lane) = c.from_lane else { continue };
        let Some(to_lane) = c.to_lane else { continue };

        // a right-hand lane leaving at the road end lives on the last
        // section's edge; every other case resolves to the first section
        let from_last = c.from_cp == Some(ContactPoint::End) && from_lane < 0;
        let from_section = if from_last {
            od_from.sections.last()
        } else {
            od_from.sections.first()
        };
        let to_last = c.to_cp == Some(ContactPoint::End) || to_lane > 0;
        let to_section = if to_last {
            od_to.sections.last()
        } else {
            od_to.sections.first()
        };
        let (Some(from_section), Some(to_section)) = (from_section, to_section) else {
            continue;
        };

        let mut from_edge = from_section.out_id.clone();
        if from_lane < 0 {
            from_edge = revert_id(&from_edge);
        }
        let mut to_edge = to_section.out_id.clone();
        if to_lane < 0 {
            to_edge = revert_id(&to_edge);
        }
        let from_index = from_section.lane_map.get(&from_lane).copied().unwrap_or(0);
        let to_index = to_section.lane_map.get(&to_lane).copied().unwrap_or(0);

        if edges.retrieve(&from_edge).is_none() {
            obs.warn(&format!(
                "Could not find fromEdge representation of '{}' in connection '{}'.",
                from_edge,
                c.orig_id.as_deref().unwrap_or("")
            ));
        }
        if edges.retrieve(&to_edge).is_none() {
            obs.warn(&format!(
                "Could not find fromEdge representation of '{}' in connection '{}'.",
                to_edge,
                c.orig_id.as_deref().unwrap_or("")
            ));
        }
        if !edges.contains(&from_edge) || !edges.contains(&to_edge) {
            continue;
        }

        edges.add_connection(LaneConnection {
            from_edge,
            from_lane: from_index as usize,
            to_edge,
            to_lane: to_index as usize,
            shape: c.shape.clone(),
            orig: c
                .orig_id
                .as_ref()
                .map(|id| (id.clone(), c.orig_lane.unwrap_or(0))),
        });
    }
}

/// Toggle the direction prefix of an edge identifier.
fn revert_id(id: &str) -> String {
    match id.strip_prefix('-') {
        Some(rest) => rest.to_string(),
        None => format!("-{id}"),
    }
}
