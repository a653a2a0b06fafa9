//! Edge emitter: split every outer road at its lane-section boundaries and
//! emit one forward and one backward edge per section.
//!
//! The forward (right-hand) edge is named `-<base>`, the backward
//! (left-hand) edge `<base>`; when a road is split across several sections
//! the base is suffixed with the section start arclength.  Consecutive
//! section edges of the same road are stitched with lane-to-lane
//! continuations from the reshaper's inner-connection map.

use std::collections::BTreeMap;

use odr_core::{ImportConfig, ImportObserver, LaneTypeCatalog, POSITION_EPS};
use odr_graph::{EdgeLane, EdgeStore, LaneConnection, NodeStore, RoadEdge};

use crate::error::{ImportError, ImportResult};
use crate::model::{Lane, LaneSide, Road};
use crate::reshape::{inner_connections, split_min_widths};

/// Emit edges for all outer roads.
pub fn build_edges(
    roads: &mut BTreeMap<String, Road>,
    nodes: &mut NodeStore,
    edges: &mut EdgeStore,
    catalog: &LaneTypeCatalog,
    cfg: &ImportConfig,
    obs: &mut dyn ImportObserver,
) -> ImportResult<()> {
    let outer_ids: Vec<String> = roads
        .values()
        .filter(|r| !r.is_inner())
        .map(|r| r.id.clone())
        .collect();

    for id in &outer_ids {
        let road = roads.get_mut(id).unwrap();
        if road.geom.len() < 2 {
            obs.warn(&format!("Ignoring road '{}' without geometry.", road.id));
            continue;
        }

        // a loop back to its own node needs a section boundary to be
        // representable as two distinct edges
        if road.from_node == road.to_node && road.sections.len() == 1 {
            let mut half = road.sections[0].clone();
            half.s = road.length / 2.0;
            road.sections.push(half);
            obs.warn(&format!(
                "Road '{}' has to be split as it connects same junctions.",
                road.id
            ));
        }
        if cfg.min_width > 0.0 {
            split_min_widths(road, catalog, cfg, cfg.curve_resolution);
        }

        build_road_edges(road, nodes, edges, catalog, cfg, obs)?;
    }
    Ok(())
}

fn build_road_edges(
    road: &mut Road,
    nodes: &mut NodeStore,
    edges: &mut EdgeStore,
    catalog: &LaneTypeCatalog,
    cfg: &ImportConfig,
    obs: &mut dyn ImportObserver,
) -> ImportResult<()> {
    let from_node = road.from_node.clone().unwrap_or_default();
    let to_node = road.to_node.clone().unwrap_or_default();
    let priority_right = road.priority(LaneSide::Right);
    let priority_left = road.priority(LaneSide::Left);

    // 0-length 2-D geometries are possible when only inner points survived;
    // the factor rescales parametric arclength onto the projected polyline
    let length2d = road.geom.length2d();
    let correction = if length2d == 0.0 {
        1.0
    } else {
        road.length / length2d
    };

    let mut lanes_built = false;
    let mut prev_right: Option<String> = None;
    let mut prev_left: Option<String> = None;
    let mut s_from = from_node.clone();
    let mut s_begin = 0.0;

    let section_count = road.sections.len();
    for j in 0..section_count {
        let last = j + 1 == section_count;
        let (s_to, s_end) = if last {
            (to_node.clone(), road.length / correction)
        } else {
            let next_s = road.sections[j + 1].s;
            let nid = format!("{}.{}", road.id, fmt_s(next_s));
            let pos = road.geom.position_at_offset(next_s).unwrap_or_default();
            if !nodes.insert(&nid, pos) {
                return Err(ImportError::NodeInsert(nid));
            }
            (nid, next_s / correction)
        };

        let multi_section = s_from != from_node || s_to != to_node;
        let base = if multi_section {
            format!("{}.{}", road.id, fmt_s(road.sections[j].s))
        } else {
            road.id.clone()
        };
        let geometry = road.geom.subpart2d(s_begin, s_end);

        // forward (right-hand) edge
        if road.sections[j].right_lane_count > 0 {
            let edge_id = format!("-{base}");
            let mut lanes = vec![EdgeLane::default(); road.sections[j].right_lane_count as usize];
            for lane in &road.sections[j].right {
                if let Some(&idx) = road.sections[j].lane_map.get(&lane.id) {
                    lanes[idx as usize] = lane_attributes(road, lane, catalog, cfg);
                }
            }
            let edge = RoadEdge {
                id: edge_id.clone(),
                from: s_from.clone(),
                to: s_to.clone(),
                geometry: geometry.clone(),
                lanes,
                type_name: road.sections[j].right_type.clone(),
                priority: priority_right,
                street_name: road.street_name.clone(),
                orig_road: road.id.clone(),
            };
            if !edges.insert(edge, cfg.import_all_lanes, catalog) {
                return Err(ImportError::EdgeInsert(edge_id));
            }
            lanes_built = true;
            if edges.was_ignored(&base) {
                prev_right = None;
            } else {
                if let Some(prev) = &prev_right {
                    let conns =
                        inner_connections(&road.sections[j], LaneSide::Right, &road.sections[j - 1]);
                    for (from, to) in conns {
                        edges.add_connection(LaneConnection {
                            from_edge: prev.clone(),
                            from_lane: from as usize,
                            to_edge: edge_id.clone(),
                            to_lane: to as usize,
                            shape: None,
                            orig: None,
                        });
                    }
                }
                prev_right = Some(edge_id);
            }
        }

        // backward (left-hand) edge
        if road.sections[j].left_lane_count > 0 {
            let edge_id = base.clone();
            let mut lanes = vec![EdgeLane::default(); road.sections[j].left_lane_count as usize];
            for lane in &road.sections[j].left {
                if let Some(&idx) = road.sections[j].lane_map.get(&lane.id) {
                    lanes[idx as usize] = lane_attributes(road, lane, catalog, cfg);
                }
            }
            let edge = RoadEdge {
                id: edge_id.clone(),
                from: s_to.clone(),
                to: s_from.clone(),
                geometry: geometry.reversed(),
                lanes,
                type_name: road.sections[j].left_type.clone(),
                priority: priority_left,
                street_name: road.street_name.clone(),
                orig_road: road.id.clone(),
            };
            if !edges.insert(edge, cfg.import_all_lanes, catalog) {
                return Err(ImportError::EdgeInsert(edge_id));
            }
            lanes_built = true;
            if edges.was_ignored(&base) {
                prev_left = None;
            } else {
                if let Some(prev) = &prev_left {
                    let conns =
                        inner_connections(&road.sections[j], LaneSide::Left, &road.sections[j - 1]);
                    for (from, to) in conns {
                        // the new edge feeds the previous one: left lanes
                        // travel against increasing arclength
                        edges.add_connection(LaneConnection {
                            from_edge: edge_id.clone(),
                            from_lane: from as usize,
                            to_edge: prev.clone(),
                            to_lane: to as usize,
                            shape: None,
                            orig: None,
                        });
                    }
                }
                prev_left = Some(edge_id);
            }
        }

        road.sections[j].out_id = base;
        s_begin = s_end;
        s_from = s_to;
    }

    if !lanes_built {
        obs.warn(&format!("Road '{}' has no lanes.", road.id));
    }
    Ok(())
}

/// Section-start arclengths in edge identifiers, two decimals.
fn fmt_s(s: f64) -> String {
    format!("{s:.2}")
}

/// Resolve a lane's output attributes.
///
/// Speed falls back to the type default when the lane carries none.  Width
/// comes from the lane unless width import is disabled, is quantised and
/// clamped per the catalogue, and a passenger-capable lane that ends up
/// narrower than the configured minimum is downgraded to
/// emergency/authority use only — after first retrying one quantisation
/// step down, so rounding alone does not create a narrow section.
fn lane_attributes(
    road: &Road,
    lane: &Lane,
    catalog: &LaneTypeCatalog,
    cfg: &ImportConfig,
) -> EdgeLane {
    use odr_core::VehClasses;

    let speed = if lane.speed != 0.0 {
        lane.speed
    } else {
        catalog.speed(&lane.kind)
    };
    let mut permissions = catalog.permissions(&lane.kind);
    let mut width = match lane.width {
        Some(w) if !cfg.ignore_widths => w,
        _ => catalog.width(&lane.kind),
    };

    let width_resolution = catalog.width_resolution(&lane.kind);
    let max_width = catalog.max_width(&lane.kind);

    let forbidden_narrow = width < cfg.min_width
        && permissions.intersects(VehClasses::PASSENGER)
        && width < catalog.width(&lane.kind);

    if width >= 0.0 && width_resolution > 0.0 {
        width = (width / width_resolution + 0.5).floor() * width_resolution;
        if forbidden_narrow && width >= cfg.min_width {
            width -= width_resolution;
            if width <= 0.0 {
                width = POSITION_EPS.max(cfg.min_width - POSITION_EPS);
            }
        } else if width == 0.0 {
            // round up when close to 0
            width = width_resolution;
        }
    }
    if max_width > 0.0 {
        width = width.min(max_width);
    }
    if forbidden_narrow {
        // avoid narrow passenger car lanes, especially where width varies
        permissions = VehClasses::EMERGENCY | VehClasses::AUTHORITY;
    }

    EdgeLane {
        speed,
        width,
        permissions,
        orig_id: Some(format!("{}_{}", road.id, lane.id)),
    }
}
