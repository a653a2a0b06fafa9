//! OpenDRIVE XML reader.
//!
//! Walks the document in order and fills the [`ParsedNetwork`] road table.
//! Only the tags and attributes the importer consumes are read; everything
//! else is ignored.  Junctions are read after all roads so their `laneLink`
//! records can be attached to the incoming road directly.

use roxmltree::{Document, Node};

use odr_core::{Cubic, ImportConfig, ImportObserver, LaneTypeCatalog, NUMERICAL_EPS};

use crate::error::{ImportError, ImportResult};
use crate::model::{
    ContactPoint, Connection, ElementType, GeometryKind, GeometrySegment, Lane, LaneSection,
    LaneSide, Link, LinkDirection, ParsedNetwork, Road, RoadObject, SCubic, Signal, SpeedRec,
    WidthRec,
};
use crate::reshape::build_lane_mapping;

// ── Attribute helpers ─────────────────────────────────────────────────────────

fn attr_f64(node: &Node, name: &str, default: f64) -> f64 {
    node.attribute(name)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn attr_i32(node: &Node, name: &str, default: i32) -> i32 {
    node.attribute(name)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn attr_str(node: &Node, name: &str, default: &str) -> String {
    node.attribute(name).unwrap_or(default).to_string()
}

fn child<'a, 'input>(node: &'a Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.tag_name().name() == name)
}

fn children<'a, 'input>(
    node: &'a Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |n| n.tag_name().name() == name)
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Parse an OpenDRIVE document into the road table.
pub fn parse_str(
    xml: &str,
    catalog: &LaneTypeCatalog,
    cfg: &ImportConfig,
    obs: &mut dyn ImportObserver,
) -> ImportResult<ParsedNetwork> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();
    if root.tag_name().name() != "OpenDRIVE" {
        return Err(ImportError::NotOpenDrive(
            root.tag_name().name().to_string(),
        ));
    }

    let mut net = ParsedNetwork::default();

    if let Some(header) = child(&root, "header") {
        let major = attr_i32(&header, "revMajor", 1);
        let minor = attr_i32(&header, "revMinor", 2);
        if major != 1 || minor != 2 {
            obs.warn(&format!(
                "OpenDRIVE input uses version {major}.{minor}; version 1.2 is supported."
            ));
        }
    }

    if let Some(geo_ref) = child(&root, "geoReference") {
        if let Some(text) = geo_ref.text() {
            match text.find("+proj") {
                Some(i) => net.proj_string = Some(text[i..].trim().to_string()),
                None => obs.warn(&format!(
                    "geoReference format '{}' currently not supported",
                    text.trim()
                )),
            }
        }
    }

    for road_node in children(&root, "road") {
        if let Some(road) = parse_road(&road_node, catalog, cfg, obs) {
            net.roads.insert(road.id.clone(), road);
        }
    }

    // junctions second, so laneLinks can attach to the incoming roads
    for junction_node in children(&root, "junction") {
        parse_junction(&junction_node, &mut net, obs);
    }

    Ok(net)
}

// ── Roads ─────────────────────────────────────────────────────────────────────

fn parse_road(
    node: &Node,
    catalog: &LaneTypeCatalog,
    cfg: &ImportConfig,
    obs: &mut dyn ImportObserver,
) -> Option<Road> {
    let Some(id) = node.attribute("id") else {
        obs.warn("Ignoring road without id.");
        return None;
    };
    let street_name = attr_str(node, "name", "");
    let junction = attr_str(node, "junction", "-1");
    let length = attr_f64(node, "length", 0.0);
    let mut road = Road::new(id, &street_name, &junction, length);

    if let Some(link_node) = child(node, "link") {
        if let Some(pred) = child(&link_node, "predecessor") {
            parse_road_link(&pred, LinkDirection::Predecessor, "end", &mut road);
        }
        if let Some(succ) = child(&link_node, "successor") {
            parse_road_link(&succ, LinkDirection::Successor, "start", &mut road);
        }
    }

    if let Some(plan_view) = child(node, "planView") {
        for geom_node in children(&plan_view, "geometry") {
            parse_geometry(&geom_node, &mut road, obs);
        }
    }

    if let Some(profile) = child(node, "elevationProfile") {
        for el in children(&profile, "elevation") {
            road.elevations.push(SCubic {
                s: attr_f64(&el, "s", 0.0),
                poly: parse_cubic(&el),
            });
        }
    }

    if let Some(lanes_node) = child(node, "lanes") {
        for offset_node in children(&lanes_node, "laneOffset") {
            road.offsets.push(SCubic {
                s: attr_f64(&offset_node, "s", 0.0),
                poly: parse_cubic(&offset_node),
            });
        }
        for section_node in children(&lanes_node, "laneSection") {
            road.sections
                .push(parse_lane_section(&section_node));
        }
    }

    if let Some(signals_node) = child(node, "signals") {
        for sig in children(&signals_node, "signal") {
            road.signals.push(Signal {
                id: attr_str(&sig, "id", ""),
                kind: attr_str(&sig, "type", ""),
                name: attr_str(&sig, "name", ""),
                orientation: if sig.attribute("orientation") == Some("-") {
                    -1
                } else {
                    1
                },
                dynamic: sig.attribute("dynamic") != Some("no"),
                s: attr_f64(&sig, "s", 0.0),
            });
        }
    }

    if let Some(objects_node) = child(node, "objects") {
        for obj_node in children(&objects_node, "object") {
            parse_object(&obj_node, cfg, &mut road, obs);
        }
    }

    for section in &mut road.sections {
        build_lane_mapping(section, catalog, cfg);
    }
    Some(road)
}

fn parse_road_link(
    node: &Node,
    direction: LinkDirection,
    default_contact: &str,
    road: &mut Road,
) {
    let element_type = match node.attribute("elementType") {
        Some("junction") => ElementType::Junction,
        _ => ElementType::Road,
    };
    let Some(element_id) = node.attribute("elementId") else {
        return;
    };
    let contact_point = match node.attribute("contactPoint").unwrap_or(default_contact) {
        "start" => ContactPoint::Start,
        _ => ContactPoint::End,
    };
    road.links.push(Link {
        direction,
        element_type,
        element_id: element_id.to_string(),
        contact_point,
    });
}

fn parse_geometry(node: &Node, road: &mut Road, obs: &mut dyn ImportObserver) {
    let kind = if child(node, "line").is_some() {
        GeometryKind::Line
    } else if let Some(spiral) = child(node, "spiral") {
        GeometryKind::Spiral {
            curv_start: attr_f64(&spiral, "curvStart", 0.0),
            curv_end: attr_f64(&spiral, "curvEnd", 0.0),
        }
    } else if let Some(arc) = child(node, "arc") {
        GeometryKind::Arc {
            curvature: attr_f64(&arc, "curvature", 0.0),
        }
    } else if let Some(poly) = child(node, "poly3") {
        GeometryKind::Poly3(parse_cubic(&poly))
    } else if let Some(ppoly) = child(node, "paramPoly3") {
        let arc_length = match ppoly.attribute("pRange") {
            None | Some("normalized") => false,
            Some("arcLength") => true,
            Some(other) => {
                obs.warn(&format!(
                    "Ignoring invalid pRange value '{}' for road '{}'.",
                    other, road.id
                ));
                false
            }
        };
        GeometryKind::ParamPoly3 {
            u: Cubic::new(
                attr_f64(&ppoly, "aU", 0.0),
                attr_f64(&ppoly, "bU", 0.0),
                attr_f64(&ppoly, "cU", 0.0),
                attr_f64(&ppoly, "dU", 0.0),
            ),
            v: Cubic::new(
                attr_f64(&ppoly, "aV", 0.0),
                attr_f64(&ppoly, "bV", 0.0),
                attr_f64(&ppoly, "cV", 0.0),
                attr_f64(&ppoly, "dV", 0.0),
            ),
            arc_length,
        }
    } else {
        obs.warn(&format!(
            "Ignoring geometry without shape for road '{}'.",
            road.id
        ));
        return;
    };
    road.geometries.push(GeometrySegment {
        s: attr_f64(node, "s", 0.0),
        x: attr_f64(node, "x", 0.0),
        y: attr_f64(node, "y", 0.0),
        hdg: attr_f64(node, "hdg", 0.0),
        length: attr_f64(node, "length", 0.0),
        kind,
    });
}

fn parse_cubic(node: &Node) -> Cubic {
    Cubic::new(
        attr_f64(node, "a", 0.0),
        attr_f64(node, "b", 0.0),
        attr_f64(node, "c", 0.0),
        attr_f64(node, "d", 0.0),
    )
}

fn parse_lane_section(node: &Node) -> LaneSection {
    let mut section = LaneSection::new(attr_f64(node, "s", 0.0));
    for (tag, side) in [
        ("left", LaneSide::Left),
        ("center", LaneSide::Center),
        ("right", LaneSide::Right),
    ] {
        if let Some(side_node) = child(node, tag) {
            for lane_node in children(&side_node, "lane") {
                section.lanes_mut(side).push(parse_lane(&lane_node));
            }
        }
    }
    section
}

fn parse_lane(node: &Node) -> Lane {
    let mut lane = Lane::new(attr_i32(node, "id", 0), &attr_str(node, "type", ""));

    if let Some(link_node) = child(node, "link") {
        if let Some(pred) = child(&link_node, "predecessor") {
            lane.predecessor = pred.attribute("id").and_then(|s| s.parse().ok());
        }
        if let Some(succ) = child(&link_node, "successor") {
            lane.successor = succ.attribute("id").and_then(|s| s.parse().ok());
        }
    }

    for width_node in children(node, "width") {
        let rec = WidthRec {
            s_offset: attr_f64(&width_node, "sOffset", 0.0),
            poly: parse_cubic(&width_node),
        };
        lane.width = Some(lane.width.unwrap_or(f64::MIN).max(rec.poly.a));
        lane.widths.push(rec);
    }

    for speed_node in children(node, "speed") {
        let mut speed = attr_f64(&speed_node, "max", 0.0);
        // speeds default to m/s; the v1.4 unit attribute converts
        match speed_node.attribute("unit") {
            Some("km/h") => speed /= 3.6,
            Some("mph") => speed *= 1.609344 / 3.6,
            _ => {}
        }
        lane.speeds.push(SpeedRec {
            s_offset: attr_f64(&speed_node, "sOffset", 0.0),
            speed,
        });
    }

    lane
}

// ── Objects ───────────────────────────────────────────────────────────────────

fn parse_object(node: &Node, cfg: &ImportConfig, road: &mut Road, obs: &mut dyn ImportObserver) {
    let Some(id) = node.attribute("id") else {
        obs.warn(&format!(
            "Ignoring object without id at road '{}'.",
            road.id
        ));
        return;
    };
    let object = RoadObject {
        id: id.to_string(),
        kind: attr_str(node, "type", ""),
        name: attr_str(node, "name", ""),
        s: attr_f64(node, "s", 0.0),
        t: attr_f64(node, "t", 0.0),
        width: attr_f64(node, "width", -1.0),
        length: attr_f64(node, "length", -1.0),
        radius: attr_f64(node, "radius", -1.0),
        hdg: attr_f64(node, "hdg", 0.0),
    };

    let Some(repeat) = child(node, "repeat") else {
        road.objects.push(object);
        return;
    };

    // a repeat replaces the object with a series along s, interpolating
    // width and t between the start and end values
    let mut dist = attr_f64(&repeat, "distance", 0.0);
    if dist == 0.0 {
        // continuous feature; split into parts
        dist = cfg.curve_resolution;
    }
    let length = attr_f64(&repeat, "length", 0.0);
    let w_start = attr_f64(&repeat, "widthStart", object.width);
    let w_end = attr_f64(&repeat, "widthEnd", object.width);
    let t_start = attr_f64(&repeat, "tStart", object.t);
    let t_end = attr_f64(&repeat, "tEnd", object.t);
    let mut o = RoadObject {
        s: attr_f64(&repeat, "s", object.s),
        ..object
    };
    let base_id = o.id.clone();
    let mut index = 0usize;
    let mut x = 0.0;
    while x <= length + NUMERICAL_EPS {
        o.id = format!("{base_id}#{index}");
        index += 1;
        let a = if length > 0.0 { x / length } else { 0.0 };
        o.width = w_start * (1.0 - a) + w_end * a;
        o.t = t_start * (1.0 - a) + t_end * a;
        road.objects.push(o.clone());
        o.s += dist;
        x += dist;
    }
}

// ── Junctions ─────────────────────────────────────────────────────────────────

fn parse_junction(node: &Node, net: &mut ParsedNetwork, obs: &mut dyn ImportObserver) {
    for conn_node in children(node, "connection") {
        let incoming = attr_str(&conn_node, "incomingRoad", "");
        let connecting = attr_str(&conn_node, "connectingRoad", "");
        let contact_point = match conn_node.attribute("contactPoint") {
            Some("start") => ContactPoint::Start,
            _ => ContactPoint::End,
        };
        let mut was_empty = true;
        for link_node in children(&conn_node, "laneLink") {
            let c = Connection {
                from_edge: incoming.clone(),
                to_edge: connecting.clone(),
                from_lane: link_node.attribute("from").and_then(|s| s.parse().ok()),
                to_lane: link_node.attribute("to").and_then(|s| s.parse().ok()),
                from_cp: Some(ContactPoint::End),
                to_cp: Some(contact_point),
                ..Default::default()
            };
            match net.roads.get_mut(&incoming) {
                Some(road) => {
                    road.connections.insert(c);
                    was_empty = false;
                }
                None => obs.error(&format!(
                    "In laneLink-element: incoming road '{incoming}' is not known."
                )),
            }
        }
        if was_empty {
            // no explicit lane links: record a synthetic connect-all marker
            let c = Connection {
                from_edge: incoming.clone(),
                to_edge: connecting.clone(),
                from_lane: Some(0),
                to_lane: Some(0),
                from_cp: Some(ContactPoint::End),
                to_cp: Some(contact_point),
                all: true,
                ..Default::default()
            };
            match net.roads.get_mut(&incoming) {
                Some(road) => {
                    road.connections.insert(c);
                }
                None => obs.error(&format!(
                    "In laneLink-element: incoming road '{incoming}' is not known."
                )),
            }
        }
    }
}
