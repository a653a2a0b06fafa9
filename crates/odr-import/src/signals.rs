//! Traffic-light resolution.
//!
//! Signals of type `"1000001"` are mapped to the emitted edge whose section
//! covers the signal's arclength.  Signals sitting on connecting roads have
//! no emitted edge; their controlled relation is synthesized from the road's
//! predecessor/successor links as `"<from>-><to>"`.  That reconstruction is
//! known to be imperfect for junctions with several incoming candidates and
//! warns on every ambiguity it detects.

use std::collections::BTreeMap;

use odr_core::ImportObserver;

use crate::model::{ContactPoint, ElementType, LinkDirection, Road};

/// Traffic-light signal type code (OpenDRIVE section 6.11).
const TRAFFIC_LIGHT_TYPE: &str = "1000001";

/// Collect the edges controlled by traffic lights: `edge id → signal name`.
///
/// Keys are emitted edge identifiers, or `"<from>-><to>"` composites for
/// signals resolved through a connecting road.
pub fn build_traffic_lights(
    roads: &BTreeMap<String, Road>,
    obs: &mut dyn ImportObserver,
) -> BTreeMap<String, String> {
    let mut controlled: BTreeMap<String, String> = BTreeMap::new();
    for road in roads.values() {
        for sig in &road.signals {
            if sig.kind != TRAFFIC_LIGHT_TYPE {
                continue;
            }
            // section whose range covers the signal position
            let mut k = 0usize;
            while k + 1 < road.sections.len() {
                let next_s = road.sections[k + 1].s;
                if sig.s > road.sections[k].s && sig.s <= next_s {
                    break;
                }
                k += 1;
            }
            let Some(section) = road.sections.get(k) else {
                continue;
            };

            let mut id = section.out_id.clone();
            if id.is_empty() {
                if !road.junction.is_empty() {
                    // a light on a connecting road: reconstruct the
                    // controlled relation from the road's own links
                    let mut from_id = String::new();
                    let mut to_id = String::new();
                    for link in &road.links {
                        if link.element_type != ElementType::Road {
                            continue;
                        }
                        let Some(linked) = roads.get(&link.element_id) else {
                            continue;
                        };
                        match link.direction {
                            LinkDirection::Predecessor => {
                                if !from_id.is_empty() {
                                    obs.warn("Ambigous start of connection.");
                                }
                                if link.contact_point == ContactPoint::Start {
                                    from_id = linked
                                        .sections
                                        .first()
                                        .map(|s| s.out_id.clone())
                                        .unwrap_or_default();
                                    if sig.orientation < 0 {
                                        from_id = format!("-{from_id}");
                                    }
                                } else {
                                    from_id = linked
                                        .sections
                                        .last()
                                        .map(|s| s.out_id.clone())
                                        .unwrap_or_default();
                                    if sig.orientation > 0 {
                                        from_id = format!("-{from_id}");
                                    }
                                }
                            }
                            LinkDirection::Successor => {
                                if !to_id.is_empty() {
                                    obs.warn("Ambigous end of connection.");
                                }
                                to_id = if link.contact_point == ContactPoint::Start {
                                    linked.sections.first()
                                } else {
                                    linked.sections.last()
                                }
                                .map(|s| s.out_id.clone())
                                .unwrap_or_default();
                            }
                        }
                    }
                    id = format!("{from_id}->{to_id}");
                } else {
                    obs.warn(&format!(
                        "Found a traffic light signal on an unknown edge (original edge id='{}').",
                        road.id
                    ));
                    continue;
                }
            } else if sig.orientation > 0 {
                id = format!("-{id}");
            }
            controlled.insert(id, sig.name.clone());
        }
    }
    controlled
}
