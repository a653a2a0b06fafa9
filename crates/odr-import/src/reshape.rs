//! Lane-section reshaping.
//!
//! Two rewrite passes over a road's lane sections:
//!
//! * **speed changes** — no section may span a per-lane speed-limit change;
//!   sections are cloned at every change position and the effective speed is
//!   propagated across the clones.
//! * **minimum width** — a passenger-capable lane must not cross the
//!   configured minimum width inside a section; crossings become section
//!   boundaries so the narrow stretch can be downgraded on its own.
//!
//! Plus the per-section bookkeeping both passes rely on: the compact lane
//! mapping and the lane continuations between adjacent sections.

use std::collections::{BTreeMap, BTreeSet};

use odr_core::{
    ImportConfig, ImportObserver, LaneTypeCatalog, VehClasses, NUMERICAL_EPS, POSITION_EPS,
};

use crate::model::{Lane, LaneSection, LaneSide, Road};

// ── Lane mapping ──────────────────────────────────────────────────────────────

/// Assign compact output lane indices and per-direction counts/types.
///
/// Right lanes are walked from the centre outward (the stored list is
/// ordered outside-in, hence the reverse iteration), left lanes likewise.
/// Lanes whose type the catalogue discards are skipped unless
/// `import_all_lanes` is set.
pub fn build_lane_mapping(sec: &mut LaneSection, catalog: &LaneTypeCatalog, cfg: &ImportConfig) {
    sec.lane_map.clear();

    let mut out_lane = 0i32;
    let mut types: Vec<&str> = Vec::new();
    for lane in sec.right.iter().rev() {
        if cfg.import_all_lanes || (catalog.knows(&lane.kind) && !catalog.discarded(&lane.kind)) {
            sec.lane_map.insert(lane.id, out_lane);
            out_lane += 1;
            types.push(&lane.kind);
        }
    }
    sec.right_lane_count = out_lane;
    sec.right_type = joined_type(&types);

    let mut out_lane = 0i32;
    let mut types: Vec<&str> = Vec::new();
    for lane in sec.left.iter() {
        if cfg.import_all_lanes || (catalog.knows(&lane.kind) && !catalog.discarded(&lane.kind)) {
            sec.lane_map.insert(lane.id, out_lane);
            out_lane += 1;
            types.push(&lane.kind);
        }
    }
    sec.left_lane_count = out_lane;
    sec.left_type = joined_type(&types);
}

fn joined_type(types: &[&str]) -> String {
    if types.is_empty() {
        return String::new();
    }
    if types.iter().all(|t| *t == types[0]) {
        types[0].to_string()
    } else {
        types.join("|")
    }
}

/// Lane continuations between `prev` and `cur` for one direction, as compact
/// `from → to` index pairs.
///
/// For the left side the pair is emitted reversed because left lanes travel
/// against increasing arclength.
pub fn inner_connections(
    cur: &LaneSection,
    side: LaneSide,
    prev: &LaneSection,
) -> BTreeMap<i32, i32> {
    let mut ret = BTreeMap::new();
    for lane in cur.lanes(side).iter().rev() {
        let Some(&to) = cur.lane_map.get(&lane.id) else {
            // this lane is not part of the output
            continue;
        };
        let Some(pred) = lane.predecessor else {
            continue;
        };
        let Some(&from) = prev.lane_map.get(&pred) else {
            continue;
        };
        let (from, to) = if side == LaneSide::Left {
            (to, from)
        } else {
            (from, to)
        };
        ret.insert(from, to);
    }
    ret
}

// ── Pass A: speed changes ─────────────────────────────────────────────────────

/// Split every section that spans a speed-limit change; returns whether any
/// road was modified.  Afterwards sections are re-sorted if needed and
/// near-duplicate start positions are removed — for outer roads only, since
/// connecting roads need all their sections for connectivity analysis.
pub fn revisit_lane_sections(
    roads: &mut BTreeMap<String, Road>,
    catalog: &LaneTypeCatalog,
    obs: &mut dyn ImportObserver,
) {
    for road in roads.values_mut() {
        let mut new_sections: Vec<LaneSection> = Vec::new();
        for sec in road.sections.drain(..) {
            new_sections.extend(build_speed_changes(sec, catalog));
        }
        road.sections = new_sections;

        let sorted = road
            .sections
            .windows(2)
            .all(|w| w[0].s < w[1].s);
        if !sorted {
            obs.warn(&format!(
                "The sections of road '{}' are not sorted properly.",
                road.id
            ));
            road.sections
                .sort_by(|a, b| a.s.partial_cmp(&b.s).unwrap());
        }

        let is_inner = road.is_inner();
        let mut last_s = -1.0;
        let road_id = road.id.clone();
        road.sections.retain(|sec| {
            let similar = (sec.s - last_s).abs() < POSITION_EPS;
            last_s = sec.s;
            if similar && !is_inner {
                obs.warn(&format!(
                    "Almost duplicate s-value '{}' for lane sections occurred at road '{road_id}'; second entry was removed.",
                    sec.s
                ));
                false
            } else {
                true
            }
        });
    }
}

/// Split one section at its speed-change offsets.
///
/// Returns the section unchanged when no lane records a speed change, the
/// ordered clones otherwise.  Lanes without a record at a split inherit
/// from the previous clone (the type default for the first clone).
fn build_speed_changes(mut sec: LaneSection, catalog: &LaneTypeCatalog) -> Vec<LaneSection> {
    // collect change positions; a record at offset 0 seeds the lane's speed
    let mut positions: BTreeSet<OrdF64> = BTreeSet::new();
    for side in [LaneSide::Right, LaneSide::Left] {
        for lane in sec.lanes_mut(side).iter_mut() {
            for rec in &lane.speeds {
                positions.insert(OrdF64(rec.s_offset));
                if rec.s_offset == 0.0 {
                    lane.speed = rec.speed;
                }
            }
        }
    }
    if positions.is_empty() {
        return vec![sec];
    }
    positions.insert(OrdF64(0.0));

    let mut sections: Vec<LaneSection> = Vec::new();
    for (i, pos) in positions.iter().enumerate() {
        if i == 0 {
            sections.push(sec.clone());
        } else {
            sections.push(clone_section_at(&sec, pos.0));
        }
    }
    // propagate speeds forward across the clones
    for i in 0..sections.len() {
        for side in [LaneSide::Left, LaneSide::Center, LaneSide::Right] {
            for j in 0..sections[i].lanes(side).len() {
                if sections[i].lanes(side)[j].speed != 0.0 {
                    continue;
                }
                let speed = if i > 0 {
                    sections[i - 1].lanes(side)[j].speed
                } else {
                    catalog.speed(&sections[i].lanes(side)[j].kind)
                };
                sections[i].lanes_mut(side)[j].speed = speed;
            }
        }
    }
    sections
}

/// Clone `sec` moved to `sec.s + offset`, with each lane's speed taken from
/// its record at exactly that offset (0 when absent, to be filled by
/// propagation).
fn clone_section_at(sec: &LaneSection, offset: f64) -> LaneSection {
    let mut ret = sec.clone();
    ret.s += offset;
    for side in [LaneSide::Right, LaneSide::Left] {
        for lane in ret.lanes_mut(side).iter_mut() {
            lane.speed = lane
                .speeds
                .iter()
                .find(|r| (r.s_offset - offset).abs() < NUMERICAL_EPS)
                .map(|r| r.speed)
                .unwrap_or(0.0);
        }
    }
    ret
}

/// Total order wrapper so change positions can live in a `BTreeSet`.
#[derive(PartialEq, Copy, Clone)]
struct OrdF64(f64);

impl Eq for OrdF64 {}

impl PartialOrd for OrdF64 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrdF64 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

// ── Pass B: minimum width ─────────────────────────────────────────────────────

/// Split sections wherever a passenger-capable lane crosses the configured
/// minimum width.  `min_dist` filters out splits too close to each other or
/// to the section end.
pub fn split_min_widths(
    road: &mut Road,
    catalog: &LaneTypeCatalog,
    cfg: &ImportConfig,
    min_dist: f64,
) {
    let mut new_sections: Vec<LaneSection> = Vec::new();
    let section_count = road.sections.len();
    for j in 0..section_count {
        let section_end = road
            .sections
            .get(j + 1)
            .map(|n| n.s)
            .unwrap_or(road.length);
        let sec = &road.sections[j];

        let mut split_positions: Vec<f64> = Vec::new();
        if sec.right_lane_count > 0 {
            find_width_split(
                catalog,
                &sec.right,
                cfg.min_width,
                sec.s_orig,
                section_end,
                &mut split_positions,
            );
        }
        if sec.left_lane_count > 0 {
            find_width_split(
                catalog,
                &sec.left,
                cfg.min_width,
                sec.s_orig,
                section_end,
                &mut split_positions,
            );
        }
        let sec = road.sections[j].clone();
        new_sections.push(sec.clone());

        split_positions.sort_by(f64::total_cmp);
        // drop tiny or duplicate splits, and any belonging to another section
        let mut prev_split = sec.s;
        split_positions.retain(|&p| {
            if p - prev_split < min_dist || section_end - p < min_dist {
                false
            } else if p < sec.s {
                false
            } else {
                prev_split = p;
                true
            }
        });

        if !split_positions.is_empty() {
            recompute_widths(
                new_sections.last_mut().unwrap(),
                sec.s_orig,
                split_positions[0],
                sec.s_orig,
                section_end,
            );
            for (i, &pos) in split_positions.iter().enumerate() {
                let mut sec_new = sec.clone();
                sec_new.s = pos;
                if sec_new.right_lane_count > 0 {
                    set_straight_connections(&mut sec_new.right);
                }
                if sec_new.left_lane_count > 0 {
                    set_straight_connections(&mut sec_new.left);
                }
                let end = split_positions.get(i + 1).copied().unwrap_or(section_end);
                recompute_widths(&mut sec_new, pos, end, sec.s_orig, section_end);
                new_sections.push(sec_new);
            }
        }
    }
    road.sections = new_sections;
}

/// Find the positions where a lane's width crosses `min_width` between
/// consecutive width records: linear estimate first, then a ±ε walk until
/// the cubic is genuinely on the thin side.
fn find_width_split(
    catalog: &LaneTypeCatalog,
    lanes: &[Lane],
    min_width: f64,
    section_start: f64,
    section_end: f64,
    split_positions: &mut Vec<f64>,
) {
    for lane in lanes {
        let permissions = catalog
            .permissions(&lane.kind)
            .without(VehClasses::PEDESTRIAN | VehClasses::BICYCLE);
        if lane.widths.is_empty()
            || !catalog.knows(&lane.kind)
            || catalog.discarded(&lane.kind)
            || permissions.is_empty()
        {
            continue;
        }
        let mut s_prev = lane.widths[0].s_offset;
        let mut w_prev = lane.widths[0].eval_at(s_prev);
        for (i, rec) in lane.widths.iter().enumerate() {
            let s_end = lane
                .widths
                .get(i + 1)
                .map(|n| n.s_offset)
                .unwrap_or(section_end - section_start);
            let w = rec.eval_at(s_end);
            if (w_prev < min_width && w > min_width) || (w_prev > min_width && w < min_width) {
                let change_dist = (min_width - w_prev).abs();
                let mut split_pos = s_prev + (s_end - s_prev) / (w - w_prev).abs() * change_dist;
                let mut w_split = rec.eval_at(split_pos);
                // ensure the thin part is actually thin enough
                while w_split > min_width {
                    if w_prev < min_width {
                        // getting wider
                        split_pos -= POSITION_EPS;
                        if split_pos < s_prev {
                            split_pos = s_prev;
                            break;
                        }
                    } else {
                        // getting thinner
                        split_pos += POSITION_EPS;
                        if split_pos > s_end {
                            split_pos = s_end;
                            break;
                        }
                    }
                    w_split = rec.eval_at(split_pos);
                }
                split_positions.push(section_start + split_pos);
            }
            w_prev = w;
            s_prev = s_end;
        }
    }
}

/// Make the connection at a synthetic boundary a straight pass-through.
fn set_straight_connections(lanes: &mut [Lane]) {
    for lane in lanes {
        lane.predecessor = Some(lane.id);
    }
}

/// Recompute each lane's effective width over `[start, end]` as the maximum
/// of the cubic at the interval corners and at every enclosed record anchor.
fn recompute_widths(
    sec: &mut LaneSection,
    start: f64,
    end: f64,
    section_start: f64,
    section_end: f64,
) {
    if sec.right_lane_count > 0 {
        recompute_lane_widths(&mut sec.right, start, end, section_start, section_end);
    }
    if sec.left_lane_count > 0 {
        recompute_lane_widths(&mut sec.left, start, end, section_start, section_end);
    }
}

fn recompute_lane_widths(
    lanes: &mut [Lane],
    start: f64,
    end: f64,
    section_start: f64,
    section_end: f64,
) {
    for lane in lanes {
        if lane.widths.is_empty() {
            continue;
        }
        let mut width: f64 = 0.0;
        let mut s_prev = lane.widths[0].s_offset;
        let mut s_prev_abs = s_prev + section_start;
        for (i, rec) in lane.widths.iter().enumerate() {
            let s_end = lane
                .widths
                .get(i + 1)
                .map(|n| n.s_offset)
                .unwrap_or(section_end - section_start);
            let s_end_abs = s_end + section_start;
            if s_prev_abs <= start && s_end_abs >= start {
                width = width.max(rec.eval_at(start - section_start));
            }
            if s_prev_abs <= end && s_end_abs >= end {
                width = width.max(rec.eval_at(end - section_start));
            }
            if start <= s_prev_abs && end >= s_prev_abs {
                width = width.max(rec.eval_at(s_prev));
            }
            if start <= s_end_abs && end >= s_end_abs {
                width = width.max(rec.eval_at(s_end));
            }
            s_prev = s_end;
            s_prev_abs = s_end_abs;
        }
        lane.width = Some(width);
    }
}
