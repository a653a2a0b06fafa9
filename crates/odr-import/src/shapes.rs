//! Geometry engine: discretise each road's parametric plan view into a
//! polyline, lift it with the elevation profile, and shift it by the lateral
//! lane offset.
//!
//! Lines collapse to their endpoints unless the road carries non-linear
//! elevation, arcs are sampled at step starts (the final arc endpoint is
//! supplied by the following segment), and polynomial segments overshoot
//! and are clipped back to the declared segment length.

use std::collections::BTreeMap;

use odr_core::{
    ImportConfig, ImportObserver, Point, PolyLine, Projection, NUMERICAL_EPS, POSITION_EPS,
};

use crate::model::{GeometryKind, GeometrySegment, Road};
use crate::spiral::clothoid_at;

/// Discretise every road in the table and apply elevation, lane offset, and
/// the injected projection.
pub fn compute_shapes(
    roads: &mut BTreeMap<String, Road>,
    cfg: &ImportConfig,
    projection: &dyn Projection,
    obs: &mut dyn ImportObserver,
) {
    let res = cfg.curve_resolution;
    for road in roads.values_mut() {
        // Lines need intermediate points only when elevation bends them.
        let line_res = if has_nonlinear_elevation(road) {
            Some(res)
        } else {
            None
        };

        let mut prev_was_line = false;
        let mut last: Option<Point> = None;
        let mut geom = PolyLine::new();
        for (index, g) in road.geometries.iter().enumerate() {
            let part = match &g.kind {
                GeometryKind::Line => geom_from_line(g, line_res),
                GeometryKind::Spiral { .. } => geom_from_spiral(&road.id, g, res, obs),
                GeometryKind::Arc { .. } => geom_from_arc(g, res),
                GeometryKind::Poly3(_) => geom_from_poly(g, res),
                GeometryKind::ParamPoly3 { .. } => geom_from_param_poly(g, res),
            };
            if part.is_empty() {
                continue;
            }
            if !geom.is_empty() && prev_was_line {
                // The line's endpoint and this segment's start describe the
                // same position; keep only one to avoid duplicate vertices.
                if geom.last().unwrap().almost_same(part[0]) {
                    geom.pop();
                } else {
                    obs.warn(&format!(
                        "Mismatched geometry for road '{}' between geometry segments {} and {}.",
                        road.id,
                        index - 1,
                        index
                    ));
                }
            }
            for i in 0..part.len() {
                last = Some(part[i]);
                geom.push_no_double(part[i]);
            }
            prev_was_line = matches!(g.kind, GeometryKind::Line);
        }
        // the no-double filter can swallow a segment down to one vertex
        if geom.len() == 1 {
            if let Some(last) = last {
                if geom[0] != last {
                    geom.push(last);
                }
            }
        }
        if let Some(min_dist) = cfg.geometry_min_dist {
            geom.remove_double_points(min_dist);
        }
        road.geom = geom;

        apply_elevation(road);
        apply_lane_offsets(road, obs);

        if !project_geometry(road, projection) {
            obs.warn(&format!(
                "Unable to project coordinates for road '{}'; discarding its geometry.",
                road.id
            ));
            road.geom = PolyLine::new();
        }
    }
}

/// Whether the elevation profile bends line segments (more than one record,
/// or any quadratic/cubic term).
fn has_nonlinear_elevation(road: &Road) -> bool {
    if road.elevations.len() > 1 {
        return true;
    }
    road.elevations.iter().any(|el| !el.poly.is_linear())
}

// ── Per-variant discretisation ────────────────────────────────────────────────

fn geom_from_line(g: &GeometrySegment, resolution: Option<f64>) -> PolyLine {
    let start = Point::new(g.x, g.y);
    let end = straight_end_point(g.hdg, g.length, start);
    let mut ret = PolyLine::new();
    match resolution {
        Some(res) if g.length > 0.0 => {
            let num_points = (g.length / res).ceil() as usize + 1;
            let dx = (end.x - start.x) / (num_points - 1) as f64;
            let dy = (end.y - start.y) / (num_points - 1) as f64;
            for i in 0..num_points {
                ret.push(Point::new(g.x + i as f64 * dx, g.y + i as f64 * dy));
            }
        }
        _ => {
            ret.push(start);
            ret.push(end);
        }
    }
    ret
}

fn geom_from_spiral(
    road_id: &str,
    g: &GeometrySegment,
    resolution: f64,
    obs: &mut dyn ImportObserver,
) -> PolyLine {
    let GeometryKind::Spiral {
        curv_start,
        curv_end,
    } = g.kind
    else {
        unreachable!()
    };
    let mut ret = PolyLine::new();
    let c_dot = (curv_end - curv_start) / g.length;
    if c_dot == 0.0 || g.length == 0.0 || !c_dot.is_finite() {
        // a spiral with constant curvature is a line or arc in disguise
        obs.warn(&format!(
            "Could not compute spiral geometry for road '{road_id}' (cDot={c_dot} length={}).",
            g.length
        ));
        ret.push(Point::new(g.x, g.y));
        return ret;
    }
    let s_start = curv_start / c_dot;
    let s_end = curv_end / c_dot;
    let (_, _, t_start) = clothoid_at(s_start, c_dot);
    let mut s = s_start;
    while s <= s_end {
        let (x, y, _) = clothoid_at(s, c_dot);
        ret.push(Point::new(x, y));
        s += resolution;
    }
    if s != s_end {
        let (x, y, _) = clothoid_at(s_end, c_dot);
        ret.push(Point::new(x, y));
    }
    // place the canonical samples at the segment start pose
    let first = ret[0];
    ret.shift(-first.x, -first.y, 0.0);
    ret.rotate2d(g.hdg - t_start);
    ret.shift(g.x, g.y, 0.0);
    ret.subpart2d(0.0, g.length)
}

fn geom_from_arc(g: &GeometrySegment, resolution: f64) -> PolyLine {
    let GeometryKind::Arc { curvature } = g.kind else {
        unreachable!()
    };
    let mut ret = PolyLine::new();
    let radius = 1.0 / curvature;
    let (center_x, center_y) = curve_center(g.x, g.y, radius, g.hdg);
    let mut start = Point::new(g.x, g.y);
    let mut end = Point::new(g.x, g.y);
    let mut pos_s = g.s;
    let mut pos_e = g.s;
    loop {
        pos_e += resolution;
        if pos_e - g.s > g.length {
            pos_e = g.s + g.length;
        }
        end = point_on_curve(end, center_x, center_y, radius, pos_e - pos_s);
        ret.push(start);
        start = end;
        pos_s = pos_e;
        if (pos_e - (g.s + g.length)).abs() < NUMERICAL_EPS {
            break;
        }
    }
    ret.subpart2d(0.0, g.length)
}

fn geom_from_poly(g: &GeometrySegment, resolution: f64) -> PolyLine {
    let GeometryKind::Poly3(poly) = g.kind else {
        unreachable!()
    };
    let (sin, cos) = g.hdg.sin_cos();
    let mut ret = PolyLine::new();
    let mut off = 0.0;
    // overshoot, then clip back to the declared length
    while off < g.length + 2.0 {
        let x = off;
        let y = poly.eval(off);
        ret.push(Point::new(
            g.x + x * cos - y * sin,
            g.y + x * sin + y * cos,
        ));
        off += resolution;
    }
    ret.subpart2d(0.0, g.length)
}

fn geom_from_param_poly(g: &GeometrySegment, resolution: f64) -> PolyLine {
    let GeometryKind::ParamPoly3 { u, v, arc_length } = g.kind else {
        unreachable!()
    };
    let (sin, cos) = g.hdg.sin_cos();
    let mut ret = PolyLine::new();
    if g.length <= 0.0 {
        ret.push(Point::new(g.x, g.y));
        return ret;
    }
    let p_max = if arc_length { g.length } else { 1.0 };
    let p_step = p_max / (g.length / resolution).ceil();
    let mut p = 0.0;
    while p <= p_max + p_step {
        let x = u.eval(p);
        let y = v.eval(p);
        ret.push(Point::new(
            g.x + x * cos - y * sin,
            g.y + x * sin + y * cos,
        ));
        p += p_step;
    }
    ret.subpart2d(0.0, g.length)
}

// ── Frame helpers ─────────────────────────────────────────────────────────────

fn straight_end_point(hdg: f64, length: f64, start: Point) -> Point {
    Point::new(start.x + hdg.cos() * length, start.y + hdg.sin() * length)
}

/// Centre of the circle an arc segment lies on: the unit tangent rotated by
/// ±90° (by the sign of the curvature) and scaled by the radius.
fn curve_center(x: f64, y: f64, radius: f64, hdg: f64) -> (f64, f64) {
    let turn = if radius > 0.0 { -1.0 } else { 1.0 };
    let norm_x = hdg.cos();
    let norm_y = hdg.sin();
    let (norm_x, norm_y) = (turn * norm_y, -turn * norm_x);
    (x + radius.abs() * norm_x, y + radius.abs() * norm_y)
}

/// Advance `p` along the circle around `(cx, cy)` by `length` metres of arc.
fn point_on_curve(p: Point, cx: f64, cy: f64, radius: f64, length: f64) -> Point {
    let rot = length / radius.abs();
    let turn = if radius > 0.0 { -1.0 } else { 1.0 };
    let vx = p.x - cx;
    let vy = p.y - cy;
    let (sin, cos) = rot.sin_cos();
    let nx = vx * cos + turn * vy * sin;
    let ny = -turn * vx * sin + vy * cos;
    Point::new(nx + cx, ny + cy)
}

// ── Elevation and lane offset ─────────────────────────────────────────────────

/// Assign `z` along the polyline from the elevation records.
///
/// The vertex position is the accumulated 2-D arclength, which slightly
/// underestimates the true parametric position along curved stretches.
fn apply_elevation(road: &mut Road) {
    let geom = &mut road.geom;
    let mut k = 0usize;
    let mut pos = 0.0;
    for (j, el) in road.elevations.iter().enumerate() {
        let s_next = road
            .elevations
            .get(j + 1)
            .map(|n| n.s)
            .unwrap_or(f64::MAX);
        while k < geom.len() && pos < s_next {
            let z = el.eval_at(pos);
            geom[k].add(0.0, 0.0, z);
            k += 1;
            if k < geom.len() {
                pos += geom[k - 1].distance2d(geom[k]);
            }
        }
    }
}

/// Shift each vertex orthogonally by the active lateral offset.
///
/// Positive offsets move the reference line to the left of travel.  The
/// shift is evaluated per vertex; elevation slope is deliberately ignored.
fn apply_lane_offsets(road: &mut Road, obs: &mut dyn ImportObserver) {
    if road.offsets.is_empty() || road.geom.len() < 2 {
        return;
    }
    // make sure a vertex exists at each offset anchor
    for el in &road.offsets {
        if let Some(p_s) = road.geom.position_at_offset2d(el.s) {
            let i_s = road.geom.index_of_closest(p_s);
            // avoid close spacing, which would amplify rounding in z
            if p_s.distance2d(road.geom[i_s]) > POSITION_EPS {
                road.geom.insert_at_closest(p_s);
            }
        }
    }
    let geom = &road.geom;
    let mut shifted = PolyLine::new();
    let mut k = 0usize;
    let mut pos = 0.0;
    for (j, el) in road.offsets.iter().enumerate() {
        let s_next = road.offsets.get(j + 1).map(|n| n.s).unwrap_or(f64::MAX);
        while k < geom.len() && pos < s_next {
            let offset = el.eval_at(pos);
            if offset.abs() > POSITION_EPS {
                let mut tmp = geom.clone();
                match tmp.move2side(-offset) {
                    Ok(()) => shifted.push(tmp[k]),
                    Err(_) => {
                        obs.warn(&format!("Could not compute shape for road '{}'.", road.id));
                        shifted.push(geom[k]);
                    }
                }
            } else {
                shifted.push(geom[k]);
            }
            k += 1;
            if k < geom.len() {
                pos += geom[k - 1].distance2d(geom[k]);
            }
        }
    }
    debug_assert_eq!(shifted.len(), road.geom.len());
    road.geom = shifted;
}

/// Apply the injected projection to every vertex.  Returns `false` when any
/// vertex fails to project.
fn project_geometry(road: &mut Road, projection: &dyn Projection) -> bool {
    for i in 0..road.geom.len() {
        match projection.project(road.geom[i]) {
            Some(p) => road.geom[i] = p,
            None => return false,
        }
    }
    true
}
