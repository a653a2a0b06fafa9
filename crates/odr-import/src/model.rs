//! In-memory model of a parsed OpenDRIVE network.
//!
//! Roads are kept in a table keyed by their identifier; every cross
//! reference (links, junction membership, connections) is stored as an
//! identifier string and resolved against the table on demand.  This keeps
//! the inherently cyclic OpenDRIVE graph (roads ↔ junctions ↔ connecting
//! roads) free of ownership knots.

use std::collections::{BTreeMap, BTreeSet};

use odr_core::{Cubic, PolyLine};

/// Junction identifier values that mean "not part of a junction".
pub const NO_JUNCTION: &str = "-1";

// ── Links ─────────────────────────────────────────────────────────────────────

/// Which end of a referenced element a link attaches to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ContactPoint {
    Start,
    End,
}

/// What a road link points at.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ElementType {
    Road,
    Junction,
}

/// Whether a link describes the road's predecessor or successor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LinkDirection {
    Predecessor,
    Successor,
}

/// A road-level `<predecessor>` / `<successor>` element.
#[derive(Clone, Debug)]
pub struct Link {
    pub direction: LinkDirection,
    pub element_type: ElementType,
    pub element_id: String,
    /// Meaningful only when `element_type` is `Road`.
    pub contact_point: ContactPoint,
}

// ── Geometry ──────────────────────────────────────────────────────────────────

/// Parameters of one plan-view geometry variant.
#[derive(Copy, Clone, Debug)]
pub enum GeometryKind {
    Line,
    Spiral {
        curv_start: f64,
        curv_end: f64,
    },
    Arc {
        curvature: f64,
    },
    Poly3(Cubic),
    ParamPoly3 {
        u: Cubic,
        v: Cubic,
        /// `true` when the parameter runs over `[0, length]` instead of
        /// the normalized `[0, 1]`.
        arc_length: bool,
    },
}

/// One `<geometry>` record of a road's plan view.
#[derive(Clone, Debug)]
pub struct GeometrySegment {
    /// Arclength of the segment start along the road.
    pub s: f64,
    /// World-space start position.
    pub x: f64,
    pub y: f64,
    /// Heading at the start, radians.
    pub hdg: f64,
    pub length: f64,
    pub kind: GeometryKind,
}

/// A cubic anchored at arclength `s` (elevation and lane-offset records).
#[derive(Copy, Clone, Debug)]
pub struct SCubic {
    pub s: f64,
    pub poly: Cubic,
}

impl SCubic {
    /// Evaluate at absolute arclength `pos`.
    #[inline]
    pub fn eval_at(&self, pos: f64) -> f64 {
        self.poly.eval(pos - self.s)
    }
}

// ── Lanes ─────────────────────────────────────────────────────────────────────

/// A width cubic anchored at `s_offset` past the lane section start.
#[derive(Copy, Clone, Debug)]
pub struct WidthRec {
    pub s_offset: f64,
    pub poly: Cubic,
}

impl WidthRec {
    /// Evaluate at `pos` (arclength past the section start).
    #[inline]
    pub fn eval_at(&self, pos: f64) -> f64 {
        self.poly.eval(pos - self.s_offset)
    }
}

/// A `(sOffset, speed)` record on a lane.  Speed in m/s.
#[derive(Copy, Clone, Debug)]
pub struct SpeedRec {
    pub s_offset: f64,
    pub speed: f64,
}

/// The side of the reference line a lane list belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LaneSide {
    Left,
    Center,
    Right,
}

/// One lane of a lane section.
#[derive(Clone, Debug)]
pub struct Lane {
    /// Signed OpenDRIVE id: 0 centre, negative right, positive left;
    /// adjacency in increasing `|id|`.
    pub id: i32,
    /// OpenDRIVE type string (`"driving"`, `"sidewalk"`, …).
    pub kind: String,
    pub predecessor: Option<i32>,
    pub successor: Option<i32>,
    /// Effective speed resolved by the reshaper; 0 means "use the type
    /// default".
    pub speed: f64,
    pub speeds: Vec<SpeedRec>,
    /// Effective width; `None` when the lane carries no width records.
    pub width: Option<f64>,
    pub widths: Vec<WidthRec>,
}

impl Lane {
    pub fn new(id: i32, kind: &str) -> Self {
        Self {
            id,
            kind: kind.to_string(),
            predecessor: None,
            successor: None,
            speed: 0.0,
            speeds: Vec::new(),
            width: None,
            widths: Vec::new(),
        }
    }
}

/// A range of arclength over which the lane configuration is constant.
#[derive(Clone, Debug, Default)]
pub struct LaneSection {
    /// Start arclength, possibly moved by the reshaper.
    pub s: f64,
    /// Start arclength as parsed.
    pub s_orig: f64,
    pub left: Vec<Lane>,
    pub center: Vec<Lane>,
    pub right: Vec<Lane>,
    /// OpenDRIVE lane id → compact output lane index.
    pub lane_map: BTreeMap<i32, i32>,
    pub right_lane_count: i32,
    pub left_lane_count: i32,
    /// Joined type descriptor per direction (`"driving"` or `"a|b"`).
    pub right_type: String,
    pub left_type: String,
    /// Identifier of the emitted edge covering this section; assigned by the
    /// edge emitter, empty for inner roads.
    pub out_id: String,
}

impl LaneSection {
    pub fn new(s: f64) -> Self {
        Self {
            s,
            s_orig: s,
            ..Default::default()
        }
    }

    pub fn lanes(&self, side: LaneSide) -> &[Lane] {
        match side {
            LaneSide::Left => &self.left,
            LaneSide::Center => &self.center,
            LaneSide::Right => &self.right,
        }
    }

    pub fn lanes_mut(&mut self, side: LaneSide) -> &mut Vec<Lane> {
        match side {
            LaneSide::Left => &mut self.left,
            LaneSide::Center => &mut self.center,
            LaneSide::Right => &mut self.right,
        }
    }
}

// ── Signals and objects ───────────────────────────────────────────────────────

/// A `<signal>` record.
#[derive(Clone, Debug)]
pub struct Signal {
    pub id: String,
    /// Signal type code (`"1000001"` is a traffic light, `"301"`/`"306"`
    /// priority road, `"205"` yield).
    pub kind: String,
    pub name: String,
    /// +1 for positive orientation, −1 for negative.
    pub orientation: i32,
    pub dynamic: bool,
    pub s: f64,
}

/// An `<object>` record, after `repeat` expansion.
#[derive(Clone, Debug)]
pub struct RoadObject {
    pub id: String,
    pub kind: String,
    pub name: String,
    pub s: f64,
    pub t: f64,
    pub width: f64,
    pub length: f64,
    pub radius: f64,
    pub hdg: f64,
}

// ── Connections ───────────────────────────────────────────────────────────────

/// A lane-to-lane connection between two roads.
///
/// Ordering and equality consider only the `(fromEdge, toEdge, fromLane,
/// toLane)` tuple so a `BTreeSet` of connections deduplicates on it; the
/// remaining fields are bookkeeping carried along.
#[derive(Clone, Debug, Default)]
pub struct Connection {
    pub from_edge: String,
    pub to_edge: String,
    pub from_lane: Option<i32>,
    pub to_lane: Option<i32>,
    pub from_cp: Option<ContactPoint>,
    pub to_cp: Option<ContactPoint>,
    /// Synthetic "connect all lanes" marker from an empty junction
    /// `<connection>` element.
    pub all: bool,
    /// Connecting road this connection was flattened through.
    pub orig_id: Option<String>,
    pub orig_lane: Option<i32>,
    /// Interpolated internal shape, when enabled.
    pub shape: Option<PolyLine>,
}

impl Connection {
    fn key(&self) -> (&str, &str, Option<i32>, Option<i32>) {
        (
            &self.from_edge,
            &self.to_edge,
            self.from_lane,
            self.to_lane,
        )
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Connection {}

impl PartialOrd for Connection {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Connection {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

// ── Road ──────────────────────────────────────────────────────────────────────

/// One OpenDRIVE `<road>` with everything the importer consumes.
#[derive(Clone, Debug)]
pub struct Road {
    pub id: String,
    pub street_name: String,
    /// Junction identifier; `"-1"` or empty means the road is *outer*.
    pub junction: String,
    /// Parametric arclength as declared in the file.
    pub length: f64,
    pub geometries: Vec<GeometrySegment>,
    pub elevations: Vec<SCubic>,
    pub offsets: Vec<SCubic>,
    pub sections: Vec<LaneSection>,
    pub links: Vec<Link>,
    pub signals: Vec<Signal>,
    pub objects: Vec<RoadObject>,
    /// Discretised shape, filled by the geometry engine.
    pub geom: PolyLine,
    /// Resolved endpoint nodes, filled by the topology builder.
    pub from_node: Option<String>,
    pub to_node: Option<String>,
    /// Outgoing lane-to-lane connections.
    pub connections: BTreeSet<Connection>,
}

impl Road {
    pub fn new(id: &str, street_name: &str, junction: &str, length: f64) -> Self {
        Self {
            id: id.to_string(),
            street_name: street_name.to_string(),
            junction: junction.to_string(),
            length,
            geometries: Vec::new(),
            elevations: Vec::new(),
            offsets: Vec::new(),
            sections: Vec::new(),
            links: Vec::new(),
            signals: Vec::new(),
            objects: Vec::new(),
            geom: PolyLine::new(),
            from_node: None,
            to_node: None,
            connections: BTreeSet::new(),
        }
    }

    /// Whether this is a connecting road inside a junction.
    pub fn is_inner(&self) -> bool {
        self.junction != NO_JUNCTION && !self.junction.is_empty()
    }

    /// Right-of-way priority for one driving direction, read from signage:
    /// 2 for a priority road (type 301/306), 0 for yield/stop (type 205),
    /// 1 otherwise.  Right-hand edges read signals with positive
    /// orientation, left-hand edges negative.
    pub fn priority(&self, side: LaneSide) -> i32 {
        let mut prio = 1;
        for sig in &self.signals {
            let tmp = match sig.kind.as_str() {
                "301" | "306" => 2,
                "205" => 0,
                _ => 1,
            };
            if tmp != 1 && side == LaneSide::Right && sig.orientation > 0 {
                prio = tmp;
            }
            if tmp != 1 && side == LaneSide::Left && sig.orientation < 0 {
                prio = tmp;
            }
        }
        prio
    }
}

/// The road table plus file-level metadata produced by the parser.
#[derive(Default)]
pub struct ParsedNetwork {
    pub roads: BTreeMap<String, Road>,
    /// `+proj` string extracted from `geoReference`, when present.
    pub proj_string: Option<String>,
}
