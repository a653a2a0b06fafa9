//! Planar geometry primitives used throughout the importer.
//!
//! All coordinates are cartesian metres (`f64`), angles are radians.  The
//! polyline type deliberately mirrors the operations the importer needs —
//! 2-D arclength walking, sub-range extraction, orthogonal side-shifting —
//! rather than being a general computational-geometry kit.

use crate::{CoreError, CoreResult};

/// Two points closer than this are treated as the same vertex.
pub const POSITION_EPS: f64 = 0.1;

/// Tolerance for arithmetic comparisons (arclength accumulation etc.).
pub const NUMERICAL_EPS: f64 = 0.001;

// ── Point ─────────────────────────────────────────────────────────────────────

/// A cartesian point in metres.  `z` is elevation and defaults to 0.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    #[inline]
    pub fn new3(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance ignoring `z`.
    #[inline]
    pub fn distance2d(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Full 3-D euclidean distance.
    #[inline]
    pub fn distance(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Whether the 2-D distance to `other` is within `eps`.
    #[inline]
    pub fn almost_same(self, other: Point) -> bool {
        self.distance2d(other) <= POSITION_EPS
    }

    #[inline]
    pub fn add(&mut self, dx: f64, dy: f64, dz: f64) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }

    /// Rotate about the origin in the x/y plane.
    #[inline]
    pub fn rotate2d(self, angle: f64) -> Point {
        let (sin, cos) = angle.sin_cos();
        Point {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
            z: self.z,
        }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2},{:.2},{:.2})", self.x, self.y, self.z)
    }
}

// ── Cubic ─────────────────────────────────────────────────────────────────────

/// Cubic polynomial `a + b·ds + c·ds² + d·ds³`.
///
/// Used for elevation, lateral lane offset, and per-lane width, each as a
/// function of arclength relative to the record's anchor.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cubic {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Cubic {
    #[inline]
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self { a, b, c, d }
    }

    /// Evaluate at `ds` (arclength past the anchor).
    #[inline]
    pub fn eval(self, ds: f64) -> f64 {
        self.a + self.b * ds + self.c * ds * ds + self.d * ds * ds * ds
    }

    /// A cubic whose curvature terms are zero contributes nothing beyond a
    /// straight-line interpolation.
    #[inline]
    pub fn is_linear(self) -> bool {
        self.c == 0.0 && self.d == 0.0
    }
}

// ── Bounds ────────────────────────────────────────────────────────────────────

/// 2-D axis-aligned bounding box, grown point by point.
#[derive(Copy, Clone, Debug)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn empty() -> Self {
        Self {
            min_x: f64::MAX,
            min_y: f64::MAX,
            max_x: f64::MIN,
            max_y: f64::MIN,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x
    }

    pub fn add_point(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    pub fn add_bounds(&mut self, other: &Bounds) {
        if !other.is_empty() {
            self.min_x = self.min_x.min(other.min_x);
            self.min_y = self.min_y.min(other.min_y);
            self.max_x = self.max_x.max(other.max_x);
            self.max_y = self.max_y.max(other.max_y);
        }
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::empty()
    }
}

// ── PolyLine ──────────────────────────────────────────────────────────────────

/// An ordered sequence of vertices describing a road's discretised shape.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolyLine(pub Vec<Point>);

impl PolyLine {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<Point> {
        self.0.first().copied()
    }

    pub fn last(&self) -> Option<Point> {
        self.0.last().copied()
    }

    pub fn push(&mut self, p: Point) {
        self.0.push(p);
    }

    /// Append `p` unless it coincides with the current last vertex.
    pub fn push_no_double(&mut self, p: Point) {
        match self.0.last() {
            Some(last) if last.almost_same(p) => {}
            _ => self.0.push(p),
        }
    }

    pub fn pop(&mut self) -> Option<Point> {
        self.0.pop()
    }

    /// Append all vertices of `other`.
    pub fn append(&mut self, other: &PolyLine) {
        self.0.extend_from_slice(&other.0);
    }

    pub fn reversed(&self) -> PolyLine {
        let mut v = self.0.clone();
        v.reverse();
        PolyLine(v)
    }

    /// Total 2-D arclength.
    pub fn length2d(&self) -> f64 {
        self.0
            .windows(2)
            .map(|w| w[0].distance2d(w[1]))
            .sum()
    }

    /// Total 3-D arclength.
    pub fn length(&self) -> f64 {
        self.0.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    /// 2-D bounding box over all vertices.
    pub fn bounds(&self) -> Bounds {
        let mut b = Bounds::empty();
        for &p in &self.0 {
            b.add_point(p);
        }
        b
    }

    /// Translate every vertex.
    pub fn shift(&mut self, dx: f64, dy: f64, dz: f64) {
        for p in &mut self.0 {
            p.add(dx, dy, dz);
        }
    }

    /// Rotate every vertex about the origin in the x/y plane.
    pub fn rotate2d(&mut self, angle: f64) {
        for p in &mut self.0 {
            *p = p.rotate2d(angle);
        }
    }

    /// Interpolated point at 2-D arclength `offset`, clamped to the ends.
    ///
    /// `z` is interpolated linearly along each segment.
    pub fn position_at_offset2d(&self, offset: f64) -> Option<Point> {
        if self.0.is_empty() {
            return None;
        }
        if self.0.len() == 1 || offset <= 0.0 {
            return self.first();
        }
        let mut walked = 0.0;
        for w in self.0.windows(2) {
            let seg = w[0].distance2d(w[1]);
            if walked + seg >= offset {
                if seg == 0.0 {
                    return Some(w[0]);
                }
                let t = (offset - walked) / seg;
                return Some(Point::new3(
                    w[0].x + (w[1].x - w[0].x) * t,
                    w[0].y + (w[1].y - w[0].y) * t,
                    w[0].z + (w[1].z - w[0].z) * t,
                ));
            }
            walked += seg;
        }
        self.last()
    }

    /// Interpolated point at 3-D arclength `offset`, clamped to the ends.
    pub fn position_at_offset(&self, offset: f64) -> Option<Point> {
        if self.0.is_empty() {
            return None;
        }
        if self.0.len() == 1 || offset <= 0.0 {
            return self.first();
        }
        let mut walked = 0.0;
        for w in self.0.windows(2) {
            let seg = w[0].distance(w[1]);
            if walked + seg >= offset {
                if seg == 0.0 {
                    return Some(w[0]);
                }
                let t = (offset - walked) / seg;
                return Some(Point::new3(
                    w[0].x + (w[1].x - w[0].x) * t,
                    w[0].y + (w[1].y - w[0].y) * t,
                    w[0].z + (w[1].z - w[0].z) * t,
                ));
            }
            walked += seg;
        }
        self.last()
    }

    /// Extract the sub-polyline between 2-D arclengths `begin` and `end`.
    ///
    /// Both bounds are clamped to the polyline's extent.  Interior vertices
    /// strictly inside the range are kept; interpolated vertices are added at
    /// the cut positions.
    pub fn subpart2d(&self, begin: f64, end: f64) -> PolyLine {
        let mut ret = PolyLine::new();
        if self.0.len() < 2 {
            return self.clone();
        }
        if let Some(p) = self.position_at_offset2d(begin.max(0.0)) {
            ret.push_no_double(p);
        }
        let mut walked = 0.0;
        for i in 1..self.0.len() - 1 {
            walked += self.0[i - 1].distance2d(self.0[i]);
            if begin < walked && end > walked {
                ret.push_no_double(self.0[i]);
            }
        }
        if let Some(p) = self.position_at_offset2d(end) {
            ret.push_no_double(p);
        }
        // A zero-width cut still yields a usable two-point result.
        if ret.len() == 1 {
            ret.push(ret.0[0]);
        }
        ret
    }

    /// Index of the vertex closest to `p` (2-D distance).
    pub fn index_of_closest(&self, p: Point) -> usize {
        let mut best = 0;
        let mut best_dist = f64::MAX;
        for (i, &q) in self.0.iter().enumerate() {
            let d = p.distance2d(q);
            if d < best_dist {
                best_dist = d;
                best = i;
            }
        }
        best
    }

    /// Insert `p` on the segment it projects onto, keeping vertex order.
    pub fn insert_at_closest(&mut self, p: Point) {
        if self.0.len() < 2 {
            self.0.push(p);
            return;
        }
        let mut best_seg = 0;
        let mut best_dist = f64::MAX;
        for i in 0..self.0.len() - 1 {
            let d = dist_point_segment2d(p, self.0[i], self.0[i + 1]);
            if d < best_dist {
                best_dist = d;
                best_seg = i;
            }
        }
        self.0.insert(best_seg + 1, p);
    }

    /// Drop vertices closer than `min_dist` to their predecessor.  The first
    /// and last vertex are always kept.
    pub fn remove_double_points(&mut self, min_dist: f64) {
        if self.0.len() < 3 {
            return;
        }
        let last = self.0.len() - 1;
        let mut kept: Vec<Point> = Vec::with_capacity(self.0.len());
        kept.push(self.0[0]);
        for (i, &p) in self.0.iter().enumerate().skip(1) {
            if i == last || kept.last().unwrap().distance2d(p) >= min_dist {
                kept.push(p);
            }
        }
        self.0 = kept;
    }

    /// Shift the whole polyline orthogonally by `amount` metres.
    ///
    /// Positive amounts move toward the right-hand side of the direction of
    /// travel.  Fails on polylines shorter than two vertices or when adjacent
    /// segments fold back onto each other.
    pub fn move2side(&mut self, amount: f64) -> CoreResult<()> {
        let amounts = vec![amount; self.0.len()];
        self.move2side_each(&amounts)
    }

    /// Like [`move2side`](Self::move2side) with a per-vertex amount.
    pub fn move2side_each(&mut self, amounts: &[f64]) -> CoreResult<()> {
        if self.0.len() < 2 {
            return Err(CoreError::TooFewPoints);
        }
        assert_eq!(amounts.len(), self.0.len());
        let n = self.0.len();
        let mut shifted: Vec<Point> = Vec::with_capacity(n);
        for i in 0..n {
            let amount = amounts[i];
            if i == 0 {
                shifted.push(offset_point(self.0[0], self.0[0], self.0[1], amount)?);
            } else if i == n - 1 {
                shifted.push(offset_point(self.0[n - 1], self.0[n - 2], self.0[n - 1], amount)?);
            } else {
                shifted.push(offset_vertex(
                    self.0[i - 1],
                    self.0[i],
                    self.0[i + 1],
                    amount,
                )?);
            }
        }
        self.0 = shifted;
        Ok(())
    }
}

impl std::ops::Index<usize> for PolyLine {
    type Output = Point;
    fn index(&self, i: usize) -> &Point {
        &self.0[i]
    }
}

impl std::ops::IndexMut<usize> for PolyLine {
    fn index_mut(&mut self, i: usize) -> &mut Point {
        &mut self.0[i]
    }
}

impl FromIterator<Point> for PolyLine {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        PolyLine(iter.into_iter().collect())
    }
}

// ── Side-shift helpers ────────────────────────────────────────────────────────

/// Unit normal of segment `from → to`, pointing to the right of travel.
fn segment_normal(from: Point, to: Point) -> CoreResult<(f64, f64)> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1e-12 {
        return Err(CoreError::Degenerate("zero-length segment".into()));
    }
    Ok((dy / len, -dx / len))
}

/// Shift `p` by `amount` along the normal of segment `from → to`.
fn offset_point(p: Point, from: Point, to: Point, amount: f64) -> CoreResult<Point> {
    let (nx, ny) = segment_normal(from, to)?;
    Ok(Point::new3(p.x + nx * amount, p.y + ny * amount, p.z))
}

/// Shift an interior vertex with a miter join of the two adjacent segments.
fn offset_vertex(prev: Point, cur: Point, next: Point, amount: f64) -> CoreResult<Point> {
    let (n1x, n1y) = segment_normal(prev, cur)?;
    let (n2x, n2y) = segment_normal(cur, next)?;
    let dot = n1x * n2x + n1y * n2y;
    if dot < -0.999 {
        // the segments reverse direction; no consistent offset exists
        return Err(CoreError::Degenerate("reversing segments".into()));
    }
    // miter vector: offsets both adjacent segments by exactly `amount`
    let mx = (n1x + n2x) / (1.0 + dot);
    let my = (n1y + n2y) / (1.0 + dot);
    Ok(Point::new3(cur.x + mx * amount, cur.y + my * amount, cur.z))
}

/// 2-D distance from `p` to the segment `a → b`.
fn dist_point_segment2d(p: Point, a: Point, b: Point) -> f64 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len2 = abx * abx + aby * aby;
    if len2 == 0.0 {
        return p.distance2d(a);
    }
    let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / len2).clamp(0.0, 1.0);
    p.distance2d(Point::new(a.x + abx * t, a.y + aby * t))
}
