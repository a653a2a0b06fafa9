//! Clothoid (Euler spiral) sampling kernel.
//!
//! The canonical clothoid starts at the origin with heading 0 and zero
//! curvature; curvature grows linearly with arclength at rate `c_dot`.  Its
//! coordinates are the Fresnel integrals
//!
//! ```text
//! x(s) = ∫₀ˢ cos(c_dot·u²/2) du
//! y(s) = ∫₀ˢ sin(c_dot·u²/2) du
//! ```
//!
//! and the tangent angle is closed-form: `t(s) = c_dot·s²/2`.  A spiral
//! segment with non-zero start curvature is a sub-range of this canonical
//! curve; the geometry engine samples it here and then rigidly places the
//! result at the segment's start pose.
//!
//! The integrals are evaluated with composite Simpson quadrature at a fixed
//! sub-metre step, which is orders of magnitude below the importer's
//! discretisation error budget.

/// Integration step for the Fresnel quadrature, metres of arclength.
const KERNEL_STEP: f64 = 0.05;

/// Point and tangent of the canonical clothoid at arclength `s`.
///
/// Negative `s` walks the curve backwards (the odd symmetry of the
/// integrands is handled by the quadrature itself).
pub fn clothoid_at(s: f64, c_dot: f64) -> (f64, f64, f64) {
    let (x, y) = fresnel(s, c_dot);
    let t = 0.5 * c_dot * s * s;
    (x, y, t)
}

/// Composite Simpson evaluation of the two Fresnel integrals from 0 to `s`.
fn fresnel(s: f64, c_dot: f64) -> (f64, f64) {
    if s == 0.0 {
        return (0.0, 0.0);
    }
    let span = s.abs();
    // even number of sub-intervals for Simpson's rule
    let mut n = (span / KERNEL_STEP).ceil() as usize;
    n += n % 2;
    let n = n.max(2);
    let h = s / n as f64;

    let theta = |u: f64| 0.5 * c_dot * u * u;
    let mut sum_cos = theta(0.0).cos() + theta(s).cos();
    let mut sum_sin = theta(0.0).sin() + theta(s).sin();
    for i in 1..n {
        let u = i as f64 * h;
        let w = if i % 2 == 1 { 4.0 } else { 2.0 };
        sum_cos += w * theta(u).cos();
        sum_sin += w * theta(u).sin();
    }
    (sum_cos * h / 3.0, sum_sin * h / 3.0)
}

#[cfg(test)]
mod tests {
    use super::clothoid_at;

    #[test]
    fn zero_arclength_is_origin() {
        let (x, y, t) = clothoid_at(0.0, 0.1);
        assert_eq!((x, y, t), (0.0, 0.0, 0.0));
    }

    #[test]
    fn tangent_is_closed_form() {
        let (_, _, t) = clothoid_at(10.0, 0.02);
        assert!((t - 0.5 * 0.02 * 100.0).abs() < 1e-12);
    }

    #[test]
    fn small_curvature_approaches_straight_line() {
        let (x, y, _) = clothoid_at(10.0, 1e-9);
        assert!((x - 10.0).abs() < 1e-6);
        assert!(y.abs() < 1e-6);
    }

    #[test]
    fn symmetry_under_negated_rate() {
        let (x1, y1, _) = clothoid_at(20.0, 0.01);
        let (x2, y2, _) = clothoid_at(20.0, -0.01);
        assert!((x1 - x2).abs() < 1e-9);
        assert!((y1 + y2).abs() < 1e-9);
    }

    #[test]
    fn matches_series_for_moderate_input() {
        // x(s) ≈ s − (c_dot²·s⁵)/40 for small c_dot·s²
        let c_dot = 0.01;
        let s = 5.0;
        let (x, _, _) = clothoid_at(s, c_dot);
        let series = s - c_dot * c_dot * s.powi(5) / 40.0;
        assert!((x - series).abs() < 1e-4);
    }
}
