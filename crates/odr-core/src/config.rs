//! Importer configuration.
//!
//! The original option surface (`opendrive.*`) becomes one immutable value
//! threaded through the core; there is no process-wide state.

/// All options consumed by the importer core.
#[derive(Clone, Debug)]
pub struct ImportConfig {
    /// Keep lanes whose type is unknown to the catalogue or marked as
    /// discarded.  When `false` such lanes are dropped from lane mapping.
    pub import_all_lanes: bool,

    /// Ignore per-lane width records; lane widths then always come from the
    /// type catalogue.
    pub ignore_widths: bool,

    /// Minimum usable lane width in metres.  Enables the minimum-width
    /// section splitting pass and the narrow-lane permission downgrade.
    /// Zero disables both.
    pub min_width: f64,

    /// Synthesize interpolated internal shapes for flattened junction
    /// connections.
    pub internal_shapes: bool,

    /// Discretisation step for curved geometry, in metres.  Also the default
    /// spacing for `repeat` object series.
    pub curve_resolution: f64,

    /// When set, vertices closer than this to their predecessor are removed
    /// after geometry concatenation.
    pub geometry_min_dist: Option<f64>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            import_all_lanes: false,
            ignore_widths: false,
            min_width: 1.8,
            internal_shapes: false,
            curve_resolution: 2.0,
            geometry_min_dist: None,
        }
    }
}
