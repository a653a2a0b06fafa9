//! Lane-type catalogue.
//!
//! Maps OpenDRIVE lane-type strings (`"driving"`, `"sidewalk"`, …) to the
//! defaults the importer falls back on: speed, width, width quantisation,
//! permission mask, and whether the type is discarded entirely.  The
//! catalogue is read-only during an import run.

use std::collections::HashMap;
use std::ops::{BitAnd, BitOr};

// ── Vehicle classes ───────────────────────────────────────────────────────────

/// Bitmask of vehicle classes permitted on a lane.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehClasses(pub u32);

impl VehClasses {
    pub const NONE: VehClasses = VehClasses(0);
    pub const PASSENGER: VehClasses = VehClasses(1 << 0);
    pub const BUS: VehClasses = VehClasses(1 << 1);
    pub const TRUCK: VehClasses = VehClasses(1 << 2);
    pub const MOTORCYCLE: VehClasses = VehClasses(1 << 3);
    pub const EMERGENCY: VehClasses = VehClasses(1 << 4);
    pub const AUTHORITY: VehClasses = VehClasses(1 << 5);
    pub const BICYCLE: VehClasses = VehClasses(1 << 6);
    pub const PEDESTRIAN: VehClasses = VehClasses(1 << 7);
    pub const TRAM: VehClasses = VehClasses(1 << 8);
    pub const RAIL: VehClasses = VehClasses(1 << 9);

    /// Every motorised road vehicle class.
    pub const VEHICULAR: VehClasses = VehClasses(
        Self::PASSENGER.0
            | Self::BUS.0
            | Self::TRUCK.0
            | Self::MOTORCYCLE.0
            | Self::EMERGENCY.0
            | Self::AUTHORITY.0,
    );

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn intersects(self, other: VehClasses) -> bool {
        self.0 & other.0 != 0
    }

    /// Remove the given classes from the mask.
    #[inline]
    pub fn without(self, other: VehClasses) -> VehClasses {
        VehClasses(self.0 & !other.0)
    }
}

impl BitOr for VehClasses {
    type Output = VehClasses;
    fn bitor(self, rhs: VehClasses) -> VehClasses {
        VehClasses(self.0 | rhs.0)
    }
}

impl BitAnd for VehClasses {
    type Output = VehClasses;
    fn bitand(self, rhs: VehClasses) -> VehClasses {
        VehClasses(self.0 & rhs.0)
    }
}

// ── Per-type defaults ─────────────────────────────────────────────────────────

/// Catalogue entry for one lane-type string.
#[derive(Clone, Debug)]
pub struct LaneTypeSpec {
    /// Default speed in m/s, used when the lane carries no speed record.
    pub speed: f64,
    /// Default lane width in metres.
    pub width: f64,
    /// Width quantisation step in metres; 0 disables quantisation.
    pub width_resolution: f64,
    /// Maximum lane width in metres; 0 disables clamping.
    pub max_width: f64,
    /// Vehicle classes allowed on lanes of this type.
    pub permissions: VehClasses,
    /// Drop lanes of this type from lane mapping (unless overridden by the
    /// `import_all_lanes` option).
    pub discard: bool,
}

impl LaneTypeSpec {
    fn new(speed: f64, width: f64, permissions: VehClasses) -> Self {
        Self {
            speed,
            width,
            width_resolution: 0.0,
            max_width: 0.0,
            permissions,
            discard: false,
        }
    }

    fn discarded() -> Self {
        Self {
            speed: 0.0,
            width: 0.0,
            width_resolution: 0.0,
            max_width: 0.0,
            permissions: VehClasses::NONE,
            discard: true,
        }
    }
}

// ── Catalogue ─────────────────────────────────────────────────────────────────

/// Read-only mapping from lane-type strings to [`LaneTypeSpec`]s.
///
/// Unknown types fall back to the default entry (an urban driving lane).
/// [`LaneTypeCatalog::with_defaults`] seeds the OpenDRIVE lane types the
/// importer commonly encounters; callers may override or extend entries
/// before the run starts.
#[derive(Clone, Debug)]
pub struct LaneTypeCatalog {
    default: LaneTypeSpec,
    types: HashMap<String, LaneTypeSpec>,
}

impl LaneTypeCatalog {
    /// An empty catalogue: nothing is known, everything inherits the default.
    pub fn new(default: LaneTypeSpec) -> Self {
        Self {
            default,
            types: HashMap::new(),
        }
    }

    /// Catalogue seeded with conservative urban defaults for the common
    /// OpenDRIVE lane types.
    pub fn with_defaults() -> Self {
        let mut cat = Self::new(LaneTypeSpec::new(13.89, 3.65, VehClasses::VEHICULAR));
        let driving = LaneTypeSpec::new(13.89, 3.65, VehClasses::VEHICULAR);
        for t in ["driving", "bidirectional", "entry", "exit", "onRamp", "offRamp"] {
            cat.insert(t, driving.clone());
        }
        cat.insert(
            "stop",
            LaneTypeSpec::new(13.89, 3.0, VehClasses::EMERGENCY | VehClasses::AUTHORITY),
        );
        cat.insert(
            "shoulder",
            LaneTypeSpec::new(13.89, 2.0, VehClasses::EMERGENCY | VehClasses::AUTHORITY),
        );
        cat.insert("parking", LaneTypeSpec::new(1.39, 2.5, VehClasses::PASSENGER));
        cat.insert("biking", LaneTypeSpec::new(5.56, 1.5, VehClasses::BICYCLE));
        cat.insert("sidewalk", LaneTypeSpec::new(1.39, 2.0, VehClasses::PEDESTRIAN));
        cat.insert("tram", LaneTypeSpec::new(13.89, 3.0, VehClasses::TRAM));
        cat.insert("rail", LaneTypeSpec::new(33.3, 4.0, VehClasses::RAIL));
        for t in ["none", "border", "median", "restricted", "curb"] {
            cat.insert(t, LaneTypeSpec::discarded());
        }
        cat
    }

    /// Insert or replace an entry.
    pub fn insert(&mut self, lane_type: &str, spec: LaneTypeSpec) {
        self.types.insert(lane_type.to_string(), spec);
    }

    /// Whether the catalogue carries an explicit entry for this type.
    pub fn knows(&self, lane_type: &str) -> bool {
        self.types.contains_key(lane_type)
    }

    /// Entry for `lane_type`, falling back to the default entry.
    pub fn spec(&self, lane_type: &str) -> &LaneTypeSpec {
        self.types.get(lane_type).unwrap_or(&self.default)
    }

    pub fn speed(&self, lane_type: &str) -> f64 {
        self.spec(lane_type).speed
    }

    pub fn width(&self, lane_type: &str) -> f64 {
        self.spec(lane_type).width
    }

    pub fn width_resolution(&self, lane_type: &str) -> f64 {
        self.spec(lane_type).width_resolution
    }

    pub fn max_width(&self, lane_type: &str) -> f64 {
        self.spec(lane_type).max_width
    }

    pub fn permissions(&self, lane_type: &str) -> VehClasses {
        self.spec(lane_type).permissions
    }

    pub fn discarded(&self, lane_type: &str) -> bool {
        self.spec(lane_type).discard
    }
}

impl Default for LaneTypeCatalog {
    fn default() -> Self {
        Self::with_defaults()
    }
}
