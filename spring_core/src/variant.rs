//! # Spring Variants
//!
//! Compression, extension and torsion springs share one parameter model and
//! one solver. What differs between them is captured as data in a
//! [`VariantProfile`]: the rate law appended to the equation system, the
//! locations where stress is evaluated, the fatigue allowables, the kind of
//! auxiliary geometry, and a few behavioral switches.
//!
//! ## Example
//!
//! ```rust
//! use spring_core::variant::{StressLocation, Variant};
//!
//! let profile = Variant::Extension.profile();
//! assert!(!profile.clamps_to_solid);
//! assert_eq!(
//!     profile.stress_locations,
//!     &[StressLocation::Body, StressLocation::HookA, StressLocation::HookB]
//! );
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{Ending, Fixing};
use crate::equations::Equation;
use crate::errors::{SpringError, SpringResult};
use crate::materials::FatigueGroup;

/// Spring variant, fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Compression,
    Extension,
    Torsion,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Compression, Variant::Extension, Variant::Torsion];

    pub fn code(&self) -> &'static str {
        match self {
            Variant::Compression => "compression",
            Variant::Extension => "extension",
            Variant::Torsion => "torsion",
        }
    }

    /// Parse from common string representations
    pub fn from_str_flexible(s: &str) -> SpringResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "compression" | "comp" => Ok(Variant::Compression),
            "extension" | "ext" | "tension" => Ok(Variant::Extension),
            "torsion" | "tor" => Ok(Variant::Torsion),
            _ => Err(SpringError::invalid_option("variant", s, &Self::ALL.map(|v| v.code()))),
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Variant::Compression => "Helical compression spring",
            Variant::Extension => "Helical extension spring",
            Variant::Torsion => "Helical torsion spring",
        }
    }

    /// Capability table row for this variant
    pub fn profile(&self) -> &'static VariantProfile {
        match self {
            Variant::Compression => &COMPRESSION,
            Variant::Extension => &EXTENSION,
            Variant::Torsion => &TORSION,
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Where a stress is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StressLocation {
    /// Coil body (shear for compression/extension, bending for torsion)
    Body,
    /// Extension hook, bending at point A
    HookA,
    /// Extension hook, torsion at point B
    HookB,
}

impl StressLocation {
    pub fn code(&self) -> &'static str {
        match self {
            StressLocation::Body => "body",
            StressLocation::HookA => "hook-a",
            StressLocation::HookB => "hook-b",
        }
    }

    pub fn from_str_flexible(s: &str) -> SpringResult<Self> {
        match s.trim().to_lowercase().replace([' ', '_'], "-").as_str() {
            "body" => Ok(StressLocation::Body),
            "hook-a" | "a" => Ok(StressLocation::HookA),
            "hook-b" | "b" => Ok(StressLocation::HookB),
            _ => Err(SpringError::invalid_option("location", s, &["body", "hook-a", "hook-b"])),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            StressLocation::Body => "Body",
            StressLocation::HookA => "Hook A (bending)",
            StressLocation::HookB => "Hook B (torsion)",
        }
    }
}

impl std::fmt::Display for StressLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Rate law appended to the core equation system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLaw {
    /// Axial rate, k = G·d⁴/(8·Na·DM³) in N/mm
    Helical,
    /// Angular rate including legs, N·mm/deg
    Torsion,
}

impl RateLaw {
    pub fn equation(&self) -> Equation {
        match self {
            RateLaw::Helical => Equation::HelicalRate,
            RateLaw::Torsion => Equation::TorsionRate,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            RateLaw::Helical => "N/mm",
            RateLaw::Torsion => "N*mm/deg",
        }
    }
}

/// Auxiliary geometry carried by the variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    None,
    Hooks,
    Legs,
}

/// Cycle counts with tabulated fatigue allowables
pub const FATIGUE_CYCLES: [f64; 3] = [1e5, 1e6, 1e7];

/// Allowable stress ratios for one location, indexed like [`FATIGUE_CYCLES`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FatigueRow {
    pub location: StressLocation,
    pub carbon: [Option<f64>; 3],
    pub alloy: [Option<f64>; 3],
}

impl FatigueRow {
    pub fn ratios(&self, group: FatigueGroup) -> &[Option<f64>; 3] {
        match group {
            FatigueGroup::Carbon => &self.carbon,
            FatigueGroup::Alloy => &self.alloy,
        }
    }
}

/// Per-variant behavior
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariantProfile {
    pub variant: Variant,
    pub rate: RateLaw,
    /// Stress locations, body first
    pub stress_locations: &'static [StressLocation],
    pub fatigue: &'static [FatigueRow],
    pub hook_kind: HookKind,
    /// Deflection limited to `Lo - Ls`
    pub clamps_to_solid: bool,
    pub buckling_applies: bool,
    /// Coils wound tight: `gap = 0`
    pub zero_gap: bool,
    /// Ending and fixing that always apply, whatever was requested
    pub pinned: Option<(Ending, Fixing)>,
}

impl VariantProfile {
    /// Apply the pinned configuration, reporting whether anything changed
    pub fn pin(&self, ending: Ending, fixing: Fixing) -> (Ending, Fixing, bool) {
        match self.pinned {
            Some((e, f)) => (e, f, e != ending || f != fixing),
            None => (ending, fixing, false),
        }
    }

    pub fn fatigue_row(&self, location: StressLocation) -> Option<&'static FatigueRow> {
        self.fatigue.iter().find(|row| row.location == location)
    }

    pub fn has_location(&self, location: StressLocation) -> bool {
        self.stress_locations.contains(&location)
    }
}

const fn row(
    location: StressLocation,
    carbon: [Option<f64>; 3],
    alloy: [Option<f64>; 3],
) -> FatigueRow {
    FatigueRow { location, carbon, alloy }
}

static COMPRESSION_FATIGUE: [FatigueRow; 1] = [row(
    StressLocation::Body,
    [Some(0.36), Some(0.33), Some(0.30)],
    [Some(0.42), Some(0.40), Some(0.38)],
)];

static EXTENSION_FATIGUE: [FatigueRow; 3] = [
    row(
        StressLocation::Body,
        [Some(0.36), Some(0.33), Some(0.30)],
        [Some(0.36), Some(0.33), Some(0.30)],
    ),
    row(
        StressLocation::HookA,
        [Some(0.51), Some(0.47), Some(0.45)],
        [Some(0.51), Some(0.47), Some(0.45)],
    ),
    row(
        StressLocation::HookB,
        [Some(0.34), Some(0.30), Some(0.28)],
        [Some(0.34), Some(0.30), Some(0.28)],
    ),
];

// No 1e7 data for torsion springs.
static TORSION_FATIGUE: [FatigueRow; 1] = [row(
    StressLocation::Body,
    [Some(0.53), Some(0.50), None],
    [Some(0.55), Some(0.53), None],
)];

static COMPRESSION: VariantProfile = VariantProfile {
    variant: Variant::Compression,
    rate: RateLaw::Helical,
    stress_locations: &[StressLocation::Body],
    fatigue: &COMPRESSION_FATIGUE,
    hook_kind: HookKind::None,
    clamps_to_solid: true,
    buckling_applies: true,
    zero_gap: false,
    pinned: None,
};

static EXTENSION: VariantProfile = VariantProfile {
    variant: Variant::Extension,
    rate: RateLaw::Helical,
    stress_locations: &[StressLocation::Body, StressLocation::HookA, StressLocation::HookB],
    fatigue: &EXTENSION_FATIGUE,
    hook_kind: HookKind::Hooks,
    clamps_to_solid: false,
    buckling_applies: false,
    zero_gap: true,
    pinned: Some((Ending::Open, Fixing::BothPivot)),
};

static TORSION: VariantProfile = VariantProfile {
    variant: Variant::Torsion,
    rate: RateLaw::Torsion,
    stress_locations: &[StressLocation::Body],
    fatigue: &TORSION_FATIGUE,
    hook_kind: HookKind::Legs,
    clamps_to_solid: false,
    buckling_applies: false,
    zero_gap: true,
    pinned: Some((Ending::Open, Fixing::BothPivot)),
};
