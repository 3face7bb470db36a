//! # Force, Deflection and Stress
//!
//! The linear spring law `F = k·x` plus the stress at each location of the
//! spring. Compression springs cannot deflect past solid height, so a load
//! beyond `Lo - Ls` is clamped and the force re-derived from the clamped
//! deflection.
//!
//! Stresses are linear in the force, so a requested stress is turned into a
//! force, sent through the force path, and re-evaluated if clamping changed
//! the force.
//!
//! Units follow the variant: mm and N for compression/extension, degrees
//! and N·mm for torsion springs.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::SolvedSpring;
use crate::equations::spring;
use crate::errors::{SpringError, SpringResult};
use crate::params::HookGeometry;
use crate::variant::{RateLaw, StressLocation};

/// Passes of the stress→force→stress fixed point
const STRESS_ITERATIONS: usize = 2;

/// Smallest hook index C1 = 2·Ra/d (exclusive)
const MIN_HOOK_BENDING_INDEX: f64 = 1.0;

/// Smallest hook index C2 = 2·Rb/d (exclusive)
const MIN_HOOK_TORSION_INDEX: f64 = 4.0;

/// A load given either as a deflection or as a force
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Load {
    Deflection(f64),
    Force(f64),
}

/// Resolved point on the force/deflection line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceResult {
    /// N (torsion: N·mm)
    pub force: f64,
    /// mm (torsion: deg)
    pub deflection: f64,
    /// The requested load went past solid height and was reduced
    pub clamped: bool,
}

/// A stress request, either from a force or as a target stress ratio
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StressInput {
    Force(f64),
    /// Ratio of the minimum tensile strength
    Stress(f64),
}

/// Stress at one location with the load that produces it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressResult {
    pub location: StressLocation,
    /// Stress as a ratio of Sut
    pub ratio: f64,
    pub stress_mpa: f64,
    pub force: f64,
    pub deflection: f64,
    pub clamped: bool,
    /// Extension springs: hook bending stress ratio at the same force
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_a_ratio: Option<f64>,
    /// Extension springs: hook torsion stress ratio at the same force
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_b_ratio: Option<f64>,
}

fn finite(field: &str, value: f64) -> SpringResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SpringError::invalid_value(field, value.to_string(), "must be a finite number"))
    }
}

/// Apply `F = k·x` to a deflection or a force.
///
/// # Example
///
/// ```rust
/// # use spring_core::calculations::{force_or_deflection, Load, SolvedSpring};
/// # use spring_core::config::Fixing;
/// # use spring_core::params::HookGeometry;
/// # use spring_core::variant::Variant;
/// let spring = SolvedSpring {
///     variant: Variant::Compression,
///     fixing: Fixing::FixPivot,
///     d_mm: 1.0, dm_mm: 9.0, c: 9.0, lo_mm: 20.0, ls_mm: 8.0,
///     k: 2.0, fn_hz: 150.0,
///     hooks: HookGeometry::None,
/// };
/// let result = force_or_deflection(&spring, Load::Deflection(20.0)).unwrap();
/// assert!(result.clamped);
/// assert_eq!(result.deflection, 12.0);
/// assert_eq!(result.force, 24.0);
/// ```
pub fn force_or_deflection(spring: &SolvedSpring, load: Load) -> SpringResult<ForceResult> {
    let requested = match load {
        Load::Deflection(x) => finite("deflection", x)?,
        Load::Force(f) => finite("force", f)? / spring.k,
    };

    let (deflection, clamped) = match spring.max_deflection() {
        Some(max) if requested > max => {
            warn!(requested, max, "deflection past solid height, clamped");
            (max, true)
        }
        _ => (requested, false),
    };

    let force = match load {
        Load::Force(f) if !clamped => f,
        _ => spring.k * deflection,
    };

    Ok(ForceResult {
        force,
        deflection,
        clamped,
    })
}

/// Stress ratio per unit force at `location`
fn stress_per_unit(
    spring: &SolvedSpring,
    sut_mpa: f64,
    location: StressLocation,
) -> SpringResult<f64> {
    let profile = spring.variant.profile();
    if !profile.has_location(location) {
        return Err(SpringError::unsupported(
            format!("stress at {}", location.display_name()),
            spring.variant.code(),
        ));
    }

    let (d, dm) = (spring.d_mm, spring.dm_mm);
    match location {
        StressLocation::Body => Ok(match profile.rate {
            RateLaw::Helical => spring::body_shear_per_unit(d, dm, sut_mpa),
            RateLaw::Torsion => spring::torsion_bending_per_unit(d, spring.c, sut_mpa),
        }),
        StressLocation::HookA => {
            let ra = hook_radius(spring, location)?;
            let c1 = 2.0 * ra / d;
            if c1 <= MIN_HOOK_BENDING_INDEX {
                return Err(SpringError::invalid_value(
                    "Ra",
                    ra.to_string(),
                    format!(
                        "hook index C1 = 2*Ra/d = {:.3} must be greater than {}",
                        c1, MIN_HOOK_BENDING_INDEX
                    ),
                ));
            }
            Ok(spring::hook_bending_per_unit(d, dm, ra, sut_mpa))
        }
        StressLocation::HookB => {
            let rb = hook_radius(spring, location)?;
            let c2 = 2.0 * rb / d;
            if c2 <= MIN_HOOK_TORSION_INDEX {
                return Err(SpringError::invalid_value(
                    "Rb",
                    rb.to_string(),
                    format!(
                        "hook index C2 = 2*Rb/d = {:.3} must be greater than {}",
                        c2, MIN_HOOK_TORSION_INDEX
                    ),
                ));
            }
            Ok(spring::hook_torsion_per_unit(d, dm, rb, sut_mpa))
        }
    }
}

fn hook_radius(spring: &SolvedSpring, location: StressLocation) -> SpringResult<f64> {
    match (spring.hooks, location) {
        (HookGeometry::Extension { ra_mm, .. }, StressLocation::HookA) => Ok(ra_mm),
        (HookGeometry::Extension { rb_mm, .. }, StressLocation::HookB) => Ok(rb_mm),
        _ => Err(SpringError::internal(format!(
            "no hook geometry for {} on a {} spring",
            location,
            spring.variant
        ))),
    }
}

/// Stress at one location, from a force or a target stress ratio
pub fn stress_at(
    spring: &SolvedSpring,
    sut_mpa: f64,
    location: StressLocation,
    input: StressInput,
) -> SpringResult<StressResult> {
    let per_unit = stress_per_unit(spring, sut_mpa, location)?;

    let path = match input {
        StressInput::Force(f) => force_or_deflection(spring, Load::Force(f))?,
        StressInput::Stress(s) => {
            let target = finite("stress", s)? / per_unit;
            let mut path = force_or_deflection(spring, Load::Force(target))?;
            let mut clamped = path.clamped;
            for _ in 1..STRESS_ITERATIONS {
                if !path.clamped {
                    break;
                }
                path = force_or_deflection(spring, Load::Force(path.force))?;
                clamped = true;
            }
            ForceResult { clamped, ..path }
        }
    };

    let ratio = match input {
        StressInput::Stress(s) if !path.clamped => s,
        _ => path.force * per_unit,
    };

    Ok(StressResult {
        location,
        ratio,
        stress_mpa: ratio * sut_mpa,
        force: path.force,
        deflection: path.deflection,
        clamped: path.clamped,
        hook_a_ratio: None,
        hook_b_ratio: None,
    })
}

/// Body stress; extension springs also report both hook stresses at the
/// same force
pub fn stress(
    spring: &SolvedSpring,
    sut_mpa: f64,
    input: StressInput,
) -> SpringResult<StressResult> {
    let mut result = stress_at(spring, sut_mpa, StressLocation::Body, input)?;
    let profile = spring.variant.profile();
    if profile.has_location(StressLocation::HookA) {
        let per_unit = stress_per_unit(spring, sut_mpa, StressLocation::HookA)?;
        result.hook_a_ratio = Some(result.force * per_unit);
    }
    if profile.has_location(StressLocation::HookB) {
        let per_unit = stress_per_unit(spring, sut_mpa, StressLocation::HookB)?;
        result.hook_b_ratio = Some(result.force * per_unit);
    }
    Ok(result)
}
