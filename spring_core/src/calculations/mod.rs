//! # Spring Calculations
//!
//! Operations on a spring once its parameters are resolved. Each
//! calculation follows the pattern:
//!
//! - plain input enums/values (JSON-serializable)
//! - `*Result` / `*Check` structs (JSON-serializable)
//! - pure functions returning `SpringResult<_>`
//!
//! ## Available Calculations
//!
//! - [`force`] - Force/deflection law and stress at each location
//! - [`verify`] - Spring index, buckling, fatigue and static stress checks

pub mod force;
pub mod verify;

use serde::{Deserialize, Serialize};

use crate::config::Fixing;
use crate::errors::{SpringError, SpringResult};
use crate::params::{HookGeometry, ParamName, ParameterSet};
use crate::variant::Variant;

pub use force::{
    force_or_deflection, stress, stress_at, ForceResult, Load, StressInput, StressResult,
};
pub use verify::{
    check_buckling, check_fatigue, check_index, rate_stress, rate_stress_result, BucklingCheck,
    FatigueCheck, IndexCheck, IndexVerdict, LocationFatigue, LocationRating, StressRating,
    DEFAULT_FATIGUE_CYCLES,
};

/// The resolved quantities the load and stress operations work from.
///
/// Only built from a fully resolved parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolvedSpring {
    pub variant: Variant,
    pub fixing: Fixing,
    pub d_mm: f64,
    pub dm_mm: f64,
    /// Spring index DM/d
    pub c: f64,
    pub lo_mm: f64,
    pub ls_mm: f64,
    /// Rate (N/mm, torsion N·mm/deg)
    pub k: f64,
    pub fn_hz: f64,
    pub hooks: HookGeometry,
}

impl SolvedSpring {
    /// `NotSolved` unless every parameter is resolved
    pub fn from_parameters(
        variant: Variant,
        fixing: Fixing,
        params: &ParameterSet,
        hooks: HookGeometry,
        operation: &str,
    ) -> SpringResult<Self> {
        if !params.is_fully_resolved() {
            return Err(SpringError::not_solved(operation));
        }
        Ok(Self {
            variant,
            fixing,
            d_mm: params.require(ParamName::D, operation)?,
            dm_mm: params.require(ParamName::Dm, operation)?,
            c: params.require(ParamName::C, operation)?,
            lo_mm: params.require(ParamName::Lo, operation)?,
            ls_mm: params.require(ParamName::Ls, operation)?,
            k: params.require(ParamName::K, operation)?,
            fn_hz: params.require(ParamName::Fn, operation)?,
            hooks,
        })
    }

    /// Deflection at which the coils close up, for variants that clamp to it
    pub fn max_deflection(&self) -> Option<f64> {
        self.variant
            .profile()
            .clamps_to_solid
            .then_some(self.lo_mm - self.ls_mm)
    }
}
