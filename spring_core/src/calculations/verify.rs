//! # Design Checks
//!
//! Post-solve verification of a spring design:
//!
//! - **Spring index**: practical winding range of `C = DM/d`
//! - **Buckling**: free-length limit of compression springs
//! - **Fatigue**: safe deflection for a cycle count, operating frequency
//!   limit and minimum life
//! - **Static stress rating**: classification of a stress ratio
//!
//! ## References
//!
//! - Shigley's Mechanical Engineering Design, 10th Edition, Sections 10-10 and 10-11
//! - SMI Handbook of Spring Design, fatigue allowables

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::force::{stress_at, StressInput, StressResult};
use super::SolvedSpring;
use crate::config::Fixing;
use crate::equations::spring;
use crate::errors::{SpringError, SpringResult};
use crate::materials::FatigueGroup;
use crate::params::{ParamName, ParameterSet};
use crate::variant::{StressLocation, Variant, FATIGUE_CYCLES};

/// Cycle count used when none is given
pub const DEFAULT_FATIGUE_CYCLES: f64 = 1e6;

/// Index of the fallback column in the fatigue tables (1e6 cycles)
const FALLBACK_COLUMN: usize = 1;

/// At or above this index the spring is hard to control when coiling
const MAX_SPRING_INDEX: f64 = 12.0;

/// At or below this index the spring is hard to coil
const MIN_SPRING_INDEX: f64 = 4.0;

// =============================================================================
// SPRING INDEX
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndexVerdict {
    TooSmall,
    Acceptable,
    TooLarge,
}

impl IndexVerdict {
    pub fn display_name(&self) -> &'static str {
        match self {
            IndexVerdict::TooSmall => "Spring index too small",
            IndexVerdict::Acceptable => "Spring index acceptable",
            IndexVerdict::TooLarge => "Spring index too large",
        }
    }

    pub fn recommendation(&self) -> Option<&'static str> {
        match self {
            IndexVerdict::TooSmall => Some("use a larger coil diameter or a smaller wire gauge"),
            IndexVerdict::Acceptable => None,
            IndexVerdict::TooLarge => Some("use a smaller coil diameter or a larger wire gauge"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexCheck {
    pub spring_index: f64,
    pub verdict: IndexVerdict,
}

/// Classify the spring index `C`
pub fn check_index(params: &ParameterSet) -> SpringResult<IndexCheck> {
    let c = params.require(ParamName::C, "spring index check")?;
    let verdict = if c >= MAX_SPRING_INDEX {
        IndexVerdict::TooLarge
    } else if c <= MIN_SPRING_INDEX {
        IndexVerdict::TooSmall
    } else {
        IndexVerdict::Acceptable
    };
    Ok(IndexCheck { spring_index: c, verdict })
}

// =============================================================================
// BUCKLING
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BucklingCheck {
    pub fixing: Fixing,
    /// End-condition constant α
    pub alpha: f64,
    pub free_length_mm: f64,
    /// Lo_max = 2.63·DM/α
    pub max_free_length_mm: f64,
    pub buckles: bool,
}

/// Buckling check; `None` for variants where it does not apply
pub fn check_buckling(
    variant: Variant,
    fixing: Fixing,
    params: &ParameterSet,
) -> SpringResult<Option<BucklingCheck>> {
    if !variant.profile().buckling_applies {
        return Ok(None);
    }
    let dm = params.require(ParamName::Dm, "buckling check")?;
    let lo = params.require(ParamName::Lo, "buckling check")?;
    let alpha = fixing.buckling_alpha();
    let max_free_length_mm = spring::buckling_free_length(dm, alpha);
    Ok(Some(BucklingCheck {
        fixing,
        alpha,
        free_length_mm: lo,
        max_free_length_mm,
        buckles: lo >= max_free_length_mm,
    }))
}

// =============================================================================
// FATIGUE
// =============================================================================

/// Safe operating point at one stress location
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFatigue {
    pub location: StressLocation,
    /// Allowable stress ratio from the fatigue table
    pub allowable_ratio: f64,
    pub safe_force: f64,
    pub safe_deflection: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatigueCheck {
    /// Requested cycle count
    pub cycles: f64,
    pub locations: Vec<LocationFatigue>,
    /// Smallest safe deflection over all locations (mm, torsion: deg)
    pub safe_deflection: f64,
    pub governing: StressLocation,
    /// Maximum operating frequency (cycles/min)
    pub max_frequency_cpm: f64,
    /// Minimum life at the maximum operating frequency (min)
    pub min_life_min: f64,
}

/// Column of the fatigue tables for a cycle count
fn table_column(cycles: f64) -> usize {
    FATIGUE_CYCLES
        .iter()
        .position(|c| (c - cycles).abs() <= 1e-9 * c)
        .unwrap_or_else(|| {
            warn!(cycles, "no fatigue data for this cycle count, using the 1e6 row");
            FALLBACK_COLUMN
        })
}

/// Fatigue check at `cycles` (1e5, 1e6 or 1e7; anything else uses 1e6).
///
/// Every stress location of the variant is evaluated; the smallest safe
/// deflection governs.
pub fn check_fatigue(
    spring: &SolvedSpring,
    sut_mpa: f64,
    group: FatigueGroup,
    cycles: f64,
) -> SpringResult<FatigueCheck> {
    if !cycles.is_finite() || cycles <= 0.0 {
        return Err(SpringError::invalid_value(
            "cycles",
            cycles.to_string(),
            "must be a positive number",
        ));
    }
    let column = table_column(cycles);
    let profile = spring.variant.profile();

    let mut locations = Vec::with_capacity(profile.stress_locations.len());
    for &location in profile.stress_locations {
        let row = profile
            .fatigue_row(location)
            .ok_or_else(|| SpringError::internal(format!("no fatigue table for {}", location)))?;
        let ratios = row.ratios(group);
        let allowable_ratio = match ratios[column] {
            Some(ratio) => ratio,
            None => {
                warn!(cycles, %location, "no fatigue data at this cycle count, using the 1e6 row");
                ratios[FALLBACK_COLUMN].ok_or_else(|| {
                    SpringError::internal(format!("no 1e6 fatigue data for {}", location))
                })?
            }
        };
        let at_allowable =
            stress_at(spring, sut_mpa, location, StressInput::Stress(allowable_ratio))?;
        locations.push(LocationFatigue {
            location,
            allowable_ratio,
            safe_force: at_allowable.force,
            safe_deflection: at_allowable.deflection,
        });
    }

    let governing = locations
        .iter()
        .min_by(|a, b| a.safe_deflection.total_cmp(&b.safe_deflection))
        .copied()
        .ok_or_else(|| SpringError::internal("variant has no stress locations"))?;

    let max_frequency_cpm =
        spring::max_operating_frequency(spring.fn_hz, spring.fixing.frequency_divisor());

    Ok(FatigueCheck {
        cycles,
        safe_deflection: governing.safe_deflection,
        governing: governing.location,
        locations,
        max_frequency_cpm,
        min_life_min: cycles / max_frequency_cpm,
    })
}

// =============================================================================
// STATIC STRESS RATING
// =============================================================================

/// Ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StressRating {
    Acceptable,
    /// The spring must be preset (set removal) to carry this stress
    SetRemovalRequired,
    Overstressed,
}

impl StressRating {
    pub fn display_name(&self) -> &'static str {
        match self {
            StressRating::Acceptable => "Acceptable",
            StressRating::SetRemovalRequired => "Set removal required",
            StressRating::Overstressed => "Overstressed for the required force",
        }
    }
}

impl std::fmt::Display for StressRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Classify a static stress ratio at `location`
///
/// # Limits
///
/// | variant | location | limit |
/// |---|---|---|
/// | compression | body | set removal above 0.40, overstressed above 0.60 |
/// | torsion | body | 0.80 (A227), 0.60 (T302), 0.85 otherwise |
/// | extension | body / hook A / hook B | 0.35 / 0.55 / 0.30 (T302), 0.45 / 0.75 / 0.40 otherwise |
pub fn rate_stress(
    variant: Variant,
    material: &str,
    location: StressLocation,
    ratio: f64,
) -> SpringResult<StressRating> {
    if !ratio.is_finite() {
        return Err(SpringError::invalid_value(
            "stress",
            ratio.to_string(),
            "must be a finite number",
        ));
    }
    if !variant.profile().has_location(location) {
        return Err(SpringError::unsupported(
            format!("stress rating at {}", location.display_name()),
            variant.code(),
        ));
    }

    let material = material.trim().to_uppercase();
    let overstressed_above = match (variant, location) {
        (Variant::Compression, _) => {
            if ratio > 0.6 {
                return Ok(StressRating::Overstressed);
            }
            if ratio > 0.4 {
                return Ok(StressRating::SetRemovalRequired);
            }
            return Ok(StressRating::Acceptable);
        }
        (Variant::Torsion, _) => match material.as_str() {
            "A227" => 0.80,
            "T302" => 0.60,
            _ => 0.85,
        },
        (Variant::Extension, location) => match (material.as_str(), location) {
            ("T302", StressLocation::Body) => 0.35,
            ("T302", StressLocation::HookA) => 0.55,
            ("T302", StressLocation::HookB) => 0.30,
            (_, StressLocation::Body) => 0.45,
            (_, StressLocation::HookA) => 0.75,
            (_, StressLocation::HookB) => 0.40,
        },
    };

    Ok(if ratio > overstressed_above {
        StressRating::Overstressed
    } else {
        StressRating::Acceptable
    })
}

/// Rating of the stress at one location
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationRating {
    pub location: StressLocation,
    pub ratio: f64,
    pub rating: StressRating,
}

/// Rate every stress carried by `result`: its own location, plus the hook
/// ratios reported alongside an extension body stress
pub fn rate_stress_result(
    variant: Variant,
    material: &str,
    result: &StressResult,
) -> SpringResult<Vec<LocationRating>> {
    let hooks = [
        (StressLocation::HookA, result.hook_a_ratio),
        (StressLocation::HookB, result.hook_b_ratio),
    ];
    std::iter::once((result.location, Some(result.ratio)))
        .chain(hooks)
        .filter_map(|(location, ratio)| ratio.map(|r| (location, r)))
        .map(|(location, ratio)| {
            Ok(LocationRating {
                location,
                ratio,
                rating: rate_stress(variant, material, location, ratio)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::test_support::{
        reference_compression, reference_extension, reference_torsion,
    };

    const SUT: f64 = 1783.0;

    fn params_with(values: &[(ParamName, f64)]) -> ParameterSet {
        let mut params = ParameterSet::all_unresolved();
        for (name, value) in values {
            params.set(*name, *value);
        }
        params
    }

    #[test]
    fn test_index_boundaries() {
        let verdict = |c: f64| check_index(&params_with(&[(ParamName::C, c)])).unwrap().verdict;
        assert_eq!(verdict(12.0), IndexVerdict::TooLarge);
        assert_eq!(verdict(8.0), IndexVerdict::Acceptable);
        assert_eq!(verdict(4.0), IndexVerdict::TooSmall);
        assert!(IndexVerdict::TooLarge.recommendation().unwrap().contains("larger wire gauge"));
    }

    #[test]
    fn test_index_requires_c() {
        let err = check_index(&ParameterSet::all_unresolved()).unwrap_err();
        assert_eq!(err.error_code(), "MISSING_PARAMETER");
    }

    #[test]
    fn test_buckling() {
        let params = params_with(&[(ParamName::Dm, 9.0), (ParamName::Lo, 20.0)]);
        let check = check_buckling(Variant::Compression, Fixing::FixPivot, &params)
            .unwrap()
            .unwrap();
        // 2.63 * 9 / 0.707 = 33.48
        assert!((check.max_free_length_mm - 33.479).abs() < 1e-3);
        assert!(!check.buckles);

        let check = check_buckling(Variant::Compression, Fixing::HingedFree, &params)
            .unwrap()
            .unwrap();
        assert!((check.max_free_length_mm - 11.835).abs() < 1e-9);
        assert!(check.buckles);

        assert!(check_buckling(Variant::Extension, Fixing::BothPivot, &params).unwrap().is_none());
        let unresolved = ParameterSet::all_unresolved();
        assert!(check_buckling(Variant::Compression, Fixing::FixPivot, &unresolved).is_err());
    }

    #[test]
    fn test_compression_fatigue() {
        let spring = reference_compression();
        let check = check_fatigue(&spring, SUT, FatigueGroup::Carbon, 1e6).unwrap();
        assert_eq!(check.locations.len(), 1);
        assert_eq!(check.governing, StressLocation::Body);
        assert_eq!(check.locations[0].allowable_ratio, 0.33);

        let expected_force = 0.33 / spring::body_shear_per_unit(1.0, 9.0, SUT);
        assert!((check.safe_deflection - expected_force / spring.k).abs() < 1e-9);

        // fix-pivot divides by 26
        assert!((check.max_frequency_cpm - spring.fn_hz / 26.0 * 60.0).abs() < 1e-9);
        assert!((check.min_life_min - 1e6 / check.max_frequency_cpm).abs() < 1e-6);
    }

    #[test]
    fn test_alloy_group_allows_more() {
        let spring = reference_compression();
        let carbon = check_fatigue(&spring, SUT, FatigueGroup::Carbon, 1e5).unwrap();
        let alloy = check_fatigue(&spring, SUT, FatigueGroup::Alloy, 1e5).unwrap();
        assert_eq!(carbon.locations[0].allowable_ratio, 0.36);
        assert_eq!(alloy.locations[0].allowable_ratio, 0.42);
        assert!(alloy.safe_deflection > carbon.safe_deflection);
    }

    #[test]
    fn test_unknown_cycle_count_falls_back() {
        let spring = reference_compression();
        let check = check_fatigue(&spring, SUT, FatigueGroup::Carbon, 5e5).unwrap();
        assert_eq!(check.locations[0].allowable_ratio, 0.33);
        assert_eq!(check.cycles, 5e5);
        assert!(check_fatigue(&spring, SUT, FatigueGroup::Carbon, 0.0).is_err());
    }

    #[test]
    fn test_torsion_1e7_falls_back() {
        let spring = reference_torsion();
        let check = check_fatigue(&spring, SUT, FatigueGroup::Carbon, 1e7).unwrap();
        assert_eq!(check.locations[0].allowable_ratio, 0.50);
        assert!((check.max_frequency_cpm - spring.fn_hz / 13.0 * 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_extension_fatigue_takes_minimum() {
        let spring = reference_extension();
        let check = check_fatigue(&spring, SUT, FatigueGroup::Carbon, 1e6).unwrap();
        assert_eq!(check.locations.len(), 3);
        let min = check
            .locations
            .iter()
            .map(|l| l.safe_deflection)
            .fold(f64::INFINITY, f64::min);
        assert_eq!(check.safe_deflection, min);
        let governing = check.locations.iter().find(|l| l.location == check.governing).unwrap();
        assert_eq!(governing.safe_deflection, min);
    }

    #[test]
    fn test_stress_ratings() {
        use StressLocation::*;
        use StressRating::*;
        let cases = [
            (Variant::Compression, "A227", Body, 0.3, Acceptable),
            (Variant::Compression, "A227", Body, 0.5, SetRemovalRequired),
            (Variant::Compression, "A227", Body, 0.6, SetRemovalRequired),
            (Variant::Compression, "A227", Body, 0.61, Overstressed),
            (Variant::Torsion, "a227", Body, 0.82, Overstressed),
            (Variant::Torsion, "A229", Body, 0.82, Acceptable),
            (Variant::Torsion, "T302", Body, 0.65, Overstressed),
            (Variant::Extension, "T302", HookA, 0.6, Overstressed),
            (Variant::Extension, "A228", HookA, 0.6, Acceptable),
            (Variant::Extension, "A228", HookB, 0.41, Overstressed),
        ];
        for (variant, material, location, ratio, expected) in cases {
            let rating = rate_stress(variant, material, location, ratio).unwrap();
            assert_eq!(rating, expected, "{} {} {} at {}", variant, material, location, ratio);
        }

        let err = rate_stress(Variant::Compression, "A227", HookA, 0.1).unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_OPERATION");
    }

    #[test]
    fn test_rating_order() {
        assert!(StressRating::Overstressed > StressRating::SetRemovalRequired);
        assert!(StressRating::SetRemovalRequired > StressRating::Acceptable);
    }

    #[test]
    fn test_extension_rates_every_location() {
        let spring = reference_extension();
        let result =
            crate::calculations::stress(&spring, SUT, StressInput::Stress(0.30)).unwrap();
        let ratings = rate_stress_result(Variant::Extension, "A228", &result).unwrap();
        let locations: Vec<StressLocation> = ratings.iter().map(|r| r.location).collect();
        assert_eq!(
            locations,
            vec![StressLocation::Body, StressLocation::HookA, StressLocation::HookB]
        );
        assert_eq!(ratings[0].ratio, 0.30);
        assert_eq!(ratings[0].rating, StressRating::Acceptable);
        for rating in &ratings[1..] {
            let expected =
                rate_stress(Variant::Extension, "A228", rating.location, rating.ratio).unwrap();
            assert_eq!(rating.rating, expected);
        }

        let single =
            stress_at(&spring, SUT, StressLocation::HookB, StressInput::Stress(0.5)).unwrap();
        let ratings = rate_stress_result(Variant::Extension, "A228", &single).unwrap();
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings[0].location, StressLocation::HookB);
        assert_eq!(ratings[0].rating, StressRating::Overstressed);
    }
}
