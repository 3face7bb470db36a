//! # Helical Spring Formulas
//!
//! Closed-form spring-design equations. The solver works on the symbolic
//! relations built in [`super::builder`]; the functions here evaluate the
//! same formulas numerically for downstream checks, mass corrections and
//! tests.
//!
//! ## Notation
//!
//! - `d` = Wire diameter (mm)
//! - `dm` = Medium (mean) coil diameter (mm)
//! - `c` = Spring index DM/d
//! - `na`, `nt` = Active and total turns
//! - `g`, `e` = Shear and elastic modulus (MPa)
//! - `rho` = Density (kg/mm³)
//! - `f` = Force (N), or moment (N·mm) for torsion springs
//! - `sut` = Minimum tensile strength (MPa)
//!
//! Stresses are returned as a ratio of `sut`.
//!
//! ## References
//!
//! - Shigley's Mechanical Engineering Design, 10th Edition, Chapter 10
//! - A. M. Wahl, Mechanical Springs

use std::f64::consts::PI;

use crate::config::Ending;

// =============================================================================
// ENDING TABLE
// =============================================================================

/// Coefficients of the ending-dependent geometry relations.
///
/// ```text
/// Na = Nt - inactive_turns
/// Lo = p*Na + free_length_allowance*d
/// Ls = d*(Nt + solid_turns_allowance)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndingCoefficients {
    pub inactive_turns: f64,
    pub free_length_allowance: f64,
    pub solid_turns_allowance: f64,
}

/// # Table (Shigley Table 10-1)
///
/// | ending | Na | Lo | Ls |
/// |---|---|---|---|
/// | closed-ground | Nt-2 | p·Na + 2d | d·Nt |
/// | closed | Nt-2 | p·Na + 3d | d·(Nt+1) |
/// | open-ground | Nt-1 | p·Na | d·Nt |
/// | open | Nt | p·Na + d | d·(Nt+1) |
pub fn ending_coefficients(ending: Ending) -> EndingCoefficients {
    let (inactive_turns, free_length_allowance, solid_turns_allowance) = match ending {
        Ending::ClosedGround => (2.0, 2.0, 0.0),
        Ending::Closed => (2.0, 3.0, 1.0),
        Ending::OpenGround => (1.0, 0.0, 0.0),
        Ending::Open => (0.0, 1.0, 1.0),
    };
    EndingCoefficients {
        inactive_turns,
        free_length_allowance,
        solid_turns_allowance,
    }
}

#[inline]
pub fn active_turns(ending: Ending, nt: f64) -> f64 {
    nt - ending_coefficients(ending).inactive_turns
}

#[inline]
pub fn free_length(ending: Ending, p: f64, na: f64, d: f64) -> f64 {
    p * na + ending_coefficients(ending).free_length_allowance * d
}

#[inline]
pub fn solid_length(ending: Ending, d: f64, nt: f64) -> f64 {
    d * (nt + ending_coefficients(ending).solid_turns_allowance)
}

// =============================================================================
// MASS AND DYNAMICS
// =============================================================================

/// Mass of the coiled wire (kg)
///
/// # Formula
/// - w = rho·(π·d/2)²·DM·Nt
#[inline]
pub fn coil_mass(rho: f64, d: f64, dm: f64, nt: f64) -> f64 {
    rho * (PI * d / 2.0).powi(2) * dm * nt
}

/// Mass of the two extension hooks (kg): π·d²·rho·(La + 2π·DM)/4
#[inline]
pub fn hook_mass(rho: f64, d: f64, dm: f64, la: f64) -> f64 {
    PI * d * d * rho * (la + 2.0 * PI * dm) / 4.0
}

/// Mass of the two torsion legs (kg): π·d²·rho·(L1 + L2)/4
#[inline]
pub fn leg_mass(rho: f64, d: f64, l1: f64, l2: f64) -> f64 {
    PI * d * d * rho * (l1 + l2) / 4.0
}

/// Natural frequency (Hz)
///
/// # Formula (Shigley 10-9)
/// - fn = d·√G / (√(2·rho)·DM²·Na)
#[inline]
pub fn natural_frequency(d: f64, g: f64, rho: f64, dm: f64, na: f64) -> f64 {
    d * g.sqrt() / ((2.0 * rho).sqrt() * dm * dm * na)
}

/// Maximum operating frequency (cycles/min) for a frequency divisor
#[inline]
pub fn max_operating_frequency(fn_hz: f64, divisor: f64) -> f64 {
    fn_hz / divisor * 60.0
}

// =============================================================================
// RATES
// =============================================================================

/// Axial rate of a compression or extension spring (N/mm)
///
/// # Formula (Shigley Eq. 10-9)
/// - k = G·d⁴ / (8·Na·DM³)
#[inline]
pub fn helical_rate(g: f64, d: f64, na: f64, dm: f64) -> f64 {
    g * d.powi(4) / (8.0 * na * dm.powi(3))
}

/// Angular rate of a torsion spring (N·mm/deg)
///
/// # Formula (Shigley Eq. 10-51)
/// - k = E·d⁴ / (3888·DM·Na'), Na' = Nt + (L1 + L2)/(3π·DM)
#[inline]
pub fn torsion_rate(e: f64, d: f64, dm: f64, nt: f64, l1: f64, l2: f64) -> f64 {
    let equivalent_turns = nt + (l1 + l2) / (3.0 * PI * dm);
    e * d.powi(4) / (3888.0 * dm * equivalent_turns)
}

// =============================================================================
// STRESS FACTORS
// =============================================================================

/// Wahl factor: Kw = (4C − 1)/(4C − 4) + 0.615/C
#[inline]
pub fn wahl_factor(c: f64) -> f64 {
    (4.0 * c - 1.0) / (4.0 * c - 4.0) + 0.615 / c
}

/// Hook bending factor at point A: Ka = (4C1² − C1 − 1)/(4·C1·(C1 − 1))
#[inline]
pub fn hook_bending_factor(c1: f64) -> f64 {
    (4.0 * c1 * c1 - c1 - 1.0) / (4.0 * c1 * (c1 - 1.0))
}

/// Curvature factor: Kb = (4C − 1)/(4C − 4)
#[inline]
pub fn curvature_factor(c: f64) -> f64 {
    (4.0 * c - 1.0) / (4.0 * c - 4.0)
}

// =============================================================================
// STRESSES
// Each stress is linear in the load: s = f · coefficient. The `*_per_unit`
// functions return that coefficient so callers can invert stress to load.
// =============================================================================

/// Body shear stress ratio per unit force (compression/extension)
///
/// # Formula
/// - s·Sut = 8·Kw·DM·F/(π·d³)
#[inline]
pub fn body_shear_per_unit(d: f64, dm: f64, sut: f64) -> f64 {
    8.0 * wahl_factor(dm / d) * dm / (PI * sut * d.powi(3))
}

#[inline]
pub fn body_shear_stress(f: f64, d: f64, dm: f64, sut: f64) -> f64 {
    f * body_shear_per_unit(d, dm, sut)
}

/// Hook A bending stress ratio per unit force, C1 = 2·Ra/d
///
/// # Formula
/// - s·Sut = 32·Ka·DM·F/(π·d³) + 4·F/(π·d²)
#[inline]
pub fn hook_bending_per_unit(d: f64, dm: f64, ra: f64, sut: f64) -> f64 {
    let ka = hook_bending_factor(2.0 * ra / d);
    (32.0 * ka * dm / (PI * d.powi(3)) + 4.0 / (PI * d * d)) / sut
}

#[inline]
pub fn hook_bending_stress(f: f64, d: f64, dm: f64, ra: f64, sut: f64) -> f64 {
    f * hook_bending_per_unit(d, dm, ra, sut)
}

/// Hook B torsion stress ratio per unit force, C2 = 2·Rb/d
///
/// # Formula
/// - s·Sut = 16·Kb·DM·F/(π·d³)
#[inline]
pub fn hook_torsion_per_unit(d: f64, dm: f64, rb: f64, sut: f64) -> f64 {
    let kb = curvature_factor(2.0 * rb / d);
    16.0 * kb * dm / (PI * sut * d.powi(3))
}

#[inline]
pub fn hook_torsion_stress(f: f64, d: f64, dm: f64, rb: f64, sut: f64) -> f64 {
    f * hook_torsion_per_unit(d, dm, rb, sut)
}

/// Torsion spring body bending stress ratio per unit moment
///
/// # Formula
/// - s·Sut = 32·Kb·M/(π·d³), Kb at the spring index C
#[inline]
pub fn torsion_bending_per_unit(d: f64, c: f64, sut: f64) -> f64 {
    32.0 * curvature_factor(c) / (PI * sut * d.powi(3))
}

#[inline]
pub fn torsion_bending_stress(m: f64, d: f64, c: f64, sut: f64) -> f64 {
    m * torsion_bending_per_unit(d, c, sut)
}

// =============================================================================
// CHECKS
// =============================================================================

/// Largest free length before buckling: Lo_max = 2.63·DM/α
#[inline]
pub fn buckling_free_length(dm: f64, alpha: f64) -> f64 {
    2.63 * dm / alpha
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_ending_table() {
        assert_eq!(active_turns(Ending::ClosedGround, 8.0), 6.0);
        assert_eq!(active_turns(Ending::OpenGround, 8.0), 7.0);
        assert_eq!(active_turns(Ending::Open, 8.0), 8.0);
        assert_eq!(free_length(Ending::Closed, 3.0, 6.0, 1.0), 21.0);
        assert_eq!(solid_length(Ending::Open, 1.0, 8.0), 9.0);
        assert_eq!(solid_length(Ending::ClosedGround, 1.0, 8.0), 8.0);
    }

    #[test]
    fn test_helical_rate() {
        // A227: G = 80700, d = 1, Na = 6, DM = 9
        let k = helical_rate(80700.0, 1.0, 6.0, 9.0);
        assert!((k - 80700.0 / (48.0 * 729.0)).abs() < EPSILON);
        assert!((k - 2.3063).abs() < 1e-3);
    }

    #[test]
    fn test_torsion_rate_without_legs() {
        let k = torsion_rate(197900.0, 1.0, 9.0, 8.0, 0.0, 0.0);
        assert!((k - 197900.0 / (3888.0 * 72.0)).abs() < EPSILON);
        assert!(torsion_rate(197900.0, 1.0, 9.0, 8.0, 20.0, 20.0) < k);
    }

    #[test]
    fn test_natural_frequency() {
        let fn_hz = natural_frequency(1.0, 80700.0, 7.85e-6, 9.0, 6.0);
        assert!((fn_hz - 147.52).abs() < 0.01, "fn = {}", fn_hz);
        assert!((max_operating_frequency(13.0, 13.0) - 60.0).abs() < EPSILON);
    }

    #[test]
    fn test_masses() {
        let w = coil_mass(7.85e-6, 1.0, 9.0, 8.0);
        assert!((w - 1.3948e-3).abs() < 1e-6, "w = {}", w);
        assert!((leg_mass(7.85e-6, 1.0, 10.0, 10.0) - PI * 7.85e-6 * 5.0).abs() < 1e-15);
        assert!(hook_mass(7.85e-6, 1.0, 9.0, 0.0) > 0.0);
    }

    #[test]
    fn test_stress_factors() {
        // Kw(9) = 35/32 + 0.615/9
        assert!((wahl_factor(9.0) - (35.0 / 32.0 + 0.615 / 9.0)).abs() < EPSILON);
        assert!((curvature_factor(9.0) - 35.0 / 32.0).abs() < EPSILON);
        // C1 = 18: (1296 - 19)/(72*17)
        assert!((hook_bending_factor(18.0) - 1277.0 / 1224.0).abs() < EPSILON);
    }

    #[test]
    fn test_stresses_are_linear_in_load() {
        let s1 = body_shear_stress(10.0, 1.0, 9.0, 1783.0);
        let s2 = body_shear_stress(20.0, 1.0, 9.0, 1783.0);
        assert!((s2 - 2.0 * s1).abs() < EPSILON);
        assert!((s1 - 10.0 * body_shear_per_unit(1.0, 9.0, 1783.0)).abs() < EPSILON);

        let a = hook_bending_stress(10.0, 1.0, 9.0, 9.0, 1783.0);
        let b = hook_torsion_stress(10.0, 1.0, 9.0, 9.0, 1783.0);
        assert!(a > b);
        assert!(torsion_bending_stress(100.0, 1.0, 9.0, 1783.0) > 0.0);
    }

    #[test]
    fn test_buckling_free_length() {
        assert!((buckling_free_length(9.0, 0.5) - 47.34).abs() < 1e-9);
        assert!((buckling_free_length(9.0, 2.0) - 11.835).abs() < 1e-9);
    }
}
