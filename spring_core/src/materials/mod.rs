//! # Materials Database
//!
//! Spring wire materials and their property lookups.
//!
//! Calculations never reach for a global table: every spring is handed a
//! [`MaterialProvider`] at construction. [`MaterialDb`] is the standard
//! provider, backed by a TOML table (a built-in one ships with the crate).
//!
//! ## Example
//!
//! ```rust
//! use spring_core::materials::{MaterialDb, MaterialProvider};
//!
//! let db = MaterialDb::builtin().unwrap();
//! let a227 = db.lookup("A227").unwrap();
//! assert_eq!(a227.shear_modulus_mpa, 80700.0);
//!
//! let coeffs = db.strength_coefficients("A227", 1.0).unwrap();
//! println!("Sut = {:.0} MPa", coeffs.tensile_strength_mpa(1.0));
//! ```

pub mod wire_db;

pub use wire_db::MaterialDb;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::errors::SpringResult;

/// Fatigue-table family of a wire material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FatigueGroup {
    /// Carbon and stainless steels (A227, A228, A229, T302)
    Carbon,
    /// Alloy steels (A231, A401)
    Alloy,
}

impl FatigueGroup {
    pub fn display_name(&self) -> &'static str {
        match self {
            FatigueGroup::Carbon => "Carbon steel",
            FatigueGroup::Alloy => "Alloy steel",
        }
    }
}

impl std::fmt::Display for FatigueGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Physical properties of a wire material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialProperties {
    /// Identifier (e.g. "A227")
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Density rho (kg/mm³)
    pub density_kg_mm3: f64,
    /// Shear modulus G (MPa)
    pub shear_modulus_mpa: f64,
    /// Elastic modulus E (MPa)
    pub elastic_modulus_mpa: f64,
    /// Maximum service temperature (°C)
    pub max_service_temp_c: f64,
    /// Stress-relief heat treatment temperature (°C)
    pub heat_treat_temp_c: f64,
    /// Stress-relief heat treatment time (min)
    pub heat_treat_time_min: f64,
    pub fatigue_group: FatigueGroup,
}

impl std::fmt::Display for MaterialProperties {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.id, self.name)
    }
}

/// Minimum tensile strength coefficients: `Sut = A / d^m`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrengthCoefficients {
    /// A (MPa·mm^m)
    pub a_mpa: f64,
    /// Exponent m
    pub m: f64,
}

impl StrengthCoefficients {
    /// Minimum tensile strength Sut (MPa) at wire diameter `d_mm`
    pub fn tensile_strength_mpa(&self, d_mm: f64) -> f64 {
        self.a_mpa / d_mm.powf(self.m)
    }
}

/// Read-only source of material data.
pub trait MaterialProvider: Send + Sync {
    /// Properties for a material; `MaterialNotFound` if unknown
    fn lookup(&self, id: &str) -> SpringResult<MaterialProperties>;

    /// Coefficient row whose gauge range brackets `gauge_mm`.
    ///
    /// `OutOfRange` if no row applies, `MaterialNotFound` for an unknown id.
    fn strength_coefficients(&self, id: &str, gauge_mm: f64) -> SpringResult<StrengthCoefficients>;

    fn list_materials(&self) -> BTreeSet<String>;
}
