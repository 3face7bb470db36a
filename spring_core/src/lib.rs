//! # spring_core - Helical Spring Calculation Engine
//!
//! `spring_core` computes the parameters of helical compression, extension
//! and torsion springs from a partial set of measurements. The spring
//! relations are assembled as an equation system, solved algebraically under
//! a deadline, and the resolved parameters feed force, stress and fatigue
//! calculations. Inputs and results are JSON-serializable.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use spring_core::calculations::Load;
//! use spring_core::config::SpringConfig;
//! use spring_core::materials::MaterialDb;
//! use spring_core::spring::Spring;
//!
//! let db = Arc::new(MaterialDb::builtin().unwrap());
//! let config = SpringConfig::parse("closed-ground", "fix-pivot", "A227").unwrap();
//! let mut spring = Spring::compression(config, db).unwrap();
//!
//! spring.solve_text(5.0, &["d=1", "DE=10", "Nt=8", "Lo=20"]).unwrap();
//! let result = spring.force_or_deflection(Load::Deflection(5.0)).unwrap();
//! println!("F = {:.2} N", result.force);
//! ```
//!
//! ## Modules
//!
//! - [`spring`] - Spring instances: configure, solve, reset, downstream operations
//! - [`params`] - Parameter names and their resolution state
//! - [`config`] - Ending, fixing and material selection
//! - [`variant`] - Per-variant capability table
//! - [`materials`] - Wire material properties and providers
//! - [`equations`] - Spring formulas, expression trees and the equation registry
//! - [`solver`] - Algebraic constraint solver and deadline guard
//! - [`calculations`] - Force, stress and verification checks
//! - [`errors`] - Structured error types

pub mod calculations;
pub mod config;
pub mod equations;
pub mod errors;
pub mod materials;
pub mod params;
pub mod solver;
pub mod spring;
pub mod variant;

// Re-export commonly used types at crate root for convenience
pub use config::{Ending, Fixing, SpringConfig};
pub use errors::{SpringError, SpringResult};
pub use materials::{MaterialDb, MaterialProvider};
pub use params::{ParamName, ParamValue, ParameterSet};
pub use spring::{SolveStatus, Spring, SpringSummary};
pub use variant::{StressLocation, Variant};
