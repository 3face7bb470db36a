//! # Spring Design Equations
//!
//! This module contains the spring-design relations used by the solver and
//! the downstream checks. Having equations in one place enables:
//! - Easy verification against references (Shigley, SMI, Wahl)
//! - Documentation of units and conventions
//! - Consistent use between the symbolic solver and numeric checks
//!
//! ## Modules
//!
//! - [`spring`] - Closed-form formulas (rates, stress factors, stresses, masses)
//! - [`expr`] - Symbolic expression tree over spring parameters
//! - [`poly`] - Univariate polynomials and their real roots
//! - [`builder`] - Assembly of the governing equation system
//! - [`registry`] - Equation metadata and tracking for reports
//!
//! ## Conventions
//!
//! - **Lengths**: millimeters
//! - **Forces**: newtons (N·mm moments for torsion springs)
//! - **Torsion deflection**: degrees
//! - **Stress**: ratio of minimum tensile strength, also reported in MPa
//!
//! ## References
//!
//! - Shigley's Mechanical Engineering Design, 10th Edition, Chapter 10
//! - SMI Handbook of Spring Design
//! - A. M. Wahl, Mechanical Springs

pub mod builder;
pub mod expr;
pub mod poly;
pub mod registry;
pub mod spring;

pub use builder::{EquationBuilder, EquationSystem, Relation};
pub use expr::Expr;
pub use poly::Poly;
pub use registry::{
    generate_equations_markdown, CodeReference, Equation, EquationCategory, EquationMetadata,
    EquationTracker, EquationUsage, Variable, ALL_EQUATIONS,
};
pub use spring::{
    body_shear_stress, buckling_free_length, curvature_factor, helical_rate, hook_bending_factor,
    hook_bending_stress, hook_torsion_stress, natural_frequency, torsion_bending_stress,
    torsion_rate, wahl_factor,
};
