//! # Equation Builder
//!
//! Assembles the symbolic relations that govern a spring. The core system
//! (geometry, mass, frequency) depends on the ending and the material; the
//! variant's rate law is appended by the caller with [`EquationBuilder::rate_relation`].
//!
//! ## Example
//!
//! ```rust
//! use spring_core::config::Ending;
//! use spring_core::equations::builder::EquationBuilder;
//! use spring_core::materials::{MaterialDb, MaterialProvider};
//! use spring_core::params::HookGeometry;
//! use spring_core::variant::RateLaw;
//!
//! let material = MaterialDb::builtin().unwrap().lookup("A227").unwrap();
//! let builder = EquationBuilder::new(Ending::ClosedGround, &material);
//! let mut system = builder.build();
//! system.push_relation(builder.rate_relation(RateLaw::Helical, &HookGeometry::None));
//! assert_eq!(system.len(), 10);
//! ```

use std::collections::BTreeSet;
use std::f64::consts::PI;

use super::expr::Expr;
use super::registry::Equation;
use super::spring::ending_coefficients;
use crate::config::Ending;
use crate::materials::MaterialProperties;
use crate::params::{HookGeometry, ParamName};
use crate::variant::RateLaw;

/// One governing relation, stored as `expr = 0`
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub equation: Equation,
    pub expr: Expr,
}

impl Relation {
    /// `lhs = rhs`
    pub fn new(equation: Equation, lhs: Expr, rhs: Expr) -> Self {
        Relation {
            equation,
            expr: (lhs - rhs).simplify(),
        }
    }
}

/// The relations handed to a solver
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquationSystem {
    relations: Vec<Relation>,
}

impl EquationSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, equation: Equation, lhs: Expr, rhs: Expr) {
        self.relations.push(Relation::new(equation, lhs, rhs));
    }

    pub fn push_relation(&mut self, relation: Relation) {
        self.relations.push(relation);
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Every parameter mentioned by some relation
    pub fn variables(&self) -> BTreeSet<ParamName> {
        self.relations.iter().flat_map(|r| r.expr.unknowns()).collect()
    }
}

/// Builds the equation system for one ending and material
#[derive(Debug, Clone, Copy)]
pub struct EquationBuilder<'a> {
    ending: Ending,
    material: &'a MaterialProperties,
}

impl<'a> EquationBuilder<'a> {
    pub fn new(ending: Ending, material: &'a MaterialProperties) -> Self {
        Self { ending, material }
    }

    /// Core geometry, mass and frequency relations
    pub fn build(&self) -> EquationSystem {
        use ParamName::*;

        let v = Expr::var;
        let ends = ending_coefficients(self.ending);
        let rho = self.material.density_kg_mm3;
        let g = self.material.shear_modulus_mpa;

        let mut system = EquationSystem::new();
        system.push(Equation::MediumFromExternal, v(Dm), v(De) - v(D));
        system.push(Equation::MediumFromInternal, v(Dm), v(Di) + v(D));
        system.push(Equation::ActiveTurns, v(Na), v(Nt) - ends.inactive_turns);
        system.push(
            Equation::FreeLength,
            v(Lo),
            v(P) * v(Na) + ends.free_length_allowance * v(D),
        );
        system.push(Equation::SolidLength, v(Ls), v(D) * (v(Nt) + ends.solid_turns_allowance));
        system.push(Equation::SpringIndex, v(C) * v(D), v(Dm));
        system.push(
            Equation::CoilMass,
            v(W),
            rho * (PI / 2.0 * v(D)).powf(2.0) * v(Dm) * v(Nt),
        );
        system.push(Equation::CoilGap, v(Gap), v(P) - v(D));
        system.push(
            Equation::NaturalFrequency,
            v(Fn),
            g.sqrt() * v(D) / ((2.0 * rho).sqrt() * v(Dm).powf(2.0) * v(Na)),
        );
        system
    }

    /// The rate relation for a variant's rate law
    pub fn rate_relation(&self, rate: RateLaw, hooks: &HookGeometry) -> Relation {
        use ParamName::*;

        let v = Expr::var;
        match rate {
            RateLaw::Helical => Relation::new(
                Equation::HelicalRate,
                v(K),
                self.material.shear_modulus_mpa * v(D).powf(4.0) / (8.0 * v(Na) * v(Dm).powf(3.0)),
            ),
            RateLaw::Torsion => {
                let legs = match *hooks {
                    HookGeometry::Torsion { l1_mm, l2_mm } => l1_mm + l2_mm,
                    _ => 0.0,
                };
                let equivalent_turns = v(Nt) + legs / (3.0 * PI) / v(Dm);
                Relation::new(
                    Equation::TorsionRate,
                    v(K),
                    self.material.elastic_modulus_mpa * v(D).powf(4.0)
                        / (3888.0 * v(Dm) * equivalent_turns),
                )
            }
        }
    }
}
