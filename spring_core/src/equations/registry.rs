//! # Equation Registry
//!
//! Central registry of every spring-design equation used by the solver and
//! the downstream checks. Each equation has metadata: formula, reference,
//! variables, assumptions and the function that implements it.
//!
//! ## Architecture
//!
//! The registry provides:
//! - Type-safe equation identification via the `Equation` enum
//! - Metadata for the generated `EQUATIONS.md` reference
//! - An [`EquationTracker`] that records which equation produced each
//!   parameter during a solve
//!
//! ## Usage
//!
//! ```rust
//! use spring_core::equations::registry::{Equation, EquationTracker};
//! use spring_core::params::ParamName;
//!
//! let mut tracker = EquationTracker::new();
//! tracker.record_for_parameter(Equation::SpringIndex, "solved directly", ParamName::C);
//!
//! let meta = Equation::SpringIndex.metadata();
//! println!("Formula: {}", meta.formula_plain);
//! assert_eq!(tracker.source_of(ParamName::C), Some(Equation::SpringIndex));
//! ```

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::params::ParamName;

// ============================================================================
// Code References
// ============================================================================

/// Reference to a spring-design text or standard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodeReference {
    /// Shigley's Mechanical Engineering Design, chapter on mechanical springs
    Shigley { edition: u8, section: &'static str },
    /// Spring Manufacturers Institute, Handbook of Spring Design
    Smi { section: &'static str },
    /// A. M. Wahl, Mechanical Springs
    Wahl { chapter: u8 },
    /// Fundamental mechanics (no specific reference needed)
    Mechanics,
}

impl CodeReference {
    pub fn citation(&self) -> String {
        match self {
            CodeReference::Shigley { edition, section } => {
                format!("Shigley {}ed, Section {}", edition, section)
            }
            CodeReference::Smi { section } => format!("SMI Handbook of Spring Design, {}", section),
            CodeReference::Wahl { chapter } => format!("Wahl, Mechanical Springs, Ch. {}", chapter),
            CodeReference::Mechanics => "Fundamental Mechanics".to_string(),
        }
    }

    /// Short form for inline references
    pub fn short_form(&self) -> &'static str {
        match self {
            CodeReference::Shigley { .. } => "Shigley",
            CodeReference::Smi { .. } => "SMI",
            CodeReference::Wahl { .. } => "Wahl",
            CodeReference::Mechanics => "Mechanics",
        }
    }
}

// ============================================================================
// Equation Categories
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EquationCategory {
    /// Diameters, turns and lengths
    Geometry,
    /// Wire and hook mass
    Mass,
    /// Spring rate and the linear load law
    Rate,
    /// Natural and operating frequency
    Dynamics,
    /// Stress correction factors (Wahl, curvature)
    StressFactors,
    /// Stress calculations
    Stresses,
    /// Index, buckling, fatigue and static checks
    DesignChecks,
}

impl EquationCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            EquationCategory::Geometry => "Geometry",
            EquationCategory::Mass => "Mass",
            EquationCategory::Rate => "Rate",
            EquationCategory::Dynamics => "Dynamics",
            EquationCategory::StressFactors => "Stress Factors",
            EquationCategory::Stresses => "Stresses",
            EquationCategory::DesignChecks => "Design Checks",
        }
    }

    /// Sort order for the reference document (lower = earlier)
    pub fn sort_order(&self) -> u8 {
        match self {
            EquationCategory::Geometry => 1,
            EquationCategory::Mass => 2,
            EquationCategory::Rate => 3,
            EquationCategory::Dynamics => 4,
            EquationCategory::StressFactors => 5,
            EquationCategory::Stresses => 6,
            EquationCategory::DesignChecks => 7,
        }
    }
}

// ============================================================================
// Variable Definition
// ============================================================================

/// Definition of a variable used in an equation.
#[derive(Debug, Clone)]
pub struct Variable {
    pub symbol: &'static str,
    pub description: &'static str,
    pub units: &'static str,
}

impl Variable {
    pub const fn new(symbol: &'static str, description: &'static str, units: &'static str) -> Self {
        Self { symbol, description, units }
    }
}

// ============================================================================
// Equation Metadata
// ============================================================================

/// Complete metadata for a spring-design equation.
#[derive(Debug, Clone)]
pub struct EquationMetadata {
    /// Human-readable name
    pub name: &'static str,
    pub description: &'static str,
    /// The formula in plain text
    pub formula_plain: &'static str,
    pub reference: CodeReference,
    pub variables: Vec<Variable>,
    /// Assumptions or limitations
    pub assumptions: Vec<&'static str>,
    pub category: EquationCategory,
    /// Source module where the equation implementation lives
    pub source_module: &'static str,
    /// Function name implementing the equation
    pub source_function: &'static str,
}

// ============================================================================
// Equation Enum
// ============================================================================

/// All spring-design equations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Equation {
    // -------------------------------------------------------------------------
    // Geometry
    // -------------------------------------------------------------------------
    /// DM = DE - d
    MediumFromExternal,
    /// DM = DI + d
    MediumFromInternal,
    /// Na = Nt - n_e (ending-dependent)
    ActiveTurns,
    /// Lo = p*Na + e*d (ending-dependent)
    FreeLength,
    /// Ls = d*(Nt + s) (ending-dependent)
    SolidLength,
    /// C*d = DM
    SpringIndex,
    /// gap = p - d
    CoilGap,

    // -------------------------------------------------------------------------
    // Mass
    // -------------------------------------------------------------------------
    /// w = rho*(pi*d/2)^2*DM*Nt
    CoilMass,
    /// Extension hook wire mass
    HookMass,
    /// Torsion leg wire mass
    LegMass,

    // -------------------------------------------------------------------------
    // Rate
    // -------------------------------------------------------------------------
    /// k = G*d^4 / (8*Na*DM^3)
    HelicalRate,
    /// k = E*d^4 / (3888*DM*(Nt + (L1+L2)/(3*pi*DM)))
    TorsionRate,
    /// F = k*x
    LoadDeflection,

    // -------------------------------------------------------------------------
    // Dynamics
    // -------------------------------------------------------------------------
    /// fn = d*sqrt(G) / (sqrt(2*rho)*DM^2*Na)
    NaturalFrequency,
    /// f_max = fn/divisor*60
    MaxOperatingFrequency,
    /// life = cycles / f_max
    FatigueLife,

    // -------------------------------------------------------------------------
    // Stress factors
    // -------------------------------------------------------------------------
    /// Kw = (4C-1)/(4C-4) + 0.615/C
    WahlFactor,
    /// Ka = (4C1^2 - C1 - 1)/(4*C1*(C1-1))
    HookBendingFactor,
    /// Kb = (4C-1)/(4C-4)
    CurvatureFactor,

    // -------------------------------------------------------------------------
    // Stresses
    // -------------------------------------------------------------------------
    /// Sut = A / d^m
    TensileStrength,
    /// tau = 8*Kw*DM*F/(pi*d^3)
    BodyShearStress,
    /// sigma_A = 32*Ka*DM*F/(pi*d^3) + 4F/(pi*d^2)
    HookBendingStress,
    /// tau_B = 16*Kb*DM*F/(pi*d^3)
    HookTorsionStress,
    /// sigma = 32*Kb*M/(pi*d^3)
    TorsionBendingStress,

    // -------------------------------------------------------------------------
    // Design checks
    // -------------------------------------------------------------------------
    /// 4 < C < 12
    SpringIndexRange,
    /// Lo_max = 2.63*DM/alpha
    BucklingLength,
    /// Allowable stress ratio at a cycle count
    FatigueAllowable,
    /// Static stress ratio limits
    StaticStressLimit,
}

impl Equation {
    /// Get the full metadata for this equation
    pub fn metadata(&self) -> EquationMetadata {
        match self {
            Equation::MediumFromExternal => EquationMetadata {
                name: "Medium Diameter from External Diameter",
                description: "Mean coil diameter from the outside diameter and wire gauge",
                formula_plain: "DM = DE - d",
                reference: CodeReference::Mechanics,
                variables: vec![
                    Variable::new("DM", "Medium (mean) coil diameter", "mm"),
                    Variable::new("DE", "External coil diameter", "mm"),
                    Variable::new("d", "Wire diameter", "mm"),
                ],
                assumptions: vec!["Round wire"],
                category: EquationCategory::Geometry,
                source_module: "equations/builder.rs",
                source_function: "EquationBuilder::build",
            },

            Equation::MediumFromInternal => EquationMetadata {
                name: "Medium Diameter from Internal Diameter",
                description: "Mean coil diameter from the inside diameter and wire gauge",
                formula_plain: "DM = DI + d",
                reference: CodeReference::Mechanics,
                variables: vec![
                    Variable::new("DM", "Medium (mean) coil diameter", "mm"),
                    Variable::new("DI", "Internal coil diameter", "mm"),
                    Variable::new("d", "Wire diameter", "mm"),
                ],
                assumptions: vec!["Round wire"],
                category: EquationCategory::Geometry,
                source_module: "equations/builder.rs",
                source_function: "EquationBuilder::build",
            },

            Equation::ActiveTurns => EquationMetadata {
                name: "Active Turns",
                description: "Turns that deflect under load; end turns are inactive",
                formula_plain: "Na = Nt - n_e",
                reference: CodeReference::Shigley { edition: 10, section: "10-5, Table 10-1" },
                variables: vec![
                    Variable::new("Na", "Active turns", "-"),
                    Variable::new("Nt", "Total turns", "-"),
                    Variable::new(
                        "n_e",
                        "Inactive end turns: 2 closed, 1 open-ground, 0 open",
                        "-",
                    ),
                ],
                assumptions: vec!["Extension and torsion springs use open ends"],
                category: EquationCategory::Geometry,
                source_module: "equations/spring.rs",
                source_function: "active_turns",
            },

            Equation::FreeLength => EquationMetadata {
                name: "Free Length",
                description: "Unloaded length of the spring",
                formula_plain: "Lo = p*Na + e*d",
                reference: CodeReference::Shigley { edition: 10, section: "10-5, Table 10-1" },
                variables: vec![
                    Variable::new("Lo", "Free length", "mm"),
                    Variable::new("p", "Pitch", "mm"),
                    Variable::new("Na", "Active turns", "-"),
                    Variable::new(
                        "e",
                        "End allowance: 2 closed-ground, 3 closed, 0 open-ground, 1 open",
                        "-",
                    ),
                ],
                assumptions: vec!["Uniform pitch over active turns"],
                category: EquationCategory::Geometry,
                source_module: "equations/spring.rs",
                source_function: "free_length",
            },

            Equation::SolidLength => EquationMetadata {
                name: "Solid Length",
                description: "Length with all coils in contact",
                formula_plain: "Ls = d*(Nt + s)",
                reference: CodeReference::Shigley { edition: 10, section: "10-5, Table 10-1" },
                variables: vec![
                    Variable::new("Ls", "Solid length", "mm"),
                    Variable::new("s", "Unground end allowance: 0 ground, 1 unground", "-"),
                ],
                assumptions: vec!["Ground ends remove half a wire diameter each"],
                category: EquationCategory::Geometry,
                source_module: "equations/spring.rs",
                source_function: "solid_length",
            },

            Equation::SpringIndex => EquationMetadata {
                name: "Spring Index",
                description: "Ratio of mean coil diameter to wire diameter",
                formula_plain: "C = DM / d",
                reference: CodeReference::Shigley { edition: 10, section: "10-2" },
                variables: vec![
                    Variable::new("C", "Spring index", "-"),
                    Variable::new("DM", "Medium coil diameter", "mm"),
                    Variable::new("d", "Wire diameter", "mm"),
                ],
                assumptions: vec![],
                category: EquationCategory::Geometry,
                source_module: "equations/builder.rs",
                source_function: "EquationBuilder::build",
            },

            Equation::CoilGap => EquationMetadata {
                name: "Coil Gap",
                description: "Clearance between adjacent active coils",
                formula_plain: "gap = p - d",
                reference: CodeReference::Mechanics,
                variables: vec![
                    Variable::new("gap", "Coil gap", "mm"),
                    Variable::new("p", "Pitch", "mm"),
                ],
                assumptions: vec!["Extension and torsion springs are close wound (gap = 0)"],
                category: EquationCategory::Geometry,
                source_module: "equations/builder.rs",
                source_function: "EquationBuilder::build",
            },

            Equation::CoilMass => EquationMetadata {
                name: "Coil Mass",
                description: "Mass of the coiled wire",
                formula_plain: "w = rho*(pi*d/2)^2*DM*Nt",
                reference: CodeReference::Shigley { edition: 10, section: "10-9" },
                variables: vec![
                    Variable::new("w", "Mass", "kg"),
                    Variable::new("rho", "Density", "kg/mm^3"),
                ],
                assumptions: vec!["Wire length approximated as DM*Nt*pi"],
                category: EquationCategory::Mass,
                source_module: "equations/spring.rs",
                source_function: "coil_mass",
            },

            Equation::HookMass => EquationMetadata {
                name: "Hook Mass",
                description: "Wire mass added by the two extension hooks",
                formula_plain: "dw = pi*d^2*rho*(La + 2*pi*DM)/4",
                reference: CodeReference::Mechanics,
                variables: vec![
                    Variable::new("La", "Extra hook wire length", "mm"),
                    Variable::new("rho", "Density", "kg/mm^3"),
                ],
                assumptions: vec!["Each hook is one full turn of mean diameter"],
                category: EquationCategory::Mass,
                source_module: "equations/spring.rs",
                source_function: "hook_mass",
            },

            Equation::LegMass => EquationMetadata {
                name: "Leg Mass",
                description: "Wire mass added by the two torsion legs",
                formula_plain: "dw = pi*d^2*rho*(L1 + L2)/4",
                reference: CodeReference::Mechanics,
                variables: vec![
                    Variable::new("L1", "Leg 1 length", "mm"),
                    Variable::new("L2", "Leg 2 length", "mm"),
                ],
                assumptions: vec!["Straight legs"],
                category: EquationCategory::Mass,
                source_module: "equations/spring.rs",
                source_function: "leg_mass",
            },

            Equation::HelicalRate => EquationMetadata {
                name: "Helical Spring Rate",
                description: "Axial rate of a compression or extension spring",
                formula_plain: "k = G*d^4 / (8*Na*DM^3)",
                reference: CodeReference::Shigley { edition: 10, section: "10-4" },
                variables: vec![
                    Variable::new("k", "Spring rate", "N/mm"),
                    Variable::new("G", "Shear modulus", "MPa"),
                    Variable::new("Na", "Active turns", "-"),
                ],
                assumptions: vec!["Linear elastic", "Initial tension neglected"],
                category: EquationCategory::Rate,
                source_module: "equations/spring.rs",
                source_function: "helical_rate",
            },

            Equation::TorsionRate => EquationMetadata {
                name: "Torsion Spring Rate",
                description: "Angular rate including the contribution of the legs",
                formula_plain: "k = E*d^4 / (3888*DM*(Nt + (L1+L2)/(3*pi*DM)))",
                reference: CodeReference::Shigley { edition: 10, section: "10-12" },
                variables: vec![
                    Variable::new("k", "Angular rate", "N*mm/deg"),
                    Variable::new("E", "Elastic modulus", "MPa"),
                    Variable::new("L1", "Leg 1 length", "mm"),
                    Variable::new("L2", "Leg 2 length", "mm"),
                ],
                assumptions: vec!["Empirical 1.05 friction factor included in 3888 = 10.8*360"],
                category: EquationCategory::Rate,
                source_module: "equations/spring.rs",
                source_function: "torsion_rate",
            },

            Equation::LoadDeflection => EquationMetadata {
                name: "Load-Deflection Law",
                description: "Force (moment) proportional to deflection (angle)",
                formula_plain: "F = k*x",
                reference: CodeReference::Mechanics,
                variables: vec![
                    Variable::new("F", "Force (torsion: moment)", "N (N*mm)"),
                    Variable::new("x", "Deflection (torsion: angle)", "mm (deg)"),
                ],
                assumptions: vec!["Compression deflection limited to Lo - Ls"],
                category: EquationCategory::Rate,
                source_module: "calculations/force.rs",
                source_function: "force_or_deflection",
            },

            Equation::NaturalFrequency => EquationMetadata {
                name: "Natural Frequency",
                description: "First surge frequency of a spring between parallel plates",
                formula_plain: "fn = d*sqrt(G) / (sqrt(2*rho)*DM^2*Na)",
                reference: CodeReference::Shigley { edition: 10, section: "10-9" },
                variables: vec![
                    Variable::new("fn", "Natural frequency", "Hz"),
                    Variable::new("rho", "Density", "kg/mm^3"),
                ],
                assumptions: vec!["Both ends against flat parallel plates"],
                category: EquationCategory::Dynamics,
                source_module: "equations/spring.rs",
                source_function: "natural_frequency",
            },

            Equation::MaxOperatingFrequency => EquationMetadata {
                name: "Maximum Operating Frequency",
                description: "Operating frequency kept well below surge",
                formula_plain: "f_max = fn/divisor*60",
                reference: CodeReference::Smi { section: "Dynamic loading" },
                variables: vec![
                    Variable::new("f_max", "Maximum operating frequency", "cycles/min"),
                    Variable::new("divisor", "13 for fix-parallel/both-pivot, 26 otherwise", "-"),
                ],
                assumptions: vec![],
                category: EquationCategory::Dynamics,
                source_module: "equations/spring.rs",
                source_function: "max_operating_frequency",
            },

            Equation::FatigueLife => EquationMetadata {
                name: "Estimated Minimum Life",
                description: "Running time to reach the design cycle count",
                formula_plain: "life = cycles / f_max",
                reference: CodeReference::Mechanics,
                variables: vec![
                    Variable::new("life", "Minimum life", "min"),
                    Variable::new("cycles", "Design cycle count", "-"),
                ],
                assumptions: vec!["Continuous operation at f_max"],
                category: EquationCategory::Dynamics,
                source_module: "calculations/verify.rs",
                source_function: "check_fatigue",
            },

            Equation::WahlFactor => EquationMetadata {
                name: "Wahl Factor",
                description: "Combined direct-shear and curvature correction",
                formula_plain: "Kw = (4C-1)/(4C-4) + 0.615/C",
                reference: CodeReference::Wahl { chapter: 2 },
                variables: vec![
                    Variable::new("Kw", "Wahl factor", "-"),
                    Variable::new("C", "Spring index", "-"),
                ],
                assumptions: vec!["C > 1"],
                category: EquationCategory::StressFactors,
                source_module: "equations/spring.rs",
                source_function: "wahl_factor",
            },

            Equation::HookBendingFactor => EquationMetadata {
                name: "Hook Bending Factor",
                description: "Curvature factor for bending at hook point A",
                formula_plain: "Ka = (4C1^2 - C1 - 1)/(4*C1*(C1-1)), C1 = 2*Ra/d",
                reference: CodeReference::Shigley { edition: 10, section: "10-11" },
                variables: vec![
                    Variable::new("Ka", "Hook bending factor", "-"),
                    Variable::new("Ra", "Hook bend radius at A", "mm"),
                ],
                assumptions: vec!["C1 > 1"],
                category: EquationCategory::StressFactors,
                source_module: "equations/spring.rs",
                source_function: "hook_bending_factor",
            },

            Equation::CurvatureFactor => EquationMetadata {
                name: "Curvature Factor",
                description:
                    "Curvature correction for torsion at hook B or bending in a torsion body",
                formula_plain: "Kb = (4C-1)/(4C-4)",
                reference: CodeReference::Shigley { edition: 10, section: "10-11, 10-12" },
                variables: vec![Variable::new("Kb", "Curvature factor", "-")],
                assumptions: vec!["Hook B: C = 2*Rb/d > 4"],
                category: EquationCategory::StressFactors,
                source_module: "equations/spring.rs",
                source_function: "curvature_factor",
            },

            Equation::TensileStrength => EquationMetadata {
                name: "Minimum Tensile Strength",
                description: "Wire tensile strength as a power law of gauge",
                formula_plain: "Sut = A / d^m",
                reference: CodeReference::Shigley { edition: 10, section: "10-7, Table 10-4" },
                variables: vec![
                    Variable::new("Sut", "Minimum tensile strength", "MPa"),
                    Variable::new("A", "Strength coefficient", "MPa*mm^m"),
                    Variable::new("m", "Exponent", "-"),
                ],
                assumptions: vec!["Gauge inside the tabulated range"],
                category: EquationCategory::Stresses,
                source_module: "materials/mod.rs",
                source_function: "StrengthCoefficients::tensile_strength_mpa",
            },

            Equation::BodyShearStress => EquationMetadata {
                name: "Body Shear Stress",
                description: "Corrected torsional shear in the coil body",
                formula_plain: "s*Sut = 8*Kw*DM*F/(pi*d^3)",
                reference: CodeReference::Shigley { edition: 10, section: "10-2" },
                variables: vec![
                    Variable::new("s", "Stress as a ratio of Sut", "-"),
                    Variable::new("F", "Axial force", "N"),
                ],
                assumptions: vec!["Compression and extension bodies"],
                category: EquationCategory::Stresses,
                source_module: "equations/spring.rs",
                source_function: "body_shear_stress",
            },

            Equation::HookBendingStress => EquationMetadata {
                name: "Hook Bending Stress",
                description: "Bending plus direct tension at hook point A",
                formula_plain: "s*Sut = 32*Ka*DM*F/(pi*d^3) + 4*F/(pi*d^2)",
                reference: CodeReference::Shigley { edition: 10, section: "10-11" },
                variables: vec![Variable::new("s", "Stress as a ratio of Sut", "-")],
                assumptions: vec!["Full-loop hooks"],
                category: EquationCategory::Stresses,
                source_module: "equations/spring.rs",
                source_function: "hook_bending_stress",
            },

            Equation::HookTorsionStress => EquationMetadata {
                name: "Hook Torsion Stress",
                description: "Torsional shear at hook point B",
                formula_plain: "s*Sut = 16*Kb*DM*F/(pi*d^3)",
                reference: CodeReference::Shigley { edition: 10, section: "10-11" },
                variables: vec![Variable::new("s", "Stress as a ratio of Sut", "-")],
                assumptions: vec!["Full-loop hooks"],
                category: EquationCategory::Stresses,
                source_module: "equations/spring.rs",
                source_function: "hook_torsion_stress",
            },

            Equation::TorsionBendingStress => EquationMetadata {
                name: "Torsion Spring Bending Stress",
                description: "Bending stress in the body of a torsion spring",
                formula_plain: "s*Sut = 32*Kb*M/(pi*d^3)",
                reference: CodeReference::Shigley { edition: 10, section: "10-12" },
                variables: vec![
                    Variable::new("M", "Applied moment", "N*mm"),
                    Variable::new("Kb", "Curvature factor at the spring index", "-"),
                ],
                assumptions: vec!["Inner fiber governs"],
                category: EquationCategory::Stresses,
                source_module: "equations/spring.rs",
                source_function: "torsion_bending_stress",
            },

            Equation::SpringIndexRange => EquationMetadata {
                name: "Spring Index Range",
                description: "Manufacturability band for the spring index",
                formula_plain: "4 < C < 12",
                reference: CodeReference::Shigley { edition: 10, section: "10-2" },
                variables: vec![Variable::new("C", "Spring index", "-")],
                assumptions: vec![],
                category: EquationCategory::DesignChecks,
                source_module: "calculations/verify.rs",
                source_function: "check_index",
            },

            Equation::BucklingLength => EquationMetadata {
                name: "Buckling Free Length",
                description: "Largest free length before a compression spring buckles",
                formula_plain: "Lo_max = 2.63*DM/alpha",
                reference: CodeReference::Shigley { edition: 10, section: "10-6" },
                variables: vec![
                    Variable::new("alpha", "End condition constant: 0.5, 0.707, 1, 2", "-"),
                    Variable::new("DM", "Medium coil diameter", "mm"),
                ],
                assumptions: vec!["Steel springs", "Compression springs only"],
                category: EquationCategory::DesignChecks,
                source_module: "equations/spring.rs",
                source_function: "buckling_free_length",
            },

            Equation::FatigueAllowable => EquationMetadata {
                name: "Fatigue Allowable Stress",
                description: "Allowable stress ratio for a design cycle count, no shot peening",
                formula_plain: "s_allow = table(variant, location, material, cycles)",
                reference: CodeReference::Smi { section: "Fatigue tables" },
                variables: vec![
                    Variable::new("s_allow", "Allowable stress as a ratio of Sut", "-"),
                    Variable::new("cycles", "1e5, 1e6 or 1e7", "-"),
                ],
                assumptions: vec!["Untabulated cycle counts use the 1e6 row"],
                category: EquationCategory::DesignChecks,
                source_module: "calculations/verify.rs",
                source_function: "check_fatigue",
            },

            Equation::StaticStressLimit => EquationMetadata {
                name: "Static Stress Limit",
                description: "Static stress ratio above which the spring is overstressed",
                formula_plain: "s <= s_max(variant, location, material)",
                reference: CodeReference::Smi { section: "Static loading" },
                variables: vec![Variable::new("s_max", "Maximum static stress ratio", "-")],
                assumptions: vec!["Compression springs between 0.4 and 0.6 need set removal"],
                category: EquationCategory::DesignChecks,
                source_module: "calculations/verify.rs",
                source_function: "rate_stress",
            },
        }
    }

    /// Get all equations in a given category
    pub fn in_category(category: EquationCategory) -> Vec<Equation> {
        ALL_EQUATIONS
            .iter()
            .filter(|eq| eq.metadata().category == category)
            .copied()
            .collect()
    }

    /// Get all categories, in document order
    pub fn all_categories() -> Vec<EquationCategory> {
        use EquationCategory::*;
        let mut cats = vec![Geometry, Mass, Rate, Dynamics, StressFactors, Stresses, DesignChecks];
        cats.sort_by_key(|c| c.sort_order());
        cats
    }
}

impl std::fmt::Display for Equation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.metadata().name)
    }
}

/// All equations in the registry (for iteration)
pub static ALL_EQUATIONS: &[Equation] = &[
    Equation::MediumFromExternal,
    Equation::MediumFromInternal,
    Equation::ActiveTurns,
    Equation::FreeLength,
    Equation::SolidLength,
    Equation::SpringIndex,
    Equation::CoilGap,
    Equation::CoilMass,
    Equation::HookMass,
    Equation::LegMass,
    Equation::HelicalRate,
    Equation::TorsionRate,
    Equation::LoadDeflection,
    Equation::NaturalFrequency,
    Equation::MaxOperatingFrequency,
    Equation::FatigueLife,
    Equation::WahlFactor,
    Equation::HookBendingFactor,
    Equation::CurvatureFactor,
    Equation::TensileStrength,
    Equation::BodyShearStress,
    Equation::HookBendingStress,
    Equation::HookTorsionStress,
    Equation::TorsionBendingStress,
    Equation::SpringIndexRange,
    Equation::BucklingLength,
    Equation::FatigueAllowable,
    Equation::StaticStressLimit,
];

// ============================================================================
// Equation Usage Tracking
// ============================================================================

/// Record of an equation being used during a solve or check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquationUsage {
    pub equation: Equation,
    /// How it was used (e.g. "solved directly", "back-substitution")
    pub context: String,
    /// The parameter this equation resolved, if any
    pub parameter: Option<ParamName>,
}

impl EquationUsage {
    pub fn new(equation: Equation, context: impl Into<String>) -> Self {
        Self {
            equation,
            context: context.into(),
            parameter: None,
        }
    }

    pub fn for_parameter(
        equation: Equation,
        context: impl Into<String>,
        parameter: ParamName,
    ) -> Self {
        Self {
            equation,
            context: context.into(),
            parameter: Some(parameter),
        }
    }
}

/// Collector for equation usage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquationTracker {
    usages: Vec<EquationUsage>,
}

impl EquationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, equation: Equation, context: impl Into<String>) {
        self.usages.push(EquationUsage::new(equation, context));
    }

    /// Record that `equation` produced the value of `parameter`
    pub fn record_for_parameter(
        &mut self,
        equation: Equation,
        context: impl Into<String>,
        parameter: ParamName,
    ) {
        self.usages.push(EquationUsage::for_parameter(equation, context, parameter));
    }

    pub fn usages(&self) -> &[EquationUsage] {
        &self.usages
    }

    pub fn is_empty(&self) -> bool {
        self.usages.is_empty()
    }

    /// Get unique equations used (deduplicated, first-use order)
    pub fn unique_equations(&self) -> Vec<Equation> {
        let mut seen = HashSet::new();
        self.usages
            .iter()
            .filter(|u| seen.insert(u.equation))
            .map(|u| u.equation)
            .collect()
    }

    /// Equation that produced `parameter`, if it was derived
    pub fn source_of(&self, parameter: ParamName) -> Option<Equation> {
        self.usages
            .iter()
            .rev()
            .find(|u| u.parameter == Some(parameter))
            .map(|u| u.equation)
    }

    /// Derived parameters and their producing equation
    pub fn sources(&self) -> BTreeMap<ParamName, Equation> {
        self.usages
            .iter()
            .filter_map(|u| u.parameter.map(|p| (p, u.equation)))
            .collect()
    }

    /// Group unique equations by category, in document order
    pub fn by_category(&self) -> Vec<(EquationCategory, Vec<Equation>)> {
        let mut by_cat: BTreeMap<EquationCategory, Vec<Equation>> = BTreeMap::new();
        for eq in self.unique_equations() {
            by_cat.entry(eq.metadata().category).or_default().push(eq);
        }
        let mut result: Vec<_> = by_cat.into_iter().collect();
        result.sort_by_key(|(cat, _)| cat.sort_order());
        result
    }

    /// Markdown tables of the equations behind each derived parameter,
    /// one section per category
    pub fn generate_report_markdown(&self) -> String {
        let mut output = String::from("## Equations Used\n\n");
        if self.usages.is_empty() {
            output.push_str("No equations recorded.\n");
            return output;
        }
        for (category, equations) in self.by_category() {
            output.push_str(&format!("### {}\n\n", category.display_name()));
            output.push_str("| Parameter | Equation | Formula | How |\n");
            output.push_str("|-----------|----------|---------|-----|\n");
            for usage in self.usages.iter().filter(|u| equations.contains(&u.equation)) {
                let meta = usage.equation.metadata();
                let parameter = usage.parameter.map(|p| p.symbol()).unwrap_or("-");
                output.push_str(&format!(
                    "| {} | {} | `{}` | {} |\n",
                    parameter, meta.name, meta.formula_plain, usage.context
                ));
            }
            output.push('\n');
        }
        output
    }
}

// ============================================================================
// Markdown Documentation Generation
// ============================================================================

/// Generate the complete equations reference as markdown.
///
/// Run `cargo run --bin gen-equations` to write it to
/// `spring_core/src/equations/EQUATIONS.md`.
///
/// ```rust
/// use spring_core::equations::registry::generate_equations_markdown;
///
/// let markdown = generate_equations_markdown();
/// assert!(markdown.contains("Springcalc Equations Reference"));
/// assert!(markdown.contains("## Geometry"));
/// ```
pub fn generate_equations_markdown() -> String {
    let mut output = String::with_capacity(24_000);

    output.push_str(
        r#"# Springcalc Equations Reference

> **Auto-generated from source code. Do not edit manually.**
>
> Regenerate with: `cargo run --bin gen-equations`

This document lists every formula used by the spring solver and checks.
Each equation includes its formula, reference, source location and assumptions.

## Units

| Quantity | Unit |
|----------|------|
| Lengths, diameters | mm |
| Force | N (torsion: moment in N*mm) |
| Deflection | mm (torsion: angle in deg) |
| Rate | N/mm (torsion: N*mm/deg) |
| Mass | kg |
| Frequency | Hz |
| Stress | ratio of minimum tensile strength Sut |

---

"#,
    );

    let categories = Equation::all_categories();

    for category in &categories {
        let equations = Equation::in_category(*category);
        if equations.is_empty() {
            continue;
        }

        output.push_str(&format!("## {}\n\n", category.display_name()));

        for equation in equations {
            let meta = equation.metadata();

            output.push_str(&format!("### {}\n\n", meta.name));
            output.push_str(&format!("{}\n\n", meta.description));
            output.push_str(&format!("**Formula:** `{}`\n\n", meta.formula_plain));

            if !meta.variables.is_empty() {
                output.push_str("**Variables:**\n\n");
                output.push_str("| Symbol | Description | Units |\n");
                output.push_str("|--------|-------------|-------|\n");
                for var in &meta.variables {
                    output.push_str(&format!(
                        "| {} | {} | {} |\n",
                        var.symbol, var.description, var.units
                    ));
                }
                output.push('\n');
            }

            output.push_str(&format!("**Reference:** {}\n\n", meta.reference.citation()));
            output.push_str(&format!(
                "**Source:** [`{}`](../{})\n\n",
                meta.source_function, meta.source_module
            ));

            if !meta.assumptions.is_empty() {
                output.push_str("**Assumptions:**\n");
                for assumption in &meta.assumptions {
                    output.push_str(&format!("- {}\n", assumption));
                }
                output.push('\n');
            }

            output.push_str("---\n\n");
        }
    }

    output.push_str(&format!(
        "## Statistics\n\n- **Total Equations:** {}\n- **Categories:** {}\n",
        ALL_EQUATIONS.len(),
        categories.len()
    ));

    output
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_equations_have_metadata() {
        assert_eq!(ALL_EQUATIONS.len(), 28);

        for eq in ALL_EQUATIONS {
            let meta = eq.metadata();
            assert!(!meta.name.is_empty(), "Equation {:?} has no name", eq);
            assert!(!meta.formula_plain.is_empty(), "Equation {:?} has no formula", eq);
            assert!(!meta.variables.is_empty(), "Equation {:?} has no variables", eq);
            assert!(!meta.source_function.is_empty(), "Equation {:?} missing source_function", eq);
        }

        assert!(Equation::HelicalRate.metadata().formula_plain.contains("8*Na*DM^3"));
        assert!(Equation::TorsionRate.metadata().formula_plain.contains("3888"));
    }

    #[test]
    fn test_code_reference_citation() {
        let shigley = CodeReference::Shigley { edition: 10, section: "10-4" };
        assert_eq!(shigley.citation(), "Shigley 10ed, Section 10-4");
        assert_eq!(CodeReference::Wahl { chapter: 2 }.short_form(), "Wahl");
    }

    #[test]
    fn test_equation_tracker() {
        let mut tracker = EquationTracker::new();
        let solved = "solved directly";
        tracker.record_for_parameter(Equation::MediumFromExternal, solved, ParamName::Dm);
        tracker.record_for_parameter(Equation::MediumFromInternal, solved, ParamName::Di);
        tracker.record(Equation::MediumFromExternal, "consistency check");

        assert_eq!(tracker.usages().len(), 3);
        assert_eq!(tracker.unique_equations().len(), 2);
        assert_eq!(tracker.source_of(ParamName::Di), Some(Equation::MediumFromInternal));
        assert_eq!(tracker.source_of(ParamName::K), None);
        assert_eq!(tracker.sources().len(), 2);
    }

    #[test]
    fn test_by_category() {
        let mut tracker = EquationTracker::new();
        tracker.record(Equation::HelicalRate, "test");
        tracker.record(Equation::SpringIndex, "test");
        tracker.record(Equation::NaturalFrequency, "test");

        let by_cat = tracker.by_category();
        let categories: Vec<_> = by_cat.iter().map(|(cat, _)| *cat).collect();
        assert_eq!(
            categories,
            vec![EquationCategory::Geometry, EquationCategory::Rate, EquationCategory::Dynamics]
        );
    }

    #[test]
    fn test_report_markdown() {
        let mut tracker = EquationTracker::new();
        assert!(tracker.generate_report_markdown().contains("No equations recorded"));
        tracker.record_for_parameter(Equation::SpringIndex, "solved directly", ParamName::C);
        tracker.record_for_parameter(Equation::HelicalRate, "solved directly", ParamName::K);
        let report = tracker.generate_report_markdown();
        assert!(report.contains("| C | Spring Index | `C = DM / d` | solved directly |"));

        let geometry = report.find("### Geometry").unwrap();
        let rate = report.find("### Rate").unwrap();
        assert!(geometry < rate);
        assert!(report[rate..].contains("| k | "));
        assert!(!report[geometry..rate].contains("| k | "));
    }

    #[test]
    fn test_generate_equations_markdown() {
        let markdown = generate_equations_markdown();

        assert!(markdown.contains("# Springcalc Equations Reference"));
        assert!(markdown.contains("Auto-generated from source code"));
        for category in Equation::all_categories() {
            assert!(markdown.contains(&format!("## {}", category.display_name())));
        }
        assert!(markdown.contains("### Wahl Factor"));
        assert!(markdown.contains("`Kw = (4C-1)/(4C-4) + 0.615/C`"));
        assert!(markdown.contains("Shigley 10ed"));
        assert!(markdown.contains("**Total Equations:** 28"));
        assert!(markdown.contains("**Categories:** 7"));
    }
}
