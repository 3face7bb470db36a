//! # Spring Instances
//!
//! A [`Spring`] owns one configuration, one [`ParameterSet`] and the
//! material data looked up for it. `solve` fills in the parameters from a
//! partial set of known values; everything downstream (force, stress,
//! verification checks) reads the resolved parameters.
//!
//! ## Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! use spring_core::config::{Ending, Fixing, SpringConfig};
//! use spring_core::materials::MaterialDb;
//! use spring_core::params::ParamName;
//! use spring_core::spring::{SolveStatus, Spring};
//!
//! let db = Arc::new(MaterialDb::builtin().unwrap());
//! let config = SpringConfig::new(Ending::ClosedGround, Fixing::FixPivot, "A227");
//! let mut spring = Spring::compression(config, db).unwrap();
//!
//! let known = BTreeMap::from([
//!     ("d".to_string(), 1.0),
//!     ("DE".to_string(), 10.0),
//!     ("Nt".to_string(), 8.0),
//!     ("Lo".to_string(), 20.0),
//! ]);
//! let status = spring.solve(5.0, &known).unwrap();
//! assert_eq!(status, SolveStatus::Solved);
//! assert_eq!(spring.parameters().value(ParamName::Na), Some(6.0));
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::calculations::{
    self, BucklingCheck, FatigueCheck, ForceResult, IndexCheck, Load, LocationRating, SolvedSpring,
    StressInput, StressRating, StressResult,
};
use crate::config::{Ending, Fixing, SpringConfig};
use crate::equations::{spring as formulas, EquationBuilder, EquationTracker};
use crate::errors::{SpringError, SpringResult};
use crate::materials::{MaterialProperties, MaterialProvider};
use crate::params::{parse_known_pairs, Bindings, HookGeometry, ParamName, ParameterSet};
use crate::solver::{AlgebraicSolver, ConstraintSolver, TimeoutGuard};
use crate::variant::{HookKind, StressLocation, Variant};

/// Outcome of a successful solve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum SolveStatus {
    /// Every parameter is resolved
    Solved,
    /// The known values did not determine these parameters
    Insufficient { unresolved: BTreeSet<ParamName> },
}

/// Serializable snapshot of a spring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpringSummary {
    pub variant: Variant,
    pub ending: Ending,
    pub fixing: Fixing,
    pub material: String,
    pub hooks: HookGeometry,
    pub parameters: ParameterSet,
    pub solved: bool,
}

/// One helical spring and its parameters
pub struct Spring {
    variant: Variant,
    ending: Ending,
    fixing: Fixing,
    material: MaterialProperties,
    /// Hook/leg geometry as configured (zero hook radii not yet defaulted)
    hooks: HookGeometry,
    params: ParameterSet,
    equations: EquationTracker,
    provider: Arc<dyn MaterialProvider>,
    solver: Arc<dyn ConstraintSolver>,
}

impl fmt::Debug for Spring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spring")
            .field("variant", &self.variant)
            .field("ending", &self.ending)
            .field("fixing", &self.fixing)
            .field("material", &self.material.id)
            .field("hooks", &self.hooks)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Apply the variant's pinned ending/fixing, logging any override
fn pinned_config(variant: Variant, ending: Ending, fixing: Fixing) -> (Ending, Fixing) {
    let (ending_used, fixing_used, changed) = variant.profile().pin(ending, fixing);
    if changed {
        warn!(
            %variant,
            requested_ending = %ending,
            requested_fixing = %fixing,
            ending = %ending_used,
            fixing = %fixing_used,
            "configuration is fixed for this variant, request replaced"
        );
    }
    (ending_used, fixing_used)
}

/// Material lookup for configuration: an unknown id is an invalid option
fn lookup_material(provider: &dyn MaterialProvider, id: &str) -> SpringResult<MaterialProperties> {
    provider.lookup(id).map_err(|e| match e {
        SpringError::MaterialNotFound { material } => {
            let known: Vec<String> = provider.list_materials().into_iter().collect();
            let accepted: Vec<&str> = known.iter().map(String::as_str).collect();
            SpringError::invalid_option("material", material, &accepted)
        }
        other => other,
    })
}

impl Spring {
    /// Build a spring of any variant. The hook geometry must match the
    /// variant's kind.
    pub fn new(
        variant: Variant,
        config: SpringConfig,
        provider: Arc<dyn MaterialProvider>,
        hooks: HookGeometry,
    ) -> SpringResult<Self> {
        let expected = variant.profile().hook_kind;
        let matches = matches!(
            (expected, hooks),
            (HookKind::None, HookGeometry::None)
                | (HookKind::Hooks, HookGeometry::Extension { .. })
                | (HookKind::Legs, HookGeometry::Torsion { .. })
        );
        if !matches {
            return Err(SpringError::invalid_value(
                "hooks",
                format!("{:?}", hooks),
                format!("does not apply to {} springs", variant),
            ));
        }
        hooks.validate()?;

        let material = lookup_material(provider.as_ref(), &config.material)?;
        let (ending, fixing) = pinned_config(variant, config.ending, config.fixing);

        Ok(Self {
            variant,
            ending,
            fixing,
            material,
            hooks,
            params: ParameterSet::all_unresolved(),
            equations: EquationTracker::new(),
            provider,
            solver: Arc::new(AlgebraicSolver::new()),
        })
    }

    pub fn compression(
        config: SpringConfig,
        provider: Arc<dyn MaterialProvider>,
    ) -> SpringResult<Self> {
        Self::new(Variant::Compression, config, provider, HookGeometry::None)
    }

    /// Extension spring with no extra hook length and radii defaulting to DM.
    ///
    /// Every parameter stays tracked. `gap` is pinned to 0 (and `p` follows
    /// as `d`) rather than dropped from the set.
    pub fn extension(
        config: SpringConfig,
        provider: Arc<dyn MaterialProvider>,
    ) -> SpringResult<Self> {
        Self::new(Variant::Extension, config, provider, HookGeometry::extension(0.0))
    }

    /// Torsion spring with leg lengths `l1_mm` and `l2_mm`.
    ///
    /// As for extension springs, `gap` is pinned to 0 rather than dropped.
    pub fn torsion(
        config: SpringConfig,
        provider: Arc<dyn MaterialProvider>,
        l1_mm: f64,
        l2_mm: f64,
    ) -> SpringResult<Self> {
        Self::new(Variant::Torsion, config, provider, HookGeometry::torsion(l1_mm, l2_mm))
    }

    /// Replace the solving strategy
    pub fn with_solver(mut self, solver: Arc<dyn ConstraintSolver>) -> Self {
        self.solver = solver;
        self
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Change ending, fixing and material. Nothing changes unless all three
    /// are valid; on success the parameters are reset.
    pub fn configure(&mut self, ending: &str, fixing: &str, material: &str) -> SpringResult<()> {
        let config = SpringConfig::parse(ending, fixing, material)?;
        let properties = lookup_material(self.provider.as_ref(), &config.material)?;
        let (ending, fixing) = pinned_config(self.variant, config.ending, config.fixing);

        self.ending = ending;
        self.fixing = fixing;
        self.material = properties;
        self.reset();
        Ok(())
    }

    /// Set extension hook geometry; resets the parameters
    pub fn set_hook_geometry(&mut self, hooks: HookGeometry) -> SpringResult<()> {
        if self.variant != Variant::Extension {
            return Err(SpringError::unsupported("set_hook_geometry", self.variant.code()));
        }
        if !matches!(hooks, HookGeometry::Extension { .. }) {
            return Err(SpringError::invalid_value(
                "hooks",
                format!("{:?}", hooks),
                "extension springs take extension hook geometry",
            ));
        }
        hooks.validate()?;
        self.hooks = hooks;
        self.reset();
        Ok(())
    }

    /// Return every parameter to unresolved
    pub fn reset(&mut self) {
        self.params.reset();
        self.equations = EquationTracker::new();
    }

    // =========================================================================
    // Solving
    // =========================================================================

    /// Validate known values by name. Unknown names are dropped with a warning.
    fn known_bindings(&self, known: &BTreeMap<String, f64>) -> SpringResult<Bindings> {
        let mut bindings = Bindings::new();
        for (name, value) in known {
            match name.parse::<ParamName>() {
                Ok(param) => {
                    bindings.insert(param, param.validate(*value)?);
                }
                Err(_) => warn!(name = %name, "unknown parameter name ignored"),
            }
        }

        if self.variant.profile().zero_gap {
            if let Some(gap) = bindings.insert(ParamName::Gap, 0.0) {
                if gap != 0.0 {
                    warn!(
                        gap,
                        variant = %self.variant,
                        "coils are wound tight, supplied gap replaced by 0"
                    );
                }
            }
        }
        Ok(bindings)
    }

    /// Solve from the known values within `deadline_secs`.
    ///
    /// The previous parameters are replaced only when the solve succeeds.
    /// Known values win over derived ones.
    pub fn solve(
        &mut self,
        deadline_secs: f64,
        known: &BTreeMap<String, f64>,
    ) -> SpringResult<SolveStatus> {
        let guard = TimeoutGuard::new(deadline_secs)?;
        let bindings = self.known_bindings(known)?;
        let started = Instant::now();

        let builder = EquationBuilder::new(self.ending, &self.material);
        let mut system = builder.build();
        system.push_relation(builder.rate_relation(self.variant.profile().rate, &self.hooks));
        debug!(relations = system.len(), known = bindings.len(), "equation system assembled");

        let outcome = guard.run(Arc::clone(&self.solver), system, bindings.clone())?;

        let mut params = ParameterSet::all_unresolved();
        for (name, value) in outcome.values.iter().chain(bindings.iter()) {
            params.set(*name, *value);
        }
        params.check_domain()?;

        if params.is_fully_resolved() {
            self.add_auxiliary_mass(&mut params)?;
        }

        self.params = params;
        self.equations = outcome.trace;

        let status = if self.params.is_fully_resolved() {
            SolveStatus::Solved
        } else {
            SolveStatus::Insufficient {
                unresolved: self.params.unresolved(),
            }
        };
        info!(
            variant = %self.variant,
            elapsed_ms = started.elapsed().as_millis() as u64,
            unresolved = self.params.unresolved().len(),
            "solve finished"
        );
        Ok(status)
    }

    /// Solve from `name=value` strings
    pub fn solve_text<S: AsRef<str>>(
        &mut self,
        deadline_secs: f64,
        pairs: &[S],
    ) -> SpringResult<SolveStatus> {
        let known = parse_known_pairs(pairs)?;
        self.solve(deadline_secs, &known)
    }

    /// Hook or leg wire mass on top of the coil mass
    fn add_auxiliary_mass(&self, params: &mut ParameterSet) -> SpringResult<()> {
        let rho = self.material.density_kg_mm3;
        let d = params.require(ParamName::D, "mass")?;
        let w = params.require(ParamName::W, "mass")?;
        let extra = match self.hooks {
            HookGeometry::None => return Ok(()),
            HookGeometry::Extension { la_mm, .. } => {
                formulas::hook_mass(rho, d, params.require(ParamName::Dm, "mass")?, la_mm)
            }
            HookGeometry::Torsion { l1_mm, l2_mm } => formulas::leg_mass(rho, d, l1_mm, l2_mm),
        };
        params.set(ParamName::W, w + extra);
        Ok(())
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn ending(&self) -> Ending {
        self.ending
    }

    pub fn fixing(&self) -> Fixing {
        self.fixing
    }

    pub fn material(&self) -> &MaterialProperties {
        &self.material
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    pub fn unresolved_parameters(&self) -> BTreeSet<ParamName> {
        self.params.unresolved()
    }

    pub fn is_solved(&self) -> bool {
        self.params.is_fully_resolved()
    }

    /// Hook geometry, zero radii replaced by DM once DM is known
    pub fn hooks(&self) -> HookGeometry {
        match self.params.value(ParamName::Dm) {
            Some(dm) => self.hooks.with_default_radii(dm),
            None => self.hooks,
        }
    }

    /// Equations behind the last successful solve
    pub fn equations_used(&self) -> &EquationTracker {
        &self.equations
    }

    pub fn summary(&self) -> SpringSummary {
        SpringSummary {
            variant: self.variant,
            ending: self.ending,
            fixing: self.fixing,
            material: self.material.id.clone(),
            hooks: self.hooks(),
            parameters: self.params.clone(),
            solved: self.is_solved(),
        }
    }

    // =========================================================================
    // Force, stress and checks
    // =========================================================================

    fn solved(&self, operation: &str) -> SpringResult<SolvedSpring> {
        let hooks = self.hooks();
        SolvedSpring::from_parameters(self.variant, self.fixing, &self.params, hooks, operation)
    }

    /// Minimum tensile strength Sut (MPa) at the solved wire gauge
    pub fn tensile_strength(&self) -> SpringResult<f64> {
        let d = self.params.require(ParamName::D, "tensile strength")?;
        let coefficients = self.provider.strength_coefficients(&self.material.id, d)?;
        Ok(coefficients.tensile_strength_mpa(d))
    }

    pub fn force_or_deflection(&self, load: Load) -> SpringResult<ForceResult> {
        calculations::force_or_deflection(&self.solved("force_or_deflection")?, load)
    }

    pub fn stress(&self, input: StressInput) -> SpringResult<StressResult> {
        let spring = self.solved("stress")?;
        calculations::stress(&spring, self.tensile_strength()?, input)
    }

    /// Stress at one location (extension springs only)
    pub fn stress_at(
        &self,
        location: StressLocation,
        input: StressInput,
    ) -> SpringResult<StressResult> {
        if self.variant != Variant::Extension {
            return Err(SpringError::unsupported("stress_at", self.variant.code()));
        }
        let spring = self.solved("stress_at")?;
        calculations::stress_at(&spring, self.tensile_strength()?, location, input)
    }

    pub fn check_index(&self) -> SpringResult<IndexCheck> {
        calculations::check_index(&self.params)
    }

    /// `None` for variants that do not buckle
    pub fn check_buckling(&self) -> SpringResult<Option<BucklingCheck>> {
        calculations::check_buckling(self.variant, self.fixing, &self.params)
    }

    pub fn check_fatigue(&self, cycles: f64) -> SpringResult<FatigueCheck> {
        let spring = self.solved("check_fatigue")?;
        let sut = self.tensile_strength()?;
        calculations::check_fatigue(&spring, sut, self.material.fatigue_group, cycles)
    }

    pub fn rate_stress(&self, location: StressLocation, ratio: f64) -> SpringResult<StressRating> {
        calculations::rate_stress(self.variant, &self.material.id, location, ratio)
    }

    /// Rate every location reported in a stress result
    pub fn rate_stress_result(&self, result: &StressResult) -> SpringResult<Vec<LocationRating>> {
        calculations::rate_stress_result(self.variant, &self.material.id, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::IndexVerdict;
    use crate::equations::Equation;
    use crate::materials::MaterialDb;
    use crate::solver::{CancelToken, SolveOutcome};
    use crate::equations::EquationSystem;

    fn provider() -> Arc<dyn MaterialProvider> {
        Arc::new(MaterialDb::builtin().unwrap())
    }

    fn known(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn reference_known() -> BTreeMap<String, f64> {
        known(&[("d", 1.0), ("DE", 10.0), ("Nt", 8.0), ("Lo", 20.0)])
    }

    fn compression(ending: Ending) -> Spring {
        let config = SpringConfig::new(ending, Fixing::FixPivot, "A227");
        Spring::compression(config, provider()).unwrap()
    }

    fn value(spring: &Spring, name: ParamName) -> f64 {
        spring.parameters().value(name).unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-6, "expected {}, got {}", expected, actual);
    }

    struct StallingSolver;

    impl ConstraintSolver for StallingSolver {
        fn solve(
            &self,
            _: &EquationSystem,
            _: &Bindings,
            cancel: &CancelToken,
        ) -> SpringResult<SolveOutcome> {
            loop {
                cancel.check()?;
                std::thread::sleep(std::time::Duration::from_millis(1));
            }
        }
    }

    #[test]
    fn test_end_to_end_compression() {
        let mut spring = compression(Ending::ClosedGround);
        assert_eq!(spring.solve(5.0, &reference_known()).unwrap(), SolveStatus::Solved);

        assert_close(value(&spring, ParamName::Dm), 9.0);
        assert_close(value(&spring, ParamName::Di), 8.0);
        assert_close(value(&spring, ParamName::Na), 6.0);
        assert_close(value(&spring, ParamName::C), 9.0);
        assert_close(value(&spring, ParamName::Ls), 8.0);
        assert_close(value(&spring, ParamName::P), 3.0);
        assert_close(value(&spring, ParamName::Gap), 2.0);
        assert_close(value(&spring, ParamName::K), 80700.0 / (8.0 * 6.0 * 729.0));
        assert!((value(&spring, ParamName::Fn) - 147.52).abs() < 0.01);

        let k = value(&spring, ParamName::K);
        let result = spring.force_or_deflection(Load::Force(28.0)).unwrap();
        assert!((result.force / result.deflection - k).abs() < 1e-9);
        assert!(result.clamped);
        assert_close(result.deflection, 12.0);
    }

    #[test]
    fn test_every_ending() {
        // (ending, Na, p, Ls) for d = 1, Nt = 8, Lo = 20
        let cases = [
            (Ending::ClosedGround, 6.0, 3.0, 8.0),
            (Ending::Closed, 6.0, 17.0 / 6.0, 9.0),
            (Ending::OpenGround, 7.0, 20.0 / 7.0, 8.0),
            (Ending::Open, 8.0, 19.0 / 8.0, 9.0),
        ];
        for (ending, na, p, ls) in cases {
            let mut spring = compression(ending);
            assert_eq!(spring.solve(5.0, &reference_known()).unwrap(), SolveStatus::Solved);
            assert_close(value(&spring, ParamName::Na), na);
            assert_close(value(&spring, ParamName::P), p);
            assert_close(value(&spring, ParamName::Ls), ls);
            assert_close(value(&spring, ParamName::Gap), p - 1.0);
            assert_close(value(&spring, ParamName::W), formulas::coil_mass(7.85e-6, 1.0, 9.0, 8.0));
        }
    }

    #[test]
    fn test_reset_then_solve_is_deterministic() {
        let mut spring = compression(Ending::ClosedGround);
        spring.solve(5.0, &reference_known()).unwrap();
        let first = spring.parameters().clone();

        spring.reset();
        assert_eq!(spring.unresolved_parameters().len(), ParamName::ALL.len());
        assert!(spring.equations_used().is_empty());

        spring.solve(5.0, &reference_known()).unwrap();
        assert_eq!(spring.parameters(), &first);
    }

    #[test]
    fn test_timeout_leaves_parameters_unresolved() {
        let mut spring = compression(Ending::ClosedGround).with_solver(Arc::new(StallingSolver));
        let err = spring.solve(0.01, &reference_known()).unwrap_err();
        assert_eq!(err.error_code(), "TIMEOUT");
        assert_eq!(spring.unresolved_parameters().len(), ParamName::ALL.len());
    }

    #[test]
    fn test_algebraic_solve_past_deadline_keeps_state() {
        let mut spring = compression(Ending::ClosedGround);
        spring.solve(5.0, &known(&[("d", 2.0), ("DE", 20.0)])).unwrap();
        let before = spring.parameters().clone();
        let trace_before = spring.equations_used().clone();

        let err = spring.solve(1e-9, &reference_known()).unwrap_err();
        assert!(matches!(err, SpringError::Timeout { .. }));
        assert!(err.is_recoverable());
        assert_eq!(spring.parameters(), &before);
        assert_eq!(spring.equations_used(), &trace_before);
        assert_eq!(spring.parameters().value(ParamName::D), Some(2.0));
    }

    #[test]
    fn test_algebraic_solve_past_deadline_on_fresh_spring() {
        let mut spring = compression(Ending::ClosedGround);
        let err = spring.solve(1e-9, &reference_known()).unwrap_err();
        assert_eq!(err.error_code(), "TIMEOUT");
        assert!(!spring.is_solved());
        assert_eq!(spring.unresolved_parameters().len(), ParamName::ALL.len());
        assert!(spring.equations_used().is_empty());
    }

    #[test]
    fn test_extension_rates_body_and_hooks() {
        let config = SpringConfig::new(Ending::Open, Fixing::BothPivot, "A227");
        let mut spring = Spring::extension(config, provider()).unwrap();
        spring
            .solve(5.0, &known(&[("d", 1.0), ("DE", 10.0), ("Nt", 8.0)]))
            .unwrap();
        let stress = spring.stress(StressInput::Force(5.0)).unwrap();
        let ratings = spring.rate_stress_result(&stress).unwrap();
        assert_eq!(ratings.len(), 3);
        assert_eq!(ratings[2].location, StressLocation::HookB);
        assert_eq!(ratings[2].ratio, stress.hook_b_ratio.unwrap());
    }

    #[test]
    fn test_elimination_recovers_gauge_and_turns() {
        let mut spring = compression(Ending::ClosedGround);
        let status = spring
            .solve(5.0, &known(&[("DM", 9.0), ("Ls", 8.0), ("Lo", 20.0), ("p", 3.0)]))
            .unwrap();
        assert_eq!(status, SolveStatus::Solved);
        assert_close(value(&spring, ParamName::D), 1.0);
        assert_close(value(&spring, ParamName::Nt), 8.0);
        assert_close(value(&spring, ParamName::De), 10.0);
    }

    #[test]
    fn test_deflection_clamps_to_solid() {
        let mut spring = compression(Ending::ClosedGround);
        spring.solve(5.0, &reference_known()).unwrap();
        let result = spring.force_or_deflection(Load::Deflection(17.0)).unwrap();
        assert!(result.clamped);
        assert_close(result.deflection, 12.0);
    }

    #[test]
    fn test_index_boundaries() {
        for (de, verdict) in [
            (13.0, IndexVerdict::TooLarge),
            (9.0, IndexVerdict::Acceptable),
            (5.0, IndexVerdict::TooSmall),
        ] {
            let mut spring = compression(Ending::ClosedGround);
            let status = spring.solve(5.0, &known(&[("d", 1.0), ("DE", de)])).unwrap();
            assert!(matches!(status, SolveStatus::Insufficient { .. }));
            assert_eq!(spring.check_index().unwrap().verdict, verdict);
        }
    }

    #[test]
    fn test_insufficient_is_a_partial_result() {
        let mut spring = compression(Ending::ClosedGround);
        let status = spring.solve(5.0, &known(&[("d", 1.0)])).unwrap();
        match status {
            SolveStatus::Insufficient { unresolved } => {
                assert!(unresolved.contains(&ParamName::De));
                assert!(!unresolved.contains(&ParamName::D));
            }
            other => panic!("expected partial result, got {:?}", other),
        }
        assert!(!spring.is_solved());
        assert_eq!(
            spring.force_or_deflection(Load::Deflection(1.0)).unwrap_err().error_code(),
            "NOT_SOLVED"
        );
        assert_eq!(spring.check_buckling().unwrap_err().error_code(), "MISSING_PARAMETER");
    }

    #[test]
    fn test_failed_solve_keeps_previous_state() {
        let mut spring = compression(Ending::ClosedGround);
        spring.solve(5.0, &reference_known()).unwrap();
        let before = spring.parameters().clone();

        let err = spring.solve(5.0, &known(&[("d", -1.0)])).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_VALUE");
        assert_eq!(spring.parameters(), &before);

        let err = spring
            .solve(5.0, &known(&[("d", 1.0), ("DE", 10.0), ("DM", 8.0)]))
            .unwrap_err();
        assert_eq!(err.error_code(), "INCONSISTENT_CONSTRAINTS");
        assert_eq!(spring.parameters(), &before);

        let err = spring.solve(0.0, &reference_known()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_VALUE");
    }

    #[test]
    fn test_unknown_names_are_ignored() {
        let mut spring = compression(Ending::ClosedGround);
        let mut values = reference_known();
        values.insert("La".to_string(), 5.0);
        assert_eq!(spring.solve(5.0, &values).unwrap(), SolveStatus::Solved);
    }

    #[test]
    fn test_solve_text() {
        let mut spring = compression(Ending::ClosedGround);
        let status = spring.solve_text(5.0, &["d=1", "DE=10", "Nt=8", "Lo=20"]).unwrap();
        assert_eq!(status, SolveStatus::Solved);
        assert_eq!(spring.solve_text(5.0, &["d=abc"]).unwrap_err().error_code(), "INVALID_VALUE");
    }

    #[test]
    fn test_trace_names_source_equations() {
        let mut spring = compression(Ending::ClosedGround);
        spring.solve(5.0, &reference_known()).unwrap();
        let trace = spring.equations_used();
        assert_eq!(trace.source_of(ParamName::Na), Some(Equation::ActiveTurns));
        assert_eq!(trace.source_of(ParamName::K), Some(Equation::HelicalRate));
        assert_eq!(trace.source_of(ParamName::D), None);
    }

    #[test]
    fn test_compression_checks() {
        let mut spring = compression(Ending::ClosedGround);
        spring.solve(5.0, &reference_known()).unwrap();

        let buckling = spring.check_buckling().unwrap().unwrap();
        assert!(!buckling.buckles);

        let fatigue = spring.check_fatigue(1e6).unwrap();
        assert_eq!(fatigue.governing, StressLocation::Body);
        assert!(fatigue.safe_deflection > 0.0 && fatigue.safe_deflection < 12.0);

        let stress = spring.stress(StressInput::Force(10.0)).unwrap();
        assert!(stress.hook_a_ratio.is_none());
        assert_eq!(
            spring.rate_stress(StressLocation::Body, stress.ratio).unwrap(),
            StressRating::Acceptable
        );
        assert_eq!(
            spring
                .stress_at(StressLocation::Body, StressInput::Force(1.0))
                .unwrap_err()
                .error_code(),
            "UNSUPPORTED_OPERATION"
        );
    }

    #[test]
    fn test_extension_spring() {
        let config = SpringConfig::new(Ending::ClosedGround, Fixing::FixPivot, "A227");
        let mut spring = Spring::extension(config, provider()).unwrap();
        assert_eq!((spring.ending(), spring.fixing()), (Ending::Open, Fixing::BothPivot));

        spring.set_hook_geometry(HookGeometry::extension(10.0)).unwrap();
        let status = spring
            .solve(5.0, &known(&[("d", 1.0), ("DE", 10.0), ("Nt", 8.0), ("gap", 3.0)]))
            .unwrap();
        assert_eq!(status, SolveStatus::Solved);
        assert_close(value(&spring, ParamName::Gap), 0.0);
        assert_close(value(&spring, ParamName::P), 1.0);
        assert_close(value(&spring, ParamName::Lo), 9.0);

        let coil = formulas::coil_mass(7.85e-6, 1.0, 9.0, 8.0);
        let hooks = formulas::hook_mass(7.85e-6, 1.0, 9.0, 10.0);
        assert!((value(&spring, ParamName::W) - (coil + hooks)).abs() < 1e-12);
        assert_eq!(
            spring.hooks(),
            HookGeometry::Extension { la_mm: 10.0, ra_mm: 9.0, rb_mm: 9.0 }
        );

        let hook_a = spring.stress_at(StressLocation::HookA, StressInput::Stress(0.47)).unwrap();
        assert_close(hook_a.ratio, 0.47);
        assert!(!hook_a.clamped);

        let body = spring.stress(StressInput::Force(hook_a.force)).unwrap();
        assert!(body.hook_a_ratio.is_some() && body.hook_b_ratio.is_some());
        assert!(spring.check_buckling().unwrap().is_none());
        assert_eq!(spring.check_fatigue(1e6).unwrap().locations.len(), 3);
    }

    #[test]
    fn test_torsion_spring() {
        let config = SpringConfig::new(Ending::Open, Fixing::BothPivot, "A227");
        let mut spring = Spring::torsion(config, provider(), 10.0, 10.0).unwrap();
        let status = spring
            .solve(5.0, &known(&[("d", 1.0), ("DE", 10.0), ("Nt", 8.0)]))
            .unwrap();
        assert_eq!(status, SolveStatus::Solved);
        let expected = formulas::torsion_rate(197900.0, 1.0, 9.0, 8.0, 10.0, 10.0);
        assert!((value(&spring, ParamName::K) - expected).abs() < 1e-9);

        let coil = formulas::coil_mass(7.85e-6, 1.0, 9.0, 8.0);
        let legs = formulas::leg_mass(7.85e-6, 1.0, 10.0, 10.0);
        assert!((value(&spring, ParamName::W) - (coil + legs)).abs() < 1e-12);

        // Moment 100 N·mm gives a deflection in degrees, never clamped
        let result = spring.force_or_deflection(Load::Force(100.0)).unwrap();
        assert!(!result.clamped);
        assert_eq!(
            spring
                .set_hook_geometry(HookGeometry::extension(1.0))
                .unwrap_err()
                .error_code(),
            "UNSUPPORTED_OPERATION"
        );
    }

    #[test]
    fn test_hook_geometry_must_match_variant() {
        let err = Spring::new(
            Variant::Compression,
            SpringConfig::default(),
            provider(),
            HookGeometry::torsion(1.0, 1.0),
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_VALUE");
        assert!(Spring::torsion(SpringConfig::default(), provider(), -1.0, 1.0).is_err());
    }

    #[test]
    fn test_configure() {
        let mut spring = compression(Ending::ClosedGround);
        spring.solve(5.0, &reference_known()).unwrap();

        let err = spring.configure("open", "fix-pivot", "X999").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_OPTION");
        assert!(spring.is_solved());

        let err = spring.configure("squashed", "fix-pivot", "A228").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_OPTION");

        spring.configure("open", "hinged free", "a228").unwrap();
        assert_eq!(spring.ending(), Ending::Open);
        assert_eq!(spring.fixing(), Fixing::HingedFree);
        assert_eq!(spring.material().id, "A228");
        assert!(!spring.is_solved());
    }

    #[test]
    fn test_summary_serializes() {
        let mut spring = compression(Ending::ClosedGround);
        spring.solve(5.0, &reference_known()).unwrap();
        let json = serde_json::to_string(&spring.summary()).unwrap();
        assert!(json.contains("\"compression\""));
        assert!(json.contains("\"closed-ground\""));
        assert!(json.contains("\"solved\":true"));

        let status = serde_json::to_string(&SolveStatus::Insufficient {
            unresolved: BTreeSet::from([ParamName::Dm]),
        })
        .unwrap();
        assert!(status.contains("\"insufficient\""));
        assert!(status.contains("\"DM\""));
    }
}
