//! # Algebraic Constraint Solver
//!
//! Exact elimination over the spring relations. Each round:
//!
//! 1. Known values are bound into every pending relation.
//! 2. A relation left with a single unknown is solved in closed form:
//!    by inverting the expression tree when the unknown occurs once,
//!    otherwise through the roots of its numerator polynomial.
//! 3. Failing that, an unknown occurring once in the relation with the
//!    fewest unknowns is isolated and substituted into the others.
//!
//! Eliminated unknowns are recovered by back-substitution in reverse order.
//! Finally every relation whose parameters are all resolved is checked for
//! consistency.
//!
//! When a polynomial has several real roots, the smallest one for which the
//! unknown and every back-substituted quantity stay in their physical
//! domain is kept.

use std::collections::BTreeSet;

use tracing::debug;

use super::timeout::CancelToken;
use crate::equations::{Equation, EquationSystem, EquationTracker, Expr, Relation};
use crate::errors::{SpringError, SpringResult};
use crate::params::{Bindings, ParamName};

/// Largest relative residual accepted for a fully-known relation
pub const CONSISTENCY_TOLERANCE: f64 = 1e-6;

/// Result of one solver invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolveOutcome {
    /// Values derived for parameters that were not known
    pub values: Bindings,
    /// Parameters of the system that could not be determined
    pub unresolved: BTreeSet<ParamName>,
    /// Which equation produced each derived value
    pub trace: EquationTracker,
}

/// Pluggable solving strategy.
///
/// Implementations must return promptly once `cancel` is raised; the
/// calling [`super::TimeoutGuard`] abandons them at the deadline anyway.
pub trait ConstraintSolver: Send + Sync {
    fn solve(
        &self,
        system: &EquationSystem,
        known: &Bindings,
        cancel: &CancelToken,
    ) -> SpringResult<SolveOutcome>;
}

/// Default solver: symbolic elimination with closed-form roots
#[derive(Debug, Clone, Copy, Default)]
pub struct AlgebraicSolver;

impl AlgebraicSolver {
    pub fn new() -> Self {
        Self
    }
}

/// An unknown expressed in terms of the remaining unknowns
#[derive(Debug, Clone)]
struct Definition {
    var: ParamName,
    equation: Equation,
    expr: Expr,
}

impl ConstraintSolver for AlgebraicSolver {
    fn solve(
        &self,
        system: &EquationSystem,
        known: &Bindings,
        cancel: &CancelToken,
    ) -> SpringResult<SolveOutcome> {
        let mut values = known.clone();
        let mut derived = Bindings::new();
        let mut trace = EquationTracker::new();
        let mut definitions: Vec<Definition> = Vec::new();
        let mut pending: Vec<Relation> = system.relations().to_vec();

        loop {
            cancel.check()?;

            for relation in pending.iter_mut() {
                relation.expr = relation.expr.bind(&values);
            }
            pending.retain(|r| !r.expr.unknowns().is_empty());
            if pending.is_empty() {
                break;
            }

            if let Some(idx) = pending.iter().position(|r| r.expr.unknowns().len() == 1) {
                let relation = pending.remove(idx);
                let Some(var) = relation.expr.unknowns().into_iter().next() else {
                    continue;
                };
                match solve_single(&relation, var, &definitions, &values) {
                    Some(value) => {
                        debug!(
                            parameter = %var,
                            value,
                            equation = ?relation.equation,
                            "solved directly"
                        );
                        values.insert(var, value);
                        derived.insert(var, value);
                        trace.record_for_parameter(relation.equation, "solved directly", var);
                    }
                    None => {
                        debug!(
                            parameter = %var,
                            equation = ?relation.equation,
                            "no closed-form solution, relation dropped"
                        );
                    }
                }
                continue;
            }

            let Some((idx, var, expr)) = choose_elimination(&pending) else {
                debug!(remaining = pending.len(), "no unknown can be eliminated");
                break;
            };
            let relation = pending.remove(idx);
            debug!(parameter = %var, equation = ?relation.equation, "eliminated");
            for other in pending.iter_mut() {
                other.expr = other.expr.substitute(var, &expr);
            }
            definitions.push(Definition {
                var,
                equation: relation.equation,
                expr,
            });
        }

        for definition in definitions.iter().rev() {
            cancel.check()?;
            if let Some(value) = definition.expr.eval(&values).filter(|v| v.is_finite()) {
                values.insert(definition.var, value);
                derived.insert(definition.var, value);
                let source = "back-substitution";
                trace.record_for_parameter(definition.equation, source, definition.var);
            }
        }

        check_consistency(system, &values)?;

        let unresolved = system
            .variables()
            .into_iter()
            .filter(|p| !values.contains_key(p))
            .collect();

        Ok(SolveOutcome {
            values: derived,
            unresolved,
            trace,
        })
    }
}

/// Solve a relation with exactly one unknown
fn solve_single(
    relation: &Relation,
    var: ParamName,
    definitions: &[Definition],
    values: &Bindings,
) -> Option<f64> {
    if relation.expr.occurrences(var) == 1 {
        let isolated = relation
            .expr
            .isolate(var)
            .and_then(|e| e.eval(values))
            .filter(|v| v.is_finite());
        if isolated.is_some() {
            return isolated;
        }
    }

    let (num, den) = relation.expr.to_rational(var)?;
    let den_scale = den.coeffs().iter().fold(0.0_f64, |m, c| m.max(c.abs()));
    let roots: Vec<f64> = num
        .real_roots()?
        .into_iter()
        .filter(|r| r.is_finite() && den.eval(*r).abs() > 1e-12 * den_scale)
        .collect();
    if roots.len() > 1 {
        debug!(parameter = %var, ?roots, "several real roots");
    }

    roots
        .iter()
        .copied()
        .find(|r| admissible(var, *r, definitions, values))
        .or_else(|| roots.first().copied())
}

/// A root is admissible when it and every quantity defined through it stay
/// in their physical domains
fn admissible(var: ParamName, root: f64, definitions: &[Definition], values: &Bindings) -> bool {
    if !var.in_domain(root) {
        return false;
    }
    let mut env = values.clone();
    env.insert(var, root);
    for definition in definitions.iter().rev() {
        if let Some(value) = definition.expr.eval(&env) {
            if !definition.var.in_domain(value) {
                return false;
            }
            env.insert(definition.var, value);
        }
    }
    true
}

/// Pick the relation with the fewest unknowns that has an unknown occurring
/// exactly once, and isolate that unknown
fn choose_elimination(pending: &[Relation]) -> Option<(usize, ParamName, Expr)> {
    let mut order: Vec<usize> = (0..pending.len()).collect();
    order.sort_by_key(|&i| pending[i].expr.unknowns().len());

    order.into_iter().find_map(|idx| {
        let expr = &pending[idx].expr;
        expr.unknowns()
            .into_iter()
            .filter(|v| expr.occurrences(*v) == 1)
            .find_map(|v| expr.isolate(v).map(|isolated| (idx, v, isolated)))
    })
}

/// Relative residual of every relation whose parameters are all known
fn check_consistency(system: &EquationSystem, values: &Bindings) -> SpringResult<()> {
    for relation in system.relations() {
        let Some(residual) = relation.expr.eval(values) else {
            continue;
        };
        let scale = magnitude(&relation.expr, values);
        let relative = if scale > 0.0 { residual.abs() / scale } else { residual.abs() };
        if relative.is_nan() || relative > CONSISTENCY_TOLERANCE {
            return Err(SpringError::InconsistentConstraints {
                equation: relation.equation.metadata().name.to_string(),
                residual: relative,
            });
        }
    }
    Ok(())
}

/// Sum of the absolute values of the top-level terms
fn magnitude(expr: &Expr, values: &Bindings) -> f64 {
    match expr {
        Expr::Sum(terms) => terms.iter().filter_map(|t| t.eval(values)).map(f64::abs).sum(),
        other => other.eval(values).map(f64::abs).unwrap_or(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Ending;
    use crate::equations::EquationBuilder;
    use crate::materials::{MaterialDb, MaterialProperties, MaterialProvider};
    use crate::params::HookGeometry;
    use crate::variant::RateLaw;

    use ParamName::*;

    fn a227() -> MaterialProperties {
        MaterialDb::builtin().unwrap().lookup("A227").unwrap()
    }

    fn compression_system(ending: Ending, material: &MaterialProperties) -> EquationSystem {
        let builder = EquationBuilder::new(ending, material);
        let mut system = builder.build();
        system.push_relation(builder.rate_relation(RateLaw::Helical, &HookGeometry::None));
        system
    }

    fn solve(system: &EquationSystem, known: &[(ParamName, f64)]) -> SpringResult<SolveOutcome> {
        AlgebraicSolver::new().solve(system, &known.iter().copied().collect(), &CancelToken::new())
    }

    fn assert_close(outcome: &SolveOutcome, name: ParamName, expected: f64) {
        let actual = outcome.values[&name];
        assert!(
            (actual - expected).abs() < 1e-9 * expected.abs().max(1.0),
            "{} = {}, expected {}",
            name,
            actual,
            expected
        );
    }

    #[test]
    fn test_direct_solve_closed_ground() {
        let material = a227();
        let system = compression_system(Ending::ClosedGround, &material);
        let outcome = solve(&system, &[(D, 1.0), (De, 10.0), (Nt, 8.0), (Lo, 20.0)]).unwrap();

        assert!(outcome.unresolved.is_empty());
        assert_close(&outcome, Dm, 9.0);
        assert_close(&outcome, Di, 8.0);
        assert_close(&outcome, Na, 6.0);
        assert_close(&outcome, P, 3.0);
        assert_close(&outcome, Gap, 2.0);
        assert_close(&outcome, Ls, 8.0);
        assert_close(&outcome, C, 9.0);
        assert_close(&outcome, K, 80700.0 / (48.0 * 729.0));
        assert!(!outcome.values.contains_key(&D));
    }

    #[test]
    fn test_every_ending_resolves() {
        let material = a227();
        for ending in Ending::ALL {
            let system = compression_system(ending, &material);
            let outcome = solve(&system, &[(D, 1.0), (De, 10.0), (Nt, 8.0), (Lo, 20.0)]).unwrap();
            assert!(outcome.unresolved.is_empty(), "{:?}: {:?}", ending, outcome.unresolved);

            let na = crate::equations::spring::active_turns(ending, 8.0);
            assert_close(&outcome, Na, na);
            let allowance = crate::equations::spring::free_length(ending, 0.0, na, 1.0);
            assert_close(&outcome, P, (20.0 - allowance) / na);
            assert_close(&outcome, Ls, crate::equations::spring::solid_length(ending, 1.0, 8.0));
        }
    }

    #[test]
    fn test_elimination_picks_physical_root() {
        // DM, Ls, Lo and p known: d and Nt come from a quadratic in Na
        let material = a227();
        let system = compression_system(Ending::ClosedGround, &material);
        let outcome = solve(&system, &[(Dm, 9.0), (Ls, 8.0), (Lo, 20.0), (P, 3.0)]).unwrap();

        assert!(outcome.unresolved.is_empty(), "{:?}", outcome.unresolved);
        assert_close(&outcome, D, 1.0);
        assert_close(&outcome, Nt, 8.0);
        assert_close(&outcome, Na, 6.0);
        assert_close(&outcome, Di, 8.0);
        assert_close(&outcome, De, 10.0);
    }

    #[test]
    fn test_quartic_in_wire_diameter() {
        // d from the rate: k*8*Na*(DE - d)^3 = G*d^4
        let material = a227();
        let system = compression_system(Ending::ClosedGround, &material);
        let k = 80700.0 / (48.0 * 729.0);
        let outcome = solve(&system, &[(K, k), (De, 10.0), (Nt, 8.0), (Lo, 20.0)]).unwrap();
        assert!(outcome.unresolved.is_empty(), "{:?}", outcome.unresolved);
        assert!((outcome.values[&D] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_insufficient_constraints_is_partial() {
        let material = a227();
        let system = compression_system(Ending::ClosedGround, &material);
        let outcome = solve(&system, &[(D, 1.0), (De, 10.0)]).unwrap();

        assert_close(&outcome, Dm, 9.0);
        assert_close(&outcome, Di, 8.0);
        assert_close(&outcome, C, 9.0);
        assert!(outcome.unresolved.contains(&Nt));
        assert!(outcome.unresolved.contains(&K));
        assert!(!outcome.unresolved.contains(&Dm));
    }

    #[test]
    fn test_inconsistent_knowns_rejected() {
        let material = a227();
        let system = compression_system(Ending::ClosedGround, &material);
        let err = solve(&system, &[(D, 1.0), (De, 10.0), (Dm, 8.0)]).unwrap_err();
        match err {
            SpringError::InconsistentConstraints { equation, residual } => {
                assert!(equation.contains("External"), "{}", equation);
                assert!(residual > CONSISTENCY_TOLERANCE);
            }
            other => panic!("expected inconsistency, got {:?}", other),
        }
    }

    #[test]
    fn test_trace_names_producing_equations() {
        let material = a227();
        let system = compression_system(Ending::ClosedGround, &material);
        let outcome = solve(&system, &[(D, 1.0), (De, 10.0), (Nt, 8.0), (Lo, 20.0)]).unwrap();
        assert_eq!(outcome.trace.source_of(Dm), Some(Equation::MediumFromExternal));
        assert_eq!(outcome.trace.source_of(K), Some(Equation::HelicalRate));
        assert_eq!(outcome.trace.source_of(D), None);
    }

    #[test]
    fn test_cancelled_solve_stops() {
        let material = a227();
        let system = compression_system(Ending::ClosedGround, &material);
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = AlgebraicSolver::new().solve(&system, &Bindings::new(), &cancel);
        assert!(result.is_err());
    }
}
