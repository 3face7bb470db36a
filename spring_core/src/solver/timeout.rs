//! Deadline-bounded solver execution.
//!
//! The solver runs on a dedicated worker thread that owns its own copy of
//! the inputs. The result comes back through a one-shot channel. When the
//! deadline passes first, the cancellation token is raised and the worker is
//! abandoned: it stops at its next cancellation check, and whatever it sends
//! afterwards goes nowhere.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::algebraic::{ConstraintSolver, SolveOutcome};
use crate::equations::EquationSystem;
use crate::errors::{SpringError, SpringResult};
use crate::params::Bindings;

/// Cooperative cancellation flag shared with a solver worker
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Error out if cancellation was requested
    pub fn check(&self) -> SpringResult<()> {
        if self.is_cancelled() {
            Err(SpringError::internal("solve cancelled"))
        } else {
            Ok(())
        }
    }
}

/// Runs solver invocations under a wall-clock deadline
#[derive(Debug, Clone, Copy)]
pub struct TimeoutGuard {
    deadline: Duration,
}

impl TimeoutGuard {
    /// `deadline_secs` must be finite and positive
    pub fn new(deadline_secs: f64) -> SpringResult<Self> {
        if !deadline_secs.is_finite() || deadline_secs <= 0.0 {
            return Err(SpringError::invalid_value(
                "deadline",
                deadline_secs.to_string(),
                "must be a finite number of seconds greater than zero",
            ));
        }
        let deadline = Duration::try_from_secs_f64(deadline_secs)
            .map_err(|e| {
                SpringError::invalid_value("deadline", deadline_secs.to_string(), e.to_string())
            })?;
        Ok(Self { deadline })
    }

    pub fn deadline_secs(&self) -> f64 {
        self.deadline.as_secs_f64()
    }

    /// Solve on a worker thread, waiting at most the deadline.
    ///
    /// A worker that panics is reported as an `Internal` error.
    pub fn run(
        &self,
        solver: Arc<dyn ConstraintSolver>,
        system: EquationSystem,
        known: Bindings,
    ) -> SpringResult<SolveOutcome> {
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();
        let (tx, rx) = mpsc::sync_channel(1);
        let started = Instant::now();

        thread::Builder::new()
            .name("spring-solver".into())
            .spawn(move || {
                let result = solver.solve(&system, &known, &worker_cancel);
                // The receiver is gone if the deadline already passed
                let _ = tx.send(result);
            })
            .map_err(|e| SpringError::internal(format!("failed to start solver thread: {}", e)))?;

        match rx.recv_timeout(self.deadline) {
            Ok(result) => {
                debug!(elapsed_ms = started.elapsed().as_millis() as u64, "solver worker finished");
                result
            }
            Err(RecvTimeoutError::Timeout) => {
                cancel.cancel();
                let elapsed_secs = started.elapsed().as_secs_f64();
                warn!(
                    elapsed_secs,
                    deadline_secs = self.deadline_secs(),
                    "solve timed out, worker abandoned"
                );
                Err(SpringError::Timeout {
                    elapsed_secs,
                    deadline_secs: self.deadline_secs(),
                })
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(SpringError::internal("solver worker terminated without a result"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamName;
    use crate::solver::AlgebraicSolver;

    /// Spins until cancelled
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
                thread::sleep(Duration::from_millis(1));
            }
        }
    }

    struct PanickingSolver;

    impl ConstraintSolver for PanickingSolver {
        fn solve(
            &self,
            _: &EquationSystem,
            _: &Bindings,
            _: &CancelToken,
        ) -> SpringResult<SolveOutcome> {
            panic!("solver blew up");
        }
    }

    #[test]
    fn test_rejects_bad_deadlines() {
        for deadline in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = TimeoutGuard::new(deadline).unwrap_err();
            assert_eq!(err.error_code(), "INVALID_VALUE");
        }
        assert!((TimeoutGuard::new(0.25).unwrap().deadline_secs() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_stalling_solver_times_out() {
        let guard = TimeoutGuard::new(0.02).unwrap();
        let err = guard
            .run(Arc::new(StallingSolver), EquationSystem::new(), Bindings::new())
            .unwrap_err();
        assert!(err.is_recoverable());
        match err {
            SpringError::Timeout { elapsed_secs, deadline_secs } => {
                assert!((deadline_secs - 0.02).abs() < 1e-12);
                assert!(elapsed_secs >= 0.02);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_worker_panic_is_internal_error() {
        let guard = TimeoutGuard::new(5.0).unwrap();
        let err = guard
            .run(Arc::new(PanickingSolver), EquationSystem::new(), Bindings::new())
            .unwrap_err();
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_successful_run_returns_outcome() {
        let guard = TimeoutGuard::new(5.0).unwrap();
        let known = Bindings::from([(ParamName::D, 1.0)]);
        let outcome = guard
            .run(Arc::new(AlgebraicSolver::new()), EquationSystem::new(), known)
            .unwrap();
        assert!(outcome.values.is_empty());
        assert!(outcome.unresolved.is_empty());
    }

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        assert!(token.check().is_ok());
        token.clone().cancel();
        assert!(token.is_cancelled());
        assert!(token.check().is_err());
    }
}
