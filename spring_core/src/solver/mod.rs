//! # Constraint Solving
//!
//! Resolves the unknown spring parameters from the known ones.
//!
//! - [`algebraic`] - the [`ConstraintSolver`] seam and the default exact
//!   elimination solver
//! - [`timeout`] - runs a solver on a worker thread under a deadline
//!
//! ## Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! use spring_core::config::Ending;
//! use spring_core::equations::EquationBuilder;
//! use spring_core::materials::{MaterialDb, MaterialProvider};
//! use spring_core::params::ParamName;
//! use spring_core::solver::{AlgebraicSolver, TimeoutGuard};
//!
//! let material = MaterialDb::builtin().unwrap().lookup("A227").unwrap();
//! let system = EquationBuilder::new(Ending::ClosedGround, &material).build();
//! let known = BTreeMap::from([
//!     (ParamName::D, 1.0),
//!     (ParamName::De, 10.0),
//!     (ParamName::Nt, 8.0),
//!     (ParamName::Lo, 20.0),
//! ]);
//!
//! let outcome = TimeoutGuard::new(5.0)
//!     .unwrap()
//!     .run(Arc::new(AlgebraicSolver::new()), system, known)
//!     .unwrap();
//! assert_eq!(outcome.values[&ParamName::Dm], 9.0);
//! ```

pub mod algebraic;
pub mod timeout;

pub use algebraic::{AlgebraicSolver, ConstraintSolver, SolveOutcome, CONSISTENCY_TOLERANCE};
pub use timeout::{CancelToken, TimeoutGuard};
