//! # Symbolic Expressions
//!
//! A small expression tree over spring parameters, enough to express the
//! spring relations and solve them by substitution and elimination. Each
//! relation is stored as an expression equal to zero.
//!
//! Supported operations:
//! - [`Expr::bind`]: replace known parameters by constants and fold
//! - [`Expr::substitute`]: replace a parameter by another expression
//! - [`Expr::isolate`]: solve `expr = 0` for a parameter that occurs once
//! - [`Expr::to_rational`]: view `expr` as a ratio of polynomials in one
//!   parameter, for parameters that occur more than once
//!
//! ## Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use spring_core::equations::expr::Expr;
//! use spring_core::params::ParamName;
//!
//! // DM - (DE - d) = 0
//! let relation = Expr::var(ParamName::Dm) - (Expr::var(ParamName::De) - Expr::var(ParamName::D));
//! let known = BTreeMap::from([(ParamName::De, 10.0), (ParamName::D, 1.0)]);
//! let dm = relation.bind(&known).isolate(ParamName::Dm).unwrap();
//! assert_eq!(dm.as_const(), Some(9.0));
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use super::poly::Poly;
use crate::params::{Bindings, ParamName};

/// Largest integer exponent expanded when building polynomials
const MAX_EXPANDED_POWER: f64 = 6.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(f64),
    Var(ParamName),
    Sum(Vec<Expr>),
    Product(Vec<Expr>),
    Pow(Box<Expr>, f64),
}

/// Integer exponents go through `powi` so negative bases stay real
fn pow(x: f64, n: f64) -> f64 {
    if n.fract() == 0.0 && n.abs() <= i32::MAX as f64 {
        x.powi(n as i32)
    } else {
        x.powf(n)
    }
}

impl Expr {
    pub fn var(name: ParamName) -> Self {
        Expr::Var(name)
    }

    pub fn constant(value: f64) -> Self {
        Expr::Const(value)
    }

    pub fn powf(self, n: f64) -> Self {
        Expr::Pow(Box::new(self), n)
    }

    pub fn sqrt(self) -> Self {
        self.powf(0.5)
    }

    pub fn as_const(&self) -> Option<f64> {
        match self {
            Expr::Const(c) => Some(*c),
            _ => None,
        }
    }

    /// Numeric value, `None` if any parameter is unbound
    pub fn eval(&self, env: &Bindings) -> Option<f64> {
        match self {
            Expr::Const(c) => Some(*c),
            Expr::Var(v) => env.get(v).copied(),
            Expr::Sum(terms) => terms.iter().map(|t| t.eval(env)).sum(),
            Expr::Product(factors) => factors.iter().map(|f| f.eval(env)).product(),
            Expr::Pow(base, n) => base.eval(env).map(|x| pow(x, *n)),
        }
    }

    /// How many times `var` appears
    pub fn occurrences(&self, var: ParamName) -> usize {
        match self {
            Expr::Const(_) => 0,
            Expr::Var(v) => usize::from(*v == var),
            Expr::Sum(items) | Expr::Product(items) => {
                items.iter().map(|e| e.occurrences(var)).sum()
            }
            Expr::Pow(base, _) => base.occurrences(var),
        }
    }

    /// Parameters appearing in the expression
    pub fn unknowns(&self) -> BTreeSet<ParamName> {
        let mut out = BTreeSet::new();
        self.collect_unknowns(&mut out);
        out
    }

    fn collect_unknowns(&self, out: &mut BTreeSet<ParamName>) {
        match self {
            Expr::Const(_) => {}
            Expr::Var(v) => {
                out.insert(*v);
            }
            Expr::Sum(items) | Expr::Product(items) => {
                items.iter().for_each(|e| e.collect_unknowns(out))
            }
            Expr::Pow(base, _) => base.collect_unknowns(out),
        }
    }

    /// Replace bound parameters by constants, then simplify
    pub fn bind(&self, env: &Bindings) -> Expr {
        self.map_vars(&|v| env.get(&v).map(|x| Expr::Const(*x))).simplify()
    }

    /// Replace `var` by `replacement`, then simplify
    pub fn substitute(&self, var: ParamName, replacement: &Expr) -> Expr {
        self.map_vars(&|v| (v == var).then(|| replacement.clone())).simplify()
    }

    fn map_vars(&self, f: &dyn Fn(ParamName) -> Option<Expr>) -> Expr {
        match self {
            Expr::Const(_) => self.clone(),
            Expr::Var(v) => f(*v).unwrap_or_else(|| self.clone()),
            Expr::Sum(terms) => Expr::Sum(terms.iter().map(|t| t.map_vars(f)).collect()),
            Expr::Product(factors) => {
                Expr::Product(factors.iter().map(|t| t.map_vars(f)).collect())
            }
            Expr::Pow(base, n) => Expr::Pow(Box::new(base.map_vars(f)), *n),
        }
    }

    /// Flatten nested sums/products and fold constants
    pub fn simplify(&self) -> Expr {
        match self {
            Expr::Const(_) | Expr::Var(_) => self.clone(),
            Expr::Sum(terms) => {
                let mut constant = 0.0;
                let mut out = Vec::new();
                for term in terms.iter().map(Expr::simplify) {
                    match term {
                        Expr::Const(c) => constant += c,
                        Expr::Sum(inner) => {
                            for t in inner {
                                match t {
                                    Expr::Const(c) => constant += c,
                                    other => out.push(other),
                                }
                            }
                        }
                        other => out.push(other),
                    }
                }
                if constant != 0.0 || out.is_empty() {
                    out.push(Expr::Const(constant));
                }
                if out.len() == 1 {
                    out.remove(0)
                } else {
                    Expr::Sum(out)
                }
            }
            Expr::Product(factors) => {
                let mut constant = 1.0;
                let mut out = Vec::new();
                for factor in factors.iter().map(Expr::simplify) {
                    match factor {
                        Expr::Const(c) => constant *= c,
                        Expr::Product(inner) => {
                            for f in inner {
                                match f {
                                    Expr::Const(c) => constant *= c,
                                    other => out.push(other),
                                }
                            }
                        }
                        other => out.push(other),
                    }
                }
                if constant == 0.0 {
                    return Expr::Const(0.0);
                }
                if constant != 1.0 || out.is_empty() {
                    out.insert(0, Expr::Const(constant));
                }
                if out.len() == 1 {
                    out.remove(0)
                } else {
                    Expr::Product(out)
                }
            }
            Expr::Pow(base, n) => {
                let base = base.simplify();
                if *n == 1.0 {
                    return base;
                }
                if *n == 0.0 {
                    return Expr::Const(1.0);
                }
                match base {
                    Expr::Const(c) => Expr::Const(pow(c, *n)),
                    // Parameters are positive, so (x^m)^n = x^(m·n)
                    Expr::Pow(inner, m) => Expr::Pow(inner, m * n).simplify(),
                    other => Expr::Pow(Box::new(other), *n),
                }
            }
        }
    }

    /// Solve `self = 0` for `var`, which must occur exactly once.
    ///
    /// Even roots take the positive branch.
    pub fn isolate(&self, var: ParamName) -> Option<Expr> {
        if self.occurrences(var) != 1 {
            return None;
        }
        let mut lhs = self.clone();
        let mut rhs = Expr::Const(0.0);
        loop {
            match lhs {
                Expr::Var(v) if v == var => return Some(rhs.simplify()),
                Expr::Sum(terms) => {
                    let (inside, rest): (Vec<Expr>, Vec<Expr>) =
                        terms.into_iter().partition(|t| t.occurrences(var) > 0);
                    lhs = inside.into_iter().next()?;
                    rhs = rhs - Expr::Sum(rest);
                }
                Expr::Product(factors) => {
                    let (inside, rest): (Vec<Expr>, Vec<Expr>) =
                        factors.into_iter().partition(|f| f.occurrences(var) > 0);
                    lhs = inside.into_iter().next()?;
                    rhs = rhs / Expr::Product(rest);
                }
                Expr::Pow(base, n) if n != 0.0 => {
                    lhs = *base;
                    rhs = rhs.powf(1.0 / n);
                }
                _ => return None,
            }
        }
    }

    /// View the expression as `numerator / denominator`, polynomials in `var`.
    ///
    /// Fails if any other parameter is still present or an exponent of a
    /// `var`-dependent term is not a small integer.
    pub fn to_rational(&self, var: ParamName) -> Option<(Poly, Poly)> {
        let one = Poly::constant(1.0);
        match self {
            Expr::Const(c) => Some((Poly::constant(*c), one)),
            Expr::Var(v) if *v == var => Some((Poly::x(), one)),
            Expr::Var(_) => None,
            Expr::Sum(terms) => terms.iter().try_fold((Poly::constant(0.0), one), |(n, d), t| {
                let (tn, td) = t.to_rational(var)?;
                if td == d {
                    Some((&n + &tn, d))
                } else {
                    Some((&(&n * &td) + &(&tn * &d), &d * &td))
                }
            }),
            Expr::Product(factors) => factors.iter().try_fold((one.clone(), one), |(n, d), f| {
                let (fnum, fden) = f.to_rational(var)?;
                Some((&n * &fnum, &d * &fden))
            }),
            Expr::Pow(base, n) => {
                let k = n.round();
                if (n - k).abs() > 1e-12 || k.abs() > MAX_EXPANDED_POWER {
                    return None;
                }
                let (bn, bd) = base.to_rational(var)?;
                let e = k.abs() as u32;
                if k >= 0.0 {
                    Some((bn.powi(e), bd.powi(e)))
                } else {
                    Some((bd.powi(e), bn.powi(e)))
                }
            }
        }
    }

    fn is_atomic(&self) -> bool {
        matches!(self, Expr::Const(_) | Expr::Var(_))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(c) => write!(f, "{}", c),
            Expr::Var(v) => write!(f, "{}", v),
            Expr::Sum(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" + ")?;
                    }
                    write!(f, "{}", term)?;
                }
                Ok(())
            }
            Expr::Product(factors) => {
                for (i, factor) in factors.iter().enumerate() {
                    if i > 0 {
                        f.write_str("*")?;
                    }
                    if matches!(factor, Expr::Sum(_)) {
                        write!(f, "({})", factor)?;
                    } else {
                        write!(f, "{}", factor)?;
                    }
                }
                Ok(())
            }
            Expr::Pow(base, n) => {
                if base.is_atomic() {
                    write!(f, "{}^{}", base, n)
                } else {
                    write!(f, "({})^{}", base, n)
                }
            }
        }
    }
}

impl From<ParamName> for Expr {
    fn from(name: ParamName) -> Self {
        Expr::Var(name)
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Const(value)
    }
}

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        Expr::Sum(vec![self, rhs])
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Product(vec![Expr::Const(-1.0), self])
    }
}

impl Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        Expr::Sum(vec![self, -rhs])
    }
}

impl Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        Expr::Product(vec![self, rhs])
    }
}

impl Div for Expr {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        Expr::Product(vec![self, rhs.powf(-1.0)])
    }
}

macro_rules! scalar_ops {
    ($($op:ident $method:ident),*) => {
        $(
            impl $op<f64> for Expr {
                type Output = Expr;

                fn $method(self, rhs: f64) -> Expr {
                    <Expr as $op<Expr>>::$method(self, Expr::Const(rhs))
                }
            }

            impl $op<Expr> for f64 {
                type Output = Expr;

                fn $method(self, rhs: Expr) -> Expr {
                    <Expr as $op<Expr>>::$method(Expr::Const(self), rhs)
                }
            }
        )*
    };
}

scalar_ops!(Add add, Sub sub, Mul mul, Div div);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use ParamName::*;

    fn v(name: ParamName) -> Expr {
        Expr::var(name)
    }

    #[test]
    fn test_eval() {
        let e = 2.0 * v(D) + v(Dm) / v(D);
        let env = BTreeMap::from([(D, 1.0), (Dm, 9.0)]);
        assert_eq!(e.eval(&env), Some(11.0));
        assert_eq!(e.eval(&BTreeMap::new()), None);
    }

    #[test]
    fn test_simplify_folds_constants() {
        let e = (Expr::constant(2.0) + 3.0) * v(D) * 1.0;
        assert_eq!(e.simplify(), Expr::Product(vec![Expr::Const(5.0), Expr::Var(D)]));
        assert_eq!((v(D) * 0.0).simplify(), Expr::Const(0.0));
        assert_eq!(v(D).powf(2.0).powf(0.5).simplify(), Expr::Var(D));
    }

    #[test]
    fn test_unknowns_and_occurrences() {
        let e = v(C) * v(D) - v(Dm) + v(D);
        assert_eq!(e.unknowns(), BTreeSet::from([D, Dm, C]));
        assert_eq!(e.occurrences(D), 2);
        assert_eq!(e.occurrences(C), 1);
    }

    #[test]
    fn test_isolate_linear() {
        // Lo - (p*Na + 2d) with Lo = 20, Na = 6, d = 1
        let relation = v(Lo) - (v(P) * v(Na) + 2.0 * v(D));
        let env = BTreeMap::from([(Lo, 20.0), (Na, 6.0), (D, 1.0)]);
        let p = relation.bind(&env).isolate(P).unwrap();
        assert!((p.as_const().unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_isolate_through_power() {
        // k - G*d^4/(8*Na*DM^3) solved for d
        let g = 80700.0;
        let relation = v(K) - g * v(D).powf(4.0) / (8.0 * v(Na) * v(Dm).powf(3.0));
        let k = g / (48.0 * 729.0);
        let env = BTreeMap::from([(K, k), (Na, 6.0), (Dm, 9.0)]);
        let d = relation.bind(&env).isolate(D).unwrap();
        assert!((d.as_const().unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_isolate_symbolic() {
        let relation = v(Dm) - (v(De) - v(D));
        let d = relation.isolate(D).unwrap();
        let env = BTreeMap::from([(Dm, 9.0), (De, 10.0)]);
        assert_eq!(d.eval(&env), Some(1.0));
        assert!(relation.isolate(C).is_none());
        assert!((v(D) * v(D) - 1.0).isolate(D).is_none());
    }

    #[test]
    fn test_substitute() {
        let relation = v(Ls) - v(D) * v(Nt);
        let replaced = relation.substitute(Nt, &(v(Na) + 2.0));
        assert_eq!(replaced.occurrences(Nt), 0);
        let env = BTreeMap::from([(Ls, 8.0), (D, 1.0), (Na, 6.0)]);
        assert_eq!(replaced.eval(&env), Some(0.0));
    }

    #[test]
    fn test_to_rational() {
        // 8 - (9 - x)*((2 + 2x)/3 + 2) = (2x^2 - 10x - 48)/3
        let x = v(Di);
        let e = 8.0 - (9.0 - x.clone()) * ((2.0 + 2.0 * x) / 3.0 + 2.0);
        let (num, den) = e.simplify().to_rational(Di).unwrap();
        let roots: Vec<f64> = num
            .real_roots()
            .unwrap()
            .into_iter()
            .filter(|r| den.eval(*r).abs() > 1e-12)
            .collect();
        assert_eq!(roots.len(), 2);
        assert!((roots[0] + 3.0).abs() < 1e-9);
        assert!((roots[1] - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_to_rational_rejects_other_unknowns() {
        assert!((v(D) + v(Nt)).to_rational(D).is_none());
        assert!(v(D).sqrt().to_rational(D).is_none());
    }

    #[test]
    fn test_display() {
        let e = v(Dm) - (v(De) - v(D));
        assert_eq!(e.simplify().to_string(), "DM + -1*(DE + -1*d)");
        assert_eq!(v(D).powf(4.0).to_string(), "d^4");
    }
}
