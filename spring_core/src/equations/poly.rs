//! Univariate polynomials with closed-form real roots up to degree 3 and a
//! bracketing search above that.
//!
//! Coefficients are stored from the constant term upward:
//! `Poly::new(vec![c0, c1, c2])` is `c0 + c1·x + c2·x²`.

use std::f64::consts::PI;
use std::ops::{Add, Mul};

/// Leading coefficients smaller than this fraction of the largest
/// coefficient are treated as zero.
const RELATIVE_ZERO: f64 = 1e-12;

/// Grid points per sign for the bracketing root search
const SEARCH_STEPS: usize = 4096;

/// Smallest magnitude probed by the bracketing root search
const SEARCH_FLOOR: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct Poly {
    coeffs: Vec<f64>,
}

impl Poly {
    pub fn new(coeffs: Vec<f64>) -> Self {
        let mut poly = Poly { coeffs };
        while poly.coeffs.last() == Some(&0.0) {
            poly.coeffs.pop();
        }
        poly
    }

    pub fn constant(c: f64) -> Self {
        Self::new(vec![c])
    }

    /// The monomial `x`
    pub fn x() -> Self {
        Self::new(vec![0.0, 1.0])
    }

    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// `None` for the zero polynomial
    pub fn degree(&self) -> Option<usize> {
        self.coeffs.len().checked_sub(1)
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Horner evaluation
    pub fn eval(&self, x: f64) -> f64 {
        self.coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c)
    }

    pub fn powi(&self, n: u32) -> Poly {
        (0..n).fold(Poly::constant(1.0), |acc, _| &acc * self)
    }

    /// Drop leading coefficients that are negligible next to the largest one
    pub fn trimmed(&self) -> Poly {
        let scale = self.coeffs.iter().fold(0.0_f64, |m, c| m.max(c.abs()));
        if scale == 0.0 || !scale.is_finite() {
            return Poly::new(Vec::new());
        }
        let mut coeffs = self.coeffs.clone();
        while coeffs.last().is_some_and(|c| c.abs() <= RELATIVE_ZERO * scale) {
            coeffs.pop();
        }
        Poly::new(coeffs)
    }

    /// Real roots in ascending order, `None` for the zero polynomial.
    ///
    /// Degrees up to 3 are solved in closed form. Higher degrees are searched
    /// for sign changes on a logarithmic grid, so roots of even multiplicity
    /// and roots closer to zero than `SEARCH_FLOOR` can be missed.
    pub fn real_roots(&self) -> Option<Vec<f64>> {
        let p = self.trimmed();
        let c = &p.coeffs;
        let mut roots = match p.degree()? {
            0 => Vec::new(),
            1 => vec![-c[0] / c[1]],
            2 => quadratic_roots(c[2], c[1], c[0]),
            3 => cubic_roots(c[3], c[2], c[1], c[0])
                .into_iter()
                .map(|r| p.polish(r))
                .collect(),
            _ => p.bracketed_roots(),
        };
        roots.retain(|r| r.is_finite());
        roots.sort_by(|a, b| a.total_cmp(b));
        roots.dedup_by(|a, b| (*a - *b).abs() <= 1e-12 * a.abs().max(b.abs()).max(1.0));
        Some(roots)
    }

    fn bracketed_roots(&self) -> Vec<f64> {
        let c = &self.coeffs;
        let lead = c[c.len() - 1];
        // Cauchy bound on root magnitude
        let bound = 1.0 + c[..c.len() - 1].iter().fold(0.0_f64, |m, x| m.max((x / lead).abs()));
        let span = (bound / SEARCH_FLOOR).ln();
        let positive: Vec<f64> = (0..=SEARCH_STEPS)
            .map(|i| SEARCH_FLOOR * (span * i as f64 / SEARCH_STEPS as f64).exp())
            .collect();
        let grid: Vec<f64> = positive
            .iter()
            .rev()
            .map(|x| -x)
            .chain(std::iter::once(0.0))
            .chain(positive.iter().copied())
            .collect();

        let mut roots = Vec::new();
        for pair in grid.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let (fa, fb) = (self.eval(a), self.eval(b));
            if fa == 0.0 {
                roots.push(a);
            } else if fb != 0.0 && fa.signum() != fb.signum() {
                roots.push(self.bisect(a, b));
            }
        }
        if grid.last().is_some_and(|x| self.eval(*x) == 0.0) {
            roots.extend(grid.last());
        }
        roots
    }

    /// Bisection on a bracket with a sign change
    fn bisect(&self, mut lo: f64, mut hi: f64) -> f64 {
        let mut f_lo = self.eval(lo);
        for _ in 0..100 {
            let mid = 0.5 * (lo + hi);
            let f_mid = self.eval(mid);
            if f_mid == 0.0 || (hi - lo).abs() <= 1e-15 * mid.abs().max(1.0) {
                return mid;
            }
            if f_mid.signum() == f_lo.signum() {
                lo = mid;
                f_lo = f_mid;
            } else {
                hi = mid;
            }
        }
        0.5 * (lo + hi)
    }

    fn derivative(&self) -> Poly {
        Poly::new(
            self.coeffs
                .iter()
                .enumerate()
                .skip(1)
                .map(|(i, c)| c * i as f64)
                .collect(),
        )
    }

    /// Two Newton steps, kept only if they reduce the residual
    fn polish(&self, root: f64) -> f64 {
        let dp = self.derivative();
        let mut x = root;
        for _ in 0..2 {
            let slope = dp.eval(x);
            if slope == 0.0 {
                break;
            }
            let next = x - self.eval(x) / slope;
            if next.is_finite() && self.eval(next).abs() <= self.eval(x).abs() {
                x = next;
            }
        }
        x
    }
}

impl Add for &Poly {
    type Output = Poly;

    fn add(self, other: &Poly) -> Poly {
        let len = self.coeffs.len().max(other.coeffs.len());
        let coeffs = (0..len)
            .map(|i| self.coeffs.get(i).unwrap_or(&0.0) + other.coeffs.get(i).unwrap_or(&0.0))
            .collect();
        Poly::new(coeffs)
    }
}

impl Mul for &Poly {
    type Output = Poly;

    fn mul(self, other: &Poly) -> Poly {
        if self.is_zero() || other.is_zero() {
            return Poly::new(Vec::new());
        }
        let mut coeffs = vec![0.0; self.coeffs.len() + other.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            for (j, b) in other.coeffs.iter().enumerate() {
                coeffs[i + j] += a * b;
            }
        }
        Poly::new(coeffs)
    }
}

/// Real roots of `a·x² + b·x + c`, `a != 0`, cancellation-free form
fn quadratic_roots(a: f64, b: f64, c: f64) -> Vec<f64> {
    let mut disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        // Round-off around a double root
        if disc.abs() <= 1e-12 * b * b {
            disc = 0.0;
        } else {
            return Vec::new();
        }
    }
    let q = -0.5 * (b + b.signum() * disc.sqrt());
    if q == 0.0 {
        return vec![0.0];
    }
    vec![q / a, c / q]
}

/// Real roots of `a·x³ + b·x² + c·x + d`, `a != 0` (trigonometric/Cardano)
fn cubic_roots(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    let (a1, a2, a3) = (b / a, c / a, d / a);
    let q = (a1 * a1 - 3.0 * a2) / 9.0;
    let r = (2.0 * a1.powi(3) - 9.0 * a1 * a2 + 27.0 * a3) / 54.0;
    let shift = a1 / 3.0;

    if r * r < q.powi(3) {
        let theta = (r / q.powi(3).sqrt()).clamp(-1.0, 1.0).acos();
        let m = -2.0 * q.sqrt();
        vec![
            m * (theta / 3.0).cos() - shift,
            m * ((theta + 2.0 * PI) / 3.0).cos() - shift,
            m * ((theta - 2.0 * PI) / 3.0).cos() - shift,
        ]
    } else {
        let big_a = -r.signum() * (r.abs() + (r * r - q.powi(3)).sqrt()).cbrt();
        let big_b = if big_a == 0.0 { 0.0 } else { q / big_a };
        vec![big_a + big_b - shift]
    }
}
