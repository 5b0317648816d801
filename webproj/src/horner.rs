//! Bivariate plane polynomials for local grid systems.
//!
//! Some legacy systems are not defined by a projection but by a pair of
//! polynomials that map their grid onto a projected reference system. Each
//! direction has its own coefficient set, origin and validity range.
//!
//! Coefficients are stored row by row: row `i` holds the coefficients of
//! `e^i * n^0 .. e^i * n^(degree - i)`, where `(e, n)` is the input relative
//! to the origin. A polynomial of degree `d` has `(d + 1)(d + 2) / 2`
//! coefficients per output axis.

/// One direction of a plane-to-plane polynomial transformation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HornerPolynomial {
    pub degree: usize,
    /// Largest accepted distance from the origin along either axis.
    pub range: f64,
    pub origin: [f64; 2],
    pub u: &'static [f64],
    pub v: &'static [f64],
}

impl HornerPolynomial {
    /// Number of coefficients per axis for the polynomial's degree.
    pub const fn coefficient_count(degree: usize) -> usize {
        (degree + 1) * (degree + 2) / 2
    }

    /// Whether both coefficient sets match the degree.
    pub fn is_well_formed(&self) -> bool {
        let expected = Self::coefficient_count(self.degree);
        self.u.len() == expected && self.v.len() == expected
    }

    /// Evaluate the polynomial at `point`.
    ///
    /// Returns `None` when the point is farther than `range` from the origin.
    pub fn evaluate(&self, point: (f64, f64)) -> Option<(f64, f64)> {
        let e = point.0 - self.origin[0];
        let n = point.1 - self.origin[1];

        if !(e.abs() <= self.range && n.abs() <= self.range) {
            return None;
        }

        Some((
            evaluate_2d(self.u, self.degree, e, n),
            evaluate_2d(self.v, self.degree, e, n),
        ))
    }
}

/// Forward (local grid to reference plane) and inverse polynomials.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HornerPair {
    pub fwd: HornerPolynomial,
    pub inv: HornerPolynomial,
}

fn evaluate_2d(coefs: &[f64], degree: usize, e: f64, n: f64) -> f64 {
    let mut acc = 0.0;
    let mut end = coefs.len();

    for i in (0..=degree).rev() {
        let len = degree - i + 1;
        let row = &coefs[end - len..end];
        end -= len;

        let p = row.iter().rev().fold(0.0, |s, &c| s * n + c);
        acc = acc * e + p;
    }

    acc
}
