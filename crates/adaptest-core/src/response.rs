//! Three-parameter logistic response model.

/// Logistic function, split on sign so `exp` never overflows.
#[inline]
pub(crate) fn logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let exp_x = x.exp();
        exp_x / (1.0 + exp_x)
    }
}

/// Probability of a correct response under the 3PL model.
///
/// `p = c + (1 - c) / (1 + exp(-a (theta - b)))`, always within `[c, 1]`.
#[inline]
pub fn probability(theta: f64, a: f64, b: f64, c: f64) -> f64 {
    (c + (1.0 - c) * logistic(a * (theta - b))).min(1.0)
}

/// Fisher information of an item at `theta`.
///
/// `I = a² q (p - c)² / (p (1 - c)²)` with `q = 1 - p`. Returns `0` where the
/// derivative is undefined (`p <= c` or `q <= 0`).
#[inline]
pub fn information(theta: f64, a: f64, b: f64, c: f64) -> f64 {
    let p = probability(theta, a, b, c);
    let q = 1.0 - p;
    if !p.is_finite() || p <= c || q <= 0.0 {
        return 0.0;
    }
    let one_minus_c = 1.0 - c;
    a * a * q * (p - c) * (p - c) / (p * one_minus_c * one_minus_c)
}
