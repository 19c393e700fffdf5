//! Numerically stable summation helpers.

/// Compensated (Neumaier) summation.
///
/// Keeps the rounding error of long probability sums well below the
/// tolerances used for row and normalization checks.
pub fn stable_sum<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let mut sum = 0.0;
    let mut compensation = 0.0;
    for v in values {
        let t = sum + v;
        if sum.abs() >= v.abs() {
            compensation += (sum - t) + v;
        } else {
            compensation += (v - t) + sum;
        }
        sum = t;
    }
    sum + compensation
}

/// Absolute-tolerance float comparison. NaN never compares equal.
pub fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return false;
    }
    (a - b).abs() <= tol
}

/// Whether `total` is a usable normalizer.
pub fn is_normalizable(total: f64) -> bool {
    total.is_finite() && total > 0.0
}
