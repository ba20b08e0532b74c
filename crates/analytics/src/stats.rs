//! Small statistics helpers with one fixed definition each.

use rust_decimal::Decimal;

/// Percentile by linear interpolation between closest ranks.
///
/// The values are sorted, the fractional rank `p * (n - 1)` is located and the
/// result is interpolated between its floor and ceiling neighbours. `p` is clamped
/// to `[0, 1]`, so the result never leaves the range of the input. Returns `None`
/// for an empty input.
pub fn percentile_linear(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Pearson product-moment correlation of two equally long series.
///
/// Returns `None` when fewer than two pairs are given, the lengths differ, or either
/// series has zero variance (the coefficient is undefined there). The result is
/// clamped to `[-1, 1]` to absorb floating-point overshoot.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len();
    if n < 2 || n != ys.len() {
        return None;
    }
    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x <= f64::EPSILON || var_y <= f64::EPSILON {
        return None;
    }
    let r = cov / (var_x.sqrt() * var_y.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Arithmetic mean of a set of decimals, `None` when empty.
pub fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sum: Decimal = values.iter().sum();
    sum.checked_div(Decimal::from(values.len()))
}
