use std::f64::consts::PI;

/// Natural logarithm of the gamma function for `x > 0`.
///
/// Shifts `x` above 10 with the recurrence `ln Γ(x) = ln Γ(x + 1) - ln x`, then applies
/// Stirling's series with three Bernoulli corrections. Absolute error is below 1e-10 on
/// the count ranges used by the structure scores.
pub fn ln_gamma(x: f64) -> f64 {
    if x <= 0.0 {
        return f64::INFINITY;
    }

    let mut x = x;
    let mut result = 0.0;
    while x < 10.0 {
        result -= x.ln();
        x += 1.0;
    }

    let inv_x = 1.0 / x;
    let inv_x2 = inv_x * inv_x;
    let correction = inv_x * (1.0 / 12.0 - inv_x2 * (1.0 / 360.0 - inv_x2 / 1260.0));

    result + (x - 0.5) * x.ln() - x + 0.5 * (2.0 * PI).ln() + correction
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn matches_log_factorials() {
        let mut log_fact = 0.0;
        for n in 1..40u32 {
            // ln Γ(n) = ln (n-1)!
            assert_abs_diff_eq!(ln_gamma(n as f64), log_fact, epsilon = 1e-9);
            log_fact += (n as f64).ln();
        }
    }

    #[test]
    fn half_integer_value() {
        // Γ(1/2) = sqrt(pi)
        assert_abs_diff_eq!(ln_gamma(0.5), 0.5 * PI.ln(), epsilon = 1e-10);
    }

    #[test]
    fn non_positive_arguments_are_infinite() {
        assert!(ln_gamma(0.0).is_infinite());
        assert!(ln_gamma(-1.5).is_infinite());
    }
}
