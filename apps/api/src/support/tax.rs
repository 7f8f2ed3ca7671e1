//! Effective-tax-rate approximation used to estimate net disposable income.
//!
//! This is a bracketed simplification, not the statutory formula. The table is keyed
//! on *annualized* gross income and applies one flat effective rate to the whole amount.

/// Upper bound of annual gross income (inclusive) and the effective rate applied.
/// The last bracket has no upper bound.
const EFFECTIVE_RATE_BRACKETS: &[(f64, f64)] = &[
    (20_000.0, 0.12),
    (50_000.0, 0.18),
    (100_000.0, 0.24),
    (200_000.0, 0.30),
    (f64::INFINITY, 0.36),
];

/// Returns the effective tax rate for an annual gross income.
pub fn effective_rate(annual_gross: f64) -> f64 {
    if annual_gross <= 0.0 {
        return 0.0;
    }
    EFFECTIVE_RATE_BRACKETS
        .iter()
        .find(|(ceiling, _)| annual_gross <= *ceiling)
        .map(|(_, rate)| *rate)
        .unwrap_or(0.36)
}

/// Approximates monthly net disposable income:
/// gross − (gross × effective rate of the annualized gross) − mandatory deductions.
///
/// Never negative: deductions larger than after-tax income clamp to zero.
pub fn net_disposable_monthly(gross_monthly: f64, deductions_monthly: f64) -> f64 {
    let rate = effective_rate(gross_monthly * 12.0);
    let after_tax = gross_monthly - gross_monthly * rate;
    (after_tax - deductions_monthly).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_income_has_zero_rate() {
        assert_eq!(effective_rate(0.0), 0.0);
        assert_eq!(net_disposable_monthly(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_bracket_boundaries_are_inclusive() {
        assert_eq!(effective_rate(20_000.0), 0.12);
        assert_eq!(effective_rate(20_000.01), 0.18);
        assert_eq!(effective_rate(100_000.0), 0.24);
        assert_eq!(effective_rate(250_000.0), 0.36);
    }

    #[test]
    fn test_net_income_for_mid_bracket_earner() {
        // 6500/month → 78,000/year → 24%: 6500 − 1560 − 1300 = 3640
        let net = net_disposable_monthly(6500.0, 1300.0);
        assert!((net - 3640.0).abs() < 1e-9, "net was {net}");
    }

    #[test]
    fn test_net_income_never_negative() {
        assert_eq!(net_disposable_monthly(1000.0, 5000.0), 0.0);
    }
}
