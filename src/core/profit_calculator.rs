/// Round-trip profitability gate. The sell leg must return the full input
/// plus the configured minimum before any instruction building happens.
pub struct ProfitCalculator {
    min_profit: u64,
    fee_estimate: u64,
}

impl ProfitCalculator {
    pub fn new(min_profit: u64, fee_estimate: u64) -> Self {
        Self {
            min_profit,
            fee_estimate,
        }
    }

    /// Net profit of the round trip, or `None` when the opportunity does
    /// not clear the threshold. Falling short is a normal cycle result,
    /// not an error.
    pub fn evaluate(&self, input_amount: u64, sell_output: u64) -> Option<u64> {
        let required = input_amount.checked_add(self.min_profit)?;
        if sell_output < required {
            return None;
        }
        Some(sell_output - input_amount)
    }

    /// Configured flat estimate; reported in alerts, never derived from
    /// live compute-unit pricing.
    pub fn fee_estimate(&self) -> u64 {
        self.fee_estimate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profitable_round_trip() {
        let calc = ProfitCalculator::new(1_200, 5_000);
        assert_eq!(calc.evaluate(10_000_000, 10_001_300), Some(1_300));
    }

    #[test]
    fn test_below_threshold_is_no_opportunity() {
        let calc = ProfitCalculator::new(1_200, 5_000);
        assert_eq!(calc.evaluate(10_000_000, 10_000_500), None);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let calc = ProfitCalculator::new(1_200, 5_000);
        assert_eq!(calc.evaluate(10_000_000, 10_001_200), Some(1_200));
    }

    #[test]
    fn test_round_trip_at_a_loss() {
        let calc = ProfitCalculator::new(0, 5_000);
        assert_eq!(calc.evaluate(10_000_000, 9_999_999), None);
        assert_eq!(calc.evaluate(10_000_000, 10_000_000), Some(0));
    }

    #[test]
    fn test_overflowing_threshold_never_passes() {
        let calc = ProfitCalculator::new(u64::MAX, 5_000);
        assert_eq!(calc.evaluate(10, u64::MAX), None);
    }
}
