use bigdecimal::BigDecimal;

pub type RationalNumber = num_rational::Ratio<u64>;

/// Fraction `numerator / denominator`, or zero when the denominator is zero.
pub fn rational_or_zero(numerator: u64, denominator: u64) -> RationalNumber {
    if denominator == 0 {
        RationalNumber::new(0, 1)
    } else {
        RationalNumber::new(numerator, denominator)
    }
}

/// Expand a ratio into a decimal, at the default `BigDecimal` division precision.
pub fn rational_to_decimal(r: &RationalNumber) -> BigDecimal {
    if *r.numer() == 0 {
        return BigDecimal::from(0);
    }
    (BigDecimal::from(*r.numer()) / BigDecimal::from(*r.denom())).normalized()
}
