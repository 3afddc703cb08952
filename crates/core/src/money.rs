use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};

/// Signed statement amount. Negative values are debits / charges, positive
/// values are credits / payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal.round_dp(2))
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn is_positive(self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }
}

impl Neg for Money {
    type Output = Money;
    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn from_decimal_rounds_to_cents() {
        let m = Money::from_decimal(Decimal::from_str("4.505").unwrap());
        assert_eq!(m, Money::from_cents(450));
        let m = Money::from_decimal(Decimal::from_str("4.515").unwrap());
        assert_eq!(m, Money::from_cents(452));
    }

    #[test]
    fn display_always_two_decimals() {
        assert_eq!(Money::from_cents(-450).to_string(), "-4.50");
        assert_eq!(Money::from_cents(12000).to_string(), "120.00");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn sign_helpers() {
        assert!(Money::from_cents(-1).is_negative());
        assert!(!Money::from_cents(-1).is_positive());
        assert!(Money::from_cents(1).is_positive());
        assert!(!Money::zero().is_negative());
        assert!(!Money::zero().is_positive());
    }

    #[test]
    fn arithmetic_stays_in_cents() {
        let debit = Money::from_cents(4510);
        let credit = Money::from_cents(150000);
        assert_eq!(credit - debit, Money::from_cents(145490));
        assert_eq!(Money::zero() + credit - debit - credit, -debit);
        assert!((-debit).is_negative());
    }

    #[test]
    fn serializes_as_json_number() {
        let json = serde_json::to_string(&Money::from_cents(-450)).unwrap();
        assert_eq!(json, "-4.5");
    }
}
