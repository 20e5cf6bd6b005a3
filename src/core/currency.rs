use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Settlement currencies accepted by the platform, with their decimal
/// precision rules. These mirror the currencies Paystack can charge in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Nigerian Naira (2 decimal places, minor unit: kobo)
    NGN,
    /// Ghanaian Cedi (2 decimal places, minor unit: pesewa)
    GHS,
    /// South African Rand (2 decimal places)
    ZAR,
    /// Kenyan Shilling (2 decimal places)
    KES,
    /// US Dollar (2 decimal places)
    USD,
    /// West African CFA Franc (no decimal places)
    XOF,
}

impl Currency {
    /// Returns the decimal scale for this currency
    pub fn scale(&self) -> u32 {
        match self {
            Currency::XOF => 0,
            _ => 2,
        }
    }

    /// Rounds a decimal value to the appropriate scale for this currency
    /// (banker's rounding, via `round_dp`)
    pub fn round(&self, amount: Decimal) -> Decimal {
        amount.round_dp(self.scale())
    }

    /// Validates that a decimal value has the correct scale for this currency
    pub fn validate_amount(&self, amount: Decimal) -> Result<(), String> {
        let scale = amount.normalize().scale();
        let expected_scale = self.scale();

        if scale > expected_scale {
            return Err(format!(
                "{} amounts must have at most {} decimal places, got {}",
                self, expected_scale, scale
            ));
        }

        if amount < Decimal::ZERO {
            return Err(format!("{} amount cannot be negative", self));
        }

        Ok(())
    }

    /// Converts a major-unit amount into the gateway's minor units
    /// (kobo/pesewas/cents). The amount must already be rounded to the
    /// currency scale.
    pub fn to_minor_units(&self, amount: Decimal) -> Result<i64, String> {
        self.validate_amount(amount)?;

        let scaled = amount * Decimal::from(10i64.pow(self.scale()));
        scaled
            .trunc()
            .to_i64()
            .ok_or_else(|| format!("{} amount {} overflows minor units", self, amount))
    }

    /// Converts a gateway minor-unit amount back into major units
    pub fn from_minor_units(&self, minor: i64) -> Decimal {
        Decimal::new(minor, self.scale())
    }

    /// Formats an amount for display with the correct decimal places
    pub fn format_amount(&self, amount: Decimal) -> String {
        let scale = self.scale();
        if scale == 0 {
            format!("{} {}", self, amount.round_dp(0))
        } else {
            format!("{} {:.width$}", self, amount, width = scale as usize)
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Currency::NGN => "NGN",
            Currency::GHS => "GHS",
            Currency::ZAR => "ZAR",
            Currency::KES => "KES",
            Currency::USD => "USD",
            Currency::XOF => "XOF",
        };
        write!(f, "{}", code)
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NGN" => Ok(Currency::NGN),
            "GHS" => Ok(Currency::GHS),
            "ZAR" => Ok(Currency::ZAR),
            "KES" => Ok(Currency::KES),
            "USD" => Ok(Currency::USD),
            "XOF" => Ok(Currency::XOF),
            _ => Err(format!("Invalid currency: {}", s)),
        }
    }
}

impl TryFrom<String> for Currency {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<&str> for Currency {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_scale() {
        assert_eq!(Currency::NGN.scale(), 2);
        assert_eq!(Currency::USD.scale(), 2);
        assert_eq!(Currency::XOF.scale(), 0);
    }

    #[test]
    fn test_currency_rounding() {
        // XOF (0 decimal places): 1000.50 rounds to 1000 (banker's rounding)
        assert_eq!(
            Currency::XOF.round(Decimal::new(100050, 2)),
            Decimal::new(1000, 0)
        );
        // NGN (2 decimal places): 10.0055 rounds to 10.01
        assert_eq!(
            Currency::NGN.round(Decimal::new(100055, 4)),
            Decimal::new(1001, 2)
        );
    }

    #[test]
    fn test_currency_validation() {
        assert!(Currency::XOF
            .validate_amount(Decimal::new(1000000, 0))
            .is_ok());
        assert!(Currency::NGN.validate_amount(Decimal::new(100050, 2)).is_ok());

        // XOF should not accept decimals
        assert!(Currency::XOF
            .validate_amount(Decimal::new(100055, 2))
            .is_err());

        // Negative amounts should be rejected
        assert!(Currency::NGN.validate_amount(Decimal::new(-1000, 0)).is_err());
    }

    #[test]
    fn test_minor_unit_conversion() {
        // NGN 1,500.00 => 150,000 kobo
        assert_eq!(
            Currency::NGN.to_minor_units(Decimal::new(150000, 2)).unwrap(),
            150_000
        );
        // XOF has no minor unit split
        assert_eq!(
            Currency::XOF.to_minor_units(Decimal::from(2500)).unwrap(),
            2500
        );
        assert_eq!(
            Currency::NGN.from_minor_units(150_000),
            Decimal::new(150000, 2)
        );
    }

    #[test]
    fn test_minor_units_roundtrip_after_rounding() {
        let raw = Decimal::new(100055, 4); // 10.0055
        let rounded = Currency::GHS.round(raw);
        let minor = Currency::GHS.to_minor_units(rounded).unwrap();
        assert_eq!(Currency::GHS.from_minor_units(minor), rounded);
    }

    #[test]
    fn test_currency_formatting() {
        assert_eq!(
            Currency::XOF.format_amount(Decimal::from(1000000)),
            "XOF 1000000"
        );
        assert_eq!(
            Currency::NGN.format_amount(Decimal::new(100050, 2)),
            "NGN 1000.50"
        );
    }
}
