use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::{JurisdictionTaxPolicy, RentalTaxPolicy};
use crate::tax::RentalRegime;
use crate::types::{round_money, Money, Percent};

/// Tax on one year of rental income.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalIncomeTax {
    pub rate_percent: Percent,
    /// Gross rent received
    pub gross_amount: Money,
    /// Part of the gross rent the rate is applied to
    pub taxable_amount: Money,
    pub tax_amount: Money,
    /// Gross rent after tax
    pub net_amount: Money,
}

impl RentalIncomeTax {
    fn zero() -> Self {
        Self {
            rate_percent: Decimal::ZERO,
            gross_amount: Decimal::ZERO,
            taxable_amount: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            net_amount: Decimal::ZERO,
        }
    }
}

/// Rate for a lease of `contract_years`: the longest duration bracket the
/// contract reaches, or the base rate.
pub fn lease_rate_percent(policy: &RentalTaxPolicy, contract_years: u32) -> Percent {
    policy
        .duration_brackets
        .iter()
        .rev()
        .find(|b| contract_years >= b.min_years)
        .map_or(policy.base_rate_percent, |b| b.rate_percent)
}

/// Flat-rate rental income tax. Long leases get the duration discount;
/// short-stay income is taxed on a fixed taxable share. No rent, no tax.
pub fn rental_income_tax(
    policy: &RentalTaxPolicy,
    gross_annual_rent: Money,
    contract_years: u32,
    regime: RentalRegime,
) -> RentalIncomeTax {
    if gross_annual_rent.is_zero() {
        return RentalIncomeTax::zero();
    }

    let (rate_percent, taxable_amount) = match regime {
        RentalRegime::LongTermLease => {
            (lease_rate_percent(policy, contract_years), gross_annual_rent)
        }
        RentalRegime::ShortStay => (
            policy.short_stay_rate_percent,
            gross_annual_rent * policy.short_stay_taxable_percent / dec!(100),
        ),
    };

    let tax_amount = round_money(taxable_amount * rate_percent / dec!(100));

    RentalIncomeTax {
        rate_percent,
        gross_amount: gross_annual_rent,
        taxable_amount: round_money(taxable_amount),
        tax_amount,
        net_amount: gross_annual_rent - tax_amount,
    }
}

/// Official assessed value, or the policy share of the market price.
pub fn assessed_value_or_estimate(
    policy: &JurisdictionTaxPolicy,
    assessed_value: Option<Money>,
    market_price: Money,
) -> Money {
    assessed_value
        .unwrap_or_else(|| round_money(market_price * policy.assessed_value_ratio_percent / dec!(100)))
}

/// Annual recurring property tax (IMI / OZB).
pub fn recurring_property_tax(assessed_value: Money, rate_percent: Percent) -> Money {
    round_money(assessed_value * rate_percent / dec!(100))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pt() -> JurisdictionTaxPolicy {
        JurisdictionTaxPolicy::portugal()
    }

    #[test]
    fn test_lease_duration_discount() {
        let rental = pt().rental;
        assert_eq!(lease_rate_percent(&rental, 1), dec!(25));
        assert_eq!(lease_rate_percent(&rental, 5), dec!(15));
        assert_eq!(lease_rate_percent(&rental, 12), dec!(10));
        assert_eq!(lease_rate_percent(&rental, 25), dec!(5));
    }

    #[test]
    fn test_rental_income_tax_long_lease() {
        let t = rental_income_tax(&pt().rental, dec!(12000), 2, RentalRegime::LongTermLease);
        assert_eq!(t.rate_percent, dec!(25));
        assert_eq!(t.tax_amount, dec!(3000));
        assert_eq!(t.net_amount, dec!(9000));
    }

    #[test]
    fn test_rental_income_tax_short_stay() {
        // 35% of 20000 taxable at 28% = 1960
        let t = rental_income_tax(&pt().rental, dec!(20000), 0, RentalRegime::ShortStay);
        assert_eq!(t.taxable_amount, dec!(7000));
        assert_eq!(t.tax_amount, dec!(1960));
        assert_eq!(t.net_amount, dec!(18040));
    }

    #[test]
    fn test_rental_income_tax_zero_rent() {
        let t = rental_income_tax(&pt().rental, dec!(0), 10, RentalRegime::LongTermLease);
        assert_eq!(t, RentalIncomeTax::zero());
    }

    #[test]
    fn test_assessed_value_default_ratio() {
        assert_eq!(assessed_value_or_estimate(&pt(), None, dec!(250000)), dec!(150000));
        assert_eq!(
            assessed_value_or_estimate(&pt(), Some(dec!(90000)), dec!(250000)),
            dec!(90000)
        );
    }

    #[test]
    fn test_recurring_property_tax() {
        assert_eq!(recurring_property_tax(dec!(150000), dec!(0.3)), dec!(450));
    }
}
