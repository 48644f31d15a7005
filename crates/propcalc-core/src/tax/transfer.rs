use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::{JurisdictionTaxPolicy, TransferBracket};
use crate::tax::PropertyUse;
use crate::types::{round_money, Money, Percent};

/// One-off tax due on acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferTaxResult {
    /// Transfer tax proper (IMT / overdrachtsbelasting)
    pub amount: Money,
    /// Rate of the bracket the price falls in
    pub marginal_rate_percent: Percent,
    pub stamp_duty: Money,
}

impl TransferTaxResult {
    pub fn total(&self) -> Money {
        self.amount + self.stamp_duty
    }
}

/// Transfer tax for `price` under the use-class table of one jurisdiction.
pub fn transfer_tax(
    policy: &JurisdictionTaxPolicy,
    price: Money,
    property_use: PropertyUse,
) -> TransferTaxResult {
    let table = match property_use {
        PropertyUse::PrimaryResidence => &policy.transfer.primary_residence,
        PropertyUse::SecondaryResidence => &policy.transfer.secondary_residence,
        PropertyUse::NonResidential => &policy.transfer.non_residential,
    };

    let price = price.max(Decimal::ZERO);
    let (amount, marginal_rate_percent) = apply_brackets(price, table);

    TransferTaxResult {
        amount: round_money(amount),
        marginal_rate_percent,
        stamp_duty: round_money(price * policy.stamp_duty_percent / dec!(100)),
    }
}

/// Walks the table bottom-up. Marginal brackets tax their own slice; a flat
/// bracket replaces everything with `price * rate` once the price lands in it.
fn apply_brackets(price: Money, table: &[TransferBracket]) -> (Money, Percent) {
    let mut lower = Decimal::ZERO;
    let mut amount = Decimal::ZERO;

    for bracket in table {
        let contains_price = bracket.up_to.map_or(true, |limit| price <= limit);

        if bracket.flat {
            if contains_price {
                return (price * bracket.rate_percent / dec!(100), bracket.rate_percent);
            }
        } else {
            let top = bracket.up_to.map_or(price, |limit| price.min(limit));
            if top > lower {
                amount += (top - lower) * bracket.rate_percent / dec!(100);
            }
            if contains_price {
                return (amount, bracket.rate_percent);
            }
        }

        if let Some(limit) = bracket.up_to {
            lower = limit;
        }
    }

    (amount, table.last().map_or(Decimal::ZERO, |b| b.rate_percent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pt() -> JurisdictionTaxPolicy {
        JurisdictionTaxPolicy::portugal()
    }

    #[test]
    fn test_pt_primary_residence_exempt_band() {
        let r = transfer_tax(&pt(), dec!(100000), PropertyUse::PrimaryResidence);
        assert_eq!(r.amount, dec!(0));
        assert_eq!(r.marginal_rate_percent, dec!(0));
        assert_eq!(r.stamp_duty, dec!(800));
    }

    #[test]
    fn test_pt_primary_residence_marginal() {
        // (139412-101917)*2% + (190086-139412)*5% + (200000-190086)*7%
        // = 749.90 + 2533.70 + 693.98
        let r = transfer_tax(&pt(), dec!(200000), PropertyUse::PrimaryResidence);
        assert_eq!(r.amount, dec!(3977.58));
        assert_eq!(r.marginal_rate_percent, dec!(7));
        assert_eq!(r.total(), dec!(5577.58));
    }

    #[test]
    fn test_pt_secondary_residence_pays_first_band() {
        let r = transfer_tax(&pt(), dec!(100000), PropertyUse::SecondaryResidence);
        assert_eq!(r.amount, dec!(1000));
        assert_eq!(r.marginal_rate_percent, dec!(1));
    }

    #[test]
    fn test_pt_flat_top_brackets() {
        let r = transfer_tax(&pt(), dec!(800000), PropertyUse::PrimaryResidence);
        assert_eq!(r.amount, dec!(48000));
        assert_eq!(r.marginal_rate_percent, dec!(6));

        let r = transfer_tax(&pt(), dec!(2000000), PropertyUse::SecondaryResidence);
        assert_eq!(r.amount, dec!(150000));
        assert_eq!(r.marginal_rate_percent, dec!(7.5));
    }

    #[test]
    fn test_non_residential_flat_rate() {
        let r = transfer_tax(&pt(), dec!(300000), PropertyUse::NonResidential);
        assert_eq!(r.amount, dec!(19500));
        assert_eq!(r.marginal_rate_percent, dec!(6.5));
    }

    #[test]
    fn test_nl_investment_property() {
        let nl = JurisdictionTaxPolicy::netherlands();
        let r = transfer_tax(&nl, dec!(400000), PropertyUse::SecondaryResidence);
        assert_eq!(r.amount, dec!(41600));
        assert_eq!(r.stamp_duty, Decimal::ZERO);
    }
}
