//! Tariff schedule domain entity and the pricing engine
//!
//! A schedule is the rate table for one (customer type, year) pair:
//! progressive usage tiers, surcharge percentages, meter rent brackets and
//! the VAT rule. Immutable once loaded for a calculation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shared::errors::DomainError;

/// Customer category a tariff schedule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomerType {
    Domestic,
    Commercial,
    Industrial,
    Institutional,
}

impl Default for CustomerType {
    fn default() -> Self {
        Self::Domestic
    }
}

impl std::fmt::Display for CustomerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Domestic => write!(f, "Domestic"),
            Self::Commercial => write!(f, "Commercial"),
            Self::Industrial => write!(f, "Industrial"),
            Self::Institutional => write!(f, "Institutional"),
        }
    }
}

impl std::str::FromStr for CustomerType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Domestic" => Ok(Self::Domestic),
            "Commercial" => Ok(Self::Commercial),
            "Industrial" => Ok(Self::Industrial),
            "Institutional" => Ok(Self::Institutional),
            other => Err(DomainError::Validation(format!(
                "Unknown customer type: {other}"
            ))),
        }
    }
}

/// One usage band: everything up to `upper_bound_m3` is priced at
/// `rate_per_m3`. `None` marks the open-ended last band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub upper_bound_m3: Option<Decimal>,
    pub rate_per_m3: Decimal,
}

/// Flat monthly rent for meters up to `max_size_inches`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentBracket {
    pub max_size_inches: Decimal,
    pub monthly_rent: Decimal,
}

/// Rate schedule for a (customer type, year) pair
#[derive(Debug, Clone, PartialEq)]
pub struct TariffSchedule {
    pub customer_type: CustomerType,
    pub year: i32,
    pub tiers: Vec<Tier>,
    pub sewerage_tiers: Vec<Tier>,
    /// Maintenance fee as a fraction of the base water charge (e.g. 0.05)
    pub maintenance_percentage: Decimal,
    /// Sanitation fee as a fraction of the base water charge
    pub sanitation_percentage: Decimal,
    /// Sorted ascending by max size; lookup takes the smallest enclosing bracket
    pub meter_rent_brackets: Vec<RentBracket>,
    /// VAT as a fraction of the charge subtotal (e.g. 0.13)
    pub vat_rate: Decimal,
    /// Domestic customers at or below this usage are VAT exempt
    pub domestic_vat_threshold_m3: Decimal,
}

/// Progressive marginal pricing over ordered usage bands.
///
/// Usage is consumed against bands in order: each band charges
/// `min(remaining, upper_bound - previous_bound)` at its rate; the open-ended
/// last band absorbs the rest. Callers must normalize usage to >= 0 first.
pub fn banded_charge(usage_m3: Decimal, tiers: &[Tier]) -> Decimal {
    debug_assert!(usage_m3 >= Decimal::ZERO, "usage must be normalized");

    let mut remaining = usage_m3;
    let mut previous_bound = Decimal::ZERO;
    let mut charge = Decimal::ZERO;

    for tier in tiers {
        if remaining <= Decimal::ZERO {
            break;
        }
        let band_quantity = match tier.upper_bound_m3 {
            Some(upper) => remaining.min(upper - previous_bound),
            None => remaining,
        };
        if band_quantity > Decimal::ZERO {
            charge += band_quantity * tier.rate_per_m3;
            remaining -= band_quantity;
        }
        if let Some(upper) = tier.upper_bound_m3 {
            previous_bound = upper;
        }
    }

    charge
}

impl TariffSchedule {
    /// Base water charge for a usage figure
    pub fn base_water_charge(&self, usage_m3: Decimal) -> Decimal {
        banded_charge(usage_m3, &self.tiers)
    }

    pub fn maintenance_fee(&self, base_water_charge: Decimal) -> Decimal {
        base_water_charge * self.maintenance_percentage
    }

    pub fn sanitation_fee(&self, base_water_charge: Decimal) -> Decimal {
        base_water_charge * self.sanitation_percentage
    }

    /// Sewerage charge only applies with an active sewerage connection
    pub fn sewerage_charge(&self, usage_m3: Decimal, sewerage_connection: bool) -> Decimal {
        if sewerage_connection {
            banded_charge(usage_m3, &self.sewerage_tiers)
        } else {
            Decimal::ZERO
        }
    }

    /// Flat rent from the smallest bracket enclosing the meter size.
    ///
    /// Sizes above every bracket take the largest bracket's rent, so an
    /// oversized meter is never rent-free.
    pub fn meter_rent(&self, meter_size_inches: Decimal) -> Decimal {
        let enclosing = self
            .meter_rent_brackets
            .iter()
            .find(|b| b.max_size_inches >= meter_size_inches);
        match enclosing.or_else(|| self.meter_rent_brackets.last()) {
            Some(bracket) => bracket.monthly_rent,
            None => Decimal::ZERO,
        }
    }

    /// Threshold-gated VAT.
    ///
    /// Domestic customers with usage at or below the threshold are exempt;
    /// the boundary is inclusive (usage == threshold pays no VAT).
    pub fn vat_amount(&self, usage_m3: Decimal, charge_subtotal: Decimal) -> Decimal {
        if self.customer_type == CustomerType::Domestic
            && usage_m3 <= self.domestic_vat_threshold_m3
        {
            return Decimal::ZERO;
        }
        charge_subtotal * self.vat_rate
    }

    /// Price a usage figure into a full charge breakdown.
    ///
    /// Negative usage is clamped to zero before pricing; meter rent is
    /// charged regardless of usage.
    pub fn calculate(
        &self,
        usage_m3: Decimal,
        sewerage_connection: bool,
        meter_size_inches: Decimal,
    ) -> ChargeBreakdown {
        let usage = usage_m3.max(Decimal::ZERO);

        let base_water_charge = self.base_water_charge(usage);
        let maintenance_fee = self.maintenance_fee(base_water_charge);
        let sanitation_fee = self.sanitation_fee(base_water_charge);
        let sewerage_charge = self.sewerage_charge(usage, sewerage_connection);
        let meter_rent = self.meter_rent(meter_size_inches);

        let subtotal = base_water_charge + maintenance_fee + sanitation_fee + sewerage_charge;
        let vat_amount = self.vat_amount(usage, subtotal);

        ChargeBreakdown {
            base_water_charge,
            maintenance_fee,
            sanitation_fee,
            sewerage_charge,
            meter_rent,
            vat_amount,
            total: subtotal + meter_rent + vat_amount,
        }
    }

    /// Check the schedule invariants: tier upper bounds strictly increasing,
    /// only the last tier open-ended, rates and percentages non-negative.
    pub fn validate(&self) -> Result<(), DomainError> {
        Self::validate_tiers(&self.tiers, "tiers")?;
        Self::validate_tiers(&self.sewerage_tiers, "sewerage_tiers")?;

        if self.maintenance_percentage < Decimal::ZERO
            || self.sanitation_percentage < Decimal::ZERO
            || self.vat_rate < Decimal::ZERO
        {
            return Err(DomainError::Validation(
                "Surcharge percentages and VAT rate must be non-negative".to_string(),
            ));
        }
        if self.meter_rent_brackets.iter().any(|b| b.monthly_rent < Decimal::ZERO) {
            return Err(DomainError::Validation(
                "Meter rent must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_tiers(tiers: &[Tier], table: &str) -> Result<(), DomainError> {
        let mut previous_bound: Option<Decimal> = None;
        for (index, tier) in tiers.iter().enumerate() {
            if tier.rate_per_m3 < Decimal::ZERO {
                return Err(DomainError::Validation(format!(
                    "{table}[{index}]: rate must be non-negative"
                )));
            }
            match tier.upper_bound_m3 {
                Some(upper) => {
                    if let Some(prev) = previous_bound {
                        if upper <= prev {
                            return Err(DomainError::Validation(format!(
                                "{table}[{index}]: upper bounds must be strictly increasing"
                            )));
                        }
                    }
                    previous_bound = Some(upper);
                }
                None => {
                    if index != tiers.len() - 1 {
                        return Err(DomainError::Validation(format!(
                            "{table}[{index}]: only the last tier may be open-ended"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Priced result for one usage figure. All fields non-negative; a
/// deterministic function of (usage, schedule, sewerage flag, meter size).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeBreakdown {
    pub base_water_charge: Decimal,
    pub maintenance_fee: Decimal,
    pub sanitation_fee: Decimal,
    pub sewerage_charge: Decimal,
    pub meter_rent: Decimal,
    pub vat_amount: Decimal,
    pub total: Decimal,
}

impl ChargeBreakdown {
    /// All-zero breakdown, the degraded output when no schedule is found
    pub fn zero() -> Self {
        Self {
            base_water_charge: Decimal::ZERO,
            maintenance_fee: Decimal::ZERO,
            sanitation_fee: Decimal::ZERO,
            sewerage_charge: Decimal::ZERO,
            meter_rent: Decimal::ZERO,
            vat_amount: Decimal::ZERO,
            total: Decimal::ZERO,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.total == Decimal::ZERO
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_schedule(customer_type: CustomerType) -> TariffSchedule {
        TariffSchedule {
            customer_type,
            year: 2025,
            tiers: vec![
                Tier { upper_bound_m3: Some(dec!(10)), rate_per_m3: dec!(5.00) },
                Tier { upper_bound_m3: Some(dec!(20)), rate_per_m3: dec!(8.50) },
                Tier { upper_bound_m3: Some(dec!(30)), rate_per_m3: dec!(12.00) },
                Tier { upper_bound_m3: None, rate_per_m3: dec!(20.00) },
            ],
            sewerage_tiers: vec![
                Tier { upper_bound_m3: Some(dec!(10)), rate_per_m3: dec!(2.00) },
                Tier { upper_bound_m3: None, rate_per_m3: dec!(4.00) },
            ],
            maintenance_percentage: dec!(0.05),
            sanitation_percentage: dec!(0.03),
            meter_rent_brackets: vec![
                RentBracket { max_size_inches: dec!(0.5), monthly_rent: dec!(50) },
                RentBracket { max_size_inches: dec!(0.75), monthly_rent: dec!(75) },
                RentBracket { max_size_inches: dec!(1), monthly_rent: dec!(100) },
                RentBracket { max_size_inches: dec!(2), monthly_rent: dec!(250) },
                RentBracket { max_size_inches: dec!(4), monthly_rent: dec!(1000) },
            ],
            vat_rate: dec!(0.13),
            domestic_vat_threshold_m3: dec!(10),
        }
    }

    #[test]
    fn banded_charge_zero_usage() {
        let s = sample_schedule(CustomerType::Domestic);
        assert_eq!(banded_charge(dec!(0), &s.tiers), dec!(0));
    }

    #[test]
    fn banded_charge_within_first_band() {
        let s = sample_schedule(CustomerType::Domestic);
        // 7 * 5.00 = 35.00
        assert_eq!(banded_charge(dec!(7), &s.tiers), dec!(35.00));
    }

    #[test]
    fn banded_charge_spans_bands() {
        let s = sample_schedule(CustomerType::Domestic);
        // 10*5.00 + 10*8.50 + 5*12.00 = 50 + 85 + 60 = 195
        assert_eq!(banded_charge(dec!(25), &s.tiers), dec!(195.00));
    }

    #[test]
    fn banded_charge_open_ended_band() {
        let s = sample_schedule(CustomerType::Domestic);
        // 10*5.00 + 10*8.50 + 10*12.00 + 10*20.00 = 50+85+120+200 = 455
        assert_eq!(banded_charge(dec!(40), &s.tiers), dec!(455.00));
    }

    #[test]
    fn banded_charge_exact_boundary_no_double_count() {
        let s = sample_schedule(CustomerType::Domestic);
        // exactly 10: entirely in the first band
        assert_eq!(banded_charge(dec!(10), &s.tiers), dec!(50.00));
        // 10 + epsilon crosses into the second band
        assert_eq!(banded_charge(dec!(10.5), &s.tiers), dec!(54.250));
    }

    #[test]
    fn banded_charge_is_monotone_non_decreasing() {
        let s = sample_schedule(CustomerType::Domestic);
        let mut last = dec!(-1);
        for i in 0..50 {
            let charge = banded_charge(Decimal::from(i), &s.tiers);
            assert!(charge >= last, "charge decreased at usage {i}");
            last = charge;
        }
    }

    #[test]
    fn banded_charge_empty_tiers_is_zero() {
        assert_eq!(banded_charge(dec!(100), &[]), dec!(0));
    }

    #[test]
    fn sewerage_requires_connection() {
        let s = sample_schedule(CustomerType::Domestic);
        assert_eq!(s.sewerage_charge(dec!(15), false), dec!(0));
        // 10*2.00 + 5*4.00 = 40
        assert_eq!(s.sewerage_charge(dec!(15), true), dec!(40.00));
    }

    #[test]
    fn meter_rent_bracket_lookup() {
        let s = sample_schedule(CustomerType::Domestic);
        assert_eq!(s.meter_rent(dec!(0.5)), dec!(50));
        assert_eq!(s.meter_rent(dec!(0.75)), dec!(75));
        // 1.5 has no exact bracket, takes the nearest enclosing (2")
        assert_eq!(s.meter_rent(dec!(1.5)), dec!(250));
        assert_eq!(s.meter_rent(dec!(4)), dec!(1000));
        // larger than every bracket falls back to the largest
        assert_eq!(s.meter_rent(dec!(6)), dec!(1000));
    }

    #[test]
    fn meter_rent_without_brackets_is_zero() {
        let mut s = sample_schedule(CustomerType::Domestic);
        s.meter_rent_brackets.clear();
        assert_eq!(s.meter_rent(dec!(1)), dec!(0));
    }

    #[test]
    fn vat_exempt_at_domestic_threshold_inclusive() {
        let s = sample_schedule(CustomerType::Domestic);
        // usage exactly at the threshold: exempt, stable across calls
        for _ in 0..3 {
            assert_eq!(s.vat_amount(dec!(10), dec!(100)), dec!(0));
        }
        // just above the threshold: charged
        assert_eq!(s.vat_amount(dec!(10.1), dec!(100)), dec!(13.00));
    }

    #[test]
    fn vat_applies_to_non_domestic_below_threshold() {
        let s = sample_schedule(CustomerType::Commercial);
        assert_eq!(s.vat_amount(dec!(5), dec!(100)), dec!(13.00));
    }

    #[test]
    fn calculate_zero_usage_charges_only_rent() {
        let s = sample_schedule(CustomerType::Domestic);
        let bd = s.calculate(dec!(0), true, dec!(0.75));
        assert_eq!(bd.base_water_charge, dec!(0));
        assert_eq!(bd.maintenance_fee, dec!(0));
        assert_eq!(bd.sanitation_fee, dec!(0));
        assert_eq!(bd.sewerage_charge, dec!(0));
        assert_eq!(bd.vat_amount, dec!(0));
        assert_eq!(bd.meter_rent, dec!(75));
        assert_eq!(bd.total, dec!(75));
    }

    #[test]
    fn calculate_clamps_negative_usage() {
        let s = sample_schedule(CustomerType::Domestic);
        let bd = s.calculate(dec!(-5), false, dec!(0.5));
        assert_eq!(bd.base_water_charge, dec!(0));
        assert_eq!(bd.total, dec!(50));
    }

    #[test]
    fn calculate_full_breakdown() {
        let s = sample_schedule(CustomerType::Commercial);
        let bd = s.calculate(dec!(25), true, dec!(2));
        // base: 195, maintenance: 9.75, sanitation: 5.85
        // sewerage: 10*2 + 15*4 = 80
        // subtotal: 290.60, vat: 37.778, rent: 250
        assert_eq!(bd.base_water_charge, dec!(195.00));
        assert_eq!(bd.maintenance_fee, dec!(9.7500));
        assert_eq!(bd.sanitation_fee, dec!(5.8500));
        assert_eq!(bd.sewerage_charge, dec!(80.00));
        assert_eq!(bd.meter_rent, dec!(250));
        assert_eq!(bd.vat_amount, bd.base_water_charge * dec!(0.13)
            + bd.maintenance_fee * dec!(0.13)
            + bd.sanitation_fee * dec!(0.13)
            + bd.sewerage_charge * dec!(0.13));
        assert_eq!(
            bd.total,
            bd.base_water_charge
                + bd.maintenance_fee
                + bd.sanitation_fee
                + bd.sewerage_charge
                + bd.meter_rent
                + bd.vat_amount
        );
    }

    #[test]
    fn validate_accepts_sample() {
        assert!(sample_schedule(CustomerType::Domestic).validate().is_ok());
    }

    #[test]
    fn validate_rejects_non_increasing_bounds() {
        let mut s = sample_schedule(CustomerType::Domestic);
        s.tiers[1].upper_bound_m3 = Some(dec!(10));
        assert!(s.validate().is_err());
    }

    #[test]
    fn validate_rejects_negative_rate() {
        let mut s = sample_schedule(CustomerType::Domestic);
        s.tiers[0].rate_per_m3 = dec!(-1);
        assert!(s.validate().is_err());
    }

    #[test]
    fn validate_rejects_open_ended_mid_table() {
        let mut s = sample_schedule(CustomerType::Domestic);
        s.tiers[1].upper_bound_m3 = None;
        assert!(s.validate().is_err());
    }

    #[test]
    fn customer_type_round_trips() {
        for ct in [
            CustomerType::Domestic,
            CustomerType::Commercial,
            CustomerType::Industrial,
            CustomerType::Institutional,
        ] {
            assert_eq!(ct.to_string().parse::<CustomerType>().unwrap(), ct);
        }
        assert!("Unknown".parse::<CustomerType>().is_err());
    }
}
