//! GST rate arithmetic and statutory report rows
//!
//! Indian GST split: intra-state supplies carry CGST + SGST in equal halves,
//! inter-state supplies carry IGST. The GSTR-1 and GSTR-3B reports aggregate
//! posted journal entries; the structs here are their rows and totals.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{EngineError, EngineResult};

/// GST rate structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GstRate {
    /// Total GST rate percentage (e.g. 18 for 18%)
    pub total_rate: BigDecimal,
    /// Central GST component
    pub cgst_rate: BigDecimal,
    /// State GST component
    pub sgst_rate: BigDecimal,
    /// Integrated GST component
    pub igst_rate: BigDecimal,
}

impl GstRate {
    /// Intra-state rate: CGST and SGST split the total in half.
    pub fn intra_state(total_rate: BigDecimal) -> Self {
        let half_rate = &total_rate / BigDecimal::from(2);
        Self {
            total_rate,
            cgst_rate: half_rate.clone(),
            sgst_rate: half_rate,
            igst_rate: BigDecimal::from(0),
        }
    }

    /// Inter-state rate: the whole total is IGST.
    pub fn inter_state(total_rate: BigDecimal) -> Self {
        Self {
            total_rate: total_rate.clone(),
            cgst_rate: BigDecimal::from(0),
            sgst_rate: BigDecimal::from(0),
            igst_rate: total_rate,
        }
    }

    /// Check the component structure is consistent.
    pub fn validate(&self) -> EngineResult<()> {
        let calculated_total = &self.cgst_rate + &self.sgst_rate + &self.igst_rate;
        if calculated_total != self.total_rate {
            return Err(EngineError::Validation(format!(
                "GST components do not add up to total rate: {} != {}",
                calculated_total, self.total_rate
            )));
        }
        if self.igst_rate == BigDecimal::from(0) && self.cgst_rate != self.sgst_rate {
            return Err(EngineError::Validation(
                "CGST and SGST must be equal for intra-state supplies".to_string(),
            ));
        }
        if self.igst_rate > BigDecimal::from(0)
            && (self.cgst_rate > BigDecimal::from(0) || self.sgst_rate > BigDecimal::from(0))
        {
            return Err(EngineError::Validation(
                "only IGST applies to inter-state supplies".to_string(),
            ));
        }
        Ok(())
    }
}

/// Standard GST slabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GstSlab {
    /// Essential items - 0%
    Exempt,
    /// Reduced rate - 5%
    Reduced,
    /// Standard rate - 12%
    Standard,
    /// Higher rate - 18%
    Higher,
    /// Luxury and sin goods - 28%
    Luxury,
}

impl GstSlab {
    /// Total GST percentage for this slab
    pub fn rate(&self) -> BigDecimal {
        match self {
            GstSlab::Exempt => BigDecimal::from(0),
            GstSlab::Reduced => BigDecimal::from(5),
            GstSlab::Standard => BigDecimal::from(12),
            GstSlab::Higher => BigDecimal::from(18),
            GstSlab::Luxury => BigDecimal::from(28),
        }
    }

    /// Intra-state rate structure for this slab
    pub fn intra_state_rate(&self) -> GstRate {
        GstRate::intra_state(self.rate())
    }

    /// Inter-state rate structure for this slab
    pub fn inter_state_rate(&self) -> GstRate {
        GstRate::inter_state(self.rate())
    }
}

/// GST amounts derived from a base amount and rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GstCalculation {
    pub base_amount: BigDecimal,
    pub gst_rate: GstRate,
    pub cgst_amount: BigDecimal,
    pub sgst_amount: BigDecimal,
    pub igst_amount: BigDecimal,
    pub total_gst_amount: BigDecimal,
    pub total_amount: BigDecimal,
}

impl GstCalculation {
    /// Calculate GST forward from a base amount.
    pub fn calculate(base_amount: BigDecimal, gst_rate: GstRate) -> EngineResult<Self> {
        gst_rate.validate()?;

        let cgst_amount = (&base_amount * &gst_rate.cgst_rate) / BigDecimal::from(100);
        let sgst_amount = (&base_amount * &gst_rate.sgst_rate) / BigDecimal::from(100);
        let igst_amount = (&base_amount * &gst_rate.igst_rate) / BigDecimal::from(100);

        let total_gst_amount = &cgst_amount + &sgst_amount + &igst_amount;
        let total_amount = &base_amount + &total_gst_amount;

        Ok(Self {
            base_amount,
            gst_rate,
            cgst_amount,
            sgst_amount,
            igst_amount,
            total_gst_amount,
            total_amount,
        })
    }

    /// Recover the base amount from a GST-inclusive total.
    pub fn reverse_calculate(total_amount: BigDecimal, gst_rate: GstRate) -> EngineResult<Self> {
        gst_rate.validate()?;

        let divisor = BigDecimal::from(100) + &gst_rate.total_rate;
        let base_amount = (&total_amount * BigDecimal::from(100)) / divisor;

        Self::calculate(base_amount, gst_rate)
    }
}

/// One outward-supply invoice row in GSTR-1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gstr1Invoice {
    /// Entry reference, falling back to the entry number
    pub invoice_no: String,
    pub entry_date: NaiveDate,
    pub taxable_value: BigDecimal,
    /// Effective rate percentage derived from the posted amounts
    pub tax_rate: BigDecimal,
    pub tax_amount: BigDecimal,
}

/// Rate-wise aggregation in GSTR-1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gstr1RateSummary {
    pub tax_rate: BigDecimal,
    pub taxable_value: BigDecimal,
    pub tax_amount: BigDecimal,
    pub invoice_count: usize,
}

/// GSTR-1: outward supplies for a month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gstr1Report {
    pub month: u32,
    pub year: i32,
    pub invoices: Vec<Gstr1Invoice>,
    pub rate_summaries: Vec<Gstr1RateSummary>,
    pub total_taxable_value: BigDecimal,
    pub total_tax: BigDecimal,
}

/// GSTR-3B: summary return for a month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gstr3bReport {
    pub month: u32,
    pub year: i32,
    /// Total taxable outward supplies
    pub outward_supplies: BigDecimal,
    /// GST collected on outward supplies
    pub tax_liability: BigDecimal,
    /// GST paid on inward supplies, claimable as credit
    pub input_tax_credit: BigDecimal,
    /// `tax_liability - input_tax_credit`; negative means carry-forward credit
    pub net_tax_payable: BigDecimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intra_state_splits_in_half() {
        let rate = GstRate::intra_state(BigDecimal::from(18));
        assert_eq!(rate.cgst_rate, BigDecimal::from(9));
        assert_eq!(rate.sgst_rate, BigDecimal::from(9));
        assert_eq!(rate.igst_rate, BigDecimal::from(0));
        assert!(rate.validate().is_ok());
    }

    #[test]
    fn inter_state_is_all_igst() {
        let rate = GstRate::inter_state(BigDecimal::from(18));
        assert_eq!(rate.cgst_rate, BigDecimal::from(0));
        assert_eq!(rate.igst_rate, BigDecimal::from(18));
        assert!(rate.validate().is_ok());
    }

    #[test]
    fn inconsistent_rate_rejected() {
        let rate = GstRate {
            total_rate: BigDecimal::from(18),
            cgst_rate: BigDecimal::from(9),
            sgst_rate: BigDecimal::from(8),
            igst_rate: BigDecimal::from(0),
        };
        assert!(rate.validate().is_err());
    }

    #[test]
    fn forward_calculation() {
        let calc = GstCalculation::calculate(
            BigDecimal::from(1000),
            GstRate::intra_state(BigDecimal::from(18)),
        )
        .unwrap();
        assert_eq!(calc.cgst_amount, BigDecimal::from(90));
        assert_eq!(calc.sgst_amount, BigDecimal::from(90));
        assert_eq!(calc.total_gst_amount, BigDecimal::from(180));
        assert_eq!(calc.total_amount, BigDecimal::from(1180));
    }

    #[test]
    fn reverse_calculation_recovers_base() {
        let calc = GstCalculation::reverse_calculate(
            BigDecimal::from(1180),
            GstRate::intra_state(BigDecimal::from(18)),
        )
        .unwrap();
        assert_eq!(calc.base_amount, BigDecimal::from(1000));
        assert_eq!(calc.total_gst_amount, BigDecimal::from(180));
    }

    #[test]
    fn slab_rates() {
        assert_eq!(GstSlab::Exempt.rate(), BigDecimal::from(0));
        assert_eq!(GstSlab::Higher.rate(), BigDecimal::from(18));
        assert_eq!(GstSlab::Luxury.intra_state_rate().cgst_rate, BigDecimal::from(14));
    }
}
