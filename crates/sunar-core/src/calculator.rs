//! # Cost Calculator
//!
//! Turns a piece description into a priced line item.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Pricing::Override ──────────────────────────────► total = amount       │
//! │                                                                         │
//! │  Pricing::Formula(spec)                                                 │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  validate (weight > 0, karat for gold, stones ≤ metal, no negatives)    │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  metal   = primary_g × rate(primary) + secondary_g × rate(secondary)    │
//! │  wastage = metal × wastage% / 100        (on COMBINED metal cost)       │
//! │  diamond = has_diamonds ? diamond_charges : 0                           │
//! │  stone   = has_stones   ? stone_charges   : 0                           │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  total = metal + wastage + making + diamond + stone + misc              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No rounding happens here. Running sums over many lines must not drift.
//!
//! ## Example
//! ```rust
//! use sunar_core::calculator::compute_item;
//! use sunar_core::item::ItemSpec;
//! use sunar_core::rates::{Karat, RateTable};
//!
//! let mut spec = ItemSpec::gold(Karat::K21, 10.0);
//! spec.wastage_percentage = 10.0;
//! spec.making_charges = 5_000.0;
//!
//! let breakdown = compute_item(&spec, &RateTable::from_gold_24k(20_000.0)).unwrap();
//! assert_eq!(breakdown.metal_cost, 175_000.0);
//! assert_eq!(breakdown.wastage_cost, 17_500.0);
//! assert_eq!(breakdown.total_price, 197_500.0);
//! ```

use crate::error::InvalidSpecError;
use crate::item::{CostBreakdown, ItemSpec, MetalBlock, Pricing};
use crate::rates::RateTable;

/// Result type for calculator operations.
pub type SpecResult<T> = Result<T, InvalidSpecError>;

/// Prices a piece by formula or override.
///
/// ## Errors
/// - `Negative` / `NotFinite` for a bad override amount
/// - anything [`compute_item`] rejects
pub fn compute(pricing: &Pricing, rates: &RateTable) -> SpecResult<CostBreakdown> {
    match pricing {
        Pricing::Override { amount } => {
            check_amount("override_price", *amount)?;
            Ok(CostBreakdown::custom(*amount))
        }
        Pricing::Formula(spec) => compute_item(spec, rates),
    }
}

/// Prices a piece from its physical description.
///
/// ## Errors
/// - `NonPositiveWeight` when a metal weight is ≤ 0
/// - `MissingKarat` for gold (primary or secondary) without karat
/// - `StoneHeavierThanMetal` when stone weight exceeds primary metal weight
/// - `Negative` / `NotFinite` for bad charges or percentages
pub fn compute_item(spec: &ItemSpec, rates: &RateTable) -> SpecResult<CostBreakdown> {
    validate_spec(spec)?;

    let mut metal_cost = metal_block_cost(
        &MetalBlock {
            metal: spec.metal,
            karat: spec.karat,
            weight_grams: spec.metal_weight_grams,
        },
        rates,
    )?;

    if let Some(secondary) = &spec.secondary_metal {
        metal_cost += metal_block_cost(secondary, rates)?;
    }

    let wastage_cost = metal_cost * (spec.wastage_percentage / 100.0);

    // Toggled-off charges are dropped whatever the stale form value says
    let diamond_charges = if spec.has_diamonds {
        spec.diamond_charges
    } else {
        0.0
    };
    let stone_charges = if spec.has_stones {
        spec.stone_charges
    } else {
        0.0
    };

    Ok(CostBreakdown::from_parts(
        metal_cost,
        wastage_cost,
        spec.making_charges,
        diamond_charges,
        stone_charges,
        spec.misc_charges,
    ))
}

/// Cost of one metal component at today's rate.
fn metal_block_cost(block: &MetalBlock, rates: &RateTable) -> SpecResult<f64> {
    let rate = rates.rate_for(block.metal, block.karat)?;
    Ok(block.weight_grams * rate)
}

/// Rejects descriptions that cannot be priced.
pub fn validate_spec(spec: &ItemSpec) -> SpecResult<()> {
    check_weight("metal_weight_grams", spec.metal_weight_grams)?;
    if spec.metal.is_gold() && spec.karat.is_none() {
        return Err(InvalidSpecError::MissingKarat);
    }

    check_amount("wastage_percentage", spec.wastage_percentage)?;
    check_amount("making_charges", spec.making_charges)?;
    check_amount("misc_charges", spec.misc_charges)?;
    if spec.has_diamonds {
        check_amount("diamond_charges", spec.diamond_charges)?;
    }
    if spec.has_stones {
        check_amount("stone_charges", spec.stone_charges)?;
    }

    // Stone weight is a physical measurement of the piece, checked even when
    // stones carry no charge. Only charges are zeroed by the toggles.
    check_amount("stone_weight_grams", spec.stone_weight_grams)?;
    if spec.stone_weight_grams > spec.metal_weight_grams {
        return Err(InvalidSpecError::StoneHeavierThanMetal {
            stone: spec.stone_weight_grams,
            metal: spec.metal_weight_grams,
        });
    }

    if let Some(secondary) = &spec.secondary_metal {
        check_weight("secondary_metal.weight_grams", secondary.weight_grams)?;
        if secondary.metal.is_gold() && secondary.karat.is_none() {
            return Err(InvalidSpecError::MissingKarat);
        }
    }

    Ok(())
}

fn check_weight(field: &'static str, grams: f64) -> SpecResult<()> {
    if !grams.is_finite() {
        return Err(InvalidSpecError::NotFinite { field });
    }
    if grams <= 0.0 {
        return Err(InvalidSpecError::NonPositiveWeight { field });
    }
    Ok(())
}

fn check_amount(field: &'static str, value: f64) -> SpecResult<()> {
    if !value.is_finite() {
        return Err(InvalidSpecError::NotFinite { field });
    }
    if value < 0.0 {
        return Err(InvalidSpecError::Negative { field });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
