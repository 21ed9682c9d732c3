//! # Item Description & Cost Breakdown
//!
//! The calculator's input ([`Pricing`] / [`ItemSpec`]) and output
//! ([`CostBreakdown`]).
//!
//! ## Shape of a Priced Piece
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Pricing::Formula(ItemSpec)              Pricing::Override { amount }   │
//! │  ─────────────────────────────           ─────────────────────────────  │
//! │  primary metal   (type, karat, g)        negotiated / non-standard      │
//! │  secondary metal (optional block)        pieces: the amount IS the      │
//! │  wastage %                               price, formula skipped         │
//! │  making / diamond / stone / misc                                        │
//! │            │                                        │                   │
//! │            └──────────────► CostBreakdown ◄─────────┘                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::rates::{Karat, MetalType};

// =============================================================================
// Metal Block
// =============================================================================

/// A secondary metal set into a piece (e.g. a platinum setting in a gold ring).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MetalBlock {
    pub metal: MetalType,

    /// Ignored unless `metal` is gold.
    #[serde(default)]
    #[ts(as = "Option<u8>")]
    pub karat: Option<Karat>,

    pub weight_grams: f64,
}

// =============================================================================
// Item Spec
// =============================================================================

/// Physical description of a piece, as entered on the product/invoice form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemSpec {
    pub metal: MetalType,

    /// Required for gold; ignored for every other metal.
    #[serde(default)]
    #[ts(as = "Option<u8>")]
    pub karat: Option<Karat>,

    pub metal_weight_grams: f64,

    #[serde(default)]
    pub wastage_percentage: f64,

    #[serde(default)]
    pub making_charges: f64,

    #[serde(default)]
    pub has_diamonds: bool,

    /// Only counted when `has_diamonds` is set.
    #[serde(default)]
    pub diamond_charges: f64,

    #[serde(default)]
    pub has_stones: bool,

    #[serde(default)]
    pub stone_weight_grams: f64,

    /// Only counted when `has_stones` is set.
    #[serde(default)]
    pub stone_charges: f64,

    #[serde(default)]
    pub misc_charges: f64,

    #[serde(default)]
    pub secondary_metal: Option<MetalBlock>,
}

impl ItemSpec {
    /// A bare gold piece: weight and karat, nothing else.
    pub fn gold(karat: Karat, weight_grams: f64) -> Self {
        ItemSpec {
            karat: Some(karat),
            ..ItemSpec::plain(MetalType::Gold, weight_grams)
        }
    }

    /// A bare piece of any metal with no charges.
    pub fn plain(metal: MetalType, weight_grams: f64) -> Self {
        ItemSpec {
            metal,
            karat: None,
            metal_weight_grams: weight_grams,
            wastage_percentage: 0.0,
            making_charges: 0.0,
            has_diamonds: false,
            diamond_charges: 0.0,
            has_stones: false,
            stone_weight_grams: 0.0,
            stone_charges: 0.0,
            misc_charges: 0.0,
            secondary_metal: None,
        }
    }

    /// Primary plus secondary metal weight.
    pub fn total_metal_weight(&self) -> f64 {
        self.metal_weight_grams
            + self
                .secondary_metal
                .map(|block| block.weight_grams)
                .unwrap_or(0.0)
    }
}

// =============================================================================
// Pricing
// =============================================================================

/// How a piece is priced: by formula, or by a negotiated flat amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Pricing {
    /// Price from metal rates and charges.
    Formula(ItemSpec),
    /// Flat price; the formula is skipped entirely.
    Override { amount: f64 },
}

impl Pricing {
    /// The physical description, if priced by formula.
    pub fn spec(&self) -> Option<&ItemSpec> {
        match self {
            Pricing::Formula(spec) => Some(spec),
            Pricing::Override { .. } => None,
        }
    }

    /// Whether the formula is bypassed.
    #[inline]
    pub fn is_custom_price(&self) -> bool {
        matches!(self, Pricing::Override { .. })
    }
}

impl From<ItemSpec> for Pricing {
    fn from(spec: ItemSpec) -> Self {
        Pricing::Formula(spec)
    }
}

// =============================================================================
// Cost Breakdown
// =============================================================================

/// A priced line item.
///
/// ## Invariant
/// For formula pricing `total_price` is exactly
/// `metal_cost + wastage_cost + making_charges + diamond_charges +
/// stone_charges + misc_charges`, summed in that order. For override
/// pricing every component is zero and `total_price` is the override.
///
/// Values are unrounded; see [`crate::units`] for presentation rounding.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CostBreakdown {
    pub metal_cost: f64,
    pub wastage_cost: f64,
    pub making_charges: f64,
    pub diamond_charges: f64,
    pub stone_charges: f64,
    pub misc_charges: f64,
    pub total_price: f64,
    #[serde(default)]
    pub is_custom_price: bool,
}

impl CostBreakdown {
    /// Builds a formula breakdown; `total_price` is derived from the parts.
    pub(crate) fn from_parts(
        metal_cost: f64,
        wastage_cost: f64,
        making_charges: f64,
        diamond_charges: f64,
        stone_charges: f64,
        misc_charges: f64,
    ) -> Self {
        CostBreakdown {
            metal_cost,
            wastage_cost,
            making_charges,
            diamond_charges,
            stone_charges,
            misc_charges,
            total_price: metal_cost
                + wastage_cost
                + making_charges
                + diamond_charges
                + stone_charges
                + misc_charges,
            is_custom_price: false,
        }
    }

    /// A breakdown whose only content is a flat price.
    pub(crate) fn custom(amount: f64) -> Self {
        CostBreakdown {
            total_price: amount,
            is_custom_price: true,
            ..CostBreakdown::default()
        }
    }

    /// Sum of the formula components, in the canonical order.
    pub fn component_sum(&self) -> f64 {
        self.metal_cost
            + self.wastage_cost
            + self.making_charges
            + self.diamond_charges
            + self.stone_charges
            + self.misc_charges
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
