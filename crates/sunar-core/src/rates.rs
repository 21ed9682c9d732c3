//! # Rate Table
//!
//! Current per-gram metal rates, as configured by the shop each morning.
//!
//! ## Karat Derivation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  gold_24k (canonical) ──┬── × 22/24 ──► 22k   (unless overridden)       │
//! │                         ├── × 21/24 ──► 21k   (unless overridden)       │
//! │                         ├── × 18/24 ──► 18k   (unless overridden)       │
//! │                         └── × 24/24 ──► 24k   (always canonical)        │
//! │                                                                         │
//! │  palladium / platinum / silver: flat per-gram rates                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Some markets quote 22k and 21k separately from the purity ratio (the
//! bullion association sets them), so each derived karat can be pinned.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::InvalidSpecError;

// =============================================================================
// Metal Type
// =============================================================================

/// The precious metal a piece (or part of a piece) is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MetalType {
    Gold,
    Palladium,
    Platinum,
    Silver,
}

impl MetalType {
    /// Whether karat is meaningful for this metal.
    #[inline]
    pub const fn is_gold(&self) -> bool {
        matches!(self, MetalType::Gold)
    }
}

impl fmt::Display for MetalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetalType::Gold => write!(f, "gold"),
            MetalType::Palladium => write!(f, "palladium"),
            MetalType::Platinum => write!(f, "platinum"),
            MetalType::Silver => write!(f, "silver"),
        }
    }
}

// =============================================================================
// Karat
// =============================================================================

/// Gold purity in parts per 24.
///
/// Serialized as the bare number (`21`), which is what the UI sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Karat {
    K18,
    K21,
    K22,
    K24,
}

impl Karat {
    /// All karats the shop trades, lowest purity first.
    pub const ALL: [Karat; 4] = [Karat::K18, Karat::K21, Karat::K22, Karat::K24];

    /// Parts per 24.
    #[inline]
    pub const fn value(&self) -> u8 {
        match self {
            Karat::K18 => 18,
            Karat::K21 => 21,
            Karat::K22 => 22,
            Karat::K24 => 24,
        }
    }

    /// Purity fraction, e.g. 21k → 0.875.
    #[inline]
    pub fn purity(&self) -> f64 {
        f64::from(self.value()) / 24.0
    }
}

impl TryFrom<u8> for Karat {
    type Error = InvalidSpecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            18 => Ok(Karat::K18),
            21 => Ok(Karat::K21),
            22 => Ok(Karat::K22),
            24 => Ok(Karat::K24),
            other => Err(InvalidSpecError::InvalidKarat(other)),
        }
    }
}

impl From<Karat> for u8 {
    fn from(karat: Karat) -> Self {
        karat.value()
    }
}

impl fmt::Display for Karat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}k", self.value())
    }
}

// =============================================================================
// Rate Table
// =============================================================================

/// Per-gram rates for every metal the shop prices.
///
/// ## Example
/// ```rust
/// use sunar_core::rates::{Karat, RateTable};
///
/// let rates = RateTable::from_gold_24k(20_000.0);
/// assert_eq!(rates.gold_rate(Karat::K21), 17_500.0);
///
/// let pinned = rates.with_gold_override(Karat::K22, 18_500.0);
/// assert_eq!(pinned.gold_rate(Karat::K22), 18_500.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RateTable {
    /// Canonical 24k rate per gram.
    pub gold_24k: f64,

    /// Pinned 22k rate; derived from 24k when absent.
    #[serde(default)]
    pub gold_22k: Option<f64>,

    /// Pinned 21k rate; derived from 24k when absent.
    #[serde(default)]
    pub gold_21k: Option<f64>,

    /// Pinned 18k rate; derived from 24k when absent.
    #[serde(default)]
    pub gold_18k: Option<f64>,

    #[serde(default)]
    pub palladium: f64,

    #[serde(default)]
    pub platinum: f64,

    #[serde(default)]
    pub silver: f64,
}

impl RateTable {
    /// A table with only the 24k rate set.
    pub fn from_gold_24k(gold_24k: f64) -> Self {
        RateTable {
            gold_24k,
            ..RateTable::default()
        }
    }

    /// Returns a copy with the given karat pinned to `rate`.
    ///
    /// Pinning 24k replaces the canonical rate.
    pub fn with_gold_override(mut self, karat: Karat, rate: f64) -> Self {
        match karat {
            Karat::K24 => self.gold_24k = rate,
            Karat::K22 => self.gold_22k = Some(rate),
            Karat::K21 => self.gold_21k = Some(rate),
            Karat::K18 => self.gold_18k = Some(rate),
        }
        self
    }

    /// Per-gram gold rate at the given purity.
    pub fn gold_rate(&self, karat: Karat) -> f64 {
        let pinned = match karat {
            Karat::K24 => return self.gold_24k,
            Karat::K22 => self.gold_22k,
            Karat::K21 => self.gold_21k,
            Karat::K18 => self.gold_18k,
        };
        pinned.unwrap_or_else(|| self.gold_24k * karat.purity())
    }

    /// Per-gram rate for a metal; `karat` is only consulted for gold.
    ///
    /// ## Errors
    /// `MissingKarat` when the metal is gold and no karat is given.
    pub fn rate_for(&self, metal: MetalType, karat: Option<Karat>) -> Result<f64, InvalidSpecError> {
        match metal {
            MetalType::Gold => karat
                .map(|k| self.gold_rate(k))
                .ok_or(InvalidSpecError::MissingKarat),
            MetalType::Palladium => Ok(self.palladium),
            MetalType::Platinum => Ok(self.platinum),
            MetalType::Silver => Ok(self.silver),
        }
    }

    /// Checks that every configured rate is finite and non-negative.
    pub fn validate(&self) -> Result<(), InvalidSpecError> {
        let rates = [
            ("gold_24k", Some(self.gold_24k)),
            ("gold_22k", self.gold_22k),
            ("gold_21k", self.gold_21k),
            ("gold_18k", self.gold_18k),
            ("palladium", Some(self.palladium)),
            ("platinum", Some(self.platinum)),
            ("silver", Some(self.silver)),
        ];

        for (field, rate) in rates {
            if let Some(rate) = rate {
                if !rate.is_finite() {
                    return Err(InvalidSpecError::NotFinite { field });
                }
                if rate < 0.0 {
                    return Err(InvalidSpecError::Negative { field });
                }
            }
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
