//! # Error Types
//!
//! Domain-specific error types for sunar-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  sunar-core errors (this file)                                         │
//! │  ├── CoreError         - General domain errors                         │
//! │  ├── InvalidSpecError  - Bad ItemSpec / Pricing (calculator input)     │
//! │  ├── RevertError       - Logical-state failures of an audited revert   │
//! │  └── ValidationError   - Write-time input validation failures          │
//! │                                                                         │
//! │  sunar-db errors (separate crate)                                      │
//! │  └── DbError           - Database operation failures                   │
//! │                                                                         │
//! │  Flow: InvalidSpecError / ValidationError → CoreError → DbError        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, ids, weights)
//! 3. Errors are enum variants, never String
//! 4. Aggregation (running balances, summaries) never produces errors

use thiserror::Error;

use crate::activity::ActivityEvent;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Item description cannot be priced.
    #[error("Invalid item spec: {0}")]
    InvalidSpec(#[from] InvalidSpecError),

    /// An audited revert was refused.
    #[error("Revert refused: {0}")]
    Revert(#[from] RevertError),

    /// Discount larger than the invoice subtotal.
    #[error("Discount {discount} exceeds subtotal {subtotal}")]
    DiscountExceedsSubtotal { discount: f64, subtotal: f64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Invalid Spec Error
// =============================================================================

/// Reasons an item description cannot be turned into a [`CostBreakdown`].
///
/// Always surfaced to the caller. The only silent correction the calculator
/// performs is zeroing diamond/stone charges whose toggle is off.
///
/// [`CostBreakdown`]: crate::item::CostBreakdown
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidSpecError {
    /// Metal weight is zero or negative.
    #[error("{field} must be greater than zero")]
    NonPositiveWeight { field: &'static str },

    /// Gold item without a karat.
    #[error("karat is required for gold")]
    MissingKarat,

    /// Karat value outside 18/21/22/24.
    #[error("unsupported karat: {0} (expected 18, 21, 22 or 24)")]
    InvalidKarat(u8),

    /// Stones weigh more than the metal they are set in.
    #[error("stone weight {stone}g exceeds metal weight {metal}g")]
    StoneHeavierThanMetal { stone: f64, metal: f64 },

    /// A charge, percentage or weight is negative.
    #[error("{field} must not be negative")]
    Negative { field: &'static str },

    /// NaN or infinite input.
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
}

// =============================================================================
// Revert Error
// =============================================================================

/// Logical-state failures of an audited revert.
///
/// No retry is meaningful for these: they describe the log entry, not a
/// transient condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RevertError {
    /// Only document creation events can be reverted.
    #[error("{0} events cannot be reverted")]
    NotRevertable(ActivityEvent),

    /// The log entry was already consumed by an earlier revert.
    #[error("activity {log_id} has already been reverted")]
    AlreadyReverted { log_id: String },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Write-time input validation errors.
///
/// Validation belongs at write time (entry creation), never at read time.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// NaN or infinite amount.
    #[error("{field} must be a finite number")]
    NotFinite { field: String },

    /// Ledger entry that moves neither cash nor gold.
    #[error("ledger entry must move cash or gold")]
    EmptyEntry,

    /// Invalid format (e.g., SKU characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_error_messages() {
        let err = InvalidSpecError::StoneHeavierThanMetal {
            stone: 4.5,
            metal: 3.0,
        };
        assert_eq!(err.to_string(), "stone weight 4.5g exceeds metal weight 3g");

        let err = InvalidSpecError::NonPositiveWeight {
            field: "metal_weight_grams",
        };
        assert_eq!(err.to_string(), "metal_weight_grams must be greater than zero");
    }

    #[test]
    fn test_revert_error_messages() {
        let err = RevertError::NotRevertable(ActivityEvent::InvoiceUpdate);
        assert_eq!(err.to_string(), "invoice.update events cannot be reverted");

        let err = RevertError::AlreadyReverted {
            log_id: "log-1".to_string(),
        };
        assert_eq!(err.to_string(), "activity log-1 has already been reverted");
    }

    #[test]
    fn test_errors_convert_to_core_error() {
        let core_err: CoreError = InvalidSpecError::MissingKarat.into();
        assert!(matches!(core_err, CoreError::InvalidSpec(_)));

        let core_err: CoreError = ValidationError::EmptyEntry.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
