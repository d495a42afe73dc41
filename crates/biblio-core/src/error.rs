//! # Error Types
//!
//! Domain-specific error types for biblio-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  biblio-core errors (this file)                                        │
//! │  ├── CoreError        - Pure domain errors (cart rules)                │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  biblio-db errors (separate crate)                                     │
//! │  └── DbError          - Record store operation failures                │
//! │                                                                         │
//! │  biblio-circ errors (separate crate)                                   │
//! │  └── CircError        - Circulation rule violations                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CircError → caller                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (title, ID, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Pure domain errors.
///
/// These cover the rules the core can enforce without I/O: cart shape and
/// size limits. Stock, loan, and audit rules need the record store and live
/// in biblio-circ's error type.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    ///
    /// ## When This Occurs
    /// - A single add pushes a line past the cap
    /// - Repeated adds of the same title accumulate past the cap
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Cart operation referenced a title that is not in the cart.
    #[error("Book {book_id} is not in the cart")]
    BookNotInCart { book_id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid ISBN).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Date lies in the past where a future date is required.
    #[error("{field} must not be in the past")]
    DateInPast { field: String },
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
    fn test_error_messages() {
        let err = CoreError::QuantityTooLarge {
            requested: 1200,
            max: 999,
        };
        assert_eq!(
            err.to_string(),
            "Quantity 1200 exceeds maximum allowed (999)"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "title".to_string(),
        };
        assert_eq!(err.to_string(), "title is required");

        let err = ValidationError::DateInPast {
            field: "due_date".to_string(),
        };
        assert_eq!(err.to_string(), "due_date must not be in the past");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "isbn".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
