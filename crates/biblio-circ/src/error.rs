//! # Circulation Error Types
//!
//! Error types for circulation operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  DbError (biblio-db)        ValidationError (biblio-core)              │
//! │       │                          │                                      │
//! │       └──────────┬───────────────┘                                      │
//! │                  ▼                                                      │
//! │  CircError (this module) ← Names the circulation-level failure:        │
//! │                  │           who, which title, how many copies          │
//! │                  ▼                                                      │
//! │  Caller displays user-friendly message                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant carries enough context (book title, member name, counts)
//! for a front-desk message without another lookup.

use biblio_core::ValidationError;
use biblio_db::DbError;
use thiserror::Error;

/// Circulation operation errors.
#[derive(Debug, Error)]
pub enum CircError {
    /// Book does not exist (or belongs to another organization).
    #[error("Book not found: {book_id}")]
    BookNotFound {
        book_id: String,
    },

    /// Member does not exist (or belongs to another organization).
    #[error("Member not found: {member_id}")]
    MemberNotFound {
        member_id: String,
    },

    /// Borrowing record does not exist.
    #[error("Loan not found: {borrowing_id}")]
    LoanNotFound {
        borrowing_id: String,
    },

    /// Member already holds an open loan for this title.
    ///
    /// ## When This Occurs
    /// - Raised up front when an open loan is visible before checkout
    /// - Raised from the store's unique index when two desks race
    #[error("'{title}' is already checked out to {member}")]
    AlreadyBorrowed {
        title: String,
        member: String,
    },

    /// Loan was already closed by an earlier check-in.
    #[error("Loan already returned: {borrowing_id}")]
    AlreadyReturned {
        borrowing_id: String,
    },

    /// Not enough copies on the shelf to satisfy the request.
    ///
    /// Stock never goes negative: the decrement is conditional in SQL,
    /// so this is raised instead of overselling under load.
    #[error("Insufficient stock for '{title}': {available} available, {requested} requested")]
    InsufficientStock {
        title: String,
        available: i64,
        requested: i64,
    },

    /// A required input was blank or absent.
    #[error("Missing required input: {field}")]
    MissingInput {
        field: &'static str,
    },

    /// Cart has no lines to process.
    #[error("Cart is empty")]
    EmptyCart,

    /// Input failed domain validation (quantity, due date, ...).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Record store failure bubbled up unchanged.
    #[error("Record store error: {0}")]
    Store(#[from] DbError),
}

/// Convenience Result type for circulation operations.
pub type CircResult<T> = Result<T, CircError>;

impl CircError {
    /// Creates a BookNotFound error.
    pub fn book_not_found(book_id: impl Into<String>) -> Self {
        CircError::BookNotFound {
            book_id: book_id.into(),
        }
    }

    /// Creates a MemberNotFound error.
    pub fn member_not_found(member_id: impl Into<String>) -> Self {
        CircError::MemberNotFound {
            member_id: member_id.into(),
        }
    }

    /// Creates a LoanNotFound error.
    pub fn loan_not_found(borrowing_id: impl Into<String>) -> Self {
        CircError::LoanNotFound {
            borrowing_id: borrowing_id.into(),
        }
    }

    /// True if this error means "the request was fine, the shelf was not" -
    /// a retry after restocking could succeed.
    pub fn is_stock_related(&self) -> bool {
        matches!(self, CircError::InsufficientStock { .. })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_desk_context() {
        let err = CircError::AlreadyBorrowed {
            title: "Dune".to_string(),
            member: "Alice Hart".to_string(),
        };
        assert_eq!(err.to_string(), "'Dune' is already checked out to Alice Hart");

        let err = CircError::InsufficientStock {
            title: "Dune".to_string(),
            available: 1,
            requested: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for 'Dune': 1 available, 3 requested"
        );
    }

    #[test]
    fn test_store_errors_convert() {
        let db_err = DbError::not_found("Book", "b-1");
        let err = CircError::from(db_err);
        assert!(matches!(err, CircError::Store(DbError::NotFound { .. })));
    }

    #[test]
    fn test_validation_errors_convert() {
        let v = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let err = CircError::from(v);
        assert!(matches!(err, CircError::Validation(_)));
    }
}
