//! # Validation Module
//!
//! Input validation utilities for Biblio.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (UI / API layer)                                      │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Circulation engine (Rust)                                    │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Record store (SQLite)                                        │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE / partial unique indexes                                   │
//! │  └── CHECK (stock >= 0)                                                │
//! │                                                                         │
//! │  Defense in depth: Multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use biblio_core::validation::{validate_isbn, validate_quantity};
//!
//! // Validate ISBN before catalog insert
//! validate_isbn("9780441172719").unwrap();
//!
//! // Validate quantity before a cart operation
//! validate_quantity(5).unwrap();
//! ```

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a book title.
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 300 characters
pub fn validate_title(title: &str) -> ValidationResult<()> {
    let title = title.trim();

    if title.is_empty() {
        return Err(ValidationError::Required {
            field: "title".to_string(),
        });
    }

    if title.len() > 300 {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: 300,
        });
    }

    Ok(())
}

/// Validates an ISBN.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 20 characters
/// - Digits, hyphens, and a trailing X (ISBN-10 check digit) only
///
/// No checksum validation: older catalogs carry malformed ISBNs that staff
/// still need to be able to enter.
///
/// ## Example
/// ```rust
/// use biblio_core::validation::validate_isbn;
///
/// assert!(validate_isbn("9780441172719").is_ok());
/// assert!(validate_isbn("0-19-852663-X").is_ok());
/// assert!(validate_isbn("").is_err());
/// ```
pub fn validate_isbn(isbn: &str) -> ValidationResult<()> {
    let isbn = isbn.trim();

    if isbn.is_empty() {
        return Err(ValidationError::Required {
            field: "isbn".to_string(),
        });
    }

    if isbn.len() > 20 {
        return Err(ValidationError::TooLong {
            field: "isbn".to_string(),
            max: 20,
        });
    }

    if !isbn
        .chars()
        .all(|c| c.is_ascii_digit() || c == '-' || c == 'X' || c == 'x')
    {
        return Err(ValidationError::InvalidFormat {
            field: "isbn".to_string(),
            reason: "must contain only digits, hyphens, and X".to_string(),
        });
    }

    Ok(())
}

/// Validates a member name.
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 200 characters
pub fn validate_member_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (returns all/default results)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Cart: Add Title                                                        │
/// │                                                                         │
/// │  User enters quantity: 5                                               │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       │                                                                 │
/// │       ├── qty > 999? → Error: "quantity must be between 1 and 999"     │
/// │       │                                                                 │
/// │       └── OK → Proceed with add_line                                   │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (library books are always zero-priced)
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a stock count.
///
/// ## Rules
/// - Must be non-negative (>= 0)
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Validates a due date against the checkout moment.
///
/// ## Rules
/// - Compared at date granularity: a custom due date of "today" is valid
///   (same-day loans exist), anything earlier is not
pub fn validate_due_date(due: DateTime<Utc>, now: DateTime<Utc>) -> ValidationResult<()> {
    if due.date_naive() < now.date_naive() {
        return Err(ValidationError::DateInPast {
            field: "due_date".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates cart size (number of unique lines).
///
/// ## Rules
/// - Must not exceed MAX_CART_LINES (100)
pub fn validate_cart_size(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "cart lines".to_string(),
            min: 0,
            max: MAX_CART_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Rules
/// - Must be a valid UUID format
/// - 36 characters with hyphens: xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx
///
/// ## Example
/// ```rust
/// use biblio_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    // Try to parse as UUID
    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_validate_title() {
        assert!(validate_title("The Left Hand of Darkness").is_ok());
        assert!(validate_title("").is_err());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"A".repeat(400)).is_err());
    }

    #[test]
    fn test_validate_isbn() {
        // Valid ISBNs
        assert!(validate_isbn("9780441172719").is_ok());
        assert!(validate_isbn("0-19-852663-X").is_ok());
        assert!(validate_isbn("978-0-441-17271-9").is_ok());

        // Invalid ISBNs
        assert!(validate_isbn("").is_err());
        assert!(validate_isbn("   ").is_err());
        assert!(validate_isbn("ISBN 978").is_err());
        assert!(validate_isbn(&"9".repeat(30)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(100).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_validate_due_date() {
        let now = Utc::now();

        assert!(validate_due_date(now + Duration::days(15), now).is_ok());
        // Same calendar day is allowed, even a few hours earlier
        assert!(validate_due_date(now, now).is_ok());
        assert!(validate_due_date(now - Duration::days(1), now).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
        assert!(validate_uuid("123").is_err());
    }
}
