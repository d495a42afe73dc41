//! # Cart Module
//!
//! A pure multi-line cart: one member, one mode (purchase or lending),
//! several titles. The cart is a plain value owned by the caller; nothing
//! here touches the record store.
//!
//! ## Price Freezing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Line Snapshots                                  │
//! │                                                                         │
//! │  Book row (live)              CartLine (frozen at add time)            │
//! │  ───────────────              ──────────────────────────────            │
//! │  title  ───────────────────►  title                                    │
//! │  price_cents ──────────────►  unit_price_cents                         │
//! │                                                                         │
//! │  A price edit AFTER the title was added does not change the cart,      │
//! │  and the checkout transaction later persists the frozen values.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `book_id` (adding the same title increases quantity)
//! - Quantity is always > 0 (updating to 0 removes the line)
//! - Maximum lines: [`crate::MAX_CART_LINES`]
//! - Maximum quantity per line: [`crate::MAX_LINE_QUANTITY`]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{Book, LineSnapshot};
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// One title in the cart.
///
/// ## Design Notes
/// - `book_id`: reference to the book (for ledger and borrowing calls)
/// - title/isbn/price are frozen copies taken when the line was added, so
///   the cart displays consistent data even if the catalog row is edited
///   while the cart is open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Book ID (UUID)
    pub book_id: String,

    /// Title at time of adding (frozen)
    pub title: String,

    /// ISBN at time of adding (frozen)
    pub isbn: String,

    /// List price in cents at time of adding (frozen)
    pub unit_price_cents: i64,

    /// Copies of this title in the cart
    pub quantity: i64,

    /// When this line was added to the cart
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Creates a new cart line from a book and quantity.
    ///
    /// The price is captured at this moment. If the book's price changes
    /// in the catalog, this line retains the original price.
    pub fn of_book(book: &Book, quantity: i64) -> Self {
        CartLine {
            book_id: book.id.clone(),
            title: book.title.clone(),
            isbn: book.isbn.clone(),
            unit_price_cents: book.price_cents,
            quantity,
            added_at: Utc::now(),
        }
    }

    /// Calculates the line total (unit price × quantity).
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }
}

impl From<&CartLine> for LineSnapshot {
    fn from(line: &CartLine) -> Self {
        LineSnapshot {
            book_id: Some(line.book_id.clone()),
            title: line.title.clone(),
            unit_price_cents: line.unit_price_cents,
            quantity: line.quantity,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The multi-line cart.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Cart {
    /// Lines in the cart, in add order (checkout processes them in order)
    pub lines: Vec<CartLine>,

    /// When the cart was created/last cleared
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds a book to the cart or increases quantity if already present.
    ///
    /// ## Behavior
    /// - If the title is already in the cart: increases quantity
    /// - If not: appends a new line with frozen title/price
    pub fn add_book(&mut self, book: &Book, quantity: i64) -> CoreResult<()> {
        // Check if title already in cart
        if let Some(line) = self.lines.iter_mut().find(|l| l.book_id == book.id) {
            let new_qty = line.quantity + quantity;
            if new_qty > MAX_LINE_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_LINE_QUANTITY,
                });
            }
            line.quantity = new_qty;
            return Ok(());
        }

        if quantity > MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_LINE_QUANTITY,
            });
        }

        // Check max lines
        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        self.lines.push(CartLine::of_book(book, quantity));
        Ok(())
    }

    /// Updates the quantity of a line in the cart.
    ///
    /// ## Behavior
    /// - If quantity is 0: removes the line
    /// - If title not found: returns `BookNotInCart`
    pub fn update_quantity(&mut self, book_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_book(book_id);
        }

        if quantity > MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_LINE_QUANTITY,
            });
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.book_id == book_id) {
            line.quantity = quantity;
            Ok(())
        } else {
            Err(CoreError::BookNotInCart {
                book_id: book_id.to_string(),
            })
        }
    }

    /// Removes a line from the cart by book ID.
    pub fn remove_book(&mut self, book_id: &str) -> CoreResult<()> {
        let initial_len = self.lines.len();
        self.lines.retain(|l| l.book_id != book_id);

        if self.lines.len() == initial_len {
            Err(CoreError::BookNotInCart {
                book_id: book_id.to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Clears all lines from the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.created_at = Utc::now();
    }

    /// Returns the number of unique titles in the cart.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns the total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Calculates the cart subtotal at frozen list prices.
    pub fn subtotal_cents(&self) -> i64 {
        self.lines.iter().map(|l| l.line_total_cents()).sum()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Cart totals summary for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartTotals {
    pub line_count: usize,
    pub total_quantity: i64,
    pub subtotal_cents: i64,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            line_count: cart.line_count(),
            total_quantity: cart.total_quantity(),
            subtotal_cents: cart.subtotal_cents(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
