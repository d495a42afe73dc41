//! # Inventory Ledger
//!
//! The single authority for stock movement. Every copy that leaves or
//! re-enters the shelf goes through this module; nothing else writes the
//! `stock`, `status`, or `sales_count` columns.
//!
//! ## Stock Movement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Conditional Stock Movement                         │
//! │                                                                         │
//! │  decrement(book, qty)                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE ... SET stock = stock - qty WHERE ... AND stock >= qty          │
//! │       │                                                                 │
//! │       ├── 1 row   → re-read book → Ok(updated Book)                     │
//! │       │             (status flipped to checked_out when stock hit 0)    │
//! │       │                                                                 │
//! │       └── 0 rows  → look once to say which:                             │
//! │                      book exists  → InsufficientStock { available }     │
//! │                      book missing → BookNotFound                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The guard lives in the UPDATE itself, so two desks racing for the last
//! copy resolve inside SQLite: one wins the row, the other sees 0 rows and
//! reports a shortage. Stock can never go negative.
//!
//! ## Transaction-Scoped Variants
//!
//! `decrement_in` / `increment_in` run on a caller-supplied connection so
//! the circulation engine can bundle a stock movement with a loan write in
//! one SQLite transaction. The plain variants borrow a pool connection and
//! commit immediately (used for purchases, which have no loan row).

use biblio_core::validation::validate_quantity;
use biblio_core::{Book, OrgContext};
use biblio_db::{Database, DbError};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{CircError, CircResult};

/// Stock movement operations over the book repository.
///
/// Cheap to construct; holds only a database handle.
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    db: Database,
}

impl InventoryLedger {
    /// Creates a ledger over the given database.
    pub fn new(db: Database) -> Self {
        InventoryLedger { db }
    }

    // =========================================================================
    // Decrement (copies leave the shelf)
    // =========================================================================

    /// Takes `quantity` copies of a book off the shelf.
    ///
    /// Returns the book as it looks after the movement (stock reduced,
    /// status flipped to `CheckedOut` when the last copy left).
    ///
    /// ## Errors
    /// - `Validation` if `quantity` is not in 1..=999
    /// - `BookNotFound` if the book doesn't exist in this organization
    /// - `InsufficientStock` if fewer than `quantity` copies remain
    pub async fn decrement(
        &self,
        ctx: &OrgContext,
        book_id: &str,
        quantity: i64,
    ) -> CircResult<Book> {
        let mut conn = self.db.pool().acquire().await.map_err(DbError::from)?;
        self.decrement_in(&mut conn, ctx, book_id, quantity).await
    }

    /// Transaction-scoped variant of [`decrement`](Self::decrement).
    ///
    /// Runs on the caller's connection; the caller owns commit/rollback.
    pub async fn decrement_in(
        &self,
        conn: &mut SqliteConnection,
        ctx: &OrgContext,
        book_id: &str,
        quantity: i64,
    ) -> CircResult<Book> {
        validate_quantity(quantity)?;

        debug!(book_id = %book_id, quantity = %quantity, "Ledger decrement");

        let books = self.db.books();
        let moved = books
            .decrement_stock_in(&mut *conn, &ctx.organization_id, book_id, quantity)
            .await?;

        if !moved {
            // Zero rows: either the book is gone or the shelf is short.
            // Look once to say which.
            return match books
                .get_in(&mut *conn, &ctx.organization_id, book_id)
                .await?
            {
                Some(book) => Err(CircError::InsufficientStock {
                    title: book.title,
                    available: book.stock,
                    requested: quantity,
                }),
                None => Err(CircError::book_not_found(book_id)),
            };
        }

        // Re-read so the caller sees post-movement stock and status
        books
            .get_in(&mut *conn, &ctx.organization_id, book_id)
            .await?
            .ok_or_else(|| CircError::book_not_found(book_id))
    }

    // =========================================================================
    // Increment (copies return to the shelf)
    // =========================================================================

    /// Puts `quantity` copies of a book back on the shelf.
    ///
    /// The book lands in `Available` status regardless of where it was
    /// before; a returned copy re-enters circulation.
    ///
    /// ## Errors
    /// - `Validation` if `quantity` is not in 1..=999
    /// - `BookNotFound` if the book doesn't exist in this organization
    pub async fn increment(
        &self,
        ctx: &OrgContext,
        book_id: &str,
        quantity: i64,
    ) -> CircResult<Book> {
        let mut conn = self.db.pool().acquire().await.map_err(DbError::from)?;
        self.increment_in(&mut conn, ctx, book_id, quantity).await
    }

    /// Transaction-scoped variant of [`increment`](Self::increment).
    pub async fn increment_in(
        &self,
        conn: &mut SqliteConnection,
        ctx: &OrgContext,
        book_id: &str,
        quantity: i64,
    ) -> CircResult<Book> {
        validate_quantity(quantity)?;

        debug!(book_id = %book_id, quantity = %quantity, "Ledger increment");

        let books = self.db.books();
        let moved = books
            .increment_stock_in(&mut *conn, &ctx.organization_id, book_id, quantity)
            .await?;

        if !moved {
            return Err(CircError::book_not_found(book_id));
        }

        books
            .get_in(&mut *conn, &ctx.organization_id, book_id)
            .await?
            .ok_or_else(|| CircError::book_not_found(book_id))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use biblio_core::{BookStatus, Genre, NewBook, DEFAULT_ORGANIZATION_ID};
    use biblio_db::DbConfig;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory())
            .await
            .expect("in-memory database")
    }

    async fn seed_book(db: &Database, ctx: &OrgContext, stock: i64) -> Book {
        db.books()
            .insert(
                ctx,
                NewBook::new(
                    "The Left Hand of Darkness",
                    "Ursula K. Le Guin",
                    "9780441478125",
                    Genre::ScienceFiction,
                    1499,
                    stock,
                ),
            )
            .await
            .expect("seed book")
    }

    #[tokio::test]
    async fn test_decrement_reduces_stock_and_flips_status_at_zero() {
        let db = test_db().await;
        let ctx = OrgContext::library(DEFAULT_ORGANIZATION_ID);
        let ledger = InventoryLedger::new(db.clone());
        let book = seed_book(&db, &ctx, 2).await;

        let after = ledger.decrement(&ctx, &book.id, 1).await.expect("first copy");
        assert_eq!(after.stock, 1);
        assert_eq!(after.status, BookStatus::Available);

        let after = ledger.decrement(&ctx, &book.id, 1).await.expect("last copy");
        assert_eq!(after.stock, 0);
        assert_eq!(after.status, BookStatus::CheckedOut);
    }

    #[tokio::test]
    async fn test_decrement_beyond_stock_reports_shortage() {
        let db = test_db().await;
        let ctx = OrgContext::library(DEFAULT_ORGANIZATION_ID);
        let ledger = InventoryLedger::new(db.clone());
        let book = seed_book(&db, &ctx, 2).await;

        let err = ledger.decrement(&ctx, &book.id, 5).await.unwrap_err();
        match err {
            CircError::InsufficientStock {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 2);
                assert_eq!(requested, 5);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // Shelf untouched
        let reread = db
            .books()
            .get(&ctx.organization_id, &book.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reread.stock, 2);
        assert_eq!(reread.status, BookStatus::Available);
    }

    #[tokio::test]
    async fn test_decrement_unknown_book_is_not_found() {
        let db = test_db().await;
        let ctx = OrgContext::library(DEFAULT_ORGANIZATION_ID);
        let ledger = InventoryLedger::new(db);

        let err = ledger.decrement(&ctx, "no-such-book", 1).await.unwrap_err();
        assert!(matches!(err, CircError::BookNotFound { .. }));
    }

    #[tokio::test]
    async fn test_increment_restores_available_status() {
        let db = test_db().await;
        let ctx = OrgContext::library(DEFAULT_ORGANIZATION_ID);
        let ledger = InventoryLedger::new(db.clone());
        let book = seed_book(&db, &ctx, 1).await;

        ledger.decrement(&ctx, &book.id, 1).await.expect("take the copy");

        let after = ledger.increment(&ctx, &book.id, 1).await.expect("put it back");
        assert_eq!(after.stock, 1);
        assert_eq!(after.status, BookStatus::Available);
    }

    #[tokio::test]
    async fn test_zero_and_negative_quantities_rejected() {
        let db = test_db().await;
        let ctx = OrgContext::library(DEFAULT_ORGANIZATION_ID);
        let ledger = InventoryLedger::new(db.clone());
        let book = seed_book(&db, &ctx, 3).await;

        let err = ledger.decrement(&ctx, &book.id, 0).await.unwrap_err();
        assert!(matches!(err, CircError::Validation(_)));

        let err = ledger.increment(&ctx, &book.id, -2).await.unwrap_err();
        assert!(matches!(err, CircError::Validation(_)));
    }
}
