//! # Circulation Engine
//!
//! The checkout / check-in lifecycle: who holds which title, until when,
//! and what the shelf looks like afterwards.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  checkout(book, member, due, qty)                                       │
//! │       │                                                                 │
//! │       ├── validate qty + due date        (no store call yet)            │
//! │       ├── load member                    → MemberNotFound               │
//! │       ├── load book                      → BookNotFound                 │
//! │       ├── open loan for (book, member)?  → AlreadyBorrowed              │
//! │       │                                                                 │
//! │       ▼  BEGIN ────────────────────────────────────────────┐            │
//! │       ├── ledger.decrement_in            → InsufficientStock│           │
//! │       ├── borrowings.insert_in           → unique idx race──┼──▶ ROLLBACK
//! │       ▼  COMMIT ────────────────────────────────────────────┘            │
//! │       │                                                                 │
//! │       ├── recorder.record_loan           (audit; loan already stands)   │
//! │       └── CheckoutReceipt { borrowing, book, transaction }              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stock movement and the loan row commit or roll back together. The
//! pre-check for an open loan gives the friendly error in the common case;
//! under a race the partial unique index on `borrowings` is the authority,
//! and its violation is translated back to `AlreadyBorrowed`.
//!
//! ## Check-In
//!
//! Closing a loan is idempotent at the store level: the UPDATE only matches
//! rows still in `borrowed` status, so a double check-in increments stock
//! exactly once and the second call reports `AlreadyReturned`.

use biblio_core::validation::{validate_due_date, validate_quantity};
use biblio_core::{Book, BorrowStatus, Borrowing, CheckoutTransaction, DuePolicy, Money, OrgContext};
use biblio_db::{Database, DbError};
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{CircError, CircResult};
use crate::ledger::InventoryLedger;
use crate::recorder::TransactionRecorder;

// =============================================================================
// Receipts and Batch Types
// =============================================================================

/// Everything a desk needs to show after a successful checkout.
#[derive(Debug, Clone)]
pub struct CheckoutReceipt {
    /// The open loan that was created.
    pub borrowing: Borrowing,
    /// The book as it looks after the stock movement.
    pub book: Book,
    /// The audit event (Borrow or Rent, amount 0 or the rent fee).
    pub transaction: CheckoutTransaction,
}

/// Everything a desk needs to show after a successful check-in.
#[derive(Debug, Clone)]
pub struct CheckinReceipt {
    /// The loan, now closed with its return date set.
    pub borrowing: Borrowing,
    /// The book as it looks after the copy went back on the shelf.
    pub book: Book,
    /// The audit event (Return, amount 0).
    pub transaction: CheckoutTransaction,
}

/// One line of a batch checkout.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub book_id: String,
    pub quantity: i64,
}

/// Per-line result of a batch checkout. Lines that failed name their error;
/// lines that committed stay committed.
#[derive(Debug)]
pub struct CheckoutOutcome {
    pub book_id: String,
    pub result: CircResult<CheckoutReceipt>,
}

/// Per-line result of a batch check-in.
#[derive(Debug)]
pub struct CheckinOutcome {
    pub borrowing_id: String,
    pub result: CircResult<CheckinReceipt>,
}

// =============================================================================
// Engine
// =============================================================================

/// Lending and return operations.
#[derive(Debug, Clone)]
pub struct CirculationEngine {
    db: Database,
    ledger: InventoryLedger,
    recorder: TransactionRecorder,
}

impl CirculationEngine {
    /// Creates an engine (and its ledger and recorder) over the database.
    pub fn new(db: Database) -> Self {
        let ledger = InventoryLedger::new(db.clone());
        let recorder = TransactionRecorder::new(db.clone());
        CirculationEngine {
            db,
            ledger,
            recorder,
        }
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Checks out `quantity` copies of a book to a member, free of charge.
    ///
    /// This is the front-desk operation for libraries; bookstores computing
    /// a rent fee go through [`checkout_with_fee`](Self::checkout_with_fee).
    pub async fn checkout(
        &self,
        ctx: &OrgContext,
        book_id: &str,
        member_id: &str,
        due: DuePolicy,
        quantity: i64,
    ) -> CircResult<CheckoutReceipt> {
        self.checkout_with_fee(ctx, book_id, member_id, due, quantity, Money::zero())
            .await
    }

    /// Checks out `quantity` copies of a book to a member, recording the
    /// given fee on the loan's audit event.
    ///
    /// The stock decrement and the loan insert run in one SQLite
    /// transaction; they commit or roll back together. The audit event is
    /// written after the commit; if recording it fails, the error
    /// surfaces but the loan stands.
    ///
    /// ## Errors
    /// - `Validation` for a non-positive quantity or a past due date
    /// - `MemberNotFound` / `BookNotFound` for unknown IDs
    /// - `AlreadyBorrowed` if the member already holds this title
    /// - `InsufficientStock` if fewer than `quantity` copies remain
    pub async fn checkout_with_fee(
        &self,
        ctx: &OrgContext,
        book_id: &str,
        member_id: &str,
        due: DuePolicy,
        quantity: i64,
        fee: Money,
    ) -> CircResult<CheckoutReceipt> {
        debug!(
            book_id = %book_id,
            member_id = %member_id,
            quantity = %quantity,
            "Checkout requested"
        );

        // Reject bad input before touching the store
        validate_quantity(quantity)?;
        let now = Utc::now();
        let due_date = due.resolve(now);
        validate_due_date(due_date, now)?;

        let member = self
            .db
            .members()
            .get(&ctx.organization_id, member_id)
            .await?
            .ok_or_else(|| CircError::member_not_found(member_id))?;

        let book = self
            .db
            .books()
            .get(&ctx.organization_id, book_id)
            .await?
            .ok_or_else(|| CircError::book_not_found(book_id))?;

        // Friendly pre-check; the unique index below is the authority under races
        if self
            .db
            .borrowings()
            .find_active(&ctx.organization_id, book_id, member_id)
            .await?
            .is_some()
        {
            return Err(CircError::AlreadyBorrowed {
                title: book.title,
                member: member.name,
            });
        }

        let borrowing = Borrowing {
            id: Uuid::new_v4().to_string(),
            organization_id: ctx.organization_id.clone(),
            book_id: book_id.to_string(),
            member_id: member_id.to_string(),
            checkout_date: now,
            due_date,
            return_date: None,
            status: BorrowStatus::Borrowed,
        };

        // Stock movement + loan row: one transaction, all or nothing.
        // An error before commit (shortage, race) rolls the decrement back.
        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let book = self
            .ledger
            .decrement_in(&mut tx, ctx, book_id, quantity)
            .await?;

        if let Err(e) = self.db.borrowings().insert_in(&mut tx, &borrowing).await {
            tx.rollback().await.map_err(DbError::from)?;
            if e.is_unique_violation() {
                // Two desks raced for the same (book, member); this one lost
                return Err(CircError::AlreadyBorrowed {
                    title: book.title,
                    member: member.name,
                });
            }
            return Err(e.into());
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            book = %book.title,
            member = %member.name,
            quantity = %quantity,
            due = %due_date,
            "Book checked out"
        );

        let transaction = self.recorder.record_loan(ctx, member_id, fee).await?;

        Ok(CheckoutReceipt {
            borrowing,
            book,
            transaction,
        })
    }

    // =========================================================================
    // Check-In
    // =========================================================================

    /// Closes an open loan and puts one copy back on the shelf.
    ///
    /// ## Errors
    /// - `LoanNotFound` for an unknown borrowing ID
    /// - `AlreadyReturned` if the loan is already closed (a second check-in
    ///   never moves stock twice)
    pub async fn checkin(&self, ctx: &OrgContext, borrowing_id: &str) -> CircResult<CheckinReceipt> {
        debug!(borrowing_id = %borrowing_id, "Check-in requested");

        let borrowing = self
            .db
            .borrowings()
            .get(&ctx.organization_id, borrowing_id)
            .await?
            .ok_or_else(|| CircError::loan_not_found(borrowing_id))?;

        if borrowing.status == BorrowStatus::Returned {
            return Err(CircError::AlreadyReturned {
                borrowing_id: borrowing_id.to_string(),
            });
        }

        let now = Utc::now();

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        // Conditional on status = borrowed: the store arbitrates double check-ins
        let closed = self
            .db
            .borrowings()
            .mark_returned_in(&mut tx, &ctx.organization_id, borrowing_id, now)
            .await?;
        if !closed {
            tx.rollback().await.map_err(DbError::from)?;
            return Err(CircError::AlreadyReturned {
                borrowing_id: borrowing_id.to_string(),
            });
        }

        // One loan, one copy back; a quantity-n checkout is still one loan row
        let book = self
            .ledger
            .increment_in(&mut tx, ctx, &borrowing.book_id, 1)
            .await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            book = %book.title,
            borrowing_id = %borrowing_id,
            "Book checked in"
        );

        let transaction = self
            .recorder
            .record_return(ctx, &borrowing.member_id, &book.title)
            .await?;

        let borrowing = Borrowing {
            status: BorrowStatus::Returned,
            return_date: Some(now),
            ..borrowing
        };

        Ok(CheckinReceipt {
            borrowing,
            book,
            transaction,
        })
    }

    // =========================================================================
    // Batch Variants
    // =========================================================================

    /// Checks out several titles to one member, line by line, in order.
    ///
    /// Best-effort: a failing line does not roll back earlier lines, and
    /// later lines still run. Callers inspect the outcomes to see which
    /// lines committed.
    pub async fn checkout_many(
        &self,
        ctx: &OrgContext,
        requests: &[CheckoutRequest],
        member_id: &str,
        due: DuePolicy,
    ) -> Vec<CheckoutOutcome> {
        let mut outcomes = Vec::with_capacity(requests.len());
        for request in requests {
            let result = self
                .checkout(ctx, &request.book_id, member_id, due, request.quantity)
                .await;
            if let Err(e) = &result {
                warn!(book_id = %request.book_id, error = %e, "Batch checkout line failed");
            }
            outcomes.push(CheckoutOutcome {
                book_id: request.book_id.clone(),
                result,
            });
        }
        outcomes
    }

    /// Closes several loans, line by line, in order. Best-effort like
    /// [`checkout_many`](Self::checkout_many).
    pub async fn checkin_many(
        &self,
        ctx: &OrgContext,
        borrowing_ids: &[String],
    ) -> Vec<CheckinOutcome> {
        let mut outcomes = Vec::with_capacity(borrowing_ids.len());
        for borrowing_id in borrowing_ids {
            let result = self.checkin(ctx, borrowing_id).await;
            if let Err(e) = &result {
                warn!(borrowing_id = %borrowing_id, error = %e, "Batch check-in line failed");
            }
            outcomes.push(CheckinOutcome {
                borrowing_id: borrowing_id.clone(),
                result,
            });
        }
        outcomes
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use biblio_core::{
        BookStatus, Genre, Member, MemberStatus, NewBook, NewMember, PaymentMethod,
        DEFAULT_ORGANIZATION_ID,
    };
    use biblio_db::DbConfig;
    use chrono::Duration;
    use std::path::{Path, PathBuf};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory())
            .await
            .expect("in-memory database")
    }

    /// File-backed database for tests that need two writers racing.
    /// The in-memory pool is capped at one connection, which would
    /// serialize everything artificially.
    async fn file_db(tag: &str) -> (Database, PathBuf) {
        let path = std::env::temp_dir().join(format!("biblio-circ-{}-{}.db", tag, Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path))
            .await
            .expect("file-backed database");
        (db, path)
    }

    fn remove_db_files(path: &Path) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = path.as_os_str().to_owned();
            file.push(suffix);
            let _ = std::fs::remove_file(PathBuf::from(file));
        }
    }

    async fn seed_book(
        db: &Database,
        ctx: &OrgContext,
        title: &str,
        isbn: &str,
        price_cents: i64,
        stock: i64,
    ) -> Book {
        db.books()
            .insert(
                ctx,
                NewBook::new(title, "Test Author", isbn, Genre::Fantasy, price_cents, stock),
            )
            .await
            .expect("seed book")
    }

    async fn seed_member(db: &Database, ctx: &OrgContext, name: &str, email: &str) -> Member {
        db.members()
            .insert(ctx, NewMember::new(name, email))
            .await
            .expect("seed member")
    }

    #[tokio::test]
    async fn test_checkout_moves_stock_and_opens_loan() {
        let db = test_db().await;
        let ctx = OrgContext::library(DEFAULT_ORGANIZATION_ID);
        let engine = CirculationEngine::new(db.clone());
        let book = seed_book(&db, &ctx, "Dune", "isbn-0001", 1299, 1).await;
        let member = seed_member(&db, &ctx, "Alice Hart", "alice@example.com").await;

        let receipt = engine
            .checkout(&ctx, &book.id, &member.id, DuePolicy::Days15, 1)
            .await
            .expect("checkout");

        assert_eq!(receipt.book.stock, 0);
        assert_eq!(receipt.book.status, BookStatus::CheckedOut);
        assert_eq!(receipt.borrowing.status, BorrowStatus::Borrowed);
        assert!(receipt.borrowing.return_date.is_none());
        assert_eq!(
            receipt.borrowing.due_date.date_naive(),
            (Utc::now() + Duration::days(15)).date_naive()
        );
        assert_eq!(receipt.transaction.payment_method, PaymentMethod::Borrow);
        assert_eq!(receipt.transaction.total_amount_cents, 0);

        // Persisted state agrees with the receipt
        let stored = db
            .borrowings()
            .get(&ctx.organization_id, &receipt.borrowing.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, BorrowStatus::Borrowed);
        assert_eq!(stored.book_id, book.id);
        assert_eq!(stored.member_id, member.id);
    }

    #[tokio::test]
    async fn test_second_loan_of_same_title_rejected() {
        let db = test_db().await;
        let ctx = OrgContext::library(DEFAULT_ORGANIZATION_ID);
        let engine = CirculationEngine::new(db.clone());
        let book = seed_book(&db, &ctx, "Dune", "isbn-0002", 1299, 5).await;
        let member = seed_member(&db, &ctx, "Alice Hart", "alice2@example.com").await;

        engine
            .checkout(&ctx, &book.id, &member.id, DuePolicy::Days15, 1)
            .await
            .expect("first checkout");

        let err = engine
            .checkout(&ctx, &book.id, &member.id, DuePolicy::Days15, 1)
            .await
            .unwrap_err();
        match err {
            CircError::AlreadyBorrowed { title, member } => {
                assert_eq!(title, "Dune");
                assert_eq!(member, "Alice Hart");
            }
            other => panic!("expected AlreadyBorrowed, got {other:?}"),
        }

        // The rejected attempt wrote nothing
        let stored = db.books().get(&ctx.organization_id, &book.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 4);
        assert_eq!(db.borrowings().count_active(&ctx.organization_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_checkin_restores_stock_and_closes_loan() {
        let db = test_db().await;
        let ctx = OrgContext::library(DEFAULT_ORGANIZATION_ID);
        let engine = CirculationEngine::new(db.clone());
        let book = seed_book(&db, &ctx, "Dune", "isbn-0003", 1299, 1).await;
        let member = seed_member(&db, &ctx, "Alice Hart", "alice3@example.com").await;

        let out = engine
            .checkout(&ctx, &book.id, &member.id, DuePolicy::Days15, 1)
            .await
            .expect("checkout");

        let receipt = engine
            .checkin(&ctx, &out.borrowing.id)
            .await
            .expect("checkin");

        assert_eq!(receipt.book.stock, 1);
        assert_eq!(receipt.book.status, BookStatus::Available);
        assert_eq!(receipt.borrowing.status, BorrowStatus::Returned);
        assert!(receipt.borrowing.return_date.is_some());
        assert_eq!(receipt.transaction.payment_method, PaymentMethod::Return);
        assert_eq!(receipt.transaction.total_amount_cents, 0);
        assert_eq!(receipt.transaction.notes.as_deref(), Some("Returned: Dune"));
    }

    #[tokio::test]
    async fn test_double_checkin_moves_stock_once() {
        let db = test_db().await;
        let ctx = OrgContext::library(DEFAULT_ORGANIZATION_ID);
        let engine = CirculationEngine::new(db.clone());
        let book = seed_book(&db, &ctx, "Dune", "isbn-0004", 1299, 1).await;
        let member = seed_member(&db, &ctx, "Alice Hart", "alice4@example.com").await;

        let out = engine
            .checkout(&ctx, &book.id, &member.id, DuePolicy::Days15, 1)
            .await
            .expect("checkout");
        engine.checkin(&ctx, &out.borrowing.id).await.expect("first checkin");

        let err = engine.checkin(&ctx, &out.borrowing.id).await.unwrap_err();
        assert!(matches!(err, CircError::AlreadyReturned { .. }));

        let stored = db.books().get(&ctx.organization_id, &book.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 1);
    }

    #[tokio::test]
    async fn test_title_can_be_borrowed_again_after_return() {
        let db = test_db().await;
        let ctx = OrgContext::library(DEFAULT_ORGANIZATION_ID);
        let engine = CirculationEngine::new(db.clone());
        let book = seed_book(&db, &ctx, "Dune", "isbn-0005", 1299, 1).await;
        let member = seed_member(&db, &ctx, "Alice Hart", "alice5@example.com").await;

        let out = engine
            .checkout(&ctx, &book.id, &member.id, DuePolicy::Days15, 1)
            .await
            .expect("first loan");
        engine.checkin(&ctx, &out.borrowing.id).await.expect("return");

        // The closed loan no longer blocks a fresh one
        engine
            .checkout(&ctx, &book.id, &member.id, DuePolicy::Days30, 1)
            .await
            .expect("second loan");
        assert_eq!(db.borrowings().count_active(&ctx.organization_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_bookstore_rent_fee_lands_on_loan_event() {
        let db = test_db().await;
        let ctx = OrgContext::book_store(DEFAULT_ORGANIZATION_ID);
        let engine = CirculationEngine::new(db.clone());
        let book = seed_book(&db, &ctx, "Dune", "isbn-0006", 2500, 2).await;
        let member = seed_member(&db, &ctx, "Alice Hart", "alice6@example.com").await;

        let fee = Money::from_cents(book.price_cents).rental_price();
        let receipt = engine
            .checkout_with_fee(&ctx, &book.id, &member.id, DuePolicy::Days20, 1, fee)
            .await
            .expect("rented checkout");

        assert_eq!(receipt.transaction.payment_method, PaymentMethod::Rent);
        assert_eq!(receipt.transaction.total_amount_cents, 1500);
    }

    #[tokio::test]
    async fn test_unknown_ids_reported_by_kind() {
        let db = test_db().await;
        let ctx = OrgContext::library(DEFAULT_ORGANIZATION_ID);
        let engine = CirculationEngine::new(db.clone());
        let book = seed_book(&db, &ctx, "Dune", "isbn-0007", 1299, 1).await;
        let member = seed_member(&db, &ctx, "Alice Hart", "alice7@example.com").await;

        let err = engine
            .checkout(&ctx, &book.id, "nobody", DuePolicy::Days15, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CircError::MemberNotFound { .. }));

        let err = engine
            .checkout(&ctx, "no-such-book", &member.id, DuePolicy::Days15, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CircError::BookNotFound { .. }));

        let err = engine.checkin(&ctx, "no-such-loan").await.unwrap_err();
        assert!(matches!(err, CircError::LoanNotFound { .. }));
    }

    #[tokio::test]
    async fn test_past_custom_due_date_fails_before_any_write() {
        let db = test_db().await;
        let ctx = OrgContext::library(DEFAULT_ORGANIZATION_ID);
        let engine = CirculationEngine::new(db.clone());
        let book = seed_book(&db, &ctx, "Dune", "isbn-0008", 1299, 3).await;
        let member = seed_member(&db, &ctx, "Alice Hart", "alice8@example.com").await;

        let past = DuePolicy::Custom(Utc::now() - Duration::days(3));
        let err = engine
            .checkout(&ctx, &book.id, &member.id, past, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CircError::Validation(_)));

        let stored = db.books().get(&ctx.organization_id, &book.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 3);
        assert_eq!(db.borrowings().count_active(&ctx.organization_id).await.unwrap(), 0);
        assert_eq!(db.transactions().count(&ctx.organization_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_shortage_leaves_no_partial_state() {
        let db = test_db().await;
        let ctx = OrgContext::library(DEFAULT_ORGANIZATION_ID);
        let engine = CirculationEngine::new(db.clone());
        let book = seed_book(&db, &ctx, "Dune", "isbn-0009", 1299, 0).await;
        let member = seed_member(&db, &ctx, "Alice Hart", "alice9@example.com").await;

        let err = engine
            .checkout(&ctx, &book.id, &member.id, DuePolicy::Days15, 1)
            .await
            .unwrap_err();
        match err {
            CircError::InsufficientStock {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 0);
                assert_eq!(requested, 1);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        assert_eq!(db.borrowings().count_active(&ctx.organization_id).await.unwrap(), 0);
        assert_eq!(db.transactions().count(&ctx.organization_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_member_standing_never_blocks_checkout() {
        let db = test_db().await;
        let ctx = OrgContext::library(DEFAULT_ORGANIZATION_ID);
        let engine = CirculationEngine::new(db.clone());
        let book = seed_book(&db, &ctx, "Dune", "isbn-0010", 1299, 1).await;
        let member = seed_member(&db, &ctx, "Alice Hart", "alice10@example.com").await;

        db.members()
            .set_status(&ctx.organization_id, &member.id, MemberStatus::Suspended)
            .await
            .expect("suspend member");

        // Standing is administrative; the desk decides what to do with it
        engine
            .checkout(&ctx, &book.id, &member.id, DuePolicy::Days15, 1)
            .await
            .expect("suspended member can still borrow");
    }

    #[tokio::test]
    async fn test_batch_checkout_continues_past_failures() {
        let db = test_db().await;
        let ctx = OrgContext::library(DEFAULT_ORGANIZATION_ID);
        let engine = CirculationEngine::new(db.clone());
        let first = seed_book(&db, &ctx, "Dune", "isbn-0011", 1299, 1).await;
        let third = seed_book(&db, &ctx, "Foundation", "isbn-0012", 999, 2).await;
        let member = seed_member(&db, &ctx, "Alice Hart", "alice11@example.com").await;

        let requests = vec![
            CheckoutRequest { book_id: first.id.clone(), quantity: 1 },
            CheckoutRequest { book_id: "no-such-book".to_string(), quantity: 1 },
            CheckoutRequest { book_id: third.id.clone(), quantity: 1 },
        ];
        let outcomes = engine
            .checkout_many(&ctx, &requests, &member.id, DuePolicy::Days15)
            .await;

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].result.is_ok());
        assert!(matches!(
            outcomes[1].result,
            Err(CircError::BookNotFound { .. })
        ));
        assert!(outcomes[2].result.is_ok());

        // The failed middle line did not undo line one or stop line three
        assert_eq!(db.borrowings().count_active(&ctx.organization_id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_batch_checkin_reports_per_line() {
        let db = test_db().await;
        let ctx = OrgContext::library(DEFAULT_ORGANIZATION_ID);
        let engine = CirculationEngine::new(db.clone());
        let first = seed_book(&db, &ctx, "Dune", "isbn-0013", 1299, 1).await;
        let second = seed_book(&db, &ctx, "Foundation", "isbn-0014", 999, 1).await;
        let member = seed_member(&db, &ctx, "Alice Hart", "alice12@example.com").await;

        let loan_a = engine
            .checkout(&ctx, &first.id, &member.id, DuePolicy::Days15, 1)
            .await
            .expect("loan a");
        let loan_b = engine
            .checkout(&ctx, &second.id, &member.id, DuePolicy::Days15, 1)
            .await
            .expect("loan b");

        let ids = vec![
            loan_a.borrowing.id.clone(),
            "no-such-loan".to_string(),
            loan_b.borrowing.id.clone(),
        ];
        let outcomes = engine.checkin_many(&ctx, &ids).await;

        assert!(outcomes[0].result.is_ok());
        assert!(matches!(
            outcomes[1].result,
            Err(CircError::LoanNotFound { .. })
        ));
        assert!(outcomes[2].result.is_ok());
        assert_eq!(db.borrowings().count_active(&ctx.organization_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_never_oversell() {
        let (db, path) = file_db("oversell").await;
        let ctx = OrgContext::library(DEFAULT_ORGANIZATION_ID);
        let engine = CirculationEngine::new(db.clone());
        let book = seed_book(&db, &ctx, "Dune", "isbn-0015", 1299, 1).await;
        let alice = seed_member(&db, &ctx, "Alice Hart", "alice13@example.com").await;
        let bob = seed_member(&db, &ctx, "Bob Reyes", "bob13@example.com").await;

        let (a, b) = tokio::join!(
            engine.checkout(&ctx, &book.id, &alice.id, DuePolicy::Days15, 1),
            engine.checkout(&ctx, &book.id, &bob.id, DuePolicy::Days15, 1),
        );

        let results = [a, b];
        let won = results.iter().filter(|r| r.is_ok()).count();
        let short = results
            .iter()
            .filter(|r| matches!(r, Err(CircError::InsufficientStock { .. })))
            .count();
        assert_eq!(won, 1, "exactly one desk gets the last copy");
        assert_eq!(short, 1, "the other sees the shortage");

        let stored = db.books().get(&ctx.organization_id, &book.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 0);
        assert_eq!(db.borrowings().count_active(&ctx.organization_id).await.unwrap(), 1);

        db.close().await;
        remove_db_files(&path);
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_loans_collapse_to_one() {
        let (db, path) = file_db("duplicate").await;
        let ctx = OrgContext::library(DEFAULT_ORGANIZATION_ID);
        let engine = CirculationEngine::new(db.clone());
        let book = seed_book(&db, &ctx, "Dune", "isbn-0016", 1299, 5).await;
        let member = seed_member(&db, &ctx, "Alice Hart", "alice14@example.com").await;

        let (a, b) = tokio::join!(
            engine.checkout(&ctx, &book.id, &member.id, DuePolicy::Days15, 1),
            engine.checkout(&ctx, &book.id, &member.id, DuePolicy::Days15, 1),
        );

        let results = [a, b];
        let won = results.iter().filter(|r| r.is_ok()).count();
        let duplicate = results
            .iter()
            .filter(|r| matches!(r, Err(CircError::AlreadyBorrowed { .. })))
            .count();
        assert_eq!(won, 1, "exactly one loan opens");
        assert_eq!(duplicate, 1, "the loser learns the title is already out");

        // The losing attempt rolled its decrement back
        let stored = db.books().get(&ctx.organization_id, &book.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 4);
        assert_eq!(db.borrowings().count_active(&ctx.organization_id).await.unwrap(), 1);

        db.close().await;
        remove_db_files(&path);
    }
}
