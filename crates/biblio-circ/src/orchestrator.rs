//! # Checkout Orchestrator
//!
//! Turns a cart into committed work: purchases (stock down, sale recorded)
//! or loans (stock down, loan row, loan recorded), one line at a time.
//!
//! ## Cart Processing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  process_cart(cart, member, mode)                                       │
//! │       │                                                                 │
//! │       ├── preflight: member given? cart non-empty? method for purchase? │
//! │       │              due date sane? member exists?     (nothing written)│
//! │       │                                                                 │
//! │       ├── line 1 ──▶ commit or record error ──┐                         │
//! │       ├── line 2 ──▶ commit or record error   ├──▶ CartReport           │
//! │       └── line N ──▶ commit or record error ──┘     { outcomes,         │
//! │                                                       cart_cleared }    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines run in cart order. A failed line neither stops later lines nor
//! rolls back earlier ones; the report says exactly which lines committed.
//! The cart is cleared only when every line committed, so a partial failure
//! leaves the cart intact for a retry.

use biblio_core::{Borrowing, Cart, CartLine, CheckoutTransaction, DuePolicy, LineSnapshot, Money, OrgContext, PaymentMethod};
use biblio_core::validation::validate_due_date;
use biblio_db::Database;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::circulation::CirculationEngine;
use crate::error::{CircError, CircResult};
use crate::ledger::InventoryLedger;
use crate::recorder::TransactionRecorder;

// =============================================================================
// Modes and Reports
// =============================================================================

/// What a cart checkout means: sell the copies, or lend them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutMode {
    /// Copies leave the inventory for good; a sale is recorded per line.
    Purchase,
    /// Copies are lent out; a loan row and a loan event are written per line.
    Lending,
}

/// What one committed cart line produced.
#[derive(Debug)]
pub struct CommittedLine {
    /// The audit event for this line.
    pub transaction: CheckoutTransaction,
    /// The loan created by this line (lending mode only).
    pub borrowing: Option<Borrowing>,
    /// What this line charged, in cents.
    pub amount_cents: i64,
}

/// Result of one cart line: the input echo plus commit-or-error.
#[derive(Debug)]
pub struct CartLineOutcome {
    pub book_id: String,
    pub title: String,
    pub quantity: i64,
    pub result: CircResult<CommittedLine>,
}

/// What happened to the whole cart.
#[derive(Debug)]
pub struct CartReport {
    /// One outcome per cart line, in cart order.
    pub outcomes: Vec<CartLineOutcome>,
    /// True when every line committed and the cart was emptied.
    pub cart_cleared: bool,
}

impl CartReport {
    /// Number of lines that committed.
    pub fn committed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Number of lines that failed.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.committed()
    }

    /// True when every line committed.
    pub fn all_committed(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// Total charged across committed lines, in cents.
    pub fn total_committed_cents(&self) -> i64 {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(|line| line.amount_cents)
            .sum()
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Drives a whole cart through purchase or lending checkout.
#[derive(Debug, Clone)]
pub struct CheckoutOrchestrator {
    db: Database,
    engine: CirculationEngine,
    ledger: InventoryLedger,
    recorder: TransactionRecorder,
}

impl CheckoutOrchestrator {
    /// Creates an orchestrator (with its own engine, ledger, and recorder)
    /// over the database.
    pub fn new(db: Database) -> Self {
        CheckoutOrchestrator {
            engine: CirculationEngine::new(db.clone()),
            ledger: InventoryLedger::new(db.clone()),
            recorder: TransactionRecorder::new(db.clone()),
            db,
        }
    }

    /// Processes every line of the cart in order, committing each one
    /// independently.
    ///
    /// Purchase lines move stock and record a sale with title/price
    /// snapshots; lending lines go through the full checkout (loan row,
    /// loan event, fee by role). The cart is cleared only when all lines
    /// committed.
    ///
    /// ## Preflight
    /// All-or-nothing input checks run before any write:
    /// - `MissingInput("member")` when the member ID is blank
    /// - `EmptyCart` when there are no lines
    /// - `MissingInput("payment method")` for a purchase without tender
    /// - `Validation` when a lending due date lies in the past
    /// - `MemberNotFound` when the member doesn't exist
    ///
    /// ## Partial Failure
    /// Per-line errors land in the report, not in the return value: a
    /// shortage on line 2 still lets line 3 commit. Committed lines stay
    /// committed; the caller re-queries state to reconcile if needed.
    pub async fn process_cart(
        &self,
        ctx: &OrgContext,
        cart: &mut Cart,
        member_id: &str,
        mode: CheckoutMode,
        payment_method: Option<PaymentMethod>,
        due: DuePolicy,
    ) -> CircResult<CartReport> {
        debug!(
            lines = cart.line_count(),
            mode = ?mode,
            member_id = %member_id,
            "Processing cart"
        );

        if member_id.trim().is_empty() {
            return Err(CircError::MissingInput { field: "member" });
        }
        if cart.is_empty() {
            return Err(CircError::EmptyCart);
        }

        // Purchase needs tender up front; lending labels itself by role
        let method = match (mode, payment_method) {
            (CheckoutMode::Purchase, None) => {
                return Err(CircError::MissingInput {
                    field: "payment method",
                });
            }
            (CheckoutMode::Purchase, Some(method)) => method,
            (CheckoutMode::Lending, _) => ctx.role.loan_method(),
        };

        // A bad due date fails the whole cart here rather than every line
        if mode == CheckoutMode::Lending {
            let now = Utc::now();
            validate_due_date(due.resolve(now), now)?;
        }

        if self
            .db
            .members()
            .get(&ctx.organization_id, member_id)
            .await?
            .is_none()
        {
            return Err(CircError::member_not_found(member_id));
        }

        let mut outcomes = Vec::with_capacity(cart.line_count());
        for line in &cart.lines {
            let result = match mode {
                CheckoutMode::Purchase => {
                    self.purchase_line(ctx, member_id, line, method.clone()).await
                }
                CheckoutMode::Lending => self.lend_line(ctx, member_id, line, due).await,
            };

            if let Err(e) = &result {
                warn!(title = %line.title, error = %e, "Cart line failed");
            }

            outcomes.push(CartLineOutcome {
                book_id: line.book_id.clone(),
                title: line.title.clone(),
                quantity: line.quantity,
                result,
            });
        }

        let cart_cleared = outcomes.iter().all(|o| o.result.is_ok());
        if cart_cleared {
            cart.clear();
        }

        info!(
            lines = outcomes.len(),
            committed = outcomes.iter().filter(|o| o.result.is_ok()).count(),
            cart_cleared = cart_cleared,
            "Cart processed"
        );

        Ok(CartReport {
            outcomes,
            cart_cleared,
        })
    }

    /// Commits one purchase line: stock off the shelf, sales count up,
    /// sale recorded at the cart's frozen price.
    async fn purchase_line(
        &self,
        ctx: &OrgContext,
        member_id: &str,
        line: &CartLine,
        method: PaymentMethod,
    ) -> CircResult<CommittedLine> {
        self.ledger.decrement(ctx, &line.book_id, line.quantity).await?;

        // Sold copies feed the popularity stat; loans never do
        self.db
            .books()
            .bump_sales_count(&ctx.organization_id, &line.book_id, line.quantity)
            .await?;

        let snapshot = LineSnapshot::from(line);
        let transaction = self
            .recorder
            .record_purchase(ctx, member_id, std::slice::from_ref(&snapshot), method)
            .await?;

        let amount_cents = transaction.total_amount_cents;
        Ok(CommittedLine {
            transaction,
            borrowing: None,
            amount_cents,
        })
    }

    /// Commits one lending line through the full checkout flow, charging
    /// the role's fee at the cart's frozen price.
    async fn lend_line(
        &self,
        ctx: &OrgContext,
        member_id: &str,
        line: &CartLine,
        due: DuePolicy,
    ) -> CircResult<CommittedLine> {
        // Zero for libraries; rental price per copy for bookstores
        let fee = ctx
            .role
            .loan_fee(Money::from_cents(line.unit_price_cents))
            .multiply_quantity(line.quantity);

        let receipt = self
            .engine
            .checkout_with_fee(ctx, &line.book_id, member_id, due, line.quantity, fee)
            .await?;

        let amount_cents = receipt.transaction.total_amount_cents;
        Ok(CommittedLine {
            transaction: receipt.transaction,
            borrowing: Some(receipt.borrowing),
            amount_cents,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use biblio_core::{Book, BorrowStatus, Genre, Member, NewBook, NewMember, DEFAULT_ORGANIZATION_ID};
    use biblio_db::DbConfig;
    use chrono::Duration;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory())
            .await
            .expect("in-memory database")
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
                NewBook::new(title, "Test Author", isbn, Genre::Mystery, price_cents, stock),
            )
            .await
            .expect("seed book")
    }

    async fn seed_member(db: &Database, ctx: &OrgContext, email: &str) -> Member {
        db.members()
            .insert(ctx, NewMember::new("Rosa Vane", email))
            .await
            .expect("seed member")
    }

    #[tokio::test]
    async fn test_lending_cart_commits_every_line() {
        let db = test_db().await;
        let ctx = OrgContext::library(DEFAULT_ORGANIZATION_ID);
        let orchestrator = CheckoutOrchestrator::new(db.clone());
        let dune = seed_book(&db, &ctx, "Dune", "isbn-0101", 1299, 3).await;
        let foundation = seed_book(&db, &ctx, "Foundation", "isbn-0102", 999, 2).await;
        let member = seed_member(&db, &ctx, "rosa1@example.com").await;

        let mut cart = Cart::new();
        cart.add_book(&dune, 1).expect("add dune");
        cart.add_book(&foundation, 1).expect("add foundation");

        let report = orchestrator
            .process_cart(&ctx, &mut cart, &member.id, CheckoutMode::Lending, None, DuePolicy::Days15)
            .await
            .expect("process cart");

        assert!(report.all_committed());
        assert_eq!(report.committed(), 2);
        assert!(report.cart_cleared);
        assert!(cart.is_empty());

        // Every line opened a loan and charged nothing (library)
        for outcome in &report.outcomes {
            let line = outcome.result.as_ref().expect("committed line");
            let borrowing = line.borrowing.as_ref().expect("lending creates a loan");
            assert_eq!(borrowing.status, BorrowStatus::Borrowed);
            assert_eq!(line.amount_cents, 0);
        }
        assert_eq!(db.borrowings().count_active(&ctx.organization_id).await.unwrap(), 2);

        let dune_after = db.books().get(&ctx.organization_id, &dune.id).await.unwrap().unwrap();
        let foundation_after = db.books().get(&ctx.organization_id, &foundation.id).await.unwrap().unwrap();
        assert_eq!(dune_after.stock, 2);
        assert_eq!(foundation_after.stock, 1);
    }

    #[tokio::test]
    async fn test_purchase_cart_records_sales_and_skips_loans() {
        let db = test_db().await;
        let ctx = OrgContext::book_store(DEFAULT_ORGANIZATION_ID);
        let orchestrator = CheckoutOrchestrator::new(db.clone());
        let book = seed_book(&db, &ctx, "Dune", "isbn-0103", 1250, 5).await;
        let member = seed_member(&db, &ctx, "rosa2@example.com").await;

        let mut cart = Cart::new();
        cart.add_book(&book, 2).expect("add line");

        let report = orchestrator
            .process_cart(
                &ctx,
                &mut cart,
                &member.id,
                CheckoutMode::Purchase,
                Some(PaymentMethod::Cash),
                DuePolicy::default(),
            )
            .await
            .expect("process cart");

        assert!(report.all_committed());
        assert_eq!(report.total_committed_cents(), 2500);
        assert!(cart.is_empty());

        let line = report.outcomes[0].result.as_ref().expect("committed");
        assert!(line.borrowing.is_none(), "purchases open no loans");
        assert_eq!(line.transaction.payment_method, PaymentMethod::Cash);

        // Stock left for good; the sale feeds the popularity stat
        let after = db.books().get(&ctx.organization_id, &book.id).await.unwrap().unwrap();
        assert_eq!(after.stock, 3);
        assert_eq!(after.sales_count, 2);
        assert_eq!(db.borrowings().count_active(&ctx.organization_id).await.unwrap(), 0);

        let items = db.transactions().items_for(&line.transaction.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title_snapshot, "Dune");
        assert_eq!(items[0].unit_price_cents, 1250);
        assert_eq!(items[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_cart_for_retry() {
        let db = test_db().await;
        let ctx = OrgContext::library(DEFAULT_ORGANIZATION_ID);
        let orchestrator = CheckoutOrchestrator::new(db.clone());
        let plenty = seed_book(&db, &ctx, "Dune", "isbn-0104", 1299, 3).await;
        let empty = seed_book(&db, &ctx, "Foundation", "isbn-0105", 999, 0).await;
        let member = seed_member(&db, &ctx, "rosa3@example.com").await;

        let mut cart = Cart::new();
        cart.add_book(&plenty, 1).expect("add line");
        cart.add_book(&empty, 1).expect("add line");

        let report = orchestrator
            .process_cart(&ctx, &mut cart, &member.id, CheckoutMode::Lending, None, DuePolicy::Days15)
            .await
            .expect("process cart");

        assert_eq!(report.committed(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.cart_cleared);
        assert_eq!(cart.line_count(), 2, "cart stays intact for a retry");

        assert!(report.outcomes[0].result.is_ok());
        assert!(matches!(
            report.outcomes[1].result,
            Err(CircError::InsufficientStock { .. })
        ));

        // Line one stays committed; that is the contract
        assert_eq!(db.borrowings().count_active(&ctx.organization_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_purchase_without_method_rejected_before_any_write() {
        let db = test_db().await;
        let ctx = OrgContext::book_store(DEFAULT_ORGANIZATION_ID);
        let orchestrator = CheckoutOrchestrator::new(db.clone());
        let book = seed_book(&db, &ctx, "Dune", "isbn-0106", 1250, 5).await;
        let member = seed_member(&db, &ctx, "rosa4@example.com").await;

        let mut cart = Cart::new();
        cart.add_book(&book, 1).expect("add line");

        let err = orchestrator
            .process_cart(&ctx, &mut cart, &member.id, CheckoutMode::Purchase, None, DuePolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CircError::MissingInput { field: "payment method" }));

        let after = db.books().get(&ctx.organization_id, &book.id).await.unwrap().unwrap();
        assert_eq!(after.stock, 5);
        assert_eq!(db.transactions().count(&ctx.organization_id).await.unwrap(), 0);
        assert_eq!(cart.line_count(), 1);
    }

    #[tokio::test]
    async fn test_blank_member_and_empty_cart_rejected() {
        let db = test_db().await;
        let ctx = OrgContext::library(DEFAULT_ORGANIZATION_ID);
        let orchestrator = CheckoutOrchestrator::new(db.clone());
        let book = seed_book(&db, &ctx, "Dune", "isbn-0107", 1299, 3).await;

        let mut cart = Cart::new();
        cart.add_book(&book, 1).expect("add line");
        let err = orchestrator
            .process_cart(&ctx, &mut cart, "   ", CheckoutMode::Lending, None, DuePolicy::Days15)
            .await
            .unwrap_err();
        assert!(matches!(err, CircError::MissingInput { field: "member" }));

        let mut empty_cart = Cart::new();
        let err = orchestrator
            .process_cart(&ctx, &mut empty_cart, "m-1", CheckoutMode::Lending, None, DuePolicy::Days15)
            .await
            .unwrap_err();
        assert!(matches!(err, CircError::EmptyCart));
    }

    #[tokio::test]
    async fn test_unknown_member_fails_the_whole_cart() {
        let db = test_db().await;
        let ctx = OrgContext::library(DEFAULT_ORGANIZATION_ID);
        let orchestrator = CheckoutOrchestrator::new(db.clone());
        let book = seed_book(&db, &ctx, "Dune", "isbn-0108", 1299, 3).await;

        let mut cart = Cart::new();
        cart.add_book(&book, 1).expect("add line");

        let err = orchestrator
            .process_cart(&ctx, &mut cart, "nobody", CheckoutMode::Lending, None, DuePolicy::Days15)
            .await
            .unwrap_err();
        assert!(matches!(err, CircError::MemberNotFound { .. }));

        let after = db.books().get(&ctx.organization_id, &book.id).await.unwrap().unwrap();
        assert_eq!(after.stock, 3);
    }

    #[tokio::test]
    async fn test_snapshot_price_survives_catalog_edit() {
        let db = test_db().await;
        let ctx = OrgContext::book_store(DEFAULT_ORGANIZATION_ID);
        let orchestrator = CheckoutOrchestrator::new(db.clone());
        let book = seed_book(&db, &ctx, "Dune", "isbn-0109", 1200, 5).await;
        let member = seed_member(&db, &ctx, "rosa5@example.com").await;

        let mut cart = Cart::new();
        cart.add_book(&book, 2).expect("add line");

        // Price raised between cart add and checkout; the cart price wins
        let mut repriced = book.clone();
        repriced.price_cents = 9900;
        db.books().update(&repriced).await.expect("reprice");

        let report = orchestrator
            .process_cart(
                &ctx,
                &mut cart,
                &member.id,
                CheckoutMode::Purchase,
                Some(PaymentMethod::Card),
                DuePolicy::default(),
            )
            .await
            .expect("process cart");

        let line = report.outcomes[0].result.as_ref().expect("committed");
        assert_eq!(line.amount_cents, 2400);

        let items = db.transactions().items_for(&line.transaction.id).await.unwrap();
        assert_eq!(items[0].unit_price_cents, 1200);
    }

    #[tokio::test]
    async fn test_past_due_date_fails_whole_lending_cart() {
        let db = test_db().await;
        let ctx = OrgContext::library(DEFAULT_ORGANIZATION_ID);
        let orchestrator = CheckoutOrchestrator::new(db.clone());
        let book = seed_book(&db, &ctx, "Dune", "isbn-0110", 1299, 3).await;
        let member = seed_member(&db, &ctx, "rosa6@example.com").await;

        let mut cart = Cart::new();
        cart.add_book(&book, 1).expect("add line");

        let past = DuePolicy::Custom(Utc::now() - Duration::days(2));
        let err = orchestrator
            .process_cart(&ctx, &mut cart, &member.id, CheckoutMode::Lending, None, past)
            .await
            .unwrap_err();
        assert!(matches!(err, CircError::Validation(_)));

        assert_eq!(cart.line_count(), 1);
        assert_eq!(db.borrowings().count_active(&ctx.organization_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_bookstore_lending_cart_charges_rent() {
        let db = test_db().await;
        let ctx = OrgContext::book_store(DEFAULT_ORGANIZATION_ID);
        let orchestrator = CheckoutOrchestrator::new(db.clone());
        let book = seed_book(&db, &ctx, "Dune", "isbn-0111", 2500, 4).await;
        let member = seed_member(&db, &ctx, "rosa7@example.com").await;

        let mut cart = Cart::new();
        cart.add_book(&book, 2).expect("add line");

        let report = orchestrator
            .process_cart(&ctx, &mut cart, &member.id, CheckoutMode::Lending, None, DuePolicy::Days20)
            .await
            .expect("process cart");

        // 60% of 2500, twice
        let line = report.outcomes[0].result.as_ref().expect("committed");
        assert_eq!(line.amount_cents, 3000);
        assert_eq!(line.transaction.payment_method, PaymentMethod::Rent);
        assert!(line.borrowing.is_some());
    }
}
