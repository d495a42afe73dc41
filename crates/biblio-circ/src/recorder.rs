//! # Transaction Recorder
//!
//! Writes the append-only financial audit trail. Every money-relevant event
//! (purchase, loan, return) becomes exactly one `CheckoutTransaction`, with
//! item snapshots for purchases.
//!
//! ## Event Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_purchase   total = Σ(price × qty)   items: one per line         │
//! │  record_loan       total = fee (0 or rent)  items: none                 │
//! │  record_return     total = 0                items: none                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Loans carry `Borrow` (library) or `Rent` (bookstore) as their payment
//! method, taken from the organization role; returns carry `Return` and a
//! `Returned: <title>` note. Prices come from caller-provided snapshots,
//! never from the live catalog row, so later price edits cannot rewrite
//! history.

use biblio_core::{CheckoutTransaction, LineSnapshot, Money, OrgContext, PaymentMethod, TransactionStatus};
use biblio_db::Database;
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{CircError, CircResult};

/// Append-only writer for the financial audit trail.
#[derive(Debug, Clone)]
pub struct TransactionRecorder {
    db: Database,
}

impl TransactionRecorder {
    /// Creates a recorder over the given database.
    pub fn new(db: Database) -> Self {
        TransactionRecorder { db }
    }

    /// Records a completed purchase: one transaction plus one item snapshot
    /// per line, committed together.
    ///
    /// The total is the sum of the line totals; the items freeze title and
    /// unit price as they were at checkout.
    ///
    /// ## Errors
    /// - `EmptyCart` if `lines` is empty
    pub async fn record_purchase(
        &self,
        ctx: &OrgContext,
        member_id: &str,
        lines: &[LineSnapshot],
        method: PaymentMethod,
    ) -> CircResult<CheckoutTransaction> {
        if lines.is_empty() {
            return Err(CircError::EmptyCart);
        }

        let total: i64 = lines.iter().map(LineSnapshot::line_total_cents).sum();
        debug!(
            member_id = %member_id,
            lines = lines.len(),
            total_cents = total,
            "Recording purchase"
        );

        let transaction = CheckoutTransaction {
            id: Uuid::new_v4().to_string(),
            organization_id: ctx.organization_id.clone(),
            customer_id: member_id.to_string(),
            status: TransactionStatus::Completed,
            payment_method: method,
            total_amount_cents: total,
            date: Utc::now(),
            notes: None,
        };

        self.db.transactions().insert(&transaction, lines).await?;

        info!(
            transaction_id = %transaction.id,
            total_cents = total,
            "Purchase recorded"
        );
        Ok(transaction)
    }

    /// Records a loan event with the given fee.
    ///
    /// Libraries lend free (`Borrow`, amount 0); bookstores rent
    /// (`Rent`, amount = precomputed fee). The method label comes from the
    /// organization role, so the same call works for both. No item rows:
    /// the loan itself lives in `borrowings`.
    pub async fn record_loan(
        &self,
        ctx: &OrgContext,
        member_id: &str,
        amount: Money,
    ) -> CircResult<CheckoutTransaction> {
        let method = ctx.role.loan_method();
        debug!(
            member_id = %member_id,
            method = %method,
            amount_cents = amount.cents(),
            "Recording loan"
        );

        let transaction = CheckoutTransaction {
            id: Uuid::new_v4().to_string(),
            organization_id: ctx.organization_id.clone(),
            customer_id: member_id.to_string(),
            status: TransactionStatus::Completed,
            payment_method: method,
            total_amount_cents: amount.cents(),
            date: Utc::now(),
            notes: None,
        };

        self.db.transactions().insert(&transaction, &[]).await?;

        Ok(transaction)
    }

    /// Records a return event: zero amount, `Return` method, and a
    /// `Returned: <title>` note naming the book.
    pub async fn record_return(
        &self,
        ctx: &OrgContext,
        member_id: &str,
        title: &str,
    ) -> CircResult<CheckoutTransaction> {
        debug!(member_id = %member_id, title = %title, "Recording return");

        let transaction = CheckoutTransaction {
            id: Uuid::new_v4().to_string(),
            organization_id: ctx.organization_id.clone(),
            customer_id: member_id.to_string(),
            status: TransactionStatus::Completed,
            payment_method: PaymentMethod::Return,
            total_amount_cents: 0,
            date: Utc::now(),
            notes: Some(format!("Returned: {}", title)),
        };

        self.db.transactions().insert(&transaction, &[]).await?;

        Ok(transaction)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use biblio_core::{NewMember, DEFAULT_ORGANIZATION_ID};
    use biblio_db::DbConfig;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory())
            .await
            .expect("in-memory database")
    }

    async fn seed_member(db: &Database, ctx: &OrgContext) -> String {
        db.members()
            .insert(ctx, NewMember::new("Rosa Vane", "rosa@example.com"))
            .await
            .expect("seed member")
            .id
    }

    fn snapshot(title: &str, unit_price_cents: i64, quantity: i64) -> LineSnapshot {
        LineSnapshot {
            book_id: None,
            title: title.to_string(),
            unit_price_cents,
            quantity,
        }
    }

    #[tokio::test]
    async fn test_purchase_totals_and_items_persist() {
        let db = test_db().await;
        let ctx = OrgContext::book_store(DEFAULT_ORGANIZATION_ID);
        let recorder = TransactionRecorder::new(db.clone());
        let member_id = seed_member(&db, &ctx).await;

        let lines = vec![snapshot("Dune", 1299, 2), snapshot("Foundation", 999, 1)];
        let tx = recorder
            .record_purchase(&ctx, &member_id, &lines, PaymentMethod::Cash)
            .await
            .expect("record purchase");

        assert_eq!(tx.total_amount_cents, 1299 * 2 + 999);
        assert_eq!(tx.status, TransactionStatus::Completed);

        let items = db.transactions().items_for(&tx.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title_snapshot, "Dune");
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[1].unit_price_cents, 999);
    }

    #[tokio::test]
    async fn test_purchase_with_no_lines_rejected() {
        let db = test_db().await;
        let ctx = OrgContext::book_store(DEFAULT_ORGANIZATION_ID);
        let recorder = TransactionRecorder::new(db.clone());
        let member_id = seed_member(&db, &ctx).await;

        let err = recorder
            .record_purchase(&ctx, &member_id, &[], PaymentMethod::Card)
            .await
            .unwrap_err();
        assert!(matches!(err, CircError::EmptyCart));
    }

    #[tokio::test]
    async fn test_loan_method_follows_role() {
        let db = test_db().await;
        let library = OrgContext::library(DEFAULT_ORGANIZATION_ID);
        let recorder = TransactionRecorder::new(db.clone());
        let member_id = seed_member(&db, &library).await;

        let tx = recorder
            .record_loan(&library, &member_id, Money::zero())
            .await
            .expect("library loan");
        assert_eq!(tx.payment_method, PaymentMethod::Borrow);
        assert_eq!(tx.total_amount_cents, 0);

        let store = OrgContext::book_store(DEFAULT_ORGANIZATION_ID);
        let tx = recorder
            .record_loan(&store, &member_id, Money::from_cents(750))
            .await
            .expect("store loan");
        assert_eq!(tx.payment_method, PaymentMethod::Rent);
        assert_eq!(tx.total_amount_cents, 750);
    }

    #[tokio::test]
    async fn test_return_event_names_the_title() {
        let db = test_db().await;
        let ctx = OrgContext::library(DEFAULT_ORGANIZATION_ID);
        let recorder = TransactionRecorder::new(db.clone());
        let member_id = seed_member(&db, &ctx).await;

        let tx = recorder
            .record_return(&ctx, &member_id, "The Dispossessed")
            .await
            .expect("record return");

        assert_eq!(tx.payment_method, PaymentMethod::Return);
        assert_eq!(tx.total_amount_cents, 0);
        assert_eq!(tx.notes.as_deref(), Some("Returned: The Dispossessed"));

        // Survives the round trip through the store
        let stored = db
            .transactions()
            .get(&ctx.organization_id, &tx.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.notes.as_deref(), Some("Returned: The Dispossessed"));
        assert_eq!(stored.payment_method, PaymentMethod::Return);
    }
}
