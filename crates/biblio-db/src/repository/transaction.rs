//! # Transaction Repository
//!
//! Database operations for the checkout audit trail.
//!
//! ## Append-Only
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      The Audit Trail Is History                         │
//! │                                                                         │
//! │  INSERT ✓   checkout_transactions + checkout_items (one SQL txn)       │
//! │  SELECT ✓   lookups, per-member lists, recent activity                 │
//! │  UPDATE ✗   no method exists; corrections are NEW transactions         │
//! │  DELETE ✗   no method exists                                           │
//! │                                                                         │
//! │  Items freeze title and unit price at transaction time (snapshot       │
//! │  pattern). Editing or deleting the book later cannot change what       │
//! │  the receipt said.                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use biblio_core::{CheckoutItem, CheckoutTransaction, LineSnapshot, PaymentMethod, TransactionStatus};

/// Repository for checkout transaction database operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Writes a transaction header and its line items atomically.
    ///
    /// ## What This Does
    /// 1. Opens one SQLite transaction
    /// 2. Inserts the header row
    /// 3. Inserts one item row per snapshot (IDs generated here,
    ///    `created_at` pinned to the header date)
    /// 4. Commits, so a header can never exist with half its items
    ///
    /// ## Arguments
    /// * `transaction` - Complete header (ID generated by the caller)
    /// * `lines` - Frozen title/price snapshots; may be empty for
    ///   loan/return markers that carry no line items
    ///
    /// ## Returns
    /// The stored line items, in input order.
    pub async fn insert(
        &self,
        transaction: &CheckoutTransaction,
        lines: &[LineSnapshot],
    ) -> DbResult<Vec<CheckoutItem>> {
        debug!(
            id = %transaction.id,
            method = %transaction.payment_method,
            total_cents = transaction.total_amount_cents,
            lines = lines.len(),
            "Inserting checkout transaction"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO checkout_transactions (
                id, organization_id, customer_id, status,
                payment_method, total_amount_cents, date, notes
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8
            )
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.organization_id)
        .bind(&transaction.customer_id)
        .bind(transaction.status)
        .bind(transaction.payment_method.as_str())
        .bind(transaction.total_amount_cents)
        .bind(transaction.date)
        .bind(&transaction.notes)
        .execute(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(lines.len());

        for line in lines {
            let item = CheckoutItem {
                id: Uuid::new_v4().to_string(),
                transaction_id: transaction.id.clone(),
                book_id: line.book_id.clone(),
                title_snapshot: line.title.clone(),
                unit_price_cents: line.unit_price_cents,
                quantity: line.quantity,
                created_at: transaction.date,
            };

            sqlx::query(
                r#"
                INSERT INTO checkout_items (
                    id, transaction_id, book_id,
                    title_snapshot, unit_price_cents, quantity, created_at
                ) VALUES (
                    ?1, ?2, ?3,
                    ?4, ?5, ?6, ?7
                )
                "#,
            )
            .bind(&item.id)
            .bind(&item.transaction_id)
            .bind(&item.book_id)
            .bind(&item.title_snapshot)
            .bind(item.unit_price_cents)
            .bind(item.quantity)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;

            items.push(item);
        }

        tx.commit().await?;

        Ok(items)
    }

    /// Gets a transaction header by ID.
    pub async fn get(&self, org_id: &str, id: &str) -> DbResult<Option<CheckoutTransaction>> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT
                id, organization_id, customer_id, status,
                payment_method, total_amount_cents, date, notes
            FROM checkout_transactions
            WHERE id = ?1 AND organization_id = ?2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CheckoutTransaction::from))
    }

    /// Gets the line items of a transaction, in insertion order.
    pub async fn items_for(&self, transaction_id: &str) -> DbResult<Vec<CheckoutItem>> {
        let items = sqlx::query_as::<_, CheckoutItem>(
            r#"
            SELECT
                id, transaction_id, book_id,
                title_snapshot, unit_price_cents, quantity, created_at
            FROM checkout_items
            WHERE transaction_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists a member's transactions, most recent first.
    pub async fn list_by_member(
        &self,
        org_id: &str,
        member_id: &str,
        limit: u32,
    ) -> DbResult<Vec<CheckoutTransaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT
                id, organization_id, customer_id, status,
                payment_method, total_amount_cents, date, notes
            FROM checkout_transactions
            WHERE organization_id = ?1 AND customer_id = ?2
            ORDER BY date DESC
            LIMIT ?3
            "#,
        )
        .bind(org_id)
        .bind(member_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CheckoutTransaction::from).collect())
    }

    /// Lists the most recent transactions across the organization.
    pub async fn list_recent(&self, org_id: &str, limit: u32) -> DbResult<Vec<CheckoutTransaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT
                id, organization_id, customer_id, status,
                payment_method, total_amount_cents, date, notes
            FROM checkout_transactions
            WHERE organization_id = ?1
            ORDER BY date DESC
            LIMIT ?2
            "#,
        )
        .bind(org_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CheckoutTransaction::from).collect())
    }

    /// Counts transactions (for diagnostics).
    pub async fn count(&self, org_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM checkout_transactions WHERE organization_id = ?1",
        )
        .bind(org_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

/// Raw row shape for checkout_transactions.
///
/// `payment_method` is stored as its display label (free-form labels from
/// imports included), so it decodes as a plain string and maps through
/// `PaymentMethod::from`.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: String,
    organization_id: String,
    customer_id: String,
    status: TransactionStatus,
    payment_method: String,
    total_amount_cents: i64,
    date: DateTime<Utc>,
    notes: Option<String>,
}

impl From<TransactionRow> for CheckoutTransaction {
    fn from(row: TransactionRow) -> Self {
        CheckoutTransaction {
            id: row.id,
            organization_id: row.organization_id,
            customer_id: row.customer_id,
            status: row.status,
            payment_method: PaymentMethod::from(row.payment_method),
            total_amount_cents: row.total_amount_cents,
            date: row.date,
            notes: row.notes,
        }
    }
}
