//! # Borrowing Repository
//!
//! Database operations for loan rows.
//!
//! ## Single Active Loan
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │            One Open Loan Per (Book, Member), Race Included              │
//! │                                                                         │
//! │  The app-level pre-check (find_active) catches the common case, but    │
//! │  two concurrent checkouts can both pass it. The partial unique index   │
//! │                                                                         │
//! │    CREATE UNIQUE INDEX idx_borrowings_one_active                       │
//! │        ON borrowings(organization_id, book_id, member_id)              │
//! │        WHERE status = 'borrowed'                                       │
//! │                                                                         │
//! │  is the real authority: the second INSERT fails with a UNIQUE          │
//! │  violation, the engine rolls its transaction back (restoring the       │
//! │  stock decrement), and maps the error to "already borrowed".           │
//! │                                                                         │
//! │  Returned rows drop out of the index, so borrow → return → borrow      │
//! │  again works, and full loan history is kept.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use biblio_core::Borrowing;

/// Repository for borrowing database operations.
#[derive(Debug, Clone)]
pub struct BorrowingRepository {
    pool: SqlitePool,
}

impl BorrowingRepository {
    /// Creates a new BorrowingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BorrowingRepository { pool }
    }

    /// Inserts a loan row.
    ///
    /// ## Returns
    /// * `Ok(())` - Loan stored
    /// * `Err(DbError::UniqueViolation)` - This member already holds this
    ///   title (the partial unique index fired)
    /// * `Err(DbError::ForeignKeyViolation)` - Unknown book or member ID
    pub async fn insert(&self, borrowing: &Borrowing) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        self.insert_in(&mut conn, borrowing).await
    }

    /// Inserts a loan row on an explicit connection.
    ///
    /// The circulation engine calls this inside the same transaction as the
    /// stock decrement, so a unique-index rejection rolls both back.
    pub async fn insert_in(
        &self,
        conn: &mut SqliteConnection,
        borrowing: &Borrowing,
    ) -> DbResult<()> {
        debug!(
            book_id = %borrowing.book_id,
            member_id = %borrowing.member_id,
            "Inserting borrowing"
        );

        sqlx::query(
            r#"
            INSERT INTO borrowings (
                id, organization_id, book_id, member_id,
                checkout_date, due_date, return_date, status
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8
            )
            "#,
        )
        .bind(&borrowing.id)
        .bind(&borrowing.organization_id)
        .bind(&borrowing.book_id)
        .bind(&borrowing.member_id)
        .bind(borrowing.checkout_date)
        .bind(borrowing.due_date)
        .bind(borrowing.return_date)
        .bind(borrowing.status)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Gets a loan by ID.
    pub async fn get(&self, org_id: &str, id: &str) -> DbResult<Option<Borrowing>> {
        let borrowing = sqlx::query_as::<_, Borrowing>(
            r#"
            SELECT
                id, organization_id, book_id, member_id,
                checkout_date, due_date, return_date, status
            FROM borrowings
            WHERE id = ?1 AND organization_id = ?2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(borrowing)
    }

    /// Finds the open loan of a given title by a given member, if any.
    ///
    /// At most one row can match (enforced by the partial unique index).
    pub async fn find_active(
        &self,
        org_id: &str,
        book_id: &str,
        member_id: &str,
    ) -> DbResult<Option<Borrowing>> {
        let borrowing = sqlx::query_as::<_, Borrowing>(
            r#"
            SELECT
                id, organization_id, book_id, member_id,
                checkout_date, due_date, return_date, status
            FROM borrowings
            WHERE organization_id = ?1
              AND book_id = ?2
              AND member_id = ?3
              AND status = 'borrowed'
            "#,
        )
        .bind(org_id)
        .bind(book_id)
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(borrowing)
    }

    /// Lists a member's open loans, soonest due first.
    pub async fn list_active_by_member(
        &self,
        org_id: &str,
        member_id: &str,
    ) -> DbResult<Vec<Borrowing>> {
        let borrowings = sqlx::query_as::<_, Borrowing>(
            r#"
            SELECT
                id, organization_id, book_id, member_id,
                checkout_date, due_date, return_date, status
            FROM borrowings
            WHERE organization_id = ?1
              AND member_id = ?2
              AND status = 'borrowed'
            ORDER BY due_date
            "#,
        )
        .bind(org_id)
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(borrowings)
    }

    /// Lists a member's full loan history, most recent checkout first.
    pub async fn list_by_member(
        &self,
        org_id: &str,
        member_id: &str,
        limit: u32,
    ) -> DbResult<Vec<Borrowing>> {
        let borrowings = sqlx::query_as::<_, Borrowing>(
            r#"
            SELECT
                id, organization_id, book_id, member_id,
                checkout_date, due_date, return_date, status
            FROM borrowings
            WHERE organization_id = ?1 AND member_id = ?2
            ORDER BY checkout_date DESC
            LIMIT ?3
            "#,
        )
        .bind(org_id)
        .bind(member_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(borrowings)
    }

    /// Lists a title's loan history, most recent checkout first.
    pub async fn history_by_book(
        &self,
        org_id: &str,
        book_id: &str,
        limit: u32,
    ) -> DbResult<Vec<Borrowing>> {
        let borrowings = sqlx::query_as::<_, Borrowing>(
            r#"
            SELECT
                id, organization_id, book_id, member_id,
                checkout_date, due_date, return_date, status
            FROM borrowings
            WHERE organization_id = ?1 AND book_id = ?2
            ORDER BY checkout_date DESC
            LIMIT ?3
            "#,
        )
        .bind(org_id)
        .bind(book_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(borrowings)
    }

    /// Lists open loans due inside a window (inclusive on both ends).
    ///
    /// Timestamps are stored as uniform UTC text, so the SQL comparison
    /// matches chronological order.
    pub async fn list_due_between(
        &self,
        org_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<Borrowing>> {
        let borrowings = sqlx::query_as::<_, Borrowing>(
            r#"
            SELECT
                id, organization_id, book_id, member_id,
                checkout_date, due_date, return_date, status
            FROM borrowings
            WHERE organization_id = ?1
              AND status = 'borrowed'
              AND due_date >= ?2
              AND due_date <= ?3
            ORDER BY due_date
            "#,
        )
        .bind(org_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(borrowings)
    }

    /// Lists open loans whose due date lies before `now`, oldest first.
    pub async fn list_overdue(&self, org_id: &str, now: DateTime<Utc>) -> DbResult<Vec<Borrowing>> {
        let borrowings = sqlx::query_as::<_, Borrowing>(
            r#"
            SELECT
                id, organization_id, book_id, member_id,
                checkout_date, due_date, return_date, status
            FROM borrowings
            WHERE organization_id = ?1
              AND status = 'borrowed'
              AND due_date < ?2
            ORDER BY due_date
            "#,
        )
        .bind(org_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(borrowings)
    }

    /// Closes a loan.
    ///
    /// ## Returns
    /// * `Ok(true)` - The loan was open and is now returned
    /// * `Ok(false)` - No open loan matched (unknown ID or already returned)
    pub async fn mark_returned(
        &self,
        org_id: &str,
        id: &str,
        returned_at: DateTime<Utc>,
    ) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        self.mark_returned_in(&mut conn, org_id, id, returned_at).await
    }

    /// Closes a loan on an explicit connection.
    ///
    /// ## Idempotence Guard
    /// `AND status = 'borrowed'` makes the close conditional: a second
    /// check-in of the same loan matches nothing and reports `false`
    /// instead of double-writing `return_date` (and the engine then skips
    /// the stock increment, so a copy can't come back twice).
    pub async fn mark_returned_in(
        &self,
        conn: &mut SqliteConnection,
        org_id: &str,
        id: &str,
        returned_at: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(id = %id, "Marking borrowing returned");

        let result = sqlx::query(
            r#"
            UPDATE borrowings SET
                status = 'returned',
                return_date = ?3
            WHERE id = ?1 AND organization_id = ?2 AND status = 'borrowed'
            "#,
        )
        .bind(id)
        .bind(org_id)
        .bind(returned_at)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Counts open loans (for diagnostics).
    pub async fn count_active(&self, org_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrowings WHERE organization_id = ?1 AND status = 'borrowed'",
        )
        .bind(org_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Deletes ALL loan rows for an organization, open ones included.
    ///
    /// ## Caution
    /// Administrative reset: stock held by members at the time is NOT put
    /// back on the shelf: the rows recording who holds what are gone.
    /// Returns how many rows were deleted.
    pub async fn clear_all(&self, org_id: &str) -> DbResult<u64> {
        debug!(org_id = %org_id, "Clearing all borrowings");

        let result = sqlx::query("DELETE FROM borrowings WHERE organization_id = ?1")
            .bind(org_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
