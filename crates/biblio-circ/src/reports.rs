//! # Circulation Reports
//!
//! Read-only projections over open loans for the reporting screens:
//! what a member holds, what comes due soon, what is already late.
//!
//! None of these touch the write path; they are date-filtered queries
//! against the borrowings table, evaluated at call time.

use biblio_core::{Borrowing, OrgContext, ValidationError};
use chrono::{Duration, Utc};
use biblio_db::Database;

use crate::error::CircResult;

/// Read-only loan queries for reporting.
#[derive(Debug, Clone)]
pub struct CirculationReports {
    db: Database,
}

impl CirculationReports {
    /// Creates a reports handle over the given database.
    pub fn new(db: Database) -> Self {
        CirculationReports { db }
    }

    /// A member's open loans, soonest due first.
    ///
    /// An unknown member simply has no open loans; this never errors on
    /// the member ID.
    pub async fn borrowings_for_member(
        &self,
        ctx: &OrgContext,
        member_id: &str,
    ) -> CircResult<Vec<Borrowing>> {
        let loans = self
            .db
            .borrowings()
            .list_active_by_member(&ctx.organization_id, member_id)
            .await?;
        Ok(loans)
    }

    /// Open loans due within the next `window_days` days, due date between
    /// now and now + window inclusive. Loans already overdue are not in
    /// this list; they belong to [`overdue`](Self::overdue).
    ///
    /// ## Errors
    /// - `Validation` if `window_days` is zero or negative
    pub async fn due_soon(&self, ctx: &OrgContext, window_days: i64) -> CircResult<Vec<Borrowing>> {
        if window_days <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "window_days".to_string(),
            }
            .into());
        }

        let now = Utc::now();
        let loans = self
            .db
            .borrowings()
            .list_due_between(&ctx.organization_id, now, now + Duration::days(window_days))
            .await?;
        Ok(loans)
    }

    /// Open loans whose due date has passed, most overdue first.
    pub async fn overdue(&self, ctx: &OrgContext) -> CircResult<Vec<Borrowing>> {
        let loans = self
            .db
            .borrowings()
            .list_overdue(&ctx.organization_id, Utc::now())
            .await?;
        Ok(loans)
    }
}

// =============================================================================
// Tests
// =============================================================================
