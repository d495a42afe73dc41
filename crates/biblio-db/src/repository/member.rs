//! # Member Repository
//!
//! Database operations for members (library patrons / bookstore customers).
//!
//! ## Identity
//! Members follow the dual-key pattern: UUID `id` for relations, unique
//! `email` per organization as the business identifier.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use biblio_core::{Member, MemberStatus, NewMember, OrgContext};

/// Repository for member database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = MemberRepository::new(pool);
///
/// let member = repo.insert(&ctx, NewMember::new("Ada", "ada@example.com")).await?;
/// let found = repo.get_by_email(org_id, "ada@example.com").await?;
/// ```
#[derive(Debug, Clone)]
pub struct MemberRepository {
    pool: SqlitePool,
}

impl MemberRepository {
    /// Creates a new MemberRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MemberRepository { pool }
    }

    /// Registers a new member.
    ///
    /// ## What The Store Assigns
    /// - `id`: fresh UUID v4
    /// - `status`: Active
    /// - `joined_date` / `created_at` / `updated_at`: now
    ///
    /// ## Returns
    /// * `Ok(Member)` - The stored member with all assigned fields
    /// * `Err(DbError::UniqueViolation)` - Email already registered here
    pub async fn insert(&self, ctx: &OrgContext, new_member: NewMember) -> DbResult<Member> {
        let now = Utc::now();

        debug!(name = %new_member.name, email = %new_member.email, "Inserting member");

        let member = Member {
            id: Uuid::new_v4().to_string(),
            organization_id: ctx.organization_id.clone(),
            name: new_member.name,
            email: new_member.email,
            phone: new_member.phone,
            address: new_member.address,
            status: MemberStatus::Active,
            joined_date: now,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO members (
                id, organization_id, name, email, phone, address,
                status, joined_date, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10
            )
            "#,
        )
        .bind(&member.id)
        .bind(&member.organization_id)
        .bind(&member.name)
        .bind(&member.email)
        .bind(&member.phone)
        .bind(&member.address)
        .bind(member.status)
        .bind(member.joined_date)
        .bind(member.created_at)
        .bind(member.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(member)
    }

    /// Gets a member by ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Member))` - Member found in this organization
    /// * `Ok(None)` - No such member here
    pub async fn get(&self, org_id: &str, id: &str) -> DbResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            SELECT
                id, organization_id, name, email, phone, address,
                status, joined_date, created_at, updated_at
            FROM members
            WHERE id = ?1 AND organization_id = ?2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    /// Gets a member by email (the business identifier).
    pub async fn get_by_email(&self, org_id: &str, email: &str) -> DbResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            SELECT
                id, organization_id, name, email, phone, address,
                status, joined_date, created_at, updated_at
            FROM members
            WHERE organization_id = ?1 AND email = ?2
            "#,
        )
        .bind(org_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    /// Lists members sorted by name.
    pub async fn list(&self, org_id: &str, limit: u32) -> DbResult<Vec<Member>> {
        let members = sqlx::query_as::<_, Member>(
            r#"
            SELECT
                id, organization_id, name, email, phone, address,
                status, joined_date, created_at, updated_at
            FROM members
            WHERE organization_id = ?1
            ORDER BY name
            LIMIT ?2
            "#,
        )
        .bind(org_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// Sets a member's standing (suspend, ban, reactivate).
    ///
    /// Standing is administrative metadata: circulation does not consult
    /// it, so this never blocks an in-flight checkout.
    pub async fn set_status(&self, org_id: &str, id: &str, status: MemberStatus) -> DbResult<()> {
        debug!(id = %id, status = ?status, "Setting member status");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE members SET
                status = ?3,
                updated_at = ?4
            WHERE id = ?1 AND organization_id = ?2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .bind(status)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Member", id));
        }

        Ok(())
    }

    /// Counts members (for diagnostics and seed checks).
    pub async fn count(&self, org_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM members WHERE organization_id = ?1")
                .bind(org_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
