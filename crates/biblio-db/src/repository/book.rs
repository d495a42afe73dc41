//! # Book Repository
//!
//! Database operations for catalog titles.
//!
//! ## Key Operations
//! - Catalog CRUD and LIKE search
//! - Atomic stock movements (the inventory ledger's storage primitives)
//! - Sales counter maintenance
//!
//! ## Conditional Stock Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              How Oversell Is Prevented At The Storage Layer             │
//! │                                                                         │
//! │  Two desks check out the last copy of the same title at once:          │
//! │                                                                         │
//! │  Desk A ──► UPDATE books SET stock = stock - 1, ...                    │
//! │             WHERE id = ? AND stock >= 1        ← guard in the WHERE    │
//! │                                                                         │
//! │  Desk B ──► same statement, a moment later                             │
//! │                                                                         │
//! │  SQLite serializes the writes. Exactly one UPDATE matches the row      │
//! │  (rows_affected = 1); the other finds stock already 0 and matches      │
//! │  nothing (rows_affected = 0). No read-modify-write gap exists, so      │
//! │  stock can never go negative; the CHECK (stock >= 0) constraint        │
//! │  is a backstop that should never fire.                                 │
//! │                                                                         │
//! │  The same statement folds the status flip in:                          │
//! │    status = CASE WHEN stock - n > 0 THEN 'available'                   │
//! │                  ELSE 'checked_out' END                                │
//! │  so stock and status always change together or not at all.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use biblio_core::{Book, BookStatus, Genre, NewBook, OrgContext};

/// Repository for book database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = BookRepository::new(pool);
///
/// // Search the catalog
/// let results = repo.search(org_id, "tolkien", 20).await?;
///
/// // Atomic checkout-side stock movement
/// let taken = repo.decrement_stock(org_id, book_id, 1).await?;
/// ```
#[derive(Debug, Clone)]
pub struct BookRepository {
    pool: SqlitePool,
}

impl BookRepository {
    /// Creates a new BookRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookRepository { pool }
    }

    /// Inserts a new catalog title.
    ///
    /// ## What The Store Assigns
    /// - `id`: fresh UUID v4
    /// - `status`: derived from the initial stock (positive → available)
    /// - `sales_count`: 0
    /// - `created_at` / `updated_at`: now
    ///
    /// The organization's pricing rule is applied first: a library context
    /// forces the list price to zero.
    ///
    /// ## Returns
    /// * `Ok(Book)` - The stored book with all assigned fields
    /// * `Err(DbError::UniqueViolation)` - ISBN already exists in this organization
    pub async fn insert(&self, ctx: &OrgContext, new_book: NewBook) -> DbResult<Book> {
        let new_book = new_book.priced_for(ctx);
        let now = Utc::now();

        debug!(title = %new_book.title, isbn = %new_book.isbn, "Inserting book");

        let book = Book {
            id: Uuid::new_v4().to_string(),
            organization_id: ctx.organization_id.clone(),
            title: new_book.title,
            author: new_book.author,
            isbn: new_book.isbn,
            category: new_book.category,
            publication_year: new_book.publication_year,
            publisher: new_book.publisher,
            description: new_book.description,
            price_cents: new_book.price_cents,
            stock: new_book.stock,
            status: BookStatus::for_stock(new_book.stock),
            cover_image: new_book.cover_image,
            location: new_book.location,
            language: new_book.language,
            page_count: new_book.page_count,
            tags: new_book.tags,
            sales_count: 0,
            created_at: now,
            updated_at: now,
        };

        let tags_json = serde_json::to_string(&book.tags)
            .map_err(|e| DbError::conversion("Book", format!("tags column: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO books (
                id, organization_id, title, author, isbn, category,
                publication_year, publisher, description,
                price_cents, stock, status,
                cover_image, location, language, page_count, tags,
                sales_count, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9,
                ?10, ?11, ?12,
                ?13, ?14, ?15, ?16, ?17,
                ?18, ?19, ?20
            )
            "#,
        )
        .bind(&book.id)
        .bind(&book.organization_id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(book.category)
        .bind(book.publication_year)
        .bind(&book.publisher)
        .bind(&book.description)
        .bind(book.price_cents)
        .bind(book.stock)
        .bind(book.status)
        .bind(&book.cover_image)
        .bind(&book.location)
        .bind(&book.language)
        .bind(book.page_count)
        .bind(&tags_json)
        .bind(book.sales_count)
        .bind(book.created_at)
        .bind(book.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(book)
    }

    /// Gets a book by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Book))` - Book found in this organization
    /// * `Ok(None)` - No such book (or it belongs to another organization)
    pub async fn get(&self, org_id: &str, id: &str) -> DbResult<Option<Book>> {
        let mut conn = self.pool.acquire().await?;
        self.get_in(&mut conn, org_id, id).await
    }

    /// Gets a book by ID on an explicit connection.
    ///
    /// ## Usage
    /// The circulation engine calls this inside an open transaction to
    /// re-read a row after a conditional update missed, so the read sees
    /// the transaction's own view.
    pub async fn get_in(
        &self,
        conn: &mut SqliteConnection,
        org_id: &str,
        id: &str,
    ) -> DbResult<Option<Book>> {
        let row = sqlx::query_as::<_, BookRow>(
            r#"
            SELECT
                id, organization_id, title, author, isbn, category,
                publication_year, publisher, description,
                price_cents, stock, status,
                cover_image, location, language, page_count, tags,
                sales_count, created_at, updated_at
            FROM books
            WHERE id = ?1 AND organization_id = ?2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .fetch_optional(&mut *conn)
        .await?;

        row.map(BookRow::into_book).transpose()
    }

    /// Gets a book by its ISBN (the business identifier).
    pub async fn get_by_isbn(&self, org_id: &str, isbn: &str) -> DbResult<Option<Book>> {
        let row = sqlx::query_as::<_, BookRow>(
            r#"
            SELECT
                id, organization_id, title, author, isbn, category,
                publication_year, publisher, description,
                price_cents, stock, status,
                cover_image, location, language, page_count, tags,
                sales_count, created_at, updated_at
            FROM books
            WHERE organization_id = ?1 AND isbn = ?2
            "#,
        )
        .bind(org_id)
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await?;

        row.map(BookRow::into_book).transpose()
    }

    /// Searches the catalog by title, author, or ISBN.
    ///
    /// ## How It Works
    /// - Substring match (`LIKE %term%`) across the three columns
    /// - Case-insensitive for ASCII (SQLite LIKE default)
    /// - Empty query returns the plain catalog listing
    ///
    /// ## Arguments
    /// * `query` - Search term (can be partial)
    /// * `limit` - Maximum results to return
    ///
    /// ## Example
    /// ```rust,ignore
    /// let hits = repo.search(org_id, "le guin", 20).await?;
    /// ```
    pub async fn search(&self, org_id: &str, query: &str, limit: u32) -> DbResult<Vec<Book>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching books");

        if query.is_empty() {
            return self.list(org_id, limit).await;
        }

        let pattern = format!("%{}%", query);

        let rows = sqlx::query_as::<_, BookRow>(
            r#"
            SELECT
                id, organization_id, title, author, isbn, category,
                publication_year, publisher, description,
                price_cents, stock, status,
                cover_image, location, language, page_count, tags,
                sales_count, created_at, updated_at
            FROM books
            WHERE organization_id = ?1
              AND (title LIKE ?2 OR author LIKE ?2 OR isbn LIKE ?2)
            ORDER BY title
            LIMIT ?3
            "#,
        )
        .bind(org_id)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Search returned books");

        rows.into_iter().map(BookRow::into_book).collect()
    }

    /// Lists catalog titles sorted by title.
    pub async fn list(&self, org_id: &str, limit: u32) -> DbResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, BookRow>(
            r#"
            SELECT
                id, organization_id, title, author, isbn, category,
                publication_year, publisher, description,
                price_cents, stock, status,
                cover_image, location, language, page_count, tags,
                sales_count, created_at, updated_at
            FROM books
            WHERE organization_id = ?1
            ORDER BY title
            LIMIT ?2
            "#,
        )
        .bind(org_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BookRow::into_book).collect()
    }

    /// Updates a book's catalog fields.
    ///
    /// ## Ledger-Owned Columns
    /// `stock`, `status`, and `sales_count` are deliberately NOT written
    /// here. They belong to the inventory ledger (`decrement_stock`,
    /// `increment_stock`, `bump_sales_count`); letting a catalog edit
    /// overwrite them would race against concurrent checkouts.
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(DbError::NotFound)` - Book doesn't exist in this organization
    pub async fn update(&self, book: &Book) -> DbResult<()> {
        debug!(id = %book.id, "Updating book");

        let now = Utc::now();

        let tags_json = serde_json::to_string(&book.tags)
            .map_err(|e| DbError::conversion("Book", format!("tags column: {}", e)))?;

        let result = sqlx::query(
            r#"
            UPDATE books SET
                title = ?3,
                author = ?4,
                isbn = ?5,
                category = ?6,
                publication_year = ?7,
                publisher = ?8,
                description = ?9,
                price_cents = ?10,
                cover_image = ?11,
                location = ?12,
                language = ?13,
                page_count = ?14,
                tags = ?15,
                updated_at = ?16
            WHERE id = ?1 AND organization_id = ?2
            "#,
        )
        .bind(&book.id)
        .bind(&book.organization_id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(book.category)
        .bind(book.publication_year)
        .bind(&book.publisher)
        .bind(&book.description)
        .bind(book.price_cents)
        .bind(&book.cover_image)
        .bind(&book.location)
        .bind(&book.language)
        .bind(book.page_count)
        .bind(&tags_json)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Book", &book.id));
        }

        Ok(())
    }

    /// Deletes a book from the catalog.
    ///
    /// ## Audit Trail
    /// Checkout items carry frozen title/price snapshots and no foreign key,
    /// so past transactions survive the deletion. Borrowing rows DO hold a
    /// foreign key: a title with loan history cannot be deleted and the call
    /// returns `DbError::ForeignKeyViolation`.
    pub async fn delete(&self, org_id: &str, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting book");

        let result = sqlx::query("DELETE FROM books WHERE id = ?1 AND organization_id = ?2")
            .bind(id)
            .bind(org_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Book", id));
        }

        Ok(())
    }

    /// Atomically takes `quantity` copies off the shelf.
    ///
    /// ## Returns
    /// * `Ok(true)` - Stock was sufficient; stock and status updated together
    /// * `Ok(false)` - No row matched: book missing OR stock insufficient
    ///   (the caller re-reads the row to tell the two apart)
    pub async fn decrement_stock(&self, org_id: &str, id: &str, quantity: i64) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        self.decrement_stock_in(&mut conn, org_id, id, quantity).await
    }

    /// Conditional stock decrement on an explicit connection.
    ///
    /// ## The Guard
    /// `WHERE ... AND stock >= ?quantity` makes the read and the write one
    /// statement: under concurrent checkouts of the last copy, exactly one
    /// caller sees `rows_affected = 1`. The same statement flips `status`
    /// to `checked_out` when the decrement lands on zero.
    ///
    /// ## Arguments
    /// * `conn` - Connection or open transaction to run on
    /// * `quantity` - Copies to take (validated positive by the caller)
    pub async fn decrement_stock_in(
        &self,
        conn: &mut SqliteConnection,
        org_id: &str,
        id: &str,
        quantity: i64,
    ) -> DbResult<bool> {
        debug!(id = %id, quantity = %quantity, "Decrementing stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE books SET
                stock = stock - ?3,
                status = CASE WHEN stock - ?3 > 0 THEN 'available' ELSE 'checked_out' END,
                updated_at = ?4
            WHERE id = ?1 AND organization_id = ?2 AND stock >= ?3
            "#,
        )
        .bind(id)
        .bind(org_id)
        .bind(quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Puts `quantity` copies back on the shelf.
    ///
    /// ## Returns
    /// * `Ok(true)` - Stock incremented; status is now `available`
    /// * `Ok(false)` - Book doesn't exist in this organization
    pub async fn increment_stock(&self, org_id: &str, id: &str, quantity: i64) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        self.increment_stock_in(&mut conn, org_id, id, quantity).await
    }

    /// Stock increment on an explicit connection.
    ///
    /// Stock becomes positive by construction, so status is written
    /// `available` unconditionally: even if an administrator had marked
    /// the title `lost` or `on_hold`, a returned copy puts it back in
    /// circulation.
    pub async fn increment_stock_in(
        &self,
        conn: &mut SqliteConnection,
        org_id: &str,
        id: &str,
        quantity: i64,
    ) -> DbResult<bool> {
        debug!(id = %id, quantity = %quantity, "Incrementing stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE books SET
                stock = stock + ?3,
                status = 'available',
                updated_at = ?4
            WHERE id = ?1 AND organization_id = ?2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .bind(quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Adds sold copies to a book's sales counter.
    ///
    /// Purchases only; loans never touch this number.
    pub async fn bump_sales_count(&self, org_id: &str, id: &str, quantity: i64) -> DbResult<()> {
        debug!(id = %id, quantity = %quantity, "Bumping sales count");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE books SET
                sales_count = sales_count + ?3,
                updated_at = ?4
            WHERE id = ?1 AND organization_id = ?2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .bind(quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Book", id));
        }

        Ok(())
    }

    /// Counts catalog titles (for diagnostics and seed checks).
    pub async fn count(&self, org_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE organization_id = ?1")
                .bind(org_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

/// Raw row shape for the books table.
///
/// `tags` is stored as a JSON array in a TEXT column, so the row can't be
/// decoded straight into [`Book`]; this intermediate carries the raw string
/// and `into_book` does the parse.
#[derive(Debug, sqlx::FromRow)]
struct BookRow {
    id: String,
    organization_id: String,
    title: String,
    author: String,
    isbn: String,
    category: Genre,
    publication_year: Option<i32>,
    publisher: Option<String>,
    description: Option<String>,
    price_cents: i64,
    stock: i64,
    status: BookStatus,
    cover_image: Option<String>,
    location: Option<String>,
    language: Option<String>,
    page_count: Option<i64>,
    tags: String,
    sales_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookRow {
    /// Maps the raw row into the domain type.
    ///
    /// ## Errors
    /// `DbError::Conversion` if the tags column holds malformed JSON
    /// (only possible if something other than this repository wrote it).
    fn into_book(self) -> DbResult<Book> {
        let tags: Vec<String> = serde_json::from_str(&self.tags)
            .map_err(|e| DbError::conversion("Book", format!("tags column: {}", e)))?;

        Ok(Book {
            id: self.id,
            organization_id: self.organization_id,
            title: self.title,
            author: self.author,
            isbn: self.isbn,
            category: self.category,
            publication_year: self.publication_year,
            publisher: self.publisher,
            description: self.description,
            price_cents: self.price_cents,
            stock: self.stock,
            status: self.status,
            cover_image: self.cover_image,
            location: self.location,
            language: self.language,
            page_count: self.page_count,
            tags,
            sales_count: self.sales_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
