//! # Domain Types
//!
//! Core domain types used throughout Biblio.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Book       │   │    Borrowing    │   │ CheckoutTxn     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  isbn (business)│   │  book_id (FK)   │   │  customer_id    │       │
//! │  │  stock          │   │  member_id (FK) │   │  payment_method │       │
//! │  │  status         │   │  due_date       │   │  total_amount   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   BookStatus    │   │  BorrowStatus   │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Available      │   │  Borrowed       │   │  Cash / Card    │       │
//! │  │  CheckedOut     │   │  Returned       │   │  Borrow / Rent  │       │
//! │  │  OnHold / Lost  │   └─────────────────┘   │  Return / ...   │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (isbn, email, etc.) - human-readable, potentially mutable
//!
//! ## Tenancy
//! Every persisted entity carries `organization_id`. Operations take an
//! explicit [`OrgContext`] instead of resolving a "current user": the caller
//! states which library or bookstore it is acting for, every time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

// =============================================================================
// Organization Context
// =============================================================================

/// The kind of organization operating this deployment.
///
/// The role decides two circulation rules:
/// - how a loan is labelled on its audit transaction ("Borrow" vs "Rent")
/// - whether loans carry a fee (libraries lend free, bookstores rent at
///   a discount off the list price)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationRole {
    /// Public/school library: free lending, zero-priced catalog.
    Library,
    /// Commercial bookstore: sells and rents titles.
    BookStore,
}

impl OrganizationRole {
    /// The payment-method label written on a loan transaction.
    #[inline]
    pub const fn loan_method(&self) -> PaymentMethod {
        match self {
            OrganizationRole::Library => PaymentMethod::Borrow,
            OrganizationRole::BookStore => PaymentMethod::Rent,
        }
    }

    /// The per-copy fee for lending a title with the given list price.
    ///
    /// Libraries lend free. Bookstores charge the rental price
    /// (list price minus the rent discount).
    pub fn loan_fee(&self, list_price: Money) -> Money {
        match self {
            OrganizationRole::Library => Money::zero(),
            OrganizationRole::BookStore => list_price.rental_price(),
        }
    }
}

/// The organization a core operation acts on behalf of.
///
/// ## Why explicit?
/// The data is multi-tenant: every row is owned by one organization, and
/// every query or mutation must be scoped to it. Passing the context as a
/// parameter (instead of re-resolving an ambient "current user" per call)
/// keeps the scoping visible at every call site and testable without a
/// session provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgContext {
    /// The owning organization's ID (UUID).
    pub organization_id: String,

    /// Library or bookstore; decides loan labelling and fees.
    pub role: OrganizationRole,
}

impl OrgContext {
    /// Creates a context for the given organization and role.
    pub fn new(organization_id: impl Into<String>, role: OrganizationRole) -> Self {
        OrgContext {
            organization_id: organization_id.into(),
            role,
        }
    }

    /// Creates a library context.
    pub fn library(organization_id: impl Into<String>) -> Self {
        OrgContext::new(organization_id, OrganizationRole::Library)
    }

    /// Creates a bookstore context.
    pub fn book_store(organization_id: impl Into<String>) -> Self {
        OrgContext::new(organization_id, OrganizationRole::BookStore)
    }

    /// Whether this organization lends free of charge.
    #[inline]
    pub fn is_library(&self) -> bool {
        self.role == OrganizationRole::Library
    }
}

// =============================================================================
// Genre
// =============================================================================

/// The closed set of catalog categories.
///
/// Stored as snake_case text (`science_fiction`, `true_crime`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum Genre {
    Fiction,
    LiteraryFiction,
    HistoricalFiction,
    ScienceFiction,
    Fantasy,
    Mystery,
    Thriller,
    Horror,
    Romance,
    Western,
    Crime,
    Adventure,
    Dystopian,
    Paranormal,
    Mythology,
    FairyTale,
    ShortStories,
    Anthology,
    Classics,
    Satire,
    Humor,
    Drama,
    Poetry,
    GraphicNovel,
    Comics,
    YoungAdult,
    Children,
    PictureBook,
    Nonfiction,
    Biography,
    Autobiography,
    Memoir,
    History,
    Philosophy,
    Psychology,
    SelfHelp,
    Health,
    Fitness,
    Cooking,
    Travel,
    TrueCrime,
    Science,
    Mathematics,
    Technology,
    Engineering,
    Computers,
    Business,
    Economics,
    Finance,
    Law,
    Politics,
    Sociology,
    Education,
    Religion,
    Spirituality,
    Art,
    Photography,
    Music,
    Film,
    Sports,
    Nature,
    Gardening,
    Crafts,
    Parenting,
    Reference,
}

impl Default for Genre {
    fn default() -> Self {
        Genre::Fiction
    }
}

// =============================================================================
// Book Status
// =============================================================================

/// The shelf status of a book title.
///
/// ## Two kinds of status
/// - `Available` / `CheckedOut` are **ledger-driven**: the inventory ledger
///   writes them on every stock mutation, coupled to the stock crossing the
///   zero boundary.
/// - `OnHold`, `Processing`, `Lost`, `OutOfStock` are **administrator-set**:
///   circulation neither transitions into them nor treats them specially
///   (a Lost book with stock 0 looks identical to a checked-out one here).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    /// At least one copy is on the shelf.
    Available,
    /// All copies are out with members.
    CheckedOut,
    /// Held for a member (administrator-set).
    OnHold,
    /// Being catalogued or repaired (administrator-set).
    Processing,
    /// Missing from the shelf (administrator-set).
    Lost,
    /// Sold out, not expected back (administrator-set).
    OutOfStock,
}

impl BookStatus {
    /// The status the inventory ledger writes after a stock mutation.
    ///
    /// This is the stock/status coupling rule: positive stock means
    /// `Available`, zero means `CheckedOut`. The ledger's SQL repeats this
    /// rule inside the conditional UPDATE so the pair changes in one
    /// statement; this function is the authoritative in-process statement
    /// of the same rule.
    #[inline]
    pub const fn for_stock(stock: i64) -> Self {
        if stock > 0 {
            BookStatus::Available
        } else {
            BookStatus::CheckedOut
        }
    }
}

impl Default for BookStatus {
    fn default() -> Self {
        BookStatus::Available
    }
}

// =============================================================================
// Book
// =============================================================================

/// A catalog title (copies are counted, not serialized).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Organization this book belongs to.
    pub organization_id: String,

    /// Display title shown in catalog and on audit rows.
    pub title: String,

    /// Author name (free text, not an entity).
    pub author: String,

    /// ISBN - business identifier.
    pub isbn: String,

    /// Catalog category (closed set).
    pub category: Genre,

    /// Publication year, if known.
    pub publication_year: Option<i32>,

    pub publisher: Option<String>,

    pub description: Option<String>,

    /// List price in cents. Always 0 for library organizations.
    pub price_cents: i64,

    /// Copies currently on the shelf. Never negative.
    pub stock: i64,

    /// Shelf status; coupled to `stock` by the inventory ledger.
    pub status: BookStatus,

    /// Cover image URL or path.
    pub cover_image: Option<String>,

    /// Shelf location (e.g. "A-3").
    pub location: Option<String>,

    pub language: Option<String>,

    pub page_count: Option<i64>,

    /// Free-form labels, stored as a JSON array in the record store.
    pub tags: Vec<String>,

    /// Copies sold (purchases only; loans do not count).
    pub sales_count: i64,

    /// When the book was created.
    pub created_at: DateTime<Utc>,

    /// When the book was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Returns the list price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the rental price (list price minus the rent discount).
    #[inline]
    pub fn rental_price(&self) -> Money {
        self.price().rental_price()
    }

    /// Whether at least one copy is on the shelf.
    #[inline]
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Whether the shelf holds enough copies for the requested quantity.
    ///
    /// Callers filter on this before checkout; the ledger re-validates
    /// atomically at the storage layer, so passing here is not a guarantee.
    pub fn can_fulfill(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

/// Input for creating a catalog title. The record store assigns id,
/// timestamps, a zero sales count, and the stock-derived status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: Genre,
    pub publication_year: Option<i32>,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    pub cover_image: Option<String>,
    pub location: Option<String>,
    pub language: Option<String>,
    pub page_count: Option<i64>,
    pub tags: Vec<String>,
}

impl NewBook {
    /// Creates a minimal new-book input; optional fields default to empty.
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: impl Into<String>,
        category: Genre,
        price_cents: i64,
        stock: i64,
    ) -> Self {
        NewBook {
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
            category,
            publication_year: None,
            publisher: None,
            description: None,
            price_cents,
            stock,
            cover_image: None,
            location: None,
            language: None,
            page_count: None,
            tags: Vec::new(),
        }
    }

    /// Applies the organization's pricing rule: library catalogs carry no
    /// prices, so a library context forces the price to zero.
    pub fn priced_for(mut self, ctx: &OrgContext) -> Self {
        if ctx.is_library() {
            self.price_cents = 0;
        }
        self
    }
}

// =============================================================================
// Member
// =============================================================================

/// A member's standing with the organization.
///
/// Standing is administrative: the checkout path does not consult it, so a
/// suspended or banned member can still borrow and purchase. Gating on
/// standing is a desk policy decision, not something this engine imposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Active,
    Inactive,
    Suspended,
    Banned,
}

impl Default for MemberStatus {
    fn default() -> Self {
        MemberStatus::Active
    }
}

/// A person patronizing the library or store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Member {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub status: MemberStatus,
    pub joined_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMember {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl NewMember {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        NewMember {
            name: name.into(),
            email: email.into(),
            phone: None,
            address: None,
        }
    }
}

// =============================================================================
// Borrowing
// =============================================================================

/// Whether a loan is open or closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum BorrowStatus {
    /// Open loan; the member holds the copy.
    Borrowed,
    /// Closed loan; the copy came back.
    Returned,
}

/// One loan of one book title to one member, open until returned.
///
/// ## Invariant
/// For a given (book, member) pair at most one row is `Borrowed` at a time.
/// The record store enforces this with a partial unique index, so the
/// invariant holds even under concurrent checkouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Borrowing {
    pub id: String,
    pub organization_id: String,
    pub book_id: String,
    pub member_id: String,
    pub checkout_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    /// Set exactly once, when the loan closes.
    pub return_date: Option<DateTime<Utc>>,
    pub status: BorrowStatus,
}

impl Borrowing {
    /// Whether the loan is open and past its due date.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == BorrowStatus::Borrowed && self.due_date < now
    }
}

// =============================================================================
// Due-Date Policy
// =============================================================================

/// How a checkout's due date is chosen.
///
/// The standard presets are 15, 20, or 30 days from checkout; a custom date
/// must not lie in the past (validated by the circulation engine before any
/// store call). There is no grace period beyond what the caller requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuePolicy {
    Days15,
    Days20,
    Days30,
    /// An explicit due date chosen by the desk.
    Custom(DateTime<Utc>),
}

impl DuePolicy {
    /// Resolves the policy to a concrete due date, counting from `from`.
    pub fn resolve(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            DuePolicy::Days15 => from + Duration::days(15),
            DuePolicy::Days20 => from + Duration::days(20),
            DuePolicy::Days30 => from + Duration::days(30),
            DuePolicy::Custom(date) => *date,
        }
    }
}

impl Default for DuePolicy {
    fn default() -> Self {
        DuePolicy::Days15
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a checkout transaction was settled (or, for circulation events,
/// which kind of event it records).
///
/// Stored as its display label so the audit table reads naturally and
/// free-form labels survive round trips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on external terminal.
    Card,
    /// Bank transfer (invoiced sales).
    BankTransfer,
    /// Free library loan (audit marker, no money moved).
    Borrow,
    /// Paid bookstore loan at the rental price.
    Rent,
    /// Loan closure (audit marker, no money moved).
    Return,
    /// Free-form label from older data or external imports.
    Other(String),
}

impl PaymentMethod {
    /// The canonical label written to the record store.
    pub fn as_str(&self) -> &str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::BankTransfer => "Bank Transfer",
            PaymentMethod::Borrow => "Borrow",
            PaymentMethod::Rent => "Rent",
            PaymentMethod::Return => "Return",
            PaymentMethod::Other(label) => label,
        }
    }

    /// Whether this method settles money (as opposed to marking a
    /// circulation event). Free-form labels are assumed commercial.
    pub fn is_settlement(&self) -> bool {
        matches!(
            self,
            PaymentMethod::Cash
                | PaymentMethod::Card
                | PaymentMethod::BankTransfer
                | PaymentMethod::Other(_)
        )
    }
}

impl From<String> for PaymentMethod {
    fn from(label: String) -> Self {
        match label.to_lowercase().as_str() {
            "cash" => PaymentMethod::Cash,
            "card" => PaymentMethod::Card,
            "bank transfer" | "bank_transfer" => PaymentMethod::BankTransfer,
            "borrow" => PaymentMethod::Borrow,
            "rent" => PaymentMethod::Rent,
            "return" => PaymentMethod::Return,
            _ => PaymentMethod::Other(label),
        }
    }
}

impl From<PaymentMethod> for String {
    fn from(method: PaymentMethod) -> Self {
        method.as_str().to_string()
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Checkout Transaction
// =============================================================================

/// Lifecycle state of an audit transaction.
///
/// The trail is append-only: a transaction is written `Completed` and never
/// voided, refunded in place, or deleted. Corrections are new transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Completed,
}

impl Default for TransactionStatus {
    fn default() -> Self {
        TransactionStatus::Completed
    }
}

/// An immutable record of one commercial/circulation event: one purchase,
/// one loan, or one return.
///
/// A "Return" transaction is distinct from the loan it closes; they are
/// linked only implicitly by book, member, and date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutTransaction {
    pub id: String,
    pub organization_id: String,
    /// The member the event belongs to ("customer" in commerce terms).
    pub customer_id: String,
    pub status: TransactionStatus,
    pub payment_method: PaymentMethod,
    /// Σ(line price × quantity) for purchases; 0 for free loans and returns;
    /// the precomputed rent fee for paid loans.
    pub total_amount_cents: i64,
    pub date: DateTime<Utc>,
    /// Human-readable annotation (e.g. `Returned: <title>` on returns).
    pub notes: Option<String>,
}

impl CheckoutTransaction {
    /// Returns the transaction total as Money.
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }
}

// =============================================================================
// Checkout Item
// =============================================================================

/// A line item of a checkout transaction.
/// Uses the snapshot pattern to freeze book data at transaction time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CheckoutItem {
    pub id: String,
    pub transaction_id: String,
    /// The book, if it still exists; audit rows outlive catalog deletions.
    pub book_id: Option<String>,
    /// Title at transaction time (frozen).
    pub title_snapshot: String,
    /// Unit price in cents at transaction time (frozen).
    pub unit_price_cents: i64,
    /// Copies in this line.
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

impl CheckoutItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Line total (unit price × quantity).
    #[inline]
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }
}

/// Input line for the transaction recorder: the caller snapshots title and
/// price before recording, and the recorder persists them verbatim. The
/// recorder never reads the live Book row, so later price edits cannot leak
/// into the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSnapshot {
    pub book_id: Option<String>,
    pub title: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
}

impl LineSnapshot {
    /// Snapshots a book at its current list price.
    pub fn of_book(book: &Book, quantity: i64) -> Self {
        LineSnapshot {
            book_id: Some(book.id.clone()),
            title: book.title.clone(),
            unit_price_cents: book.price_cents,
            quantity,
        }
    }

    /// Line total (unit price × quantity).
    #[inline]
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_for_stock_boundary() {
        assert_eq!(BookStatus::for_stock(5), BookStatus::Available);
        assert_eq!(BookStatus::for_stock(1), BookStatus::Available);
        assert_eq!(BookStatus::for_stock(0), BookStatus::CheckedOut);
    }

    #[test]
    fn test_payment_method_labels_round_trip() {
        let methods = [
            PaymentMethod::Cash,
            PaymentMethod::Card,
            PaymentMethod::BankTransfer,
            PaymentMethod::Borrow,
            PaymentMethod::Rent,
            PaymentMethod::Return,
            PaymentMethod::Other("Store Credit".to_string()),
        ];
        for method in methods {
            let label = String::from(method.clone());
            assert_eq!(PaymentMethod::from(label), method);
        }
    }

    #[test]
    fn test_payment_method_settlement_split() {
        assert!(PaymentMethod::Cash.is_settlement());
        assert!(PaymentMethod::Other("Voucher".to_string()).is_settlement());
        assert!(!PaymentMethod::Borrow.is_settlement());
        assert!(!PaymentMethod::Rent.is_settlement());
        assert!(!PaymentMethod::Return.is_settlement());
    }

    #[test]
    fn test_due_policy_presets() {
        let now = Utc::now();
        assert_eq!(DuePolicy::Days15.resolve(now), now + Duration::days(15));
        assert_eq!(DuePolicy::Days20.resolve(now), now + Duration::days(20));
        assert_eq!(DuePolicy::Days30.resolve(now), now + Duration::days(30));

        let custom = now + Duration::days(7);
        assert_eq!(DuePolicy::Custom(custom).resolve(now), custom);
        assert_eq!(DuePolicy::default(), DuePolicy::Days15);
    }

    #[test]
    fn test_role_loan_rules() {
        assert_eq!(
            OrganizationRole::Library.loan_method(),
            PaymentMethod::Borrow
        );
        assert_eq!(OrganizationRole::BookStore.loan_method(), PaymentMethod::Rent);

        let list = Money::from_cents(2500);
        assert_eq!(OrganizationRole::Library.loan_fee(list), Money::zero());
        assert_eq!(
            OrganizationRole::BookStore.loan_fee(list),
            Money::from_cents(1500)
        );
    }

    #[test]
    fn test_library_pricing_forced_to_zero() {
        let ctx = OrgContext::library("org-1");
        let book = NewBook::new("Dune", "Frank Herbert", "9780441172719", Genre::ScienceFiction, 2500, 3)
            .priced_for(&ctx);
        assert_eq!(book.price_cents, 0);

        let store_ctx = OrgContext::book_store("org-2");
        let book = NewBook::new("Dune", "Frank Herbert", "9780441172719", Genre::ScienceFiction, 2500, 3)
            .priced_for(&store_ctx);
        assert_eq!(book.price_cents, 2500);
    }

    #[test]
    fn test_borrowing_overdue() {
        let now = Utc::now();
        let mut borrowing = Borrowing {
            id: "b-1".to_string(),
            organization_id: "org-1".to_string(),
            book_id: "book-1".to_string(),
            member_id: "member-1".to_string(),
            checkout_date: now - Duration::days(20),
            due_date: now - Duration::days(5),
            return_date: None,
            status: BorrowStatus::Borrowed,
        };
        assert!(borrowing.is_overdue(now));

        // Closed loans are never overdue, however late they went back.
        borrowing.status = BorrowStatus::Returned;
        assert!(!borrowing.is_overdue(now));
    }
}
