//! # Repository Module
//!
//! Database repository implementations for Biblio.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Circulation call                                                       │
//! │       │                                                                 │
//! │       │  db.books().search(org_id, "tolkien", 20)                      │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  BookRepository                                                        │
//! │  ├── search(&self, org_id, query, limit)                               │
//! │  ├── get(&self, org_id, id)                                            │
//! │  ├── insert(&self, ctx, new_book)                                      │
//! │  └── decrement_stock(&self, org_id, id, quantity)                      │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • Easy to test (queries isolated in one place)                        │
//! │  • Row <-> domain mapping lives next to the SQL that produces it       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transaction-Scoped Variants
//! Repositories expose two flavors of the circulation-critical writes:
//! plain methods that run against the pool, and `*_in` variants that take a
//! `&mut SqliteConnection` so the circulation engine can group several
//! writes into one atomic SQLite transaction.
//!
//! ## Available Repositories
//!
//! - [`book::BookRepository`] - Catalog CRUD, search, and atomic stock movements
//! - [`member::MemberRepository`] - Member registration and lookup
//! - [`borrowing::BorrowingRepository`] - Loan rows and due-date windows
//! - [`transaction::TransactionRepository`] - Append-only audit trail

pub mod book;
pub mod borrowing;
pub mod member;
pub mod transaction;
