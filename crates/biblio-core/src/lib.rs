//! # biblio-core: Pure Domain Logic for Biblio
//!
//! This crate is the **heart** of Biblio. It contains all circulation and
//! inventory domain rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Biblio Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Callers (UI / API layer)                     │   │
//! │  │    Catalog ──► Cart ──► Checkout ──► Circulation desk          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                biblio-circ (Circulation Engine)                 │   │
//! │  │    checkout, checkin, record, process_cart                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ biblio-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │ validation│  │   │
//! │  │   │   Book    │  │   Money   │  │   Cart    │  │   rules   │  │   │
//! │  │   │ Borrowing │  │ RentCalc  │  │ CartLine  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    biblio-db (Record Store)                     │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Book, Member, Borrowing, CheckoutTransaction, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Pure multi-line cart with price/title snapshots
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//! 5. **Explicit Tenancy**: every operation takes the owning organization
//!    explicitly; nothing in this workspace resolves an ambient "current user"
//!
//! ## Example Usage
//!
//! ```rust
//! use biblio_core::money::Money;
//!
//! // Create money from cents (never from floats!)
//! let list_price = Money::from_cents(2500); // $25.00
//!
//! // Rent pricing: 40% off the list price
//! let rent = list_price.rental_price();
//! assert_eq!(rent.cents(), 1500); // $15.00
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use biblio_core::Money` instead of
// `use biblio_core::money::Money`

pub use cart::{Cart, CartLine};
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default organization ID for v0.1 (single-tenant runtime with multi-tenant schema)
///
/// ## Why a constant?
/// v0.1 runs one library or bookstore per deployment, but the database schema
/// carries organization_id on every row for future multi-tenancy. This
/// constant is used by seeds and tests and will be replaced with dynamic
/// organization resolution in v0.5+.
pub const DEFAULT_ORGANIZATION_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Maximum lines allowed in a single cart
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable transaction sizes.
/// Can be made configurable per-organization in future versions.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single title in cart
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
/// Configurable per-organization in future versions.
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Rent discount in basis points (4000 = 40% off the list price)
///
/// ## Business Reason
/// Bookstores rent titles at 60% of their list price. The recorder never
/// applies this itself; callers compute the rent fee before recording.
pub const RENT_DISCOUNT_BPS: u32 = 4000;
