//! # biblio-circ: Circulation Engine for Biblio
//!
//! This crate implements the circulation domain on top of `biblio-db`:
//! lending and returns, purchases, cart orchestration, and the loan
//! reports. It owns every stock movement and every audit event; callers
//! (desktop app, API) talk to this crate, never to the repositories
//! directly, for anything that changes state.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Biblio Circulation Flow                             │
//! │                                                                         │
//! │  Desk action (checkout, return, cart)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    biblio-circ (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────────┐         ┌──────────────────┐            │   │
//! │  │   │   Orchestrator   │────────▶│      Engine      │            │   │
//! │  │   │ (whole carts)    │         │ (checkout/checkin│            │   │
//! │  │   └──────────────────┘         │  lifecycle)      │            │   │
//! │  │            │                   └──────────────────┘            │   │
//! │  │            │                      │            │               │   │
//! │  │            ▼                      ▼            ▼               │   │
//! │  │   ┌──────────────────┐  ┌──────────────┐  ┌──────────────┐    │   │
//! │  │   │     Recorder     │  │    Ledger    │  │   Reports    │    │   │
//! │  │   │ (audit events)   │  │ (stock moves)│  │ (read-only)  │    │   │
//! │  │   └──────────────────┘  └──────────────┘  └──────────────┘    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  biblio-db repositories (SQLite)                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`ledger`] - Conditional stock movement (never oversells)
//! - [`circulation`] - Checkout / check-in lifecycle and batch variants
//! - [`recorder`] - Append-only financial audit events
//! - [`orchestrator`] - Cart processing (purchase and lending modes)
//! - [`reports`] - Read-only loan projections (member, due-soon, overdue)
//! - [`error`] - Circulation error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use biblio_circ::Circulation;
//! use biblio_core::{DuePolicy, OrgContext, DEFAULT_ORGANIZATION_ID};
//! use biblio_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./biblio.db")).await?;
//! let circ = Circulation::new(db);
//! let ctx = OrgContext::library(DEFAULT_ORGANIZATION_ID);
//!
//! // Lend one copy for 15 days
//! let receipt = circ
//!     .engine()
//!     .checkout(&ctx, &book_id, &member_id, DuePolicy::Days15, 1)
//!     .await?;
//!
//! // Later, take it back
//! circ.engine().checkin(&ctx, &receipt.borrowing.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod circulation;
pub mod error;
pub mod ledger;
pub mod orchestrator;
pub mod recorder;
pub mod reports;

// =============================================================================
// Re-exports
// =============================================================================

pub use circulation::{
    CheckinOutcome, CheckinReceipt, CheckoutOutcome, CheckoutReceipt, CheckoutRequest,
    CirculationEngine,
};
pub use error::{CircError, CircResult};
pub use ledger::InventoryLedger;
pub use orchestrator::{
    CartLineOutcome, CartReport, CheckoutMode, CheckoutOrchestrator, CommittedLine,
};
pub use recorder::TransactionRecorder;
pub use reports::CirculationReports;

use biblio_db::Database;

// =============================================================================
// Facade
// =============================================================================

/// One handle bundling every circulation component over a shared database.
///
/// The components are cheap to construct (each holds only a database
/// handle), so the accessors hand out fresh values instead of references.
#[derive(Debug, Clone)]
pub struct Circulation {
    db: Database,
}

impl Circulation {
    /// Creates the circulation facade over the given database.
    pub fn new(db: Database) -> Self {
        Circulation { db }
    }

    /// Stock movement operations.
    pub fn ledger(&self) -> InventoryLedger {
        InventoryLedger::new(self.db.clone())
    }

    /// Checkout / check-in lifecycle.
    pub fn engine(&self) -> CirculationEngine {
        CirculationEngine::new(self.db.clone())
    }

    /// Financial audit events.
    pub fn recorder(&self) -> TransactionRecorder {
        TransactionRecorder::new(self.db.clone())
    }

    /// Cart processing.
    pub fn orchestrator(&self) -> CheckoutOrchestrator {
        CheckoutOrchestrator::new(self.db.clone())
    }

    /// Read-only loan reports.
    pub fn reports(&self) -> CirculationReports {
        CirculationReports::new(self.db.clone())
    }

    /// The underlying database, for catalog and member management.
    pub fn database(&self) -> &Database {
        &self.db
    }
}
