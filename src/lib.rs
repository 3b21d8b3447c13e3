//! # Kryzer Core
//!
//! A bookkeeping reconciliation library for small-business payables and
//! receivables, covering the lifecycle of an obligation from creation to
//! settlement.
//!
//! ## Features
//!
//! - **Obligation management**: Payables and receivables with derived
//!   overdue status and company scoping
//! - **Installment generation**: Split a total into exact monthly slices
//!   with editable amounts and dates
//! - **Partial settlement**: Peel settled fragments off an obligation
//!   while the remainder stays open
//! - **Settlement recording**: Single and batch settlement with
//!   discount/interest/fine adjustments and a bank funds guard
//! - **Debt negotiation**: Merge overdue obligations into a renegotiated
//!   lump sum or installment group with audit snapshots
//! - **Statements**: Dated inflow/outflow view with running balance
//! - **Storage abstraction**: Database-agnostic design with trait-based
//!   repositories and atomic mutation batches
//!
//! ## Quick Start
//!
//! ```rust
//! use kryzer_core::{FinanceManager, MemoryStore, NewObligation, ObligationKind};
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let mut manager = FinanceManager::new(MemoryStore::new());
//! let obligation = manager
//!     .create_obligation(NewObligation {
//!         company_id: "co".to_string(),
//!         kind: ObligationKind::Payable,
//!         description: "Office rent".to_string(),
//!         amount: BigDecimal::from(1200),
//!         due_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
//!         bank_id: "bank-1".to_string(),
//!         category_id: "rent".to_string(),
//!         payment_method: None,
//!         counterpart_id: None,
//!     })
//!     .await
//!     .unwrap();
//! assert_eq!(obligation.amount, BigDecimal::from(1200));
//! # });
//! ```

pub mod reconciliation;
pub mod reporting;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use reconciliation::*;
pub use reporting::{build_statement, Statement, StatementDay, StatementFilter, StatementLine};
pub use traits::*;
pub use types::*;
pub use utils::MemoryStore;
