//! Reconciliation engines for payables and receivables
//!
//! The [`FinanceManager`] orchestrates four engines over a shared store:
//! installment generation, partial settlement, settlement recording, and
//! debt negotiation. Every compound mutation is committed as one atomic
//! batch.

pub mod core;
pub mod installment;
pub mod negotiation;
pub mod partial;
pub mod settlement;

pub use self::core::FinanceManager;
pub use installment::{InstallmentPlan, InstallmentRow};
pub use negotiation::{
    NegotiationAdjustment, NegotiationMode, NegotiationRequest, OriginsPlacement,
};
pub use partial::{PartialSettlementOutcome, PartialSettlementRequest};
pub use settlement::{BankPosition, MarkSettledRequest, SettlementRequest};
