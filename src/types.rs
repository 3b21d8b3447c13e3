//! Core types and data structures for the reconciliation engine

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Generate a fresh opaque identifier for obligations, groups, and events
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Direction of an obligation: money the company owes, or money owed to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObligationKind {
    /// Money owed to a supplier (conta a pagar)
    Payable,
    /// Money owed by a client (conta a receber)
    Receivable,
}

/// Persisted lifecycle state of an obligation
///
/// Only these two states are ever stored. "Overdue" is a display-time
/// derivation, see [`derive_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObligationStatus {
    /// Awaiting payment or receipt
    Pending,
    /// Paid (payables) or received (receivables)
    Settled,
}

/// Display status including the derived overdue state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayStatus {
    Pending,
    Settled,
    Overdue,
}

/// Derive the display status of an obligation for a given reference date.
///
/// This is the single place where "overdue" is computed; it is never
/// persisted. An obligation is overdue when it is pending and its due
/// date is strictly before `today`.
pub fn derive_status(obligation: &Obligation, today: NaiveDate) -> DisplayStatus {
    match obligation.status {
        ObligationStatus::Settled => DisplayStatus::Settled,
        ObligationStatus::Pending if obligation.due_date < today => DisplayStatus::Overdue,
        ObligationStatus::Pending => DisplayStatus::Pending,
    }
}

/// Membership of an obligation in an installment group
///
/// Present iff the obligation was created as one slice of an N-way split.
/// All members of a group share `group_id` and `total`, and carry
/// consecutive `number` values 1..=total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentSlot {
    pub group_id: String,
    pub number: u32,
    pub total: u32,
}

/// Membership of an obligation in a partial-settlement group
///
/// Present iff the obligation has ever been partially settled. The
/// still-open remainder keeps the original obligation id and always
/// occupies the last slot (`number == total`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialSlot {
    pub group_id: String,
    pub number: u32,
    pub total: u32,
}

/// Audit snapshot of an obligation consumed by a negotiation
///
/// Embedded on the obligation(s) the negotiation produced; never
/// persisted as a standalone entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationOrigin {
    pub description: String,
    pub amount: BigDecimal,
    pub due_date: NaiveDate,
}

/// A payable or receivable line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obligation {
    /// Unique identifier
    pub id: String,
    /// Owning company; every operation is scoped by this
    pub company_id: String,
    /// Payable or receivable
    pub kind: ObligationKind,
    pub description: String,
    /// Positive amount, always normalized to two decimal places
    pub amount: BigDecimal,
    /// Due date for payables, expected receipt date for receivables
    pub due_date: NaiveDate,
    pub status: ObligationStatus,
    /// Account the settlement posts to / draws from
    pub bank_id: String,
    pub category_id: String,
    pub payment_method: Option<String>,
    /// Supplier id for payables, client id for receivables
    pub counterpart_id: Option<String>,
    pub installment: Option<InstallmentSlot>,
    pub partial: Option<PartialSlot>,
    /// Snapshots of the obligations this one replaced, if it was
    /// produced by a negotiation
    pub negotiation_origins: Vec<NegotiationOrigin>,
}

impl Obligation {
    /// True when the obligation may still be edited. Settled obligations
    /// are immutable except for deletion or settlement reversal.
    pub fn is_mutable(&self) -> bool {
        self.status == ObligationStatus::Pending
    }

    /// Snapshot this obligation for a negotiation audit trail
    pub fn to_origin(&self) -> NegotiationOrigin {
        NegotiationOrigin {
            description: self.description.clone(),
            amount: self.amount.clone(),
            due_date: self.due_date,
        }
    }
}

/// Input for creating a single obligation
#[derive(Debug, Clone)]
pub struct NewObligation {
    pub company_id: String,
    pub kind: ObligationKind,
    pub description: String,
    pub amount: BigDecimal,
    pub due_date: NaiveDate,
    pub bank_id: String,
    pub category_id: String,
    pub payment_method: Option<String>,
    pub counterpart_id: Option<String>,
}

impl NewObligation {
    /// Materialize a pending obligation with a fresh id
    pub fn into_obligation(self) -> Obligation {
        Obligation {
            id: new_id(),
            company_id: self.company_id,
            kind: self.kind,
            description: self.description,
            amount: self.amount,
            due_date: self.due_date,
            status: ObligationStatus::Pending,
            bank_id: self.bank_id,
            category_id: self.category_id,
            payment_method: self.payment_method,
            counterpart_id: self.counterpart_id,
            installment: None,
            partial: None,
            negotiation_origins: Vec::new(),
        }
    }
}

/// Settlement-time adjustments, applicable to payables only
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SettlementAdjustments {
    pub discount: BigDecimal,
    pub interest: BigDecimal,
    pub fine: BigDecimal,
}

impl SettlementAdjustments {
    /// Net effect on the settled amount: interest and fine add,
    /// discount subtracts
    pub fn net(&self) -> BigDecimal {
        &self.interest + &self.fine - &self.discount
    }

    pub fn is_zero(&self) -> bool {
        let zero = BigDecimal::from(0);
        self.discount == zero && self.interest == zero && self.fine == zero
    }
}

/// A payment (payables) or receipt (receivables) linking the obligations
/// it settled
///
/// Created atomically with the status flip of every linked obligation;
/// deleting the event rolls every linked obligation back to pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementEvent {
    pub id: String,
    pub company_id: String,
    pub kind: ObligationKind,
    pub date: NaiveDate,
    /// Account the funds moved through
    pub bank_id: String,
    /// Total settled amount, adjustments included
    pub amount: BigDecimal,
    pub description: String,
    pub payment_method: Option<String>,
    /// Ids of the obligations this event settled
    pub obligation_ids: Vec<String>,
    pub adjustments: Option<SettlementAdjustments>,
}

/// A bank account with its configured balance floor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: String,
    pub company_id: String,
    pub name: String,
    pub initial_balance: BigDecimal,
    /// Overdraft allowance (limite de cheque especial); funds checks
    /// pass while the balance stays above `-overdraft_limit`
    pub overdraft_limit: BigDecimal,
}

/// Errors that can occur in the reconciliation engine
#[derive(Debug, thiserror::Error)]
pub enum FinanceError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("insufficient funds: balance {balance}, overdraft limit {overdraft}, available {available}, required {required}")]
    InsufficientFunds {
        balance: BigDecimal,
        overdraft: BigDecimal,
        available: BigDecimal,
        required: BigDecimal,
    },
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    #[error("obligation not found: {0}")]
    ObligationNotFound(String),
    #[error("settlement event not found: {0}")]
    SettlementNotFound(String),
    #[error("bank account not found: {0}")]
    BankNotFound(String),
}

impl FinanceError {
    /// For [`FinanceError::InsufficientFunds`], the amount missing to
    /// cover the operation
    pub fn shortfall(&self) -> Option<BigDecimal> {
        match self {
            FinanceError::InsufficientFunds {
                available,
                required,
                ..
            } => Some(required - available),
            _ => None,
        }
    }
}

/// Result type for reconciliation operations
pub type FinanceResult<T> = Result<T, FinanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(due: NaiveDate) -> Obligation {
        NewObligation {
            company_id: "co".to_string(),
            kind: ObligationKind::Payable,
            description: "Rent".to_string(),
            amount: BigDecimal::from(100),
            due_date: due,
            bank_id: "bank".to_string(),
            category_id: "cat".to_string(),
            payment_method: None,
            counterpart_id: None,
        }
        .into_obligation()
    }

    #[test]
    fn overdue_is_derived_not_stored() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let past_due = pending(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());

        assert_eq!(past_due.status, ObligationStatus::Pending);
        assert_eq!(derive_status(&past_due, today), DisplayStatus::Overdue);

        let due_today = pending(today);
        assert_eq!(derive_status(&due_today, today), DisplayStatus::Pending);

        let mut settled = pending(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        settled.status = ObligationStatus::Settled;
        assert_eq!(derive_status(&settled, today), DisplayStatus::Settled);
    }

    #[test]
    fn shortfall_reports_missing_amount() {
        let err = FinanceError::InsufficientFunds {
            balance: BigDecimal::from(100),
            overdraft: BigDecimal::from(50),
            available: BigDecimal::from(150),
            required: BigDecimal::from(175),
        };
        assert_eq!(err.shortfall(), Some(BigDecimal::from(25)));
        assert_eq!(FinanceError::Validation("x".to_string()).shortfall(), None);
    }

    #[test]
    fn obligation_serde_round_trip() {
        let o = pending(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        let json = serde_json::to_string(&o).unwrap();
        let back: Obligation = serde_json::from_str(&json).unwrap();
        assert_eq!(o, back);
    }

    #[test]
    fn settlement_event_serde_round_trip() {
        let event = SettlementEvent {
            id: new_id(),
            company_id: "co".to_string(),
            kind: ObligationKind::Payable,
            date: NaiveDate::from_ymd_opt(2024, 4, 12).unwrap(),
            bank_id: "bank".to_string(),
            amount: BigDecimal::from(95),
            description: "Payment: Rent".to_string(),
            payment_method: Some("pix".to_string()),
            obligation_ids: vec!["a".to_string(), "b".to_string()],
            adjustments: Some(SettlementAdjustments {
                discount: BigDecimal::from(10),
                interest: BigDecimal::from(2),
                fine: BigDecimal::from(3),
            }),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: SettlementEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);

        // the adjustments field is optional on the wire
        let mut bare = event.clone();
        bare.adjustments = None;
        let json = serde_json::to_string(&bare).unwrap();
        let back: SettlementEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(bare, back);
    }
}
