//! Settlement recording: paying payables and receiving receivables
//!
//! A settlement is one event linking one or more obligations plus the
//! status flip of every linked obligation, committed atomically. Deleting
//! the event (a reversal) rolls every linked obligation back to pending.
//! Payables are guarded by the bank's available funds (balance plus
//! overdraft); receiving money never fails for insufficiency.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::debug;

use crate::reconciliation::core::FinanceManager;
use crate::traits::*;
use crate::types::*;
use crate::utils::money::round2;

/// A bank account's computed standing
#[derive(Debug, Clone, PartialEq)]
pub struct BankPosition {
    /// Initial balance minus payments plus receipts
    pub balance: BigDecimal,
    pub overdraft_limit: BigDecimal,
    /// `balance + overdraft_limit`
    pub available: BigDecimal,
}

/// Input for settling one or more obligations with a single event
#[derive(Debug, Clone)]
pub struct SettlementRequest {
    pub company_id: String,
    pub obligation_ids: Vec<String>,
    pub date: NaiveDate,
    pub bank_id: String,
    pub payment_method: Option<String>,
    /// Defaults to a generated summary of the settled descriptions
    pub description: Option<String>,
    /// Payables only; rejected on receivables
    pub adjustments: Option<SettlementAdjustments>,
}

/// Input for settling a single obligation, optionally at a different
/// amount than its face value
#[derive(Debug, Clone)]
pub struct MarkSettledRequest {
    pub company_id: String,
    pub obligation_id: String,
    pub date: NaiveDate,
    pub bank_id: String,
    pub payment_method: Option<String>,
    /// Settlement-time override; the obligation's stored amount is left
    /// unchanged
    pub amount: Option<BigDecimal>,
    pub adjustments: Option<SettlementAdjustments>,
}

impl<S: FinanceStore> FinanceManager<S> {
    /// Running balance of a bank account, computed from settlement
    /// history rather than a stored total
    pub async fn bank_balance(&self, bank_id: &str) -> FinanceResult<BigDecimal> {
        Ok(self.bank_position(bank_id).await?.balance)
    }

    /// Balance, overdraft, and available funds for a bank account
    pub async fn bank_position(&self, bank_id: &str) -> FinanceResult<BankPosition> {
        let bank = self
            .store
            .get_bank(bank_id)
            .await?
            .ok_or_else(|| FinanceError::BankNotFound(bank_id.to_string()))?;

        let mut balance = bank.initial_balance.clone();
        for event in self.store.list_bank_events(bank_id).await? {
            match event.kind {
                ObligationKind::Payable => balance -= &event.amount,
                ObligationKind::Receivable => balance += &event.amount,
            }
        }

        let available = &balance + &bank.overdraft_limit;
        Ok(BankPosition {
            balance,
            overdraft_limit: bank.overdraft_limit,
            available,
        })
    }

    /// Fail with [`FinanceError::InsufficientFunds`] unless the bank can
    /// cover `required`. An amount exactly equal to the available funds
    /// passes.
    pub async fn check_funds(&self, bank_id: &str, required: &BigDecimal) -> FinanceResult<()> {
        let position = self.bank_position(bank_id).await?;
        if required > &position.available {
            return Err(FinanceError::InsufficientFunds {
                balance: position.balance,
                overdraft: position.overdraft_limit,
                available: position.available,
                required: required.clone(),
            });
        }
        Ok(())
    }

    /// Settle a set of pending obligations with one event.
    ///
    /// All referenced obligations must exist in the company scope, share
    /// one kind, and be pending (an obligation already settled by a live
    /// event cannot be linked twice). The event and every status flip
    /// commit as one atomic unit.
    pub async fn settle(&mut self, request: SettlementRequest) -> FinanceResult<SettlementEvent> {
        if request.obligation_ids.is_empty() {
            return Err(FinanceError::Validation(
                "settlement requires at least one obligation".to_string(),
            ));
        }
        let unique: HashSet<&String> = request.obligation_ids.iter().collect();
        if unique.len() != request.obligation_ids.len() {
            return Err(FinanceError::Validation(
                "duplicate obligation ids in settlement".to_string(),
            ));
        }

        let mut obligations = Vec::with_capacity(request.obligation_ids.len());
        for id in &request.obligation_ids {
            obligations.push(
                self.get_obligation_required(&request.company_id, id)
                    .await?,
            );
        }

        let kind = obligations[0].kind;
        if obligations.iter().any(|o| o.kind != kind) {
            return Err(FinanceError::InvariantViolation(
                "cannot settle payables and receivables together".to_string(),
            ));
        }
        if let Some(already) = obligations
            .iter()
            .find(|o| o.status != ObligationStatus::Pending)
        {
            return Err(FinanceError::InvariantViolation(format!(
                "obligation '{}' is already settled",
                already.id
            )));
        }

        let face_total = obligations
            .iter()
            .fold(BigDecimal::from(0), |acc, o| acc + &o.amount);
        let event = self
            .build_settlement(&request, kind, face_total, &obligations)
            .await?;

        let mut batch = MutationBatch::new();
        for mut obligation in obligations {
            obligation.status = ObligationStatus::Settled;
            batch.update_obligation(obligation);
        }
        batch.create_event(event.clone());
        self.store.commit(batch).await?;

        debug!(
            event_id = %event.id,
            linked = event.obligation_ids.len(),
            "recorded settlement"
        );
        Ok(event)
    }

    /// Settle a single obligation, optionally at an amount other than its
    /// face value. The override is a settlement-time adjustment: it is
    /// what gets funds-checked and recorded, while the obligation's own
    /// `amount` stays untouched.
    pub async fn mark_settled(
        &mut self,
        request: MarkSettledRequest,
    ) -> FinanceResult<SettlementEvent> {
        let obligation = self
            .get_obligation_required(&request.company_id, &request.obligation_id)
            .await?;
        if obligation.status != ObligationStatus::Pending {
            return Err(FinanceError::InvariantViolation(format!(
                "obligation '{}' is already settled",
                obligation.id
            )));
        }

        let base = match &request.amount {
            Some(amount) => {
                crate::utils::validation::validate_positive_amount(amount)?;
                round2(amount)
            }
            None => obligation.amount.clone(),
        };

        let settle_request = SettlementRequest {
            company_id: request.company_id,
            obligation_ids: vec![request.obligation_id],
            date: request.date,
            bank_id: request.bank_id,
            payment_method: request.payment_method,
            description: None,
            adjustments: request.adjustments,
        };
        let event = self
            .build_settlement(&settle_request, obligation.kind, base, &[obligation.clone()])
            .await?;

        let mut settled = obligation;
        settled.status = ObligationStatus::Settled;

        let mut batch = MutationBatch::new();
        batch.update_obligation(settled);
        batch.create_event(event.clone());
        self.store.commit(batch).await?;

        debug!(event_id = %event.id, "recorded single settlement");
        Ok(event)
    }

    /// Reverse a settlement: every linked obligation returns to pending
    /// and the event is deleted. Reversals are always permitted; no funds
    /// check applies.
    pub async fn unsettle(&mut self, company_id: &str, event_id: &str) -> FinanceResult<()> {
        let event = self.get_event_required(company_id, event_id).await?;
        let linked = self.store.get_obligations(&event.obligation_ids).await?;

        let mut batch = MutationBatch::new();
        for mut obligation in linked {
            obligation.status = ObligationStatus::Pending;
            batch.update_obligation(obligation);
        }
        batch.delete_event(event.id.clone());
        self.store.commit(batch).await?;

        debug!(event_id, "reversed settlement");
        Ok(())
    }

    /// Assemble (and funds-check) the settlement event for a validated
    /// set of obligations. `base_amount` is the face total or the
    /// caller's override.
    async fn build_settlement(
        &self,
        request: &SettlementRequest,
        kind: ObligationKind,
        base_amount: BigDecimal,
        obligations: &[Obligation],
    ) -> FinanceResult<SettlementEvent> {
        let adjustments = match &request.adjustments {
            Some(a) if !a.is_zero() => {
                if kind == ObligationKind::Receivable {
                    return Err(FinanceError::Validation(
                        "adjustments apply to payables only".to_string(),
                    ));
                }
                Some(a.clone())
            }
            _ => None,
        };

        let mut amount = round2(&base_amount);
        if let Some(a) = &adjustments {
            amount = round2(&(amount + a.net()));
        }
        // a discount can never push the settled amount to zero or below
        if !crate::utils::money::is_positive(&amount) {
            return Err(FinanceError::Validation(format!(
                "adjusted settlement amount must be positive, got {amount}"
            )));
        }

        if kind == ObligationKind::Payable {
            self.check_funds(&request.bank_id, &amount).await?;
        } else if self.store.get_bank(&request.bank_id).await?.is_none() {
            return Err(FinanceError::BankNotFound(request.bank_id.clone()));
        }

        let description = request.description.clone().unwrap_or_else(|| {
            let mut seen = HashSet::new();
            let descs: Vec<&str> = obligations
                .iter()
                .map(|o| o.description.as_str())
                .filter(|d| seen.insert(*d))
                .collect();
            let prefix = match kind {
                ObligationKind::Payable => "Payment",
                ObligationKind::Receivable => "Receipt",
            };
            format!("{}: {}", prefix, descs.join(", "))
        });

        Ok(SettlementEvent {
            id: new_id(),
            company_id: request.company_id.clone(),
            kind,
            date: request.date,
            bank_id: request.bank_id.clone(),
            amount,
            description,
            payment_method: request.payment_method.clone(),
            obligation_ids: request.obligation_ids.clone(),
            adjustments,
        })
    }
}
