//! Debt negotiation: replace a set of overdue obligations with one
//! renegotiated obligation or a new installment group
//!
//! The consumed obligations are removed outright — they are replaced,
//! not settled or cancelled — and the replacement carries audit
//! snapshots of what it consumed.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::debug;

use crate::reconciliation::core::FinanceManager;
use crate::reconciliation::installment::InstallmentPlan;
use crate::traits::*;
use crate::types::*;
use crate::utils::money::{is_positive, round2};
use crate::utils::validation::validate_percentage;

/// How the renegotiated total relates to the raw sum
#[derive(Debug, Clone, PartialEq)]
pub enum NegotiationAdjustment {
    /// New total equals the raw sum
    None,
    /// New total is the raw sum reduced by a percentage
    Discount(BigDecimal),
    /// New total is the raw sum increased by a percentage
    Interest(BigDecimal),
}

/// Shape of the replacement obligation(s)
#[derive(Debug, Clone, PartialEq)]
pub enum NegotiationMode {
    /// One obligation due at the start date
    LumpSum,
    /// An installment group of the given size
    Installments(u32),
}

/// Which replacement obligations carry the origin snapshots
///
/// The source application attached origins to the first installment
/// slice only, to avoid repeating the audit list on every slice; that
/// stays the default but is configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OriginsPlacement {
    #[default]
    FirstSliceOnly,
    EverySlice,
}

/// Input for a negotiation
#[derive(Debug, Clone)]
pub struct NegotiationRequest {
    pub company_id: String,
    /// At least one obligation, all of one kind, all overdue
    pub obligation_ids: Vec<String>,
    pub adjustment: NegotiationAdjustment,
    pub mode: NegotiationMode,
    pub start_date: NaiveDate,
    /// Reference date for the overdue check
    pub today: NaiveDate,
    /// Defaults to the first selected obligation's bank
    pub bank_id: Option<String>,
    /// Defaults to the first selected obligation's category
    pub category_id: Option<String>,
    /// Defaults to the first selected obligation's method
    pub payment_method: Option<String>,
    /// Defaults to a generated summary
    pub description: Option<String>,
    pub origins_placement: OriginsPlacement,
}

impl<S: FinanceStore> FinanceManager<S> {
    /// Merge a set of overdue obligations into a renegotiated replacement.
    ///
    /// Returns the created obligation(s). The selected obligations are
    /// hard-deleted and the replacements created in one atomic batch.
    pub async fn negotiate(
        &mut self,
        request: NegotiationRequest,
    ) -> FinanceResult<Vec<Obligation>> {
        if request.obligation_ids.is_empty() {
            return Err(FinanceError::Validation(
                "negotiation requires at least one obligation".to_string(),
            ));
        }
        let unique: HashSet<&String> = request.obligation_ids.iter().collect();
        if unique.len() != request.obligation_ids.len() {
            return Err(FinanceError::Validation(
                "duplicate obligation ids in negotiation".to_string(),
            ));
        }

        let mut selected = Vec::with_capacity(request.obligation_ids.len());
        for id in &request.obligation_ids {
            selected.push(
                self.get_obligation_required(&request.company_id, id)
                    .await?,
            );
        }

        let kind = selected[0].kind;
        if selected.iter().any(|o| o.kind != kind) {
            return Err(FinanceError::InvariantViolation(
                "cannot negotiate payables and receivables together".to_string(),
            ));
        }
        if let Some(not_overdue) = selected
            .iter()
            .find(|o| derive_status(o, request.today) != DisplayStatus::Overdue)
        {
            return Err(FinanceError::InvariantViolation(format!(
                "obligation '{}' is not overdue",
                not_overdue.id
            )));
        }

        let raw_total = selected
            .iter()
            .fold(BigDecimal::from(0), |acc, o| acc + &o.amount);
        let adjusted_total = adjusted_total(&raw_total, &request.adjustment)?;
        let origins: Vec<NegotiationOrigin> = selected.iter().map(|o| o.to_origin()).collect();

        let first = &selected[0];
        let base = NewObligation {
            company_id: request.company_id.clone(),
            kind,
            description: request.description.clone().unwrap_or_else(|| {
                format!("Negotiation: {} obligations", selected.len())
            }),
            amount: adjusted_total.clone(),
            due_date: request.start_date,
            bank_id: request.bank_id.clone().unwrap_or_else(|| first.bank_id.clone()),
            category_id: request
                .category_id
                .clone()
                .unwrap_or_else(|| first.category_id.clone()),
            payment_method: request
                .payment_method
                .clone()
                .or_else(|| first.payment_method.clone()),
            counterpart_id: first.counterpart_id.clone(),
        };

        let mut created = match request.mode {
            NegotiationMode::LumpSum => {
                let mut obligation = base.into_obligation();
                obligation.negotiation_origins = origins;
                vec![obligation]
            }
            NegotiationMode::Installments(count) => {
                let plan = InstallmentPlan::build(&adjusted_total, request.start_date, count)?;
                let group_id = new_id();
                let mut slices = Vec::with_capacity(plan.len());
                for (i, row) in plan.rows().iter().enumerate() {
                    let mut slice = base.clone().into_obligation();
                    slice.amount = row.amount.clone();
                    slice.due_date = row.due_date;
                    slice.installment = Some(InstallmentSlot {
                        group_id: group_id.clone(),
                        number: i as u32 + 1,
                        total: count,
                    });
                    if request.origins_placement == OriginsPlacement::EverySlice || i == 0 {
                        slice.negotiation_origins = origins.clone();
                    }
                    slices.push(slice);
                }
                slices
            }
        };

        let mut batch = MutationBatch::new();
        for old in &selected {
            batch.delete_obligation(old.id.clone());
        }
        for obligation in &created {
            batch.create_obligation(obligation.clone());
        }
        self.store.commit(batch).await?;

        debug!(
            consumed = selected.len(),
            produced = created.len(),
            "negotiated obligations"
        );
        created.sort_by_key(|o| o.installment.as_ref().map(|s| s.number).unwrap_or(0));
        Ok(created)
    }
}

/// Apply the adjustment to the raw sum, rounded to two decimals
fn adjusted_total(
    raw_total: &BigDecimal,
    adjustment: &NegotiationAdjustment,
) -> FinanceResult<BigDecimal> {
    let hundred = BigDecimal::from(100);
    let adjusted = match adjustment {
        NegotiationAdjustment::None => raw_total.clone(),
        NegotiationAdjustment::Discount(pct) => {
            validate_percentage(pct)?;
            raw_total * (&hundred - pct) / hundred
        }
        NegotiationAdjustment::Interest(pct) => {
            validate_percentage(pct)?;
            raw_total * (&hundred + pct) / hundred
        }
    };
    let adjusted = round2(&adjusted);
    if !is_positive(&adjusted) {
        return Err(FinanceError::Validation(
            "negotiated total must be positive".to_string(),
        ));
    }
    Ok(adjusted)
}
