//! Installment generation: split one total into N dated slices
//!
//! Every slice except the last carries `floor2(total / count)`; the last
//! slice absorbs the rounding remainder, so the slice amounts always sum
//! to the requested total exactly. Rows stay editable until commit; the
//! commit re-validates that the edited total still reconciles with the
//! requested total within one cent.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use tracing::debug;

use crate::reconciliation::core::FinanceManager;
use crate::traits::*;
use crate::types::*;
use crate::utils::dates::add_months;
use crate::utils::money::{floor2, round2, within_cent};
use crate::utils::validation::*;

/// One generated slice of an installment plan
#[derive(Debug, Clone, PartialEq)]
pub struct InstallmentRow {
    pub due_date: NaiveDate,
    pub amount: BigDecimal,
}

/// An editable installment schedule, not yet persisted
#[derive(Debug, Clone)]
pub struct InstallmentPlan {
    requested_total: BigDecimal,
    rows: Vec<InstallmentRow>,
}

impl InstallmentPlan {
    /// Generate a plan of `count` monthly slices starting at `start_date`.
    ///
    /// Dates step by calendar months, clamping to the last valid day of
    /// short months. Rejects non-positive totals and counts below 2.
    pub fn build(total: &BigDecimal, start_date: NaiveDate, count: u32) -> FinanceResult<Self> {
        validate_positive_amount(total)?;
        validate_installment_count(count)?;

        let total = round2(total);
        let per_slice = floor2(&(&total / BigDecimal::from(count)));

        let mut rows = Vec::with_capacity(count as usize);
        for i in 0..count {
            let due_date = add_months(start_date, i).ok_or_else(|| {
                FinanceError::Validation("installment date out of range".to_string())
            })?;
            let amount = if i == count - 1 {
                round2(&(&total - &per_slice * BigDecimal::from(count - 1)))
            } else {
                per_slice.clone()
            };
            rows.push(InstallmentRow { due_date, amount });
        }

        Ok(Self {
            requested_total: total,
            rows,
        })
    }

    pub fn rows(&self) -> &[InstallmentRow] {
        &self.rows
    }

    pub fn requested_total(&self) -> &BigDecimal {
        &self.requested_total
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Replace a row's amount (manual edit before commit)
    pub fn set_amount(&mut self, index: usize, amount: BigDecimal) -> FinanceResult<()> {
        validate_positive_amount(&amount)?;
        let row = self.rows.get_mut(index).ok_or_else(|| {
            FinanceError::Validation(format!("no installment row at index {index}"))
        })?;
        row.amount = round2(&amount);
        Ok(())
    }

    /// Replace a row's due date (manual edit before commit)
    pub fn set_date(&mut self, index: usize, due_date: NaiveDate) -> FinanceResult<()> {
        let row = self.rows.get_mut(index).ok_or_else(|| {
            FinanceError::Validation(format!("no installment row at index {index}"))
        })?;
        row.due_date = due_date;
        Ok(())
    }

    /// Sum of the (possibly edited) row amounts
    pub fn total(&self) -> BigDecimal {
        self.rows
            .iter()
            .fold(BigDecimal::from(0), |acc, r| acc + &r.amount)
    }

    /// Whether the edited total still matches the requested total within
    /// one cent. UIs use this to block the commit button; [`Self::build`]
    /// always produces a reconciled plan.
    pub fn is_reconciled(&self) -> bool {
        within_cent(&self.total(), &self.requested_total)
    }
}

impl<S: FinanceStore> FinanceManager<S> {
    /// Persist an installment plan as a group of pending obligations.
    ///
    /// `base` supplies the shared fields (description, bank, category,
    /// counterpart); its `amount` must match the plan's requested total
    /// and each slice's amount and date come from the plan rows. The
    /// whole group is created atomically.
    pub async fn commit_installment_plan(
        &mut self,
        base: NewObligation,
        plan: &InstallmentPlan,
    ) -> FinanceResult<Vec<Obligation>> {
        validate_description(&base.description)?;
        if !plan.is_reconciled() {
            return Err(FinanceError::Validation(format!(
                "installment rows sum to {} but {} was requested",
                plan.total(),
                plan.requested_total()
            )));
        }
        if !within_cent(&round2(&base.amount), plan.requested_total()) {
            return Err(FinanceError::Validation(
                "obligation amount does not match the plan total".to_string(),
            ));
        }

        let group_id = new_id();
        let total = plan.len() as u32;
        let mut created = Vec::with_capacity(plan.len());
        let mut batch = MutationBatch::new();

        for (i, row) in plan.rows().iter().enumerate() {
            let mut obligation = base.clone().into_obligation();
            obligation.amount = row.amount.clone();
            obligation.due_date = row.due_date;
            obligation.installment = Some(InstallmentSlot {
                group_id: group_id.clone(),
                number: i as u32 + 1,
                total,
            });
            batch.create_obligation(obligation.clone());
            created.push(obligation);
        }

        self.store.commit(batch).await?;
        debug!(%group_id, slices = total, "committed installment plan");
        Ok(created)
    }
}
