//! Statement view: payables and receivables merged into a dated cash view
//!
//! Receivables count as inflow and payables as outflow. Days are listed
//! newest first and the accumulated balance runs in that same order, so
//! the first day shows the period's full net.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::reconciliation::core::FinanceManager;
use crate::traits::FinanceStore;
use crate::types::*;

/// Filters applied before the statement is built
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatementFilter {
    pub kind: Option<ObligationKind>,
    pub bank_id: Option<String>,
    pub category_id: Option<String>,
    pub status: Option<DisplayStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl StatementFilter {
    fn matches(&self, obligation: &Obligation, today: NaiveDate) -> bool {
        self.kind.is_none_or(|k| obligation.kind == k)
            && self
                .bank_id
                .as_ref()
                .is_none_or(|b| &obligation.bank_id == b)
            && self
                .category_id
                .as_ref()
                .is_none_or(|c| &obligation.category_id == c)
            && self
                .status
                .is_none_or(|s| derive_status(obligation, today) == s)
            && self.from.is_none_or(|d| obligation.due_date >= d)
            && self.to.is_none_or(|d| obligation.due_date <= d)
    }
}

/// One obligation as it appears on the statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementLine {
    pub obligation_id: String,
    pub description: String,
    pub kind: ObligationKind,
    pub status: DisplayStatus,
    pub amount: BigDecimal,
}

/// One due date's worth of statement lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementDay {
    pub date: NaiveDate,
    pub lines: Vec<StatementLine>,
    pub inflow: BigDecimal,
    pub outflow: BigDecimal,
    /// inflow minus outflow for this day
    pub net: BigDecimal,
    /// Running net over this and every newer day in the statement
    pub accumulated: BigDecimal,
}

/// The full statement for a filter and reference date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    /// Days ordered newest first
    pub days: Vec<StatementDay>,
    pub total_inflow: BigDecimal,
    pub total_outflow: BigDecimal,
    pub total_net: BigDecimal,
}

/// Build a statement from an obligation set. Pure; `today` only feeds
/// the derived status used by the status filter and the line display.
pub fn build_statement(
    obligations: &[Obligation],
    today: NaiveDate,
    filter: &StatementFilter,
) -> Statement {
    let mut by_date: BTreeMap<NaiveDate, Vec<&Obligation>> = BTreeMap::new();
    for obligation in obligations {
        if filter.matches(obligation, today) {
            by_date.entry(obligation.due_date).or_default().push(obligation);
        }
    }

    let zero = BigDecimal::from(0);
    let mut days = Vec::with_capacity(by_date.len());
    let mut accumulated = zero.clone();
    let mut total_inflow = zero.clone();
    let mut total_outflow = zero.clone();

    // newest first, accumulating in display order
    for (date, members) in by_date.into_iter().rev() {
        let mut inflow = zero.clone();
        let mut outflow = zero.clone();
        let mut lines = Vec::with_capacity(members.len());
        for obligation in members {
            match obligation.kind {
                ObligationKind::Receivable => inflow += &obligation.amount,
                ObligationKind::Payable => outflow += &obligation.amount,
            }
            lines.push(StatementLine {
                obligation_id: obligation.id.clone(),
                description: obligation.description.clone(),
                kind: obligation.kind,
                status: derive_status(obligation, today),
                amount: obligation.amount.clone(),
            });
        }
        lines.sort_by(|a, b| a.obligation_id.cmp(&b.obligation_id));

        let net = &inflow - &outflow;
        accumulated += &net;
        total_inflow += &inflow;
        total_outflow += &outflow;
        days.push(StatementDay {
            date,
            lines,
            inflow,
            outflow,
            net,
            accumulated: accumulated.clone(),
        });
    }

    Statement {
        days,
        total_net: &total_inflow - &total_outflow,
        total_inflow,
        total_outflow,
    }
}

impl<S: FinanceStore> FinanceManager<S> {
    /// Statement over a company's obligations
    pub async fn statement(
        &self,
        company_id: &str,
        today: NaiveDate,
        filter: &StatementFilter,
    ) -> FinanceResult<Statement> {
        let obligations = self.store().list_obligations(company_id, None).await?;
        Ok(build_statement(&obligations, today, filter))
    }
}
