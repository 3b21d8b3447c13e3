//! Partial settlement: peel a settled fragment off a pending obligation
//!
//! Each partial settlement splits the obligation into a fully-settled
//! fragment (new id) and a shrunken remainder that keeps the original id
//! and absorbs future partial settlements. All fragments of a group agree
//! on the group size, and the remainder always occupies the last slot.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use tracing::debug;

use crate::reconciliation::core::FinanceManager;
use crate::traits::*;
use crate::types::*;
use crate::utils::money::round2;
use crate::utils::validation::validate_positive_amount;

/// Input for a partial settlement
#[derive(Debug, Clone)]
pub struct PartialSettlementRequest {
    pub company_id: String,
    pub obligation_id: String,
    /// Must be strictly between zero and the obligation's amount
    pub amount: BigDecimal,
    pub date: NaiveDate,
    pub bank_id: String,
    pub payment_method: Option<String>,
}

/// What a partial settlement produced
#[derive(Debug, Clone)]
pub struct PartialSettlementOutcome {
    /// The newly created, fully settled fragment
    pub fragment: Obligation,
    /// The original obligation, shrunk to the open remainder
    pub remainder: Obligation,
    /// The event linking the fragment
    pub event: SettlementEvent,
}

impl<S: FinanceStore> FinanceManager<S> {
    /// Partially settle a pending obligation.
    ///
    /// The paid amount becomes a settled fragment with its own id and
    /// settlement event; the original obligation shrinks in place and
    /// stays pending. Paying the full amount (or more) is rejected — full
    /// settlement goes through [`FinanceManager::settle`].
    pub async fn partial_settle(
        &mut self,
        request: PartialSettlementRequest,
    ) -> FinanceResult<PartialSettlementOutcome> {
        validate_positive_amount(&request.amount)?;
        let paid = round2(&request.amount);

        let obligation = self
            .get_obligation_required(&request.company_id, &request.obligation_id)
            .await?;
        if obligation.status != ObligationStatus::Pending {
            return Err(FinanceError::InvariantViolation(format!(
                "obligation '{}' is already settled",
                obligation.id
            )));
        }
        if paid >= obligation.amount {
            return Err(FinanceError::InvariantViolation(
                "partial amount must be below the obligation amount; use a full settlement"
                    .to_string(),
            ));
        }
        if obligation.kind == ObligationKind::Payable {
            self.check_funds(&request.bank_id, &paid).await?;
        } else if self.store.get_bank(&request.bank_id).await?.is_none() {
            return Err(FinanceError::BankNotFound(request.bank_id.clone()));
        }

        let group_id = obligation
            .partial
            .as_ref()
            .map(|s| s.group_id.clone())
            .unwrap_or_else(new_id);

        // Fragments already peeled off this obligation.
        let siblings: Vec<Obligation> = self
            .partial_group(&request.company_id, &group_id)
            .await?
            .into_iter()
            .filter(|o| o.id != obligation.id)
            .collect();
        let settled_count = siblings
            .iter()
            .filter(|o| o.status == ObligationStatus::Settled)
            .count() as u32;
        let new_total = settled_count + 2;

        let mut fragment = obligation.clone();
        fragment.id = new_id();
        fragment.amount = paid.clone();
        fragment.status = ObligationStatus::Settled;
        fragment.partial = Some(PartialSlot {
            group_id: group_id.clone(),
            number: settled_count + 1,
            total: new_total,
        });

        let mut remainder = obligation.clone();
        remainder.amount = round2(&(&obligation.amount - &paid));
        remainder.partial = Some(PartialSlot {
            group_id: group_id.clone(),
            number: settled_count + 2,
            total: new_total,
        });

        let event = SettlementEvent {
            id: new_id(),
            company_id: request.company_id.clone(),
            kind: obligation.kind,
            date: request.date,
            bank_id: request.bank_id.clone(),
            amount: paid,
            description: match obligation.kind {
                ObligationKind::Payable => {
                    format!("Partial payment: {}", obligation.description)
                }
                ObligationKind::Receivable => {
                    format!("Partial receipt: {}", obligation.description)
                }
            },
            payment_method: request.payment_method.clone(),
            obligation_ids: vec![fragment.id.clone()],
            adjustments: None,
        };

        let mut batch = MutationBatch::new();
        batch.create_obligation(fragment.clone());
        batch.update_obligation(remainder.clone());
        // keep every earlier fragment's view of the group size current
        for mut sibling in siblings {
            if let Some(slot) = sibling.partial.as_mut() {
                slot.total = new_total;
            }
            batch.update_obligation(sibling);
        }
        batch.create_event(event.clone());
        self.store.commit(batch).await?;

        debug!(%group_id, slot = new_total, "recorded partial settlement");
        Ok(PartialSettlementOutcome {
            fragment,
            remainder,
            event,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_store::MemoryStore;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn setup(initial: &str) -> FinanceManager<MemoryStore> {
        let mut store = MemoryStore::new();
        store
            .save_bank(&BankAccount {
                id: "bank-1".to_string(),
                company_id: "co".to_string(),
                name: "Conta Corrente".to_string(),
                initial_balance: dec(initial),
                overdraft_limit: dec("0.00"),
            })
            .await
            .unwrap();
        FinanceManager::new(store)
    }

    fn new_payable(amount: &str) -> NewObligation {
        NewObligation {
            company_id: "co".to_string(),
            kind: ObligationKind::Payable,
            description: "Fornecedor".to_string(),
            amount: dec(amount),
            due_date: ymd(2024, 4, 10),
            bank_id: "bank-1".to_string(),
            category_id: "cat".to_string(),
            payment_method: Some("pix".to_string()),
            counterpart_id: None,
        }
    }

    fn partial_request(id: &str, amount: &str) -> PartialSettlementRequest {
        PartialSettlementRequest {
            company_id: "co".to_string(),
            obligation_id: id.to_string(),
            amount: dec(amount),
            date: ymd(2024, 4, 15),
            bank_id: "bank-1".to_string(),
            payment_method: Some("pix".to_string()),
        }
    }

    #[tokio::test]
    async fn first_partial_creates_a_two_slot_group() {
        let mut manager = setup("1000.00").await;
        let o = manager.create_obligation(new_payable("500.00")).await.unwrap();

        let outcome = manager
            .partial_settle(partial_request(&o.id, "200.00"))
            .await
            .unwrap();

        assert_eq!(outcome.fragment.amount, dec("200.00"));
        assert_eq!(outcome.fragment.status, ObligationStatus::Settled);
        let frag_slot = outcome.fragment.partial.as_ref().unwrap();
        assert_eq!((frag_slot.number, frag_slot.total), (1, 2));

        assert_eq!(outcome.remainder.id, o.id);
        assert_eq!(outcome.remainder.amount, dec("300.00"));
        assert_eq!(outcome.remainder.status, ObligationStatus::Pending);
        let rem_slot = outcome.remainder.partial.as_ref().unwrap();
        assert_eq!((rem_slot.number, rem_slot.total), (2, 2));

        assert_eq!(outcome.event.amount, dec("200.00"));
        assert_eq!(outcome.event.obligation_ids, vec![outcome.fragment.id.clone()]);
    }

    #[tokio::test]
    async fn repeated_partials_renumber_the_group() {
        let mut manager = setup("1000.00").await;
        let o = manager.create_obligation(new_payable("500.00")).await.unwrap();

        manager
            .partial_settle(partial_request(&o.id, "200.00"))
            .await
            .unwrap();
        let outcome = manager
            .partial_settle(partial_request(&o.id, "100.00"))
            .await
            .unwrap();

        let group_id = outcome.remainder.partial.as_ref().unwrap().group_id.clone();
        let group = manager.partial_group("co", &group_id).await.unwrap();
        assert_eq!(group.len(), 3);

        // every member agrees on the group size; remainder holds the last slot
        for member in &group {
            assert_eq!(member.partial.as_ref().unwrap().total, 3);
        }
        assert_eq!(group[0].amount, dec("200.00"));
        assert_eq!(group[1].amount, dec("100.00"));
        assert_eq!(group[2].id, o.id);
        assert_eq!(group[2].amount, dec("200.00"));
        assert_eq!(group[2].status, ObligationStatus::Pending);

        // fragment amounts plus remainder reconstruct the original
        let sum: BigDecimal = group
            .iter()
            .fold(BigDecimal::from(0), |acc, m| acc + &m.amount);
        assert_eq!(sum, dec("500.00"));

        let events = manager.partial_group_events("co", &group_id).await.unwrap();
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn full_amount_is_rejected() {
        let mut manager = setup("1000.00").await;
        let o = manager.create_obligation(new_payable("500.00")).await.unwrap();

        let err = manager
            .partial_settle(partial_request(&o.id, "500.00"))
            .await
            .unwrap_err();
        assert!(matches!(err, FinanceError::InvariantViolation(_)));

        let err = manager
            .partial_settle(partial_request(&o.id, "500.01"))
            .await
            .unwrap_err();
        assert!(matches!(err, FinanceError::InvariantViolation(_)));
    }

    #[tokio::test]
    async fn partial_payable_is_funds_guarded() {
        let mut manager = setup("50.00").await;
        let o = manager.create_obligation(new_payable("500.00")).await.unwrap();

        let err = manager
            .partial_settle(partial_request(&o.id, "50.01"))
            .await
            .unwrap_err();
        assert!(matches!(err, FinanceError::InsufficientFunds { .. }));

        // nothing applied
        let unchanged = manager.get_obligation_required("co", &o.id).await.unwrap();
        assert_eq!(unchanged.amount, dec("500.00"));
        assert!(unchanged.partial.is_none());
    }

    #[tokio::test]
    async fn partial_receivable_skips_funds_guard() {
        let mut manager = setup("0.00").await;
        let mut input = new_payable("500.00");
        input.kind = ObligationKind::Receivable;
        let o = manager.create_obligation(input).await.unwrap();

        let outcome = manager
            .partial_settle(partial_request(&o.id, "499.99"))
            .await
            .unwrap();
        assert_eq!(outcome.remainder.amount, dec("0.01"));
    }

    proptest! {
        // fragment + remainder always reconstruct the original amount
        #[test]
        fn conservation_over_arbitrary_splits(
            total_cents in 2i64..10_000_000,
            paid_ratio in 1u32..1000,
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            rt.block_on(async {
                let total = BigDecimal::new(total_cents.into(), 2);
                let paid_cents = ((total_cents as i128 * paid_ratio as i128) / 1000).max(1) as i64;
                if paid_cents >= total_cents {
                    return Ok(());
                }
                let paid = BigDecimal::new(paid_cents.into(), 2);

                let mut manager = setup("100000000.00").await;
                let mut input = new_payable("1.00");
                input.amount = total.clone();
                let o = manager.create_obligation(input).await.unwrap();

                let mut request = partial_request(&o.id, "1.00");
                request.amount = paid.clone();
                let outcome = manager.partial_settle(request).await.unwrap();

                prop_assert_eq!(
                    &outcome.fragment.amount + &outcome.remainder.amount,
                    total
                );
                prop_assert_eq!(outcome.fragment.amount, paid);
                Ok(())
            })?;
        }
    }
}
