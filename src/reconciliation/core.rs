//! Orchestrator owning the store and the company-scoped CRUD surface
//!
//! The engine-specific compound operations live in sibling modules as
//! further `impl` blocks on [`FinanceManager`].

use chrono::NaiveDate;
use tracing::debug;

use crate::traits::*;
use crate::types::*;
use crate::utils::money::round2;
use crate::utils::validation::*;

/// Reconciliation engine facade over a storage backend
///
/// All operations are scoped by company id: rows belonging to another
/// company behave as if they did not exist.
pub struct FinanceManager<S: FinanceStore> {
    pub(crate) store: S,
}

impl<S: FinanceStore> FinanceManager<S> {
    /// Create a manager over the given storage backend
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Access the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the underlying store (bank setup, adapters)
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Create a single pending obligation
    pub async fn create_obligation(&mut self, input: NewObligation) -> FinanceResult<Obligation> {
        validate_description(&input.description)?;
        validate_positive_amount(&input.amount)?;

        let mut obligation = input.into_obligation();
        obligation.amount = round2(&obligation.amount);
        self.store.save_obligation(&obligation).await?;
        debug!(id = %obligation.id, "created obligation");
        Ok(obligation)
    }

    /// Get an obligation, treating other companies' rows as missing
    pub async fn get_obligation_required(
        &self,
        company_id: &str,
        id: &str,
    ) -> FinanceResult<Obligation> {
        match self.store.get_obligation(id).await? {
            Some(o) if o.company_id == company_id => Ok(o),
            _ => Err(FinanceError::ObligationNotFound(id.to_string())),
        }
    }

    /// Get a settlement event, treating other companies' rows as missing
    pub async fn get_event_required(
        &self,
        company_id: &str,
        id: &str,
    ) -> FinanceResult<SettlementEvent> {
        match self.store.get_event(id).await? {
            Some(e) if e.company_id == company_id => Ok(e),
            _ => Err(FinanceError::SettlementNotFound(id.to_string())),
        }
    }

    /// Update a pending obligation in place
    ///
    /// Settled obligations are immutable except for deletion or
    /// settlement reversal, so updating one is rejected.
    pub async fn update_obligation(&mut self, obligation: &Obligation) -> FinanceResult<()> {
        let existing = self
            .get_obligation_required(&obligation.company_id, &obligation.id)
            .await?;
        if !existing.is_mutable() {
            return Err(FinanceError::InvariantViolation(format!(
                "obligation '{}' is settled and cannot be edited",
                obligation.id
            )));
        }

        validate_description(&obligation.description)?;
        validate_positive_amount(&obligation.amount)?;

        let mut next = obligation.clone();
        next.amount = round2(&next.amount);
        self.store.update_obligation(&next).await
    }

    /// Reschedule a pending obligation (the debt page's due-date edit)
    pub async fn reschedule_obligation(
        &mut self,
        company_id: &str,
        id: &str,
        new_due_date: NaiveDate,
    ) -> FinanceResult<Obligation> {
        let mut obligation = self.get_obligation_required(company_id, id).await?;
        if !obligation.is_mutable() {
            return Err(FinanceError::InvariantViolation(format!(
                "obligation '{id}' is settled and cannot be rescheduled"
            )));
        }
        obligation.due_date = new_due_date;
        self.store.update_obligation(&obligation).await?;
        Ok(obligation)
    }

    /// Delete a single obligation
    pub async fn delete_obligation(&mut self, company_id: &str, id: &str) -> FinanceResult<()> {
        self.get_obligation_required(company_id, id).await?;
        self.store.delete_obligation(id).await
    }

    /// Delete every slice of an installment group, returning how many
    /// were removed
    pub async fn delete_installment_group(
        &mut self,
        company_id: &str,
        group_id: &str,
    ) -> FinanceResult<u32> {
        let members = self.installment_group(company_id, group_id).await?;
        if members.is_empty() {
            return Err(FinanceError::ObligationNotFound(format!(
                "installment group '{group_id}'"
            )));
        }

        let mut batch = MutationBatch::new();
        for member in &members {
            batch.delete_obligation(member.id.clone());
        }
        self.store.commit(batch).await?;
        debug!(group_id, count = members.len(), "deleted installment group");
        Ok(members.len() as u32)
    }

    /// List a company's obligations ordered by due date
    pub async fn list_obligations(
        &self,
        company_id: &str,
        kind: Option<ObligationKind>,
    ) -> FinanceResult<Vec<Obligation>> {
        let mut obligations = self.store.list_obligations(company_id, kind).await?;
        obligations.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.id.cmp(&b.id)));
        Ok(obligations)
    }

    /// List obligations that are pending and past due as of `today`
    pub async fn overdue_obligations(
        &self,
        company_id: &str,
        kind: ObligationKind,
        today: NaiveDate,
    ) -> FinanceResult<Vec<Obligation>> {
        let obligations = self.list_obligations(company_id, Some(kind)).await?;
        Ok(obligations
            .into_iter()
            .filter(|o| derive_status(o, today) == DisplayStatus::Overdue)
            .collect())
    }

    /// Members of an installment group ordered by slice number
    pub async fn installment_group(
        &self,
        company_id: &str,
        group_id: &str,
    ) -> FinanceResult<Vec<Obligation>> {
        let obligations = self.store.list_obligations(company_id, None).await?;
        let mut members: Vec<Obligation> = obligations
            .into_iter()
            .filter(|o| {
                o.installment
                    .as_ref()
                    .is_some_and(|s| s.group_id == group_id)
            })
            .collect();
        members.sort_by_key(|o| o.installment.as_ref().map(|s| s.number).unwrap_or(0));
        Ok(members)
    }

    /// Fragments of a partial-settlement group ordered by slot number
    pub async fn partial_group(
        &self,
        company_id: &str,
        group_id: &str,
    ) -> FinanceResult<Vec<Obligation>> {
        let obligations = self.store.list_obligations(company_id, None).await?;
        let mut members: Vec<Obligation> = obligations
            .into_iter()
            .filter(|o| o.partial.as_ref().is_some_and(|s| s.group_id == group_id))
            .collect();
        members.sort_by_key(|o| o.partial.as_ref().map(|s| s.number).unwrap_or(0));
        Ok(members)
    }

    /// Settlement events touching any fragment of a partial group
    pub async fn partial_group_events(
        &self,
        company_id: &str,
        group_id: &str,
    ) -> FinanceResult<Vec<SettlementEvent>> {
        let member_ids: std::collections::HashSet<String> = self
            .partial_group(company_id, group_id)
            .await?
            .into_iter()
            .map(|o| o.id)
            .collect();

        let mut events: Vec<SettlementEvent> = self
            .store
            .list_events(company_id, None)
            .await?
            .into_iter()
            .filter(|e| e.obligation_ids.iter().any(|id| member_ids.contains(id)))
            .collect();
        events.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(events)
    }

    /// A company's settlement events, newest first
    pub async fn list_events(
        &self,
        company_id: &str,
        kind: Option<ObligationKind>,
    ) -> FinanceResult<Vec<SettlementEvent>> {
        let mut events = self.store.list_events(company_id, kind).await?;
        events.sort_by(|a, b| b.date.cmp(&a.date).then(a.id.cmp(&b.id)));
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_store::MemoryStore;
    use bigdecimal::BigDecimal;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_payable(amount: i64, due: NaiveDate) -> NewObligation {
        NewObligation {
            company_id: "co".to_string(),
            kind: ObligationKind::Payable,
            description: "Rent".to_string(),
            amount: BigDecimal::from(amount),
            due_date: due,
            bank_id: "bank-1".to_string(),
            category_id: "cat-1".to_string(),
            payment_method: Some("pix".to_string()),
            counterpart_id: None,
        }
    }

    #[tokio::test]
    async fn company_scoping_hides_foreign_rows() {
        let mut manager = FinanceManager::new(MemoryStore::new());
        let o = manager
            .create_obligation(new_payable(100, ymd(2024, 3, 1)))
            .await
            .unwrap();

        let err = manager
            .get_obligation_required("someone-else", &o.id)
            .await
            .unwrap_err();
        assert!(matches!(err, FinanceError::ObligationNotFound(_)));
    }

    #[tokio::test]
    async fn settled_obligation_is_immutable() {
        let mut manager = FinanceManager::new(MemoryStore::new());
        let mut o = manager
            .create_obligation(new_payable(100, ymd(2024, 3, 1)))
            .await
            .unwrap();

        o.status = ObligationStatus::Settled;
        manager.store_mut().update_obligation(&o).await.unwrap();

        o.description = "changed".to_string();
        let err = manager.update_obligation(&o).await.unwrap_err();
        assert!(matches!(err, FinanceError::InvariantViolation(_)));

        let err = manager
            .reschedule_obligation("co", &o.id, ymd(2024, 4, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, FinanceError::InvariantViolation(_)));
    }

    #[tokio::test]
    async fn listing_orders_by_due_date() {
        let mut manager = FinanceManager::new(MemoryStore::new());
        manager
            .create_obligation(new_payable(10, ymd(2024, 5, 1)))
            .await
            .unwrap();
        manager
            .create_obligation(new_payable(20, ymd(2024, 2, 1)))
            .await
            .unwrap();

        let listed = manager.list_obligations("co", None).await.unwrap();
        assert_eq!(listed[0].due_date, ymd(2024, 2, 1));
        assert_eq!(listed[1].due_date, ymd(2024, 5, 1));
    }

    #[tokio::test]
    async fn overdue_filter_uses_reference_date() {
        let mut manager = FinanceManager::new(MemoryStore::new());
        manager
            .create_obligation(new_payable(10, ymd(2024, 5, 1)))
            .await
            .unwrap();

        let overdue = manager
            .overdue_obligations("co", ObligationKind::Payable, ymd(2024, 5, 2))
            .await
            .unwrap();
        assert_eq!(overdue.len(), 1);

        let none = manager
            .overdue_obligations("co", ObligationKind::Payable, ymd(2024, 5, 1))
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
