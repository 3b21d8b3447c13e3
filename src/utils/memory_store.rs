//! In-memory storage implementation for testing and development

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::traits::*;
use crate::types::*;

/// In-memory store backing all repository traits
///
/// Clones share the underlying maps. Batch commits are applied under the
/// write locks of every touched map, so a compound operation is
/// all-or-nothing: the batch is validated against the guarded state
/// before the first mutation is applied.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    obligations: Arc<RwLock<HashMap<String, Obligation>>>,
    events: Arc<RwLock<HashMap<String, SettlementEvent>>>,
    banks: Arc<RwLock<HashMap<String, BankAccount>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.obligations.write().unwrap().clear();
        self.events.write().unwrap().clear();
        self.banks.write().unwrap().clear();
    }
}

#[async_trait]
impl ObligationRepository for MemoryStore {
    async fn save_obligation(&mut self, obligation: &Obligation) -> FinanceResult<()> {
        self.obligations
            .write()
            .unwrap()
            .insert(obligation.id.clone(), obligation.clone());
        Ok(())
    }

    async fn get_obligation(&self, id: &str) -> FinanceResult<Option<Obligation>> {
        Ok(self.obligations.read().unwrap().get(id).cloned())
    }

    async fn get_obligations(&self, ids: &[String]) -> FinanceResult<Vec<Obligation>> {
        let obligations = self.obligations.read().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| obligations.get(id).cloned())
            .collect())
    }

    async fn list_obligations(
        &self,
        company_id: &str,
        kind: Option<ObligationKind>,
    ) -> FinanceResult<Vec<Obligation>> {
        let obligations = self.obligations.read().unwrap();
        Ok(obligations
            .values()
            .filter(|o| o.company_id == company_id && kind.is_none_or(|k| o.kind == k))
            .cloned()
            .collect())
    }

    async fn update_obligation(&mut self, obligation: &Obligation) -> FinanceResult<()> {
        let mut obligations = self.obligations.write().unwrap();
        if !obligations.contains_key(&obligation.id) {
            return Err(FinanceError::ObligationNotFound(obligation.id.clone()));
        }
        obligations.insert(obligation.id.clone(), obligation.clone());
        Ok(())
    }

    async fn delete_obligation(&mut self, id: &str) -> FinanceResult<()> {
        if self.obligations.write().unwrap().remove(id).is_some() {
            Ok(())
        } else {
            Err(FinanceError::ObligationNotFound(id.to_string()))
        }
    }
}

#[async_trait]
impl SettlementEventRepository for MemoryStore {
    async fn save_event(&mut self, event: &SettlementEvent) -> FinanceResult<()> {
        self.events
            .write()
            .unwrap()
            .insert(event.id.clone(), event.clone());
        Ok(())
    }

    async fn get_event(&self, id: &str) -> FinanceResult<Option<SettlementEvent>> {
        Ok(self.events.read().unwrap().get(id).cloned())
    }

    async fn list_events(
        &self,
        company_id: &str,
        kind: Option<ObligationKind>,
    ) -> FinanceResult<Vec<SettlementEvent>> {
        let events = self.events.read().unwrap();
        Ok(events
            .values()
            .filter(|e| e.company_id == company_id && kind.is_none_or(|k| e.kind == k))
            .cloned()
            .collect())
    }

    async fn list_bank_events(&self, bank_id: &str) -> FinanceResult<Vec<SettlementEvent>> {
        let events = self.events.read().unwrap();
        Ok(events
            .values()
            .filter(|e| e.bank_id == bank_id)
            .cloned()
            .collect())
    }

    async fn delete_event(&mut self, id: &str) -> FinanceResult<()> {
        if self.events.write().unwrap().remove(id).is_some() {
            Ok(())
        } else {
            Err(FinanceError::SettlementNotFound(id.to_string()))
        }
    }
}

#[async_trait]
impl BankDirectory for MemoryStore {
    async fn get_bank(&self, bank_id: &str) -> FinanceResult<Option<BankAccount>> {
        Ok(self.banks.read().unwrap().get(bank_id).cloned())
    }

    async fn save_bank(&mut self, bank: &BankAccount) -> FinanceResult<()> {
        self.banks
            .write()
            .unwrap()
            .insert(bank.id.clone(), bank.clone());
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for MemoryStore {
    async fn commit(&mut self, batch: MutationBatch) -> FinanceResult<()> {
        let mut obligations = self.obligations.write().unwrap();
        let mut events = self.events.write().unwrap();
        let mutations = batch.into_mutations();

        // Validate the whole batch before touching anything.
        for mutation in &mutations {
            match mutation {
                Mutation::UpdateObligation(o) => {
                    if !obligations.contains_key(&o.id) {
                        return Err(FinanceError::ObligationNotFound(o.id.clone()));
                    }
                }
                Mutation::DeleteObligation(id) => {
                    if !obligations.contains_key(id) {
                        return Err(FinanceError::ObligationNotFound(id.clone()));
                    }
                }
                Mutation::DeleteEvent(id) => {
                    if !events.contains_key(id) {
                        return Err(FinanceError::SettlementNotFound(id.clone()));
                    }
                }
                Mutation::CreateObligation(_) | Mutation::CreateEvent(_) => {}
            }
        }

        for mutation in mutations {
            match mutation {
                Mutation::CreateObligation(o) | Mutation::UpdateObligation(o) => {
                    obligations.insert(o.id.clone(), o);
                }
                Mutation::DeleteObligation(id) => {
                    obligations.remove(&id);
                }
                Mutation::CreateEvent(e) => {
                    events.insert(e.id.clone(), e);
                }
                Mutation::DeleteEvent(id) => {
                    events.remove(&id);
                }
            }
        }

        Ok(())
    }
}
