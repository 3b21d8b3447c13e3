//! Traits for storage abstraction and atomic compound mutations

use async_trait::async_trait;

use crate::types::*;

/// Storage abstraction for obligations
///
/// Keyed by id, filterable by company. The engine never relies on more
/// than equality filters and multi-id lookups; ordering is applied in
/// memory.
#[async_trait]
pub trait ObligationRepository: Send + Sync {
    /// Save a new obligation
    async fn save_obligation(&mut self, obligation: &Obligation) -> FinanceResult<()>;

    /// Get an obligation by id
    async fn get_obligation(&self, id: &str) -> FinanceResult<Option<Obligation>>;

    /// Multi-id lookup; ids with no matching row are simply absent from
    /// the result
    async fn get_obligations(&self, ids: &[String]) -> FinanceResult<Vec<Obligation>>;

    /// List a company's obligations, optionally filtered by kind
    async fn list_obligations(
        &self,
        company_id: &str,
        kind: Option<ObligationKind>,
    ) -> FinanceResult<Vec<Obligation>>;

    /// Update an existing obligation
    async fn update_obligation(&mut self, obligation: &Obligation) -> FinanceResult<()>;

    /// Delete an obligation
    async fn delete_obligation(&mut self, id: &str) -> FinanceResult<()>;
}

/// Storage abstraction for settlement events (payments and receipts)
#[async_trait]
pub trait SettlementEventRepository: Send + Sync {
    /// Save a new settlement event
    async fn save_event(&mut self, event: &SettlementEvent) -> FinanceResult<()>;

    /// Get a settlement event by id
    async fn get_event(&self, id: &str) -> FinanceResult<Option<SettlementEvent>>;

    /// List a company's settlement events, optionally filtered by kind
    async fn list_events(
        &self,
        company_id: &str,
        kind: Option<ObligationKind>,
    ) -> FinanceResult<Vec<SettlementEvent>>;

    /// List every event that moved funds through a bank account
    async fn list_bank_events(&self, bank_id: &str) -> FinanceResult<Vec<SettlementEvent>>;

    /// Delete a settlement event
    async fn delete_event(&mut self, id: &str) -> FinanceResult<()>;
}

/// Source of bank account records (initial balance + overdraft limit)
///
/// The engine computes running balances itself from settlement history;
/// the store only holds the configured starting point.
#[async_trait]
pub trait BankDirectory: Send + Sync {
    /// Get a bank account by id
    async fn get_bank(&self, bank_id: &str) -> FinanceResult<Option<BankAccount>>;

    /// Save or replace a bank account
    async fn save_bank(&mut self, bank: &BankAccount) -> FinanceResult<()>;
}

/// A single write against the store
#[derive(Debug, Clone)]
pub enum Mutation {
    CreateObligation(Obligation),
    UpdateObligation(Obligation),
    DeleteObligation(String),
    CreateEvent(SettlementEvent),
    DeleteEvent(String),
}

/// An ordered set of writes committed as one atomic unit
///
/// The engines validate everything up front, assemble one batch per
/// compound operation (settle, unsettle, partial settlement, negotiate,
/// installment commit), and hand it to [`UnitOfWork::commit`]. A failure
/// partway through a compound operation therefore never leaves
/// obligations and settlement events inconsistent.
#[derive(Debug, Clone, Default)]
pub struct MutationBatch {
    mutations: Vec<Mutation>,
}

impl MutationBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_obligation(&mut self, obligation: Obligation) -> &mut Self {
        self.mutations.push(Mutation::CreateObligation(obligation));
        self
    }

    pub fn update_obligation(&mut self, obligation: Obligation) -> &mut Self {
        self.mutations.push(Mutation::UpdateObligation(obligation));
        self
    }

    pub fn delete_obligation(&mut self, id: String) -> &mut Self {
        self.mutations.push(Mutation::DeleteObligation(id));
        self
    }

    pub fn create_event(&mut self, event: SettlementEvent) -> &mut Self {
        self.mutations.push(Mutation::CreateEvent(event));
        self
    }

    pub fn delete_event(&mut self, id: String) -> &mut Self {
        self.mutations.push(Mutation::DeleteEvent(id));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Consume the batch, yielding its mutations in commit order
    pub fn into_mutations(self) -> Vec<Mutation> {
        self.mutations
    }
}

/// Atomic commit of a [`MutationBatch`]
///
/// Implementations must apply the whole batch or none of it. A relational
/// adapter maps this to a database transaction; the in-memory store
/// applies it under a single write lock.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    async fn commit(&mut self, batch: MutationBatch) -> FinanceResult<()>;
}

/// Convenience bound for a store that backs the whole engine
pub trait FinanceStore:
    ObligationRepository + SettlementEventRepository + BankDirectory + UnitOfWork
{
}

impl<T> FinanceStore for T where
    T: ObligationRepository + SettlementEventRepository + BankDirectory + UnitOfWork
{
}
