//! Utility modules: money rounding, date stepping, validation, and
//! in-memory storage

pub mod dates;
pub mod memory_store;
pub mod money;
pub mod validation;

pub use memory_store::MemoryStore;
