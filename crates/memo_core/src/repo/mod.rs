//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `MemoDraft::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `InvalidTag`) in
//!   addition to DB transport errors.

pub mod memo_repo;
