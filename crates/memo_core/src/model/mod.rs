//! Domain model for memos and tags.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own input validation rules shared by every write path.
//!
//! # Invariants
//! - Every memo and tag is identified by a stable integer id assigned by storage.
//! - Tag names are lowercase, trimmed, non-empty and unique.

pub mod memo;
pub mod tag;
