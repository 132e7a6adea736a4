//! # docvault-entity
//!
//! Domain entity models for DocVault. Every struct in this crate represents
//! a database table row or an insert payload. Row entities additionally
//! derive `sqlx::FromRow`.

pub mod document;
pub mod version;
