//! Leave entitlement, carry-over, and conflict-resolution engine
//! extracted from an HR administration backend.
//!
//! The engine computes earned and remaining paid-leave days, guards
//! leave-request state transitions, keeps an append-only adjustment
//! ledger, and runs the idempotent year-end carry-over batch. All
//! persistence goes through the [`store::LeaveStore`] collaborator;
//! callers own authentication, authorization, and transport concerns.

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod model;
pub mod store;

pub use engine::LeaveEngine;
pub use error::EngineError;
