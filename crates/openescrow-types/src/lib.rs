//! # openescrow-types
//!
//! Shared types, errors, and configuration for the **OpenEscrow** ledger.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`Address`], [`OrderId`], [`EscrowKey`]
//! - **Call model**: [`CallContext`]
//! - **Lock model**: [`LockState`]
//! - **Notifications**: [`LedgerEvent`], [`EventKind`]
//! - **Configuration**: [`LedgerConfig`]
//! - **Errors**: [`EscrowError`] with `ESC_ERR_` prefix codes
//! - **Constants**: fee scale and defaults
//!
//! Amounts and fee rates are 256-bit unsigned integers ([`U256`]).

pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod event;
pub mod ids;
pub mod lock;

pub use config::*;
pub use context::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use lock::*;

pub use primitive_types::U256;

// Constants are accessed via `openescrow_types::constants::FOO`
// (not re-exported to avoid name collisions).
