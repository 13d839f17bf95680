//! # Sett Deployer Common Crate
//!
//! This crate provides common data types, error definitions, and the chain
//! access traits used across the `sett-deployer` workspace.

/// Module for chain error types and failure classification.
pub mod errors;

/// Module for common data structures and contract call descriptions.
pub mod types;

/// Module for the chain backend traits.
pub mod traits;

/// Module for decimal <-> base unit conversion.
pub mod amounts;

pub use alloy_primitives::{address, keccak256, Address, TxHash, U256};

// Re-export key items for easier access.
pub use errors::{ChainError, FailureKind};
pub use traits::{ChainBackend, ContractReader, DevChain};
pub use types::{ContractCall, ContractKind, Fees, PriceFeeds, Receipt, Transaction, MAX_BPS};

#[cfg(feature = "mocks")]
pub use traits::{MockChainBackend, MockContractReader};
