//! # Chain RPC
//!
//! [`ChainBackend`](common::ChainBackend), [`ContractReader`](common::ContractReader)
//! and [`DevChain`](common::DevChain) over an Ethereum JSON-RPC node, built on
//! alloy. Development forks sign with the node's unlocked accounts and support
//! impersonation; live networks sign locally with the deployer key.

pub mod abi;
pub mod artifacts;
mod client;

pub use artifacts::ArtifactStore;
pub use client::RpcChain;
