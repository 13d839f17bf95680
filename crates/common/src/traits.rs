//! Chain access seams shared by the orchestrator, the scenarios and the backends.

use crate::errors::ChainError;
use crate::types::{ContractKind, Receipt, Transaction};
use alloy_primitives::{Address, U256};
use async_trait::async_trait;

/// Deploys contracts and sends transactions, blocking until each is mined.
#[cfg_attr(feature = "mocks", mockall::automock)]
#[async_trait]
pub trait ChainBackend: Send + Sync {
    /// Accounts the backend can sign for without further setup.
    async fn accounts(&self) -> Result<Vec<Address>, ChainError>;

    /// Whether transactions from `account` can currently be sent.
    async fn can_sign(&self, account: Address) -> Result<bool, ChainError>;

    /// Unlocks `account` for sending on a development chain.
    async fn impersonate(&self, account: Address) -> Result<(), ChainError> {
        Err(ChainError::Unsupported(format!(
            "cannot impersonate {} on this backend",
            account
        )))
    }

    /// Deploys a fresh instance of `kind` from `from`, returning its address.
    async fn deploy(&self, kind: ContractKind, from: Address) -> Result<Address, ChainError>;

    /// Sends `tx` and waits for its receipt. Reverts surface as [`ChainError::Reverted`].
    async fn send(&self, tx: Transaction) -> Result<Receipt, ChainError>;

    async fn native_balance(&self, account: Address) -> Result<U256, ChainError>;

    /// ERC-20 `decimals()` of `token`.
    async fn decimals(&self, token: Address) -> Result<u8, ChainError>;

    /// Timestamp of the latest block, in seconds.
    async fn timestamp(&self) -> Result<u64, ChainError>;
}

/// Read-only views over the deployed system and its external collaborators.
#[cfg_attr(feature = "mocks", mockall::automock)]
#[async_trait]
pub trait ContractReader: Send + Sync {
    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, ChainError>;

    async fn balance_of_pool(&self, strategy: Address) -> Result<U256, ChainError>;

    async fn balance_of_want(&self, strategy: Address) -> Result<U256, ChainError>;

    async fn is_tendable(&self, strategy: Address) -> Result<bool, ChainError>;

    async fn strategy_want(&self, strategy: Address) -> Result<Address, ChainError>;

    /// Primary reward token the strategy harvests.
    async fn strategy_reward(&self, strategy: Address) -> Result<Address, ChainError>;

    /// The Curve pool the strategy provides liquidity to (`CURVE_POOL()`).
    async fn curve_pool(&self, strategy: Address) -> Result<Address, ChainError>;

    /// The rewards gauge the strategy stakes in (`crvTokenGauge()`).
    async fn reward_gauge(&self, strategy: Address) -> Result<Address, ChainError>;

    async fn virtual_price(&self, pool: Address) -> Result<U256, ChainError>;

    /// Claimable rewards as of the gauge's last checkpoint for `account`.
    async fn claimable_reward(
        &self,
        gauge: Address,
        account: Address,
        token: Address,
    ) -> Result<U256, ChainError>;

    async fn controller_vault(&self, controller: Address, token: Address)
        -> Result<Address, ChainError>;

    async fn controller_strategy(
        &self,
        controller: Address,
        token: Address,
    ) -> Result<Address, ChainError>;

    async fn vault_paused(&self, vault: Address) -> Result<bool, ChainError>;
}

/// Clock and block control available on development chains only.
#[async_trait]
pub trait DevChain: Send + Sync {
    /// Advances the chain clock by `seconds`.
    async fn sleep(&self, seconds: u64) -> Result<(), ChainError>;

    /// Mines `blocks` empty blocks.
    async fn mine(&self, blocks: u64) -> Result<(), ChainError>;
}
