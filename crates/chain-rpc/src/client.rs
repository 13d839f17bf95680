use crate::abi::{encode, ICurvePool, IController, IERC20, IRewardsGauge, ISett, IStrategy};
use crate::artifacts::ArtifactStore;
use alloy::eips::BlockNumberOrTag;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, TxKind, U256};
use alloy::providers::ext::AnvilApi;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionInput, TransactionReceipt, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::{decode_revert_reason, Revert, SolError};
use alloy::transports::{RpcError, TransportErrorKind};
use async_trait::async_trait;
use common::{
    ChainBackend, ChainError, ContractKind, ContractReader, DevChain, Receipt, Transaction,
};
use std::collections::HashSet;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

/// The reason string carried by ABI-encoded revert data.
fn revert_data_reason(data: &[u8]) -> Option<String> {
    match Revert::abi_decode(data) {
        Ok(revert) => Some(revert.reason),
        // Panics and custom errors have no reason string of their own
        Err(_) => decode_revert_reason(data),
    }
}

fn map_rpc_error(err: RpcError<TransportErrorKind>) -> ChainError {
    let Some(payload) = err.as_error_resp() else {
        return ChainError::Transport(err.to_string());
    };
    if let Some(reason) = payload
        .as_revert_data()
        .and_then(|data| revert_data_reason(&data))
    {
        return ChainError::Reverted(reason);
    }
    ChainError::from_rpc_message(payload.message.to_string())
}

fn map_contract_error(err: alloy::contract::Error) -> ChainError {
    match err {
        alloy::contract::Error::TransportError(e) => map_rpc_error(e),
        other => ChainError::Transport(other.to_string()),
    }
}

fn to_receipt(receipt: &TransactionReceipt) -> Receipt {
    Receipt {
        tx_hash: receipt.transaction_hash,
        block_number: receipt.block_number.unwrap_or_default(),
        gas_used: receipt.gas_used,
    }
}

/// A JSON-RPC node: a local development fork or a live network.
pub struct RpcChain {
    provider: DynProvider,
    artifacts: ArtifactStore,
    /// Accounts holding a local key; empty on development chains where the node signs.
    signers: Vec<Address>,
    impersonated: RwLock<HashSet<Address>>,
}

impl RpcChain {
    /// Connects to an Anvil development node whose accounts it unlocks.
    pub fn connect_dev(url: Url, artifacts: ArtifactStore) -> Self {
        let provider = ProviderBuilder::new().connect_http(url).erased();
        RpcChain {
            provider,
            artifacts,
            signers: Vec::new(),
            impersonated: RwLock::new(HashSet::new()),
        }
    }

    /// Connects to a live network, signing locally with `key`.
    pub fn connect_live(url: Url, key: &str, artifacts: ArtifactStore) -> Result<Self, ChainError> {
        let signer: PrivateKeySigner = key
            .trim()
            .parse()
            .map_err(|e| ChainError::Transport(format!("invalid deployer key: {}", e)))?;
        let address = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();
        info!(%address, "Loaded deployer key");
        Ok(RpcChain {
            provider,
            artifacts,
            signers: vec![address],
            impersonated: RwLock::new(HashSet::new()),
        })
    }

    fn is_dev(&self) -> bool {
        self.signers.is_empty()
    }

    async fn submit(&self, request: TransactionRequest) -> Result<TransactionReceipt, ChainError> {
        // Dry-run first so reverts surface with their reason string
        self.provider
            .call(request.clone())
            .await
            .map_err(map_rpc_error)?;
        let pending = self
            .provider
            .send_transaction(request)
            .await
            .map_err(map_rpc_error)?;
        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;
        if !receipt.status() {
            return Err(ChainError::Reverted(String::new()));
        }
        Ok(receipt)
    }
}

#[async_trait]
impl ChainBackend for RpcChain {
    async fn accounts(&self) -> Result<Vec<Address>, ChainError> {
        if !self.is_dev() {
            return Ok(self.signers.clone());
        }
        self.provider.get_accounts().await.map_err(map_rpc_error)
    }

    async fn can_sign(&self, account: Address) -> Result<bool, ChainError> {
        if self.signers.contains(&account) || self.impersonated.read().await.contains(&account) {
            return Ok(true);
        }
        if !self.is_dev() {
            return Ok(false);
        }
        Ok(self.accounts().await?.contains(&account))
    }

    async fn impersonate(&self, account: Address) -> Result<(), ChainError> {
        if !self.is_dev() {
            return Err(ChainError::Unsupported(format!(
                "cannot impersonate {} on a live network",
                account
            )));
        }
        self.provider
            .anvil_impersonate_account(account)
            .await
            .map_err(map_rpc_error)?;
        self.impersonated.write().await.insert(account);
        debug!(%account, "Impersonating account");
        Ok(())
    }

    async fn deploy(&self, kind: ContractKind, from: Address) -> Result<Address, ChainError> {
        let bytecode = self.artifacts.bytecode(kind).await?;
        let mut request = TransactionRequest::default()
            .with_from(from)
            .input(TransactionInput::both(bytecode));
        request.to = Some(TxKind::Create);

        let receipt = self.submit(request).await?;
        let address = receipt.contract_address.ok_or_else(|| {
            ChainError::Transport(format!("no contract address in receipt for {}", kind))
        })?;
        debug!(%kind, %address, tx = %receipt.transaction_hash, "Contract deployed");
        Ok(address)
    }

    async fn send(&self, tx: Transaction) -> Result<Receipt, ChainError> {
        let function = tx.call.function_name();
        let request = TransactionRequest::default()
            .with_from(tx.from)
            .with_to(tx.to)
            .with_value(tx.value)
            .input(TransactionInput::both(encode(&tx.call)));

        match self.submit(request).await {
            Ok(receipt) => {
                debug!(function, to = %tx.to, tx = %receipt.transaction_hash, "Transaction mined");
                Ok(to_receipt(&receipt))
            }
            Err(e) => {
                warn!(function, to = %tx.to, error = %e, "Transaction failed");
                Err(e)
            }
        }
    }

    async fn native_balance(&self, account: Address) -> Result<U256, ChainError> {
        self.provider
            .get_balance(account)
            .await
            .map_err(map_rpc_error)
    }

    async fn decimals(&self, token: Address) -> Result<u8, ChainError> {
        IERC20::new(token, &self.provider)
            .decimals()
            .call()
            .await
            .map_err(map_contract_error)
    }

    async fn timestamp(&self) -> Result<u64, ChainError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(map_rpc_error)?
            .ok_or_else(|| ChainError::Transport("latest block unavailable".to_string()))?;
        Ok(block.header.timestamp)
    }
}

#[async_trait]
impl ContractReader for RpcChain {
    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, ChainError> {
        IERC20::new(token, &self.provider)
            .balanceOf(owner)
            .call()
            .await
            .map_err(map_contract_error)
    }

    async fn balance_of_pool(&self, strategy: Address) -> Result<U256, ChainError> {
        IStrategy::new(strategy, &self.provider)
            .balanceOfPool()
            .call()
            .await
            .map_err(map_contract_error)
    }

    async fn balance_of_want(&self, strategy: Address) -> Result<U256, ChainError> {
        IStrategy::new(strategy, &self.provider)
            .balanceOfWant()
            .call()
            .await
            .map_err(map_contract_error)
    }

    async fn is_tendable(&self, strategy: Address) -> Result<bool, ChainError> {
        IStrategy::new(strategy, &self.provider)
            .isTendable()
            .call()
            .await
            .map_err(map_contract_error)
    }

    async fn strategy_want(&self, strategy: Address) -> Result<Address, ChainError> {
        IStrategy::new(strategy, &self.provider)
            .want()
            .call()
            .await
            .map_err(map_contract_error)
    }

    async fn strategy_reward(&self, strategy: Address) -> Result<Address, ChainError> {
        IStrategy::new(strategy, &self.provider)
            .reward()
            .call()
            .await
            .map_err(map_contract_error)
    }

    async fn curve_pool(&self, strategy: Address) -> Result<Address, ChainError> {
        IStrategy::new(strategy, &self.provider)
            .CURVE_POOL()
            .call()
            .await
            .map_err(map_contract_error)
    }

    async fn reward_gauge(&self, strategy: Address) -> Result<Address, ChainError> {
        IStrategy::new(strategy, &self.provider)
            .crvTokenGauge()
            .call()
            .await
            .map_err(map_contract_error)
    }

    async fn virtual_price(&self, pool: Address) -> Result<U256, ChainError> {
        ICurvePool::new(pool, &self.provider)
            .get_virtual_price()
            .call()
            .await
            .map_err(map_contract_error)
    }

    async fn claimable_reward(
        &self,
        gauge: Address,
        account: Address,
        token: Address,
    ) -> Result<U256, ChainError> {
        IRewardsGauge::new(gauge, &self.provider)
            .claimable_reward(account, token)
            .call()
            .await
            .map_err(map_contract_error)
    }

    async fn controller_vault(
        &self,
        controller: Address,
        token: Address,
    ) -> Result<Address, ChainError> {
        IController::new(controller, &self.provider)
            .vaults(token)
            .call()
            .await
            .map_err(map_contract_error)
    }

    async fn controller_strategy(
        &self,
        controller: Address,
        token: Address,
    ) -> Result<Address, ChainError> {
        IController::new(controller, &self.provider)
            .strategies(token)
            .call()
            .await
            .map_err(map_contract_error)
    }

    async fn vault_paused(&self, vault: Address) -> Result<bool, ChainError> {
        ISett::new(vault, &self.provider)
            .paused()
            .call()
            .await
            .map_err(map_contract_error)
    }
}

#[async_trait]
impl DevChain for RpcChain {
    async fn sleep(&self, seconds: u64) -> Result<(), ChainError> {
        self.provider
            .anvil_increase_time(seconds)
            .await
            .map_err(map_rpc_error)?;
        Ok(())
    }

    async fn mine(&self, blocks: u64) -> Result<(), ChainError> {
        self.provider
            .anvil_mine(Some(blocks), None)
            .await
            .map_err(map_rpc_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::rpc::json_rpc::ErrorPayload;
    use common::FailureKind;

    fn error_response(message: &str) -> RpcError<TransportErrorKind> {
        RpcError::ErrorResp(ErrorPayload {
            code: 3,
            message: message.to_string().into(),
            data: None,
        })
    }

    #[test]
    fn test_revert_reason_from_error_response() {
        let err = map_rpc_error(error_response("execution reverted: onlyGovernance"));
        assert_eq!(err, ChainError::Reverted("onlyGovernance".to_string()));
    }

    fn error_with_data(message: &str, data: &[u8]) -> RpcError<TransportErrorKind> {
        let json = format!(
            r#"{{"code":3,"message":"{}","data":"{}"}}"#,
            message,
            alloy::primitives::hex::encode_prefixed(data)
        );
        RpcError::ErrorResp(serde_json::from_str::<ErrorPayload>(&json).unwrap())
    }

    #[test]
    fn test_revert_reason_from_revert_data() {
        let data = Revert {
            reason: "onlyGovernance".to_string(),
        }
        .abi_encode();
        let err = map_rpc_error(error_with_data("execution reverted", &data));
        assert_eq!(err, ChainError::Reverted("onlyGovernance".to_string()));
        assert_eq!(err.kind(), FailureKind::Authorization);
    }

    #[test]
    fn test_revert_data_wins_over_message() {
        let data = Revert {
            reason: "Pausable: paused".to_string(),
        }
        .abi_encode();
        let err = map_rpc_error(error_with_data(
            "execution reverted: Pausable: paused",
            &data,
        ));
        assert_eq!(err.revert_reason(), Some("Pausable: paused"));
    }

    #[test]
    fn test_hardhat_revert_message() {
        let err = map_rpc_error(error_response(
            "Error: VM Exception while processing transaction: \
             reverted with reason string 'onlyGovernance'",
        ));
        assert_eq!(err, ChainError::Reverted("onlyGovernance".to_string()));
        assert_eq!(err.kind(), FailureKind::Authorization);
    }

    #[test]
    fn test_non_revert_error_is_transport() {
        let err = map_rpc_error(error_response("nonce too low"));
        assert_eq!(err, ChainError::Transport("nonce too low".to_string()));
    }

    #[test]
    fn test_live_key_parsing() {
        let artifacts = ArtifactStore::new("build");
        let url: Url = "http://127.0.0.1:8545".parse().unwrap();
        assert!(RpcChain::connect_live(url.clone(), "not-a-key", artifacts.clone()).is_err());

        // Anvil's first dev key
        let chain = RpcChain::connect_live(
            url,
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
            artifacts,
        )
        .unwrap();
        assert_eq!(
            chain.signers,
            vec![alloy::primitives::address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266")]
        );
    }
}
