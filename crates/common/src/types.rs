use alloy_primitives::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Denominator for every fee expressed in basis points.
pub const MAX_BPS: u16 = 10_000;

/// The compiled contracts the orchestrator knows how to deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractKind {
    Controller,
    Sett,
    Strategy,
}

impl ContractKind {
    /// Name of the compiled artifact for this contract.
    pub fn artifact_name(&self) -> &'static str {
        match self {
            ContractKind::Controller => "Controller",
            ContractKind::Sett => "SettV3",
            ContractKind::Strategy => "MyStrategy",
        }
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.artifact_name())
    }
}

/// Performance and withdrawal fees in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fees {
    pub governance_performance: u16,
    pub strategist_performance: u16,
    pub withdrawal: u16,
}

impl Fees {
    /// Fees in the order the strategy initializer expects them.
    pub fn to_array(&self) -> [U256; 3] {
        [
            U256::from(self.governance_performance),
            U256::from(self.strategist_performance),
            U256::from(self.withdrawal),
        ]
    }

    /// Sum of all three fees, widened to avoid overflow.
    pub fn total(&self) -> u32 {
        u32::from(self.governance_performance)
            + u32::from(self.strategist_performance)
            + u32::from(self.withdrawal)
    }
}

impl Default for Fees {
    fn default() -> Self {
        Fees {
            governance_performance: 1000,
            strategist_performance: 1000,
            withdrawal: 75,
        }
    }
}

/// Oracle feeds handed to the strategy, one optional feed per swapped token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceFeeds {
    #[serde(default)]
    pub want: Option<Address>,
    #[serde(default)]
    pub reward: Option<Address>,
    #[serde(default)]
    pub secondary_reward: Option<Address>,
}

impl PriceFeeds {
    /// Feeds in initializer order (want, reward, secondary reward); unset feeds are zero.
    pub fn to_vec(&self) -> Vec<Address> {
        [self.want, self.reward, self.secondary_reward]
            .iter()
            .map(|feed| feed.unwrap_or(Address::ZERO))
            .collect()
    }
}

/// One state-changing contract call, named after the ABI function it encodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "function", rename_all = "camelCase")]
pub enum ContractCall {
    /// `Controller.initialize(governance, strategist, keeper, rewards)`
    ControllerInitialize {
        governance: Address,
        strategist: Address,
        keeper: Address,
        rewards: Address,
    },
    /// `Controller.setVault(token, vault)`
    SetVault { token: Address, vault: Address },
    /// `Controller.approveStrategy(token, strategy)`
    ApproveStrategy { token: Address, strategy: Address },
    /// `Controller.setStrategy(token, strategy)`
    SetStrategy { token: Address, strategy: Address },
    /// `Sett.initialize(token, controller, governance, keeper, guardian, overrideTokenName, namePrefix, symbolPrefix)`
    SettInitialize {
        token: Address,
        controller: Address,
        governance: Address,
        keeper: Address,
        guardian: Address,
        override_token_name: bool,
        name_prefix: String,
        symbol_prefix: String,
    },
    /// `Sett.unpause()`
    Unpause,
    /// `Sett.deposit(amount)`
    Deposit { amount: U256 },
    /// `Sett.earn()`
    Earn,
    /// `Strategy.initialize(governance, strategist, controller, keeper, guardian, protectedTokens, fees, priceFeeds)`
    StrategyInitialize {
        governance: Address,
        strategist: Address,
        controller: Address,
        keeper: Address,
        guardian: Address,
        protected_tokens: Vec<Address>,
        fees: [U256; 3],
        price_feeds: Vec<Address>,
    },
    /// `Strategy.harvest()`
    Harvest,
    /// `Strategy.tend()`
    Tend,
    /// `Strategy.setPriceFeed(token, feed)`
    SetPriceFeed { token: Address, feed: Address },
    /// `ERC20.approve(spender, amount)`
    Approve { spender: Address, amount: U256 },
    /// `Gauge.claimable_reward_write(account, token)`
    ClaimableRewardWrite { account: Address, token: Address },
    /// `Router.swapETHForExactTokens(amountOut, path, to, deadline)`
    SwapEthForExactTokens {
        amount_out: U256,
        path: Vec<Address>,
        to: Address,
        deadline: U256,
    },
}

impl ContractCall {
    /// ABI function name, used in logs.
    pub fn function_name(&self) -> &'static str {
        match self {
            ContractCall::ControllerInitialize { .. }
            | ContractCall::SettInitialize { .. }
            | ContractCall::StrategyInitialize { .. } => "initialize",
            ContractCall::SetVault { .. } => "setVault",
            ContractCall::ApproveStrategy { .. } => "approveStrategy",
            ContractCall::SetStrategy { .. } => "setStrategy",
            ContractCall::Unpause => "unpause",
            ContractCall::Deposit { .. } => "deposit",
            ContractCall::Earn => "earn",
            ContractCall::Harvest => "harvest",
            ContractCall::Tend => "tend",
            ContractCall::SetPriceFeed { .. } => "setPriceFeed",
            ContractCall::Approve { .. } => "approve",
            ContractCall::ClaimableRewardWrite { .. } => "claimable_reward_write",
            ContractCall::SwapEthForExactTokens { .. } => "swapETHForExactTokens",
        }
    }
}

/// A signed transaction request against a deployed contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub from: Address,
    pub to: Address,
    pub call: ContractCall,
    /// Native currency attached to the call.
    pub value: U256,
}

impl Transaction {
    /// Creates a transaction carrying no native value.
    pub fn new(from: Address, to: Address, call: ContractCall) -> Self {
        Transaction {
            from,
            to,
            call,
            value: U256::ZERO,
        }
    }

    /// Attaches native currency to the transaction.
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// Confirmation of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub gas_used: u64,
}
