//! Solidity interfaces of the deployed system and its collaborators.

use alloy::primitives::Bytes;
use alloy::sol;
use alloy::sol_types::SolCall;
use common::ContractCall;

sol! {
    #[sol(rpc)]
    interface IController {
        function initialize(address governance, address strategist, address keeper, address rewards) external;
        function setVault(address token, address vault) external;
        function approveStrategy(address token, address strategy) external;
        function setStrategy(address token, address strategy) external;
        function vaults(address token) external view returns (address);
        function strategies(address token) external view returns (address);
    }

    #[sol(rpc)]
    interface ISett {
        function initialize(
            address token,
            address controller,
            address governance,
            address keeper,
            address guardian,
            bool overrideTokenName,
            string namePrefix,
            string symbolPrefix
        ) external;
        function unpause() external;
        function deposit(uint256 amount) external;
        function earn() external;
        function paused() external view returns (bool);
    }

    #[sol(rpc)]
    interface IStrategy {
        function initialize(
            address governance,
            address strategist,
            address controller,
            address keeper,
            address guardian,
            address[] protectedTokens,
            uint256[3] fees,
            address[] priceFeeds
        ) external;
        function harvest() external;
        function tend() external;
        function setPriceFeed(address token, address feed) external;
        function want() external view returns (address);
        function reward() external view returns (address);
        function balanceOfPool() external view returns (uint256);
        function balanceOfWant() external view returns (uint256);
        function isTendable() external view returns (bool);
        function CURVE_POOL() external view returns (address);
        function crvTokenGauge() external view returns (address);
    }

    #[sol(rpc)]
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function balanceOf(address owner) external view returns (uint256);
        function decimals() external view returns (uint8);
    }

    #[sol(rpc)]
    interface ICurvePool {
        function get_virtual_price() external view returns (uint256);
    }

    #[sol(rpc)]
    interface IRewardsGauge {
        function claimable_reward(address account, address token) external view returns (uint256);
        function claimable_reward_write(address account, address token) external returns (uint256);
    }

    #[sol(rpc)]
    interface IUniswapV2Router02 {
        function swapETHForExactTokens(uint256 amountOut, address[] path, address to, uint256 deadline)
            external
            payable
            returns (uint256[] amounts);
    }
}

/// ABI-encodes `call` as calldata for the contract it targets.
pub fn encode(call: &ContractCall) -> Bytes {
    let data = match call.clone() {
        ContractCall::ControllerInitialize {
            governance,
            strategist,
            keeper,
            rewards,
        } => IController::initializeCall {
            governance,
            strategist,
            keeper,
            rewards,
        }
        .abi_encode(),
        ContractCall::SetVault { token, vault } => {
            IController::setVaultCall { token, vault }.abi_encode()
        }
        ContractCall::ApproveStrategy { token, strategy } => {
            IController::approveStrategyCall { token, strategy }.abi_encode()
        }
        ContractCall::SetStrategy { token, strategy } => {
            IController::setStrategyCall { token, strategy }.abi_encode()
        }
        ContractCall::SettInitialize {
            token,
            controller,
            governance,
            keeper,
            guardian,
            override_token_name,
            name_prefix,
            symbol_prefix,
        } => ISett::initializeCall {
            token,
            controller,
            governance,
            keeper,
            guardian,
            overrideTokenName: override_token_name,
            namePrefix: name_prefix,
            symbolPrefix: symbol_prefix,
        }
        .abi_encode(),
        ContractCall::Unpause => ISett::unpauseCall {}.abi_encode(),
        ContractCall::Deposit { amount } => ISett::depositCall { amount }.abi_encode(),
        ContractCall::Earn => ISett::earnCall {}.abi_encode(),
        ContractCall::StrategyInitialize {
            governance,
            strategist,
            controller,
            keeper,
            guardian,
            protected_tokens,
            fees,
            price_feeds,
        } => IStrategy::initializeCall {
            governance,
            strategist,
            controller,
            keeper,
            guardian,
            protectedTokens: protected_tokens,
            fees,
            priceFeeds: price_feeds,
        }
        .abi_encode(),
        ContractCall::Harvest => IStrategy::harvestCall {}.abi_encode(),
        ContractCall::Tend => IStrategy::tendCall {}.abi_encode(),
        ContractCall::SetPriceFeed { token, feed } => {
            IStrategy::setPriceFeedCall { token, feed }.abi_encode()
        }
        ContractCall::Approve { spender, amount } => {
            IERC20::approveCall { spender, amount }.abi_encode()
        }
        ContractCall::ClaimableRewardWrite { account, token } => {
            IRewardsGauge::claimable_reward_writeCall { account, token }.abi_encode()
        }
        ContractCall::SwapEthForExactTokens {
            amount_out,
            path,
            to,
            deadline,
        } => IUniswapV2Router02::swapETHForExactTokensCall {
            amountOut: amount_out,
            path,
            to,
            deadline,
        }
        .abi_encode(),
    };
    Bytes::from(data)
}
