//! # Chain Simulator
//!
//! An in-memory development chain seeded from a [`SettConfig`]: ERC-20 tokens,
//! a swap router, a Curve pool with its rewards gauge, and simulated
//! controller, Sett and strategy contracts. It implements the same backend
//! traits as the RPC client, so deployments and scenarios can run without a
//! node.

mod contracts;
mod ledger;
mod market;
mod world;

use async_trait::async_trait;
use common::{
    address, Address, ChainBackend, ChainError, ContractKind, ContractReader, DevChain, Receipt,
    Transaction, U256,
};
use config::SettConfig;
use ledger::Token;
use market::{CurvePool, Gauge, Router, WAD};
use tokio::sync::Mutex;
use world::World;

/// The renBTC Curve pool on Polygon.
pub const CURVE_POOL: Address = address!("c2d95eef97ec6c17551d45e77b590dc1f9117c67");

fn usd(amount: u64) -> U256 {
    U256::from(amount) * U256::from(WAD)
}

/// Market conditions the simulated fork starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimEnvironment {
    pub want_decimals: u8,
    /// USD prices per whole token, WAD-scaled.
    pub want_price: U256,
    pub reward_price: U256,
    /// Price of the wrapped native token, also used for the secondary reward.
    pub native_price: U256,
    /// Price of intermediate tokens on the acquisition path.
    pub hop_price: U256,
    pub virtual_price: U256,
    /// Gauge emission per staked LP per second, WAD-scaled.
    pub reward_rate: U256,
    pub secondary_reward_rate: U256,
    /// Want the router can pay out, in base units.
    pub router_liquidity: U256,
    pub dev_accounts: usize,
    pub dev_balance: U256,
    pub start_timestamp: u64,
}

impl Default for SimEnvironment {
    fn default() -> Self {
        SimEnvironment {
            want_decimals: 8,
            want_price: usd(30_000),
            reward_price: usd(2),
            native_price: usd(1),
            hop_price: usd(2_000),
            virtual_price: U256::from(1_020_000_000_000_000_000u128),
            reward_rate: U256::from(1_000_000_000_000_000u64),
            secondary_reward_rate: U256::from(2_000_000_000_000_000u64),
            router_liquidity: U256::from(10_000_000_000u64),
            dev_accounts: 10,
            dev_balance: usd(10_000),
            start_timestamp: 1_700_000_000,
        }
    }
}

/// A simulated fork of the configured network.
#[derive(Debug)]
pub struct SimChain {
    world: Mutex<World>,
}

impl SimChain {
    /// Forks with the default environment.
    pub fn fork(config: &SettConfig) -> Self {
        Self::with_environment(config, SimEnvironment::default())
    }

    pub fn with_environment(config: &SettConfig, env: SimEnvironment) -> Self {
        let tokens = &config.tokens;
        let path = &config.acquisition.path;
        let wrapped_native = path.first().copied().unwrap_or(tokens.secondary_reward);

        let mut router = Router::new(config.acquisition.router, wrapped_native);
        for hop in path {
            router.set_price(*hop, env.hop_price);
        }
        router.set_price(wrapped_native, env.native_price);
        router.set_price(tokens.secondary_reward, env.native_price);
        router.set_price(tokens.reward, env.reward_price);
        router.set_price(tokens.want, env.want_price);
        router.set_liquidity(tokens.want, env.router_liquidity);

        let pool = CurvePool {
            address: CURVE_POOL,
            virtual_price: env.virtual_price,
        };
        let gauge = Gauge::new(
            tokens.lp_component,
            vec![
                (tokens.reward, env.reward_rate),
                (tokens.secondary_reward, env.secondary_reward_rate),
            ],
        );

        let mut world = World::new(env.start_timestamp, router, pool, gauge);
        for hop in path {
            world
                .tokens
                .entry(*hop)
                .or_insert_with(|| Token::new("HOP", 18));
        }
        world
            .tokens
            .insert(tokens.want, Token::new("WANT", env.want_decimals));
        world.tokens.insert(tokens.reward, Token::new("REWARD", 18));
        world
            .tokens
            .entry(tokens.secondary_reward)
            .or_insert_with(|| Token::new("WMATIC", 18));

        let feeds = &config.price_feeds;
        for (feed, token) in [
            (feeds.want, tokens.want),
            (feeds.reward, tokens.reward),
            (feeds.secondary_reward, tokens.secondary_reward),
        ] {
            if let Some(feed) = feed {
                world.feeds.insert(feed, token);
            }
        }

        for _ in 0..env.dev_accounts {
            let account = world.next_address(0xac);
            world.native.insert(account, env.dev_balance);
            world.unlocked.insert(account);
            world.dev_accounts.push(account);
        }

        log::info!(
            "Forked {} with {} dev accounts",
            config.network,
            world.dev_accounts.len()
        );
        SimChain {
            world: Mutex::new(world),
        }
    }

    /// Credits `amount` of `token` to `to`, as a fork cheat code would.
    pub async fn deal(&self, token: Address, to: Address, amount: U256) -> Result<(), ChainError> {
        let mut world = self.world.lock().await;
        world.token_mut(token)?.mint(to, amount);
        Ok(())
    }

    /// Changes the price the router quotes for `token`.
    pub async fn set_price(&self, token: Address, usd_wad: U256) {
        self.world.lock().await.router.set_price(token, usd_wad);
    }

    /// Changes how much of `token` the router can pay out.
    pub async fn set_router_liquidity(&self, token: Address, amount: U256) {
        self.world.lock().await.router.set_liquidity(token, amount);
    }

    pub async fn block_number(&self) -> u64 {
        self.world.lock().await.block
    }
}

#[async_trait]
impl ChainBackend for SimChain {
    async fn accounts(&self) -> Result<Vec<Address>, ChainError> {
        Ok(self.world.lock().await.dev_accounts.clone())
    }

    async fn can_sign(&self, account: Address) -> Result<bool, ChainError> {
        Ok(self.world.lock().await.unlocked.contains(&account))
    }

    async fn impersonate(&self, account: Address) -> Result<(), ChainError> {
        log::debug!("Impersonating {}", account);
        self.world.lock().await.unlocked.insert(account);
        Ok(())
    }

    async fn deploy(&self, kind: ContractKind, from: Address) -> Result<Address, ChainError> {
        let mut world = self.world.lock().await;
        let mut next = world.clone();
        let (address, receipt) = next.deploy(kind, from)?;
        *world = next;
        log::debug!(
            "{} deployed at {} in block {}",
            kind,
            address,
            receipt.block_number
        );
        Ok(address)
    }

    async fn send(&self, tx: Transaction) -> Result<Receipt, ChainError> {
        let mut world = self.world.lock().await;
        let mut next = world.clone();
        match next.execute(&tx) {
            Ok(receipt) => {
                *world = next;
                Ok(receipt)
            }
            Err(e) => {
                log::warn!("{} to {} failed: {}", tx.call.function_name(), tx.to, e);
                Err(e)
            }
        }
    }

    async fn native_balance(&self, account: Address) -> Result<U256, ChainError> {
        Ok(self.world.lock().await.native_balance(account))
    }

    async fn decimals(&self, token: Address) -> Result<u8, ChainError> {
        Ok(self.world.lock().await.token(token)?.decimals)
    }

    async fn timestamp(&self) -> Result<u64, ChainError> {
        Ok(self.world.lock().await.timestamp)
    }
}

#[async_trait]
impl ContractReader for SimChain {
    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, ChainError> {
        self.world.lock().await.balance_of(token, owner)
    }

    async fn balance_of_pool(&self, strategy: Address) -> Result<U256, ChainError> {
        self.world.lock().await.strategy_balance_of_pool(strategy)
    }

    async fn balance_of_want(&self, strategy: Address) -> Result<U256, ChainError> {
        self.world.lock().await.strategy_balance_of_want(strategy)
    }

    async fn is_tendable(&self, strategy: Address) -> Result<bool, ChainError> {
        let world = self.world.lock().await;
        Ok(!world.strategy_balance_of_want(strategy)?.is_zero())
    }

    async fn strategy_want(&self, strategy: Address) -> Result<Address, ChainError> {
        Ok(self.world.lock().await.strategy(strategy)?.want)
    }

    async fn strategy_reward(&self, strategy: Address) -> Result<Address, ChainError> {
        let world = self.world.lock().await;
        world.strategy(strategy)?;
        world
            .gauge
            .rewards
            .first()
            .map(|(token, _)| *token)
            .ok_or_else(|| ChainError::Reverted("no reward token".to_string()))
    }

    async fn curve_pool(&self, strategy: Address) -> Result<Address, ChainError> {
        let world = self.world.lock().await;
        world.strategy(strategy)?;
        Ok(world.pool.address)
    }

    async fn reward_gauge(&self, strategy: Address) -> Result<Address, ChainError> {
        let world = self.world.lock().await;
        world.strategy(strategy)?;
        Ok(world.gauge.address)
    }

    async fn virtual_price(&self, pool: Address) -> Result<U256, ChainError> {
        let world = self.world.lock().await;
        if pool != world.pool.address {
            return Err(ChainError::UnknownContract {
                kind: "curve pool",
                address: pool,
            });
        }
        Ok(world.pool.virtual_price)
    }

    async fn claimable_reward(
        &self,
        gauge: Address,
        account: Address,
        token: Address,
    ) -> Result<U256, ChainError> {
        let world = self.world.lock().await;
        if gauge != world.gauge.address {
            return Err(ChainError::UnknownContract {
                kind: "gauge",
                address: gauge,
            });
        }
        Ok(world.gauge.claimable_reward(account, token))
    }

    async fn controller_vault(
        &self,
        controller: Address,
        token: Address,
    ) -> Result<Address, ChainError> {
        let world = self.world.lock().await;
        let controller = world.controller(controller)?;
        Ok(controller.vaults.get(&token).copied().unwrap_or_default())
    }

    async fn controller_strategy(
        &self,
        controller: Address,
        token: Address,
    ) -> Result<Address, ChainError> {
        let world = self.world.lock().await;
        let controller = world.controller(controller)?;
        Ok(controller.strategies.get(&token).copied().unwrap_or_default())
    }

    async fn vault_paused(&self, vault: Address) -> Result<bool, ChainError> {
        Ok(self.world.lock().await.sett(vault)?.paused)
    }
}

#[async_trait]
impl DevChain for SimChain {
    async fn sleep(&self, seconds: u64) -> Result<(), ChainError> {
        self.world.lock().await.sleep(seconds);
        Ok(())
    }

    async fn mine(&self, blocks: u64) -> Result<(), ChainError> {
        self.world.lock().await.mine(blocks);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ContractCall;

    #[tokio::test]
    async fn test_fork_seeds_dev_accounts() {
        let chain = SimChain::fork(&SettConfig::polygon_wbtc());
        let accounts = chain.accounts().await.unwrap();
        assert_eq!(accounts.len(), 10);
        for account in &accounts {
            assert!(chain.can_sign(*account).await.unwrap());
            assert_eq!(chain.native_balance(*account).await.unwrap(), usd(10_000));
        }
        assert_eq!(chain.decimals(config::WANT).await.unwrap(), 8);
        assert_eq!(chain.timestamp().await.unwrap(), 1_700_000_000);
    }

    #[tokio::test]
    async fn test_impersonation_unlocks_governance() {
        let chain = SimChain::fork(&SettConfig::polygon_wbtc());
        let governance = config::BADGER_DEV_MULTISIG;
        assert!(!chain.can_sign(governance).await.unwrap());
        assert_eq!(
            chain.deploy(ContractKind::Controller, governance).await,
            Err(ChainError::Locked(governance))
        );
        chain.impersonate(governance).await.unwrap();
        assert!(chain.can_sign(governance).await.unwrap());
    }

    #[tokio::test]
    async fn test_reverted_send_leaves_state_untouched() {
        let chain = SimChain::fork(&SettConfig::polygon_wbtc());
        let deployer = chain.accounts().await.unwrap()[0];
        let vault = chain.deploy(ContractKind::Sett, deployer).await.unwrap();
        let block = chain.block_number().await;

        let result = chain
            .send(Transaction::new(deployer, vault, ContractCall::Unpause))
            .await;
        // Uninitialized: governance is the zero address
        assert_eq!(
            result,
            Err(ChainError::Reverted("onlyGovernance".to_string()))
        );
        assert_eq!(chain.block_number().await, block);
    }

    #[tokio::test]
    async fn test_deal_and_balance() {
        let chain = SimChain::fork(&SettConfig::polygon_wbtc());
        let deployer = chain.accounts().await.unwrap()[0];
        chain
            .deal(config::REWARD_TOKEN, deployer, U256::from(42))
            .await
            .unwrap();
        assert_eq!(
            chain
                .balance_of(config::REWARD_TOKEN, deployer)
                .await
                .unwrap(),
            U256::from(42)
        );
        assert!(chain
            .deal(Address::ZERO, deployer, U256::from(1))
            .await
            .is_err());
    }
}
