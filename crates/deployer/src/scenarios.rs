//! Harvest scenarios run against a freshly deployed system on a development chain.

use crate::bindings::{Erc20, Strategy, Vault};
use crate::error::ScenarioError;
use crate::system::DeployedSystem;
use common::{Address, ChainBackend, ChainError, ContractReader, DevChain, U256};
use tracing::info;

/// How far the clock moves between earn and harvest.
pub const HARVEST_DELAY_SECS: u64 = 2 * 60 * 60;
/// Blocks mined after the clock moves.
pub const HARVEST_DELAY_BLOCKS: u64 = 500;

const ONLY_GOVERNANCE_OR_STRATEGIST: &str = "onlyGovernanceOrStrategist";

/// Accounts and contracts a scenario acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fixtures {
    pub deployer: Address,
    pub vault: Address,
    pub strategy: Address,
    pub want: Address,
    pub reward: Address,
    /// Second gauge reward (WMATIC).
    pub wmatic: Address,
    /// An account holding no role in the system.
    pub random_user: Address,
}

impl Fixtures {
    pub fn new(system: &DeployedSystem, wmatic: Address, random_user: Address) -> Self {
        Fixtures {
            deployer: system.deployer(),
            vault: system.vault,
            strategy: system.strategy,
            want: system.want,
            reward: system.reward_token,
            wmatic,
            random_user,
        }
    }
}

/// What the harvest cycle observed, for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestReport {
    pub deposited: U256,
    pub pool_balance: U256,
    pub claimable_reward: U256,
    pub claimable_wmatic: U256,
    pub want_after_harvest: U256,
}

fn ensure(
    condition: bool,
    check: &'static str,
    detail: impl FnOnce() -> String,
) -> Result<(), ScenarioError> {
    if condition {
        Ok(())
    } else {
        Err(ScenarioError::Check {
            check,
            detail: detail(),
        })
    }
}

/// Deposits the deployer's whole want balance and pushes it into the strategy.
async fn deposit_and_earn<C>(chain: &C, fx: &Fixtures) -> Result<U256, ScenarioError>
where
    C: ChainBackend + ContractReader + ?Sized,
{
    let want = Erc20::at(chain, fx.want);
    let vault = Vault::at(chain, fx.vault);

    let balance = want.balance_of(fx.deployer).await?;
    ensure(balance > U256::ZERO, "deployer holds want", || {
        format!("deployer {} has no want to deposit", fx.deployer)
    })?;

    want.approve(fx.deployer, fx.vault, balance).await?;
    vault.deposit(fx.deployer, balance).await?;
    vault.earn(fx.deployer).await?;
    Ok(balance)
}

/// Moves the clock so the gauge accrues rewards, then checks that it actually moved.
async fn wait_for_rewards<C>(chain: &C) -> Result<(), ScenarioError>
where
    C: ChainBackend + DevChain + ?Sized,
{
    let before = chain.timestamp().await?;
    chain.sleep(HARVEST_DELAY_SECS).await?;
    chain.mine(HARVEST_DELAY_BLOCKS).await?;
    let after = chain.timestamp().await?;
    ensure(
        after >= before.saturating_add(HARVEST_DELAY_SECS),
        "chain clock advanced by the harvest delay",
        || format!("clock moved from {} to {}", before, after),
    )
}

async fn ensure_rewards_swapped<C>(chain: &C, fx: &Fixtures) -> Result<(), ScenarioError>
where
    C: ChainBackend + ContractReader + ?Sized,
{
    let reward_left = Erc20::at(chain, fx.reward).balance_of(fx.strategy).await?;
    ensure(reward_left.is_zero(), "reward.balanceOf(strategy) == 0", || {
        format!("strategy still holds {} reward", reward_left)
    })?;
    let wmatic_left = Erc20::at(chain, fx.wmatic).balance_of(fx.strategy).await?;
    ensure(wmatic_left.is_zero(), "wmatic.balanceOf(strategy) == 0", || {
        format!("strategy still holds {} wmatic", wmatic_left)
    })
}

/// Deposit, earn, accrue, harvest and tend; checks pool accounting and reward handling.
pub async fn harvest_cycle<C>(chain: &C, fx: &Fixtures) -> Result<HarvestReport, ScenarioError>
where
    C: ChainBackend + ContractReader + DevChain + ?Sized,
{
    let strategy = Strategy::at(chain, fx.strategy);
    let want_decimals = Erc20::at(chain, fx.want).decimals().await?;

    let deposited = deposit_and_earn(chain, fx).await?;

    let curve_pool = strategy.curve_pool().await?;
    let gauge = strategy.gauge().await?;

    // Expected want in strategy based on virtual price
    let gauge_balance = gauge.balance_of(fx.strategy).await?;
    let virtual_price = curve_pool.get_virtual_price().await?;
    let exponent = 36u64.checked_sub(u64::from(want_decimals)).ok_or_else(|| {
        ScenarioError::Check {
            check: "want decimals <= 36",
            detail: format!("want has {} decimals", want_decimals),
        }
    })?;
    let expected_want = gauge_balance * virtual_price / U256::from(10u64).pow(U256::from(exponent));
    let pool_balance = strategy.balance_of_pool().await?;
    ensure(
        pool_balance == expected_want,
        "balanceOfPool == gaugeBalance * virtualPrice / 10^(36 - decimals)",
        || format!("balanceOfPool {} != expected {}", pool_balance, expected_want),
    )?;

    wait_for_rewards(chain).await?;

    // Update rewards
    let reward_token = strategy.reward().await?;
    gauge
        .claimable_reward_write(fx.deployer, fx.strategy, reward_token)
        .await?;

    let claimable_reward = gauge.claimable_reward(fx.strategy, fx.reward).await?;
    let claimable_wmatic = gauge.claimable_reward(fx.strategy, fx.wmatic).await?;
    ensure(claimable_reward > U256::ZERO, "claimable(reward) > 0", || {
        "no reward accrued".to_string()
    })?;
    ensure(claimable_wmatic > U256::ZERO, "claimable(wmatic) > 0", || {
        "no wmatic accrued".to_string()
    })?;

    strategy.harvest(fx.deployer).await?;

    let after_reward = gauge.claimable_reward(fx.strategy, fx.reward).await?;
    let after_wmatic = gauge.claimable_reward(fx.strategy, fx.wmatic).await?;
    ensure(after_reward.is_zero(), "claimable(reward) == 0 after harvest", || {
        format!("{} reward still claimable", after_reward)
    })?;
    ensure(after_wmatic.is_zero(), "claimable(wmatic) == 0 after harvest", || {
        format!("{} wmatic still claimable", after_wmatic)
    })?;

    let want_after_harvest = strategy.balance_of_want().await?;
    ensure(want_after_harvest > U256::ZERO, "balanceOfWant > 0 after harvest", || {
        "harvest produced no want".to_string()
    })?;
    ensure(strategy.is_tendable().await?, "isTendable after harvest", || {
        "strategy is not tendable".to_string()
    })?;
    ensure_rewards_swapped(chain, fx).await?;

    strategy.tend(fx.deployer).await?;
    // Tend re-deposits all idle want
    let want_after_tend = strategy.balance_of_want().await?;
    ensure(want_after_tend.is_zero(), "balanceOfWant == 0 after tend", || {
        format!("{} want left idle", want_after_tend)
    })?;

    info!(
        %deposited,
        %pool_balance,
        %claimable_reward,
        %claimable_wmatic,
        %want_after_harvest,
        "Harvest cycle passed"
    );
    Ok(HarvestReport {
        deposited,
        pool_balance,
        claimable_reward,
        claimable_wmatic,
        want_after_harvest,
    })
}

/// Removes the want price feed and checks harvesting still swaps rewards into want.
pub async fn harvest_without_price_feed<C>(chain: &C, fx: &Fixtures) -> Result<U256, ScenarioError>
where
    C: ChainBackend + ContractReader + DevChain + ?Sized,
{
    let strategy = Strategy::at(chain, fx.strategy);

    deposit_and_earn(chain, fx).await?;
    wait_for_rewards(chain).await?;

    let want = strategy.want().await?;
    match strategy
        .set_price_feed(fx.random_user, want, Address::ZERO)
        .await
    {
        Err(ChainError::Reverted(reason)) if reason == ONLY_GOVERNANCE_OR_STRATEGIST => {}
        Ok(_) => {
            return Err(ScenarioError::UnexpectedOutcome {
                expected: ONLY_GOVERNANCE_OR_STRATEGIST.to_string(),
                actual: "success".to_string(),
            })
        }
        Err(e) => {
            return Err(ScenarioError::UnexpectedOutcome {
                expected: ONLY_GOVERNANCE_OR_STRATEGIST.to_string(),
                actual: e.to_string(),
            })
        }
    }

    strategy
        .set_price_feed(fx.deployer, want, Address::ZERO)
        .await?;

    strategy.harvest(fx.deployer).await?;

    let want_after_harvest = strategy.balance_of_want().await?;
    ensure(want_after_harvest > U256::ZERO, "balanceOfWant > 0 after harvest", || {
        "harvest produced no want".to_string()
    })?;
    ensure_rewards_swapped(chain, fx).await?;

    info!(%want_after_harvest, "Harvest without price feed passed");
    Ok(want_after_harvest)
}
