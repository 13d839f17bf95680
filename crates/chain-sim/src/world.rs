//! The simulated chain state and the contract logic that mutates it.
//!
//! Every transaction runs against a clone of the [`World`]; the caller only
//! commits the clone when execution succeeds, so a revert leaves no trace.

use crate::contracts::*;
use crate::ledger::{revert, Token};
use crate::market::{CurvePool, Gauge, Router};
use common::{
    keccak256, Address, ChainError, ContractCall, ContractKind, Receipt, Transaction, MAX_BPS,
    U256,
};
use std::collections::{HashMap, HashSet};

const GAS_PER_TX: u64 = 150_000;

#[derive(Debug, Clone)]
pub(crate) struct World {
    pub timestamp: u64,
    pub block: u64,
    nonce: u64,
    pub native: HashMap<Address, U256>,
    pub tokens: HashMap<Address, Token>,
    pub contracts: HashMap<Address, Contract>,
    pub router: Router,
    pub pool: CurvePool,
    pub gauge: Gauge,
    /// Oracle feeds and the token each one prices.
    pub feeds: HashMap<Address, Address>,
    pub unlocked: HashSet<Address>,
    pub dev_accounts: Vec<Address>,
}

impl World {
    pub fn new(timestamp: u64, router: Router, pool: CurvePool, gauge: Gauge) -> Self {
        World {
            timestamp,
            block: 0,
            nonce: 0,
            native: HashMap::new(),
            tokens: HashMap::new(),
            contracts: HashMap::new(),
            router,
            pool,
            gauge,
            feeds: HashMap::new(),
            unlocked: HashSet::new(),
            dev_accounts: Vec::new(),
        }
    }

    /// A fresh, deterministic address tagged with `marker` in its first byte.
    pub fn next_address(&mut self, marker: u8) -> Address {
        self.nonce += 1;
        let mut bytes = [0u8; 20];
        bytes[0] = marker;
        bytes[12..].copy_from_slice(&self.nonce.to_be_bytes());
        Address::from(bytes)
    }

    pub fn native_balance(&self, account: Address) -> U256 {
        self.native.get(&account).copied().unwrap_or_default()
    }

    pub fn token(&self, address: Address) -> Result<&Token, ChainError> {
        self.tokens.get(&address).ok_or(ChainError::UnknownContract {
            kind: "token",
            address,
        })
    }

    pub fn token_mut(&mut self, address: Address) -> Result<&mut Token, ChainError> {
        self.tokens
            .get_mut(&address)
            .ok_or(ChainError::UnknownContract {
                kind: "token",
                address,
            })
    }

    pub fn controller(&self, address: Address) -> Result<&Controller, ChainError> {
        match self.contracts.get(&address) {
            Some(Contract::Controller(c)) => Ok(c),
            _ => Err(ChainError::UnknownContract {
                kind: "controller",
                address,
            }),
        }
    }

    fn controller_mut(&mut self, address: Address) -> Result<&mut Controller, ChainError> {
        match self.contracts.get_mut(&address) {
            Some(Contract::Controller(c)) => Ok(c),
            _ => Err(ChainError::UnknownContract {
                kind: "controller",
                address,
            }),
        }
    }

    pub fn sett(&self, address: Address) -> Result<&Sett, ChainError> {
        match self.contracts.get(&address) {
            Some(Contract::Sett(s)) => Ok(s),
            _ => Err(ChainError::UnknownContract {
                kind: "sett",
                address,
            }),
        }
    }

    fn sett_mut(&mut self, address: Address) -> Result<&mut Sett, ChainError> {
        match self.contracts.get_mut(&address) {
            Some(Contract::Sett(s)) => Ok(s),
            _ => Err(ChainError::UnknownContract {
                kind: "sett",
                address,
            }),
        }
    }

    pub fn strategy(&self, address: Address) -> Result<&Strategy, ChainError> {
        match self.contracts.get(&address) {
            Some(Contract::Strategy(s)) => Ok(s),
            _ => Err(ChainError::UnknownContract {
                kind: "strategy",
                address,
            }),
        }
    }

    fn strategy_mut(&mut self, address: Address) -> Result<&mut Strategy, ChainError> {
        match self.contracts.get_mut(&address) {
            Some(Contract::Strategy(s)) => Ok(s),
            _ => Err(ChainError::UnknownContract {
                kind: "strategy",
                address,
            }),
        }
    }

    fn ensure_unlocked(&self, account: Address) -> Result<(), ChainError> {
        if self.unlocked.contains(&account) {
            Ok(())
        } else {
            Err(ChainError::Locked(account))
        }
    }

    fn mine_block(&mut self) -> Receipt {
        self.block += 1;
        self.timestamp += 1;
        Receipt {
            tx_hash: keccak256(self.nonce.to_be_bytes()),
            block_number: self.block,
            gas_used: GAS_PER_TX,
        }
    }

    /// Advances the clock without producing a block.
    pub fn sleep(&mut self, seconds: u64) {
        self.timestamp += seconds;
    }

    pub fn mine(&mut self, blocks: u64) {
        self.block += blocks;
    }

    pub fn deploy(
        &mut self,
        kind: ContractKind,
        from: Address,
    ) -> Result<(Address, Receipt), ChainError> {
        self.ensure_unlocked(from)?;
        let contract = match kind {
            ContractKind::Controller => Contract::Controller(Controller::default()),
            ContractKind::Sett => Contract::Sett(Sett::default()),
            ContractKind::Strategy => Contract::Strategy(Strategy::default()),
        };
        let address = self.next_address(0xde);
        log::debug!("Deployed {} at {}", contract.kind(), address);
        self.contracts.insert(address, contract);
        Ok((address, self.mine_block()))
    }

    pub fn execute(&mut self, tx: &Transaction) -> Result<Receipt, ChainError> {
        self.ensure_unlocked(tx.from)?;
        if self.native_balance(tx.from) < tx.value {
            return Err(ChainError::Transport(format!(
                "insufficient funds for value {} from {}",
                tx.value, tx.from
            )));
        }
        let from = tx.from;
        let to = tx.to;
        let payable = matches!(tx.call, ContractCall::SwapEthForExactTokens { .. });
        if !payable && !tx.value.is_zero() {
            return Err(revert("non-payable function"));
        }
        self.nonce += 1;

        match &tx.call {
            ContractCall::ControllerInitialize {
                governance,
                strategist,
                keeper,
                rewards,
            } => {
                let controller = self.controller_mut(to)?;
                if controller.initialized {
                    return Err(revert(ALREADY_INITIALIZED));
                }
                controller.initialized = true;
                controller.governance = *governance;
                controller.strategist = *strategist;
                controller.keeper = *keeper;
                controller.rewards = *rewards;
            }
            ContractCall::SetVault { token, vault } => {
                let controller = self.controller_mut(to)?;
                if !controller.is_governance_or_strategist(from) {
                    return Err(revert(NOT_STRATEGIST));
                }
                if controller.vaults.get(token).is_some_and(|v| !v.is_zero()) {
                    return Err(revert("vault"));
                }
                controller.vaults.insert(*token, *vault);
            }
            ContractCall::ApproveStrategy { token, strategy } => {
                let controller = self.controller_mut(to)?;
                if from != controller.governance {
                    return Err(revert(NOT_GOVERNANCE));
                }
                controller.approved.insert((*token, *strategy));
            }
            ContractCall::SetStrategy { token, strategy } => {
                let controller = self.controller_mut(to)?;
                if !controller.is_governance_or_strategist(from) {
                    return Err(revert(NOT_STRATEGIST));
                }
                if !controller.approved.contains(&(*token, *strategy)) {
                    return Err(revert(NOT_APPROVED));
                }
                controller.strategies.insert(*token, *strategy);
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
            } => {
                let underlying = self.token(*token)?.symbol.clone();
                let sett = self.sett_mut(to)?;
                if sett.initialized {
                    return Err(revert(ALREADY_INITIALIZED));
                }
                sett.initialized = true;
                sett.token = *token;
                sett.controller = *controller;
                sett.governance = *governance;
                sett.keeper = *keeper;
                sett.guardian = *guardian;
                if *override_token_name {
                    sett.name = name_prefix.clone();
                    sett.symbol = symbol_prefix.clone();
                } else {
                    sett.name = format!("{}{}", name_prefix, underlying);
                    sett.symbol = format!("{}{}", symbol_prefix, underlying);
                }
                sett.paused = true;
            }
            ContractCall::Unpause => {
                let sett = self.sett_mut(to)?;
                if from != sett.governance {
                    return Err(revert(ONLY_GOVERNANCE));
                }
                if !sett.paused {
                    return Err(revert(NOT_PAUSED));
                }
                sett.paused = false;
            }
            ContractCall::Deposit { amount } => self.sett_deposit(to, from, *amount)?,
            ContractCall::Earn => self.sett_earn(to, from)?,
            ContractCall::StrategyInitialize {
                governance,
                strategist,
                controller,
                keeper,
                guardian,
                protected_tokens,
                fees,
                price_feeds,
            } => {
                let want = protected_tokens
                    .first()
                    .copied()
                    .ok_or_else(|| revert("!want"))?;
                // Feeds follow want, then the gauge rewards in order
                let priced: Vec<Address> = std::iter::once(want)
                    .chain(self.gauge.rewards.iter().map(|(token, _)| *token))
                    .collect();
                let strategy = self.strategy_mut(to)?;
                if strategy.initialized {
                    return Err(revert(ALREADY_INITIALIZED));
                }
                strategy.initialized = true;
                strategy.governance = *governance;
                strategy.strategist = *strategist;
                strategy.controller = *controller;
                strategy.keeper = *keeper;
                strategy.guardian = *guardian;
                strategy.want = want;
                strategy.protected_tokens = protected_tokens.clone();
                strategy.performance_fee_governance = fees[0];
                strategy.performance_fee_strategist = fees[1];
                strategy.withdrawal_fee = fees[2];
                for (token, feed) in priced.into_iter().zip(price_feeds.iter()) {
                    if !feed.is_zero() {
                        strategy.price_feeds.insert(token, *feed);
                    }
                }
            }
            ContractCall::Harvest => self.strategy_harvest(to, from)?,
            ContractCall::Tend => {
                if !self.strategy(to)?.is_authorized_actor(from) {
                    return Err(revert(ONLY_AUTHORIZED_ACTORS));
                }
                self.strategy_deposit(to)?;
            }
            ContractCall::SetPriceFeed { token, feed } => {
                let strategy = self.strategy_mut(to)?;
                if !strategy.is_governance_or_strategist(from) {
                    return Err(revert(ONLY_GOVERNANCE_OR_STRATEGIST));
                }
                if feed.is_zero() {
                    strategy.price_feeds.remove(token);
                } else {
                    strategy.price_feeds.insert(*token, *feed);
                }
            }
            ContractCall::Approve { spender, amount } => {
                self.token_mut(to)?.approve(from, *spender, *amount);
            }
            ContractCall::ClaimableRewardWrite { account, .. } => {
                if to != self.gauge.address {
                    return Err(ChainError::UnknownContract {
                        kind: "gauge",
                        address: to,
                    });
                }
                let now = self.timestamp;
                self.gauge.checkpoint(*account, now);
            }
            ContractCall::SwapEthForExactTokens {
                amount_out,
                path,
                to: recipient,
                deadline,
            } => {
                if to != self.router.address {
                    return Err(ChainError::UnknownContract {
                        kind: "router",
                        address: to,
                    });
                }
                self.swap_eth_for_exact_tokens(
                    from, tx.value, *amount_out, path, *recipient, *deadline,
                )?;
            }
        }

        log::trace!("{} -> {}::{} ok", from, to, tx.call.function_name());
        Ok(self.mine_block())
    }

    /// Vault's want plus whatever its strategy holds, idle or in the pool.
    fn sett_balance(&self, vault: Address) -> Result<U256, ChainError> {
        let sett = self.sett(vault)?;
        let idle = self.token(sett.token)?.balance_of(vault);
        let strategy = self
            .controller(sett.controller)
            .ok()
            .and_then(|c| c.strategies.get(&sett.token).copied());
        let invested = match strategy {
            Some(strategy) => {
                self.strategy_balance_of_want(strategy)? + self.strategy_balance_of_pool(strategy)?
            }
            None => U256::ZERO,
        };
        Ok(idle + invested)
    }

    fn sett_deposit(
        &mut self,
        vault: Address,
        from: Address,
        amount: U256,
    ) -> Result<(), ChainError> {
        let sett = self.sett(vault)?.clone();
        if sett.paused {
            return Err(revert(PAUSED));
        }
        let pool_before = self.sett_balance(vault)?;
        self.token_mut(sett.token)?
            .transfer_from(vault, from, vault, amount)?;
        let shares = if sett.total_supply.is_zero() || pool_before.is_zero() {
            amount
        } else {
            amount * sett.total_supply / pool_before
        };
        let sett = self.sett_mut(vault)?;
        *sett.shares.entry(from).or_default() += shares;
        sett.total_supply += shares;
        Ok(())
    }

    fn sett_earn(&mut self, vault: Address, from: Address) -> Result<(), ChainError> {
        let sett = self.sett(vault)?.clone();
        if sett.paused {
            return Err(revert(PAUSED));
        }
        if !sett.is_authorized_actor(from) {
            return Err(revert(ONLY_AUTHORIZED_ACTORS));
        }
        let strategy = self
            .controller(sett.controller)?
            .strategies
            .get(&sett.token)
            .copied()
            .ok_or_else(|| revert("!strategy"))?;
        let available = self.token(sett.token)?.balance_of(vault) * U256::from(SETT_MIN)
            / U256::from(SETT_MAX);
        self.token_mut(sett.token)?
            .transfer(vault, strategy, available)?;
        self.strategy_deposit(strategy)
    }

    /// Adds the strategy's idle want to the pool and stakes the LP in the gauge.
    fn strategy_deposit(&mut self, strategy: Address) -> Result<(), ChainError> {
        let want = self.strategy(strategy)?.want;
        let token = self.token(want)?;
        let idle = token.balance_of(strategy);
        if idle.is_zero() {
            return Ok(());
        }
        let lp = self.pool.lp_for(idle, token.decimals)?;
        self.token_mut(want)?.burn(strategy, idle)?;
        let now = self.timestamp;
        self.gauge.stake(strategy, lp, now);
        Ok(())
    }

    fn strategy_harvest(&mut self, strategy: Address, from: Address) -> Result<(), ChainError> {
        let s = self.strategy(strategy)?.clone();
        if !s.is_authorized_actor(from) {
            return Err(revert(ONLY_AUTHORIZED_ACTORS));
        }
        if let Some(feed) = s.price_feeds.get(&s.want) {
            if self.feeds.get(feed) != Some(&s.want) {
                return Err(revert("invalid price feed"));
            }
        }

        let now = self.timestamp;
        for (token, amount) in self.gauge.claim(strategy, now) {
            if !amount.is_zero() {
                self.token_mut(token)?.mint(strategy, amount);
            }
        }

        let want_decimals = self.token(s.want)?.decimals;
        let reward_tokens: Vec<Address> = self.gauge.rewards.iter().map(|(t, _)| *t).collect();
        let mut harvested = U256::ZERO;
        for token in reward_tokens {
            let reward = self.token(token)?;
            let balance = reward.balance_of(strategy);
            if balance.is_zero() {
                continue;
            }
            let out = self
                .router
                .quote_out((token, reward.decimals), (s.want, want_decimals), balance)?;
            self.token_mut(token)?.burn(strategy, balance)?;
            self.router.deposit(token, balance);
            self.router.withdraw(s.want, out)?;
            self.token_mut(s.want)?.mint(strategy, out);
            harvested += out;
        }

        let max_bps = U256::from(MAX_BPS);
        let governance_fee = harvested * s.performance_fee_governance / max_bps;
        let strategist_fee = harvested * s.performance_fee_strategist / max_bps;
        let rewards = self.controller(s.controller)?.rewards;
        let want = self.token_mut(s.want)?;
        want.transfer(strategy, rewards, governance_fee)?;
        want.transfer(strategy, s.strategist, strategist_fee)?;

        log::debug!(
            "Harvested {} want for {} (fees {} / {})",
            harvested,
            strategy,
            governance_fee,
            strategist_fee
        );
        Ok(())
    }

    fn swap_eth_for_exact_tokens(
        &mut self,
        from: Address,
        value: U256,
        amount_out: U256,
        path: &[Address],
        recipient: Address,
        deadline: U256,
    ) -> Result<(), ChainError> {
        if deadline < U256::from(self.timestamp) {
            return Err(revert("UniswapV2Router: EXPIRED"));
        }
        let (Some(first), Some(last)) = (path.first(), path.last()) else {
            return Err(revert("UniswapV2Router: INVALID_PATH"));
        };
        if path.len() < 2 || *first != self.router.wrapped_native {
            return Err(revert("UniswapV2Router: INVALID_PATH"));
        }
        for hop in &path[1..path.len() - 1] {
            self.router.price(*hop)?;
        }
        let out_decimals = self.token(*last)?.decimals;
        let amount_in = self
            .router
            .quote_in((*first, 18), (*last, out_decimals), amount_out)?;
        if amount_in > value {
            return Err(revert("UniswapV2Router: EXCESSIVE_INPUT_AMOUNT"));
        }
        self.router.withdraw(*last, amount_out)?;
        self.router.deposit(*first, amount_in);
        // Only the input actually used leaves the sender; the rest is refunded
        let balance = self.native_balance(from);
        self.native.insert(from, balance - amount_in);
        self.token_mut(*last)?.mint(recipient, amount_out);
        Ok(())
    }

    pub fn strategy_balance_of_want(&self, strategy: Address) -> Result<U256, ChainError> {
        let want = self.strategy(strategy)?.want;
        Ok(self.token(want)?.balance_of(strategy))
    }

    pub fn strategy_balance_of_pool(&self, strategy: Address) -> Result<U256, ChainError> {
        let want = self.strategy(strategy)?.want;
        let decimals = self.token(want)?.decimals;
        self.pool
            .underlying_for(self.gauge.balance_of(strategy), decimals)
    }

    /// `balanceOf` across tokens, Sett shares and gauge stakes.
    pub fn balance_of(&self, token: Address, owner: Address) -> Result<U256, ChainError> {
        if token == self.gauge.address {
            return Ok(self.gauge.balance_of(owner));
        }
        if let Ok(sett) = self.sett(token) {
            return Ok(sett.shares.get(&owner).copied().unwrap_or_default());
        }
        Ok(self.token(token)?.balance_of(owner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::WAD;
    use common::address;

    const ADMIN: Address = address!("00000000000000000000000000000000000000a1");
    const STRANGER: Address = address!("00000000000000000000000000000000000000b2");
    const WANT: Address = address!("00000000000000000000000000000000000000b7");
    const WMATIC: Address = address!("00000000000000000000000000000000000000a7");
    const CRV: Address = address!("00000000000000000000000000000000000000c7");
    const ROUTER: Address = address!("00000000000000000000000000000000000000e1");
    const GAUGE: Address = address!("00000000000000000000000000000000000000e2");

    fn world() -> World {
        let mut router = Router::new(ROUTER, WMATIC);
        router.set_price(WANT, U256::from(30_000u64) * U256::from(WAD));
        router.set_price(WMATIC, U256::from(WAD));
        router.set_price(CRV, U256::from(2u64) * U256::from(WAD));
        router.set_liquidity(WANT, U256::from(10_000_000_000u64));
        let pool = CurvePool {
            address: Address::ZERO,
            virtual_price: U256::from(WAD),
        };
        let gauge = Gauge::new(GAUGE, vec![(CRV, U256::from(WAD / 1000))]);
        let mut world = World::new(1_000, router, pool, gauge);
        world.tokens.insert(WANT, Token::new("WBTC", 8));
        world.tokens.insert(WMATIC, Token::new("WMATIC", 18));
        world.tokens.insert(CRV, Token::new("CRV", 18));
        world.native.insert(ADMIN, U256::from(10_000u64) * U256::from(WAD));
        world.unlocked.insert(ADMIN);
        world.unlocked.insert(STRANGER);
        world
    }

    fn send(
        world: &mut World,
        from: Address,
        to: Address,
        call: ContractCall,
    ) -> Result<Receipt, ChainError> {
        world.execute(&Transaction::new(from, to, call))
    }

    fn controller(world: &mut World) -> Address {
        let (address, _) = world.deploy(ContractKind::Controller, ADMIN).unwrap();
        send(
            world,
            ADMIN,
            address,
            ContractCall::ControllerInitialize {
                governance: ADMIN,
                strategist: ADMIN,
                keeper: ADMIN,
                rewards: ADMIN,
            },
        )
        .unwrap();
        address
    }

    #[test]
    fn test_locked_sender_rejected() {
        let mut world = world();
        let locked = address!("00000000000000000000000000000000000000f1");
        assert_eq!(
            world.deploy(ContractKind::Sett, locked).map(|(a, _)| a),
            Err(ChainError::Locked(locked))
        );
    }

    #[test]
    fn test_initialize_only_once() {
        let mut world = world();
        let address = controller(&mut world);
        let again = send(
            &mut world,
            ADMIN,
            address,
            ContractCall::ControllerInitialize {
                governance: STRANGER,
                strategist: STRANGER,
                keeper: STRANGER,
                rewards: STRANGER,
            },
        );
        assert_eq!(again, Err(revert(ALREADY_INITIALIZED)));
    }

    #[test]
    fn test_set_strategy_requires_approval() {
        let mut world = world();
        let address = controller(&mut world);
        let strategy = address!("00000000000000000000000000000000000000d7");
        let set = ContractCall::SetStrategy {
            token: WANT,
            strategy,
        };
        assert_eq!(
            send(&mut world, ADMIN, address, set.clone()),
            Err(revert(NOT_APPROVED))
        );
        assert_eq!(
            send(
                &mut world,
                STRANGER,
                address,
                ContractCall::ApproveStrategy {
                    token: WANT,
                    strategy
                }
            ),
            Err(revert(NOT_GOVERNANCE))
        );
        send(
            &mut world,
            ADMIN,
            address,
            ContractCall::ApproveStrategy {
                token: WANT,
                strategy,
            },
        )
        .unwrap();
        send(&mut world, ADMIN, address, set).unwrap();
        assert_eq!(world.controller(address).unwrap().strategies[&WANT], strategy);
    }

    #[test]
    fn test_sett_starts_paused_and_unpauses_for_governance_only() {
        let mut world = world();
        let controller = controller(&mut world);
        let (vault, _) = world.deploy(ContractKind::Sett, ADMIN).unwrap();
        send(
            &mut world,
            ADMIN,
            vault,
            ContractCall::SettInitialize {
                token: WANT,
                controller,
                governance: ADMIN,
                keeper: ADMIN,
                guardian: ADMIN,
                override_token_name: false,
                name_prefix: "Badger Sett ".to_string(),
                symbol_prefix: "b".to_string(),
            },
        )
        .unwrap();
        assert!(world.sett(vault).unwrap().paused);
        assert_eq!(world.sett(vault).unwrap().symbol, "bWBTC");

        assert_eq!(
            send(&mut world, STRANGER, vault, ContractCall::Deposit { amount: U256::from(1) }),
            Err(revert(PAUSED))
        );
        assert_eq!(
            send(&mut world, STRANGER, vault, ContractCall::Unpause),
            Err(revert(ONLY_GOVERNANCE))
        );
        send(&mut world, ADMIN, vault, ContractCall::Unpause).unwrap();
        assert!(!world.sett(vault).unwrap().paused);
        assert_eq!(
            send(&mut world, ADMIN, vault, ContractCall::Unpause),
            Err(revert(NOT_PAUSED))
        );
    }

    #[test]
    fn test_swap_refunds_unused_value() {
        let mut world = world();
        let before = world.native_balance(ADMIN);
        let tx = Transaction::new(
            ADMIN,
            ROUTER,
            ContractCall::SwapEthForExactTokens {
                amount_out: U256::from(10_000_000u64),
                path: vec![WMATIC, WANT],
                to: ADMIN,
                deadline: U256::from(u64::MAX),
            },
        )
        .with_value(before);
        world.execute(&tx).unwrap();
        assert_eq!(world.token(WANT).unwrap().balance_of(ADMIN), U256::from(10_000_000u64));
        // 0.1 wBTC at 30k USD costs 3000 MATIC
        assert_eq!(
            world.native_balance(ADMIN),
            before - U256::from(3_000u64) * U256::from(WAD)
        );
    }

    #[test]
    fn test_swap_failures() {
        let mut world = world();
        let swap = |path: Vec<Address>, deadline: u64, value: U256| {
            Transaction::new(
                ADMIN,
                ROUTER,
                ContractCall::SwapEthForExactTokens {
                    amount_out: U256::from(10_000_000u64),
                    path,
                    to: ADMIN,
                    deadline: U256::from(deadline),
                },
            )
            .with_value(value)
        };
        let plenty = U256::from(5_000u64) * U256::from(WAD);
        assert_eq!(
            world.execute(&swap(vec![WMATIC, WANT], 10, plenty)),
            Err(revert("UniswapV2Router: EXPIRED"))
        );
        assert_eq!(
            world.execute(&swap(vec![CRV, WANT], u64::MAX, plenty)),
            Err(revert("UniswapV2Router: INVALID_PATH"))
        );
        assert_eq!(
            world.execute(&swap(vec![WMATIC, WANT], u64::MAX, U256::from(WAD))),
            Err(revert("UniswapV2Router: EXCESSIVE_INPUT_AMOUNT"))
        );

        world.router.set_liquidity(WANT, U256::from(1));
        let short = world.execute(&swap(vec![WMATIC, WANT], u64::MAX, plenty));
        assert_eq!(short, Err(revert("UniswapV2Library: INSUFFICIENT_LIQUIDITY")));
    }

    #[test]
    fn test_value_on_non_payable_call() {
        let mut world = world();
        let tx = Transaction::new(
            ADMIN,
            WANT,
            ContractCall::Approve {
                spender: STRANGER,
                amount: U256::from(1),
            },
        )
        .with_value(U256::from(1));
        assert_eq!(world.execute(&tx), Err(revert("non-payable function")));
    }

    #[test]
    fn test_blocks_advance_per_transaction() {
        let mut world = world();
        let (_, first) = world.deploy(ContractKind::Controller, ADMIN).unwrap();
        let (_, second) = world.deploy(ContractKind::Controller, ADMIN).unwrap();
        assert_eq!(second.block_number, first.block_number + 1);
        assert_ne!(first.tx_hash, second.tx_hash);
        world.sleep(7_200);
        world.mine(500);
        assert_eq!(world.block, second.block_number + 500);
        assert_eq!(world.timestamp, 1_000 + 2 + 7_200);
    }
}
