//! External DeFi collaborators: the swap router, the Curve pool and its rewards gauge.

use crate::ledger::revert;
use common::{Address, ChainError, U256};
use std::collections::HashMap;

/// 1e18, the fixed-point scale for prices, virtual price and reward rates.
pub(crate) const WAD: u128 = 1_000_000_000_000_000_000;

fn pow10(decimals: u8) -> U256 {
    U256::from(10u64).pow(U256::from(decimals))
}

/// A single-price router: every token trades at its USD price, with no fee.
#[derive(Debug, Clone)]
pub(crate) struct Router {
    pub address: Address,
    pub wrapped_native: Address,
    /// USD per whole token, WAD-scaled.
    prices: HashMap<Address, U256>,
    /// Tokens the router can still pay out.
    liquidity: HashMap<Address, U256>,
}

impl Router {
    pub fn new(address: Address, wrapped_native: Address) -> Self {
        Router {
            address,
            wrapped_native,
            prices: HashMap::new(),
            liquidity: HashMap::new(),
        }
    }

    pub fn set_price(&mut self, token: Address, usd_wad: U256) {
        self.prices.insert(token, usd_wad);
    }

    pub fn set_liquidity(&mut self, token: Address, amount: U256) {
        self.liquidity.insert(token, amount);
    }

    pub fn price(&self, token: Address) -> Result<U256, ChainError> {
        self.prices
            .get(&token)
            .copied()
            .filter(|p| !p.is_zero())
            .ok_or_else(|| revert("UniswapV2Library: INVALID_PATH"))
    }

    /// Output of selling `amount_in` of `token_in` for `token_out`, rounded down.
    pub fn quote_out(
        &self,
        token_in: (Address, u8),
        token_out: (Address, u8),
        amount_in: U256,
    ) -> Result<U256, ChainError> {
        let price_in = self.price(token_in.0)?;
        let price_out = self.price(token_out.0)?;
        Ok(amount_in * price_in * pow10(token_out.1) / (price_out * pow10(token_in.1)))
    }

    /// Input needed to buy exactly `amount_out` of `token_out`, rounded up.
    pub fn quote_in(
        &self,
        token_in: (Address, u8),
        token_out: (Address, u8),
        amount_out: U256,
    ) -> Result<U256, ChainError> {
        let price_in = self.price(token_in.0)?;
        let price_out = self.price(token_out.0)?;
        let numerator = amount_out * price_out * pow10(token_in.1);
        let denominator = price_in * pow10(token_out.1);
        Ok(numerator.div_ceil(denominator))
    }

    /// Takes `amount` of `token` out of the router's reserves.
    pub fn withdraw(&mut self, token: Address, amount: U256) -> Result<(), ChainError> {
        let available = self.liquidity.get(&token).copied().unwrap_or_default();
        if available < amount {
            return Err(revert("UniswapV2Library: INSUFFICIENT_LIQUIDITY"));
        }
        self.liquidity.insert(token, available - amount);
        Ok(())
    }

    pub fn deposit(&mut self, token: Address, amount: U256) {
        *self.liquidity.entry(token).or_default() += amount;
    }
}

/// A Curve pool, reduced to its virtual price.
#[derive(Debug, Clone)]
pub(crate) struct CurvePool {
    pub address: Address,
    pub virtual_price: U256,
}

impl CurvePool {
    /// Scale from an underlying with `decimals` to 18-decimal LP, times the WAD price.
    fn scale(decimals: u8) -> Result<U256, ChainError> {
        36u8.checked_sub(decimals)
            .map(pow10)
            .ok_or_else(|| revert("unsupported decimals"))
    }

    /// LP tokens minted for `amount` of an underlying with `decimals`.
    pub fn lp_for(&self, amount: U256, decimals: u8) -> Result<U256, ChainError> {
        Ok(amount * Self::scale(decimals)? / self.virtual_price)
    }

    /// Underlying value of `lp` tokens for an asset with `decimals`.
    pub fn underlying_for(&self, lp: U256, decimals: u8) -> Result<U256, ChainError> {
        Ok(lp * self.virtual_price / Self::scale(decimals)?)
    }
}

/// A rewards-only gauge streaming tokens per staked LP per second.
#[derive(Debug, Clone)]
pub(crate) struct Gauge {
    pub address: Address,
    /// Reward token and its WAD-scaled rate per staked LP token per second.
    pub rewards: Vec<(Address, U256)>,
    staked: HashMap<Address, U256>,
    claimable: HashMap<(Address, Address), U256>,
    last_checkpoint: HashMap<Address, u64>,
}

impl Gauge {
    pub fn new(address: Address, rewards: Vec<(Address, U256)>) -> Self {
        Gauge {
            address,
            rewards,
            staked: HashMap::new(),
            claimable: HashMap::new(),
            last_checkpoint: HashMap::new(),
        }
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.staked.get(&account).copied().unwrap_or_default()
    }

    /// Rewards recorded at the last checkpoint; accrual since then is not included.
    pub fn claimable_reward(&self, account: Address, token: Address) -> U256 {
        self.claimable
            .get(&(account, token))
            .copied()
            .unwrap_or_default()
    }

    pub fn checkpoint(&mut self, account: Address, now: u64) {
        let last = self.last_checkpoint.get(&account).copied().unwrap_or(now);
        let elapsed = U256::from(now.saturating_sub(last));
        let staked = self.balance_of(account);
        if !elapsed.is_zero() && !staked.is_zero() {
            for (token, rate) in &self.rewards {
                let accrued = staked * *rate * elapsed / U256::from(WAD);
                *self.claimable.entry((account, *token)).or_default() += accrued;
            }
        }
        self.last_checkpoint.insert(account, now);
    }

    pub fn stake(&mut self, account: Address, lp: U256, now: u64) {
        self.checkpoint(account, now);
        *self.staked.entry(account).or_default() += lp;
    }

    /// Checkpoints and zeroes every claimable reward of `account`, returning the amounts.
    pub fn claim(&mut self, account: Address, now: u64) -> Vec<(Address, U256)> {
        self.checkpoint(account, now);
        self.rewards
            .iter()
            .map(|(token, _)| {
                let amount = self.claimable.remove(&(account, *token)).unwrap_or_default();
                (*token, amount)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::address;

    const WBTC: Address = address!("00000000000000000000000000000000000000b7");
    const WMATIC: Address = address!("00000000000000000000000000000000000000a7");
    const CRV: Address = address!("00000000000000000000000000000000000000c7");
    const STRATEGY: Address = address!("00000000000000000000000000000000000000d7");

    fn router() -> Router {
        let mut router = Router::new(Address::ZERO, WMATIC);
        router.set_price(WBTC, U256::from(30_000u64) * U256::from(WAD));
        router.set_price(WMATIC, U256::from(WAD));
        router
    }

    #[test]
    fn test_quote_in_rounds_up() {
        let router = router();
        // 0.1 wBTC at 30k USD costs 3000 MATIC
        let amount_in = router
            .quote_in((WMATIC, 18), (WBTC, 8), U256::from(10_000_000u64))
            .unwrap();
        assert_eq!(amount_in, U256::from(3_000u64) * U256::from(WAD));

        let one_unit = router.quote_in((WMATIC, 18), (WBTC, 8), U256::from(1)).unwrap();
        assert_eq!(one_unit, U256::from(300_000_000_000_000u64));
    }

    #[test]
    fn test_quote_out_rounds_down() {
        let router = router();
        let out = router
            .quote_out((WMATIC, 18), (WBTC, 8), U256::from(WAD))
            .unwrap();
        // 1 MATIC buys 3333.33 wBTC units
        assert_eq!(out, U256::from(3_333u64));
    }

    #[test]
    fn test_unknown_token_is_invalid_path() {
        let router = router();
        assert_eq!(
            router.quote_out((CRV, 18), (WBTC, 8), U256::from(1)),
            Err(revert("UniswapV2Library: INVALID_PATH"))
        );
    }

    #[test]
    fn test_withdraw_beyond_liquidity() {
        let mut router = router();
        router.set_liquidity(WBTC, U256::from(5));
        assert!(router.withdraw(WBTC, U256::from(6)).is_err());
        router.withdraw(WBTC, U256::from(5)).unwrap();
    }

    #[test]
    fn test_pool_accounting_matches_virtual_price() {
        let pool = CurvePool {
            address: Address::ZERO,
            virtual_price: U256::from(1_020_000_000_000_000_000u128),
        };
        let lp = pool.lp_for(U256::from(9_500_000u64), 8).unwrap();
        let back = pool.underlying_for(lp, 8).unwrap();
        assert!(back <= U256::from(9_500_000u64));
        assert!(U256::from(9_500_000u64) - back <= U256::from(1));
    }

    #[test]
    fn test_pool_rejects_oversized_decimals() {
        let pool = CurvePool {
            address: Address::ZERO,
            virtual_price: U256::from(WAD),
        };
        assert_eq!(
            pool.lp_for(U256::from(1u64), 37),
            Err(ChainError::Reverted("unsupported decimals".to_string()))
        );
        assert!(pool.underlying_for(U256::from(1u64), 37).is_err());
        assert_eq!(pool.lp_for(U256::from(1u64), 18), Ok(U256::from(1u64)));
    }

    #[test]
    fn test_gauge_accrues_only_at_checkpoint() {
        let mut gauge = Gauge::new(Address::ZERO, vec![(CRV, U256::from(WAD / 1000))]);
        gauge.stake(STRATEGY, U256::from(WAD), 100);
        assert_eq!(gauge.claimable_reward(STRATEGY, CRV), U256::ZERO);

        // Time passes, but nothing is recorded until a checkpoint
        gauge.checkpoint(STRATEGY, 1_100);
        assert_eq!(
            gauge.claimable_reward(STRATEGY, CRV),
            U256::from(WAD / 1000) * U256::from(1_000u64)
        );

        let claimed = gauge.claim(STRATEGY, 1_100);
        assert_eq!(claimed, vec![(CRV, U256::from(WAD))]);
        assert_eq!(gauge.claimable_reward(STRATEGY, CRV), U256::ZERO);
    }
}
