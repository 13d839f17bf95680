//! ERC-20 balances and allowances.

use common::{Address, ChainError, U256};
use std::collections::HashMap;

pub(crate) fn revert(reason: &str) -> ChainError {
    ChainError::Reverted(reason.to_string())
}

#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub symbol: String,
    pub decimals: u8,
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
}

impl Token {
    pub fn new(symbol: impl Into<String>, decimals: u8) -> Self {
        Token {
            symbol: symbol.into(),
            decimals,
            balances: HashMap::new(),
            allowances: HashMap::new(),
        }
    }

    pub fn balance_of(&self, owner: Address) -> U256 {
        self.balances.get(&owner).copied().unwrap_or_default()
    }

    pub fn mint(&mut self, to: Address, amount: U256) {
        *self.balances.entry(to).or_default() += amount;
    }

    pub fn burn(&mut self, from: Address, amount: U256) -> Result<(), ChainError> {
        let balance = self.balance_of(from);
        if balance < amount {
            return Err(revert("ERC20: burn amount exceeds balance"));
        }
        self.balances.insert(from, balance - amount);
        Ok(())
    }

    pub fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), ChainError> {
        let balance = self.balance_of(from);
        if balance < amount {
            return Err(revert("ERC20: transfer amount exceeds balance"));
        }
        self.balances.insert(from, balance - amount);
        self.mint(to, amount);
        Ok(())
    }

    pub fn approve(&mut self, owner: Address, spender: Address, amount: U256) {
        self.allowances.insert((owner, spender), amount);
    }

    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ChainError> {
        let allowance = self
            .allowances
            .get(&(from, spender))
            .copied()
            .unwrap_or_default();
        if allowance < amount {
            return Err(revert("ERC20: transfer amount exceeds allowance"));
        }
        self.transfer(from, to, amount)?;
        self.allowances.insert((from, spender), allowance - amount);
        Ok(())
    }
}
