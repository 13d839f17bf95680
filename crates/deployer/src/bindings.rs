//! Thin typed handles over deployed contracts, named after their ABI functions.

use common::{
    Address, ChainBackend, ChainError, ContractCall, ContractReader, Receipt, Transaction, U256,
};

/// An ERC-20 token.
pub struct Erc20<'a, C: ?Sized> {
    chain: &'a C,
    pub address: Address,
}

impl<'a, C: ChainBackend + ContractReader + ?Sized> Erc20<'a, C> {
    pub fn at(chain: &'a C, address: Address) -> Self {
        Self { chain, address }
    }

    pub async fn balance_of(&self, owner: Address) -> Result<U256, ChainError> {
        self.chain.balance_of(self.address, owner).await
    }

    pub async fn decimals(&self) -> Result<u8, ChainError> {
        self.chain.decimals(self.address).await
    }

    pub async fn approve(
        &self,
        from: Address,
        spender: Address,
        amount: U256,
    ) -> Result<Receipt, ChainError> {
        self.chain
            .send(Transaction::new(
                from,
                self.address,
                ContractCall::Approve { spender, amount },
            ))
            .await
    }
}

/// The controller registry.
pub struct Controller<'a, C: ?Sized> {
    chain: &'a C,
    pub address: Address,
}

impl<'a, C: ContractReader + ?Sized> Controller<'a, C> {
    pub fn at(chain: &'a C, address: Address) -> Self {
        Self { chain, address }
    }

    pub async fn vaults(&self, token: Address) -> Result<Address, ChainError> {
        self.chain.controller_vault(self.address, token).await
    }

    pub async fn strategies(&self, token: Address) -> Result<Address, ChainError> {
        self.chain.controller_strategy(self.address, token).await
    }
}

/// The Sett vault.
pub struct Vault<'a, C: ?Sized> {
    chain: &'a C,
    pub address: Address,
}

impl<'a, C: ChainBackend + ContractReader + ?Sized> Vault<'a, C> {
    pub fn at(chain: &'a C, address: Address) -> Self {
        Self { chain, address }
    }

    pub async fn deposit(&self, from: Address, amount: U256) -> Result<Receipt, ChainError> {
        self.chain
            .send(Transaction::new(
                from,
                self.address,
                ContractCall::Deposit { amount },
            ))
            .await
    }

    pub async fn earn(&self, from: Address) -> Result<Receipt, ChainError> {
        self.chain
            .send(Transaction::new(from, self.address, ContractCall::Earn))
            .await
    }

    pub async fn paused(&self) -> Result<bool, ChainError> {
        self.chain.vault_paused(self.address).await
    }
}

/// The yield strategy.
pub struct Strategy<'a, C: ?Sized> {
    chain: &'a C,
    pub address: Address,
}

impl<'a, C: ChainBackend + ContractReader + ?Sized> Strategy<'a, C> {
    pub fn at(chain: &'a C, address: Address) -> Self {
        Self { chain, address }
    }

    pub async fn harvest(&self, from: Address) -> Result<Receipt, ChainError> {
        self.chain
            .send(Transaction::new(from, self.address, ContractCall::Harvest))
            .await
    }

    pub async fn tend(&self, from: Address) -> Result<Receipt, ChainError> {
        self.chain
            .send(Transaction::new(from, self.address, ContractCall::Tend))
            .await
    }

    pub async fn set_price_feed(
        &self,
        from: Address,
        token: Address,
        feed: Address,
    ) -> Result<Receipt, ChainError> {
        self.chain
            .send(Transaction::new(
                from,
                self.address,
                ContractCall::SetPriceFeed { token, feed },
            ))
            .await
    }

    pub async fn balance_of_pool(&self) -> Result<U256, ChainError> {
        self.chain.balance_of_pool(self.address).await
    }

    pub async fn balance_of_want(&self) -> Result<U256, ChainError> {
        self.chain.balance_of_want(self.address).await
    }

    pub async fn is_tendable(&self) -> Result<bool, ChainError> {
        self.chain.is_tendable(self.address).await
    }

    pub async fn want(&self) -> Result<Address, ChainError> {
        self.chain.strategy_want(self.address).await
    }

    pub async fn reward(&self) -> Result<Address, ChainError> {
        self.chain.strategy_reward(self.address).await
    }

    pub async fn curve_pool(&self) -> Result<CurvePool<'a, C>, ChainError> {
        let address = self.chain.curve_pool(self.address).await?;
        Ok(CurvePool {
            chain: self.chain,
            address,
        })
    }

    pub async fn gauge(&self) -> Result<Gauge<'a, C>, ChainError> {
        let address = self.chain.reward_gauge(self.address).await?;
        Ok(Gauge {
            chain: self.chain,
            address,
        })
    }
}

/// A Curve pool, read for its virtual price.
pub struct CurvePool<'a, C: ?Sized> {
    chain: &'a C,
    pub address: Address,
}

impl<'a, C: ContractReader + ?Sized> CurvePool<'a, C> {
    pub async fn get_virtual_price(&self) -> Result<U256, ChainError> {
        self.chain.virtual_price(self.address).await
    }
}

/// A rewards gauge holding staked LP tokens.
pub struct Gauge<'a, C: ?Sized> {
    chain: &'a C,
    pub address: Address,
}

impl<'a, C: ChainBackend + ContractReader + ?Sized> Gauge<'a, C> {
    pub async fn balance_of(&self, account: Address) -> Result<U256, ChainError> {
        self.chain.balance_of(self.address, account).await
    }

    pub async fn claimable_reward(
        &self,
        account: Address,
        token: Address,
    ) -> Result<U256, ChainError> {
        self.chain
            .claimable_reward(self.address, account, token)
            .await
    }

    /// Checkpoints `account` so `claimable_reward` reflects rewards accrued so far.
    pub async fn claimable_reward_write(
        &self,
        from: Address,
        account: Address,
        token: Address,
    ) -> Result<Receipt, ChainError> {
        self.chain
            .send(Transaction::new(
                from,
                self.address,
                ContractCall::ClaimableRewardWrite { account, token },
            ))
            .await
    }
}
