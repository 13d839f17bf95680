//! The deployment pipeline: deploy, initialize and wire the controller, Sett and strategy.
//!
//! Every step waits for its receipt before the next one starts and the first
//! failure aborts the run. Contracts deployed before a failure are left
//! behind; a failed run is redeployed from scratch.

use crate::error::DeployError;
use crate::roles::{DeployMode, GovernanceAccess, Roles};
use crate::system::{DeployedSystem, PendingAction};
use chrono::Utc;
use common::amounts::{from_base_units, to_base_units};
use common::{
    Address, ChainBackend, ChainError, ContractCall, ContractKind, Receipt, Transaction, U256,
};
use config::SettConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Decimals of the chain's native currency.
const NATIVE_DECIMALS: u8 = 18;

/// One step of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    ResolveAccounts,
    UnlockGovernance,
    DeployController,
    InitializeController,
    DeploySett,
    InitializeSett,
    UnpauseSett,
    SetVault,
    DeployStrategy,
    InitializeStrategy,
    ApproveStrategy,
    SetStrategy,
    AcquireWant,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::ResolveAccounts => "resolve accounts",
            Step::UnlockGovernance => "unlock governance",
            Step::DeployController => "deploy controller",
            Step::InitializeController => "initialize controller",
            Step::DeploySett => "deploy sett",
            Step::InitializeSett => "initialize sett",
            Step::UnpauseSett => "unpause sett",
            Step::SetVault => "set vault",
            Step::DeployStrategy => "deploy strategy",
            Step::InitializeStrategy => "initialize strategy",
            Step::ApproveStrategy => "approve strategy",
            Step::SetStrategy => "set strategy",
            Step::AcquireWant => "acquire want",
        };
        write!(f, "{}", name)
    }
}

/// Runs the deployment pipeline against a chain backend.
pub struct Deployer<'a, C: ?Sized> {
    chain: &'a C,
    config: SettConfig,
    mode: DeployMode,
}

impl<'a, C: ChainBackend + ?Sized> Deployer<'a, C> {
    /// Validates `config` and binds it to `chain`.
    pub fn new(chain: &'a C, config: SettConfig, mode: DeployMode) -> Result<Self, DeployError> {
        config.validate()?;
        Ok(Self {
            chain,
            config,
            mode,
        })
    }

    pub fn config(&self) -> &SettConfig {
        &self.config
    }

    /// Deploys from the backend's first account, like a fork test does.
    pub async fn deploy_from_first_account(&self) -> Result<DeployedSystem, DeployError> {
        let accounts = self
            .chain
            .accounts()
            .await
            .map_err(|e| DeployError::at(Step::ResolveAccounts, e))?;
        let deployer = accounts.first().copied().ok_or(DeployError::NoDeployer)?;
        self.deploy(deployer).await
    }

    /// Deploys and wires the controller, Sett and strategy with `deployer` paying for gas.
    pub async fn deploy(&self, deployer: Address) -> Result<DeployedSystem, DeployError> {
        let run_id = Uuid::new_v4();
        let roles = Roles::resolve(&self.config, deployer);
        let want = self.config.tokens.want;

        if self.mode == DeployMode::Live && roles.all_aliased() {
            warn!(
                %deployer,
                "Strategist, keeper and guardian all alias the deployer on a live network"
            );
        }

        let access = self.governance_access(roles.governance).await?;
        info!(
            %run_id,
            network = %self.config.network,
            mode = %self.mode,
            %deployer,
            governance = %roles.governance,
            ?access,
            "Starting deployment"
        );

        let mut pending = Vec::new();

        let controller = self
            .deploy_contract(Step::DeployController, ContractKind::Controller, deployer)
            .await?;
        self.send(
            Step::InitializeController,
            Transaction::new(
                deployer,
                controller,
                ContractCall::ControllerInitialize {
                    governance: roles.governance,
                    strategist: roles.strategist,
                    keeper: roles.keeper,
                    rewards: self.config.rewards(),
                },
            ),
        )
        .await?;

        let vault = self
            .deploy_contract(Step::DeploySett, ContractKind::Sett, deployer)
            .await?;
        self.send(
            Step::InitializeSett,
            Transaction::new(
                deployer,
                vault,
                ContractCall::SettInitialize {
                    token: want,
                    controller,
                    governance: roles.governance,
                    keeper: roles.keeper,
                    guardian: roles.guardian,
                    override_token_name: self.config.sett.override_token_name,
                    name_prefix: self.config.sett.name_prefix.clone(),
                    symbol_prefix: self.config.sett.symbol_prefix.clone(),
                },
            ),
        )
        .await?;

        // The Sett comes up paused; only governance can open it for deposits.
        self.governance_send(
            Step::UnpauseSett,
            access,
            Transaction::new(roles.governance, vault, ContractCall::Unpause),
            &mut pending,
        )
        .await?;

        self.send(
            Step::SetVault,
            Transaction::new(
                deployer,
                controller,
                ContractCall::SetVault { token: want, vault },
            ),
        )
        .await?;

        let strategy = self
            .deploy_contract(Step::DeployStrategy, ContractKind::Strategy, deployer)
            .await?;
        self.send(
            Step::InitializeStrategy,
            Transaction::new(
                deployer,
                strategy,
                ContractCall::StrategyInitialize {
                    governance: roles.governance,
                    strategist: roles.strategist,
                    controller,
                    keeper: roles.keeper,
                    guardian: roles.guardian,
                    protected_tokens: self.config.protected_tokens(),
                    fees: self.config.fees.to_array(),
                    price_feeds: self.config.price_feeds.to_vec(),
                },
            ),
        )
        .await?;

        // approveStrategy must land before setStrategy.
        let approved = self
            .governance_send(
                Step::ApproveStrategy,
                access,
                Transaction::new(
                    roles.governance,
                    controller,
                    ContractCall::ApproveStrategy {
                        token: want,
                        strategy,
                    },
                ),
                &mut pending,
            )
            .await?;

        let set_strategy = Transaction::new(
            deployer,
            controller,
            ContractCall::SetStrategy {
                token: want,
                strategy,
            },
        );
        if approved {
            self.send(Step::SetStrategy, set_strategy).await?;
        } else {
            info!(step = %Step::SetStrategy, "Deferred until the strategy is approved");
            pending.push(PendingAction {
                step: Step::SetStrategy,
                tx: set_strategy,
            });
        }

        let acquired_want = match self.mode {
            DeployMode::Test => Some(self.acquire_want(deployer).await?),
            DeployMode::Live => None,
        };

        info!(
            %run_id,
            %controller,
            %vault,
            %strategy,
            pending = pending.len(),
            "Deployment finished"
        );

        Ok(DeployedSystem {
            run_id,
            deployed_at: Utc::now(),
            network: self.config.network.clone(),
            mode: self.mode,
            governance_access: access,
            roles,
            controller,
            vault,
            strategy,
            want,
            lp_component: self.config.tokens.lp_component,
            reward_token: self.config.tokens.reward,
            acquired_want,
            pending,
        })
    }

    async fn governance_access(
        &self,
        governance: Address,
    ) -> Result<GovernanceAccess, DeployError> {
        let unlock = |e: ChainError| DeployError::at(Step::UnlockGovernance, e);

        if self.chain.can_sign(governance).await.map_err(unlock)? {
            return Ok(GovernanceAccess::Signer);
        }
        match self.mode {
            DeployMode::Test => {
                self.chain.impersonate(governance).await.map_err(unlock)?;
                debug!(%governance, "Impersonating governance");
                Ok(GovernanceAccess::Impersonated)
            }
            DeployMode::Live => {
                warn!(%governance, "No governance key; governance calls will be deferred");
                Ok(GovernanceAccess::Deferred)
            }
        }
    }

    /// Sends a governance-gated call, or records it when governance cannot sign.
    /// Returns whether the call was sent.
    async fn governance_send(
        &self,
        step: Step,
        access: GovernanceAccess,
        tx: Transaction,
        pending: &mut Vec<PendingAction>,
    ) -> Result<bool, DeployError> {
        if access == GovernanceAccess::Deferred {
            info!(%step, to = %tx.to, function = tx.call.function_name(), "Deferred to governance");
            pending.push(PendingAction { step, tx });
            return Ok(false);
        }
        self.send(step, tx).await?;
        Ok(true)
    }

    async fn acquire_want(&self, deployer: Address) -> Result<U256, DeployError> {
        let step = Step::AcquireWant;
        let acquisition = &self.config.acquisition;
        let want = self.config.tokens.want;

        let decimals = self
            .chain
            .decimals(want)
            .await
            .map_err(|e| DeployError::at(step, e))?;
        let amount_out = to_base_units(acquisition.amount_out, decimals)?;
        let reserve = to_base_units(acquisition.gas_reserve, NATIVE_DECIMALS)?;
        let balance = self
            .chain
            .native_balance(deployer)
            .await
            .map_err(|e| DeployError::at(step, e))?;
        // The router refunds whatever the swap does not spend.
        let value = balance.saturating_sub(reserve);

        let tx = Transaction::new(
            deployer,
            acquisition.router,
            ContractCall::SwapEthForExactTokens {
                amount_out,
                path: acquisition.path.clone(),
                to: deployer,
                deadline: U256::from(acquisition.deadline),
            },
        )
        .with_value(value);
        self.send(step, tx).await?;

        info!(
            amount = %from_base_units(amount_out, decimals),
            %want,
            "Funded deployer with want"
        );
        Ok(amount_out)
    }

    async fn deploy_contract(
        &self,
        step: Step,
        kind: ContractKind,
        from: Address,
    ) -> Result<Address, DeployError> {
        match self.chain.deploy(kind, from).await {
            Ok(address) => {
                info!(%step, contract = %kind, %address, "Deployed");
                Ok(address)
            }
            Err(e) => {
                error!(%step, contract = %kind, error = %e, "Deployment failed");
                Err(DeployError::at(step, e))
            }
        }
    }

    async fn send(&self, step: Step, tx: Transaction) -> Result<Receipt, DeployError> {
        debug!(
            %step,
            from = %tx.from,
            to = %tx.to,
            function = tx.call.function_name(),
            value = %tx.value,
            "Sending transaction"
        );
        match self.chain.send(tx).await {
            Ok(receipt) => {
                info!(
                    %step,
                    tx_hash = %receipt.tx_hash,
                    block = receipt.block_number,
                    gas_used = receipt.gas_used,
                    "Step confirmed"
                );
                Ok(receipt)
            }
            Err(e) => {
                error!(%step, kind = %e.kind(), error = %e, "Step failed");
                Err(DeployError::at(step, e))
            }
        }
    }
}
