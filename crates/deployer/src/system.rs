use crate::orchestrator::Step;
use crate::roles::{DeployMode, GovernanceAccess, Roles};
use chrono::{DateTime, Utc};
use common::{Address, Transaction, U256};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A governance call that was not sent because no governance key was available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    pub step: Step,
    pub tx: Transaction,
}

/// Handle to a wired-up controller, vault and strategy, produced once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployedSystem {
    pub run_id: Uuid,
    pub deployed_at: DateTime<Utc>,
    pub network: String,
    pub mode: DeployMode,
    pub governance_access: GovernanceAccess,
    pub roles: Roles,
    pub controller: Address,
    pub vault: Address,
    pub strategy: Address,
    pub want: Address,
    pub lp_component: Address,
    pub reward_token: Address,
    /// Want bought by the funding swap, in base units.
    pub acquired_want: Option<U256>,
    /// Governance calls left for the multisig, in the order they must execute.
    pub pending: Vec<PendingAction>,
}

impl DeployedSystem {
    pub fn deployer(&self) -> Address {
        self.roles.deployer
    }

    /// True when the vault is unpaused and the strategy is wired to the controller.
    pub fn is_fully_wired(&self) -> bool {
        self.pending.is_empty()
    }
}
