//! Which identity signs which deployment step.

use common::Address;
use config::SettConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the run targets a development fork or a live network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployMode {
    /// Governance is impersonated and the deployer is funded with want.
    Test,
    /// Governance must hold its own key; no impersonation, no funding swap.
    Live,
}

impl fmt::Display for DeployMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployMode::Test => write!(f, "test"),
            DeployMode::Live => write!(f, "live"),
        }
    }
}

/// The identities bound to each logical role for one deployment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roles {
    pub deployer: Address,
    pub governance: Address,
    pub strategist: Address,
    pub keeper: Address,
    pub guardian: Address,
}

impl Roles {
    /// Binds roles from configuration; unset operational roles alias the deployer.
    ///
    /// Aliasing every operational role to one key is fine on a fork and unsafe
    /// on a live network.
    pub fn resolve(config: &SettConfig, deployer: Address) -> Self {
        Roles {
            deployer,
            governance: config.governance,
            strategist: config.roles.strategist.unwrap_or(deployer),
            keeper: config.roles.keeper.unwrap_or(deployer),
            guardian: config.roles.guardian.unwrap_or(deployer),
        }
    }

    /// True when strategist, keeper and guardian all alias the deployer.
    pub fn all_aliased(&self) -> bool {
        self.strategist == self.deployer
            && self.keeper == self.deployer
            && self.guardian == self.deployer
    }
}

/// How governance-gated steps get signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GovernanceAccess {
    /// The backend already signs for governance.
    Signer,
    /// The backend impersonates governance (development chains).
    Impersonated,
    /// Governance calls are recorded for the multisig instead of being sent.
    Deferred,
}
