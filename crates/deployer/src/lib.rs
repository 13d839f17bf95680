//! Deployment orchestration, contract bindings and harvest scenarios.

pub mod bindings;
pub mod error;
pub mod orchestrator;
pub mod roles;
pub mod scenarios;
pub mod system;

pub use error::{DeployError, ScenarioError};
pub use orchestrator::{Deployer, Step};
pub use roles::{DeployMode, GovernanceAccess, Roles};
pub use scenarios::{
    harvest_cycle, harvest_without_price_feed, Fixtures, HarvestReport, HARVEST_DELAY_SECS,
};
pub use system::{DeployedSystem, PendingAction};
