//! Storage layouts of the simulated controller, Sett and strategy.

use common::{Address, U256};
use std::collections::{HashMap, HashSet};

pub(crate) const ALREADY_INITIALIZED: &str = "Initializable: contract is already initialized";
pub(crate) const ONLY_GOVERNANCE: &str = "onlyGovernance";
pub(crate) const ONLY_GOVERNANCE_OR_STRATEGIST: &str = "onlyGovernanceOrStrategist";
pub(crate) const ONLY_AUTHORIZED_ACTORS: &str = "onlyAuthorizedActors";
pub(crate) const NOT_GOVERNANCE: &str = "!governance";
pub(crate) const NOT_STRATEGIST: &str = "!strategist";
pub(crate) const NOT_APPROVED: &str = "!approved";
pub(crate) const PAUSED: &str = "Pausable: paused";
pub(crate) const NOT_PAUSED: &str = "Pausable: not paused";

/// Share of the vault's balance `earn` pushes to the strategy, over `MAX`.
pub(crate) const SETT_MIN: u64 = 9_500;
pub(crate) const SETT_MAX: u64 = 10_000;

#[derive(Debug, Clone)]
pub(crate) enum Contract {
    Controller(Controller),
    Sett(Sett),
    Strategy(Strategy),
}

impl Contract {
    pub fn kind(&self) -> &'static str {
        match self {
            Contract::Controller(_) => "controller",
            Contract::Sett(_) => "sett",
            Contract::Strategy(_) => "strategy",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Controller {
    pub initialized: bool,
    pub governance: Address,
    pub strategist: Address,
    pub keeper: Address,
    pub rewards: Address,
    pub vaults: HashMap<Address, Address>,
    pub strategies: HashMap<Address, Address>,
    pub approved: HashSet<(Address, Address)>,
}

impl Controller {
    pub fn is_governance_or_strategist(&self, who: Address) -> bool {
        who == self.governance || who == self.strategist
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Sett {
    pub initialized: bool,
    pub token: Address,
    pub controller: Address,
    pub governance: Address,
    pub keeper: Address,
    pub guardian: Address,
    pub name: String,
    pub symbol: String,
    pub paused: bool,
    pub shares: HashMap<Address, U256>,
    pub total_supply: U256,
}

impl Sett {
    pub fn is_authorized_actor(&self, who: Address) -> bool {
        who == self.keeper || who == self.governance
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Strategy {
    pub initialized: bool,
    pub governance: Address,
    pub strategist: Address,
    pub controller: Address,
    pub keeper: Address,
    pub guardian: Address,
    pub want: Address,
    pub protected_tokens: Vec<Address>,
    pub performance_fee_governance: U256,
    pub performance_fee_strategist: U256,
    pub withdrawal_fee: U256,
    pub price_feeds: HashMap<Address, Address>,
}

impl Strategy {
    pub fn is_authorized_actor(&self, who: Address) -> bool {
        who == self.keeper || who == self.governance
    }

    pub fn is_governance_or_strategist(&self, who: Address) -> bool {
        who == self.governance || who == self.strategist
    }
}
