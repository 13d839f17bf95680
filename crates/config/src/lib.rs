//! Deployment configuration: addresses, fee constants and the acquisition swap.

use common::{address, Address, Fees, PriceFeeds, MAX_BPS};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Governance multisig on Polygon.
pub const BADGER_DEV_MULTISIG: Address = address!("b65cef03b9b89f99517643226d76e286ee999e77");
/// wBTC
pub const WANT: Address = address!("1bfd67037b42cf73acf2047067bd4f2c47d9bfd6");
/// btcCRV gauge
pub const LP_COMPONENT: Address = address!("ffbacce0cc7c19d46132f1258fc16cf6871d153c");
/// CRV
pub const REWARD_TOKEN: Address = address!("172370d5cd63279efa6d502dab29171933a610af");
pub const WMATIC: Address = address!("0d500b1d8e8ef31e21c99d1db9a6444d3adf1270");
pub const WETH: Address = address!("7ceb23fd6bc0add59e62ac25578270cff1b9f619");
/// Sushiswap router
pub const ROUTER: Address = address!("1b02da8cb0d097eb8d57a175b88c7d8b47997506");
/// Chainlink BTC/USD
pub const BTC_USD_FEED: Address = address!("c907e116054ad103354f2d350fd2514433d57f6f");

/// The top-level configuration struct that maps directly to the YAML file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SettConfig {
    pub network: String,
    /// Authority for the controller, vault and strategy.
    pub governance: Address,
    /// Controller fee destination. Defaults to `governance`.
    #[serde(default)]
    pub rewards: Option<Address>,
    #[serde(default)]
    pub roles: RoleConfig,
    pub tokens: TokenConfig,
    /// Tokens the strategy must never sweep. Defaults to want, LP component and reward.
    #[serde(default)]
    pub protected_tokens: Option<Vec<Address>>,
    #[serde(default)]
    pub fees: Fees,
    #[serde(default)]
    pub price_feeds: PriceFeeds,
    #[serde(default)]
    pub sett: SettParams,
    pub acquisition: AcquisitionConfig,
}

/// Optional overrides for the operational roles; each defaults to the deployer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RoleConfig {
    pub strategist: Option<Address>,
    pub keeper: Option<Address>,
    pub guardian: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenConfig {
    pub want: Address,
    pub lp_component: Address,
    pub reward: Address,
    /// Second token emitted by the gauge (WMATIC on Polygon).
    pub secondary_reward: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SettParams {
    pub name_prefix: String,
    pub symbol_prefix: String,
    #[serde(default)]
    pub override_token_name: bool,
}

impl Default for SettParams {
    fn default() -> Self {
        SettParams {
            name_prefix: "prefix".to_string(),
            symbol_prefix: "PREFIX".to_string(),
            override_token_name: false,
        }
    }
}

/// Exact-output swap that funds the deployer with want on development chains.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AcquisitionConfig {
    pub router: Address,
    /// Token path from the wrapped native token to the want asset.
    pub path: Vec<Address>,
    /// Want to acquire, in whole tokens.
    pub amount_out: Decimal,
    pub deadline: u64,
    /// Native currency kept back for gas, in whole tokens.
    #[serde(default = "default_gas_reserve")]
    pub gas_reserve: Decimal,
}

fn default_gas_reserve() -> Decimal {
    dec!(1)
}

impl SettConfig {
    /// The wBTC btcCRV strategy on Polygon.
    pub fn polygon_wbtc() -> Self {
        SettConfig {
            network: "polygon".to_string(),
            governance: BADGER_DEV_MULTISIG,
            rewards: None,
            roles: RoleConfig::default(),
            tokens: TokenConfig {
                want: WANT,
                lp_component: LP_COMPONENT,
                reward: REWARD_TOKEN,
                secondary_reward: WMATIC,
            },
            protected_tokens: None,
            fees: Fees::default(),
            price_feeds: PriceFeeds {
                want: Some(BTC_USD_FEED),
                reward: None,
                secondary_reward: None,
            },
            sett: SettParams::default(),
            acquisition: AcquisitionConfig {
                router: ROUTER,
                path: vec![WMATIC, WETH, WANT],
                amount_out: dec!(0.1),
                deadline: 9_999_999_999_999_999,
                gas_reserve: default_gas_reserve(),
            },
        }
    }

    /// Load and validate configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: SettConfig =
            serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Controller fee destination.
    pub fn rewards(&self) -> Address {
        self.rewards.unwrap_or(self.governance)
    }

    /// Protected tokens handed to the strategy initializer.
    pub fn protected_tokens(&self) -> Vec<Address> {
        match &self.protected_tokens {
            Some(tokens) => tokens.clone(),
            None => vec![
                self.tokens.want,
                self.tokens.lp_component,
                self.tokens.reward,
            ],
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.is_empty() {
            return Err(ConfigError::ValidationError(
                "Network name cannot be empty".to_string(),
            ));
        }

        if self.governance == Address::ZERO {
            return Err(ConfigError::ValidationError(
                "Governance cannot be the zero address".to_string(),
            ));
        }

        for (name, fee) in [
            ("governance performance", self.fees.governance_performance),
            ("strategist performance", self.fees.strategist_performance),
            ("withdrawal", self.fees.withdrawal),
        ] {
            if fee > MAX_BPS {
                return Err(ConfigError::ValidationError(format!(
                    "{} fee {} exceeds {} bps",
                    name, fee, MAX_BPS
                )));
            }
        }
        if self.fees.total() >= u32::from(MAX_BPS) {
            return Err(ConfigError::ValidationError(format!(
                "Fees sum to {} bps, must be below {}",
                self.fees.total(),
                MAX_BPS
            )));
        }

        let protected = self.protected_tokens();
        if protected.is_empty() {
            return Err(ConfigError::ValidationError(
                "Protected token list cannot be empty".to_string(),
            ));
        }
        // The strategy reads its want from the first protected token
        if protected.first() != Some(&self.tokens.want) {
            return Err(ConfigError::ValidationError(
                "Protected tokens must start with the want asset".to_string(),
            ));
        }

        if self.sett.name_prefix.is_empty() || self.sett.symbol_prefix.is_empty() {
            return Err(ConfigError::ValidationError(
                "Sett name and symbol prefixes cannot be empty".to_string(),
            ));
        }

        let acquisition = &self.acquisition;
        if acquisition.path.len() < 2 {
            return Err(ConfigError::ValidationError(
                "Acquisition path needs at least two tokens".to_string(),
            ));
        }
        if acquisition.path.last() != Some(&self.tokens.want) {
            return Err(ConfigError::ValidationError(
                "Acquisition path must end at the want asset".to_string(),
            ));
        }
        if acquisition.amount_out <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "Acquisition amount must be greater than 0".to_string(),
            ));
        }
        if acquisition.gas_reserve < Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "Gas reserve cannot be negative".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for SettConfig {
    fn default() -> Self {
        Self::polygon_wbtc()
    }
}

pub async fn load_config_from_path(path: &str) -> Result<SettConfig, ConfigError> {
    let content = tokio::fs::read_to_string(path).await?;
    SettConfig::from_yaml(&content)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    const POLYGON_YAML: &str = r#"
network: polygon
governance: "0xb65cef03b9b89f99517643226d76e286ee999e77"
tokens:
  want: "0x1bfd67037b42cf73acf2047067bd4f2c47d9bfd6"
  lp_component: "0xffbacce0cc7c19d46132f1258fc16cf6871d153c"
  reward: "0x172370d5cd63279efa6d502dab29171933a610af"
  secondary_reward: "0x0d500b1d8e8ef31e21c99d1db9a6444d3adf1270"
fees:
  governance_performance: 1000
  strategist_performance: 1000
  withdrawal: 75
price_feeds:
  want: "0xc907e116054ad103354f2d350fd2514433d57f6f"
acquisition:
  router: "0x1b02da8cb0d097eb8d57a175b88c7d8b47997506"
  path:
    - "0x0d500b1d8e8ef31e21c99d1db9a6444d3adf1270"
    - "0x7ceb23fd6bc0add59e62ac25578270cff1b9f619"
    - "0x1bfd67037b42cf73acf2047067bd4f2c47d9bfd6"
  amount_out: "0.1"
  deadline: 9999999999999999
"#;

    #[test]
    fn test_yaml_matches_builtin_profile() {
        let parsed = SettConfig::from_yaml(POLYGON_YAML).unwrap();
        assert_eq!(parsed, SettConfig::polygon_wbtc());
    }

    #[test]
    fn test_workspace_profile_matches_builtin() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/polygon-wbtc.yml");
        let loaded = SettConfig::load(path).unwrap();
        assert_eq!(loaded, SettConfig::polygon_wbtc());
    }

    #[test]
    fn test_config_save_and_load() {
        let mut config = SettConfig::polygon_wbtc();
        config.roles.keeper = Some(address!("00000000000000000000000000000000000000aa"));
        let temp_file = NamedTempFile::new().unwrap();

        config.save(temp_file.path()).unwrap();
        let loaded = SettConfig::load(temp_file.path()).unwrap();

        assert_eq!(loaded, config);
        assert_eq!(loaded.acquisition.amount_out, dec!(0.1));
        assert_eq!(
            loaded.roles.keeper,
            Some(address!("00000000000000000000000000000000000000aa"))
        );
    }

    #[tokio::test]
    async fn test_load_config_from_path() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), POLYGON_YAML).unwrap();

        let config = load_config_from_path(temp_file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(config.network, "polygon");
        assert_eq!(config.acquisition.path.len(), 3);
    }

    #[test]
    fn test_defaults_derived() {
        let config = SettConfig::polygon_wbtc();
        assert_eq!(config.rewards(), BADGER_DEV_MULTISIG);
        assert_eq!(
            config.protected_tokens(),
            vec![WANT, LP_COMPONENT, REWARD_TOKEN]
        );
        assert_eq!(config.sett.name_prefix, "prefix");
        assert_eq!(config.sett.symbol_prefix, "PREFIX");
        assert!(!config.sett.override_token_name);
        assert_eq!(config.acquisition.gas_reserve, dec!(1));
    }

    #[test]
    fn test_config_validation() {
        let mut config = SettConfig::polygon_wbtc();

        // Valid config should pass
        config.validate().unwrap();

        // Fees summing to the full denominator should fail
        config.fees = Fees {
            governance_performance: 5000,
            strategist_performance: 4000,
            withdrawal: 1000,
        };
        assert!(config.validate().is_err());

        // Reset and test a single oversized fee
        config = SettConfig::polygon_wbtc();
        config.fees.withdrawal = 10_001;
        assert!(config.validate().is_err());

        // Reset and test empty protected tokens
        config = SettConfig::polygon_wbtc();
        config.protected_tokens = Some(vec![]);
        assert!(config.validate().is_err());

        // Protected tokens must lead with want
        config.protected_tokens = Some(vec![REWARD_TOKEN]);
        assert!(config.validate().is_err());
        config.protected_tokens = Some(vec![LP_COMPONENT, WANT]);
        assert!(config.validate().is_err());
        config.protected_tokens = Some(vec![WANT, LP_COMPONENT]);
        assert!(config.validate().is_ok());

        // Reset and test a path that does not end at want
        config = SettConfig::polygon_wbtc();
        config.acquisition.path = vec![WMATIC, WETH];
        assert!(config.validate().is_err());

        // Reset and test a zero acquisition amount
        config = SettConfig::polygon_wbtc();
        config.acquisition.amount_out = Decimal::ZERO;
        assert!(config.validate().is_err());

        // Reset and test a zero governance address
        config = SettConfig::polygon_wbtc();
        config.governance = Address::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fees_just_below_bound_pass() {
        let mut config = SettConfig::polygon_wbtc();
        config.fees = Fees {
            governance_performance: 5000,
            strategist_performance: 4000,
            withdrawal: 999,
        };
        config.validate().unwrap();
    }

    #[test]
    fn test_invalid_yaml() {
        let err = SettConfig::from_yaml("network: [").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
