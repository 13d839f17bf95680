//! End-to-end deployments against the in-memory chain.

use chain_sim::{SimChain, SimEnvironment};
use common::{Address, ChainBackend, ContractReader, FailureKind, U256};
use config::SettConfig;
use deployer::bindings::{Controller, Vault};
use deployer::{DeployError, DeployMode, Deployer, GovernanceAccess, Step};

const WAD: u64 = 1_000_000_000_000_000_000;

fn native(amount: u64) -> U256 {
    U256::from(amount) * U256::from(WAD)
}

#[tokio::test]
async fn test_mode_wires_and_funds_the_system() {
    let config = SettConfig::polygon_wbtc();
    let chain = SimChain::fork(&config);
    let deployer = Deployer::new(&chain, config.clone(), DeployMode::Test).unwrap();

    let system = deployer.deploy_from_first_account().await.unwrap();
    let me = system.deployer();

    assert_eq!(system.governance_access, GovernanceAccess::Impersonated);
    assert!(system.is_fully_wired());
    assert_eq!(system.roles.governance, config.governance);
    assert_eq!(system.roles.strategist, me);
    let controller = Controller::at(&chain, system.controller);
    assert_eq!(controller.vaults(system.want).await.unwrap(), system.vault);
    assert_eq!(
        controller.strategies(system.want).await.unwrap(),
        system.strategy
    );
    assert!(!Vault::at(&chain, system.vault).paused().await.unwrap());
    assert_eq!(chain.strategy_want(system.strategy).await.unwrap(), system.want);

    // 0.1 wBTC, paid for at 30k USD per wBTC and 1 USD per MATIC
    let acquired = U256::from(10_000_000u64);
    assert_eq!(system.acquired_want, Some(acquired));
    assert_eq!(chain.balance_of(system.want, me).await.unwrap(), acquired);
    assert_eq!(
        chain.native_balance(me).await.unwrap(),
        native(10_000) - native(3_000)
    );
}

#[tokio::test]
async fn test_live_mode_defers_governance_calls() {
    let config = SettConfig::polygon_wbtc();
    let chain = SimChain::fork(&config);
    let deployer = Deployer::new(&chain, config, DeployMode::Live).unwrap();

    let system = deployer.deploy_from_first_account().await.unwrap();

    assert_eq!(system.governance_access, GovernanceAccess::Deferred);
    assert!(!system.is_fully_wired());
    let steps: Vec<Step> = system.pending.iter().map(|p| p.step).collect();
    assert_eq!(
        steps,
        vec![Step::UnpauseSett, Step::ApproveStrategy, Step::SetStrategy]
    );
    assert_eq!(system.pending[0].tx.from, system.roles.governance);
    assert_eq!(system.pending[2].tx.from, system.deployer());

    // Everything the deployer may do still happened
    assert_eq!(
        chain
            .controller_vault(system.controller, system.want)
            .await
            .unwrap(),
        system.vault
    );
    assert!(chain.vault_paused(system.vault).await.unwrap());
    assert_eq!(
        chain
            .controller_strategy(system.controller, system.want)
            .await
            .unwrap(),
        Address::ZERO
    );
    assert_eq!(system.acquired_want, None);
    assert!(chain
        .balance_of(system.want, system.deployer())
        .await
        .unwrap()
        .is_zero());

    let json = serde_json::to_value(&system).unwrap();
    assert_eq!(json["mode"], "live");
    assert_eq!(json["pending"][0]["step"], "unpause_sett");
    assert_eq!(json["pending"][1]["tx"]["call"]["function"], "approveStrategy");
}

#[tokio::test]
async fn test_live_mode_with_governance_key_wires_everything() {
    let mut config = SettConfig::polygon_wbtc();
    let chain = SimChain::fork(&config);
    let accounts = chain.accounts().await.unwrap();
    config.governance = accounts[0];

    let deployer = Deployer::new(&chain, config, DeployMode::Live).unwrap();
    let system = deployer.deploy(accounts[0]).await.unwrap();

    assert_eq!(system.governance_access, GovernanceAccess::Signer);
    assert!(system.is_fully_wired());
    assert!(!chain.vault_paused(system.vault).await.unwrap());
    assert_eq!(
        chain
            .controller_strategy(system.controller, system.want)
            .await
            .unwrap(),
        system.strategy
    );
}

#[tokio::test]
async fn test_thin_router_liquidity_fails_acquisition() {
    let config = SettConfig::polygon_wbtc();
    let env = SimEnvironment {
        router_liquidity: U256::from(1_000_000u64),
        ..SimEnvironment::default()
    };
    let chain = SimChain::with_environment(&config, env);
    let deployer = Deployer::new(&chain, config, DeployMode::Test).unwrap();

    let err = deployer.deploy_from_first_account().await.unwrap_err();
    assert_eq!(err.step(), Some(Step::AcquireWant));
    assert_eq!(err.kind(), Some(FailureKind::ExternalLiquidity));
}

#[tokio::test]
async fn test_insufficient_native_balance_fails_acquisition() {
    let config = SettConfig::polygon_wbtc();
    let env = SimEnvironment {
        dev_balance: native(2_000),
        ..SimEnvironment::default()
    };
    let chain = SimChain::with_environment(&config, env);
    let deployer = Deployer::new(&chain, config, DeployMode::Test).unwrap();

    match deployer.deploy_from_first_account().await {
        Err(DeployError::Step { step, source, .. }) => {
            assert_eq!(step, Step::AcquireWant);
            assert_eq!(
                source.revert_reason(),
                Some("UniswapV2Router: EXCESSIVE_INPUT_AMOUNT")
            );
        }
        other => panic!("expected acquisition failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_fees_rejected_before_any_transaction() {
    let mut config = SettConfig::polygon_wbtc();
    config.fees.governance_performance = 9_000;
    config.fees.strategist_performance = 1_000;
    let chain = SimChain::fork(&SettConfig::polygon_wbtc());

    let result = Deployer::new(&chain, config, DeployMode::Test);
    assert!(matches!(result, Err(DeployError::Config(_))));
    assert_eq!(chain.block_number().await, 0);
}

#[tokio::test]
async fn test_each_run_deploys_fresh_contracts() {
    let config = SettConfig::polygon_wbtc();
    let chain = SimChain::fork(&config);
    let accounts = chain.accounts().await.unwrap();
    let deployer = Deployer::new(&chain, config, DeployMode::Live).unwrap();

    let first = deployer.deploy(accounts[0]).await.unwrap();
    let second = deployer.deploy(accounts[1]).await.unwrap();

    assert_ne!(first.run_id, second.run_id);
    assert_ne!(first.controller, second.controller);
    assert_ne!(first.vault, second.vault);
    assert_ne!(first.strategy, second.strategy);
}
