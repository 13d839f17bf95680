use anyhow::{bail, Context, Result};
use chain_rpc::{ArtifactStore, RpcChain};
use chain_sim::SimChain;
use clap::{Parser, Subcommand, ValueEnum};
use common::{ChainBackend, ContractReader, DevChain};
use config::{load_config_from_path, SettConfig};
use deployer::{
    harvest_cycle, harvest_without_price_feed, DeployMode, DeployedSystem, Deployer, Fixtures,
};
use std::path::PathBuf;
use tracing::{error, info};
use url::Url;

/// Environment variable holding the deployer's private key for live runs.
const DEPLOYER_KEY_ENV: &str = "SETT_DEPLOYER_KEY";

/// Command line arguments for sett-deploy.
#[derive(Parser, Debug)]
struct Args {
    /// Path to the deployment configuration YAML
    #[arg(long, default_value = "config/polygon-wbtc.yml")]
    config: String,
    /// JSON-RPC endpoint of the target node
    #[arg(long, default_value = "http://127.0.0.1:8545")]
    rpc_url: Url,
    /// Build directory with compiled contract artifacts
    #[arg(long, default_value = "build")]
    artifacts: PathBuf,
    /// Run against the in-memory simulator instead of a node
    #[arg(long)]
    simulate: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Deploy and wire the controller, Sett and strategy
    Deploy {
        #[arg(long, value_enum, default_value_t = Mode::Test)]
        mode: Mode,
        /// Write the deployed system as JSON to this file
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Deploy on a development chain, then run a harvest scenario
    Scenario {
        #[arg(value_enum)]
        name: ScenarioName,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Test,
    Live,
}

impl From<Mode> for DeployMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Test => DeployMode::Test,
            Mode::Live => DeployMode::Live,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ScenarioName {
    /// Deposit, earn, accrue, harvest and tend
    Harvest,
    /// Harvest after the want price feed is removed
    NoPriceFeed,
}

async fn deploy<C>(chain: &C, config: SettConfig, mode: DeployMode) -> Result<DeployedSystem>
where
    C: ChainBackend + ?Sized,
{
    let deployer = Deployer::new(chain, config, mode)?;
    match deployer.deploy_from_first_account().await {
        Ok(system) => Ok(system),
        Err(e) => {
            error!(step = ?e.step(), kind = ?e.kind(), error = %e, "Deployment failed");
            Err(e.into())
        }
    }
}

async fn run_scenario<C>(chain: &C, config: SettConfig, name: ScenarioName) -> Result<()>
where
    C: ChainBackend + ContractReader + DevChain + ?Sized,
{
    let wmatic = config.tokens.secondary_reward;
    let system = deploy(chain, config, DeployMode::Test).await?;
    let accounts = chain.accounts().await?;
    let random_user = accounts
        .get(1)
        .copied()
        .context("scenario needs a second unlocked account")?;
    let fixtures = Fixtures::new(&system, wmatic, random_user);

    match name {
        ScenarioName::Harvest => {
            let report = harvest_cycle(chain, &fixtures).await?;
            info!(?report, "Scenario passed");
        }
        ScenarioName::NoPriceFeed => {
            let want = harvest_without_price_feed(chain, &fixtures).await?;
            info!(%want, "Scenario passed");
        }
    }
    Ok(())
}

async fn run<C>(chain: &C, config: SettConfig, command: Command) -> Result<()>
where
    C: ChainBackend + ContractReader + DevChain + ?Sized,
{
    match command {
        Command::Deploy { mode, out } => {
            let system = deploy(chain, config, mode.into()).await?;
            let json = serde_json::to_string_pretty(&system)?;
            match out {
                Some(path) => {
                    tokio::fs::write(&path, json)
                        .await
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!(path = %path.display(), "Wrote deployed system");
                }
                None => println!("{}", json),
            }
            if !system.is_fully_wired() {
                for action in &system.pending {
                    info!(
                        step = %action.step,
                        to = %action.tx.to,
                        function = action.tx.call.function_name(),
                        "Pending governance action"
                    );
                }
            }
            Ok(())
        }
        Command::Scenario { name } => run_scenario(chain, config, name).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let config = load_config_from_path(&args.config)
        .await
        .with_context(|| format!("loading {}", args.config))?;

    let live = matches!(args.command, Command::Deploy { mode: Mode::Live, .. });
    if args.simulate {
        if live {
            bail!("--simulate cannot be combined with --mode live");
        }
        let chain = SimChain::fork(&config);
        return run(&chain, config, args.command).await;
    }

    let artifacts = ArtifactStore::new(args.artifacts);
    let chain = if live {
        let key = std::env::var(DEPLOYER_KEY_ENV).with_context(|| {
            format!("{} must hold the deployer key for live runs", DEPLOYER_KEY_ENV)
        })?;
        RpcChain::connect_live(args.rpc_url, &key, artifacts)?
    } else {
        RpcChain::connect_dev(args.rpc_url, artifacts)
    };
    run(&chain, config, args.command).await
}
