use alloy_primitives::Address;
use std::fmt;
use thiserror::Error;

/// Errors surfaced by a chain backend while deploying, sending or reading.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChainError {
    /// The transaction or call reverted with the given reason string.
    #[error("execution reverted: {0}")]
    Reverted(String),

    /// The backend holds no key for the sender and cannot impersonate it.
    #[error("account {0} is not unlocked for signing")]
    Locked(Address),

    /// The backend does not support the requested operation.
    #[error("unsupported by backend: {0}")]
    Unsupported(String),

    /// No contract of the expected kind lives at the address.
    #[error("no {kind} contract at {address}")]
    UnknownContract { kind: &'static str, address: Address },

    /// Compiled contract artifacts are missing or malformed.
    #[error("artifact error: {0}")]
    Artifact(String),

    /// RPC transport or node failure.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ChainError {
    /// Builds an error from a node error message, extracting a revert reason when present.
    ///
    /// Understands geth and Anvil (`execution reverted: <reason>`), Hardhat
    /// (`reverted with reason string '<reason>'`) and Ganache
    /// (`VM Exception while processing transaction: revert <reason>`).
    pub fn from_rpc_message(message: impl Into<String>) -> Self {
        const HARDHAT: &str = "reverted with reason string '";
        const HARDHAT_BARE: &str = "reverted without a reason string";
        const GANACHE: &str = "processing transaction: revert";
        const GETH: &str = "execution reverted";

        let message = message.into();
        let reason = if let Some(idx) = message.find(HARDHAT) {
            let rest = &message[idx + HARDHAT.len()..];
            rest.rsplit_once('\'').map_or(rest, |(reason, _)| reason)
        } else if message.contains(HARDHAT_BARE) {
            ""
        } else if let Some(idx) = message.find(GANACHE) {
            message[idx + GANACHE.len()..].trim()
        } else if let Some(idx) = message.find(GETH) {
            message[idx + GETH.len()..].trim_start_matches(':').trim()
        } else {
            return ChainError::Transport(message);
        };
        ChainError::Reverted(reason.to_string())
    }

    /// The revert reason, if this error is a revert.
    pub fn revert_reason(&self) -> Option<&str> {
        match self {
            ChainError::Reverted(reason) => Some(reason.as_str()),
            _ => None,
        }
    }

    /// Classifies the failure into the orchestrator's error taxonomy.
    pub fn kind(&self) -> FailureKind {
        match self {
            ChainError::Reverted(reason) => FailureKind::from_revert_reason(reason),
            ChainError::Locked(_) => FailureKind::Authorization,
            ChainError::UnknownContract { .. } => FailureKind::Precondition,
            ChainError::Unsupported(_) | ChainError::Artifact(_) | ChainError::Transport(_) => {
                FailureKind::Infrastructure
            }
        }
    }
}

/// Coarse failure categories reported to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// A privileged call made by an identity lacking the privilege.
    Authorization,
    /// A call made against a contract in the wrong lifecycle state.
    Precondition,
    /// The DEX could not satisfy an exact-output swap before its deadline.
    ExternalLiquidity,
    /// Transport, artifact or backend capability problems.
    Infrastructure,
}

impl FailureKind {
    /// Maps a revert reason string to a failure category.
    ///
    /// Access-control modifiers in the vault contracts revert with reasons
    /// like `onlyGovernance` or `!governance`; router and pair libraries
    /// prefix their reasons with the contract name.
    pub fn from_revert_reason(reason: &str) -> Self {
        const AUTHORIZATION_MARKERS: [&str; 5] =
            ["only", "!governance", "!strategist", "!authorized", "Ownable:"];
        const LIQUIDITY_MARKERS: [&str; 2] = ["UniswapV2Router:", "UniswapV2Library:"];

        if AUTHORIZATION_MARKERS.iter().any(|m| reason.starts_with(m)) {
            FailureKind::Authorization
        } else if LIQUIDITY_MARKERS.iter().any(|m| reason.starts_with(m)) {
            FailureKind::ExternalLiquidity
        } else {
            FailureKind::Precondition
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Authorization => write!(f, "authorization"),
            FailureKind::Precondition => write!(f, "precondition"),
            FailureKind::ExternalLiquidity => write!(f, "external liquidity"),
            FailureKind::Infrastructure => write!(f, "infrastructure"),
        }
    }
}
