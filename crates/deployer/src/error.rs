use crate::orchestrator::Step;
use common::amounts::AmountError;
use common::{ChainError, FailureKind};
use config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid amount: {0}")]
    Amount(#[from] AmountError),

    /// A pipeline step failed; everything deployed before it must be discarded.
    #[error("step `{step}` failed ({kind}): {source}")]
    Step {
        step: Step,
        kind: FailureKind,
        #[source]
        source: ChainError,
    },

    #[error("no account available to deploy from")]
    NoDeployer,
}

impl DeployError {
    pub(crate) fn at(step: Step, source: ChainError) -> Self {
        DeployError::Step {
            step,
            kind: source.kind(),
            source,
        }
    }

    /// The step that failed, if the failure happened inside the pipeline.
    pub fn step(&self) -> Option<Step> {
        match self {
            DeployError::Step { step, .. } => Some(*step),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            DeployError::Step { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("check `{check}` failed: {detail}")]
    Check { check: &'static str, detail: String },

    #[error("expected revert `{expected}`, got {actual}")]
    UnexpectedOutcome { expected: String, actual: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_error_display() {
        let err = DeployError::at(
            Step::UnpauseSett,
            ChainError::Reverted("onlyGovernance".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "step `unpause sett` failed (authorization): execution reverted: onlyGovernance"
        );
        assert_eq!(err.step(), Some(Step::UnpauseSett));
        assert_eq!(err.kind(), Some(FailureKind::Authorization));
    }

    #[test]
    fn test_check_error_display() {
        let err = ScenarioError::Check {
            check: "balanceOfWant > 0",
            detail: "got 0".to_string(),
        };
        assert_eq!(err.to_string(), "check `balanceOfWant > 0` failed: got 0");
    }
}
