//! Compiled contract artifacts produced by Brownie or Foundry.

use alloy::hex;
use alloy::primitives::Bytes;
use common::{ChainError, ContractKind};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Locates creation bytecode for the deployable contracts under a build directory.
///
/// Two layouts are understood:
/// - Brownie: `<dir>/contracts/<Name>.json` (or `<dir>/<Name>.json`) with a top-level `bytecode` string.
/// - Foundry: `<dir>/<Name>.sol/<Name>.json` with `bytecode.object`.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ArtifactStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn candidates(&self, name: &str) -> [PathBuf; 3] {
        [
            self.dir.join("contracts").join(format!("{name}.json")),
            self.dir.join(format!("{name}.json")),
            self.dir.join(format!("{name}.sol")).join(format!("{name}.json")),
        ]
    }

    /// Reads and decodes the creation bytecode for `kind`.
    pub async fn bytecode(&self, kind: ContractKind) -> Result<Bytes, ChainError> {
        let name = kind.artifact_name();
        let mut found = None;
        for path in self.candidates(name) {
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                found = Some(path);
                break;
            }
        }
        let path = found.ok_or_else(|| {
            ChainError::Artifact(format!(
                "no artifact for {} under {}",
                name,
                self.dir.display()
            ))
        })?;

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ChainError::Artifact(format!("{}: {}", path.display(), e)))?;
        parse_bytecode(&content)
            .map_err(|e| ChainError::Artifact(format!("{}: {}", path.display(), e)))
    }
}

fn parse_bytecode(content: &str) -> Result<Bytes, String> {
    let json: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
    let encoded = match &json["bytecode"] {
        Value::String(s) => s.as_str(),
        Value::Object(obj) => obj
            .get("object")
            .and_then(Value::as_str)
            .ok_or("bytecode.object missing")?,
        _ => return Err("bytecode missing".to_string()),
    };
    let encoded = encoded.strip_prefix("0x").unwrap_or(encoded);
    if encoded.is_empty() {
        return Err("empty bytecode (abstract contract or interface?)".to_string());
    }
    // Unlinked libraries leave `__Name__` placeholders in the hex
    if encoded.contains("__") {
        return Err("bytecode has unlinked library references".to_string());
    }
    hex::decode(encoded).map(Bytes::from).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_brownie_layout() {
        let bytes = parse_bytecode(r#"{"contractName":"Controller","bytecode":"0x6080"}"#).unwrap();
        assert_eq!(bytes.as_ref(), &[0x60, 0x80]);
    }

    #[test]
    fn test_parse_foundry_layout() {
        let bytes = parse_bytecode(r#"{"bytecode":{"object":"0x60806040"}}"#).unwrap();
        assert_eq!(bytes.len(), 4);
    }

    #[test]
    fn test_rejects_empty_and_unlinked() {
        assert!(parse_bytecode(r#"{"bytecode":"0x"}"#).is_err());
        assert!(parse_bytecode(r#"{"bytecode":"0x60__SafeMath______60"}"#).is_err());
        assert!(parse_bytecode(r#"{"abi":[]}"#).is_err());
    }

    #[tokio::test]
    async fn test_store_finds_each_layout() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("contracts")).unwrap();
        std::fs::write(
            dir.path().join("contracts").join("SettV3.json"),
            r#"{"bytecode":"0x01"}"#,
        )
        .unwrap();
        std::fs::create_dir_all(dir.path().join("MyStrategy.sol")).unwrap();
        std::fs::write(
            dir.path().join("MyStrategy.sol").join("MyStrategy.json"),
            r#"{"bytecode":{"object":"0x02"}}"#,
        )
        .unwrap();

        let store = ArtifactStore::new(dir.path());
        assert_eq!(store.bytecode(ContractKind::Sett).await.unwrap().as_ref(), &[0x01]);
        assert_eq!(
            store.bytecode(ContractKind::Strategy).await.unwrap().as_ref(),
            &[0x02]
        );
        let missing = store.bytecode(ContractKind::Controller).await;
        assert!(matches!(missing, Err(ChainError::Artifact(_))));
    }
}
