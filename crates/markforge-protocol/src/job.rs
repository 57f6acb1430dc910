use crate::config::RunConfig;
use crate::scene::SceneDefinition;
use sha2::{Digest, Sha256};

/// Content hash of a run's inputs. Two runs with the same identifier and a
/// fixed seed produce the same trajectory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunIdentifier {
    pub hash: String,
}

impl RunIdentifier {
    pub fn from_parts(config: &RunConfig, scene: &SceneDefinition) -> Result<Self, String> {
        let mut hasher = Sha256::new();

        let config_json = serde_json::to_string(config).map_err(|e| e.to_string())?;
        hasher.update(config_json.as_bytes());

        let scene_json = serde_json::to_string(scene).map_err(|e| e.to_string())?;
        hasher.update(scene_json.as_bytes());

        Ok(Self {
            hash: hex::encode(hasher.finalize()),
        })
    }

    pub fn short(&self) -> &str {
        &self.hash[..self.hash.len().min(12)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::StackRecord;

    fn scene() -> SceneDefinition {
        SceneDefinition {
            name: "s".to_string(),
            stack: StackRecord {
                width: 1,
                height: 1,
                depth: 1,
                values: vec![0.0],
            },
            pool: vec![],
            initial: vec![],
        }
    }

    #[test]
    fn identifier_tracks_config_changes() {
        let a = RunIdentifier::from_parts(&RunConfig::default(), &scene()).unwrap();
        let mut cfg = RunConfig::default();
        cfg.search.seed = Some(9);
        let b = RunIdentifier::from_parts(&cfg, &scene()).unwrap();

        assert_eq!(a.hash.len(), 64);
        assert_eq!(a.short().len(), 12);
        assert_ne!(a, b);
        assert_eq!(a, RunIdentifier::from_parts(&RunConfig::default(), &scene()).unwrap());
    }
}
