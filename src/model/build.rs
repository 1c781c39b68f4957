//! Identity of a dependency build and cluster wide settings

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Source control coordinates of the dependency being rebuilt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScmInfo {
    #[serde(rename = "scmURL")]
    pub scm_url: String,
    pub tag: String,
    pub commit_hash: String,
    pub path: String,
    pub private: bool,
    /// Deploy into an existing source archive repository rather than a new one.
    pub reuse_repository: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildIdentity {
    /// Stable identifier, see [`BuildIdentity::stable_name`].
    pub name: String,
    pub scm: ScmInfo,
    /// Version of the dependency being produced.
    pub version: String,
}

impl BuildIdentity {
    pub fn new(scm: ScmInfo, version: impl Into<String>) -> Self {
        let name = Self::stable_name(&scm.scm_url, &scm.tag, &scm.path);
        Self {
            name,
            scm,
            version: version.into(),
        }
    }

    /// Deterministic name derived from the source coordinates only, so that
    /// new processor images or recipe edits keep tagging the same images.
    pub fn stable_name(scm_url: &str, tag: &str, path: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(scm_url.as_bytes());
        hasher.update(b"\0");
        hasher.update(tag.as_bytes());
        hasher.update(b"\0");
        hasher.update(path.as_bytes());
        hex::encode(&hasher.finalize()[..16])
    }
}

/// Cluster-wide settings shared by all tenants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemConfig {
    /// Ceiling for a recipe's additional memory in megabytes. Zero disables it.
    pub max_additional_memory: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_name_is_deterministic() {
        let a = BuildIdentity::stable_name("https://github.com/a/b.git", "1.0", "");
        let b = BuildIdentity::stable_name("https://github.com/a/b.git", "1.0", "");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_stable_name_separates_fields() {
        let a = BuildIdentity::stable_name("url", "ab", "c");
        let b = BuildIdentity::stable_name("url", "a", "bc");
        assert_ne!(a, b);
    }

    #[test]
    fn test_new_derives_name() {
        let scm = ScmInfo {
            scm_url: "https://github.com/a/b.git".to_string(),
            tag: "v1".to_string(),
            ..Default::default()
        };
        let identity = BuildIdentity::new(scm, "1.0");
        assert_eq!(
            identity.name,
            BuildIdentity::stable_name("https://github.com/a/b.git", "v1", "")
        );
        assert_eq!(identity.version, "1.0");
    }
}
