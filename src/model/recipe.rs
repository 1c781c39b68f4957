//! Build recipe: how to rebuild a single dependency

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::build_tool::BuildTool;

crate::define_id_enum! {
    /// How an additional download is installed into the builder image.
    FileType {
        Tar => "tar",
        Executable => "executable",
        Rpm => "rpm",
    }
}

/// An extra package fetched into the build container before the build runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdditionalDownload {
    pub uri: String,
    pub file_type: FileType,
    /// Required for `tar`: directory inside the archive added to `PATH`.
    pub binary_path: String,
    /// Required for `executable`.
    pub file_name: String,
    /// Required for `rpm`.
    pub package_name: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildRecipe {
    pub tool: BuildTool,
    /// Builder container image the build runs in.
    pub image: String,
    pub java_version: String,
    /// Tool name to version, e.g. `maven -> 3.8.8`.
    pub tool_versions: BTreeMap<String, String>,
    /// Version of the selected tool.
    pub tool_version: String,
    pub enforce_version: bool,
    /// Overrides the build identity's target version when set.
    pub project_version: Option<String>,
    pub disabled_plugins: Vec<String>,
    pub repositories: Vec<String>,
    pub pre_build_script: String,
    pub post_build_script: String,
    pub additional_downloads: Vec<AdditionalDownload>,
    pub allowed_differences: Vec<String>,
    /// Extra memory in megabytes, on top of the tenant's build memory.
    pub additional_memory: u32,
    pub disable_submodules: bool,
}

impl BuildRecipe {
    /// Suffix appended to cache URLs so the cache serves the recipe's extra
    /// repositories: `-repo1,repo2`, or empty.
    pub fn repository_suffix(&self) -> String {
        if self.repositories.is_empty() {
            String::new()
        } else {
            format!("-{}", self.repositories.join(","))
        }
    }

    /// Key into the existing pre-build image index.
    pub fn pre_build_image_key(&self) -> String {
        format!("{}-{}", self.image, self.tool)
    }
}
