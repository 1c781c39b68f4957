//! Reuse of previously prepared source images

use super::{task_result_reference, PRE_BUILD_TASK, RESULT_PRE_BUILD_IMAGE_DIGEST};
use crate::model::BuildRecipe;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Pre-build images already pushed, keyed by `<builder image>-<tool>`.
pub type ExistingImageIndex = BTreeMap<String, String>;

/// Where the build stage gets its prepared source from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreBuildSource {
    /// An earlier build with the same image and tool already pushed it.
    Cached { digest: String },
    /// The plan must contain a pre-build stage producing it.
    Generate,
}

impl PreBuildSource {
    /// Looks up the recipe's image and tool. Empty entries count as absent.
    pub fn resolve(existing: &ExistingImageIndex, recipe: &BuildRecipe) -> Self {
        let key = recipe.pre_build_image_key();
        match existing.get(&key).filter(|digest| !digest.is_empty()) {
            Some(digest) => {
                info!(%key, %digest, "Reusing existing pre-build image");
                Self::Cached {
                    digest: digest.clone(),
                }
            }
            None => {
                debug!(%key, "No pre-build image found, generating pre-build stage");
                Self::Generate
            }
        }
    }

    pub fn needs_pre_build(&self) -> bool {
        matches!(self, Self::Generate)
    }

    /// The literal cached digest, or a reference to the pre-build result.
    pub fn digest_reference(&self) -> String {
        match self {
            Self::Cached { digest } => digest.clone(),
            Self::Generate => task_result_reference(PRE_BUILD_TASK, RESULT_PRE_BUILD_IMAGE_DIGEST),
        }
    }
}
