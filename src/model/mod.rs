//! Inputs to plan generation
//!
//! Everything here is supplied by the caller for a single invocation and is
//! never mutated by the planner.

pub mod build;
pub mod build_tool;
pub mod id_enum_macro;
pub mod params;
pub mod recipe;
pub mod tenant;

pub use build::{BuildIdentity, ScmInfo, SystemConfig};
pub use build_tool::{java_home, BuildTool};
pub use params::{Param, ParamType, ParamValue};
pub use recipe::{AdditionalDownload, BuildRecipe, FileType};
pub use tenant::{
    BuildSettings, CacheSettings, GitSourceArchive, ImageRegistry, MavenDeployment, TenantConfig,
};
