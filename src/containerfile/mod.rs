//! Container definitions that reproduce a build outside the task graph
//!
//! Both render from the same [`ScriptBundle`](crate::script::ScriptBundle)
//! as the task graph, so the three never disagree on build logic.

pub mod diagnostic;
pub mod portable;

pub use diagnostic::diagnostic_dockerfile;
pub use portable::portable_containerfile;

/// Working directory shared by every stage of both definitions.
pub const WORKDIR: &str = "/var/workdir";
