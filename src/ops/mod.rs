//! High-level operations.
//!
//! This module contains the implementation of ace commands.

pub mod ace_build;
pub mod ace_deps;
pub mod ace_pods;
pub mod resolve;

pub use ace_build::{build, BuildOptions, BuildSummary};
pub use ace_deps::{deps, format_deps};
pub use ace_pods::{pods, PodsSummary};
pub use resolve::{locate_sdk, resolve_project, ProjectModules};
