//! ace - native library packaging for ArkUI-X cross-platform builds
//!
//! This crate provides the core library functionality for ace: loading SDK
//! module manifests, resolving the modules a project needs, and packaging
//! their native libraries into the generated Android and iOS projects.

pub mod builder;
pub mod core;
pub mod ops;
pub mod resolver;
pub mod util;

/// Test utilities and fixtures for ace unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a scripted command runner and on-disk SDK
/// and project fixtures.
#[cfg(test)]
pub mod test_support;

pub use core::{
    manifest::ManifestStore, platform::FileType, platform::Platform, project::Project, sdk::Sdk,
};

pub use resolver::{DependencyResolver, ResolvedDependencySet};
pub use util::context::GlobalContext;
