//! Core data structures for ace.
//!
//! This module contains the foundational types used throughout ace:
//! - Platforms, build profiles and output file types
//! - Library path templates and SDK module manifests
//! - Module usage collections of the project being packaged
//! - The SDK and project directory layouts

pub mod collection;
pub mod layout;
pub mod manifest;
pub mod platform;
pub mod project;
pub mod sdk;
pub mod template;

pub use collection::ModuleCollection;
pub use layout::{DestinationMap, LibraryLayout};
pub use manifest::{ManifestError, ManifestStore, ModuleManifestEntry};
pub use platform::{BuildProfile, FileType, Platform};
pub use project::Project;
pub use sdk::Sdk;
pub use template::PathTemplate;
