//! Native library packaging.
//!
//! This module turns a resolved module set into files and project edits:
//! locating libraries per architecture, syncing them into the native
//! projects, splicing frameworks into Xcode projects, trimming ICU data and
//! writing the CocoaPods spec.

pub mod context;
pub mod icu;
pub mod locator;
pub mod pbxproj;
pub mod podspec;
pub mod sync;

pub use context::{BuildContext, NotFoundAction, NotFoundHandler, NotFoundPolicy};
pub use icu::{IcuDataFilterBridge, IcuOutcome, IcuPlan};
pub use locator::{ArchitectureLibraryLocator, LibraryArtifact, LibraryMap, LocateError};
pub use pbxproj::{PbxprojError, PbxprojSpliceEngine, ProjectKind, SpliceReport};
pub use sync::{SyncPlan, SyncReport};
