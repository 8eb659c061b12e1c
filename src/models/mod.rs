//! Persisted catalog records.
//!
//! # Ownership
//!
//! - [`PackageRecord`]: one per imported package, keyed by name.
//! - [`VersionRecord`]: one per published version, owned by its package.
//! - [`CustomElementRecord`]: one per custom element a version defines,
//!   owned by its version.
//!
//! Manifests themselves are only kept as raw JSON on the version; elements
//! point back into them with reference strings.

mod element;
mod package;
mod version;

pub use element::*;
pub use package::*;
pub use version::*;
