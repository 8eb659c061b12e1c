//! Tools for working with custom elements manifests.
//!
//! # Overview
//!
//! A custom elements manifest describes the modules a package publishes, the
//! declarations each module contains and what each module exports. Exports of
//! kind `custom-element-definition` point at the class that backs a custom
//! element via a [`Reference`].
//!
//! - [`Manifest`]: the validated, strongly typed document.
//! - [`reference`]: the `package/module#name` string codec used as a durable
//!   pointer to declarations.
//! - [`resolve`]: locating the declaration a [`Reference`] points at.
//! - [`index`]: discovering every custom element a manifest defines.

pub mod index;
pub mod manifest;
pub mod reference;
pub mod resolve;

pub use index::{custom_elements, CustomElementInfo};
pub use manifest::*;
pub use reference::{Reference, ReferenceError};
pub use resolve::{find_module, resolve, resolve_with_module, ResolveContext, ResolveError};
