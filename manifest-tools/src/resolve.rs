//! Reference resolution within a single package's manifest.
//!
//! Only package-local references can be resolved. Resolving into another
//! package would need a registry of manifests, so such references are
//! reported as [`ResolveError::CrossPackage`] instead.
//!
//! Lookups are linear scans over modules and declarations.

use thiserror::Error;

use crate::manifest::{Declaration, Manifest, Module};
use crate::reference::Reference;

/// The package being resolved. `version` is only used in diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub package_name: &'a str,
    pub version: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("can't resolve cross-package reference to `{name}` in package `{package}`")]
    CrossPackage { package: String, name: String },

    #[error("can't find module `{module}` in {package}@{version} (modules: {available:?})")]
    ModuleNotFound {
        package: String,
        version: String,
        module: String,
        available: Vec<String>,
    },

    #[error("can't find declaration `{name}` in module `{module}` of {package}@{version}")]
    DeclarationNotFound {
        package: String,
        version: String,
        module: String,
        name: String,
    },
}

/// Resolves `reference`, as written in `local_module`, to a declaration.
///
/// Returns the declaration whatever its kind; callers looking for a custom
/// element must check for a class themselves.
pub fn resolve<'m>(
    manifest: &'m Manifest,
    local_module: &'m Module,
    reference: &Reference,
    ctx: &ResolveContext<'_>,
) -> Result<&'m Declaration, ResolveError> {
    resolve_with_module(manifest, local_module, reference, ctx).map(|(_, decl)| decl)
}

/// Like [`resolve`], also returning the module the declaration lives in.
pub fn resolve_with_module<'m>(
    manifest: &'m Manifest,
    local_module: &'m Module,
    reference: &Reference,
    ctx: &ResolveContext<'_>,
) -> Result<(&'m Module, &'m Declaration), ResolveError> {
    if let Some(package) = &reference.package {
        if package != ctx.package_name {
            return Err(ResolveError::CrossPackage {
                package: package.clone(),
                name: reference.name.clone(),
            });
        }
    }

    let module = match &reference.module {
        None => local_module,
        Some(path) => manifest
            .modules
            .iter()
            .find(|m| &m.path == path)
            .ok_or_else(|| ResolveError::ModuleNotFound {
                package: ctx.package_name.to_string(),
                version: ctx.version.to_string(),
                module: path.clone(),
                available: manifest.module_paths(),
            })?,
    };

    let declaration = module
        .declarations
        .iter()
        .find(|d| d.name() == reference.name)
        .ok_or_else(|| ResolveError::DeclarationNotFound {
            package: ctx.package_name.to_string(),
            version: ctx.version.to_string(),
            module: module.path.clone(),
            name: reference.name.clone(),
        })?;

    Ok((module, declaration))
}

/// Finds a module by path, ignoring one leading `/` on the queried path.
pub fn find_module<'m>(manifest: &'m Manifest, path: &str) -> Option<&'m Module> {
    let path = path.strip_prefix('/').unwrap_or(path);
    manifest.modules.iter().find(|m| m.path == path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CTX: ResolveContext<'static> = ResolveContext {
        package_name: "foo",
        version: "1.0.0",
    };

    fn manifest() -> Manifest {
        Manifest::from_json(
            r#"{"modules":[
                {"path":"a.js","declarations":[
                    {"kind":"class","name":"A"},
                    {"kind":"function","name":"shared"}
                ]},
                {"path":"b.js","declarations":[
                    {"kind":"class","name":"B"},
                    {"kind":"variable","name":"shared"},
                    {"kind":"class","name":"B","description":"second"}
                ]}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn local_reference_uses_the_local_module() {
        let m = manifest();
        let decl = resolve(&m, &m.modules[1], &Reference::local("shared"), &CTX).unwrap();
        assert_eq!(decl.kind(), "variable");
    }

    #[test]
    fn local_reference_ignores_other_modules() {
        let m = manifest();
        let err = resolve(&m, &m.modules[0], &Reference::local("B"), &CTX).unwrap_err();
        assert!(matches!(err, ResolveError::DeclarationNotFound { .. }));
    }

    #[test]
    fn local_module_need_not_be_in_manifest() {
        let empty = Manifest {
            schema_version: None,
            readme: None,
            modules: vec![],
        };
        let other = manifest();
        let decl = resolve(&empty, &other.modules[0], &Reference::local("A"), &CTX).unwrap();
        assert_eq!(decl.name(), "A");
    }

    #[test]
    fn module_reference_crosses_modules() {
        let m = manifest();
        let decl = resolve(&m, &m.modules[0], &Reference::in_module("b.js", "B"), &CTX).unwrap();
        assert_eq!(decl.name(), "B");
        assert_eq!(decl.description(), None, "first match wins");
    }

    #[test]
    fn module_paths_are_compared_strictly() {
        let m = manifest();
        let err = resolve(&m, &m.modules[0], &Reference::in_module("/b.js", "B"), &CTX)
            .unwrap_err();
        match err {
            ResolveError::ModuleNotFound {
                module, available, ..
            } => {
                assert_eq!(module, "/b.js");
                assert_eq!(available, vec!["a.js", "b.js"]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn same_package_reference_resolves() {
        let m = manifest();
        let reference = Reference {
            package: Some("foo".into()),
            module: Some("a.js".into()),
            name: "A".into(),
        };
        assert!(resolve(&m, &m.modules[1], &reference, &CTX).is_ok());
    }

    #[test]
    fn foreign_package_reference_is_reported() {
        let m = manifest();
        let reference = Reference {
            package: Some("lit".into()),
            module: None,
            name: "LitElement".into(),
        };
        assert_eq!(
            resolve(&m, &m.modules[0], &reference, &CTX),
            Err(ResolveError::CrossPackage {
                package: "lit".into(),
                name: "LitElement".into(),
            })
        );
    }

    #[test]
    fn find_module_strips_leading_slash() {
        let m = manifest();
        assert_eq!(find_module(&m, "/b.js").unwrap().path, "b.js");
        assert_eq!(find_module(&m, "a.js").unwrap().path, "a.js");
        assert!(find_module(&m, "//a.js").is_none());
        assert!(find_module(&m, "./a.js").is_none());
    }
}
