//! Reference codec.
//!
//! Declarations are persisted as `"{package}/{module}#{name}"` strings. The
//! format performs no escaping, so names must not contain `#`. Scoped package
//! names (`@scope/name`) are written verbatim, embedded `/` included.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A pointer to a declaration, possibly in another module or package.
///
/// - `package`: `None` means the package the reference appears in.
/// - `module`: `None` means the module the reference appears in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    pub name: String,
}

impl Reference {
    /// A reference to `name` in the same module and package.
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            package: None,
            module: None,
            name: name.into(),
        }
    }

    /// A reference to `name` in another module of the same package.
    pub fn in_module(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: None,
            module: Some(module.into()),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("malformed reference string `{0}`: missing `#`")]
    Malformed(String),
}

/// Serializes a declaration pointer.
pub fn encode(package_name: &str, module_path: &str, declaration_name: &str) -> String {
    format!("{}/{}#{}", package_name, module_path, declaration_name)
}

/// Parses a string produced by [`encode`].
///
/// The package boundary is found lexically: a first segment starting with `@`
/// makes the package name two segments long, otherwise it is one. The `/`
/// separating package and module is consumed.
pub fn decode(s: &str) -> Result<Reference, ReferenceError> {
    let (path, name) = s
        .rsplit_once('#')
        .ok_or_else(|| ReferenceError::Malformed(s.to_string()))?;

    let mut segments = path.split('/');
    let first = segments.next().unwrap_or_default();
    let package_len = match segments.next() {
        Some(second) if first.starts_with('@') => first.len() + 1 + second.len(),
        _ => first.len(),
    };

    let (package, rest) = path.split_at(package_len);
    let module = rest.strip_prefix('/').unwrap_or(rest);

    Ok(Reference {
        package: Some(package.to_string()),
        module: Some(module.to_string()),
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(package: &str, module: &str, name: &str) -> Reference {
        Reference {
            package: Some(package.to_string()),
            module: Some(module.to_string()),
            name: name.to_string(),
        }
    }

    #[test]
    fn encodes_unscoped_package() {
        assert_eq!(encode("foo", "foo.js", "FooElement"), "foo/foo.js#FooElement");
    }

    #[test]
    fn encodes_scoped_package_verbatim() {
        assert_eq!(
            encode("@lit/reactive-element", "lib/css.js", "css"),
            "@lit/reactive-element/lib/css.js#css"
        );
    }

    #[test]
    fn round_trips_unscoped_names() {
        for (p, m, n) in [
            ("foo", "foo.js", "FooElement"),
            ("foo", "lib/deep/bar.js", "Bar"),
            ("foo", "", "Empty"),
            ("foo", "/rooted.js", "Rooted"),
            ("foo", "@weird/module.js", "W"),
        ] {
            assert_eq!(decode(&encode(p, m, n)).unwrap(), decoded(p, m, n));
        }
    }

    #[test]
    fn round_trips_scoped_names() {
        for (p, m, n) in [
            ("@scope/pkg", "index.js", "El"),
            ("@scope/pkg", "a/b/c.js", "El"),
            ("@scope/pkg", "", "El"),
        ] {
            assert_eq!(decode(&encode(p, m, n)).unwrap(), decoded(p, m, n));
        }
    }

    #[test]
    fn splits_on_last_hash() {
        let r = decode("foo/a#b.js#Name").unwrap();
        assert_eq!(r, decoded("foo", "a#b.js", "Name"));
    }

    #[test]
    fn package_only_path_has_empty_module() {
        assert_eq!(decode("foo#Name").unwrap(), decoded("foo", "", "Name"));
        assert_eq!(decode("@s#Name").unwrap(), decoded("@s", "", "Name"));
    }

    #[test]
    fn missing_hash_is_malformed() {
        assert_eq!(
            decode("foo/foo.js"),
            Err(ReferenceError::Malformed("foo/foo.js".to_string()))
        );
    }
}
