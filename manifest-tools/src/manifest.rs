use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reference::Reference;

/// Errors produced while reading a manifest document.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("invalid manifest JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed manifest at {location}: {message}")]
    Malformed { location: String, message: String },
}

/// A custom elements manifest.
///
/// Manifests are external input. Use [`Manifest::from_json`] to obtain one;
/// it checks the shape beyond what deserialization enforces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    pub modules: Vec<Module>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleKind {
    #[default]
    JavascriptModule,
}

/// A module within a package, identified by its package-relative path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    #[serde(default)]
    pub kind: ModuleKind,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub declarations: Vec<Declaration>,
    #[serde(default)]
    pub exports: Vec<Export>,
}

/// A named entity declared in a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Declaration {
    Class(ClassDeclaration),
    Function(FunctionDeclaration),
    Variable(VariableDeclaration),
    Mixin(MixinDeclaration),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Self::Class(d) => &d.name,
            Self::Function(d) => &d.name,
            Self::Variable(d) => &d.name,
            Self::Mixin(d) => &d.name,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Class(d) => d.description.as_deref(),
            Self::Function(d) => d.description.as_deref(),
            Self::Variable(d) => d.description.as_deref(),
            Self::Mixin(d) => d.description.as_deref(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Class(_) => "class",
            Self::Function(_) => "function",
            Self::Variable(_) => "variable",
            Self::Mixin(_) => "mixin",
        }
    }

    /// Only class declarations can back a custom element.
    pub fn as_class(&self) -> Option<&ClassDeclaration> {
        match self {
            Self::Class(d) => Some(d),
            Self::Function(_) | Self::Variable(_) | Self::Mixin(_) => None,
        }
    }

    fn members(&self) -> &[ClassMember] {
        match self {
            Self::Class(d) => &d.members,
            Self::Mixin(d) => &d.members,
            Self::Function(_) | Self::Variable(_) => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDeclaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub members: Vec<ClassMember>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<Reference>,
    /// Tag name the class registers itself under, when the manifest records it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    #[serde(default)]
    pub custom_element: bool,
}

impl ClassDeclaration {
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.members.iter().filter_map(|m| match m {
            ClassMember::Field(f) => Some(f),
            ClassMember::Method(_) => None,
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.members.iter().filter_map(|m| match m {
            ClassMember::Method(method) => Some(method),
            ClassMember::Field(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixinDeclaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub members: Vec<ClassMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ClassMember {
    Field(Field),
    Method(Method),
}

impl ClassMember {
    pub fn name(&self) -> &str {
        match self {
            Self::Field(f) => &f.name,
            Self::Method(m) => &m.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A symbol a module makes available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Export {
    Js(JsExport),
    CustomElementDefinition(CustomElementExport),
}

impl Export {
    pub fn name(&self) -> &str {
        match self {
            Self::Js(e) => &e.name,
            Self::CustomElementDefinition(e) => &e.name,
        }
    }

    pub fn declaration(&self) -> &Reference {
        match self {
            Self::Js(e) => &e.declaration,
            Self::CustomElementDefinition(e) => &e.declaration,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsExport {
    pub name: String,
    pub declaration: Reference,
}

/// Registers a class as a custom element. `name` is the tag name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomElementExport {
    pub name: String,
    pub declaration: Reference,
}

impl Manifest {
    /// Parses and validates a manifest.
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        let manifest: Manifest = serde_json::from_str(json)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Checks invariants deserialization does not: required names and paths
    /// are non-empty.
    pub fn validate(&self) -> Result<(), ManifestError> {
        for (i, module) in self.modules.iter().enumerate() {
            let at = |rest: String| format!("modules[{}]{}", i, rest);

            if module.path.is_empty() {
                return Err(malformed(at(".path".into()), "module path is empty"));
            }

            for (j, decl) in module.declarations.iter().enumerate() {
                if decl.name().is_empty() {
                    return Err(malformed(
                        at(format!(".declarations[{}].name", j)),
                        "declaration name is empty",
                    ));
                }
                for (k, member) in decl.members().iter().enumerate() {
                    if member.name().is_empty() {
                        return Err(malformed(
                            at(format!(".declarations[{}].members[{}].name", j, k)),
                            "member name is empty",
                        ));
                    }
                }
            }

            for (j, export) in module.exports.iter().enumerate() {
                if export.name().is_empty() {
                    return Err(malformed(
                        at(format!(".exports[{}].name", j)),
                        "export name is empty",
                    ));
                }
                if export.declaration().name.is_empty() {
                    return Err(malformed(
                        at(format!(".exports[{}].declaration.name", j)),
                        "reference name is empty",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Module paths, in manifest order.
    pub fn module_paths(&self) -> Vec<String> {
        self.modules.iter().map(|m| m.path.clone()).collect()
    }
}

fn malformed(location: String, message: &str) -> ManifestError {
    ManifestError::Malformed {
        location,
        message: message.to_string(),
    }
}
