use crate::manifest::{ClassDeclaration, CustomElementExport, Export, Manifest, Module};
use crate::resolve::{resolve_with_module, ResolveContext};

/// A custom element discovered in a manifest.
///
/// `module` holds the defining export; `declaration_module` holds the class,
/// which may be a different module.
#[derive(Debug, Clone, Copy)]
pub struct CustomElementInfo<'m> {
    pub manifest: &'m Manifest,
    pub module: &'m Module,
    pub export: &'m CustomElementExport,
    pub declaration_module: &'m Module,
    pub declaration: &'m ClassDeclaration,
}

impl CustomElementInfo<'_> {
    pub fn tag_name(&self) -> &str {
        &self.export.name
    }

    pub fn class_name(&self) -> &str {
        &self.declaration.name
    }
}

/// Collects every `custom-element-definition` export whose declaration
/// resolves to a class, in module order then export order.
///
/// Unresolvable exports are logged and skipped.
pub fn custom_elements<'m>(
    manifest: &'m Manifest,
    ctx: &ResolveContext<'_>,
) -> Vec<CustomElementInfo<'m>> {
    let mut elements = Vec::new();

    for module in &manifest.modules {
        for export in &module.exports {
            let export = match export {
                Export::CustomElementDefinition(e) => e,
                Export::Js(_) => continue,
            };

            match resolve_with_module(manifest, module, &export.declaration, ctx) {
                Ok((declaration_module, declaration)) => match declaration.as_class() {
                    Some(class) => elements.push(CustomElementInfo {
                        manifest,
                        module,
                        export,
                        declaration_module,
                        declaration: class,
                    }),
                    None => tracing::debug!(
                        "Custom element `{}` in {} points at a {}, skipping",
                        export.name,
                        module.path,
                        declaration.kind()
                    ),
                },
                Err(e) => tracing::warn!("Skipping custom element `{}`: {}", export.name, e),
            }
        }
    }

    elements
}

#[cfg(test)]
mod tests {
    use super::*;

    const CTX: ResolveContext<'static> = ResolveContext {
        package_name: "foo",
        version: "1.0.0",
    };

    #[test]
    fn resolves_definitions_across_modules() {
        let manifest = Manifest::from_json(
            r#"{"modules":[
                {"path":"define.js","exports":[
                    {"kind":"custom-element-definition","name":"x-foo",
                     "declaration":{"name":"XFoo","module":"x-foo.js"}}
                ]},
                {"path":"x-foo.js","declarations":[{"kind":"class","name":"XFoo"}]}
            ]}"#,
        )
        .unwrap();

        let elements = custom_elements(&manifest, &CTX);
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].module.path, "define.js");
        assert_eq!(elements[0].declaration_module.path, "x-foo.js");
        assert_eq!(elements[0].tag_name(), "x-foo");
        assert_eq!(elements[0].class_name(), "XFoo");
        assert!(std::ptr::eq(
            elements[0].declaration,
            manifest.modules[1].declarations[0].as_class().unwrap()
        ));
    }

    #[test]
    fn skips_non_class_declarations() {
        let manifest = Manifest::from_json(
            r#"{"modules":[{"path":"a.js",
                "declarations":[{"kind":"function","name":"make"}],
                "exports":[{"kind":"custom-element-definition","name":"x-a",
                            "declaration":{"name":"make"}}]}]}"#,
        )
        .unwrap();
        assert!(custom_elements(&manifest, &CTX).is_empty());
    }

    #[test]
    fn skips_unresolvable_and_plain_exports() {
        let manifest = Manifest::from_json(
            r#"{"modules":[{"path":"a.js",
                "declarations":[{"kind":"class","name":"A"}],
                "exports":[
                    {"kind":"js","name":"A","declaration":{"name":"A"}},
                    {"kind":"custom-element-definition","name":"x-missing",
                     "declaration":{"name":"Missing"}},
                    {"kind":"custom-element-definition","name":"x-lit",
                     "declaration":{"name":"A","package":"lit"}},
                    {"kind":"custom-element-definition","name":"x-gone",
                     "declaration":{"name":"A","module":"gone.js"}},
                    {"kind":"custom-element-definition","name":"x-a",
                     "declaration":{"name":"A"}}
                ]}]}"#,
        )
        .unwrap();

        let tags: Vec<_> = custom_elements(&manifest, &CTX)
            .iter()
            .map(|e| e.tag_name().to_string())
            .collect();
        assert_eq!(tags, vec!["x-a"]);
    }

    #[test]
    fn preserves_module_then_export_order() {
        let manifest = Manifest::from_json(
            r#"{"modules":[
                {"path":"one.js","declarations":[{"kind":"class","name":"C"}],
                 "exports":[
                    {"kind":"custom-element-definition","name":"x-2","declaration":{"name":"C"}},
                    {"kind":"custom-element-definition","name":"x-1","declaration":{"name":"C"}}
                 ]},
                {"path":"two.js","declarations":[{"kind":"class","name":"C"}],
                 "exports":[
                    {"kind":"custom-element-definition","name":"x-0","declaration":{"name":"C"}}
                 ]}
            ]}"#,
        )
        .unwrap();

        let tags: Vec<_> = custom_elements(&manifest, &CTX)
            .iter()
            .map(|e| e.tag_name().to_string())
            .collect();
        assert_eq!(tags, vec!["x-2", "x-1", "x-0"]);
    }
}
