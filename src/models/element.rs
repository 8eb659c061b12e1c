use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A custom element exported by a package version.
///
/// `custom_element_export` and `declaration` are reference strings of the
/// form `package/module#name`. Package, version, author and dist tags are
/// copied from the owning version so elements can be queried across packages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomElementRecord {
    pub id: Uuid,
    pub package: String,
    pub version: String,
    pub author: String,
    pub dist_tags: Vec<String>,
    pub tag_name: String,
    pub class_name: String,
    pub custom_element_export: String,
    pub declaration: String,
}

/// Input for adding a custom element to a version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomElement {
    pub tag_name: String,
    pub class_name: String,
    pub custom_element_export: String,
    pub declaration: String,
}

/// Filters for querying custom elements across all packages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementQuery {
    pub package: Option<String>,
    pub version: Option<String>,
    pub tag_name: Option<String>,
    /// Only elements whose version carries this distribution tag.
    pub dist_tag: Option<String>,
    pub limit: Option<u32>,
}

/// A custom element with the documentation of its backing class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDetail {
    #[serde(flatten)]
    pub element: CustomElementRecord,
    pub description: Option<String>,
    pub fields: Vec<MemberSummary>,
    pub methods: Vec<MemberSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberSummary {
    pub name: String,
    pub description: Option<String>,
}
