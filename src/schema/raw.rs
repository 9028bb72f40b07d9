//! Raw schema definitions as deserialized from the schema file.
//!
//! Cross-references (`extends`, entry types, picklist bindings) are still
//! plain strings here; the resolver turns this graph into the immutable
//! [`LoreSchema`](super::LoreSchema) or rejects it with a typed error.

use serde::{Deserialize, Serialize};

/// The whole schema file: named types, standalone collections, picklists,
/// and app-level settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSchema {
    #[serde(default)]
    pub types: Vec<RawType>,
    #[serde(default)]
    pub collections: Vec<RawCollection>,
    #[serde(default)]
    pub picklists: Vec<RawPicklist>,
    #[serde(default)]
    pub settings: RawSettings,
}

/// A node type, possibly extending a base type by name.
#[derive(Debug, Clone, Deserialize)]
pub struct RawType {
    pub name: String,
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub fields: Vec<RawField>,
    #[serde(default)]
    pub sections: Vec<RawSection>,
    #[serde(default)]
    pub collections: Vec<RawCollection>,
    #[serde(default)]
    pub embedded: Vec<RawEmbedded>,
}

/// Structural shape of a field's value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawFieldShape {
    /// One scalar value
    #[default]
    Single,
    /// Ordered list of values
    Multi,
    /// Nested sub-fields
    Nested,
    /// Pure text, nested bullets flattened
    Text,
    /// Value constrained to a picklist
    Picklist,
    /// List of references to other nodes
    References,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawField {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub shape: RawFieldShape,
    /// Sub-fields, only meaningful for [`RawFieldShape::Nested`]
    #[serde(default)]
    pub fields: Vec<RawField>,
    /// Picklist binding, possibly a branch path like `Colors/Warm`
    #[serde(default)]
    pub picklist: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSection {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub freeform: bool,
    #[serde(default)]
    pub fields: Vec<RawField>,
    #[serde(default)]
    pub sections: Vec<RawSection>,
}

/// A collection declares exactly one entry kind: a node type name, the
/// name of another standalone collection, or an inline anonymous
/// collection (for `collection:collection:...` nesting).
#[derive(Debug, Clone, Deserialize)]
pub struct RawCollection {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub entry_type: Option<String>,
    #[serde(default)]
    pub entry_collection_name: Option<String>,
    #[serde(default)]
    pub entry_collection: Option<Box<RawCollection>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEmbedded {
    /// Slot title; absence means the embedded heading needs no fixed title
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPicklist {
    pub name: String,
    #[serde(default)]
    pub entries: Vec<RawPicklistEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPicklistEntry {
    pub name: String,
    #[serde(default)]
    pub entries: Vec<RawPicklistEntry>,
}

/// App-level settings carried by the schema file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSettings {
    /// Gitignore-style patterns for paths the loader must skip
    #[serde(default)]
    pub blocked_paths: Vec<String>,
}
