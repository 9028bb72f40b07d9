//! Parsed lore entities.
//!
//! Entities form an owned tree: each container exclusively owns its direct
//! structural children. Cross-cutting links (merge lookup, resolved
//! references) are id lookups, never shared ownership. Every entity gets
//! a runtime [`Uuid`] so validation output can key on it without holding
//! pointers into the tree.

pub mod value;

use std::path::PathBuf;

use serde::Serialize;
use uuid::Uuid;

use crate::schema::CollectionDefinition;
pub use value::{DateValue, LiteralParser, Reference, ResolvedTarget, Value};

/// Where a parsed fragment came from. Composite nodes carry one entry per
/// contributing fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provenance {
    /// Document path, relative to the vault root
    pub path: PathBuf,
    /// Block index of the opening heading
    pub block: usize,
    /// 1-based source line of the opening heading
    pub line: usize,
}

/// Merge identity of a node. Only explicit ids ever merge; placeholders
/// are derived from the name so two distinct names can never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum NodeIdentity {
    Explicit(String),
    Placeholder(String),
}

impl NodeIdentity {
    pub fn from_tag(id: Option<&str>, name: &str) -> Self {
        match id {
            Some(id) => NodeIdentity::Explicit(id.to_string()),
            None => NodeIdentity::Placeholder(name.to_string()),
        }
    }

    pub fn explicit(&self) -> Option<&str> {
        match self {
            NodeIdentity::Explicit(id) => Some(id),
            NodeIdentity::Placeholder(_) => None,
        }
    }
}

/// A typed instance of lore content.
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub uuid: Uuid,
    pub name: String,
    pub type_name: String,
    pub identity: NodeIdentity,
    /// Freeform narrative text accumulated from body blocks
    pub summary: String,
    pub attributes: Vec<Attribute>,
    pub sections: Vec<Section>,
    pub collections: Vec<Collection>,
    pub embedded: Vec<Node>,
    pub provenance: Vec<Provenance>,
    /// Number of source fragments; 2 or more marks a composite
    pub fragments: usize,
}

impl Node {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        identity: NodeIdentity,
        provenance: Provenance,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            type_name: type_name.into(),
            identity,
            summary: String::new(),
            attributes: Vec::new(),
            sections: Vec::new(),
            collections: Vec::new(),
            embedded: Vec::new(),
            provenance: vec![provenance],
            fragments: 1,
        }
    }

    pub fn is_composite(&self) -> bool {
        self.fragments > 1
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// Append narrative text, newline-separated.
    pub fn push_summary(&mut self, text: &str) {
        push_line(&mut self.summary, text);
    }
}

/// A narrative subunit of a node; may carry attributes and nest.
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub uuid: Uuid,
    pub name: String,
    /// False for ad hoc sections introduced with an explicit tag
    pub declared: bool,
    pub summary: String,
    pub attributes: Vec<Attribute>,
    pub sections: Vec<Section>,
    pub provenance: Vec<Provenance>,
}

impl Section {
    pub fn new(name: impl Into<String>, declared: bool, provenance: Provenance) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            declared,
            summary: String::new(),
            attributes: Vec::new(),
            sections: Vec::new(),
            provenance: vec![provenance],
        }
    }

    pub fn push_summary(&mut self, text: &str) {
        push_line(&mut self.summary, text);
    }
}

/// An ordered group of entries, homogeneously nodes or nested collections.
#[derive(Debug, Clone, Serialize)]
pub struct Collection {
    pub uuid: Uuid,
    pub name: String,
    pub definition: CollectionDefinition,
    pub summary: String,
    pub entries: CollectionEntries,
    pub provenance: Vec<Provenance>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum CollectionEntries {
    Nodes(Vec<Node>),
    Collections(Vec<Collection>),
}

impl Collection {
    pub fn new(
        name: impl Into<String>,
        definition: CollectionDefinition,
        entries: CollectionEntries,
        provenance: Provenance,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            definition,
            summary: String::new(),
            entries,
            provenance: vec![provenance],
        }
    }

    pub fn len(&self) -> usize {
        match &self.entries {
            CollectionEntries::Nodes(nodes) => nodes.len(),
            CollectionEntries::Collections(collections) => collections.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push_summary(&mut self, text: &str) {
        push_line(&mut self.summary, text);
    }
}

/// A named field instance.
#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    pub uuid: Uuid,
    pub name: String,
    pub content: AttributeContent,
}

/// Exactly one of: a single value, an ordered value list, or nested
/// attributes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttributeContent {
    Single(Value),
    Many(Vec<Value>),
    Nested(Vec<Attribute>),
}

impl Attribute {
    pub fn single(name: impl Into<String>, value: Value) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            content: AttributeContent::Single(value),
        }
    }

    pub fn many(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            content: AttributeContent::Many(values),
        }
    }

    pub fn nested(name: impl Into<String>, children: Vec<Attribute>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            content: AttributeContent::Nested(children),
        }
    }

    pub fn has_values(&self) -> bool {
        match &self.content {
            AttributeContent::Single(_) => false,
            AttributeContent::Many(values) => !values.is_empty(),
            AttributeContent::Nested(_) => false,
        }
    }

    /// The ordered value list for multi-value attributes.
    pub fn values(&self) -> &[Value] {
        match &self.content {
            AttributeContent::Many(values) => values,
            _ => &[],
        }
    }

    /// The single value, when there is exactly one.
    pub fn value(&self) -> Option<&Value> {
        match &self.content {
            AttributeContent::Single(value) => Some(value),
            _ => None,
        }
    }
}

fn push_line(summary: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    if !summary.is_empty() {
        summary.push('\n');
    }
    summary.push_str(text);
}
