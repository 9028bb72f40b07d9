//! Resolved, immutable schema definitions.
//!
//! Everything in this module is produced once by the resolver and read-only
//! afterwards. Inherited children are materialized into the derived
//! definition, so no live base pointer is ever walked at runtime.

use serde::Serialize;

pub use super::raw::RawFieldShape as FieldShape;

/// A fully resolved node type. Fields, sections, collections and embedded
/// slots include everything inherited from the base chain.
#[derive(Debug, Clone, Serialize)]
pub struct TypeDefinition {
    pub name: String,
    /// Direct base type name, if any
    pub base: Option<String>,
    /// Full ancestor chain, nearest first
    pub ancestors: Vec<String>,
    pub fields: Vec<FieldDefinition>,
    pub sections: Vec<SectionDefinition>,
    pub collections: Vec<CollectionDefinition>,
    pub embedded: Vec<EmbeddedDefinition>,
}

impl TypeDefinition {
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn section(&self, name: &str) -> Option<&SectionDefinition> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionDefinition> {
        self.collections.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldDefinition {
    pub name: String,
    pub required: bool,
    pub shape: FieldShape,
    /// Sub-fields for [`FieldShape::Nested`]
    pub fields: Vec<FieldDefinition>,
    /// Picklist binding, possibly a branch path like `Colors/Warm`
    pub picklist: Option<String>,
    /// True when this definition was cloned in from a base type
    pub inherited: bool,
}

impl FieldDefinition {
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionDefinition {
    pub name: String,
    pub required: bool,
    pub freeform: bool,
    pub fields: Vec<FieldDefinition>,
    pub sections: Vec<SectionDefinition>,
    pub inherited: bool,
}

impl SectionDefinition {
    pub fn section(&self, name: &str) -> Option<&SectionDefinition> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// What a collection contains: nodes of one type, or nested collections.
#[derive(Debug, Clone, Serialize)]
pub enum ContainedType {
    Nodes { type_name: String },
    Collections(Box<CollectionDefinition>),
}

impl ContainedType {
    /// The node type at the bottom of the nesting, however deep.
    pub fn leaf_type_name(&self) -> &str {
        match self {
            ContainedType::Nodes { type_name } => type_name,
            ContainedType::Collections(inner) => inner.contained.leaf_type_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionDefinition {
    pub name: String,
    pub required: bool,
    pub contained: ContainedType,
    /// True for inline anonymous definitions owned by their declaring
    /// definition; nested lookups must not search the global namespace
    pub local: bool,
    pub inherited: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbeddedDefinition {
    /// Expected heading title; `None` means any title is accepted
    pub title: Option<String>,
    pub required: bool,
    pub type_name: String,
    pub inherited: bool,
}

impl EmbeddedDefinition {
    /// Display label for error messages.
    pub fn label(&self) -> String {
        match &self.title {
            Some(t) => format!("'{}'", t),
            None => format!("<untitled {}>", self.type_name),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PicklistDefinition {
    pub name: String,
    pub entries: Vec<PicklistEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PicklistEntry {
    pub name: String,
    pub entries: Vec<PicklistEntry>,
}

impl PicklistEntry {
    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a str>) {
        if self.entries.is_empty() {
            out.push(&self.name);
        } else {
            for e in &self.entries {
                e.collect_leaves(out);
            }
        }
    }
}

impl PicklistDefinition {
    /// Leaf option names of the whole tree.
    pub fn leaf_options(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for e in &self.entries {
            e.collect_leaves(&mut out);
        }
        out
    }

    /// Walk a branch path (`["Warm", "Reds"]`) down the entry tree.
    pub fn find_entry(&self, path: &[&str]) -> Option<&PicklistEntry> {
        let (first, rest) = path.split_first()?;
        let mut entry = self.entries.iter().find(|e| &e.name == first)?;
        for seg in rest {
            entry = entry.entries.iter().find(|e| &e.name == seg)?;
        }
        Some(entry)
    }
}

/// App-level settings carried over from the schema file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Settings {
    pub blocked_paths: Vec<String>,
}
