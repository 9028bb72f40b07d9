//! Schema model and inheritance resolver.
//!
//! The raw, string-referenced definition graph ([`raw`]) is resolved once
//! into an immutable [`LoreSchema`] ([`resolver`]); parser workers share it
//! read-only for the rest of the load.

pub mod def;
pub mod raw;
pub mod resolver;

use std::collections::HashMap;
use std::sync::Arc;

pub use def::{
    CollectionDefinition, ContainedType, EmbeddedDefinition, FieldDefinition, FieldShape,
    PicklistDefinition, PicklistEntry, SectionDefinition, Settings, TypeDefinition,
};
pub use raw::RawSchema;
pub use resolver::resolve;

/// The fully resolved schema: every cross-reference checked, inheritance
/// flattened, contained types materialized. Immutable after construction.
#[derive(Debug, Clone)]
pub struct LoreSchema {
    types: HashMap<String, Arc<TypeDefinition>>,
    collections: HashMap<String, Arc<CollectionDefinition>>,
    picklists: HashMap<String, Arc<PicklistDefinition>>,
    pub settings: Settings,
}

impl LoreSchema {
    pub(crate) fn new(
        types: HashMap<String, Arc<TypeDefinition>>,
        collections: HashMap<String, Arc<CollectionDefinition>>,
        picklists: HashMap<String, Arc<PicklistDefinition>>,
        settings: Settings,
    ) -> Self {
        Self {
            types,
            collections,
            picklists,
            settings,
        }
    }

    pub fn type_def(&self, name: &str) -> Option<&Arc<TypeDefinition>> {
        self.types.get(name)
    }

    pub fn collection_def(&self, name: &str) -> Option<&Arc<CollectionDefinition>> {
        self.collections.get(name)
    }

    pub fn picklist(&self, name: &str) -> Option<&Arc<PicklistDefinition>> {
        self.picklists.get(name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    /// True when `name` is `ancestor` itself or a descendant of it.
    pub fn is_same_or_subtype(&self, name: &str, ancestor: &str) -> bool {
        if name == ancestor {
            return true;
        }
        self.types
            .get(name)
            .map(|t| t.ancestors.iter().any(|a| a == ancestor))
            .unwrap_or(false)
    }

    /// Resolve a picklist binding (possibly a branch path like
    /// `Colors/Warm`) to the leaf option names it permits.
    pub fn leaf_options(&self, binding: &str) -> Option<Vec<&str>> {
        let mut segments = binding.split('/');
        let picklist = self.picklists.get(segments.next()?)?;
        let branch: Vec<&str> = segments.collect();
        if branch.is_empty() {
            return Some(picklist.leaf_options());
        }
        let entry = picklist.find_entry(&branch)?;
        let mut out = Vec::new();
        if entry.entries.is_empty() {
            out.push(entry.name.as_str());
        } else {
            for e in &entry.entries {
                collect_entry_leaves(e, &mut out);
            }
        }
        Some(out)
    }
}

fn collect_entry_leaves<'a>(entry: &'a PicklistEntry, out: &mut Vec<&'a str>) {
    if entry.entries.is_empty() {
        out.push(&entry.name);
    } else {
        for e in &entry.entries {
            collect_entry_leaves(e, out);
        }
    }
}
