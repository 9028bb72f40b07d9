//! Reference resolution.
//!
//! Runs once after merge, before validation. Every reference-valued
//! attribute resolves its token against the closed node set: exact id
//! match first, then exact name match (remembered as a fallback so
//! validation can warn), else left unresolved. Idempotent: already
//! resolved values are skipped.

use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use crate::model::value::{ResolvedTarget, Value};
use crate::model::{Attribute, AttributeContent, Collection, CollectionEntries, Node, Section};

/// Resolve all reference tokens across top-level nodes and collections.
pub fn resolve_references(nodes: &mut [Node], collections: &mut [Collection]) {
    let mut by_id: HashMap<String, Uuid> = HashMap::new();
    let mut by_name: HashMap<String, Uuid> = HashMap::new();

    for node in nodes.iter() {
        index_node(node, &mut by_id, &mut by_name);
    }
    for collection in collections.iter() {
        index_collection(collection, &mut by_id, &mut by_name);
    }
    debug!(ids = by_id.len(), names = by_name.len(), "reference index built");

    let resolve = |attr: &mut Attribute| resolve_attribute(attr, &by_id, &by_name);
    for node in nodes.iter_mut() {
        walk_node(node, &resolve);
    }
    for collection in collections.iter_mut() {
        walk_collection(collection, &resolve);
    }
}

fn index_node(node: &Node, by_id: &mut HashMap<String, Uuid>, by_name: &mut HashMap<String, Uuid>) {
    if let Some(id) = node.identity.explicit() {
        by_id.entry(id.to_string()).or_insert(node.uuid);
    }
    by_name.entry(node.name.clone()).or_insert(node.uuid);
    for child in &node.embedded {
        index_node(child, by_id, by_name);
    }
    for collection in &node.collections {
        index_collection(collection, by_id, by_name);
    }
}

fn index_collection(
    collection: &Collection,
    by_id: &mut HashMap<String, Uuid>,
    by_name: &mut HashMap<String, Uuid>,
) {
    match &collection.entries {
        CollectionEntries::Nodes(nodes) => {
            for node in nodes {
                index_node(node, by_id, by_name);
            }
        }
        CollectionEntries::Collections(subs) => {
            for sub in subs {
                index_collection(sub, by_id, by_name);
            }
        }
    }
}

fn walk_node(node: &mut Node, resolve: &impl Fn(&mut Attribute)) {
    for attr in &mut node.attributes {
        resolve(attr);
    }
    for section in &mut node.sections {
        walk_section(section, resolve);
    }
    for collection in &mut node.collections {
        walk_collection(collection, resolve);
    }
    for child in &mut node.embedded {
        walk_node(child, resolve);
    }
}

fn walk_section(section: &mut Section, resolve: &impl Fn(&mut Attribute)) {
    for attr in &mut section.attributes {
        resolve(attr);
    }
    for sub in &mut section.sections {
        walk_section(sub, resolve);
    }
}

fn walk_collection(collection: &mut Collection, resolve: &impl Fn(&mut Attribute)) {
    match &mut collection.entries {
        CollectionEntries::Nodes(nodes) => {
            for node in nodes {
                walk_node(node, resolve);
            }
        }
        CollectionEntries::Collections(subs) => {
            for sub in subs {
                walk_collection(sub, resolve);
            }
        }
    }
}

fn resolve_attribute(
    attr: &mut Attribute,
    by_id: &HashMap<String, Uuid>,
    by_name: &HashMap<String, Uuid>,
) {
    match &mut attr.content {
        AttributeContent::Single(value) => resolve_value(value, by_id, by_name),
        AttributeContent::Many(values) => {
            for value in values {
                resolve_value(value, by_id, by_name);
            }
        }
        AttributeContent::Nested(children) => {
            for child in children {
                resolve_attribute(child, by_id, by_name);
            }
        }
    }
}

fn resolve_value(value: &mut Value, by_id: &HashMap<String, Uuid>, by_name: &HashMap<String, Uuid>) {
    let Value::Reference(reference) = value else {
        return;
    };
    if reference.target.is_some() {
        return;
    }
    if let Some(&node) = by_id.get(&reference.raw) {
        reference.target = Some(ResolvedTarget {
            node,
            by_name: false,
        });
    } else if let Some(&node) = by_name.get(&reference.raw) {
        reference.target = Some(ResolvedTarget {
            node,
            by_name: true,
        });
    }
}
