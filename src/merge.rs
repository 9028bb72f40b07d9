//! Cross-file node merging.
//!
//! A single-threaded reducer that runs after every parse worker has
//! finished. Two nodes merge only when both carry an explicit id, the ids
//! match, and the declared types match; everything else inserts as an
//! independent node. A composite is a concatenation, not a union: child
//! lists and provenance append in parse order, summaries join with
//! newlines.

use std::collections::HashMap;

use tracing::debug;

use crate::model::{Node, NodeIdentity};

/// Merge newly parsed nodes into the accumulated set, in order.
pub fn merge_nodes(parsed: Vec<Node>) -> Vec<Node> {
    let mut merged: Vec<Node> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for node in parsed {
        if let NodeIdentity::Explicit(id) = &node.identity {
            let key = (id.clone(), node.type_name.clone());
            if let Some(&at) = index.get(&key) {
                debug!(id = %id, type_name = %node.type_name, "merging fragment into composite");
                absorb(&mut merged[at], node);
                continue;
            }
            index.insert(key, merged.len());
        }
        merged.push(node);
    }
    merged
}

/// Append one fragment onto an existing node, turning it into (or
/// extending) a composite.
fn absorb(target: &mut Node, other: Node) {
    if !other.summary.is_empty() {
        if !target.summary.is_empty() {
            target.summary.push('\n');
        }
        target.summary.push_str(&other.summary);
    }
    target.attributes.extend(other.attributes);
    target.sections.extend(other.sections);
    target.collections.extend(other.collections);
    target.embedded.extend(other.embedded);
    target.provenance.extend(other.provenance);
    target.fragments += other.fragments;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attribute, Provenance, Value};
    use std::path::PathBuf;

    fn node(name: &str, type_name: &str, id: Option<&str>, path: &str) -> Node {
        Node::new(
            name,
            type_name,
            NodeIdentity::from_tag(id, name),
            Provenance {
                path: PathBuf::from(path),
                block: 0,
                line: 1,
            },
        )
    }

    #[test]
    fn test_same_id_and_type_merge_into_composite() {
        let mut a = node("Alice", "Character", Some("alice"), "a.md");
        a.push_summary("From the first file.");
        a.attributes.push(Attribute::single(
            "Name",
            Value::Text {
                text: "Alice".to_string(),
            },
        ));
        let mut b = node("Alice", "Character", Some("alice"), "b.md");
        b.push_summary("From the second file.");
        b.attributes.push(Attribute::single(
            "Role",
            Value::Text {
                text: "Captain".to_string(),
            },
        ));

        let merged = merge_nodes(vec![a, b]);
        assert_eq!(merged.len(), 1);
        let composite = &merged[0];
        assert!(composite.is_composite());
        assert_eq!(composite.fragments, 2);
        // Concatenation, not union
        assert_eq!(composite.attributes.len(), 2);
        assert_eq!(composite.provenance.len(), 2);
        assert_eq!(
            composite.summary,
            "From the first file.\nFrom the second file."
        );
    }

    #[test]
    fn test_placeholder_identities_never_merge() {
        let a = node("Alice", "Character", None, "a.md");
        let b = node("Alice", "Character", None, "b.md");
        let merged = merge_nodes(vec![a, b]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_same_id_different_type_stays_separate() {
        let a = node("Alice", "Character", Some("alice"), "a.md");
        let b = node("Alice's Home", "Location", Some("alice"), "b.md");
        let merged = merge_nodes(vec![a, b]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_three_fragments_follow_parse_order() {
        let mut a = node("Alice", "Character", Some("alice"), "a.md");
        a.push_summary("one");
        let mut b = node("Alice", "Character", Some("alice"), "b.md");
        b.push_summary("two");
        let mut c = node("Alice", "Character", Some("alice"), "c.md");
        c.push_summary("three");

        let merged = merge_nodes(vec![a, b, c]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].fragments, 3);
        assert_eq!(merged[0].summary, "one\ntwo\nthree");
    }
}
