//! Document parser integration tests.

mod common;

use common::{fixture_schema, parse_doc};
use loreweave::doc::parser::FileOutcome;
use loreweave::error::IssueKind;
use loreweave::model::{AttributeContent, CollectionEntries, Value};

fn single_node(outcome: &FileOutcome) -> &loreweave::Node {
    assert_eq!(
        outcome.nodes.len(),
        1,
        "expected exactly one node, issues: {:?}",
        outcome.issues
    );
    &outcome.nodes[0]
}

#[test]
fn test_node_with_single_attribute() {
    let schema = fixture_schema();
    let outcome = parse_doc(&schema, "# Alice {node type=\"Character\"}\n\n- Name: Alice\n");

    assert!(outcome.issues.is_empty(), "issues: {:?}", outcome.issues);
    let node = single_node(&outcome);
    assert_eq!(node.name, "Alice");
    assert_eq!(node.type_name, "Character");
    assert_eq!(node.attributes.len(), 1);
    let attr = node.attribute("Name").unwrap();
    assert_eq!(
        attr.value(),
        Some(&Value::Text {
            text: "Alice".to_string()
        })
    );
}

#[test]
fn test_multi_value_field_preserves_order() {
    let schema = fixture_schema();
    let outcome = parse_doc(
        &schema,
        "# Alice {node type=\"Character\"}\n\n\
         - Name: Alice\n\
         - Aliases:\n\
         \x20 - V\n\
         \x20 - Orion Ghost\n\
         \x20 - Silent Flame\n",
    );

    assert!(outcome.issues.is_empty(), "issues: {:?}", outcome.issues);
    let node = single_node(&outcome);
    let aliases = node.attribute("Aliases").unwrap();
    assert!(aliases.has_values());
    let values: Vec<String> = aliases.values().iter().map(|v| v.display()).collect();
    assert_eq!(values, vec!["V", "Orion Ghost", "Silent Flame"]);
}

#[test]
fn test_untagged_collection_entries_take_declared_type() {
    let schema = fixture_schema();
    let outcome = parse_doc(
        &schema,
        "# The Cast {collection type=\"Character\"}\n\n## Alice\n\n## Bob\n",
    );

    assert!(outcome.issues.is_empty(), "issues: {:?}", outcome.issues);
    assert_eq!(outcome.collections.len(), 1);
    let collection = &outcome.collections[0];
    assert_eq!(collection.len(), 2);
    match &collection.entries {
        CollectionEntries::Nodes(nodes) => {
            assert!(nodes.iter().all(|n| n.type_name == "Character"));
            assert_eq!(nodes[0].name, "Alice");
            assert_eq!(nodes[1].name, "Bob");
        }
        other => panic!("expected node entries, got {:?}", other),
    }
}

#[test]
fn test_collection_chain_builds_nested_collections() {
    let schema = fixture_schema();
    let outcome = parse_doc(
        &schema,
        "# War Bands {collection type=\"collection:Character\"}\n\n\
         ## Northern Band\n\n### Ulf\n\n### Erik\n\n\
         ## Southern Band\n\n### Mara\n",
    );

    assert!(outcome.issues.is_empty(), "issues: {:?}", outcome.issues);
    let bands = &outcome.collections[0];
    assert_eq!(bands.len(), 2);
    match &bands.entries {
        CollectionEntries::Collections(subs) => {
            assert_eq!(subs[0].name, "Northern Band");
            assert_eq!(subs[0].len(), 2);
            assert_eq!(subs[1].len(), 1);
        }
        other => panic!("expected nested collections, got {:?}", other),
    }
}

#[test]
fn test_standalone_collection_by_title() {
    let schema = fixture_schema();
    let outcome = parse_doc(&schema, "# Cast {collection}\n\n## Alice\n");

    assert!(outcome.issues.is_empty(), "issues: {:?}", outcome.issues);
    assert_eq!(outcome.collections[0].definition.name, "Cast");
    assert_eq!(outcome.collections[0].len(), 1);
}

#[test]
fn test_subtype_entry_is_accepted_in_collection() {
    let schema = fixture_schema();
    let outcome = parse_doc(
        &schema,
        "# Cast {collection}\n\n## Mara {node type=\"Hero\"}\n",
    );

    assert!(outcome.issues.is_empty(), "issues: {:?}", outcome.issues);
    match &outcome.collections[0].entries {
        CollectionEntries::Nodes(nodes) => assert_eq!(nodes[0].type_name, "Hero"),
        other => panic!("expected node entries, got {:?}", other),
    }
}

#[test]
fn test_unrelated_entry_type_is_rejected() {
    let schema = fixture_schema();
    let outcome = parse_doc(
        &schema,
        "# Cast {collection}\n\n## Shadowmane {node type=\"Creature\"}\n",
    );

    assert_eq!(outcome.collections[0].len(), 0);
    assert!(matches!(
        outcome.issues[0].kind,
        IssueKind::EntryTypeMismatch { .. }
    ));
}

#[test]
fn test_fields_mode_ends_at_first_non_list_block() {
    let schema = fixture_schema();
    let outcome = parse_doc(
        &schema,
        "# Alice {node type=\"Character\"}\n\n\
         - Name: Alice\n\n\
         She walks in silence.\n\n\
         - Banner: crimson\n",
    );

    let node = single_node(&outcome);
    // The late list is narrative, not attributes
    assert_eq!(node.attributes.len(), 1);
    assert!(node.summary.contains("She walks in silence."));
    assert!(node.summary.contains("Banner: crimson"));
}

#[test]
fn test_unknown_field_is_reported_with_location() {
    let schema = fixture_schema();
    let outcome = parse_doc(
        &schema,
        "# Alice {node type=\"Character\"}\n\n- Name: Alice\n- Nam: Alice\n",
    );

    assert_eq!(outcome.issues.len(), 1);
    let issue = &outcome.issues[0];
    assert_eq!(issue.line, 4);
    match &issue.kind {
        IssueKind::UnknownField {
            name, suggestion, ..
        } => {
            assert_eq!(name, "Nam");
            assert_eq!(suggestion.as_deref(), Some("Name"));
        }
        other => panic!("expected UnknownField, got {:?}", other),
    }
}

#[test]
fn test_nested_field_parses_sub_attributes() {
    let schema = fixture_schema();
    let outcome = parse_doc(
        &schema,
        "# Alice {node type=\"Character\"}\n\n\
         - Name: Alice\n\
         - Appearance:\n\
         \x20 - Height: 1.7 m\n\
         \x20 - Eyes: grey\n",
    );

    assert!(outcome.issues.is_empty(), "issues: {:?}", outcome.issues);
    let node = single_node(&outcome);
    let appearance = node.attribute("Appearance").unwrap();
    match &appearance.content {
        AttributeContent::Nested(children) => {
            assert_eq!(children.len(), 2);
            assert_eq!(children[0].name, "Height");
            assert_eq!(
                children[0].value(),
                Some(&Value::Quantity {
                    value: 1.7,
                    unit: "m".to_string()
                })
            );
        }
        other => panic!("expected nested attributes, got {:?}", other),
    }
}

#[test]
fn test_single_value_field_rejects_multiple_nested_items() {
    let schema = fixture_schema();
    let outcome = parse_doc(
        &schema,
        "# Alice {node type=\"Character\"}\n\n\
         - Banner:\n\
         \x20 - crimson\n\
         \x20 - gold\n",
    );

    assert!(matches!(
        outcome.issues[0].kind,
        IssueKind::ExtraNestedValues { count: 2, .. }
    ));
}

#[test]
fn test_escaped_colon_stays_in_field_name() {
    let schema = fixture_schema();
    let outcome = parse_doc(
        &schema,
        "# Alice {node type=\"Character\"}\n\n- Name: Ael\\: the Quiet\n",
    );

    let node = single_node(&outcome);
    assert_eq!(
        node.attribute("Name").unwrap().value(),
        Some(&Value::Text {
            text: "Ael: the Quiet".to_string()
        })
    );
}

#[test]
fn test_declared_section_with_attributes_and_subsection() {
    let schema = fixture_schema();
    let outcome = parse_doc(
        &schema,
        "# Alice {node type=\"Character\"}\n\n\
         - Name: Alice\n\n\
         ## History\n\n\
         - Era: First Age\n\n\
         A long story.\n\n\
         ### Youth\n\n\
         She grew up at sea.\n",
    );

    assert!(outcome.issues.is_empty(), "issues: {:?}", outcome.issues);
    let node = single_node(&outcome);
    let history = node.section("History").unwrap();
    assert!(history.declared);
    assert_eq!(history.attributes.len(), 1);
    assert!(history.summary.contains("A long story."));
    assert_eq!(history.sections.len(), 1);
    assert_eq!(history.sections[0].name, "Youth");
}

#[test]
fn test_ad_hoc_section_requires_tag() {
    let schema = fixture_schema();
    let outcome = parse_doc(
        &schema,
        "# Alice {node type=\"Character\"}\n\n\
         - Name: Alice\n\n\
         ## History\n\n\
         ### Rumors {section}\n\nWhispered things.\n\n\
         ### Apocrypha\n\nNot declared, not tagged.\n",
    );

    let node = single_node(&outcome);
    let history = node.section("History").unwrap();
    assert_eq!(history.sections.len(), 1);
    assert!(!history.sections[0].declared);
    assert!(matches!(
        outcome.issues[0].kind,
        IssueKind::UnknownSubsection { .. }
    ));
}

#[test]
fn test_embedded_node_fills_titled_slot() {
    let schema = fixture_schema();
    let outcome = parse_doc(
        &schema,
        "# Alice {node type=\"Character\"}\n\n\
         - Name: Alice\n\n\
         ## Mount {node type=\"Creature\"}\n\n\
         - Name: Shadowmane\n",
    );

    assert!(outcome.issues.is_empty(), "issues: {:?}", outcome.issues);
    let node = single_node(&outcome);
    assert_eq!(node.embedded.len(), 1);
    assert_eq!(node.embedded[0].type_name, "Creature");
}

#[test]
fn test_embedded_title_mismatch_is_rejected() {
    let schema = fixture_schema();
    let outcome = parse_doc(
        &schema,
        "# Alice {node type=\"Character\"}\n\n\
         - Name: Alice\n\n\
         ## Shadowmane {node type=\"Creature\"}\n",
    );

    let node = single_node(&outcome);
    assert!(node.embedded.is_empty());
    assert!(matches!(
        outcome.issues[0].kind,
        IssueKind::EmbeddedTitleMismatch { .. }
    ));
}

#[test]
fn test_embedded_slot_fills_only_once() {
    let schema = fixture_schema();
    let outcome = parse_doc(
        &schema,
        "# Alice {node type=\"Character\"}\n\n\
         - Name: Alice\n\n\
         ## Mount {node type=\"Creature\"}\n\n- Name: Shadowmane\n\n\
         ## Mount {node type=\"Creature\"}\n\n- Name: Nightwind\n",
    );

    let node = single_node(&outcome);
    assert_eq!(node.embedded.len(), 1);
    assert!(matches!(
        outcome.issues[0].kind,
        IssueKind::EmbeddedSlotOccupied { .. }
    ));
}

#[test]
fn test_embedded_type_must_fit_a_slot() {
    let schema = fixture_schema();
    let outcome = parse_doc(
        &schema,
        "# Alice {node type=\"Character\"}\n\n\
         - Name: Alice\n\n\
         ## Mount {node type=\"Event\"}\n",
    );

    assert!(matches!(
        outcome.issues[0].kind,
        IssueKind::EmbeddedTypeNotAllowed { .. }
    ));
}

#[test]
fn test_blocks_before_first_heading_are_orphaned() {
    let schema = fixture_schema();
    let outcome = parse_doc(
        &schema,
        "Stray prologue text.\n\nMore of it.\n\n# Alice {node type=\"Character\"}\n\n- Name: Alice\n",
    );

    assert!(outcome.issues.is_empty(), "issues: {:?}", outcome.issues);
    assert_eq!(outcome.orphan_blocks, vec![0, 1]);
    assert_eq!(outcome.nodes.len(), 1);
}

#[test]
fn test_untagged_root_heading_is_an_error() {
    let schema = fixture_schema();
    let outcome = parse_doc(&schema, "# Alice\n\n- Name: Alice\n");

    assert!(outcome.nodes.is_empty());
    assert!(matches!(outcome.issues[0].kind, IssueKind::RootTagMissing));
}

#[test]
fn test_section_cannot_be_document_root() {
    let schema = fixture_schema();
    let outcome = parse_doc(&schema, "# History {section}\n\nText.\n");

    assert!(matches!(outcome.issues[0].kind, IssueKind::SectionAtRoot));
}

#[test]
fn test_unknown_root_type_gets_a_suggestion() {
    let schema = fixture_schema();
    let outcome = parse_doc(&schema, "# Alice {node type=\"Charactr\"}\n");

    match &outcome.issues[0].kind {
        IssueKind::DefinitionNotFound { name, suggestion } => {
            assert_eq!(name, "Charactr");
            assert_eq!(suggestion.as_deref(), Some("Character"));
        }
        other => panic!("expected DefinitionNotFound, got {:?}", other),
    }
}

#[test]
fn test_error_in_one_subtree_does_not_stop_the_document() {
    let schema = fixture_schema();
    let outcome = parse_doc(
        &schema,
        "# Ghost {node type=\"Phantom\"}\n\n- Name: Ghost\n\n\
         # Alice {node type=\"Character\"}\n\n- Name: Alice\n",
    );

    assert_eq!(outcome.issues.len(), 1);
    assert_eq!(outcome.nodes.len(), 1);
    assert_eq!(outcome.nodes[0].name, "Alice");
}

#[test]
fn test_node_collection_child_by_title() {
    let schema = fixture_schema();
    let outcome = parse_doc(
        &schema,
        "# Alice {node type=\"Character\"}\n\n\
         - Name: Alice\n\n\
         ## Deeds\n\n\
         ### The Siege {node type=\"Event\"}\n\n- Name: The Siege\n",
    );

    assert!(outcome.issues.is_empty(), "issues: {:?}", outcome.issues);
    let node = single_node(&outcome);
    let deeds = node.collection("Deeds").unwrap();
    assert_eq!(deeds.len(), 1);
}
