//! Validation engine integration tests.

mod common;

use common::{fixture_schema, parse_doc};
use loreweave::validate::{validate, MessageSeverity, ValidationState};

#[test]
fn test_complete_node_passes() {
    let schema = fixture_schema();
    let outcome = parse_doc(&schema, "# Alice {node type=\"Character\"}\n\n- Name: Alice\n");
    let report = validate(&outcome.nodes, &outcome.collections, &schema);

    assert_eq!(
        report.state_of(outcome.nodes[0].uuid),
        ValidationState::Passed
    );
    assert!(report.messages_of(outcome.nodes[0].uuid).is_empty());
}

#[test]
fn test_missing_required_attribute_fails() {
    let schema = fixture_schema();
    let outcome = parse_doc(
        &schema,
        "# Alice {node type=\"Character\"}\n\nOnly narrative, no fields.\n",
    );
    let report = validate(&outcome.nodes, &outcome.collections, &schema);

    let node = &outcome.nodes[0];
    assert!(node.attributes.is_empty());
    assert_eq!(report.state_of(node.uuid), ValidationState::Failed);
    let messages = report.messages_of(node.uuid);
    assert!(messages
        .iter()
        .any(|m| m.text == "Missing required attribute 'Name'"));
    assert!(messages
        .iter()
        .all(|m| m.severity == MessageSeverity::Failed));
}

#[test]
fn test_tbd_range_endpoint_warns_but_never_fails() {
    let schema = fixture_schema();
    let outcome = parse_doc(
        &schema,
        "# Alice {node type=\"Character\"}\n\n- Name: Alice\n- Lifespan: 1012-03-04 to TBD\n",
    );
    assert!(outcome.issues.is_empty(), "issues: {:?}", outcome.issues);
    let report = validate(&outcome.nodes, &outcome.collections, &schema);

    let node = &outcome.nodes[0];
    let lifespan = node.attribute("Lifespan").unwrap();
    assert_eq!(report.state_of(lifespan.uuid), ValidationState::Warning);
    assert!(report
        .messages_of(lifespan.uuid)
        .iter()
        .any(|m| m.severity == MessageSeverity::Warning && m.text.contains("TBD")));
    assert_eq!(
        report.state_of(node.uuid),
        ValidationState::ChildWarning
    );
}

#[test]
fn test_inverted_range_warns() {
    let schema = fixture_schema();
    let outcome = parse_doc(
        &schema,
        "# Alice {node type=\"Character\"}\n\n- Name: Alice\n- Lifespan: 1066 to 1012\n",
    );
    let report = validate(&outcome.nodes, &outcome.collections, &schema);

    let lifespan = outcome.nodes[0].attribute("Lifespan").unwrap();
    assert_eq!(report.state_of(lifespan.uuid), ValidationState::Warning);
    assert!(report
        .messages_of(lifespan.uuid)
        .iter()
        .any(|m| m.text.contains("ends before it starts")));
}

#[test]
fn test_picklist_value_outside_options_fails() {
    let schema = fixture_schema();
    let outcome = parse_doc(
        &schema,
        "# Alice {node type=\"Character\"}\n\n- Name: Alice\n- Allegiance: Pirates\n",
    );
    let report = validate(&outcome.nodes, &outcome.collections, &schema);

    let node = &outcome.nodes[0];
    let allegiance = node.attribute("Allegiance").unwrap();
    assert_eq!(report.state_of(allegiance.uuid), ValidationState::Failed);
    assert_eq!(report.state_of(node.uuid), ValidationState::ChildFailed);
}

#[test]
fn test_picklist_leaf_option_passes() {
    let schema = fixture_schema();
    let outcome = parse_doc(
        &schema,
        "# Alice {node type=\"Character\"}\n\n- Name: Alice\n- Allegiance: Dawn\n",
    );
    let report = validate(&outcome.nodes, &outcome.collections, &schema);
    assert_eq!(
        report.state_of(outcome.nodes[0].uuid),
        ValidationState::Passed
    );
}

#[test]
fn test_branch_restriction_excludes_other_branches() {
    let schema = fixture_schema();
    // "Blue" is a Colors leaf, but Tone is restricted to the Warm branch
    let outcome = parse_doc(
        &schema,
        "# Alice {node type=\"Character\"}\n\n- Name: Alice\n- Tone: Blue\n",
    );
    let report = validate(&outcome.nodes, &outcome.collections, &schema);
    let tone = outcome.nodes[0].attribute("Tone").unwrap();
    assert_eq!(report.state_of(tone.uuid), ValidationState::Failed);

    let outcome = parse_doc(
        &schema,
        "# Alice {node type=\"Character\"}\n\n- Name: Alice\n- Tone: Amber\n",
    );
    let report = validate(&outcome.nodes, &outcome.collections, &schema);
    assert_eq!(
        report.state_of(outcome.nodes[0].uuid),
        ValidationState::Passed
    );
}

#[test]
fn test_color_without_name_warns() {
    let schema = fixture_schema();
    let outcome = parse_doc(
        &schema,
        "# Alice {node type=\"Character\"}\n\n- Name: Alice\n- Banner: #aa3311\n",
    );
    let report = validate(&outcome.nodes, &outcome.collections, &schema);
    let banner = outcome.nodes[0].attribute("Banner").unwrap();
    assert_eq!(report.state_of(banner.uuid), ValidationState::Warning);

    let outcome = parse_doc(
        &schema,
        "# Alice {node type=\"Character\"}\n\n- Name: Alice\n- Banner: #aa3311 Ember Red\n",
    );
    let report = validate(&outcome.nodes, &outcome.collections, &schema);
    assert_eq!(
        report.state_of(outcome.nodes[0].uuid),
        ValidationState::Passed
    );
}

#[test]
fn test_missing_required_nested_field_fails_the_attribute() {
    let schema = fixture_schema();
    let outcome = parse_doc(
        &schema,
        "# Alice {node type=\"Character\"}\n\n\
         - Name: Alice\n\
         - Appearance:\n\
         \x20 - Height: 1.7 m\n",
    );
    let report = validate(&outcome.nodes, &outcome.collections, &schema);

    let node = &outcome.nodes[0];
    let appearance = node.attribute("Appearance").unwrap();
    assert_eq!(report.state_of(appearance.uuid), ValidationState::Failed);
    assert!(report
        .messages_of(appearance.uuid)
        .iter()
        .any(|m| m.text == "Missing required attribute 'Eyes'"));
    assert_eq!(report.state_of(node.uuid), ValidationState::ChildFailed);
}

#[test]
fn test_failure_propagates_through_collections() {
    let schema = fixture_schema();
    // Bob has no Name attribute, so the entry fails and the collection
    // carries a child failure.
    let outcome = parse_doc(&schema, "# Cast {collection}\n\n## Bob\n\nNarrative only.\n");
    let report = validate(&outcome.nodes, &outcome.collections, &schema);

    let cast = &outcome.collections[0];
    assert_eq!(report.state_of(cast.uuid), ValidationState::ChildFailed);
}

#[test]
fn test_local_failure_outranks_child_warning() {
    let schema = fixture_schema();
    // Missing required Name (local failure) plus a TBD date (child warning)
    let outcome = parse_doc(
        &schema,
        "# Alice {node type=\"Character\"}\n\n- Lifespan: TBD\n",
    );
    let report = validate(&outcome.nodes, &outcome.collections, &schema);
    assert_eq!(
        report.state_of(outcome.nodes[0].uuid),
        ValidationState::Failed
    );
}

#[test]
fn test_inherited_required_field_applies_to_subtype() {
    let schema = fixture_schema();
    let outcome = parse_doc(&schema, "# Mara {node type=\"Hero\"}\n\nNo fields.\n");
    let report = validate(&outcome.nodes, &outcome.collections, &schema);

    assert_eq!(
        report.state_of(outcome.nodes[0].uuid),
        ValidationState::Failed
    );
    assert!(report
        .messages_of(outcome.nodes[0].uuid)
        .iter()
        .any(|m| m.text == "Missing required attribute 'Name'"));
}

#[test]
fn test_missing_required_embedded_node_fails() {
    let raw: loreweave::RawSchema = serde_json::from_value(serde_json::json!({
        "types": [
            {"name": "Creature", "fields": [{"name": "Name", "required": true}]},
            {
                "name": "Lair",
                "embedded": [{"title": "Guardian", "type": "Creature", "required": true}]
            }
        ]
    }))
    .unwrap();
    let schema = loreweave::schema::resolve(raw).unwrap();

    let outcome = parse_doc(&schema, "# The Deep {node type=\"Lair\"}\n\nEmpty halls.\n");
    let report = validate(&outcome.nodes, &outcome.collections, &schema);
    assert_eq!(
        report.state_of(outcome.nodes[0].uuid),
        ValidationState::Failed
    );
    assert!(report
        .messages_of(outcome.nodes[0].uuid)
        .iter()
        .any(|m| m.text.contains("Missing required embedded node")));
}
