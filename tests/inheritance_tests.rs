//! Schema inheritance integration tests over the fixture schema.

mod common;

use common::{fixture_schema, parse_doc};

#[test]
fn test_subtype_inherits_the_whole_chain() {
    let schema = fixture_schema();
    let hero = schema.type_def("Hero").unwrap();

    assert_eq!(hero.ancestors, vec!["Character", "Entity"]);
    // From Entity
    assert!(hero.field("Name").unwrap().required);
    assert!(hero.field("Name").unwrap().inherited);
    // From Character
    assert!(hero.field("Aliases").unwrap().inherited);
    assert!(hero.section("History").is_some());
    assert!(hero.collection("Deeds").is_some());
    assert_eq!(hero.embedded.len(), 1);
}

#[test]
fn test_inherited_sections_and_slots_work_when_parsing_a_subtype() {
    let schema = fixture_schema();
    let outcome = parse_doc(
        &schema,
        "# Mara {node type=\"Hero\"}\n\n\
         - Name: Mara\n\n\
         ## History\n\n- Era: Second Age\n\n\
         ## Mount {node type=\"Creature\"}\n\n- Name: Cloudchaser\n",
    );

    assert!(outcome.issues.is_empty(), "issues: {:?}", outcome.issues);
    let mara = &outcome.nodes[0];
    assert!(mara.section("History").is_some());
    assert_eq!(mara.embedded.len(), 1);
}

#[test]
fn test_picklist_bindings_survive_inheritance() {
    let schema = fixture_schema();
    let hero = schema.type_def("Hero").unwrap();
    let allegiance = hero.field("Allegiance").unwrap();
    assert_eq!(allegiance.picklist.as_deref(), Some("Factions"));
    assert_eq!(
        schema.leaf_options("Factions").unwrap(),
        vec!["Ravens", "Dawn", "Dusk"]
    );
}
