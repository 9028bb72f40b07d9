//! Hierarchical validation engine.
//!
//! Walks the merged entity graph depth-first, post-order: children are
//! validated before their owner, then the owner's definition is checked
//! for required-but-missing children. Rule violations are recorded as
//! severity-tagged messages, never thrown; states propagate upward and
//! never downgrade.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::model::value::Value;
use crate::model::{
    Attribute, AttributeContent, Collection, CollectionEntries, Node, Section,
};
use crate::schema::{
    EmbeddedDefinition, FieldDefinition, LoreSchema, SectionDefinition, TypeDefinition,
};

/// Per-entity validation outcome, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationState {
    None,
    Passed,
    ChildWarning,
    Warning,
    ChildFailed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSeverity {
    Warning,
    Failed,
}

/// One validation finding attached to an entity.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub severity: MessageSeverity,
    pub text: String,
}

/// Validation output: entity state and messages, keyed by entity uuid.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    states: HashMap<Uuid, ValidationState>,
    messages: HashMap<Uuid, Vec<Message>>,
}

impl ValidationReport {
    pub fn state_of(&self, entity: Uuid) -> ValidationState {
        self.states
            .get(&entity)
            .copied()
            .unwrap_or(ValidationState::None)
    }

    pub fn messages_of(&self, entity: Uuid) -> &[Message] {
        self.messages.get(&entity).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_failures(&self) -> bool {
        self.states
            .values()
            .any(|s| matches!(s, ValidationState::Failed | ValidationState::ChildFailed))
    }

    pub fn failed_count(&self) -> usize {
        self.states
            .values()
            .filter(|s| **s == ValidationState::Failed)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.messages
            .values()
            .flatten()
            .filter(|m| m.severity == MessageSeverity::Warning)
            .count()
    }

    pub fn all_messages(&self) -> impl Iterator<Item = (&Uuid, &Message)> {
        self.messages
            .iter()
            .flat_map(|(uuid, msgs)| msgs.iter().map(move |m| (uuid, m)))
    }

    fn warn(&mut self, entity: Uuid, text: impl Into<String>) {
        self.messages.entry(entity).or_default().push(Message {
            severity: MessageSeverity::Warning,
            text: text.into(),
        });
    }

    fn fail(&mut self, entity: Uuid, text: impl Into<String>) {
        self.messages.entry(entity).or_default().push(Message {
            severity: MessageSeverity::Failed,
            text: text.into(),
        });
    }
}

/// Validate the whole merged graph against the schema.
pub fn validate(
    nodes: &[Node],
    collections: &[Collection],
    schema: &LoreSchema,
) -> ValidationReport {
    let mut validator = Validator {
        schema,
        report: ValidationReport::default(),
    };
    for node in nodes {
        validator.validate_node(node);
    }
    for collection in collections {
        validator.validate_collection(collection);
    }
    validator.report
}

/// Raise a parent's state for a child outcome. A warning-ish child lifts
/// the parent to at least `ChildWarning`, a failed-ish child to at least
/// `ChildFailed`; an existing worse state is kept.
fn raise(parent: &mut ValidationState, child: ValidationState) {
    let suggestion = match child {
        ValidationState::Failed | ValidationState::ChildFailed => ValidationState::ChildFailed,
        ValidationState::Warning | ValidationState::ChildWarning => ValidationState::ChildWarning,
        _ => return,
    };
    if suggestion > *parent {
        *parent = suggestion;
    }
}

struct Validator<'a> {
    schema: &'a LoreSchema,
    report: ValidationReport,
}

impl Validator<'_> {
    fn validate_node(&mut self, node: &Node) -> ValidationState {
        let ty = self.schema.type_def(&node.type_name).cloned();
        let ty = ty.as_deref();
        let mut state = ValidationState::Passed;

        for attr in &node.attributes {
            let field = ty.and_then(|t| t.field(&attr.name));
            let s = self.validate_attribute(attr, field);
            raise(&mut state, s);
        }
        for section in &node.sections {
            let def = ty.and_then(|t| t.section(&section.name));
            let s = self.validate_section(section, def);
            raise(&mut state, s);
        }
        for collection in &node.collections {
            let s = self.validate_collection(collection);
            raise(&mut state, s);
        }
        for child in &node.embedded {
            let s = self.validate_node(child);
            raise(&mut state, s);
        }

        if let Some(ty) = ty {
            self.check_required(node, ty, &mut state);
        }

        self.report.states.insert(node.uuid, state);
        state
    }

    fn check_required(&mut self, node: &Node, ty: &TypeDefinition, state: &mut ValidationState) {
        for field in ty.fields.iter().filter(|f| f.required) {
            if node.attribute(&field.name).is_none() {
                self.report.fail(
                    node.uuid,
                    format!("Missing required attribute '{}'", field.name),
                );
                *state = ValidationState::Failed;
            }
        }
        for section in ty.sections.iter().filter(|s| s.required) {
            if node.section(&section.name).is_none() {
                self.report.fail(
                    node.uuid,
                    format!("Missing required section '{}'", section.name),
                );
                *state = ValidationState::Failed;
            }
        }
        for collection in ty.collections.iter().filter(|c| c.required) {
            if node.collection(&collection.name).is_none() {
                self.report.fail(
                    node.uuid,
                    format!("Missing required collection '{}'", collection.name),
                );
                *state = ValidationState::Failed;
            }
        }
        for slot in ty.embedded.iter().filter(|e| e.required) {
            if !node.embedded.iter().any(|child| self.satisfies(child, slot)) {
                self.report.fail(
                    node.uuid,
                    format!("Missing required embedded node {}", slot.label()),
                );
                *state = ValidationState::Failed;
            }
        }
    }

    fn satisfies(&self, child: &Node, slot: &EmbeddedDefinition) -> bool {
        if !self
            .schema
            .is_same_or_subtype(&child.type_name, &slot.type_name)
        {
            return false;
        }
        match &slot.title {
            Some(title) => &child.name == title,
            None => true,
        }
    }

    fn validate_section(
        &mut self,
        section: &Section,
        def: Option<&SectionDefinition>,
    ) -> ValidationState {
        let mut state = ValidationState::Passed;

        for attr in &section.attributes {
            let field = def.and_then(|d| d.field(&attr.name));
            let s = self.validate_attribute(attr, field);
            raise(&mut state, s);
        }
        for sub in &section.sections {
            let sub_def = def.and_then(|d| d.section(&sub.name));
            let s = self.validate_section(sub, sub_def);
            raise(&mut state, s);
        }

        if let Some(def) = def {
            for field in def.fields.iter().filter(|f| f.required) {
                if !section.attributes.iter().any(|a| a.name == field.name) {
                    self.report.fail(
                        section.uuid,
                        format!("Missing required attribute '{}'", field.name),
                    );
                    state = ValidationState::Failed;
                }
            }
            for sub in def.sections.iter().filter(|s| s.required) {
                if !section.sections.iter().any(|s| s.name == sub.name) {
                    self.report.fail(
                        section.uuid,
                        format!("Missing required section '{}'", sub.name),
                    );
                    state = ValidationState::Failed;
                }
            }
        }

        self.report.states.insert(section.uuid, state);
        state
    }

    fn validate_collection(&mut self, collection: &Collection) -> ValidationState {
        let mut state = ValidationState::Passed;
        match &collection.entries {
            CollectionEntries::Nodes(nodes) => {
                for node in nodes {
                    let s = self.validate_node(node);
                    raise(&mut state, s);
                }
            }
            CollectionEntries::Collections(subs) => {
                for sub in subs {
                    let s = self.validate_collection(sub);
                    raise(&mut state, s);
                }
            }
        }
        self.report.states.insert(collection.uuid, state);
        state
    }

    fn validate_attribute(
        &mut self,
        attr: &Attribute,
        field: Option<&FieldDefinition>,
    ) -> ValidationState {
        let mut state = ValidationState::Passed;

        match &attr.content {
            AttributeContent::Nested(children) => {
                for child in children {
                    let sub_field = field.and_then(|f| f.field(&child.name));
                    let s = self.validate_attribute(child, sub_field);
                    raise(&mut state, s);
                }
                if let Some(field) = field {
                    for sub in field.fields.iter().filter(|f| f.required) {
                        if !children.iter().any(|c| c.name == sub.name) {
                            self.report.fail(
                                attr.uuid,
                                format!("Missing required attribute '{}'", sub.name),
                            );
                            state = ValidationState::Failed;
                        }
                    }
                }
            }
            AttributeContent::Single(value) => {
                self.check_value(attr, field, value, &mut state);
            }
            AttributeContent::Many(values) => {
                for value in values {
                    self.check_value(attr, field, value, &mut state);
                }
            }
        }

        self.report.states.insert(attr.uuid, state);
        state
    }

    fn check_value(
        &mut self,
        attr: &Attribute,
        field: Option<&FieldDefinition>,
        value: &Value,
        state: &mut ValidationState,
    ) {
        match value {
            Value::Pick { option } => {
                let options = field
                    .and_then(|f| f.picklist.as_deref())
                    .and_then(|binding| self.schema.leaf_options(binding));
                let valid = options
                    .map(|opts| opts.iter().any(|o| o == option))
                    .unwrap_or(false);
                if !valid {
                    self.report.fail(
                        attr.uuid,
                        format!("'{}' is not a valid option for '{}'", option, attr.name),
                    );
                    *state = ValidationState::Failed;
                }
            }
            Value::Reference(reference) => {
                if let Some(target) = &reference.target {
                    if target.by_name {
                        self.report.warn(
                            attr.uuid,
                            format!(
                                "Reference '{}' resolved by name, not by id",
                                reference.raw
                            ),
                        );
                        bump_warning(state);
                    }
                }
                // Unresolved tokens are the resolver's bookkeeping, not a
                // validation finding.
            }
            Value::Color { hex, name } => {
                if name.is_none() {
                    self.report.warn(
                        attr.uuid,
                        format!("Color {} has no human-readable name", hex),
                    );
                    bump_warning(state);
                }
            }
            Value::Date { date } => {
                if date.is_tbd() {
                    self.report
                        .warn(attr.uuid, format!("Date of '{}' is TBD", attr.name));
                    bump_warning(state);
                }
            }
            Value::DateRange { start, end } => {
                if start.is_tbd() || end.is_tbd() {
                    self.report.warn(
                        attr.uuid,
                        format!("Date range of '{}' has a TBD endpoint", attr.name),
                    );
                    bump_warning(state);
                }
                if start.is_after(end) {
                    // Possibly intentional; never an error
                    self.report.warn(
                        attr.uuid,
                        format!("Date range of '{}' ends before it starts", attr.name),
                    );
                    bump_warning(state);
                }
            }
            _ => {}
        }
    }
}

fn bump_warning(state: &mut ValidationState) {
    if *state < ValidationState::Warning {
        *state = ValidationState::Warning;
    }
}
